pub mod ai;
pub mod conversation_store;
pub mod directory;
pub mod followup;
