pub mod ai;
pub mod chatbot;
pub mod directory;
pub mod followup;
pub mod script;
