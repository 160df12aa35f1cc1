pub mod directory;
pub mod followup;
pub mod http;
pub mod store;
