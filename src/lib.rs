pub mod interface;
pub mod service;
pub mod shared;

pub use shared::{config, entities, logging};
