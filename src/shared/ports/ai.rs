use std::future::Future;
use std::pin::Pin;

pub mod extraction;
pub mod reply;

pub use extraction::ExtractionPort;
pub use reply::{ReplyContext, ReplyPort};

pub use crate::shared::error::ai::{ExtractionError, ReplyError};

pub type AiFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
