use std::future::Future;
use std::pin::Pin;

use crate::shared::entities::FollowUpContact;

/// Resolves to `true` when the follow-up was accepted.
pub type FollowUpFuture = Pin<Box<dyn Future<Output = bool> + Send>>;

#[derive(Debug, Clone)]
pub struct CallbackRequest {
    pub contact: FollowUpContact,
    pub preferred_time: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

pub trait CallbackScheduler: Send + Sync {
    fn schedule_callback(&self, request: CallbackRequest) -> FollowUpFuture;
}

pub trait FollowUpMailer: Send + Sync {
    fn send_email(&self, contact: FollowUpContact, content: EmailContent) -> FollowUpFuture;
}

pub trait FollowUpService: CallbackScheduler + FollowUpMailer {}

impl<T> FollowUpService for T where T: CallbackScheduler + FollowUpMailer {}
