use crate::shared::entities::FollowUpContact;
use crate::shared::ports::followup::{
    CallbackRequest, CallbackScheduler, EmailContent, FollowUpFuture, FollowUpMailer,
};
use crate::shared::utils::{mask_phone, mask_pii};

/// Follow-up sink that only records requests in the log and accepts them.
#[derive(Clone, Debug, Default)]
pub struct LoggingFollowUp;

impl LoggingFollowUp {
    pub fn new() -> Self {
        Self
    }
}

impl CallbackScheduler for LoggingFollowUp {
    fn schedule_callback(&self, request: CallbackRequest) -> FollowUpFuture {
        log::info!(
            "[followup] callback scheduled pharmacy={} phone={} time={} notes={}",
            request.contact.name.as_deref().unwrap_or("-"),
            request.contact.phone.as_deref().map(mask_phone).unwrap_or_default(),
            request.preferred_time,
            request.notes.as_deref().map(mask_pii).unwrap_or_else(|| "-".to_string())
        );
        Box::pin(async move { true })
    }
}

impl FollowUpMailer for LoggingFollowUp {
    fn send_email(&self, contact: FollowUpContact, content: EmailContent) -> FollowUpFuture {
        log::info!(
            "[followup] email queued to={} subject={:?} body_len={}",
            contact.email.as_deref().map(mask_pii).unwrap_or_default(),
            content.subject,
            content.body.len()
        );
        Box::pin(async move { true })
    }
}
