use crate::shared::entities::{ChatMessage, ConversationState, PartialPharmacyProfile, PharmacyProfile};
use crate::shared::error::ai::ReplyError;

use super::AiFuture;

/// Everything the reply generator sees: the full ordered transcript plus the
/// current lead/profile status.
#[derive(Debug, Clone)]
pub struct ReplyContext {
    pub transcript: Vec<ChatMessage>,
    pub profile: Option<PharmacyProfile>,
    pub pending_fields: PartialPharmacyProfile,
    pub collecting_info: bool,
}

impl From<&ConversationState> for ReplyContext {
    fn from(state: &ConversationState) -> Self {
        Self {
            transcript: state.transcript.clone(),
            profile: state.profile.clone(),
            pending_fields: state.pending_fields.clone(),
            collecting_info: state.collecting_info,
        }
    }
}

pub trait ReplyPort: Send + Sync {
    fn generate_reply(&self, context: ReplyContext) -> AiFuture<Result<String, ReplyError>>;
}
