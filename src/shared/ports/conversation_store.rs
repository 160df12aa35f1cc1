use crate::shared::entities::ConversationState;

/// Process-local mapping from phone number to conversation state.
///
/// Implementations must tolerate concurrent access from independent keys.
/// A read-modify-write on one key is not atomic: the last `put` wins.
pub trait ConversationStore: Send + Sync {
    fn get(&self, phone_number: &str) -> Option<ConversationState>;
    /// Stores `state` under its own phone number, returning the replaced state.
    fn put(&self, state: ConversationState) -> Option<ConversationState>;
    fn delete(&self, phone_number: &str) -> Option<ConversationState>;
}
