use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::shared::entities::ConversationState;
use crate::shared::ports::conversation_store::ConversationStore;

/// Conversation states keyed by the caller's phone number as given.
#[derive(Default)]
pub struct InMemoryConversationStore {
    inner: Mutex<HashMap<String, ConversationState>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn get(&self, phone_number: &str) -> Option<ConversationState> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(phone_number)
            .cloned()
    }

    fn put(&self, state: ConversationState) -> Option<ConversationState> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(state.phone_number.clone(), state)
    }

    fn delete(&self, phone_number: &str) -> Option<ConversationState> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(phone_number)
    }
}
