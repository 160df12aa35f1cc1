use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pharmacy::{FollowUpContact, PartialPharmacyProfile, PharmacyProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-phone-number conversation record.
///
/// `is_new_lead` is true iff `profile` is absent; `collecting_info` can only be
/// true for a new lead. The transcript is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub phone_number: String,
    pub profile: Option<PharmacyProfile>,
    pub is_new_lead: bool,
    pub collecting_info: bool,
    pub pending_fields: PartialPharmacyProfile,
    pub transcript: Vec<ChatMessage>,
}

impl ConversationState {
    pub fn known(phone_number: impl Into<String>, profile: PharmacyProfile) -> Self {
        Self {
            phone_number: phone_number.into(),
            profile: Some(profile),
            is_new_lead: false,
            collecting_info: false,
            pending_fields: PartialPharmacyProfile::default(),
            transcript: Vec::new(),
        }
    }

    pub fn new_lead(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            profile: None,
            is_new_lead: true,
            collecting_info: true,
            pending_fields: PartialPharmacyProfile::default(),
            transcript: Vec::new(),
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.transcript.push(ChatMessage::new(role, content));
    }

    /// Attaches a created or resolved profile, which ends the lead phase.
    pub fn attach_profile(&mut self, profile: PharmacyProfile) {
        self.profile = Some(profile);
        self.is_new_lead = false;
        self.collecting_info = false;
    }

    /// Contact details for follow-ups: the profile when known, otherwise the
    /// pending lead fields.
    pub fn follow_up_contact(&self) -> FollowUpContact {
        match &self.profile {
            Some(profile) => FollowUpContact::from(profile),
            None => FollowUpContact::from(&self.pending_fields),
        }
    }
}
