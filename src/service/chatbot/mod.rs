//! chatbot module: per-phone conversation state machine.
//! - start resolves the caller against the directory and greets them.
//! - message gathers lead fields while collecting, creates the pharmacy once,
//!   then asks the reply generator for the next assistant turn.
//! - Every collaborator failure ends as a `ChatFailure` with a canned message.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::service::ai::LeadExtractor;
use crate::service::directory::{rx_volume_message, DirectoryError, PharmacyDirectory};
use crate::service::followup::compose_follow_up_email;
use crate::service::script::{fill, SalesScript};
use crate::shared::entities::{ConversationState, PartialPharmacyProfile, PharmacyProfile, Role};
use crate::shared::ports::ai::{ReplyContext, ReplyPort};
use crate::shared::ports::conversation_store::ConversationStore;
use crate::shared::ports::followup::{CallbackRequest, FollowUpService};
use crate::shared::utils::mask_phone;

const UNNAMED_PHARMACY: &str = "your pharmacy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOperation {
    Message,
    ScheduleCallback,
    SendEmail,
    GetConversation,
}

impl fmt::Display for ChatOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Message => "message",
            Self::ScheduleCallback => "schedule-callback",
            Self::SendEmail => "send-email",
            Self::GetConversation => "conversation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ChatFailure {
    #[error("no conversation for this phone ({operation})")]
    SessionNotFound { operation: ChatOperation },
    #[error("start failed: {0}")]
    StartFailed(String),
    #[error("reply generation failed: {0}")]
    ReplyFailed(String),
    #[error("callback scheduling was rejected")]
    CallbackFailed,
    #[error("follow-up email was rejected")]
    EmailFailed,
    #[error("no email address on file")]
    NoEmailAvailable,
    #[error("pharmacy list failed: {0}")]
    FetchFailed(String),
}

impl ChatFailure {
    /// The caller-facing text for this failure.
    pub fn user_message(&self, script: &SalesScript) -> String {
        match self {
            Self::SessionNotFound {
                operation: ChatOperation::Message,
            } => script.message_session_not_found.clone(),
            Self::SessionNotFound { .. } => script.session_not_found.clone(),
            Self::StartFailed(_) => script.start_failed.clone(),
            Self::ReplyFailed(_) => script.message_failed.clone(),
            Self::CallbackFailed => script.callback_failed.clone(),
            Self::EmailFailed => script.email_failed.clone(),
            Self::NoEmailAvailable => script.email_unavailable.clone(),
            Self::FetchFailed(_) => script.pharmacies_failed.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartReply {
    pub message: String,
    pub is_new_lead: bool,
    pub pharmacy: Option<PharmacyProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReply {
    pub message: String,
    pub collecting_info: bool,
    pub pharmacy: Option<PharmacyProfile>,
}

pub struct ConversationOrchestrator {
    store: Arc<dyn ConversationStore>,
    directory: PharmacyDirectory,
    extractor: LeadExtractor,
    replies: Arc<dyn ReplyPort>,
    followup: Arc<dyn FollowUpService>,
    script: SalesScript,
}

impl ConversationOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        directory: PharmacyDirectory,
        extractor: LeadExtractor,
        replies: Arc<dyn ReplyPort>,
        followup: Arc<dyn FollowUpService>,
        script: SalesScript,
    ) -> Self {
        Self {
            store,
            directory,
            extractor,
            replies,
            followup,
            script,
        }
    }

    pub fn script(&self) -> &SalesScript {
        &self.script
    }

    /// Resolves the caller and (re)initializes their conversation.
    ///
    /// Any previous state for the phone is overwritten. A failed directory
    /// lookup leaves the store untouched.
    pub async fn start(&self, phone_number: &str) -> Result<StartReply, ChatFailure> {
        let tag = mask_phone(phone_number);
        log::info!("[chat {}] start", tag);

        let profile = self
            .directory
            .find_by_phone(phone_number)
            .await
            .map_err(|err| {
                log::error!("[chat {}] start failed: {}", tag, err);
                ChatFailure::StartFailed(err.to_string())
            })?;

        let (mut state, greeting) = match profile {
            Some(profile) => {
                let greeting = self.known_greeting(&profile);
                (ConversationState::known(phone_number, profile), greeting)
            }
            None => (
                ConversationState::new_lead(phone_number),
                self.script.new_lead_greeting.clone(),
            ),
        };
        state.push(Role::Assistant, greeting.clone());

        let reply = StartReply {
            message: greeting,
            is_new_lead: state.is_new_lead,
            pharmacy: state.profile.clone(),
        };
        self.store.put(state);
        log::info!("[chat {}] started new_lead={}", tag, reply.is_new_lead);
        Ok(reply)
    }

    /// Handles one caller utterance and returns the assistant's next turn.
    pub async fn message(&self, phone_number: &str, text: &str) -> Result<MessageReply, ChatFailure> {
        let tag = mask_phone(phone_number);
        let mut state = self.store.get(phone_number).ok_or(ChatFailure::SessionNotFound {
            operation: ChatOperation::Message,
        })?;

        state.push(Role::User, text);

        if state.collecting_info {
            // Extraction failures degrade to "nothing learned".
            match self.extractor.extract(text).await {
                Ok(fields) => {
                    state.pending_fields = PartialPharmacyProfile::merge(&state.pending_fields, fields);
                }
                Err(err) => {
                    log::warn!("[chat {}] extraction discarded: {}", tag, err);
                }
            }

            if state.pending_fields.has_mandatory_fields() {
                state.collecting_info = false;
                match self.materialize_lead(phone_number, &state.pending_fields).await {
                    Ok(profile) => {
                        log::info!("[chat {}] lead created id={}", tag, profile.id);
                        state.attach_profile(profile);
                    }
                    Err(err) => {
                        // State stays "not collecting, no profile".
                        log::error!("[chat {}] lead creation discarded: {}", tag, err);
                    }
                }
            }
        }

        let generated = self
            .replies
            .generate_reply(ReplyContext::from(&state))
            .await;

        match generated {
            Ok(answer) => {
                state.push(Role::Assistant, answer.clone());
                let reply = MessageReply {
                    message: answer,
                    collecting_info: state.collecting_info,
                    pharmacy: state.profile.clone(),
                };
                self.store.put(state);
                Ok(reply)
            }
            Err(err) => {
                log::error!("[chat {}] reply generation failed: {}", tag, err);
                self.store.put(state);
                Err(ChatFailure::ReplyFailed(err.to_string()))
            }
        }
    }

    pub async fn schedule_callback(
        &self,
        phone_number: &str,
        preferred_time: &str,
        notes: Option<String>,
    ) -> Result<String, ChatFailure> {
        let tag = mask_phone(phone_number);
        let state = self.store.get(phone_number).ok_or(ChatFailure::SessionNotFound {
            operation: ChatOperation::ScheduleCallback,
        })?;

        let mut contact = state.follow_up_contact();
        contact.phone = Some(phone_number.to_string());
        let request = CallbackRequest {
            contact,
            preferred_time: preferred_time.to_string(),
            notes,
        };

        if self.followup.schedule_callback(request).await {
            log::info!("[chat {}] callback scheduled", tag);
            Ok(fill(
                &self.script.callback_scheduled,
                &[("time", preferred_time), ("phone", phone_number)],
            ))
        } else {
            log::warn!("[chat {}] callback rejected", tag);
            Err(ChatFailure::CallbackFailed)
        }
    }

    pub async fn send_follow_up_email(&self, phone_number: &str) -> Result<String, ChatFailure> {
        let tag = mask_phone(phone_number);
        let state = self.store.get(phone_number).ok_or(ChatFailure::SessionNotFound {
            operation: ChatOperation::SendEmail,
        })?;

        let contact = state.follow_up_contact();
        let email = match contact.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => return Err(ChatFailure::NoEmailAvailable),
        };
        let name = contact
            .name
            .clone()
            .unwrap_or_else(|| UNNAMED_PHARMACY.to_string());

        let content = compose_follow_up_email(&contact);
        if self.followup.send_email(contact, content).await {
            log::info!("[chat {}] follow-up email sent", tag);
            Ok(fill(
                &self.script.email_sent,
                &[("email", email.as_str()), ("name", name.as_str())],
            ))
        } else {
            log::warn!("[chat {}] follow-up email rejected", tag);
            Err(ChatFailure::EmailFailed)
        }
    }

    pub fn get_conversation(&self, phone_number: &str) -> Result<ConversationState, ChatFailure> {
        self.store.get(phone_number).ok_or(ChatFailure::SessionNotFound {
            operation: ChatOperation::GetConversation,
        })
    }

    pub async fn list_pharmacies(&self) -> Result<Vec<PharmacyProfile>, ChatFailure> {
        self.directory
            .list_all()
            .await
            .map_err(|err| ChatFailure::FetchFailed(err.to_string()))
    }

    fn known_greeting(&self, profile: &PharmacyProfile) -> String {
        let volume_message = rx_volume_message(&self.script, profile.rx_volume);
        fill(
            &self.script.known_greeting,
            &[
                ("name", profile.name.as_str()),
                ("contact", profile.contact_person_or_default()),
                ("volume_message", volume_message.as_str()),
            ],
        )
    }

    async fn materialize_lead(
        &self,
        phone_number: &str,
        pending: &PartialPharmacyProfile,
    ) -> Result<PharmacyProfile, DirectoryError> {
        let mut record = pending.clone();
        record.phone = Some(phone_number.to_string());
        self.directory.create(record).await
    }
}
