//! Canned user-facing sentences of the sales assistant.
//!
//! Defaults are built in; a YAML file (`SALES_SCRIPT_PATH`) may override any
//! subset of them. Templates use `{placeholder}` markers.

use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::shared::config;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SalesScript {
    pub known_greeting: String,
    pub new_lead_greeting: String,
    pub volume_tiers: VolumeTierMessages,
    pub start_failed: String,
    pub message_failed: String,
    pub message_session_not_found: String,
    pub session_not_found: String,
    pub callback_scheduled: String,
    pub callback_failed: String,
    pub email_sent: String,
    pub email_failed: String,
    pub email_unavailable: String,
    pub pharmacies_failed: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VolumeTierMessages {
    pub high: String,
    pub elevated: String,
    pub moderate: String,
    pub low: String,
}

impl Default for SalesScript {
    fn default() -> Self {
        Self {
            known_greeting: "Hello! This is Pharmesol calling for {name}. I see we're speaking with {contact}. How can I help you today? {volume_message}".to_string(),
            new_lead_greeting: "Hello! Thank you for calling Pharmesol. We specialize in supporting high prescription volume pharmacies. May I get your pharmacy's name to better assist you?".to_string(),
            volume_tiers: VolumeTierMessages::default(),
            start_failed: "I apologize, but I'm having trouble connecting right now. Please try again.".to_string(),
            message_failed: "I apologize, but I'm having trouble processing your message. Please try again.".to_string(),
            message_session_not_found: "Please start a new conversation first.".to_string(),
            session_not_found: "Conversation not found.".to_string(),
            callback_scheduled: "Perfect! I've scheduled a callback for {time}. One of our specialists will call you at {phone}. Thank you for your time today!".to_string(),
            callback_failed: "I apologize, but there was an issue scheduling the callback. Please try again or contact us directly.".to_string(),
            email_sent: "Great! I've sent a follow-up email to {email} with detailed information about how Pharmesol can help {name}. You should receive it within a few minutes.".to_string(),
            email_failed: "I apologize, but there was an issue sending the email. Please try again or contact us directly.".to_string(),
            email_unavailable: "Email address not available. Please provide an email address first.".to_string(),
            pharmacies_failed: "Failed to fetch pharmacy data.".to_string(),
        }
    }
}

impl Default for VolumeTierMessages {
    fn default() -> Self {
        Self {
            high: "With your high prescription volume of {volume} Rx per month, Pharmesol can provide significant cost savings and operational efficiency improvements.".to_string(),
            elevated: "Your pharmacy's volume of {volume} Rx per month puts you in an excellent position to benefit from our specialized high-volume services.".to_string(),
            moderate: "With {volume} Rx per month, we can help optimize your operations and prepare for future growth.".to_string(),
            low: "We understand the challenges of managing {volume} prescriptions monthly, and we can help streamline your processes.".to_string(),
        }
    }
}

static SALES_SCRIPT: OnceLock<SalesScript> = OnceLock::new();

pub fn sales_script() -> &'static SalesScript {
    SALES_SCRIPT.get_or_init(|| load_sales_script(&config::sales_script_path()))
}

pub fn load_sales_script(path: &Path) -> SalesScript {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_yaml::from_str::<SalesScript>(&text) {
            Ok(script) => script,
            Err(err) => {
                log::warn!(
                    "[script] failed to parse {:?}: {}. Using default.",
                    path,
                    err
                );
                SalesScript::default()
            }
        },
        Err(err) => {
            log::debug!("[script] no override at {:?} ({}), using default", path, err);
            SalesScript::default()
        }
    }
}

/// Substitutes `{key}` markers in one pass; unknown markers are left
/// untouched and inserted values are never scanned again.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
