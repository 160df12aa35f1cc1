use std::sync::OnceLock;

use crate::shared::ports::ai::ReplyContext;
use crate::shared::utils::format_thousands;

const DEFAULT_BASE_PROMPT: &str = "You are a professional sales assistant for Pharmesol, a company that supports high prescription volume pharmacies. You are handling an inbound call from a pharmacy.

Key guidelines:
- Be professional, friendly, and helpful
- Focus on how Pharmesol can support high Rx volume pharmacies
- Ask relevant follow-up questions to understand their needs
- Keep responses concise and conversational
- Always offer follow-up options like email or callback scheduling";

const COLLECTING_HINT: &str = "You are currently collecting basic information from this new caller. Ask for one piece of information at a time.";

const NOT_ON_FILE: &str = "Not on file";

static BASE_PROMPT_CACHE: OnceLock<String> = OnceLock::new();

pub fn init_reply_prompt() {
    let _ = base_prompt();
}

/// Shared guidelines for every reply; `REPLY_PROMPT_PATH` overrides them.
pub fn base_prompt() -> String {
    BASE_PROMPT_CACHE
        .get_or_init(|| {
            super::prompt::read_prompt_override("REPLY_PROMPT_PATH")
                .unwrap_or_else(|| DEFAULT_BASE_PROMPT.to_string())
        })
        .clone()
}

pub fn build_system_prompt(context: &ReplyContext) -> String {
    build_system_prompt_with(&base_prompt(), context)
}

pub(crate) fn build_system_prompt_with(base: &str, context: &ReplyContext) -> String {
    let mut prompt = String::with_capacity(base.len() + 512);
    prompt.push_str(base.trim_end());
    prompt.push_str("\n\n");

    if let Some(profile) = &context.profile {
        let volume = format_thousands(profile.rx_volume);
        prompt.push_str("CALLER INFORMATION:\n");
        prompt.push_str(&format!("- Pharmacy: {}\n", profile.name));
        prompt.push_str(&format!(
            "- Location: {}\n",
            profile.address.as_deref().unwrap_or(NOT_ON_FILE)
        ));
        prompt.push_str(&format!(
            "- Contact Person: {}\n",
            profile.contact_person_or_default()
        ));
        prompt.push_str(&format!("- Monthly Rx Volume: {}\n", volume));
        prompt.push_str(&format!(
            "- Email: {}\n\n",
            profile.email.as_deref().unwrap_or(NOT_ON_FILE)
        ));
        prompt.push_str(&format!(
            "Since this is a returning client, greet them by name and reference their pharmacy details. Emphasize how Pharmesol can specifically help with their {} monthly prescription volume.",
            volume
        ));
    } else {
        prompt.push_str(
            "This appears to be a NEW CALLER. Your goals:
1. Warmly greet them and introduce Pharmesol
2. Gather basic information: pharmacy name, location, contact person, email, monthly Rx volume
3. Explain how Pharmesol specifically helps high-volume pharmacies
4. Offer follow-up via email or callback scheduling",
        );
        let known = known_lead_fields(context);
        if !known.is_empty() {
            prompt.push_str("\n\nAlready provided by the caller:\n");
            prompt.push_str(&known);
        }
        if context.collecting_info {
            prompt.push_str("\n\n");
            prompt.push_str(COLLECTING_HINT);
        }
    }
    prompt
}

fn known_lead_fields(context: &ReplyContext) -> String {
    let pending = &context.pending_fields;
    let mut lines = Vec::new();
    if let Some(name) = &pending.name {
        lines.push(format!("- Pharmacy: {name}"));
    }
    if let Some(address) = &pending.address {
        lines.push(format!("- Location: {address}"));
    }
    if let Some(contact) = &pending.contact_person {
        lines.push(format!("- Contact Person: {contact}"));
    }
    if let Some(email) = &pending.email {
        lines.push(format!("- Email: {email}"));
    }
    if let Some(volume) = pending.rx_volume {
        lines.push(format!("- Monthly Rx Volume: {}", format_thousands(volume)));
    }
    lines.join("\n")
}
