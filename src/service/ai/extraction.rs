use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use crate::shared::entities::PartialPharmacyProfile;
use crate::shared::error::ai::ExtractionError;
use crate::shared::ports::ai::ExtractionPort;
use crate::shared::utils::mask_pii;

const DEFAULT_EXTRACTION_PROMPT: &str = r#"
Extract pharmacy information from this message: "{message}"

Look for:
- Pharmacy name
- Address/location
- Contact person name
- Email address
- Monthly Rx volume (number of prescriptions)

Return as JSON with only the fields found. Use null for missing fields.
Example: {"name": "ABC Pharmacy", "address": "123 Main St", "contactPerson": "John Doe", "email": "john@abc.com", "rxVolume": 5000}
"#;

static EXTRACTION_PROMPT_CACHE: OnceLock<String> = OnceLock::new();

pub fn init_extraction_prompt() {
    let _ = extraction_prompt_template();
}

/// Prompt template with a `{message}` marker; `EXTRACTION_PROMPT_PATH` overrides it.
pub fn extraction_prompt_template() -> String {
    EXTRACTION_PROMPT_CACHE
        .get_or_init(|| {
            super::prompt::read_prompt_override("EXTRACTION_PROMPT_PATH")
                .unwrap_or_else(|| DEFAULT_EXTRACTION_PROMPT.trim().to_string())
        })
        .clone()
}

pub fn extraction_prompt(utterance: &str) -> String {
    extraction_prompt_template().replace("{message}", utterance)
}

/// Turns one utterance into whichever lead fields it mentions.
#[derive(Clone)]
pub struct LeadExtractor {
    port: Arc<dyn ExtractionPort>,
}

impl LeadExtractor {
    pub fn new(port: Arc<dyn ExtractionPort>) -> Self {
        Self { port }
    }

    /// Either a fully well-formed partial record or an error; a malformed
    /// model answer is never applied piecemeal.
    pub async fn extract(&self, utterance: &str) -> Result<PartialPharmacyProfile, ExtractionError> {
        if utterance.trim().is_empty() {
            return Ok(PartialPharmacyProfile::default());
        }
        let fields = self.port.extract_fields(utterance.to_string()).await?;
        log::debug!(
            "[extract] input={} name={} contact={} rx_volume={} email={} address={}",
            mask_pii(utterance),
            fields.name.is_some(),
            fields.contact_person.is_some(),
            fields.rx_volume.is_some(),
            fields.email.is_some(),
            fields.address.is_some()
        );
        Ok(fields)
    }
}

/// Parses the model's JSON answer into a partial record.
///
/// Markdown fences are stripped, `null` and blank strings mean "not found",
/// and `rxVolume` may be a number or a numeric string such as `"3,000"`.
pub fn parse_extraction_json(raw: &str) -> Result<PartialPharmacyProfile, ExtractionError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct ExtractionPayload {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        address: Option<String>,
        #[serde(default, alias = "contact_person")]
        contact_person: Option<String>,
        #[serde(default)]
        email: Option<String>,
        #[serde(default, alias = "rx_volume")]
        rx_volume: Option<RxVolumeValue>,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RxVolumeValue {
        Int(u64),
        Float(f64),
        Text(String),
    }

    let sanitized = sanitize_json_block(raw);
    if sanitized.is_empty() {
        return Ok(PartialPharmacyProfile::default());
    }
    let value: serde_json::Value = serde_json::from_str(&sanitized)
        .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;
    if !value.is_object() {
        return Err(ExtractionError::InvalidResponse(
            "expected a JSON object".to_string(),
        ));
    }
    let payload: ExtractionPayload = serde_json::from_value(value)
        .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;

    let rx_volume = match payload.rx_volume {
        None => None,
        Some(RxVolumeValue::Int(v)) => Some(v),
        Some(RxVolumeValue::Float(v)) if v.is_finite() && v >= 0.0 => Some(v.round() as u64),
        Some(RxVolumeValue::Float(v)) => {
            return Err(ExtractionError::InvalidResponse(format!(
                "rxVolume out of range: {v}"
            )))
        }
        Some(RxVolumeValue::Text(text)) => parse_volume_text(&text)?,
    };

    Ok(PartialPharmacyProfile {
        name: non_blank(payload.name),
        address: non_blank(payload.address),
        contact_person: non_blank(payload.contact_person),
        email: non_blank(payload.email),
        rx_volume,
        phone: None,
    })
}

fn parse_volume_text(text: &str) -> Result<Option<u64>, ExtractionError> {
    let cleaned: String = text
        .chars()
        .filter(|ch| !matches!(ch, ',' | '_' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ExtractionError::InvalidResponse(format!("rxVolume not numeric: {text}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn sanitize_json_block(input: &str) -> String {
    let mut s = input.trim().to_string();
    if let Some(stripped) = s.strip_prefix("```") {
        s = stripped.trim().to_string();
        if let Some(rest) = s.strip_prefix("json") {
            s = rest.trim().to_string();
        }
        if let Some(end) = s.rfind("```") {
            s = s[..end].trim().to_string();
        }
    }
    s
}
