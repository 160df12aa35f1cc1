use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Extraction request failed: {0}")]
    RequestFailed(String),
    #[error("Extraction response invalid: {0}")]
    InvalidResponse(String),
    #[error("Language model not configured")]
    NotConfigured,
}

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("Empty response")]
    EmptyResponse,
    #[error("Language model not configured")]
    NotConfigured,
}
