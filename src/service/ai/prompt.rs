use std::path::PathBuf;

/// Reads a non-empty prompt override from `env_key`'s path, if one is configured.
pub(crate) fn read_prompt_override(env_key: &str) -> Option<String> {
    let path = std::env::var(env_key).ok().map(PathBuf::from)?;
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                log::info!("[ai] prompt override loaded from {:?}", path);
                Some(trimmed.to_string())
            }
        }
        Err(err) => {
            log::warn!("[ai] prompt override {:?} unreadable: {}", path, err);
            None
        }
    }
}
