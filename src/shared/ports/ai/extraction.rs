use crate::shared::entities::PartialPharmacyProfile;
use crate::shared::error::ai::ExtractionError;

use super::AiFuture;

pub trait ExtractionPort: Send + Sync {
    /// Pulls whichever lead fields the utterance mentions.
    fn extract_fields(
        &self,
        utterance: String,
    ) -> AiFuture<Result<PartialPharmacyProfile, ExtractionError>>;
}
