use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::entities::pharmacy::deserialize_opaque_id;
use crate::shared::entities::{PartialPharmacyProfile, PharmacyProfile, Prescription};

/// A pharmacy record exactly as the directory service lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyRecord {
    #[serde(default, deserialize_with = "deserialize_opaque_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub prescriptions: Option<Vec<Prescription>>,
}

#[derive(Debug, Error)]
pub enum DirectoryPortError {
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type DirectoryFuture<T> =
    Pin<Box<dyn Future<Output = Result<T, DirectoryPortError>> + Send>>;

/// External pharmacy record store.
pub trait DirectoryPort: Send + Sync {
    /// Every record, in the store's own order.
    fn fetch_all(&self) -> DirectoryFuture<Vec<PharmacyRecord>>;
    /// Submits a new record and returns what the store echoes back.
    fn create(&self, record: PartialPharmacyProfile) -> DirectoryFuture<PharmacyProfile>;
}
