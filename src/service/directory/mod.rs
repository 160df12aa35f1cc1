//! Read-through access to the external pharmacy directory.
//!
//! Profiles are rebuilt from the directory on every call; nothing is cached.

use std::sync::Arc;

use thiserror::Error;

use crate::service::script::{fill, SalesScript};
use crate::shared::entities::{
    PartialPharmacyProfile, PharmacyProfile, Prescription, DEFAULT_CONTACT_PERSON,
};
use crate::shared::ports::directory::{DirectoryPort, PharmacyRecord};
use crate::shared::utils::{format_thousands, mask_phone, phones_match};

/// Prescription counts are daily figures; a month is taken as 30 days.
pub const DAYS_PER_MONTH: u64 = 30;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Failed to lookup pharmacy information: {0}")]
    LookupFailed(String),
    #[error("Failed to fetch pharmacy data: {0}")]
    FetchFailed(String),
    #[error("Failed to create pharmacy: {0}")]
    CreateFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeTier {
    High,
    Elevated,
    Moderate,
    Low,
}

impl VolumeTier {
    /// Inclusive lower bounds 10000 / 5000 / 1000.
    pub fn for_volume(volume: u64) -> Self {
        match volume {
            v if v >= 10_000 => Self::High,
            v if v >= 5_000 => Self::Elevated,
            v if v >= 1_000 => Self::Moderate,
            _ => Self::Low,
        }
    }
}

#[derive(Clone)]
pub struct PharmacyDirectory {
    port: Arc<dyn DirectoryPort>,
}

impl PharmacyDirectory {
    pub fn new(port: Arc<dyn DirectoryPort>) -> Self {
        Self { port }
    }

    /// First record whose phone matches `phone`, in directory order.
    ///
    /// An empty directory is `Ok(None)`; only a failed fetch is an error.
    pub async fn find_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<PharmacyProfile>, DirectoryError> {
        log::info!("[directory] looking up pharmacy phone={}", mask_phone(phone));
        let records = self.port.fetch_all().await.map_err(|err| {
            log::error!("[directory] lookup fetch failed: {}", err);
            DirectoryError::LookupFailed(err.to_string())
        })?;

        match records.into_iter().find(|r| phones_match(&r.phone, phone)) {
            Some(record) => {
                log::info!("[directory] found pharmacy id={}", record.id);
                Ok(Some(profile_from_record(record)))
            }
            None => {
                log::info!("[directory] no pharmacy for phone={}", mask_phone(phone));
                Ok(None)
            }
        }
    }

    pub async fn list_all(&self) -> Result<Vec<PharmacyProfile>, DirectoryError> {
        let records = self.port.fetch_all().await.map_err(|err| {
            log::error!("[directory] list fetch failed: {}", err);
            DirectoryError::FetchFailed(err.to_string())
        })?;
        Ok(records.into_iter().map(profile_from_record).collect())
    }

    /// Submits a new pharmacy and returns the directory's echo unchanged.
    pub async fn create(
        &self,
        partial: PartialPharmacyProfile,
    ) -> Result<PharmacyProfile, DirectoryError> {
        log::info!(
            "[directory] creating pharmacy phone={}",
            partial.phone.as_deref().map(mask_phone).unwrap_or_default()
        );
        self.port.create(partial).await.map_err(|err| {
            log::error!("[directory] create failed: {}", err);
            DirectoryError::CreateFailed(err.to_string())
        })
    }
}

pub fn rx_volume_from_prescriptions(prescriptions: &[Prescription]) -> u64 {
    prescriptions
        .iter()
        .fold(0u64, |sum, p| sum.saturating_add(p.count))
        .saturating_mul(DAYS_PER_MONTH)
}

pub fn profile_from_record(record: PharmacyRecord) -> PharmacyProfile {
    let address = match (&record.city, &record.state) {
        (Some(city), Some(state)) if !city.is_empty() && !state.is_empty() => {
            Some(format!("{}, {}", city, state))
        }
        _ => None,
    };
    let rx_volume = rx_volume_from_prescriptions(record.prescriptions.as_deref().unwrap_or(&[]));
    PharmacyProfile {
        id: record.id,
        name: record.name,
        phone: record.phone,
        address,
        city: record.city,
        state: record.state,
        rx_volume,
        contact_person: Some(DEFAULT_CONTACT_PERSON.to_string()),
        email: record.email,
        last_contact: None,
        prescriptions: record.prescriptions,
    }
}

/// Tiered pitch sentence for a monthly rx volume.
pub fn rx_volume_message(script: &SalesScript, volume: u64) -> String {
    let tiers = &script.volume_tiers;
    let template = match VolumeTier::for_volume(volume) {
        VolumeTier::High => &tiers.high,
        VolumeTier::Elevated => &tiers.elevated,
        VolumeTier::Moderate => &tiers.moderate,
        VolumeTier::Low => &tiers.low,
    };
    fill(template, &[("volume", &format_thousands(volume))])
}
