use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use crate::shared::entities::{PartialPharmacyProfile, PharmacyProfile};
use crate::shared::ports::directory::{
    DirectoryFuture, DirectoryPort, DirectoryPortError, PharmacyRecord,
};

/// Process-local directory, used for offline runs and tests.
#[derive(Default)]
pub struct InMemoryDirectory {
    records: Mutex<Vec<PharmacyRecord>>,
}

impl InMemoryDirectory {
    pub fn new(records: Vec<PharmacyRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Loads a JSON array of directory records.
    pub fn from_json(json: &str) -> Result<Self, DirectoryPortError> {
        let records: Vec<PharmacyRecord> = serde_json::from_str(json)
            .map_err(|e| DirectoryPortError::InvalidResponse(e.to_string()))?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DirectoryPort for InMemoryDirectory {
    fn fetch_all(&self) -> DirectoryFuture<Vec<PharmacyRecord>> {
        let records = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Box::pin(async move { Ok(records) })
    }

    fn create(&self, record: PartialPharmacyProfile) -> DirectoryFuture<PharmacyProfile> {
        let id = Uuid::new_v4().to_string();
        let phone = record.phone.clone().unwrap_or_default();
        let name = record.name.clone().unwrap_or_default();

        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PharmacyRecord {
                id: id.clone(),
                name: name.clone(),
                phone: phone.clone(),
                city: None,
                state: None,
                email: record.email.clone(),
                prescriptions: None,
            });

        let created = PharmacyProfile {
            id,
            name,
            phone,
            address: record.address,
            rx_volume: record.rx_volume.unwrap_or_default(),
            contact_person: record.contact_person,
            email: record.email,
            ..Default::default()
        };
        Box::pin(async move { Ok(created) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_records_are_listed_afterwards() {
        let directory = InMemoryDirectory::default();
        let created = directory
            .create(PartialPharmacyProfile {
                name: Some("ABC Pharmacy".to_string()),
                contact_person: Some("Jane".to_string()),
                rx_volume: Some(3000),
                phone: Some("+1-555-9".to_string()),
                ..Default::default()
            })
            .await
            .expect("create");
        assert_eq!(created.name, "ABC Pharmacy");
        assert_eq!(created.rx_volume, 3000);
        assert!(!created.id.is_empty());

        let records = directory.fetch_all().await.expect("fetch");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, created.id);
        assert_eq!(records[0].phone, "+1-555-9");
    }

    #[test]
    fn loads_records_with_numeric_ids() {
        let directory = InMemoryDirectory::from_json(
            r#"[{"id": 7, "name": "HealthFirst", "phone": "+1-555-1",
                 "prescriptions": [{"drug": "A", "count": 150}]}]"#,
        )
        .expect("json");
        assert_eq!(directory.len(), 1);
    }
}
