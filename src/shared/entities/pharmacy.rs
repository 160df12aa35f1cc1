use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder contact used when the directory record carries no contact person.
pub const DEFAULT_CONTACT_PERSON: &str = "Pharmacy Manager";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(default)]
    pub drug: String,
    #[serde(default)]
    pub count: u64,
}

/// A pharmacy as known to the sales assistant.
///
/// Built fresh from every directory read and replaced wholesale, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyProfile {
    #[serde(default, deserialize_with = "deserialize_opaque_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub rx_volume: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescriptions: Option<Vec<Prescription>>,
}

impl PharmacyProfile {
    pub fn contact_person_or_default(&self) -> &str {
        self.contact_person
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(DEFAULT_CONTACT_PERSON)
    }
}

/// Lead fields gathered from free-text replies before a profile exists.
///
/// `None` means "not mentioned yet"; blank strings are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialPharmacyProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_volume: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl PartialPharmacyProfile {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Field-wise last-write-wins: every field present in `update` replaces
    /// the existing value, absent fields keep it.
    pub fn merge(existing: &Self, update: Self) -> Self {
        Self {
            name: update.name.or_else(|| existing.name.clone()),
            address: update.address.or_else(|| existing.address.clone()),
            contact_person: update
                .contact_person
                .or_else(|| existing.contact_person.clone()),
            email: update.email.or_else(|| existing.email.clone()),
            rx_volume: update.rx_volume.or(existing.rx_volume),
            phone: update.phone.or_else(|| existing.phone.clone()),
        }
    }

    /// Name, contact person and a non-zero rx volume are required to create a lead.
    pub fn has_mandatory_fields(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.name)
            && filled(&self.contact_person)
            && self.rx_volume.is_some_and(|v| v > 0)
    }
}

/// Whatever is known about the caller, used by callback and email follow-ups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpContact {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub rx_volume: Option<u64>,
}

impl From<&PharmacyProfile> for FollowUpContact {
    fn from(profile: &PharmacyProfile) -> Self {
        Self {
            name: Some(profile.name.clone()),
            contact_person: profile.contact_person.clone(),
            email: profile.email.clone(),
            phone: Some(profile.phone.clone()),
            address: profile.address.clone(),
            rx_volume: Some(profile.rx_volume),
        }
    }
}

impl From<&PartialPharmacyProfile> for FollowUpContact {
    fn from(pending: &PartialPharmacyProfile) -> Self {
        Self {
            name: pending.name.clone(),
            contact_person: pending.contact_person.clone(),
            email: pending.email.clone(),
            phone: pending.phone.clone(),
            address: pending.address.clone(),
            rx_volume: pending.rx_volume,
        }
    }
}

/// Accepts the record id as either a JSON string or a JSON number.
pub(crate) fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(v)) => v,
        Some(RawId::Int(v)) => v.to_string(),
        Some(RawId::Float(v)) => v.to_string(),
        None => String::new(),
    })
}
