pub mod conversation;
pub mod pharmacy;

pub use conversation::{ChatMessage, ConversationState, Role};
pub use pharmacy::{
    FollowUpContact, PartialPharmacyProfile, PharmacyProfile, Prescription,
    DEFAULT_CONTACT_PERSON,
};
