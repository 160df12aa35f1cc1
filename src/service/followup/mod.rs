//! Follow-up email composition.

use crate::shared::entities::{FollowUpContact, DEFAULT_CONTACT_PERSON};
use crate::shared::ports::followup::EmailContent;
use crate::shared::utils::format_thousands;

const FALLBACK_PHARMACY_NAME: &str = "your pharmacy";

/// Fixed-template email built only from the contact's fields.
pub fn compose_follow_up_email(contact: &FollowUpContact) -> EmailContent {
    let name = contact
        .name
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(FALLBACK_PHARMACY_NAME);
    let contact_person = contact
        .contact_person
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(DEFAULT_CONTACT_PERSON);
    let volume = contact.rx_volume.filter(|v| *v > 0);
    let volume_line = volume
        .map(format_thousands)
        .unwrap_or_else(|| "To be determined".to_string());
    let volume_pitch = volume
        .map(|v| format!("{}+", format_thousands(v)))
        .unwrap_or_else(|| "high volumes of".to_string());
    let location = contact
        .address
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("To be confirmed");

    let subject = format!("Follow-up: Pharmesol Solutions for {}", name);
    let body = format!(
        "Dear {contact_person},

Thank you for taking the time to speak with us today about how Pharmesol can support {name}.

Based on our conversation, here's what we discussed:
- Your current monthly prescription volume: {volume_line}
- Location: {location}

How Pharmesol can help your pharmacy:
• Streamlined prescription processing for high-volume operations
• Cost reduction strategies specifically designed for pharmacies handling {volume_pitch} prescriptions monthly
• Operational efficiency improvements
• Dedicated support for growing pharmacy businesses

Next Steps:
1. We'll prepare a customized proposal based on your specific needs
2. Schedule a detailed consultation to discuss implementation
3. Provide references from similar high-volume pharmacies

Please don't hesitate to reach out if you have any immediate questions.

Best regards,
The Pharmesol Sales Team

Phone: 1-800-PHARMESOL
Email: sales@pharmesol.com
Website: www.pharmesol.com"
    );

    EmailContent { subject, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_reflects_known_contact() {
        let contact = FollowUpContact {
            name: Some("ABC Pharmacy".to_string()),
            contact_person: Some("Jane".to_string()),
            email: Some("jane@abc.com".to_string()),
            phone: None,
            address: Some("Springfield, IL".to_string()),
            rx_volume: Some(8400),
        };
        let email = compose_follow_up_email(&contact);
        assert_eq!(email.subject, "Follow-up: Pharmesol Solutions for ABC Pharmacy");
        assert!(email.body.starts_with("Dear Jane,"));
        assert!(email.body.contains("monthly prescription volume: 8,400"));
        assert!(email.body.contains("handling 8,400+ prescriptions"));
        assert!(email.body.contains("Location: Springfield, IL"));
    }

    #[test]
    fn email_uses_placeholders_for_missing_fields() {
        let email = compose_follow_up_email(&FollowUpContact::default());
        assert!(email.body.contains("volume: To be determined"));
        assert!(email.body.contains("Location: To be confirmed"));
        assert!(email.body.contains("handling high volumes of prescriptions"));
        assert!(email.body.starts_with("Dear Pharmacy Manager,"));
    }

    #[test]
    fn email_is_pure() {
        let contact = FollowUpContact {
            name: Some("X".to_string()),
            ..Default::default()
        };
        let a = compose_follow_up_email(&contact);
        let b = compose_follow_up_email(&contact);
        assert_eq!(a.subject, b.subject);
        assert_eq!(a.body, b.body);
    }
}
