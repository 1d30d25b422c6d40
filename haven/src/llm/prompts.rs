//! Prompt templates for the shelter assistant
//!
//! These templates use basic `format!()` interpolation for type safety.
//! Missing variables will cause compile-time errors.

use crate::models::{ScoredShelter, UserLocation};
use crate::policy::{ShelterPolicy, MISSING_FIELD};
use crate::services::retrieval;

/// Persona and safety policy sent as the first part of every system prompt.
pub const SYSTEM_PROMPT: &str = r#"
You are a compassionate chatbot designed to assist homeless individuals in the Dallas–Fort Worth (DFW) area. Your primary goal is to help users quickly find nearby shelters and essential resources through a supportive, conversational interface.

Core Principles:

Empathy and Respect:
Always respond in a caring, non-judgmental, and encouraging tone. Treat every user with dignity.

Clarity and Simplicity:
Provide clear, easy-to-understand instructions and information. Avoid jargon.

Accuracy:
Share up-to-date and reliable information about shelters, including location, hours, eligibility, and contact details.

Accessibility:
Support multiple languages (English, Spanish, and others as needed). Detect language and respond accordingly.

Safety:
Never share harmful, discriminatory, or judgmental content.
Avoid sensitive personal questions unless necessary for providing help.
Domestic violence shelters must have their addresses hidden unless they publicly publish them.

Capabilities:

Provide a list of nearby shelters.
Offer details such as:
- Address (hidden for DV shelters)
- Phone number
- Hours of operation
- Special requirements (e.g., ID, age, family status)

Suggest transportation options (public transit, walking directions).

Share additional resources:
- Food banks
- Medical clinics
- Hotlines

Maintain a warm, encouraging tone throughout the conversation.

Behavior Guidelines:

Begin with a warm greeting and ask how you can help.
If the user seems distressed, acknowledge their situation with empathy.
Ask for location politely only if it is NOT provided by the system or user.
If userLocation is provided, do NOT ask for location.
Provide information in short, clear steps.
Offer to repeat, expand, or clarify.
End conversations with encouragement and an invitation to return.

Example Style:

“Thank you for sharing that. Here are three shelters near you. Would you like directions or a phone number?”
“I'm here to help you find a safe place. I can show shelters nearest your location.”
"#;

/// Shelter information injected after the persona prompt.
#[derive(Debug, Clone, Copy)]
pub enum ShelterContext<'a> {
    /// No shelter-seeking intent, or nothing was found.
    None,
    /// The user named one specific shelter.
    Focused(&'a ScoredShelter),
    /// The sorted result list.
    List(&'a [ScoredShelter]),
}

/// Build the full system prompt for a request.
///
/// # Example
/// ```
/// use haven::llm::prompts::{system_prompt, ShelterContext, SYSTEM_PROMPT};
/// use haven::policy::KeywordPolicy;
///
/// let prompt = system_prompt(ShelterContext::None, &KeywordPolicy);
/// assert_eq!(prompt, SYSTEM_PROMPT);
/// ```
pub fn system_prompt(context: ShelterContext<'_>, policy: &dyn ShelterPolicy) -> String {
    match context {
        ShelterContext::None => SYSTEM_PROMPT.to_string(),
        ShelterContext::Focused(shelter) => {
            format!("{SYSTEM_PROMPT}{}", shelter_detail_block(shelter, policy))
        }
        ShelterContext::List(shelters) => format!(
            "{SYSTEM_PROMPT}\n\nNearby shelters (sorted by distance if location available):\n{}",
            retrieval::format_list(shelters, policy)
        ),
    }
}

/// Detail block for a single shelter the user asked about by name.
pub fn shelter_detail_block(shelter: &ScoredShelter, policy: &dyn ShelterPolicy) -> String {
    let record = &shelter.record;
    let services = record.services.as_deref();
    let or_missing = |value: Option<&str>| value.unwrap_or(MISSING_FIELD).to_string();

    format!(
        r#"
Shelter Information Requested:
Name: {name}
Address: {address}
Phone: {phone}
Website: {website}
Services: {services}

Provide a gentle, kind explanation of what this shelter offers."#,
        name = record.name,
        address = policy.redact_address(services, record.address.as_deref()),
        phone = or_missing(record.phone.as_deref()),
        website = or_missing(record.website.as_deref()),
        services = or_missing(services),
    )
}

/// The user message: the raw query, plus coordinates when known so the
/// model does not ask for them again.
///
/// # Example
/// ```
/// use haven::llm::prompts::user_message;
/// use haven::models::UserLocation;
///
/// let msg = user_message("shelter near me", Some(UserLocation { lat: 32.7767, lon: -96.797 }));
/// assert_eq!(msg, "shelter near me\n\nUser location: 32.7767, -96.797");
/// ```
pub fn user_message(query: &str, location: Option<UserLocation>) -> String {
    match location {
        Some(loc) => format!("{query}\n\nUser location: {}, {}", loc.lat, loc.lon),
        None => query.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShelterRecord;
    use crate::policy::{KeywordPolicy, WITHHELD_ADDRESS};

    fn shelter(name: &str, services: Option<&str>) -> ScoredShelter {
        ScoredShelter::new(
            ShelterRecord {
                name: name.to_string(),
                address: Some("1835 Young St, Dallas, TX, 75201".to_string()),
                phone: Some("(214) 746-2785".to_string()),
                services: services.map(str::to_string),
                ..Default::default()
            },
            0.8,
        )
    }

    #[test]
    fn detail_block_marks_missing_fields() {
        let block = shelter_detail_block(&shelter("The Stewpot", None), &KeywordPolicy);
        assert!(block.contains("Shelter Information Requested:"));
        assert!(block.contains("Name: The Stewpot"));
        assert!(block.contains("Address: 1835 Young St"));
        assert!(block.contains("Website: N/A"));
        assert!(block.contains("Services: N/A"));
        assert!(block.ends_with("Provide a gentle, kind explanation of what this shelter offers."));
    }

    #[test]
    fn detail_block_redacts_protected_shelter() {
        let block = shelter_detail_block(
            &shelter("Safe Haven", Some("Domestic violence shelter and hotline")),
            &KeywordPolicy,
        );
        assert!(block.contains(&format!("Address: {WITHHELD_ADDRESS}")));
        assert!(!block.contains("Young St"));
    }

    #[test]
    fn list_context_appends_heading_and_lines() {
        let shelters = vec![shelter("The Stewpot", Some("Meals. Case management."))];
        let prompt = system_prompt(ShelterContext::List(&shelters), &KeywordPolicy);

        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("Nearby shelters (sorted by distance if location available):\n- **The Stewpot**"));
    }

    #[test]
    fn user_message_without_location_is_raw_query() {
        assert_eq!(user_message("family shelter", None), "family shelter");
    }
}
