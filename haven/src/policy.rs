//! Safety and intent heuristics applied to search results.
//!
//! Both rules are plain substring checks. They over-trigger on purpose: a
//! withheld address that did not need withholding is acceptable, a published
//! domestic-violence shelter address is not. Substring matching also fires on
//! negations ("not a domestic violence shelter") and on words that merely
//! contain a keyword ("advocacy" contains "dv").

/// Replacement shown instead of a protected shelter's address.
pub const WITHHELD_ADDRESS: &str = "[Address withheld for safety]";

/// Shown when a shelter has no address on record.
pub const MISSING_FIELD: &str = "N/A";

const DV_KEYWORDS: &[&str] = &[
    "domestic violence",
    "women's shelter",
    "women\u{2019}s shelter",
    "women shelter",
    "dv",
    "abuse",
    "sexual assault",
    "family violence",
    "trafficking",
    "survivor",
];

const SHELTER_INTENT_KEYWORDS: &[&str] = &[
    "shelter", "homeless", "housing", "help", "place", "stay", "near", "safe", "find", "bed",
    "sleep",
];

/// Decides what shelter information may be shown and when.
pub trait ShelterPolicy: Send + Sync {
    /// Address to display for a shelter with the given services description.
    fn redact_address(&self, services: Option<&str>, address: Option<&str>) -> String;

    /// Whether the query is asking for shelter information at all.
    fn wants_shelters(&self, query: &str) -> bool;
}

/// Case-insensitive keyword matching over the whole string.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordPolicy;

impl KeywordPolicy {
    pub fn is_protected(services: &str) -> bool {
        let lower = services.to_lowercase();
        DV_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
    }
}

impl ShelterPolicy for KeywordPolicy {
    fn redact_address(&self, services: Option<&str>, address: Option<&str>) -> String {
        if services.is_some_and(Self::is_protected) {
            return WITHHELD_ADDRESS.to_string();
        }

        match address {
            Some(address) if !address.trim().is_empty() => address.to_string(),
            _ => MISSING_FIELD.to_string(),
        }
    }

    fn wants_shelters(&self, query: &str) -> bool {
        let lower = query.to_lowercase();
        SHELTER_INTENT_KEYWORDS
            .iter()
            .any(|keyword| lower.contains(keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "1100 Cadiz St, Dallas, TX, 75215";

    #[test]
    fn domestic_violence_shelter_address_is_withheld() {
        let redacted =
            KeywordPolicy.redact_address(Some("Domestic Violence Shelter"), Some(ADDRESS));
        assert_eq!(redacted, WITHHELD_ADDRESS);
        assert!(!redacted.contains("Cadiz"));
    }

    #[test]
    fn general_shelter_address_is_kept() {
        let address =
            KeywordPolicy.redact_address(Some("Family Emergency Shelter"), Some(ADDRESS));
        assert_eq!(address, ADDRESS);
    }

    #[test]
    fn every_keyword_redacts() {
        for services in [
            "Confidential women's shelter",
            "Women\u{2019}s Shelter and counseling",
            "WOMEN SHELTER",
            "DV hotline",
            "Recovery from abuse",
            "Sexual Assault response",
            "Family violence prevention",
            "Human trafficking survivors",
            "Survivor housing",
        ] {
            assert_eq!(
                KeywordPolicy.redact_address(Some(services), Some(ADDRESS)),
                WITHHELD_ADDRESS,
                "expected redaction for {services:?}"
            );
        }
    }

    #[test]
    fn negated_mention_still_redacts() {
        let redacted = KeywordPolicy
            .redact_address(Some("This is not a domestic violence shelter"), Some(ADDRESS));
        assert_eq!(redacted, WITHHELD_ADDRESS);
    }

    #[test]
    fn missing_address_is_placeholder() {
        assert_eq!(
            KeywordPolicy.redact_address(Some("Meals and showers"), None),
            MISSING_FIELD
        );
        assert_eq!(KeywordPolicy.redact_address(None, Some("  ")), MISSING_FIELD);
    }

    #[test]
    fn protected_shelter_without_address_is_still_withheld() {
        assert_eq!(
            KeywordPolicy.redact_address(Some("domestic violence"), None),
            WITHHELD_ADDRESS
        );
    }

    #[test]
    fn intent_detection() {
        assert!(KeywordPolicy.wants_shelters("I need a place to stay tonight"));
        assert!(KeywordPolicy.wants_shelters("Family SHELTER"));
        assert!(KeywordPolicy.wants_shelters("where can I find a bed"));
        assert!(!KeywordPolicy.wants_shelters("hello, nice weather"));
        assert!(!KeywordPolicy.wants_shelters("what time is it"));
    }
}
