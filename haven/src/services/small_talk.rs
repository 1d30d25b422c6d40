use std::sync::OnceLock;

use regex::Regex;

/// Canned answer for greetings and thanks.
pub const QUICK_REPLY: &str = "Hi there — I can help you find nearby shelters or safe housing options. \
Try something like:\n\
- women’s shelter near me\n\
- family shelter\n\
- show shelters close to me\n\
- I need a place to stay tonight";

fn greeting_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(hi|hello|hey|thanks|thank you|good\s*(morning|evening)|how are you)\b")
            .unwrap_or_else(|e| panic!("invalid greeting pattern: {e}"))
    })
}

/// Returns the canned reply when the query opens with a greeting.
pub fn quick_reply(query: &str) -> Option<&'static str> {
    greeting_pattern()
        .is_match(query.trim_start())
        .then_some(QUICK_REPLY)
}
