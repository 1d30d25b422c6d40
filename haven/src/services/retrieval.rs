//! Turns raw search hits into the text block injected into the prompt.

use crate::geo;
use crate::models::{ScoredShelter, UserLocation};
use crate::policy::ShelterPolicy;

const SEGMENT_SEPARATOR: &str = " • ";

/// Attach distances and, when the user location is known, order hits
/// nearest first. Hits without coordinates keep their relative order at the
/// end.
pub fn rank_by_distance(
    mut hits: Vec<ScoredShelter>,
    location: Option<UserLocation>,
) -> Vec<ScoredShelter> {
    let Some(location) = location else {
        return hits;
    };

    for hit in &mut hits {
        hit.distance_km = Some(geo::haversine_km(
            location,
            hit.record.lat,
            hit.record.lon,
        ));
    }

    // sort_by is stable; INFINITY compares greater than every finite value.
    hits.sort_by(|a, b| {
        let da = a.distance_km.unwrap_or(f64::INFINITY);
        let db = b.distance_km.unwrap_or(f64::INFINITY);
        da.total_cmp(&db)
    });

    tracing::debug!(count = hits.len(), "Sorted shelters by distance");
    hits
}

/// First sentence-ish fragment of a services description.
pub fn services_excerpt(services: &str) -> &str {
    services
        .split(['.', ';'])
        .next()
        .unwrap_or_default()
        .trim()
}

/// One markdown bullet per shelter.
pub fn format_line(shelter: &ScoredShelter, policy: &dyn ShelterPolicy) -> String {
    let record = &shelter.record;
    let services = record.services.as_deref().filter(|s| !s.trim().is_empty());

    let mut line = format!(
        "- **{}** — {}",
        record.name,
        policy.redact_address(services, record.address.as_deref())
    );

    if let Some(km) = shelter.distance_km.filter(|km| km.is_finite()) {
        line.push_str(SEGMENT_SEPARATOR);
        line.push_str(&geo::format_miles(km));
        line.push_str(" mi");
    }

    for segment in [record.phone.as_deref(), record.website.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        line.push_str(SEGMENT_SEPARATOR);
        line.push_str(segment);
    }

    if let Some(excerpt) = services.map(services_excerpt).filter(|e| !e.is_empty()) {
        line.push_str(SEGMENT_SEPARATOR);
        line.push_str(excerpt);
    }

    line
}

pub fn format_list(shelters: &[ScoredShelter], policy: &dyn ShelterPolicy) -> String {
    shelters
        .iter()
        .map(|shelter| format_line(shelter, policy))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The hit the user asked about by name, if any.
///
/// Matches on the first word of each shelter name, in ranked order, so a
/// query mentioning "stewpot" focuses "The Stewpot" only if no earlier hit's
/// first word ("the") already occurs in the query.
pub fn find_focused<'a>(query: &str, shelters: &'a [ScoredShelter]) -> Option<&'a ScoredShelter> {
    let query = query.to_lowercase();
    shelters.iter().find(|shelter| {
        let name = shelter.record.name.to_lowercase();
        name.split_whitespace()
            .next()
            .is_some_and(|first| query.contains(first))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShelterRecord;
    use crate::policy::{KeywordPolicy, WITHHELD_ADDRESS};
    use pretty_assertions::assert_eq;

    const DALLAS: UserLocation = UserLocation {
        lat: 32.7767,
        lon: -96.7970,
    };

    fn hit(name: &str, coords: Option<(f64, f64)>) -> ScoredShelter {
        ScoredShelter::new(
            ShelterRecord {
                name: name.to_string(),
                lat: coords.map(|c| c.0),
                lon: coords.map(|c| c.1),
                ..Default::default()
            },
            0.5,
        )
    }

    #[test]
    fn ranks_nearest_first_with_unlocated_last() {
        let hits = vec![
            hit("Far", Some((32.90, -96.70))),
            hit("Unknown", None),
            hit("Near", Some((32.78, -96.80))),
            hit("Middle", Some((32.82, -96.78))),
        ];

        let ranked = rank_by_distance(hits, Some(DALLAS));
        let names: Vec<_> = ranked.iter().map(|h| h.record.name.as_str()).collect();

        assert_eq!(names, vec!["Near", "Middle", "Far", "Unknown"]);
        assert_eq!(ranked[3].distance_km, Some(f64::INFINITY));
    }

    #[test]
    fn ranking_keeps_search_order_without_location() {
        let hits = vec![hit("B", Some((32.9, -96.7))), hit("A", Some((32.78, -96.8)))];
        let ranked = rank_by_distance(hits, None);

        assert_eq!(ranked[0].record.name, "B");
        assert!(ranked.iter().all(|h| h.distance_km.is_none()));
    }

    #[test]
    fn ranking_is_stable_for_equal_distances() {
        let hits = vec![
            hit("First", None),
            hit("Second", None),
            hit("Third", None),
        ];
        let ranked = rank_by_distance(hits, Some(DALLAS));
        let names: Vec<_> = ranked.iter().map(|h| h.record.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn excerpt_stops_at_first_period_or_semicolon() {
        assert_eq!(services_excerpt("Meals; showers. Case management"), "Meals");
        assert_eq!(services_excerpt("Emergency shelter. Meals"), "Emergency shelter");
        assert_eq!(services_excerpt("No punctuation"), "No punctuation");
    }

    #[test]
    fn full_line_has_every_segment() {
        let mut shelter = hit("The Stewpot", Some((32.78, -96.80)));
        shelter.record.address = Some("1835 Young St, Dallas, TX".to_string());
        shelter.record.phone = Some("(214) 746-2785".to_string());
        shelter.record.website = Some("https://thestewpot.org".to_string());
        shelter.record.services = Some("Meals and case management. Open daily".to_string());
        shelter.distance_km = Some(12.4);

        assert_eq!(
            format_line(&shelter, &KeywordPolicy),
            "- **The Stewpot** — 1835 Young St, Dallas, TX • 7.7 mi • (214) 746-2785 • https://thestewpot.org • Meals and case management"
        );
    }

    #[test]
    fn line_omits_missing_segments() {
        let mut shelter = hit("Austin Street Center", None);
        shelter.distance_km = Some(f64::INFINITY);

        assert_eq!(
            format_line(&shelter, &KeywordPolicy),
            "- **Austin Street Center** — N/A"
        );
    }

    #[test]
    fn line_redacts_protected_address() {
        let mut shelter = hit("Genesis", None);
        shelter.record.address = Some("Somewhere private".to_string());
        shelter.record.services = Some("Family violence shelter; counseling".to_string());

        let line = format_line(&shelter, &KeywordPolicy);
        assert_eq!(
            line,
            format!("- **Genesis** — {WITHHELD_ADDRESS} • Family violence shelter")
        );
    }

    #[test]
    fn list_joins_lines_with_newlines() {
        let shelters = vec![hit("A", None), hit("B", None)];
        assert_eq!(
            format_list(&shelters, &KeywordPolicy),
            "- **A** — N/A\n- **B** — N/A"
        );
        assert_eq!(format_list(&[], &KeywordPolicy), "");
    }

    #[test]
    fn focused_matches_first_word_of_name() {
        let shelters = vec![hit("Austin Street Center", None), hit("Stewpot Dallas", None)];

        let focused = find_focused("Tell me about Stewpot", &shelters);
        assert_eq!(focused.map(|s| s.record.name.as_str()), Some("Stewpot Dallas"));

        assert!(find_focused("any beds tonight?", &shelters).is_none());
    }

    #[test]
    fn focused_skips_empty_names() {
        let shelters = vec![hit("", None), hit("   ", None), hit("Bridge", None)];
        let focused = find_focused("is the bridge open", &shelters);
        assert_eq!(focused.map(|s| s.record.name.as_str()), Some("Bridge"));
        assert!(find_focused("anything", &shelters).is_none());
    }
}
