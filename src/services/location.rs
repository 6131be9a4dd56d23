use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::utils::text::contains_term;

pub const REMOTE: &str = "Remote";
pub const NOT_SPECIFIED: &str = "Not specified";

const REMOTE_MARKERS: &[&str] = &[
    "remote",
    "fully remote",
    "wfh",
    "work from home",
    "work from anywhere",
    "anywhere",
];

/// (alias as written in posts, display name)
const COUNTRIES: &[(&str, &str)] = &[
    ("usa", "United States"),
    ("united states", "United States"),
    ("u.s.", "United States"),
    ("america", "United States"),
    ("uk", "United Kingdom"),
    ("united kingdom", "United Kingdom"),
    ("england", "United Kingdom"),
    ("canada", "Canada"),
    ("india", "India"),
    ("germany", "Germany"),
    ("france", "France"),
    ("netherlands", "Netherlands"),
    ("spain", "Spain"),
    ("portugal", "Portugal"),
    ("ireland", "Ireland"),
    ("poland", "Poland"),
    ("sweden", "Sweden"),
    ("switzerland", "Switzerland"),
    ("brazil", "Brazil"),
    ("mexico", "Mexico"),
    ("argentina", "Argentina"),
    ("nigeria", "Nigeria"),
    ("kenya", "Kenya"),
    ("south africa", "South Africa"),
    ("egypt", "Egypt"),
    ("uae", "United Arab Emirates"),
    ("united arab emirates", "United Arab Emirates"),
    ("israel", "Israel"),
    ("pakistan", "Pakistan"),
    ("bangladesh", "Bangladesh"),
    ("singapore", "Singapore"),
    ("indonesia", "Indonesia"),
    ("philippines", "Philippines"),
    ("vietnam", "Vietnam"),
    ("japan", "Japan"),
    ("south korea", "South Korea"),
    ("china", "China"),
    ("australia", "Australia"),
    ("new zealand", "New Zealand"),
];

/// (city as written in posts, display city, country display name)
const CITIES: &[(&str, &str, &str)] = &[
    ("new york", "New York", "United States"),
    ("nyc", "New York", "United States"),
    ("san francisco", "San Francisco", "United States"),
    ("sf", "San Francisco", "United States"),
    ("bay area", "San Francisco", "United States"),
    ("los angeles", "Los Angeles", "United States"),
    ("seattle", "Seattle", "United States"),
    ("austin", "Austin", "United States"),
    ("boston", "Boston", "United States"),
    ("chicago", "Chicago", "United States"),
    ("miami", "Miami", "United States"),
    ("denver", "Denver", "United States"),
    ("toronto", "Toronto", "Canada"),
    ("vancouver", "Vancouver", "Canada"),
    ("montreal", "Montreal", "Canada"),
    ("london", "London", "United Kingdom"),
    ("manchester", "Manchester", "United Kingdom"),
    ("dublin", "Dublin", "Ireland"),
    ("berlin", "Berlin", "Germany"),
    ("munich", "Munich", "Germany"),
    ("paris", "Paris", "France"),
    ("amsterdam", "Amsterdam", "Netherlands"),
    ("madrid", "Madrid", "Spain"),
    ("barcelona", "Barcelona", "Spain"),
    ("lisbon", "Lisbon", "Portugal"),
    ("warsaw", "Warsaw", "Poland"),
    ("stockholm", "Stockholm", "Sweden"),
    ("zurich", "Zurich", "Switzerland"),
    ("bangalore", "Bangalore", "India"),
    ("bengaluru", "Bangalore", "India"),
    ("mumbai", "Mumbai", "India"),
    ("delhi", "Delhi", "India"),
    ("new delhi", "New Delhi", "India"),
    ("gurgaon", "Gurugram", "India"),
    ("gurugram", "Gurugram", "India"),
    ("noida", "Noida", "India"),
    ("hyderabad", "Hyderabad", "India"),
    ("pune", "Pune", "India"),
    ("chennai", "Chennai", "India"),
    ("kolkata", "Kolkata", "India"),
    ("lagos", "Lagos", "Nigeria"),
    ("nairobi", "Nairobi", "Kenya"),
    ("cape town", "Cape Town", "South Africa"),
    ("cairo", "Cairo", "Egypt"),
    ("dubai", "Dubai", "United Arab Emirates"),
    ("tel aviv", "Tel Aviv", "Israel"),
    ("karachi", "Karachi", "Pakistan"),
    ("lahore", "Lahore", "Pakistan"),
    ("dhaka", "Dhaka", "Bangladesh"),
    ("jakarta", "Jakarta", "Indonesia"),
    ("manila", "Manila", "Philippines"),
    ("tokyo", "Tokyo", "Japan"),
    ("seoul", "Seoul", "South Korea"),
    ("sydney", "Sydney", "Australia"),
    ("melbourne", "Melbourne", "Australia"),
    ("sao paulo", "São Paulo", "Brazil"),
    ("são paulo", "São Paulo", "Brazil"),
    ("mexico city", "Mexico City", "Mexico"),
    ("buenos aires", "Buenos Aires", "Argentina"),
];

lazy_static! {
    /// Lowercased alias or display name → display name ("nyc" → "New York")
    pub static ref KNOWN_LOCATIONS: HashMap<String, &'static str> = {
        let mut known = HashMap::new();
        known.insert(REMOTE.to_lowercase(), REMOTE);
        for (alias, display) in COUNTRIES {
            known.insert(alias.to_string(), *display);
            known.insert(display.to_lowercase(), *display);
        }
        for (alias, city, _) in CITIES {
            known.insert(alias.to_string(), *city);
            known.insert(city.to_lowercase(), *city);
        }
        known
    };
}

/// Best-effort location from free text.
/// Remote markers win, then the longest matching city, then the longest country.
pub fn infer_location(text: &str) -> String {
    let lowered = text.to_lowercase();

    if REMOTE_MARKERS.iter().any(|marker| contains_term(&lowered, marker)) {
        return REMOTE.to_string();
    }

    let city = CITIES
        .iter()
        .filter(|(alias, _, _)| contains_term(&lowered, alias))
        .max_by_key(|(alias, _, _)| alias.len());

    if let Some((_, city, country)) = city {
        return format!("{}, {}", city, country);
    }

    let country = COUNTRIES
        .iter()
        .filter(|(alias, _)| contains_term(&lowered, alias))
        .max_by_key(|(alias, _)| alias.len());

    match country {
        Some((_, display)) => display.to_string(),
        None => NOT_SPECIFIED.to_string(),
    }
}

/// Maps a typed location filter onto the name stored on jobs
pub fn canonical_location(input: &str) -> Option<&'static str> {
    KNOWN_LOCATIONS.get(&input.trim().to_lowercase()).copied()
}

/// Scans text for any known location mention, returning its display name
pub fn find_location_mention(text: &str) -> Option<String> {
    match infer_location(text).as_str() {
        NOT_SPECIFIED => None,
        REMOTE => Some(REMOTE.to_string()),
        other => {
            // "City, Country" → "City" is more useful as a filter term
            Some(other.split(", ").next().unwrap_or(other).to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_wins() {
        assert_eq!(infer_location("Hiring in London (remote ok)"), "Remote");
        assert_eq!(infer_location("WFH position, India"), "Remote");
    }

    #[test]
    fn test_city_implies_country() {
        assert_eq!(infer_location("Onsite role in Bengaluru"), "Bangalore, India");
        assert_eq!(infer_location("Join us in Berlin!"), "Berlin, Germany");
    }

    #[test]
    fn test_longest_city_wins() {
        assert_eq!(infer_location("Office in New Delhi"), "New Delhi, India");
        assert_eq!(infer_location("Based in Mexico City"), "Mexico City, Mexico");
    }

    #[test]
    fn test_country_fallback() {
        assert_eq!(infer_location("Hiring across the United Kingdom"), "United Kingdom");
        assert_eq!(infer_location("Must be based in Canada"), "Canada");
    }

    #[test]
    fn test_no_substring_false_positives() {
        assert_eq!(infer_location("Office in Indiana"), NOT_SPECIFIED);
        assert_eq!(infer_location("Hiring a Java developer"), NOT_SPECIFIED);
    }

    #[test]
    fn test_canonical_location() {
        assert_eq!(canonical_location("berlin"), Some("Berlin"));
        assert_eq!(canonical_location(" REMOTE "), Some("Remote"));
        assert_eq!(canonical_location("atlantis"), None);
        assert_eq!(canonical_location("Bengaluru"), Some("Bangalore"));
        assert_eq!(canonical_location("usa"), Some("United States"));
    }

    #[test]
    fn test_find_location_mention() {
        assert_eq!(find_location_mention("backend jobs in paris"), Some("Paris".to_string()));
        assert_eq!(find_location_mention("remote frontend"), Some("Remote".to_string()));
        assert_eq!(find_location_mention("frontend jobs"), None);
    }
}
