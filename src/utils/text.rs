// Text helpers shared by the keyword heuristics

/// True when `term` occurs in `haystack` delimited by non-alphanumeric
/// characters (or the string edges). Both sides are expected lowercased.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }

    let mut start = 0;
    while let Some(pos) = haystack[start..].find(term) {
        let begin = start + pos;
        let end = begin + term.len();

        let before_ok = haystack[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());

        if before_ok && after_ok {
            return true;
        }

        // Advance past the first char of this occurrence
        start = begin + haystack[begin..].chars().next().map_or(1, |c| c.len_utf8());
    }

    false
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts `text` to at most `max` chars, appending an ellipsis when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() > 254 || email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_term_word_boundaries() {
        assert!(contains_term("senior java developer", "java"));
        assert!(!contains_term("senior javascript developer", "java"));
        assert!(!contains_term("we build things", "ui"));
        assert!(contains_term("ui/ux designer", "ui"));
        assert!(contains_term("full stack engineer", "full stack"));
        assert!(contains_term("(remote)", "remote"));
    }

    #[test]
    fn test_contains_term_finds_later_occurrence() {
        assert!(contains_term("javascript and java", "java"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("jane@example.com"));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("jane example@x.com"));
        assert!(!is_valid_email("jane@localhost"));
    }
}
