/// Normalize free text for matching: lowercase, alphanumeric words only,
/// single spaces between words.
///
/// Used by the fragment index (section-title keys) and the link resolver
/// (anchor-text and fuzzy-needle comparison). Both sides of every
/// comparison go through this function, so it is the single definition of
/// "the same text".
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `n` normalized words of a text, joined by single spaces.
pub fn first_words(text: &str, n: usize) -> String {
    normalize_text(text)
        .split(' ')
        .filter(|w| !w.is_empty())
        .take(n)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip everything except alphanumerics. Loosest comparison tier of the
/// fuzzy link matcher.
pub fn alnum_only(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Shared date/time calculation from system clock.
fn now_components() -> (u64, u64, u64, u64, u64, u64) {
    let now = std::time::SystemTime::now();
    let secs = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let days = secs / 86400;
    let years = (days * 400) / 146097;
    let year_start = (years * 146097) / 400;
    let remaining = days - year_start;
    let year = 1970 + years;
    let is_leap = (year.is_multiple_of(4) && !year.is_multiple_of(100)) || year.is_multiple_of(400);
    let month_days: &[u64] = if is_leap {
        &[31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        &[31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };
    let mut month = 0u64;
    let mut day_of_year = remaining;
    for (i, &md) in month_days.iter().enumerate() {
        if day_of_year < md {
            month = i as u64 + 1;
            break;
        }
        day_of_year -= md;
    }
    if month == 0 {
        month = 12;
    }
    let day = day_of_year + 1;
    let day_secs = secs % 86400;
    let hour = day_secs / 3600;
    let min = (day_secs % 3600) / 60;
    let sec = day_secs % 60;
    (year, month, day, hour, min, sec)
}

/// Current UTC timestamp in ISO 8601 format: `YYYY-MM-DDThh:mm:ssZ`.
///
/// Only used for the `dcterms:modified` metadata field; everything that
/// affects content is independent of the clock so repeated runs over the
/// same input stay byte-identical.
pub fn format_iso8601() -> String {
    let (year, month, day, hour, min, sec) = now_components();
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}Z")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_collapses_punctuation() {
        assert_eq!(normalize_text("  Getting Started!  "), "getting started");
        assert_eq!(normalize_text("A/B -- testing"), "a b testing");
    }

    #[test]
    fn normalize_text_empty() {
        assert_eq!(normalize_text("---"), "");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn first_words_takes_leading_words() {
        assert_eq!(
            first_words("One two three four five six seven", 5),
            "one two three four five"
        );
        assert_eq!(first_words("only two", 5), "only two");
    }

    #[test]
    fn alnum_only_strips_everything_else() {
        assert_eq!(alnum_only("See: Chapter 2!"), "seechapter2");
    }

    #[test]
    fn format_iso8601_shape() {
        let ts = format_iso8601();
        let re = regex::Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").unwrap();
        assert!(re.is_match(&ts), "bad timestamp format: {ts}");
    }
}
