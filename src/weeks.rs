//! Week-based slicing of generated scheme/plan/notes content
//!
//! Schemes of work are generated as markdown with a weekly table and/or
//! "WEEK N" section headings. Follow-on generation steps (lesson plan from
//! scheme, notes from plan, exam from many weeks) need the slice of a
//! document belonging to one week. Extraction must never abort a
//! generation pipeline, so every function here is total: missing markers
//! resolve to fallback values.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

fn week_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bweek\s*(\d+)\b|\b(\d+)\b").expect("week pattern"))
}

/// Extract the topic for a specific week from scheme content.
///
/// Strategies, in order: pipe-table row whose first cell is the week
/// number (topic is the second cell); any line containing the week number
/// (topic is the trailing text up to the next `|`); a literal `TOPIC:`
/// marker; finally the literal "General Topic".
pub fn extract_week_topic(content: &str, week: u32) -> String {
    let week_str = week.to_string();

    // First try: table rows like "| 1 | Fractions | ... |"
    for line in content.lines() {
        if line.contains(&format!("| {} |", week_str)) || line.contains(&format!("|{}|", week_str))
        {
            let parts: Vec<&str> = line
                .split('|')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            if parts.len() >= 3 {
                return parts[1].to_string();
            }
        }
    }

    // Second try: flexible matching on any line mentioning the week number
    for line in content.lines() {
        if let Some((_, after)) = line.split_once(&week_str) {
            let mut topic = after.trim();
            if let Some((head, _)) = topic.split_once('|') {
                topic = head.trim();
            }
            if !topic.is_empty() {
                return topic.to_string();
            }
        }
    }

    // Fallback: a document-level TOPIC: marker
    for line in content.lines() {
        if let Some((_, after)) = line.split_once("TOPIC:") {
            return after.trim().to_string();
        }
    }

    "General Topic".to_string()
}

/// Extract the content slice belonging to a specific week.
///
/// Returns everything from the "WEEK {n}" marker up to (but not
/// including) the next "WEEK " occurrence, or to the end of the document
/// for the last week. Markers are matched case-sensitively; an absent
/// marker yields an empty string.
pub fn extract_week_content(content: &str, week: u32) -> String {
    let header = format!("WEEK {}", week);

    let start = match content.find(&header) {
        Some(i) => i,
        None => return String::new(),
    };

    let search_from = start + header.len();
    match content[search_from..].find("WEEK ") {
        Some(offset) => content[start..search_from + offset].to_string(),
        None => content[start..].to_string(),
    }
}

/// Collect the distinct week numbers present in scheme content.
///
/// Prefers a table scan (first pipe-delimited cell, if numeric) and falls
/// back to a pattern scan for "week N" or bare integers. Numerically
/// sorted; a document with zero parseable weeks still yields `[1]` so the
/// pipeline never sees a zero-week scheme.
pub fn extract_weeks_from_scheme(content: &str) -> Vec<u32> {
    let mut weeks: BTreeSet<u32> = BTreeSet::new();

    // Method 1: table-based extraction
    for line in content.lines() {
        if line.contains('|') {
            let parts: Vec<&str> = line
                .split('|')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            if let Some(first) = parts.first() {
                if let Ok(n) = first.parse::<u32>() {
                    weeks.insert(n);
                }
            }
        }
    }

    // Method 2: pattern-based extraction
    if weeks.is_empty() {
        for caps in week_pattern().captures_iter(content) {
            let num = caps.get(1).or_else(|| caps.get(2));
            if let Some(n) = num.and_then(|m| m.as_str().parse::<u32>().ok()) {
                weeks.insert(n);
            }
        }
    }

    if weeks.is_empty() {
        weeks.insert(1);
    }

    weeks.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEME_TABLE: &str = "\
# Scheme of Work

| Week | Topic | Objectives |
|------|-------|-----------|
| 1 | Fractions | Identify fractions |
| 2 | Decimals | Convert fractions to decimals |
";

    #[test]
    fn test_topic_from_table() {
        assert_eq!(extract_week_topic(SCHEME_TABLE, 1), "Fractions");
        assert_eq!(extract_week_topic(SCHEME_TABLE, 2), "Decimals");
    }

    #[test]
    fn test_topic_from_loose_line() {
        let content = "Week 3: Measurement of length";
        assert_eq!(extract_week_topic(content, 3), ": Measurement of length");
    }

    #[test]
    fn test_topic_marker_fallback() {
        let content = "Some scheme\nTOPIC: Whole Numbers\nmore text";
        assert_eq!(extract_week_topic(content, 9), "Whole Numbers");
    }

    #[test]
    fn test_topic_final_fallback() {
        assert_eq!(extract_week_topic("nothing here", 4), "General Topic");
    }

    #[test]
    fn test_week_content_slices() {
        let content = "WEEK 1\nfoo\nWEEK 2\nbar";
        assert_eq!(extract_week_content(content, 1), "WEEK 1\nfoo\n");
        assert_eq!(extract_week_content(content, 2), "WEEK 2\nbar");
    }

    #[test]
    fn test_week_content_missing_marker() {
        assert_eq!(extract_week_content("no markers at all", 1), "");
    }

    #[test]
    fn test_week_content_sections_are_contiguous() {
        let content = "intro\nWEEK 1\na\nb\nWEEK 2\nc\nWEEK 3\nd\n";
        let w1 = extract_week_content(content, 1);
        let w2 = extract_week_content(content, 2);
        let w3 = extract_week_content(content, 3);
        assert_eq!(w1, "WEEK 1\na\nb\n");
        assert_eq!(w2, "WEEK 2\nc\n");
        assert_eq!(w3, "WEEK 3\nd\n");
    }

    #[test]
    fn test_weeks_from_table() {
        assert_eq!(extract_weeks_from_scheme(SCHEME_TABLE), vec![1, 2]);
    }

    #[test]
    fn test_weeks_from_pattern() {
        let content = "Week 2 covers decimals.\nweek 1 covers fractions.";
        assert_eq!(extract_weeks_from_scheme(content), vec![1, 2]);
    }

    #[test]
    fn test_weeks_never_empty() {
        assert_eq!(extract_weeks_from_scheme(""), vec![1]);
        assert_eq!(extract_weeks_from_scheme("no numbers"), vec![1]);
    }

    #[test]
    fn test_weeks_sorted_numerically() {
        let content = "| 10 | Revision | x |\n| 2 | Decimals | y |\n| 1 | Fractions | z |";
        assert_eq!(extract_weeks_from_scheme(content), vec![1, 2, 10]);
    }
}
