//! Grade-level parsing and matching
//!
//! Curriculum documents encode grade levels inconsistently: spelled-out
//! numbers ("primary four"), digit ranges ("primary 4-6"), bare single
//! grades. The matcher unifies these at query time without requiring
//! ingestion to collapse everything to one canonical scheme: a stored
//! range is semantically different from a single grade and must stay a
//! range for containment checks.
//!
//! All functions here are pure and total: malformed input yields a
//! non-match or a fallback string, never an error.

use crate::config::CountryPatterns;

const WORD_NUMBERS: [(&str, u32); 9] = [
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
];

/// Extract a grade number from text like "primary four" or "primary 4".
///
/// Digit runs win over number words; returns `None` when neither is
/// present.
pub fn extract_grade_number(grade_text: &str) -> Option<u32> {
    let grade_text = grade_text.to_lowercase();

    if let Some(n) = first_number(&grade_text) {
        return Some(n);
    }

    for (word, num) in WORD_NUMBERS {
        if grade_text.contains(word) {
            return Some(num);
        }
    }

    None
}

/// Extract start and end numbers from a range like "primary 4-6"
pub fn extract_grade_range(grade_text: &str) -> Option<(u32, u32)> {
    let numbers = digit_runs(grade_text);
    if numbers.len() >= 2 {
        Some((numbers[0], numbers[1]))
    } else {
        None
    }
}

/// Whether a query grade falls within a stored grade or grade range.
///
/// Exact string equality (after trim/lowercase) short-circuits; otherwise
/// the query number is checked against the stored single grade or range.
/// Any extraction failure on either side yields `false`.
pub fn grade_matches(query_grade: &str, stored_grade: &str) -> bool {
    let query_grade = query_grade.trim().to_lowercase();
    let stored_grade = stored_grade.trim().to_lowercase();

    if query_grade == stored_grade {
        return true;
    }

    let query_num = match extract_grade_number(&query_grade) {
        Some(n) => n,
        None => return false,
    };

    if stored_grade.contains('-') {
        match extract_grade_range(&stored_grade) {
            Some((start, end)) => start <= query_num && query_num <= end,
            None => false,
        }
    } else {
        match extract_grade_number(&stored_grade) {
            Some(stored_num) => query_num == stored_num,
            None => false,
        }
    }
}

/// Convert free-form grade text to a standard form, preserving ranges.
///
/// Two or more numbers become "{level} {a}-{b}"; a single number becomes
/// "{level} {n}" with the level taken from the text or inferred from the
/// country's number ranges. No number at all yields "unknown".
pub fn standardize_grade_level(grade_text: &str, patterns: &CountryPatterns) -> String {
    let grade_text = grade_text.to_lowercase();
    let numbers = digit_runs(&grade_text);

    if numbers.is_empty() {
        return "unknown".to_string();
    }

    if numbers.len() > 1 {
        let (start, end) = (numbers[0], numbers[1]);
        let level = named_level(&grade_text).unwrap_or("primary");
        return format!("{} {}-{}", level, start, end);
    }

    let n = numbers[0];
    if let Some(level) = named_level(&grade_text) {
        return format!("{} {}", level, n);
    }

    // Bare number: infer the level from the country's number ranges
    for range in &patterns.number_ranges {
        if n >= range.min && n <= range.max {
            return format!("{} {}", range.level, n);
        }
    }

    format!("primary {}", n)
}

/// Infer a level for a bare grade number using country-specific context
/// keywords, then number ranges, then a generic fallback
pub fn infer_level_from_context(text: &str, grade_num: u32, patterns: &CountryPatterns) -> String {
    let text = text.to_lowercase();

    for entry in &patterns.inference_keywords {
        if entry.keywords.iter().any(|kw| text.contains(kw.as_str())) {
            return format!("{} {}", entry.level, grade_num);
        }
    }

    for range in &patterns.number_ranges {
        if grade_num >= range.min && grade_num <= range.max {
            return format!("{} {}", range.level, grade_num);
        }
    }

    format!("grade {}", grade_num)
}

/// Grade-specific topic lists attached to a document at ingestion time
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GradeTopics {
    pub grade: String,
    pub topics: Vec<String>,
}

/// Determine the specific grade level for a text chunk.
///
/// Grade-specific topic tables win; then explicit grade mentions matched
/// by the country's patterns; finally the document-level default (which
/// preserves a document-level range).
pub fn determine_chunk_grade(
    chunk_text: &str,
    grade_topics: &[GradeTopics],
    default_grade: &str,
    patterns: &CountryPatterns,
) -> String {
    let chunk_lower = chunk_text.to_lowercase();

    for entry in grade_topics {
        for topic in &entry.topics {
            if chunk_lower.contains(&topic.to_lowercase()) {
                return entry.grade.clone();
            }
        }
    }

    for re in patterns.grade_regexes() {
        if let Some(caps) = re.captures(&chunk_lower) {
            // Two capture groups: (level, number). One: bare number.
            if caps.len() >= 3 {
                if let (Some(level), Some(num)) = (caps.get(1), caps.get(2)) {
                    return format!("{} {}", level.as_str(), num.as_str());
                }
            }
            if let Some(num) = caps.get(1) {
                if let Ok(n) = num.as_str().parse::<u32>() {
                    return infer_level_from_context(&chunk_lower, n, patterns);
                }
            }
        }
    }

    default_grade.to_string()
}

/// School level named explicitly in the text, if any
fn named_level(text: &str) -> Option<&'static str> {
    if text.contains("primary") || text.contains("elementary") {
        Some("primary")
    } else if text.contains("jss") {
        Some("jss")
    } else if text.contains("sss") {
        Some("sss")
    } else if text.contains("secondary") {
        Some("secondary")
    } else if text.contains("tertiary") || text.contains("university") {
        Some("tertiary")
    } else {
        None
    }
}

fn first_number(text: &str) -> Option<u32> {
    digit_runs(text).into_iter().next()
}

fn digit_runs(text: &str) -> Vec<u32> {
    let mut runs = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            if let Ok(n) = current.parse() {
                runs.push(n);
            }
            current.clear();
        }
    }
    if !current.is_empty() {
        if let Ok(n) = current.parse() {
            runs.push(n);
        }
    }

    runs
}
