//! Country pattern tables and subject alias tables
//!
//! Curriculum documents phrase grade levels differently per country
//! ("primary 4", "jss 2", "grade 5"). These tables drive grade detection
//! during ingestion and subject normalization during retrieval. Tables are
//! part of the TOML config; the compiled-in defaults cover Nigeria, and a
//! query for an unconfigured country falls back to the default country's
//! tables rather than failing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Keywords that imply a school level when they appear near a bare number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelKeywords {
    pub level: String,
    pub keywords: Vec<String>,
}

/// Inclusive grade-number range for a school level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelRange {
    pub level: String,
    pub min: u32,
    pub max: u32,
}

/// Grade detection tables for one country
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryPatterns {
    /// Regexes matched against chunk text. Two capture groups yield
    /// (level, number) directly; one capture group yields a bare number
    /// whose level is inferred from keywords and ranges.
    #[serde(default = "default_grade_patterns")]
    pub grade_patterns: Vec<String>,

    /// Ordered level-inference keyword tables (first match wins)
    #[serde(default = "default_inference_keywords")]
    pub inference_keywords: Vec<LevelKeywords>,

    /// Ordered number-range tables for level inference (first match wins)
    #[serde(default = "default_number_ranges")]
    pub number_ranges: Vec<LevelRange>,

    /// Subjects commonly taught in this country (used for prompts/status)
    #[serde(default = "default_country_subjects")]
    pub subjects: Vec<String>,
}

impl Default for CountryPatterns {
    fn default() -> Self {
        Self {
            grade_patterns: default_grade_patterns(),
            inference_keywords: default_inference_keywords(),
            number_ranges: default_number_ranges(),
            subjects: default_country_subjects(),
        }
    }
}

impl CountryPatterns {
    /// Compile the grade regexes, skipping (and warning about) invalid ones
    pub fn grade_regexes(&self) -> Vec<Regex> {
        self.grade_patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Skipping invalid grade pattern '{}': {}", p, e);
                    None
                }
            })
            .collect()
    }
}

fn default_grade_patterns() -> Vec<String> {
    vec![
        r"(primary|secondary|jss|sss)\s*(\d+)".to_string(),
        r"(?:grade|class|year)\s*(\d+)".to_string(),
    ]
}

fn default_inference_keywords() -> Vec<LevelKeywords> {
    vec![
        LevelKeywords {
            level: "primary".to_string(),
            keywords: vec![
                "pupil".to_string(),
                "primary school".to_string(),
                "basic education".to_string(),
            ],
        },
        LevelKeywords {
            level: "jss".to_string(),
            keywords: vec!["junior secondary".to_string(), "jss".to_string()],
        },
        LevelKeywords {
            level: "sss".to_string(),
            keywords: vec!["senior secondary".to_string(), "sss".to_string()],
        },
        LevelKeywords {
            level: "secondary".to_string(),
            keywords: vec!["secondary school".to_string(), "student".to_string()],
        },
    ]
}

fn default_number_ranges() -> Vec<LevelRange> {
    vec![
        LevelRange {
            level: "primary".to_string(),
            min: 1,
            max: 6,
        },
        LevelRange {
            level: "secondary".to_string(),
            min: 7,
            max: 12,
        },
    ]
}

fn default_country_subjects() -> Vec<String> {
    vec![
        "mathematics".to_string(),
        "english".to_string(),
        "basic science".to_string(),
        "civic education".to_string(),
        "social studies".to_string(),
    ]
}

/// Subject alias tables: many surface spellings map to one canonical name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectMappings {
    #[serde(default = "default_standard_subjects")]
    pub standard_subjects: Vec<String>,

    #[serde(default = "default_subject_aliases")]
    pub aliases: BTreeMap<String, String>,
}

impl Default for SubjectMappings {
    fn default() -> Self {
        Self {
            standard_subjects: default_standard_subjects(),
            aliases: default_subject_aliases(),
        }
    }
}

fn default_standard_subjects() -> Vec<String> {
    [
        "mathematics",
        "english",
        "basic science",
        "civic education",
        "social studies",
        "agricultural science",
        "computer studies",
        "physical and health education",
        "christian religious studies",
        "islamic religious studies",
        "home economics",
        "creative arts",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_subject_aliases() -> BTreeMap<String, String> {
    [
        ("math", "mathematics"),
        ("maths", "mathematics"),
        ("arithmetic", "mathematics"),
        ("english language", "english"),
        ("english studies", "english"),
        ("science", "basic science"),
        ("basic sci", "basic science"),
        ("civics", "civic education"),
        ("civic", "civic education"),
        ("social study", "social studies"),
        ("agric", "agricultural science"),
        ("agriculture", "agricultural science"),
        ("computer science", "computer studies"),
        ("ict", "computer studies"),
        ("phe", "physical and health education"),
        ("physical education", "physical and health education"),
        ("crs", "christian religious studies"),
        ("crk", "christian religious studies"),
        ("irs", "islamic religious studies"),
        ("home econs", "home economics"),
        ("creative art", "creative arts"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Per-country pattern tables with default-country fallback
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PatternsConfig {
    /// Country name → pattern tables. Countries absent from this map use
    /// the default country's tables.
    #[serde(default)]
    pub countries: BTreeMap<String, CountryPatterns>,
}

impl PatternsConfig {
    /// Look up patterns for a country, falling back to the default country,
    /// then to the compiled-in defaults
    pub fn for_country(&self, country: &str, default_country: &str) -> CountryPatterns {
        if let Some(p) = self.countries.get(country) {
            return p.clone();
        }
        if let Some(p) = self.countries.get(default_country) {
            warn!(
                "No pattern tables for country '{}', using '{}' defaults",
                country, default_country
            );
            return p.clone();
        }
        CountryPatterns::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns_compile() {
        let patterns = CountryPatterns::default();
        assert_eq!(patterns.grade_regexes().len(), patterns.grade_patterns.len());
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        let patterns = CountryPatterns {
            grade_patterns: vec!["(unclosed".to_string(), r"(\d+)".to_string()],
            ..Default::default()
        };
        assert_eq!(patterns.grade_regexes().len(), 1);
    }

    #[test]
    fn test_country_fallback() {
        let config = PatternsConfig::default();
        // Unknown country falls back to compiled-in defaults
        let patterns = config.for_country("ghana", "nigeria");
        assert!(!patterns.grade_patterns.is_empty());
    }

    #[test]
    fn test_aliases_target_standard_subjects() {
        let mappings = SubjectMappings::default();
        for target in mappings.aliases.values() {
            assert!(
                mappings.standard_subjects.contains(target),
                "alias target '{}' is not a standard subject",
                target
            );
        }
    }
}
