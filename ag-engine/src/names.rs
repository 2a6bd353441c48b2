//! Applicant name extraction from quoted announcement text.
//!
//! When an admin replies to a leave announcement instead of tapping a
//! button, the applicant's name is only present in the quoted body. Pulling
//! it out is a heuristic over the known announcement formats, so it lives
//! behind a trait: orchestration code never sees the patterns.

use regex::Regex;
use std::sync::LazyLock;

pub trait ApplicantNameExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Option<String>;
}

/// Regex heuristic over the fixed set of announcement label formats:
/// Malay/English request headers (`Permohonan cuti baharu pada <date>: <name>`,
/// `New leave request on <date>: <name>`) and the bare `Name (CATEGORY)` form.
#[derive(Default)]
pub struct PatternNameExtractor;

struct Pattern {
    regex: &'static LazyLock<Regex>,
    group: usize,
}

static HEADER_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Permohonan cuti baharu pada|New leave request on)\s+[^:]+:\s*([^\n\r(]+)")
        .expect("valid pattern")
});
static HEADER_NEXT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Permohonan cuti baharu pada|New leave request on)\s+[^:]+:\s*\n\s*([^\n\r(]+)")
        .expect("valid pattern")
});
static NAME_WITH_CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z\s]+)\s*\([A-Z]+\)").expect("valid pattern"));
static HEADER_LOOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Permohonan cuti baharu pada|New leave request on)[^:]*:\s*([^\n\r]+)")
        .expect("valid pattern")
});

static PATTERNS: &[Pattern] = &[
    Pattern { regex: &HEADER_INLINE, group: 2 },
    Pattern { regex: &HEADER_NEXT_LINE, group: 2 },
    Pattern { regex: &NAME_WITH_CATEGORY, group: 1 },
    Pattern { regex: &HEADER_LOOSE, group: 2 },
];

impl ApplicantNameExtractor for PatternNameExtractor {
    fn extract(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        for pattern in PATTERNS {
            let Some(captures) = pattern.regex.captures(text) else {
                continue;
            };
            let Some(candidate) = captures.get(pattern.group) else {
                continue;
            };
            if let Some(name) = clean_name(candidate.as_str()) {
                return Some(name);
            }
        }
        None
    }
}

static TRAILING_CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]+\)\s*$").expect("valid pattern"));

fn clean_name(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = TRAILING_CATEGORY.replace(&collapsed, "").trim().to_string();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

#[cfg(test)]
mod tests {
    use super::{ApplicantNameExtractor, PatternNameExtractor};

    fn extract(text: &str) -> Option<String> {
        PatternNameExtractor.extract(text)
    }

    #[test]
    fn extracts_name_from_malay_header() {
        let body = "Permohonan cuti baharu pada 12 Nov 2025: Ahmad Faizal\nSila semak.";
        assert_eq!(extract(body).as_deref(), Some("Ahmad Faizal"));
    }

    #[test]
    fn extracts_name_from_english_header() {
        let body = "New leave request on 3 Oct: Lee Wei Ming";
        assert_eq!(extract(body).as_deref(), Some("Lee Wei Ming"));
    }

    #[test]
    fn strips_trailing_category_parenthetical() {
        let body = "Ahmad Faizal (LOWBED)";
        assert_eq!(extract(body).as_deref(), Some("Ahmad Faizal"));
    }

    #[test]
    fn collapses_internal_whitespace() {
        let body = "New leave request on 3 Oct:   Lee   Wei   Ming  ";
        assert_eq!(extract(body).as_deref(), Some("Lee Wei Ming"));
    }

    #[test]
    fn unrelated_text_yields_nothing() {
        assert_eq!(extract("ok"), None);
        assert_eq!(extract(""), None);
        assert_eq!(extract("1234 5678"), None);
    }
}
