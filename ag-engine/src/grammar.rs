//! Free-text command grammar.
//!
//! Pure parser for the words humans type into the approval chat: quick
//! approval/rejection tokens, the help shortcut, and the leave-period
//! grammar `[YY[YY]]{l|leave}[M[M]]` (case- and whitespace-insensitive),
//! e.g. `leave`, `l11`, `25leave`, `25 leave 10`.

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const APPROVAL_WORDS: &[&str] = &["y", "yes", "ok", "okay", "k"];
const REJECTION_WORDS: &[&str] = &["no", "n", "cannot", "not ok"];

static LEAVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<year>\d{2,4})?(?P<cmd>l(?:eave)?)(?P<month>\d{1,2})?$")
        .expect("leave pattern is valid")
});

/// A parsed reporting-period request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveQuery {
    #[serde(rename = "type")]
    pub scope: LeaveScope,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(rename = "explicitYear")]
    pub explicit_year: bool,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveScope {
    Month,
    Year,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Approve,
    Reject,
    Help,
    ShowLeaves(LeaveQuery),
}

/// Parse free text against the command surface using today's date for the
/// leave grammar's year-rollover rule. `None` means "not a command".
pub fn parse_command(input: &str) -> Option<Command> {
    parse_command_at(input, Local::now().date_naive())
}

/// Clock-injected variant of [`parse_command`].
pub fn parse_command_at(input: &str, today: NaiveDate) -> Option<Command> {
    let normalized = input.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    let first_token = normalized
        .split(|c: char| c.is_whitespace() || ",.!?:;()[]-".contains(c))
        .find(|t| !t.is_empty())
        .unwrap_or(normalized.as_str());

    let matches_set = |set: &[&str]| {
        set.contains(&first_token) || set.contains(&normalized.as_str())
    };
    if matches_set(APPROVAL_WORDS) {
        return Some(Command::Approve);
    }
    if matches_set(REJECTION_WORDS) {
        return Some(Command::Reject);
    }
    if first_token == "help" || first_token == "h" {
        return Some(Command::Help);
    }

    parse_leave_query_at(input, today).map(Command::ShowLeaves)
}

/// Parse the leave-period grammar on its own. Exposed because the backend
/// receives the query verbatim.
pub fn parse_leave_query_at(input: &str, today: NaiveDate) -> Option<LeaveQuery> {
    let raw = input.trim();
    if raw.is_empty() {
        return None;
    }
    let collapsed: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let captures = LEAVE_PATTERN.captures(&collapsed)?;

    let current_year = today.year();
    let current_month = today.month();
    let year_part = captures.name("year").map(|m| m.as_str());
    let explicit_year = year_part.is_some();

    if let Some(month_part) = captures.name("month") {
        let month: u32 = month_part.as_str().parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        let year = match year_part {
            Some(text) => parse_year(text),
            // No explicit year: a month already behind us means next year.
            None if month < current_month => current_year + 1,
            None => current_year,
        };
        return Some(LeaveQuery {
            scope: LeaveScope::Month,
            year,
            month: Some(month),
            explicit_year,
            raw: raw.to_string(),
        });
    }

    if let Some(text) = year_part {
        return Some(LeaveQuery {
            scope: LeaveScope::Year,
            year: parse_year(text),
            month: None,
            explicit_year,
            raw: raw.to_string(),
        });
    }

    // Bare `leave` / `l`: the current month.
    Some(LeaveQuery {
        scope: LeaveScope::Month,
        year: current_year,
        month: Some(current_month),
        explicit_year: false,
        raw: raw.to_string(),
    })
}

fn parse_year(text: &str) -> i32 {
    let value: i32 = text.parse().unwrap_or_default();
    if text.len() == 2 { 2000 + value } else { value }
}

#[cfg(test)]
mod tests {
    use super::{Command, LeaveScope, parse_command_at, parse_leave_query_at};
    use chrono::NaiveDate;

    fn march() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn december() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()
    }

    #[test]
    fn approval_words_parse_case_insensitively() {
        for word in ["yes", "Y", "OK", "okay", "k"] {
            assert_eq!(
                parse_command_at(word, march()),
                Some(Command::Approve),
                "{word} should approve"
            );
        }
    }

    #[test]
    fn rejection_words_include_the_two_word_form() {
        for word in ["no", "N", "cannot"] {
            assert_eq!(parse_command_at(word, march()), Some(Command::Reject));
        }
        assert_eq!(
            parse_command_at("Not Ok", march()),
            Some(Command::Reject),
            "matches on the whole normalized string"
        );
    }

    #[test]
    fn first_token_decides_for_longer_messages() {
        assert_eq!(
            parse_command_at("ok, approved then", march()),
            Some(Command::Approve)
        );
        assert_eq!(parse_command_at("no way", march()), Some(Command::Reject));
    }

    #[test]
    fn help_words_parse() {
        assert_eq!(parse_command_at("help", march()), Some(Command::Help));
        assert_eq!(parse_command_at("H", march()), Some(Command::Help));
    }

    #[test]
    fn bare_leave_means_current_month() {
        for word in ["leave", "l", "LEAVE"] {
            let Some(Command::ShowLeaves(query)) = parse_command_at(word, march()) else {
                panic!("{word} should be a leave query");
            };
            assert_eq!(query.scope, LeaveScope::Month);
            assert_eq!(query.year, 2025);
            assert_eq!(query.month, Some(3));
            assert!(!query.explicit_year);
        }
    }

    #[test]
    fn future_month_stays_in_current_year() {
        let query = parse_leave_query_at("leave11", march()).expect("should parse");
        assert_eq!(query.month, Some(11));
        assert_eq!(query.year, 2025);
    }

    #[test]
    fn past_month_rolls_to_next_year() {
        let query = parse_leave_query_at("leave11", december()).expect("should parse");
        assert_eq!(query.month, Some(11));
        assert_eq!(query.year, 2026, "11 < 12 means next calendar year");
    }

    #[test]
    fn explicit_year_without_month_is_a_year_query() {
        let query = parse_leave_query_at("25leave", march()).expect("should parse");
        assert_eq!(query.scope, LeaveScope::Year);
        assert_eq!(query.year, 2025);
        assert!(query.explicit_year);
        assert_eq!(query.month, None);
    }

    #[test]
    fn explicit_year_pins_the_month_year() {
        let query = parse_leave_query_at("25 leave 10", december()).expect("should parse");
        assert_eq!(query.scope, LeaveScope::Month);
        assert_eq!(query.year, 2025);
        assert_eq!(query.month, Some(10));
        assert_eq!(query.raw, "25 leave 10", "raw keeps the original spacing");
    }

    #[test]
    fn four_digit_years_pass_through() {
        let query = parse_leave_query_at("2026l1", march()).expect("should parse");
        assert_eq!(query.year, 2026);
        assert_eq!(query.month, Some(1));
    }

    #[test]
    fn out_of_range_month_rejects_the_whole_parse() {
        assert_eq!(parse_leave_query_at("leave13", march()), None);
        assert_eq!(parse_leave_query_at("l0", march()), None);
    }

    #[test]
    fn unrelated_text_is_not_a_command() {
        for text in ["hello there", "leaves", "ll", "approve it please", ""] {
            assert_eq!(parse_command_at(text, march()), None, "{text:?}");
        }
    }

    #[test]
    fn raw_round_trips_for_well_formed_tokens() {
        for token in ["leave", "l11", "2511", "25 leave 10"] {
            if let Some(query) = parse_leave_query_at(token, march()) {
                assert_eq!(query.raw, token);
                if let Some(month) = query.month {
                    assert!((1..=12).contains(&month));
                }
            }
        }
    }
}
