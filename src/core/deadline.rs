//! Parsing of Russian deadline text such as "До 15 окт", "1 окт 15 ноя" or "1...5 мар".

use crate::domain::model::DateRange;
use crate::utils::error::DeadlineError;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "янв", "фев", "мар", "апр", "май", "июн", "июл", "авг", "сен", "окт", "ноя", "дек",
];

/// Months from September onward belong to the first calendar year of a cycle.
const CYCLE_FIRST_MONTH: u32 = 9;

const UNTIL_MARKER: &str = "до";

static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s.…\-–—]+").expect("static regex is valid"));

/// A school year running September through August.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicCycle {
    pub start_year: i32,
}

impl AcademicCycle {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    /// The cycle a given day falls in.
    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= CYCLE_FIRST_MONTH {
            Self::new(date.year())
        } else {
            Self::new(date.year() - 1)
        }
    }

    pub fn current() -> Self {
        Self::containing(chrono::Local::now().date_naive())
    }

    pub fn year_for_month(&self, month: u32) -> i32 {
        if month >= CYCLE_FIRST_MONTH {
            self.start_year
        } else {
            self.start_year + 1
        }
    }
}

pub fn month_number(abbrev: &str) -> Option<u32> {
    let abbrev = abbrev.to_lowercase();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|candidate| *candidate == abbrev)
        .map(|index| index as u32 + 1)
}

fn unparseable(text: &str, reason: impl Into<String>) -> DeadlineError {
    DeadlineError::UnparseableDate {
        text: text.to_string(),
        reason: reason.into(),
    }
}

fn parse_day(text: &str, token: &str) -> Result<u32, DeadlineError> {
    token
        .parse::<u32>()
        .map_err(|_| unparseable(text, format!("'{}' is not a day number", token)))
}

#[derive(Debug, Clone, Copy)]
pub struct DeadlineParser {
    cycle: AcademicCycle,
}

impl DeadlineParser {
    pub fn new(cycle: AcademicCycle) -> Self {
        Self { cycle }
    }

    pub fn cycle(&self) -> AcademicCycle {
        self.cycle
    }

    /// Resolves a day and month abbreviation to a calendar date within the cycle.
    ///
    /// Days are checked against the real month length, so "31 ноя" is rejected.
    pub fn transform_date(&self, day: u32, abbrev: &str) -> Result<NaiveDate, DeadlineError> {
        let month = month_number(abbrev).ok_or_else(|| DeadlineError::UnknownMonthAbbreviation {
            abbrev: abbrev.to_string(),
        })?;
        let year = self.cycle.year_for_month(month);

        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            unparseable(
                &format!("{} {}", day, abbrev),
                format!("day {} does not exist in {}-{:02}", day, year, month),
            )
        })
    }

    /// Parses one deadline cell.
    ///
    /// Recognized shapes, after collapsing dots, ellipses and dashes to spaces:
    /// - `До <day> <month>`: open start, fixed end
    /// - `<day> <month> <day> <month>`: range across months
    /// - `<day> <day> <month>`: range within one month
    pub fn parse(&self, text: &str) -> Result<DateRange, DeadlineError> {
        let normalized = SEPARATOR_RUN.replace_all(text, " ");
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        match tokens.as_slice() {
            [marker, day, month] if marker.to_lowercase() == UNTIL_MARKER => {
                let end = self.transform_date(parse_day(text, day)?, month)?;
                Ok(DateRange::until(end))
            }
            [start_day, start_month, end_day, end_month] => {
                let start = self.transform_date(parse_day(text, start_day)?, start_month)?;
                let end = self.transform_date(parse_day(text, end_day)?, end_month)?;
                Ok(DateRange::between(start, end))
            }
            [start_day, end_day, month] => {
                let start = self.transform_date(parse_day(text, start_day)?, month)?;
                let end = self.transform_date(parse_day(text, end_day)?, month)?;
                Ok(DateRange::between(start, end))
            }
            _ => Err(unparseable(
                text,
                format!("expected 3 or 4 tokens, found {}", tokens.len()),
            )),
        }
    }
}

pub fn parse_deadline(text: &str, cycle: AcademicCycle) -> Result<DateRange, DeadlineError> {
    DeadlineParser::new(cycle).parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i32 = 2021;

    fn parser() -> DeadlineParser {
        DeadlineParser::new(AcademicCycle::new(YEAR))
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_until_shape_has_only_end() {
        let range = parser().parse("До 15 окт").unwrap();
        assert_eq!(range.start, None);
        assert_eq!(range.end, Some(date(YEAR, 10, 15)));
    }

    #[test]
    fn test_two_month_range() {
        let range = parser().parse("1 окт 15 ноя").unwrap();
        assert_eq!(range, DateRange::between(date(YEAR, 10, 1), date(YEAR, 11, 15)));
    }

    #[test]
    fn test_shared_month_range_in_spring() {
        let range = parser().parse("1 5 мар").unwrap();
        assert_eq!(
            range,
            DateRange::between(date(YEAR + 1, 3, 1), date(YEAR + 1, 3, 5))
        );
    }

    #[test]
    fn test_range_spanning_new_year() {
        let range = parser().parse("25 дек 10 янв").unwrap();
        assert_eq!(
            range,
            DateRange::between(date(YEAR, 12, 25), date(YEAR + 1, 1, 10))
        );
    }

    #[test]
    fn test_separator_runs_collapse() {
        assert_eq!(
            parser().parse("1...5 мар").unwrap(),
            parser().parse("1 5 мар").unwrap()
        );
        assert_eq!(
            parser().parse("1 окт…15 ноя").unwrap(),
            parser().parse("1 окт 15 ноя").unwrap()
        );
        assert_eq!(
            parser().parse("  1 окт  —  15   ноя ").unwrap(),
            parser().parse("1 окт 15 ноя").unwrap()
        );
        assert_eq!(
            parser().parse("до 3 фев.").unwrap(),
            DateRange::until(date(YEAR + 1, 2, 3))
        );
    }

    #[test]
    fn test_garbage_is_unparseable() {
        assert!(matches!(
            parser().parse("garbage text"),
            Err(DeadlineError::UnparseableDate { .. })
        ));
        assert!(matches!(
            parser().parse(""),
            Err(DeadlineError::UnparseableDate { .. })
        ));
        assert!(matches!(
            parser().parse("1 2 3 4 5"),
            Err(DeadlineError::UnparseableDate { .. })
        ));
    }

    #[test]
    fn test_unknown_month() {
        assert_eq!(
            parser().parse("1 5 xyz"),
            Err(DeadlineError::UnknownMonthAbbreviation {
                abbrev: "xyz".to_string()
            })
        );
    }

    #[test]
    fn test_impossible_day_is_rejected() {
        assert!(matches!(
            parser().parse("До 31 ноя"),
            Err(DeadlineError::UnparseableDate { .. })
        ));
        assert!(matches!(
            parser().parse("0 5 мар"),
            Err(DeadlineError::UnparseableDate { .. })
        ));
    }

    #[test]
    fn test_every_month_maps_into_cycle() {
        let parser = parser();
        for (index, abbrev) in MONTH_ABBREVIATIONS.iter().enumerate() {
            let resolved = parser.transform_date(1, abbrev).unwrap();
            let month = index as u32 + 1;
            assert_eq!(resolved.month(), month);
            let expected_year = if month >= 9 { YEAR } else { YEAR + 1 };
            assert_eq!(resolved.year(), expected_year);
            assert_eq!(parser.transform_date(1, abbrev).unwrap(), resolved);
        }
    }

    #[test]
    fn test_month_lookup_ignores_case() {
        assert_eq!(month_number("Окт"), Some(10));
        assert_eq!(month_number("МАЙ"), Some(5));
        assert_eq!(month_number("октябрь"), None);
    }

    #[test]
    fn test_cycle_containing() {
        assert_eq!(AcademicCycle::containing(date(2024, 9, 1)).start_year, 2024);
        assert_eq!(AcademicCycle::containing(date(2025, 8, 31)).start_year, 2024);
    }

    #[test]
    fn test_parse_is_repeatable() {
        let first = parse_deadline("1 окт 15 ноя", AcademicCycle::new(YEAR));
        let second = parse_deadline("1 окт 15 ноя", AcademicCycle::new(YEAR));
        assert_eq!(first, second);
    }
}
