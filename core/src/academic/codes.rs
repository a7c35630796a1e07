//! Encoding and decoding of the legacy course/year/section string.
//!
//! Two forms exist: compact (`BSIT3A`: course, year digit, section letters)
//! used when a section is known, and verbose (`BSIT 3rd Year`) otherwise.
//! Decoding only understands single-digit years and single-letter sections.

use std::sync::LazyLock;

use regex::Regex;

use super::tables::year_level_label;

/// Placeholder shown when course or year level is missing.
pub const NOT_AVAILABLE: &str = "N/A";

static LEADING_COURSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^0-9]+)([0-9].*)$").expect("course split pattern"));
static COMPACT_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9])([A-Z])$").expect("compact pattern"));
static VERBOSE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9])(?:st|nd|rd|th)?$").expect("verbose pattern"));

/// Fields recovered from a legacy string. Anything unparseable is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCourseYear {
    pub course: Option<String>,
    pub year_level: Option<u8>,
    pub section: Option<String>,
}

/// Trims and uppercases a section code, keeping at most two characters.
/// Blank input yields `None`.
pub fn normalize_section(section: &str) -> Option<String> {
    let normalized: String = section.trim().to_uppercase().chars().take(2).collect();
    (!normalized.is_empty()).then_some(normalized)
}

/// Builds the legacy display string.
///
/// A missing or empty course, or a missing or zero year level, yields
/// [`NOT_AVAILABLE`].
pub fn format_course_year_section(
    course: Option<&str>,
    year_level: Option<u8>,
    section: Option<&str>,
) -> String {
    let course = course.filter(|c| !c.is_empty());
    let (Some(course), Some(year)) = (course, year_level.filter(|y| *y > 0)) else {
        return NOT_AVAILABLE.to_string();
    };

    match section.and_then(normalize_section) {
        Some(section) => format!("{course}{year}{section}"),
        None => format!("{course} {}", year_level_label(year)),
    }
}

/// Recovers course, year level and section from a legacy string.
///
/// With whitespace, the first token is the course and the second carries
/// the year. A single token is split at its first digit. When the year part
/// is not recognized the course is kept whole and the rest is dropped.
pub fn parse_course_year(legacy: &str) -> ParsedCourseYear {
    let mut tokens = legacy.split_whitespace();
    let Some(first) = tokens.next() else {
        return ParsedCourseYear::default();
    };

    let (course, tail) = match tokens.next() {
        Some(second) => (first, Some(second)),
        None => match LEADING_COURSE.captures(first) {
            Some(caps) => match (caps.get(1), caps.get(2)) {
                (Some(course), Some(tail)) => (course.as_str(), Some(tail.as_str())),
                _ => (first, None),
            },
            None => (first, None),
        },
    };

    match tail.and_then(parse_year_section) {
        Some((year_level, section)) => ParsedCourseYear {
            course: Some(course.to_string()),
            year_level: Some(year_level),
            section,
        },
        None => ParsedCourseYear {
            course: Some(first.to_string()),
            year_level: None,
            section: None,
        },
    }
}

/// `3A` is compact (year and section); `3`, `3rd` etc. are verbose.
fn parse_year_section(tail: &str) -> Option<(u8, Option<String>)> {
    if let Some(caps) = COMPACT_TAIL.captures(tail) {
        let year = caps[1].parse().ok()?;
        return Some((year, Some(caps[2].to_string())));
    }
    let caps = VERBOSE_TAIL.captures(tail)?;
    Some((caps[1].parse().ok()?, None))
}
