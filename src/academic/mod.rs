//! Grade formulas for the university's weighted course score.
//!
//! Scores are percentages. `Total = 0.6 * RegTerm + 0.4 * Final`, where
//! `RegTerm` is the mean of the midterm and endterm registration scores.

mod course;
mod gpa;
mod syllabus;

pub use course::*;
pub use gpa::*;
pub use syllabus::*;

pub const COURSE_TERM_WEIGHT: f64 = 0.6;
pub const COURSE_FINAL_WEIGHT: f64 = 0.4;
pub const PASSING_THRESHOLD: f64 = 50.0;
pub const PASSING_TARGET_TOTAL: f64 = 50.1;
pub const SCHOLARSHIP_THRESHOLD: f64 = 70.0;
pub const HIGH_SCHOLARSHIP_THRESHOLD: f64 = 90.0;
pub const FX_MIN_EXCLUSIVE: f64 = 25.0;
pub const FX_MAX_EXCLUSIVE: f64 = 50.0;
pub const RETAKE_THRESHOLD: f64 = 25.0;
pub const ATTESTATION_SECTION_MAX: f64 = 100.0;

/// Parses a form field. Blank, unparsable and non-finite input yield `None`.
pub fn parse_input_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// A form field that distinguishes "left blank" from "filled with something
/// that is not a number".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum FieldValue {
    #[default]
    Blank,
    Invalid,
    Number(f64),
}

impl FieldValue {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return FieldValue::Blank;
        }
        parse_input_value(raw).map_or(FieldValue::Invalid, FieldValue::Number)
    }

    pub fn number(self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(value),
            FieldValue::Blank | FieldValue::Invalid => None,
        }
    }

    pub fn is_blank(self) -> bool {
        self == FieldValue::Blank
    }
}

pub fn is_percentage(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v.is_finite() && (0.0..=100.0).contains(&v))
}

pub fn format_score(score: f64, digits: usize) -> String {
    format!("{:.*}", digits, score)
}
