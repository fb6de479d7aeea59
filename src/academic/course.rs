use super::{
    format_score, is_percentage, FieldValue, COURSE_FINAL_WEIGHT, COURSE_TERM_WEIGHT,
    FX_MAX_EXCLUSIVE, FX_MIN_EXCLUSIVE, HIGH_SCHOLARSHIP_THRESHOLD, PASSING_TARGET_TOTAL, PASSING_THRESHOLD,
    RETAKE_THRESHOLD, SCHOLARSHIP_THRESHOLD,
};
use std::fmt;

pub fn reg_term(reg_mid: f64, reg_end: f64) -> f64 {
    (reg_mid + reg_end) / 2.0
}

pub fn course_total(reg_term: f64, final_score: f64) -> f64 {
    COURSE_TERM_WEIGHT * reg_term + COURSE_FINAL_WEIGHT * final_score
}

/// Final exam score needed to reach a target total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequiredFinal {
    Score(f64),
    /// The formula asks for less than the FX bound, so the bound itself is
    /// what the student needs.
    RetakeSafeMinimum,
    NotAchievable,
}

impl fmt::Display for RequiredFinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredFinal::Score(score) => write!(f, "{}", format_score(*score, 1)),
            RequiredFinal::RetakeSafeMinimum => write!(
                f,
                "{} (retake-safe minimum)",
                format_score(FX_MAX_EXCLUSIVE, 1)
            ),
            RequiredFinal::NotAchievable => write!(f, "Not achievable (>100)"),
        }
    }
}

pub fn required_final(reg_term: f64, target: f64) -> RequiredFinal {
    let by_formula = (target - COURSE_TERM_WEIGHT * reg_term) / COURSE_FINAL_WEIGHT;
    let required = by_formula.max(FX_MAX_EXCLUSIVE);

    if required > 100.0 {
        RequiredFinal::NotAchievable
    } else if by_formula <= FX_MAX_EXCLUSIVE {
        RequiredFinal::RetakeSafeMinimum
    } else {
        RequiredFinal::Score(required)
    }
}

pub fn required_final_for_passing(reg_term: f64) -> RequiredFinal {
    required_final(reg_term, PASSING_TARGET_TOTAL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Ok,
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseStatus {
    MissingRegTerm,
    MissingFinal,
    FinalOutOfRange,
    Incomplete,
    RetakeRequired,
    FailedFinal,
    Fx,
    FailedTotal,
    HighScholarship,
    Scholarship,
    Passed,
}

impl CourseStatus {
    pub fn tone(&self) -> StatusTone {
        match self {
            CourseStatus::HighScholarship | CourseStatus::Scholarship | CourseStatus::Passed => {
                StatusTone::Ok
            }
            _ => StatusTone::Warn,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            CourseStatus::MissingRegTerm => "Set RegTerm directly or enter valid RegMid and RegEnd.",
            CourseStatus::MissingFinal => "Enter a final score to see your result.",
            CourseStatus::FinalOutOfRange => "Final score must be between 0 and 100.",
            CourseStatus::Incomplete => "-",
            CourseStatus::RetakeRequired => "Course retake required: RegMid < 25 and RegTerm < 25.",
            CourseStatus::FailedFinal => "Not passed: Final is 25 or below.",
            CourseStatus::Fx => "FX status: Final is between 25 and 50 (paid retake exam).",
            CourseStatus::FailedTotal => "Not passed: total score is below 50.",
            CourseStatus::HighScholarship => "Passed. Eligible for high scholarship (>= 90).",
            CourseStatus::Scholarship => "Passed. Eligible for scholarship (>= 70).",
            CourseStatus::Passed => "Passed the course (>= 50).",
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Applies the status rules in order; the first match wins.
pub fn course_status(
    reg_term: Option<f64>,
    reg_mid: Option<f64>,
    final_score: Option<f64>,
    total: Option<f64>,
) -> CourseStatus {
    let Some(reg_term) = reg_term else {
        return CourseStatus::MissingRegTerm;
    };
    let Some(final_value) = final_score else {
        return CourseStatus::MissingFinal;
    };
    if !is_percentage(final_score) {
        return CourseStatus::FinalOutOfRange;
    }
    let Some(total) = total else {
        return CourseStatus::Incomplete;
    };

    if matches!(reg_mid, Some(mid) if mid < RETAKE_THRESHOLD) && reg_term < RETAKE_THRESHOLD {
        return CourseStatus::RetakeRequired;
    }
    if final_value <= FX_MIN_EXCLUSIVE {
        return CourseStatus::FailedFinal;
    }
    if final_value < FX_MAX_EXCLUSIVE {
        return CourseStatus::Fx;
    }
    if total < PASSING_THRESHOLD {
        return CourseStatus::FailedTotal;
    }
    if total >= HIGH_SCHOLARSHIP_THRESHOLD {
        return CourseStatus::HighScholarship;
    }
    if total >= SCHOLARSHIP_THRESHOLD {
        return CourseStatus::Scholarship;
    }
    CourseStatus::Passed
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterGrade {
    pub min: f64,
    pub letter: &'static str,
    pub points: f64,
    pub traditional: &'static str,
}

pub static LETTER_GRADE_SCALE: [LetterGrade; 12] = [
    LetterGrade { min: 95.0, letter: "A", points: 4.0, traditional: "Excellent" },
    LetterGrade { min: 90.0, letter: "A-", points: 3.67, traditional: "Excellent" },
    LetterGrade { min: 85.0, letter: "B+", points: 3.33, traditional: "Good" },
    LetterGrade { min: 80.0, letter: "B", points: 3.0, traditional: "Good" },
    LetterGrade { min: 75.0, letter: "B-", points: 2.67, traditional: "Good" },
    LetterGrade { min: 70.0, letter: "C+", points: 2.33, traditional: "Good" },
    LetterGrade { min: 65.0, letter: "C", points: 2.0, traditional: "Satisfactory" },
    LetterGrade { min: 60.0, letter: "C-", points: 1.67, traditional: "Satisfactory" },
    LetterGrade { min: 55.0, letter: "D+", points: 1.33, traditional: "Satisfactory" },
    LetterGrade { min: 50.0, letter: "D", points: 1.0, traditional: "Satisfactory" },
    LetterGrade { min: 25.0, letter: "FX", points: 0.0, traditional: "Fail" },
    LetterGrade { min: 0.0, letter: "F", points: 0.0, traditional: "Fail" },
];

pub fn letter_grade(total: Option<f64>) -> Option<&'static LetterGrade> {
    if !is_percentage(total) {
        return None;
    }
    let total = total?;
    LETTER_GRADE_SCALE.iter().find(|grade| total >= grade.min)
}

/// Inputs of the course grade form. `None` means the field was left blank or
/// held garbage; only the manual total tells the two apart.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CourseInputs {
    pub reg_mid: Option<f64>,
    pub reg_end: Option<f64>,
    /// Overrides the RegMid/RegEnd mean when it is a valid percentage.
    pub reg_term: Option<f64>,
    pub final_score: Option<f64>,
    /// Overrides the computed total for the letter grade. Anything typed
    /// here that is not a percentage leaves the letter grade empty.
    pub manual_total: FieldValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseGrade {
    pub reg_term: Option<f64>,
    pub total: Option<f64>,
    pub status: CourseStatus,
    pub letter: Option<&'static LetterGrade>,
    /// The manual total was filled in but is not a percentage.
    pub letter_input_error: bool,
    pub required_for_pass: Option<RequiredFinal>,
    pub required_for_scholarship: Option<RequiredFinal>,
    pub required_for_high_scholarship: Option<RequiredFinal>,
}

impl CourseGrade {
    pub fn evaluate(inputs: &CourseInputs) -> Self {
        let from_formula = if is_percentage(inputs.reg_mid) && is_percentage(inputs.reg_end) {
            inputs.reg_mid.zip(inputs.reg_end).map(|(mid, end)| reg_term(mid, end))
        } else {
            None
        };
        let reg_term = if is_percentage(inputs.reg_term) {
            inputs.reg_term
        } else {
            from_formula
        };

        let total = match (reg_term, inputs.final_score) {
            (Some(term), Some(final_score)) if is_percentage(Some(final_score)) => {
                Some(course_total(term, final_score))
            }
            _ => None,
        };

        let letter_input_error =
            !inputs.manual_total.is_blank() && !is_percentage(inputs.manual_total.number());
        let letter_total = match inputs.manual_total {
            FieldValue::Blank => total,
            _ if letter_input_error => None,
            manual => manual.number(),
        };

        Self {
            reg_term,
            total,
            status: course_status(reg_term, inputs.reg_mid, inputs.final_score, total),
            letter: letter_grade(letter_total),
            letter_input_error,
            required_for_pass: reg_term.map(|term| required_final(term, PASSING_THRESHOLD)),
            required_for_scholarship: reg_term
                .map(|term| required_final(term, SCHOLARSHIP_THRESHOLD)),
            required_for_high_scholarship: reg_term
                .map(|term| required_final(term, HIGH_SCHOLARSHIP_THRESHOLD)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formulas() {
        assert_eq!(reg_term(60.0, 80.0), 70.0);
        assert!((course_total(70.0, 80.0) - 74.0).abs() < 1e-9);
    }

    #[test]
    fn test_required_final() {
        // (70 - 0.6 * 60) / 0.4 = 85
        match required_final(60.0, 70.0) {
            RequiredFinal::Score(score) => assert!((score - 85.0).abs() < 1e-9),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(required_final(100.0, 50.1), RequiredFinal::RetakeSafeMinimum);
        assert_eq!(required_final(20.0, 90.0), RequiredFinal::NotAchievable);
    }

    #[test]
    fn test_required_final_display() {
        assert_eq!(required_final(60.0, 70.0).to_string(), "85.0");
        assert_eq!(
            RequiredFinal::RetakeSafeMinimum.to_string(),
            "50.0 (retake-safe minimum)"
        );
        assert_eq!(RequiredFinal::NotAchievable.to_string(), "Not achievable (>100)");
        // (50.1 - 30) / 0.4 = 50.25
        match required_final_for_passing(50.0) {
            RequiredFinal::Score(score) => assert!((score - 50.25).abs() < 1e-9),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_status_order() {
        assert_eq!(course_status(None, None, None, None), CourseStatus::MissingRegTerm);
        assert_eq!(course_status(Some(60.0), None, None, None), CourseStatus::MissingFinal);
        assert_eq!(
            course_status(Some(60.0), None, Some(120.0), None),
            CourseStatus::FinalOutOfRange
        );
        assert_eq!(
            course_status(Some(20.0), Some(10.0), Some(80.0), Some(44.0)),
            CourseStatus::RetakeRequired
        );
        assert_eq!(
            course_status(Some(80.0), None, Some(25.0), Some(58.0)),
            CourseStatus::FailedFinal
        );
        assert_eq!(
            course_status(Some(80.0), None, Some(40.0), Some(64.0)),
            CourseStatus::Fx
        );
        assert_eq!(
            course_status(Some(40.0), None, Some(55.0), Some(46.0)),
            CourseStatus::FailedTotal
        );
        assert_eq!(
            course_status(Some(95.0), None, Some(90.0), Some(93.0)),
            CourseStatus::HighScholarship
        );
        assert_eq!(
            course_status(Some(70.0), None, Some(70.0), Some(70.0)),
            CourseStatus::Scholarship
        );
        assert_eq!(
            course_status(Some(50.0), None, Some(60.0), Some(54.0)),
            CourseStatus::Passed
        );
    }

    #[test]
    fn test_status_tone() {
        assert_eq!(CourseStatus::Passed.tone(), StatusTone::Ok);
        assert_eq!(CourseStatus::Fx.tone(), StatusTone::Warn);
        assert!(CourseStatus::Fx.to_string().starts_with("FX status"));
    }

    #[test]
    fn test_letter_grade() {
        assert_eq!(letter_grade(Some(100.0)).unwrap().letter, "A");
        assert_eq!(letter_grade(Some(94.99)).unwrap().letter, "A-");
        assert_eq!(letter_grade(Some(50.0)).unwrap().letter, "D");
        assert_eq!(letter_grade(Some(30.0)).unwrap().letter, "FX");
        assert_eq!(letter_grade(Some(0.0)).unwrap().letter, "F");
        assert!(letter_grade(Some(101.0)).is_none());
        assert!(letter_grade(None).is_none());
    }

    #[test]
    fn test_course_grade_from_mid_and_end() {
        let grade = CourseGrade::evaluate(&CourseInputs {
            reg_mid: Some(60.0),
            reg_end: Some(80.0),
            final_score: Some(80.0),
            ..Default::default()
        });
        assert_eq!(grade.reg_term, Some(70.0));
        assert!((grade.total.unwrap() - 74.0).abs() < 1e-9);
        assert_eq!(grade.status, CourseStatus::Scholarship);
        assert_eq!(grade.letter.unwrap().letter, "C+");
    }

    #[test]
    fn test_course_grade_overrides() {
        let grade = CourseGrade::evaluate(&CourseInputs {
            reg_mid: Some(10.0),
            reg_end: Some(10.0),
            reg_term: Some(90.0),
            final_score: Some(90.0),
            manual_total: FieldValue::Number(55.0),
        });
        assert_eq!(grade.reg_term, Some(90.0));
        assert_eq!(grade.letter.unwrap().letter, "D+");
        assert!(!grade.letter_input_error);

        let invalid_manual = CourseGrade::evaluate(&CourseInputs {
            reg_term: Some(90.0),
            final_score: Some(90.0),
            manual_total: FieldValue::Number(150.0),
            ..Default::default()
        });
        assert!(invalid_manual.letter.is_none());
        assert!(invalid_manual.letter_input_error);
    }

    #[test]
    fn test_unparsable_manual_total_hides_letter() {
        let inputs = CourseInputs {
            reg_term: Some(90.0),
            final_score: Some(90.0),
            manual_total: FieldValue::parse("abc"),
            ..Default::default()
        };
        let grade = CourseGrade::evaluate(&inputs);
        assert!((grade.total.unwrap() - 90.0).abs() < 1e-9);
        assert!(grade.letter.is_none());
        assert!(grade.letter_input_error);

        let blank = CourseGrade::evaluate(&CourseInputs {
            manual_total: FieldValue::parse(""),
            ..inputs
        });
        assert_eq!(blank.letter.unwrap().letter, "A-");
        assert!(!blank.letter_input_error);
    }

    #[test]
    fn test_course_grade_missing_inputs() {
        let grade = CourseGrade::evaluate(&CourseInputs::default());
        assert_eq!(grade.status, CourseStatus::MissingRegTerm);
        assert!(grade.total.is_none());
        assert!(grade.required_for_pass.is_none());
    }
}
