use super::{format_score, is_percentage, letter_grade, parse_input_value};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpaScaleStep {
    pub min: f64,
    pub points: f64,
}

pub static GPA_SCALE: [GpaScaleStep; 11] = [
    GpaScaleStep { min: 95.0, points: 4.0 },
    GpaScaleStep { min: 90.0, points: 3.67 },
    GpaScaleStep { min: 85.0, points: 3.33 },
    GpaScaleStep { min: 80.0, points: 3.0 },
    GpaScaleStep { min: 75.0, points: 2.67 },
    GpaScaleStep { min: 70.0, points: 2.33 },
    GpaScaleStep { min: 65.0, points: 2.0 },
    GpaScaleStep { min: 60.0, points: 1.67 },
    GpaScaleStep { min: 55.0, points: 1.33 },
    GpaScaleStep { min: 50.0, points: 1.0 },
    GpaScaleStep { min: 0.0, points: 0.0 },
];

pub fn grade_points(total: f64) -> f64 {
    GPA_SCALE
        .iter()
        .find(|step| total >= step.min)
        .map_or(0.0, |step| step.points)
}

/// Numeric form field where a blank entry reads as zero.
fn zero_if_blank(raw: &str) -> Option<f64> {
    if raw.trim().is_empty() {
        Some(0.0)
    } else {
        parse_input_value(raw)
    }
}

/// One row of the GPA form, kept as typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpaCourse {
    pub id: u32,
    pub name: String,
    pub credits: String,
    pub total: String,
}

impl GpaCourse {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// A blank total counts as 0; garbage or out-of-range text has none.
    pub fn total_value(&self) -> Option<f64> {
        zero_if_blank(&self.total).filter(|t| is_percentage(Some(*t)))
    }

    /// Credits that count towards the GPA: positive and finite, with a valid
    /// total alongside.
    fn weighted_credits(&self) -> Option<(f64, f64)> {
        let credits = zero_if_blank(&self.credits).filter(|c| *c > 0.0)?;
        Some((credits, self.total_value()?))
    }

    /// One summary line: `name | credits cr | total% | letter (points)`.
    pub fn summary_line(&self) -> String {
        let name = if self.name.is_empty() {
            "Untitled"
        } else {
            self.name.as_str()
        };
        let credits = if self.credits.is_empty() {
            "-"
        } else {
            self.credits.as_str()
        };
        let (total, grade) = match self.total_value() {
            Some(total) => {
                let grade = letter_grade(Some(total)).map_or_else(
                    || "-".to_string(),
                    |info| format!("{} ({:.2})", info.letter, grade_points(total)),
                );
                (format_score(total, 2), grade)
            }
            None => ("-".to_string(), "-".to_string()),
        };
        format!("{} | {} cr | {}% | {}", name, credits, total, grade)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpaSummary {
    pub total_credits: f64,
    /// `None` when no course carries credits.
    pub gpa: Option<f64>,
}

impl GpaSummary {
    pub fn gpa_text(&self) -> String {
        format!("{:.2}", self.gpa.unwrap_or(0.0))
    }

    pub fn credits_text(&self) -> String {
        let rounded = (self.total_credits * 100.0).round() / 100.0;
        rounded.to_string()
    }
}

impl fmt::Display for GpaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPA {} over {} credits", self.gpa_text(), self.credits_text())
    }
}

/// Credit-weighted mean of grade points. Courses without positive credits
/// or a valid total are skipped.
pub fn gpa(courses: &[GpaCourse]) -> GpaSummary {
    let (sum_points, sum_credits) = courses
        .iter()
        .filter_map(GpaCourse::weighted_credits)
        .fold((0.0, 0.0), |(points, credits), (course_credits, total)| {
            (points + course_credits * grade_points(total), credits + course_credits)
        });

    GpaSummary {
        total_credits: sum_credits,
        gpa: (sum_credits > 0.0).then(|| sum_points / sum_credits),
    }
}

/// Plain-text report of all courses followed by the totals.
pub fn gpa_report(courses: &[GpaCourse]) -> String {
    let summary = gpa(courses);
    let mut lines: Vec<String> = courses.iter().map(GpaCourse::summary_line).collect();
    lines.push("---".to_string());
    lines.push(format!("Total Credits: {}", summary.credits_text()));
    lines.push(format!("GPA: {}", summary.gpa_text()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: u32, name: &str, credits: &str, total: &str) -> GpaCourse {
        GpaCourse {
            id,
            name: name.to_string(),
            credits: credits.to_string(),
            total: total.to_string(),
        }
    }

    #[test]
    fn test_grade_points() {
        assert_eq!(grade_points(100.0), 4.0);
        assert_eq!(grade_points(92.0), 3.67);
        assert_eq!(grade_points(50.0), 1.0);
        assert_eq!(grade_points(49.9), 0.0);
    }

    #[test]
    fn test_weighted_gpa() {
        let courses = [
            course(1, "Probability", "5", "96"),
            course(2, "Writing", "5", "81"),
        ];
        let summary = gpa(&courses);
        assert_eq!(summary.total_credits, 10.0);
        assert!((summary.gpa.unwrap() - 3.5).abs() < 1e-9);
        assert_eq!(summary.gpa_text(), "3.50");
    }

    #[test]
    fn test_skips_incomplete_courses() {
        let courses = [
            course(1, "A", "4", "70"),
            course(2, "B", "", "95"),
            course(3, "C", "0", "95"),
            course(4, "D", "3", "n/a"),
            course(5, "E", "3", "120"),
        ];
        let summary = gpa(&courses);
        assert_eq!(summary.total_credits, 4.0);
        assert_eq!(summary.gpa_text(), "2.33");
    }

    #[test]
    fn test_blank_total_counts_as_zero() {
        let courses = [
            course(1, "Probability", "3", "96"),
            course(2, "Writing", "1", " "),
        ];
        let summary = gpa(&courses);
        assert_eq!(summary.total_credits, 4.0);
        assert_eq!(summary.gpa_text(), "3.00");
        assert_eq!(courses[1].summary_line(), "Writing | 1 cr | 0.00% | F (0.00)");
    }

    #[test]
    fn test_no_credits() {
        let summary = gpa(&[GpaCourse::new(1)]);
        assert_eq!(summary.gpa, None);
        assert_eq!(summary.gpa_text(), "0.00");
        assert_eq!(summary.credits_text(), "0");
    }

    #[test]
    fn test_report() {
        let courses = [
            course(1, "Probability", "5", "96"),
            course(2, "", "", "abc"),
        ];
        let report = gpa_report(&courses);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "Probability | 5 cr | 96.00% | A (4.00)");
        assert_eq!(lines[1], "Untitled | - cr | -% | -");
        assert_eq!(lines[2], "---");
        assert_eq!(lines[3], "Total Credits: 5");
        assert_eq!(lines[4], "GPA: 4.00");
    }
}
