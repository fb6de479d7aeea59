use super::{is_percentage, parse_input_value, ATTESTATION_SECTION_MAX};
use log::trace;
use serde::{Deserialize, Serialize};

/// Max points assumed for an attestation item without a usable value.
pub const DEFAULT_ITEM_MAX_POINTS: f64 = 25.0;

const MISMATCH_TOLERANCE: f64 = 1e-4;

/// Form fields are kept as entered; they are parsed on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllabusItem {
    pub id: String,
    pub title: String,
    pub max_points: String,
    pub score: String,
}

impl SyllabusItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, max_points: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            max_points: max_points.to_string(),
            score: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllabusSection {
    pub id: String,
    pub title: String,
    pub weight: String,
    pub items: Vec<SyllabusItem>,
}

impl SyllabusSection {
    pub fn is_attestation(&self) -> bool {
        is_attestation_section(&self.title)
    }

    pub fn is_final_exam(&self) -> bool {
        is_final_exam_section(&self.title)
    }

    /// Label shown next to the section score.
    pub fn metric_label(&self) -> &'static str {
        if self.is_attestation() {
            "Total"
        } else {
            "Avg"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllabusCourse {
    pub id: u32,
    pub title: String,
    pub sections: Vec<SyllabusSection>,
}

struct SectionPreset {
    title: &'static str,
    weight: &'static str,
    items: &'static [(&'static str, f64)],
}

static DEFAULT_SECTION_PRESETS: [SectionPreset; 3] = [
    SectionPreset {
        title: "1st Attestation",
        weight: "30",
        items: &[
            ("Assignment 1", 25.0),
            ("Assignment 2", 25.0),
            ("Assignment 3", 25.0),
            ("Midterm", 25.0),
        ],
    },
    SectionPreset {
        title: "2nd Attestation",
        weight: "30",
        items: &[
            ("Assignment 4", 25.0),
            ("Assignment 5", 25.0),
            ("Assignment 6", 25.0),
            ("Endterm", 25.0),
        ],
    },
    SectionPreset {
        title: "Final Exam",
        weight: "40",
        items: &[("MCQ", 100.0)],
    },
];

impl SyllabusCourse {
    /// Course with the default two attestations and a final exam. Titles
    /// default to `Course {id}`.
    pub fn standard(id: u32, title: Option<&str>) -> Self {
        let sections = DEFAULT_SECTION_PRESETS
            .iter()
            .enumerate()
            .map(|(s, preset)| SyllabusSection {
                id: format!("section-{}-{}", id, s + 1),
                title: preset.title.to_string(),
                weight: preset.weight.to_string(),
                items: preset
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, (title, max_points))| {
                        SyllabusItem::new(format!("item-{}-{}-{}", id, s + 1, i + 1), *title, *max_points)
                    })
                    .collect(),
            })
            .collect();

        Self {
            id,
            title: title.map_or_else(|| format!("Course {}", id), str::to_string),
            sections,
        }
    }
}

pub fn is_attestation_section(title: &str) -> bool {
    title.trim().to_lowercase().contains("attest")
}

pub fn is_final_exam_section(title: &str) -> bool {
    let normalized = title.trim().to_lowercase();
    normalized.contains("final") || normalized.contains("exam")
}

/// Two attestation sections, at least one final exam, four sections at most.
pub fn uses_standard_attestation_structure(course: &SyllabusCourse) -> bool {
    let attestations = course.sections.iter().filter(|s| s.is_attestation()).count();
    let finals = course.sections.iter().filter(|s| s.is_final_exam()).count();
    attestations == 2 && finals >= 1 && course.sections.len() <= 4
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyllabusSectionResult {
    pub section_id: String,
    /// Attestations: earned points out of `max_points_sum`. Others: mean
    /// percentage of graded items.
    pub score: f64,
    pub weight: f64,
    pub contribution: f64,
    pub graded_items: usize,
    pub total_items: usize,
    pub is_attestation: bool,
    pub max_points_sum: f64,
    pub max_points_mismatch: bool,
    pub overflow_amount: f64,
}

impl SyllabusSectionResult {
    /// Section score on a 0..=100 scale, capped for attestations.
    pub fn normalized_score(&self) -> f64 {
        if self.is_attestation && self.max_points_sum > 0.0 {
            (self.score / self.max_points_sum * 100.0).min(100.0)
        } else {
            self.score
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormulaBreakdown {
    pub att1_score: f64,
    pub att1_weight: f64,
    pub att2_score: f64,
    pub att2_weight: f64,
    pub final_score: f64,
    pub final_weight: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyllabusCourseResult {
    pub section_results: Vec<SyllabusSectionResult>,
    pub total_weight: f64,
    pub weighted_total: f64,
    pub has_invalid_weights: bool,
    pub uses_attestation_structure: bool,
    pub has_attestation_overflow: bool,
    pub formula_breakdown: Option<FormulaBreakdown>,
}

fn section_result(section: &SyllabusSection) -> (SyllabusSectionResult, bool) {
    let parsed_weight = parse_input_value(&section.weight).filter(|w| is_percentage(Some(*w)));
    let weight = parsed_weight.unwrap_or(0.0);
    let is_attestation = section.is_attestation();

    let mut graded_items = 0;
    let mut raw_sum = 0.0;
    let mut max_points_sum = 0.0;

    for item in &section.items {
        let item_max = parse_input_value(&item.max_points).filter(|max| *max > 0.0);
        if is_attestation {
            max_points_sum += item_max.unwrap_or(0.0);
        }

        let Some(score) = parse_input_value(&item.score) else {
            continue;
        };

        if is_attestation {
            if score >= 0.0 {
                let max = item_max.unwrap_or(DEFAULT_ITEM_MAX_POINTS);
                raw_sum += max * score.min(100.0) / 100.0;
                graded_items += 1;
            }
        } else if is_percentage(Some(score)) {
            raw_sum += score;
            graded_items += 1;
        }
    }

    if is_attestation && max_points_sum == 0.0 {
        max_points_sum = section.items.len() as f64 * DEFAULT_ITEM_MAX_POINTS;
    }

    let score = if is_attestation {
        raw_sum
    } else if graded_items > 0 {
        raw_sum / graded_items as f64
    } else {
        0.0
    };

    let mut result = SyllabusSectionResult {
        section_id: section.id.clone(),
        score,
        weight,
        contribution: 0.0,
        graded_items,
        total_items: section.items.len(),
        is_attestation,
        max_points_sum,
        max_points_mismatch: is_attestation
            && (max_points_sum - ATTESTATION_SECTION_MAX).abs() > MISMATCH_TOLERANCE,
        overflow_amount: if is_attestation {
            (raw_sum - max_points_sum).max(0.0)
        } else {
            0.0
        },
    };
    result.contribution = result.normalized_score() * weight / 100.0;

    (result, parsed_weight.is_none())
}

/// Weighted course total over all sections of a syllabus.
pub fn syllabus_result(course: &SyllabusCourse) -> SyllabusCourseResult {
    let mut section_results = Vec::with_capacity(course.sections.len());
    let mut has_invalid_weights = false;

    for section in &course.sections {
        let (result, invalid_weight) = section_result(section);
        trace!(
            "Section '{}': score {} weight {} contribution {}",
            section.title,
            result.score,
            result.weight,
            result.contribution
        );
        has_invalid_weights |= invalid_weight;
        section_results.push(result);
    }

    let total_weight = section_results.iter().map(|r| r.weight).sum();
    let weighted_total = section_results.iter().map(|r| r.contribution).sum();
    let has_attestation_overflow = section_results.iter().any(|r| r.overflow_amount > 0.0);
    let uses_attestation_structure = uses_standard_attestation_structure(course);

    let formula_breakdown = if uses_attestation_structure {
        let attestations: Vec<&SyllabusSectionResult> = course
            .sections
            .iter()
            .zip(&section_results)
            .filter(|(section, _)| section.is_attestation())
            .map(|(_, result)| result)
            .collect();
        let final_exam = course
            .sections
            .iter()
            .zip(&section_results)
            .find(|(section, _)| section.is_final_exam())
            .map(|(_, result)| result);

        match (attestations.as_slice(), final_exam) {
            ([att1, att2, ..], Some(final_exam)) => Some(FormulaBreakdown {
                att1_score: att1.normalized_score(),
                att1_weight: att1.weight,
                att2_score: att2.normalized_score(),
                att2_weight: att2.weight,
                final_score: final_exam.score,
                final_weight: final_exam.weight,
                total: weighted_total,
            }),
            _ => None,
        }
    } else {
        None
    };

    SyllabusCourseResult {
        section_results,
        total_weight,
        weighted_total,
        has_invalid_weights,
        uses_attestation_structure,
        has_attestation_overflow,
        formula_breakdown,
    }
}
