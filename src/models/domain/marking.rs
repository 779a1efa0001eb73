use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::question::Track;

/// Points for correct, wrong and unattempted responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_marking_scheme"))]
pub struct MarkingScheme {
    #[validate(range(min = 1, max = 100))]
    pub correct: i32,
    #[validate(range(min = -100, max = 100))]
    pub wrong: i32,
    #[validate(range(min = -100, max = 100))]
    pub unattempted: i32,
}

fn validate_marking_scheme(scheme: &MarkingScheme) -> Result<(), ValidationError> {
    if scheme.correct <= 0 {
        return Err(ValidationError::new("correct_mark_not_positive"));
    }
    if scheme.wrong >= scheme.correct || scheme.unattempted >= scheme.correct {
        return Err(ValidationError::new("correct_mark_not_highest"));
    }
    Ok(())
}

impl MarkingScheme {
    /// +4 / -1 / 0, used by both tracks.
    pub const NEGATIVE_MARKING: MarkingScheme = MarkingScheme {
        correct: 4,
        wrong: -1,
        unattempted: 0,
    };

    pub fn max_score(&self, presented: usize) -> i32 {
        i32::try_from(presented)
            .unwrap_or(i32::MAX)
            .saturating_mul(self.correct)
    }
}

impl Default for MarkingScheme {
    fn default() -> Self {
        MarkingScheme::NEGATIVE_MARKING
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ExamPreset {
    pub key: &'static str,
    pub name: &'static str,
    pub track: Track,
    pub question_count: usize,
    pub duration_minutes: u32,
    pub marking: MarkingScheme,
}

pub const EXAM_PRESETS: [ExamPreset; 4] = [
    ExamPreset {
        key: "neet_full",
        name: "NEET Full Test",
        track: Track::Neet,
        question_count: 180,
        duration_minutes: 180,
        marking: MarkingScheme::NEGATIVE_MARKING,
    },
    ExamPreset {
        key: "jee_full",
        name: "JEE Main Full Test",
        track: Track::Jee,
        question_count: 75,
        duration_minutes: 180,
        marking: MarkingScheme::NEGATIVE_MARKING,
    },
    ExamPreset {
        key: "neet_practice",
        name: "NEET Practice Test",
        track: Track::Neet,
        question_count: 45,
        duration_minutes: 45,
        marking: MarkingScheme::NEGATIVE_MARKING,
    },
    ExamPreset {
        key: "jee_practice",
        name: "JEE Practice Test",
        track: Track::Jee,
        question_count: 20,
        duration_minutes: 45,
        marking: MarkingScheme::NEGATIVE_MARKING,
    },
];

impl ExamPreset {
    pub fn find(key: &str) -> Option<&'static ExamPreset> {
        EXAM_PRESETS.iter().find(|p| p.key == key)
    }

    pub fn for_track(track: Track) -> impl Iterator<Item = &'static ExamPreset> {
        EXAM_PRESETS.iter().filter(move |p| p.track == track)
    }
}
