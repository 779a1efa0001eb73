use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use uuid::Uuid;

use crate::models::domain::marking::MarkingScheme;
use crate::models::domain::question::{OptionLetter, QuestionId, QuestionRecord, Subject};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptKind {
    Initial,
    Adaptive,
    Subject,
    Full,
}

impl fmt::Display for AttemptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptKind::Initial => write!(f, "initial"),
            AttemptKind::Adaptive => write!(f, "adaptive"),
            AttemptKind::Subject => write!(f, "subject"),
            AttemptKind::Full => write!(f, "full"),
        }
    }
}

/// Given answers keyed by question; a missing key means unattempted.
pub type AnswerSheet = HashMap<QuestionId, OptionLetter>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordedAnswer {
    pub question_id: QuestionId,
    pub option: OptionLetter,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SubjectScore {
    pub correct: u32,
    pub total: u32,
    pub percentage: f64,
}

impl SubjectScore {
    pub fn new(correct: u32, total: u32) -> Self {
        let percentage = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64 * 100.0
        };
        SubjectScore {
            correct,
            total,
            percentage,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AttemptRecord {
    pub id: String,
    pub learner_id: String,
    pub kind: AttemptKind,
    pub question_ids: Vec<QuestionId>,
    pub answers: Vec<RecordedAnswer>,
    pub score: i32,
    pub max_score: i32,
    pub question_count: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub unattempted_count: u32,
    pub elapsed_seconds: i64,
    pub subject_scores: BTreeMap<Subject, SubjectScore>,
    pub submitted_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn answer_sheet(&self) -> AnswerSheet {
        self.answers
            .iter()
            .map(|a| (a.question_id, a.option))
            .collect()
    }
}

/// A test handed to a learner and not yet submitted. Generated questions are
/// only reachable through `questions`, so the session must be kept until
/// submission. The marking scheme is fixed when the session opens.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TestSession {
    pub id: String,
    pub learner_id: String,
    pub kind: AttemptKind,
    pub questions: Vec<QuestionRecord>,
    pub requested_count: usize,
    #[serde(default)]
    pub marking: MarkingScheme,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub started_at: DateTime<Utc>,
}

impl TestSession {
    pub fn new(
        learner_id: &str,
        kind: AttemptKind,
        questions: Vec<QuestionRecord>,
        requested_count: usize,
    ) -> Self {
        TestSession {
            id: Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            kind,
            questions,
            requested_count,
            marking: MarkingScheme::default(),
            duration_minutes: None,
            started_at: Utc::now(),
        }
    }

    pub fn with_terms(mut self, marking: MarkingScheme, duration_minutes: Option<u32>) -> Self {
        self.marking = marking;
        self.duration_minutes = duration_minutes;
        self
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.duration_minutes
            .map(|minutes| self.started_at + Duration::minutes(i64::from(minutes)))
    }

    pub fn question_ids(&self) -> Vec<QuestionId> {
        self.questions.iter().map(|q| q.id).collect()
    }

    pub fn is_short(&self) -> bool {
        self.questions.len() < self.requested_count
    }
}
