use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::domain::{AttemptRecord, ProficiencyLevel, Subject, SubjectScore, TopicMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    pub correct_count: u32,
    pub wrong_count: u32,
    pub unattempted_count: u32,
    pub total_score: i32,
    pub max_possible_score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub weak_topics: TopicMap,
    pub strong_topics: TopicMap,
    pub subject_scores: BTreeMap<Subject, SubjectScore>,
    pub overall_percentage: f64,
    /// Set only when the attempt re-derived the learner's level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_level: Option<ProficiencyLevel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub attempt: AttemptRecord,
    pub score: ScoreResult,
    pub analysis: AnalysisResult,
}
