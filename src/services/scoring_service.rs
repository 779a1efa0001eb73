use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;
use validator::Validate;

use crate::errors::{AppError, AppResult};
use crate::models::domain::test_attempt::RecordedAnswer;
use crate::models::domain::{
    AnswerSheet, AttemptRecord, MarkingScheme, QuestionId, QuestionRecord, Subject, SubjectScore,
    TestSession,
};
use crate::models::dto::response::ScoreResult;

/// Outcome of one presented question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Correct,
    Wrong,
    Unattempted,
}

impl Grade {
    pub fn of(question: &QuestionRecord, answers: &AnswerSheet) -> Self {
        match answers.get(&question.id) {
            None => Grade::Unattempted,
            Some(&given) if question.is_correct(given) => Grade::Correct,
            Some(_) => Grade::Wrong,
        }
    }

    pub fn marks(&self, scheme: &MarkingScheme) -> i32 {
        match self {
            Grade::Correct => scheme.correct,
            Grade::Wrong => scheme.wrong,
            Grade::Unattempted => scheme.unattempted,
        }
    }
}

/// Rejects presented id lists that repeat a question.
pub fn ensure_unique(question_ids: &[QuestionId]) -> AppResult<()> {
    let mut seen = HashSet::with_capacity(question_ids.len());
    if let Some(duplicate) = question_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(AppError::ValidationError(format!(
            "Question {} was presented more than once",
            duplicate
        )));
    }
    Ok(())
}

pub struct ScoringService;

impl ScoringService {
    /// Scores an attempt under `scheme`. Ids with no record in `lookup` are
    /// skipped: they land in no bucket and add nothing, but still count
    /// towards the maximum.
    pub fn score(
        question_ids: &[QuestionId],
        answers: &AnswerSheet,
        lookup: &HashMap<QuestionId, QuestionRecord>,
        scheme: &MarkingScheme,
    ) -> AppResult<ScoreResult> {
        scheme.validate()?;
        ensure_unique(question_ids)?;

        let mut result = ScoreResult {
            correct_count: 0,
            wrong_count: 0,
            unattempted_count: 0,
            total_score: 0,
            max_possible_score: scheme.max_score(question_ids.len()),
        };

        for id in question_ids {
            let Some(question) = lookup.get(id) else {
                log::debug!("Question {} no longer available, skipping in score", id);
                continue;
            };

            let grade = Grade::of(question, answers);
            match grade {
                Grade::Correct => result.correct_count += 1,
                Grade::Wrong => result.wrong_count += 1,
                Grade::Unattempted => result.unattempted_count += 1,
            }
            result.total_score = result.total_score.saturating_add(grade.marks(scheme));
        }

        Ok(result)
    }

    /// Assemble the persisted record for a scored session.
    pub fn build_attempt(
        session: &TestSession,
        answers: &AnswerSheet,
        score: &ScoreResult,
        subject_scores: BTreeMap<Subject, SubjectScore>,
        submitted_at: DateTime<Utc>,
    ) -> AttemptRecord {
        let question_ids = session.question_ids();
        let recorded = question_ids
            .iter()
            .filter_map(|id| {
                answers.get(id).map(|&option| RecordedAnswer {
                    question_id: *id,
                    option,
                })
            })
            .collect();

        AttemptRecord {
            id: Uuid::new_v4().to_string(),
            learner_id: session.learner_id.clone(),
            kind: session.kind,
            question_count: question_ids.len() as u32,
            question_ids,
            answers: recorded,
            score: score.total_score,
            max_score: score.max_possible_score,
            correct_count: score.correct_count,
            wrong_count: score.wrong_count,
            unattempted_count: score.unattempted_count,
            elapsed_seconds: (submitted_at - session.started_at).num_seconds().max(0),
            subject_scores,
            submitted_at,
        }
    }
}
