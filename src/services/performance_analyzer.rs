use chrono::Utc;
use std::collections::{BTreeMap, HashMap};

use crate::errors::AppResult;
use crate::models::domain::{
    AnswerSheet, AttemptKind, LearnerProfile, ProficiencyLevel, QuestionId, QuestionRecord,
    Subject, SubjectScore, TopicMap,
};
use crate::models::dto::response::AnalysisResult;
use crate::services::scoring_service::{ensure_unique, Grade};

pub const WEAK_TOPIC_THRESHOLD: f64 = 0.6;
pub const STRONG_TOPIC_THRESHOLD: f64 = 0.8;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    correct: u32,
    total: u32,
}

impl Tally {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    fn accuracy(&self) -> Option<f64> {
        (self.total > 0).then(|| self.correct as f64 / self.total as f64)
    }
}

pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    /// Recomputes topic accuracy from the raw answers and replaces the
    /// learner's weak/strong maps. Only an initial attempt reassigns the
    /// proficiency level and records the initial score.
    pub fn analyze(
        profile: &mut LearnerProfile,
        question_ids: &[QuestionId],
        answers: &AnswerSheet,
        lookup: &HashMap<QuestionId, QuestionRecord>,
        kind: AttemptKind,
        scored_total: i32,
        max_possible: i32,
    ) -> AppResult<AnalysisResult> {
        ensure_unique(question_ids)?;

        let mut topics: BTreeMap<(Subject, &str), Tally> = BTreeMap::new();
        let mut subjects: BTreeMap<Subject, Tally> = BTreeMap::new();

        for question in question_ids.iter().filter_map(|id| lookup.get(id)) {
            let correct = Grade::of(question, answers) == Grade::Correct;
            topics
                .entry((question.subject, question.topic.as_str()))
                .or_default()
                .record(correct);
            subjects.entry(question.subject).or_default().record(correct);
        }

        let mut weak_topics = TopicMap::new();
        let mut strong_topics = TopicMap::new();
        for ((subject, topic), tally) in &topics {
            let Some(accuracy) = tally.accuracy() else {
                continue;
            };
            if accuracy < WEAK_TOPIC_THRESHOLD {
                weak_topics.entry(*subject).or_default().insert(topic.to_string());
            } else if accuracy >= STRONG_TOPIC_THRESHOLD {
                strong_topics.entry(*subject).or_default().insert(topic.to_string());
            }
        }

        let subject_scores: BTreeMap<Subject, SubjectScore> = subjects
            .into_iter()
            .map(|(subject, tally)| (subject, SubjectScore::new(tally.correct, tally.total)))
            .collect();

        let ratio = if max_possible > 0 {
            scored_total as f64 / max_possible as f64
        } else {
            0.0
        };

        let assigned_level = if kind == AttemptKind::Initial {
            let level = ProficiencyLevel::from_ratio(ratio);
            profile.proficiency_level = level;
            profile.initial_assessment_score = Some(scored_total);
            log::info!(
                "Learner {} placed at {} after initial assessment ({}/{})",
                profile.id,
                level,
                scored_total,
                max_possible
            );
            Some(level)
        } else {
            None
        };

        profile.weak_topics = weak_topics.clone();
        profile.strong_topics = strong_topics.clone();
        profile.modified_at = Some(Utc::now());

        Ok(AnalysisResult {
            weak_topics,
            strong_topics,
            subject_scores,
            overall_percentage: ratio * 100.0,
            assigned_level,
        })
    }
}
