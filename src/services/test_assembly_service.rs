use rand::{seq::SliceRandom, Rng};
use std::collections::HashSet;

use crate::{
    config::Config,
    errors::AppResult,
    models::domain::{
        Difficulty, ExamPreset, LearnerProfile, QuestionId, QuestionRecord, Subject, Track,
    },
    repositories::QuestionFilter,
    services::{
        distribution_planner::{Distribution, DistributionPlanner},
        question_selector::QuestionSelector,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyPolicy {
    /// Share of each adaptive (subject, difficulty) cell drawn from the
    /// learner's weak topics before general questions fill the rest.
    pub weak_topic_share: f64,
    pub initial_test_size: usize,
    pub adaptive_test_size: usize,
    pub subject_test_size: usize,
}

impl Default for AssemblyPolicy {
    fn default() -> Self {
        Self {
            weak_topic_share: 0.7,
            initial_test_size: 25,
            adaptive_test_size: 30,
            subject_test_size: 30,
        }
    }
}

impl AssemblyPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            weak_topic_share: config.weak_topic_share,
            initial_test_size: config.initial_test_size,
            adaptive_test_size: config.adaptive_test_size,
            subject_test_size: config.subject_test_size,
        }
    }
}

/// Questions picked so far for one test. Owns the running exclusion set so no
/// id is added twice, whichever cell it came from.
struct Pool {
    excluded: HashSet<QuestionId>,
    questions: Vec<QuestionRecord>,
}

impl Pool {
    fn new(seen: &HashSet<QuestionId>) -> Self {
        Self {
            excluded: seen.clone(),
            questions: Vec::new(),
        }
    }

    fn add(&mut self, picked: Vec<QuestionRecord>) -> usize {
        let before = self.questions.len();
        for question in picked {
            if self.excluded.insert(question.id) {
                self.questions.push(question);
            }
        }
        self.questions.len() - before
    }
}

pub struct TestAssemblyService {
    planner: DistributionPlanner,
    selector: QuestionSelector,
    policy: AssemblyPolicy,
}

impl TestAssemblyService {
    pub fn new(selector: QuestionSelector, policy: AssemblyPolicy) -> Self {
        Self {
            planner: DistributionPlanner::new(),
            selector,
            policy,
        }
    }

    pub fn policy(&self) -> &AssemblyPolicy {
        &self.policy
    }

    pub fn planner(&self) -> &DistributionPlanner {
        &self.planner
    }

    pub async fn assemble_initial_test<R: Rng + Send + ?Sized>(
        &self,
        track: Track,
        count: usize,
        seen: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> AppResult<Vec<QuestionRecord>> {
        let distribution = self.planner.plan(track, count, None);
        self.assemble(track, &distribution, count, seen, None, rng).await
    }

    /// Difficulty follows the learner's level; part of every cell is drawn
    /// from their weak topics for that subject first.
    pub async fn assemble_adaptive_test<R: Rng + Send + ?Sized>(
        &self,
        profile: &LearnerProfile,
        count: usize,
        seen: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> AppResult<Vec<QuestionRecord>> {
        let distribution = self
            .planner
            .plan(profile.track, count, Some(profile.proficiency_level));
        self.assemble(profile.track, &distribution, count, seen, Some(profile), rng)
            .await
    }

    pub async fn assemble_full_paper<R: Rng + Send + ?Sized>(
        &self,
        track: Track,
        seen: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> AppResult<Vec<QuestionRecord>> {
        let distribution = self.planner.plan_full_paper(track);
        let total = distribution.total();
        self.assemble(track, &distribution, total, seen, None, rng).await
    }

    /// A preset paper keeps the full paper's subject shares at the preset's
    /// length.
    pub async fn assemble_preset_test<R: Rng + Send + ?Sized>(
        &self,
        preset: &ExamPreset,
        seen: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> AppResult<Vec<QuestionRecord>> {
        let distribution = self.planner.plan_paper(preset.track, preset.question_count);
        self.assemble(
            preset.track,
            &distribution,
            preset.question_count,
            seen,
            None,
            rng,
        )
        .await
    }

    pub async fn assemble_subject_test<R: Rng + Send + ?Sized>(
        &self,
        track: Track,
        subject: Subject,
        count: usize,
        seen: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> AppResult<Vec<QuestionRecord>> {
        let distribution = self.planner.plan_subject(track, subject, count, None);
        let mut questions = self
            .assemble(track, &distribution, count, seen, None, rng)
            .await?;

        let before = questions.len();
        questions.retain(|q| q.subject == subject);
        if questions.len() < before {
            log::warn!(
                "Dropped {} off-subject questions from {} test",
                before - questions.len(),
                subject
            );
        }
        Ok(questions)
    }

    /// Chapter practice comes straight from the repository.
    #[allow(clippy::too_many_arguments)]
    pub async fn assemble_chapter_test<R: Rng + Send + ?Sized>(
        &self,
        track: Track,
        subject: Subject,
        chapter: &str,
        difficulty: Option<Difficulty>,
        limit: usize,
        seen: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> AppResult<Vec<QuestionRecord>> {
        let mut filter = QuestionFilter::for_track(track)
            .with_subject(subject)
            .with_chapter(chapter);
        if let Some(difficulty) = difficulty {
            filter = filter.with_difficulty(difficulty);
        }
        self.selector.draw(&filter, limit, seen, rng).await
    }

    async fn assemble<R: Rng + Send + ?Sized>(
        &self,
        track: Track,
        distribution: &Distribution,
        total: usize,
        seen: &HashSet<QuestionId>,
        profile: Option<&LearnerProfile>,
        rng: &mut R,
    ) -> AppResult<Vec<QuestionRecord>> {
        if distribution.is_empty() {
            log::warn!("Empty distribution for {} test, nothing to assemble", track);
            return Ok(Vec::new());
        }

        let mut pool = Pool::new(seen);

        for cell in distribution.cells.iter().filter(|c| c.count > 0) {
            let mut needed = cell.count;

            if let Some(topics) = profile.and_then(|p| p.weak_topics_for(cell.subject)) {
                let weak_count = (cell.count as f64 * self.policy.weak_topic_share).floor() as usize;
                let filter = QuestionFilter::for_track(track)
                    .with_subject(cell.subject)
                    .with_difficulty(cell.difficulty)
                    .with_topics(topics.iter().cloned());
                let weak = self
                    .selector
                    .draw(&filter, weak_count, &pool.excluded, rng)
                    .await?;
                needed -= pool.add(weak).min(needed);
            }

            let picked = self
                .selector
                .select(cell.subject, track, cell.difficulty, needed, &pool.excluded, rng)
                .await?;
            pool.add(picked);
        }

        let mut questions = pool.questions;
        questions.shuffle(rng);
        questions.truncate(total);

        let planned = distribution.total().min(total);
        if questions.len() < planned {
            log::warn!(
                "Assembled only {}/{} questions for {} test",
                questions.len(),
                planned,
                track
            );
        } else {
            log::info!("Assembled {} questions for {} test", questions.len(), track);
        }

        Ok(questions)
    }
}
