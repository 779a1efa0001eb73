use chrono::Utc;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use validator::Validate;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{
        AttemptKind, AttemptRecord, ExamPreset, LearnerProfile, QuestionId, QuestionRecord,
        TestSession, Track,
    },
    models::dto::{
        request::{ChapterTestRequest, SubjectTestRequest, SubmitAttemptRequest},
        response::SubmissionOutcome,
    },
    repositories::{LearnerProfileRepository, QuestionRepository, TestAttemptRepository},
    services::{
        performance_analyzer::PerformanceAnalyzer, scoring_service::ScoringService,
        test_assembly_service::TestAssemblyService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// How many recent attempts to look back over when excluding questions.
    pub recent_attempt_window: usize,
    /// When set, a test shorter than this is refused instead of warned about.
    pub minimum_test_questions: Option<usize>,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            recent_attempt_window: 5,
            minimum_test_questions: None,
        }
    }
}

impl SessionPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recent_attempt_window: config.recent_attempt_window,
            minimum_test_questions: config.minimum_test_questions,
        }
    }
}

pub struct ExamSessionService {
    assembly: TestAssemblyService,
    question_repository: Arc<dyn QuestionRepository>,
    profile_repository: Arc<dyn LearnerProfileRepository>,
    attempt_repository: Arc<dyn TestAttemptRepository>,
    policy: SessionPolicy,
}

impl ExamSessionService {
    pub fn new(
        assembly: TestAssemblyService,
        question_repository: Arc<dyn QuestionRepository>,
        profile_repository: Arc<dyn LearnerProfileRepository>,
        attempt_repository: Arc<dyn TestAttemptRepository>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            assembly,
            question_repository,
            profile_repository,
            attempt_repository,
            policy,
        }
    }

    pub async fn enroll(&self, track: Track) -> AppResult<LearnerProfile> {
        let profile = self.profile_repository.save(LearnerProfile::new(track)).await?;
        log::info!("Enrolled learner {} on the {} track", profile.id, track);
        Ok(profile)
    }

    pub async fn get_profile(&self, learner_id: &str) -> AppResult<LearnerProfile> {
        self.profile_repository
            .find_by_id(learner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Learner profile {}", learner_id)))
    }

    pub async fn start_initial_test<R: Rng + Send + ?Sized>(
        &self,
        learner_id: &str,
        rng: &mut R,
    ) -> AppResult<TestSession> {
        let profile = self.get_profile(learner_id).await?;
        if profile.has_completed_initial_assessment() {
            return Err(AppError::AlreadyExists(format!(
                "Initial assessment for learner {}",
                learner_id
            )));
        }

        let count = self.assembly.policy().initial_test_size;
        let planned = self.assembly.planner().plan(profile.track, count, None).total();
        let seen = self.seen_questions(learner_id).await?;
        let questions = self
            .assembly
            .assemble_initial_test(profile.track, count, &seen, rng)
            .await?;

        self.open_session(&profile, AttemptKind::Initial, questions, planned)
    }

    /// `count` defaults to the configured adaptive test size.
    pub async fn start_adaptive_test<R: Rng + Send + ?Sized>(
        &self,
        learner_id: &str,
        count: Option<usize>,
        rng: &mut R,
    ) -> AppResult<TestSession> {
        let profile = self.get_profile(learner_id).await?;
        let count = count.unwrap_or(self.assembly.policy().adaptive_test_size);
        let planned = self
            .assembly
            .planner()
            .plan(profile.track, count, Some(profile.proficiency_level))
            .total();
        let seen = self.seen_questions(learner_id).await?;
        let questions = self
            .assembly
            .assemble_adaptive_test(&profile, count, &seen, rng)
            .await?;

        self.open_session(&profile, AttemptKind::Adaptive, questions, planned)
    }

    pub async fn start_full_paper<R: Rng + Send + ?Sized>(
        &self,
        learner_id: &str,
        rng: &mut R,
    ) -> AppResult<TestSession> {
        let profile = self.get_profile(learner_id).await?;
        let planned = self.assembly.planner().plan_full_paper(profile.track).total();
        let seen = self.seen_questions(learner_id).await?;
        let questions = self
            .assembly
            .assemble_full_paper(profile.track, &seen, rng)
            .await?;

        self.open_session(&profile, AttemptKind::Full, questions, planned)
    }

    /// Starts a timed paper from the preset table. The preset's marking and
    /// duration travel with the session.
    pub async fn start_preset_test<R: Rng + Send + ?Sized>(
        &self,
        learner_id: &str,
        key: &str,
        rng: &mut R,
    ) -> AppResult<TestSession> {
        let preset = ExamPreset::find(key)
            .ok_or_else(|| AppError::NotFound(format!("Exam preset '{}'", key)))?;
        let profile = self.get_profile(learner_id).await?;
        if preset.track != profile.track {
            return Err(AppError::BadRequest(format!(
                "{} is a {} test; learner {} is enrolled on the {} track",
                preset.name, preset.track, profile.id, profile.track
            )));
        }

        let planned = self
            .assembly
            .planner()
            .plan_paper(preset.track, preset.question_count)
            .total();
        let seen = self.seen_questions(learner_id).await?;
        let questions = self.assembly.assemble_preset_test(preset, &seen, rng).await?;

        let session = self.open_session(&profile, AttemptKind::Full, questions, planned)?;
        Ok(session.with_terms(preset.marking, Some(preset.duration_minutes)))
    }

    /// The question count defaults to the configured subject test size.
    pub async fn start_subject_test<R: Rng + Send + ?Sized>(
        &self,
        learner_id: &str,
        request: &SubjectTestRequest,
        rng: &mut R,
    ) -> AppResult<TestSession> {
        request.validate()?;
        let profile = self.get_profile(learner_id).await?;
        let count = request
            .question_count
            .unwrap_or(self.assembly.policy().subject_test_size);
        let planned = self
            .assembly
            .planner()
            .plan_subject(request.track, request.subject, count, None)
            .total();
        let seen = self.seen_questions(learner_id).await?;
        let questions = self
            .assembly
            .assemble_subject_test(request.track, request.subject, count, &seen, rng)
            .await?;

        self.open_session(&profile, AttemptKind::Subject, questions, planned)
    }

    /// Chapter practice is recorded as a subject attempt.
    pub async fn start_chapter_test<R: Rng + Send + ?Sized>(
        &self,
        learner_id: &str,
        request: &ChapterTestRequest,
        rng: &mut R,
    ) -> AppResult<TestSession> {
        request.validate()?;
        let profile = self.get_profile(learner_id).await?;
        let seen = self.seen_questions(learner_id).await?;
        let questions = self
            .assembly
            .assemble_chapter_test(
                request.track,
                request.subject,
                &request.chapter,
                request.difficulty,
                request.limit,
                &seen,
                rng,
            )
            .await?;

        self.open_session(&profile, AttemptKind::Subject, questions, request.limit)
    }

    /// Scores the answers against the records as they are now, updates the
    /// learner's profile and stores the attempt.
    pub async fn submit(
        &self,
        session: &TestSession,
        request: &SubmitAttemptRequest,
    ) -> AppResult<SubmissionOutcome> {
        request.validate()?;
        if request.session_id != session.id {
            return Err(AppError::BadRequest(format!(
                "Answers are for session {}, not {}",
                request.session_id, session.id
            )));
        }

        let mut profile = self.get_profile(&session.learner_id).await?;
        if session.kind == AttemptKind::Initial && profile.has_completed_initial_assessment() {
            return Err(AppError::AlreadyExists(format!(
                "Initial assessment for learner {}",
                profile.id
            )));
        }

        let submitted_at = Utc::now();
        if let Some(deadline) = session.deadline().filter(|d| submitted_at > *d) {
            log::warn!(
                "Session {} submitted {}s after its deadline",
                session.id,
                (submitted_at - deadline).num_seconds()
            );
        }

        let answers = request.answer_sheet()?;
        let question_ids = session.question_ids();
        let lookup = self.resolve_questions(session).await?;

        let score = ScoringService::score(&question_ids, &answers, &lookup, &session.marking)?;
        let analysis = PerformanceAnalyzer::analyze(
            &mut profile,
            &question_ids,
            &answers,
            &lookup,
            session.kind,
            score.total_score,
            score.max_possible_score,
        )?;

        let attempt = ScoringService::build_attempt(
            session,
            &answers,
            &score,
            analysis.subject_scores.clone(),
            submitted_at,
        );
        let attempt = self.attempt_repository.create(attempt).await?;
        self.profile_repository.save(profile).await?;

        log::info!(
            "Learner {} scored {}/{} on {} attempt {}",
            session.learner_id,
            score.total_score,
            score.max_possible_score,
            session.kind,
            attempt.id
        );

        Ok(SubmissionOutcome {
            attempt,
            score,
            analysis,
        })
    }

    pub async fn attempt_history(
        &self,
        learner_id: &str,
        offset: u64,
        limit: i64,
    ) -> AppResult<Vec<AttemptRecord>> {
        self.attempt_repository
            .find_by_learner(learner_id, offset, limit)
            .await
    }

    async fn seen_questions(&self, learner_id: &str) -> AppResult<HashSet<QuestionId>> {
        let recent = self
            .attempt_repository
            .recent_question_ids(learner_id, self.policy.recent_attempt_window)
            .await?;
        Ok(recent.into_iter().collect())
    }

    /// Stored questions are looked up again; generated ones only exist in the
    /// session.
    async fn resolve_questions(
        &self,
        session: &TestSession,
    ) -> AppResult<HashMap<QuestionId, QuestionRecord>> {
        let persisted: Vec<i64> = session
            .questions
            .iter()
            .filter_map(|q| q.id.persisted())
            .collect();

        let mut lookup: HashMap<QuestionId, QuestionRecord> = HashMap::new();
        if !persisted.is_empty() {
            for question in self.question_repository.find_by_ids(&persisted).await? {
                lookup.insert(question.id, question);
            }
        }

        let missing = persisted.len() - lookup.len().min(persisted.len());
        if missing > 0 {
            log::warn!(
                "{} questions from session {} no longer exist and are not scored",
                missing,
                session.id
            );
        }

        for question in session.questions.iter().filter(|q| q.id.is_transient()) {
            lookup.insert(question.id, question.clone());
        }

        Ok(lookup)
    }

    fn open_session(
        &self,
        profile: &LearnerProfile,
        kind: AttemptKind,
        questions: Vec<QuestionRecord>,
        requested: usize,
    ) -> AppResult<TestSession> {
        if questions.len() < requested {
            if let Some(minimum) = self.policy.minimum_test_questions {
                if questions.len() < minimum {
                    return Err(AppError::NotFound(format!(
                        "Only {} questions available for a {} test, at least {} required",
                        questions.len(),
                        kind,
                        minimum
                    )));
                }
            }
            log::warn!(
                "Starting {} test for learner {} with {}/{} questions",
                kind,
                profile.id,
                questions.len(),
                requested
            );
        }

        let session = TestSession::new(&profile.id, kind, questions, requested);
        log::info!(
            "Started {} session {} for learner {} ({} questions)",
            kind,
            session.id,
            profile.id,
            session.questions.len()
        );
        Ok(session)
    }
}
