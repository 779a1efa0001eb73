#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use exam_prep_engine::{
    errors::{AppError, AppResult, GenerationError},
    models::domain::{
        AttemptRecord, Difficulty, LearnerProfile, OptionLetter, QuestionId, QuestionRecord,
        Subject, Track,
    },
    repositories::{LearnerProfileRepository, QuestionFilter, QuestionRepository, TestAttemptRepository},
    services::{
        AssemblyPolicy, ExamSessionService, GenerationRequest, QuestionGenerator, QuestionSelector,
        SelectionPolicy, SessionPolicy, TestAssemblyService,
    },
};

pub struct InMemoryQuestionRepository {
    questions: Arc<RwLock<Vec<QuestionRecord>>>,
}

impl InMemoryQuestionRepository {
    pub fn new(questions: Vec<QuestionRecord>) -> Self {
        Self {
            questions: Arc::new(RwLock::new(questions)),
        }
    }

    pub async fn remove(&self, id: QuestionId) {
        let mut questions = self.questions.write().await;
        questions.retain(|q| q.id != id);
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn find_questions(&self, filter: &QuestionFilter) -> AppResult<Vec<QuestionRecord>> {
        let questions = self.questions.read().await;
        Ok(questions.iter().filter(|q| filter.matches(q)).cloned().collect())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<QuestionRecord>> {
        let questions = self.questions.read().await;
        Ok(questions
            .iter()
            .filter(|q| q.id.persisted().is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }
}

pub struct InMemoryLearnerProfileRepository {
    profiles: Arc<RwLock<HashMap<String, LearnerProfile>>>,
}

impl InMemoryLearnerProfileRepository {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl LearnerProfileRepository for InMemoryLearnerProfileRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<LearnerProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(id).cloned())
    }

    async fn save(&self, profile: LearnerProfile) -> AppResult<LearnerProfile> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }
}

pub struct InMemoryTestAttemptRepository {
    attempts: Arc<RwLock<Vec<AttemptRecord>>>,
}

impl InMemoryTestAttemptRepository {
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl TestAttemptRepository for InMemoryTestAttemptRepository {
    async fn create(&self, attempt: AttemptRecord) -> AppResult<AttemptRecord> {
        let mut attempts = self.attempts.write().await;
        if attempts.iter().any(|a| a.id == attempt.id) {
            return Err(AppError::AlreadyExists(format!(
                "Attempt with id '{}' already exists",
                attempt.id
            )));
        }
        attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn find_by_learner(
        &self,
        learner_id: &str,
        offset: u64,
        limit: i64,
    ) -> AppResult<Vec<AttemptRecord>> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<_> = attempts
            .iter()
            .filter(|a| a.learner_id == learner_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

        Ok(items
            .into_iter()
            .skip(offset as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

/// Generator that fails every call.
pub struct FailingGenerator;

#[async_trait]
impl QuestionGenerator for FailingGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<Vec<QuestionRecord>, GenerationError> {
        Err(GenerationError::Timeout(60))
    }
}

/// Generator that fills `percent` of every request. Its questions are always
/// answered B.
pub struct PartialGenerator {
    pub percent: usize,
}

#[async_trait]
impl QuestionGenerator for PartialGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<QuestionRecord>, GenerationError> {
        let n = request.count * self.percent / 100;
        Ok((0..n)
            .map(|i| QuestionRecord {
                id: QuestionId::new_transient(),
                subject: request.subject,
                track: request.track,
                chapter: "General".to_string(),
                topic: "General".to_string(),
                difficulty: request.difficulty,
                prompt: format!("Generated question {}", i),
                options: ["p".into(), "q".into(), "r".into(), "s".into()],
                correct_option: OptionLetter::B,
                explanation: None,
                created_at: None,
            })
            .collect())
    }
}

pub fn make_question(
    id: i64,
    subject: Subject,
    track: Track,
    difficulty: Difficulty,
    topic: &str,
) -> QuestionRecord {
    QuestionRecord {
        id: QuestionId::Persisted(id),
        subject,
        track,
        chapter: format!("{} chapter", topic),
        topic: topic.to_string(),
        difficulty,
        prompt: format!("Question {}", id),
        options: ["a".into(), "b".into(), "c".into(), "d".into()],
        correct_option: OptionLetter::C,
        explanation: Some("Because".to_string()),
        created_at: None,
    }
}

/// `per_cell` questions for every (subject, difficulty), two topics per subject.
pub fn make_bank(track: Track, per_cell: usize) -> Vec<QuestionRecord> {
    let mut bank = Vec::new();
    let mut next_id = 1000;
    for &subject in track.subjects() {
        for difficulty in Difficulty::ALL {
            for i in 0..per_cell {
                let topic = format!("{} topic {}", subject, i % 2 + 1);
                bank.push(make_question(next_id, subject, track, difficulty, &topic));
                next_id += 1;
            }
        }
    }
    bank
}

pub struct Harness {
    pub service: ExamSessionService,
    pub questions: Arc<InMemoryQuestionRepository>,
    pub profiles: Arc<InMemoryLearnerProfileRepository>,
    pub attempts: Arc<InMemoryTestAttemptRepository>,
}

pub fn harness(
    bank: Vec<QuestionRecord>,
    generator: Option<Arc<dyn QuestionGenerator>>,
    session_policy: SessionPolicy,
) -> Harness {
    let questions = Arc::new(InMemoryQuestionRepository::new(bank));
    let profiles = Arc::new(InMemoryLearnerProfileRepository::new());
    let attempts = Arc::new(InMemoryTestAttemptRepository::new());

    let selector = QuestionSelector::new(questions.clone(), generator, SelectionPolicy::default());
    let assembly = TestAssemblyService::new(selector, AssemblyPolicy::default());
    let service = ExamSessionService::new(
        assembly,
        questions.clone(),
        profiles.clone(),
        attempts.clone(),
        session_policy,
    );

    Harness {
        service,
        questions,
        profiles,
        attempts,
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
