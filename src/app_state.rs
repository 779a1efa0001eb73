use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        LearnerProfileRepository, MongoLearnerProfileRepository, MongoQuestionRepository,
        MongoTestAttemptRepository, QuestionRepository, TestAttemptRepository,
    },
    services::{
        AssemblyPolicy, ExamSessionService, OpenAiQuestionGenerator, QuestionGenerator,
        QuestionSelector, SelectionPolicy, SessionPolicy, TestAssemblyService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<ExamSessionService>,
    pub question_repository: Arc<MongoQuestionRepository>,
    pub db: Database,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        config.validate()?;
        let db = Database::connect(&config).await?;

        let question_repository = Arc::new(MongoQuestionRepository::new(&db));
        question_repository.ensure_indexes().await?;

        let profile_repository = Arc::new(MongoLearnerProfileRepository::new(&db));
        profile_repository.ensure_indexes().await?;

        let attempt_repository = Arc::new(MongoTestAttemptRepository::new(&db));
        attempt_repository.ensure_indexes().await?;

        let session_service = Arc::new(build_session_service(
            &config,
            question_repository.clone(),
            profile_repository,
            attempt_repository,
        ));

        Ok(Self {
            session_service,
            question_repository,
            db,
            config: Arc::new(config),
        })
    }
}

/// Wires the engine over whichever repositories are supplied. The generator is
/// only attached when an API key is configured.
pub fn build_session_service(
    config: &Config,
    question_repository: Arc<dyn QuestionRepository>,
    profile_repository: Arc<dyn LearnerProfileRepository>,
    attempt_repository: Arc<dyn TestAttemptRepository>,
) -> ExamSessionService {
    let generator: Option<Arc<dyn QuestionGenerator>> = match OpenAiQuestionGenerator::from_config(config) {
        Some(generator) => {
            log::info!("Question generator enabled with model {}", config.openai_model);
            Some(Arc::new(generator))
        }
        None => {
            log::warn!("OPENAI_API_KEY not set, questions come from the repository only");
            None
        }
    };

    let selector = QuestionSelector::new(
        question_repository.clone(),
        generator,
        SelectionPolicy::from_config(config),
    );
    let assembly = TestAssemblyService::new(selector, AssemblyPolicy::from_config(config));

    ExamSessionService::new(
        assembly,
        question_repository,
        profile_repository,
        attempt_repository,
        SessionPolicy::from_config(config),
    )
}
