use secrecy::SecretString;
use std::env;

use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub mongo_max_pool_size: u32,
    pub mongo_timeout_secs: u64,
    pub openai_api_key: Option<SecretString>,
    pub openai_model: String,
    pub generation_batch_size: usize,
    pub generation_timeout_secs: u64,
    pub generation_success_threshold: f64,
    pub relax_difficulty_fallback: bool,
    pub weak_topic_share: f64,
    pub initial_test_size: usize,
    pub adaptive_test_size: usize,
    pub subject_test_size: usize,
    pub recent_attempt_window: usize,
    pub minimum_test_questions: Option<usize>,
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "exam-prep-local".to_string()),
            mongo_max_pool_size: parsed_or("MONGO_MAX_POOL_SIZE", 10),
            mongo_timeout_secs: parsed_or("MONGO_TIMEOUT_SECS", 5),
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            generation_batch_size: parsed_or("GENERATION_BATCH_SIZE", 10),
            generation_timeout_secs: parsed_or("GENERATION_TIMEOUT_SECS", 60),
            generation_success_threshold: parsed_or("GENERATION_SUCCESS_THRESHOLD", 0.7),
            relax_difficulty_fallback: parsed_or("RELAX_DIFFICULTY_FALLBACK", true),
            weak_topic_share: parsed_or("WEAK_TOPIC_SHARE", 0.7),
            initial_test_size: parsed_or("INITIAL_TEST_SIZE", 25),
            adaptive_test_size: parsed_or("ADAPTIVE_TEST_SIZE", 30),
            subject_test_size: parsed_or("SUBJECT_TEST_SIZE", 30),
            recent_attempt_window: parsed_or("RECENT_ATTEMPT_WINDOW", 5),
            minimum_test_questions: env::var("MINIMUM_TEST_QUESTIONS")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Rejects tuning values that would make selection meaningless.
    pub fn validate(&self) -> AppResult<()> {
        let in_unit_range = |v: f64| v > 0.0 && v <= 1.0;

        if !in_unit_range(self.generation_success_threshold) {
            return Err(AppError::ConfigurationError(format!(
                "GENERATION_SUCCESS_THRESHOLD must be in (0, 1], got {}",
                self.generation_success_threshold
            )));
        }
        if !in_unit_range(self.weak_topic_share) {
            return Err(AppError::ConfigurationError(format!(
                "WEAK_TOPIC_SHARE must be in (0, 1], got {}",
                self.weak_topic_share
            )));
        }
        if self.mongo_max_pool_size == 0 {
            return Err(AppError::ConfigurationError(
                "MONGO_MAX_POOL_SIZE must be at least 1".to_string(),
            ));
        }
        if self.generation_batch_size == 0 {
            return Err(AppError::ConfigurationError(
                "GENERATION_BATCH_SIZE must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn generator_enabled(&self) -> bool {
        self.openai_api_key.is_some()
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "exam-prep-test".to_string(),
            mongo_max_pool_size: 10,
            mongo_timeout_secs: 5,
            openai_api_key: None,
            openai_model: "gpt-3.5-turbo".to_string(),
            generation_batch_size: 10,
            generation_timeout_secs: 5,
            generation_success_threshold: 0.7,
            relax_difficulty_fallback: true,
            weak_topic_share: 0.7,
            initial_test_size: 25,
            adaptive_test_size: 30,
            subject_test_size: 30,
            recent_attempt_window: 5,
            minimum_test_questions: None,
        }
    }
}
