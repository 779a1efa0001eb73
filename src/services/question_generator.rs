use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use chrono::Utc;
use schemars::JsonSchema;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::{
    config::Config,
    constants::question_prompt::{question_batch_prompt, QUESTION_GENERATION_PROMPT},
    errors::GenerationError,
    models::domain::{Difficulty, OptionLetter, QuestionId, QuestionRecord, Subject, Track},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub track: Track,
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub count: usize,
}

impl GenerationRequest {
    pub fn new(track: Track, subject: Subject, difficulty: Difficulty, count: usize) -> Self {
        Self {
            track,
            subject,
            difficulty,
            count,
        }
    }
}

/// A source of freshly written questions. Results carry transient ids and
/// may be shorter than requested.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<QuestionRecord>, GenerationError>;
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GeneratedBatch {
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GeneratedQuestion {
    pub question: String,
    /// Exactly four option texts, in A-D order.
    pub options: Vec<String>,
    /// Single letter A-D.
    pub answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub chapter: Option<String>,
}

impl GeneratedQuestion {
    fn into_record(self, request: &GenerationRequest) -> Option<QuestionRecord> {
        let prompt = self.question.trim().to_string();
        if prompt.is_empty() {
            return None;
        }

        let options: Vec<String> = self.options.iter().map(|o| strip_option_label(o)).collect();
        let options: [String; 4] = options.try_into().ok()?;
        if options.iter().any(|o| o.is_empty()) {
            return None;
        }

        let correct_option: OptionLetter = self.answer.parse().ok()?;
        let label_or_general = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "General".to_string())
        };

        Some(QuestionRecord {
            id: QuestionId::new_transient(),
            subject: request.subject,
            track: request.track,
            chapter: label_or_general(self.chapter),
            topic: label_or_general(self.topic),
            difficulty: request.difficulty,
            prompt,
            options,
            correct_option,
            explanation: self.explanation.filter(|e| !e.trim().is_empty()),
            created_at: Some(Utc::now()),
        })
    }
}

/// Drops a leading "A)" / "B." style label the model sometimes adds.
fn strip_option_label(option: &str) -> String {
    let trimmed = option.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), Some(')' | '.')) if matches!(letter, 'A'..='D' | 'a'..='d') => {
            chars.as_str().trim().to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Parses one chat completion body into records, skipping malformed items.
pub fn parse_batch(
    content: &str,
    request: &GenerationRequest,
) -> Result<Vec<QuestionRecord>, GenerationError> {
    let batch: GeneratedBatch = serde_json::from_str(content.trim())
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let total = batch.questions.len();
    let records: Vec<QuestionRecord> = batch
        .questions
        .into_iter()
        .filter_map(|q| q.into_record(request))
        .collect();

    if records.len() < total {
        log::debug!(
            "Dropped {} malformed generated questions for {} {}",
            total - records.len(),
            request.track,
            request.subject
        );
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct ChatCompletionEnvelope {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct OpenAiQuestionGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    batch_size: usize,
    timeout: Duration,
}

impl OpenAiQuestionGenerator {
    pub fn new(api_key: &SecretString, model: &str, batch_size: usize, timeout_secs: u64) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.expose_secret());
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            batch_size: batch_size.max(1),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.openai_api_key.as_ref()?;
        Some(Self::new(
            api_key,
            &config.openai_model,
            config.generation_batch_size,
            config.generation_timeout_secs,
        ))
    }

    fn build_request(&self, request: &GenerationRequest, batch_count: usize) -> serde_json::Value {
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(GeneratedBatch))
            .unwrap_or_default();
        let system_prompt = format!("{}{}", QUESTION_GENERATION_PROMPT, schema);
        let user_prompt = question_batch_prompt(
            request.track,
            request.subject,
            request.difficulty,
            batch_count,
        );

        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "temperature": 0.8,
            "max_tokens": 3000,
            "response_format": { "type": "json_object" }
        })
    }

    async fn request_batch(
        &self,
        request: &GenerationRequest,
        batch_count: usize,
    ) -> Result<Vec<QuestionRecord>, GenerationError> {
        let body = self.build_request(request, batch_count);
        let envelope: ChatCompletionEnvelope = self.client.chat().create_byot(body).await?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::MalformedResponse("empty completion".to_string()))?;

        parse_batch(&content, request)
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiQuestionGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<QuestionRecord>, GenerationError> {
        let mut collected = Vec::with_capacity(request.count);
        let mut last_error = None;
        let mut remaining = request.count;
        let mut batch_number = 0;

        // Batches go out one at a time to stay under the provider's size limits.
        while remaining > 0 {
            let batch_count = remaining.min(self.batch_size);
            batch_number += 1;

            match tokio::time::timeout(self.timeout, self.request_batch(request, batch_count)).await {
                Ok(Ok(questions)) => {
                    log::info!(
                        "Generated batch {} for {} {} {}: {} questions",
                        batch_number,
                        request.track,
                        request.subject,
                        request.difficulty,
                        questions.len()
                    );
                    collected.extend(questions);
                }
                Ok(Err(e)) => {
                    log::warn!("Question generation batch {} failed: {}", batch_number, e);
                    last_error = Some(e);
                }
                Err(_) => {
                    let e = GenerationError::Timeout(self.timeout.as_secs());
                    log::warn!("Question generation batch {} failed: {}", batch_number, e);
                    last_error = Some(e);
                }
            }

            remaining -= batch_count;
        }

        if collected.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        collected.truncate(request.count);
        Ok(collected)
    }
}
