use serde::Deserialize;
use validator::Validate;

use crate::errors::AppResult;
use crate::models::domain::{AnswerSheet, Difficulty, OptionLetter, QuestionId, Subject, Track};

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: QuestionId,
    /// Raw option as submitted by the form; blank means skipped.
    pub option: Option<String>,
}

/// Answers for an open session. Marking comes from the session, never from
/// the submitter.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,

    pub answers: Vec<AnswerInput>,
}

impl SubmitAttemptRequest {
    /// Builds the sparse answer sheet. Blank options are left out so they
    /// score as unattempted; anything else must be a letter A-D.
    pub fn answer_sheet(&self) -> AppResult<AnswerSheet> {
        let mut sheet = AnswerSheet::new();
        for answer in &self.answers {
            let Some(raw) = answer.option.as_deref().map(str::trim) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }
            let option: OptionLetter = raw.parse()?;
            sheet.insert(answer.question_id, option);
        }
        Ok(sheet)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChapterTestRequest {
    pub track: Track,
    pub subject: Subject,

    #[validate(length(min = 1, max = 100))]
    pub chapter: String,

    pub difficulty: Option<Difficulty>,

    #[validate(range(min = 1, max = 100))]
    pub limit: usize,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubjectTestRequest {
    pub track: Track,
    pub subject: Subject,

    /// Defaults to the configured subject test size.
    #[serde(default)]
    #[validate(range(min = 1, max = 200))]
    pub question_count: Option<usize>,
}
