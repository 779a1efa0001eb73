use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{Difficulty, QuestionRecord, Subject, Track},
};

/// Query over the question bank. Track is always required; every other
/// field narrows the match when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFilter {
    pub track: Track,
    pub subject: Option<Subject>,
    pub difficulty: Option<Difficulty>,
    pub topic_in: Option<Vec<String>>,
    pub chapter: Option<String>,
}

impl QuestionFilter {
    pub fn for_track(track: Track) -> Self {
        Self {
            track,
            subject: None,
            difficulty: None,
            topic_in: None,
            chapter: None,
        }
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topic_in = Some(topics.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    pub fn matches(&self, question: &QuestionRecord) -> bool {
        question.track == self.track
            && self.subject.is_none_or(|s| question.subject == s)
            && self.difficulty.is_none_or(|d| question.difficulty == d)
            && self
                .topic_in
                .as_ref()
                .is_none_or(|topics| topics.iter().any(|t| *t == question.topic))
            && self
                .chapter
                .as_ref()
                .is_none_or(|chapter| *chapter == question.chapter)
    }

    fn to_document(&self) -> Document {
        let mut filter = doc! { "track": self.track.as_str() };

        if let Some(subject) = self.subject {
            filter.insert("subject", subject.as_str());
        }
        if let Some(difficulty) = self.difficulty {
            filter.insert("difficulty", difficulty.as_str());
        }
        if let Some(topics) = &self.topic_in {
            filter.insert("topic", doc! { "$in": topics.clone() });
        }
        if let Some(chapter) = &self.chapter {
            filter.insert("chapter", chapter.as_str());
        }

        filter
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn find_questions(&self, filter: &QuestionFilter) -> AppResult<Vec<QuestionRecord>>;
    async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<QuestionRecord>>;
}

pub struct MongoQuestionRepository {
    collection: Collection<QuestionRecord>,
}

impl MongoQuestionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("questions");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for questions collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id.value": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let cell_index = IndexModel::builder()
            .keys(doc! { "track": 1, "subject": 1, "difficulty": 1 })
            .options(
                IndexOptions::builder()
                    .name("track_subject_difficulty".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(cell_index).await?;

        log::info!("Successfully created indexes for questions collection");
        Ok(())
    }

    pub async fn count_questions(&self, filter: &QuestionFilter) -> AppResult<u64> {
        let count = self.collection.count_documents(filter.to_document()).await?;
        Ok(count)
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn find_questions(&self, filter: &QuestionFilter) -> AppResult<Vec<QuestionRecord>> {
        let questions: Vec<QuestionRecord> = self
            .collection
            .find(filter.to_document())
            .await?
            .try_collect()
            .await?;
        Ok(questions)
    }

    async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<QuestionRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = doc! {
            "id.kind": "persisted",
            "id.value": { "$in": ids.to_vec() },
        };
        let questions: Vec<QuestionRecord> =
            self.collection.find(filter).await?.try_collect().await?;
        Ok(questions)
    }
}
