use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{AttemptRecord, QuestionId},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestAttemptRepository: Send + Sync {
    async fn create(&self, attempt: AttemptRecord) -> AppResult<AttemptRecord>;
    /// Newest first.
    async fn find_by_learner(
        &self,
        learner_id: &str,
        offset: u64,
        limit: i64,
    ) -> AppResult<Vec<AttemptRecord>>;

    /// Questions shown in the learner's `window` most recent attempts.
    async fn recent_question_ids(&self, learner_id: &str, window: usize) -> AppResult<Vec<QuestionId>> {
        if window == 0 {
            return Ok(Vec::new());
        }
        let attempts = self.find_by_learner(learner_id, 0, window as i64).await?;
        Ok(attempts
            .into_iter()
            .flat_map(|attempt| attempt.question_ids)
            .collect())
    }
}

pub struct MongoTestAttemptRepository {
    collection: Collection<AttemptRecord>,
}

impl MongoTestAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("test_attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for test_attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let learner_index = IndexModel::builder()
            .keys(doc! { "learner_id": 1, "submitted_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("learner_submitted".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(learner_index).await?;

        log::info!("Successfully created indexes for test_attempts collection");
        Ok(())
    }
}

#[async_trait]
impl TestAttemptRepository for MongoTestAttemptRepository {
    async fn create(&self, attempt: AttemptRecord) -> AppResult<AttemptRecord> {
        self.collection.insert_one(&attempt).await?;
        Ok(attempt)
    }

    async fn find_by_learner(
        &self,
        learner_id: &str,
        offset: u64,
        limit: i64,
    ) -> AppResult<Vec<AttemptRecord>> {
        let attempts = self
            .collection
            .find(doc! { "learner_id": learner_id })
            .skip(offset)
            .limit(limit)
            .sort(doc! { "submitted_at": -1 })
            .await?
            .try_collect()
            .await?;

        Ok(attempts)
    }
}
