use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    bson::doc,
    options::{IndexOptions, ReplaceOptions},
    Collection, IndexModel,
};

use crate::{db::Database, errors::AppResult, models::domain::LearnerProfile};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LearnerProfileRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<LearnerProfile>>;
    /// Upserts the whole profile; the latest analysis always wins.
    async fn save(&self, profile: LearnerProfile) -> AppResult<LearnerProfile>;
}

pub struct MongoLearnerProfileRepository {
    collection: Collection<LearnerProfile>,
}

impl MongoLearnerProfileRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("learner_profiles");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        let options = IndexOptions::builder()
            .unique(true)
            .name("id_unique".to_string())
            .build();
        let model = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(options)
            .build();

        self.collection.create_index(model).await?;
        log::info!("Created unique index on learner_profiles.id");

        Ok(())
    }
}

#[async_trait]
impl LearnerProfileRepository for MongoLearnerProfileRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<LearnerProfile>> {
        let profile = self.collection.find_one(doc! { "id": id }).await?;
        Ok(profile)
    }

    async fn save(&self, mut profile: LearnerProfile) -> AppResult<LearnerProfile> {
        profile.modified_at = Some(Utc::now());

        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(doc! { "id": &profile.id }, &profile)
            .with_options(options)
            .await?;

        Ok(profile)
    }
}
