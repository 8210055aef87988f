use crate::config::Config;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client as MongoClient, Database, IndexModel};

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);

        tracing::info!("Verifying MongoDB connection...");
        tokio::time::timeout(
            std::time::Duration::from_secs(10),
            mongo.run_command(doc! { "ping": 1 }),
        )
        .await
        .map_err(|_| anyhow::anyhow!("MongoDB ping timeout after 10s"))??;
        tracing::info!("MongoDB connection established");

        let state = Self { config, mongo };
        state.ensure_indexes().await?;

        Ok(state)
    }

    /// Unique indexes turn the read-then-insert races (registration numbers,
    /// duplicate emails) into duplicate-key conflicts instead of silent
    /// duplicates.
    async fn ensure_indexes(&self) -> anyhow::Result<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.mongo
            .collection::<mongodb::bson::Document>("students")
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "registration_number": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;

        self.mongo
            .collection::<mongodb::bson::Document>("users")
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;

        self.mongo
            .collection::<mongodb::bson::Document>("subjects")
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "category_id": 1, "name": 1 })
                    .options(unique)
                    .build(),
            )
            .await?;

        tracing::info!("MongoDB indexes ensured");
        Ok(())
    }
}

pub mod admission_service;
pub mod announcement_service;
pub mod audit_service;
pub mod auth_service;
pub mod class_service;
pub mod exam_service;
pub mod grading;
pub mod library_service;
pub mod quiz_service;
pub mod registration;
pub mod student_service;
pub mod user_service;
