// src/documents/mongo.rs
use super::{AchievementDocuments, DocumentStoreError};
use crate::{
    config::Config,
    models::document::{AchievementDocument, Attachment, StudentPoints, TypeCount},
};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::TryStreamExt;
use mongodb::{options::IndexOptions, Client, Collection, IndexModel};

pub const ACHIEVEMENT_COLLECTION: &str = "achievements";

#[derive(Clone)]
pub struct MongoAchievementStore {
    collection: Collection<AchievementDocument>,
}

impl MongoAchievementStore {
    /// Connects, pings and makes sure the collection indexes exist.
    pub async fn connect(config: &Config) -> Result<Self, DocumentStoreError> {
        tracing::info!("Connecting to MongoDB at {}", config.mongo_uri);

        // Fail fast instead of hanging on an unreachable server
        let uri = if config.mongo_uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=5000&connectTimeoutMS=5000", config.mongo_uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=5000&connectTimeoutMS=5000", config.mongo_uri)
        };

        let client = Client::with_uri_str(&uri).await?;
        let database = client.database(&config.mongo_db_name);
        database.run_command(doc! { "ping": 1 }).await?;
        tracing::info!("✅ Connected to MongoDB database '{}'", config.mongo_db_name);

        let store = MongoAchievementStore {
            collection: database.collection(ACHIEVEMENT_COLLECTION),
        };
        store.apply_indexes().await?;
        Ok(store)
    }

    async fn apply_indexes(&self) -> Result<(), DocumentStoreError> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "student_id": 1 })
                .options(IndexOptions::builder().name("student_id_index".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "achievement_type": 1 })
                .options(
                    IndexOptions::builder()
                        .name("achievement_type_index".to_string())
                        .build(),
                )
                .build(),
        ];
        self.collection.create_indexes(indexes).await?;
        Ok(())
    }
}

fn parse_object_id(id: &str) -> Result<ObjectId, DocumentStoreError> {
    ObjectId::parse_str(id).map_err(|_| DocumentStoreError::InvalidId(id.to_string()))
}

/// Matches documents without a deletion timestamp.
pub(crate) fn live_filter() -> Document {
    doc! { "deleted_at": { "$exists": false } }
}

pub(crate) fn live_by_ids_filter(ids: &[String]) -> Document {
    let object_ids: Vec<ObjectId> = ids
        .iter()
        .filter_map(|id| match ObjectId::parse_str(id) {
            Ok(oid) => Some(oid),
            Err(_) => {
                tracing::warn!("Skipping malformed document id '{}' in bulk fetch", id);
                None
            }
        })
        .collect();

    let mut filter = live_filter();
    filter.insert("_id", doc! { "$in": object_ids });
    filter
}

pub(crate) fn type_count_pipeline() -> Vec<Document> {
    vec![
        doc! { "$match": live_filter() },
        doc! { "$group": { "_id": "$achievement_type", "count": { "$sum": 1 } } },
        doc! { "$sort": { "_id": 1 } },
    ]
}

pub(crate) fn top_students_pipeline(limit: i64) -> Vec<Document> {
    vec![
        doc! { "$match": live_filter() },
        doc! {
            "$group": {
                "_id": "$student_id",
                "totalPoints": { "$sum": "$points" },
                "count": { "$sum": 1 },
            }
        },
        doc! { "$sort": { "totalPoints": -1, "count": -1, "_id": 1 } },
        doc! { "$limit": limit },
    ]
}

#[async_trait]
impl AchievementDocuments for MongoAchievementStore {
    async fn insert(&self, document: &AchievementDocument) -> Result<String, DocumentStoreError> {
        let result = self.collection.insert_one(document).await?;
        result
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .ok_or_else(|| DocumentStoreError::Backend("inserted id is not an ObjectId".into()))
    }

    async fn find_live_by_ids(
        &self,
        ids: &[String],
    ) -> Result<Vec<AchievementDocument>, DocumentStoreError> {
        let cursor = self.collection.find(live_by_ids_filter(ids)).await?;
        let documents: Vec<AchievementDocument> = cursor.try_collect().await?;
        tracing::debug!("Fetched {} of {} requested documents", documents.len(), ids.len());
        Ok(documents)
    }

    async fn soft_delete(&self, id: &str) -> Result<(), DocumentStoreError> {
        let oid = parse_object_id(id)?;
        let now = DateTime::now();
        let mut filter = live_filter();
        filter.insert("_id", oid);

        let result = self
            .collection
            .update_one(filter, doc! { "$set": { "deleted_at": now, "updated_at": now } })
            .await?;
        if result.matched_count == 0 {
            tracing::warn!("Soft delete matched no live document for id {}", id);
        }
        Ok(())
    }

    async fn push_attachment(
        &self,
        id: &str,
        attachment: &Attachment,
    ) -> Result<(), DocumentStoreError> {
        let oid = parse_object_id(id)?;
        let attachment = bson::to_bson(attachment)
            .map_err(|e| DocumentStoreError::Backend(format!("failed to encode attachment: {}", e)))?;

        let result = self
            .collection
            .update_one(
                doc! { "_id": oid },
                doc! {
                    "$push": { "attachments": attachment },
                    "$set": { "updated_at": DateTime::now() },
                },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(DocumentStoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn count_by_type(&self) -> Result<Vec<TypeCount>, DocumentStoreError> {
        let cursor = self.collection.aggregate(type_count_pipeline()).await?;
        let rows: Vec<Document> = cursor.try_collect().await?;
        rows.into_iter()
            .map(|row| bson::from_document::<TypeCount>(row).map_err(DocumentStoreError::from))
            .collect()
    }

    async fn top_students(&self, limit: i64) -> Result<Vec<StudentPoints>, DocumentStoreError> {
        let cursor = self.collection.aggregate(top_students_pipeline(limit)).await?;
        let rows: Vec<Document> = cursor.try_collect().await?;
        rows.into_iter()
            .map(|row| bson::from_document::<StudentPoints>(row).map_err(DocumentStoreError::from))
            .collect()
    }
}
