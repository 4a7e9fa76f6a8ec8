//! MongoDB database wrapper and the key-value store built on it.

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Client, Collection, options::ClientOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::store::{KvStore, Versioned};
use crate::error::StoreError;

/// Duplicate key error code returned by the server.
const DUPLICATE_KEY: i32 = 11000;

/// Database wrapper for MongoDB operations.
#[derive(Debug, Clone)]
pub struct Database {
    db: mongodb::Database,
}

impl Database {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// # Errors
    /// Returns error if connection or the initial ping fails.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        info!("Successfully connected to MongoDB");

        Ok(Self {
            db: client.database(db_name),
        })
    }

    /// Get a typed collection from the database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}

/// One key-value record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KvDocument {
    #[serde(rename = "_id")]
    key: String,
    version: i64,
    value: Value,
}

/// Key-value store persisted in a single MongoDB collection.
///
/// Compare-and-swap is a conditional replace on `{_id, version}`, so the
/// server serializes competing writers of one key.
pub struct MongoStore {
    collection: Collection<KvDocument>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("kv"),
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl KvStore for MongoStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        let result = self.collection.find_one(doc! { "_id": key }).await?;
        Ok(result.map(|d| Versioned {
            version: d.version as u64,
            value: d.value,
        }))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let value = mongodb::bson::to_bson(&value).map_err(|e| StoreError::Backend(e.to_string()))?;
        let update = doc! {
            "$set": { "value": value },
            "$inc": { "version": 1_i64 },
        };
        let options = mongodb::options::UpdateOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .update_one(doc! { "_id": key }, update)
            .with_options(options)
            .await?;

        debug!("Saved record {}", key);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<u64>,
        value: Value,
    ) -> Result<bool, StoreError> {
        match expected {
            None => {
                let record = KvDocument {
                    key: key.to_string(),
                    version: 1,
                    value,
                };
                match self.collection.insert_one(record).await {
                    Ok(_) => Ok(true),
                    Err(e) if is_duplicate_key(&e) => Ok(false),
                    Err(e) => Err(e.into()),
                }
            }
            Some(version) => {
                let filter = doc! { "_id": key, "version": version as i64 };
                let record = KvDocument {
                    key: key.to_string(),
                    version: version as i64 + 1,
                    value,
                };
                let result = self.collection.replace_one(filter, record).await?;
                Ok(result.matched_count == 1)
            }
        }
    }
}
