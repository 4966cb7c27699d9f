//! MongoDB connector (`bookings`)
//!
//! Documents may disagree on their keys; the dataset header is the ordered
//! union of keys across the whole scan and missing keys stay empty.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::ClientOptions,
    Client,
};
use serde_json::Value;
use tracing::{info, instrument};

use super::{SourceConnector, SourceKind};
use crate::{
    config::MongoConfig,
    dataset::{Dataset, Record},
    error::{IngestError, IngestResult},
};

const KIND: SourceKind = SourceKind::Mongo;
const COLLECTION: &str = "bookings";

pub struct MongoConnector {
    config: MongoConfig,
}

impl MongoConnector {
    pub fn new(config: MongoConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SourceConnector for MongoConnector {
    #[instrument(skip(self), fields(source = %KIND, database = %self.config.database))]
    async fn extract(&self) -> IngestResult<Vec<Dataset>> {
        let uri = self
            .config
            .uri
            .as_deref()
            .ok_or_else(|| IngestError::missing_setting(KIND, "MONGO_URI"))?;

        let options = ClientOptions::parse(uri)
            .await
            .map_err(|e| IngestError::connection(KIND, e))?;
        let hosts: Vec<String> = options.hosts.iter().map(ToString::to_string).collect();
        let client = Client::with_options(options).map_err(|e| IngestError::connection(KIND, e))?;

        let scanned = scan(&client, &self.config.database).await;
        client.shutdown().await;

        let documents = scanned?;
        info!(hosts = ?hosts, documents = documents.len(), "Read bookings from MongoDB");

        let records = documents.into_iter().map(document_to_record).collect();
        Ok(vec![Dataset::from_records(COLLECTION, records)])
    }
}

async fn scan(client: &Client, database: &str) -> IngestResult<Vec<Document>> {
    let db = client.database(database);

    // The driver connects lazily; ping so unreachable servers read as connection errors.
    db.run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| IngestError::connection(KIND, e))?;

    let query_error = |e: mongodb::error::Error| IngestError::query(KIND, COLLECTION, e);

    db.collection::<Document>(COLLECTION)
        .find(doc! {})
        .await
        .map_err(query_error)?
        .try_collect()
        .await
        .map_err(query_error)
}

/// Flatten one document into a row, keeping its field order
pub fn document_to_record(document: Document) -> Record {
    document
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect()
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Value::from(dt.timestamp_millis()),
        },
        Bson::Null | Bson::Undefined => Value::Null,
        other => other.into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    #[test]
    fn test_document_to_record_flattens_special_types() {
        let id = ObjectId::parse_str("65e1a0c2f1d2c3b4a5968778").unwrap();
        let when = mongodb::bson::DateTime::from_millis(1_709_251_200_000);

        let record = document_to_record(doc! {
            "_id": id,
            "user_id": 42_i64,
            "seats": ["A1", "A2"],
            "created_at": when,
            "paid": true,
            "coupon": Bson::Null,
        });

        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec!["_id", "user_id", "seats", "created_at", "paid", "coupon"]
        );
        assert_eq!(record["_id"], json!("65e1a0c2f1d2c3b4a5968778"));
        assert_eq!(record["user_id"], json!(42));
        assert_eq!(record["seats"], json!(["A1", "A2"]));
        assert_eq!(record["created_at"], json!("2024-03-01T00:00:00Z"));
        assert_eq!(record["paid"], json!(true));
        assert_eq!(record["coupon"], Value::Null);
    }

    #[test]
    fn test_heterogeneous_documents_share_header() {
        let records = vec![
            document_to_record(doc! { "_id": 1, "movie": "Alien" }),
            document_to_record(doc! { "_id": 2, "promo": "2x1" }),
        ];
        let dataset = Dataset::from_records(COLLECTION, records);

        assert_eq!(dataset.columns(), &["_id", "movie", "promo"]);
        assert!(dataset.rows()[1].get("movie").is_none());
    }

    #[tokio::test]
    async fn test_missing_uri_is_connection_error() {
        let connector = MongoConnector::new(MongoConfig::default());
        let err = connector.extract().await.unwrap_err();
        assert!(matches!(err, IngestError::Connection { source_name: "MongoDB", .. }));
    }
}
