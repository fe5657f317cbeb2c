use std::time::Duration;

use anyhow::{Context, Result};
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};

use crate::models::visit::VisitRecord;

pub const VISITS_COLLECTION: &str = "visits";
pub const SETTINGS_COLLECTION: &str = "settings";
pub const USERS_COLLECTION: &str = "users";

/// Retention window for visit records. The TTL index lets MongoDB's
/// background reaper expire old records; expiry is eventually consistent.
const VISIT_RETENTION_DAYS: u64 = 60;

pub async fn get_database() -> Result<Database> {
    let uri = std::env::var("MONGODB_URI")
        .unwrap_or_else(|_| String::from("mongodb://localhost:27017"));
    let db_name = std::env::var("MONGODB_DB").unwrap_or_else(|_| String::from("sitepulse"));

    let client = Client::with_uri_str(&uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let db = client.database(&db_name);

    ensure_indexes(&db).await?;

    Ok(db)
}

async fn ensure_indexes(db: &Database) -> Result<()> {
    let visits = db.collection::<VisitRecord>(VISITS_COLLECTION);

    let ttl_index = IndexModel::builder()
        .keys(doc! { "created_at": 1 })
        .options(
            IndexOptions::builder()
                .expire_after(Duration::from_secs(VISIT_RETENTION_DAYS * 24 * 60 * 60))
                .build(),
        )
        .build();
    visits
        .create_index(ttl_index)
        .await
        .context("Failed to create visit TTL index")?;

    let ip_index = IndexModel::builder().keys(doc! { "ip": 1 }).build();
    visits
        .create_index(ip_index)
        .await
        .context("Failed to create visit ip index")?;

    Ok(())
}
