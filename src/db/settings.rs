use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::{Collection, Database, error::Result};

use crate::db::mongodb::SETTINGS_COLLECTION;
use crate::models::setting::{LAST_LOG_CLEANUP_KEY, Setting};

/// Accessor for the key/value settings collection. Handlers receive this
/// through the shared application state instead of reading a global.
#[derive(Clone)]
pub struct SettingsStore {
    collection: Collection<Setting>,
}

impl SettingsStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<Setting>(SETTINGS_COLLECTION),
        }
    }

    /// The timestamp of the last full visit wipe, if one has ever happened.
    /// A stored value that fails to parse is treated as absent.
    pub async fn last_log_cleanup(&self) -> Result<Option<DateTime<Utc>>> {
        let setting = self
            .collection
            .find_one(doc! { "key": LAST_LOG_CLEANUP_KEY })
            .await?;

        Ok(setting.and_then(|s| {
            DateTime::parse_from_rfc3339(&s.value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }))
    }

    /// Raw stored value, for the public config endpoint.
    pub async fn last_log_cleanup_raw(&self) -> Result<Option<String>> {
        let setting = self
            .collection
            .find_one(doc! { "key": LAST_LOG_CLEANUP_KEY })
            .await?;

        Ok(setting.map(|s| s.value))
    }

    /// Record a wipe. Upserts so the first cleanup creates the singleton
    /// document and later cleanups overwrite it.
    pub async fn set_last_log_cleanup(&self, at: DateTime<Utc>) -> Result<()> {
        self.collection
            .update_one(
                doc! { "key": LAST_LOG_CLEANUP_KEY },
                doc! { "$set": { "value": at.to_rfc3339() } },
            )
            .upsert(true)
            .await?;

        Ok(())
    }
}
