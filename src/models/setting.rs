use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Well-known key for the cleanup-epoch setting. There is exactly one
/// document with this key for the whole system.
pub const LAST_LOG_CLEANUP_KEY: &str = "lastLogCleanup";

/// A key/value entry in the settings collection.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Setting {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub key: String,
    pub value: String,
}
