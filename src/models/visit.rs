use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Geolocation fields resolved from the client IP at write time.
/// All optional; lookup failure leaves them absent.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GeoLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl GeoLocation {
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.city.is_none() && self.region.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VisitRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub page: String,
    #[serde(default, skip_serializing_if = "GeoLocation::is_empty")]
    pub location: GeoLocation,
    // Stored as a BSON date so the TTL index can reap it
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl VisitRecord {
    pub fn new(
        ip: String,
        user_agent: Option<String>,
        page: Option<String>,
        location: GeoLocation,
    ) -> Self {
        Self {
            id: None,
            ip,
            user_agent,
            page: page.filter(|p| !p.is_empty()).unwrap_or_else(|| "/".to_string()),
            location,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_root() {
        let visit = VisitRecord::new("203.0.113.7".to_string(), None, None, GeoLocation::default());
        assert_eq!(visit.page, "/");

        let visit = VisitRecord::new(
            "203.0.113.7".to_string(),
            None,
            Some(String::new()),
            GeoLocation::default(),
        );
        assert_eq!(visit.page, "/");

        let visit = VisitRecord::new(
            "203.0.113.7".to_string(),
            None,
            Some("/about".to_string()),
            GeoLocation::default(),
        );
        assert_eq!(visit.page, "/about");
    }

    #[test]
    fn empty_location_is_not_serialized() {
        let visit = VisitRecord::new("203.0.113.7".to_string(), None, None, GeoLocation::default());
        let doc = mongodb::bson::to_document(&visit).unwrap();
        assert!(!doc.contains_key("location"));

        let visit = VisitRecord::new(
            "203.0.113.7".to_string(),
            None,
            None,
            GeoLocation {
                country: Some("United States".to_string()),
                city: None,
                region: None,
            },
        );
        let doc = mongodb::bson::to_document(&visit).unwrap();
        assert!(doc.contains_key("location"));
    }
}
