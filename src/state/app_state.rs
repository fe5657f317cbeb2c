use mongodb::Database;

use crate::db::settings::SettingsStore;
use crate::utils::geoip::GeoResolver;

/// Shared application state handed to every handler.
pub struct AppState {
    pub db: Database,
    pub settings: SettingsStore,
    pub geo: GeoResolver,
}

impl AppState {
    pub fn new(db: Database, geo: GeoResolver) -> Self {
        let settings = SettingsStore::new(&db);
        Self { db, settings, geo }
    }
}
