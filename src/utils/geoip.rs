use std::net::IpAddr;
use std::sync::Arc;

use maxminddb::{Reader, geoip2};

use crate::models::visit::GeoLocation;

/// Wrapper around an optional MaxMind city database. Constructed once at
/// startup and shared through the application state; when no database is
/// configured every lookup resolves to an empty location.
#[derive(Clone)]
pub struct GeoResolver {
    reader: Option<Arc<Reader<Vec<u8>>>>,
}

impl GeoResolver {
    /// Load the database from the GEOIP_DB_PATH environment variable.
    /// A missing or unreadable database disables lookups but never fails
    /// startup; visit records are simply written without location fields.
    pub fn from_env() -> Self {
        let reader = match std::env::var("GEOIP_DB_PATH") {
            Ok(path) if !path.is_empty() => match Reader::open_readfile(&path) {
                Ok(reader) => {
                    log::info!("GeoIP database loaded from {}", path);
                    Some(Arc::new(reader))
                }
                Err(e) => {
                    log::warn!(
                        "Failed to load GeoIP database from {}: {}. Visits will be recorded without location.",
                        path,
                        e
                    );
                    None
                }
            },
            _ => {
                log::info!("GEOIP_DB_PATH not set, visit geolocation disabled");
                None
            }
        };

        Self { reader }
    }

    pub fn disabled() -> Self {
        Self { reader: None }
    }

    /// Resolve an IP address to country/city/region. Any failure (bad
    /// address, private range, record not found) yields an empty location.
    pub fn lookup(&self, ip: &str) -> GeoLocation {
        let Some(reader) = &self.reader else {
            return GeoLocation::default();
        };

        let Ok(ip_addr) = ip.parse::<IpAddr>() else {
            return GeoLocation::default();
        };

        let city: geoip2::City = match reader.lookup(ip_addr) {
            Ok(city) => city,
            Err(_) => return GeoLocation::default(),
        };

        let country = city.country.and_then(|c| {
            c.names
                .as_ref()
                .and_then(|names| names.get("en").map(|s| s.to_string()))
                .or_else(|| c.iso_code.map(|s| s.to_string()))
        });

        let city_name = city
            .city
            .and_then(|c| c.names.and_then(|names| names.get("en").map(|s| s.to_string())));

        let region = city.subdivisions.and_then(|subs| {
            subs.first().and_then(|sub| {
                sub.names
                    .as_ref()
                    .and_then(|names| names.get("en").map(|s| s.to_string()))
            })
        });

        GeoLocation {
            country,
            city: city_name,
            region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_resolver_returns_empty_location() {
        let resolver = GeoResolver::disabled();
        assert!(resolver.lookup("8.8.8.8").is_empty());
    }

    #[test]
    fn unparseable_address_returns_empty_location() {
        let resolver = GeoResolver::disabled();
        assert!(resolver.lookup("unknown").is_empty());
        assert!(resolver.lookup("").is_empty());
    }
}
