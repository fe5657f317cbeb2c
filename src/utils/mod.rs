pub mod dedupe;
pub mod geoip;
pub mod jwt;
pub mod visit_query;
