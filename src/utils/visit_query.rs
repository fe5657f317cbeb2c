use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mongodb::bson::{Document, doc};

use crate::structs::visit::VisitQueryParams;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;
// Generous ceiling; keeps (page - 1) * limit far from u64 overflow
pub const MAX_PAGE: u64 = 1_000_000;

fn regex_filter(term: &str) -> Document {
    // Case-insensitive substring match
    doc! { "$regex": term, "$options": "i" }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Build the MongoDB filter for a visit list query. Malformed date params
/// are ignored rather than rejected, so they simply fail to narrow the
/// result set.
pub fn build_filter(params: &VisitQueryParams) -> Document {
    let mut clauses: Vec<Document> = Vec::new();

    if let Some(search) = non_empty(&params.search) {
        clauses.push(doc! {
            "$or": [
                { "ip": regex_filter(search) },
                { "page": regex_filter(search) },
                { "location.country": regex_filter(search) },
            ]
        });
    }

    let field_filters = [
        ("ip", &params.ip),
        ("location.country", &params.country),
        ("location.city", &params.city),
        ("location.region", &params.region),
        ("page", &params.path),
    ];
    for (field, value) in field_filters {
        if let Some(value) = non_empty(value) {
            clauses.push(doc! { field: regex_filter(value) });
        }
    }

    let mut range = Document::new();
    if let Some(start) = non_empty(&params.start_date).and_then(parse_date) {
        let start_of_day = start.and_time(NaiveTime::MIN).and_utc();
        range.insert("$gte", mongodb::bson::DateTime::from_chrono(start_of_day));
    }
    if let Some(end) = non_empty(&params.end_date).and_then(parse_date) {
        // endDate is inclusive of its entire calendar day
        let next_day = end.succ_opt().unwrap_or(end);
        let end_exclusive = next_day.and_time(NaiveTime::MIN).and_utc();
        range.insert("$lt", mongodb::bson::DateTime::from_chrono(end_exclusive));
    }
    if !range.is_empty() {
        clauses.push(doc! { "created_at": range });
    }

    match clauses.len() {
        0 => Document::new(),
        1 => clauses.into_iter().next().unwrap_or_default(),
        _ => doc! { "$and": clauses },
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Midnight of the UTC calendar day containing `now`.
pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Filter matching every visit recorded during the UTC calendar day
/// containing `now`; drives the unique-visitors-today count.
pub fn today_filter(now: DateTime<Utc>) -> Document {
    doc! {
        "created_at": {
            "$gte": mongodb::bson::DateTime::from_chrono(start_of_utc_day(now))
        }
    }
}

/// Build the sort document. Unknown sort fields fall back to the default
/// `created_at` descending.
pub fn build_sort(params: &VisitQueryParams) -> Document {
    let field = match params.sort_by.as_deref() {
        Some("ip") => "ip",
        Some("page") | Some("path") => "page",
        Some("country") => "location.country",
        Some("city") => "location.city",
        Some("region") => "location.region",
        _ => "created_at",
    };

    let direction = match params.sort_order.as_deref() {
        Some("asc") => 1,
        _ => -1,
    };

    doc! { field: direction }
}

/// Resolve the 1-based page and per-page limit, clamping out-of-range input.
pub fn resolve_pagination(params: &VisitQueryParams) -> (u64, i64) {
    let page = params.page.unwrap_or(1).clamp(1, MAX_PAGE);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    (page, limit)
}

pub fn total_pages(total: u64, limit: i64) -> u64 {
    let limit = limit.max(1) as u64;
    total.div_ceil(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{Bson, DateTime as BsonDateTime};

    fn params() -> VisitQueryParams {
        VisitQueryParams::default()
    }

    #[test]
    fn empty_params_produce_empty_filter() {
        assert!(build_filter(&params()).is_empty());
    }

    #[test]
    fn search_matches_ip_page_and_country() {
        let filter = build_filter(&VisitQueryParams {
            search: Some("foo".to_string()),
            ..params()
        });
        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 3);
    }

    #[test]
    fn end_date_covers_its_entire_day() {
        let filter = build_filter(&VisitQueryParams {
            country: Some("US".to_string()),
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-01".to_string()),
            ..params()
        });

        let and = filter.get_array("$and").unwrap();
        assert_eq!(and.len(), 2);

        let range = and
            .iter()
            .filter_map(Bson::as_document)
            .find_map(|d| d.get_document("created_at").ok())
            .unwrap();

        let gte = range.get_datetime("$gte").unwrap();
        let lt = range.get_datetime("$lt").unwrap();
        assert_eq!(
            *gte,
            BsonDateTime::parse_rfc3339_str("2024-01-01T00:00:00Z").unwrap()
        );
        // Exclusive upper bound is the start of the next day
        assert_eq!(
            *lt,
            BsonDateTime::parse_rfc3339_str("2024-01-02T00:00:00Z").unwrap()
        );
    }

    #[test]
    fn malformed_dates_are_ignored() {
        let filter = build_filter(&VisitQueryParams {
            start_date: Some("not-a-date".to_string()),
            end_date: Some("2024-13-45".to_string()),
            ..params()
        });
        assert!(filter.is_empty());
    }

    #[test]
    fn single_clause_is_not_wrapped_in_and() {
        let filter = build_filter(&VisitQueryParams {
            ip: Some("203.0".to_string()),
            ..params()
        });
        assert!(filter.get("$and").is_none());
        assert!(filter.get_document("ip").is_ok());
    }

    #[test]
    fn default_sort_is_created_at_descending() {
        let sort = build_sort(&params());
        assert_eq!(sort.get_i32("created_at").unwrap(), -1);

        let sort = build_sort(&VisitQueryParams {
            sort_by: Some("country".to_string()),
            sort_order: Some("asc".to_string()),
            ..params()
        });
        assert_eq!(sort.get_i32("location.country").unwrap(), 1);

        let sort = build_sort(&VisitQueryParams {
            sort_by: Some("bogus".to_string()),
            ..params()
        });
        assert_eq!(sort.get_i32("created_at").unwrap(), -1);
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(resolve_pagination(&params()), (1, DEFAULT_PAGE_LIMIT));

        let (page, limit) = resolve_pagination(&VisitQueryParams {
            page: Some(0),
            limit: Some(10_000),
            ..params()
        });
        assert_eq!(page, 1);
        assert_eq!(limit, MAX_PAGE_LIMIT);
    }

    #[test]
    fn huge_page_number_cannot_overflow_skip() {
        let (page, limit) = resolve_pagination(&VisitQueryParams {
            page: Some(u64::MAX),
            limit: Some(MAX_PAGE_LIMIT),
            ..params()
        });
        assert_eq!(page, MAX_PAGE);
        // The skip the list handler computes from these values must not wrap
        let skip = (page - 1).checked_mul(limit as u64);
        assert!(skip.is_some());
    }

    #[test]
    fn start_of_day_pins_to_utc_midnight() {
        let late = DateTime::parse_from_rfc3339("2024-06-15T23:59:59Z")
            .unwrap()
            .with_timezone(&Utc);
        let boundary = start_of_utc_day(late);
        assert_eq!(boundary.to_rfc3339(), "2024-06-15T00:00:00+00:00");

        let midnight = DateTime::parse_from_rfc3339("2024-06-16T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(start_of_utc_day(midnight), midnight);
    }

    #[test]
    fn today_filter_bounds_created_at_from_midnight() {
        let now = DateTime::parse_from_rfc3339("2024-06-15T18:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let filter = today_filter(now);

        let range = filter.get_document("created_at").unwrap();
        let gte = range.get_datetime("$gte").unwrap();
        assert_eq!(
            *gte,
            BsonDateTime::parse_rfc3339_str("2024-06-15T00:00:00Z").unwrap()
        );
        // Yesterday's record falls outside the bound, today's records are in
        let yesterday = BsonDateTime::parse_rfc3339_str("2024-06-14T23:59:59Z").unwrap();
        assert!(yesterday < *gte);
    }

    #[test]
    fn total_pages_uses_ceiling_division() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }
}
