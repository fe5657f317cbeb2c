use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{HttpRequest, HttpResponse, Responder, Result, error, http, web};
use chrono::Utc;
use futures_util::StreamExt;
use mongodb::bson::doc;
use validator::Validate;

use crate::db::mongodb::VISITS_COLLECTION;
use crate::models::visit::VisitRecord;
use crate::state::app_state::AppState;
use crate::structs::visit::{
    CleanupConfigResponse, DeleteVisitsRequest, DeletedCountResponse, RecordVisitRequest,
    VisitListMeta, VisitListResponse, VisitQueryParams, VisitResponse, VisitStatsResponse,
};
use crate::utils::dedupe::{self, LAST_VISIT_COOKIE, VISIT_SESSION_COOKIE};
use crate::utils::visit_query::{
    build_filter, build_sort, resolve_pagination, today_filter, total_pages,
};

fn secure_cookies() -> bool {
    std::env::var("APP_ENV")
        .map(|env| env == "production")
        .unwrap_or(false)
}

/// Record a page view, unless the client's dedupe cookie shows a visit was
/// already accepted today (and not invalidated by a later cleanup).
pub async fn record_visit(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<RecordVisitRequest>>,
) -> Result<impl Responder> {
    let body = body.map(|b| b.into_inner()).unwrap_or_default();
    let now = Utc::now();

    let cleanup_epoch = app_state
        .settings
        .last_log_cleanup()
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let session_cookie = req.cookie(VISIT_SESSION_COOKIE);
    if dedupe::should_skip(
        session_cookie.as_ref().map(|c| c.value()),
        cleanup_epoch,
        now,
    ) {
        // Already counted today, leave the cookie untouched
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "data": null })));
    }

    // Get visitor's IP address, honoring forwarded-for headers
    let ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();

    // Client-declared user agent takes precedence over the header
    let user_agent = body.user_agent.filter(|ua| !ua.is_empty()).or_else(|| {
        req.headers()
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    });

    // Best effort: an unresolvable address just leaves location empty
    let location = app_state.geo.lookup(&ip);

    let db = &app_state.db;
    let visits_collection = db.collection::<VisitRecord>(VISITS_COLLECTION);

    let mut visit = VisitRecord::new(ip, user_agent, body.page, location);
    let insert_result = visits_collection
        .insert_one(&visit)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;
    visit.id = insert_result.inserted_id.as_object_id();

    let session_cookie = Cookie::build(VISIT_SESSION_COOKIE, now.to_rfc3339())
        .path("/")
        .http_only(true)
        .secure(secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(24))
        .finish();

    // Diagnostic echo of what was just written; never read back
    let echo_cookie = Cookie::build(
        LAST_VISIT_COOKIE,
        format!("{}@{}", visit.page, visit.created_at.to_rfc3339()),
    )
    .path("/")
    .secure(secure_cookies())
    .max_age(CookieDuration::hours(24))
    .finish();

    Ok(HttpResponse::Created()
        .cookie(session_cookie)
        .cookie(echo_cookie)
        .json(serde_json::json!({ "data": VisitResponse::from(visit) })))
}

/// Public read of the cleanup epoch, used by clients to decide whether to
/// trust a locally cached dedupe signal. The server-side check stays
/// authoritative.
pub async fn get_cleanup_config(app_state: web::Data<AppState>) -> Result<impl Responder> {
    let last_log_cleanup = app_state
        .settings
        .last_log_cleanup_raw()
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    Ok(HttpResponse::Ok().json(CleanupConfigResponse { last_log_cleanup }))
}

pub async fn get_visit_stats(app_state: web::Data<AppState>) -> Result<impl Responder> {
    let db = &app_state.db;
    let visits_collection = db.collection::<VisitRecord>(VISITS_COLLECTION);

    let total_visits = visits_collection
        .count_documents(doc! {})
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let unique_ips = visits_collection
        .distinct("ip", today_filter(Utc::now()))
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    Ok(HttpResponse::Ok().json(VisitStatsResponse {
        total_visits,
        unique_visitors_today: unique_ips.len() as u64,
    }))
}

pub async fn list_visits(
    app_state: web::Data<AppState>,
    query: web::Query<VisitQueryParams>,
) -> Result<impl Responder> {
    let db = &app_state.db;
    let visits_collection = db.collection::<VisitRecord>(VISITS_COLLECTION);

    let filter = build_filter(&query);
    let sort = build_sort(&query);
    let (page, limit) = resolve_pagination(&query);

    let total = visits_collection
        .count_documents(filter.clone())
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let mut cursor = visits_collection
        .find(filter)
        .sort(sort)
        .skip((page - 1) * limit as u64)
        .limit(limit)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let mut visits = Vec::new();
    while let Some(result) = cursor.next().await {
        if let Ok(visit) = result {
            visits.push(VisitResponse::from(visit));
        }
    }

    Ok(HttpResponse::Ok().json(VisitListResponse {
        visits,
        meta: VisitListMeta {
            total,
            page,
            limit,
            total_pages: total_pages(total, limit),
        },
    }))
}

pub async fn delete_visits(
    app_state: web::Data<AppState>,
    web::Json(req): web::Json<DeleteVisitsRequest>,
) -> Result<impl Responder> {
    if let Err(errors) = req.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }

    let ids = match req.object_ids() {
        Ok(ids) => ids,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": message
            })));
        }
    };

    let db = &app_state.db;
    let visits_collection = db.collection::<VisitRecord>(VISITS_COLLECTION);

    let result = visits_collection
        .delete_many(doc! { "_id": { "$in": ids } })
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    Ok(HttpResponse::Ok().json(DeletedCountResponse {
        deleted_count: result.deleted_count,
    }))
}

/// Wipe every visit record and bump the cleanup epoch so dedupe cookies
/// issued before the wipe stop suppressing writes.
pub async fn cleanup_visits(app_state: web::Data<AppState>) -> Result<impl Responder> {
    let db = &app_state.db;
    let visits_collection = db.collection::<VisitRecord>(VISITS_COLLECTION);

    let result = visits_collection
        .delete_many(doc! {})
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    app_state
        .settings
        .set_last_log_cleanup(Utc::now())
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    log::info!(
        "Visit log cleanup: {} records deleted, cleanup epoch updated",
        result.deleted_count
    );

    Ok(HttpResponse::Ok().json(DeletedCountResponse {
        deleted_count: result.deleted_count,
    }))
}
