use actix_web::{HttpResponse, web};
use mongodb::bson::doc;

use crate::db::mongodb::VISITS_COLLECTION;
use crate::models::visit::VisitRecord;
use crate::state::app_state::AppState;

const SERVICE_NAME: &str = "sitepulse";

fn health_payload(database_ok: bool, visit_store_ok: bool) -> serde_json::Value {
    serde_json::json!({
        "success": database_ok && visit_store_ok,
        "service": SERVICE_NAME,
        "database": database_ok,
        "visitStore": visit_store_ok,
    })
}

/// Report whether the database answers and the visit collection is
/// reachable, so a dead retention store shows up even when the server
/// itself is connected.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database_ok = state.db.run_command(doc! { "ping": 1 }).await.is_ok();

    let visit_store_ok = if database_ok {
        state
            .db
            .collection::<VisitRecord>(VISITS_COLLECTION)
            .estimated_document_count()
            .await
            .is_ok()
    } else {
        false
    };

    let payload = health_payload(database_ok, visit_store_ok);
    if database_ok && visit_store_ok {
        HttpResponse::Ok().json(payload)
    } else {
        HttpResponse::InternalServerError().json(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_reports_degraded_components() {
        let healthy = health_payload(true, true);
        assert_eq!(healthy["success"], true);
        assert_eq!(healthy["service"], SERVICE_NAME);

        let store_down = health_payload(true, false);
        assert_eq!(store_down["success"], false);
        assert_eq!(store_down["database"], true);
        assert_eq!(store_down["visitStore"], false);

        let db_down = health_payload(false, false);
        assert_eq!(db_down["success"], false);
    }
}
