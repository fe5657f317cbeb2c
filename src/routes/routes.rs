use actix_web::web;

use crate::handlers::auth_handlers::{create_admin, login};
use crate::handlers::health_handlers::health_check;
use crate::handlers::visit_handlers::{
    cleanup_visits, delete_visits, get_cleanup_config, get_visit_stats, list_visits, record_visit,
};
use crate::middlewares::authmw::JwtAuth;

/// Configure the routes
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // Authentication routes - no auth required
    cfg.service(
        web::scope("/api/auth")
            .route("/login", web::post().to(login))
            .route("/init", web::post().to(create_admin)),
    );
    // API routes - JwtAuth lets the public visit endpoints through
    cfg.service(
        web::scope("/api")
            .wrap(JwtAuth)
            .service(
                web::scope("/v1/visits")
                    .route("", web::post().to(record_visit))
                    .route("", web::get().to(list_visits))
                    .route("", web::delete().to(delete_visits))
                    .route("/config", web::get().to(get_cleanup_config))
                    .route("/stats", web::get().to(get_visit_stats))
                    .route("/cleanup", web::post().to(cleanup_visits)),
            )
            .route("/health/check", web::get().to(health_check)),
    );
}
