pub mod auth_handlers;
pub mod health_handlers;
pub mod visit_handlers;
