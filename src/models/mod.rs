pub mod setting;
pub mod user;
pub mod visit;
