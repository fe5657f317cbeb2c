pub mod mongodb;
pub mod settings;
