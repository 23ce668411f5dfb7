pub mod list;
pub mod settings;
pub mod snapshot;
pub mod ward;
