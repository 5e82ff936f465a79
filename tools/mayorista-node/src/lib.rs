pub mod file_store;
pub mod settings;

pub use file_store::JsonFileStore;
