// Library for tests to access modules

pub mod config;
pub mod coordinator;
pub mod format;
pub mod history;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod settings_repo;
pub mod sinks;
pub mod source;
pub mod sysinfo_repo;
pub mod version;
