pub mod events;
pub mod format;
pub mod report;
pub mod services;
pub mod workers;
