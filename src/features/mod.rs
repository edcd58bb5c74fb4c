pub mod clients;
pub mod dashboard;
pub mod pipeline;
pub mod uploads;
