mod file_record_service;
mod intake_service;

pub use file_record_service::FileRecordService;
pub use intake_service::IntakeService;
