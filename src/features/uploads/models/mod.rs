mod file_record;
mod staged_row;

pub use file_record::{FileRecord, FileStatus};
pub use staged_row::StagedRow;
