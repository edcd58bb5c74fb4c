mod dashboard_dto;

pub use dashboard_dto::{DashboardQuery, DashboardSummaryDto, DashboardUploadDto, StatusCountDto};
