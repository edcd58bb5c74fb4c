mod notifier;
mod router_service;
mod staging_loader;
mod validation_service;

pub use notifier::Notifier;
pub use router_service::RouterService;
pub use staging_loader::StagingLoader;
pub use validation_service::ValidationService;
