mod requests_logging;
mod slowdown;

#[cfg(feature = "slowdown")]
pub use slowdown::slowdown_request;
pub use requests_logging::{log_requests, RequestsLoggingLevel};
