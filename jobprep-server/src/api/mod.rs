//! HTTP API handlers for jobprep-server

pub mod callbacks;
pub mod extract;
pub mod health;
pub mod job_reports;
pub mod uploads;

pub use callbacks::callback_routes;
pub use extract::ApiJson;
pub use health::health_routes;
pub use job_reports::job_report_routes;
pub use uploads::upload_routes;
