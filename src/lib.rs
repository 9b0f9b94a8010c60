mod routes;
mod server;
mod telemetry;

pub mod app;
pub mod article;
pub mod config;
pub mod labels;
pub mod model_service;
pub mod ort_service;
pub mod prediction;
pub mod recommendation;
pub mod report;
pub mod scheme;
pub mod storage;
pub mod store;

pub use app::start_app;
