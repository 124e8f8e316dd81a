pub mod banding;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod host;
pub mod metrics;
pub mod render;
pub mod runtime;
pub mod sampler;
pub mod scheduler;
pub mod snapshot;
pub mod source;
pub mod terminal;
