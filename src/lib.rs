pub mod aggregate;
pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod fetch;
pub mod pipeline;
pub mod recommend;
pub mod telemetry;
