// src/lib.rs
// Library interface for check-service-certs
pub mod cert_reader;
pub mod check;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod expiry;
pub mod logging;
pub mod notify;
pub mod pipeline;
pub mod service;
pub mod stats;
pub mod template;
pub mod types;
