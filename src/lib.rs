pub mod cli;
pub mod codeclimate;
pub mod config;
pub mod diff;
pub mod error;
pub mod github;
mod http;
pub mod model;
pub mod reconcile;
pub mod report;
