pub mod area;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod input;
pub mod output;
pub mod report;
pub mod scoring;

pub use error::EngineError;
