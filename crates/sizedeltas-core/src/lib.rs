pub mod action;
pub mod annotation;
pub mod artifact;
pub mod config;
pub mod error;
pub mod event;
pub mod expr;
pub mod github;
pub mod io;
pub mod paths;
pub mod report;
pub mod retry;
pub mod runner;
pub mod table;
pub mod workflow;

pub use error::{Result, SizeDeltasError};
