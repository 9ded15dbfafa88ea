pub mod client;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod report;

pub use client::{OrgClient, RequestContext};
pub use error::{AppError, Result};
