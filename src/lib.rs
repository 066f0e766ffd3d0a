//! Attest Document Intake Service
//!
//! Validates coach verification documents (images and PDFs) by size, extension,
//! MIME type and content signature, then stores accepted batches on local disk
//! or Dropbox.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
