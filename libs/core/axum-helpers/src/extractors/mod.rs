//! Custom extractors for Axum handlers.
//!
//! Rejections from these extractors go through [`AppError`](crate::AppError),
//! so clients always receive the standard error envelope.

pub mod id_path;
pub mod validated_json;

pub use id_path::IdPath;
pub use validated_json::ValidatedJson;
