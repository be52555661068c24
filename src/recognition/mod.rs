//! Segment recognition - maps audio windows to song identities.
//!
//! # Architecture
//!
//! Same layering as any external API integration here:
//! - **Domain models** (`domain.rs`) - [`RecognitionOutcome`] and [`RecognitionError`]
//! - **API DTOs** (`acrcloud/dto.rs`) - exact response shapes
//! - **Adapter** (`acrcloud/adapter.rs`) - DTO -> domain conversion
//! - **Client** (`acrcloud/client.rs`) - signed multipart HTTP requests
//! - **Traits** (`traits.rs`) - the [`Recognizer`] seam the pipeline depends on
//!
//! A failed request never escapes as an error: it becomes
//! [`RecognitionOutcome::Failed`] for that one segment.

pub mod acrcloud;
pub mod domain;
pub mod traits;

pub use acrcloud::{AcrCloudClient, AcrCloudConfig};
pub use domain::{RecognitionError, RecognitionOutcome};
pub use traits::Recognizer;
