//! Core retrieval modules

pub mod cloud_mask;
pub mod interpolate;
pub mod inversion;
pub mod retrieval;
pub mod srem;

// Re-export main types
pub use cloud_mask::{is_cloudy, CloudScreenParams, EdgePolicy};
pub use interpolate::{lerp, DomainPolicy, LutInterpolator};
pub use inversion::{forward_toa, invert_aot, is_strictly_monotonic, model_curve};
pub use retrieval::{RetrievalCounts, RetrievalOutput, RetrievalParams, RetrievalProcessor};
pub use srem::Srem;
