//! Unity API
//!
//! Transport-independent operations over the UNITY price oracle, reserve
//! ledger and token ledger, with request/response models and error codes
//! for a route layer to expose.

mod error;
pub mod models;
pub mod services;
mod state;

pub use error::{ApiError, ApiResult};
pub use services::UnityService;
pub use state::ApiState;
