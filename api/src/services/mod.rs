//! Service layer for business logic
//!
//! Services encapsulate the Unity operations independently of any
//! transport, so the same calls serve an HTTP layer or the CLI.

pub mod unity;

pub use unity::UnityService;
