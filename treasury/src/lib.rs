//! Unity Treasury Module
//!
//! Tracks the reserve pool of VET, VTHO and B3TR backing minted UNITY.
//! Reserves grow on every mint (deposit) and shrink on every burn
//! (release). Each change is a new immutable snapshot.

pub mod error;
pub mod reserve;

pub use error::{ReserveError, Result};
pub use reserve::{ReserveLedger, ReserveRelease};
