//! Access control subsystem.
//!
//! # Data Flow
//! ```text
//! request headers
//!     → gate.rs (session token or challenge answer?)
//!     → verifier.rs (backend check: local secret / remote siteverify)
//!     → AccessDecision { allowed, issued_token }
//!     → pipeline (deny before any upstream I/O; attach token last)
//! ```

pub mod gate;
pub mod verifier;

pub use gate::{attach_token_header, AccessDecision, AccessGate};
