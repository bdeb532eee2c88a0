//! Pingpong Client Workspace
//!
//! Umbrella crate re-exporting the workspace members behind feature flags.
//! Hosts depend on `pingpong-client` with the `native` feature for the full
//! stack, or `headless` to supply their own bridge implementations.

#[cfg(any(feature = "native", feature = "headless"))]
pub use core_auth as auth;

#[cfg(any(feature = "native", feature = "headless"))]
pub use core_runtime as runtime;

#[cfg(feature = "native")]
pub use bridge_native as native;
