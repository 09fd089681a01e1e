//! Access to the GitHub releases API.
//!
//! The [`traits::Forge`] capability covers everything a run needs from the
//! remote: looking releases up, creating and updating them, and managing
//! their assets. [`throttle::ThrottledForge`] wraps any implementation with
//! the rate-limit and abuse-limit policy.

/// Connection settings for the remote API.
pub mod config;

/// GitHub REST implementation of the forge capability.
pub mod github;

/// Release records and request payloads shared by all forges.
pub mod request;

/// Rate-limit and abuse-limit policy applied around every call.
pub mod throttle;

/// The forge capability trait.
pub mod traits;
