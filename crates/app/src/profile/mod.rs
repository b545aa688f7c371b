//! User profile.

pub mod service;

pub use service::{ProfileError, ProfileService};
