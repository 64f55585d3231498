//! URL handling module for feed-sweep
//!
//! This module builds profile URLs from usernames and resolves the image
//! sources found inside feed items.

mod image;
mod profile;

// Re-export main functions
pub use image::{image_extension, resolve_image_url};
pub use profile::{normalize_username, profile_url};
