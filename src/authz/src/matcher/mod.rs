//! Action and resource pattern matching

pub mod action;
pub mod resource;
pub mod segment;

pub use action::ActionMatcher;
pub use resource::{is_valid_resource, ResourceMatcher};
pub use segment::wildcard_to_regex;
