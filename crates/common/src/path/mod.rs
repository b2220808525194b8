// Storage path helpers.

pub mod normalize;

pub use normalize::{normalize_segment, PathError};
