pub mod keypoint;
pub mod source;

pub use keypoint::{Keypoint, Landmark, Skeleton};
pub use source::{Detection, JsonLinesSource, KeypointSource, MemorySource};
