//! Plain data types shared by every backend: definitions used to create objects, enums that
//! describe GPU state, and the vertex layout.

mod definitions;
pub use definitions::*;

mod format;
pub use format::*;

mod misc;
pub use misc::*;

mod vertex_layout;
pub use vertex_layout::*;
