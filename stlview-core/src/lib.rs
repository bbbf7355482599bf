/// stlview Core Library - mesh loading and the live render list
///
/// This library provides the binary STL loader, the swappable render list
/// consumed by the redraw loop, and the rotation and camera math.

pub mod geometry;
pub mod projection;
pub mod render_list;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use geometry::{Bounds, MeshBatch, Triangle, Vertex};
pub use projection::Camera;
pub use render_list::{DrawPass, RenderList, RenderState};
pub use stl::{load_stl, FormatError, LoadError};
pub use transform::{RotationState, Transform};
