//! GPU mesh resources and frame submission.
//!
//! The render loop records each frame as a [`Frame`] command list and hands it
//! to a [`RenderBackend`]. [`WgpuBackend`] replays frames with wgpu; tests use
//! a recording backend instead.

mod backend;
mod frame;
mod gpu_mesh;
mod wgpu_backend;

pub use backend::{MeshResource, PresentOutcome, RenderBackend};
pub use frame::{Command, Frame};
pub use gpu_mesh::{GpuMesh, MeshLayout};
pub use wgpu_backend::WgpuBackend;
