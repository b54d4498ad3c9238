use crate::coords::Viewport;
use crate::shader::UniformInterface;

use super::Frame;

/// Result of handing a recorded frame to the backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PresentOutcome {
    /// The frame was drawn and presented.
    Presented,
    /// Nothing was presented this time (transient surface error, minimized window).
    Skipped,
    /// The surface cannot recover; the loop should terminate.
    Fatal,
}

/// A mesh that can be drawn with a single indexed draw call.
pub trait MeshResource {
    fn index_count(&self) -> u32;
}

/// GPU-facing half of the render loop.
///
/// The loop records what to draw into a [`Frame`]; the backend owns the
/// device/surface and turns frames into GPU work. Resource release goes through
/// the backend so that teardown order is observable.
pub trait RenderBackend {
    type Program: UniformInterface;
    type Mesh: MeshResource;

    /// Updates the drawable region used by subsequent frames.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Replays `frame` against `program` and `mesh`, then presents.
    fn present(
        &mut self,
        program: &mut Self::Program,
        mesh: &Self::Mesh,
        frame: &Frame,
    ) -> PresentOutcome;

    fn release_mesh(&mut self, mesh: Self::Mesh);

    fn release_program(&mut self, program: Self::Program);

    /// Releases the surface; called last during teardown.
    fn release_context(&mut self);
}
