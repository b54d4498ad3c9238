//! Frame loop state machine.

mod render_loop;

pub use render_loop::{LoopEvent, LoopState, RenderLoop, FRAME_UNIFORMS};
