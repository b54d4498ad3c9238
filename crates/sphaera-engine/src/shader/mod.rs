//! Shader program service.
//!
//! Compiles a vertex + fragment WGSL pair into a render pipeline and exposes
//! the program's uniform interface by name. Uniform locations are byte offsets
//! into a single uniform block bound at `@group(0) @binding(0)`, read from the
//! WGSL source of the loaded stages.

mod program;
mod reflect;
mod sources;
mod uniforms;

pub use program::{ProgramTarget, ShaderProgram};
pub use reflect::{merge_layouts, reflect_uniforms};
pub use sources::ShaderSources;
pub use uniforms::{UniformBlock, UniformKind, UniformLayout, UniformLocation, UniformValue};

/// What to do when a stage fails to compile or the program fails to link.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ShaderFailurePolicy {
    /// Log the diagnostics and keep running; frames show only the clear color.
    #[default]
    Continue,
    /// Treat the failure as fatal at startup.
    Abort,
}

/// Uniform lookup by name.
///
/// A name the program does not declare yields `None`; callers drop values for
/// such names instead of failing.
pub trait UniformInterface {
    fn uniform_location(&self, name: &str) -> Option<UniformLocation>;
}
