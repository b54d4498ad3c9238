//! Per-run scene constants: what is drawn, from where, and how it is lit.

mod camera;
mod phong;

pub use camera::{Frustum, Transforms};
pub use phong::PhongParams;

use crate::mesh::SphereParams;
use crate::shader::ShaderFailurePolicy;

/// Everything the render loop needs besides GPU handles.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub sphere: SphereParams,
    pub camera: Transforms,
    pub material: PhongParams,
    pub clear_color: wgpu::Color,
    pub shader_failure: ShaderFailurePolicy,
    /// Recompute the projection aspect on every resize.
    ///
    /// Off by default: the projection stays square and a non-square window
    /// stretches the image.
    pub projection_follows_viewport: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            sphere: SphereParams::default(),
            camera: Transforms::default(),
            material: PhongParams::default(),
            clear_color: wgpu::Color::BLACK,
            shader_failure: ShaderFailurePolicy::default(),
            projection_follows_viewport: false,
        }
    }
}
