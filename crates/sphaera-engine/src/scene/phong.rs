use glam::Vec3;

/// Material and light constants for the Phong shader.
///
/// Field order mirrors the shader's uniform interface; see
/// [`crate::shader::UniformLayout::phong`] for the uniform names.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PhongParams {
    /// Ambient reflectance (`ka`).
    pub ambient: Vec3,
    /// Diffuse reflectance (`kd`).
    pub diffuse: Vec3,
    /// Specular reflectance (`ks`).
    pub specular: Vec3,
    /// Specular exponent (`p`), positive.
    pub shininess: f32,
    /// Ambient light intensity (`Ia`).
    pub ambient_intensity: f32,
    pub light_pos: Vec3,
    pub light_color: Vec3,
    /// Eye position in world space (`viewPos`).
    pub view_pos: Vec3,
}

impl Default for PhongParams {
    /// Green plastic lit by a white point light up and to the left.
    fn default() -> Self {
        Self {
            ambient: Vec3::new(0.0, 1.0, 0.0),
            diffuse: Vec3::new(0.0, 0.5, 0.0),
            specular: Vec3::splat(0.5),
            shininess: 32.0,
            ambient_intensity: 0.2,
            light_pos: Vec3::new(-4.0, 4.0, -3.0),
            light_color: Vec3::ONE,
            view_pos: Vec3::ZERO,
        }
    }
}
