use glam::{Mat4, Vec3};

use crate::coords::Viewport;

/// Off-axis perspective frustum mapped to a zero-to-one depth range.
///
/// `left`/`right`/`bottom`/`top` are measured on the near plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Frustum {
    fn default() -> Self {
        Self {
            left: -0.1,
            right: 0.1,
            bottom: -0.1,
            top: 0.1,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Frustum {
    /// Right-handed projection matrix, eye looking down -Z.
    pub fn matrix(&self) -> Mat4 {
        let Frustum { left: l, right: r, bottom: b, top: t, near: n, far: f } = *self;
        Mat4::from_cols_array(&[
            2.0 * n / (r - l), 0.0, 0.0, 0.0,
            0.0, 2.0 * n / (t - b), 0.0, 0.0,
            (r + l) / (r - l), (t + b) / (t - b), f / (n - f), -1.0,
            0.0, 0.0, n * f / (n - f), 0.0,
        ])
    }

    /// Keeps the vertical extent and center, widening or narrowing the
    /// horizontal extent so that its width over height equals `aspect`.
    pub fn with_aspect(&self, aspect: f32) -> Self {
        let half_h = (self.top - self.bottom) * 0.5;
        let center_x = (self.left + self.right) * 0.5;
        let half_w = half_h * aspect;
        Self {
            left: center_x - half_w,
            right: center_x + half_w,
            ..*self
        }
    }
}

/// Model, view and projection for the single drawn object.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transforms {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Frustum,
}

impl Default for Transforms {
    /// Sphere pushed 7 units down -Z and doubled in size, seen from the origin.
    fn default() -> Self {
        Self {
            model: Mat4::from_translation(Vec3::new(0.0, 0.0, -7.0))
                * Mat4::from_scale(Vec3::splat(2.0)),
            view: Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y),
            projection: Frustum::default(),
        }
    }
}

impl Transforms {
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Refits the projection to the viewport aspect ratio.
    pub fn fit_projection(&mut self, viewport: Viewport) {
        self.projection = self.projection.with_aspect(viewport.aspect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn symmetric_frustum_matches_ninety_degree_perspective() {
        let ours = Frustum::default().matrix();
        let reference = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 1000.0);
        assert!(ours.abs_diff_eq(reference, 1e-5));
    }

    #[test]
    fn near_and_far_planes_map_to_unit_depth_range() {
        let p = Frustum::default().matrix();
        let near = p * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -1000.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn default_model_places_sphere_in_front_of_camera() {
        let t = Transforms::default();
        let center = (t.view * t.model).transform_point3(Vec3::ZERO);
        assert!(approx(center, Vec3::new(0.0, 0.0, -7.0)));
        let rim = t.model.transform_point3(Vec3::X);
        assert!(approx(rim, Vec3::new(2.0, 0.0, -7.0)));
    }

    #[test]
    fn view_from_origin_is_identity() {
        assert!(Transforms::default().view.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn with_aspect_widens_horizontally() {
        let f = Frustum::default().with_aspect(800.0 / 600.0);
        assert!((f.top - 0.1).abs() < 1e-6);
        assert!(((f.right - f.left) / (f.top - f.bottom) - 800.0 / 600.0).abs() < 1e-5);
    }
}
