/// Drawable region of the window in physical pixels.
///
/// Owned by the render loop and replaced on every resize notification. The
/// origin is always the top-left corner of the surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimized window reports a zero-sized drawable; nothing can be presented then.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, or `1.0` for an empty viewport.
    #[inline]
    pub fn aspect(self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(512, 512)
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Viewport {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_of_wide_viewport() {
        assert_eq!(Viewport::new(800, 600).aspect(), 800.0 / 600.0);
    }

    #[test]
    fn empty_viewport_has_unit_aspect() {
        assert!(Viewport::new(0, 600).is_empty());
        assert_eq!(Viewport::new(0, 600).aspect(), 1.0);
    }

    #[test]
    fn default_matches_initial_window() {
        assert_eq!(Viewport::default(), Viewport::new(512, 512));
    }
}
