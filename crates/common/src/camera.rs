use glam::{Mat4, Vec2, Vec3};

/// Screen-space 2D camera: pixel coordinates with the origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub width: f32,
    pub height: f32,
    /// World-space point shown at the top-left corner of the viewport.
    pub offset: Vec2,
}

impl Camera2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
            offset: Vec2::ZERO,
        }
    }

    /// Orthographic projection mapping `0..width` x `0..height` (y down) to clip space.
    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(0.0, self.width, self.height, 0.0, -1.0, 1.0)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * Mat4::from_translation(Vec3::new(-self.offset.x, -self.offset.y, 0.0))
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1) as f32;
        self.height = height.max(1) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_maps_corners_to_clip_space() {
        let cam = Camera2D::new(800, 600);
        let proj = cam.projection();
        let top_left = proj.project_point3(Vec3::new(0.0, 0.0, 0.0));
        let bottom_right = proj.project_point3(Vec3::new(800.0, 600.0, 0.0));
        assert!((top_left.x + 1.0).abs() < 1e-5 && (top_left.y - 1.0).abs() < 1e-5);
        assert!((bottom_right.x - 1.0).abs() < 1e-5 && (bottom_right.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn offset_shifts_view() {
        let mut cam = Camera2D::new(100, 100);
        cam.offset = Vec2::new(50.0, 0.0);
        let p = cam.view_projection().project_point3(Vec3::new(50.0, 0.0, 0.0));
        assert!((p.x + 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_size_is_clamped() {
        let mut cam = Camera2D::new(0, 0);
        assert_eq!((cam.width, cam.height), (1.0, 1.0));
        cam.resize(0, 20);
        assert_eq!((cam.width, cam.height), (1.0, 20.0));
    }
}
