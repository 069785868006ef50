use crate::config::CameraConfig;
use glam::{Mat4, Vec2, Vec3, Vec4};
use winit::dpi::PhysicalSize;

const DEFAULT_UP: Vec3 = Vec3::Y;

/// Perspective camera looking into the room. Depth maps to 0..1 as wgpu expects.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn from_config(cfg: &CameraConfig) -> Self {
        Self::new(
            Vec3::from_array(cfg.position),
            Vec3::from_array(cfg.target),
            cfg.fov_degrees.to_radians(),
            cfg.near,
            cfg.far,
        )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self, viewport: PhysicalSize<u32>) -> Mat4 {
        self.projection_matrix(aspect_of(viewport)) * self.view_matrix()
    }

    /// World-space ray from the camera through a pixel position (origin top-left).
    pub fn screen_ray(&self, screen: Vec2, viewport: PhysicalSize<u32>) -> Option<(Vec3, Vec3)> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let ndc_x = (2.0 * screen.x / viewport.width as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.height as f32);
        let inv_view_proj = self.view_projection(viewport).inverse();
        let far = inv_view_proj * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        if far.w.abs() < f32::EPSILON {
            return None;
        }
        let dir = (far.truncate() / far.w - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        Some((self.position, dir))
    }

    pub fn project_point(&self, point: Vec3, viewport: PhysicalSize<u32>) -> Option<Vec2> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let clip = self.view_projection(viewport) * point.extend(1.0);
        if clip.w.abs() < f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = (ndc.x + 1.0) * 0.5 * viewport.width as f32;
        let y = (1.0 - ndc.y) * 0.5 * viewport.height as f32;
        Some(Vec2::new(x, y))
    }
}

fn aspect_of(viewport: PhysicalSize<u32>) -> f32 {
    if viewport.height > 0 {
        viewport.width as f32 / viewport.height as f32
    } else {
        1.0
    }
}

/// Fixed orthographic camera for the full-screen sky quad: the 2x2 plane at z=0 fills the viewport.
pub fn sky_camera_projection() -> Mat4 {
    Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_projection_is_finite() {
        let camera = Camera3D::new(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO, 60.0_f32.to_radians(), 0.1, 100.0);
        let vp = camera.view_projection(PhysicalSize::new(1280, 720));
        assert!(!vp.to_cols_array().iter().any(|v| v.is_nan() || v.is_infinite()));
    }

    #[test]
    fn center_ray_points_at_target() {
        let camera = Camera3D::new(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO, 1.0, 0.1, 50.0);
        let (origin, dir) = camera.screen_ray(Vec2::new(200.0, 150.0), PhysicalSize::new(400, 300)).unwrap();
        assert_eq!(origin, camera.position);
        assert!(dir.dot(Vec3::NEG_Z) > 0.9999);
    }

    #[test]
    fn projected_point_round_trips_through_ray() {
        let camera = Camera3D::new(Vec3::new(1.0, 2.0, 6.0), Vec3::ZERO, 0.9, 0.1, 50.0);
        let viewport = PhysicalSize::new(640, 480);
        let point = Vec3::new(0.4, -0.3, 0.2);
        let screen = camera.project_point(point, viewport).unwrap();
        let (origin, dir) = camera.screen_ray(screen, viewport).unwrap();
        let expected = (point - origin).normalize();
        assert!(dir.dot(expected) > 0.9999);
    }

    #[test]
    fn sky_camera_maps_unit_plane_to_ndc() {
        let proj = sky_camera_projection();
        let corner = proj * Vec4::new(1.0, -1.0, 0.0, 1.0);
        assert!((corner.x - 1.0).abs() < 1e-6);
        assert!((corner.y + 1.0).abs() < 1e-6);
    }
}
