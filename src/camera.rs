use glam::{Mat4, Vec3};

/// Per-frame camera snapshot handed to the map renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub view_proj: Mat4,
}

pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, aspect: f32) -> Self {
        Camera {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov: 70.0,
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn look_direction(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    /// Points the camera at `target`.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = (target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.yaw = dir.z.atan2(dir.x);
        self.pitch = dir.y.clamp(-1.0, 1.0).asin();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.look_direction(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn state(&self) -> CameraState {
        CameraState {
            position: self.position,
            view_proj: self.view_proj(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frustum::FrustumCulling;

    #[test]
    fn look_at_faces_the_target() {
        let mut camera = Camera::new(Vec3::new(0.0, 10.0, 0.0), 16.0 / 9.0);
        let target = Vec3::new(20.0, 0.0, -35.0);
        camera.look_at(target);
        let expected = (target - camera.position).normalize();
        assert!(camera.look_direction().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn view_proj_keeps_what_is_in_front() {
        let mut camera = Camera::new(Vec3::new(8.0, 8.0, 8.0), 1.0);
        camera.look_at(Vec3::new(8.0, 8.0, 100.0));
        let frustum = FrustumCulling::new(&camera.view_proj());
        assert!(frustum.sphere_visible(8.0, 8.0, 60.0, 1.0));
        assert!(!frustum.sphere_visible(8.0, 8.0, -60.0, 1.0));
    }
}
