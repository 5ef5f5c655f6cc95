use glam::{Mat4, Vec3, Vec4};

/// Five clip planes (right, left, bottom, top, far) pulled out of a
/// view-projection matrix. Near is left out: at chunk scale it never
/// rejects anything the other planes keep.
#[derive(Clone, Copy, Debug)]
pub struct FrustumCulling {
    planes: [Vec4; 5],
}

impl FrustumCulling {
    pub fn new(view_proj: &Mat4) -> Self {
        let mut frustum = FrustumCulling {
            planes: [Vec4::ZERO; 5],
        };
        frustum.set_frustum(view_proj);
        frustum
    }

    pub fn set_frustum(&mut self, view_proj: &Mat4) {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);

        self.planes = [
            // Right
            r3 - r0,
            // Left
            r3 + r0,
            // Bottom
            r3 + r1,
            // Top
            r3 - r1,
            // Far
            r3 - r2,
        ];

        // Normalize planes so that distances are in world units
        for plane in &mut self.planes {
            let length = plane.truncate().length();
            if length > 0.0 {
                *plane /= length;
            }
        }
    }

    pub fn planes(&self) -> &[Vec4; 5] {
        &self.planes
    }

    pub fn sphere_visible(&self, x: f32, y: f32, z: f32, radius: f32) -> bool {
        let center = Vec3::new(x, y, z);
        for plane in &self.planes {
            if plane.truncate().dot(center) + plane.w <= -radius {
                return false;
            }
        }
        true
    }
}

impl Default for FrustumCulling {
    /// Accepts everything until a real matrix is set.
    fn default() -> Self {
        FrustumCulling {
            planes: [Vec4::new(0.0, 0.0, 0.0, f32::MAX); 5],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_frustum() -> FrustumCulling {
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let proj = Mat4::perspective_rh(70f32.to_radians(), 16.0 / 9.0, 0.1, 500.0);
        FrustumCulling::new(&(proj * view))
    }

    #[test]
    fn sphere_inside_all_planes_is_visible() {
        let frustum = camera_frustum();
        assert!(frustum.sphere_visible(0.0, 0.0, -50.0, 13.86));
        assert!(frustum.sphere_visible(0.0, 0.0, -499.0, 1.0));
    }

    #[test]
    fn sphere_pushed_past_any_plane_is_rejected() {
        let frustum = camera_frustum();
        let inside = Vec3::new(0.0, 0.0, -50.0);
        let radius = 2.0;
        for plane in frustum.planes() {
            let normal = plane.truncate();
            let dist = normal.dot(inside) + plane.w;
            // move along the inward normal's opposite until fully outside
            let moved = inside - normal * (dist + radius + 1.0);
            assert!(!frustum.sphere_visible(moved.x, moved.y, moved.z, radius));
        }
    }

    #[test]
    fn behind_the_camera_is_rejected() {
        let frustum = camera_frustum();
        assert!(!frustum.sphere_visible(0.0, 0.0, 100.0, 13.86));
    }

    #[test]
    fn default_frustum_accepts_everything() {
        let frustum = FrustumCulling::default();
        assert!(frustum.sphere_visible(1e6, -1e6, 1e6, 0.0));
    }
}
