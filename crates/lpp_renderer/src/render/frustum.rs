//! Frustum corner solver
//!
//! The GBuffer only stores linear depth. A quad shader recovers the
//! view-space position of a pixel by interpolating the view-space far-plane
//! corners across the quad and scaling the interpolated ray by
//! `depth / far`. This module computes those corners for the full screen and
//! for arbitrary NDC sub-rectangles.
//!
//! Corner order for the 8-corner sets is near TL, TR, BR, BL followed by far
//! TL, TR, BR, BL. The 4 far corners used by quads are TL, TR, BL, BR.

use crate::foundation::math::{Vec2, Vec3};
use crate::render::primitives::Camera;

/// Camera frustum corners for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrustumCorners {
    /// World-space corners
    pub world: [Vec3; 8],
    /// View-space corners
    pub view: [Vec3; 8],
    /// View-space far corners in quad order: TL, TR, BL, BR
    pub far: [Vec3; 4],
}

impl FrustumCorners {
    /// Compute the corner sets for a camera
    pub fn compute(camera: &Camera) -> Self {
        let near = Self::world_plane(camera, camera.near);
        let far = Self::world_plane(camera, camera.far);
        let mut world = [Vec3::zeros(); 8];
        world[..4].copy_from_slice(&near);
        world[4..].copy_from_slice(&far);

        let view_matrix = camera.get_view_matrix();
        let view = world.map(|corner| view_matrix.transform_point(&corner.into()).coords);

        // Far corners come out as TL, TR, BR, BL; quads expect TL, TR, BL, BR
        let mut far_quad = [view[4], view[5], view[6], view[7]];
        far_quad.swap(2, 3);

        Self {
            world,
            view,
            far: far_quad,
        }
    }

    /// World-space corners of the view-volume cross-section at `distance`
    /// along the camera's forward axis (TL, TR, BR, BL)
    pub fn world_plane(camera: &Camera, distance: f32) -> [Vec3; 4] {
        let basis = camera.basis();
        let half_h = (camera.fov * 0.5).tan() * distance;
        let half_w = half_h * camera.aspect;
        let center = camera.position + basis.forward * distance;
        [
            center + basis.up * half_h - basis.right * half_w,
            center + basis.up * half_h + basis.right * half_w,
            center - basis.up * half_h + basis.right * half_w,
            center - basis.up * half_h - basis.right * half_w,
        ]
    }

    /// Far corners mapped onto the NDC rectangle `[min, max]` (+Y up)
    ///
    /// Each output corner is the bilinear interpolation of the full far quad
    /// at that NDC position, so the full-screen rectangle reproduces
    /// [`FrustumCorners::far`] exactly. Output order is TL, TR, BL, BR.
    pub fn far_corners_for_rect(&self, min: Vec2, max: Vec2) -> [Vec3; 4] {
        let [top_left, top_right, bottom_left, _] = self.far;
        let dx = top_right.x - top_left.x;
        let dy = top_left.y - bottom_left.y;

        let at = |ndc_x: f32, ndc_y: f32| {
            Vec3::new(
                bottom_left.x + dx * (ndc_x * 0.5 + 0.5),
                bottom_left.y + dy * (ndc_y * 0.5 + 0.5),
                bottom_left.z,
            )
        };

        [at(min.x, max.y), at(max.x, max.y), at(min.x, min.y), at(max.x, min.y)]
    }

    /// Columns of the far quad as four homogeneous rows for constant upload
    pub fn as_rows(corners: &[Vec3; 4]) -> [[f32; 4]; 4] {
        corners.map(|c| [c.x, c.y, c.z, 0.0])
    }
}

/// NDC rectangle (+Y up) covering a world-space sphere
///
/// Returns the full screen `[-1, 1]` when any part of the sphere's bounding
/// box reaches the near plane, since its projection is then unbounded.
/// Otherwise the projected bounding box, clamped to the screen.
pub fn sphere_screen_bounds(camera: &Camera, center: &Vec3, radius: f32) -> (Vec2, Vec2) {
    let full = (Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
    let view_center = camera.get_view_matrix().transform_point(&(*center).into()).coords;

    let mut min = Vec2::new(f32::MAX, f32::MAX);
    let mut max = Vec2::new(f32::MIN, f32::MIN);
    for corner in 0..8 {
        let offset = Vec3::new(
            if corner & 1 == 0 { -radius } else { radius },
            if corner & 2 == 0 { -radius } else { radius },
            if corner & 4 == 0 { -radius } else { radius },
        );
        match camera.project_view_point(&(view_center + offset)) {
            Some(ndc) => {
                min = min.inf(&ndc);
                max = max.sup(&ndc);
            }
            None => return full,
        }
    }

    let clamp = |v: Vec2| Vec2::new(v.x.clamp(-1.0, 1.0), v.y.clamp(-1.0, 1.0));
    (clamp(min), clamp(max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        let mut camera = Camera::perspective(Vec3::new(4.0, 3.0, 12.0), 60.0, 16.0 / 9.0, 0.5, 200.0);
        camera.look_at(Vec3::new(0.0, 1.0, 0.0), Vec3::y());
        camera
    }

    #[test]
    fn test_far_corners_lie_on_far_plane() {
        let corners = FrustumCorners::compute(&camera());
        for corner in &corners.far {
            assert_relative_eq!(corner.z, -200.0, epsilon = 1e-2);
        }
        for corner in &corners.view[..4] {
            assert_relative_eq!(corner.z, -0.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_far_quad_order_is_tl_tr_bl_br() {
        let corners = FrustumCorners::compute(&camera());
        let [tl, tr, bl, br] = corners.far;
        assert!(tl.x < tr.x && bl.x < br.x);
        assert!(tl.y > bl.y && tr.y > br.y);
        assert_relative_eq!(corners.far[2], corners.view[7], epsilon = 1e-4);
        assert_relative_eq!(corners.far[3], corners.view[6], epsilon = 1e-4);
    }

    #[test]
    fn test_far_corner_extent_matches_fov() {
        let cam = camera();
        let corners = FrustumCorners::compute(&cam);
        let half_h = (cam.fov * 0.5).tan() * cam.far;
        assert_relative_eq!(corners.far[0].y, half_h, epsilon = 1e-2);
        assert_relative_eq!(corners.far[0].x, -half_h * cam.aspect, epsilon = 1e-2);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let cam = camera();
        assert_eq!(FrustumCorners::compute(&cam), FrustumCorners::compute(&cam));
    }

    #[test]
    fn test_full_rect_reproduces_far_corners() {
        let corners = FrustumCorners::compute(&camera());
        let rect = corners.far_corners_for_rect(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
        for (a, b) in rect.iter().zip(corners.far.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_sub_rect_is_interpolated() {
        let corners = FrustumCorners::compute(&camera());
        let rect = corners.far_corners_for_rect(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        // Bottom-left of the upper-right quadrant is the far plane center
        assert_relative_eq!(rect[2].x, 0.0, epsilon = 1e-2);
        assert_relative_eq!(rect[2].y, 0.0, epsilon = 1e-2);
        assert_relative_eq!(rect[1], corners.far[1], epsilon = 1e-3);
    }

    #[test]
    fn test_sphere_bounds_centered_light() {
        let mut cam = Camera::perspective(Vec3::new(0.0, 0.0, 20.0), 90.0, 1.0, 1.0, 100.0);
        cam.look_at(Vec3::zeros(), Vec3::y());
        let (min, max) = sphere_screen_bounds(&cam, &Vec3::zeros(), 1.0);
        assert!(min.x < 0.0 && min.y < 0.0 && max.x > 0.0 && max.y > 0.0);
        assert!(max.x < 0.2 && max.y < 0.2);
        assert_relative_eq!(min.x, -max.x, epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_bounds_full_screen_when_touching_near_plane() {
        let mut cam = Camera::perspective(Vec3::new(0.0, 0.0, 20.0), 90.0, 1.0, 1.0, 100.0);
        cam.look_at(Vec3::zeros(), Vec3::y());
        let (min, max) = sphere_screen_bounds(&cam, &Vec3::new(0.0, 0.0, 19.0), 2.0);
        assert_eq!(min, Vec2::new(-1.0, -1.0));
        assert_eq!(max, Vec2::new(1.0, 1.0));
    }
}
