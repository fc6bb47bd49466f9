//! # 3D Camera System
//!
//! Camera state consumed by the light pre-pass renderer: view/projection
//! matrices, the near plane used to classify light volumes, and the two
//! projection coefficients the depth reconstruction pass needs.
//!
//! ## Coordinate System
//! Right-handed, Y-up view space with the camera looking down -Z. The Vulkan
//! coordinate transform is applied between view and projection, so linear
//! depth is the positive distance along the camera's forward axis.

use crate::foundation::math::{Mat4, Mat4Ext, Plane, Vec2, Vec3, utils};
use crate::render::{RenderError, RenderResult};

/// 3D perspective camera
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view angle in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

/// Orthonormal camera axes in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    /// Viewing direction
    pub forward: Vec3,
    /// Screen right
    pub right: Vec3,
    /// Screen up
    pub up: Vec3,
}

impl Camera {
    /// Create a new perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Look at a specific point with a custom up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Update camera aspect ratio for viewport changes
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::info!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// Orthonormal camera axes, matching [`Mat4Ext::look_at`]
    pub fn basis(&self) -> CameraBasis {
        let forward = (self.target - self.position).normalize();
        let right = forward.cross(&self.up).normalize();
        let up = right.cross(&forward);
        CameraBasis { forward, right, up }
    }

    /// World-to-view matrix
    pub fn get_view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// View-to-world matrix
    ///
    /// Fails when the camera is degenerate: target on the eye, or up
    /// parallel to the viewing direction.
    pub fn inverse_view_matrix(&self) -> RenderResult<Mat4> {
        self.get_view_matrix()
            .try_inverse()
            .filter(|inverse| inverse.iter().all(|v| v.is_finite()))
            .ok_or_else(|| {
                RenderError::RenderingFailed(format!(
                    "camera view matrix is singular (position {:?}, target {:?}, up {:?})",
                    self.position, self.target, self.up
                ))
            })
    }

    /// Perspective projection (applied after the Vulkan coordinate transform)
    pub fn get_projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined P × X × V matrix
    pub fn get_view_projection_matrix(&self) -> Mat4 {
        self.get_projection_matrix() * Mat4::vulkan_coordinate_transform() * self.get_view_matrix()
    }

    /// Near clipping plane with its normal along the viewing direction
    ///
    /// Points in front of the near plane, inside the view volume, have a
    /// positive signed distance.
    pub fn near_plane(&self) -> Plane {
        let forward = self.basis().forward;
        Plane::from_normal_and_point(forward, self.position + forward * self.near)
    }

    /// Coefficients `(scale, offset)` with `z_ndc = scale + offset / d`
    ///
    /// `d` is linear view depth. These are the third-row entries of the
    /// projection matrix.
    pub fn projection_coefficients(&self) -> (f32, f32) {
        let projection = self.get_projection_matrix();
        (projection[(2, 2)], projection[(2, 3)])
    }

    /// Project a view-space point onto NDC (+Y up)
    ///
    /// Returns `None` for points at or behind the near plane.
    pub fn project_view_point(&self, view_point: &Vec3) -> Option<Vec2> {
        let depth = -view_point.z;
        if depth <= self.near {
            return None;
        }
        let projection = self.get_projection_matrix();
        Some(Vec2::new(
            projection[(0, 0)] * view_point.x / depth,
            projection[(1, 1)] * view_point.y / depth,
        ))
    }
}

impl Default for Camera {
    /// Camera above and behind the origin looking at it, 45° FOV, 16:9
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 3.0, 3.0),
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::FRAC_PI_4,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}
