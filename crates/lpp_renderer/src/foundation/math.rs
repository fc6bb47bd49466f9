//! Math utilities and types
//!
//! Provides the math types used by the renderer: nalgebra aliases, a
//! position/rotation/scale transform, projection helpers and plane
//! classification for light volumes.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
///
/// Forward is the local -Z axis, matching the right-handed view convention
/// used by [`Mat4Ext::look_at`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create a transform at `position` whose forward axis points along `direction`
    ///
    /// Falls back to the Z axis as the reference up vector when `direction`
    /// is nearly parallel to +Y.
    pub fn looking_along(position: Vec3, direction: Vec3) -> Self {
        let forward = direction.normalize();
        let up = if forward.dot(&Vec3::y()).abs() > 0.999 {
            Vec3::z()
        } else {
            Vec3::y()
        };
        // face_towards aligns local +Z, and forward is local -Z
        let rotation = Quat::face_towards(&(-forward), &up);
        Self::from_position_rotation(position, rotation)
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Translation and rotation only, ignoring scale
    pub fn rigid_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position) * self.rotation.to_homogeneous()
    }

    /// World-space forward direction (local -Z)
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::z()
    }

    /// World-space right direction (local +X)
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::x()
    }

    /// World-space up direction (local +Y)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.to_matrix().transform_point(&point)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Column-major array form of a matrix for constant uploads
    pub fn mat4_to_cols(matrix: &super::Mat4) -> [[f32; 4]; 4] {
        (*matrix).into()
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a perspective projection matrix mapping view depth to [0, 1]
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create an orthographic projection matrix mapping view depth to [0, 1]
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Create a look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Create the intermediate coordinate system transformation for Vulkan
    fn vulkan_coordinate_transform() -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // P = [a⁻¹/tan(φ/2)    0              0                    0           ]
        //     [0               1/tan(φ/2)     0                    0           ]
        //     [0               0              f/(f-n)              -nf/(f-n)   ]
        //     [0               0              1                    0           ]
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;
        result
    }

    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut result = Mat4::identity();
        result[(0, 0)] = 2.0 / (right - left);
        result[(1, 1)] = 2.0 / (top - bottom);
        result[(2, 2)] = 1.0 / (far - near);
        result[(0, 3)] = -(right + left) / (right - left);
        result[(1, 3)] = -(top + bottom) / (top - bottom);
        result[(2, 3)] = -near / (far - near);
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn vulkan_coordinate_transform() -> Mat4 {
        // Flips Y and Z so that view-space forward maps to +Z before projection
        Mat4::new(
            1.0,  0.0,  0.0, 0.0,
            0.0, -1.0,  0.0, 0.0,
            0.0,  0.0, -1.0, 0.0,
            0.0,  0.0,  0.0, 1.0,
        )
    }
}

/// Result of classifying a volume against a plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneIntersection {
    /// Entirely on the side the normal points to
    Front,
    /// Entirely on the opposite side
    Back,
    /// Crossing the plane
    Intersecting,
}

/// An infinite plane: `normal · p + constant = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Plane constant
    pub constant: f32,
}

impl Plane {
    /// Create a plane from a normal and a point on the plane
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            constant: -normal.dot(&point),
        }
    }

    /// Signed distance from the plane, positive on the normal side
    pub fn signed_distance(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    /// Move the plane along its normal by `offset`
    pub fn offset(&self, offset: f32) -> Self {
        Self {
            normal: self.normal,
            constant: self.constant - offset,
        }
    }

    /// Classify a sphere against the plane
    pub fn classify_sphere(&self, center: &Vec3, radius: f32) -> PlaneIntersection {
        let distance = self.signed_distance(center);
        if distance > radius {
            PlaneIntersection::Front
        } else if distance < -radius {
            PlaneIntersection::Back
        } else {
            PlaneIntersection::Intersecting
        }
    }

    /// Classify a convex point set (e.g. frustum corners) against the plane
    pub fn classify_points(&self, points: &[Vec3]) -> PlaneIntersection {
        let mut front = false;
        let mut back = false;
        for point in points {
            if self.signed_distance(point) > 0.0 {
                front = true;
            } else {
                back = true;
            }
        }
        match (front, back) {
            (true, false) => PlaneIntersection::Front,
            (false, true) => PlaneIntersection::Back,
            _ => PlaneIntersection::Intersecting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_looking_along_points_forward() {
        let direction = Vec3::new(1.0, -1.0, 0.5).normalize();
        let transform = Transform::looking_along(Vec3::new(3.0, 2.0, 1.0), direction);
        assert_relative_eq!(transform.forward(), direction, epsilon = 1e-5);
    }

    #[test]
    fn test_looking_along_straight_down() {
        let transform = Transform::looking_along(Vec3::zeros(), -Vec3::y());
        assert_relative_eq!(transform.forward(), -Vec3::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_perspective_depth_range() {
        let projection = Mat4::perspective(1.0, 1.5, 0.5, 100.0);
        let near = projection * Vec4::new(0.0, 0.0, 0.5, 1.0);
        let far = projection * Vec4::new(0.0, 0.0, 100.0, 1.0);
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_orthographic_maps_box_to_unit_range() {
        let ortho = Mat4::orthographic(-2.0, 4.0, -1.0, 3.0, 1.0, 11.0);
        let min = ortho * Vec4::new(-2.0, -1.0, 1.0, 1.0);
        let max = ortho * Vec4::new(4.0, 3.0, 11.0, 1.0);
        assert_relative_eq!(min, Vec4::new(-1.0, -1.0, 0.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(max, Vec4::new(1.0, 1.0, 1.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_classification() {
        let plane = Plane::from_normal_and_point(Vec3::z(), Vec3::zeros());
        assert_eq!(plane.classify_sphere(&Vec3::new(0.0, 0.0, 5.0), 1.0), PlaneIntersection::Front);
        assert_eq!(plane.classify_sphere(&Vec3::new(0.0, 0.0, -5.0), 1.0), PlaneIntersection::Back);
        assert_eq!(plane.classify_sphere(&Vec3::new(0.0, 0.0, 0.5), 1.0), PlaneIntersection::Intersecting);
    }

    #[test]
    fn test_offset_plane_moves_along_normal() {
        let plane = Plane::from_normal_and_point(Vec3::z(), Vec3::zeros()).offset(2.0);
        assert_relative_eq!(plane.signed_distance(&Vec3::new(0.0, 0.0, 2.0)), 0.0, epsilon = 1e-6);
    }
}
