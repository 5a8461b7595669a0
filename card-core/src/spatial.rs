//! Spatial math for placing the card in front of the viewer and raycasting
//! input against it.
//!
//! ```text
//!                up
//!                 ▲        ┌──────────────┐
//!                 │        │     card     │ 0.30 m x 0.171 m
//!      viewer ●───┼──────▶ │      ●──▶ n  │ (double sided)
//!              forward     └──────────────┘
//!                 ◀────── 0.5 m ──────▶
//! ```
//!
//! Right-handed coordinates, Y up, forward is -Z (WebXR convention).

use serde::{Deserialize, Serialize};

/// Physical card width in metres.
pub const CARD_WIDTH_M: f32 = 0.30;
/// Width-to-height ratio of a business card.
pub const CARD_ASPECT: f32 = 1.75;
/// Distance from the viewer at which the card floats.
pub const PLACEMENT_DISTANCE_M: f32 = 0.5;

/// Rays closer to parallel than this never hit the plane.
const PARALLEL_EPSILON: f32 = 1e-6;

/// A 3D vector for positions and directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Unit vector pointing up (Y+).
    #[must_use]
    pub const fn up() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Unit vector pointing right (X+).
    #[must_use]
    pub const fn right() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Unit vector pointing forward (Z-).
    #[must_use]
    pub const fn forward() -> Self {
        Self::new(0.0, 0.0, -1.0)
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit-length copy; the zero vector stays zero.
    #[must_use]
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self.scale(1.0 / len)
        } else {
            *self
        }
    }

    /// Cross product.
    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Dot product.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Component-wise subtraction.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Component-wise addition.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Scale by a scalar.
    #[must_use]
    pub fn scale(&self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::zero()
    }
}

/// A rotation quaternion (`x`, `y`, `z` imaginary, `w` real).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// W (real) component.
    pub w: f32,
}

impl Quat {
    /// Create a quaternion from raw components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `angle` radians around `axis`.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalize();
        let (sin, cos) = (angle / 2.0).sin_cos();
        Self::new(axis.x * sin, axis.y * sin, axis.z * sin, cos)
    }

    /// Rotate a vector.
    #[must_use]
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        // v' = v + 2w(q x v) + 2 q x (q x v)
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(&v).scale(2.0);
        v.add(&t.scale(self.w)).add(&q.cross(&t))
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

/// Position and orientation of a tracked object (viewer or controller).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Position in metres.
    pub position: Vec3,
    /// Orientation.
    pub orientation: Quat,
}

impl Pose {
    /// Create a pose.
    #[must_use]
    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Direction the pose looks along.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.orientation.rotate(Vec3::forward()).normalize()
    }
}

/// A half-line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Ray cast from a controller: its position, pointing along its -Z.
    #[must_use]
    pub fn from_pose(pose: &Pose) -> Self {
        Self::new(pose.position, pose.forward())
    }

    /// Point at distance `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin.add(&self.direction.scale(t))
    }
}

/// Perspective camera used for screen-tap raycasts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Camera pose.
    pub pose: Pose,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Viewport width over height.
    pub aspect: f32,
}

impl Camera {
    /// Create a camera.
    #[must_use]
    pub fn new(pose: Pose, fov_y: f32, aspect: f32) -> Self {
        Self { pose, fov_y, aspect }
    }

    /// Ray through normalized device coordinates (`-1..=1`, y up).
    #[must_use]
    pub fn ray_from_ndc(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let orientation = self.pose.orientation;
        let forward = orientation.rotate(Vec3::forward());
        let right = orientation.rotate(Vec3::right());
        let up = orientation.rotate(Vec3::up());

        let half_height = (self.fov_y / 2.0).tan();
        let half_width = half_height * self.aspect;

        let direction = forward
            .add(&right.scale(ndc_x * half_width))
            .add(&up.scale(ndc_y * half_height));
        Ray::new(self.pose.position, direction)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Pose::default(), std::f32::consts::FRAC_PI_4, 1.0)
    }
}

/// Result of a ray hitting the card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneHit {
    /// Distance along the ray.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
    /// Texture coordinate across the card, `0..=1`.
    pub u: f32,
    /// Texture coordinate up the card, `0..=1`.
    pub v: f32,
}

/// The card quad in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardPlane {
    /// Centre of the card.
    pub center: Vec3,
    /// Unit normal of the textured face.
    pub normal: Vec3,
    /// Unit vector along the card's width.
    pub right: Vec3,
    /// Unit vector along the card's height.
    pub up: Vec3,
    /// Width in metres.
    pub width: f32,
    /// Height in metres.
    pub height: f32,
}

impl CardPlane {
    /// Place the card [`PLACEMENT_DISTANCE_M`] in front of a viewer, facing it.
    #[must_use]
    pub fn facing(viewer: &Pose) -> Self {
        let forward = viewer.forward();
        let center = viewer.position.add(&forward.scale(PLACEMENT_DISTANCE_M));
        let normal = forward.scale(-1.0);

        let mut right = Vec3::up().cross(&normal);
        if right.length() < PARALLEL_EPSILON {
            // Looking straight up or down.
            right = viewer.orientation.rotate(Vec3::right());
        }
        let right = right.normalize();
        let up = normal.cross(&right).normalize();

        Self {
            center,
            normal,
            right,
            up,
            width: CARD_WIDTH_M,
            height: CARD_WIDTH_M / CARD_ASPECT,
        }
    }

    /// Intersect a ray with the card; both faces count.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<PlaneHit> {
        let denom = ray.direction.dot(&self.normal);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let distance = self.center.sub(&ray.origin).dot(&self.normal) / denom;
        if distance < 0.0 {
            return None;
        }

        let point = ray.at(distance);
        let offset = point.sub(&self.center);
        let x = offset.dot(&self.right) / self.width;
        let y = offset.dot(&self.up) / self.height;
        if x.abs() > 0.5 || y.abs() > 0.5 {
            return None;
        }

        Some(PlaneHit {
            distance,
            point,
            u: x + 0.5,
            v: y + 0.5,
        })
    }
}

impl Default for CardPlane {
    fn default() -> Self {
        Self::facing(&Pose::default())
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn test_vec3_cross() {
        let c = Vec3::right().cross(&Vec3::up());
        assert!(vec_approx_eq(c, Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_vec3_normalize_zero() {
        assert!(approx_eq(Vec3::zero().normalize().length(), 0.0));
    }

    #[test]
    fn test_quat_rotates_forward_to_left() {
        let yaw = Quat::from_axis_angle(Vec3::up(), FRAC_PI_2);
        let rotated = yaw.rotate(Vec3::forward());
        assert!(vec_approx_eq(rotated, Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_card_faces_viewer() {
        let plane = CardPlane::default();
        assert!(vec_approx_eq(plane.center, Vec3::new(0.0, 0.0, -0.5)));
        assert!(vec_approx_eq(plane.normal, Vec3::new(0.0, 0.0, 1.0)));
        assert!(vec_approx_eq(plane.right, Vec3::right()));
        assert!(vec_approx_eq(plane.up, Vec3::up()));
        assert!(approx_eq(plane.height, 0.30 / 1.75));
    }

    #[test]
    fn test_card_follows_turned_viewer() {
        let viewer = Pose::new(
            Vec3::new(1.0, 1.6, 0.0),
            Quat::from_axis_angle(Vec3::up(), FRAC_PI_2),
        );
        let plane = CardPlane::facing(&viewer);
        assert!(vec_approx_eq(plane.center, Vec3::new(0.5, 1.6, 0.0)));
        assert!(vec_approx_eq(plane.normal, Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_card_looking_straight_down_stays_finite() {
        let viewer = Pose::new(
            Vec3::zero(),
            Quat::from_axis_angle(Vec3::right(), -FRAC_PI_2),
        );
        let plane = CardPlane::facing(&viewer);
        assert!(approx_eq(plane.right.length(), 1.0));
        assert!(approx_eq(plane.up.length(), 1.0));
    }

    #[test]
    fn test_centre_ray_hits_card_centre() {
        let plane = CardPlane::default();
        let hit = plane
            .intersect(&Ray::from_pose(&Pose::default()))
            .expect("should hit");
        assert!(approx_eq(hit.distance, 0.5));
        assert!(approx_eq(hit.u, 0.5));
        assert!(approx_eq(hit.v, 0.5));
    }

    #[test]
    fn test_back_face_is_hit() {
        let plane = CardPlane::default();
        let behind = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(plane.intersect(&behind).is_some());
    }

    #[test]
    fn test_parallel_and_backward_rays_miss() {
        let plane = CardPlane::default();
        let parallel = Ray::new(Vec3::zero(), Vec3::right());
        let backward = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        assert!(plane.intersect(&parallel).is_none());
        assert!(plane.intersect(&backward).is_none());
    }

    #[test]
    fn test_ray_outside_card_misses() {
        let plane = CardPlane::default();
        let wide = Ray::new(Vec3::zero(), Vec3::new(0.5, 0.0, -0.5));
        assert!(plane.intersect(&wide).is_none());
    }

    #[test]
    fn test_ndc_corner_maps_to_card_corner_direction() {
        let camera = Camera::default();
        let ray = camera.ray_from_ndc(0.0, 0.0);
        assert!(vec_approx_eq(ray.direction, Vec3::forward()));

        let up_right = camera.ray_from_ndc(1.0, 1.0);
        assert!(up_right.direction.x > 0.0);
        assert!(up_right.direction.y > 0.0);
        assert!(up_right.direction.z < 0.0);
    }

    #[test]
    fn test_off_centre_hit_uv() {
        let plane = CardPlane::default();
        // Quarter of the width to the right, quarter of the height down.
        let target = Vec3::new(0.075, -plane.height / 4.0, -0.5);
        let hit = plane
            .intersect(&Ray::new(Vec3::zero(), target))
            .expect("should hit");
        assert!(approx_eq(hit.u, 0.75));
        assert!(approx_eq(hit.v, 0.25));
    }
}
