use super::camera_utils::{perspective_projection, Camera};
use cgmath::*;

/// Pitch stays just short of the poles so the world-up cross product is defined.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// First-person camera with free translation, yaw, pitch and roll.
///
/// Orientation is stored as angles and the basis vectors are rebuilt by
/// [`FlyCamera::update`]. With all angles at zero the camera looks down -Z
/// with +Y up.
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    pub position: Vector3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub aspect: f32,
    forward: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
}

impl FlyCamera {
    /// Creates a camera at `position` looking along `forward`.
    ///
    /// # Arguments
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `znear` - Near clip distance
    /// * `zfar` - Far clip distance
    /// * `aspect` - Width over height
    /// * `position` - Eye position in world space
    /// * `forward` - View direction, need not be normalized
    pub fn new(
        fov_degrees: f32,
        znear: f32,
        zfar: f32,
        aspect: f32,
        position: Vector3<f32>,
        forward: Vector3<f32>,
    ) -> Self {
        let (yaw, pitch) = angles_from_direction(forward);
        let mut camera = Self {
            position,
            yaw,
            pitch,
            roll: 0.0,
            fovy: Deg(fov_degrees).into(),
            znear,
            zfar,
            aspect,
            forward: -Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: Vector3::unit_y(),
        };
        camera.update();
        camera
    }

    /// Replaces the perspective shape, e.g. after a window resize.
    pub fn update_projection(&mut self, fov_degrees: f32, znear: f32, zfar: f32, aspect: f32) {
        self.fovy = Deg(fov_degrees).into();
        self.znear = znear;
        self.zfar = zfar;
        self.aspect = aspect;
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Moves the eye by `amount` along `direction`.
    pub fn set_translation_delta(&mut self, direction: Vector3<f32>, amount: f32) {
        self.position += direction * amount;
    }

    /// Adds pitch (x), yaw (y) and roll (z) in radians, then rebuilds the basis.
    pub fn set_rotation_delta(&mut self, delta: Vector3<f32>) {
        self.pitch = (self.pitch + delta.x).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw += delta.y;
        self.roll += delta.z;
        self.update();
    }

    pub fn set_roll(&mut self, roll: f32) {
        self.roll = roll;
        self.update();
    }

    /// Recomputes forward/right/up from the stored angles.
    pub fn update(&mut self) {
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let forward = Vector3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            -self.pitch.cos() * self.yaw.cos(),
        )
        .normalize();
        let right = forward.cross(Vector3::unit_y()).normalize();
        let up = right.cross(forward).normalize();

        let roll = Quaternion::from_axis_angle(forward, Rad(self.roll));
        self.forward = forward;
        self.right = roll.rotate_vector(right);
        self.up = roll.rotate_vector(up);
    }
}

impl Camera for FlyCamera {
    fn view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.position);
        Matrix4::look_at_rh(eye, eye + self.forward, self.up)
    }

    fn projection_matrix(&self) -> Matrix4<f32> {
        perspective_projection(self.fovy, self.aspect, self.znear, self.zfar)
    }

    fn fov_y(&self) -> Rad<f32> {
        self.fovy
    }

    fn near(&self) -> f32 {
        self.znear
    }

    fn far(&self) -> f32 {
        self.zfar
    }

    fn aspect(&self) -> f32 {
        self.aspect
    }

    fn position(&self) -> Point3<f32> {
        Point3::from_vec(self.position)
    }

    fn forward(&self) -> Vector3<f32> {
        self.forward
    }

    fn right(&self) -> Vector3<f32> {
        self.right
    }

    fn up(&self) -> Vector3<f32> {
        self.up
    }
}

fn angles_from_direction(direction: Vector3<f32>) -> (f32, f32) {
    if direction.magnitude2() <= f32::EPSILON {
        return (0.0, 0.0);
    }
    let dir = direction.normalize();
    let yaw = dir.x.atan2(-dir.z);
    let pitch = dir.y.clamp(-1.0, 1.0).asin();
    (yaw, pitch)
}
