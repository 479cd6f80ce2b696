use cgmath::{Matrix4, Point3, Rad, Vector3};

/// Converts OpenGL clip space (depth in [-1, 1]) to wgpu clip space (depth in [0, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Camera state consumed by the cascade planner.
///
/// The planner never mutates a camera; it only reads the current view matrix,
/// the perspective shape and the orthonormal basis.
pub trait Camera {
    /// World to view transform (right-handed, looking down -Z).
    fn view_matrix(&self) -> Matrix4<f32>;

    /// View to clip transform in wgpu clip space.
    fn projection_matrix(&self) -> Matrix4<f32>;

    /// Vertical field of view.
    fn fov_y(&self) -> Rad<f32>;

    fn near(&self) -> f32;

    fn far(&self) -> f32;

    /// Width over height.
    fn aspect(&self) -> f32;

    fn position(&self) -> Point3<f32>;

    fn forward(&self) -> Vector3<f32>;

    fn right(&self) -> Vector3<f32>;

    fn up(&self) -> Vector3<f32>;
}

/// Builds a wgpu perspective projection from the usual parameters.
pub fn perspective_projection(fov_y: Rad<f32>, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::perspective(fov_y, aspect, near, far)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Vector4};

    #[test]
    fn test_perspective_depth_range() {
        let proj = perspective_projection(Deg(60.0).into(), 1.5, 0.5, 100.0);

        let near = proj * Vector4::new(0.0, 0.0, -0.5, 1.0);
        let far = proj * Vector4::new(0.0, 0.0, -100.0, 1.0);

        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }
}
