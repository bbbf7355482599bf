/// Fixed look-at camera and perspective projection
use nalgebra::{Matrix4, Point3, Vector3};

/// Camera looking at the origin from a fixed position on +Z
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        };
        camera.set_viewport(width, height);
        camera
    }

    /// Move the eye along +Z, keeping the origin as target
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.position = Point3::new(0.0, 0.0, distance);
        self
    }

    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self
    }

    /// Recompute the aspect ratio after a resize
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Combined projection and view, built once per frame
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Project a 3D point to 2D screen space through a precomputed
/// model-view-projection matrix.
///
/// Returns `(x, y, depth)` with depth in NDC, or `None` if the point
/// falls outside the clip volume.
pub fn project_to_screen(
    point: &Point3<f32>,
    mvp: &Matrix4<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip = mvp * point.to_homogeneous();
    // Behind the eye, or too close to divide safely
    if clip.w < 1e-6 {
        return None;
    }

    let ndc = clip.xyz() / clip.w;
    if ndc.iter().any(|c| !(-1.0..=1.0).contains(c)) {
        return None;
    }

    let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

    Some((screen_x, screen_y, ndc.z))
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert_relative_eq!(camera.aspect, 800.0 / 600.0);
        assert_eq!(camera.target, Point3::origin());
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut camera = Camera::new(800, 600);
        camera.set_viewport(200, 50);
        assert_relative_eq!(camera.aspect, 4.0);

        camera.set_viewport(10, 0);
        assert_relative_eq!(camera.aspect, 10.0);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = Camera::new(80, 40);
        let (x, y, depth) =
            project_to_screen(&Point3::origin(), &camera.view_projection(), 80, 40).unwrap();
        assert_relative_eq!(x, 40.0, epsilon = 1e-4);
        assert_relative_eq!(y, 20.0, epsilon = 1e-4);
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_nearer_points_have_smaller_depth() {
        let mvp = Camera::default().view_projection();
        let (_, _, near) = project_to_screen(&Point3::new(0.0, 0.0, 1.0), &mvp, 800, 600).unwrap();
        let (_, _, far) = project_to_screen(&Point3::new(0.0, 0.0, -1.0), &mvp, 800, 600).unwrap();
        assert!(near < far);
    }

    #[test]
    fn test_points_outside_frustum_are_clipped() {
        let mvp = Camera::default().with_distance(5.0).view_projection();
        // Behind the eye
        assert!(project_to_screen(&Point3::new(0.0, 0.0, 6.0), &mvp, 800, 600).is_none());
        // Far off to the side
        assert!(project_to_screen(&Point3::new(50.0, 0.0, 0.0), &mvp, 800, 600).is_none());
    }

    #[test]
    fn test_view_projection_matches_separate_matrices() {
        let camera = Camera::new(120, 80).with_distance(7.0);
        let model = Matrix4::new_translation(&Vector3::new(0.5, -0.25, 1.0));
        let point = Point3::new(0.2, 0.3, -0.4);

        let once = camera.view_projection() * model;
        let separate = camera.projection_matrix() * camera.view_matrix() * model;
        assert_relative_eq!(once, separate, epsilon = 1e-6);

        let (x, y, _) = project_to_screen(&point, &once, 120, 80).unwrap();
        let (sx, sy, _) = project_to_screen(&point, &separate, 120, 80).unwrap();
        assert_relative_eq!(x, sx, epsilon = 1e-4);
        assert_relative_eq!(y, sy, epsilon = 1e-4);
    }
}
