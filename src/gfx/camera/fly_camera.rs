use super::camera_utils::OPENGL_TO_WGPU_MATRIX;
use cgmath::*;

/// Pitch limit in degrees; keeps `front` away from the world-up pole
pub const MAX_PITCH: f32 = 89.0;
pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 45.0;
/// Raw angular step of one tilt key press, scaled by the mouse sensitivity
pub const TILT_STEP: f32 = 10.0;

/// Canonical camera poses reachable with the number keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPreset {
    XyPlane,
    YzPlane,
    XzPlane,
    Isometric,
    TopDown,
    Front,
    Side,
    /// The start-up pose
    Home,
}

impl ViewPreset {
    pub const ALL: [ViewPreset; 8] = [
        ViewPreset::XyPlane,
        ViewPreset::YzPlane,
        ViewPreset::XzPlane,
        ViewPreset::Isometric,
        ViewPreset::TopDown,
        ViewPreset::Front,
        ViewPreset::Side,
        ViewPreset::Home,
    ];

    /// Digits 1-7 pick the plane/orthographic-style views, 0 returns home
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(ViewPreset::Home),
            1..=7 => Some(Self::ALL[digit as usize - 1]),
            _ => None,
        }
    }

    /// (yaw, pitch, position); pitch is clamped when applied
    pub fn pose(self) -> (f32, f32, Vector3<f32>) {
        match self {
            ViewPreset::XyPlane => (-90.0, 0.0, Vector3::new(0.0, 0.0, 10.0)),
            ViewPreset::YzPlane => (0.0, 0.0, Vector3::new(-10.0, 0.0, 0.0)),
            ViewPreset::XzPlane => (-90.0, 90.0, Vector3::new(0.0, -10.0, 0.0)),
            ViewPreset::Isometric => (-45.0, -45.0, Vector3::new(-10.0, -10.0, 10.0)),
            ViewPreset::TopDown => (-90.0, -89.9, Vector3::new(0.0, -10.0, 0.0)),
            ViewPreset::Front => (-90.0, 0.0, Vector3::new(0.0, 0.0, 10.0)),
            ViewPreset::Side => (0.0, 0.0, Vector3::new(-10.0, 0.0, 0.0)),
            ViewPreset::Home => (-90.0, 0.0, Vector3::new(0.0, 0.0, 3.0)),
        }
    }
}

/// Euler-angle first-person camera
///
/// Orientation is yaw/pitch in degrees. The basis vectors and both matrices
/// are cached and refreshed by every mutating method, so readers never see a
/// stale view or projection.
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    position: Vector3<f32>,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    world_up: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    /// Units per second
    pub base_speed: f32,
    /// Units per move command; `base_speed * delta_time` once per frame
    speed: f32,
    pub sensitivity: f32,
    zoom: f32,
    aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 0.0, 3.0), -90.0, 0.0, 800.0 / 600.0)
    }
}

impl FlyCamera {
    pub fn new(position: Vector3<f32>, yaw: f32, pitch: f32, aspect: f32) -> Self {
        let mut camera = Self {
            position,
            front: Vector3::new(0.0, 0.0, -1.0),
            right: Vector3::unit_x(),
            up: Vector3::unit_y(),
            world_up: Vector3::unit_y(),
            yaw,
            pitch: pitch.clamp(-MAX_PITCH, MAX_PITCH),
            base_speed: 2.5,
            speed: 2.5,
            sensitivity: 0.1,
            zoom: MAX_ZOOM,
            aspect,
            znear: 0.1,
            zfar: 100.0,
            view: Matrix4::identity(), // Refreshed by `update()` below.
            projection: Matrix4::identity(),
        };
        camera.update();
        camera
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.update();
        self
    }

    pub fn with_clip_planes(mut self, znear: f32, zfar: f32) -> Self {
        self.znear = znear;
        self.zfar = zfar;
        self.update();
        self
    }

    /// Recomputes the basis vectors from yaw/pitch, then both matrices
    pub fn update(&mut self) {
        let (yaw, pitch) = (Deg(self.yaw), Deg(self.pitch));
        self.front =
            Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
        self.update_view();
        self.update_projection();
    }

    fn update_view(&mut self) {
        let eye = Point3::from_vec(self.position);
        self.view = Matrix4::look_at_rh(eye, eye + self.front, self.up);
    }

    fn update_projection(&mut self) {
        self.projection = OPENGL_TO_WGPU_MATRIX
            * perspective(Deg(self.zoom), self.aspect, self.znear, self.zfar);
    }

    /// Mouse-look: offsets are raw deltas, scaled by the sensitivity
    pub fn process_mouse(&mut self, x_offset: f32, y_offset: f32) {
        self.yaw += x_offset * self.sensitivity;
        self.pitch = (self.pitch + y_offset * self.sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
        self.update();
    }

    pub fn move_forward(&mut self) {
        self.position += self.front * self.speed;
        self.update_view();
    }

    pub fn move_backward(&mut self) {
        self.position -= self.front * self.speed;
        self.update_view();
    }

    pub fn move_left(&mut self) {
        self.position -= self.right * self.speed;
        self.update_view();
    }

    pub fn move_right(&mut self) {
        self.position += self.right * self.speed;
        self.update_view();
    }

    pub fn tilt_up(&mut self) {
        self.process_mouse(0.0, TILT_STEP);
    }

    pub fn tilt_down(&mut self) {
        self.process_mouse(0.0, -TILT_STEP);
    }

    pub fn tilt_left(&mut self) {
        self.process_mouse(-TILT_STEP, 0.0);
    }

    pub fn tilt_right(&mut self) {
        self.process_mouse(TILT_STEP, 0.0);
    }

    /// Narrows the field of view for positive deltas (scroll up)
    pub fn zoom(&mut self, delta: f32) {
        self.zoom = (self.zoom - delta).clamp(MIN_ZOOM, MAX_ZOOM);
        self.update_projection();
    }

    /// Jumps straight to a preset pose, no easing
    pub fn snap_to(&mut self, preset: ViewPreset) {
        let (yaw, pitch, position) = preset.pose();
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.position = position;
        self.update();
    }

    /// Ignores zero sizes (minimised window)
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_projection();
    }

    /// Makes motion frame-rate independent
    pub fn set_frame_delta(&mut self, delta_time: f32) {
        self.speed = self.base_speed * delta_time;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn zoom_degrees(&self) -> f32 {
        self.zoom
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < EPS, "{a} != {b}");
    }

    fn assert_orthonormal(camera: &FlyCamera) {
        let (f, r, u) = (camera.front(), camera.right(), camera.up());
        assert_close(f.dot(r), 0.0);
        assert_close(f.dot(u), 0.0);
        assert_close(r.dot(u), 0.0);
        assert_close(f.magnitude(), 1.0);
        assert_close(r.magnitude(), 1.0);
        assert_close(u.magnitude(), 1.0);
    }

    #[test]
    fn test_basis_is_orthonormal_over_orientations() {
        let mut yaw = 0.0;
        while yaw < 360.0 {
            let mut pitch = -89.0;
            while pitch <= 89.0 {
                let camera = FlyCamera::new(Vector3::zero(), yaw, pitch, 1.0);
                assert_orthonormal(&camera);
                pitch += 7.0;
            }
            yaw += 15.0;
        }
    }

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = FlyCamera::default();
        assert_close(camera.front().x, 0.0);
        assert_close(camera.front().z, -1.0);
        assert_eq!(camera.position(), Vector3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_move_forward_with_unit_speed() {
        let mut camera = FlyCamera::default();
        camera.set_speed(1.0);
        camera.move_forward();
        assert_close(camera.position().x, 0.0);
        assert_close(camera.position().y, 0.0);
        assert_close(camera.position().z, 2.0);
    }

    #[test]
    fn test_strafe_moves_along_right() {
        let mut camera = FlyCamera::default();
        camera.set_speed(0.5);
        camera.move_right();
        assert_close(camera.position().x, 0.5);
        camera.move_left();
        camera.move_left();
        assert_close(camera.position().x, -0.5);
        camera.move_backward();
        assert_close(camera.position().z, 3.5);
    }

    #[test]
    fn test_speed_scales_with_frame_delta() {
        let mut camera = FlyCamera::default();
        camera.set_frame_delta(0.5);
        assert_close(camera.speed(), 1.25);
    }

    #[test]
    fn test_zoom_stays_clamped_and_monotonic() {
        let mut camera = FlyCamera::default();
        for delta in [-100.0, 0.5, 3.0, 44.0, 1000.0, -0.25, -7.0, f32::MAX] {
            let before = camera.zoom_degrees();
            camera.zoom(delta);
            let after = camera.zoom_degrees();
            assert!((MIN_ZOOM..=MAX_ZOOM).contains(&after));
            if delta > 0.0 {
                assert!(after <= before);
            } else {
                assert!(after >= before);
            }
        }
    }

    #[test]
    fn test_zoom_refreshes_projection() {
        let mut camera = FlyCamera::default();
        let before = camera.projection_matrix();
        camera.zoom(10.0);
        assert_ne!(before, camera.projection_matrix());
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.process_mouse(0.0, 10_000.0);
        assert_eq!(camera.pitch(), MAX_PITCH);
        assert_orthonormal(&camera);
        camera.process_mouse(0.0, -10_000.0);
        assert_eq!(camera.pitch(), -MAX_PITCH);
    }

    #[test]
    fn test_tilt_uses_sensitivity() {
        let mut camera = FlyCamera::default();
        camera.tilt_up();
        assert_close(camera.pitch(), 1.0);
        camera.tilt_left();
        assert_close(camera.yaw(), -91.0);
    }

    #[test]
    fn test_snap_overwrites_pose() {
        let mut camera = FlyCamera::default();
        camera.process_mouse(123.0, 45.0);
        camera.snap_to(ViewPreset::YzPlane);
        assert_eq!(camera.yaw(), 0.0);
        assert_eq!(camera.pitch(), 0.0);
        assert_eq!(camera.position(), Vector3::new(-10.0, 0.0, 0.0));
        assert_close(camera.front().x, 1.0);
    }

    #[test]
    fn test_snap_presets_clamp_pitch() {
        let mut camera = FlyCamera::default();
        for preset in ViewPreset::ALL {
            camera.snap_to(preset);
            assert!(camera.pitch().abs() <= MAX_PITCH);
            assert_orthonormal(&camera);
        }
        camera.snap_to(ViewPreset::XzPlane);
        assert_eq!(camera.pitch(), MAX_PITCH);
    }

    #[test]
    fn test_preset_digits() {
        assert_eq!(ViewPreset::from_digit(0), Some(ViewPreset::Home));
        assert_eq!(ViewPreset::from_digit(1), Some(ViewPreset::XyPlane));
        assert_eq!(ViewPreset::from_digit(7), Some(ViewPreset::Side));
        assert_eq!(ViewPreset::from_digit(8), None);
    }

    #[test]
    fn test_resize_updates_aspect_and_ignores_zero() {
        let mut camera = FlyCamera::default();
        camera.resize(1920, 1080);
        assert_close(camera.aspect(), 1920.0 / 1080.0);
        let projection = camera.projection_matrix();
        camera.resize(0, 600);
        assert_eq!(camera.projection_matrix(), projection);
    }
}
