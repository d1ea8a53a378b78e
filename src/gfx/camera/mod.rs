pub mod camera_controller;
pub mod camera_utils;
pub mod fly_camera;

// Re-export main types
pub use camera_controller::{CameraController, ControllerActions, InputState, Key};
pub use fly_camera::{FlyCamera, ViewPreset};
