//! # User Interface Module
//!
//! Dear ImGui overlay for live control of the sandbox.
//!
//! - [`UiManager`] - ImGui context, winit input forwarding and the wgpu overlay pass
//! - [`panel`] - The "Debug" window and the [`GuiState`] it edits
//!
//! Input the UI captures (hovering a slider, typing into a field) is not
//! forwarded to the camera.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{debug_window, GuiState};
