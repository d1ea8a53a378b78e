//! # Scene Module
//!
//! The sandbox's scene: the lit renderables, the debug overlays and the
//! per-frame state they are drawn from.
//!
//! ## Key Components
//!
//! - [`Scene`] - Owns every renderable and runs one frame per [`Scene::tick`]
//! - [`LitObject`] - The shared draw sequence of [`Cube`], [`Sphere`] and [`Model`]
//! - [`SceneState`] - Camera, lights, clock and mode flags
//! - [`Vertex3D`] - Interleaved vertex layout shared with the shaders
//!
//! ## Usage
//!
//! ```no_run
//! use phong_sandbox::{
//!     config::SandboxConfig,
//!     gfx::{camera::InputState, rendering::headless::HeadlessBackend, scene::Scene},
//!     ui::panel::GuiState,
//! };
//!
//! let mut backend = HeadlessBackend::new();
//! let mut scene = Scene::new(&SandboxConfig::default(), &mut backend).unwrap();
//! let gui = scene.gui_defaults();
//! scene.tick(0.0, &mut InputState::new(), &gui, &mut backend);
//! ```

pub mod model;
pub mod object;
pub mod overlay;
pub mod scene;
pub mod state;
pub mod vertex;

// Re-export main types
pub use model::{import_obj, ImportedMesh, Model};
pub use object::{Cube, LitObject, Sphere};
pub use scene::{Primary, Scene};
pub use state::{FrameContext, ModeFlags, SceneState};
pub use vertex::{LineVertex, Vertex3D};
