//! Phong light sources
//!
//! A [`Light`] stores a base color and derives its ambient and diffuse terms
//! from it. A [`LightSet`] groups the lights the lit shader consumes and packs
//! them into one uniform block per frame.

pub mod light;
pub mod light_set;

pub use light::{Attenuation, Light, LightKind, ATTENUATION_PRESETS, DEFAULT_ATTENUATION_PRESET};
pub use light_set::LightSet;
