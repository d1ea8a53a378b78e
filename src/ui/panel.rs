// src/ui/panel.rs
//! The sandbox's debug panel
//!
//! [`GuiState`] is plain data the widgets edit in place. The scene reads it
//! once per tick, so nothing here touches lights or objects directly.

use crate::gfx::{
    lighting::light::{ATTENUATION_PRESETS, DEFAULT_ATTENUATION_PRESET},
    lighting::light_set::POINT_LIGHT_POSITIONS,
    resources::global_bindings::MAX_POINT_LIGHTS,
    scene::state::ModeFlags,
};

pub const SHININESS_RANGE: (f32, f32) = (1.0, 64.0);
pub const LIGHT_POSITION_RANGE: (f32, f32) = (-15.0, 15.0);

#[derive(Debug, Clone, PartialEq)]
pub struct GuiState {
    pub background: [f32; 3],
    pub light_position: [f32; 3],
    pub light_color: [f32; 3],
    pub point_positions: [[f32; 3]; MAX_POINT_LIGHTS],
    pub point_colors: [[f32; 3]; MAX_POINT_LIGHTS],
    pub shininess: f32,
    /// Index into the attenuation preset table
    pub attenuation: usize,
    pub flags: ModeFlags,
    /// Whether a model was loaded; the model toggle is disabled otherwise
    pub model_available: bool,
    /// Last frame time in milliseconds
    pub frame_ms: f32,
}

impl Default for GuiState {
    fn default() -> Self {
        Self {
            background: [0.0; 3],
            light_position: [1.2, 1.0, 2.0],
            light_color: [1.0; 3],
            point_positions: POINT_LIGHT_POSITIONS.map(Into::into),
            point_colors: [[1.0; 3]; MAX_POINT_LIGHTS],
            shininess: 32.0,
            attenuation: DEFAULT_ATTENUATION_PRESET,
            flags: ModeFlags::default(),
            model_available: false,
            frame_ms: 0.0,
        }
    }
}

/// Combo labels, the approximate range of each preset
pub fn attenuation_labels() -> Vec<String> {
    ATTENUATION_PRESETS
        .iter()
        .map(|p| p.range.to_string())
        .collect()
}

/// Draws the "Debug" window and writes every edit into `state`
pub fn debug_window(ui: &imgui::Ui, state: &mut GuiState) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    ui.window("Debug")
        .size([420.0, 0.0], imgui::Condition::FirstUseEver)
        .position([20.0, 20.0], imgui::Condition::FirstUseEver)
        .always_auto_resize(true)
        .build(|| {
            ui.color_edit3("Background Color", &mut state.background);
            ui.separator();

            ui.slider_config("lightPos", LIGHT_POSITION_RANGE.0, LIGHT_POSITION_RANGE.1)
                .build_array(&mut state.light_position);
            ui.color_edit3("lightCol", &mut state.light_color);

            if ui.collapsing_header("Point Lights", imgui::TreeNodeFlags::empty()) {
                for i in 0..MAX_POINT_LIGHTS {
                    ui.slider_config(
                        format!("PointPos{i}"),
                        LIGHT_POSITION_RANGE.0,
                        LIGHT_POSITION_RANGE.1,
                    )
                    .build_array(&mut state.point_positions[i]);
                    ui.color_edit3(format!("PointCol{i}"), &mut state.point_colors[i]);
                }
            }

            let labels = attenuation_labels();
            ui.combo_simple_string("lightAttenuation", &mut state.attenuation, &labels);
            ui.slider("shininess", SHININESS_RANGE.0, SHININESS_RANGE.1, &mut state.shininess);
            ui.separator();

            ui.checkbox("Sphere", &mut state.flags.sphere);
            ui.disabled(!state.model_available, || {
                ui.checkbox("Model", &mut state.flags.model);
            });
            ui.checkbox("Debug", &mut state.flags.debug);
            ui.checkbox("Wireframe", &mut state.flags.wireframe);

            ui.text(format!("Time: {:.3} ms/frame", state.frame_ms));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_scene_defaults() {
        let state = GuiState::default();
        assert_eq!(state.attenuation, 6);
        assert_eq!(state.point_positions[2], [-4.0, 2.0, -12.0]);
        assert_eq!(state.shininess, 32.0);
        assert!(!state.flags.wireframe);
    }

    #[test]
    fn test_attenuation_labels() {
        let labels = attenuation_labels();
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], "7");
        assert_eq!(labels[DEFAULT_ATTENUATION_PRESET], "100");
        assert_eq!(labels[11], "3250");
    }
}
