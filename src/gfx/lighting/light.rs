//! A single Phong light and the attenuation preset table

use cgmath::{Deg, Matrix4, Vector3};

use crate::{
    error::LightingError,
    gfx::resources::{
        global_bindings::{DirLightUniform, PointLightUniform, SpotLightUniform},
        material::MaterialUniform,
    },
};

pub const DIFFUSE_FACTOR: f32 = 0.5;
pub const AMBIENT_FACTOR: f32 = 0.2;
/// Edge length of a light's debug cube relative to the unit cube
pub const DEBUG_CUBE_SCALE: f32 = 0.2;

/// Derived (ambient, diffuse) for a base color: diffuse = color x 0.5,
/// ambient = diffuse x 0.2
pub fn phong_terms(color: Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let diffuse = color * DIFFUSE_FACTOR;
    (diffuse * AMBIENT_FACTOR, diffuse)
}

/// Which uniform block consumes a light; the data shape is the same for all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

/// One row of the attenuation table: an approximate effective range in world
/// units and the coefficients that reach it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttenuationPreset {
    pub range: u32,
    pub linear: f32,
    pub quadratic: f32,
}

const fn preset(range: u32, linear: f32, quadratic: f32) -> AttenuationPreset {
    AttenuationPreset {
        range,
        linear,
        quadratic,
    }
}

pub const ATTENUATION_PRESETS: [AttenuationPreset; 12] = [
    preset(7, 0.7, 1.8),
    preset(13, 0.35, 0.44),
    preset(20, 0.22, 0.20),
    preset(32, 0.14, 0.07),
    preset(50, 0.09, 0.032),
    preset(65, 0.07, 0.017),
    preset(100, 0.045, 0.0075),
    preset(160, 0.027, 0.0028),
    preset(200, 0.022, 0.0019),
    preset(325, 0.014, 0.0007),
    preset(600, 0.007, 0.0002),
    preset(3250, 0.0014, 0.000007),
];

pub const DEFAULT_ATTENUATION_PRESET: usize = 6;

/// A light source
///
/// The base color is private: [`Light::set_color`] writes it and re-derives
/// ambient/diffuse in the same call, so the derived terms are never stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    color: Vector3<f32>,
    ambient: Vector3<f32>,
    diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub attenuation: Attenuation,
    /// Cosine of the inner spot cone angle
    cutoff: f32,
    /// Cosine of the outer spot cone angle
    outer_cutoff: f32,
}

impl Light {
    fn with_kind(kind: LightKind) -> Self {
        let mut light = Self {
            kind,
            position: Vector3::new(1.2, 1.0, 2.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
            color: Vector3::new(1.0, 1.0, 1.0),
            ambient: Vector3::new(0.0, 0.0, 0.0),
            diffuse: Vector3::new(0.0, 0.0, 0.0),
            specular: Vector3::new(1.0, 1.0, 1.0),
            attenuation: Attenuation::default(),
            cutoff: cgmath::Angle::cos(Deg(12.5f32)),
            outer_cutoff: cgmath::Angle::cos(Deg(19.5f32)),
        };
        light.update_colors();
        light
    }

    pub fn point(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::with_kind(LightKind::Point)
        }
    }

    pub fn directional(
        direction: Vector3<f32>,
        color: Vector3<f32>,
        specular: Vector3<f32>,
    ) -> Self {
        let mut light = Self {
            direction,
            specular,
            ..Self::with_kind(LightKind::Directional)
        };
        light.set_color(color);
        light
    }

    /// Spot light; position and direction follow the camera at upload time
    pub fn spot() -> Self {
        Self::with_kind(LightKind::Spot)
    }

    /// Recomputes diffuse and ambient from the base color
    pub fn update_colors(&mut self) {
        let (ambient, diffuse) = phong_terms(self.color);
        self.ambient = ambient;
        self.diffuse = diffuse;
    }

    pub fn set_color(&mut self, color: Vector3<f32>) {
        self.color = color;
        self.update_colors();
    }

    pub fn color(&self) -> Vector3<f32> {
        self.color
    }

    pub fn ambient(&self) -> Vector3<f32> {
        self.ambient
    }

    pub fn diffuse(&self) -> Vector3<f32> {
        self.diffuse
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn outer_cutoff(&self) -> f32 {
        self.outer_cutoff
    }

    /// Overwrites linear/quadratic from the preset table
    pub fn set_attenuation_preset(&mut self, index: usize) -> Result<(), LightingError> {
        let preset = ATTENUATION_PRESETS.get(index).ok_or(
            LightingError::UnknownAttenuationPreset {
                index,
                available: ATTENUATION_PRESETS.len(),
            },
        )?;
        self.attenuation.linear = preset.linear;
        self.attenuation.quadratic = preset.quadratic;
        Ok(())
    }

    /// Model matrix of the light's debug cube
    pub fn debug_transform(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position) * Matrix4::from_scale(DEBUG_CUBE_SCALE)
    }

    /// Flat material the light shader colors the debug cube with; `diffuse`
    /// carries the undimmed base color
    pub fn debug_material(&self) -> MaterialUniform {
        MaterialUniform {
            ambient: self.ambient.extend(1.0).into(),
            diffuse: self.color.extend(1.0).into(),
            specular: self.specular.extend(1.0).into(),
            ..Default::default()
        }
    }

    pub fn to_point_uniform(&self) -> PointLightUniform {
        PointLightUniform {
            position: self.position.extend(1.0).into(),
            ambient: self.ambient.extend(1.0).into(),
            diffuse: self.diffuse.extend(1.0).into(),
            specular: self.specular.extend(1.0).into(),
            constant: self.attenuation.constant,
            linear: self.attenuation.linear,
            quadratic: self.attenuation.quadratic,
            _padding: 0.0,
        }
    }

    pub fn to_dir_uniform(&self) -> DirLightUniform {
        DirLightUniform {
            direction: self.direction.extend(0.0).into(),
            ambient: self.ambient.extend(1.0).into(),
            diffuse: self.diffuse.extend(1.0).into(),
            specular: self.specular.extend(1.0).into(),
        }
    }

    /// Spot block placed at `position` looking along `direction`
    pub fn to_spot_uniform(
        &self,
        position: Vector3<f32>,
        direction: Vector3<f32>,
    ) -> SpotLightUniform {
        SpotLightUniform {
            position: position.extend(1.0).into(),
            direction: direction.extend(0.0).into(),
            ambient: self.ambient.extend(1.0).into(),
            diffuse: self.diffuse.extend(1.0).into(),
            specular: self.specular.extend(1.0).into(),
            constant: self.attenuation.constant,
            linear: self.attenuation.linear,
            quadratic: self.attenuation.quadratic,
            cutoff: self.cutoff,
            outer_cutoff: self.outer_cutoff,
            _padding: [0.0; 3],
        }
    }
}
