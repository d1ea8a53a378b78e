//! # Primitive Shape Generation
//!
//! All triangle meshes are emitted with outward normals and counter-clockwise
//! winding when viewed from outside.

use super::GeometryData;
use crate::error::GeometryError;
use std::f32::consts::PI;

/// Cube faces as (outward normal, u axis, v axis, color). `u x v == normal`
/// keeps every face counter-clockwise from the outside.
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3], [f32; 3]); 6] = [
    // Front (+Z), red
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    // Back (-Z), green
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0]),
    // Left (-X), blue
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
    // Right (+X), yellow
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]),
    // Bottom (-Y), cyan
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0]),
    // Top (+Y), magenta
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0, 1.0]),
];

/// Generate a unit cube centered at the origin
///
/// Vertices span -0.5..0.5 on every axis. Faces do not share vertices, so each
/// of the 24 vertices carries its face's normal, color and a 0..1 UV square.
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    for (face, (normal, u, v, color)) in CUBE_FACES.iter().enumerate() {
        for ((su, sv), uv) in corners.iter().zip(uvs) {
            let position = [0, 1, 2].map(|k| 0.5 * (normal[k] + su * u[k] + sv * v[k]));
            data.vertices.push(position);
            data.normals.push(*normal);
            data.colors.push(*color);
            data.tex_coords.push(uv);
        }

        let base = (face * 4) as u32;
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate a UV sphere centered at the origin
///
/// Stacks run from +90° (the +Z pole) to -90°, sectors from 0° to 360°. The
/// seam and pole vertices are duplicated so every vertex gets its own UV,
/// giving `(stacks + 1) * (sectors + 1)` vertices and
/// `sectors * (2 * stacks - 2)` triangles (the pole bands emit one triangle
/// per sector instead of two).
///
/// # Errors
/// [`GeometryError::InvalidParameter`] if `radius` is not positive or either
/// count is below 3.
pub fn generate_sphere(
    radius: f32,
    sectors: u32,
    stacks: u32,
) -> Result<GeometryData, GeometryError> {
    if radius.is_nan() || radius <= 0.0 {
        return Err(GeometryError::InvalidParameter(format!(
            "sphere radius must be positive, got {radius}"
        )));
    }
    if sectors < 3 || stacks < 3 {
        return Err(GeometryError::InvalidParameter(format!(
            "sphere needs at least 3 sectors and 3 stacks, got {sectors}x{stacks}"
        )));
    }

    let mut data = GeometryData::new();
    let sector_step = 2.0 * PI / sectors as f32;
    let stack_step = PI / stacks as f32;
    let inv_radius = 1.0 / radius;

    for i in 0..=stacks {
        let stack_angle = PI / 2.0 - i as f32 * stack_step;
        let xy = radius * stack_angle.cos();
        let z = radius * stack_angle.sin();

        for j in 0..=sectors {
            let sector_angle = j as f32 * sector_step;
            let x = xy * sector_angle.cos();
            let y = xy * sector_angle.sin();

            data.vertices.push([x, y, z]);
            data.normals.push([x * inv_radius, y * inv_radius, z * inv_radius]);
            data.colors.push([1.0, 1.0, 1.0]);
            data.tex_coords
                .push([j as f32 / sectors as f32, i as f32 / stacks as f32]);
        }
    }

    for i in 0..stacks {
        let mut k1 = i * (sectors + 1);
        let mut k2 = k1 + sectors + 1;

        for _ in 0..sectors {
            if i != 0 {
                data.indices.extend_from_slice(&[k1, k2, k1 + 1]);
            }
            if i != stacks - 1 {
                data.indices.extend_from_slice(&[k1 + 1, k2, k2 + 1]);
            }
            k1 += 1;
            k2 += 1;
        }
    }

    Ok(data)
}

/// Generate the three-axis gizmo as 6 unindexed line vertices
///
/// X is red, Y green, Z blue; each segment runs from the origin to `length`
/// along its axis.
pub fn generate_axes(length: f32) -> GeometryData {
    let mut data = GeometryData::new();
    let axes = [
        ([length, 0.0, 0.0], [1.0, 0.0, 0.0]),
        ([0.0, length, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, length], [0.0, 0.0, 1.0]),
    ];

    for (tip, color) in axes {
        data.vertices.push([0.0, 0.0, 0.0]);
        data.vertices.push(tip);
        data.colors.push(color);
        data.colors.push(color);
    }

    data
}

/// Generate the ground-grid quad on the XZ plane
///
/// The quad spans `-half_extent..half_extent` and its UVs span `0..tiles`, so
/// the grid shader can draw one cell per UV unit.
pub fn generate_grid(half_extent: f32, tiles: f32) -> GeometryData {
    let mut data = GeometryData::new();
    let h = half_extent;

    data.vertices = vec![[-h, 0.0, h], [h, 0.0, h], [h, 0.0, -h], [-h, 0.0, -h]];
    data.tex_coords = vec![[0.0, 0.0], [tiles, 0.0], [tiles, tiles], [0.0, tiles]];
    data.normals = vec![[0.0, 1.0, 0.0]; 4];
    data.colors = vec![[1.0, 1.0, 1.0]; 4];
    data.indices = vec![0, 1, 2, 2, 3, 0];

    data
}
