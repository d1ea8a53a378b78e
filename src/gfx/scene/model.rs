//! Imported OBJ models
//!
//! [`import_obj`] flattens a file into [`ImportedMesh`]es with their texture
//! references resolved to paths. [`Model::from_imported`] uploads them and
//! loads each distinct texture path once.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use cgmath::{InnerSpace, Matrix4, Vector3};

use crate::{
    error::{AssetError, RenderError},
    gfx::{
        rendering::commands::{
            DrawCall, MeshHandle, RenderBackend, RenderCommand, TextureBinding, TextureHandle,
        },
        resources::material::{InstanceUniform, Material, MaterialMaps, TextureRole},
        scene::{object::LitObject, state::FrameContext, vertex::{Vertex3D, VertexData}},
    },
};

/// One sub-mesh of an imported asset
#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
    pub name: String,
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
    /// Texture files in declaration order, tagged by role
    pub textures: Vec<(TextureRole, PathBuf)>,
    /// Diffuse color from the material library, if any
    pub base_color: Option<[f32; 3]>,
}

/// Averages the face normals around each vertex
pub fn averaged_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let (Some(&p0), Some(&p1), Some(&p2)) =
            (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        let (p0, p1, p2) = (Vector3::from(p0), Vector3::from(p1), Vector3::from(p2));
        let face = (p1 - p0).cross(p2 - p0);
        for index in [a, b, c] {
            sums[index] += face;
        }
    }
    sums.into_iter()
        .map(|sum| {
            if sum.magnitude2() > 0.0 {
                sum.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

fn material_textures(material: &tobj::Material, base: &Path) -> Vec<(TextureRole, PathBuf)> {
    let mut textures = Vec::new();
    let named = [
        (TextureRole::Diffuse, material.diffuse_texture.as_ref()),
        (TextureRole::Specular, material.specular_texture.as_ref()),
        (TextureRole::Normal, material.normal_texture.as_ref()),
        (
            TextureRole::Height,
            material
                .unknown_param
                .get("disp")
                .or_else(|| material.unknown_param.get("map_disp")),
        ),
    ];
    for (role, file) in named {
        if let Some(file) = file.filter(|f| !f.trim().is_empty()) {
            textures.push((role, base.join(file.trim())));
        }
    }
    textures
}

/// Loads an OBJ file (and its MTL library, if any) as triangulated sub-meshes
pub fn import_obj(path: &Path) -> Result<Vec<ImportedMesh>, AssetError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|err| AssetError::Import {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let materials = materials.unwrap_or_else(|err| {
        log::warn!("No material library for {}: {err}", path.display());
        Vec::new()
    });
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let meshes = models
        .into_iter()
        .map(|model| {
            let mesh = model.mesh;
            let positions: Vec<[f32; 3]> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();
            let normals: Vec<[f32; 3]> = if mesh.normals.len() == mesh.positions.len() {
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| [n[0], n[1], n[2]])
                    .collect()
            } else {
                averaged_normals(&positions, &mesh.indices)
            };

            let vertices = positions
                .iter()
                .enumerate()
                .map(|(i, &position)| Vertex3D {
                    position,
                    color: [1.0, 1.0, 1.0],
                    tex_coords: mesh
                        .texcoords
                        .get(i * 2..i * 2 + 2)
                        .map_or([0.0, 0.0], |uv| [uv[0], uv[1]]),
                    normal: normals[i],
                })
                .collect();

            let material = mesh.material_id.and_then(|id| materials.get(id));
            ImportedMesh {
                name: model.name,
                vertices,
                indices: mesh.indices,
                textures: material.map(|m| material_textures(m, base)).unwrap_or_default(),
                base_color: material.and_then(|m| m.diffuse),
            }
        })
        .collect();

    Ok(meshes)
}

struct ModelMesh {
    mesh: MeshHandle,
    textures: Vec<TextureBinding>,
    material: Material,
    maps: MaterialMaps,
}

/// An imported asset drawn once per sub-mesh with a shared model transform
pub struct Model {
    name: String,
    meshes: Vec<ModelMesh>,
    /// Every texture path seen so far; `None` remembers a failed load
    texture_cache: HashMap<PathBuf, Option<TextureHandle>>,
    transform: Matrix4<f32>,
}

impl Model {
    pub fn load(
        backend: &mut dyn RenderBackend,
        path: &Path,
        scale: f32,
    ) -> Result<Self, AssetError> {
        let imported = import_obj(path)?;
        let name = path
            .file_stem()
            .map_or_else(|| "model".to_string(), |s| s.to_string_lossy().into_owned());
        let model = Self::from_imported(backend, &name, imported, scale);
        log::info!(
            "Loaded model {} ({} meshes, {} textures)",
            path.display(),
            model.meshes.len(),
            model.texture_count()
        );
        Ok(model)
    }

    pub fn from_imported(
        backend: &mut dyn RenderBackend,
        name: &str,
        imported: Vec<ImportedMesh>,
        scale: f32,
    ) -> Self {
        let mut model = Self {
            name: name.to_string(),
            meshes: Vec::with_capacity(imported.len()),
            texture_cache: HashMap::new(),
            transform: Matrix4::from_scale(scale),
        };

        for sub_mesh in imported {
            let mesh = backend.upload_mesh(
                &sub_mesh.name,
                VertexData::Lit(&sub_mesh.vertices),
                &sub_mesh.indices,
            );

            let mut counters: HashMap<TextureRole, u32> = HashMap::new();
            let mut textures = Vec::new();
            let mut maps = MaterialMaps::default();
            for (role, path) in &sub_mesh.textures {
                let Some(texture) = model.resolve_texture(backend, path) else {
                    continue;
                };
                let counter = counters.entry(*role).or_insert(0);
                *counter += 1;
                let unit = textures.len() as u32;
                textures.push(TextureBinding::numbered(unit, *role, *counter, texture));
                match role {
                    TextureRole::Diffuse => maps.diffuse = true,
                    TextureRole::Specular => maps.specular = true,
                    _ => {}
                }
            }

            let color = sub_mesh.base_color.map_or(Vector3::new(1.0, 1.0, 1.0), Vector3::from);
            model.meshes.push(ModelMesh {
                mesh,
                textures,
                material: Material::from_color(
                    color,
                    Vector3::new(0.5, 0.5, 0.5),
                    Material::default().shininess,
                ),
                maps,
            });
        }

        model
    }

    /// Looks `path` up in the cache before touching the backend
    fn resolve_texture(
        &mut self,
        backend: &mut dyn RenderBackend,
        path: &Path,
    ) -> Option<TextureHandle> {
        if let Some(cached) = self.texture_cache.get(path) {
            return *cached;
        }
        let loaded = match backend.load_texture(path) {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::warn!("{err}; mesh keeps its flat color");
                None
            }
        };
        self.texture_cache.insert(path.to_path_buf(), loaded);
        loaded
    }

    /// Number of distinct textures successfully loaded
    pub fn texture_count(&self) -> usize {
        self.texture_cache.values().filter(|t| t.is_some()).count()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn set_transform(&mut self, transform: Matrix4<f32>) {
        self.transform = transform;
    }
}

impl LitObject for Model {
    fn name(&self) -> &str {
        &self.name
    }

    fn debug_anchor(&self, _ctx: &FrameContext<'_>) -> Matrix4<f32> {
        self.transform
    }

    fn set_shininess(&mut self, shininess: f32) {
        for mesh in &mut self.meshes {
            mesh.material.shininess = shininess;
        }
    }

    fn meshes(&self) -> Vec<MeshHandle> {
        self.meshes.iter().map(|m| m.mesh).collect()
    }

    fn upload_transforms_and_draw(
        &self,
        _ctx: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        for mesh in &self.meshes {
            for binding in &mesh.textures {
                backend.submit(RenderCommand::BindTexture(binding.clone()))?;
            }
            backend.submit(RenderCommand::Draw(DrawCall {
                mesh: mesh.mesh,
                instance: InstanceUniform::new(self.transform, mesh.material.to_uniform(mesh.maps)),
            }))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::headless::HeadlessBackend;

    const OBJ: &str = "mtllib quad.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
o first
usemtl panel
f 1/1 2/2 3/3 4/4
o second
usemtl panel
f 1/1 2/2 3/3
";

    const MTL: &str = "newmtl panel
Kd 1.0 0.0 0.0
map_Kd panel_diffuse.png
map_Ks panel_specular.png
disp panel_height.png
";

    fn write_asset(dir: &Path) -> PathBuf {
        std::fs::write(dir.join("quad.mtl"), MTL).unwrap();
        let obj = dir.join("quad.obj");
        std::fs::write(&obj, OBJ).unwrap();
        obj
    }

    #[test]
    fn test_import_triangulates_and_computes_normals() {
        let dir = tempfile::tempdir().unwrap();
        let meshes = import_obj(&write_asset(dir.path())).unwrap();

        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].indices.len(), 6);
        for vertex in &meshes[0].vertices {
            let normal = Vector3::from(vertex.normal);
            assert!((normal - Vector3::new(0.0, 0.0, 1.0)).magnitude() < 1e-5);
        }
        assert_eq!(meshes[0].base_color, Some([1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_import_resolves_texture_roles() {
        let dir = tempfile::tempdir().unwrap();
        let meshes = import_obj(&write_asset(dir.path())).unwrap();

        let roles: Vec<_> = meshes[0].textures.iter().map(|(role, _)| *role).collect();
        assert_eq!(roles, vec![TextureRole::Diffuse, TextureRole::Specular, TextureRole::Height]);
        assert_eq!(meshes[0].textures[0].1, dir.path().join("panel_diffuse.png"));
    }

    #[test]
    fn test_missing_file_is_import_error() {
        let result = import_obj(Path::new("/nonexistent/model.obj"));
        assert!(matches!(result, Err(AssetError::Import { .. })));
    }

    #[test]
    fn test_shared_textures_load_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = HeadlessBackend::new();
        let model = Model::load(&mut backend, &write_asset(dir.path()), 1.0).unwrap();

        assert_eq!(model.mesh_count(), 2);
        assert_eq!(backend.texture_loads().len(), 3);
        assert_eq!(model.texture_count(), 3);
    }

    fn textured_mesh(textures: Vec<(TextureRole, PathBuf)>) -> ImportedMesh {
        ImportedMesh {
            name: "mesh".to_string(),
            vertices: vec![Vertex3D::default(); 3],
            indices: vec![0, 1, 2],
            textures,
            base_color: None,
        }
    }

    #[test]
    fn test_numbered_bindings_per_role() {
        let mut backend = HeadlessBackend::new();
        let model = Model::from_imported(
            &mut backend,
            "numbered",
            vec![textured_mesh(vec![
                (TextureRole::Diffuse, PathBuf::from("a.png")),
                (TextureRole::Diffuse, PathBuf::from("b.png")),
                (TextureRole::Specular, PathBuf::from("c.png")),
            ])],
            1.0,
        );
        let names: Vec<_> = model.meshes[0]
            .textures
            .iter()
            .map(|t| (t.unit, t.name.clone()))
            .collect();
        assert_eq!(
            names,
            vec![
                (0, "texture_diffuse1".to_string()),
                (1, "texture_diffuse2".to_string()),
                (2, "texture_specular1".to_string()),
            ]
        );
    }

    #[test]
    fn test_failed_texture_is_skipped_and_not_retried() {
        let mut backend = HeadlessBackend::new();
        backend.fail_texture("broken.png");
        let model = Model::from_imported(
            &mut backend,
            "broken",
            vec![
                textured_mesh(vec![(TextureRole::Diffuse, PathBuf::from("broken.png"))]),
                textured_mesh(vec![(TextureRole::Diffuse, PathBuf::from("broken.png"))]),
            ],
            1.0,
        );
        assert!(model.meshes.iter().all(|m| m.textures.is_empty() && !m.maps.diffuse));
        assert_eq!(model.texture_count(), 0);
        // The cache remembers the failure, so the second mesh does not ask again.
        assert_eq!(backend.texture_attempts(), &[PathBuf::from("broken.png")]);
    }

    #[test]
    fn test_averaged_normals_of_fold() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        // Triangle in XY (normal +Z) and triangle in XZ (normal -Y) sharing an edge.
        let normals = averaged_normals(&positions, &[0, 1, 2, 0, 1, 3]);
        let shared = Vector3::from(normals[0]);
        assert!((shared.magnitude() - 1.0).abs() < 1e-5);
        assert!(shared.x.abs() < 1e-5);
        assert!((shared.y + shared.z).abs() < 1e-5);
        assert_eq!(normals[2], [0.0, 0.0, 1.0]);
    }
}
