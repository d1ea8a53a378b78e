//! A [`RenderBackend`] without a GPU
//!
//! Records every submitted command per frame and hands out fake mesh and
//! texture handles. Used to drive the scene in tests and for offscreen runs
//! where no display is available.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::{
    error::{AssetError, RenderError, ShaderError},
    gfx::scene::vertex::VertexData,
};

use super::commands::{
    DrawCall, MeshHandle, ProgramKind, RenderBackend, RenderCommand, TextureHandle,
};

#[derive(Debug, Clone)]
pub struct MeshRecord {
    pub label: String,
    pub vertex_count: usize,
    pub index_count: usize,
    pub released: bool,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    meshes: Vec<MeshRecord>,
    textures: Vec<PathBuf>,
    texture_attempts: Vec<PathBuf>,
    current: Vec<RenderCommand>,
    frames: Vec<Vec<RenderCommand>>,
    reloads: Vec<ProgramKind>,
    broken_programs: HashSet<ProgramKind>,
    missing_textures: HashSet<PathBuf>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every reload of `program` fail to compile
    pub fn break_program(&mut self, program: ProgramKind) {
        self.broken_programs.insert(program);
    }

    pub fn fix_program(&mut self, program: ProgramKind) {
        self.broken_programs.remove(&program);
    }

    /// Makes loads of `path` fail as if the file could not be decoded
    pub fn fail_texture(&mut self, path: impl Into<PathBuf>) {
        self.missing_textures.insert(path.into());
    }

    pub fn meshes(&self) -> &[MeshRecord] {
        &self.meshes
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&MeshRecord> {
        self.meshes.get(handle.0 as usize)
    }

    pub fn live_mesh_count(&self) -> usize {
        self.meshes.iter().filter(|m| !m.released).count()
    }

    /// Paths of every texture load that succeeded, in order
    pub fn texture_loads(&self) -> &[PathBuf] {
        &self.textures
    }

    /// Paths of every texture load requested, failed ones included
    pub fn texture_attempts(&self) -> &[PathBuf] {
        &self.texture_attempts
    }

    /// Programs successfully reloaded, in order
    pub fn reloads(&self) -> &[ProgramKind] {
        &self.reloads
    }

    /// Commands submitted since the last present
    pub fn commands(&self) -> &[RenderCommand] {
        &self.current
    }

    pub fn frames(&self) -> &[Vec<RenderCommand>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[RenderCommand]> {
        self.frames.last().map(Vec::as_slice)
    }

    pub fn present_count(&self) -> usize {
        self.frames.len()
    }

    /// Draw calls submitted since the last present
    pub fn draws(&self) -> Vec<DrawCall> {
        draws_in(&self.current)
    }
}

/// Draw calls in a recorded command list
pub fn draws_in(commands: &[RenderCommand]) -> Vec<DrawCall> {
    commands
        .iter()
        .filter_map(|command| match command {
            RenderCommand::Draw(call) => Some(*call),
            _ => None,
        })
        .collect()
}

impl RenderBackend for HeadlessBackend {
    fn upload_mesh(
        &mut self,
        label: &str,
        vertices: VertexData<'_>,
        indices: &[u32],
    ) -> MeshHandle {
        self.meshes.push(MeshRecord {
            label: label.to_string(),
            vertex_count: vertices.len(),
            index_count: indices.len(),
            released: false,
        });
        MeshHandle(self.meshes.len() as u32 - 1)
    }

    fn release_mesh(&mut self, mesh: MeshHandle) -> Result<(), RenderError> {
        let record = self
            .meshes
            .get_mut(mesh.0 as usize)
            .ok_or(RenderError::UnknownMesh(mesh))?;
        if record.released {
            return Err(RenderError::ReleasedMesh(mesh));
        }
        record.released = true;
        Ok(())
    }

    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
        self.texture_attempts.push(path.to_path_buf());
        if self.missing_textures.contains(path) {
            return Err(AssetError::Texture {
                path: path.to_path_buf(),
                message: "no such file".to_string(),
            });
        }
        self.textures.push(path.to_path_buf());
        Ok(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn reload_program(&mut self, program: ProgramKind) -> Result<(), ShaderError> {
        if self.broken_programs.contains(&program) {
            return Err(ShaderError::Compile {
                program,
                message: "syntax error".to_string(),
            });
        }
        self.reloads.push(program);
        Ok(())
    }

    fn submit(&mut self, command: RenderCommand) -> Result<(), RenderError> {
        if let RenderCommand::Draw(call) = &command {
            match self.mesh(call.mesh) {
                None => return Err(RenderError::UnknownMesh(call.mesh)),
                Some(record) if record.released => {
                    return Err(RenderError::ReleasedMesh(call.mesh))
                }
                Some(_) => {}
            }
        }
        self.current.push(command);
        Ok(())
    }

    fn present(&mut self) {
        self.frames.push(std::mem::take(&mut self.current));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        resources::material::{InstanceUniform, MaterialUniform},
        scene::vertex::Vertex3D,
    };
    use cgmath::SquareMatrix;

    fn draw(mesh: MeshHandle) -> RenderCommand {
        RenderCommand::Draw(DrawCall {
            mesh,
            instance: InstanceUniform::new(
                cgmath::Matrix4::identity(),
                MaterialUniform::default(),
            ),
        })
    }

    #[test]
    fn test_draw_of_released_mesh_is_rejected() {
        let mut backend = HeadlessBackend::new();
        let vertices = [Vertex3D::default(); 3];
        let mesh = backend.upload_mesh("tri", VertexData::Lit(&vertices), &[0, 1, 2]);
        assert!(backend.submit(draw(mesh)).is_ok());
        backend.release_mesh(mesh).unwrap();
        assert_eq!(backend.submit(draw(mesh)), Err(RenderError::ReleasedMesh(mesh)));
        assert_eq!(backend.release_mesh(mesh), Err(RenderError::ReleasedMesh(mesh)));
        assert_eq!(
            backend.submit(draw(MeshHandle(9))),
            Err(RenderError::UnknownMesh(MeshHandle(9)))
        );
        assert_eq!(backend.commands().len(), 1);
    }

    #[test]
    fn test_present_closes_frame() {
        let mut backend = HeadlessBackend::new();
        backend.submit(RenderCommand::GuiOverlay).unwrap();
        backend.present();
        assert_eq!(backend.present_count(), 1);
        assert!(backend.commands().is_empty());
        assert_eq!(backend.last_frame(), Some(&[RenderCommand::GuiOverlay][..]));
    }

    #[test]
    fn test_failed_texture_loads_are_recorded() {
        let mut backend = HeadlessBackend::new();
        backend.fail_texture("missing.png");
        assert!(backend.load_texture(Path::new("missing.png")).is_err());
        assert_eq!(backend.load_texture(Path::new("ok.png")).unwrap(), TextureHandle(0));
        assert_eq!(backend.texture_loads(), &[PathBuf::from("ok.png")]);
        assert_eq!(
            backend.texture_attempts(),
            &[PathBuf::from("missing.png"), PathBuf::from("ok.png")]
        );
    }

    #[test]
    fn test_broken_program_fails_reload() {
        let mut backend = HeadlessBackend::new();
        backend.break_program(ProgramKind::Lit);
        assert!(backend.reload_program(ProgramKind::Lit).is_err());
        assert!(backend.reload_program(ProgramKind::Grid).is_ok());
        assert_eq!(backend.reloads(), &[ProgramKind::Grid]);
    }
}
