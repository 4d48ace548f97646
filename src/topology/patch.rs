//! Named boundary patches.
//!
//! A patch is a list of block faces, each given by the point indices that
//! define it (2 in 2D, 4 in 3D). Faces are only checked against the block
//! topology when the mesh is built.

use serde::Serialize;

use crate::mesh_error::{MeshGenError, Result};

/// Face reference by its defining point indices.
pub type Face = Vec<usize>;

/// A named group of block faces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Patch {
    name: String,
    faces: Vec<Face>,
}

impl Patch {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Positional access for incremental population.
    pub fn faces_mut(&mut self) -> &mut [Face] {
        &mut self.faces
    }
}

/// Registry of patches keyed by unique name, kept in creation order.
#[derive(Clone, Debug, Serialize)]
pub struct PatchRegistry {
    dimension: usize,
    patches: Vec<Patch>,
}

impl PatchRegistry {
    /// Create an empty registry for faces of a `dimension`-D topology.
    pub fn new(dimension: usize) -> Result<Self> {
        crate::topology::point_set::check_dimension(dimension)?;
        Ok(Self {
            dimension,
            patches: Vec::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Points per face: 2 in 2D, 4 in 3D.
    pub fn points_per_face(&self) -> usize {
        1 << (self.dimension - 1)
    }

    /// Register a patch from an explicit face list.
    pub fn create_patch<F>(&mut self, name: &str, faces: &[F]) -> Result<&mut Patch>
    where
        F: AsRef<[usize]>,
    {
        self.check_free(name)?;
        let per_face = self.points_per_face();
        for (idx, face) in faces.iter().enumerate() {
            let face = face.as_ref();
            if face.len() != per_face {
                return Err(MeshGenError::arity(
                    format!("face {idx} of patch `{name}`"),
                    per_face,
                    face.len(),
                ));
            }
        }
        Ok(self.push(Patch {
            name: name.to_string(),
            faces: faces.iter().map(|f| f.as_ref().to_vec()).collect(),
        }))
    }

    /// Register a patch with `nb_faces` empty faces to be filled positionally.
    ///
    /// Every face starts as `points_per_face()` zeros.
    pub fn create_patch_by_face_count(&mut self, name: &str, nb_faces: usize) -> Result<&mut [Face]> {
        self.check_free(name)?;
        let per_face = self.points_per_face();
        let patch = self.push(Patch {
            name: name.to_string(),
            faces: vec![vec![0; per_face]; nb_faces],
        });
        Ok(patch.faces_mut())
    }

    pub fn patch(&self, name: &str) -> Option<&Patch> {
        self.patches.iter().find(|p| p.name == name)
    }

    pub fn patch_mut(&mut self, name: &str) -> Option<&mut Patch> {
        self.patches.iter_mut().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.patch(name).is_some()
    }

    /// Iterate patches in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Patch> + '_ {
        self.patches.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.patches.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn rename_patch(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        self.check_free(to)?;
        let patch = self
            .patch_mut(from)
            .ok_or_else(|| MeshGenError::UnknownPatch(from.to_string()))?;
        patch.name = to.to_string();
        Ok(())
    }

    pub fn remove_patch(&mut self, name: &str) -> Result<Patch> {
        let pos = self
            .patches
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| MeshGenError::UnknownPatch(name.to_string()))?;
        Ok(self.patches.remove(pos))
    }

    /// Replace the face list of an existing patch without re-validating names.
    pub(crate) fn replace_faces(&mut self, name: &str, faces: Vec<Face>) -> Result<()> {
        let patch = self
            .patch_mut(name)
            .ok_or_else(|| MeshGenError::UnknownPatch(name.to_string()))?;
        patch.faces = faces;
        Ok(())
    }

    fn check_free(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(MeshGenError::DuplicatePatchName(name.to_string()));
        }
        Ok(())
    }

    fn push(&mut self, patch: Patch) -> &mut Patch {
        self.patches.push(patch);
        let last = self.patches.len() - 1;
        &mut self.patches[last]
    }
}
