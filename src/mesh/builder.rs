//! Mesh construction from, and export to, attribute-indexed models.
//!
//! An [`ObjModel`] stores separate position/UV/normal arrays and a face-index
//! stream with one to three components per corner. This module resolves that
//! stream into dense [`Mesh`] vertices of a chosen format, and does the reverse
//! for export by interning each attribute into its own palette.
//!
//! Groups in a model are measured in face-index components, groups in a mesh
//! in corners; the conversion multiplies or divides by the format width,
//! [`Vertex::COMPONENTS`].

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use nalgebra::{Point3, Vector2, Vector3};

use super::container::{Mesh, Mode};
use super::group::{sort_groups, Group};
use super::vertex::{Vertex, VertexP, VertexPN, VertexPT, VertexPTN};
use crate::error::{MeshError, Result};
use crate::io::{ObjModel, VertexFormat};

/// A vertex format that can be assembled from a model's attribute arrays.
pub trait ModelVertex: Vertex + Sized {
    /// The model format this vertex type reads.
    const FORMAT: VertexFormat;

    /// Build a vertex from one corner's attribute indices.
    ///
    /// `corner` has exactly [`Vertex::COMPONENTS`] entries and `component` is
    /// the position of its first entry in the face stream, for error reports.
    fn resolve(model: &ObjModel, corner: &[u32], component: usize) -> Result<Self>;
}

fn fetch<T: Copy>(
    items: &[T],
    attribute: &'static str,
    index: u32,
    component: usize,
) -> Result<T> {
    items
        .get(index as usize)
        .copied()
        .ok_or(MeshError::InvalidFaceIndex {
            component,
            index,
            attribute,
            len: items.len(),
        })
}

fn position_at(model: &ObjModel, index: u32, component: usize) -> Result<Point3<f32>> {
    fetch(&model.positions, "position", index, component)
}

fn uv_at(model: &ObjModel, index: u32, component: usize) -> Result<Vector2<f32>> {
    fetch(&model.uvs, "uv", index, component)
}

fn normal_at(model: &ObjModel, index: u32, component: usize) -> Result<Vector3<f32>> {
    fetch(&model.normals, "normal", index, component)
}

impl ModelVertex for VertexP {
    const FORMAT: VertexFormat = VertexFormat::Position;

    fn resolve(model: &ObjModel, corner: &[u32], component: usize) -> Result<Self> {
        Ok(VertexP::new(position_at(model, corner[0], component)?))
    }
}

impl ModelVertex for VertexPT {
    const FORMAT: VertexFormat = VertexFormat::PositionUV;

    fn resolve(model: &ObjModel, corner: &[u32], component: usize) -> Result<Self> {
        Ok(VertexPT::new(
            position_at(model, corner[0], component)?,
            uv_at(model, corner[1], component + 1)?,
        ))
    }
}

impl ModelVertex for VertexPN {
    const FORMAT: VertexFormat = VertexFormat::PositionNormal;

    fn resolve(model: &ObjModel, corner: &[u32], component: usize) -> Result<Self> {
        Ok(VertexPN::new(
            position_at(model, corner[0], component)?,
            normal_at(model, corner[1], component + 1)?,
        ))
    }
}

impl ModelVertex for VertexPTN {
    const FORMAT: VertexFormat = VertexFormat::PositionUVNormal;

    fn resolve(model: &ObjModel, corner: &[u32], component: usize) -> Result<Self> {
        Ok(VertexPTN::new(
            position_at(model, corner[0], component)?,
            uv_at(model, corner[1], component + 1)?,
            normal_at(model, corner[2], component + 2)?,
        ))
    }
}

fn check_format<V: ModelVertex>(model: &ObjModel) -> Result<()> {
    let found = model.vertex_format();
    if found != V::FORMAT {
        return Err(MeshError::UnsupportedVertexFormat(found));
    }
    Ok(())
}

fn mesh_groups(groups: &[Group], width: u32) -> Vec<Group> {
    let mut groups: Vec<Group> = groups.iter().map(|g| g.divided(width)).collect();
    sort_groups(&mut groups);
    groups
}

/// Build a flat mesh, one vertex per corner of the model's face stream.
///
/// # Errors
///
/// [`MeshError::UnsupportedVertexFormat`] when the model's attributes do not
/// match `V`, and [`MeshError::InvalidFaceIndex`] for indices past the end of
/// an attribute array.
pub fn mesh_from_model<V: ModelVertex>(model: &ObjModel) -> Result<Mesh<V>> {
    check_format::<V>(model)?;
    let width = V::COMPONENTS as usize;

    let vertices = model
        .face_indices
        .chunks_exact(width)
        .enumerate()
        .map(|(corner, indices)| V::resolve(model, indices, corner * width))
        .collect::<Result<Vec<V>>>()?;

    let mut mesh = Mesh::from_vertices(vertices);
    mesh.geometry_groups = mesh_groups(&model.geometry_groups, V::COMPONENTS);
    mesh.material_groups = mesh_groups(&model.material_groups, V::COMPONENTS);
    mesh.materials = model.materials.clone();
    Ok(mesh)
}

/// Build an indexed mesh directly from the model's attribute indices.
///
/// Corners with identical index tuples share a palette entry; no geometric
/// comparison is made. For position-only models the position array itself is
/// the palette and the face stream is used unchanged.
///
/// # Errors
///
/// As for [`mesh_from_model`].
pub fn indexed_mesh_from_model<V: ModelVertex>(model: &ObjModel) -> Result<Mesh<V>> {
    check_format::<V>(model)?;
    let width = V::COMPONENTS as usize;

    let mut mesh = Mesh::new();
    if width == 1 {
        mesh.vertices = (0..model.positions.len() as u32)
            .map(|i| V::resolve(model, &[i], 0))
            .collect::<Result<Vec<V>>>()?;
        let len = model.positions.len();
        if let Some(component) = model.face_indices.iter().position(|&i| i as usize >= len) {
            return Err(MeshError::InvalidFaceIndex {
                component,
                index: model.face_indices[component],
                attribute: "position",
                len,
            });
        }
        mesh.indices = model.face_indices.clone();
    } else {
        let mut seen: HashMap<&[u32], u32> = HashMap::new();
        mesh.indices.reserve(model.face_indices.len() / width);
        for (corner, key) in model.face_indices.chunks_exact(width).enumerate() {
            let index = match seen.entry(key) {
                Entry::Occupied(e) => *e.get(),
                Entry::Vacant(e) => {
                    let index = mesh.vertices.len() as u32;
                    mesh.vertices.push(V::resolve(model, key, corner * width)?);
                    *e.insert(index)
                }
            };
            mesh.indices.push(index);
        }
    }

    mesh.geometry_groups = mesh_groups(&model.geometry_groups, V::COMPONENTS);
    mesh.material_groups = mesh_groups(&model.material_groups, V::COMPONENTS);
    mesh.materials = model.materials.clone();
    Ok(mesh)
}

/// Interns attribute values by exact bit pattern, in order of discovery.
struct Interner<const N: usize> {
    slots: HashMap<[u32; N], u32>,
}

impl<const N: usize> Interner<N> {
    fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Returns the slot for `value` and whether it was newly created.
    fn intern(&mut self, value: [f32; N]) -> (u32, bool) {
        // Adding zero folds -0.0 into 0.0 so the two share a slot.
        let key = value.map(|x| (x + 0.0).to_bits());
        let next = self.slots.len() as u32;
        match self.slots.entry(key) {
            Entry::Occupied(e) => (*e.get(), false),
            Entry::Vacant(e) => (*e.insert(next), true),
        }
    }
}

/// Export a flat mesh as a model with separately indexed attributes.
///
/// Each distinct position, UV and normal is written once, in order of first
/// use. Groups are scaled from corners to face-index components.
///
/// # Errors
///
/// [`MeshError::InvalidMode`] if the mesh is indexed.
pub fn model_from_mesh<V: ModelVertex>(mesh: &Mesh<V>) -> Result<ObjModel> {
    if !mesh.is_flat() {
        return Err(MeshError::invalid_mode("export", Mode::Flat, Mode::Indexed));
    }

    let mut model = ObjModel::new();
    let width = V::COMPONENTS as usize;
    model.face_indices.reserve(mesh.vertices().len() * width);

    let mut positions = Interner::<3>::new();
    let mut uvs = Interner::<2>::new();
    let mut normals = Interner::<3>::new();

    for v in mesh.vertices() {
        let p = v.position();
        let (slot, fresh) = positions.intern([p.x, p.y, p.z]);
        if fresh {
            model.positions.push(p);
        }
        model.face_indices.push(slot);

        if let Some(t) = v.uv() {
            let (slot, fresh) = uvs.intern([t.x, t.y]);
            if fresh {
                model.uvs.push(t);
            }
            model.face_indices.push(slot);
        }

        if let Some(n) = v.normal() {
            let (slot, fresh) = normals.intern([n.x, n.y, n.z]);
            if fresh {
                model.normals.push(n);
            }
            model.face_indices.push(slot);
        }
    }

    model.geometry_groups = mesh
        .geometry_groups()
        .iter()
        .map(|g| g.scaled(V::COMPONENTS))
        .collect();
    model.material_groups = mesh
        .material_groups()
        .iter()
        .map(|g| g.scaled(V::COMPONENTS))
        .collect();
    model.materials = mesh.materials().clone();
    Ok(model)
}

/// A mesh of whichever vertex format a model turned out to have.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyMesh {
    /// Position-only mesh.
    P(Mesh<VertexP>),
    /// Position and UV mesh.
    PT(Mesh<VertexPT>),
    /// Position and normal mesh.
    PN(Mesh<VertexPN>),
    /// Position, UV and normal mesh.
    PTN(Mesh<VertexPTN>),
}

impl AnyMesh {
    /// Build a flat mesh matching the model's vertex format.
    ///
    /// # Errors
    ///
    /// [`MeshError::UnsupportedVertexFormat`] for a model without positions,
    /// plus anything [`mesh_from_model`] reports.
    pub fn from_model(model: &ObjModel) -> Result<Self> {
        Ok(match model.vertex_format() {
            VertexFormat::Position => AnyMesh::P(mesh_from_model(model)?),
            VertexFormat::PositionUV => AnyMesh::PT(mesh_from_model(model)?),
            VertexFormat::PositionNormal => AnyMesh::PN(mesh_from_model(model)?),
            VertexFormat::PositionUVNormal => AnyMesh::PTN(mesh_from_model(model)?),
            VertexFormat::None => return Err(MeshError::UnsupportedVertexFormat(VertexFormat::None)),
        })
    }

    /// The vertex format of the wrapped mesh.
    pub fn vertex_format(&self) -> VertexFormat {
        match self {
            AnyMesh::P(_) => VertexFormat::Position,
            AnyMesh::PT(_) => VertexFormat::PositionUV,
            AnyMesh::PN(_) => VertexFormat::PositionNormal,
            AnyMesh::PTN(_) => VertexFormat::PositionUVNormal,
        }
    }

    /// Export the wrapped mesh.
    ///
    /// # Errors
    ///
    /// As for [`model_from_mesh`].
    pub fn to_model(&self) -> Result<ObjModel> {
        match self {
            AnyMesh::P(m) => model_from_mesh(m),
            AnyMesh::PT(m) => model_from_mesh(m),
            AnyMesh::PN(m) => model_from_mesh(m),
            AnyMesh::PTN(m) => model_from_mesh(m),
        }
    }
}
