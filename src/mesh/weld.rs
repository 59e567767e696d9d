//! Conversion between flat and indexed meshes.
//!
//! [`indexed_mesh_from_mesh`] welds approximately equal vertices of a flat mesh
//! into a shared palette; [`mesh_from_indexed_mesh`] expands an indexed mesh
//! back into a per-corner vertex stream.
//!
//! # Welding with the kd-tree
//!
//! The default [`WeldMethod::KdTree`] grows a binary tree over vertex
//! positions one corner at a time. Each node holds the first vertex that
//! reached it (its *canonical* vertex) and splits on one position axis, cycling
//! x, y, z by depth. A new vertex is compared against the canonical vertex of
//! each node on its path; it welds to the first one it equals, otherwise it
//! descends by comparing its coordinate against the node's split value, and
//! becomes a new palette entry when it reaches an empty node.
//!
//! Only the nodes on that path are ever compared. Two vertices within
//! [`EPSILON`](super::EPSILON) of each other can end up unmerged when they fall
//! on opposite sides of a split, or when they differ in UV or normal and the
//! first is stored deeper than the split where the second turns away. The
//! output is still fully determined by the input order, which is what
//! round-tripping relies on.
//!
//! [`WeldMethod::Scan`] compares each vertex against every palette entry
//! instead. It finds a match whenever the palette holds one, at quadratic
//! cost.

use super::container::{Mesh, Mode};
use super::vertex::Vertex;
use crate::error::{MeshError, Result};

/// Strategy used to find an existing palette entry for a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeldMethod {
    /// Incremental kd-tree; compares only along the routing path.
    #[default]
    KdTree,
    /// Linear scan over the whole palette.
    Scan,
}

/// Options for [`indexed_mesh_with_options`].
#[derive(Debug, Clone, Default)]
pub struct WeldOptions {
    /// How palette candidates are found.
    pub method: WeldMethod,
}

impl WeldOptions {
    /// Use the given weld method.
    pub fn with_method(mut self, method: WeldMethod) -> Self {
        self.method = method;
        self
    }
}

const NO_CHILD: u32 = u32::MAX;

/// One node of the arena-backed tree. Nodes are only created when a vertex
/// lands on them, so every node has a canonical vertex.
#[derive(Debug, Clone, Copy)]
struct KdNode {
    axis: u8,
    split: f32,
    /// Palette slot of the canonical vertex.
    index: u32,
    left: u32,
    right: u32,
}

/// Incremental kd-tree over palette vertices.
///
/// Children are referenced by position in `nodes`; the whole tree is freed at
/// once when it is dropped.
#[derive(Debug)]
struct KdTree {
    nodes: Vec<KdNode>,
}

impl KdTree {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    fn push_node<V: Vertex>(&mut self, axis: u8, vertex: &V, index: u32) -> u32 {
        self.nodes.push(KdNode {
            axis,
            split: vertex.position()[axis as usize],
            index,
            left: NO_CHILD,
            right: NO_CHILD,
        });
        (self.nodes.len() - 1) as u32
    }

    /// Find the palette slot for `vertex`, appending it to `palette` if no node
    /// on its path holds an equal vertex.
    fn insert<V: Vertex>(&mut self, vertex: &V, palette: &mut Vec<V>) -> u32 {
        if self.nodes.is_empty() {
            let index = push_palette(palette, vertex);
            self.push_node(0, vertex, index);
            return index;
        }

        let mut current = 0usize;
        loop {
            let node = self.nodes[current];
            if palette[node.index as usize].approx_eq(vertex) {
                return node.index;
            }

            let d = node.split - vertex.position()[node.axis as usize];
            let child = if d < 0.0 { node.left } else { node.right };
            if child != NO_CHILD {
                current = child as usize;
                continue;
            }

            let index = push_palette(palette, vertex);
            let created = self.push_node((node.axis + 1) % 3, vertex, index);
            if d < 0.0 {
                self.nodes[current].left = created;
            } else {
                self.nodes[current].right = created;
            }
            return index;
        }
    }
}

fn push_palette<V: Vertex>(palette: &mut Vec<V>, vertex: &V) -> u32 {
    palette.push(vertex.clone());
    (palette.len() - 1) as u32
}

fn weld_kd_tree<V: Vertex>(corners: &[V]) -> (Vec<V>, Vec<u32>) {
    let mut tree = KdTree::with_capacity(corners.len());
    let mut palette = Vec::new();
    let indices = corners
        .iter()
        .map(|v| tree.insert(v, &mut palette))
        .collect();
    (palette, indices)
}

fn weld_scan<V: Vertex>(corners: &[V]) -> (Vec<V>, Vec<u32>) {
    let mut palette: Vec<V> = Vec::new();
    let indices = corners
        .iter()
        .map(|v| match palette.iter().position(|p| p.approx_eq(v)) {
            Some(i) => i as u32,
            None => push_palette(&mut palette, v),
        })
        .collect();
    (palette, indices)
}

/// Weld a flat mesh into an indexed one using the default kd-tree method.
///
/// The palette lists unique vertices in order of first appearance and the
/// index array has one entry per input corner. Groups and materials are
/// carried over unchanged since corners are preserved one to one.
///
/// # Errors
///
/// [`MeshError::InvalidMode`] if the mesh is already indexed.
///
/// # Example
///
/// ```
/// use lap::mesh::{indexed_mesh_from_mesh, Mesh, VertexP};
///
/// let corners = vec![
///     VertexP::from_coords(0.0, 0.0, 0.0),
///     VertexP::from_coords(1.0, 0.0, 0.0),
///     VertexP::from_coords(0.0, 1.0, 0.0),
///     VertexP::from_coords(0.0, 1.0, 0.0),
///     VertexP::from_coords(1.0, 0.0, 0.0),
///     VertexP::from_coords(1.0, 1.0, 0.0),
/// ];
/// let indexed = indexed_mesh_from_mesh(&Mesh::from_vertices(corners)).unwrap();
/// assert_eq!(indexed.vertices().len(), 4);
/// assert_eq!(indexed.indices(), &[0, 1, 2, 2, 1, 3]);
/// ```
pub fn indexed_mesh_from_mesh<V: Vertex>(flat: &Mesh<V>) -> Result<Mesh<V>> {
    indexed_mesh_with_options(flat, &WeldOptions::default())
}

/// Weld a flat mesh into an indexed one with the given options.
///
/// # Errors
///
/// [`MeshError::InvalidMode`] if the mesh is already indexed.
pub fn indexed_mesh_with_options<V: Vertex>(
    flat: &Mesh<V>,
    options: &WeldOptions,
) -> Result<Mesh<V>> {
    if !flat.is_flat() {
        return Err(MeshError::invalid_mode("indexing", Mode::Flat, Mode::Indexed));
    }

    let (palette, indices) = match options.method {
        WeldMethod::KdTree => weld_kd_tree(flat.vertices()),
        WeldMethod::Scan => weld_scan(flat.vertices()),
    };

    log::debug!(
        "welded {} corners into {} vertices ({:?})",
        indices.len(),
        palette.len(),
        options.method
    );

    let mut mesh = flat.with_same_meta();
    mesh.vertices = palette;
    mesh.indices = indices;
    Ok(mesh)
}

/// Expand an indexed mesh into a flat per-corner vertex stream.
///
/// This undoes [`indexed_mesh_from_mesh`] up to welding: corners that were
/// merged come back as copies of their canonical vertex.
///
/// # Errors
///
/// [`MeshError::InvalidMode`] if the mesh is flat, and
/// [`MeshError::IndexOutOfRange`] if an index does not name a palette entry.
pub fn mesh_from_indexed_mesh<V: Vertex>(indexed: &Mesh<V>) -> Result<Mesh<V>> {
    if indexed.is_flat() {
        return Err(MeshError::invalid_mode("unindexing", Mode::Indexed, Mode::Flat));
    }

    let palette = indexed.vertices();
    let vertices = indexed
        .indices()
        .iter()
        .enumerate()
        .map(|(corner, &index)| {
            palette
                .get(index as usize)
                .cloned()
                .ok_or(MeshError::IndexOutOfRange {
                    corner,
                    index,
                    len: palette.len(),
                })
        })
        .collect::<Result<Vec<V>>>()?;

    let mut mesh = indexed.with_same_meta();
    mesh.vertices = vertices;
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Group, Material, VertexP, VertexPN};
    use nalgebra::{Point3, Vector3};

    fn p(x: f32, y: f32, z: f32) -> VertexP {
        VertexP::from_coords(x, y, z)
    }

    #[test]
    fn test_two_triangles_sharing_one_vertex() {
        let mesh = Mesh::from_vertices(vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.0, 0.0, 0.0001),
            p(2.0, 0.0, 0.0),
            p(0.0, 2.0, 0.0),
        ]);
        let indexed = indexed_mesh_from_mesh(&mesh).unwrap();

        assert_eq!(indexed.vertices().len(), 5);
        assert_eq!(indexed.indices(), &[0, 1, 2, 0, 3, 4]);
        // The canonical vertex is the first one seen.
        assert_eq!(indexed.vertices()[0], p(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_roundtrip_distinct_vertices() {
        let corners: Vec<VertexP> = (0..30)
            .map(|i| p(i as f32, (i * 7 % 5) as f32, (i * 3 % 11) as f32))
            .collect();
        let mesh = Mesh::from_vertices(corners.clone());
        let indexed = indexed_mesh_from_mesh(&mesh).unwrap();
        assert_eq!(indexed.vertices().len(), corners.len());

        let flat = mesh_from_indexed_mesh(&indexed).unwrap();
        assert_eq!(flat.vertices(), corners.as_slice());
    }

    #[test]
    fn test_meta_is_carried_over() {
        let mesh = Mesh::from_vertices(vec![p(0.0, 0.0, 0.0); 6])
            .with_geometry_groups(vec![Group::new("part", 0, 6)])
            .with_material_groups(vec![Group::new("m", 0, 3), Group::new("n", 3, 3)])
            .with_material(Material::new("m"));
        let indexed = indexed_mesh_from_mesh(&mesh).unwrap();

        assert_eq!(indexed.vertices().len(), 1);
        assert_eq!(indexed.indices(), &[0; 6]);
        assert_eq!(indexed.geometry_groups(), mesh.geometry_groups());
        assert_eq!(indexed.material_groups(), mesh.material_groups());
        assert_eq!(indexed.materials(), mesh.materials());

        let flat = mesh_from_indexed_mesh(&indexed).unwrap();
        assert_eq!(flat.material_groups(), mesh.material_groups());
        assert_eq!(flat.vertices().len(), 6);
    }

    #[test]
    fn test_split_straddle_is_not_merged() {
        // The root splits x at 0.0. The second vertex lies 0.0003 to the left
        // of the third, so they route into different subtrees even though
        // they are within tolerance of each other.
        let mesh = Mesh::from_vertices(vec![
            p(0.0, 5.0, 0.0),
            p(-0.00015, 0.0, 0.0),
            p(0.00015, 0.0, 0.0),
        ]);
        let kd = indexed_mesh_from_mesh(&mesh).unwrap();
        assert_eq!(kd.vertices().len(), 3);

        let scan =
            indexed_mesh_with_options(&mesh, &WeldOptions::default().with_method(WeldMethod::Scan))
                .unwrap();
        assert_eq!(scan.vertices().len(), 2);
        assert_eq!(scan.indices(), &[0, 1, 1]);
    }

    #[test]
    fn test_attributes_keep_vertices_apart() {
        let pos = Point3::new(1.0, 1.0, 1.0);
        let mesh = Mesh::from_vertices(vec![
            VertexPN::new(pos, Vector3::new(0.0, 0.0, 1.0)),
            VertexPN::new(pos, Vector3::new(0.0, 1.0, 0.0)),
            VertexPN::new(pos, Vector3::new(0.0, 0.0, 1.0)),
        ]);
        let indexed = indexed_mesh_from_mesh(&mesh).unwrap();
        assert_eq!(indexed.vertices().len(), 2);
        assert_eq!(indexed.indices(), &[0, 1, 0]);
    }

    #[test]
    fn test_deep_tree_routes_consistently() {
        let mut corners = Vec::new();
        for i in 0..8 {
            for j in 0..8 {
                corners.push(p(i as f32 * 0.5, j as f32 * 0.25, (i + j) as f32));
            }
        }
        let mut doubled = corners.clone();
        doubled.extend(corners.iter().cloned());

        let indexed = indexed_mesh_from_mesh(&Mesh::from_vertices(doubled)).unwrap();
        assert_eq!(indexed.vertices().len(), corners.len());
        let n = corners.len();
        assert_eq!(&indexed.indices()[..n], &indexed.indices()[n..]);
    }

    #[test]
    fn test_indexing_requires_flat_mode() {
        let mesh = Mesh::from_indexed(vec![p(0.0, 0.0, 0.0)], vec![0, 0, 0]).unwrap();
        assert!(matches!(
            indexed_mesh_from_mesh(&mesh),
            Err(MeshError::InvalidMode { expected: Mode::Flat, .. })
        ));
    }

    #[test]
    fn test_unindexing_requires_indexed_mode() {
        let mesh = Mesh::from_vertices(vec![p(0.0, 0.0, 0.0); 3]);
        assert!(matches!(
            mesh_from_indexed_mesh(&mesh),
            Err(MeshError::InvalidMode { expected: Mode::Indexed, .. })
        ));
    }

    #[test]
    fn test_empty_mesh_indexes_to_empty() {
        let mesh: Mesh<VertexP> = Mesh::new();
        let indexed = indexed_mesh_from_mesh(&mesh).unwrap();
        assert!(indexed.vertices().is_empty());
        assert!(indexed.indices().is_empty());
    }
}
