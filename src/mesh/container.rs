//! The generic mesh container.
//!
//! A [`Mesh`] is either *flat* (three consecutive vertices per triangle, no
//! index array) or *indexed* (a vertex palette plus three indices per
//! triangle). Groups are always expressed in triangle-corner units, which are
//! the same in both modes: a flat vertex and an index entry each describe one
//! corner.
//!
//! All transformations borrow the mesh and return a new one.

use std::collections::HashMap;
use std::fmt;

use super::group::{slice_groups, sort_groups, Group};
use super::material::{lookup_or_default, Material, MaterialMap};
use super::vertex::Vertex;
use crate::error::{MeshError, Result};

/// Name of the geometry group produced by [`Mesh::flatten`].
pub const DEFAULT_GROUP: &str = "default";

/// Storage mode of a [`Mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One vertex per triangle corner.
    Flat,
    /// Vertex palette plus a per-corner index array.
    Indexed,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Flat => write!(f, "flat"),
            Mode::Indexed => write!(f, "indexed"),
        }
    }
}

/// A triangle mesh with geometry and material groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh<V: Vertex> {
    pub(crate) vertices: Vec<V>,
    pub(crate) indices: Vec<u32>,
    pub(crate) geometry_groups: Vec<Group>,
    pub(crate) material_groups: Vec<Group>,
    pub(crate) materials: MaterialMap,
}

impl<V: Vertex> Default for Mesh<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Vertex> Mesh<V> {
    /// Create an empty flat mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            geometry_groups: Vec::new(),
            material_groups: Vec::new(),
            materials: MaterialMap::new(),
        }
    }

    /// Create a flat mesh from a per-corner vertex stream.
    pub fn from_vertices(vertices: Vec<V>) -> Self {
        Self {
            vertices,
            ..Self::new()
        }
    }

    /// Create an indexed mesh from a palette and per-corner indices.
    pub fn from_indexed(vertices: Vec<V>, indices: Vec<u32>) -> Result<Self> {
        if let Some((corner, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, &i)| i as usize >= vertices.len())
        {
            return Err(MeshError::IndexOutOfRange {
                corner,
                index,
                len: vertices.len(),
            });
        }
        Ok(Self {
            vertices,
            indices,
            ..Self::new()
        })
    }

    /// Attach geometry groups. They are sorted into [`Group`] order.
    pub fn with_geometry_groups(mut self, mut groups: Vec<Group>) -> Self {
        sort_groups(&mut groups);
        self.geometry_groups = groups;
        self
    }

    /// Attach material groups. They are sorted into [`Group`] order.
    pub fn with_material_groups(mut self, mut groups: Vec<Group>) -> Self {
        sort_groups(&mut groups);
        self.material_groups = groups;
        self
    }

    /// Insert a material record, replacing any with the same name.
    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.insert(material.name.clone(), material);
        self
    }

    /// Replace the material map.
    pub fn with_materials(mut self, materials: MaterialMap) -> Self {
        self.materials = materials;
        self
    }

    /// Current storage mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        if self.indices.is_empty() {
            Mode::Flat
        } else {
            Mode::Indexed
        }
    }

    /// Whether the mesh has no index array.
    #[inline]
    pub fn is_flat(&self) -> bool {
        self.indices.is_empty()
    }

    /// Vertex at `index`. Panics if out of range.
    #[inline]
    pub fn vertex(&self, index: u32) -> &V {
        &self.vertices[index as usize]
    }

    /// All vertices: the corner stream when flat, the palette when indexed.
    #[inline]
    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    /// The per-corner index array; empty when flat.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangles.
    pub fn triangles(&self) -> usize {
        if self.indices.is_empty() {
            self.vertices.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Number of triangle corners.
    pub fn corners(&self) -> usize {
        if self.indices.is_empty() {
            self.vertices.len()
        } else {
            self.indices.len()
        }
    }

    /// Geometry groups, in [`Group`] order.
    #[inline]
    pub fn geometry_groups(&self) -> &[Group] {
        &self.geometry_groups
    }

    /// Material groups, in [`Group`] order.
    #[inline]
    pub fn material_groups(&self) -> &[Group] {
        &self.material_groups
    }

    /// Material records by name.
    #[inline]
    pub fn materials(&self) -> &MaterialMap {
        &self.materials
    }

    /// The record for `name`, or a default one carrying that name.
    pub fn material(&self, name: &str) -> Material {
        lookup_or_default(&self.materials, name)
    }

    fn require_mode(&self, operation: &'static str, expected: Mode) -> Result<()> {
        let found = self.mode();
        if found == expected {
            Ok(())
        } else {
            Err(MeshError::invalid_mode(operation, expected, found))
        }
    }

    /// A copy of this mesh's groups and materials with no vertices.
    pub(crate) fn with_same_meta(&self) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            geometry_groups: self.geometry_groups.clone(),
            material_groups: self.material_groups.clone(),
            materials: self.materials.clone(),
        }
    }

    /// Extract the corners covered by `spec` into a new flat mesh.
    ///
    /// Geometry and material groups are clipped to `spec` and rebased so the
    /// new mesh starts at zero. Only materials still referenced by a clipped
    /// material group are kept.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidMode`] if the mesh is indexed, and
    /// [`MeshError::GroupOutOfRange`] if `spec` reaches past the last vertex.
    pub fn slice(&self, spec: &Group) -> Result<Mesh<V>> {
        self.require_mode("slice", Mode::Flat)?;
        check_range(spec, self.vertices.len())?;

        let mut mesh = Mesh::from_vertices(self.vertices[spec.range()].to_vec());
        mesh.geometry_groups = slice_groups(&self.geometry_groups, spec);
        mesh.material_groups = slice_groups(&self.material_groups, spec);
        for group in &mesh.material_groups {
            if !mesh.materials.contains_key(group.name()) {
                mesh.materials
                    .insert(group.name().to_string(), self.material(group.name()));
            }
        }

        log::debug!(
            "sliced {} into {} vertices, {} geometry groups, {} material groups",
            spec,
            mesh.vertices.len(),
            mesh.geometry_groups.len(),
            mesh.material_groups.len()
        );
        Ok(mesh)
    }

    /// Merge all geometry into one group and make each material contiguous.
    ///
    /// Material groups sharing a name are gathered together wherever they
    /// occur, in order of each name's first appearance; within a name the
    /// source ranges keep their original order. The result has a single
    /// [`DEFAULT_GROUP`] geometry group spanning every vertex.
    ///
    /// Vertices that no material group covers, including the whole buffer of
    /// a mesh without material groups, are gathered under an implicit
    /// [`DEFAULT_GROUP`] material, so no vertex is ever dropped.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidMode`] if the mesh is indexed, and
    /// [`MeshError::GroupOutOfRange`] if a material group reaches past the
    /// last vertex.
    pub fn flatten(&self) -> Result<Mesh<V>> {
        self.require_mode("flatten", Mode::Flat)?;
        let total = self.vertices.len();
        for group in &self.material_groups {
            check_range(group, total)?;
        }
        let source = with_uncovered_runs(&self.material_groups, total as u32);

        // Bucket groups by name, buckets ordered by first sighting.
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut buckets: Vec<(&str, Vec<&Group>)> = Vec::new();
        for group in &source {
            let slot = *first_seen.entry(group.name()).or_insert_with(|| {
                buckets.push((group.name(), Vec::new()));
                buckets.len() - 1
            });
            buckets[slot].1.push(group);
        }

        let mut mesh = Mesh::new();
        mesh.vertices.reserve(total);
        for (name, groups) in buckets {
            let start = mesh.vertices.len() as u32;
            for group in groups {
                mesh.vertices
                    .extend_from_slice(&self.vertices[group.range()]);
            }
            let count = mesh.vertices.len() as u32 - start;
            mesh.material_groups.push(Group::new(name, start, count));
        }
        mesh.geometry_groups
            .push(Group::new(DEFAULT_GROUP, 0, mesh.vertices.len() as u32));
        mesh.materials = self.materials.clone();

        log::debug!(
            "flattened {} material groups into {}",
            source.len(),
            mesh.material_groups.len()
        );
        Ok(mesh)
    }
}

/// Fails unless `group` lies within `len` vertices. Computed in `u64` so that
/// ranges ending past `u32::MAX` are reported rather than overflowing.
fn check_range(group: &Group, len: usize) -> Result<()> {
    let end = u64::from(group.start()) + u64::from(group.count());
    if end > len as u64 {
        return Err(MeshError::GroupOutOfRange {
            name: group.name().to_string(),
            start: group.start(),
            end,
            len,
        });
    }
    Ok(())
}

/// `groups` in position order, with every stretch of `[0, total)` that no
/// group covers filled by a [`DEFAULT_GROUP`] run.
fn with_uncovered_runs(groups: &[Group], total: u32) -> Vec<Group> {
    let mut ordered: Vec<&Group> = groups.iter().collect();
    ordered.sort_by_key(|g| g.start());

    let mut runs = Vec::with_capacity(ordered.len() + 1);
    let mut covered = 0;
    for group in ordered {
        if group.start() > covered {
            runs.push(Group::new(DEFAULT_GROUP, covered, group.start() - covered));
        }
        covered = covered.max(group.end());
        runs.push(group.clone());
    }
    if total > covered {
        runs.push(Group::new(DEFAULT_GROUP, covered, total - covered));
    }
    runs
}

impl<V: Vertex> fmt::Display for Mesh<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in &self.vertices {
            writeln!(f, "{}", v)?;
        }
        for i in &self.indices {
            writeln!(f, "{}", i)?;
        }
        writeln!(f, "geometry-groups")?;
        for g in &self.geometry_groups {
            writeln!(f, "{}", g)?;
        }
        writeln!(f, "material-groups")?;
        for g in &self.material_groups {
            writeln!(f, "{}", g)?;
        }
        writeln!(f, "materials")?;
        for m in self.materials.values() {
            writeln!(f, "{}", m)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::group::is_sorted;
    use crate::mesh::VertexP;

    fn line(n: usize) -> Vec<VertexP> {
        (0..n).map(|i| VertexP::from_coords(i as f32, 0.0, 0.0)).collect()
    }

    fn xs(mesh: &Mesh<VertexP>) -> Vec<f32> {
        mesh.vertices().iter().map(|v| v.position.x).collect()
    }

    fn two_part_mesh() -> Mesh<VertexP> {
        Mesh::from_vertices(line(12))
            .with_geometry_groups(vec![Group::new("body", 0, 6), Group::new("wheel", 6, 6)])
            .with_material_groups(vec![
                Group::new("paint", 0, 3),
                Group::new("chrome", 3, 6),
                Group::new("rubber", 9, 3),
            ])
            .with_material(Material::new("paint"))
            .with_material(Material::new("chrome"))
            .with_material(Material::new("rubber"))
    }

    #[test]
    fn test_mode_and_counts() {
        let flat = Mesh::from_vertices(line(6));
        assert_eq!(flat.mode(), Mode::Flat);
        assert_eq!(flat.triangles(), 2);
        assert_eq!(flat.corners(), 6);

        let indexed = Mesh::from_indexed(line(4), vec![0, 1, 2, 2, 1, 3]).unwrap();
        assert_eq!(indexed.mode(), Mode::Indexed);
        assert_eq!(indexed.triangles(), 2);
        assert_eq!(indexed.corners(), 6);
    }

    #[test]
    fn test_from_indexed_rejects_bad_index() {
        let result = Mesh::from_indexed(line(3), vec![0, 1, 3]);
        assert!(matches!(
            result,
            Err(MeshError::IndexOutOfRange { corner: 2, index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_slice_clips_and_rebases() {
        let mesh = two_part_mesh();
        let sub = mesh.slice(&Group::new("wheel", 6, 6)).unwrap();

        assert_eq!(xs(&sub), vec![6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
        assert_eq!(sub.geometry_groups(), &[Group::new("wheel", 0, 6)]);
        assert_eq!(
            sub.material_groups(),
            &[Group::new("chrome", 0, 3), Group::new("rubber", 3, 3)]
        );
        assert!(sub.indices().is_empty());
    }

    #[test]
    fn test_slice_prunes_unreferenced_materials() {
        let mesh = two_part_mesh();
        let sub = mesh.slice(&Group::new("wheel", 6, 6)).unwrap();
        let names: Vec<&str> = sub.materials().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["chrome", "rubber"]);
    }

    #[test]
    fn test_slice_containment() {
        let mesh = two_part_mesh();
        let spec = Group::new("middle", 3, 6);
        let sub = mesh.slice(&spec).unwrap();

        assert_eq!(sub.vertices().len(), spec.count() as usize);
        for g in sub.geometry_groups().iter().chain(sub.material_groups()) {
            assert!(g.end() <= spec.count());
        }
        assert!(is_sorted(sub.geometry_groups()));
        assert!(is_sorted(sub.material_groups()));
    }

    #[test]
    fn test_slice_missing_material_gets_default() {
        let mesh = Mesh::from_vertices(line(3))
            .with_material_groups(vec![Group::new("ghost", 0, 3)]);
        let sub = mesh.slice(&Group::new("all", 0, 3)).unwrap();
        assert_eq!(sub.materials().get("ghost"), Some(&Material::new("ghost")));
    }

    #[test]
    fn test_slice_out_of_range() {
        let mesh = Mesh::from_vertices(line(6));
        let result = mesh.slice(&Group::new("too-far", 3, 6));
        assert!(matches!(result, Err(MeshError::GroupOutOfRange { .. })));
    }

    #[test]
    fn test_slice_range_past_u32_max() {
        let mesh = Mesh::from_vertices(line(3));
        let result = mesh.slice(&Group::new("wrap", u32::MAX, 2));
        assert!(matches!(
            result,
            Err(MeshError::GroupOutOfRange { start: u32::MAX, end: 4_294_967_297, len: 3, .. })
        ));
    }

    #[test]
    fn test_flatten_rejects_overflowing_group() {
        let mesh = Mesh::from_vertices(line(3))
            .with_material_groups(vec![Group::new("wrap", u32::MAX, 2)]);
        assert!(matches!(
            mesh.flatten(),
            Err(MeshError::GroupOutOfRange { .. })
        ));
    }

    #[test]
    fn test_slice_requires_flat_mode() {
        let mesh = Mesh::from_indexed(line(3), vec![0, 1, 2]).unwrap();
        let result = mesh.slice(&Group::new("all", 0, 3));
        assert!(matches!(
            result,
            Err(MeshError::InvalidMode { expected: Mode::Flat, found: Mode::Indexed, .. })
        ));
    }

    #[test]
    fn test_flatten_merges_same_named_groups() {
        let mesh = Mesh::from_vertices(line(9)).with_material_groups(vec![
            Group::new("metal", 0, 3),
            Group::new("glass", 3, 3),
            Group::new("metal", 6, 3),
        ]);
        let flat = mesh.flatten().unwrap();

        assert_eq!(
            xs(&flat),
            vec![0.0, 1.0, 2.0, 6.0, 7.0, 8.0, 3.0, 4.0, 5.0]
        );
        assert_eq!(
            flat.material_groups(),
            &[Group::new("metal", 0, 6), Group::new("glass", 6, 3)]
        );
        assert_eq!(flat.geometry_groups(), &[Group::new(DEFAULT_GROUP, 0, 9)]);
    }

    #[test]
    fn test_flatten_keeps_first_occurrence_order() {
        let mesh = Mesh::from_vertices(line(12)).with_material_groups(vec![
            Group::new("b", 0, 3),
            Group::new("a", 3, 3),
            Group::new("b", 6, 3),
            Group::new("a", 9, 3),
        ]);
        let flat = mesh.flatten().unwrap();
        assert_eq!(
            flat.material_groups(),
            &[Group::new("b", 0, 6), Group::new("a", 6, 6)]
        );
        assert_eq!(
            xs(&flat),
            vec![0.0, 1.0, 2.0, 6.0, 7.0, 8.0, 3.0, 4.0, 5.0, 9.0, 10.0, 11.0]
        );
    }

    #[test]
    fn test_flatten_conserves_vertices() {
        let mesh = two_part_mesh();
        let flat = mesh.flatten().unwrap();
        assert_eq!(flat.vertices().len(), mesh.vertices().len());

        let mut covered = 0;
        for g in flat.material_groups() {
            assert_eq!(g.start(), covered);
            covered = g.end();
        }
        assert_eq!(covered as usize, mesh.vertices().len());
        assert!(is_sorted(flat.material_groups()));
    }

    #[test]
    fn test_flatten_keeps_all_materials() {
        let mesh = two_part_mesh().with_material(Material::new("unused"));
        let flat = mesh.flatten().unwrap();
        assert_eq!(flat.materials().len(), 4);
    }

    #[test]
    fn test_flatten_without_material_groups_uses_default() {
        let mesh = Mesh::from_vertices(line(6));
        let flat = mesh.flatten().unwrap();
        assert_eq!(flat.material_groups(), &[Group::new(DEFAULT_GROUP, 0, 6)]);
        assert_eq!(xs(&flat), xs(&mesh));

        let empty: Mesh<VertexP> = Mesh::new();
        let flat = empty.flatten().unwrap();
        assert!(flat.material_groups().is_empty());
        assert_eq!(flat.geometry_groups(), &[Group::new(DEFAULT_GROUP, 0, 0)]);
    }

    #[test]
    fn test_flatten_keeps_uncovered_vertices() {
        // Leading triangle before the first material, a gap, and a tail.
        let mesh = Mesh::from_vertices(line(15)).with_material_groups(vec![
            Group::new("m", 3, 3),
            Group::new("n", 9, 3),
        ]);
        let flat = mesh.flatten().unwrap();

        assert_eq!(flat.vertices().len(), 15);
        assert_eq!(
            flat.material_groups(),
            &[
                Group::new(DEFAULT_GROUP, 0, 9),
                Group::new("m", 9, 3),
                Group::new("n", 12, 3),
            ]
        );
        assert_eq!(
            xs(&flat),
            vec![0.0, 1.0, 2.0, 6.0, 7.0, 8.0, 12.0, 13.0, 14.0, 3.0, 4.0, 5.0, 9.0, 10.0, 11.0]
        );
        assert_eq!(flat.geometry_groups(), &[Group::new(DEFAULT_GROUP, 0, 15)]);

        let whole = flat.slice(&flat.geometry_groups()[0]).unwrap();
        assert_eq!(whole.vertices().len(), 15);
    }

    #[test]
    fn test_flatten_requires_flat_mode() {
        let mesh = Mesh::from_indexed(line(3), vec![0, 1, 2]).unwrap();
        assert!(matches!(mesh.flatten(), Err(MeshError::InvalidMode { .. })));
    }

    #[test]
    fn test_display_sections() {
        let mesh = Mesh::from_vertices(line(3))
            .with_geometry_groups(vec![Group::new("g", 0, 3)])
            .with_material_groups(vec![Group::new("m", 0, 3)])
            .with_material(Material::new("m"));
        let text = mesh.to_string();
        assert!(text.starts_with("[0 0 0]\n[1 0 0]\n[2 0 0]\ngeometry-groups\n[g, 0, 3]\n"));
        assert!(text.contains("material-groups\n[m, 0, 3]\nmaterials\nm\n"));
    }
}
