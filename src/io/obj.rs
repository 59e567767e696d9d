//! Wavefront OBJ format support.
//!
//! Faces are stored as a flat stream of 0-based attribute indices, one to
//! three components per corner depending on which attributes the file
//! declares (`v`, `v/t`, `v//n` or `v/t/n`). Polygons with more than three
//! corners are fan-triangulated while parsing.
//!
//! `g` and `usemtl` statements become geometry and material [`Group`]s over
//! that stream, measured in components. A group runs from the end of the
//! previous group of the same kind and grows with every face read while it is
//! current.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector2, Vector3};

use super::{mtl, ImportOptions, VertexFormat};
use crate::error::{MeshError, Result};
use crate::mesh::{lookup_or_default, Group, MaterialMap};

/// Geometry group name that OBJ exporters emit for ungrouped faces.
const DEFAULT_GROUP_NAME: &str = "default";

/// Material group names are cut at the last `__Grp` suffix some exporters
/// append, and spaces become underscores.
pub fn normalize_material_name(name: &str) -> String {
    let base = match name.rfind("__Grp") {
        Some(i) => &name[..i],
        None => name,
    };
    base.replace(' ', "_")
}

/// Geometry group names have spaces replaced with underscores.
pub fn normalize_group_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// The contents of an OBJ file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjModel {
    /// Model name, taken from the file stem on load.
    pub name: String,
    /// Vertex positions (`v`).
    pub positions: Vec<Point3<f32>>,
    /// Texture coordinates (`vt`).
    pub uvs: Vec<Vector2<f32>>,
    /// Normals (`vn`).
    pub normals: Vec<Vector3<f32>>,
    /// 0-based attribute indices, [`ObjModel::components`] per corner.
    pub face_indices: Vec<u32>,
    /// Geometry groups over `face_indices`, in component units.
    pub geometry_groups: Vec<Group>,
    /// Material groups over `face_indices`, in component units.
    pub material_groups: Vec<Group>,
    /// Materials referenced by the material groups.
    pub materials: MaterialMap,
    /// Material library named by `mtllib`, relative to the OBJ file.
    pub mtllib: Option<String>,
}

impl ObjModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Which attributes the model carries.
    pub fn vertex_format(&self) -> VertexFormat {
        match (
            self.positions.is_empty(),
            self.uvs.is_empty(),
            self.normals.is_empty(),
        ) {
            (true, _, _) => VertexFormat::None,
            (false, false, false) => VertexFormat::PositionUVNormal,
            (false, true, false) => VertexFormat::PositionNormal,
            (false, false, true) => VertexFormat::PositionUV,
            (false, true, true) => VertexFormat::Position,
        }
    }

    /// Face-index components per corner.
    pub fn components(&self) -> u32 {
        self.vertex_format().components()
    }

    /// Number of triangles in the face stream.
    pub fn num_triangles(&self) -> usize {
        match self.components() {
            0 => 0,
            width => self.face_indices.len() / width as usize / 3,
        }
    }

    fn open_geometry_group(&mut self, name: String) {
        let start = self.geometry_groups.last().map_or(0, Group::end);
        self.geometry_groups.push(Group::starting_at(name, start));
    }

    fn open_material_group(&mut self, name: String) {
        let start = self.material_groups.last().map_or(0, Group::end);
        self.material_groups.push(Group::starting_at(name, start));
    }

    fn grow_current_groups(&mut self, added: u32) {
        if let Some(g) = self.material_groups.last_mut() {
            g.set_count(g.count() + added);
        }
        if let Some(g) = self.geometry_groups.last_mut() {
            g.set_count(g.count() + added);
        }
    }
}

fn parse_floats<const N: usize>(line: usize, rest: &str) -> Result<[f32; N]> {
    let mut out = [0.0f32; N];
    let mut tokens = rest.split_whitespace();
    for slot in out.iter_mut() {
        let token = tokens
            .next()
            .ok_or_else(|| MeshError::parse(line, format!("expected {} numbers", N)))?;
        *slot = token
            .parse()
            .map_err(|e| MeshError::parse(line, format!("'{}': {}", token, e)))?;
    }
    Ok(out)
}

/// Resolve a 1-based (or negative, relative) OBJ index against `len` elements.
fn resolve_index(line: usize, token: &str, len: usize) -> Result<u32> {
    let raw: i64 = token
        .parse()
        .map_err(|e| MeshError::parse(line, format!("face index '{}': {}", token, e)))?;
    let resolved = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        len as i64 + raw
    } else {
        return Err(MeshError::parse(line, "face index 0 is not valid"));
    };
    if resolved < 0 || resolved >= len as i64 {
        return Err(MeshError::parse(
            line,
            format!("face index {} out of range for {} elements", raw, len),
        ));
    }
    Ok(resolved as u32)
}

/// One face corner: position plus optional UV and normal indices.
fn parse_corner(line: usize, token: &str, model: &ObjModel) -> Result<Vec<u32>> {
    let mut parts = token.split('/');
    let mut corner = Vec::with_capacity(3);

    let v = parts.next().unwrap_or("");
    corner.push(resolve_index(line, v, model.positions.len())?);
    if let Some(t) = parts.next().filter(|s| !s.is_empty()) {
        corner.push(resolve_index(line, t, model.uvs.len())?);
    }
    if let Some(n) = parts.next().filter(|s| !s.is_empty()) {
        corner.push(resolve_index(line, n, model.normals.len())?);
    }
    Ok(corner)
}

fn parse_face(line: usize, rest: &str, model: &mut ObjModel) -> Result<u32> {
    let corners = {
        let model: &ObjModel = model;
        rest.split_whitespace()
            .map(|token| parse_corner(line, token, model))
            .collect::<Result<Vec<_>>>()?
    };

    if corners.len() < 3 {
        log::warn!("obj line {}: face with {} corners skipped", line, corners.len());
        return Ok(0);
    }
    if corners.windows(2).any(|w| w[0].len() != w[1].len()) {
        return Err(MeshError::parse(line, "face corners disagree on attributes"));
    }

    let before = model.face_indices.len();
    for i in 1..corners.len() - 1 {
        for corner in [&corners[0], &corners[i], &corners[i + 1]] {
            model.face_indices.extend_from_slice(corner);
        }
    }
    Ok((model.face_indices.len() - before) as u32)
}

/// Parse OBJ text. Materials are not resolved; see [`load`].
pub fn parse(text: &str) -> Result<ObjModel> {
    let mut model = ObjModel::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (token, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match token {
            "v" => {
                let [x, y, z] = parse_floats::<3>(line_no, rest)?;
                model.positions.push(Point3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(line_no, rest)?;
                model.uvs.push(Vector2::new(u, v));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(line_no, rest)?;
                model.normals.push(Vector3::new(x, y, z));
            }
            "g" => {
                let name = normalize_group_name(rest);
                if !name.is_empty() && name != DEFAULT_GROUP_NAME {
                    model.open_geometry_group(name);
                }
            }
            "usemtl" => model.open_material_group(normalize_material_name(rest)),
            "mtllib" => model.mtllib = Some(rest.to_string()),
            "f" => {
                let added = parse_face(line_no, rest, &mut model)?;
                model.grow_current_groups(added);
            }
            _ => log::debug!("obj line {}: ignoring '{}'", line_no, token),
        }
    }

    model.geometry_groups.sort();
    model.material_groups.sort();
    Ok(model)
}

/// Attach a record for every material group, from `library` where present.
fn attach_materials(model: &mut ObjModel, library: &MaterialMap) {
    for group in &model.material_groups {
        model
            .materials
            .insert(group.name().to_string(), lookup_or_default(library, group.name()));
    }
}

/// Load an OBJ file and the material library it references.
///
/// # Errors
///
/// I/O and parse errors from the OBJ file. A material library that cannot be
/// read is an error only with [`ImportOptions::require_materials`].
pub fn load<P: AsRef<Path>>(path: P, options: &ImportOptions) -> Result<ObjModel> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut model = parse(&text).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    model.name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let mut library = MaterialMap::new();
    if options.load_materials {
        match &model.mtllib {
            Some(mtllib) => {
                let mtl_path = path.parent().unwrap_or(Path::new("")).join(mtllib);
                match mtl::load(&mtl_path) {
                    Ok(found) => library = found,
                    Err(e) if options.require_materials => return Err(e),
                    Err(e) => log::warn!("{}", e),
                }
            }
            None if options.require_materials && !model.material_groups.is_empty() => {
                return Err(MeshError::LoadError {
                    path: path.to_path_buf(),
                    message: "material groups present but no mtllib".to_string(),
                });
            }
            None => {}
        }
    }
    attach_materials(&mut model, &library);

    log::debug!(
        "loaded {}: {} positions, {} uvs, {} normals, {} triangles",
        path.display(),
        model.positions.len(),
        model.uvs.len(),
        model.normals.len(),
        model.num_triangles()
    );
    Ok(model)
}

fn write_corner<W: Write>(out: &mut W, format: VertexFormat, c: &[u32]) -> std::io::Result<()> {
    match format {
        VertexFormat::Position => write!(out, "{}", c[0] + 1),
        VertexFormat::PositionUV => write!(out, "{}/{}", c[0] + 1, c[1] + 1),
        VertexFormat::PositionNormal => write!(out, "{}//{}", c[0] + 1, c[1] + 1),
        VertexFormat::PositionUVNormal => {
            write!(out, "{}/{}/{}", c[0] + 1, c[1] + 1, c[2] + 1)
        }
        VertexFormat::None => Ok(()),
    }
}

fn write_faces<W: Write>(out: &mut W, model: &ObjModel, start: usize, count: usize) -> Result<()> {
    let format = model.vertex_format();
    let width = model.components() as usize;
    let end = (start + count).min(model.face_indices.len());
    let start = start.min(end);

    for face in model.face_indices[start..end].chunks_exact(width * 3) {
        write!(out, "f ")?;
        write_corner(out, format, &face[..width])?;
        write!(out, " ")?;
        write_corner(out, format, &face[width..2 * width])?;
        write!(out, " ")?;
        write_corner(out, format, &face[2 * width..])?;
        writeln!(out)?;
    }
    Ok(())
}

/// Write a model as OBJ text, optionally preceded by an `mtllib` statement.
///
/// Geometry and material groups are interleaved as `g` and `usemtl` markers
/// in [`Group`] order; the faces after a marker run up to the next marker.
pub fn write<W: Write>(model: &ObjModel, mtllib: Option<&str>, out: &mut W) -> Result<()> {
    if let Some(lib) = mtllib {
        writeln!(out, "mtllib {}", lib)?;
    }
    if model.positions.is_empty() {
        return Ok(());
    }
    if !model.geometry_groups.is_empty() {
        writeln!(out, "g {}", DEFAULT_GROUP_NAME)?;
    }

    for p in &model.positions {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for t in &model.uvs {
        writeln!(out, "vt {} {}", t.x, t.y)?;
    }
    for n in &model.normals {
        writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
    }

    let mut markers: Vec<Group> = model
        .geometry_groups
        .iter()
        .map(|g| Group::new(format!("g {}", g.name()), g.start(), g.count()))
        .chain(
            model
                .material_groups
                .iter()
                .map(|g| Group::new(format!("usemtl {}", g.name()), g.start(), g.count())),
        )
        .collect();
    markers.sort();

    if markers.is_empty() {
        return write_faces(out, model, 0, model.face_indices.len());
    }

    for (i, marker) in markers.iter().enumerate() {
        let span = match markers.get(i + 1) {
            Some(next) => next.start() - marker.start(),
            None => marker.count(),
        };
        writeln!(out, "{}", marker.name())?;
        write_faces(out, model, marker.start() as usize, span as usize)?;
    }
    Ok(())
}

/// Save a model to `path`, with its materials in a sibling `.mtl` file.
pub fn save<P: AsRef<Path>>(model: &ObjModel, path: P) -> Result<()> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");
    let mtl_name = format!("{}.mtl", stem);

    let mut writer = BufWriter::new(File::create(path)?);
    write(model, Some(&mtl_name), &mut writer)?;
    writer.flush()?;

    mtl::save(&model.materials, path.with_extension("mtl"))?;
    log::debug!("saved {}", path.display());
    Ok(())
}
