//! Asset file I/O.
//!
//! This module reads and writes the Wavefront OBJ/MTL text format. Files are
//! parsed into an [`ObjModel`], a direct image of the file's attribute arrays,
//! face-index stream and group markers. Converting between an [`ObjModel`] and
//! a [`Mesh`](crate::mesh::Mesh) is the job of [`crate::mesh::builder`].
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Materials from the referenced `.mtl` |
//!
//! # Usage
//!
//! ```no_run
//! use lap::io::{load_model, save_model, ImportOptions};
//!
//! let model = load_model("scene.obj", &ImportOptions::default()).unwrap();
//! println!("{} triangles", model.num_triangles());
//! save_model(&model, "copy.obj").unwrap();
//! ```

pub mod mtl;
pub mod obj;

use std::fmt;
use std::path::Path;

pub use obj::ObjModel;

use crate::error::{MeshError, Result};

/// Supported asset file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

/// Which vertex attributes a model carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    /// No positions at all.
    None,
    /// Positions only.
    Position,
    /// Positions and texture coordinates.
    PositionUV,
    /// Positions and normals.
    PositionNormal,
    /// Positions, texture coordinates and normals.
    PositionUVNormal,
}

impl VertexFormat {
    /// Number of face-index components per corner.
    pub fn components(self) -> u32 {
        match self {
            VertexFormat::None => 0,
            VertexFormat::Position => 1,
            VertexFormat::PositionUV | VertexFormat::PositionNormal => 2,
            VertexFormat::PositionUVNormal => 3,
        }
    }
}

impl fmt::Display for VertexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VertexFormat::None => "none",
            VertexFormat::Position => "position",
            VertexFormat::PositionUV => "position-uv",
            VertexFormat::PositionNormal => "position-normal",
            VertexFormat::PositionUVNormal => "position-uv-normal",
        };
        f.write_str(name)
    }
}

/// Options controlling how models are imported.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Read the material library referenced by `mtllib`.
    pub load_materials: bool,

    /// Fail when the material library cannot be read, instead of logging a
    /// warning and falling back to default materials.
    pub require_materials: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            load_materials: true,
            require_materials: false,
        }
    }
}

impl ImportOptions {
    /// Set whether the material library is read.
    pub fn with_load_materials(mut self, load: bool) -> Self {
        self.load_materials = load;
        self
    }

    /// Make a missing or unreadable material library an error.
    pub fn strict(mut self) -> Self {
        self.require_materials = true;
        self
    }
}

fn detect_format(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a model from a file with automatic format detection.
pub fn load_model<P: AsRef<Path>>(path: P, options: &ImportOptions) -> Result<ObjModel> {
    let path = path.as_ref();
    match detect_format(path)? {
        Format::Obj => obj::load(path, options),
    }
}

/// Save a model to a file with automatic format detection.
pub fn save_model<P: AsRef<Path>>(model: &ObjModel, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect_format(path)? {
        Format::Obj => obj::save(model, path),
    }
}
