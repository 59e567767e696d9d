//! # Lap
//!
//! A mesh asset processing library for triangle meshes carrying named
//! geometry and material groups.
//!
//! Lap converts between *flat* meshes, with one vertex per triangle corner,
//! and *indexed* meshes, with a deduplicated vertex palette and an index list.
//! Group ranges survive every conversion, so a mesh can be cut into parts,
//! regrouped by material and welded without losing track of which triangles
//! belong where.
//!
//! ## Features
//!
//! - **Generic vertex formats**: position, position/UV, position/normal and
//!   position/UV/normal, compared with a fixed tolerance
//! - **Group algebra**: intersection, rebasing and slicing of named ranges
//! - **Welding**: kd-tree vertex deduplication into an indexed mesh
//! - **OBJ/MTL I/O**: load and save models with their material libraries
//!
//! ## Quick Start
//!
//! ```no_run
//! use lap::prelude::*;
//!
//! let model = lap::io::load_model("scene.obj", &ImportOptions::default()).unwrap();
//! let mesh: Mesh<VertexPTN> = mesh_from_model(&model).unwrap();
//!
//! for group in mesh.geometry_groups() {
//!     let part = mesh.slice(group).unwrap().flatten().unwrap();
//!     let indexed = indexed_mesh_from_mesh(&part).unwrap();
//!     println!("{}: {} unique vertices", group.name(), indexed.vertices().len());
//! }
//! ```
//!
//! ## Slicing and Flattening
//!
//! ```
//! use lap::prelude::*;
//!
//! let corners: Vec<VertexP> = (0..9)
//!     .map(|i| VertexP::from_coords(i as f32, 0.0, 0.0))
//!     .collect();
//! let mesh = Mesh::from_vertices(corners).with_material_groups(vec![
//!     Group::new("red", 0, 3),
//!     Group::new("blue", 3, 3),
//!     Group::new("red", 6, 3),
//! ]);
//!
//! // Keep the last two triangles.
//! let tail = mesh.slice(&Group::new("tail", 3, 6)).unwrap();
//! assert_eq!(tail.vertices().len(), 6);
//! assert_eq!(tail.material_groups()[0], Group::new("blue", 0, 3));
//!
//! // Gather triangles by material, in order of first appearance.
//! let flat = mesh.flatten().unwrap();
//! assert_eq!(
//!     flat.material_groups(),
//!     &[Group::new("red", 0, 6), Group::new("blue", 6, 3)]
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use lap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::io::{ImportOptions, ObjModel, VertexFormat};
    pub use crate::mesh::{
        indexed_mesh_from_mesh, mesh_from_indexed_mesh, mesh_from_model, model_from_mesh,
        AnyMesh, Group, Material, Mesh, Mode, Vertex, VertexP, VertexPN, VertexPT, VertexPTN,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
