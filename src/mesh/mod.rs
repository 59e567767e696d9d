//! Core mesh data structures.
//!
//! This module provides the vertex formats, the group interval algebra and the
//! generic [`Mesh`] container, together with the conversions between flat and
//! indexed meshes.
//!
//! # Overview
//!
//! A [`Mesh`] is generic over its vertex type ([`VertexP`], [`VertexPT`],
//! [`VertexPN`] or [`VertexPTN`]). It is either *flat*, with one vertex per
//! triangle corner, or *indexed*, with a deduplicated vertex palette and an
//! index list. Named [`Group`]s describe geometry and material ranges over the
//! corners of the mesh.
//!
//! # Flat and Indexed Meshes
//!
//! Welding turns a flat mesh into an indexed one by merging vertices that are
//! equal within [`EPSILON`]:
//!
//! ```
//! use lap::mesh::{indexed_mesh_from_mesh, mesh_from_indexed_mesh, Mesh, VertexP};
//!
//! let flat = Mesh::from_vertices(vec![
//!     VertexP::from_coords(0.0, 0.0, 0.0),
//!     VertexP::from_coords(1.0, 0.0, 0.0),
//!     VertexP::from_coords(0.0, 1.0, 0.0),
//!     VertexP::from_coords(0.0, 0.0, 0.0),
//!     VertexP::from_coords(0.0, 1.0, 0.0),
//!     VertexP::from_coords(1.0, 1.0, 0.0),
//! ]);
//!
//! let indexed = indexed_mesh_from_mesh(&flat).unwrap();
//! assert_eq!(indexed.vertices().len(), 4);
//! assert_eq!(indexed.indices(), &[0, 1, 2, 0, 2, 3]);
//!
//! let again = mesh_from_indexed_mesh(&indexed).unwrap();
//! assert_eq!(again.vertices().len(), 6);
//! ```
//!
//! # Construction from Files
//!
//! The [`builder`] module resolves an [`ObjModel`](crate::io::ObjModel) into a
//! mesh of a chosen vertex type, and exports a flat mesh back to a model.

pub mod builder;
mod container;
mod group;
mod material;
mod vertex;
mod weld;

pub use builder::{
    indexed_mesh_from_model, mesh_from_model, model_from_mesh, AnyMesh, ModelVertex,
};
pub use container::{Mesh, Mode, DEFAULT_GROUP};
pub use group::{intersection, is_sorted, offset_into, slice_groups, sort_groups, Group};
pub use material::{lookup_or_default, Material, MaterialMap};
pub use vertex::{
    float_equals, slice_equals, Vertex, VertexP, VertexPN, VertexPT, VertexPTN, EPSILON,
};
pub use weld::{
    indexed_mesh_from_mesh, indexed_mesh_with_options, mesh_from_indexed_mesh, WeldMethod,
    WeldOptions,
};
