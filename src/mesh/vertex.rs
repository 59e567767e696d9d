//! Vertex formats.
//!
//! A mesh vertex always carries a position and may carry a texture coordinate
//! and/or a normal. The four combinations are separate types implementing the
//! [`Vertex`] trait, so that [`Mesh`](super::Mesh) is written once and
//! monomorphized per format.
//!
//! Vertices compare approximately: two scalars are equal when they differ by
//! less than [`EPSILON`], and two vertices are equal when every attribute they
//! carry is equal component-wise. Welding never uses exact equality.

use std::fmt;

use nalgebra::{Point3, Vector2, Vector3};

/// Tolerance used by [`float_equals`].
pub const EPSILON: f32 = 5e-4;

/// Approximate scalar equality: `|a - b| < EPSILON`.
#[inline]
pub fn float_equals(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Component-wise approximate equality over two equally sized slices.
#[inline]
pub fn slice_equals(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| float_equals(x, y))
}

/// Capability shared by all vertex formats.
pub trait Vertex: Clone + fmt::Debug + fmt::Display {
    /// Number of attributes carried, which is also the width of one corner in
    /// a face-index stream.
    const COMPONENTS: u32;

    /// The vertex position.
    fn position(&self) -> Point3<f32>;

    /// The texture coordinate, if this format has one.
    fn uv(&self) -> Option<Vector2<f32>> {
        None
    }

    /// The normal, if this format has one.
    fn normal(&self) -> Option<Vector3<f32>> {
        None
    }

    /// Whether every attribute of `self` approximately equals the one in `other`.
    fn approx_eq(&self, other: &Self) -> bool;
}

fn point_equals(a: &Point3<f32>, b: &Point3<f32>) -> bool {
    slice_equals(a.coords.as_slice(), b.coords.as_slice())
}

fn vec2_equals(a: &Vector2<f32>, b: &Vector2<f32>) -> bool {
    slice_equals(a.as_slice(), b.as_slice())
}

fn vec3_equals(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
    slice_equals(a.as_slice(), b.as_slice())
}

fn fmt_point(f: &mut fmt::Formatter<'_>, p: &Point3<f32>) -> fmt::Result {
    write!(f, "[{} {} {}]", p.x, p.y, p.z)
}

fn fmt_vec2(f: &mut fmt::Formatter<'_>, v: &Vector2<f32>) -> fmt::Result {
    write!(f, "[{} {}]", v.x, v.y)
}

fn fmt_vec3(f: &mut fmt::Formatter<'_>, v: &Vector3<f32>) -> fmt::Result {
    write!(f, "[{} {} {}]", v.x, v.y, v.z)
}

/// Position-only vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexP {
    /// Position.
    pub position: Point3<f32>,
}

impl VertexP {
    /// Create a vertex from a position.
    pub fn new(position: Point3<f32>) -> Self {
        Self { position }
    }

    /// Create a vertex from coordinates.
    pub fn from_coords(x: f32, y: f32, z: f32) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

impl Vertex for VertexP {
    const COMPONENTS: u32 = 1;

    #[inline]
    fn position(&self) -> Point3<f32> {
        self.position
    }

    fn approx_eq(&self, other: &Self) -> bool {
        point_equals(&self.position, &other.position)
    }
}

impl fmt::Display for VertexP {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_point(f, &self.position)
    }
}

/// Vertex with position and texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexPT {
    /// Position.
    pub position: Point3<f32>,
    /// Texture coordinate.
    pub uv: Vector2<f32>,
}

impl VertexPT {
    /// Create a vertex from a position and texture coordinate.
    pub fn new(position: Point3<f32>, uv: Vector2<f32>) -> Self {
        Self { position, uv }
    }
}

impl Vertex for VertexPT {
    const COMPONENTS: u32 = 2;

    #[inline]
    fn position(&self) -> Point3<f32> {
        self.position
    }

    fn uv(&self) -> Option<Vector2<f32>> {
        Some(self.uv)
    }

    fn approx_eq(&self, other: &Self) -> bool {
        point_equals(&self.position, &other.position) && vec2_equals(&self.uv, &other.uv)
    }
}

impl fmt::Display for VertexPT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        fmt_point(f, &self.position)?;
        write!(f, ", ")?;
        fmt_vec2(f, &self.uv)?;
        write!(f, "]")
    }
}

/// Vertex with position and normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexPN {
    /// Position.
    pub position: Point3<f32>,
    /// Normal.
    pub normal: Vector3<f32>,
}

impl VertexPN {
    /// Create a vertex from a position and normal.
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

impl Vertex for VertexPN {
    const COMPONENTS: u32 = 2;

    #[inline]
    fn position(&self) -> Point3<f32> {
        self.position
    }

    fn normal(&self) -> Option<Vector3<f32>> {
        Some(self.normal)
    }

    fn approx_eq(&self, other: &Self) -> bool {
        point_equals(&self.position, &other.position)
            && vec3_equals(&self.normal, &other.normal)
    }
}

impl fmt::Display for VertexPN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        fmt_point(f, &self.position)?;
        write!(f, ", ")?;
        fmt_vec3(f, &self.normal)?;
        write!(f, "]")
    }
}

/// Vertex with position, texture coordinate and normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexPTN {
    /// Position.
    pub position: Point3<f32>,
    /// Texture coordinate.
    pub uv: Vector2<f32>,
    /// Normal.
    pub normal: Vector3<f32>,
}

impl VertexPTN {
    /// Create a vertex from all three attributes.
    pub fn new(position: Point3<f32>, uv: Vector2<f32>, normal: Vector3<f32>) -> Self {
        Self {
            position,
            uv,
            normal,
        }
    }
}

impl Vertex for VertexPTN {
    const COMPONENTS: u32 = 3;

    #[inline]
    fn position(&self) -> Point3<f32> {
        self.position
    }

    fn uv(&self) -> Option<Vector2<f32>> {
        Some(self.uv)
    }

    fn normal(&self) -> Option<Vector3<f32>> {
        Some(self.normal)
    }

    fn approx_eq(&self, other: &Self) -> bool {
        point_equals(&self.position, &other.position)
            && vec2_equals(&self.uv, &other.uv)
            && vec3_equals(&self.normal, &other.normal)
    }
}

impl fmt::Display for VertexPTN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        fmt_point(f, &self.position)?;
        write!(f, ", ")?;
        fmt_vec2(f, &self.uv)?;
        write!(f, ", ")?;
        fmt_vec3(f, &self.normal)?;
        write!(f, "]")
    }
}
