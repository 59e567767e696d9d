//! Wavefront MTL material libraries.
//!
//! Recognized statements: `newmtl`, `Kd`, `Ka`, `Tf`, `Ks`, `Ni`, `Ns`, `d`,
//! `map_Ka`, `map_Kd` and `map_Ks`. `illum` is accepted and ignored; anything
//! else is logged and skipped.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Vector3;

use super::obj::normalize_material_name;
use crate::error::{MeshError, Result};
use crate::mesh::{Material, MaterialMap};

fn parse_scalar(line: usize, token: &str, rest: &str) -> Result<f32> {
    rest.split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| MeshError::parse(line, format!("'{}' expects a number", token)))
}

fn parse_rgb(line: usize, token: &str, rest: &str) -> Result<Vector3<f32>> {
    let values: Vec<f32> = rest
        .split_whitespace()
        .take(3)
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| MeshError::parse(line, format!("'{}': {}", token, e)))?;
    if values.len() != 3 {
        return Err(MeshError::parse(line, format!("'{}' expects 3 numbers", token)));
    }
    Ok(Vector3::new(values[0], values[1], values[2]))
}

/// Parse the text of a material library.
pub fn parse(text: &str) -> Result<MaterialMap> {
    let mut materials = MaterialMap::new();
    let mut current: Option<String> = None;

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (token, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        if token == "newmtl" {
            let name = normalize_material_name(rest);
            materials.insert(name.clone(), Material::new(name.clone()));
            current = Some(name);
            continue;
        }
        if token == "illum" {
            continue;
        }

        let Some(material) = current.as_ref().and_then(|name| materials.get_mut(name)) else {
            return Err(MeshError::parse(
                line_no,
                format!("'{}' before any newmtl", token),
            ));
        };

        match token {
            "Kd" => material.kd = parse_rgb(line_no, token, rest)?,
            "Ka" => material.ka = parse_rgb(line_no, token, rest)?,
            "Tf" => material.tf = parse_rgb(line_no, token, rest)?,
            "Ks" => material.ks = parse_rgb(line_no, token, rest)?,
            "Ni" => material.ni = parse_scalar(line_no, token, rest)?,
            "Ns" => material.ns = parse_scalar(line_no, token, rest)?,
            "d" => material.d = parse_scalar(line_no, token, rest)?,
            "map_Ka" => material.map_ka = Some(rest.to_string()),
            "map_Kd" => material.map_kd = Some(rest.to_string()),
            "map_Ks" => material.map_ks = Some(rest.to_string()),
            _ => log::warn!("mtl line {}: unrecognised token '{}'", line_no, token),
        }
    }

    Ok(materials)
}

/// Load a material library from a file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<MaterialMap> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse(&text)
}

/// Write materials as an MTL library, in name order.
pub fn write<W: Write>(materials: &MaterialMap, out: &mut W) -> Result<()> {
    for material in materials.values() {
        write!(out, "newmtl {}", material)?;
    }
    Ok(())
}

/// Save materials to an MTL file.
pub fn save<P: AsRef<Path>>(materials: &MaterialMap, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write(materials, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = "\
# exported
newmtl red paint__Grp3
illum 2
Kd 1 0 0
Ka 0.1 0.1 0.1
Ni 1.5
d 0.5
Ns 32
map_Kd textures/red.png

newmtl glass
Tf 0.9 0.9 1
";

    #[test]
    fn test_parse_library() {
        let materials = parse(LIBRARY).unwrap();
        assert_eq!(materials.len(), 2);

        let red = &materials["red_paint"];
        assert_eq!(red.kd, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(red.ka, Vector3::new(0.1, 0.1, 0.1));
        assert_eq!(red.ni, 1.5);
        assert_eq!(red.d, 0.5);
        assert_eq!(red.ns, 32.0);
        assert_eq!(red.map_kd.as_deref(), Some("textures/red.png"));

        let glass = &materials["glass"];
        assert_eq!(glass.tf, Vector3::new(0.9, 0.9, 1.0));
        assert_eq!(glass.ni, 1.0);
    }

    #[test]
    fn test_unknown_tokens_are_skipped() {
        let materials = parse("newmtl a\nPr 0.5\nKd 0 1 0\n").unwrap();
        assert_eq!(materials["a"].kd, Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_statement_before_newmtl() {
        let result = parse("Kd 1 1 1\n");
        assert!(matches!(result, Err(MeshError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_bad_rgb() {
        let result = parse("newmtl a\nKd 1 x 1\n");
        assert!(matches!(result, Err(MeshError::Parse { line: 2, .. })));
        let result = parse("newmtl a\nKs 1 1\n");
        assert!(matches!(result, Err(MeshError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_write_then_parse() {
        let materials = parse(LIBRARY).unwrap();
        let mut out = Vec::new();
        write(&materials, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        // Name order: glass before red_paint.
        assert!(text.starts_with("newmtl glass\nillum 4\n"));
        assert_eq!(parse(&text).unwrap(), materials);
    }
}
