//! Material records.
//!
//! Materials are opaque payload as far as mesh operations are concerned: a
//! material group names a [`Material`], and slicing/flattening carries the
//! records along. The fields mirror the standard MTL statements.

use std::collections::BTreeMap;
use std::fmt;

use nalgebra::Vector3;

/// Materials keyed by name. Iteration is sorted by name so output is stable.
pub type MaterialMap = BTreeMap<String, Material>;

/// A surface material.
///
/// Texture maps, when given, take precedence over the plain coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name.
    pub name: String,
    /// Diffuse coefficient (RGB, 0-1).
    pub kd: Vector3<f32>,
    /// Ambient coefficient (RGB, 0-1).
    pub ka: Vector3<f32>,
    /// Transmission filter (RGB, 0-1).
    pub tf: Vector3<f32>,
    /// Specular coefficient (RGB, 0-1).
    pub ks: Vector3<f32>,
    /// Refraction index (0.001-10).
    pub ni: f32,
    /// Dissolve (0-1).
    pub d: f32,
    /// Specular exponent (0-1000).
    pub ns: f32,
    /// Ambient texture map.
    pub map_ka: Option<String>,
    /// Diffuse texture map.
    pub map_kd: Option<String>,
    /// Specular texture map.
    pub map_ks: Option<String>,
}

impl Material {
    /// Create a material with default coefficients.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kd: Vector3::zeros(),
            ka: Vector3::zeros(),
            tf: Vector3::zeros(),
            ks: Vector3::zeros(),
            ni: 1.0,
            d: 1.0,
            ns: 1.0,
            map_ka: None,
            map_kd: None,
            map_ks: None,
        }
    }

    /// Set the diffuse coefficient.
    pub fn with_diffuse(mut self, kd: Vector3<f32>) -> Self {
        self.kd = kd;
        self
    }

    /// Set the diffuse texture map.
    pub fn with_diffuse_map(mut self, map: impl Into<String>) -> Self {
        self.map_kd = Some(map.into());
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("")
    }
}

/// MTL-style listing without the leading `newmtl` keyword.
impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rgb = |v: &Vector3<f32>| format!("{} {} {}", v.x, v.y, v.z);
        writeln!(f, "{}", self.name)?;
        writeln!(f, "illum 4")?;
        writeln!(f, "Kd {}", rgb(&self.kd))?;
        writeln!(f, "Ka {}", rgb(&self.ka))?;
        writeln!(f, "Tf {}", rgb(&self.tf))?;
        writeln!(f, "Ni {}", self.ni)?;
        writeln!(f, "d {}", self.d)?;
        writeln!(f, "Ns {}", self.ns)?;
        writeln!(f, "Ks {}", rgb(&self.ks))?;
        if let Some(map) = &self.map_ka {
            writeln!(f, "map_Ka {}", map)?;
        }
        if let Some(map) = &self.map_kd {
            writeln!(f, "map_Kd {}", map)?;
        }
        if let Some(map) = &self.map_ks {
            writeln!(f, "map_Ks {}", map)?;
        }
        Ok(())
    }
}

/// Look up `name`, falling back to a default record carrying that name.
///
/// A material group may legitimately name a material that has not been
/// loaded yet, so a miss is logged rather than treated as an error.
pub fn lookup_or_default(materials: &MaterialMap, name: &str) -> Material {
    match materials.get(name) {
        Some(material) => material.clone(),
        None => {
            log::warn!("material '{}' not found, using defaults", name);
            Material::new(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let m = Material::new("steel");
        assert_eq!(m.name, "steel");
        assert_eq!(m.ni, 1.0);
        assert_eq!(m.d, 1.0);
        assert_eq!(m.ns, 1.0);
        assert_eq!(m.kd, Vector3::zeros());
        assert!(m.map_kd.is_none());
    }

    #[test]
    fn test_lookup_miss_returns_named_default() {
        let mut materials = MaterialMap::new();
        materials.insert(
            "red".to_string(),
            Material::new("red").with_diffuse(Vector3::new(1.0, 0.0, 0.0)),
        );

        assert_eq!(lookup_or_default(&materials, "red").kd.x, 1.0);
        assert_eq!(lookup_or_default(&materials, "blue"), Material::new("blue"));
    }

    #[test]
    fn test_map_iterates_by_name() {
        let mut materials = MaterialMap::new();
        for name in ["zinc", "brass", "iron"] {
            materials.insert(name.to_string(), Material::new(name));
        }
        let names: Vec<&str> = materials.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["brass", "iron", "zinc"]);
    }

    #[test]
    fn test_display_lists_maps_only_when_present() {
        let plain = Material::new("plain").to_string();
        assert!(plain.starts_with("plain\nillum 4\n"));
        assert!(!plain.contains("map_Kd"));

        let textured = Material::new("wood").with_diffuse_map("wood.png").to_string();
        assert!(textured.contains("map_Kd wood.png\n"));
    }
}
