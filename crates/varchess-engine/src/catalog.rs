//! Registry of the variants a game can be set up with.

use crate::rules::{Rules, Variant};
use crate::EngineError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use varchess_core::{BoardContext, Geometry};

pub(crate) const CLASSIC: &str = include_str!("../variants/classic.toml");
pub(crate) const GARDNER: &str = include_str!("../variants/gardner.toml");
pub(crate) const CAPABLANCA: &str = include_str!("../variants/capablanca.toml");

/// Variants by setup name.
///
/// The catalog is also the board context used when decoding records: the
/// `setup` header selects the geometry that move coordinates are checked
/// against.
#[derive(Debug, Clone, Default)]
pub struct VariantCatalog {
    variants: BTreeMap<String, Arc<dyn Rules>>,
}

impl VariantCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog with the variants shipped with the engine.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for text in [CLASSIC, GARDNER, CAPABLANCA] {
            let variant = Variant::from_toml(text).expect("built-in variant is valid");
            catalog.insert(Arc::new(variant));
        }
        catalog
    }

    /// Registers a rules provider under its own name, replacing any previous
    /// entry with that name.
    pub fn insert(&mut self, rules: Arc<dyn Rules>) {
        self.variants.insert(rules.name().to_string(), rules);
    }

    /// Loads every `*.toml` file in `dir`, in file name order.
    ///
    /// Returns the number of variants loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, EngineError> {
        let access = |source: std::io::Error| EngineError::FileAccess {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(access)? {
            let path = entry.map_err(access)?.path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let text = std::fs::read_to_string(path).map_err(|source| EngineError::FileAccess {
                path: path.clone(),
                source,
            })?;
            let variant = Variant::from_toml(&text).map_err(|e| match e {
                EngineError::InvalidVariant { reason, .. } => EngineError::InvalidVariant {
                    name: path.display().to_string(),
                    reason,
                },
                other => other,
            })?;
            debug!(name = variant.name(), path = %path.display(), "loaded variant");
            self.insert(Arc::new(variant));
        }
        Ok(paths.len())
    }

    /// Looks up a variant by setup name.
    pub fn get(&self, setup: &str) -> Result<Arc<dyn Rules>, EngineError> {
        self.variants
            .get(setup)
            .cloned()
            .ok_or_else(|| EngineError::UnknownSetup(setup.to_string()))
    }

    /// Setup names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl BoardContext for VariantCatalog {
    fn geometry_for(&self, setup: &str) -> Option<Geometry> {
        self.variants.get(setup).map(|rules| rules.geometry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use varchess_core::notation;

    #[test]
    fn builtin_variants() {
        let catalog = VariantCatalog::builtin();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, ["capablanca", "classic", "gardner"]);
        assert_eq!(catalog.geometry_for("gardner"), Geometry::new(5, 5).ok());
        assert_eq!(catalog.geometry_for("capablanca"), Geometry::new(10, 8).ok());
        assert!(matches!(
            catalog.get("shogi"),
            Err(EngineError::UnknownSetup(name)) if name == "shogi"
        ));
    }

    #[test]
    fn decode_checks_coordinates_against_setup() {
        let catalog = VariantCatalog::builtin();
        let wide = "setup=capablanca\n{BEGIN}\ni2i4\n";
        assert!(notation::decode(wide, &catalog).is_ok());
        let narrow = "setup=classic\n{BEGIN}\ni2i4\n";
        assert!(notation::decode(narrow, &catalog).is_err());
    }

    #[test]
    fn load_dir_reads_toml_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("kings.toml")).unwrap();
        writeln!(
            file,
            "name = \"kings\"\nfiles = 3\nranks = 3\nplacement = \"k2/3/2K\"\n\
             [[pieces]]\nname = \"King\"\nsymbol = \"K\"\nroyal = true\n\
             leaps = [[0, 1], [1, 0], [-1, 0], [0, -1]]"
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut catalog = VariantCatalog::builtin();
        assert_eq!(catalog.load_dir(dir.path()).unwrap(), 1);
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.get("kings").unwrap().geometry().files(), 3);
    }

    #[test]
    fn load_dir_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.toml"), "name = ").unwrap();
        let err = VariantCatalog::new().load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("broken.toml"), "{}", err);

        let missing = dir.path().join("nope");
        assert!(matches!(
            VariantCatalog::new().load_dir(&missing),
            Err(EngineError::FileAccess { .. })
        ));
    }
}
