//! Macro registry
//!
//! The declarative table of every macro the tool knows about. Each entry is
//! tagged required or optional and carries the default value written when no
//! override is supplied. The registry is built once, validated, and then only
//! read; it is passed explicitly to every pipeline stage.

use std::collections::HashSet;

use crate::error::{ConfigError, Result};
use crate::overrides::OverridePair;
use crate::types::MacroKind;

/// A single known macro
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroEntry {
    /// Macro name as it appears at the start of a configuration line (case-sensitive)
    pub name: String,
    /// Value used when no override is supplied
    pub default_value: String,
    pub kind: MacroKind,
}

impl MacroEntry {
    /// Create a required macro
    pub fn required(name: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: default_value.into(),
            kind: MacroKind::Required,
        }
    }

    /// Create an optional macro
    pub fn optional(name: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: default_value.into(),
            kind: MacroKind::Optional,
        }
    }

    pub fn is_required(&self) -> bool {
        self.kind == MacroKind::Required
    }

    /// The entry as a name/default pair
    pub fn to_pair(&self) -> OverridePair {
        OverridePair::new(&self.name, &self.default_value)
    }
}

/// Ordered, immutable collection of required and optional macros.
///
/// # Invariants
///
/// - Names are unique across both lists.
/// - Order is preserved; it is the tie-break order for prefix matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroRegistry {
    required: Vec<MacroEntry>,
    optional: Vec<MacroEntry>,
}

impl MacroRegistry {
    /// Build a registry, failing on the first duplicated name.
    ///
    /// The `kind` of each entry is normalised to the list it was passed in.
    pub fn new(required: Vec<MacroEntry>, optional: Vec<MacroEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in required.iter().chain(optional.iter()) {
            if entry.name.is_empty() {
                return Err(ConfigError::invalid_registry("macro names cannot be empty"));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateMacro {
                    name: entry.name.clone(),
                });
            }
        }

        let required = required
            .into_iter()
            .map(|e| MacroEntry {
                kind: MacroKind::Required,
                ..e
            })
            .collect();
        let optional = optional
            .into_iter()
            .map(|e| MacroEntry {
                kind: MacroKind::Optional,
                ..e
            })
            .collect();

        Ok(Self { required, optional })
    }

    /// The stock areaDetector table.
    ///
    /// Paths assume an EPICS 7 base under `/epics` and a synApps support tree;
    /// optional entries are the `WITH_*` / `*_EXTERNAL` library toggles from
    /// `CONFIG_SITE.local`.
    pub fn area_detector() -> Self {
        let required = [
            ("EPICS_BASE", "/epics/base-7.0.1.1"),
            ("SUPPORT", "/epics/synAppsRelease/synApps/support"),
            ("AREA_DETECTOR", "$(SUPPORT)/areaDetector-3-3-2"),
            ("ADSupport", "$(AREA_DETECTOR)/ADSupport"),
            ("BUSY", "$(SUPPORT)/busy"),
            ("ASYN", "$(SUPPORT)/asyn"),
            ("SNCSEQ", "$(SUPPORT)/seq-2-2-5"),
            ("SSCAN", "$(SUPPORT)/sscan"),
            ("ALIVE", "$(SUPPORT)/alive"),
            ("AUTOSAVE", "$(SUPPORT)/autosave"),
            ("CALC", "$(SUPPORT)/calc"),
            ("ADCORE", "$(AREA_DETECTOR)/ADCore"),
            ("DEVIOCSTATS", "$(SUPPORT)/iocStats"),
            ("PVA", "path to pva"),
        ];

        let optional = [
            // Boost is only used for the AD unit tests
            ("WITH_BOOST", "NO"),
            // Needed by NDPluginPva, pvaDriver and qsrv
            ("WITH_PVA", "YES"),
            ("WITH_QSRV", "YES"),
            ("WITH_BLOSC", "YES"),
            ("BLOSC_EXTERNAL", "NO"),
            ("WITH_GRAPHICSMAGIK", "YES"),
            ("GRAPHICSMAGICK_EXTERNAL", "NO"),
            ("GRAPHICSMAGICK_PREFIX_SYMBOLS", "YES"),
            ("WITH_HDF5", "YES"),
            ("HDF5_EXTERNAL", "NO"),
            ("WITH_JPEG", "YES"),
            ("JPEG_EXTERNAL", "NO"),
            ("WITH_NETCDF", "YES"),
            ("NETCDF_EXTERNAL", "NO"),
            ("WITH_NEXUS", "YES"),
            ("NEXUS_EXTERNAL", "NO"),
            ("WITH_OPENCV", "NO"),
            ("OPENCV_EXTERNAL", "YES"),
            ("WITH_SZIP", "YES"),
            ("SZIP_EXTERNAL", "NO"),
            ("WITH_TIFF", "YES"),
            ("TIFF_EXTERNAL", "NO"),
            ("XML2_EXTERNAL", "NO"),
            ("WITH_ZLIB", "YES"),
            ("ZLIB_EXTERNAL", "NO"),
        ];

        Self {
            required: required
                .iter()
                .map(|(n, v)| MacroEntry::required(*n, *v))
                .collect(),
            optional: optional
                .iter()
                .map(|(n, v)| MacroEntry::optional(*n, *v))
                .collect(),
        }
    }

    /// Required entries in registry order
    pub fn required(&self) -> &[MacroEntry] {
        &self.required
    }

    /// Optional entries in registry order
    pub fn optional(&self) -> &[MacroEntry] {
        &self.optional
    }

    /// Membership test against the required set
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|e| e.name == name)
    }

    /// Look up an entry by exact name
    pub fn get(&self, name: &str) -> Option<&MacroEntry> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .find(|e| e.name == name)
    }

    /// All entries, required first
    pub fn iter(&self) -> impl Iterator<Item = &MacroEntry> {
        self.required.iter().chain(self.optional.iter())
    }

    pub fn len(&self) -> usize {
        self.required.len() + self.optional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MacroRegistry {
    fn default() -> Self {
        Self::area_detector()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_detector_table_is_valid() {
        let builtin = MacroRegistry::area_detector();
        // Rebuilding through the validating constructor must succeed
        let rebuilt = MacroRegistry::new(builtin.required().to_vec(), builtin.optional().to_vec())
            .expect("built-in registry has unique names");
        assert_eq!(rebuilt, builtin);
        assert_eq!(builtin.required().len(), 14);
        assert_eq!(builtin.optional().len(), 25);
    }

    #[test]
    fn test_required_order_starts_with_base_and_support() {
        let registry = MacroRegistry::area_detector();
        let names: Vec<&str> = registry.required().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(&names[..3], &["EPICS_BASE", "SUPPORT", "AREA_DETECTOR"]);
    }

    #[test]
    fn test_is_required() {
        let registry = MacroRegistry::area_detector();
        assert!(registry.is_required("EPICS_BASE"));
        assert!(registry.is_required("ADSupport"));
        assert!(!registry.is_required("WITH_HDF5"));
        // Case-sensitive
        assert!(!registry.is_required("epics_base"));
        assert!(!registry.is_required("UNKNOWN"));
    }

    #[test]
    fn test_duplicate_required_fails_fast() {
        let err = MacroRegistry::new(
            vec![
                MacroEntry::required("EPICS_BASE", "/a"),
                MacroEntry::required("EPICS_BASE", "/b"),
            ],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateMacro { name } if name == "EPICS_BASE"));
    }

    #[test]
    fn test_duplicate_across_lists_fails_fast() {
        let err = MacroRegistry::new(
            vec![MacroEntry::required("WITH_HDF5", "YES")],
            vec![MacroEntry::optional("WITH_HDF5", "NO")],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateMacro { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = MacroRegistry::new(vec![MacroEntry::required("", "x")], vec![]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegistry(_)));
    }

    #[test]
    fn test_kind_normalised_to_list() {
        let registry = MacroRegistry::new(
            vec![MacroEntry::optional("EPICS_BASE", "/epics/base")],
            vec![MacroEntry::required("WITH_TIFF", "YES")],
        )
        .expect("unique names");
        assert!(registry.required()[0].is_required());
        assert!(!registry.optional()[0].is_required());
    }

    #[test]
    fn test_get_finds_optional_entries() {
        let registry = MacroRegistry::area_detector();
        let entry = registry.get("WITH_OPENCV").expect("WITH_OPENCV is built in");
        assert_eq!(entry.default_value, "NO");
        assert_eq!(entry.kind, MacroKind::Optional);
        assert_eq!(registry.len(), 39);
    }
}
