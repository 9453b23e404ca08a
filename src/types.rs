//! Type-safe enums shared across the configuration pipeline
//!
//! Replaces stringly-typed flags with proper Rust enums that provide
//! compile-time validation and exhaustive matching.

use strum::{Display, EnumString};

/// Whether a macro is always substituted or only on request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MacroKind {
    /// Substituted on every run, registry default used when not overridden
    #[default]
    Required,
    /// Substituted only when optional replacement is enabled
    Optional,
}

/// Platform family used by the `EXAMPLE_*.<Family>` template suffix.
///
/// areaDetector ships per-family templates (e.g. `EXAMPLE_CONFIG_SITE.local.Linux`)
/// which apply to every architecture of that family. Parsed from `--family`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
pub enum PlatformFamily {
    #[default]
    #[strum(serialize = "Linux", ascii_case_insensitive)]
    Linux,
    #[strum(serialize = "Darwin", ascii_case_insensitive)]
    Darwin,
    #[strum(serialize = "WIN32", ascii_case_insensitive)]
    Windows,
    #[strum(serialize = "vxWorks", ascii_case_insensitive)]
    VxWorks,
}

impl PlatformFamily {
    /// Family of the platform this binary was compiled for
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            Self::Darwin
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// File name suffix used by templates of this family, e.g. `.Linux`
    pub fn suffix(&self) -> String {
        format!(".{}", self)
    }
}
