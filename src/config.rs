//! Directory conventions
//!
//! Naming rules shared by the driver and the generator: which files are
//! templates, what their output is called, where originals are archived and
//! which templates belong to the current build target.

use crate::types::PlatformFamily;

/// Marker every template file name starts with
pub const MARKER_PREFIX: &str = "EXAMPLE";
/// Archive directory created under the working directory
pub const ARCHIVE_DIR: &str = "EXAMPLE_FILES";
/// Default name of the generated setup file
pub const SETUP_FILE_NAME: &str = "AD_SETUP_MACROS";
/// Suffix of site-local templates, kept regardless of architecture
pub const LOCAL_SUFFIX: &str = ".local";
/// Default EPICS host architecture
pub const DEFAULT_EPICS_ARCH: &str = "linux-x86_64";

/// Naming conventions for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub marker_prefix: String,
    pub archive_dir: String,
    pub setup_file_name: String,
    pub local_suffix: String,
    /// EPICS architecture tag of the build target (e.g. `linux-x86_64`)
    pub epics_arch: String,
    /// Family whose `EXAMPLE_*.<Family>` templates may be kept
    pub platform_family: PlatformFamily,
    /// Family of the machine running the tool
    pub host_family: PlatformFamily,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            marker_prefix: MARKER_PREFIX.to_string(),
            archive_dir: ARCHIVE_DIR.to_string(),
            setup_file_name: SETUP_FILE_NAME.to_string(),
            local_suffix: LOCAL_SUFFIX.to_string(),
            epics_arch: DEFAULT_EPICS_ARCH.to_string(),
            platform_family: PlatformFamily::Linux,
            host_family: PlatformFamily::host(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the EPICS architecture
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.epics_arch = arch.into();
        self
    }

    /// Override the platform family whose templates survive pruning
    pub fn with_family(mut self, family: PlatformFamily) -> Self {
        self.platform_family = family;
        self
    }

    /// Whether a file name marks a template
    pub fn is_template(&self, name: &str) -> bool {
        name.starts_with(&self.marker_prefix)
    }

    /// Output file name for a template.
    ///
    /// Strips the marker prefix and one `_` separator after it, so
    /// `EXAMPLE_CONFIG` becomes `CONFIG`. Returns `None` for non-templates and
    /// for templates with nothing left after stripping.
    pub fn output_name(&self, template_name: &str) -> Option<String> {
        let rest = template_name.strip_prefix(self.marker_prefix.as_str())?;
        let rest = rest.strip_prefix('_').unwrap_or(rest);
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }

    /// Whether a template applies to the configured target.
    ///
    /// Kept: site-local templates, templates for `epics_arch`, and
    /// family templates when the host is of that family.
    pub fn is_for_target(&self, template_name: &str) -> bool {
        if template_name.ends_with(&self.local_suffix) || template_name.ends_with(&self.epics_arch) {
            return true;
        }
        template_name.ends_with(&self.platform_family.suffix())
            && self.host_family == self.platform_family
    }
}
