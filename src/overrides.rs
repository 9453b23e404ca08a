//! Override source reader
//!
//! Parses an external `NAME=VALUE` setup file (such as one produced by the
//! setup-file generator) into override pairs, split into required and optional
//! by the registry.
//!
//! # Format
//!
//! ```text
//! # comment
//! EPICS_BASE = /epics/base-7.0.3
//! SUPPORT=/epics/support
//! WITH_HDF5=NO
//! ```
//!
//! Every whitespace character is removed before a line is parsed, so the
//! spaces around `=` above are ignored.

use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ConfigError, Result};
use crate::fs::FileSystem;
use crate::registry::MacroRegistry;

/// A macro name with the value to substitute for it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverridePair {
    pub name: String,
    pub value: String,
}

impl OverridePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The pair as a configuration line without terminator
    pub fn to_line(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl fmt::Display for OverridePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Reader behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Treat `#NAME=VALUE` lines as overrides instead of comments
    pub accept_commented: bool,
}

/// Result of parsing an override source
#[derive(Debug, Default)]
pub struct ParsedOverrides {
    /// Overrides for registry-required macros, in file order
    pub required: Vec<OverridePair>,
    /// Everything else, in file order
    pub optional: Vec<OverridePair>,
    /// Lines that were skipped, as `MalformedOverrideLine` errors
    pub diagnostics: Vec<ConfigError>,
}

impl ParsedOverrides {
    /// First override for `name` among the required overrides
    pub fn required_value(&self, name: &str) -> Option<&str> {
        self.required
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty()
    }
}

/// Remove every whitespace character from a line
pub fn remove_whitespace(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parse override text.
///
/// Lines without `=` are skipped silently. Lines with an empty name or value
/// are skipped and reported in `diagnostics`. The value is everything after
/// the first `=`.
pub fn parse_overrides(
    text: &str,
    registry: &MacroRegistry,
    options: ReaderOptions,
) -> ParsedOverrides {
    let mut parsed = ParsedOverrides::default();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let compact = remove_whitespace(raw);

        let body = match compact.strip_prefix('#') {
            Some(rest) if options.accept_commented => rest,
            Some(_) => continue,
            None => compact.as_str(),
        };

        let Some((name, value)) = body.split_once('=') else {
            continue;
        };

        if name.is_empty() {
            let diag = ConfigError::malformed_line(line_no, "missing macro name before '='");
            warn!("{}", diag);
            parsed.diagnostics.push(diag);
            continue;
        }
        if value.is_empty() {
            let diag = ConfigError::malformed_line(
                line_no,
                format!("bypassing macro {}, no value specified", name),
            );
            warn!("{}", diag);
            parsed.diagnostics.push(diag);
            continue;
        }

        let pair = OverridePair::new(name, value);
        if registry.is_required(name) {
            parsed.required.push(pair);
        } else {
            parsed.optional.push(pair);
        }
    }

    debug!(
        "Parsed {} required and {} optional overrides ({} skipped)",
        parsed.required.len(),
        parsed.optional.len(),
        parsed.diagnostics.len()
    );
    parsed
}

/// Read and parse an override file.
///
/// Fails with `SourceNotFound` when the file cannot be read; no other error
/// is fatal.
pub fn load_overrides<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    registry: &MacroRegistry,
    options: ReaderOptions,
) -> Result<ParsedOverrides> {
    let text = fs
        .read_to_string(path)
        .map_err(|e| ConfigError::source_not_found(path, e))?;
    debug!("Loaded override source {:?}", path);
    Ok(parse_overrides(&text, registry, options))
}
