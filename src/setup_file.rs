//! Setup-file generator
//!
//! The inverse of a configure run: harvests `NAME=VALUE` lines from the files
//! already present in a directory and writes them to a single setup file that
//! `configure --ext` can read back.
//!
//! The first file that defines a macro wins; later definitions of the same
//! name are ignored.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{ConfigError, Result};
use crate::fs::FileSystem;
use crate::overrides::{remove_whitespace, OverridePair};
use crate::registry::MacroRegistry;

/// First line of every generated setup file
pub const SETUP_FILE_HEADER: &str =
    "# Autogenerated setup file for Area Detector for use with configuration script.";

/// Generator switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Keep macros that are not registry-required
    pub include_optional: bool,
    /// Harvest lines commented out with a single `#`
    pub include_commented: bool,
    /// File names never scanned (the tool's own executable, for one)
    pub exclude: Vec<String>,
}

/// A harvested macro and the file it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredMacro {
    pub pair: OverridePair,
    pub file: String,
}

/// Result of a generate run
#[derive(Debug)]
pub struct GeneratedSetup {
    pub path: PathBuf,
    /// Macros written to the file, in discovery order
    pub written: Vec<DiscoveredMacro>,
    /// Files skipped because they could not be read as text
    pub skipped: Vec<(PathBuf, ConfigError)>,
}

/// Discovered macros plus the files that could not be read
type ScanResult = (Vec<DiscoveredMacro>, Vec<(PathBuf, ConfigError)>);

/// Extract a macro assignment from one line.
///
/// The name must be a plain identifier, so make-style `+=` and `:=`
/// assignments are not harvested.
pub fn extract_assignment(line: &str, include_commented: bool) -> Option<OverridePair> {
    if !line.contains('=') {
        return None;
    }
    let body = match line.strip_prefix('#') {
        Some(rest) if include_commented => rest,
        Some(_) => return None,
        None => line,
    };

    let compact = remove_whitespace(body);
    let (name, value) = compact.split_once('=')?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    // The override reader rejects empty values, so never write one
    if value.is_empty() {
        return None;
    }
    Some(OverridePair::new(name, value))
}

/// Render the setup file body
pub fn render_setup_file(pairs: &[OverridePair]) -> String {
    let mut out = String::new();
    out.push_str(SETUP_FILE_HEADER);
    out.push_str("\n\n");
    for pair in pairs {
        out.push_str(&pair.to_line());
        out.push('\n');
    }
    out
}

/// Harvests macros from a directory into a setup file
pub struct SetupFileGenerator<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    registry: &'a MacroRegistry,
    settings: &'a Settings,
    options: GeneratorOptions,
}

impl<'a, F: FileSystem + ?Sized> SetupFileGenerator<'a, F> {
    pub fn new(
        fs: &'a F,
        registry: &'a MacroRegistry,
        settings: &'a Settings,
        options: GeneratorOptions,
    ) -> Self {
        Self {
            fs,
            registry,
            settings,
            options,
        }
    }

    /// Scan `working_dir` without writing anything.
    pub fn scan(&self, working_dir: &Path) -> Result<ScanResult> {
        if !self.fs.is_dir(working_dir) {
            return Err(ConfigError::WorkingDirMissing {
                path: working_dir.to_path_buf(),
            });
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut discovered = Vec::new();
        let mut skipped = Vec::new();

        for name in self.fs.list_files(working_dir)? {
            if name == self.settings.setup_file_name || self.options.exclude.contains(&name) {
                continue;
            }
            let path = working_dir.join(&name);
            let text = match self.fs.read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping {} while generating setup file: {}", name, e);
                    skipped.push((path.clone(), ConfigError::template_unreadable(&path, e)));
                    continue;
                }
            };

            for line in text.lines() {
                let Some(pair) = extract_assignment(line, self.options.include_commented) else {
                    continue;
                };
                if seen.insert(pair.name.clone()) {
                    debug!("Found {} in {}", pair.name, name);
                    discovered.push(DiscoveredMacro {
                        pair,
                        file: name.clone(),
                    });
                }
            }
        }

        Ok((discovered, skipped))
    }

    /// Scan `working_dir` and write the setup file into it.
    pub fn generate(&self, working_dir: &Path) -> Result<GeneratedSetup> {
        let (discovered, skipped) = self.scan(working_dir)?;

        let written: Vec<DiscoveredMacro> = discovered
            .into_iter()
            .filter(|m| self.options.include_optional || self.registry.is_required(&m.pair.name))
            .collect();

        let pairs: Vec<OverridePair> = written.iter().map(|m| m.pair.clone()).collect();
        let path = working_dir.join(&self.settings.setup_file_name);
        self.fs.write(&path, &render_setup_file(&pairs))?;

        info!("Generated {:?} with {} macros", path, written.len());
        Ok(GeneratedSetup {
            path,
            written,
            skipped,
        })
    }
}
