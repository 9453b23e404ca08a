//! adconfig library
//!
//! A macro substitution engine for EPICS/areaDetector build configuration:
//! a registry of known macros, an override-file reader, a line rewriter for
//! `EXAMPLE_*` templates, a directory driver that archives consumed templates,
//! and the inverse setup-file generator.

pub mod cli;
pub mod config;
pub mod config_file;
pub mod driver;
pub mod error;
pub mod fs;
pub mod overrides;
pub mod plan;
pub mod registry;
pub mod rewrite;
pub mod setup_file;
pub mod types;

// Re-export main types for convenience
pub use config::Settings;
pub use config_file::RegistryFile;
pub use driver::{ConfigureOptions, DirectoryDriver, RunReport};
pub use error::{ConfigError, Result};
pub use fs::{DiskFs, FileSystem, MemoryFs};
pub use overrides::{load_overrides, parse_overrides, OverridePair, ParsedOverrides, ReaderOptions};
pub use plan::{SubstitutionPlan, ValueSource};
pub use registry::{MacroEntry, MacroRegistry};
pub use rewrite::{rewrite_text, RewriteOptions, RewriteOutcome, TemplateRewriter};
pub use setup_file::{GeneratedSetup, GeneratorOptions, SetupFileGenerator};
pub use types::{MacroKind, PlatformFamily};
