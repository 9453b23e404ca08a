//! Directory driver
//!
//! Orchestrates a configure run over one working directory (normally
//! `areaDetector/configure`):
//!
//! 1. Check the working directory exists, create the archive directory
//! 2. Optionally prune templates for other architectures
//! 3. Rewrite every remaining template, collecting per-file failures
//!
//! Templates are processed one at a time in sorted name order. Archive moves
//! overwrite older entries, so the last run wins.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{ConfigError, Result};
use crate::fs::FileSystem;
use crate::plan::SubstitutionPlan;
use crate::rewrite::{RewriteOptions, RewriteOutcome, TemplateRewriter};

/// Switches for a configure run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigureOptions {
    pub rewrite: RewriteOptions,
    /// Delete templates that do not apply to the configured architecture
    pub prune_other_arches: bool,
}

/// Summary of a configure run
#[derive(Debug, Default)]
pub struct RunReport {
    pub rewritten: Vec<RewriteOutcome>,
    /// Templates deleted by pruning
    pub pruned: Vec<PathBuf>,
    /// Templates that could not be processed; the run carried on without them
    pub failures: Vec<(PathBuf, ConfigError)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Exit code of the first failure, 0 when everything succeeded
    pub fn exit_code(&self) -> i32 {
        self.failures
            .first()
            .map(|(_, e)| e.exit_code())
            .unwrap_or(0)
    }

    /// Short human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} file(s) generated, {} template(s) pruned, {} failure(s)",
            self.rewritten.len(),
            self.pruned.len(),
            self.failures.len()
        )
    }
}

/// Runs the configure pipeline over a directory
pub struct DirectoryDriver<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    plan: &'a SubstitutionPlan,
    settings: &'a Settings,
    options: ConfigureOptions,
}

impl<'a, F: FileSystem + ?Sized> DirectoryDriver<'a, F> {
    pub fn new(
        fs: &'a F,
        plan: &'a SubstitutionPlan,
        settings: &'a Settings,
        options: ConfigureOptions,
    ) -> Self {
        Self {
            fs,
            plan,
            settings,
            options,
        }
    }

    /// Configure every template in `working_dir`.
    ///
    /// Returns `Err` only for directory-level problems (missing working
    /// directory, archive directory cannot be created, directory cannot be
    /// listed). Per-template problems end up in `RunReport::failures`.
    pub fn run(&self, working_dir: &Path) -> Result<RunReport> {
        if !self.fs.is_dir(working_dir) {
            return Err(ConfigError::WorkingDirMissing {
                path: working_dir.to_path_buf(),
            });
        }

        let archive_dir = working_dir.join(&self.settings.archive_dir);
        if !self.fs.is_dir(&archive_dir) {
            self.fs.create_dir_all(&archive_dir).map_err(|e| {
                ConfigError::archive_move_failed(working_dir, &archive_dir, e.to_string())
            })?;
            debug!("Created archive directory {:?}", archive_dir);
        }

        let mut report = RunReport::default();

        if self.options.prune_other_arches {
            self.prune(working_dir, &mut report)?;
        }

        let rewriter = TemplateRewriter::new(self.fs, self.plan, self.settings, self.options.rewrite);
        for name in self.templates(working_dir)? {
            let template = working_dir.join(&name);
            match rewriter.rewrite(&template) {
                Ok(outcome) => report.rewritten.push(outcome),
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    report.failures.push((template, e));
                }
            }
        }

        info!("Configure run in {:?}: {}", working_dir, report.summary());
        Ok(report)
    }

    fn templates(&self, working_dir: &Path) -> Result<Vec<String>> {
        Ok(self
            .fs
            .list_files(working_dir)?
            .into_iter()
            .filter(|name| self.settings.is_template(name))
            .collect())
    }

    fn prune(&self, working_dir: &Path, report: &mut RunReport) -> Result<()> {
        for name in self.templates(working_dir)? {
            if self.settings.is_for_target(&name) {
                continue;
            }
            let path = working_dir.join(&name);
            match self.fs.remove_file(&path) {
                Ok(()) => {
                    debug!("Pruned {}", name);
                    report.pruned.push(path);
                }
                Err(e) => {
                    warn!("Could not prune {}: {}", name, e);
                    report.failures.push((path, e.into()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use crate::registry::{MacroEntry, MacroRegistry};
    use crate::types::PlatformFamily;

    fn scenario_plan() -> SubstitutionPlan {
        let registry = MacroRegistry::new(
            vec![MacroEntry::required("EPICS_BASE", "/epics/base-7.0.1.1")],
            vec![],
        )
        .expect("unique names");
        SubstitutionPlan::from_registry(&registry)
    }

    fn linux_settings() -> Settings {
        Settings {
            host_family: PlatformFamily::Linux,
            ..Settings::default()
        }
    }

    #[test]
    fn test_epics_base_scenario() {
        let fs = MemoryFs::new();
        fs.insert("/cfg/EXAMPLE_CONFIG", "EPICS_BASE=/old\n");

        let plan = scenario_plan();
        let settings = linux_settings();
        let report = DirectoryDriver::new(&fs, &plan, &settings, ConfigureOptions::default())
            .run(Path::new("/cfg"))
            .expect("run succeeds");

        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(
            fs.contents("/cfg/CONFIG").as_deref(),
            Some("EPICS_BASE=/epics/base-7.0.1.1\n")
        );
        assert!(fs.is_file(Path::new("/cfg/EXAMPLE_FILES/EXAMPLE_CONFIG")));
        assert!(!fs.is_file(Path::new("/cfg/EXAMPLE_CONFIG")));
    }

    #[test]
    fn test_missing_working_dir_is_fatal() {
        let fs = MemoryFs::new();
        let plan = scenario_plan();
        let settings = linux_settings();
        let err = DirectoryDriver::new(&fs, &plan, &settings, ConfigureOptions::default())
            .run(Path::new("/nowhere"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::WorkingDirMissing { .. }));
    }

    #[test]
    fn test_non_templates_left_alone() {
        let fs = MemoryFs::new();
        fs.insert("/cfg/RELEASE", "EPICS_BASE=/keep\n");
        fs.insert("/cfg/EXAMPLE_RELEASE.local", "EPICS_BASE=/old\n");

        let plan = scenario_plan();
        let settings = linux_settings();
        let report = DirectoryDriver::new(&fs, &plan, &settings, ConfigureOptions::default())
            .run(Path::new("/cfg"))
            .expect("run succeeds");

        assert_eq!(report.rewritten.len(), 1);
        assert_eq!(fs.contents("/cfg/RELEASE").as_deref(), Some("EPICS_BASE=/keep\n"));
    }

    #[test]
    fn test_prune_other_arches() {
        let fs = MemoryFs::new();
        fs.insert("/cfg/EXAMPLE_RELEASE.local", "");
        fs.insert("/cfg/EXAMPLE_RELEASE.local.linux-x86_64", "");
        fs.insert("/cfg/EXAMPLE_RELEASE.local.win32-x86", "");
        fs.insert("/cfg/EXAMPLE_CONFIG_SITE.local.Linux", "");
        fs.insert("/cfg/EXAMPLE_CONFIG_SITE.local.vxWorks-ppc32", "");

        let plan = scenario_plan();
        let settings = linux_settings();
        let options = ConfigureOptions {
            prune_other_arches: true,
            ..ConfigureOptions::default()
        };
        let report = DirectoryDriver::new(&fs, &plan, &settings, options)
            .run(Path::new("/cfg"))
            .expect("run succeeds");

        let pruned: Vec<String> = report
            .pruned
            .iter()
            .map(|p| p.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            pruned,
            vec![
                "EXAMPLE_CONFIG_SITE.local.vxWorks-ppc32".to_string(),
                "EXAMPLE_RELEASE.local.win32-x86".to_string(),
            ]
        );
        assert_eq!(report.rewritten.len(), 3);
        assert!(fs.is_file(Path::new("/cfg/CONFIG_SITE.local.Linux")));
        assert!(!fs.is_file(Path::new("/cfg/RELEASE.local.win32-x86")));
        // Pruned templates are deleted, not archived
        assert!(!fs.is_file(Path::new("/cfg/EXAMPLE_FILES/EXAMPLE_RELEASE.local.win32-x86")));
    }

    #[test]
    fn test_failure_does_not_stop_run() {
        let fs = MemoryFs::new();
        fs.insert("/cfg/EXAMPLE_", "bad name\n");
        fs.insert("/cfg/EXAMPLE_CONFIG", "EPICS_BASE=/old\n");

        let plan = scenario_plan();
        let settings = linux_settings();
        let report = DirectoryDriver::new(&fs, &plan, &settings, ConfigureOptions::default())
            .run(Path::new("/cfg"))
            .expect("run succeeds");

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.exit_code(), 8);
        assert_eq!(report.rewritten.len(), 1);
        assert!(fs.is_file(Path::new("/cfg/CONFIG")));
    }

    #[test]
    fn test_archive_dir_creation_is_idempotent() {
        let fs = MemoryFs::new();
        fs.insert("/cfg/EXAMPLE_FILES/EXAMPLE_OLD", "old\n");
        fs.insert("/cfg/EXAMPLE_CONFIG", "EPICS_BASE=/old\n");

        let plan = scenario_plan();
        let settings = linux_settings();
        let driver = DirectoryDriver::new(&fs, &plan, &settings, ConfigureOptions::default());
        driver.run(Path::new("/cfg")).expect("first run");
        // Nothing left to do the second time
        let report = driver.run(Path::new("/cfg")).expect("second run");
        assert!(report.rewritten.is_empty());
        assert!(fs.is_file(Path::new("/cfg/EXAMPLE_FILES/EXAMPLE_OLD")));
    }
}
