//! Configure pipeline tests against a real directory
//!
//! These tests verify:
//! - Default substitution of every required macro
//! - Override precedence from an external setup file
//! - Archive semantics (templates moved, outputs created)
//! - Commented-macro mode and optional-macro mode

use adconfig::{
    load_overrides, ConfigureOptions, DirectoryDriver, DiskFs, MacroRegistry, ReaderOptions,
    RewriteOptions, Settings, SubstitutionPlan,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const RELEASE_LIBS: &str = "\
# Paths to the core libraries areaDetector depends on
SUPPORT=/corvette/home/epics/devel
ASYN=$(SUPPORT)/asyn-4-33
AREA_DETECTOR=$(SUPPORT)/areaDetector-3-3-1
ADSUPPORT=$(AREA_DETECTOR)/ADSupport
ADCORE=$(AREA_DETECTOR)/ADCore
EPICS_BASE=/corvette/usr/local/epics-devel/base-7.0.1
-include $(TOP)/configure/RELEASE_LIBS.local.$(EPICS_HOST_ARCH)
";

const CONFIG_SITE: &str = "\
WITH_BOOST    = NO
#WITH_PVA  = YES
WITH_HDF5     = YES
HDF5_EXTERNAL = NO
";

fn setup_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("EXAMPLE_RELEASE_LIBS.local"), RELEASE_LIBS).expect("write");
    fs::write(dir.path().join("EXAMPLE_CONFIG_SITE.local"), CONFIG_SITE).expect("write");
    dir
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).expect("file should exist")
}

fn run(dir: &Path, plan: &SubstitutionPlan, options: ConfigureOptions) -> adconfig::RunReport {
    let settings = Settings::default();
    DirectoryDriver::new(&DiskFs, plan, &settings, options)
        .run(dir)
        .expect("configure run succeeds")
}

// =============================================================================
// Default substitution
// =============================================================================

#[test]
fn test_required_macros_replaced_with_defaults() {
    let dir = setup_dir();
    let registry = MacroRegistry::area_detector();
    let plan = SubstitutionPlan::from_registry(&registry);

    let report = run(dir.path(), &plan, ConfigureOptions::default());
    assert!(report.is_success());
    assert_eq!(report.rewritten.len(), 2);

    let output = read(dir.path(), "RELEASE_LIBS.local");
    for entry in registry.required() {
        let expected = format!("{}={}", entry.name, entry.default_value);
        let hits = output.lines().filter(|l| l.starts_with(&entry.name)).count();
        if hits > 0 {
            assert!(
                output.lines().any(|l| l == expected),
                "{} should be substituted",
                entry.name
            );
        }
    }
    assert!(output.contains("EPICS_BASE=/epics/base-7.0.1.1\n"));
    assert!(output.contains("ASYN=$(SUPPORT)/asyn\n"));
    // ADSUPPORT is not a registry name (ADSupport is, case-sensitive)
    assert!(output.contains("ADSUPPORT=$(AREA_DETECTOR)/ADSupport\n"));
    // Untouched lines survive verbatim
    assert!(output.starts_with("# Paths to the core libraries"));
    assert!(output.contains("-include $(TOP)/configure/RELEASE_LIBS.local.$(EPICS_HOST_ARCH)\n"));
}

#[test]
fn test_archive_semantics() {
    let dir = setup_dir();
    let plan = SubstitutionPlan::from_registry(&MacroRegistry::area_detector());
    run(dir.path(), &plan, ConfigureOptions::default());

    for name in ["EXAMPLE_RELEASE_LIBS.local", "EXAMPLE_CONFIG_SITE.local"] {
        assert!(!dir.path().join(name).exists(), "{} should be moved", name);
        assert!(
            dir.path().join("EXAMPLE_FILES").join(name).exists(),
            "{} should be archived",
            name
        );
    }
    assert_eq!(
        read(&dir.path().join("EXAMPLE_FILES"), "EXAMPLE_RELEASE_LIBS.local"),
        RELEASE_LIBS
    );
    assert!(dir.path().join("RELEASE_LIBS.local").exists());
    assert!(dir.path().join("CONFIG_SITE.local").exists());
}

// =============================================================================
// Overrides
// =============================================================================

#[test]
fn test_external_override_wins_over_default() {
    let dir = setup_dir();
    let setup = dir.path().join("site_macros");
    fs::write(
        &setup,
        "# site paths\nEPICS_BASE = /opt/epics/base-7.0.3\nWITH_HDF5=NO\nCALC=\n",
    )
    .expect("write");

    let registry = MacroRegistry::area_detector();
    let overrides =
        load_overrides(&DiskFs, &setup, &registry, ReaderOptions::default()).expect("readable");
    assert_eq!(overrides.diagnostics.len(), 1, "CALC= has no value");

    let plan = SubstitutionPlan::resolve(&registry, &overrides);
    assert_eq!(plan.value_of("EPICS_BASE"), Some("/opt/epics/base-7.0.3"));
    assert_eq!(plan.value_of("CALC"), Some("$(SUPPORT)/calc"));

    let options = ConfigureOptions {
        rewrite: RewriteOptions {
            replace_optional: true,
            replace_commented: false,
        },
        ..ConfigureOptions::default()
    };
    run(dir.path(), &plan, options);

    assert!(read(dir.path(), "RELEASE_LIBS.local").contains("EPICS_BASE=/opt/epics/base-7.0.3\n"));
    let site = read(dir.path(), "CONFIG_SITE.local");
    assert!(site.contains("WITH_HDF5=NO\n"));
    // Only overridden optional macros are touched
    assert!(site.contains("WITH_BOOST    = NO\n"));
}

// =============================================================================
// Commented and optional macros
// =============================================================================

#[test]
fn test_commented_and_optional_modes() {
    let dir = setup_dir();
    let plan = SubstitutionPlan::from_registry(&MacroRegistry::area_detector());

    let options = ConfigureOptions {
        rewrite: RewriteOptions {
            replace_optional: true,
            replace_commented: true,
        },
        ..ConfigureOptions::default()
    };
    run(dir.path(), &plan, options);

    let site = read(dir.path(), "CONFIG_SITE.local");
    assert_eq!(
        site,
        "WITH_BOOST=NO\nWITH_PVA=YES\nWITH_HDF5=YES\nHDF5_EXTERNAL=NO\n"
    );
}

#[test]
fn test_optional_untouched_by_default() {
    let dir = setup_dir();
    let plan = SubstitutionPlan::from_registry(&MacroRegistry::area_detector());
    run(dir.path(), &plan, ConfigureOptions::default());
    assert_eq!(read(dir.path(), "CONFIG_SITE.local"), CONFIG_SITE);
}

#[test]
fn test_missing_working_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let plan = SubstitutionPlan::from_registry(&MacroRegistry::area_detector());
    let settings = Settings::default();
    let err = DirectoryDriver::new(&DiskFs, &plan, &settings, ConfigureOptions::default())
        .run(&dir.path().join("configure"))
        .unwrap_err();
    assert_eq!(err.exit_code(), 6);
}
