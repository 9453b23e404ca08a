//! adconfig - Main entry point
//!
//! Thin CLI over the library: parse arguments, pick the registry and settings,
//! run one pipeline and turn the outcome into an exit code.

use anyhow::Result;
use std::path::Path;
use tracing::{debug, error, info};

use adconfig::cli::{Cli, Commands, ConfigureArgs};
use adconfig::config_file::{load_registry, RegistryFile};
use adconfig::{
    load_overrides, ConfigError, ConfigureOptions, DirectoryDriver, DiskFs, GeneratorOptions,
    MacroRegistry, ReaderOptions, RewriteOptions, Settings, SetupFileGenerator, SubstitutionPlan,
};

/// Initialize the logger with appropriate settings
fn init_logger(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    // RUST_LOG overrides the -v flags
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    debug!("CLI arguments parsed: {:?}", cli);

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            std::process::exit(exit_code_for(&e));
        }
    }
}

/// Exit code of the first `ConfigError` in the error chain
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|e| e.downcast_ref::<ConfigError>())
        .map(ConfigError::exit_code)
        .unwrap_or(1)
}

fn run(cli: &Cli) -> Result<i32> {
    let registry = load_registry(cli.registry.as_deref())?;
    let mut settings = Settings::new().with_arch(&cli.arch);
    if let Some(family) = cli.family {
        settings = settings.with_family(family);
    }

    match cli.command() {
        Commands::Configure(args) => run_configure(cli, &registry, &settings, &args),
        Commands::Generate {
            opt,
            commented,
            output,
        } => {
            let settings = Settings {
                setup_file_name: output,
                ..settings
            };
            run_generate(cli, &registry, &settings, opt, commented)
        }
        Commands::Plan {
            ext,
            read_commented,
            opt,
        } => {
            let plan = build_plan(&registry, ext.as_deref(), read_commented)?;
            for line in plan.describe(opt) {
                println!("{}", line);
            }
            Ok(0)
        }
        Commands::Registry { dump } => {
            match dump {
                Some(path) => {
                    RegistryFile::from_registry(&registry).save_to_file(&path)?;
                    println!("✓ Registry written to {}", path.display());
                }
                None => print_registry(&registry),
            }
            Ok(0)
        }
    }
}

/// Resolve the substitution plan, from an external setup file if given
fn build_plan(
    registry: &MacroRegistry,
    ext: Option<&Path>,
    read_commented: bool,
) -> Result<SubstitutionPlan> {
    let Some(path) = ext else {
        return Ok(SubstitutionPlan::from_registry(registry));
    };

    info!("Using external setup file {:?}", path);
    let options = ReaderOptions {
        accept_commented: read_commented,
    };
    let overrides = load_overrides(&DiskFs, path, registry, options)?;
    for diag in &overrides.diagnostics {
        println!("{}", diag);
    }

    let plan = SubstitutionPlan::resolve(registry, &overrides);
    for pair in plan.defaulted() {
        println!(
            "{} macro not found in external setup file. Assigning default value: {} to {}.",
            pair.name, pair.value, pair.name
        );
    }
    Ok(plan)
}

fn run_configure(
    cli: &Cli,
    registry: &MacroRegistry,
    settings: &Settings,
    args: &ConfigureArgs,
) -> Result<i32> {
    let plan = build_plan(registry, args.ext.as_deref(), args.read_commented)?;

    let options = ConfigureOptions {
        rewrite: RewriteOptions {
            replace_optional: args.opt,
            replace_commented: args.commented,
        },
        prune_other_arches: args.rem,
    };

    let report = DirectoryDriver::new(&DiskFs, &plan, settings, options).run(&cli.dir)?;

    for path in &report.pruned {
        println!("Removed {}", path.display());
    }
    for outcome in &report.rewritten {
        println!(
            "✓ {} -> {} ({} macros replaced)",
            outcome.template.display(),
            outcome.output.display(),
            outcome.substitutions
        );
    }
    for (path, err) in &report.failures {
        eprintln!("✗ {}: {}", path.display(), err);
    }
    println!("{}", report.summary());

    Ok(report.exit_code())
}

fn run_generate(
    cli: &Cli,
    registry: &MacroRegistry,
    settings: &Settings,
    include_optional: bool,
    include_commented: bool,
) -> Result<i32> {
    // Never harvest from our own executable if it lives in the directory
    let exclude = std::env::current_exe()
        .ok()
        .and_then(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
        .into_iter()
        .collect();

    let options = GeneratorOptions {
        include_optional,
        include_commented,
        exclude,
    };
    let generated = SetupFileGenerator::new(&DiskFs, registry, settings, options).generate(&cli.dir)?;

    for (path, err) in &generated.skipped {
        eprintln!("Skipped {}: {}", path.display(), err);
    }
    println!(
        "Setup file has been generated and is named '{}' ({} macros).",
        generated.path.display(),
        generated.written.len()
    );
    Ok(0)
}

fn print_registry(registry: &MacroRegistry) {
    for entry in registry.iter() {
        println!("{:<32} {:<9} {}", entry.name, entry.kind, entry.default_value);
    }
}
