use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::types::PlatformFamily;

/// adconfig - areaDetector configuration setup
#[derive(Parser, Debug)]
#[command(name = "adconfig")]
#[command(about = "Generate areaDetector/EPICS configuration files from EXAMPLE templates")]
#[command(version)]
pub struct Cli {
    /// Directory holding the EXAMPLE_* templates (areaDetector/configure)
    #[arg(short = 'd', long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// JSON registry file replacing the built-in macro table
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// EPICS architecture whose templates are kept when pruning
    #[arg(short = 'a', long, global = true, default_value = "linux-x86_64")]
    pub arch: String,

    /// Platform family whose `EXAMPLE_*.<Family>` templates are kept (Linux, Darwin, WIN32, vxWorks)
    #[arg(long, global = true)]
    pub family: Option<PlatformFamily>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Rewrite every EXAMPLE_* template into its configuration file (default)
    Configure(ConfigureArgs),
    /// Harvest macros from the current files into a setup file
    Generate {
        /// Include optional macros in the setup file
        #[arg(short, long)]
        opt: bool,
        /// Include commented-out macros
        #[arg(short, long)]
        commented: bool,
        /// Setup file name, written inside the working directory
        #[arg(long, default_value = "AD_SETUP_MACROS")]
        output: String,
    },
    /// Show the value every macro would receive
    Plan {
        /// External setup file to resolve against
        #[arg(short, long)]
        ext: Option<PathBuf>,
        /// Accept `#NAME=VALUE` lines in the setup file
        #[arg(long)]
        read_commented: bool,
        /// Also list optional macros
        #[arg(short, long)]
        opt: bool,
    },
    /// Print the active macro registry
    Registry {
        /// Write the registry as JSON to this file instead
        #[arg(long)]
        dump: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct ConfigureArgs {
    /// Use an external macro setup file
    #[arg(short, long)]
    pub ext: Option<PathBuf>,
    /// Remove EXAMPLE files for other architectures
    #[arg(short, long)]
    pub rem: bool,
    /// Substitute optional package macros
    #[arg(short, long)]
    pub opt: bool,
    /// Replace macros even if they are commented out in the templates
    #[arg(short, long)]
    pub commented: bool,
    /// Accept `#NAME=VALUE` lines in the external setup file
    #[arg(long)]
    pub read_commented: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// The command to run; no subcommand means a default configure
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Configure(ConfigureArgs::default()))
    }
}
