//! Command-line interface definitions.

use crate::config::DEFAULT_CONFIG_DIR;
use crate::models::PackSettings;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vehpack", version, about = "Package loose GTA V vehicle mods into DLC archives")]
pub struct Cli {
    /// Directory holding "VehPack Config.yaml"
    #[arg(long, global = true, env = "VEHPACK_CONFIG_DIR", default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: Utf8PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build vehicle and audio packages for every vehicle found (default)
    Pack(PackArgs),

    /// Report entities, associations and matched files without writing anything
    Scan(ScanArgs),

    /// Write a configuration file with default settings
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct PackArgs {
    /// Input directory with loose mod files
    #[arg(short, long, env = "VEHPACK_INPUT")]
    pub input: Option<Utf8PathBuf>,

    /// Output directory for packages
    #[arg(short, long, env = "VEHPACK_OUTPUT")]
    pub output: Option<Utf8PathBuf>,

    /// Path to the gtautil executable
    #[arg(long, env = "VEHPACK_ARCHIVER")]
    pub archiver: Option<Utf8PathBuf>,

    /// Archiver timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Platform folder name inside packages
    #[arg(long)]
    pub platform: Option<String>,

    /// Keep assembled temporary folders after archiving
    #[arg(long)]
    pub keep_temp: bool,
}

#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Input directory with loose mod files
    #[arg(short, long, env = "VEHPACK_INPUT")]
    pub input: Option<Utf8PathBuf>,

    /// Only report this entity
    #[arg(long)]
    pub entity: Option<String>,
}

impl PackArgs {
    /// Apply command-line values on top of file settings.
    pub fn apply(&self, settings: &mut PackSettings) {
        if let Some(input) = &self.input {
            settings.input_dir = input.to_string();
        }
        if let Some(output) = &self.output {
            settings.output_dir = output.to_string();
        }
        if let Some(archiver) = &self.archiver {
            settings.archiver_path = archiver.to_string();
        }
        if let Some(timeout) = self.timeout {
            settings.archiver_timeout = timeout;
        }
        if let Some(platform) = &self.platform {
            settings.platform_dir = platform.clone();
        }
        if self.keep_temp {
            settings.keep_temp = true;
        }
    }
}

impl ScanArgs {
    pub fn apply(&self, settings: &mut PackSettings) {
        if let Some(input) = &self.input {
            settings.input_dir = input.to_string();
        }
    }
}
