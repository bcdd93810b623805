//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// pdcache - persistent-disk cache for container images
///
/// Keeps each image on its own cloud volume so other hosts can attach the
/// volume read-only and load the image instead of pulling it. Volumes are
/// not locked across hosts: only one host may hold a read-write attachment.
#[derive(Parser, Debug)]
#[command(name = "pdcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PDCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load an image from its cache volume, provisioning the volume if missing
    Get(ImageArgs),

    /// Save an image into its cache volume, then unmount and detach it
    Release(ImageArgs),

    /// Show the state of an image's cache volume
    Status(StatusArgs),

    /// Print the volume name and mount path derived from an image ID
    Names(NamesArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for commands acting on one image
#[derive(Parser, Debug)]
pub struct ImageArgs {
    /// Full image ID (at least 60 characters, optional sha256: prefix)
    pub image: String,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Full image ID
    pub image: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the names command
#[derive(Parser, Debug)]
pub struct NamesArgs {
    /// Full image ID
    pub image: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., disk.zone)
        key: String,
        /// Value to set (comma-separated for list keys)
        value: String,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one value per line)
    Plain,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "4e38e38c8ce0b8d9041a9c4fefe786631d1416225e13b0bfe8cfa2321aec4bba";

    #[test]
    fn cli_parses_get() {
        let cli = Cli::parse_from(["pdcache", "get", ID]);
        match cli.command {
            Commands::Get(args) => assert_eq!(args.image, ID),
            _ => panic!("expected Get command"),
        }
    }

    #[test]
    fn cli_parses_release() {
        let cli = Cli::parse_from(["pdcache", "release", ID]);
        assert!(matches!(cli.command, Commands::Release(_)));
    }

    #[test]
    fn cli_parses_status_json() {
        let cli = Cli::parse_from(["pdcache", "status", ID, "--format", "json"]);
        match cli.command {
            Commands::Status(args) => assert!(matches!(args.format, OutputFormat::Json)),
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["pdcache", "config", "set", "disk.zone", "us-east1-b"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Set { key, value }),
            }) => {
                assert_eq!(key, "disk.zone");
                assert_eq!(value, "us-east1-b");
            }
            _ => panic!("expected Config Set command"),
        }
    }

    #[test]
    fn cli_requires_image() {
        assert!(Cli::try_parse_from(["pdcache", "get"]).is_err());
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["pdcache", "names", ID]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["pdcache", "-v", "names", ID]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["pdcache", "-vv", "names", ID]);
        assert_eq!(cli.verbose, 2);
    }
}
