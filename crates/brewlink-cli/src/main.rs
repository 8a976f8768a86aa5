//! `brewlink`: offline operator tool for appliance device maps.
//!
//! # Usage
//!
//! ```text
//! brewlink [OPTIONS] <COMMAND>
//!
//! Commands:
//!   commands              List command aliases and their hex strings
//!   properties            List property aliases and their raw keys
//!   fields                Show the monitor profile
//!   encode <ALIAS>        Print the wire payload for a command
//!   resolve <ALIAS>       Print the raw key for a property alias
//!   decode <B64>          Decode a telemetry blob to JSON
//!
//! Options:
//!   --config <PATH>       Config file [default: $XDG_CONFIG_HOME/brewlink/config.toml]
//!   --model <MODEL>       Model name registered in the config's [models] table
//!   --device-map <PATH>   Device map file (overrides --model)
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable              | Description                         |
//! |-----------------------|-------------------------------------|
//! | `BREWLINK_CONFIG`     | Config file path                    |
//! | `BREWLINK_MODEL`      | Default model                       |
//! | `BREWLINK_DEVICE_MAP` | Device map file                     |
//! | `RUST_LOG`            | Log filter (overrides `log_level`)  |

use std::path::PathBuf;

use anyhow::{bail, Context};
use brewlink_cli::{commands, config, CliConfig};
use brewlink_core::{load_device_schema, DeviceSchema};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Offline operator tool for appliance device maps.
#[derive(Debug, Parser)]
#[command(
    name = "brewlink",
    about = "Inspect device maps, encode commands, decode telemetry",
    version
)]
struct Cli {
    /// Path to the config file.
    #[arg(long, env = "BREWLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Model whose device map should be used.
    ///
    /// Must appear in the `[models]` table of the config file.
    #[arg(long, env = "BREWLINK_MODEL")]
    model: Option<String>,

    /// Device map file to use directly, bypassing the model registry.
    #[arg(long, env = "BREWLINK_DEVICE_MAP")]
    device_map: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List command aliases and their hex strings.
    Commands,
    /// List property aliases and their raw keys.
    Properties,
    /// Show the monitor profile.
    Fields,
    /// Print the base64 wire payload for a command alias.
    Encode {
        alias: String,
        /// Unix time in seconds to stamp the payload with [default: now].
        #[arg(long)]
        at: Option<u64>,
        /// Emit a fixed-width timestamp of this many bytes.
        #[arg(long)]
        fixed_width: Option<u8>,
    },
    /// Print the raw key for a property alias.
    Resolve { alias: String },
    /// Decode a base64 telemetry blob against the monitor profile.
    Decode { raw_b64: String },
}

impl Cli {
    /// Loads the config file named by `--config`, or the default one.
    fn load_config(&self) -> anyhow::Result<CliConfig> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => config::config_file_path().context("failed to locate config file")?,
        };
        config::load_config(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))
    }

    /// Loads the device map selected by `--device-map` or `--model`.
    fn load_schema(&self, cfg: &CliConfig) -> anyhow::Result<DeviceSchema> {
        if let Some(path) = &self.device_map {
            return load_device_schema(path)
                .with_context(|| format!("failed to load device map {}", path.display()));
        }
        let Some(model) = &self.model else {
            bail!("no device map selected: pass --device-map or --model");
        };
        cfg.registry()
            .load(model)
            .with_context(|| format!("failed to load device map for model '{model}'"))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.load_config()?;

    // `RUST_LOG` wins; otherwise the config's `log_level`.  Logs go to stderr
    // so command output stays pipeable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level)),
        )
        .init();

    let schema = cli.load_schema(&cfg)?;
    debug!(
        "device map loaded: {} commands, {} properties, {} fields",
        schema.command_map.len(),
        schema.property_map.len(),
        schema.monitor_profile.len()
    );

    let output = match &cli.command {
        Command::Commands => commands::list_commands(&schema),
        Command::Properties => commands::list_properties(&schema),
        Command::Fields => commands::list_fields(&schema),
        Command::Encode { alias, at, fixed_width } => {
            commands::encode(&schema, alias, *at, *fixed_width)
                .with_context(|| format!("failed to encode '{alias}'"))?
        }
        Command::Resolve { alias } => commands::resolve(&schema, alias),
        Command::Decode { raw_b64 } => {
            commands::decode(&schema, raw_b64).context("failed to decode telemetry")?
        }
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_subcommand_parses_options() {
        // Arrange / Act
        let cli = Cli::parse_from([
            "brewlink",
            "--device-map",
            "ec900.json",
            "encode",
            "espresso",
            "--at",
            "16",
            "--fixed-width",
            "4",
        ]);

        // Assert
        assert_eq!(cli.device_map, Some(PathBuf::from("ec900.json")));
        match cli.command {
            Command::Encode { alias, at, fixed_width } => {
                assert_eq!(alias, "espresso");
                assert_eq!(at, Some(16));
                assert_eq!(fixed_width, Some(4));
            }
            other => panic!("unexpected subcommand: {other:?}"),
        }
    }

    #[test]
    fn test_decode_subcommand_takes_blob() {
        let cli = Cli::parse_from(["brewlink", "--model", "EC900", "decode", "Bw=="]);
        assert_eq!(cli.model.as_deref(), Some("EC900"));
        assert!(matches!(cli.command, Command::Decode { ref raw_b64 } if raw_b64 == "Bw=="));
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["brewlink"]).is_err());
    }

    #[test]
    fn test_load_schema_requires_a_selection() {
        let cli = Cli::parse_from(["brewlink", "commands"]);
        let err = cli.load_schema(&CliConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--device-map"));
    }

    #[test]
    fn test_unregistered_model_is_reported() {
        let cli = Cli::parse_from(["brewlink", "--model", "EC900", "fields"]);
        let err = cli.load_schema(&CliConfig::default()).unwrap_err();
        assert!(err.to_string().contains("EC900"));
    }
}
