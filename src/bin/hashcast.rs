//! hashcast CLI
//!
//! Casts JSON data against a schema document and inspects configuration.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hashcast::{config, list_converters, CastOptions, Caster, HashCastConfig, KeyMode};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hashcast")]
#[command(about = "Cast untyped JSON data against a declarative schema")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cast a JSON document and print the result
    Cast {
        /// Schema document (.json or .toml)
        #[arg(short, long)]
        schema: PathBuf,

        /// Input JSON file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Key representation written to the output
        #[arg(long)]
        output_keys: Option<KeyMode>,

        /// Drop unknown keys instead of failing
        #[arg(long)]
        skip_unexpected: bool,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// List registered converters
    Converters,

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration as TOML
    Show,

    /// Write a default config file
    Init {
        #[arg(short, long, default_value = "hashcast.toml")]
        output: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = HashCastConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    config::set_global(cfg);

    match cli.command {
        Commands::Cast {
            schema,
            input,
            output_keys,
            skip_unexpected,
            compact,
        } => {
            let caster = Caster::from_path(&schema)
                .with_context(|| format!("building caster from {}", schema.display()))?;

            let raw = read_input(&input)?;
            let data: serde_json::Value =
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", input))?;

            let options = cast_options(CastOptions::from_global(), output_keys, skip_unexpected);
            let output = caster.cast_json(data, &options)?;
            if compact {
                println!("{}", serde_json::to_string(&output)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            Ok(())
        }

        Commands::Converters => {
            for name in list_converters() {
                println!("{}", name);
            }
            Ok(())
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config::global())?);
                Ok(())
            }
            ConfigAction::Init { output } => {
                HashCastConfig::default().save(&output)?;
                println!("Wrote {}", output);
                Ok(())
            }
        },
    }
}

/// Options for a CLI cast. JSON object keys are always strings, so the
/// configured `cast.input_keys` does not apply here.
fn cast_options(defaults: CastOptions, output_keys: Option<KeyMode>, skip_unexpected: bool) -> CastOptions {
    defaults
        .input_keys(KeyMode::String)
        .output_keys(output_keys.unwrap_or(defaults.output_keys))
        .skip_unexpected_attributes(skip_unexpected || defaults.skip_unexpected_attributes)
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input))
    }
}
