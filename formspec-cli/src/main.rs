//! # formspec-cli
//!
//! Runs one visitor operation on a form spec and a raw value, both read as
//! JSON, and prints the result.
//!
//! ```text
//! formspec-cli validate --spec levels.json --value current.json
//! formspec-cli frontend --spec levels.json --default
//! formspec-cli disk --spec levels.json --value submitted.json --origin frontend
//! ```

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use formspec::{
    DataOrigin, EngineConfig, FormEngine, FormSpec, RawValue, Value, registry::Registration,
};
use log::debug;

/// Parse, render, validate and persist form spec values.
#[derive(Parser, Debug)]
#[command(name = "formspec-cli", version, about)]
struct Cli {
    /// Engine configuration file.
    #[arg(long, global = true, default_value = ".formspec.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a raw value and print the parsed value.
    Parse(ValueArgs),
    /// Print the frontend schema and value.
    Frontend(ValueArgs),
    /// Print validation messages; exits with 1 if there are any.
    Validate(ValueArgs),
    /// Print the disk representation.
    Disk(ValueArgs),
    /// List registered spec types and recompositions.
    CheckRegistry,
    /// Print the JSON Schema of the engine configuration.
    ConfigSchema,
}

/// Encoding of the raw value.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Origin {
    /// Persisted configuration shape.
    Disk,
    /// Frontend JSON.
    Frontend,
}

impl From<Origin> for DataOrigin {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Disk => DataOrigin::Disk,
            Origin::Frontend => DataOrigin::Frontend,
        }
    }
}

#[derive(Args, Debug)]
struct ValueArgs {
    /// Form spec JSON file, `-` for stdin.
    #[arg(long)]
    spec: PathBuf,

    /// Raw value JSON file, `-` for stdin.
    #[arg(long, conflicts_with = "default")]
    value: Option<PathBuf>,

    /// Use the spec's default instead of a raw value.
    #[arg(long)]
    default: bool,

    /// Encoding of the raw value.
    #[arg(long, value_enum, default_value_t = Origin::Disk)]
    origin: Origin,
}

struct Input {
    spec: FormSpec,
    value: Option<Value>,
    origin: DataOrigin,
}

impl Input {
    fn load(args: &ValueArgs) -> anyhow::Result<Self> {
        let spec: FormSpec = serde_json::from_str(&read_input(&args.spec)?)
            .with_context(|| format!("Invalid form spec in {}", args.spec.display()))?;
        let value = match (&args.value, args.default) {
            (Some(path), _) => {
                let json: serde_json::Value = serde_json::from_str(&read_input(path)?)
                    .with_context(|| format!("Invalid JSON in {}", path.display()))?;
                Some(Value::from(json))
            }
            (None, true) => None,
            (None, false) => bail!("either --value or --default is required"),
        };
        Ok(Self {
            spec,
            value,
            origin: args.origin.into(),
        })
    }

    fn raw(&self) -> RawValue<'_> {
        match &self.value {
            Some(value) => RawValue::Given(value),
            None => RawValue::UseDefault,
        }
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Commands::ConfigSchema = cli.command {
        print_json(&schemars::schema_for!(EngineConfig))?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = EngineConfig::load_or_default(&cli.config)?;
    debug!("engine config: {config:?}");
    let engine = FormEngine::from_config(config)?;

    match cli.command {
        Commands::Parse(args) => {
            let input = Input::load(&args)?;
            match engine.parse(&input.spec, input.origin, input.raw())? {
                Ok(parsed) => print_json(&parsed.to_json())?,
                Err(invalid) => {
                    println!("{} {}", "invalid:".red().bold(), invalid.reason);
                    println!("{} {}", "fallback:".yellow(), invalid.fallback.to_json());
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Frontend(args) => {
            let input = Input::load(&args)?;
            let (schema, value) = engine.to_frontend(&input.spec, input.origin, input.raw())?;
            print_json(&serde_json::json!({ "schema": schema, "value": value }))?;
        }
        Commands::Validate(args) => {
            let input = Input::load(&args)?;
            let messages = engine.validate(&input.spec, input.origin, input.raw())?;
            if messages.is_empty() {
                println!("{}", "valid".green().bold());
            } else {
                for message in &messages {
                    println!("{} {message}", "error:".red().bold());
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Disk(args) => {
            let input = Input::load(&args)?;
            let disk = engine.to_disk(&input.spec, input.origin, input.raw())?;
            println!("{}", disk.canonical_repr());
        }
        Commands::CheckRegistry => {
            for (type_name, registration) in engine.registry().registrations() {
                match registration {
                    Registration::Visitor => println!("{:<28} {}", type_name.cyan(), "visitor"),
                    Registration::Recomposed(target) => {
                        println!("{:<28} -> {}", type_name.cyan(), target)
                    }
                }
            }
            if let Some(target) = engine.registry().fallback_target() {
                println!("{:<28} -> {}", "<unknown>".dimmed(), target);
            }
        }
        Commands::ConfigSchema => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
