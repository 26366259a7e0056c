//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use opforge::core::config::{Config, VisibilityPolicy};
use opforge::core::errors::OpfError;
use opforge::logger::diagnostics::{DiagnosticEvent, Diagnostics};
use opforge::operation::signature::{RawSignature, parse_signature};
use opforge::operation::typed::TypedOperation;
use opforge::reflect::descriptor::UniverseDescriptor;
use opforge::reflect::ids::MemberId;
use opforge::reflect::universe::ClassUniverse;
use opforge::reflection::model::{ModelSettings, OperationModel};

/// opforge: builds the operation model a unit-test generator draws from.
#[derive(Debug, Parser)]
#[command(
    name = "opforge",
    author,
    version,
    about = "Reflective operation model for unit-test generation",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Echo diagnostics to stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Build the operation model for a set of test classes.
    Extract(ExtractArgs),
    /// Instantiate every generic operation of the model.
    Instantiate(InstantiateArgs),
    /// Parse a method or constructor signature and print its canonical form.
    Signature(SignatureArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VisibilityArg {
    Public,
    NotPrivate,
    Package,
    Everything,
}

impl From<VisibilityArg> for VisibilityPolicy {
    fn from(value: VisibilityArg) -> Self {
        match value {
            VisibilityArg::Public => Self::Public,
            VisibilityArg::NotPrivate => Self::NotPrivate,
            VisibilityArg::Package => Self::Package,
            VisibilityArg::Everything => Self::Everything,
        }
    }
}

/// Inputs shared by the model-building commands.
#[derive(Debug, Clone, Args, Default)]
struct ModelArgs {
    /// Class universe descriptor (JSON); the core library alone if omitted.
    #[arg(long, value_name = "PATH")]
    universe: Option<PathBuf>,
    /// Class to test (repeatable).
    #[arg(long = "testclass", value_name = "CLASS")]
    test_classes: Vec<String>,
    /// Regex omitting matching constructors and methods (repeatable).
    #[arg(long = "omit-methods", value_name = "REGEX")]
    omit_methods: Vec<String>,
    /// Field never to read or write, as pkg.Class.field (repeatable).
    #[arg(long = "omit-field", value_name = "FIELD")]
    omit_fields: Vec<String>,
    /// Visibility policy for generated tests.
    #[arg(long, value_enum)]
    visibility: Option<VisibilityArg>,
    /// Package generated tests live in.
    #[arg(long, value_name = "PACKAGE")]
    package: Option<String>,
    /// Extra method or constructor to include (repeatable).
    #[arg(long = "signature", value_name = "SIGNATURE")]
    signatures: Vec<String>,
    /// Literals file (repeatable).
    #[arg(long = "literals", value_name = "PATH")]
    literals: Vec<PathBuf>,
}

#[derive(Debug, Clone, Args, Default)]
struct ExtractArgs {
    #[command(flatten)]
    model: ModelArgs,
    /// Print why members were rejected, classes ignored or signatures dropped.
    #[arg(long)]
    explain: bool,
}

#[derive(Debug, Clone, Args)]
struct InstantiateArgs {
    #[command(flatten)]
    model: ModelArgs,
    /// Seed of the instantiation search; the configured seed if omitted.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
    /// Instantiation attempts per generic operation.
    #[arg(long, default_value_t = 1, value_name = "N")]
    rounds: usize,
}

#[derive(Debug, Clone, Args)]
struct SignatureArgs {
    /// Class universe descriptor (JSON); the core library alone if omitted.
    #[arg(long, value_name = "PATH")]
    universe: Option<PathBuf>,
    /// Signature such as `pkg.C.m(int,java.lang.String)`.
    #[arg(value_name = "SIGNATURE")]
    signature: String,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<OpfError> for CliError {
    fn from(error: OpfError) -> Self {
        match error {
            OpfError::InternalBug { .. } => Self::Internal(error.to_string()),
            OpfError::Io { .. } | OpfError::Serialization { .. } => Self::Runtime(error.to_string()),
            _ => Self::User(error.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Extract(args) => run_extract(cli, args),
        Command::Instantiate(args) => run_instantiate(cli, args),
        Command::Signature(args) => run_signature(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── model commands ────────────────────

/// Effective config: file and env first, then command-line flags on top.
fn effective_config(cli: &Cli, args: &ModelArgs) -> Result<Config, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_model_args(&mut config, args);
    if cli.verbose {
        config.logging.verbose = true;
    }
    config.validate()?;
    Ok(config)
}

fn apply_model_args(config: &mut Config, args: &ModelArgs) {
    if let Some(universe) = &args.universe {
        config.inputs.universe = Some(universe.clone());
    }
    config.inputs.test_classes.extend(args.test_classes.iter().cloned());
    config.inputs.method_signatures.extend(args.signatures.iter().cloned());
    config.inputs.literals_files.extend(args.literals.iter().cloned());
    config.omission.methods.extend(args.omit_methods.iter().cloned());
    config.omission.fields.extend(args.omit_fields.iter().cloned());
    if let Some(visibility) = args.visibility {
        config.visibility.policy = visibility.into();
    }
    if let Some(package) = &args.package {
        config.visibility.package = Some(package.clone());
    }
}

fn load_universe(path: Option<&Path>) -> Result<Arc<ClassUniverse>, CliError> {
    let universe = match path {
        Some(path) => ClassUniverse::from_descriptor(UniverseDescriptor::load(path)?)?,
        None => ClassUniverse::core()?,
    };
    Ok(universe)
}

fn build_model(config: &Config, diagnostics: &Diagnostics) -> Result<OperationModel, CliError> {
    let universe = load_universe(config.inputs.universe.as_deref())?;
    let settings = ModelSettings::from_config(config)?;
    let model = OperationModel::build(universe, &settings, diagnostics.clone())?;
    diagnostics.flush();
    Ok(model)
}

fn describe_all<'a>(model: &OperationModel, ops: impl IntoIterator<Item = &'a TypedOperation>) -> Vec<String> {
    ops.into_iter()
        .map(|op| op.describe(model.universe()).to_string())
        .collect()
}

fn event_json(event: &DiagnosticEvent) -> Value {
    json!({
        "event": event.event.label(),
        "subject": event.subject,
        "reason": event.reason,
    })
}

fn run_extract(cli: &Cli, args: &ExtractArgs) -> Result<(), CliError> {
    let config = effective_config(cli, &args.model)?;
    let mut diagnostics = Diagnostics::from_settings(
        config.logging.diagnostics_log.as_deref(),
        config.logging.verbose,
    );
    if args.explain {
        diagnostics = diagnostics.buffered();
    }
    let model = build_model(&config, &diagnostics)?;

    let kept = describe_all(&model, model.operations());
    let omitted = describe_all(&model, model.omitted());
    let literals = describe_all(&model, model.literals());
    let events = diagnostics.events();

    match output_mode(cli) {
        OutputMode::Human => {
            if !cli.quiet {
                println!(
                    "{} {} kept, {} omitted, {} literals",
                    "Operation model:".bold(),
                    kept.len(),
                    omitted.len(),
                    literals.len()
                );
            }
            for line in &kept {
                println!("  {line}");
            }
            for line in &omitted {
                println!("  {} {line}", "omitted".yellow());
            }
            for line in &literals {
                println!("  {} {line}", "literal".cyan());
            }
            if args.explain {
                println!("{}", "Diagnostics:".bold());
                for event in &events {
                    println!("  {} {}: {}", event.event.label().dimmed(), event.subject, event.reason);
                }
            }
            if !cli.quiet {
                println!("Fingerprint: {}", model.fingerprint());
            }
        }
        OutputMode::Json => {
            let mut payload = json!({
                "command": "extract",
                "fingerprint": model.fingerprint(),
                "operations": kept,
                "omitted": omitted,
                "literals": literals,
            });
            if args.explain {
                payload["diagnostics"] = Value::Array(events.iter().map(event_json).collect());
            }
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_instantiate(cli: &Cli, args: &InstantiateArgs) -> Result<(), CliError> {
    let config = effective_config(cli, &args.model)?;
    let diagnostics = Diagnostics::from_settings(
        config.logging.diagnostics_log.as_deref(),
        config.logging.verbose,
    );
    let model = build_model(&config, &diagnostics)?;
    let seed = args.seed.unwrap_or(config.instantiation.seed);
    let mut instantiator = model.instantiator(seed);
    let universe = Arc::clone(model.universe());

    let mut results = Vec::new();
    for op in model.generic_operations() {
        for round in 0..args.rounds {
            let instantiated = instantiator.instantiate(op);
            results.push((
                op.describe(&universe).to_string(),
                round,
                instantiated.map(|i| i.describe(&universe).to_string()),
            ));
        }
    }
    diagnostics.flush();

    match output_mode(cli) {
        OutputMode::Human => {
            if !cli.quiet {
                println!(
                    "{} {} generic operations, pool of {} types, seed {seed}",
                    "Instantiation:".bold(),
                    model.generic_operations().count(),
                    model.pool().len()
                );
            }
            for (generic, _, instantiated) in &results {
                match instantiated {
                    Some(concrete) => println!("  {generic}\n    {} {concrete}", "->".green()),
                    None => println!("  {generic}\n    {}", "no instantiation".red()),
                }
            }
        }
        OutputMode::Json => {
            let entries: Vec<Value> = results
                .iter()
                .map(|(generic, round, instantiated)| {
                    json!({
                        "generic": generic,
                        "round": round,
                        "instantiated": instantiated,
                    })
                })
                .collect();
            let payload = json!({
                "command": "instantiate",
                "seed": seed,
                "pool_size": model.pool().len(),
                "results": entries,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_signature(cli: &Cli, args: &SignatureArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let universe = load_universe(args.universe.as_deref().or(config.inputs.universe.as_deref()))?;
    let member = parse_signature(&args.signature, &universe)?;
    let (kind, canonical) = match member {
        MemberId::Constructor(id) => ("constructor", RawSignature::of_constructor(&universe, id)),
        MemberId::Method(id) => ("method", RawSignature::of_method(&universe, id)),
        MemberId::Field(id) => {
            return Err(CliError::User(format!(
                "{} is a field, not a method or constructor",
                universe.field_label(id)
            )));
        }
    };

    match output_mode(cli) {
        OutputMode::Human => println!("{canonical}"),
        OutputMode::Json => {
            let payload = json!({
                "command": "signature",
                "input": args.signature,
                "kind": kind,
                "canonical": canonical.to_string(),
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let value = serde_json::to_value(&config)?;
                    let payload = json!({
                        "command": "config show",
                        "config": value,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("Configuration is INVALID: {e}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ──────────────────── output ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("OPF_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
