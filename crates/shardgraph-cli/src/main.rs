#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )
)]
// shardgraph-cli/src/main.rs
// ============================================================================
// Module: Shardgraph CLI Entry Point
// Description: Command dispatcher for running and inspecting shardgraph
//              evaluations from a declarative JSON graph file.
// Purpose: Give an operator a way to exercise the evaluator and its
//          file-backed store without writing Rust.
// Dependencies: clap, serde_json, shardgraph-config, shardgraph-core,
//               shardgraph-plugins, shardgraph-store, thiserror.
// ============================================================================

//! ## Overview
//! `shardgraph run` loads a [`GraphSpec`] from JSON, builds the
//! corresponding [`shardgraph_core::ActivationGraph`] against the built-in
//! arithmetic plugin set, evaluates every named output, and prints the
//! results. `shardgraph inspect-store` lists the keys currently held by a
//! configured [`shardgraph_store::FileDatabase`] without evaluating
//! anything.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Deserialize;
use shardgraph_config::AlgorithmChoice;
use shardgraph_config::ShardgraphConfig;
use shardgraph_core::ActivationGraph;
use shardgraph_core::ActivationId;
use shardgraph_core::ArgumentError;
use shardgraph_core::ComplexAlgorithm;
use shardgraph_core::Database as _;
use shardgraph_core::EvaluationReport;
use shardgraph_core::Payload;
use shardgraph_core::PluginId;
use shardgraph_core::Symbol;
use shardgraph_core::SymbolicObject;
use shardgraph_core::TopologicalAlgorithm;
use shardgraph_core::evaluate;
use shardgraph_core::memory::FixedMemoryInfo;
use shardgraph_core::memory::MemoryInfo;
use shardgraph_core::memory::ProcSelfStatm;
use shardgraph_plugins::PluginRegistry;
use shardgraph_store::FileDatabase;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "shardgraph",
    disable_help_subcommand = true,
    disable_version_flag = true,
    arg_required_else_help = true
)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a declarative graph file and print its requested outputs.
    Run(RunCommand),
    /// List the keys currently held by the configured file store.
    InspectStore(InspectStoreCommand),
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
struct RunCommand {
    /// Optional config file path (defaults to shardgraph.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Path to the declarative graph JSON file.
    #[arg(long, value_name = "PATH")]
    graph: PathBuf,
    /// Use the real process memory reading instead of the configured limit
    /// being treated as an always-fits budget.
    #[arg(long, action = ArgAction::SetTrue)]
    use_process_memory: bool,
}

/// Arguments for the `inspect-store` command.
#[derive(Args, Debug)]
struct InspectStoreCommand {
    /// Optional config file path (defaults to shardgraph.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Graph Spec
// ============================================================================

/// A declarative, JSON-deserializable description of an activation graph.
#[derive(Debug, Deserialize)]
struct GraphSpec {
    /// Nodes to add to the graph, in an order where every `ref` argument
    /// names a node that appears earlier in this list.
    nodes: Vec<NodeSpec>,
    /// Names of nodes whose materialized results should be reported.
    outputs: Vec<String>,
}

/// One plugin invocation in a [`GraphSpec`].
#[derive(Debug, Deserialize)]
struct NodeSpec {
    /// The node's name, referenced by later nodes' `ref` arguments and by
    /// [`GraphSpec::outputs`].
    name: String,
    /// Plugin name to invoke.
    plugin: String,
    /// Plugin version to invoke.
    #[serde(default = "default_plugin_version")]
    version: String,
    /// Positional arguments, in order.
    #[serde(default)]
    args: Vec<ArgSpec>,
    /// Keyword arguments.
    #[serde(default)]
    kwargs: BTreeMap<String, ArgSpec>,
}

/// Default plugin version used when a [`NodeSpec`] omits one.
fn default_plugin_version() -> String {
    "1".to_owned()
}

/// A single argument: either a literal JSON value or a reference to an
/// earlier node's output.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArgSpec {
    /// A reference to an earlier node, by name.
    Ref {
        /// Name of the referenced node.
        #[serde(rename = "ref")]
        ref_name: String,
    },
    /// A literal value, converted to a [`Payload`].
    Value {
        /// The literal JSON value.
        value: serde_json::Value,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("shardgraph {version}"))?;
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        Commands::Run(command) => command_run(&command),
        Commands::InspectStore(command) => command_inspect_store(&command),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let config = ShardgraphConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;

    let spec = load_graph_spec(&command.graph)?;
    let (graph, name_order) = build_graph(&spec)?;
    let sealed = graph.seal().map_err(|err| CliError::new(format!("invalid graph: {err}")))?;

    let registry = PluginRegistry::with_arithmetic_plugins();
    let database = FileDatabase::new(config.store_dir.clone());
    let memory_info: Box<dyn MemoryInfo> = if command.use_process_memory {
        Box::new(ProcSelfStatm)
    } else {
        Box::new(FixedMemoryInfo::new(0))
    };

    let report = match config.algorithm {
        AlgorithmChoice::Topological => evaluate(
            sealed,
            registry.into_map(),
            database,
            memory_info,
            TopologicalAlgorithm::new(),
        ),
        AlgorithmChoice::Complex => evaluate(
            sealed,
            registry.into_map(),
            database,
            memory_info,
            ComplexAlgorithm::new(config.memory_limit_bytes),
        ),
    }
    .map_err(|err| CliError::new(format!("evaluation failed: {err}")))?;

    print_report(&report, &name_order)?;
    Ok(ExitCode::SUCCESS)
}

/// Reads and parses a [`GraphSpec`] from `path`.
fn load_graph_spec(path: &Path) -> CliResult<GraphSpec> {
    let bytes = fs::read(path)
        .map_err(|err| CliError::new(format!("failed to read {}: {err}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("failed to parse {}: {err}", path.display())))
}

/// Builds an [`ActivationGraph`] from `spec`, returning the graph and each
/// requested output name paired with its activation id, in request order.
fn build_graph(
    spec: &GraphSpec,
) -> CliResult<(
    ActivationGraph<shardgraph_core::eval::state::Trigger<FileDatabase>>,
    Vec<(String, ActivationId)>,
)> {
    let mut graph = ActivationGraph::new();
    let mut symbols: BTreeMap<String, (ActivationId, Symbol)> = BTreeMap::new();
    let registry = PluginRegistry::with_arithmetic_plugins();

    for node in &spec.nodes {
        let plugin_id = PluginId::new(node.plugin.clone(), node.version.clone());
        let plugin = registry
            .plugin(&plugin_id)
            .ok_or_else(|| CliError::new(format!("unknown plugin {plugin_id}")))?;
        let signature = plugin.signature();

        let positional = node
            .args
            .iter()
            .map(|arg| resolve_arg(arg, &symbols))
            .collect::<CliResult<Vec<SymbolicObject>>>()?;
        let mut keyword = std::collections::BTreeMap::new();
        for (key, arg) in &node.kwargs {
            keyword.insert(key.clone(), resolve_arg(arg, &symbols)?);
        }

        let (id, output_symbol) = graph
            .add_activation(plugin_id, &signature, positional, keyword)
            .map_err(|err| map_argument_error(&node.name, &err))?;
        symbols.insert(node.name.clone(), (id, output_symbol));
    }

    let mut name_order = Vec::new();
    for name in &spec.outputs {
        let (id, _) = symbols
            .get(name)
            .ok_or_else(|| CliError::new(format!("unknown output node {name}")))?;
        name_order.push((name.clone(), *id));
    }

    Ok((graph, name_order))
}

/// Reports an [`ArgumentError`] raised while adding `node_name`'s activation.
fn map_argument_error(node_name: &str, err: &ArgumentError) -> CliError {
    CliError::new(format!("node {node_name}: {err}"))
}

/// Resolves one [`ArgSpec`] into a [`SymbolicObject`], given the symbols
/// already declared by earlier nodes.
fn resolve_arg(
    arg: &ArgSpec,
    symbols: &BTreeMap<String, (ActivationId, Symbol)>,
) -> CliResult<SymbolicObject> {
    match arg {
        ArgSpec::Ref {
            ref_name,
        } => {
            let (_, symbol) = symbols
                .get(ref_name)
                .ok_or_else(|| CliError::new(format!("unknown node reference {ref_name}")))?;
            Ok(SymbolicObject::Symbol(*symbol))
        }
        ArgSpec::Value {
            value,
        } => Ok(SymbolicObject::Value(payload_from_json(value))),
    }
}

/// Converts a [`serde_json::Value`] into a [`Payload`].
fn payload_from_json(value: &serde_json::Value) -> Payload {
    match value {
        serde_json::Value::Null => Payload::Null,
        serde_json::Value::Bool(value) => Payload::Bool(*value),
        serde_json::Value::Number(number) => number.as_i64().map_or_else(
            || Payload::float(number.as_f64().unwrap_or_default()),
            Payload::Int,
        ),
        serde_json::Value::String(text) => Payload::Text(text.clone()),
        serde_json::Value::Array(items) => Payload::List(items.iter().map(payload_from_json).collect()),
        serde_json::Value::Object(entries) => Payload::Map(
            entries
                .iter()
                .map(|(key, value)| (Payload::Text(key.clone()), payload_from_json(value)))
                .collect(),
        ),
    }
}

/// Prints each requested output's materialized result, one per line.
fn print_report(report: &EvaluationReport, name_order: &[(String, ActivationId)]) -> CliResult<()> {
    for (name, id) in name_order {
        let payload = report.get(*id).ok_or_else(|| {
            CliError::new(format!("node {name} was not materialized"))
        })?;
        write_stdout_line(&format!("{name} = {}", format_payload(payload)))?;
    }
    Ok(())
}

/// Renders a [`Payload`] as a single-line, human-readable string.
fn format_payload(payload: &Payload) -> String {
    match payload {
        Payload::Null => "null".to_owned(),
        Payload::Bool(value) => value.to_string(),
        Payload::Int(value) => value.to_string(),
        Payload::Float(value) => value.into_inner().to_string(),
        Payload::Text(value) => format!("\"{value}\""),
        Payload::Bytes(value) => format!("<{} bytes>", value.len()),
        Payload::List(items) => {
            let rendered: Vec<String> = items.iter().map(format_payload).collect();
            format!("[{}]", rendered.join(", "))
        }
        Payload::Map(entries) => {
            let rendered: Vec<String> = entries
                .iter()
                .map(|(key, value)| format!("{}: {}", format_payload(key), format_payload(value)))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
    }
}

// ============================================================================
// SECTION: Inspect Store Command
// ============================================================================

/// Executes the `inspect-store` command.
fn command_inspect_store(command: &InspectStoreCommand) -> CliResult<ExitCode> {
    let config = ShardgraphConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;

    let mut database = FileDatabase::new(config.store_dir.clone());
    database.open().map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
    let keys = database.keys();
    database.close().map_err(|err| CliError::new(format!("failed to close store: {err}")))?;

    if keys.is_empty() {
        write_stdout_line("store is empty")?;
        return Ok(ExitCode::SUCCESS);
    }
    for key in keys {
        write_stdout_line(&key.to_string())?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    use std::io::Write as _;
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::new(format!("stdout write failed: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    use std::io::Write as _;
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
