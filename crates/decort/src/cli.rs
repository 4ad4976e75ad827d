//! Clap derive structures for the `decort` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// decort -- drive DECORT resource lifecycles from JSON declarations
#[derive(Debug, Parser)]
#[command(
    name = "decort",
    version,
    about = "Reconcile DECORT load balancers, disks and snapshots",
    long_about = "A local host for the DECORT provider.\n\n\
        Reads declared attributes and prior state as JSON, runs the matching\n\
        create / read / update / delete callback, and prints the new state.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "DECORT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Path to the configuration file
    #[arg(long, env = "DECORT_CONFIG_FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Platform URL (overrides profile)
    #[arg(long, short = 'c', env = "DECORT_CONTROLLER_URL", global = true)]
    pub controller_url: Option<String>,

    /// Disable TLS certificate verification
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List resource and data-source types with their timeouts
    #[command(alias = "ls")]
    Resources,

    /// Show the attribute schema of a resource or data source
    Schema(SchemaArgs),

    /// Create or update a resource from a declaration
    Apply(ApplyArgs),

    /// Refresh a resource's state from the platform
    Read(StateArgs),

    /// Delete a resource
    Destroy(DestroyArgs),

    /// Look up an existing entity through a data source
    Data(DataArgs),

    /// Check a whole plan for invalid declarations and duplicate keys
    Plan(PlanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Type name, e.g. decort_lb
    pub type_name: String,

    /// Show the data source of that name instead of the resource
    #[arg(long)]
    pub data_source: bool,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Resource type, e.g. decort_disk
    pub type_name: String,

    /// Declared attributes as a JSON object
    #[arg(long = "config", value_name = "FILE")]
    pub declared: PathBuf,

    /// Prior state written by an earlier apply; omit to create
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Write the resulting state here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct StateArgs {
    /// Resource type
    pub type_name: String,

    /// State file written by apply
    #[arg(long, value_name = "FILE")]
    pub state: PathBuf,

    /// Write the resulting state here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DestroyArgs {
    /// Resource type
    pub type_name: String,

    /// State file written by apply
    #[arg(long, value_name = "FILE")]
    pub state: PathBuf,
}

#[derive(Debug, Args)]
pub struct DataArgs {
    /// Data-source type, e.g. decort_lb
    pub type_name: String,

    /// Lookup arguments as a JSON object
    #[arg(long = "config", value_name = "FILE")]
    pub declared: PathBuf,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// JSON array of `{"type": ..., "config": {...}}` entries
    pub plan: PathBuf,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    pub shell: clap_complete::Shell,
}
