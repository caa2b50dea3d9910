//! Command-line interface

pub mod graph;
pub mod plan;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::catalog::SqliteCatalog;
use crate::config::{self, RunConfig, Settings};
use crate::plan::ScanOrder;

#[derive(Debug, Parser)]
#[command(name = "seeddump", version, about = "Dump a database into a replayable seed script in dependency order")]
pub struct Cli {
    /// Database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Settings file (defaults to <config dir>/seeddump/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the order in which entity types would be dumped
    Plan(PlanArgs),
    /// Show the dependency graph of the selected entity types
    Graph(GraphArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// Entity types to dump, comma separated (overrides MODEL/MODELS)
    #[arg(long, value_delimiter = ',')]
    pub models: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Append to the destination instead of overwriting it
    #[arg(long)]
    pub append: bool,

    /// Rows per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Fields to leave out, comma separated
    #[arg(long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Destination file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Write in bulk-import form
    #[arg(long)]
    pub import: bool,

    /// Maximum rows per entity type
    #[arg(long)]
    pub limit: Option<u64>,

    /// Tie-break direction when several types are ready at once
    #[arg(long, value_enum)]
    pub scan_order: Option<ScanOrder>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the plan here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl PlanArgs {
    /// Flag layer of the settings; unset flags defer to lower layers
    pub fn settings(&self) -> Settings {
        Settings {
            database_url: None,
            models: self.selection.models.clone(),
            append: self.append.then_some(true),
            batch_size: self.batch_size,
            exclude: self.exclude.clone(),
            file: self.file.clone(),
            import: self.import.then_some(true),
            limit: self.limit,
            scan_order: self.scan_order,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct GraphArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl Cli {
    /// Layer settings file, environment and `flags` into a run configuration
    pub fn run_config(&self, flags: Settings) -> Result<RunConfig> {
        let file_layer = match &self.config {
            Some(path) => Settings::from_file(path)?,
            None => match config::default_settings_path() {
                Some(path) => Settings::from_file_if_present(&path)?,
                None => Settings::default(),
            },
        };
        let env_layer = Settings::from_env()?;
        let global_layer = Settings {
            database_url: self.database.clone(),
            ..Settings::default()
        };

        let config = file_layer.merge(env_layer).merge(global_layer).merge(flags).resolve()?;
        log::debug!("Resolved run configuration: {:?}", config);
        Ok(config)
    }
}

/// Open the catalog named by the run configuration
pub async fn open_catalog(config: &RunConfig) -> Result<SqliteCatalog> {
    SqliteCatalog::connect(&config.database_url)
        .await
        .with_context(|| format!("Cannot reflect database {}", config.database_url))
}

/// Run the parsed command
pub async fn dispatch(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Plan(args) => plan::handle_plan_command(&cli, args).await,
        Commands::Graph(args) => graph::handle_graph_command(&cli, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plan_flags_become_settings_layer() {
        let cli = Cli::try_parse_from([
            "seeddump",
            "plan",
            "--models",
            "users,posts",
            "--append",
            "--limit",
            "3",
            "--scan-order",
            "forward",
        ])
        .unwrap();

        let Commands::Plan(args) = cli.command else {
            panic!("expected plan command");
        };
        let settings = args.settings();
        assert_eq!(settings.models, Some(vec!["users".to_string(), "posts".to_string()]));
        assert_eq!(settings.append, Some(true));
        assert_eq!(settings.import, None);
        assert_eq!(settings.limit, Some(3));
        assert_eq!(settings.scan_order, Some(ScanOrder::Forward));
    }

    #[test]
    fn test_unset_flags_defer_to_lower_layers() {
        let cli = Cli::try_parse_from(["seeddump", "plan"]).unwrap();
        let Commands::Plan(args) = cli.command else {
            panic!("expected plan command");
        };
        assert_eq!(args.settings(), Settings::default());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["seeddump", "graph", "--database", "sqlite::memory:", "-vv"])
            .unwrap();
        assert_eq!(cli.database.as_deref(), Some("sqlite::memory:"));
        assert_eq!(cli.verbose, 2);
    }
}
