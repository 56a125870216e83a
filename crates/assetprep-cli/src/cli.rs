//! Argument parsing, bootstrap, and command dispatch.

use std::path::PathBuf;

use assetprep_config::{ConfigLoader, PipelineConfig};
use assetprep_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, init_logging};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::commands::plan::handle_plan;
use crate::commands::strategies::handle_strategies;
use crate::error::{CliError, CliResult};

/// Parses CLI arguments, loads configuration, installs logging, and executes
/// the requested command. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match bootstrap_and_dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn bootstrap_and_dispatch(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref())?;
    let format = config
        .log_format
        .parse::<LogFormat>()
        .map_err(|_| CliError::validation(format!("unknown log format {}", config.log_format)))?;
    init_logging(&LoggingConfig {
        level: &config.log_level,
        format,
        ..LoggingConfig::default()
    })
    .map_err(CliError::failure)?;

    let context = GlobalContextGuard::new(command_label(&cli.command));
    debug!(config = ?config, "cli bootstrapped");
    dispatch(cli.command, &config, cli.output, &context).await
}

fn load_config(file: Option<&std::path::Path>) -> CliResult<PipelineConfig> {
    let loader = match file {
        Some(path) => ConfigLoader::new().with_file(path),
        None => ConfigLoader::new(),
    };
    Ok(loader.load()?)
}

async fn dispatch(
    command: Command,
    config: &PipelineConfig,
    output: OutputFormat,
    context: &GlobalContextGuard,
) -> CliResult<()> {
    match command {
        Command::Plan(args) => {
            context.record_root(&args.dir);
            handle_plan(config, args, output).await
        }
        Command::Strategies => handle_strategies(output),
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Plan(_) => "plan",
        Command::Strategies => "strategies",
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "assetprep",
    about = "Discover a static asset tree and plan its upload"
)]
struct Cli {
    #[arg(long, global = true, env = "ASSETPREP_CONFIG", help = "JSON configuration file")]
    config: Option<PathBuf>,
    #[arg(
        long,
        short = 'o',
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover a directory, apply strategies, and print the upload actions.
    Plan(PlanArgs),
    /// List the strategy names accepted by `plan --strategy`.
    Strategies,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct PlanArgs {
    /// Directory to discover.
    pub(crate) dir: PathBuf,
    /// Strategy to apply; repeat to union several. Defaults to the configured list.
    #[arg(long = "strategy", short = 's')]
    pub(crate) strategies: Vec<String>,
    /// Discover dot-files and dot-directories.
    #[arg(long)]
    pub(crate) include_hidden: bool,
    /// Maximum concurrent stat operations during discovery.
    #[arg(long)]
    pub(crate) stat_concurrency: Option<usize>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plan_with_repeated_strategies() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "assetprep",
            "--format",
            "json",
            "plan",
            "public",
            "-s",
            "clone",
            "--strategy",
            "gzip",
            "--include-hidden",
        ])?;
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(command_label(&cli.command), "plan");
        let Command::Plan(args) = cli.command else {
            anyhow::bail!("expected plan command");
        };
        assert_eq!(args.dir, PathBuf::from("public"));
        assert_eq!(args.strategies, vec!["clone", "gzip"]);
        assert!(args.include_hidden);
        assert_eq!(args.stat_concurrency, None);
        Ok(())
    }

    #[test]
    fn output_defaults_to_table() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["assetprep", "strategies"])?;
        assert_eq!(cli.output, OutputFormat::Table);
        assert!(matches!(cli.command, Command::Strategies));
        Ok(())
    }

    #[test]
    fn plan_requires_a_directory() {
        assert!(Cli::try_parse_from(["assetprep", "plan"]).is_err());
    }

    #[test]
    fn load_config_reports_missing_file_as_validation() {
        let outcome = load_config(Some(std::path::Path::new("/definitely/absent.json")));
        assert!(matches!(outcome, Err(CliError::Validation(_))));
    }
}
