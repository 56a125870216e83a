//! `plan`: discover a directory, apply strategies, and emit upload actions.

use std::io;

use assetprep_config::PipelineConfig;
use assetprep_files::{
    Action, DiscoveryOptions, FileCollection, FileContext, FileResult, StrategySelector,
};
use assetprep_jobs::{JobQueue, WorkerPool};
use tracing::info;

use crate::cli::{OutputFormat, PlanArgs};
use crate::error::{CliError, CliResult};
use crate::output::render_actions;

pub(crate) async fn handle_plan(
    config: &PipelineConfig,
    args: PlanArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let actions = plan(config, &args).await?;
    render_actions(&mut io::stdout().lock(), &actions, format)
}

/// Build the upload plan for `args.dir`. Flags override the configuration.
pub(crate) async fn plan(config: &PipelineConfig, args: &PlanArgs) -> CliResult<Vec<Action>> {
    let strategies = if args.strategies.is_empty() {
        config.strategies.clone()
    } else {
        args.strategies.clone()
    };
    // Reject bad names before touching the filesystem.
    StrategySelector::from(strategies.clone())
        .resolve()
        .map_err(|err| CliError::from_file("plan", err))?;

    let stat_concurrency = args.stat_concurrency.unwrap_or(config.stat_concurrency);
    if stat_concurrency == 0 {
        return Err(CliError::validation(
            "plan: stat_concurrency must be at least 1",
        ));
    }
    let options = DiscoveryOptions {
        stat_concurrency,
        include_hidden: args.include_hidden || config.include_hidden,
    };

    let queue = JobQueue::new();
    let pool = WorkerPool::spawn(&queue, config.metadata_workers);
    let context = FileContext::with_fs_probe(queue.clone());
    let dir_label = format!("plan {}", args.dir.display());

    let discovered = FileCollection::from_path(&context, &args.dir, &options)
        .await
        .map_err(|err| CliError::from_file(&dir_label, err))?;
    let planned = discovered
        .apply_strategy(strategies)
        .await
        .map_err(|err| CliError::from_file(&dir_label, err))?;
    let actions = planned
        .iter()
        .cloned()
        .map(Action::upload)
        .collect::<FileResult<Vec<_>>>()
        .map_err(|err| CliError::from_file(&dir_label, err))?;

    let stats = queue.stats();
    info!(
        workers = pool.len(),
        discovered = discovered.len(),
        actions = actions.len(),
        jobs_succeeded = stats.succeeded(),
        jobs_failed = stats.failed(),
        "upload plan ready"
    );
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use assetprep_test_support::{TempTree, md5_hex};

    fn args(dir: PathBuf, strategies: &[&str]) -> PlanArgs {
        PlanArgs {
            dir,
            strategies: strategies.iter().map(|name| (*name).to_string()).collect(),
            include_hidden: false,
            stat_concurrency: None,
        }
    }

    #[tokio::test]
    async fn plan_uses_configured_strategies_by_default() -> anyhow::Result<()> {
        let tree = TempTree::with_files([
            ("index.html", "<h1>hi</h1>"),
            ("css/site.css", "body{}"),
            (".env", "SECRET=1"),
        ])?;
        let config = PipelineConfig::default();

        let actions = plan(&config, &args(tree.path().to_path_buf(), &[])).await?;
        let paths: Vec<&str> = actions.iter().map(Action::path).collect();
        assert_eq!(paths, vec!["css/site.css", "index.html"]);

        let index = actions[1].file().ok_or_else(|| anyhow::anyhow!("file"))?;
        assert_eq!(index.md5(), Some(md5_hex("<h1>hi</h1>")));
        assert_eq!(index.mime().as_deref(), Some("text/html"));
        assert!(actions.iter().all(|action| action.intents().upload));
        Ok(())
    }

    #[tokio::test]
    async fn flags_override_configuration() -> anyhow::Result<()> {
        let tree = TempTree::with_files([("app.js", "console.log(1)"), (".hidden", "x")])?;
        let config = PipelineConfig::default();
        let mut plan_args = args(tree.path().to_path_buf(), &["clone", "gzip-suffix"]);
        plan_args.include_hidden = true;
        plan_args.stat_concurrency = Some(1);

        let actions = plan(&config, &plan_args).await?;
        let paths: Vec<&str> = actions.iter().map(Action::path).collect();
        assert_eq!(paths, vec![".hidden", ".hidden.gz", "app.js", "app.js.gz"]);

        let gz = actions[3].file().ok_or_else(|| anyhow::anyhow!("file"))?;
        assert_eq!(gz.encoding().as_deref(), Some("gzip"));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_strategy_is_a_validation_error() -> anyhow::Result<()> {
        let tree = TempTree::with_files([("a.txt", "a")])?;
        let outcome = plan(
            &PipelineConfig::default(),
            &args(tree.path().to_path_buf(), &["brotli"]),
        )
        .await;
        let Err(err) = outcome else {
            anyhow::bail!("expected an error");
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("brotli"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_directory_is_a_runtime_failure() -> anyhow::Result<()> {
        let tree = TempTree::new()?;
        let outcome = plan(
            &PipelineConfig::default(),
            &args(tree.join("absent"), &[]),
        )
        .await;
        let Err(err) = outcome else {
            anyhow::bail!("expected an error");
        };
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("absent"));
        Ok(())
    }
}
