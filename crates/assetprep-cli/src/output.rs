//! Output renderers and formatting helpers for CLI commands.

use std::io::Write;

use anyhow::anyhow;
use assetprep_files::{Action, Strategy};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};

const MISSING: &str = "-";

pub(crate) fn render_actions(
    out: &mut impl Write,
    actions: &[Action],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, actions),
        OutputFormat::Table => {
            writeln!(
                out,
                "{:<40} {:>10} {:<24} {:<32} ENCODING",
                "PATH", "SIZE", "MIME", "MD5"
            )
            .map_err(write_failed)?;
            for action in actions {
                let file = action.file();
                let size = file
                    .and_then(|file| file.size())
                    .map_or_else(|| MISSING.to_string(), format_bytes);
                let mime = file.and_then(|file| file.mime());
                let md5 = file.and_then(|file| file.md5());
                let encoding = file.and_then(|file| file.encoding());
                writeln!(
                    out,
                    "{:<40} {:>10} {:<24} {:<32} {}",
                    action.path(),
                    size,
                    mime.as_deref().unwrap_or(MISSING),
                    md5.as_deref().unwrap_or(MISSING),
                    encoding.as_deref().unwrap_or(MISSING)
                )
                .map_err(write_failed)?;
            }
            writeln!(out, "{} action(s)", actions.len()).map_err(write_failed)
        }
    }
}

pub(crate) fn render_strategies(out: &mut impl Write, format: OutputFormat) -> CliResult<()> {
    let names: Vec<&str> = Strategy::ALL.iter().map(|strategy| strategy.as_str()).collect();
    match format {
        OutputFormat::Json => write_json(out, &names),
        OutputFormat::Table => {
            for name in names {
                writeln!(out, "{name}").map_err(write_failed)?;
            }
            Ok(())
        }
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    writeln!(out, "{text}").map_err(write_failed)
}

fn write_failed(err: std::io::Error) -> CliError {
    CliError::failure(anyhow!("failed to write output: {err}"))
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetprep_files::{File, FileAttributes};

    fn sample_actions() -> anyhow::Result<Vec<Action>> {
        let file = File::resolved(
            FileAttributes::new("css/site.css")
                .with_size(2048)
                .with_mime("text/css")
                .with_md5("0cc175b9c0f1b6a831c399e269772661"),
        );
        Ok(vec![Action::upload(file)?])
    }

    #[test]
    fn table_lists_one_row_per_action() -> anyhow::Result<()> {
        let mut out = Vec::new();
        render_actions(&mut out, &sample_actions()?, OutputFormat::Table)?;
        let text = String::from_utf8(out)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("PATH"));
        assert!(lines[1].starts_with("css/site.css"));
        assert!(lines[1].contains("2.0 KiB"));
        assert!(lines[1].contains("text/css"));
        assert!(lines[1].trim_end().ends_with(MISSING));
        assert_eq!(lines[2], "1 action(s)");
        Ok(())
    }

    #[test]
    fn json_serialises_actions_with_their_files() -> anyhow::Result<()> {
        let mut out = Vec::new();
        render_actions(&mut out, &sample_actions()?, OutputFormat::Json)?;
        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value[0]["path"], "css/site.css");
        assert_eq!(value[0]["do_upload"], true);
        assert_eq!(value[0]["file"]["mime"], "text/css");
        assert_eq!(value[0]["file"]["size"], 2048);
        Ok(())
    }

    #[test]
    fn strategies_render_in_both_formats() -> anyhow::Result<()> {
        let mut table = Vec::new();
        render_strategies(&mut table, OutputFormat::Table)?;
        assert_eq!(String::from_utf8(table)?, "clone\ngzip\ngzip-suffix\n");

        let mut json = Vec::new();
        render_strategies(&mut json, OutputFormat::Json)?;
        let names: Vec<String> = serde_json::from_slice(&json)?;
        assert_eq!(names, vec!["clone", "gzip", "gzip-suffix"]);
        Ok(())
    }

    #[test]
    fn format_bytes_scales_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
