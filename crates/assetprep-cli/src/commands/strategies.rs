use std::io;

use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::output::render_strategies;

pub(crate) fn handle_strategies(format: OutputFormat) -> CliResult<()> {
    render_strategies(&mut io::stdout().lock(), format)
}
