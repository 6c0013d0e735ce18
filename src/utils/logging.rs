// file: src/utils/logging.rs
// description: Tracing subscriber initialization and colored console summaries

use crate::models::IndexRepositoryResponse;
use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber. `RUST_LOG` wins over `verbose` when set.
///
/// Later calls are ignored.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose {
        "git_repo_research=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// One-line console summary of an indexing result.
pub fn format_response(response: &IndexRepositoryResponse) -> String {
    if response.is_success() {
        format!(
            "{} {} {} {}",
            "✓".green().bold(),
            response.repository_name.bold(),
            response.message.green(),
            format!("({}ms)", response.execution_time_ms).dimmed()
        )
    } else {
        format!(
            "{} {} {}",
            "✗".red().bold(),
            response.repository_name.bold(),
            response.message.red()
        )
    }
}

/// `[ 40%] message`, for plain-text progress lines.
pub fn format_progress(current: u64, total: u64, message: &str) -> String {
    let percent = if total == 0 {
        100
    } else {
        current.min(total) * 100 / total
    };
    format!("{} {}", format!("[{:>3}%]", percent).cyan(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    #[test]
    fn test_init_logger_twice() {
        init_logger(false, true);
        init_logger(false, false);
    }

    #[test]
    fn test_format_response() {
        colored::control::set_override(false);
        let mut response = IndexRepositoryResponse::error(
            "awslabs_mcp",
            "https://github.com/awslabs/mcp",
            "model",
            5,
            "No text chunks found in repository",
        );
        assert_eq!(
            format_response(&response),
            "✗ awslabs_mcp No text chunks found in repository"
        );

        response.status = Status::Success;
        response.message = "Successfully indexed repository with 2 files and 3 chunks".to_string();
        assert_eq!(
            format_response(&response),
            "✓ awslabs_mcp Successfully indexed repository with 2 files and 3 chunks (5ms)"
        );
    }

    #[test]
    fn test_format_progress() {
        colored::control::set_override(false);
        assert_eq!(format_progress(40, 100, "Converting"), "[ 40%] Converting");
        assert_eq!(format_progress(7, 0, "done"), "[100%] done");
        assert_eq!(format_progress(150, 100, "over"), "[100%] over");
    }
}
