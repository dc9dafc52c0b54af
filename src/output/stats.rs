//! Statistics reporting.

use console::style;

use crate::download::{DownloadResult, RunTotals};

/// Print the outcome of one post.
pub fn print_post_result(result: &DownloadResult) {
    if result.skipped_complete {
        println!(
            "{} Post {} already complete ({} files)",
            style("SKIP").dim(),
            result.post_id,
            result.total_files
        );
        return;
    }

    if result.failed.is_empty() && result.not_started == 0 {
        println!(
            "{} Post {}: {}/{} files",
            style("OK").green().bold(),
            result.post_id,
            result.successful,
            result.total_files
        );
    } else {
        println!(
            "{} Post {}: {}/{} files, {} failed",
            style("PARTIAL").yellow().bold(),
            result.post_id,
            result.successful,
            result.total_files,
            style(result.failed.len()).red()
        );
        println!("  {}", style(&result.link).dim());
        for failed in &result.failed {
            println!("  - {} ({})", failed.name, failed.error);
        }
        if result.not_started > 0 {
            println!("  - {} not started (cancelled)", result.not_started);
        }
    }

    if !result.rejected.is_empty() {
        println!(
            "  {} {} file(s) outside the allowed domains ignored",
            style("!").yellow(),
            result.rejected.len()
        );
    }
}

/// Print totals for the whole run.
pub fn print_run_summary(totals: &RunTotals, ledger_size: Option<usize>) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Summary:").bold());
    println!("  Posts:      {}", totals.posts);
    println!("  Complete:   {}", style(totals.posts_complete).green());
    if totals.posts_skipped_complete > 0 {
        println!("  Up to date: {}", totals.posts_skipped_complete);
    }
    if totals.posts_partial > 0 {
        println!("  Partial:    {}", style(totals.posts_partial).red());
    }
    if totals.posts_errored > 0 {
        println!("  Errors:     {}", style(totals.posts_errored).red());
    }
    println!(
        "  Files:      {} downloaded, {} skipped, {} failed of {}",
        style(totals.files_downloaded).green(),
        totals.files_skipped,
        totals.files_failed,
        totals.files_total
    );
    if totals.files_rejected > 0 {
        println!("  Ignored:    {} (domain not allowed)", totals.files_rejected);
    }
    if let Some(size) = ledger_size {
        println!("  Ledger:     {} link(s) pending retry", size);
    }
    println!("{}", style("═".repeat(50)).dim());
}
