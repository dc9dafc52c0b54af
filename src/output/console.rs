//! Console output utilities.

use console::{style, StyledObject};

use crate::config::Config;

fn status(tag: StyledObject<&str>, message: &str) {
    println!("{} {}", tag.bold(), message);
}

pub fn print_info(message: &str) {
    status(style("INFO").cyan(), message);
}

pub fn print_success(message: &str) {
    status(style("OK").green(), message);
}

pub fn print_warning(message: &str) {
    status(style("WARN").yellow(), message);
}

/// Print an error message to stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     KC Downloader                                     ║
║     Posts and files from kemono / coomer              ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// Print the effective settings of this run.
pub fn print_config_summary(config: &Config, mode: &str, targets: &[String]) {
    let options = &config.options;
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Mode: {}", mode);
    if !targets.is_empty() {
        println!("  Targets: {}", targets.join(", "));
    }
    println!("  Domains: {}", config.domains.all().join(", "));
    println!("  Directory: {}", config.download_directory().display());
    println!(
        "  Workers: {}, post folders: {}, order: {}",
        options.workers,
        options.post_folder_name,
        if options.process_from_oldest { "oldest first" } else { "newest first" }
    );
    println!(
        "  Skip existing files: {}, skip complete posts: {}",
        on_off(options.skip_existed_files),
        on_off(options.skip_complete_posts)
    );
    println!();
}
