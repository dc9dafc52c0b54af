//! KC Downloader - CLI entry point.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use kc_downloader::{
    api::{build_http_client, RetryPolicy, SiteApis},
    cli::{Args, Command, DownloadArgs, PostsArgs, ProfileArgs},
    collect::{
        resolve, snapshot_file_name, CollectOptions, DetailCache, FetchPlan, PostCollector,
        ProfileSnapshot,
    },
    config::{parse_post_link, parse_profile_link, split_links, validate_config, Config},
    download::{DownloadResult, Downloader, LinkReport, RunTotals},
    error::{exit_codes, Error, ErrorKind, Result},
    fs::{
        artist_dir, ensure_dir, posts_dir_for_snapshot, site_dir, ArtistInfo, ProfileRegistry,
        POSTS_DIR,
    },
    output::{
        create_spinner, print_banner, print_config_summary, print_error, print_info,
        print_run_summary, print_success, print_warning,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            print_warning("Interrupted, letting running transfers finish...");
            token.cancel();
        }
    });

    match run(cancel.clone()).await {
        Ok(_) if cancel.is_cancelled() => ExitCode::from(exit_codes::CANCELLED as u8),
        Ok(totals) if totals.has_failures() => {
            ExitCode::from(exit_codes::SOME_POSTS_FAILED as u8)
        }
        Ok(_) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            let code = match e.kind() {
                ErrorKind::Cancelled => exit_codes::CANCELLED,
                ErrorKind::Collection => exit_codes::COLLECTION_INCOMPLETE,
                ErrorKind::Validation => exit_codes::CONFIG_ERROR,
                ErrorKind::Network => exit_codes::API_ERROR,
                ErrorKind::Integrity | ErrorKind::Filesystem => exit_codes::DOWNLOAD_ERROR,
                ErrorKind::Other => exit_codes::UNEXPECTED_ERROR,
            };
            ExitCode::from(code as u8)
        }
    }
}

async fn run(cancel: CancellationToken) -> Result<RunTotals> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            args.config.display()
        ));
        print_info("Using default configuration with CLI arguments");
        Config::default()
    };

    args.merge_into_config(&mut config);
    validate_config(&config)?;

    let targets = match &args.command {
        Command::Profile(profile) => vec![profile.url.clone()],
        Command::Posts(posts) => posts.links.clone(),
        Command::Download(download) => vec![download.snapshot.display().to_string()],
        Command::RetryFailed => Vec::new(),
    };
    print_config_summary(&config, args.mode(), &targets);

    let client = build_http_client(&config.options)?;
    let apis = SiteApis::new(&config, client.clone());
    let downloader = Downloader::new(&config, client, cancel.clone());

    let totals = match &args.command {
        Command::Profile(profile) => {
            run_profile(&config, &apis, &downloader, profile, cancel).await?
        }
        Command::Posts(posts) => run_posts(&config, &apis, &downloader, posts).await?,
        Command::Download(download) => run_download(&downloader, download).await?,
        Command::RetryFailed => {
            let reports = downloader.retry_failed(&apis).await?;
            let mut totals = RunTotals::default();
            tally_links(&mut totals, &reports);
            totals
        }
    };

    print_run_summary(&totals, downloader.ledger().len().ok());
    Ok(totals)
}

/// Collect a profile's posts, then optionally download them.
async fn run_profile(
    config: &Config,
    apis: &SiteApis,
    downloader: &Downloader<'_>,
    args: &ProfileArgs,
    cancel: CancellationToken,
) -> Result<RunTotals> {
    let link = parse_profile_link(&config.domains, &args.url)?;
    let api = apis.get(link.site)?;
    let retry = RetryPolicy::from_options(&config.options);

    let spinner = create_spinner("Fetching profile...");
    let profile = retry
        .run("profile", || api.get_profile(&link.service, &link.user_id))
        .await;
    spinner.finish_and_clear();
    let profile = profile?;

    print_info(&format!(
        "Creator: {} ({} posts, updated {})",
        profile.name,
        profile.post_count,
        profile.updated.as_deref().unwrap_or("unknown")
    ));

    let mut registry = ProfileRegistry::load(&site_dir(config, link.site));
    if let Err(e) = registry.upsert(ArtistInfo::from(&profile)) {
        print_warning(&format!("Could not update profile registry: {}", e));
    }

    let plan = FetchPlan::new(resolve(&args.fetch, profile.post_count)?, profile.post_count);
    let (Some(first), Some(last)) = (plan.first_offset(), plan.last_offset()) else {
        print_warning("Nothing to collect for this fetch mode");
        return Ok(RunTotals::default());
    };

    let artist = artist_dir(config, link.site, &profile.name, &link.service, &link.user_id);
    ensure_dir(&artist)?;
    let today = chrono::Local::now().date_naive();
    let snapshot_path = artist.join(snapshot_file_name(first, last, today));

    let collector = PostCollector::new(
        api,
        DetailCache::new(&config.options.cache_directory),
        CollectOptions::from_options(&config.options),
        cancel,
    );
    let posts = collector
        .collect(&link.service, &link.user_id, &plan, &snapshot_path)
        .await?;

    print_success(&format!(
        "Collected {} posts into {}",
        posts.len(),
        snapshot_path.display()
    ));

    if !args.download {
        return Ok(RunTotals::default());
    }

    let snapshot = ProfileSnapshot::new(posts);
    let results = downloader
        .download_all(&snapshot, &artist.join(POSTS_DIR), None)
        .await?;
    Ok(result_totals(&results))
}

/// Download individual post links given on the command line or in a file.
async fn run_posts(
    config: &Config,
    apis: &SiteApis,
    downloader: &Downloader<'_>,
    args: &PostsArgs,
) -> Result<RunTotals> {
    let mut raw: Vec<String> = args.links.iter().flat_map(|l| split_links(l)).collect();
    if let Some(file) = &args.file {
        let content = std::fs::read_to_string(file)?;
        raw.extend(split_links(&content));
    }
    if raw.is_empty() {
        return Err(Error::InvalidLink("no post links given".to_string()));
    }

    let mut totals = RunTotals::default();
    let mut links = Vec::with_capacity(raw.len());
    for link in &raw {
        match parse_post_link(&config.domains, link) {
            Ok(parsed) => links.push(parsed),
            Err(e) => {
                print_error(&format!("Skipping {}: {}", link, e));
                totals.mark_errored();
            }
        }
    }

    let reports = downloader.download_links(apis, &links).await;
    tally_links(&mut totals, &reports);
    Ok(totals)
}

/// Download the posts of an existing snapshot file.
async fn run_download(downloader: &Downloader<'_>, args: &DownloadArgs) -> Result<RunTotals> {
    let snapshot = load_snapshot(&args.snapshot)?;
    print_info(&format!("Snapshot holds {} posts", snapshot.total_posts));

    let results = downloader
        .download_all(
            &snapshot,
            &posts_dir_for_snapshot(&args.snapshot),
            args.post.as_deref(),
        )
        .await?;
    Ok(result_totals(&results))
}

fn load_snapshot(path: &Path) -> Result<ProfileSnapshot> {
    ProfileSnapshot::load(path).map_err(|e| {
        Error::Config(format!("Cannot read snapshot {}: {}", path.display(), e))
    })
}

fn result_totals(results: &[DownloadResult]) -> RunTotals {
    let mut totals = RunTotals::default();
    for result in results {
        totals.add(result);
    }
    totals
}

fn tally_links(totals: &mut RunTotals, reports: &[LinkReport]) {
    for report in reports {
        match &report.outcome {
            Ok(result) => totals.add(result),
            Err(_) => totals.mark_errored(),
        }
    }
}
