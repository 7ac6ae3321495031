use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcript_scraper::cli::{Cli, Commands, NetworkArgs};
use transcript_scraper::output;
use transcript_scraper::transcribe::{BatchEntry, BatchOptions, TranscriptPipeline};
use transcript_scraper::utils;
use transcript_scraper::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = Config::load().await?;

    // Ctrl-C aborts in-flight requests and the whole batch; nothing partial is printed
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling requests");
            on_signal.cancel();
        }
    });

    match cli.command {
        Commands::Transcript {
            videos,
            languages,
            output,
            format,
            timestamps,
            continue_on_error,
            jobs,
            network,
        } => {
            let config = apply_overrides(config, &network, jobs)?;
            let languages = languages
                .as_deref()
                .map(utils::parse_language_list)
                .unwrap_or_else(|| config.app.default_languages.clone());
            let format = format.unwrap_or(config.app.default_output_format);

            let entries = fetch_batch(
                &config,
                &videos,
                &languages,
                continue_on_error,
                cli.quiet,
                &cancel,
            )
            .await?;

            match output {
                Some(path) => {
                    output::save_to_file(&entries, &path, &format, timestamps).await?;
                    if !cli.quiet {
                        eprintln!("Transcript saved to: {}", path.display());
                    }
                }
                None => {
                    output::print_to_console(&entries, &format, timestamps)?;
                }
            }

            let failures = entries.iter().filter(|entry| entry.is_failed()).count();
            if failures > 0 {
                anyhow::bail!("{} of {} videos failed", failures, entries.len());
            }
        }
        Commands::Languages {
            video,
            detailed,
            network,
        } => {
            let config = apply_overrides(config, &network, None)?;
            let video_id = utils::extract_video_id(&video);
            let proxy = config.proxy();
            let pipeline = TranscriptPipeline::new(&config, proxy.as_ref())?
                .with_cancellation(cancel.clone());

            if detailed {
                let catalog = pipeline.list_tracks(&video_id).await?;
                for track in catalog.iter() {
                    let origin = if track.is_generated { "generated" } else { "manual" };
                    println!("{}\t{}\t{}", track.language_code, track.language, origin);
                }
            } else {
                for code in pipeline.list_languages(&video_id).await? {
                    println!("{}", code);
                }
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.save().await?;
                println!("Configuration written to: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let default_filter = if cli.verbose {
        "transcript_scraper=debug,transcriptor=debug"
    } else if cli.quiet {
        "transcript_scraper=warn,transcriptor=warn"
    } else {
        "transcript_scraper=info,transcriptor=info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so stdout stays clean for transcripts
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Fold command-line flags over the loaded configuration
fn apply_overrides(
    mut config: Config,
    network: &NetworkArgs,
    jobs: Option<usize>,
) -> Result<Config> {
    if let Some(proxy) = &network.proxy {
        config.http.proxy = Some(proxy.clone());
    }
    if let Some(version) = &network.client_version {
        config.innertube.client_version = version.clone();
    }
    if let Some(timeout) = network.timeout {
        config.http.timeout_secs = timeout;
    }
    if let Some(jobs) = jobs {
        config.app.max_concurrent_jobs = jobs;
    }

    config.validate().context("Invalid settings")?;
    Ok(config)
}

/// Fetch every video through one pipeline, keeping input order in the output
async fn fetch_batch(
    config: &Config,
    videos: &[String],
    languages: &[String],
    continue_on_error: bool,
    quiet: bool,
    cancel: &CancellationToken,
) -> Result<Vec<BatchEntry>> {
    let proxy = config.proxy();
    let pipeline =
        TranscriptPipeline::new(config, proxy.as_ref())?.with_cancellation(cancel.clone());
    let options = BatchOptions {
        jobs: config.app.max_concurrent_jobs,
        continue_on_error,
    };

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(videos.len() as u64);
        bar.set_style(ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}",
        )?);
        bar
    };
    progress.set_message("Fetching transcripts...");

    let result = pipeline
        .fetch_batch(videos, languages, options, |entry| {
            progress.inc(1);
            if let BatchEntry::Failed(failed) = entry {
                progress.suspend(|| {
                    eprintln!("{} {}: {}", style("✗").red(), failed.video_id, failed.error)
                });
            }
        })
        .await;

    progress.finish_and_clear();
    Ok(result?)
}
