use clap::{Parser, Subcommand};
use dialoguer::Select;
use sous_titres::{
    Config, ProgressEvent, SearchResult, SousTitresEu, SubtitleSource, fetch_subtitle,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sous-titres")]
#[command(about = "Find and download Spanish subtitles from www.sous-titres.eu")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the subtitles available for a video file
    Search {
        /// Video file to search subtitles for
        video: PathBuf,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a subtitle next to a video file
    Fetch {
        /// Video file to download a subtitle for
        video: PathBuf,

        /// Pick the subtitle from a list instead of taking the first result
        #[arg(short, long)]
        interactive: bool,
    },
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Searching {
            site_name,
            video_path,
        } => {
            println!("Searching {} for {}...", site_name, video_path.display());
        }
        ProgressEvent::ResultsFound { count } => {
            if count == 0 {
                println!("No subtitles found.");
            } else {
                println!("Found {} subtitle(s)", count);
            }
        }
        ProgressEvent::Downloading { release, link } => {
            println!("Downloading {} ({})", release, link);
        }
        ProgressEvent::Complete { subtitle_path } => {
            println!("Subtitle saved to {}", subtitle_path.display());
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn choose_interactively(results: &[SearchResult]) -> Option<usize> {
    if results.is_empty() {
        return None;
    }

    let labels: Vec<String> = results
        .iter()
        .map(|r| format!("{} [{}]", r.release, r.language))
        .collect();

    match Select::new()
        .with_prompt("Choose a subtitle")
        .items(&labels)
        .default(0)
        .interact_opt()
    {
        Ok(choice) => choice,
        Err(e) => {
            eprintln!("Error: Selection failed: {}", e);
            None
        }
    }
}

fn search(source: &SousTitresEu, video: &Path, json: bool) {
    let languages = vec!["es".to_string()];
    let results = match source.process(video, &languages) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("\nError during search: {}", e);
            process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&results) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("Error: Failed to serialize results: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    if results.is_empty() {
        println!("No subtitles found.");
        return;
    }

    for (index, result) in results.iter().enumerate() {
        println!("Result #{}", index + 1);
        println!("  Release: {}", result.release);
        println!("  Language: {}", result.language);
        println!("  Link: {}", result.link);
        println!();
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let source = match SousTitresEu::new(config) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Command::Search { video, json } => search(&source, &video, json),
        Command::Fetch { video, interactive } => {
            if !video.is_file() {
                eprintln!("Error: Video file does not exist: {}", video.display());
                process::exit(1);
            }

            let choose = |results: &[SearchResult]| {
                if interactive {
                    choose_interactively(results)
                } else if results.is_empty() {
                    None
                } else {
                    Some(0)
                }
            };

            match fetch_subtitle(&source, &video, choose, handle_progress_event) {
                Ok(Some(_)) => {}
                Ok(None) => process::exit(1),
                Err(e) => {
                    eprintln!("\nError while fetching subtitle: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}
