use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use foldersearch::{no_results_message, RootSet, SearchEvent, SearchOutcome};

/// foldersearch - find a keyword in the text files of several folders
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Keyword to search for (case-insensitive)
    keyword: String,

    /// Folders to search
    #[arg(required = true)]
    folders: Vec<PathBuf>,

    /// File extensions to scan, replaces the default list (repeatable)
    #[arg(short, long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Number of walker threads
    #[arg(short, long)]
    threads: Option<usize>,

    /// Do not descend into symbolic links to directories
    #[arg(long)]
    no_follow_links: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    // Surface duplicate folders the way an interactive front end would.
    let mut roots = RootSet::new();
    for folder in &cli.folders {
        if let Err(e) = roots.insert(folder) {
            eprintln!("warning: {e}");
        }
    }

    let mut builder = foldersearch::search()
        .keyword(cli.keyword.as_str())
        .roots(roots.iter())
        .follow_links(!cli.no_follow_links);
    if !cli.extensions.is_empty() {
        builder = builder.extensions(cli.extensions);
    }
    if let Some(n) = cli.threads {
        builder = builder.threads(n);
    }

    let mut handle = builder.start().context("cannot start search")?;

    let mut rendered = 0usize;
    for event in handle.events() {
        match &event {
            SearchEvent::Match(m) => {
                println!("{m}");
                rendered += 1;
            }
            SearchEvent::FileError(e) => println!("{e}"),
        }
    }

    match handle.wait() {
        SearchOutcome::Completed(summary) => {
            if rendered == 0 {
                println!("{}", no_results_message(cli.keyword.trim()));
            }
            eprintln!("{}", completion_status(summary.cancelled));
            debug!(
                "{} file(s), {} dir(s) in {:.3}s",
                summary.stats.files,
                summary.stats.dirs,
                summary.stats.duration.as_secs_f64()
            );
            Ok(ExitCode::SUCCESS)
        }
        SearchOutcome::Failed(reason) => {
            eprintln!("Search failed.");
            eprintln!("error: {reason}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn completion_status(cancelled: bool) -> &'static str {
    if cancelled {
        "Search cancelled."
    } else {
        "Search completed."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_reflects_cancellation() {
        assert_eq!(completion_status(false), "Search completed.");
        assert_eq!(completion_status(true), "Search cancelled.");
    }

    #[test]
    fn cli_parses_repeated_extensions() {
        let cli = Cli::try_parse_from(["foldersearch", "-e", "md", "-e", "rs", "todo", "a", "b"]).unwrap();
        assert_eq!(cli.keyword, "todo");
        assert_eq!(cli.folders, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(cli.extensions, vec!["md", "rs"]);
    }
}
