//! patchview CLI entry point.
//!
//! Loads a diff from a GitHub URL, a patch file or stdin and prints every
//! file with line numbers, word-diff emphasis and a file summary.

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

use patchview::domain::FileDetails;
use patchview::infra::app_config::{load_config, load_config_from};
use patchview::infra::cli::output::{
    format_file_heading, format_row, format_search_summary, format_stats, format_tree,
};
use patchview::infra::syntax::SyntectHighlighter;
use patchview::infra::vcs::registry::ProviderRegistry;
use patchview::state::DiffViewer;

#[derive(Parser, Debug)]
#[command(name = "patchview")]
#[command(version)]
#[command(about = "View commits, pull requests, comparisons and patch files as highlighted diffs", long_about = None)]
struct Args {
    /// GitHub commit/pull/compare URL, path to a patch file, or `-` for stdin
    reference: String,

    /// Disable syntax highlighting
    #[arg(long)]
    no_syntax: bool,

    /// Disable word-level emphasis of paired lines
    #[arg(long)]
    no_word_diff: bool,

    /// Syntax theme name
    #[arg(long)]
    theme: Option<String>,

    /// Show hunks that only change diff headers
    #[arg(long)]
    show_header_only: bool,

    /// Print matches for a case-insensitive search
    #[arg(short, long)]
    search: Option<String>,

    /// Print the file tree before the diff
    #[arg(long)]
    tree: bool,

    /// Print per-file added/removed counts
    #[arg(long)]
    stats: bool,

    /// Emit rendered rows as JSON
    #[arg(long)]
    json: bool,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .with_env_overrides();

    let mut options = config.render_options();
    if args.no_syntax {
        options.syntax_highlighting = false;
    }
    if args.no_word_diff {
        options.word_diff = false;
    }
    if args.show_header_only {
        options.hide_header_only_hunks = false;
    }
    if let Some(theme) = args.theme {
        options.theme = theme;
    }
    if options.syntax_highlighting && !SyntectHighlighter::has_theme(&options.theme) {
        let mut themes = SyntectHighlighter::available_themes();
        themes.sort_unstable();
        bail!("Unknown theme '{}'. Available: {}", options.theme, themes.join(", "));
    }

    let registry = ProviderRegistry::new(&config);
    let provider = registry
        .detect_provider(&args.reference)
        .context("No source can read an empty reference")?;
    let fetched = provider
        .fetch(&args.reference)
        .await
        .with_context(|| format!("Failed to load diff from {} ({})", args.reference, provider.name()))?;

    let viewer = DiffViewer::from_config(&config);
    viewer.set_options(options);
    viewer.load(fetched.title, fetched.files, fetched.blobs);

    let files = viewer.files();
    let details: Vec<&FileDetails> = files.iter().map(|file| &file.details).collect();

    if args.json {
        let rendered = viewer.render_all().await;
        let mut out = Vec::with_capacity(details.len());
        for (index, (file, rows)) in details.iter().zip(rendered).enumerate() {
            let entry = match rows {
                Ok(hunks) => json!({
                    "path": file.path(),
                    "status": file.status,
                    "checked": viewer.is_checked(index),
                    "hunks": hunks.as_ref(),
                }),
                Err(err) => json!({
                    "path": file.path(),
                    "status": file.status,
                    "error": err.to_string(),
                }),
            };
            out.push(entry);
        }
        let document = json!({
            "title": viewer.title(),
            "stats": viewer.stats().as_ref(),
            "files": out,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!("{}", viewer.title());
    if args.tree {
        print!("{}", format_tree(&viewer.file_tree()));
        println!();
    }
    if args.stats {
        print!("{}", format_stats(&viewer.stats(), &details));
        println!();
    }
    if let Some(query) = &args.search
        && let Some(results) = viewer.search_now(query)
    {
        print!("{}", format_search_summary(&results, &details));
        println!();
    }

    for (index, file) in details.iter().enumerate() {
        println!("{}", format_file_heading(index, file, viewer.is_checked(index)));

        match viewer.image_diff(index) {
            Ok(Some(images)) => {
                for handle in images.old.iter().chain(images.new.iter()) {
                    match handle.resolve().await {
                        Ok(blob) => {
                            let size = blob
                                .dimensions()
                                .map(|(w, h)| format!("{w}x{h}"))
                                .unwrap_or_else(|| "unknown size".to_string());
                            println!(
                                "    {:?}: {} ({size}, {} bytes)",
                                handle.revision(),
                                handle.path(),
                                blob.bytes.len()
                            );
                        }
                        Err(err) => log::warn!("Cannot load image {}: {err}", handle.path()),
                    }
                }
                println!();
                continue;
            }
            Ok(None) => {}
            Err(err) => {
                println!("    {err}\n");
                continue;
            }
        }

        match viewer.render_file(index).await {
            Ok(hunks) => {
                for hunk in hunks.iter() {
                    for line in &hunk.lines {
                        println!("{}", format_row(line));
                    }
                }
            }
            Err(err) => println!("    {err}"),
        }
        println!();
    }

    Ok(())
}
