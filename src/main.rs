mod assemble;
mod book;
mod cli;
mod dom;
mod epub;
mod error;
mod images;
mod render;
mod resolve;
mod sanitize;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};

/// Format a byte count as a human-readable size string.
fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let output =
        cli::output::OutputConfig::from_global(cli.json, cli.verbose, cli.quiet, cli.no_color);

    match cli.command {
        Command::Convert {
            input,
            output: out_file,
            cover,
            meta,
            image_dir,
            modified,
        } => {
            let options = assemble::ConvertOptions {
                metadata_path: meta,
                cover_path: cover,
                image_dir,
                modified,
            };
            handle_convert(&input, out_file, &options, &output)?;
        }
        Command::Inspect { input } => handle_inspect(&input, &output)?,
        Command::Validate { file } => handle_validate(&file, &output)?,
    }

    Ok(())
}

fn handle_convert(
    input: &std::path::Path,
    out_file: Option<std::path::PathBuf>,
    options: &assemble::ConvertOptions,
    output: &cli::output::OutputConfig,
) -> Result<()> {
    let epub_path = out_file.unwrap_or_else(|| input.with_extension("epub"));

    let report = assemble::convert_file(input, &epub_path, images::HttpFetcher::new(), options)
        .with_context(|| {
        format!(
            "converting {} to {}",
            input.display(),
            epub_path.display()
        )
    })?;

    if report.chapters.is_empty() {
        output.status("Warning: no chapter blocks found in input");
    }

    if output.json {
        let json = serde_json::json!({
            "output": epub_path.display().to_string(),
            "chapters": report.chapters.len(),
            "images": report.images,
        });
        output.print_json(&json)?;
    } else {
        output.status(&format!(
            "Converted {} ({} chapters, {} images)",
            epub_path.display(),
            report.chapters.len(),
            report.images
        ));
        if output.verbose
            && let Ok(meta) = std::fs::metadata(&epub_path)
        {
            output.detail(&format!("  Size: {}", format_size(meta.len() as usize)));
        }
        for chapter in &report.chapters {
            output.detail(&format!(
                "  {} -> {}: {}",
                chapter.original_id, chapter.clean_id, chapter.title
            ));
        }
    }

    Ok(())
}

fn handle_inspect(input: &std::path::Path, output: &cli::output::OutputConfig) -> Result<()> {
    let html = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let document = dom::parse_html(&html);
    let mut chapters = book::segment_chapters(&document);
    for chapter in &mut chapters {
        sanitize::strip_chrome(chapter);
    }
    // Fills in the clean ids and output file names.
    let (_index, _plans) = book::index::build_index(&mut chapters);

    if output.json {
        let items: Vec<_> = chapters
            .iter()
            .map(|c| {
                serde_json::json!({
                    "original_id": c.original_id,
                    "clean_id": c.clean_id,
                    "file": c.file_name(),
                    "title": c.toc_title(),
                })
            })
            .collect();
        output.print_json(&items)?;
    } else {
        let rows: Vec<Vec<String>> = chapters
            .iter()
            .enumerate()
            .map(|(i, c)| {
                vec![
                    (i + 1).to_string(),
                    c.original_id.clone(),
                    c.file_name(),
                    c.toc_title(),
                ]
            })
            .collect();
        if rows.is_empty() {
            output.status("No chapter blocks found");
        } else {
            output.print_table(&["#", "ORIGINAL", "FILE", "TITLE"], &rows);
        }
    }

    Ok(())
}

fn handle_validate(file: &std::path::Path, output: &cli::output::OutputConfig) -> Result<()> {
    let issues = epub::validate::validate_epub(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    // Defer to epubcheck for full conformance when it is installed; only
    // its pass/fail verdict is used.
    let epubcheck = match std::process::Command::new("epubcheck").arg(file).status() {
        Ok(status) => Some(status.success()),
        Err(_) => {
            output.detail("epubcheck not found, structural checks only");
            None
        }
    };

    let valid = issues.is_empty() && epubcheck != Some(false);
    if output.json {
        let json = serde_json::json!({
            "valid": valid,
            "issues": issues,
            "epubcheck": epubcheck,
        });
        output.print_json(&json)?;
    } else if valid {
        println!("{}: valid", file.display());
    } else {
        if !issues.is_empty() {
            println!("{}: {} issue(s)", file.display(), issues.len());
            for issue in &issues {
                println!("  - {issue}");
            }
        }
        if epubcheck == Some(false) {
            println!("{}: epubcheck reported errors", file.display());
        }
    }

    if !valid {
        std::process::exit(1);
    }
    Ok(())
}
