use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use exif_edit::exif::{MetadataBlock, tags};
use exif_edit::pipeline::{self, Action};
use exif_edit::{MetadataEditor, config};

#[derive(Parser, Debug)]
#[command(
    name = "exif-edit",
    version,
    about = "Copy, clear or prune the EXIF metadata of JPEG, PNG and WebP images"
)]
#[command(group(ArgGroup::new("action").args(["show_exif", "clear_exif", "remove_tag", "clone_from"])))]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Display all EXIF metadata
    #[arg(long = "show-exif")]
    show_exif: bool,

    /// Replace the EXIF metadata with an empty block
    #[arg(long = "clear-exif")]
    clear_exif: bool,

    /// Remove a tag, given by name (Model), decimal (272) or hex (0x0110)
    #[arg(long = "remove-tag", value_name = "TAG", value_parser = parse_tag)]
    remove_tag: Option<u16>,

    /// Copy the EXIF metadata of SOURCE onto every image
    #[arg(long = "clone-from", value_name = "SOURCE")]
    clone_from: Option<PathBuf>,

    /// Report what would change without writing to files
    #[arg(long)]
    dry_run: bool,

    /// Do not create .bak backups, whatever the config says
    #[arg(long)]
    no_backup: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_tag(s: &str) -> std::result::Result<u16, String> {
    tags::parse_tag(s).ok_or_else(|| format!("unknown EXIF tag '{s}'"))
}

impl Cli {
    fn action(&self) -> Option<Action> {
        if self.show_exif {
            Some(Action::Show)
        } else if self.clear_exif {
            Some(Action::Clear)
        } else if let Some(tag) = self.remove_tag {
            Some(Action::RemoveField(tag))
        } else {
            self.clone_from.clone().map(Action::CloneFrom)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }
    let Some(action) = cli.action() else {
        anyhow::bail!(
            "No action specified. Use one of --show-exif, --clear-exif, --remove-tag or --clone-from."
        );
    };

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;

    // Override from CLI flags
    if cli.dry_run {
        config.output.dry_run = true;
    }
    if cli.no_backup {
        config.output.backup_originals = false;
    }

    // Collect images
    let mut images = pipeline::collect_images(&cli.paths);
    if let Action::CloneFrom(source) = &action {
        let source = source
            .canonicalize()
            .with_context(|| format!("Clone source {} not found", source.display()))?;
        images.retain(|p| p.canonicalize().map_or(true, |p| p != source));
    }
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    if action != Action::Show {
        log::info!("Found {} image(s) to process", images.len());
        if config.output.dry_run {
            log::info!("DRY RUN: no files will be modified");
        }
    }

    let editor = MetadataEditor::new(config.editor_options());
    let total = images.len();
    let mut results = Vec::with_capacity(total);

    for (i, image_path) in images.iter().enumerate() {
        log::debug!("[{}/{}] {}", i + 1, total, image_path.display());
        let result = pipeline::process_image(image_path, &action, &editor);

        if !cli.json {
            report(&result);
        }
        results.push(result);
    }

    // JSON output
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    // Summary
    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if action != Action::Show {
        let success = total - failed;
        log::info!("Done: {success} succeeded, {failed} failed out of {total} images");
    }
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Print the human-readable outcome for one file.
fn report(result: &pipeline::ProcessResult) {
    if let Some(ref err) = result.error {
        log::error!("{}: {err}", result.path.display());
        return;
    }

    if let Some(ref outcome) = result.outcome {
        let verb = match &result.action {
            Action::Show => "Read",
            Action::Clear => "Cleared",
            Action::RemoveField(_) => "Removed",
            Action::CloneFrom(_) => "Cloned",
        };
        match (&result.action, outcome.fields_removed, outcome.written) {
            (Action::RemoveField(tag), 0, _) => {
                log::info!("{}: tag {tag:#06x} not present", result.path.display())
            }
            (Action::RemoveField(_), n, true) => {
                log::info!("{}: removed {n} field(s)", result.path.display())
            }
            (_, _, true) => log::info!("{verb}: {}", result.path.display()),
            (_, _, false) => log::info!("{verb} (dry run): {}", result.path.display()),
        }
        if let Some(ref backup) = outcome.backup_path {
            log::debug!("  Backup: {}", backup.display());
        }
        return;
    }

    print_full_exif(result);
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print full EXIF metadata for a file, organized by segment.
fn print_full_exif(result: &pipeline::ProcessResult) {
    println!();
    println!("{BOLD}File:{RESET} {}", result.path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    let block = match &result.metadata {
        Some(block) if !block.is_empty() => block,
        _ => {
            println!("  {DIM}(no EXIF metadata found){RESET}");
            println!();
            return;
        }
    };
    print_block(block);
}

fn print_block(block: &MetadataBlock) {
    for (segment, fields) in block.segments() {
        println!("  {BOLD}{segment}{RESET}");
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        for (&tag, value) in fields {
            print_row(&tags::tag_name(segment, tag), &value.to_string());
        }
        println!();
    }

    if let Some(thumbnail) = block.thumbnail() {
        println!("  {BOLD}Thumbnail{RESET}");
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        print_row("JPEGInterchangeFormat", &format!("{} bytes", thumbnail.len()));
        println!();
    }
}

/// Print a single row in the EXIF display table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
