//! CLI tool for batch-converting Simplified Chinese PPTX files to
//! Traditional Chinese.

mod batch;

use anyhow::{bail, Context, Result};
use batch::BatchOptions;
use clap::Parser;
use cn2tw_core::{CharacterMapper, ConversionJob, ConversionReport};
use std::path::{Path, PathBuf};

/// Convert Simplified Chinese text in .pptx files to Traditional Chinese.
#[derive(Parser, Debug)]
#[command(name = "ppt-cn2tw")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input directory to scan for .pptx files (or a single file)
    path: Option<PathBuf>,

    /// Explicit single input file
    #[arg(short, long, conflicts_with = "path")]
    input: Option<PathBuf>,

    /// Output directory (or file in single-file mode); defaults to
    /// converting in place
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Treat the input path as a directory
    #[arg(short, long)]
    directory: bool,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Append a suffix to output file stems (e.g. "_tw") instead of
    /// reusing the input name; suffixed files are skipped on re-runs
    #[arg(long)]
    suffix: Option<String>,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    // Without the table nothing can be converted; fail before touching
    // any file.
    let mapper = CharacterMapper::load().context("cannot start without a conversion table")?;
    log::debug!("loaded conversion table with {} mappings", mapper.len());

    let report = if let Some(file) = &args.input {
        run_single_file(file, &args, &mapper)?
    } else {
        let path = args
            .path
            .as_deref()
            .context("no input given: pass a directory or use --input <FILE>")?;
        if path.is_file() && !args.directory {
            run_single_file(path, &args, &mapper)?
        } else {
            run_directory(path, &args, &mapper)?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Done: {} of {} file(s) converted, {} failed",
            report.succeeded, report.total_files, report.failed
        );
    }

    if !report.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

/// Convert exactly one file.
fn run_single_file(input: &Path, args: &Args, mapper: &CharacterMapper) -> Result<ConversionReport> {
    if !input.is_file() {
        bail!("input file does not exist: {}", input.display());
    }

    let output = single_file_output(input, args.output.as_deref(), args.suffix.as_deref());
    let job = ConversionJob::new(input, output);
    Ok(batch::run_batch(&[job], mapper, args.json))
}

/// Convert every .pptx file under a directory.
fn run_directory(input_root: &Path, args: &Args, mapper: &CharacterMapper) -> Result<ConversionReport> {
    if !input_root.is_dir() {
        bail!("input directory does not exist: {}", input_root.display());
    }

    let output_root = args.output.clone().unwrap_or_else(|| input_root.to_path_buf());
    let options = BatchOptions {
        recursive: args.recursive,
        suffix: args.suffix.clone(),
    };

    let jobs = batch::discover_jobs(input_root, &output_root, &options);
    if args.json {
        eprintln!("Found {} .pptx file(s) in {}", jobs.len(), input_root.display());
    } else {
        println!("Found {} .pptx file(s) in {}", jobs.len(), input_root.display());
    }

    Ok(batch::run_batch(&jobs, mapper, args.json))
}

/// Output path for single-file mode.
///
/// With no `--output` the file converts in place (plus suffix when set);
/// an `--output` naming an existing directory gets the input's file name
/// appended, anything else is used as the literal output file.
fn single_file_output(input: &Path, output: Option<&Path>, suffix: Option<&str>) -> PathBuf {
    let mut path = match output {
        None => input.to_path_buf(),
        Some(out) if out.is_dir() => out.join(input.file_name().unwrap_or_default()),
        Some(out) => out.to_path_buf(),
    };
    if let Some(suffix) = suffix {
        path = batch::append_stem_suffix(&path, suffix);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file_output_defaults_in_place() {
        let out = single_file_output(Path::new("decks/a.pptx"), None, None);
        assert_eq!(out, PathBuf::from("decks/a.pptx"));
    }

    #[test]
    fn test_single_file_output_with_suffix() {
        let out = single_file_output(Path::new("decks/a.pptx"), None, Some("_tw"));
        assert_eq!(out, PathBuf::from("decks/a_tw.pptx"));
    }

    #[test]
    fn test_single_file_output_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = single_file_output(Path::new("decks/a.pptx"), Some(dir.path()), None);
        assert_eq!(out, dir.path().join("a.pptx"));
    }

    #[test]
    fn test_single_file_output_explicit_file() {
        let out = single_file_output(
            Path::new("a.pptx"),
            Some(Path::new("converted/b.pptx")),
            None,
        );
        assert_eq!(out, PathBuf::from("converted/b.pptx"));
    }
}
