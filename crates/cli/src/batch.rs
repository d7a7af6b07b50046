//! Batch driver: file discovery, output re-rooting, and the sequential
//! conversion loop.

use cn2tw_core::{CharacterMapper, ConversionJob, ConversionReport};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Discovery and naming options for a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Optional suffix appended to every output file stem (e.g. "_tw").
    /// Files already carrying the suffix are skipped during discovery so
    /// re-running over a previous output directory converts nothing twice.
    pub suffix: Option<String>,
}

/// Find every .pptx file under `input_root` and pair it with its output
/// path under `output_root`, preserving the relative directory structure.
///
/// Deterministic: results are in sorted path order. An empty result is
/// not an error.
pub fn discover_jobs(
    input_root: &Path,
    output_root: &Path,
    options: &BatchOptions,
) -> Vec<ConversionJob> {
    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut jobs = Vec::new();

    for entry in WalkDir::new(input_root)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_pptx_extension(entry.path()) {
            continue;
        }
        if let Some(suffix) = &options.suffix {
            if stem_has_suffix(entry.path(), suffix) {
                log::debug!("skipping already-converted file: {}", entry.path().display());
                continue;
            }
        }

        let relative = entry
            .path()
            .strip_prefix(input_root)
            .unwrap_or_else(|_| entry.path());
        let mut output = output_root.join(relative);
        if let Some(suffix) = &options.suffix {
            output = append_stem_suffix(&output, suffix);
        }

        jobs.push(ConversionJob::new(entry.path(), output));
    }

    jobs
}

/// Convert every job in order, recording per-file outcomes.
///
/// A failed file is reported and the batch moves on; nothing aborts the
/// run. Progress goes to stdout, or to stderr when `progress_to_stderr`
/// is set (so `--json` output stays parseable).
pub fn run_batch(
    jobs: &[ConversionJob],
    mapper: &CharacterMapper,
    progress_to_stderr: bool,
) -> ConversionReport {
    let mut report = ConversionReport::new();

    for job in jobs {
        emit(
            progress_to_stderr,
            format!("Converting: {} -> {}", job.input.display(), job.output.display()),
        );
        match cn2tw_pptx::convert_file(&job.input, &job.output, mapper) {
            Ok(outcome) => {
                report.record_success();
                emit(
                    progress_to_stderr,
                    format!("  ok ({} of {} text runs rewritten)", outcome.rewritten, outcome.locations),
                );
            }
            Err(e) => {
                report.record_failure(&job.input, e.to_string());
                eprintln!("  failed: {}", e);
            }
        }
    }

    report
}

fn emit(to_stderr: bool, message: String) {
    if to_stderr {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}

/// Case-insensitive .pptx extension check.
fn has_pptx_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pptx"))
        .unwrap_or(false)
}

fn stem_has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.ends_with(suffix))
        .unwrap_or(false)
}

/// `dir/name.pptx` with suffix `_tw` becomes `dir/name_tw.pptx`.
pub fn append_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("pptx");
    path.with_file_name(format!("{}{}.{}", stem, suffix, extension))
}
