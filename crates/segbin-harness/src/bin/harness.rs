//! CLI entrypoint for segbin tooling.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};

use segbin_core::{BucketScheme, Preset};
use segbin_harness::report::{BucketTable, TableFormat, sha256_hex};
use segbin_harness::source::SchemeSource;
use segbin_harness::structured_log::{LogEmitter, LogLevel, Outcome, validate_log_file};
use segbin_harness::verify::verify_scheme;

/// Bucket scheme tooling for segbin.
#[derive(Debug, Parser)]
#[command(name = "segbin-harness")]
#[command(about = "Bucket table dumps and verification for segbin")]
struct Cli {
    /// Write structured JSONL events for this run to this path.
    #[arg(long, global = true)]
    log: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct SchemeArgs {
    /// Preset name (`word64`, `word32`, `native`). Defaults to $SEGBIN_PRESET.
    #[arg(long)]
    preset: Option<Preset>,
    /// JSON `BucketConfig` file; overrides --preset.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl SchemeArgs {
    fn source(&self) -> SchemeSource {
        SchemeSource::resolve(self.preset, self.config.as_deref())
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Dump every size class of a scheme.
    Table {
        #[command(flatten)]
        scheme: SchemeArgs,
        /// Output format: `csv` (default), `json`, or `markdown`.
        #[arg(long, default_value = "csv")]
        format: TableFormat,
        /// Output file path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Resolve one size to its bucket, or one bucket to its size range.
    Lookup {
        #[command(flatten)]
        scheme: SchemeArgs,
        /// Size in bytes to look up.
        #[arg(long, conflicts_with = "index", required_unless_present = "index")]
        size: Option<u64>,
        /// Bucket index to look up.
        #[arg(long)]
        index: Option<usize>,
        /// Round the size up to the first bucket able to serve it.
        #[arg(long, requires = "size", conflicts_with = "saturating")]
        round_up: bool,
        /// Clamp oversized sizes into the last bucket.
        #[arg(long, requires = "size")]
        saturating: bool,
    },
    /// Run the property checks against a scheme.
    Verify {
        #[command(flatten)]
        scheme: SchemeArgs,
        /// Output report path (markdown).
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Validate a structured JSONL log file.
    ValidateLog {
        /// JSONL file to validate.
        #[arg(long)]
        input: PathBuf,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Table { .. } => "table",
            Self::Lookup { .. } => "lookup",
            Self::Verify { .. } => "verify",
            Self::ValidateLog { .. } => "validate-log",
        }
    }
}

fn run_id() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{}-{millis}", std::process::id())
}

/// Builds the scheme, logging the failure before handing it back.
fn build_scheme(
    emitter: &mut LogEmitter,
    command: &str,
    source: &SchemeSource,
) -> Result<BucketScheme, Box<dyn std::error::Error>> {
    match source.build() {
        Ok(scheme) => {
            let entry = emitter
                .entry(LogLevel::Debug, "scheme_built")
                .with_command(command)
                .with_scheme(source.label(), *scheme.config())
                .with_details(serde_json::json!({
                    "bucket_count": scheme.bucket_count(),
                    "min_chunk_size": scheme.min_chunk_size(),
                    "max_size": scheme.max_size(),
                }));
            emitter.emit_entry(entry)?;
            Ok(scheme)
        }
        Err(err) => {
            let entry = emitter
                .entry(LogLevel::Error, "scheme_rejected")
                .with_command(command)
                .with_error(&err);
            emitter.emit_entry(entry)?;
            emitter.flush()?;
            Err(err.into())
        }
    }
}

fn write_or_print(output: Option<&Path>, content: &str) -> std::io::Result<()> {
    match output {
        Some(path) => std::fs::write(path, content),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let run_id = run_id();
    let mut emitter = match &cli.log {
        Some(path) => LogEmitter::to_file(path, "segbin", &run_id)?,
        None => LogEmitter::to_sink("segbin", &run_id),
    };

    let command = cli.command.name();
    let started = Instant::now();
    let entry = emitter
        .entry(LogLevel::Info, &format!("{}_start", command.replace('-', "_")))
        .with_command(command);
    emitter.emit_entry(entry)?;

    let result = run(cli.command, &mut emitter);

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut entry = emitter
        .entry(LogLevel::Info, &format!("{}_done", command.replace('-', "_")))
        .with_command(command)
        .with_duration_ms(elapsed_ms);
    entry = match &result {
        Ok(()) => entry.with_outcome(Outcome::Pass),
        Err(err) => {
            entry.level = LogLevel::Error;
            entry.with_outcome(Outcome::Fail).with_error(err)
        }
    };
    emitter.emit_entry(entry)?;
    emitter.flush()?;

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

fn run(command: Command, emitter: &mut LogEmitter) -> Result<(), Box<dyn std::error::Error>> {
    let name = command.name();
    match command {
        Command::Table {
            scheme,
            format,
            output,
        } => {
            let source = scheme.source();
            let bucket_scheme = build_scheme(emitter, name, &source)?;
            let table = BucketTable::from_scheme(source.label(), &bucket_scheme);
            let rendered = table.render(format)?;
            write_or_print(output.as_deref(), &rendered)?;

            let mut entry = emitter
                .entry(LogLevel::Info, "table_written")
                .with_command(name)
                .with_scheme(source.label(), *bucket_scheme.config())
                .with_details(serde_json::json!({
                    "format": format,
                    "rows": table.classes.len(),
                    "sha256": sha256_hex(rendered.as_bytes()),
                }));
            if let Some(path) = &output {
                entry = entry.with_artifacts(vec![path.display().to_string()]);
            }
            emitter.emit_entry(entry)?;
        }
        Command::Lookup {
            scheme,
            size,
            index,
            round_up,
            saturating,
        } => {
            let source = scheme.source();
            let bucket_scheme = build_scheme(emitter, name, &source)?;

            let (operation, resolved) = match (size, index) {
                (Some(size), _) if round_up => {
                    ("index_for_request", bucket_scheme.index_for_request(size))
                }
                (Some(size), _) if saturating => {
                    ("index_of_saturating", bucket_scheme.index_of_saturating(size))
                }
                (Some(size), _) => ("index_of", bucket_scheme.index_of(size)),
                (None, Some(index)) => ("size_of", Ok(index)),
                (None, None) => return Err("lookup needs --size or --index".into()),
            };

            let mut entry = emitter
                .entry(LogLevel::Info, "lookup_resolved")
                .with_command(name)
                .with_scheme(source.label(), *bucket_scheme.config())
                .with_operation(operation);
            if let Some(size) = size {
                entry = entry.with_size(size);
            }

            let class = resolved
                .map_err(segbin_core::BinningError::from)
                .and_then(|i| Ok(bucket_scheme.size_class(i)?));
            match class {
                Ok(class) => {
                    emitter.emit_entry(
                        entry
                            .with_index(class.index)
                            .with_tier(class.tier)
                            .with_outcome(Outcome::Pass),
                    )?;
                    let mut out = serde_json::to_value(class)?;
                    if let Some(size) = size {
                        out["size"] = serde_json::json!(size);
                    }
                    out["operation"] = serde_json::json!(operation);
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                Err(err) => {
                    entry.level = LogLevel::Warn;
                    emitter.emit_entry(entry.with_error(&err))?;
                    return Err(err.into());
                }
            }
        }
        Command::Verify { scheme, report } => {
            let source = scheme.source();
            let bucket_scheme = build_scheme(emitter, name, &source)?;
            let summary = verify_scheme(&bucket_scheme);

            for result in &summary.results {
                let mut entry = emitter
                    .entry(LogLevel::Info, "check")
                    .with_command(name)
                    .with_operation(result.check.as_str())
                    .with_details(serde_json::json!({ "cases": result.cases }));
                entry = match &result.failure {
                    None => entry.with_outcome(Outcome::Pass),
                    Some(failure) => {
                        entry.level = LogLevel::Error;
                        entry.with_outcome(Outcome::Fail).with_error(failure)
                    }
                };
                emitter.emit_entry(entry)?;
            }

            let title = format!("segbin verification: {}", source.label());
            if let Some(path) = &report {
                std::fs::write(path, summary.to_markdown(&title))?;
            }

            eprintln!(
                "{title}: {} checks, {} passed, {} failed",
                summary.total, summary.passed, summary.failed
            );
            for failed in summary.results.iter().filter(|r| !r.passed) {
                eprintln!(
                    "  FAIL {}: {}",
                    failed.check,
                    failed.failure.as_deref().unwrap_or("")
                );
            }
            if !summary.all_passed() {
                return Err(format!("{} verification checks failed", summary.failed).into());
            }
        }
        Command::ValidateLog { input } => {
            let (lines, errors) = validate_log_file(&input)?;
            for error in &errors {
                eprintln!("{error}");
            }
            eprintln!(
                "{}: {lines} lines, {} errors",
                input.display(),
                errors.len()
            );
            if !errors.is_empty() {
                return Err(format!("{} log validation errors", errors.len()).into());
            }
        }
    }
    Ok(())
}
