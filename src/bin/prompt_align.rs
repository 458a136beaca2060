use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use prompt_align::{
    build_report, read_records, write_records, AlignerConfig, BatchDriver,
    DirectoryReferenceStore, Meta, PromptAlignerBuilder,
};

#[path = "prompt_align/report_writers.rs"]
mod report_writers;

#[derive(Debug, Parser)]
#[command(name = "prompt_align")]
#[command(about = "Replace noisy transcribed prompts with the matching span of their reference transcript")]
struct Args {
    /// Prompt records, one `id|text` per line.
    #[arg(long, env = "PROMPT_ALIGN_PROMPTS")]
    prompts: PathBuf,
    /// Root of `<category>/<article_id>/transcript.txt` reference documents.
    #[arg(long, env = "PROMPT_ALIGN_REFERENCES", default_value = "references")]
    references_dir: PathBuf,
    /// Corrected records; defaults to `<prompts>_aligned.txt`.
    #[arg(long, env = "PROMPT_ALIGN_OUT")]
    out: Option<PathBuf>,
    /// Decision log; defaults to `<prompts>_decisions.txt`.
    #[arg(long, env = "PROMPT_ALIGN_LOG")]
    log: Option<PathBuf>,
    #[arg(long, env = "PROMPT_ALIGN_REPORT")]
    report: Option<PathBuf>,
    /// JSON aligner configuration.
    #[arg(long, env = "PROMPT_ALIGN_CONFIG")]
    config: Option<PathBuf>,
    /// Start from the no-skip, diacritic-folding preset instead of the defaults.
    #[arg(long, env = "PROMPT_ALIGN_LEGACY", default_value_t = false)]
    legacy: bool,
    #[arg(long, env = "PROMPT_ALIGN_ACCEPT_THRESHOLD")]
    accept_threshold: Option<f64>,
    #[arg(long, env = "PROMPT_ALIGN_MAX_SKIP")]
    max_skip: Option<usize>,
    #[arg(long, env = "PROMPT_ALIGN_DYNAMIC_THRESHOLD", default_value_t = false)]
    dynamic_threshold: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    require_path_exists(&args.prompts, "Missing prompt records file.")?;
    require_path_exists(&args.references_dir, "Missing reference directory.")?;

    let config = load_config(&args)?;
    let aligner = PromptAlignerBuilder::new(config)
        .build()
        .map_err(|err| format!("Failed to build PromptAligner: {err}"))?;
    let references = DirectoryReferenceStore::load(&args.references_dir, aligner.lexicon())
        .map_err(|err| format!("Failed to load reference documents: {err}"))?;
    if references.is_empty() {
        tracing::warn!(
            root = %args.references_dir.display(),
            "no reference transcripts found; every record will be NO_REFERENCE"
        );
    }

    let records = read_records(&args.prompts).map_err(|err| format!("{err}"))?;
    if records.is_empty() {
        return Err(format!(
            "No prompt records in '{}'.",
            args.prompts.display()
        ));
    }
    let record_count = records.len();

    let progress = ProgressBar::new(record_count as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message("starting...");

    let started = Instant::now();
    let output = BatchDriver::new(&aligner, &references).run_with_progress(records, |decision| {
        progress.set_message(decision.id.clone());
        progress.inc(1);
    });
    progress.finish_with_message("alignment pass complete");

    let summary = output.summary();
    println!(
        "records: {} accepted: {} corrected: {} mean_score: {:.3} elapsed: {:.2}s",
        summary.total,
        summary.accepted,
        summary.corrected,
        summary.mean_score,
        started.elapsed().as_secs_f64()
    );

    let generated_at = Utc::now().to_rfc3339();
    let out_path = args
        .out
        .clone()
        .unwrap_or_else(|| sibling_path(&args.prompts, "aligned"));
    write_records(&out_path, &output.records).map_err(|err| format!("{err}"))?;
    println!("{}", out_path.display());

    let log_path = args
        .log
        .clone()
        .unwrap_or_else(|| sibling_path(&args.prompts, "decisions"));
    report_writers::write_decision_log(&log_path, &output, &generated_at)?;
    println!("{}", log_path.display());

    let report_path = resolve_report_path(args.report.as_ref());
    let report = build_report(
        Meta {
            generated_at,
            prompts_path: args.prompts.to_string_lossy().into_owned(),
            references_path: args.references_dir.to_string_lossy().into_owned(),
            config_path: args
                .config
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            record_count,
        },
        output.decisions,
    );
    report_writers::write_json_report(&report_path, &report)?;
    println!("{}", report_path.display());
    Ok(())
}

fn load_config(args: &Args) -> Result<AlignerConfig, String> {
    let mut config = match (&args.config, args.legacy) {
        (Some(path), _) => {
            require_path_exists(path, "Missing aligner config file.")?;
            AlignerConfig::load(path).map_err(|err| format!("{err}"))?
        }
        (None, true) => AlignerConfig::legacy(),
        (None, false) => AlignerConfig::default(),
    };
    if let Some(threshold) = args.accept_threshold {
        config.accept_threshold = threshold;
    }
    if let Some(max_skip) = args.max_skip {
        config.assembly.max_skip = max_skip;
    }
    if args.dynamic_threshold {
        config.dynamic_threshold = true;
    }
    Ok(config)
}

/// `dir/prompts.txt` -> `dir/prompts_<suffix>.txt`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "prompts".to_string());
    path.with_file_name(format!("{stem}_{suffix}.txt"))
}

fn resolve_report_path(report: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = report {
        return path.clone();
    }

    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ");
    PathBuf::from("target")
        .join("prompt_align_reports")
        .join(format!("prompt-align-report-{run_id}.json"))
}

fn require_path_exists(path: &Path, message: &str) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    Err(format!("{message} Missing path: {}", path.display()))
}
