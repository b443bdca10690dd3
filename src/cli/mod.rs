//! Command-line interface: run the selection pipeline or inspect a CSV.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::pipeline::{FamilyReport, Pipeline, PipelineConfig, PipelineOutcome};
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tissue-classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tune, evaluate and compare malignant/benign tissue classifiers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run preprocessing, search, evaluation and comparison
    Run {
        /// Input CSV with id, diagnosis and feature columns
        #[arg(short, long)]
        data: PathBuf,

        /// Pipeline configuration (JSON); flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random-search trials per family
        #[arg(long)]
        trials: Option<usize>,

        /// Cross-validation folds
        #[arg(long)]
        folds: Option<usize>,

        /// Seed for search and forest construction
        #[arg(long)]
        seed: Option<u64>,

        /// Fraction of rows held out for evaluation
        #[arg(long)]
        test_fraction: Option<f64>,

        /// Write the full outcome as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Show data information
    Info {
        /// Input CSV
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Flag values layered over a file or default configuration
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub trials: Option<usize>,
    pub folds: Option<usize>,
    pub seed: Option<u64>,
    pub test_fraction: Option<f64>,
}

/// Load the configuration file (if any) and apply flag overrides
pub fn resolve_config(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<PipelineConfig> {
    let mut config = match path {
        Some(p) => PipelineConfig::from_json_file(p)?,
        None => PipelineConfig::default(),
    };
    if let Some(n) = overrides.trials {
        config.search.n_trials = n;
    }
    if let Some(k) = overrides.folds {
        config.search.folds = k;
    }
    if let Some(seed) = overrides.seed {
        config.search.seed = seed;
    }
    if let Some(f) = overrides.test_fraction {
        config.preprocessing.test_fraction = f;
    }
    Ok(config)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(
    data_path: &Path,
    config_path: Option<&Path>,
    overrides: &Overrides,
    json_out: Option<&Path>,
) -> anyhow::Result<()> {
    section("Run");

    let config = resolve_config(config_path, overrides)?;

    step_run("Loading data");
    let start = Instant::now();
    let df = DataLoader::new().load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    step_run(&format!(
        "Tuning {} families ({} trials, {} folds)",
        config.families.len(),
        config.search.n_trials,
        config.search.folds
    ));
    let outcome = Pipeline::new(config).run(&df)?;
    step_done(&format!("{:.2}s", outcome.duration_secs));

    print_outcome(&outcome);

    if let Some(path) = json_out {
        std::fs::write(path, serde_json::to_string_pretty(&outcome)?)?;
        println!("  {} {}", ok("✓"), format!("Wrote {}", path.display()));
        println!();
    }

    Ok(())
}

fn print_outcome(outcome: &PipelineOutcome) {
    section("Data");
    println!("  {:<16} {}", muted("Train rows"), outcome.n_train);
    println!("  {:<16} {}", muted("Test rows"), outcome.n_test);
    println!("  {:<16} {}", muted("Features"), outcome.feature_names.len());
    if !outcome.dropped_columns.is_empty() {
        println!("  {:<16} {}", muted("Dropped"), outcome.dropped_columns.join(", "));
    }

    section("Held-out evaluation");
    println!(
        "  {:<22} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        muted("Family"),
        muted("CV"),
        muted("Acc"),
        muted("Prec"),
        muted("Recall"),
        muted("F1"),
        muted("AUC")
    );
    println!("  {}", dim(&"─".repeat(76)));
    for report in &outcome.reports {
        let e = &report.evaluation;
        println!(
            "  {:<22} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4}",
            report.family, report.cv_score, e.accuracy, e.precision, e.recall, e.f1, e.auc
        );
    }
    for failure in &outcome.failures {
        println!("  {:<22} {}", failure.family, format!("err: {}", failure.error).red());
    }

    for report in &outcome.reports {
        print_family_detail(report);
    }

    section("Trial-score comparison");
    match (&outcome.comparison, &outcome.comparison_error) {
        (Some(ranked), _) => {
            println!("  {:<22} {:>8} {:>18} {:>8}", muted("Family"), muted("Mean"), muted("95% CI"), muted("Trials"));
            println!("  {}", dim(&"─".repeat(60)));
            for s in ranked {
                println!(
                    "  {:<22} {:>8.4} {:>18} {:>8}",
                    s.family,
                    s.mean,
                    format!("[{:.4}, {:.4}]", s.lower(), s.upper()),
                    s.n_trials
                );
            }
        }
        (None, Some(err)) => println!("  {}", err.yellow()),
        (None, None) => println!("  {}", dim("no trial scores to compare")),
    }
    println!();
}

fn print_family_detail(report: &FamilyReport) {
    section(&report.family);
    let params = report
        .best_params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ");
    println!("  {:<16} {}", muted("Params"), params);
    for (i, dimension) in report.search_space.dimensions.iter().enumerate() {
        let label = if i == 0 { "Space" } else { "" };
        println!("  {:<16} {} {}", muted(label), dimension.name, dim(&dimension.candidates));
    }
    println!("  {:<16} {}", muted("Scaled"), report.scaled);
    if let Some(selection) = &report.threshold {
        println!(
            "  {:<16} {:.2} {}",
            muted("Threshold"),
            selection.threshold,
            dim(&format!("(cv {:.4} vs {:.4} at 0.5)", selection.accuracy, selection.baseline_accuracy))
        );
    }
    if report.n_failed_trials > 0 {
        println!("  {:<16} {}", muted("Failed trials"), report.n_failed_trials.to_string().yellow());
    }
    let c = &report.evaluation.confusion;
    println!("  {:<16} tn={} fp={} fn={} tp={}", muted("Confusion"), c.tn, c.fp, c.fn_, c.tp);
    if let Some(importances) = &report.feature_importances {
        let top = importances
            .iter()
            .take(5)
            .map(|f| format!("{} {:.3}", f.feature, f.importance))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {:<16} {}", muted("Top features"), top);
    }
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let loader = DataLoader::new();
    let info = loader.get_file_info(data_path)?;
    let df = loader.load_csv(data_path)?;

    println!("  {:<12} {}", muted("File"), info.path);
    println!("  {:<12} {:.1} KB", muted("Size"), info.file_size as f64 / 1024.0);
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!("  {:<24} {:<12} {:>6} {:>8}", muted("Column"), muted("Type"), muted("Nulls"), muted("Unique"));
    println!("  {}", dim(&"─".repeat(54)));

    for col in df.get_columns() {
        println!(
            "  {:<24} {:<12} {:>6} {:>8}",
            col.name().as_str(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            col.n_unique().unwrap_or(0)
        );
    }

    println!();
    Ok(())
}
