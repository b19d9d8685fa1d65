//! Command-line entry point for the benchmark harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use openwebui_bench::error::HarnessError;
use openwebui_bench::harness::{self, RunConfig};
use openwebui_bench::model::{ModelConfig, OpenWebUiModel};
use openwebui_bench::plot::{self, render_ascii, score_bars, time_bars};
use openwebui_bench::report;
use openwebui_bench::suite;
use openwebui_bench::BenchmarkKind;

#[derive(Parser, Debug)]
#[command(name = "openwebui-bench")]
#[command(about = "Benchmark LLMs served over an OpenAI-compatible chat endpoint")]
#[command(version)]
struct Cli {
    /// Chat-completions endpoint URL
    #[arg(
        long,
        global = true,
        default_value = "http://localhost:3000/api/chat/completions"
    )]
    api_url: String,

    /// Results CSV accumulating one row per benchmark run
    #[arg(long, global = true, default_value = "full_benchmark_results.csv")]
    csv: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run benchmarks and append results to the CSV
    Run {
        /// Benchmark suite to run
        #[arg(long, value_enum, default_value_t = BenchmarkKind::All)]
        benchmark: BenchmarkKind,

        /// Primary model(s); each gets a full pass over the selected suites
        #[arg(long, num_args = 1.., default_values_t = [String::from("llama3.2:latest")])]
        model: Vec<String>,

        /// Model distilling the final answer from the reasoning trace
        #[arg(long, default_value = "llama3.2:latest")]
        extraction_model: String,

        /// Problems evaluated per task
        #[arg(long, default_value_t = 10)]
        subset_size: usize,

        /// Few-shot demonstrations per prompt
        #[arg(long, default_value_t = 3)]
        n_shots: usize,

        /// Append a chain-of-thought cue to each prompt
        #[arg(long)]
        cot: bool,

        /// Seed for deterministic problem selection
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Root directory holding per-benchmark task data
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },

    /// Render bar charts from the accumulated CSV
    Plot {
        /// Restrict charts to one benchmark
        #[arg(long, value_enum)]
        benchmark: Option<BenchmarkKind>,

        /// Directory to write SVG charts into (terminal-only otherwise)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List discovered task files per benchmark
    Tasks {
        /// Root directory holding per-benchmark task data
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<(), HarnessError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            benchmark,
            model,
            extraction_model,
            subset_size,
            n_shots,
            cot,
            seed,
            data_dir,
        } => {
            let (kinds, skip_missing) = match benchmark {
                BenchmarkKind::All => (BenchmarkKind::SUITES.to_vec(), true),
                kind => (vec![kind], false),
            };
            let cfg = RunConfig {
                subset_size,
                n_shots,
                enable_cot: cot,
                seed,
            };

            for model_name in &model {
                let adapter = OpenWebUiModel::new(ModelConfig {
                    api_url: cli.api_url.clone(),
                    model: model_name.clone(),
                    extraction_model: extraction_model.clone(),
                    ..ModelConfig::default()
                })?;

                let records =
                    harness::run_benchmarks(&adapter, &kinds, &data_dir, &cfg, &cli.csv, skip_missing)?;
                if records.is_empty() {
                    warn!(model = %model_name, "no benchmarks produced results");
                } else {
                    info!(
                        model = %model_name,
                        benchmarks = records.len(),
                        csv = %cli.csv.display(),
                        "run complete"
                    );
                }
            }
        }

        Commands::Plot { benchmark, out } => {
            let records = report::read_records(&cli.csv)?;
            let filter = benchmark.filter(|k| *k != BenchmarkKind::All);

            for (name, rows) in plot::group_by_benchmark(&records) {
                if let Some(kind) = filter {
                    if kind.display_name() != name {
                        continue;
                    }
                }
                println!(
                    "{}",
                    render_ascii(&format!("Overall Score - {name}"), &score_bars(&rows))
                );
                println!(
                    "{}",
                    render_ascii(
                        &format!("Evaluation Time (min) - {name}"),
                        &time_bars(&rows)
                    )
                );
            }

            if let Some(out_dir) = out {
                let written = plot::write_charts(&records, &out_dir, filter)?;
                for path in &written {
                    info!(path = %path.display(), "chart written");
                }
            }
        }

        Commands::Tasks { data_dir } => {
            for kind in BenchmarkKind::SUITES {
                let bench = suite::Benchmark::load(&data_dir, kind)?;
                if bench.is_empty() {
                    continue;
                }
                println!("{}:", kind.display_name());
                for set in &bench.task_sets {
                    println!("  {} ({} problems)", set.name, set.tasks.len());
                }
            }
        }
    }

    Ok(())
}
