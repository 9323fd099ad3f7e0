use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{InjectionConfig, InjectionRun, MissingnessModel, inject_missing_file};

#[derive(Debug, Parser)]
#[command(author, version, about = "Introduce random missing genotypes in a VCF file", long_about = None)]
struct Cli {
    /// Input VCF (.vcf, .vcf.gz; nested gzip/zip is detected)
    #[arg(short, long, value_name = "INPUT")]
    input: PathBuf,

    /// Output VCF; a .gz or .bgz extension writes BGZF
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Random seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Fraction of samples that can receive missing calls
    #[arg(long, default_value_t = 0.2)]
    sample_fraction: f64,

    /// Probability that a variant record is affected
    #[arg(long, default_value_t = 0.3)]
    record_probability: f64,

    /// Do not build a tabix index for compressed output
    #[arg(long)]
    no_index: bool,

    /// Write a JSON run report next to the output
    #[arg(long)]
    report: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Logging verbosity (e.g. error, warn, info, debug)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn config(&self) -> InjectionConfig {
        InjectionConfig {
            input: self.input.clone(),
            output: self.output.clone(),
            seed: self.seed,
            model: MissingnessModel {
                sample_fraction: self.sample_fraction,
                record_probability: self.record_probability,
                ..MissingnessModel::default()
            },
            write_index: !self.no_index,
            write_report: self.report,
            show_progress: !self.quiet,
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let run = inject_missing_file(&cli.config())?;
    print_summary(&run);

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn print_summary(run: &InjectionRun) {
    for line in summary_lines(run) {
        println!("{line}");
    }
}

/// Lines printed to stdout after a successful run.
fn summary_lines(run: &InjectionRun) -> Vec<String> {
    let summary = &run.summary;
    let mut lines = vec![
        format!(
            "Processed {total} records; {eligible} affected, {blanked} of {evaluated} genotypes set missing across {prone} samples.",
            total = summary.total_records,
            eligible = summary.eligible_records,
            blanked = summary.blanked_genotypes,
            evaluated = summary.evaluated_genotypes,
            prone = summary.missing_prone_samples.len(),
        ),
        format!("Modified VCF written to {}", run.output.display()),
    ];
    if let Some(index) = &run.index {
        lines.push(format!("Index written to {}", index.display()));
    }
    if let Some(report) = &run.report {
        lines.push(format!("Report written to {}", report.display()));
    }
    lines
}
