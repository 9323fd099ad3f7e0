use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::{
    InjectionSummary,
    error::InjectionError,
    header::read_header,
    index::{indexed_record_count, remove_stale_index, write_tabix_index},
    injector::{Injector, MissingnessModel},
    output::{OutputCompression, VcfSink},
    record::Reader,
    report::RunReport,
    smart_reader::open_input,
};

/// Configuration required to drive a file-to-file run.
#[derive(Debug, Clone)]
pub struct InjectionConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub seed: u64,
    pub model: MissingnessModel,
    /// Build a tabix index next to BGZF output.
    pub write_index: bool,
    /// Write a JSON run report next to the output.
    pub write_report: bool,
    pub show_progress: bool,
}

impl InjectionConfig {
    pub fn new(input: PathBuf, output: PathBuf) -> Self {
        Self {
            input,
            output,
            seed: 42,
            model: MissingnessModel::default(),
            write_index: true,
            write_report: false,
            show_progress: false,
        }
    }
}

/// Files produced by [`inject_missing_file`].
#[derive(Debug, Clone)]
pub struct InjectionRun {
    pub summary: InjectionSummary,
    pub output: PathBuf,
    pub index: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

/// Streams a VCF from `reader` to `writer`, blanking genotype calls.
pub fn inject_missing<R, W>(
    reader: R,
    writer: &mut W,
    seed: u64,
    model: MissingnessModel,
) -> Result<InjectionSummary, InjectionError>
where
    R: BufRead,
    W: Write,
{
    inject_missing_with_progress(reader, writer, seed, model, &ProgressBar::hidden())
}

pub fn inject_missing_with_progress<R, W>(
    mut reader: R,
    writer: &mut W,
    seed: u64,
    model: MissingnessModel,
    progress: &ProgressBar,
) -> Result<InjectionSummary, InjectionError>
where
    R: BufRead,
    W: Write,
{
    let header = read_header(&mut reader)?;
    let mut injector = Injector::new(model, header.num_samples(), seed)?;
    tracing::info!(
        samples = header.num_samples(),
        missing_prone = injector.missing_prone().len(),
        "sample header parsed",
    );

    let mut summary = InjectionSummary::new(header.sample_names(), injector.missing_prone());
    header.write_to(writer)?;

    for result in Reader::new(reader, header.num_samples(), header.line_count()) {
        let mut record = result?;
        let outcome = injector.process(&mut record);
        summary.add(outcome, injector.missing_prone().len());
        record.write_to(writer)?;
        progress.inc(1);
    }

    writer.flush()?;
    Ok(summary)
}

/// Reads `config.input`, writes `config.output` and any companion files.
///
/// The output file appears only when every record was processed.
pub fn inject_missing_file(config: &InjectionConfig) -> Result<InjectionRun> {
    tracing::info!(
        input = %config.input.display(),
        output = %config.output.display(),
        seed = config.seed,
        "starting missingness injection",
    );

    let reader = open_input(&config.input)?;
    let mut sink = VcfSink::create(&config.output)?;
    let compression = sink.compression();
    let progress = progress_bar(config);

    let summary =
        inject_missing_with_progress(reader, &mut sink, config.seed, config.model, &progress);
    progress.finish_and_clear();
    let summary = summary.with_context(|| format!("failed to process {}", config.input.display()))?;

    if remove_stale_index(&config.output)
        .with_context(|| format!("failed to remove old index for {}", config.output.display()))?
    {
        tracing::debug!(output = %config.output.display(), "removed stale tabix index");
    }
    let output = sink.commit()?;

    let index = if config.write_index && compression == OutputCompression::Bgzf {
        match write_tabix_index(&output) {
            Ok(path) => {
                tracing::info!(index = %path.display(), "wrote tabix index");
                Some(path)
            }
            Err(e) => {
                tracing::warn!("skipping index for {}: {e:#}", output.display());
                if let Err(e) = remove_stale_index(&output) {
                    tracing::warn!("could not remove partial index: {e}");
                }
                None
            }
        }
    } else {
        None
    };

    let report = if config.write_report {
        let path = RunReport::new(config, compression, &summary)
            .write(&output)
            .context("failed to write run report")?;
        Some(path)
    } else {
        None
    };

    tracing::info!(
        records = summary.total_records,
        eligible = summary.eligible_records,
        blanked = summary.blanked_genotypes,
        "missingness injection finished",
    );

    Ok(InjectionRun {
        summary,
        output,
        index,
        report,
    })
}

fn progress_bar(config: &InjectionConfig) -> ProgressBar {
    if !config.show_progress {
        return ProgressBar::hidden();
    }

    let (bar, template) = match indexed_record_count(&config.input) {
        Some(total) => (
            ProgressBar::new(total),
            "[{bar:40.cyan/blue}] {human_pos}/{human_len} variants ({eta})",
        ),
        None => (
            ProgressBar::new_spinner(),
            "{spinner} {human_pos} variants [{elapsed_precise}]",
        ),
    };
    bar.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vcf(num_samples: usize, records: usize) -> String {
        let mut text = String::from("##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT");
        for s in 0..num_samples {
            text.push_str(&format!("\tS{s}"));
        }
        text.push('\n');
        for r in 0..records {
            text.push_str(&format!("1\t{}\t.\tA\tG\t.\tPASS\t.\tGT", r + 1));
            for _ in 0..num_samples {
                text.push_str("\t0/1");
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn summary_counts_records() {
        let input = vcf(10, 100);
        let mut out = Vec::new();
        let summary =
            inject_missing(input.as_bytes(), &mut out, 42, MissingnessModel::default()).unwrap();
        assert_eq!(summary.num_samples, 10);
        assert_eq!(summary.total_records, 100);
        assert_eq!(summary.missing_prone_samples.len(), 2);
        assert_eq!(summary.evaluated_genotypes, summary.eligible_records * 2);
        assert!(summary.blanked_genotypes <= summary.evaluated_genotypes);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), input.lines().count());
        assert_eq!(text.matches("./.").count(), summary.blanked_genotypes);
    }

    #[test]
    fn header_only_input_is_valid() {
        let input = vcf(5, 0);
        let mut out = Vec::new();
        let summary =
            inject_missing(input.as_bytes(), &mut out, 1, MissingnessModel::default()).unwrap();
        assert_eq!(summary.total_records, 0);
        assert_eq!(out, input.as_bytes());
    }

    #[test]
    fn invalid_model_writes_nothing() {
        let input = vcf(5, 3);
        let model = MissingnessModel {
            record_probability: 2.0,
            ..Default::default()
        };
        let mut out = Vec::new();
        let err = inject_missing(input.as_bytes(), &mut out, 1, model).unwrap_err();
        assert!(matches!(err, InjectionError::InvalidModel(_)));
        assert!(out.is_empty());
    }
}
