mod input;
mod model;
mod pipeline;
mod report;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::input::load_records;
use crate::model::record::DEFAULT_SUMMARY_COLUMNS;
use crate::pipeline::RunError;
use crate::pipeline::stage1_filter::run_stage1;
use crate::pipeline::stage2_classify::run_stage2;
use crate::pipeline::stage3_summary::run_stage3;
use crate::pipeline::stage4_report::{ChartOutcome, Stage4Input, Stage4Output, run_stage4};
use crate::report::OutputNamer;

/// Categorises per-cell microscopy measurement CSVs into Excel reports with
/// summary statistics.
#[derive(Debug, Parser)]
#[command(name = "cytoreport", version, about)]
struct Cli {
    /// Input file(s) from microscopy analysis
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Remove rows where Children_Nuclei_Count is 0
    #[arg(short = 'r', long)]
    remove_zero_nuclei: bool,

    /// Columns to summarise
    #[arg(
        short = 'c',
        long = "columns",
        num_args = 1..,
        default_values_t = DEFAULT_SUMMARY_COLUMNS.map(String::from)
    )]
    columns: Vec<String>,

    /// Number of nuclei in the largest histogram bin
    #[arg(long = "histogram", default_value_t = 5, value_parser = clap::value_parser!(u32).range(2..))]
    histogram: u32,

    /// Directory the output workbooks are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if run(&cli) > 0 {
        std::process::exit(1);
    }
}

/// Processes every input, isolating per-input failures. Returns the number
/// of failed inputs.
fn run(cli: &Cli) -> usize {
    if let Err(err) = std::fs::create_dir_all(&cli.out_dir) {
        error!("cannot create output directory '{}': {err}", cli.out_dir.display());
        return cli.input.len();
    }

    let mut namer = OutputNamer::new();
    let mut failed = 0usize;

    for input_path in &cli.input {
        match process_input(input_path, cli, &mut namer) {
            Ok(output) => {
                info!(
                    "finished '{}' -> '{}'",
                    input_path.display(),
                    output.outfile.display()
                );
                if output.chart == ChartOutcome::Failed {
                    failed += 1;
                }
            }
            Err(err) => {
                error!("failed to process '{}': {err}", input_path.display());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        error!("{failed} of {} input(s) failed", cli.input.len());
    }
    failed
}

fn process_input(
    path: &Path,
    cli: &Cli,
    namer: &mut OutputNamer,
) -> Result<Stage4Output, RunError> {
    let records = load_records(path, &cli.columns)?;
    info!("loaded {} rows from '{}'", records.len(), path.display());
    if records.is_empty() {
        warn!("'{}' has no usable rows; the report will be empty", path.display());
    }

    let stage1 = run_stage1(records, cli.remove_zero_nuclei);
    if stage1.removed > 0 {
        info!("removed {} rows where Children_Nuclei_Count was 0", stage1.removed);
    }
    let partitions = run_stage2(stage1.records);
    let stats = run_stage3(&partitions, cli.histogram);

    let outfile = namer.allocate(path, &cli.out_dir);
    let output = run_stage4(&Stage4Input {
        partitions: &partitions,
        stats: &stats,
        max_bin: cli.histogram,
        outfile: &outfile,
    })?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["cytoreport", "input.csv"]).unwrap();
        assert_eq!(cli.input, vec![PathBuf::from("input.csv")]);
        assert!(!cli.remove_zero_nuclei);
        assert_eq!(
            cli.columns,
            vec!["AreaShape_Area".to_string(), "Children_Nuclei_Count".to_string()]
        );
        assert_eq!(cli.histogram, 5);
        assert_eq!(cli.out_dir, PathBuf::from("."));
    }

    #[test]
    fn test_cli_requires_an_input() {
        assert!(Cli::try_parse_from(["cytoreport"]).is_err());
    }

    #[test]
    fn test_cli_custom_columns_and_bin() {
        let cli = Cli::try_parse_from([
            "cytoreport",
            "-r",
            "-c",
            "AreaShape_Area",
            "Intensity_MeanIntensity",
            "--histogram",
            "8",
            "a.csv",
            "b.csv",
        ])
        .unwrap();
        assert!(cli.remove_zero_nuclei);
        assert_eq!(cli.columns.len(), 2);
        assert_eq!(cli.columns[1], "Intensity_MeanIntensity");
        assert_eq!(cli.histogram, 8);
        assert_eq!(cli.input.len(), 2);
    }

    #[test]
    fn test_cli_rejects_degenerate_histogram_bin() {
        assert!(Cli::try_parse_from(["cytoreport", "--histogram", "1", "a.csv"]).is_err());
    }

    #[test]
    fn test_end_to_end_single_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wells.csv");
        std::fs::write(
            &input,
            "ObjectNumber,Classify_Mononucleated,Classify_Infected,AreaShape_Area,Children_Nuclei_Count\n\
             1,1,1,100.0,2\n\
             2,0,1,90.0,3\n\
             3,1,0,80.0,0\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "cytoreport",
            "--out-dir",
            dir.path().to_str().unwrap(),
            input.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(run(&cli), 0);
        assert!(dir.path().join("output_wells.xlsx").exists());

        // A second run must not overwrite the first artifact.
        assert_eq!(run(&cli), 0);
        assert!(dir.path().join("output_wells_1.xlsx").exists());
    }

    #[test]
    fn test_missing_input_is_isolated_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.csv");
        std::fs::write(
            &good,
            "ObjectNumber,Classify_Mononucleated,Classify_Infected,AreaShape_Area,Children_Nuclei_Count\n\
             1,1,1,100.0,2\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "cytoreport",
            "--out-dir",
            dir.path().to_str().unwrap(),
            dir.path().join("absent.csv").to_str().unwrap(),
            good.to_str().unwrap(),
        ])
        .unwrap();

        // The absent input fails; the good one is still processed.
        assert_eq!(run(&cli), 1);
        assert!(dir.path().join("output_good.xlsx").exists());
    }
}
