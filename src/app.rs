use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::benchmarks::{Domain, select_benchmarks};
use crate::collector::UnifiedCollector;
use crate::config::{CollectorConfig, FailurePolicy};
use crate::constants::output::{DEFAULT_OUTPUT_PATH, DEFAULT_SPLIT};
use crate::metrics::RunSummary;
use crate::output::write_collection;
use crate::source::BenchmarkSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DomainArg {
    #[value(name = "mmlu_pro")]
    MmluPro,
    #[value(name = "math")]
    Math,
    #[value(name = "gpqa")]
    Gpqa,
    #[value(name = "ifeval")]
    Ifeval,
    #[value(name = "mbpp_plus")]
    MbppPlus,
}

impl From<DomainArg> for Domain {
    fn from(value: DomainArg) -> Self {
        match value {
            DomainArg::MmluPro => Domain::MmluPro,
            DomainArg::Math => Domain::Math,
            DomainArg::Gpqa => Domain::Gpqa,
            DomainArg::Ifeval => Domain::Ifeval,
            DomainArg::MbppPlus => Domain::MbppPlus,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "ppe_corr",
    disable_help_subcommand = true,
    about = "Build the PPE correctness chosen/rejected dataset",
    long_about = "Download the five PPE Best-of-K correctness benchmarks, group responses per question into correct (chosen) and incorrect (rejected) lists, and write one JSON array.",
    after_help = "Benchmarks are processed in a fixed order: mmlu_pro, math, gpqa, ifeval, mbpp_plus. Set RUST_LOG to adjust log verbosity."
)]
/// CLI for `ppe_corr`.
///
/// Common usage:
/// - Default run: writes `PPE_Corr.json` from the `train` split
/// - Keep going past a broken benchmark: `--skip-failed`
/// - Offline run from local shards: `--snapshot-dir /data/ppe` (reads `/data/ppe/<domain>/...`)
struct BuildDatasetCli {
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_OUTPUT_PATH,
        help = "Output JSON path"
    )]
    output: PathBuf,
    #[arg(
        long,
        value_name = "NAME",
        default_value = DEFAULT_SPLIT,
        help = "Dataset split read from every benchmark"
    )]
    split: String,
    #[arg(
        long = "skip-failed",
        help = "Omit a failing benchmark from the output instead of aborting the run"
    )]
    skip_failed: bool,
    #[arg(
        long = "expected-questions",
        value_name = "N",
        value_parser = parse_positive_usize,
        help = "Fail a benchmark whose question count differs from N"
    )]
    expected_questions: Option<usize>,
    #[arg(
        long = "snapshot-dir",
        value_name = "DIR",
        help = "Read shards from DIR/<domain> when present instead of downloading"
    )]
    snapshot_dir: Option<PathBuf>,
    #[arg(
        long = "domain",
        value_enum,
        value_name = "DOMAIN",
        help = "Restrict the run to a domain, repeat as needed"
    )]
    domains: Vec<DomainArg>,
    #[arg(long = "no-progress", help = "Hide download progress bars")]
    no_progress: bool,
}

/// Source construction options resolved from the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceOptions {
    /// Local snapshot root, if any.
    pub snapshot_root: Option<PathBuf>,
    /// Whether download progress bars are shown.
    pub progress: bool,
}

/// Parse arguments, collect all selected benchmarks, write the artifact, and print a summary.
///
/// `args_iter` excludes the program name. Returns `Ok(())` after printing help.
pub fn run_build_dataset<S, Build, I>(args_iter: I, build_source: Build) -> Result<(), Box<dyn Error>>
where
    S: BenchmarkSource,
    Build: FnOnce(&SourceOptions) -> S,
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let Some(cli) =
        parse_cli::<BuildDatasetCli, _>(std::iter::once("ppe_corr".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let options = SourceOptions {
        snapshot_root: cli.snapshot_dir.clone(),
        progress: !cli.no_progress,
    };
    let config = CollectorConfig {
        split: cli.split.clone(),
        failure_policy: if cli.skip_failed {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        },
        expected_questions: cli.expected_questions,
    };
    let domains: Vec<Domain> = cli.domains.iter().copied().map(Into::into).collect();
    let benchmarks = select_benchmarks(&domains);

    let collector = UnifiedCollector::new(build_source(&options), config);
    let collection = collector.collect(&benchmarks)?;

    write_collection(&cli.output, &collection.records)?;

    println!();
    print!("{}", RunSummary::from_collection(&collection));
    println!("Saved to {}", cli.output.display());
    Ok(())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw.parse::<usize>().map_err(|_| {
        format!(
            "Could not parse --expected-questions value '{}' as a positive integer",
            raw
        )
    })?;
    if parsed == 0 {
        return Err("--expected-questions must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<BuildDatasetCli>, Box<dyn Error>> {
        parse_cli::<BuildDatasetCli, _>(
            std::iter::once("ppe_corr").chain(args.iter().copied()),
        )
    }

    #[test]
    fn defaults_match_published_artifact() {
        let cli = parse(&[]).unwrap().unwrap();
        assert_eq!(cli.output, PathBuf::from("PPE_Corr.json"));
        assert_eq!(cli.split, "train");
        assert!(!cli.skip_failed);
        assert!(cli.expected_questions.is_none());
        assert!(cli.domains.is_empty());
    }

    #[test]
    fn domain_filter_uses_snake_case_tags() {
        let cli = parse(&["--domain", "mbpp_plus", "--domain", "math"]).unwrap().unwrap();
        let domains: Vec<Domain> = cli.domains.into_iter().map(Into::into).collect();
        assert_eq!(domains, vec![Domain::MbppPlus, Domain::Math]);
        assert!(parse(&["--domain", "mbpp-plus"]).is_err());
    }

    #[test]
    fn expected_questions_must_be_positive() {
        assert!(parse(&["--expected-questions", "0"]).is_err());
        assert!(parse(&["--expected-questions", "abc"]).is_err());
        let cli = parse(&["--expected-questions", "512"]).unwrap().unwrap();
        assert_eq!(cli.expected_questions, Some(512));
    }

    #[test]
    fn help_is_not_an_error() {
        assert!(parse(&["--help"]).unwrap().is_none());
    }
}
