use std::process::ExitCode;

use ppe_corr::app::run_build_dataset;
use ppe_corr::{HuggingFaceSource, HuggingFaceSourceConfig};

fn main() -> ExitCode {
    let result = run_build_dataset(std::env::args().skip(1), |options| {
        HuggingFaceSource::new(HuggingFaceSourceConfig {
            snapshot_root: options.snapshot_root.clone(),
            progress: options.progress,
            ..HuggingFaceSourceConfig::default()
        })
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ppe_corr: {err}");
            ExitCode::FAILURE
        }
    }
}
