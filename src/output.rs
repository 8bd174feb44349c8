use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::output::TEMP_EXTENSION;
use crate::data::NormalizedRecord;
use crate::errors::DatasetError;

/// Temp file next to the final artifact; removed on drop unless committed.
struct TempArtifact {
    path: PathBuf,
    committed: bool,
}

impl TempArtifact {
    fn for_target(target: &Path) -> Self {
        let mut name = target
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{TEMP_EXTENSION}"));
        Self {
            path: target.with_file_name(name),
            committed: false,
        }
    }

    fn commit(mut self, target: &Path) -> Result<(), DatasetError> {
        fs::rename(&self.path, target).map_err(|err| output_error(target, err))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if !self.committed && self.path.exists() {
            if let Err(err) = fs::remove_file(&self.path) {
                debug!(
                    "[ppe_corr:output] failed removing temp file {}: {err}",
                    self.path.display()
                );
            }
        }
    }
}

fn output_error(path: &Path, err: impl std::fmt::Display) -> DatasetError {
    DatasetError::Output {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Serialize `records` as one pretty-printed JSON array at `path`.
///
/// The array is written to a sibling temp file and renamed into place, so the
/// final path holds either the complete artifact or whatever was there before.
pub fn write_collection(path: &Path, records: &[NormalizedRecord]) -> Result<(), DatasetError> {
    write_json_atomic(path, records)?;
    info!(
        "[ppe_corr:output] saved {} records to {}",
        records.len(),
        path.display()
    );
    Ok(())
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| output_error(path, err))?;
    }

    let temp = TempArtifact::for_target(path);
    let file = File::create(&temp.path).map_err(|err| output_error(path, err))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|err| output_error(path, err))?;
    writer
        .write_all(b"\n")
        .map_err(|err| output_error(path, err))?;
    let file = writer
        .into_inner()
        .map_err(|err| output_error(path, err.error()))?;
    file.sync_all().map_err(|err| output_error(path, err))?;
    drop(file);

    temp.commit(path)
}
