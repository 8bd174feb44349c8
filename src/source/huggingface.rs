use hf_hub::api::sync::{Api, ApiBuilder};
use hf_hub::{Repo, RepoType};
use parquet::file::reader::SerializedFileReader;
use parquet::record::reader::RowIter as ParquetRowIter;
use serde_json::Value;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{BenchmarkSource, RawRecordStream};
use crate::benchmarks::BenchmarkSpec;
use crate::constants::huggingface::{DOWNLOAD_RETRIES, SHARD_EXTENSIONS};
use crate::errors::DatasetError;

/// Configuration for the Hugging Face benchmark source.
#[derive(Clone, Debug)]
pub struct HuggingFaceSourceConfig {
    /// Optional local snapshot root; shards are looked up under `<root>/<domain>`.
    ///
    /// When the domain directory holds shard files for the split they are read
    /// instead of contacting the Hub.
    pub snapshot_root: Option<PathBuf>,
    /// File extensions accepted as shard files.
    pub shard_extensions: Vec<String>,
    /// Retry count handed to the hf-hub client.
    pub retries: usize,
    /// Show hf-hub download progress bars.
    pub progress: bool,
}

impl Default for HuggingFaceSourceConfig {
    fn default() -> Self {
        Self {
            snapshot_root: None,
            shard_extensions: SHARD_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            retries: DOWNLOAD_RETRIES,
            progress: true,
        }
    }
}

/// Shard file to read, either already on disk or still on the Hub.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ShardRef {
    Local(PathBuf),
    Remote(String),
}

/// `BenchmarkSource` reading parquet/jsonl shards of a Hub dataset split.
pub struct HuggingFaceSource {
    config: HuggingFaceSourceConfig,
}

impl HuggingFaceSource {
    /// Build a source from `config`.
    pub fn new(config: HuggingFaceSourceConfig) -> Self {
        Self { config }
    }

    fn build_api(&self, domain: &str) -> Result<Api, DatasetError> {
        ApiBuilder::new()
            .with_progress(self.config.progress)
            .with_retries(self.config.retries)
            .build()
            .map_err(|err| DatasetError::Retrieval {
                domain: domain.to_string(),
                reason: format!("failed building hf-hub client: {err}"),
            })
    }

    fn accepted_extensions(&self) -> Vec<String> {
        self.config
            .shard_extensions
            .iter()
            .map(|value| value.trim().trim_start_matches('.').to_ascii_lowercase())
            .collect()
    }

    fn has_accepted_extension(&self, path: &Path) -> bool {
        let accepted = self.accepted_extensions();
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| accepted.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
    }

    fn local_shards(&self, benchmark: &BenchmarkSpec, split: &str) -> Vec<PathBuf> {
        let Some(root) = &self.config.snapshot_root else {
            return Vec::new();
        };
        let dir = root.join(benchmark.domain.as_str());
        if !dir.is_dir() {
            return Vec::new();
        }

        let mut shard_paths: Vec<PathBuf> = WalkDir::new(&dir)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.has_accepted_extension(path))
            .filter(|path| {
                let relative = path.strip_prefix(&dir).unwrap_or(path);
                path_matches_split(&relative.to_string_lossy(), split)
            })
            .collect();
        shard_paths.sort();
        shard_paths
    }

    fn list_remote_candidates(
        &self,
        benchmark: &BenchmarkSpec,
        split: &str,
    ) -> Result<Vec<String>, DatasetError> {
        let domain = benchmark.domain.as_str();
        let api = self.build_api(domain)?;
        let repo_api = api.repo(Repo::new(benchmark.dataset.to_string(), RepoType::Dataset));
        info!(
            "[ppe_corr:hf] reading remote file list for dataset {}",
            benchmark.dataset
        );
        let info = repo_api.info().map_err(|err| DatasetError::Retrieval {
            domain: domain.to_string(),
            reason: format!(
                "failed reading hf-hub repository info for '{}': {err}",
                benchmark.dataset
            ),
        })?;

        let mut candidates: Vec<String> = info
            .siblings
            .into_iter()
            .map(|sibling| sibling.rfilename)
            .filter(|remote_path| self.has_accepted_extension(Path::new(remote_path)))
            .filter(|remote_path| path_matches_split(remote_path, split))
            .collect();
        candidates.sort();

        if candidates.is_empty() {
            return Err(DatasetError::Retrieval {
                domain: domain.to_string(),
                reason: format!(
                    "no remote shard files for split '{split}' in dataset '{}' with extensions {:?}",
                    benchmark.dataset, self.config.shard_extensions
                ),
            });
        }
        info!(
            "[ppe_corr:hf] remote shards for {} split '{}': {}",
            benchmark.dataset,
            split,
            candidates.len()
        );
        Ok(candidates)
    }
}

impl BenchmarkSource for HuggingFaceSource {
    fn open(
        &self,
        benchmark: &BenchmarkSpec,
        split: &str,
    ) -> Result<RawRecordStream, DatasetError> {
        let local = self.local_shards(benchmark, split);
        let shards: VecDeque<ShardRef> = if local.is_empty() {
            self.list_remote_candidates(benchmark, split)?
                .into_iter()
                .map(ShardRef::Remote)
                .collect()
        } else {
            info!(
                "[ppe_corr:hf] using {} local shard(s) for {}",
                local.len(),
                benchmark.name
            );
            local.into_iter().map(ShardRef::Local).collect()
        };

        let api = if shards.iter().any(|shard| matches!(shard, ShardRef::Remote(_))) {
            Some(self.build_api(benchmark.domain.as_str())?)
        } else {
            None
        };

        let rows = ShardRows {
            benchmark: *benchmark,
            api,
            shards,
            current: None,
        };
        Ok(RawRecordStream::from_rows(benchmark, Box::new(rows)))
    }
}

/// True if a shard path belongs to `split` (`train/`, `-train-`, or `train-*` file names).
fn path_matches_split(path: &str, split: &str) -> bool {
    if split.is_empty() {
        return true;
    }
    let normalized = path.replace('\\', "/");
    let split_dir = format!("{split}/");
    let split_token = format!("-{split}-");
    let split_prefix = format!("{split}-");
    let split_file = format!("{split}.");
    let file_name = Path::new(&normalized)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    normalized.starts_with(&split_dir)
        || normalized.contains(&format!("/{split_dir}"))
        || normalized.contains(&split_token)
        || file_name.starts_with(&split_prefix)
        || file_name.starts_with(&split_file)
}

enum ShardReader {
    Parquet(ParquetRowIter<'static>),
    Json(Lines<BufReader<File>>),
}

struct OpenShard {
    path: PathBuf,
    reader: ShardReader,
    line: usize,
}

/// Lazy row iterator over a benchmark's shards; remote shards are downloaded on first touch.
struct ShardRows {
    benchmark: BenchmarkSpec,
    api: Option<Api>,
    shards: VecDeque<ShardRef>,
    current: Option<OpenShard>,
}

impl ShardRows {
    fn retrieval_error(&self, reason: String) -> DatasetError {
        DatasetError::Retrieval {
            domain: self.benchmark.domain.as_str().to_string(),
            reason,
        }
    }

    fn schema_error(&self, details: String) -> DatasetError {
        DatasetError::Schema {
            domain: self.benchmark.domain.as_str().to_string(),
            details,
        }
    }

    fn materialize(&self, shard: ShardRef) -> Result<PathBuf, DatasetError> {
        match shard {
            ShardRef::Local(path) => Ok(path),
            ShardRef::Remote(remote_path) => {
                let Some(api) = &self.api else {
                    return Err(self.retrieval_error(format!(
                        "no hf-hub client available to fetch '{remote_path}'"
                    )));
                };
                let started = Instant::now();
                info!(
                    "[ppe_corr:hf] downloading {} from {}",
                    remote_path, self.benchmark.dataset
                );
                let repo_api = api.repo(Repo::new(
                    self.benchmark.dataset.to_string(),
                    RepoType::Dataset,
                ));
                let local = repo_api.get(&remote_path).map_err(|err| {
                    self.retrieval_error(format!(
                        "failed downloading '{remote_path}' from hf-hub: {err}"
                    ))
                })?;
                if !local.exists() {
                    return Err(self.retrieval_error(format!(
                        "hf-hub returned non-existent cache file for '{}' at {}",
                        remote_path,
                        local.display()
                    )));
                }
                info!(
                    "[ppe_corr:hf] shard ready {} in {:.1}s",
                    local.display(),
                    started.elapsed().as_secs_f64()
                );
                Ok(local)
            }
        }
    }

    fn open_shard(&self, path: PathBuf) -> Result<OpenShard, DatasetError> {
        let file = File::open(&path).map_err(|err| {
            self.retrieval_error(format!("failed opening shard {}: {err}", path.display()))
        })?;
        let is_parquet = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));
        let reader = if is_parquet {
            let reader = SerializedFileReader::new(file).map_err(|err| {
                self.retrieval_error(format!(
                    "failed reading parquet metadata {}: {err}",
                    path.display()
                ))
            })?;
            ShardReader::Parquet(reader.into_iter())
        } else {
            ShardReader::Json(BufReader::new(file).lines())
        };
        debug!("[ppe_corr:hf] reading shard {}", path.display());
        Ok(OpenShard {
            path,
            reader,
            line: 0,
        })
    }

    fn next_from_current(&mut self) -> Option<Result<Value, DatasetError>> {
        let shard = self.current.as_mut()?;
        loop {
            match &mut shard.reader {
                ShardReader::Parquet(rows) => {
                    let row = rows.next()?;
                    shard.line += 1;
                    return Some(row.map(|row| row.to_json_value()).map_err(|err| {
                        DatasetError::Retrieval {
                            domain: self.benchmark.domain.as_str().to_string(),
                            reason: format!(
                                "failed reading parquet row {} in {}: {err}",
                                shard.line,
                                shard.path.display()
                            ),
                        }
                    }));
                }
                ShardReader::Json(lines) => {
                    let line = lines.next()?;
                    shard.line += 1;
                    let line = match line {
                        Ok(line) => line,
                        Err(err) => {
                            return Some(Err(DatasetError::Retrieval {
                                domain: self.benchmark.domain.as_str().to_string(),
                                reason: format!(
                                    "failed reading line {} of {}: {err}",
                                    shard.line,
                                    shard.path.display()
                                ),
                            }));
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str::<Value>(line.trim()).map_err(|err| {
                        DatasetError::Schema {
                            domain: self.benchmark.domain.as_str().to_string(),
                            details: format!(
                                "failed decoding JSON row at line {} of {}: {err}",
                                shard.line,
                                shard.path.display()
                            ),
                        }
                    }));
                }
            }
        }
    }
}

impl Iterator for ShardRows {
    type Item = Result<Value, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.next_from_current() {
                return Some(item);
            }
            if let Some(done) = self.current.take() {
                debug!(
                    "[ppe_corr:hf] finished shard {} ({} rows)",
                    done.path.display(),
                    done.line
                );
            }
            let shard = self.shards.pop_front()?;
            let opened = self
                .materialize(shard)
                .and_then(|path| self.open_shard(path));
            match opened {
                Ok(open) => self.current = Some(open),
                Err(err) => {
                    warn!("[ppe_corr:hf] {err}");
                    self.shards.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}

impl ShardRows {
    #[cfg(test)]
    fn local(benchmark: BenchmarkSpec, paths: Vec<PathBuf>) -> Self {
        Self {
            benchmark,
            api: None,
            shards: paths.into_iter().map(ShardRef::Local).collect(),
            current: None,
        }
    }
}
