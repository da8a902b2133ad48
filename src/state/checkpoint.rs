use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use crate::utils::{PipelineError, Result, RunConfig};

const CONFIG_FILE: &str = "config.json";
const ARTIFACT_PREFIX: &str = "temp_";
const ARTIFACT_SUFFIX: &str = ".tsv";

/// File-based persistence for a single run: `config.json` holds the
/// [`RunConfig`] and `temp_<batch>.tsv` files hold per-batch partial results.
/// Single-writer; concurrent runs against the same directory are not
/// supported.
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Resolves the authoritative config for this run. A persisted config
    /// always wins over the proposed one, so a resumed run keeps the exact
    /// parameters it started with; the caller must use the returned value,
    /// never the proposal.
    pub fn load_or_init(&self, proposed: RunConfig) -> Result<RunConfig> {
        std::fs::create_dir_all(&self.dir)?;
        if self.config_path().exists() {
            self.read_config()
        } else {
            proposed.validate()?;
            self.write_config(&proposed)?;
            Ok(proposed)
        }
    }

    pub fn read_config(&self) -> Result<RunConfig> {
        let content = std::fs::read_to_string(self.config_path())?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn write_config(&self, config: &RunConfig) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(self.config_path(), content)?;
        Ok(())
    }

    /// Read-modify-write of a single field in the persisted config. The field
    /// must already exist in the on-disk document and the updated document
    /// must still parse as a [`RunConfig`].
    pub fn update_field(&self, name: &str, value: JsonValue) -> Result<RunConfig> {
        let content = std::fs::read_to_string(self.config_path())?;
        let mut doc: JsonValue = serde_json::from_str(&content)?;

        let fields = doc.as_object_mut().ok_or_else(|| {
            PipelineError::Checkpoint("config.json is not a JSON object".to_string())
        })?;
        if !fields.contains_key(name) {
            return Err(PipelineError::UnknownField(name.to_string()));
        }
        fields.insert(name.to_string(), value);

        let updated: RunConfig = serde_json::from_value(doc)?;
        self.write_config(&updated)?;
        Ok(updated)
    }

    pub fn artifact_path(&self, batch_index: usize) -> PathBuf {
        self.dir
            .join(format!("{ARTIFACT_PREFIX}{batch_index}{ARTIFACT_SUFFIX}"))
    }

    /// Partial artifacts currently on disk, sorted by batch index. Files not
    /// matching the artifact naming scheme are ignored.
    pub fn list_partial_artifacts(&self) -> Result<Vec<(usize, PathBuf)>> {
        let mut artifacts = Vec::new();

        if !self.dir.exists() {
            return Ok(artifacts);
        }
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let index = name
                .strip_prefix(ARTIFACT_PREFIX)
                .and_then(|rest| rest.strip_suffix(ARTIFACT_SUFFIX))
                .and_then(|digits| digits.parse::<usize>().ok());
            if let Some(index) = index {
                artifacts.push((index, entry.path()));
            }
        }

        artifacts.sort_by_key(|(index, _)| *index);
        Ok(artifacts)
    }

    pub fn delete_partial_artifacts(&self, batch_indexes: &[usize]) -> Result<usize> {
        let mut deleted = 0;
        for index in batch_indexes {
            let path = self.artifact_path(*index);
            if path.exists() {
                std::fs::remove_file(path)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    pub fn ready_batch_count(&self) -> Result<usize> {
        Ok(self.list_partial_artifacts()?.len())
    }
}
