//! Fetching model files from the Hugging Face Hub.
//!
//! - [`HfLoader`] downloads a single file, retrying on hub cache lock contention
//! - [`ModelFiles::fetch`] resolves config, tokenizer and weights for a
//!   sequence-classification checkpoint
//!
//! Downloaded files land in the shared hub cache, so later loads of the same
//! revision are served locally.

use hf_hub::api::tokio::{ApiBuilder, ApiError};
use hf_hub::{Repo, RepoType};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub revision: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, revision: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            revision: revision.into(),
            filename: filename.into(),
        }
    }

    pub async fn load(&self) -> anyhow::Result<PathBuf> {
        Ok(self.fetch().await?)
    }

    async fn fetch(&self) -> Result<PathBuf, ApiError> {
        let api = ApiBuilder::new().with_chunk_size(None).build()?;
        let repo = api.repo(Repo::with_revision(
            self.repo.clone(),
            RepoType::Model,
            self.revision.clone(),
        ));

        let mut attempt = 0;
        loop {
            match repo.get(&self.filename).await {
                Ok(path) => return Ok(path),
                Err(e)
                    if e.to_string().contains("Lock acquisition failed")
                        && attempt + 1 < MAX_ATTEMPTS =>
                {
                    // Another process is downloading the same file.
                    let wait = std::time::Duration::from_millis(100 * (1 << attempt));
                    tracing::debug!(file = %self.filename, ?wait, "hub cache locked, retrying");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Local paths of everything needed to build a classifier.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    /// Download (or reuse from cache) the files of `repo` at `revision`.
    ///
    /// Weights prefer `model.safetensors` and fall back to `pytorch_model.bin`.
    pub async fn fetch(repo: &str, revision: &str) -> anyhow::Result<Self> {
        let config = HfLoader::new(repo, revision, "config.json").load().await?;
        let tokenizer = HfLoader::new(repo, revision, "tokenizer.json")
            .load()
            .await?;

        let weights = match HfLoader::new(repo, revision, "model.safetensors")
            .load()
            .await
        {
            Ok(path) => path,
            Err(_) => HfLoader::new(repo, revision, "pytorch_model.bin")
                .load()
                .await
                .map_err(|e| {
                    anyhow::anyhow!(
                        "model weights not found in repo {repo}. Expected `model.safetensors` or `pytorch_model.bin`: {e}"
                    )
                })?,
        };

        tracing::debug!(?config, ?tokenizer, ?weights, "model files resolved");
        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }

    /// Whether the weights can be memory-mapped as safetensors.
    pub fn is_safetensors(&self) -> bool {
        has_extension(&self.weights, "safetensors")
    }
}

pub fn load_tokenizer(path: &Path) -> anyhow::Result<Tokenizer> {
    Tokenizer::from_file(path).map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safetensors_detection() {
        let files = ModelFiles {
            config: PathBuf::from("config.json"),
            tokenizer: PathBuf::from("tokenizer.json"),
            weights: PathBuf::from("/cache/model.safetensors"),
        };
        assert!(files.is_safetensors());

        let files = ModelFiles {
            weights: PathBuf::from("/cache/pytorch_model.bin"),
            ..files
        };
        assert!(!files.is_safetensors());
    }
}
