use clap::Parser;

use crate::models::xlm_roberta::XlmRobertaOptions;
use crate::pipelines::utils::DeviceRequest;

/// Hugging Face repository of the default e-commerce classifier.
pub const DEFAULT_MODEL_ID: &str = "Lezh1n/xlm-roberta-ecommerce-classifier";

/// Process configuration, read from flags or `CLASSIFIER_*` environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "product-classifier",
    version,
    about = "Classify product text into e-commerce categories over HTTP"
)]
pub struct ServiceConfig {
    /// Address to bind the HTTP listener to
    #[arg(long, env = "CLASSIFIER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP listener to
    #[arg(long, env = "CLASSIFIER_PORT", default_value_t = 9999)]
    pub port: u16,

    /// Hugging Face model repository to load
    #[arg(long, env = "CLASSIFIER_MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Git revision (branch, tag, commit) of the model repository
    #[arg(long, env = "CLASSIFIER_REVISION", default_value = "main")]
    pub revision: String,

    /// Compute device: auto, cpu, cuda or cuda:N
    #[arg(long, env = "CLASSIFIER_DEVICE", default_value = "auto")]
    pub device: DeviceRequest,

    /// Maximum characters accepted per text
    #[arg(long, env = "CLASSIFIER_MAX_TEXT_LEN", default_value_t = 2000)]
    pub max_text_len: usize,

    /// Maximum number of texts accepted per batch request
    #[arg(long, env = "CLASSIFIER_MAX_BATCH", default_value_t = 100)]
    pub max_batch: usize,

    /// Texts per forward pass when running a batch
    #[arg(long, env = "CLASSIFIER_BATCH_SIZE", default_value_t = 32)]
    pub batch_size: usize,

    /// Predictions returned when a request omits top_k
    #[arg(long, env = "CLASSIFIER_DEFAULT_TOP_K", default_value_t = 5)]
    pub default_top_k: usize,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "CLASSIFIER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9999,
            model_id: DEFAULT_MODEL_ID.to_string(),
            revision: "main".to_string(),
            device: DeviceRequest::Default,
            max_text_len: 2000,
            max_batch: 100,
            batch_size: 32,
            default_top_k: 5,
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject settings that would make every request fail.
    pub fn validate(&self, num_categories: usize) -> anyhow::Result<()> {
        if self.max_text_len == 0 {
            anyhow::bail!("max_text_len must be at least 1");
        }
        if self.max_batch == 0 {
            anyhow::bail!("max_batch must be at least 1");
        }
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }
        if self.default_top_k == 0 || self.default_top_k > num_categories {
            anyhow::bail!(
                "default_top_k must be between 1 and {num_categories}, got {}",
                self.default_top_k
            );
        }
        Ok(())
    }

    pub fn limits(&self, num_categories: usize) -> RequestLimits {
        RequestLimits {
            max_text_len: self.max_text_len,
            max_batch: self.max_batch,
            max_top_k: num_categories,
            default_top_k: self.default_top_k,
        }
    }

    pub fn model_options(&self) -> XlmRobertaOptions {
        XlmRobertaOptions {
            model_id: self.model_id.clone(),
            revision: self.revision.clone(),
            batch_size: self.batch_size,
        }
    }
}

/// Bounds applied to incoming requests before they reach the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_text_len: usize,
    pub max_batch: usize,
    /// Upper bound for `top_k`; the number of categories.
    pub max_top_k: usize,
    pub default_top_k: usize,
}

impl RequestLimits {
    pub fn for_categories(num_categories: usize) -> Self {
        ServiceConfig::default().limits(num_categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_service() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:9999");
        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert!(config.validate(32).is_ok());

        let limits = config.limits(32);
        assert_eq!(limits.max_text_len, 2000);
        assert_eq!(limits.max_batch, 100);
        assert_eq!(limits.max_top_k, 32);
        assert_eq!(limits.default_top_k, 5);
    }

    #[test]
    fn test_parse_flags() {
        let config = ServiceConfig::try_parse_from([
            "product-classifier",
            "--port",
            "8080",
            "--device",
            "cpu",
            "--batch-size",
            "8",
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(matches!(config.device, DeviceRequest::Cpu));
        assert_eq!(config.model_options().batch_size, 8);
    }

    #[test]
    fn test_validate_rejects_default_top_k_out_of_range() {
        let config = ServiceConfig {
            default_top_k: 33,
            ..ServiceConfig::default()
        };
        assert!(config.validate(32).is_err());

        let config = ServiceConfig {
            batch_size: 0,
            ..ServiceConfig::default()
        };
        assert!(config.validate(32).is_err());
    }
}
