use serde::{Deserialize, Serialize};

use crate::core::{ClassifierError, RequestLimits, Result};

/// Inbound single-text request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub text: String,
    /// Defaults to [`RequestLimits::default_top_k`] when omitted. Signed so
    /// that negative values are reported as bounds errors, not decode errors.
    #[serde(default)]
    pub top_k: Option<i64>,
}

/// Inbound batch request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub top_k: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub text: String,
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    pub texts: Vec<String>,
    pub top_k: usize,
}

pub fn validate_request(
    request: ClassificationRequest,
    limits: &RequestLimits,
) -> Result<ValidatedRequest> {
    check_text("text", &request.text, limits)?;
    let top_k = check_top_k(request.top_k, limits)?;
    Ok(ValidatedRequest {
        text: request.text,
        top_k,
    })
}

pub fn validate_batch(request: BatchRequest, limits: &RequestLimits) -> Result<ValidatedBatch> {
    if request.texts.is_empty() {
        return Err(ClassifierError::validation(
            "texts",
            "must contain at least 1 item",
        ));
    }
    if request.texts.len() > limits.max_batch {
        return Err(ClassifierError::validation(
            "texts",
            format!(
                "must contain at most {} items, got {}",
                limits.max_batch,
                request.texts.len()
            ),
        ));
    }
    for (i, text) in request.texts.iter().enumerate() {
        check_text(&format!("texts[{i}]"), text, limits)?;
    }
    let top_k = check_top_k(request.top_k, limits)?;
    Ok(ValidatedBatch {
        texts: request.texts,
        top_k,
    })
}

// Length is counted in characters, not bytes.
fn check_text(field: &str, text: &str, limits: &RequestLimits) -> Result<()> {
    if text.is_empty() {
        return Err(ClassifierError::validation(
            field,
            "must contain at least 1 character",
        ));
    }
    let len = text.chars().count();
    if len > limits.max_text_len {
        return Err(ClassifierError::validation(
            field,
            format!(
                "must contain at most {} characters, got {len}",
                limits.max_text_len
            ),
        ));
    }
    Ok(())
}

fn check_top_k(top_k: Option<i64>, limits: &RequestLimits) -> Result<usize> {
    let Some(top_k) = top_k else {
        return Ok(limits.default_top_k);
    };
    match usize::try_from(top_k) {
        Ok(k) if (1..=limits.max_top_k).contains(&k) => Ok(k),
        _ => Err(ClassifierError::validation(
            "top_k",
            format!("must be between 1 and {}, got {top_k}", limits.max_top_k),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> RequestLimits {
        RequestLimits::for_categories(32)
    }

    fn single(text: &str, top_k: Option<i64>) -> ClassificationRequest {
        ClassificationRequest {
            text: text.to_string(),
            top_k,
        }
    }

    fn field_of(err: ClassifierError) -> String {
        match err {
            ClassifierError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_top_k_bounds() {
        for bad in [0, 33, -1] {
            let err = validate_request(single("phone", Some(bad)), &limits()).unwrap_err();
            assert_eq!(field_of(err), "top_k");
        }
        assert_eq!(
            validate_request(single("phone", Some(32)), &limits())
                .unwrap()
                .top_k,
            32
        );
        assert_eq!(
            validate_request(single("phone", Some(1)), &limits())
                .unwrap()
                .top_k,
            1
        );
    }

    #[test]
    fn test_top_k_defaults_to_five() {
        let validated = validate_request(single("phone", None), &limits()).unwrap();
        assert_eq!(validated.top_k, 5);
    }

    #[test]
    fn test_text_length_counts_characters() {
        let at_limit = "é".repeat(2000);
        assert!(validate_request(single(&at_limit, None), &limits()).is_ok());

        let over = "a".repeat(2001);
        let err = validate_request(single(&over, None), &limits()).unwrap_err();
        assert_eq!(field_of(err), "text");

        let err = validate_request(single("", None), &limits()).unwrap_err();
        assert_eq!(field_of(err), "text");
    }

    #[test]
    fn test_batch_size_bounds() {
        let empty = BatchRequest {
            texts: vec![],
            top_k: None,
        };
        assert_eq!(field_of(validate_batch(empty, &limits()).unwrap_err()), "texts");

        let too_many = BatchRequest {
            texts: vec!["x".to_string(); 101],
            top_k: None,
        };
        assert_eq!(
            field_of(validate_batch(too_many, &limits()).unwrap_err()),
            "texts"
        );

        let full = BatchRequest {
            texts: vec!["x".to_string(); 100],
            top_k: Some(3),
        };
        let validated = validate_batch(full, &limits()).unwrap();
        assert_eq!(validated.texts.len(), 100);
        assert_eq!(validated.top_k, 3);
    }

    #[test]
    fn test_batch_items_checked_individually() {
        let request = BatchRequest {
            texts: vec!["ok".to_string(), String::new(), "ok".to_string()],
            top_k: None,
        };
        let err = validate_batch(request, &limits()).unwrap_err();
        assert_eq!(field_of(err), "texts[1]");
    }

    #[test]
    fn test_batch_preserves_order() {
        let texts = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let request = BatchRequest {
            texts: texts.clone(),
            top_k: Some(1),
        };
        assert_eq!(validate_batch(request, &limits()).unwrap().texts, texts);
    }
}
