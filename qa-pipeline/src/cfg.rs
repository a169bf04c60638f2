//! Runtime configuration loaded from environment variables.

use std::{str::FromStr, time::Duration};

use crate::error::PipelineError;

/// What happens to the batch when one question fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Failed question gets an error marker, siblings still answer.
    #[default]
    Isolate,
    /// First failure fails the request and cancels the rest.
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolate" => Ok(Self::Isolate),
            "abort" | "abort-all" | "abort_all" => Ok(Self::Abort),
            other => Err(PipelineError::InvalidConfig(format!(
                "QA_FAILURE_POLICY must be `isolate` or `abort`, got `{other}`"
            ))),
        }
    }
}

/// Knobs for chunking, retrieval and fan-out. All fields have defaults via `from_env`.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,

    // Concurrency ceilings
    pub qa_concurrency: usize,
    pub embed_concurrency: usize,

    pub failure_policy: FailurePolicy,
    /// `None` disables the global deadline.
    pub request_timeout: Option<Duration>,
    /// Expected embedding length; mismatching vectors are rejected.
    pub embedding_dim: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 10,
            qa_concurrency: 8,
            embed_concurrency: 8,
            failure_policy: FailurePolicy::Isolate,
            request_timeout: Some(Duration::from_secs(300)),
            embedding_dim: None,
        }
    }
}

impl PipelineConfig {
    /// Build from process environment and validate.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary variable lookup and validate.
    ///
    /// # Example
    /// ```
    /// # use qa_pipeline::cfg::PipelineConfig;
    /// let cfg = PipelineConfig::from_vars(|k| (k == "RAG_TOP_K").then(|| "3".to_string())).unwrap();
    /// assert_eq!(cfg.top_k, 3);
    /// assert_eq!(cfg.chunk_size, 500);
    /// ```
    pub fn from_vars<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();

        let timeout_secs: u64 = parse(&lookup, "REQUEST_TIMEOUT_SECS", 300)?;
        let failure_policy = match lookup("QA_FAILURE_POLICY") {
            Some(v) if !v.trim().is_empty() => v.parse()?,
            _ => d.failure_policy,
        };
        let embedding_dim = match lookup("EMBEDDING_DIM") {
            Some(v) if !v.trim().is_empty() => Some(parse_value("EMBEDDING_DIM", &v)?),
            _ => None,
        };

        let cfg = Self {
            chunk_size: parse(&lookup, "CHUNK_SIZE", d.chunk_size)?,
            chunk_overlap: parse(&lookup, "CHUNK_OVERLAP", d.chunk_overlap)?,
            top_k: parse(&lookup, "RAG_TOP_K", d.top_k)?,
            qa_concurrency: parse(&lookup, "QA_CONCURRENCY", d.qa_concurrency)?,
            embed_concurrency: parse(&lookup, "EMBED_CONCURRENCY", d.embed_concurrency)?,
            failure_policy,
            request_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            embedding_dim,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks `size > overlap >= 0`, `top_k >= 1` and non-zero concurrency.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(PipelineError::InvalidConfig(format!(
                "chunk size ({}) must be greater than overlap ({})",
                self.chunk_size, self.chunk_overlap
            )));
        }
        if self.top_k == 0 {
            return Err(PipelineError::InvalidConfig("RAG_TOP_K must be >= 1".into()));
        }
        if self.qa_concurrency == 0 || self.embed_concurrency == 0 {
            return Err(PipelineError::InvalidConfig(
                "QA_CONCURRENCY and EMBED_CONCURRENCY must be >= 1".into(),
            ));
        }
        if self.embedding_dim == Some(0) {
            return Err(PipelineError::InvalidConfig("EMBEDDING_DIM must be >= 1".into()));
        }
        Ok(())
    }
}

fn parse<F, T>(lookup: &F, key: &str, dflt: T) -> Result<T, PipelineError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => parse_value(key, &v),
        _ => Ok(dflt),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, PipelineError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| PipelineError::InvalidConfig(format!("{key}=`{raw}`: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = PipelineConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = PipelineConfig::from_vars(vars(&[
            ("CHUNK_SIZE", "200"),
            ("CHUNK_OVERLAP", "20"),
            ("QA_FAILURE_POLICY", "Abort"),
            ("REQUEST_TIMEOUT_SECS", "0"),
            ("EMBEDDING_DIM", "768"),
        ]))
        .unwrap();
        assert_eq!(cfg.chunk_size, 200);
        assert_eq!(cfg.chunk_overlap, 20);
        assert_eq!(cfg.failure_policy, FailurePolicy::Abort);
        assert_eq!(cfg.request_timeout, None);
        assert_eq!(cfg.embedding_dim, Some(768));
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let err = PipelineConfig::from_vars(vars(&[("CHUNK_SIZE", "50"), ("CHUNK_OVERLAP", "50")]))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }

    #[test]
    fn rejects_garbage_numbers_and_policies() {
        assert!(PipelineConfig::from_vars(vars(&[("RAG_TOP_K", "ten")])).is_err());
        assert!(PipelineConfig::from_vars(vars(&[("RAG_TOP_K", "0")])).is_err());
        assert!(PipelineConfig::from_vars(vars(&[("QA_CONCURRENCY", "0")])).is_err());
        assert!(PipelineConfig::from_vars(vars(&[("QA_FAILURE_POLICY", "retry")])).is_err());
    }
}
