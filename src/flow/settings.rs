//! Configuration for the answer-refinement flow.

use crate::runtime::RuntimeConfig;

/// Per-flow settings; fixed for the lifetime of an
/// [`AnswerFlow`](super::AnswerFlow).
#[derive(Clone, Debug)]
pub struct FlowSettings {
    /// Human description of what the index covers, interpolated into the
    /// rejection reply.
    pub index_description: String,
    /// Relevance threshold in `[0, 1]` for validation and references.
    pub similarity_cutoff: f64,
    /// Upper bound on rewrite passes; `None` loops until the answer scores
    /// readable (bounded only by the runtime superstep limit).
    pub max_rewrite_passes: Option<u32>,
    /// Engine settings (superstep limit, event sinks).
    pub runtime: RuntimeConfig,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            index_description: String::new(),
            similarity_cutoff: Self::DEFAULT_SIMILARITY_CUTOFF,
            max_rewrite_passes: Some(Self::DEFAULT_MAX_REWRITE_PASSES),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl FlowSettings {
    pub const DEFAULT_SIMILARITY_CUTOFF: f64 = 0.7;
    pub const DEFAULT_MAX_REWRITE_PASSES: u32 = 3;

    /// Resolve settings from the environment, reading a `.env` file when
    /// present. `SVARFLYT_SIMILARITY_CUTOFF` overrides the cutoff;
    /// `SVARFLYT_MAX_REWRITE_PASSES` overrides the rewrite cap, where `0`
    /// means unbounded.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut settings = Self {
            runtime: RuntimeConfig::from_env(),
            ..Self::default()
        };
        if let Some(cutoff) = std::env::var("SVARFLYT_SIMILARITY_CUTOFF")
            .ok()
            .and_then(|raw| raw.parse::<f64>().ok())
        {
            settings.similarity_cutoff = cutoff;
        }
        if let Some(cap) = std::env::var("SVARFLYT_MAX_REWRITE_PASSES")
            .ok()
            .and_then(|raw| raw.parse::<u32>().ok())
        {
            settings.max_rewrite_passes = (cap > 0).then_some(cap);
        }
        settings
    }

    #[must_use]
    pub fn with_index_description(mut self, description: impl Into<String>) -> Self {
        self.index_description = description.into();
        self
    }

    #[must_use]
    pub fn with_similarity_cutoff(mut self, cutoff: f64) -> Self {
        self.similarity_cutoff = cutoff;
        self
    }

    #[must_use]
    pub fn with_max_rewrite_passes(mut self, cap: Option<u32>) -> Self {
        self.max_rewrite_passes = cap;
        self
    }

    #[must_use]
    pub fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }
}
