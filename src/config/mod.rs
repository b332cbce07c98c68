use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub recommendation: RecommendationConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("invalid server host/port")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// K nearest neighbor users / similar items consulted per request.
    pub top_k: usize,
    /// Similarity scores below this are ignored everywhere.
    pub min_similarity: f64,
    pub cache_ttl_hours: i64,
    pub weight_user_based: f64,
    pub weight_item_based: f64,
    pub weight_trending: f64,
    /// Users sampled for the "customers also viewed" co-occurrence heuristic.
    pub also_viewed_user_sample: usize,
    /// Candidates pulled per co-occurrence query during the cheap batch mode.
    pub co_occurrence_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub user_similarity_interval_secs: u64,
    pub item_similarity_interval_secs: u64,
    pub cache_sweep_interval_secs: u64,
    /// Use the cheap co-occurrence approximation in the periodic item job
    /// instead of full pairwise cosine.
    pub co_occurrence_mode: bool,
    /// Upper bound on one similarity recompute; a timed-out run keeps
    /// whatever rows it already upserted.
    pub compute_deadline_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: num_cpus::get(),
            },
            recommendation: RecommendationConfig {
                top_k: 20,
                min_similarity: 0.1,
                cache_ttl_hours: 24,
                weight_user_based: 0.3,
                weight_item_based: 0.5,
                weight_trending: 0.2,
                also_viewed_user_sample: 50,
                co_occurrence_candidates: 50,
            },
            scheduler: SchedulerConfig {
                user_similarity_interval_secs: 24 * 60 * 60,
                item_similarity_interval_secs: 24 * 60 * 60,
                cache_sweep_interval_secs: 6 * 60 * 60,
                co_occurrence_mode: false,
                compute_deadline_secs: None,
            },
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("MODAREC"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
