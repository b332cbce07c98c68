use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::interval;
use tracing::{error, info};

use crate::config::Config;
use crate::models::TaskReport;

use super::hybrid::HybridRecommender;
use super::item_based::ItemBasedCf;
use super::user_based::UserBasedCf;

/// Background maintenance: periodic similarity recomputation and cache
/// sweeps. Each job runs on its own interval and its own failure boundary,
/// so a broken recompute never stops the cache sweep.
pub struct MaintenanceScheduler {
    user_based: Arc<UserBasedCf>,
    item_based: Arc<ItemBasedCf>,
    hybrid: Arc<HybridRecommender>,
    config: Arc<Config>,
}

impl MaintenanceScheduler {
    pub fn new(
        user_based: Arc<UserBasedCf>,
        item_based: Arc<ItemBasedCf>,
        hybrid: Arc<HybridRecommender>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            user_based,
            item_based,
            hybrid,
            config,
        }
    }

    /// Spawns the three maintenance loops and returns immediately. Each
    /// interval fires once at startup, then on its configured period.
    pub fn start(self: Arc<Self>) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(
                scheduler.config.scheduler.user_similarity_interval_secs,
            ));
            loop {
                ticker.tick().await;
                scheduler.run_user_similarity_job().await;
            }
        });

        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(
                scheduler.config.scheduler.item_similarity_interval_secs,
            ));
            loop {
                ticker.tick().await;
                scheduler.run_item_similarity_job().await;
            }
        });

        let scheduler = self;
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(
                scheduler.config.scheduler.cache_sweep_interval_secs,
            ));
            loop {
                ticker.tick().await;
                scheduler.run_cache_sweep_job().await;
            }
        });
    }

    async fn run_user_similarity_job(&self) {
        let started = Instant::now();
        match self.user_based.compute_user_similarities(self.deadline()).await {
            Ok(rows) => info!(
                "User similarity job stored {} pairs in {}ms",
                rows,
                started.elapsed().as_millis()
            ),
            Err(e) => error!("User similarity job failed: {}", e),
        }
    }

    async fn run_item_similarity_job(&self) {
        let started = Instant::now();
        let result = if self.config.scheduler.co_occurrence_mode {
            self.item_based.compute_similarities_by_co_occurrence().await
        } else {
            self.item_based.compute_product_similarities(self.deadline()).await
        };
        match result {
            Ok(rows) => info!(
                "Product similarity job stored {} pairs in {}ms",
                rows,
                started.elapsed().as_millis()
            ),
            Err(e) => error!("Product similarity job failed: {}", e),
        }
    }

    async fn run_cache_sweep_job(&self) {
        let started = Instant::now();
        match self.hybrid.cleanup_expired_cache().await {
            Ok(swept) => info!(
                "Cache sweep removed {} entries in {}ms",
                swept,
                started.elapsed().as_millis()
            ),
            Err(e) => error!("Cache sweep job failed: {}", e),
        }
    }

    /// Runs every maintenance task once, sequentially, and reports each
    /// outcome. A failed task is reported and the rest still run.
    pub async fn compute_all(&self) -> Vec<TaskReport> {
        let mut reports = Vec::with_capacity(3);

        let started = Instant::now();
        reports.push(match self.user_based.compute_user_similarities(self.deadline()).await {
            Ok(rows) => TaskReport::success(
                "user_similarities",
                format!("{} pairs stored", rows),
                started.elapsed(),
            ),
            Err(e) => TaskReport::failure("user_similarities", e.to_string(), started.elapsed()),
        });

        let started = Instant::now();
        let item_result = if self.config.scheduler.co_occurrence_mode {
            self.item_based.compute_similarities_by_co_occurrence().await
        } else {
            self.item_based.compute_product_similarities(self.deadline()).await
        };
        reports.push(match item_result {
            Ok(rows) => TaskReport::success(
                "product_similarities",
                format!("{} pairs stored", rows),
                started.elapsed(),
            ),
            Err(e) => TaskReport::failure("product_similarities", e.to_string(), started.elapsed()),
        });

        let started = Instant::now();
        reports.push(match self.hybrid.cleanup_expired_cache().await {
            Ok(swept) => TaskReport::success(
                "cache_cleanup",
                format!("{} entries removed", swept),
                started.elapsed(),
            ),
            Err(e) => TaskReport::failure("cache_cleanup", e.to_string(), started.elapsed()),
        });

        reports
    }

    fn deadline(&self) -> Option<Instant> {
        self.config
            .scheduler
            .compute_deadline_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs))
    }
}
