use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use modarec::config::Config;
use modarec::models::{Interaction, InteractionType, Product, Rating};
use modarec::services::{ItemBasedCf, UserBasedCf};
use modarec::stores::{
    CatalogStore, InMemoryCatalog, InMemoryInteractionStore, InMemoryRecommendationCache,
    InMemorySimilarityStore, InteractionStore, RecommendationCache, SimilarityStore,
};

fn sparse_vector(seed: u64, len: usize) -> HashMap<Uuid, f64> {
    (0..len)
        .map(|i| {
            let id = Uuid::from_u64_pair(seed, i as u64);
            (id, ((seed + i as u64) % 10) as f64 / 2.0 + 0.5)
        })
        .collect()
}

fn benchmark_sparse_math(c: &mut Criterion) {
    use modarec::utils::*;

    let a = sparse_vector(1, 1000);
    // Overlapping keys on even indices.
    let mut b = sparse_vector(2, 1000);
    for (i, (&id, _)) in a.iter().enumerate() {
        if i % 2 == 0 {
            b.insert(id, 3.0);
        }
    }

    c.bench_function("cosine_similarity", |bench| {
        bench.iter(|| {
            black_box(cosine_similarity(&a, &b));
        });
    });

    c.bench_function("pearson_correlation", |bench| {
        bench.iter(|| {
            black_box(pearson_correlation(&a, &b));
        });
    });

    c.bench_function("normalize_scores", |bench| {
        bench.iter(|| {
            black_box(normalize_scores(&a));
        });
    });

    c.bench_function("top_n", |bench| {
        bench.iter(|| {
            black_box(top_n(&a, 10));
        });
    });
}

struct BenchEngines {
    user_based: UserBasedCf,
    item_based: ItemBasedCf,
    user_id: Uuid,
    product_id: Uuid,
}

async fn seeded_engines(users: usize, products: usize) -> BenchEngines {
    let config = Arc::new(Config::default());
    let interactions: Arc<dyn InteractionStore> = Arc::new(InMemoryInteractionStore::new());
    let catalog_store = Arc::new(InMemoryCatalog::new());
    let user_similarities: Arc<dyn SimilarityStore> = Arc::new(InMemorySimilarityStore::new());
    let product_similarities: Arc<dyn SimilarityStore> = Arc::new(InMemorySimilarityStore::new());
    let cache: Arc<dyn RecommendationCache> = Arc::new(InMemoryRecommendationCache::new());

    let product_ids: Vec<Uuid> = (0..products)
        .map(|i| {
            let id = Uuid::from_u64_pair(7, i as u64);
            catalog_store.insert(Product::new(id, format!("product-{}", i), "apparel"));
            id
        })
        .collect();

    let user_ids: Vec<Uuid> = (0..users).map(|i| Uuid::from_u64_pair(11, i as u64)).collect();

    for (u, &user_id) in user_ids.iter().enumerate() {
        for (p, &product_id) in product_ids.iter().enumerate() {
            if (u + p) % 3 != 0 {
                continue;
            }
            let value = ((u * 7 + p) % 5 + 1) as f64;
            interactions
                .upsert_rating(Rating::new(user_id, product_id, value))
                .await
                .unwrap();
            interactions
                .record(
                    Interaction::new(user_id, product_id, InteractionType::Rating)
                        .with_value(value),
                )
                .await
                .unwrap();
        }
    }

    let catalog: Arc<dyn CatalogStore> = catalog_store;
    let user_based = UserBasedCf::new(
        interactions.clone(),
        user_similarities,
        cache.clone(),
        catalog.clone(),
        config.clone(),
    );
    let item_based = ItemBasedCf::new(
        interactions,
        product_similarities,
        cache,
        catalog,
        config,
    );

    BenchEngines {
        user_based,
        item_based,
        user_id: user_ids[0],
        product_id: product_ids[0],
    }
}

fn benchmark_similarity_recompute(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engines = rt.block_on(seeded_engines(100, 50));

    c.bench_function("compute_user_similarities_100_users", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                engines
                    .user_based
                    .compute_user_similarities(None)
                    .await
                    .unwrap(),
            );
        });
    });

    c.bench_function("compute_product_similarities_50_products", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                engines
                    .item_based
                    .compute_product_similarities(None)
                    .await
                    .unwrap(),
            );
        });
    });
}

fn benchmark_recommendation_serving(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engines = rt.block_on(async {
        let engines = seeded_engines(100, 50).await;
        engines.user_based.compute_user_similarities(None).await.unwrap();
        engines
            .item_based
            .compute_product_similarities(None)
            .await
            .unwrap();
        engines
    });

    c.bench_function("user_based_recommend_cached", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(engines.user_based.recommend(engines.user_id, 10).await.unwrap());
        });
    });

    c.bench_function("item_based_similar_to", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                engines
                    .item_based
                    .similar_to(engines.product_id, 10)
                    .await
                    .unwrap(),
            );
        });
    });
}

fn benchmark_metrics(c: &mut Criterion) {
    use modarec::utils::metrics::MetricsCalculator;

    let calculator = MetricsCalculator::new(10);
    let recommended: Vec<Uuid> = (0..10).map(|i| Uuid::from_u64_pair(3, i)).collect();
    let relevant: Vec<Uuid> = recommended[0..5].to_vec();

    c.bench_function("precision_at_k", |b| {
        b.iter(|| {
            black_box(calculator.precision_at_k(&recommended, &relevant));
        });
    });

    let relevance: HashMap<Uuid, f64> = recommended
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i as f64 / 10.0))
        .collect();

    c.bench_function("ndcg_at_k", |b| {
        b.iter(|| {
            black_box(calculator.ndcg_at_k(&recommended, &relevance));
        });
    });
}

criterion_group!(
    benches,
    benchmark_sparse_math,
    benchmark_similarity_recompute,
    benchmark_recommendation_serving,
    benchmark_metrics
);
criterion_main!(benches);
