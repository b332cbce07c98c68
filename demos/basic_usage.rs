use modarec::stores::CatalogStore;
use modarec::*;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    println!("🚀 modarec recommendation engine walkthrough");

    // 1. Build the full engine stack with in-memory stores
    let config = Config::default();
    let state = AppState::new(config);
    println!("✅ Engine wired up");

    // 2. Seed a small catalog
    let categories = ["tops", "jeans", "shoes", "accessories"];
    let mut product_ids = Vec::new();
    for i in 0..12 {
        let product = Product::new(
            Uuid::new_v4(),
            format!("product-{}", i),
            categories[i % categories.len()],
        );
        product_ids.push(product.product_id);
        state.catalog.upsert(product).await?;
    }
    println!("📦 Created {} products", product_ids.len());

    // 3. Simulate shoppers browsing and buying
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let carol = Uuid::new_v4();

    for &user in &[alice, bob] {
        for &product in &product_ids[0..4] {
            state
                .hybrid
                .record_interaction(user, product, InteractionType::View, None)
                .await?;
        }
        state
            .hybrid
            .record_interaction(user, product_ids[0], InteractionType::Purchase, None)
            .await?;
        state
            .hybrid
            .record_interaction(user, product_ids[1], InteractionType::Purchase, None)
            .await?;
    }
    state
        .hybrid
        .record_interaction(alice, product_ids[2], InteractionType::Rating, Some(5.0))
        .await?;
    state
        .hybrid
        .record_interaction(bob, product_ids[2], InteractionType::Rating, Some(4.0))
        .await?;
    state
        .hybrid
        .record_interaction(carol, product_ids[5], InteractionType::View, None)
        .await?;
    println!("📱 Recorded shopper interactions");

    // 4. Run the batch maintenance jobs once
    println!("\n🧠 Running similarity recomputation...");
    for report in state.scheduler.compute_all().await {
        let status = if report.success { "ok" } else { "failed" };
        println!(
            "  {}: {} ({}, {}ms)",
            report.task, status, report.detail, report.duration_ms
        );
    }

    // 5. Fetch recommendations per strategy
    println!("\n🎯 Recommendations for Alice:");
    for strategy in Strategy::ALL {
        let products = match strategy {
            Strategy::UserBased => state.user_based.recommend(alice, 5).await?,
            Strategy::ItemBased => state.item_based.recommend(alice, 5).await?,
            Strategy::Hybrid => state.hybrid.recommend(alice, 5).await?,
        };
        println!("  {} -> {} products", strategy.as_str(), products.len());
        for product in products {
            println!("    {} ({})", product.name, product.category);
        }
    }

    // 6. Product-page widgets
    println!("\n🛍 Product page widgets for {}:", product_ids[0]);
    let together = state
        .hybrid
        .frequently_bought_together(product_ids[0], 3)
        .await?;
    println!("  bought together: {} products", together.len());
    let viewed = state.hybrid.customers_also_viewed(product_ids[0], 3).await?;
    println!("  also viewed: {} products", viewed.len());

    // 7. Anonymous homepage falls back to trending
    let homepage = state.hybrid.homepage_recommendations(None, 5).await?;
    println!("\n🏠 Homepage (anonymous): {} trending products", homepage.len());

    Ok(())
}
