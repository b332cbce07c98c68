use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Product;

/// Read-only product catalog plus the two interaction counters the core is
/// allowed to bump. Existence and eligibility filtering happen here, not in
/// the engines.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts or replaces a product.
    async fn upsert(&self, product: Product) -> Result<()>;

    /// Active products for the given ids, in input order. Unknown or
    /// inactive ids are silently dropped.
    async fn find_by_ids(&self, product_ids: &[Uuid]) -> Result<Vec<Product>>;

    /// Trending fallback: purchase_count * 10 + view_count descending, then
    /// newest first.
    async fn find_trending(&self, limit: usize) -> Result<Vec<Product>>;

    async fn find_all_active(&self) -> Result<Vec<Product>>;

    async fn increment_view_count(&self, product_id: Uuid) -> Result<()>;

    async fn increment_purchase_count(&self, product_id: Uuid) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        self.products.write().insert(product.product_id, product);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn upsert(&self, product: Product) -> Result<()> {
        self.insert(product);
        Ok(())
    }

    async fn find_by_ids(&self, product_ids: &[Uuid]) -> Result<Vec<Product>> {
        let products = self.products.read();
        Ok(product_ids
            .iter()
            .filter_map(|id| products.get(id))
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn find_trending(&self, limit: usize) -> Result<Vec<Product>> {
        let products = self.products.read();
        let mut active: Vec<Product> = products.values().filter(|p| p.is_active).cloned().collect();
        active.sort_by(|a, b| {
            b.trending_score()
                .cmp(&a.trending_score())
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        active.truncate(limit);
        Ok(active)
    }

    async fn find_all_active(&self) -> Result<Vec<Product>> {
        let products = self.products.read();
        let mut active: Vec<Product> = products.values().filter(|p| p.is_active).cloned().collect();
        active.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        Ok(active)
    }

    async fn increment_view_count(&self, product_id: Uuid) -> Result<()> {
        if let Some(product) = self.products.write().get_mut(&product_id) {
            product.view_count += 1;
        }
        Ok(())
    }

    async fn increment_purchase_count(&self, product_id: Uuid) -> Result<()> {
        if let Some(product) = self.products.write().get_mut(&product_id) {
            product.purchase_count += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_by_ids_preserves_input_order() {
        let catalog = InMemoryCatalog::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        catalog.insert(Product::new(a, "Linen Shirt", "tops"));
        catalog.insert(Product::new(b, "Denim Jacket", "outerwear"));

        let ordered = catalog.find_by_ids(&[b, a]).await.unwrap();
        assert_eq!(ordered[0].product_id, b);
        assert_eq!(ordered[1].product_id, a);
    }

    #[tokio::test]
    async fn inactive_products_are_dropped() {
        let catalog = InMemoryCatalog::new();
        let id = Uuid::new_v4();
        let mut product = Product::new(id, "Retired Coat", "outerwear");
        product.is_active = false;
        catalog.insert(product);

        assert!(catalog.find_by_ids(&[id]).await.unwrap().is_empty());
        assert!(catalog.find_trending(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn trending_weighs_purchases_over_views() {
        let catalog = InMemoryCatalog::new();
        let viewed = Uuid::new_v4();
        let purchased = Uuid::new_v4();

        let mut popular_views = Product::new(viewed, "Viewed Tee", "tops");
        popular_views.view_count = 9;
        catalog.insert(popular_views);

        let mut one_purchase = Product::new(purchased, "Bought Tee", "tops");
        one_purchase.purchase_count = 1;
        catalog.insert(one_purchase);

        let trending = catalog.find_trending(2).await.unwrap();
        assert_eq!(trending[0].product_id, purchased);
    }
}
