//! Catalog authority service.

use common::{CatalogItem, CatalogItemId, Money, NewCatalogItem};
use store::CatalogStore;

use crate::error::DomainError;

/// Owns catalog items and their current prices.
pub struct CatalogService<S: CatalogStore> {
    store: S,
}

impl<S: CatalogStore> CatalogService<S> {
    /// Creates a new catalog service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a catalog item.
    #[tracing::instrument(skip(self, item), fields(name = %item.name))]
    pub async fn create_item(&self, item: NewCatalogItem) -> Result<CatalogItem, DomainError> {
        if item.name.trim().is_empty() {
            return Err(DomainError::Invalid("name is required".to_string()));
        }
        validate_price(item.price)?;

        let item = self.store.insert_catalog_item(item).await?;

        metrics::counter!("records_created_total", "entity" => "catalog_item").increment(1);
        tracing::info!(item_id = %item.id, price = %item.price, "catalog item created");
        Ok(item)
    }

    /// Loads a catalog item, including its current price.
    #[tracing::instrument(skip(self))]
    pub async fn get_item(&self, id: CatalogItemId) -> Result<CatalogItem, DomainError> {
        Ok(self.store.get_catalog_item(id).await?)
    }

    /// Lists the whole catalog.
    #[tracing::instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<CatalogItem>, DomainError> {
        Ok(self.store.list_catalog_items().await?)
    }

    /// Changes an item's current price. Orders already placed keep the price
    /// they were created with.
    #[tracing::instrument(skip(self))]
    pub async fn update_price(
        &self,
        id: CatalogItemId,
        price: Money,
    ) -> Result<CatalogItem, DomainError> {
        validate_price(price)?;
        let item = self.store.update_catalog_item_price(id, price).await?;
        tracing::info!(item_id = %id, price = %price, "catalog price updated");
        Ok(item)
    }
}

/// Highest accepted unit price. Any order line quantity (at most `i32::MAX`)
/// times this price still fits in a `Money`.
pub const MAX_PRICE: Money = Money::from_cents(i64::MAX / i32::MAX as i64);

fn validate_price(price: Money) -> Result<(), DomainError> {
    if price.is_negative() {
        return Err(DomainError::Invalid(format!(
            "price must not be negative: {price}"
        )));
    }
    if price > MAX_PRICE {
        return Err(DomainError::Invalid(format!(
            "price must not exceed {MAX_PRICE}: {price}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use store::InMemoryStore;

    use super::*;

    fn coffee() -> NewCatalogItem {
        NewCatalogItem {
            name: "Coffee".to_string(),
            description: "Filter coffee".to_string(),
            price: Money::from_cents(250),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_item() {
        let service = CatalogService::new(InMemoryStore::new());

        let item = service.create_item(coffee()).await.unwrap();
        assert_eq!(item.price, Money::from_cents(250));

        let fetched = service.get_item(item.id).await.unwrap();
        assert_eq!(fetched, item);
    }

    #[tokio::test]
    async fn test_zero_price_is_allowed() {
        let service = CatalogService::new(InMemoryStore::new());
        let item = service
            .create_item(NewCatalogItem {
                price: Money::zero(),
                ..coffee()
            })
            .await
            .unwrap();
        assert_eq!(item.price, Money::zero());
    }

    #[tokio::test]
    async fn test_negative_price_is_rejected() {
        let service = CatalogService::new(InMemoryStore::new());
        let err = service
            .create_item(NewCatalogItem {
                price: Money::from_cents(-1),
                ..coffee()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Invalid(_)));
        assert!(service.list_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_huge_price_is_rejected() {
        let service = CatalogService::new(InMemoryStore::new());
        let err = service
            .create_item(NewCatalogItem {
                price: Money::from_cents(i64::MAX / 2),
                ..coffee()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Invalid(_)));
        assert!(service.list_items().await.unwrap().is_empty());

        let item = service
            .create_item(NewCatalogItem {
                price: MAX_PRICE,
                ..coffee()
            })
            .await
            .unwrap();
        assert!(MAX_PRICE.checked_multiply(i32::MAX as u32).is_some());

        let err = service
            .update_price(item.id, Money::from_cents(MAX_PRICE.cents() + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Invalid(_)));
        assert_eq!(service.get_item(item.id).await.unwrap().price, MAX_PRICE);
    }

    #[tokio::test]
    async fn test_update_price() {
        let service = CatalogService::new(InMemoryStore::new());
        let item = service.create_item(coffee()).await.unwrap();

        let updated = service
            .update_price(item.id, Money::from_cents(300))
            .await
            .unwrap();
        assert_eq!(updated.price, Money::from_cents(300));

        let err = service
            .update_price(CatalogItemId::new(42), Money::from_cents(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_twice_gives_two_items() {
        let service = CatalogService::new(InMemoryStore::new());
        let a = service.create_item(coffee()).await.unwrap();
        let b = service.create_item(coffee()).await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
