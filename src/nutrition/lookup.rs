//! Batched food lookup
//!
//! Aggregators gather every food id they need and resolve them here with a
//! single catalog round trip.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::catalog::FoodCatalog;
use crate::error::{NutritionError, NutritionResult};
use crate::models::Food;

/// Foods keyed by id
pub type FoodMap = HashMap<i64, Food>;

/// Run `fut` unless `cancel` fires first
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> NutritionResult<T>
where
    F: Future<Output = NutritionResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(NutritionError::Cancelled),
        result = fut => result,
    }
}

#[derive(Clone, Copy)]
pub struct BatchFoodLookup<'a> {
    catalog: &'a dyn FoodCatalog,
}

impl<'a> BatchFoodLookup<'a> {
    pub fn new(catalog: &'a dyn FoodCatalog) -> Self {
        Self { catalog }
    }

    /// Fetch every id in one call.
    ///
    /// Ids are deduplicated; an empty id set makes no call at all. Fails with
    /// `FoodNotFound` naming the lowest missing id.
    pub async fn fetch(&self, ids: &[i64], cancel: &CancellationToken) -> NutritionResult<FoodMap> {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        if wanted.is_empty() {
            return Ok(FoodMap::new());
        }
        if cancel.is_cancelled() {
            return Err(NutritionError::Cancelled);
        }

        let ids: Vec<i64> = wanted.iter().copied().collect();
        tracing::debug!(count = ids.len(), "batch food lookup");

        let foods = cancellable(cancel, self.catalog.get_by_ids(&ids)).await?;
        let found: FoodMap = foods.into_iter().map(|food| (food.id, food)).collect();

        if let Some(missing) = wanted.iter().find(|id| !found.contains_key(id)) {
            return Err(NutritionError::FoodNotFound(*missing));
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryTag, Nutrition};
    use crate::nutrition::testing::FakeCatalog;

    fn catalog() -> FakeCatalog {
        let mut catalog = FakeCatalog::default();
        catalog.add_food(1, "Chicken", Nutrition::new(165.0, 31.0, 0.0, 3.6, 0.0), CategoryTag::Routine);
        catalog.add_food(2, "Rice", Nutrition::new(130.0, 2.7, 28.0, 0.3, 0.4), CategoryTag::Routine);
        catalog
    }

    #[tokio::test]
    async fn test_dedupes_into_one_call() {
        let catalog = catalog();
        let lookup = BatchFoodLookup::new(&catalog);
        let foods = lookup.fetch(&[2, 1, 2, 1], &CancellationToken::new()).await.unwrap();
        assert_eq!(foods.len(), 2);
        assert_eq!(catalog.batch_calls(), 1);
        assert_eq!(catalog.last_batch(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_set_skips_catalog() {
        let catalog = catalog();
        let foods = BatchFoodLookup::new(&catalog)
            .fetch(&[], &CancellationToken::new())
            .await
            .unwrap();
        assert!(foods.is_empty());
        assert_eq!(catalog.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_food_fails_loudly() {
        let catalog = catalog();
        let err = BatchFoodLookup::new(&catalog)
            .fetch(&[1, 5, 2, 4], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NutritionError::FoodNotFound(4)));
    }

    #[tokio::test]
    async fn test_cancelled_before_lookup() {
        let catalog = catalog();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = BatchFoodLookup::new(&catalog).fetch(&[1], &cancel).await.unwrap_err();
        assert!(matches!(err, NutritionError::Cancelled));
        assert_eq!(catalog.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_slow_catalog() {
        let catalog = catalog().with_delay(std::time::Duration::from_secs(30));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = BatchFoodLookup::new(&catalog).fetch(&[1, 2], &cancel).await.unwrap_err();
        assert!(matches!(err, NutritionError::Cancelled));
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }
}
