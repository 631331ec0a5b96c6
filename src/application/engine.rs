use super::config::TransferConfig;
use crate::domain::basket::{Basket, BasketId};
use crate::domain::freeze::Freezable;
use crate::domain::item::ProductId;
use crate::domain::payload::RequestParameters;
use crate::domain::ports::{
    BasketStoreBox, Gateway, GatewayAction, GatewayRequest, GatewayResponse, ProductCatalogBox,
};
use crate::error::{Result, TransferError};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Terminal response type produced by gateway `G`.
pub type ResponseOf<G> = <<G as Gateway>::Request as GatewayRequest>::Response;

/// Drives baskets through freeze, gateway submission and persistence.
///
/// One transfer per basket runs at a time: `freeze` and `execute` hold a
/// per-basket lock for their whole duration, and `execute` re-reads the stored
/// copy so a stale basket can never be submitted twice.
pub struct TransferEngine {
    store: BasketStoreBox,
    catalog: ProductCatalogBox,
    config: TransferConfig,
    locks: Mutex<HashMap<BasketId, Arc<Mutex<()>>>>,
}

impl TransferEngine {
    /// Creates a new `TransferEngine` with the default configuration.
    ///
    /// # Arguments
    ///
    /// * `store` - Where baskets and their items are persisted.
    /// * `catalog` - Where unit prices are resolved when a basket is frozen.
    pub fn new(store: BasketStoreBox, catalog: ProductCatalogBox) -> Self {
        Self::with_config(store, catalog, TransferConfig::default())
    }

    pub fn with_config(
        store: BasketStoreBox,
        catalog: ProductCatalogBox,
        config: TransferConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// An empty basket in the configured default currency.
    pub fn new_basket(&self, id: BasketId) -> Basket {
        Basket::new(id, self.config.default_currency)
    }

    pub async fn load(&self, id: BasketId) -> Result<Basket> {
        self.store.load(id).await?.ok_or(TransferError::NotFound(id))
    }

    /// Persists the basket and adopts the version assigned by the store.
    pub async fn save(&self, basket: &mut Basket) -> Result<()> {
        let version = self.store.save(basket).await?;
        basket.set_version(version);
        debug!(basket = %basket.id(), version, "basket saved");
        Ok(())
    }

    pub async fn delete(&self, id: BasketId) -> Result<()> {
        self.store.soft_delete(id).await?;
        info!(basket = %id, "basket soft-deleted");
        Ok(())
    }

    /// Freezes the basket against current catalog prices and persists it.
    ///
    /// The basket and its items are written in one save; if pricing or the
    /// save fails, `basket` is left exactly as it was. Returns `false` when
    /// the basket was already frozen.
    pub async fn freeze(&self, basket: &mut Basket) -> Result<bool> {
        let id = basket.id();
        let lock = self.lock_for(id).await;
        let guard = lock.lock().await;
        let result = self.freeze_locked(basket).await;
        drop(guard);
        self.release(id, lock).await;
        result
    }

    async fn freeze_locked(&self, basket: &mut Basket) -> Result<bool> {
        if basket.is_frozen() {
            debug!(basket = %basket.id(), "basket already frozen");
            return Ok(false);
        }

        let products: Vec<ProductId> = basket.items().iter().map(|item| item.product_id()).collect();
        let prices = self.catalog.price_list(&products).await?;

        let mut frozen = basket.clone();
        frozen.freeze(&prices)?;
        self.save(&mut frozen).await?;

        *basket = frozen;
        info!(basket = %basket.id(), "basket frozen and saved");
        Ok(true)
    }

    /// Sends `request` until the gateway stops redirecting.
    ///
    /// Every response updates the basket's response data; only the terminal
    /// one sets the outcome and completion time. The loop gives up after
    /// `max_redirects` redirects or once `redirect_timeout` has elapsed.
    /// Transport errors are returned as-is, with the basket keeping whatever
    /// was recorded before the failing send.
    pub async fn send_request<R: GatewayRequest>(
        &self,
        basket: &mut Basket,
        request: &R,
    ) -> Result<R::Response> {
        let started = Instant::now();
        // A timeout too large to add to `started` leaves the loop unbounded in time.
        let deadline = started.checked_add(self.config.redirect_timeout);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let response = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        warn!(basket = %basket.id(), attempts, "gateway redirect budget exhausted");
                        return Err(TransferError::RedirectTimeout {
                            elapsed: now - started,
                        });
                    }
                    tokio::time::timeout(deadline - now, request.send())
                        .await
                        .map_err(|_| TransferError::RedirectTimeout {
                            elapsed: started.elapsed(),
                        })??
                }
                None => request.send().await?,
            };

            if !response.is_redirect() {
                let successful = response.is_successful();
                basket.record_terminal(response.data(), successful, Utc::now())?;
                info!(basket = %basket.id(), attempts, successful, "gateway response recorded");
                return Ok(response);
            }

            basket.record_redirect(response.data())?;
            debug!(basket = %basket.id(), attempt = attempts, "gateway redirect");

            if attempts > self.config.max_redirects {
                warn!(
                    basket = %basket.id(),
                    attempts,
                    "gateway still redirecting, giving up"
                );
                return Err(TransferError::RedirectLimitExceeded { attempts });
            }
            if !self.config.poll_interval.is_zero() {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }
    }

    /// Submits a frozen basket to `gateway` and persists the outcome once.
    ///
    /// Validation runs before any gateway call and again before saving; a
    /// failure at either point leaves storage untouched.
    pub async fn execute<G: Gateway>(
        &self,
        basket: &mut Basket,
        gateway: &G,
        action: GatewayAction,
        extra: RequestParameters,
    ) -> Result<ResponseOf<G>> {
        let id = basket.id();
        let lock = self.lock_for(id).await;
        let guard = lock.lock().await;
        let result = self.execute_locked(basket, gateway, action, extra).await;
        drop(guard);
        self.release(id, lock).await;
        result
    }

    async fn execute_locked<G: Gateway>(
        &self,
        basket: &mut Basket,
        gateway: &G,
        action: GatewayAction,
        extra: RequestParameters,
    ) -> Result<ResponseOf<G>> {
        self.ensure_unsent(basket).await?;
        basket.assert_valid()?;

        let params = basket.request_parameters(extra)?;
        debug!(
            basket = %basket.id(),
            gateway = gateway.name(),
            %action,
            "building gateway request"
        );
        let request = gateway.request(&action, params).await?;

        let response = self.send_request(basket, &request).await?;

        basket.assert_valid()?;
        self.save(basket).await?;
        Ok(response)
    }

    pub async fn purchase<G: Gateway>(
        &self,
        basket: &mut Basket,
        gateway: &G,
        extra: RequestParameters,
    ) -> Result<ResponseOf<G>> {
        self.execute(basket, gateway, GatewayAction::Purchase, extra)
            .await
    }

    pub async fn authorize<G: Gateway>(
        &self,
        basket: &mut Basket,
        gateway: &G,
        extra: RequestParameters,
    ) -> Result<ResponseOf<G>> {
        self.execute(basket, gateway, GatewayAction::Authorize, extra)
            .await
    }

    /// Rejects baskets that were already sent, here or in storage.
    async fn ensure_unsent(&self, basket: &Basket) -> Result<()> {
        if basket.is_sent() {
            return Err(TransferError::Validation(format!(
                "Basket {} has already been sent",
                basket.id()
            )));
        }
        if let Some(stored) = self.store.load_with_deleted(basket.id()).await? {
            if stored.version() != basket.version() {
                return Err(TransferError::ConcurrentModification {
                    id: basket.id(),
                    expected: basket.version(),
                    found: stored.version(),
                });
            }
            if stored.is_sent() {
                return Err(TransferError::Validation(format!(
                    "Basket {} has already been sent",
                    basket.id()
                )));
            }
        }
        Ok(())
    }

    async fn lock_for(&self, id: BasketId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        // Entries left behind by cancelled calls are only referenced by the map.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(id).or_default().clone()
    }

    /// Drops the per-basket lock once no other call is holding or waiting on it.
    async fn release(&self, id: BasketId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&id);
        }
    }

    #[cfg(test)]
    async fn tracked_locks(&self) -> usize {
        self.locks.lock().await.len()
    }
}
