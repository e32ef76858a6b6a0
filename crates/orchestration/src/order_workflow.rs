//! Order creation across the user, catalog and order services.

use std::collections::HashMap;

use common::{CatalogItemId, Money, NewOrder, NewOrderLine, Order, OrderId, OrderStatus, UserId};
use domain::OrderQueries;
use futures_util::future::{join, join_all};
use store::OrderStore;

use crate::clients::{CatalogAuthority, CreateOrderRequest, UserAuthority};
use crate::error::OrderWorkflowError;
use crate::state::WorkflowState;

/// Largest quantity a single line may carry; matches the order line column.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// A request line that passed input validation.
#[derive(Debug, Clone, Copy)]
struct ValidatedLine {
    catalog_item_id: CatalogItemId,
    quantity: u32,
}

/// Creates orders whose references are confirmed by the owning services.
///
/// The user and every distinct catalog item are looked up concurrently on
/// each call. Prices are copied into the order lines at that moment, and the
/// order with all of its lines is written in a single atomic insert. Nothing
/// is persisted unless every reference was confirmed.
///
/// Creation is not idempotent: submitting the same request twice creates two
/// orders.
pub struct OrderWorkflow<S, U, C>
where
    S: OrderStore,
    U: UserAuthority,
    C: CatalogAuthority,
{
    store: S,
    queries: OrderQueries<S>,
    users: U,
    catalog: C,
}

impl<S, U, C> OrderWorkflow<S, U, C>
where
    S: OrderStore + Clone,
    U: UserAuthority,
    C: CatalogAuthority,
{
    pub fn new(store: S, users: U, catalog: C) -> Self {
        let queries = OrderQueries::new(store.clone());
        Self {
            store,
            queries,
            users,
            catalog,
        }
    }

    /// Validates, prices and persists a new order.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id, lines = request.items.len()))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, OrderWorkflowError> {
        metrics::counter!("order_creations_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.run(request).await;

        metrics::histogram!("order_creation_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics::counter!("order_creation_failures_total", "reason" => e.reason())
                .increment(1);
        }
        result
    }

    /// Loads an order with its lines.
    pub async fn get_order(&self, id: OrderId) -> Result<Order, OrderWorkflowError> {
        Ok(self.queries.get_order(id).await?)
    }

    /// Lists every order with its lines.
    pub async fn list_orders(&self) -> Result<Vec<Order>, OrderWorkflowError> {
        Ok(self.queries.list_orders().await?)
    }

    async fn run(&self, request: CreateOrderRequest) -> Result<Order, OrderWorkflowError> {
        let mut state = WorkflowState::Received;

        let lines = match validate_input(&request) {
            Ok(lines) => lines,
            Err(e) => {
                advance(&mut state, WorkflowState::Rejected);
                tracing::info!(error = %e, "order request rejected");
                return Err(e);
            }
        };

        advance(&mut state, WorkflowState::ReferencesValidating);
        let prices = match self.validate_references(request.user_id, &lines).await {
            Ok(prices) => prices,
            Err(e) => {
                advance(&mut state, WorkflowState::ReferencesInvalid);
                tracing::info!(error = %e, kind = %e.kind(), "order references rejected");
                return Err(e);
            }
        };
        let priced = match price_lines(&lines, &prices) {
            Ok(priced) => priced,
            Err(e) => {
                advance(&mut state, WorkflowState::ReferencesInvalid);
                tracing::info!(error = %e, "order total out of range");
                return Err(e);
            }
        };
        advance(&mut state, WorkflowState::ReferencesOk);

        let new_order = NewOrder {
            user_id: request.user_id,
            status: OrderStatus::Pending,
            lines: priced,
        };

        advance(&mut state, WorkflowState::Persisting);
        match self.store.insert_order(new_order).await {
            Ok(order) => {
                advance(&mut state, WorkflowState::Persisted);
                tracing::info!(order_id = %order.id, total = %order.total(), "order created");
                Ok(order)
            }
            Err(e) => {
                advance(&mut state, WorkflowState::PersistFailed);
                Err(OrderWorkflowError::Persist(e))
            }
        }
    }

    /// Confirms the user and every distinct catalog item, returning the
    /// current price of each item.
    async fn validate_references(
        &self,
        user_id: UserId,
        lines: &[ValidatedLine],
    ) -> Result<HashMap<CatalogItemId, Money>, OrderWorkflowError> {
        let mut distinct: Vec<CatalogItemId> = Vec::with_capacity(lines.len());
        for line in lines {
            if !distinct.contains(&line.catalog_item_id) {
                distinct.push(line.catalog_item_id);
            }
        }

        // Every lookup runs to completion even when another one fails.
        let user_lookup = self.users.get_user(user_id);
        let item_lookups = join_all(
            distinct
                .iter()
                .map(|&id| async move { (id, self.catalog.get_item(id).await) }),
        );
        let (user, items) = join(user_lookup, item_lookups).await;

        if let Err(source) = user {
            return Err(OrderWorkflowError::UserRejected { user_id, source });
        }

        let mut prices = HashMap::with_capacity(items.len());
        let mut failures = Vec::new();
        for (id, result) in items {
            match result {
                Ok(item) => {
                    prices.insert(id, item.price);
                }
                Err(e) => failures.push((id, e)),
            }
        }

        if failures.is_empty() {
            Ok(prices)
        } else {
            Err(OrderWorkflowError::ItemsRejected { failures })
        }
    }
}

fn advance(state: &mut WorkflowState, next: WorkflowState) {
    debug_assert!(state.can_advance_to(next), "{state} -> {next}");
    tracing::debug!(from = %state, to = %next, "order workflow transition");
    *state = next;
}

fn validate_input(request: &CreateOrderRequest) -> Result<Vec<ValidatedLine>, OrderWorkflowError> {
    if request.items.is_empty() {
        return Err(OrderWorkflowError::InvalidInput(
            "order must contain at least one item".to_string(),
        ));
    }

    request
        .items
        .iter()
        .map(|item| {
            let id = item.catalog_item_id;
            let quantity = item.quantity.ok_or_else(|| {
                OrderWorkflowError::InvalidInput(format!(
                    "quantity for catalog item {id} is required"
                ))
            })?;
            match u32::try_from(quantity) {
                Ok(q) if (1..=MAX_QUANTITY).contains(&q) => Ok(ValidatedLine {
                    catalog_item_id: id,
                    quantity: q,
                }),
                _ => Err(OrderWorkflowError::InvalidInput(format!(
                    "quantity for catalog item {id} must be between 1 and {MAX_QUANTITY}, got {quantity}"
                ))),
            }
        })
        .collect()
}

/// Snapshots each line's unit price and checks that every line total and
/// the order total fit in a `Money`.
fn price_lines(
    lines: &[ValidatedLine],
    prices: &HashMap<CatalogItemId, Money>,
) -> Result<Vec<NewOrderLine>, OrderWorkflowError> {
    let mut total = Money::zero();
    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let id = line.catalog_item_id;
        let unit_price = prices.get(&id).copied().ok_or_else(|| {
            OrderWorkflowError::InvalidInput(format!("catalog item {id} has no price"))
        })?;
        total = unit_price
            .checked_multiply(line.quantity)
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or_else(|| {
                OrderWorkflowError::InvalidInput(format!(
                    "order total is too large: {} x {unit_price} for catalog item {id}",
                    line.quantity
                ))
            })?;
        priced.push(NewOrderLine {
            catalog_item_id: id,
            quantity: line.quantity,
            unit_price,
        });
    }
    Ok(priced)
}
