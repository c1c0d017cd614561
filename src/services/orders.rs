use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{order, order_item, product};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::order_status::{
    label_for_payment_status, label_for_status, progress_index, tier_for_payment_status,
    tier_for_status, DisplayTier, OrderStatus, PaymentStatus,
};
use crate::money::{BreakdownLine, CurrencyFormat, OrderTotals};

const ORDER_NUMBER_SUFFIX_LEN: usize = 6;
const ORDER_NUMBER_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// One requested line of a checkout.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOrderItemInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 999))]
    pub quantity: i32,
}

/// Shipping destination captured verbatim onto the order row.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ShippingDetails {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    pub state: Option<String>,
    pub zip: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOrderInput {
    #[validate]
    pub items: Vec<CreateOrderItemInput>,
    #[validate]
    pub shipping: ShippingDetails,
    /// Shipping cost, tax and discount applied by the checkout pipeline.
    /// Absent values count as zero; the order total is always derived here.
    pub shipping_cost: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub discount: Option<Decimal>,
}

/// Admin mutation of an order. Axes not present are left untouched.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateOrderStatusInput {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub admin_notes: Option<String>,
    /// When set, the update is rejected with a conflict unless the stored
    /// row still carries this version.
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub formatted_subtotal: String,
}

/// Read model of an order: the stored row plus display-ready status labels,
/// progress position and the formatted pricing breakdown.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub status_label: String,
    pub status_tier: DisplayTier,
    pub payment_status: String,
    pub payment_status_label: String,
    pub payment_status_tier: DisplayTier,
    /// `None` for cancelled, refunded or unrecognized statuses; the client
    /// renders no progress tracker in that case.
    pub progress_index: Option<usize>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub formatted_total: String,
    pub breakdown: Vec<BreakdownLine>,
    pub shipping_name: String,
    pub shipping_phone: Option<String>,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: Option<String>,
    pub shipping_zip: Option<String>,
    pub shipping_country: String,
    pub admin_notes: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct OrderService {
    db: DbPool,
    event_sender: EventSender,
    currency: CurrencyFormat,
}

impl OrderService {
    pub fn new(db: DbPool, event_sender: EventSender, currency: CurrencyFormat) -> Self {
        Self {
            db,
            event_sender,
            currency,
        }
    }

    /// Checkout. Resolves each product from the live catalog, snapshots
    /// name/sku/price onto item rows, derives the monetary rollup and
    /// persists order plus items in one transaction. New orders start as
    /// `pending` / `unpaid`.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        input: CreateOrderInput,
    ) -> Result<OrderResponse, ServiceError> {
        input.validate()?;
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".into(),
            ));
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let order_id = Uuid::new_v4();
        let mut items_subtotal = Decimal::ZERO;
        let mut item_models = Vec::with_capacity(input.items.len());

        for line in &input.items {
            let product = product::Entity::find_by_id(line.product_id)
                .filter(product::Column::IsActive.eq(true))
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Product {} is not available",
                        line.product_id
                    ))
                })?;

            let line_subtotal = product.price * Decimal::from(line.quantity);
            items_subtotal += line_subtotal;

            item_models.push(order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(Some(product.id)),
                name: Set(product.name),
                sku: Set(product.sku),
                price: Set(product.price),
                quantity: Set(line.quantity),
                subtotal: Set(line_subtotal),
                created_at: Set(Utc::now()),
            });
        }

        let totals =
            OrderTotals::compute(items_subtotal, input.shipping_cost, input.tax, input.discount);
        let shipping = input.shipping;

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number()),
            user_id: Set(user_id),
            status: Set(OrderStatus::Pending.to_string()),
            payment_status: Set(PaymentStatus::Unpaid.to_string()),
            subtotal: Set(totals.subtotal),
            shipping_cost: Set(totals.shipping_cost),
            tax: Set(totals.tax),
            discount: Set(totals.discount),
            total: Set(totals.total),
            currency: Set(self.currency.code.clone()),
            shipping_name: Set(shipping.name),
            shipping_phone: Set(shipping.phone),
            shipping_address: Set(shipping.address),
            shipping_city: Set(shipping.city),
            shipping_state: Set(shipping.state),
            shipping_zip: Set(shipping.zip),
            shipping_country: Set(shipping.country),
            admin_notes: Set(None),
            version: Set(1),
            ..Default::default()
        };

        let saved = order_model.insert(&txn).await?;
        let mut saved_items = Vec::with_capacity(item_models.len());
        for item in item_models {
            saved_items.push(item.insert(&txn).await?);
        }

        txn.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %saved.id, order_number = %saved.order_number, "order created");

        if let Err(e) = self.event_sender.send(Event::OrderCreated(saved.id)).await {
            warn!("Failed to send order created event: {}", e);
        }

        Ok(self.to_response(saved, saved_items))
    }

    /// Fetch one order as its owner. The ownership condition lives in the
    /// query itself, so an order belonging to someone else is
    /// indistinguishable from one that does not exist.
    #[instrument(skip(self))]
    pub async fn get_order_for_user(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let found = order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = self.load_items(found.id).await?;
        Ok(self.to_response(found, items))
    }

    /// All orders belonging to a user, most recent first.
    #[instrument(skip(self))]
    pub async fn list_orders_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let rows = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut responses = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.load_items(row.id).await?;
            responses.push(self.to_response(row, items));
        }
        Ok(responses)
    }

    /// Admin read: one order regardless of owner.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let found = order::Entity::find_by_id(order_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = self.load_items(found.id).await?;
        Ok(self.to_response(found, items))
    }

    /// Admin read: paginated order list, optionally filtered by status.
    /// Returns the page plus the total row count.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        limit: u64,
        status: Option<String>,
    ) -> Result<(Vec<OrderResponse>, u64), ServiceError> {
        let mut query = order::Entity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query.paginate(&self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut responses = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.load_items(row.id).await?;
            responses.push(self.to_response(row, items));
        }
        Ok((responses, total))
    }

    /// Admin mutation. Both status axes are validated against their
    /// transition tables before anything is written; admin notes are stored
    /// verbatim. Every successful update bumps the row version.
    #[instrument(skip(self, input))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        input: UpdateOrderStatusInput,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let current = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if let Some(expected) = input.expected_version {
            if expected != current.version {
                return Err(ServiceError::Conflict(format!(
                    "Order was modified by someone else (version {} expected, {} stored)",
                    expected, current.version
                )));
            }
        }

        let old_status = current.status.clone();
        let old_payment_status = current.payment_status.clone();
        let current_version = current.version;

        let new_status = match &input.status {
            Some(raw) => Some(validate_status_transition(&old_status, raw)?),
            None => None,
        };
        let new_payment_status = match &input.payment_status {
            Some(raw) => Some(validate_payment_transition(&old_payment_status, raw)?),
            None => None,
        };

        let mut active: order::ActiveModel = current.into();
        if let Some(status) = new_status {
            active.status = Set(status.to_string());
        }
        if let Some(payment_status) = new_payment_status {
            active.payment_status = Set(payment_status.to_string());
        }
        if let Some(notes) = input.admin_notes {
            active.admin_notes = Set(Some(notes));
        }
        active.version = Set(current_version + 1);
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        if updated.status != old_status {
            info!(order_id = %updated.id, from = %old_status, to = %updated.status, "order status updated");
            let event = Event::OrderStatusChanged {
                order_id: updated.id,
                old_status,
                new_status: updated.status.clone(),
            };
            if let Err(e) = self.event_sender.send(event).await {
                warn!("Failed to send order status event: {}", e);
            }
        }
        if updated.payment_status != old_payment_status {
            let event = Event::PaymentStatusChanged {
                order_id: updated.id,
                old_status: old_payment_status,
                new_status: updated.payment_status.clone(),
            };
            if let Err(e) = self.event_sender.send(event).await {
                warn!("Failed to send payment status event: {}", e);
            }
        }

        let items = self.load_items(updated.id).await?;
        Ok(self.to_response(updated, items))
    }

    async fn load_items(&self, order_id: Uuid) -> Result<Vec<order_item::Model>, ServiceError> {
        Ok(order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&self.db)
            .await?)
    }

    fn to_response(&self, model: order::Model, items: Vec<order_item::Model>) -> OrderResponse {
        let totals = OrderTotals {
            subtotal: model.subtotal,
            shipping_cost: model.shipping_cost,
            tax: model.tax,
            discount: model.discount,
            // Stored totals are displayed as-is, never recomputed.
            total: model.total,
        };

        let items = items
            .into_iter()
            .map(|item| OrderItemResponse {
                id: item.id,
                product_id: item.product_id,
                name: item.name,
                sku: item.sku,
                formatted_subtotal: self.currency.format(item.subtotal),
                price: item.price,
                quantity: item.quantity,
                subtotal: item.subtotal,
            })
            .collect();

        OrderResponse {
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            status_label: label_for_status(&model.status),
            status_tier: tier_for_status(&model.status),
            payment_status_label: label_for_payment_status(&model.payment_status),
            payment_status_tier: tier_for_payment_status(&model.payment_status),
            progress_index: progress_index(&model.status),
            status: model.status,
            payment_status: model.payment_status,
            subtotal: model.subtotal,
            shipping_cost: model.shipping_cost,
            tax: model.tax,
            discount: model.discount,
            total: model.total,
            currency: model.currency,
            formatted_total: self.currency.format(totals.total),
            breakdown: self.currency.breakdown(&totals),
            shipping_name: model.shipping_name,
            shipping_phone: model.shipping_phone,
            shipping_address: model.shipping_address,
            shipping_city: model.shipping_city,
            shipping_state: model.shipping_state,
            shipping_zip: model.shipping_zip,
            shipping_country: model.shipping_country,
            admin_notes: model.admin_notes,
            items,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn validate_status_transition(current: &str, requested: &str) -> Result<OrderStatus, ServiceError> {
    let from = OrderStatus::from_str(current)
        .map_err(|_| ServiceError::InvalidStatus(format!("Unknown order status '{}'", current)))?;
    let to = OrderStatus::from_str(requested).map_err(|_| {
        ServiceError::InvalidStatus(format!("Unknown order status '{}'", requested))
    })?;
    if !from.can_transition_to(to) {
        return Err(ServiceError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(to)
}

fn validate_payment_transition(
    current: &str,
    requested: &str,
) -> Result<PaymentStatus, ServiceError> {
    let from = PaymentStatus::from_str(current).map_err(|_| {
        ServiceError::InvalidStatus(format!("Unknown payment status '{}'", current))
    })?;
    let to = PaymentStatus::from_str(requested).map_err(|_| {
        ServiceError::InvalidStatus(format!("Unknown payment status '{}'", requested))
    })?;
    if !from.can_transition_to(to) {
        return Err(ServiceError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(to)
}

/// Human-facing order number: `ORD-YYYYMMDD-` plus six characters from an
/// alphabet without the lookalikes 0/O/1/I.
fn generate_order_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ORDER_NUMBER_CHARSET.len());
            ORDER_NUMBER_CHARSET[idx] as char
        })
        .collect();
    format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_number_has_expected_shape() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), ORDER_NUMBER_SUFFIX_LEN);
        assert!(!parts[2].contains('0') && !parts[2].contains('O'));
    }

    #[test]
    fn transition_validation_rejects_jumps() {
        assert!(validate_status_transition("pending", "processing").is_ok());
        assert!(matches!(
            validate_status_transition("pending", "delivered"),
            Err(ServiceError::InvalidTransition { .. })
        ));
        assert!(matches!(
            validate_status_transition("delivered", "pending"),
            Err(ServiceError::InvalidTransition { .. })
        ));
        assert!(matches!(
            validate_status_transition("pending", "lost-in-transit"),
            Err(ServiceError::InvalidStatus(_))
        ));
    }

    #[test]
    fn same_status_transition_is_accepted() {
        assert_eq!(
            validate_status_transition("shipped", "shipped").unwrap(),
            OrderStatus::Shipped
        );
        assert_eq!(
            validate_payment_transition("paid", "paid").unwrap(),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn response_reflects_stored_totals_verbatim() {
        let service = OrderService {
            db: DbPool::Disconnected,
            event_sender: EventSender::new(tokio::sync::mpsc::channel(1).0),
            currency: CurrencyFormat::default(),
        };
        // Deliberately inconsistent stored rollup: displayed as-is.
        let model = order::Model {
            id: Uuid::new_v4(),
            order_number: "ORD-20260829-ABCDEF".into(),
            user_id: Uuid::new_v4(),
            status: "shipped".into(),
            payment_status: "paid".into(),
            subtotal: dec!(100000),
            shipping_cost: dec!(10000),
            tax: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: dec!(999999),
            currency: "IDR".into(),
            shipping_name: "Budi".into(),
            shipping_phone: None,
            shipping_address: "Jl. Sudirman 1".into(),
            shipping_city: "Jakarta".into(),
            shipping_state: None,
            shipping_zip: None,
            shipping_country: "ID".into(),
            admin_notes: None,
            created_at: Utc::now(),
            updated_at: None,
            version: 1,
        };

        let response = service.to_response(model, vec![]);
        assert_eq!(response.total, dec!(999999));
        assert_eq!(response.formatted_total, "Rp 999.999");
        assert_eq!(response.progress_index, Some(2));
        assert_eq!(response.status_label, "Shipped");
    }
}
