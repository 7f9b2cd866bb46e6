use crate::{
    entities::{product, quote_item, quote_request, Product, QuoteItem, QuoteRequest},
    entities::{ProductModel, QuoteItemModel, QuoteRequestModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::{CatalogService, ProductDetail},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub use crate::entities::quote_request::QuoteStatus;

/// Quote workflow: converts selected items plus contact info into a
/// durable, priced quote request with a frozen price snapshot per line.
#[derive(Clone)]
pub struct QuoteService {
    db: Arc<DatabaseConnection>,
    catalog: CatalogService,
    event_sender: EventSender,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuoteRequestInput {
    pub customer_info: CustomerInfo,
    pub items: Vec<QuoteItemInput>,
    pub notes: Option<String>,
}

/// A quote request with its lines, each joined to the referenced product.
#[derive(Debug, Serialize)]
pub struct QuoteDetail {
    #[serde(flatten)]
    pub quote: QuoteRequestModel,
    pub items: Vec<QuoteItemDetail>,
}

#[derive(Debug, Serialize)]
pub struct QuoteItemDetail {
    #[serde(flatten)]
    pub item: QuoteItemModel,
    pub product: ProductDetail,
}

impl QuoteService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        catalog: CatalogService,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            catalog,
            event_sender,
        }
    }

    /// Creates a quote request atomically.
    ///
    /// All referenced products are resolved in one batch restricted to
    /// active rows; if any are missing the whole request fails with a
    /// single NotFound and nothing is persisted. Each line snapshots
    /// `unit_price` from the current product price, so later catalog
    /// price changes never alter an existing quote.
    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn create_quote_request(
        &self,
        input: CreateQuoteRequestInput,
    ) -> Result<QuoteDetail, ServiceError> {
        let product_ids: Vec<Uuid> = input.items.iter().map(|i| i.product_id).collect();

        let products: HashMap<Uuid, ProductModel> = Product::find()
            .filter(product::Column::Id.is_in(product_ids.clone()))
            .filter(product::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        if products.len() != product_ids.len() {
            return Err(ServiceError::NotFound(
                "One or more products not found".to_string(),
            ));
        }

        let mut total_amount = Decimal::ZERO;
        for item in &input.items {
            // Resolved above; the map lookup cannot miss here.
            let product = products.get(&item.product_id).ok_or_else(|| {
                ServiceError::NotFound("One or more products not found".to_string())
            })?;
            total_amount += product.price * Decimal::from(item.quantity);
        }

        let quote_id = Uuid::new_v4();
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let quote = quote_request::ActiveModel {
            id: Set(quote_id),
            email: Set(input.customer_info.email),
            customer_name: Set(input.customer_info.name),
            phone_number: Set(input.customer_info.phone),
            company_name: Set(input.customer_info.company),
            message: Set(input.notes.unwrap_or_default()),
            total_amount: Set(total_amount),
            status: Set(QuoteStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let quote = quote.insert(&txn).await?;

        for item in &input.items {
            let unit_price = products
                .get(&item.product_id)
                .map(|p| p.price)
                .unwrap_or(Decimal::ZERO);
            let line = quote_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                quote_request_id: Set(quote_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(unit_price),
                created_at: Set(now),
            };
            line.insert(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::QuoteRequested {
                quote_id,
                total_items: input.items.len(),
            })
            .await;

        info!("Created quote request {} totaling {}", quote_id, total_amount);
        self.load_detail(quote).await
    }

    /// Fetches a single quote request with items and product joins.
    #[instrument(skip(self))]
    pub async fn get_quote_request(&self, id: Uuid) -> Result<QuoteDetail, ServiceError> {
        let quote = QuoteRequest::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Quote request not found".to_string()))?;
        self.load_detail(quote).await
    }

    /// Lists quote requests newest-first, optionally filtered by email.
    #[instrument(skip(self))]
    pub async fn list_quote_requests(
        &self,
        email: Option<&str>,
    ) -> Result<Vec<QuoteDetail>, ServiceError> {
        let mut select = QuoteRequest::find().order_by_desc(quote_request::Column::CreatedAt);
        if let Some(email) = email {
            select = select.filter(quote_request::Column::Email.eq(email));
        }

        let quotes = select.all(&*self.db).await?;

        let mut details = Vec::with_capacity(quotes.len());
        for quote in quotes {
            details.push(self.load_detail(quote).await?);
        }
        Ok(details)
    }

    /// Overwrites the quote status. No transition table is enforced; any
    /// status may replace any other.
    #[instrument(skip(self))]
    pub async fn update_quote_status(
        &self,
        id: Uuid,
        status: QuoteStatus,
    ) -> Result<QuoteDetail, ServiceError> {
        let quote = QuoteRequest::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Quote request not found".to_string()))?;

        let mut quote: quote_request::ActiveModel = quote.into();
        quote.status = Set(status);
        quote.updated_at = Set(Utc::now());
        let quote = quote.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::QuoteStatusChanged {
                quote_id: id,
                status: format!("{:?}", status),
            })
            .await;

        self.load_detail(quote).await
    }

    /// Attaches lines and their products, active or not; historical
    /// quotes keep referencing products pruned from the catalog.
    async fn load_detail(&self, quote: QuoteRequestModel) -> Result<QuoteDetail, ServiceError> {
        let items = QuoteItem::find()
            .filter(quote_item::Column::QuoteRequestId.eq(quote.id))
            .all(&*self.db)
            .await?;

        let mut details = Vec::with_capacity(items.len());
        for item in items {
            let product = Product::find_by_id(item.product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "quote item {} references missing product",
                        item.id
                    ))
                })?;
            let mut products = self.catalog.attach_refs(vec![product]).await?;
            let product = products.pop().ok_or_else(|| {
                ServiceError::InternalError("product lost its references".to_string())
            })?;
            details.push(QuoteItemDetail { item, product });
        }

        Ok(QuoteDetail {
            quote,
            items: details,
        })
    }
}
