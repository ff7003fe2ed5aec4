//! Customer price list persistence.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use exportdesk_catalog::ProductId;
use exportdesk_customers::CustomerId;
use exportdesk_pricing::{CustomerPrice, CustomerPriceDraft, PriceId};

use crate::error::{StoreError, StoreResult, lock_poisoned, map_sqlx_error};

pub enum PriceStore {
    InMemory(InMemoryPrices),
    Postgres(PostgresPrices),
}

impl PriceStore {
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryPrices::new())
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(PostgresPrices::new(pool))
    }

    /// One customer's price list, ordered by product common name.
    pub async fn list_for_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<CustomerPrice>> {
        match self {
            PriceStore::InMemory(store) => store.list_for_customer(customer_id),
            PriceStore::Postgres(store) => store.list_for_customer(customer_id).await,
        }
    }

    pub async fn insert(&self, draft: CustomerPriceDraft) -> StoreResult<CustomerPrice> {
        match self {
            PriceStore::InMemory(store) => store.insert(draft),
            PriceStore::Postgres(store) => store.insert(draft).await,
        }
    }

    pub async fn update(
        &self,
        id: PriceId,
        draft: CustomerPriceDraft,
    ) -> StoreResult<Option<CustomerPrice>> {
        match self {
            PriceStore::InMemory(store) => store.update(id, draft),
            PriceStore::Postgres(store) => store.update(id, draft).await,
        }
    }

    pub async fn delete(&self, id: PriceId) -> StoreResult<bool> {
        match self {
            PriceStore::InMemory(store) => store.delete(id),
            PriceStore::Postgres(store) => store.delete(id).await,
        }
    }
}

pub struct InMemoryPrices {
    inner: RwLock<HashMap<i64, CustomerPrice>>,
    next_id: AtomicI64,
}

impl InMemoryPrices {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn list_for_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<CustomerPrice>> {
        let map = self.inner.read().map_err(|_| lock_poisoned())?;
        let mut prices: Vec<CustomerPrice> = map
            .values()
            .filter(|p| p.customer_id == customer_id)
            .cloned()
            .collect();
        prices.sort_by(|a, b| {
            a.common_name
                .cmp(&b.common_name)
                .then_with(|| a.id.as_i64().cmp(&b.id.as_i64()))
        });
        Ok(prices)
    }

    fn insert(&self, draft: CustomerPriceDraft) -> StoreResult<CustomerPrice> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let price = materialize(PriceId::from_i64(id), draft, Utc::now());
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        map.insert(id, price.clone());
        Ok(price)
    }

    fn update(&self, id: PriceId, draft: CustomerPriceDraft) -> StoreResult<Option<CustomerPrice>> {
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        match map.get_mut(&id.as_i64()) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = materialize(id, draft, created_at);
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, id: PriceId) -> StoreResult<bool> {
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        Ok(map.remove(&id.as_i64()).is_some())
    }
}

impl Default for InMemoryPrices {
    fn default() -> Self {
        Self::new()
    }
}

fn materialize(id: PriceId, draft: CustomerPriceDraft, created_at: DateTime<Utc>) -> CustomerPrice {
    CustomerPrice {
        id,
        customer_id: draft.customer_id,
        product_id: draft.product_id,
        common_name: draft.common_name,
        category: draft.category,
        size_range: draft.size_range,
        purchasing_price: draft.purchasing_price,
        exfactory_price: draft.exfactory_price,
        margin: draft.margin,
        margin_percentage: draft.margin_percentage,
        export_doc: draft.export_doc,
        transport_cost: draft.transport_cost,
        loading_cost: draft.loading_cost,
        airway_cost: draft.airway_cost,
        forward_handling_cost: draft.forward_handling_cost,
        multiplier: draft.multiplier,
        divisor: draft.divisor,
        freight_cost: draft.freight_cost,
        gross_weight_tier: draft.gross_weight_tier,
        fob_price: draft.fob_price,
        cnf: draft.cnf,
        created_at,
    }
}

#[derive(Debug, Clone)]
pub struct PostgresPrices {
    pool: Arc<PgPool>,
}

const PRICE_COLUMNS: &str = "id, customer_id, product_id, common_name, category, size_range, \
     purchasing_price, exfactory_price, margin, margin_percentage, export_doc, transport_cost, \
     loading_cost, airway_cost, forward_handling_cost, multiplier, divisor, freight_cost, \
     gross_weight_tier, fob_price, cnf, created_at";

impl PostgresPrices {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self), fields(customer_id = %customer_id), err)]
    async fn list_for_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<CustomerPrice>> {
        let sql = format!(
            "SELECT {PRICE_COLUMNS} FROM customer_prices WHERE customer_id = $1 \
             ORDER BY common_name ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(customer_id.as_i64())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_customer_prices", e))?;

        let mut prices = Vec::with_capacity(rows.len());
        for row in rows {
            let price = PriceRow::from_row(&row)
                .map_err(|e| StoreError::backend(format!("failed to read price row: {}", e)))?;
            prices.push(price.into());
        }
        Ok(prices)
    }

    #[instrument(skip(self, draft), fields(customer_id = %draft.customer_id), err)]
    async fn insert(&self, draft: CustomerPriceDraft) -> StoreResult<CustomerPrice> {
        let sql = format!(
            "INSERT INTO customer_prices (customer_id, product_id, common_name, category, \
             size_range, purchasing_price, exfactory_price, margin, margin_percentage, \
             export_doc, transport_cost, loading_cost, airway_cost, forward_handling_cost, \
             multiplier, divisor, freight_cost, gross_weight_tier, fob_price, cnf) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20) RETURNING {PRICE_COLUMNS}"
        );
        let row = bind_draft(sqlx::query(&sql), &draft)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_customer_price", e))?;

        let price = PriceRow::from_row(&row)
            .map_err(|e| StoreError::backend(format!("failed to read price row: {}", e)))?;
        Ok(price.into())
    }

    #[instrument(skip(self, draft), fields(id = %id), err)]
    async fn update(
        &self,
        id: PriceId,
        draft: CustomerPriceDraft,
    ) -> StoreResult<Option<CustomerPrice>> {
        let sql = format!(
            "UPDATE customer_prices SET customer_id = $1, product_id = $2, common_name = $3, \
             category = $4, size_range = $5, purchasing_price = $6, exfactory_price = $7, \
             margin = $8, margin_percentage = $9, export_doc = $10, transport_cost = $11, \
             loading_cost = $12, airway_cost = $13, forward_handling_cost = $14, \
             multiplier = $15, divisor = $16, freight_cost = $17, gross_weight_tier = $18, \
             fob_price = $19, cnf = $20 WHERE id = $21 RETURNING {PRICE_COLUMNS}"
        );
        let row = bind_draft(sqlx::query(&sql), &draft)
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_customer_price", e))?;

        match row {
            Some(row) => {
                let price = PriceRow::from_row(&row)
                    .map_err(|e| StoreError::backend(format!("failed to read price row: {}", e)))?;
                Ok(Some(price.into()))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: PriceId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM customer_prices WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_customer_price", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn bind_draft<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    draft: &'q CustomerPriceDraft,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(draft.customer_id.as_i64())
        .bind(draft.product_id.map(|p| p.as_i64()))
        .bind(&draft.common_name)
        .bind(&draft.category)
        .bind(&draft.size_range)
        .bind(draft.purchasing_price)
        .bind(draft.exfactory_price)
        .bind(draft.margin)
        .bind(draft.margin_percentage)
        .bind(draft.export_doc)
        .bind(draft.transport_cost)
        .bind(draft.loading_cost)
        .bind(draft.airway_cost)
        .bind(draft.forward_handling_cost)
        .bind(draft.multiplier)
        .bind(draft.divisor)
        .bind(draft.freight_cost)
        .bind(&draft.gross_weight_tier)
        .bind(draft.fob_price)
        .bind(draft.cnf)
}

#[derive(Debug)]
struct PriceRow {
    id: i64,
    customer_id: i64,
    product_id: Option<i64>,
    common_name: String,
    category: Option<String>,
    size_range: Option<String>,
    purchasing_price: Option<f64>,
    exfactory_price: Option<f64>,
    margin: Option<f64>,
    margin_percentage: Option<f64>,
    export_doc: Option<f64>,
    transport_cost: Option<f64>,
    loading_cost: Option<f64>,
    airway_cost: Option<f64>,
    forward_handling_cost: Option<f64>,
    multiplier: Option<f64>,
    divisor: Option<f64>,
    freight_cost: Option<f64>,
    gross_weight_tier: Option<String>,
    fob_price: Option<f64>,
    cnf: Option<f64>,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for PriceRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(PriceRow {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            product_id: row.try_get("product_id")?,
            common_name: row.try_get("common_name")?,
            category: row.try_get("category")?,
            size_range: row.try_get("size_range")?,
            purchasing_price: row.try_get("purchasing_price")?,
            exfactory_price: row.try_get("exfactory_price")?,
            margin: row.try_get("margin")?,
            margin_percentage: row.try_get("margin_percentage")?,
            export_doc: row.try_get("export_doc")?,
            transport_cost: row.try_get("transport_cost")?,
            loading_cost: row.try_get("loading_cost")?,
            airway_cost: row.try_get("airway_cost")?,
            forward_handling_cost: row.try_get("forward_handling_cost")?,
            multiplier: row.try_get("multiplier")?,
            divisor: row.try_get("divisor")?,
            freight_cost: row.try_get("freight_cost")?,
            gross_weight_tier: row.try_get("gross_weight_tier")?,
            fob_price: row.try_get("fob_price")?,
            cnf: row.try_get("cnf")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<PriceRow> for CustomerPrice {
    fn from(row: PriceRow) -> Self {
        CustomerPrice {
            id: PriceId::from_i64(row.id),
            customer_id: CustomerId::from_i64(row.customer_id),
            product_id: row.product_id.map(ProductId::from_i64),
            common_name: row.common_name,
            category: row.category,
            size_range: row.size_range,
            purchasing_price: row.purchasing_price,
            exfactory_price: row.exfactory_price,
            margin: row.margin,
            margin_percentage: row.margin_percentage,
            export_doc: row.export_doc,
            transport_cost: row.transport_cost,
            loading_cost: row.loading_cost,
            airway_cost: row.airway_cost,
            forward_handling_cost: row.forward_handling_cost,
            multiplier: row.multiplier,
            divisor: row.divisor,
            freight_cost: row.freight_cost,
            gross_weight_tier: row.gross_weight_tier,
            fob_price: row.fob_price,
            cnf: row.cnf,
            created_at: row.created_at,
        }
    }
}
