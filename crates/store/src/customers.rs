//! Customer persistence.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use exportdesk_customers::{Customer, CustomerDraft, CustomerId};

use crate::error::{StoreError, StoreResult, lock_poisoned, map_sqlx_error};

pub enum CustomerStore {
    InMemory(InMemoryCustomers),
    Postgres(PostgresCustomers),
}

impl CustomerStore {
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryCustomers::new())
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(PostgresCustomers::new(pool))
    }

    pub async fn list(&self) -> StoreResult<Vec<Customer>> {
        match self {
            CustomerStore::InMemory(store) => store.list(),
            CustomerStore::Postgres(store) => store.list().await,
        }
    }

    pub async fn get(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        match self {
            CustomerStore::InMemory(store) => store.get(id),
            CustomerStore::Postgres(store) => store.get(id).await,
        }
    }

    pub async fn insert(&self, draft: CustomerDraft) -> StoreResult<Customer> {
        match self {
            CustomerStore::InMemory(store) => store.insert(draft),
            CustomerStore::Postgres(store) => store.insert(draft).await,
        }
    }

    pub async fn update(
        &self,
        id: CustomerId,
        draft: CustomerDraft,
    ) -> StoreResult<Option<Customer>> {
        match self {
            CustomerStore::InMemory(store) => store.update(id, draft),
            CustomerStore::Postgres(store) => store.update(id, draft).await,
        }
    }

    pub async fn delete(&self, id: CustomerId) -> StoreResult<bool> {
        match self {
            CustomerStore::InMemory(store) => store.delete(id),
            CustomerStore::Postgres(store) => store.delete(id).await,
        }
    }
}

pub struct InMemoryCustomers {
    inner: RwLock<HashMap<i64, Customer>>,
    next_id: AtomicI64,
}

impl InMemoryCustomers {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn list(&self) -> StoreResult<Vec<Customer>> {
        let map = self.inner.read().map_err(|_| lock_poisoned())?;
        let mut customers: Vec<Customer> = map.values().cloned().collect();
        customers.sort_by_key(|c| c.id.as_i64());
        Ok(customers)
    }

    fn get(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let map = self.inner.read().map_err(|_| lock_poisoned())?;
        Ok(map.get(&id.as_i64()).cloned())
    }

    fn insert(&self, draft: CustomerDraft) -> StoreResult<Customer> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let customer = Customer {
            id: CustomerId::from_i64(id),
            name: draft.name,
            company_name: draft.company_name,
            phone: draft.phone,
            address: draft.address,
            country: draft.country,
            airport: draft.airport,
            email: draft.email,
            image_url: draft.image_url,
            created_at: Utc::now(),
        };
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        map.insert(id, customer.clone());
        Ok(customer)
    }

    fn update(&self, id: CustomerId, draft: CustomerDraft) -> StoreResult<Option<Customer>> {
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        match map.get_mut(&id.as_i64()) {
            Some(customer) => {
                customer.name = draft.name;
                customer.company_name = draft.company_name;
                customer.phone = draft.phone;
                customer.address = draft.address;
                customer.country = draft.country;
                customer.airport = draft.airport;
                customer.email = draft.email;
                customer.image_url = draft.image_url;
                Ok(Some(customer.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, id: CustomerId) -> StoreResult<bool> {
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        Ok(map.remove(&id.as_i64()).is_some())
    }
}

impl Default for InMemoryCustomers {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct PostgresCustomers {
    pool: Arc<PgPool>,
}

impl PostgresCustomers {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, company_name, phone, address, country, airport, email, image_url, created_at
            FROM customers
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_customers", e))?;

        let mut customers = Vec::with_capacity(rows.len());
        for row in rows {
            let customer = CustomerRow::from_row(&row)
                .map_err(|e| StoreError::backend(format!("failed to read customer row: {}", e)))?;
            customers.push(customer.into());
        }
        Ok(customers)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn get(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, company_name, phone, address, country, airport, email, image_url, created_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_customer", e))?;

        match row {
            Some(row) => {
                let customer = CustomerRow::from_row(&row).map_err(|e| {
                    StoreError::backend(format!("failed to read customer row: {}", e))
                })?;
                Ok(Some(customer.into()))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, draft), fields(name = %draft.name), err)]
    async fn insert(&self, draft: CustomerDraft) -> StoreResult<Customer> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (name, company_name, phone, address, country, airport, email, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, company_name, phone, address, country, airport, email, image_url, created_at
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.company_name)
        .bind(&draft.phone)
        .bind(&draft.address)
        .bind(&draft.country)
        .bind(&draft.airport)
        .bind(&draft.email)
        .bind(&draft.image_url)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_customer", e))?;

        let customer = CustomerRow::from_row(&row)
            .map_err(|e| StoreError::backend(format!("failed to read customer row: {}", e)))?;
        Ok(customer.into())
    }

    #[instrument(skip(self, draft), fields(id = %id), err)]
    async fn update(&self, id: CustomerId, draft: CustomerDraft) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(
            r#"
            UPDATE customers
            SET name = $1,
                company_name = $2,
                phone = $3,
                address = $4,
                country = $5,
                airport = $6,
                email = $7,
                image_url = $8
            WHERE id = $9
            RETURNING id, name, company_name, phone, address, country, airport, email, image_url, created_at
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.company_name)
        .bind(&draft.phone)
        .bind(&draft.address)
        .bind(&draft.country)
        .bind(&draft.airport)
        .bind(&draft.email)
        .bind(&draft.image_url)
        .bind(id.as_i64())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_customer", e))?;

        match row {
            Some(row) => {
                let customer = CustomerRow::from_row(&row).map_err(|e| {
                    StoreError::backend(format!("failed to read customer row: {}", e))
                })?;
                Ok(Some(customer.into()))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: CustomerId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_customer", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug)]
struct CustomerRow {
    id: i64,
    name: String,
    company_name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    country: Option<String>,
    airport: Option<String>,
    email: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for CustomerRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(CustomerRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            company_name: row.try_get("company_name")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            country: row.try_get("country")?,
            airport: row.try_get("airport")?,
            email: row.try_get("email")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: CustomerId::from_i64(row.id),
            name: row.name,
            company_name: row.company_name,
            phone: row.phone,
            address: row.address,
            country: row.country,
            airport: row.airport,
            email: row.email,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}
