//! USD exchange rate history persistence.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use exportdesk_rates::{UsdRate, UsdRateDraft, UsdRateId};

use crate::error::{StoreError, StoreResult, lock_poisoned, map_sqlx_error};

pub enum UsdRateStore {
    InMemory(InMemoryUsdRates),
    Postgres(PostgresUsdRates),
}

impl UsdRateStore {
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryUsdRates::new())
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(PostgresUsdRates::new(pool))
    }

    /// The current rate, i.e. the newest history entry.
    pub async fn latest(&self) -> StoreResult<Option<UsdRate>> {
        match self {
            UsdRateStore::InMemory(store) => store.latest(),
            UsdRateStore::Postgres(store) => store.latest().await,
        }
    }

    /// Newest entries first, at most `limit` of them.
    pub async fn history(&self, limit: i64) -> StoreResult<Vec<UsdRate>> {
        match self {
            UsdRateStore::InMemory(store) => store.history(limit),
            UsdRateStore::Postgres(store) => store.history(limit).await,
        }
    }

    /// Newest entry whose effective `date` falls within `[start, end]`.
    pub async fn latest_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Option<UsdRate>> {
        match self {
            UsdRateStore::InMemory(store) => store.latest_in_range(start, end),
            UsdRateStore::Postgres(store) => store.latest_in_range(start, end).await,
        }
    }

    pub async fn insert(&self, draft: UsdRateDraft) -> StoreResult<UsdRate> {
        match self {
            UsdRateStore::InMemory(store) => store.insert(draft),
            UsdRateStore::Postgres(store) => store.insert(draft).await,
        }
    }

    pub async fn update(&self, id: UsdRateId, draft: UsdRateDraft) -> StoreResult<Option<UsdRate>> {
        match self {
            UsdRateStore::InMemory(store) => store.update(id, draft),
            UsdRateStore::Postgres(store) => store.update(id, draft).await,
        }
    }

    pub async fn delete(&self, id: UsdRateId) -> StoreResult<bool> {
        match self {
            UsdRateStore::InMemory(store) => store.delete(id),
            UsdRateStore::Postgres(store) => store.delete(id).await,
        }
    }
}

pub struct InMemoryUsdRates {
    inner: RwLock<HashMap<i64, UsdRate>>,
    next_id: AtomicI64,
}

impl InMemoryUsdRates {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn sorted(&self) -> StoreResult<Vec<UsdRate>> {
        let map = self.inner.read().map_err(|_| lock_poisoned())?;
        let mut rates: Vec<UsdRate> = map.values().cloned().collect();
        rates.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.id.as_i64().cmp(&a.id.as_i64()))
        });
        Ok(rates)
    }

    fn latest(&self) -> StoreResult<Option<UsdRate>> {
        Ok(self.sorted()?.into_iter().next())
    }

    fn history(&self, limit: i64) -> StoreResult<Vec<UsdRate>> {
        let mut rates = self.sorted()?;
        rates.truncate(limit.max(0) as usize);
        Ok(rates)
    }

    fn latest_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Option<UsdRate>> {
        Ok(self
            .sorted()?
            .into_iter()
            .find(|r| r.date >= start && r.date <= end))
    }

    fn insert(&self, draft: UsdRateDraft) -> StoreResult<UsdRate> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let rate = UsdRate {
            id: UsdRateId::from_i64(id),
            rate: draft.rate,
            date: draft.date.unwrap_or(now),
            updated_at: now,
        };
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        map.insert(id, rate.clone());
        Ok(rate)
    }

    fn update(&self, id: UsdRateId, draft: UsdRateDraft) -> StoreResult<Option<UsdRate>> {
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        match map.get_mut(&id.as_i64()) {
            Some(rate) => {
                let now = Utc::now();
                rate.rate = draft.rate;
                rate.date = draft.date.unwrap_or(now);
                rate.updated_at = now;
                Ok(Some(rate.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, id: UsdRateId) -> StoreResult<bool> {
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        Ok(map.remove(&id.as_i64()).is_some())
    }
}

impl Default for InMemoryUsdRates {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct PostgresUsdRates {
    pool: Arc<PgPool>,
}

impl PostgresUsdRates {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self), err)]
    async fn latest(&self) -> StoreResult<Option<UsdRate>> {
        let row = sqlx::query(
            "SELECT id, rate, date, updated_at FROM usd_rates ORDER BY date DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("latest_usd_rate", e))?;
        row.map(|row| read_row(&row)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn history(&self, limit: i64) -> StoreResult<Vec<UsdRate>> {
        let rows = sqlx::query(
            "SELECT id, rate, date, updated_at FROM usd_rates ORDER BY date DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("usd_rate_history", e))?;
        rows.iter().map(read_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn latest_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Option<UsdRate>> {
        let row = sqlx::query(
            "SELECT id, rate, date, updated_at FROM usd_rates \
             WHERE date >= $1 AND date <= $2 ORDER BY date DESC, id DESC LIMIT 1",
        )
        .bind(start)
        .bind(end)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("usd_rate_in_range", e))?;
        row.map(|row| read_row(&row)).transpose()
    }

    #[instrument(skip(self), fields(rate = draft.rate), err)]
    async fn insert(&self, draft: UsdRateDraft) -> StoreResult<UsdRate> {
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO usd_rates (rate, date, updated_at) VALUES ($1, $2, $3) \
             RETURNING id, rate, date, updated_at",
        )
        .bind(draft.rate)
        .bind(draft.date.unwrap_or(now))
        .bind(now)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_usd_rate", e))?;
        read_row(&row)
    }

    #[instrument(skip(self, draft), fields(id = %id), err)]
    async fn update(&self, id: UsdRateId, draft: UsdRateDraft) -> StoreResult<Option<UsdRate>> {
        let now = Utc::now();
        let row = sqlx::query(
            "UPDATE usd_rates SET rate = $1, date = $2, updated_at = $3 WHERE id = $4 \
             RETURNING id, rate, date, updated_at",
        )
        .bind(draft.rate)
        .bind(draft.date.unwrap_or(now))
        .bind(now)
        .bind(id.as_i64())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_usd_rate", e))?;
        row.map(|row| read_row(&row)).transpose()
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: UsdRateId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM usd_rates WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_usd_rate", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn read_row(row: &sqlx::postgres::PgRow) -> StoreResult<UsdRate> {
    let row = UsdRateRow::from_row(row)
        .map_err(|e| StoreError::backend(format!("failed to read usd rate row: {}", e)))?;
    Ok(row.into())
}

#[derive(Debug)]
struct UsdRateRow {
    id: i64,
    rate: f64,
    date: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for UsdRateRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(UsdRateRow {
            id: row.try_get("id")?,
            rate: row.try_get("rate")?,
            date: row.try_get("date")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<UsdRateRow> for UsdRate {
    fn from(row: UsdRateRow) -> Self {
        UsdRate {
            id: UsdRateId::from_i64(row.id),
            rate: row.rate,
            date: row.date,
            updated_at: row.updated_at,
        }
    }
}
