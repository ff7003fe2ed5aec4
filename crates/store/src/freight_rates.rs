//! Freight rate persistence and lookups.
//!
//! Lookups come in three flavors: plain listings (newest first by
//! `updated_at`), latest-card queries per country or airport, and
//! calendar-day queries over an inclusive `[start, end]` window on the
//! effective `date`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use exportdesk_rates::{FreightRate, FreightRateDraft, FreightRateId};

use crate::error::{StoreError, StoreResult, lock_poisoned, map_sqlx_error};

pub enum FreightRateStore {
    InMemory(InMemoryFreightRates),
    Postgres(PostgresFreightRates),
}

impl FreightRateStore {
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryFreightRates::new())
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(PostgresFreightRates::new(pool))
    }

    /// Newest rates first, at most `limit` of them.
    pub async fn list(&self, limit: i64) -> StoreResult<Vec<FreightRate>> {
        match self {
            FreightRateStore::InMemory(store) => store.list(limit),
            FreightRateStore::Postgres(store) => store.list(limit).await,
        }
    }

    pub async fn list_for_country(&self, country: &str) -> StoreResult<Vec<FreightRate>> {
        match self {
            FreightRateStore::InMemory(store) => store.list_for_country(country),
            FreightRateStore::Postgres(store) => store.list_for_country(country).await,
        }
    }

    pub async fn latest_for_country(&self, country: &str) -> StoreResult<Option<FreightRate>> {
        match self {
            FreightRateStore::InMemory(store) => store.latest_for_country(country),
            FreightRateStore::Postgres(store) => store.latest_for_country(country).await,
        }
    }

    /// `airport_code` must already be in the stored (uppercased) form.
    pub async fn latest_for_airport(
        &self,
        country: &str,
        airport_code: &str,
    ) -> StoreResult<Option<FreightRate>> {
        match self {
            FreightRateStore::InMemory(store) => store.latest_for_airport(country, airport_code),
            FreightRateStore::Postgres(store) => {
                store.latest_for_airport(country, airport_code).await
            }
        }
    }

    /// Newest rate whose effective `date` falls within `[start, end]`,
    /// optionally narrowed to one airport.
    pub async fn latest_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        country: &str,
        airport_code: Option<&str>,
    ) -> StoreResult<Option<FreightRate>> {
        match self {
            FreightRateStore::InMemory(store) => {
                store.latest_in_range(start, end, country, airport_code)
            }
            FreightRateStore::Postgres(store) => {
                store.latest_in_range(start, end, country, airport_code).await
            }
        }
    }

    pub async fn insert(&self, draft: FreightRateDraft) -> StoreResult<FreightRate> {
        match self {
            FreightRateStore::InMemory(store) => store.insert(draft),
            FreightRateStore::Postgres(store) => store.insert(draft).await,
        }
    }

    pub async fn update(
        &self,
        id: FreightRateId,
        draft: FreightRateDraft,
    ) -> StoreResult<Option<FreightRate>> {
        match self {
            FreightRateStore::InMemory(store) => store.update(id, draft),
            FreightRateStore::Postgres(store) => store.update(id, draft).await,
        }
    }

    pub async fn delete(&self, id: FreightRateId) -> StoreResult<bool> {
        match self {
            FreightRateStore::InMemory(store) => store.delete(id),
            FreightRateStore::Postgres(store) => store.delete(id).await,
        }
    }
}

pub struct InMemoryFreightRates {
    inner: RwLock<HashMap<i64, FreightRate>>,
    next_id: AtomicI64,
}

impl InMemoryFreightRates {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn collect_sorted(
        &self,
        filter: impl Fn(&FreightRate) -> bool,
    ) -> StoreResult<Vec<FreightRate>> {
        let map = self.inner.read().map_err(|_| lock_poisoned())?;
        let mut rates: Vec<FreightRate> = map.values().filter(|r| filter(r)).cloned().collect();
        // newest first, row id as the tiebreak
        rates.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.as_i64().cmp(&a.id.as_i64()))
        });
        Ok(rates)
    }

    fn list(&self, limit: i64) -> StoreResult<Vec<FreightRate>> {
        let mut rates = self.collect_sorted(|_| true)?;
        rates.truncate(limit.max(0) as usize);
        Ok(rates)
    }

    fn list_for_country(&self, country: &str) -> StoreResult<Vec<FreightRate>> {
        self.collect_sorted(|r| r.country == country)
    }

    fn latest_for_country(&self, country: &str) -> StoreResult<Option<FreightRate>> {
        Ok(self.list_for_country(country)?.into_iter().next())
    }

    fn latest_for_airport(
        &self,
        country: &str,
        airport_code: &str,
    ) -> StoreResult<Option<FreightRate>> {
        Ok(self
            .collect_sorted(|r| r.country == country && r.airport_code == airport_code)?
            .into_iter()
            .next())
    }

    fn latest_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        country: &str,
        airport_code: Option<&str>,
    ) -> StoreResult<Option<FreightRate>> {
        let map = self.inner.read().map_err(|_| lock_poisoned())?;
        let mut matches: Vec<FreightRate> = map
            .values()
            .filter(|r| {
                r.country == country
                    && r.date >= start
                    && r.date <= end
                    && airport_code.is_none_or(|code| r.airport_code == code)
            })
            .cloned()
            .collect();
        // same tie rule as the plain listings: freshest card wins
        matches.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.as_i64().cmp(&a.id.as_i64()))
        });
        Ok(matches.into_iter().next())
    }

    fn insert(&self, draft: FreightRateDraft) -> StoreResult<FreightRate> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let rate = FreightRate {
            id: FreightRateId::from_i64(id),
            country: draft.country,
            airport_code: draft.airport_code,
            airport_name: draft.airport_name,
            rate_45kg: draft.rate_45kg,
            rate_100kg: draft.rate_100kg,
            rate_300kg: draft.rate_300kg,
            rate_500kg: draft.rate_500kg,
            date: draft.date.unwrap_or(now),
            updated_at: now,
        };
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        map.insert(id, rate.clone());
        Ok(rate)
    }

    fn update(
        &self,
        id: FreightRateId,
        draft: FreightRateDraft,
    ) -> StoreResult<Option<FreightRate>> {
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        match map.get_mut(&id.as_i64()) {
            Some(rate) => {
                let now = Utc::now();
                rate.country = draft.country;
                rate.airport_code = draft.airport_code;
                rate.airport_name = draft.airport_name;
                rate.rate_45kg = draft.rate_45kg;
                rate.rate_100kg = draft.rate_100kg;
                rate.rate_300kg = draft.rate_300kg;
                rate.rate_500kg = draft.rate_500kg;
                rate.date = draft.date.unwrap_or(now);
                rate.updated_at = now;
                Ok(Some(rate.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, id: FreightRateId) -> StoreResult<bool> {
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        Ok(map.remove(&id.as_i64()).is_some())
    }
}

impl Default for InMemoryFreightRates {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct PostgresFreightRates {
    pool: Arc<PgPool>,
}

const FREIGHT_COLUMNS: &str = "id, country, airport_code, airport_name, rate_45kg, rate_100kg, \
     rate_300kg, rate_500kg, date, updated_at";

impl PostgresFreightRates {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn fetch_all_rates(
        &self,
        operation: &'static str,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> StoreResult<Vec<FreightRate>> {
        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        let mut rates = Vec::with_capacity(rows.len());
        for row in rows {
            let rate = FreightRateRow::from_row(&row).map_err(|e| {
                StoreError::backend(format!("failed to read freight rate row: {}", e))
            })?;
            rates.push(rate.into());
        }
        Ok(rates)
    }

    async fn fetch_optional_rate(
        &self,
        operation: &'static str,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> StoreResult<Option<FreightRate>> {
        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        match row {
            Some(row) => {
                let rate = FreightRateRow::from_row(&row).map_err(|e| {
                    StoreError::backend(format!("failed to read freight rate row: {}", e))
                })?;
                Ok(Some(rate.into()))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), err)]
    async fn list(&self, limit: i64) -> StoreResult<Vec<FreightRate>> {
        let sql = format!(
            "SELECT {FREIGHT_COLUMNS} FROM freight_rates \
             ORDER BY updated_at DESC, id DESC LIMIT $1"
        );
        self.fetch_all_rates("list_freight_rates", sqlx::query(&sql).bind(limit))
            .await
    }

    #[instrument(skip(self), err)]
    async fn list_for_country(&self, country: &str) -> StoreResult<Vec<FreightRate>> {
        let sql = format!(
            "SELECT {FREIGHT_COLUMNS} FROM freight_rates WHERE country = $1 \
             ORDER BY updated_at DESC, id DESC"
        );
        self.fetch_all_rates(
            "list_freight_rates_for_country",
            sqlx::query(&sql).bind(country),
        )
        .await
    }

    #[instrument(skip(self), err)]
    async fn latest_for_country(&self, country: &str) -> StoreResult<Option<FreightRate>> {
        let sql = format!(
            "SELECT {FREIGHT_COLUMNS} FROM freight_rates WHERE country = $1 \
             ORDER BY updated_at DESC, id DESC LIMIT 1"
        );
        self.fetch_optional_rate("latest_freight_rate", sqlx::query(&sql).bind(country))
            .await
    }

    #[instrument(skip(self), err)]
    async fn latest_for_airport(
        &self,
        country: &str,
        airport_code: &str,
    ) -> StoreResult<Option<FreightRate>> {
        let sql = format!(
            "SELECT {FREIGHT_COLUMNS} FROM freight_rates \
             WHERE country = $1 AND airport_code = $2 \
             ORDER BY updated_at DESC, id DESC LIMIT 1"
        );
        self.fetch_optional_rate(
            "latest_freight_rate_for_airport",
            sqlx::query(&sql).bind(country).bind(airport_code),
        )
        .await
    }

    #[instrument(skip(self), err)]
    async fn latest_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        country: &str,
        airport_code: Option<&str>,
    ) -> StoreResult<Option<FreightRate>> {
        match airport_code {
            Some(code) => {
                let sql = format!(
                    "SELECT {FREIGHT_COLUMNS} FROM freight_rates \
                     WHERE country = $1 AND airport_code = $2 AND date >= $3 AND date <= $4 \
                     ORDER BY updated_at DESC, id DESC LIMIT 1"
                );
                self.fetch_optional_rate(
                    "freight_rate_in_range",
                    sqlx::query(&sql)
                        .bind(country)
                        .bind(code)
                        .bind(start)
                        .bind(end),
                )
                .await
            }
            None => {
                let sql = format!(
                    "SELECT {FREIGHT_COLUMNS} FROM freight_rates \
                     WHERE country = $1 AND date >= $2 AND date <= $3 \
                     ORDER BY updated_at DESC, id DESC LIMIT 1"
                );
                self.fetch_optional_rate(
                    "freight_rate_in_range",
                    sqlx::query(&sql).bind(country).bind(start).bind(end),
                )
                .await
            }
        }
    }

    #[instrument(skip(self, draft), fields(country = %draft.country, airport_code = %draft.airport_code), err)]
    async fn insert(&self, draft: FreightRateDraft) -> StoreResult<FreightRate> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO freight_rates (country, airport_code, airport_name, rate_45kg, \
             rate_100kg, rate_300kg, rate_500kg, date, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {FREIGHT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&draft.country)
            .bind(&draft.airport_code)
            .bind(&draft.airport_name)
            .bind(draft.rate_45kg)
            .bind(draft.rate_100kg)
            .bind(draft.rate_300kg)
            .bind(draft.rate_500kg)
            .bind(draft.date.unwrap_or(now))
            .bind(now)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_freight_rate", e))?;

        let rate = FreightRateRow::from_row(&row)
            .map_err(|e| StoreError::backend(format!("failed to read freight rate row: {}", e)))?;
        Ok(rate.into())
    }

    #[instrument(skip(self, draft), fields(id = %id), err)]
    async fn update(
        &self,
        id: FreightRateId,
        draft: FreightRateDraft,
    ) -> StoreResult<Option<FreightRate>> {
        let now = Utc::now();
        let sql = format!(
            "UPDATE freight_rates SET country = $1, airport_code = $2, airport_name = $3, \
             rate_45kg = $4, rate_100kg = $5, rate_300kg = $6, rate_500kg = $7, date = $8, \
             updated_at = $9 WHERE id = $10 RETURNING {FREIGHT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&draft.country)
            .bind(&draft.airport_code)
            .bind(&draft.airport_name)
            .bind(draft.rate_45kg)
            .bind(draft.rate_100kg)
            .bind(draft.rate_300kg)
            .bind(draft.rate_500kg)
            .bind(draft.date.unwrap_or(now))
            .bind(now)
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_freight_rate", e))?;

        match row {
            Some(row) => {
                let rate = FreightRateRow::from_row(&row).map_err(|e| {
                    StoreError::backend(format!("failed to read freight rate row: {}", e))
                })?;
                Ok(Some(rate.into()))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: FreightRateId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM freight_rates WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_freight_rate", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug)]
struct FreightRateRow {
    id: i64,
    country: String,
    airport_code: String,
    airport_name: String,
    rate_45kg: f64,
    rate_100kg: f64,
    rate_300kg: f64,
    rate_500kg: f64,
    date: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for FreightRateRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(FreightRateRow {
            id: row.try_get("id")?,
            country: row.try_get("country")?,
            airport_code: row.try_get("airport_code")?,
            airport_name: row.try_get("airport_name")?,
            rate_45kg: row.try_get("rate_45kg")?,
            rate_100kg: row.try_get("rate_100kg")?,
            rate_300kg: row.try_get("rate_300kg")?,
            rate_500kg: row.try_get("rate_500kg")?,
            date: row.try_get("date")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<FreightRateRow> for FreightRate {
    fn from(row: FreightRateRow) -> Self {
        FreightRate {
            id: FreightRateId::from_i64(row.id),
            country: row.country,
            airport_code: row.airport_code,
            airport_name: row.airport_name,
            rate_45kg: row.rate_45kg,
            rate_100kg: row.rate_100kg,
            rate_300kg: row.rate_300kg,
            rate_500kg: row.rate_500kg,
            date: row.date,
            updated_at: row.updated_at,
        }
    }
}
