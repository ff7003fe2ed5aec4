//! Product persistence.
//!
//! A product row carries its variant sequence as one JSONB document field
//! plus a `version` counter. Every variant mutation is read-modify-write:
//! load the sequence and the version, transform in memory, then write the
//! whole sequence back only if the version is still the one read. A lost
//! race surfaces as [`StoreError::Conflict`]; there is no retry here.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Row};
use std::sync::Arc;
use tracing::instrument;

use exportdesk_catalog::{Product, ProductDraft, ProductId, Variant, VariantSet};

use crate::error::{StoreError, StoreResult, lock_poisoned, map_sqlx_error};

/// Product store, dispatching to the configured backend.
pub enum ProductStore {
    InMemory(InMemoryProducts),
    Postgres(PostgresProducts),
}

impl ProductStore {
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryProducts::new())
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(PostgresProducts::new(pool))
    }

    /// All products, ordered by common name.
    pub async fn list(&self) -> StoreResult<Vec<Product>> {
        match self {
            ProductStore::InMemory(store) => store.list(),
            ProductStore::Postgres(store) => store.list().await,
        }
    }

    pub async fn get(&self, id: ProductId) -> StoreResult<Option<Product>> {
        match self {
            ProductStore::InMemory(store) => store.get(id),
            ProductStore::Postgres(store) => store.get(id).await,
        }
    }

    pub async fn insert(&self, draft: ProductDraft) -> StoreResult<Product> {
        match self {
            ProductStore::InMemory(store) => store.insert(draft),
            ProductStore::Postgres(store) => store.insert(draft).await,
        }
    }

    /// Full-document overwrite, variants included. Returns `None` when the
    /// product does not exist.
    pub async fn update(&self, id: ProductId, draft: ProductDraft) -> StoreResult<Option<Product>> {
        match self {
            ProductStore::InMemory(store) => store.update(id, draft),
            ProductStore::Postgres(store) => store.update(id, draft).await,
        }
    }

    /// Returns whether a row was actually deleted.
    pub async fn delete(&self, id: ProductId) -> StoreResult<bool> {
        match self {
            ProductStore::InMemory(store) => store.delete(id),
            ProductStore::Postgres(store) => store.delete(id).await,
        }
    }

    /// Run a transform over the product's variant sequence under the
    /// optimistic concurrency protocol. Transforms that leave the set clean
    /// skip the write-back (and the version bump) entirely.
    pub async fn mutate_variants<R>(
        &self,
        id: ProductId,
        f: impl FnOnce(&mut VariantSet) -> R,
    ) -> StoreResult<R> {
        match self {
            ProductStore::InMemory(store) => store.mutate_variants(id, f),
            ProductStore::Postgres(store) => store.mutate_variants(id, f).await,
        }
    }
}

struct StoredProduct {
    product: Product,
    version: i64,
}

/// In-memory backend (tests and database-less dev runs).
pub struct InMemoryProducts {
    inner: RwLock<HashMap<i64, StoredProduct>>,
    next_id: AtomicI64,
}

impl InMemoryProducts {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn list(&self) -> StoreResult<Vec<Product>> {
        let map = self.inner.read().map_err(|_| lock_poisoned())?;
        let mut products: Vec<Product> = map.values().map(|s| s.product.clone()).collect();
        products.sort_by(|a, b| {
            a.common_name
                .cmp(&b.common_name)
                .then_with(|| a.id.as_i64().cmp(&b.id.as_i64()))
        });
        Ok(products)
    }

    fn get(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let map = self.inner.read().map_err(|_| lock_poisoned())?;
        Ok(map.get(&id.as_i64()).map(|s| s.product.clone()))
    }

    fn insert(&self, draft: ProductDraft) -> StoreResult<Product> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let product = Product {
            id: ProductId::from_i64(id),
            common_name: draft.common_name,
            scientific_name: draft.scientific_name,
            category: draft.category,
            image_url: draft.image_url,
            variants: draft.variants,
            created_at: Utc::now(),
        };
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        map.insert(
            id,
            StoredProduct {
                product: product.clone(),
                version: 1,
            },
        );
        Ok(product)
    }

    fn update(&self, id: ProductId, draft: ProductDraft) -> StoreResult<Option<Product>> {
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        match map.get_mut(&id.as_i64()) {
            Some(stored) => {
                stored.product.common_name = draft.common_name;
                stored.product.scientific_name = draft.scientific_name;
                stored.product.category = draft.category;
                stored.product.image_url = draft.image_url;
                stored.product.variants = draft.variants;
                stored.version += 1;
                Ok(Some(stored.product.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, id: ProductId) -> StoreResult<bool> {
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        Ok(map.remove(&id.as_i64()).is_some())
    }

    fn mutate_variants<R>(
        &self,
        id: ProductId,
        f: impl FnOnce(&mut VariantSet) -> R,
    ) -> StoreResult<R> {
        // snapshot the sequence and its version under the read lock
        let (mut set, seen_version) = {
            let map = self.inner.read().map_err(|_| lock_poisoned())?;
            match map.get(&id.as_i64()) {
                Some(stored) => (
                    VariantSet::new(stored.product.variants.clone()),
                    stored.version,
                ),
                None => return Err(StoreError::NotFound),
            }
        };

        // transform with no lock held (mirrors the Postgres protocol)
        let out = f(&mut set);
        if !set.is_dirty() {
            return Ok(out);
        }

        // version-checked commit
        let mut map = self.inner.write().map_err(|_| lock_poisoned())?;
        match map.get_mut(&id.as_i64()) {
            Some(stored) => {
                if stored.version != seen_version {
                    return Err(StoreError::conflict(format!(
                        "product {} modified concurrently (version {} -> {})",
                        id, seen_version, stored.version
                    )));
                }
                stored.product.variants = set.into_entries();
                stored.version += 1;
                Ok(out)
            }
            None => Err(StoreError::NotFound),
        }
    }
}

impl Default for InMemoryProducts {
    fn default() -> Self {
        Self::new()
    }
}

/// Postgres backend.
#[derive(Debug, Clone)]
pub struct PostgresProducts {
    pool: Arc<PgPool>,
}

impl PostgresProducts {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, common_name, scientific_name, category, image_url, variants, created_at
            FROM products
            ORDER BY common_name ASC, id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let product = ProductRow::from_row(&row)
                .map_err(|e| StoreError::backend(format!("failed to read product row: {}", e)))?;
            products.push(product.into());
        }
        Ok(products)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn get(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, common_name, scientific_name, category, image_url, variants, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;

        match row {
            Some(row) => {
                let product = ProductRow::from_row(&row).map_err(|e| {
                    StoreError::backend(format!("failed to read product row: {}", e))
                })?;
                Ok(Some(product.into()))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, draft), fields(common_name = %draft.common_name), err)]
    async fn insert(&self, draft: ProductDraft) -> StoreResult<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (common_name, scientific_name, category, image_url, variants)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, common_name, scientific_name, category, image_url, variants, created_at
            "#,
        )
        .bind(&draft.common_name)
        .bind(&draft.scientific_name)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .bind(Json(&draft.variants))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        let product = ProductRow::from_row(&row)
            .map_err(|e| StoreError::backend(format!("failed to read product row: {}", e)))?;
        Ok(product.into())
    }

    #[instrument(skip(self, draft), fields(id = %id), err)]
    async fn update(&self, id: ProductId, draft: ProductDraft) -> StoreResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET common_name = $1,
                scientific_name = $2,
                category = $3,
                image_url = $4,
                variants = $5,
                version = version + 1
            WHERE id = $6
            RETURNING id, common_name, scientific_name, category, image_url, variants, created_at
            "#,
        )
        .bind(&draft.common_name)
        .bind(&draft.scientific_name)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .bind(Json(&draft.variants))
        .bind(id.as_i64())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        match row {
            Some(row) => {
                let product = ProductRow::from_row(&row).map_err(|e| {
                    StoreError::backend(format!("failed to read product row: {}", e))
                })?;
                Ok(Some(product.into()))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: ProductId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, f), fields(id = %id), err)]
    async fn mutate_variants<R>(
        &self,
        id: ProductId,
        f: impl FnOnce(&mut VariantSet) -> R,
    ) -> StoreResult<R> {
        let row = sqlx::query("SELECT variants, version FROM products WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_variants", e))?;

        let (variants, seen_version) = match row {
            Some(row) => {
                let Json(variants) = row
                    .try_get::<Json<Vec<Variant>>, _>("variants")
                    .map_err(|e| {
                        StoreError::backend(format!("failed to read variants column: {}", e))
                    })?;
                let version: i64 = row.try_get("version").map_err(|e| {
                    StoreError::backend(format!("failed to read version column: {}", e))
                })?;
                (variants, version)
            }
            None => return Err(StoreError::NotFound),
        };

        let mut set = VariantSet::new(variants);
        let out = f(&mut set);
        if !set.is_dirty() {
            return Ok(out);
        }

        let result = sqlx::query(
            r#"
            UPDATE products
            SET variants = $1, version = version + 1
            WHERE id = $2 AND version = $3
            "#,
        )
        .bind(Json(set.entries()))
        .bind(id.as_i64())
        .bind(seen_version)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("store_variants", e))?;

        if result.rows_affected() == 0 {
            // zero rows: either the product vanished or a concurrent writer
            // bumped the version first
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                    .bind(id.as_i64())
                    .fetch_one(&*self.pool)
                    .await
                    .map_err(|e| map_sqlx_error("check_product_exists", e))?;
            if exists {
                return Err(StoreError::conflict(format!(
                    "product {} modified concurrently",
                    id
                )));
            }
            return Err(StoreError::NotFound);
        }

        Ok(out)
    }
}

#[derive(Debug)]
struct ProductRow {
    id: i64,
    common_name: String,
    scientific_name: Option<String>,
    category: Option<String>,
    image_url: Option<String>,
    variants: Json<Vec<Variant>>,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ProductRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            common_name: row.try_get("common_name")?,
            scientific_name: row.try_get("scientific_name")?,
            category: row.try_get("category")?,
            image_url: row.try_get("image_url")?,
            variants: row.try_get("variants")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::from_i64(row.id),
            common_name: row.common_name,
            scientific_name: row.scientific_name,
            category: row.category,
            image_url: row.image_url,
            variants: row.variants.0,
            created_at: row.created_at,
        }
    }
}
