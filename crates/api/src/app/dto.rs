use axum::extract::Multipart;
use axum::extract::multipart::Field;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use exportdesk_catalog::{ProductDraft, ProductId, Variant, VariantDraft, VariantId};
use exportdesk_customers::{CustomerDraft, CustomerId};
use exportdesk_pricing::CustomerPriceDraft;
use exportdesk_rates::{FreightRateDraft, UsdRateDraft};

use crate::app::errors;

// -------------------------
// Request DTOs (JSON bodies)
// -------------------------

/// One entry of the `variants` array inside a product form. Entries without
/// an id are new; they get a fresh one at the boundary so the domain checks
/// see the final sequence.
#[derive(Debug, Deserialize)]
pub struct VariantPayload {
    pub id: Option<VariantId>,
    pub size: String,
    pub unit: String,
    pub purchasing_price: f64,
}

impl VariantPayload {
    pub fn into_variant(self) -> Variant {
        Variant {
            id: self.id.unwrap_or_else(VariantId::new),
            size: self.size,
            unit: self.unit,
            purchasing_price: self.purchasing_price,
        }
    }
}

/// Body of the single-variant endpoints (create and overwrite).
#[derive(Debug, Deserialize)]
pub struct VariantRequest {
    pub size: String,
    pub unit: String,
    pub purchasing_price: f64,
}

impl VariantRequest {
    pub fn into_draft(self) -> VariantDraft {
        VariantDraft {
            size: self.size,
            unit: self.unit,
            purchasing_price: self.purchasing_price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CustomerPriceRequest {
    pub customer_id: CustomerId,
    pub product_id: Option<ProductId>,
    pub common_name: String,
    pub category: Option<String>,
    pub size_range: Option<String>,
    pub purchasing_price: Option<f64>,
    pub exfactory_price: Option<f64>,
    pub margin: Option<f64>,
    pub margin_percentage: Option<f64>,
    pub export_doc: Option<f64>,
    pub transport_cost: Option<f64>,
    pub loading_cost: Option<f64>,
    pub airway_cost: Option<f64>,
    pub forward_handling_cost: Option<f64>,
    pub multiplier: Option<f64>,
    pub divisor: Option<f64>,
    pub freight_cost: Option<f64>,
    pub gross_weight_tier: Option<String>,
    pub fob_price: Option<f64>,
    pub cnf: Option<f64>,
}

impl CustomerPriceRequest {
    pub fn into_draft(self) -> CustomerPriceDraft {
        CustomerPriceDraft {
            customer_id: self.customer_id,
            product_id: self.product_id,
            common_name: self.common_name,
            category: self.category,
            size_range: self.size_range,
            purchasing_price: self.purchasing_price,
            exfactory_price: self.exfactory_price,
            margin: self.margin,
            margin_percentage: self.margin_percentage,
            export_doc: self.export_doc,
            transport_cost: self.transport_cost,
            loading_cost: self.loading_cost,
            airway_cost: self.airway_cost,
            forward_handling_cost: self.forward_handling_cost,
            multiplier: self.multiplier,
            divisor: self.divisor,
            freight_cost: self.freight_cost,
            gross_weight_tier: self.gross_weight_tier,
            fob_price: self.fob_price,
            cnf: self.cnf,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FreightRateRequest {
    pub country: String,
    pub airport_code: String,
    pub airport_name: String,
    pub rate_45kg: f64,
    pub rate_100kg: f64,
    pub rate_300kg: f64,
    pub rate_500kg: f64,
    pub date: Option<DateTime<Utc>>,
}

impl FreightRateRequest {
    pub fn into_draft(self) -> FreightRateDraft {
        FreightRateDraft {
            country: self.country,
            airport_code: self.airport_code,
            airport_name: self.airport_name,
            rate_45kg: self.rate_45kg,
            rate_100kg: self.rate_100kg,
            rate_300kg: self.rate_300kg,
            rate_500kg: self.rate_500kg,
            date: self.date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UsdRateRequest {
    pub rate: f64,
    pub date: Option<DateTime<Utc>>,
}

impl UsdRateRequest {
    pub fn into_draft(self) -> UsdRateDraft {
        UsdRateDraft {
            rate: self.rate,
            date: self.date,
        }
    }
}

// -------------------------
// Multipart forms
// -------------------------

/// A file part lifted out of a multipart form.
#[derive(Debug)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// The product upload form (`POST /upload` and `PUT /upload/:id`).
#[derive(Debug, Default)]
pub struct ProductForm {
    pub common_name: Option<String>,
    pub scientific_name: Option<String>,
    pub category: Option<String>,
    pub variants: Vec<Variant>,
    pub existing_image_url: Option<String>,
    pub image: Option<UploadedImage>,
}

impl ProductForm {
    /// Assemble the draft; `image_url` is resolved by the handler (fresh
    /// upload, kept URL, or none).
    pub fn draft(&self, image_url: Option<String>) -> ProductDraft {
        ProductDraft {
            common_name: self.common_name.clone().unwrap_or_default(),
            scientific_name: non_blank(&self.scientific_name),
            category: non_blank(&self.category),
            image_url,
            variants: self.variants.clone(),
        }
    }
}

pub async fn collect_product_form(
    mut multipart: Multipart,
) -> Result<ProductForm, axum::response::Response> {
    let mut form = ProductForm::default();
    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "common_name" => form.common_name = Some(text(field).await?),
            "scientific_name" => form.scientific_name = Some(text(field).await?),
            "category" => form.category = Some(text(field).await?),
            "variants" => form.variants = parse_variants(&text(field).await?)?,
            "existing_image_url" => form.existing_image_url = Some(text(field).await?),
            "image" => form.image = image(field).await?,
            _ => {}
        }
    }
    Ok(form)
}

/// The customer upload form (`POST /upload` and `PUT /upload/:id`).
#[derive(Debug, Default)]
pub struct CustomerForm {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub airport: Option<String>,
    pub email: Option<String>,
    pub existing_image_url: Option<String>,
    pub image: Option<UploadedImage>,
}

impl CustomerForm {
    pub fn draft(&self, image_url: Option<String>) -> CustomerDraft {
        CustomerDraft {
            name: self.name.clone().unwrap_or_default(),
            company_name: non_blank(&self.company_name),
            phone: non_blank(&self.phone),
            address: non_blank(&self.address),
            country: non_blank(&self.country),
            airport: non_blank(&self.airport),
            email: non_blank(&self.email),
            image_url,
        }
    }
}

pub async fn collect_customer_form(
    mut multipart: Multipart,
) -> Result<CustomerForm, axum::response::Response> {
    let mut form = CustomerForm::default();
    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => form.name = Some(text(field).await?),
            "company_name" => form.company_name = Some(text(field).await?),
            "phone" => form.phone = Some(text(field).await?),
            "address" => form.address = Some(text(field).await?),
            "country" => form.country = Some(text(field).await?),
            "airport" => form.airport = Some(text(field).await?),
            "email" => form.email = Some(text(field).await?),
            "existing_image_url" => form.existing_image_url = Some(text(field).await?),
            "image" => form.image = image(field).await?,
            _ => {}
        }
    }
    Ok(form)
}

// -------------------------
// Form plumbing
// -------------------------

async fn next_field(
    multipart: &mut Multipart,
) -> Result<Option<Field<'_>>, axum::response::Response> {
    multipart.next_field().await.map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_form", e.to_string())
    })
}

async fn text(field: Field<'_>) -> Result<String, axum::response::Response> {
    field.text().await.map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_form", e.to_string())
    })
}

async fn image(field: Field<'_>) -> Result<Option<UploadedImage>, axum::response::Response> {
    let filename = field.file_name().unwrap_or("upload").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_form", e.to_string()))?
        .to_vec();
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedImage { filename, bytes }))
}

fn parse_variants(raw: &str) -> Result<Vec<Variant>, axum::response::Response> {
    let payloads: Vec<VariantPayload> = serde_json::from_str(raw).map_err(|e| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_variants",
            format!("variants must be a JSON array: {e}"),
        )
    })?;
    Ok(payloads.into_iter().map(VariantPayload::into_variant).collect())
}

/// Blank form fields mean "no value" on a full-document overwrite.
fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}
