use exportdesk_store::{
    CustomerStore, FreightRateStore, MediaStore, PriceStore, ProductStore, UsdRateStore,
};

use crate::config::ApiConfig;

/// Per-resource stores, selected once at startup and shared via `Extension`.
pub struct AppServices {
    pub products: ProductStore,
    pub customers: CustomerStore,
    pub prices: PriceStore,
    pub freight_rates: FreightRateStore,
    pub usd_rates: UsdRateStore,
    pub media: MediaStore,
}

pub async fn build_services(config: &ApiConfig) -> AppServices {
    let media = match &config.media_root {
        Some(root) => MediaStore::filesystem(root.clone(), config.public_base_url.clone()),
        None => MediaStore::in_memory(config.public_base_url.clone()),
    };

    match &config.database_url {
        Some(url) => {
            let pool = exportdesk_store::connect(url)
                .await
                .expect("Failed to connect to Postgres");
            AppServices {
                products: ProductStore::postgres(pool.clone()),
                customers: CustomerStore::postgres(pool.clone()),
                prices: PriceStore::postgres(pool.clone()),
                freight_rates: FreightRateStore::postgres(pool.clone()),
                usd_rates: UsdRateStore::postgres(pool),
                media,
            }
        }
        None => AppServices {
            products: ProductStore::in_memory(),
            customers: CustomerStore::in_memory(),
            prices: PriceStore::in_memory(),
            freight_rates: FreightRateStore::in_memory(),
            usd_rates: UsdRateStore::in_memory(),
            media,
        },
    }
}
