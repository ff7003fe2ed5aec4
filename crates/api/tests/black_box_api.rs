use chrono::{Local, TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::json;

use exportdesk_api::config::ApiConfig;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_media_root(None).await
    }

    async fn spawn_with_media_root(media_root: Option<std::path::PathBuf>) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port and
        // run everything in memory (media optionally on disk).
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let config = ApiConfig {
            bind_addr: addr,
            database_url: None,
            media_root,
            public_base_url: base_url.clone(),
        };
        let app = exportdesk_api::app::build_app(config).await;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn product_form(common_name: &str, variants: &serde_json::Value) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("common_name", common_name.to_string())
        .text("scientific_name", "Oreochromis niloticus".to_string())
        .text("category", "Fresh Water Fish".to_string())
        .text("variants", variants.to_string())
}

fn customer_form(name: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("company_name", "Fishline GmbH".to_string())
        .text("country", "Germany".to_string())
        .text("airport", "FRA".to_string())
        .text("email", "orders@fishline.example".to_string())
}

async fn create_product(client: &reqwest::Client, base_url: &str, name: &str) -> i64 {
    let res = client
        .post(format!("{}/api/productlist/upload", base_url))
        .multipart(product_form(name, &json!([])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    created["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn product_upload_list_fetch_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/productlist/upload", srv.base_url))
        .multipart(product_form(
            "Tilapia",
            &json!([{ "size": "1-2", "unit": "kg", "purchasing_price": 4.5 }]),
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["common_name"], "Tilapia");
    assert_eq!(created["scientific_name"], "Oreochromis niloticus");
    let variants = created["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 1);
    // Entries posted without an id got one assigned.
    assert!(variants[0]["id"].as_str().is_some());
    assert_eq!(variants[0]["purchasing_price"], 4.5);

    create_product(&client, &srv.base_url, "Barramundi").await;

    // Listing orders by common name, not insertion.
    let listed: serde_json::Value = client
        .get(format!("{}/api/productlist", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["common_name"], "Barramundi");
    assert_eq!(listed[1]["common_name"], "Tilapia");

    let fetched: serde_json::Value = client
        .get(format!("{}/api/productlist/{}", srv.base_url, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["id"].as_i64().unwrap(), id);

    let res = client
        .delete(format!("{}/api/productlist/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Product deleted");

    let res = client
        .get(format!("{}/api/productlist/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Deleting again is still a 200 no-op.
    let res = client
        .delete(format!("{}/api/productlist/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn product_upload_requires_common_name() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().text("category", "Fresh Water Fish".to_string());
    let res = client
        .post(format!("{}/api/productlist/upload", srv.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("common_name"));
}

#[tokio::test]
async fn product_update_overwrites_whole_document() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/productlist/upload", srv.base_url))
        .multipart(product_form(
            "Tilapia",
            &json!([
                { "size": "1-2", "unit": "kg", "purchasing_price": 4.5 },
                { "size": "2-3", "unit": "kg", "purchasing_price": 5.0 },
            ]),
        ))
        .send()
        .await
        .unwrap();
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    let kept = created["variants"][0].clone();

    // Overwrite: rename, keep the first variant (id included), drop the rest.
    let res = client
        .put(format!("{}/api/productlist/upload/{}", srv.base_url, id))
        .multipart(product_form("Nile Tilapia", &json!([kept])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["common_name"], "Nile Tilapia");
    let variants = updated["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0], created["variants"][0]);

    let res = client
        .put(format!("{}/api/productlist/upload/999999", srv.base_url))
        .multipart(product_form("Ghost", &json!([])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn variant_add_add_delete_keeps_the_survivor() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let id = create_product(&client, &srv.base_url, "Pangasius").await;
    let variants_url = format!("{}/api/productlist/{}/variants", srv.base_url, id);

    let res = client
        .post(&variants_url)
        .json(&json!({ "size": "10kg box", "unit": "box", "purchasing_price": 12.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let first: serde_json::Value = res.json().await.unwrap();
    let first_id = first["id"].as_str().unwrap().to_string();

    let res = client
        .post(&variants_url)
        .json(&json!({ "size": "20kg box", "unit": "box", "purchasing_price": 22.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let second: serde_json::Value = res.json().await.unwrap();

    let res = client
        .delete(format!("{}/{}", variants_url, first_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Variant deleted");

    // Only the 20kg entry is left, untouched by the delete of its neighbour.
    let listed: serde_json::Value = client
        .get(&variants_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], second);
}

#[tokio::test]
async fn variant_lookups_miss_cleanly() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/productlist/999999/variants", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Product not found");

    let id = create_product(&client, &srv.base_url, "Rohu").await;
    let variants_url = format!("{}/api/productlist/{}/variants", srv.base_url, id);

    // A product without variants lists an empty array, never null.
    let listed: serde_json::Value = client
        .get(&variants_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 0);

    let ghost = uuid_like();
    let res = client
        .put(format!("{}/{}", variants_url, ghost))
        .json(&json!({ "size": "5kg", "unit": "bag", "purchasing_price": 3.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Variant not found");

    // Deleting an id that was never there is a 200 no-op.
    let res = client
        .delete(format!("{}/{}", variants_url, ghost))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

/// A syntactically valid UUID that no variant will ever carry.
fn uuid_like() -> &'static str {
    "00000000-0000-7000-8000-000000000000"
}

#[tokio::test]
async fn variant_validation_rejects_bad_input() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let id = create_product(&client, &srv.base_url, "Catla").await;
    let variants_url = format!("{}/api/productlist/{}/variants", srv.base_url, id);

    let res = client
        .post(&variants_url)
        .json(&json!({ "size": "5kg", "unit": "bag", "purchasing_price": -1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("purchasing_price"));

    let res = client
        .post(&variants_url)
        .json(&json!({ "size": "  ", "unit": "bag", "purchasing_price": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Body missing a required field is a 400, not a 422.
    let res = client
        .post(&variants_url)
        .json(&json!({ "size": "5kg" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(format!("{}/not-a-uuid", variants_url))
        .json(&json!({ "size": "5kg", "unit": "bag", "purchasing_price": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_variant_adds_do_not_lose_entries() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let id = create_product(&client, &srv.base_url, "Mackerel").await;
    let variants_url = format!("{}/api/productlist/{}/variants", srv.base_url, id);

    let mut handles = Vec::new();
    for n in 0..6 {
        let client = client.clone();
        let url = variants_url.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(url)
                .json(&json!({
                    "size": format!("{}kg box", n + 1),
                    "unit": "box",
                    "purchasing_price": 1.0,
                }))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }

    // Losers of the version race get a 409; nothing may vanish silently.
    let mut succeeded = 0;
    for handle in handles {
        let status = handle.await.unwrap();
        assert!(
            status == StatusCode::CREATED || status == StatusCode::CONFLICT,
            "unexpected status {status}"
        );
        if status == StatusCode::CREATED {
            succeeded += 1;
        }
    }
    assert!(succeeded >= 1);

    let listed: serde_json::Value = client
        .get(&variants_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), succeeded);
}

#[tokio::test]
async fn rejected_uploads_store_no_image_object() {
    let unique = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let root = std::env::temp_dir().join(format!("exportdesk-media-{unique}"));
    let srv = TestServer::spawn_with_media_root(Some(root.clone())).await;
    let client = reqwest::Client::new();

    let image = || {
        reqwest::multipart::Part::bytes(b"\x89PNG fake image bytes".to_vec())
            .file_name("tilapia.png")
            .mime_str("image/png")
            .unwrap()
    };

    // Product form with an image but no common_name.
    let form = reqwest::multipart::Form::new()
        .text("category", "Fresh Water Fish".to_string())
        .part("image", image());
    let res = client
        .post(format!("{}/api/productlist/upload", srv.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Customer form with an image but no name.
    let form = reqwest::multipart::Form::new()
        .text("company_name", "Nameless Ltd".to_string())
        .part("image", image());
    let res = client
        .post(format!("{}/api/customerlist/upload", srv.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Neither 400 may leave an object stranded in its bucket.
    for bucket in ["product-images", "customer-images"] {
        let stored = std::fs::read_dir(root.join(bucket))
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(stored, 0, "{bucket} holds an orphaned object after a 400");
    }

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn product_image_upload_and_serving() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let image_bytes: &[u8] = b"\x89PNG fake image bytes";

    let part = reqwest::multipart::Part::bytes(image_bytes.to_vec())
        .file_name("tilapia.PNG")
        .mime_str("image/png")
        .unwrap();
    let form = product_form("Tilapia", &json!([])).part("image", part);

    let res = client
        .post(format!("{}/api/productlist/upload", srv.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let image_url = created["image_url"].as_str().unwrap().to_string();
    assert!(image_url.starts_with(&srv.base_url));
    assert!(image_url.contains("/uploads/product-images/"));
    // Store-generated object name, extension normalized.
    assert!(image_url.ends_with(".png"));

    let res = client.get(&image_url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap(),
        "image/png"
    );
    assert_eq!(res.bytes().await.unwrap().as_ref(), image_bytes);

    let res = client
        .get(format!("{}/uploads/product-images/unknown.png", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn customer_crud_over_http() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/customerlist/upload", srv.base_url))
        .multipart(customer_form("Meridian Seafood"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let first: serde_json::Value = res.json().await.unwrap();
    let first_id = first["id"].as_i64().unwrap();
    assert_eq!(first["name"], "Meridian Seafood");
    assert_eq!(first["country"], "Germany");

    let res = client
        .post(format!("{}/api/customerlist/upload", srv.base_url))
        .multipart(customer_form("Atlantik Handel"))
        .send()
        .await
        .unwrap();
    let second: serde_json::Value = res.json().await.unwrap();
    let second_id = second["id"].as_i64().unwrap();

    // Customers list in id (insertion) order.
    let listed: serde_json::Value = client
        .get(format!("{}/api/customerlist", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"].as_i64().unwrap(), first_id);
    assert_eq!(listed[1]["id"].as_i64().unwrap(), second_id);

    let res = client
        .put(format!("{}/api/customerlist/upload/{}", srv.base_url, second_id))
        .multipart(customer_form("Atlantik Handel GmbH"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["name"], "Atlantik Handel GmbH");

    let res = client
        .delete(format!("{}/api/customerlist/{}", srv.base_url, first_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Customer deleted");

    let res = client
        .get(format!("{}/api/customerlist/{}", srv.base_url, first_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Customer not found");
}

#[tokio::test]
async fn customer_upload_requires_name() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().text("company_name", "Nameless Ltd".to_string());
    let res = client
        .post(format!("{}/api/customerlist/upload", srv.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn price_rows_are_scoped_to_their_customer() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/customerlist/upload", srv.base_url))
        .multipart(customer_form("Meridian Seafood"))
        .send()
        .await
        .unwrap();
    let first_customer = res.json::<serde_json::Value>().await.unwrap()["id"].as_i64().unwrap();
    let res = client
        .post(format!("{}/api/customerlist/upload", srv.base_url))
        .multipart(customer_form("Atlantik Handel"))
        .send()
        .await
        .unwrap();
    let second_customer = res.json::<serde_json::Value>().await.unwrap()["id"].as_i64().unwrap();

    for (customer_id, common_name) in [
        (first_customer, "Tuna"),
        (first_customer, "Barramundi"),
        (second_customer, "Tilapia"),
    ] {
        let res = client
            .post(format!("{}/api/customer-products", srv.base_url))
            .json(&json!({
                "customer_id": customer_id,
                "common_name": common_name,
                "purchasing_price": 4.0,
                "fob_price": 6.5,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // Only the first customer's rows come back, ordered by product name.
    let listed: serde_json::Value = client
        .get(format!("{}/api/customer-products/{}", srv.base_url, first_customer))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["common_name"], "Barramundi");
    assert_eq!(listed[1]["common_name"], "Tuna");
    let row_id = listed[0]["id"].as_i64().unwrap();

    let res = client
        .put(format!("{}/api/customer-products/{}", srv.base_url, row_id))
        .json(&json!({
            "customer_id": first_customer,
            "common_name": "Barramundi",
            "purchasing_price": 4.2,
            "fob_price": 7.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["fob_price"], 7.0);

    let res = client
        .delete(format!("{}/api/customer-products/{}", srv.base_url, row_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Price deleted successfully");

    let listed: serde_json::Value = client
        .get(format!("{}/api/customer-products/{}", srv.base_url, first_customer))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Missing customer_id in the body is a 400.
    let res = client
        .post(format!("{}/api/customer-products", srv.base_url))
        .json(&json!({ "common_name": "Tuna" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(format!("{}/api/customer-products/999999", srv.base_url))
        .json(&json!({ "customer_id": first_customer, "common_name": "Tuna" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn freight_rate_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/freight-rates", srv.base_url))
        .json(&json!({
            "country": "Germany",
            "airport_code": "fra",
            "airport_name": "Frankfurt am Main",
            "rate_45kg": 4.1,
            "rate_100kg": 3.6,
            "rate_300kg": 3.2,
            "rate_500kg": 2.9,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Freight rate added successfully");
    let rate_id = body["data"]["id"].as_i64().unwrap();
    // Codes are normalized to their stored uppercase form.
    assert_eq!(body["data"]["airport_code"], "FRA");

    let listed: serde_json::Value = client
        .get(format!("{}/api/freight-rates/country/Germany", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let res = client
        .get(format!("{}/api/freight-rates/country/Germany/latest", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Lookup accepts any casing of the code.
    let res = client
        .get(format!(
            "{}/api/freight-rates/country/Germany/airport/fra/latest",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let found: serde_json::Value = res.json().await.unwrap();
    assert_eq!(found["airport_code"], "FRA");

    let res = client
        .get(format!(
            "{}/api/freight-rates/country/Norway/latest",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "No rate found for this country");

    let res = client
        .put(format!("{}/api/freight-rates/{}", srv.base_url, rate_id))
        .json(&json!({
            "country": "Germany",
            "airport_code": "FRA",
            "airport_name": "Frankfurt am Main",
            "rate_45kg": 4.4,
            "rate_100kg": 3.9,
            "rate_300kg": 3.4,
            "rate_500kg": 3.1,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Freight rate updated successfully");
    assert_eq!(body["data"]["rate_45kg"], 4.4);

    let res = client
        .delete(format!("{}/api/freight-rates/{}", srv.base_url, rate_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Freight rate deleted successfully");

    let res = client
        .get(format!("{}/api/freight-rates/country/Germany/latest", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn freight_rate_validation() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Missing airport_code.
    let res = client
        .post(format!("{}/api/freight-rates", srv.base_url))
        .json(&json!({
            "country": "Germany",
            "airport_name": "Frankfurt am Main",
            "rate_45kg": 4.1,
            "rate_100kg": 3.6,
            "rate_300kg": 3.2,
            "rate_500kg": 2.9,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/api/freight-rates", srv.base_url))
        .json(&json!({
            "country": "Germany",
            "airport_code": "FRA",
            "airport_name": "Frankfurt am Main",
            "rate_45kg": 4.1,
            "rate_100kg": 3.6,
            "rate_300kg": 0.0,
            "rate_500kg": 2.9,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("greater than 0"));

    let res = client
        .put(format!("{}/api/freight-rates/not-a-number", srv.base_url))
        .json(&json!({
            "country": "Germany",
            "airport_code": "FRA",
            "airport_name": "Frankfurt am Main",
            "rate_45kg": 4.1,
            "rate_100kg": 3.6,
            "rate_300kg": 3.2,
            "rate_500kg": 2.9,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn freight_rate_date_lookup_honors_day_bounds() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Noon local time keeps the entry inside the looked-up day in any zone.
    let effective = Local
        .with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
        .unwrap()
        .with_timezone(&Utc);

    let res = client
        .post(format!("{}/api/freight-rates", srv.base_url))
        .json(&json!({
            "country": "Japan",
            "airport_code": "nrt",
            "airport_name": "Narita",
            "rate_45kg": 5.8,
            "rate_100kg": 5.1,
            "rate_300kg": 4.6,
            "rate_500kg": 4.2,
            "date": effective.to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!(
            "{}/api/freight-rates/date/2026-03-10/country/Japan",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!(
            "{}/api/freight-rates/date/2026-03-11/country/Japan",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "No rate found for this date and country");

    let res = client
        .get(format!(
            "{}/api/freight-rates/date/2026-03-10/country/Japan/airport/nrt",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!(
            "{}/api/freight-rates/date/2026-03-10/country/Japan/airport/hnd",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "No rate found for this date, country, and airport");

    let res = client
        .get(format!(
            "{}/api/freight-rates/date/tomorrow/country/Japan",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_date");
}

#[tokio::test]
async fn freight_rate_list_limit_falls_back_on_garbage() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for (country, code, name) in [
        ("Germany", "FRA", "Frankfurt am Main"),
        ("Japan", "NRT", "Narita"),
        ("UAE", "DXB", "Dubai International"),
    ] {
        let res = client
            .post(format!("{}/api/freight-rates", srv.base_url))
            .json(&json!({
                "country": country,
                "airport_code": code,
                "airport_name": name,
                "rate_45kg": 4.1,
                "rate_100kg": 3.6,
                "rate_300kg": 3.2,
                "rate_500kg": 2.9,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // Newest first, limited.
    let listed: serde_json::Value = client
        .get(format!("{}/api/freight-rates?limit=2", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["airport_code"], "DXB");
    assert_eq!(listed[1]["airport_code"], "NRT");

    let listed: serde_json::Value = client
        .get(format!("{}/api/freight-rates?limit=zebra", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn usd_rate_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/usd-rate", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "No USD rate found");

    let res = client
        .post(format!("{}/api/usd-rate", srv.base_url))
        .json(&json!({ "rate": 310.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "USD rate updated successfully");
    assert_eq!(body["rate"], 310.5);
    assert!(body.get("id").is_none());

    let res = client
        .post(format!("{}/api/usd-rate", srv.base_url))
        .json(&json!({ "rate": 312.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // The newest entry is "the" rate.
    let current: serde_json::Value = client
        .get(format!("{}/api/usd-rate", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["rate"], 312.0);

    let history: serde_json::Value = client
        .get(format!("{}/api/usd-rate/history", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["rate"], 312.0);
    assert_eq!(history[1]["rate"], 310.5);
    let entry_id = history[0]["id"].as_i64().unwrap();

    let limited: serde_json::Value = client
        .get(format!("{}/api/usd-rate/history?limit=1", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(limited.as_array().unwrap().len(), 1);

    let res = client
        .put(format!("{}/api/usd-rate/{}", srv.base_url, entry_id))
        .json(&json!({ "rate": 315.25 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "USD rate updated successfully");
    assert_eq!(body["rate"], 315.25);

    let res = client
        .delete(format!("{}/api/usd-rate/{}", srv.base_url, entry_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Rate entry deleted successfully");

    let res = client
        .put(format!("{}/api/usd-rate/{}", srv.base_url, entry_id))
        .json(&json!({ "rate": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn usd_rate_date_lookup_and_validation() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let effective = Local
        .with_ymd_and_hms(2026, 2, 1, 12, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    let res = client
        .post(format!("{}/api/usd-rate", srv.base_url))
        .json(&json!({ "rate": 305.0, "date": effective.to_rfc3339() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/api/usd-rate/date/2026-02-01", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let found: serde_json::Value = res.json().await.unwrap();
    // The date lookup returns the full record.
    assert!(found["id"].as_i64().is_some());
    assert_eq!(found["rate"], 305.0);

    let res = client
        .get(format!("{}/api/usd-rate/date/2026-02-02", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "No rate found for this date");

    let res = client
        .get(format!("{}/api/usd-rate/date/02-2026-01", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/api/usd-rate", srv.base_url))
        .json(&json!({ "rate": 0.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("greater than 0"));

    let res = client
        .post(format!("{}/api/usd-rate", srv.base_url))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_ids_are_rejected_up_front() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for url in [
        format!("{}/api/productlist/abc", srv.base_url),
        format!("{}/api/customerlist/abc", srv.base_url),
        format!("{}/api/customer-products/abc", srv.base_url),
    ] {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "GET {url}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "invalid_id");
    }

    let res = client
        .delete(format!("{}/api/usd-rate/abc", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
