//! End-to-end tests against an in-process catalogue backend.
//!
//! The backend speaks the same form-encoded protocol as the real one:
//! every endpoint checks the `token` field, pages with `offset` / `limit`
//! and answers JSON envelopes. The account endpoints take JSON (or
//! multipart for the profile picture) and report failures in the body.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use vetrina_client::{CatalogApi, ClientConfig, ClientError, LoadOutcome, StorefrontStore};
use vetrina_core::{
    CategoryScope, Credentials, PasswordReset, ProductScope, ProfileChanges, ProfileImage,
    Registration, SortOrder, SubCategoryScope,
};

const TOKEN: &str = "test-token";

// =============================================================================
// Fake Backend
// =============================================================================

#[derive(Default)]
struct Backend {
    categories: Vec<String>,
    /// Reported instead of the real category count when set.
    categories_total: Option<usize>,
    subcategories: HashMap<String, Vec<(String, String)>>,
    products: HashMap<String, usize>,
}

type Params = HashMap<String, String>;

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Invalid token" })),
    )
        .into_response()
}

fn authorized(params: &Params) -> bool {
    params.get("token").map(String::as_str) == Some(TOKEN)
}

fn paging(params: &Params) -> (usize, usize) {
    let offset = params
        .get("offset")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let limit = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
    (offset, limit)
}

fn window<T: Clone>(items: &[T], offset: usize, limit: usize) -> Vec<T> {
    items.iter().skip(offset).take(limit).cloned().collect()
}

async fn categories(State(backend): State<Arc<Backend>>, Form(params): Form<Params>) -> Response {
    if !authorized(&params) {
        return unauthorized();
    }
    let (offset, limit) = paging(&params);
    let items: Vec<Value> = window(&backend.categories, offset, limit)
        .into_iter()
        .map(|name| json!({ "name": name, "image": format!("{}.png", name.to_lowercase()) }))
        .collect();

    Json(json!({
        "categories": items,
        "offset": offset,
        "limit": limit,
        "total": backend.categories_total.unwrap_or(backend.categories.len()),
    }))
    .into_response()
}

async fn subcategories(
    State(backend): State<Arc<Backend>>,
    Form(params): Form<Params>,
) -> Response {
    if !authorized(&params) {
        return unauthorized();
    }
    let (offset, limit) = paging(&params);
    let category = params.get("category").cloned().unwrap_or_default();
    let all = backend.subcategories.get(&category).cloned().unwrap_or_default();
    let items: Vec<Value> = window(&all, offset, limit)
        .into_iter()
        .map(|(name, collection)| json!({ "name": name, "collection_name": collection }))
        .collect();

    Json(json!({
        "category": category,
        "subcategories": items,
        "offset": offset,
        "limit": limit,
        "total": all.len(),
    }))
    .into_response()
}

async fn products(State(backend): State<Arc<Backend>>, Form(params): Form<Params>) -> Response {
    if !authorized(&params) {
        return unauthorized();
    }
    let (offset, limit) = paging(&params);
    let collection = params.get("collection_name").cloned().unwrap_or_default();
    let lang = params.get("lang").cloned().unwrap_or_default();
    let sort = params.get("sort").cloned().unwrap_or_default();
    let count = backend.products.get(&collection).copied().unwrap_or(0);

    let mut ids: Vec<usize> = (0..count).collect();
    if sort == "desc" {
        ids.reverse();
    }
    let items: Vec<Value> = window(&ids, offset, limit)
        .into_iter()
        .map(|i| {
            json!({
                "product_id": format!("{}-{}", collection, i),
                "gtin": "8000000000000",
                "collection_name": collection,
                "price": "1.250,00",
                "name": format!("{}:{}:{}", lang, sort, i),
                "images": { "featured": "f.jpg", "gallery": ["g1.jpg"] }
            })
        })
        .collect();

    Json(json!({
        "collection_name": collection,
        "language": lang,
        "products": items,
        "offset": offset,
        "limit": limit,
        "total": count,
    }))
    .into_response()
}

async fn product_detail(Form(params): Form<Params>) -> Response {
    if !authorized(&params) {
        return unauthorized();
    }
    match params.get("item_code").map(String::as_str) {
        Some("7178.0010") => Json(json!({
            "product_id": "7178.0010",
            "gtin": "8000000000017",
            "catalogue": "Cooking",
            "list_price": 1250.5,
            "images": { "featured": "f.jpg", "gallery": [] },
            "descriptions": {
                "short": { "en": "Gas fryer", "it": "Friggitrice a gas" },
                "long": { "en": "Two tanks, 8 l each." }
            },
            "data": { "Voltage (V)": "230", "Product weight (kg)": 42 }
        }))
        .into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Product not found" })),
        )
            .into_response(),
    }
}

async fn broken() -> &'static str {
    "<html>Fatal error</html>"
}

const PASSWORD: &str = "secret1";

fn account_user(id: u64, email: &str) -> Value {
    json!({
        "id": id,
        "first_name": "Ada",
        "last_name": "Rossi",
        "email": email,
        "phone": null,
        "created_at": "2024-03-01 10:00:00"
    })
}

fn account_reply(status: u16, message: &str, data: Value) -> Response {
    Json(json!({
        "status": status,
        "message": message,
        "timestamp": "2024-03-01 10:00:00",
        "data": data,
    }))
    .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != PASSWORD {
        // HTTP 200 with the failure in the body.
        return account_reply(401, "Invalid email or password", Value::Null);
    }
    account_reply(200, "Login successful", json!({ "user": account_user(7, email) }))
}

async fn register(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if email == "taken@example.com" {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "status": 409, "message": "Email already registered" })),
        )
            .into_response();
    }
    let mut user = account_user(42, email);
    user["first_name"] = body["first_name"].clone();
    user["phone"] = body["phone"].clone();
    account_reply(201, "Registration successful", json!({ "user": user }))
}

async fn forgot_password(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    account_reply(200, &format!("Reset code sent to {}", email), Value::Null)
}

async fn reset_password(Json(body): Json<Value>) -> Response {
    if body["otp"] != "123456" {
        return account_reply(400, "Invalid or expired code", Value::Null);
    }
    account_reply(200, "Password has been reset", Value::Null)
}

async fn update_profile(Json(body): Json<Value>) -> Response {
    let user_id = body["user_id"].as_u64().unwrap_or_default();
    let mut user = account_user(user_id, "ada@example.com");
    let mut updated = Vec::new();
    for (name, value) in body.as_object().into_iter().flatten() {
        if name != "user_id" {
            user[name] = value.clone();
            updated.push(name.clone());
        }
    }
    account_reply(
        200,
        "Profile updated",
        json!({ "user": user, "updated_fields": updated }),
    )
}

async fn update_profile_upload(mut multipart: Multipart) -> Response {
    let mut user_id = 0;
    let mut fields = Vec::new();
    let mut picture = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "profile_image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let size = field.bytes().await.unwrap().len();
            picture = Some((file_name, content_type, size));
        } else {
            let value = field.text().await.unwrap();
            if name == "user_id" {
                user_id = value.parse().unwrap_or_default();
            } else {
                fields.push((name, value));
            }
        }
    }

    let Some((file_name, content_type, size)) = picture else {
        return account_reply(400, "No image uploaded", Value::Null);
    };
    let mut user = account_user(user_id, "ada@example.com");
    let mut updated = vec!["profile_image".to_string()];
    for (name, value) in fields {
        user[&name] = Value::String(value);
        updated.push(name);
    }
    user["profile_image"] = json!(file_name);
    user["profile_image_url"] = json!(format!(
        "https://cdn.example.com/{}?type={}&size={}",
        file_name, content_type, size
    ));
    account_reply(
        200,
        "Profile updated",
        json!({ "user": user, "updated_fields": updated }),
    )
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/categories.php", post(categories))
        .route("/api/subcategories.php", post(subcategories))
        .route("/api/products.php", post(products))
        .route("/api/product_detail.php", post(product_detail))
        .route("/api/broken.php", post(broken))
        .route("/api/login.php", post(login))
        .route("/api/register.php", post(register))
        .route("/api/forgot-password.php", post(forgot_password))
        .route("/api/reset-password.php", post(reset_password))
        .route(
            "/api/update-profile.php",
            put(update_profile).post(update_profile_upload),
        )
        .with_state(Arc::new(backend));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}/api", addr)
}

fn config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.server.base_url = base_url.to_string();
    config.server.api_token = TOKEN.to_string();
    config
}

fn catalogue() -> Backend {
    let mut backend = Backend {
        categories: vec!["Ovens".to_string(), "Fryers".to_string()],
        ..Backend::default()
    };
    backend.subcategories.insert(
        "Ovens".to_string(),
        vec![
            ("Combi ovens".to_string(), "combi-ovens".to_string()),
            ("Pizza ovens".to_string(), "pizza-ovens".to_string()),
        ],
    );
    backend.products.insert("combi-ovens".to_string(), 30);
    backend
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_categories_stream_pages_to_the_end() {
    let backend = Backend {
        categories: (0..45).map(|i| format!("Category {}", i)).collect(),
        ..Backend::default()
    };
    let base_url = spawn_backend(backend).await;
    let store = StorefrontStore::new(&config(&base_url)).unwrap();
    let categories = store.categories();

    assert_eq!(categories.load_initial(CategoryScope).await, LoadOutcome::Applied);
    assert_eq!(categories.snapshot().cursor, 20);

    assert_eq!(categories.load_more().await, LoadOutcome::Applied);
    assert_eq!(categories.load_more().await, LoadOutcome::Applied);
    assert_eq!(categories.load_more().await, LoadOutcome::Skipped);

    let snap = categories.snapshot();
    assert_eq!(snap.items.len(), 45);
    assert_eq!(snap.total, 45);
    assert!(!snap.has_more);
    assert_eq!(snap.items[44].name, "Category 44");
    assert_eq!(snap.items[44].image, "category 44.png");
}

#[tokio::test]
async fn test_wrong_token_surfaces_server_message() {
    let base_url = spawn_backend(catalogue()).await;
    let mut config = config(&base_url);
    config.server.api_token = "wrong".to_string();

    let api = CatalogApi::new(&config).unwrap();
    match api.fetch_categories(0, 20).await {
        Err(ClientError::Http { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid token");
        }
        other => panic!("unexpected: {:?}", other),
    }

    let store = StorefrontStore::with_api(api, &config).unwrap();
    let outcome = store.categories().load_initial(CategoryScope).await;
    assert_eq!(
        outcome,
        LoadOutcome::Failed("Server returned 401: Invalid token".to_string())
    );
    assert_eq!(
        store.categories().snapshot().last_error.as_deref(),
        Some("Server returned 401: Invalid token")
    );
}

#[tokio::test]
async fn test_products_carry_language_and_sort() {
    let base_url = spawn_backend(catalogue()).await;
    let api = CatalogApi::new(&config(&base_url)).unwrap();

    let scope = ProductScope::new("combi-ovens", "it").with_sort(SortOrder::Desc);
    let page = api.fetch_products(&scope, 0, 20).await.unwrap();

    assert_eq!(page.len(), 20);
    assert_eq!(page.total, 30);
    assert_eq!(page.items[0].name, "it:desc:29");
    assert_eq!(page.items[0].images.gallery, vec!["g1.jpg".to_string()]);
}

#[tokio::test]
async fn test_unknown_category_is_an_empty_page() {
    let base_url = spawn_backend(catalogue()).await;
    let store = StorefrontStore::new(&config(&base_url)).unwrap();

    let outcome = store
        .subcategories()
        .load_initial(SubCategoryScope::new("Nothing here"))
        .await;

    assert_eq!(outcome, LoadOutcome::Applied);
    let snap = store.subcategories().snapshot();
    assert!(snap.items.is_empty());
    assert!(!snap.has_more);
    assert!(snap.last_error.is_none());
}

#[tokio::test]
async fn test_featured_chain() {
    let base_url = spawn_backend(catalogue()).await;
    let store = StorefrontStore::new(&config(&base_url)).unwrap();
    store.set_language("de").unwrap();

    let outcome = store.featured().load(store.featured_scope(Some(5))).await;
    assert_eq!(outcome, LoadOutcome::Applied);

    let featured = store.featured().snapshot().value.unwrap();
    assert_eq!(featured.category, "Ovens");
    assert_eq!(featured.subcategory, "Combi ovens");
    assert_eq!(featured.collection_name, "combi-ovens");
    assert_eq!(featured.language, "de");
    assert_eq!(featured.products.len(), 5);
    assert_eq!(featured.total, 30);
    assert_eq!(featured.products[0].name, "de:asc:0");
}

#[tokio::test]
async fn test_featured_chain_without_categories() {
    let base_url = spawn_backend(Backend::default()).await;
    let store = StorefrontStore::new(&config(&base_url)).unwrap();

    let outcome = store.featured().load(store.featured_scope(None)).await;
    assert_eq!(outcome, LoadOutcome::Failed("No categories found".to_string()));
    assert!(store.featured().snapshot().value.is_none());
}

#[tokio::test]
async fn test_featured_chain_without_subcategories() {
    let backend = Backend {
        categories: vec!["Empty".to_string()],
        ..Backend::default()
    };
    let base_url = spawn_backend(backend).await;
    let store = StorefrontStore::new(&config(&base_url)).unwrap();

    let outcome = store.featured().load(store.featured_scope(None)).await;
    assert_eq!(
        outcome,
        LoadOutcome::Failed("No subcategories found for the first category".to_string())
    );
}

#[tokio::test]
async fn test_product_detail() {
    let base_url = spawn_backend(catalogue()).await;
    let store = StorefrontStore::new(&config(&base_url)).unwrap();

    let outcome = store.product_detail().load("7178.0010".to_string()).await;
    assert_eq!(outcome, LoadOutcome::Applied);

    let detail = store.product_detail().snapshot().value.unwrap();
    assert_eq!(detail.catalogue, "Cooking");
    assert_eq!(detail.short_description("it"), Some("Friggitrice a gas"));
    assert_eq!(detail.long_description("it"), Some("Two tanks, 8 l each."));
    assert_eq!(detail.attribute("Product weight (kg)").as_deref(), Some("42"));

    let outcome = store.product_detail().load("0000.0000".to_string()).await;
    assert_eq!(
        outcome,
        LoadOutcome::Failed("Server returned 404: Product not found".to_string())
    );
    // The previous sheet stays visible.
    assert_eq!(
        store.product_detail().snapshot().key.as_deref(),
        Some("7178.0010")
    );
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let base_url = spawn_backend(catalogue()).await;
    let mut config = config(&base_url);
    config.endpoints.categories = "broken.php".to_string();

    let api = CatalogApi::new(&config).unwrap();
    let err = api.fetch_categories(0, 20).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    // Bind and drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = CatalogApi::new(&config(&format!("http://{}/api", addr))).unwrap();
    let err = api.fetch_categories(0, 20).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_load_pages_stops_when_total_overstates_items() {
    let backend = Backend {
        categories: (0..25).map(|i| format!("Category {}", i)).collect(),
        categories_total: Some(60),
        ..Backend::default()
    };
    let base_url = spawn_backend(backend).await;
    let store = StorefrontStore::new(&config(&base_url)).unwrap();

    let outcome = store.categories().load_pages(CategoryScope, 0).await;
    assert_eq!(outcome, LoadOutcome::Applied);

    let snap = store.categories().snapshot();
    assert_eq!(snap.items.len(), 25);
    assert_eq!(snap.cursor, 25);
    assert_eq!(snap.total, 60);
    assert!(snap.has_more);
}

// =============================================================================
// Account Tests
// =============================================================================

#[tokio::test]
async fn test_login_and_sign_out() {
    let base_url = spawn_backend(catalogue()).await;
    let store = StorefrontStore::new(&config(&base_url)).unwrap();

    let outcome = store
        .account()
        .login(Credentials::new("ada@example.com", PASSWORD))
        .await;
    assert_eq!(outcome, LoadOutcome::Applied);

    let user = store.account().user().unwrap();
    assert_eq!(user.id, "7");
    assert_eq!(user.full_name(), "Ada Rossi");
    assert!(user.phone.is_none());

    store.categories().load_initial(CategoryScope).await;
    assert!(!store.categories().snapshot().items.is_empty());

    store.sign_out().await;
    assert!(!store.account().is_authenticated());
    assert!(store.categories().snapshot().items.is_empty());
}

#[tokio::test]
async fn test_failure_status_in_body_is_an_http_error() {
    let base_url = spawn_backend(catalogue()).await;
    let api = CatalogApi::new(&config(&base_url)).unwrap();

    match api.login(Credentials::new("ada@example.com", "wrong!")).await {
        Err(ClientError::Http { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("unexpected: {:?}", other),
    }

    let store = StorefrontStore::with_api(api, &config(&base_url)).unwrap();
    let outcome = store
        .account()
        .login(Credentials::new("ada@example.com", "wrong!"))
        .await;
    assert_eq!(
        outcome,
        LoadOutcome::Failed("Server returned 401: Invalid email or password".to_string())
    );
    assert!(store.account().snapshot().last_error.is_some());
}

#[tokio::test]
async fn test_register() {
    let base_url = spawn_backend(catalogue()).await;
    let api = CatalogApi::new(&config(&base_url)).unwrap();

    let user = api
        .register(
            Registration::new(" Grace ", "Hopper", "grace@example.com", PASSWORD)
                .with_phone("+39 055 123456"),
        )
        .await
        .unwrap();
    assert_eq!(user.id, "42");
    assert_eq!(user.first_name, "Grace");
    assert_eq!(user.phone.as_deref(), Some("+39 055 123456"));

    let err = api
        .register(Registration::new("Ada", "Rossi", "taken@example.com", PASSWORD))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Server returned 409: Email already registered");
}

#[tokio::test]
async fn test_password_reset_flow() {
    let base_url = spawn_backend(catalogue()).await;
    let store = StorefrontStore::new(&config(&base_url)).unwrap();
    let account = store.account();

    let message = account.forgot_password("ada@example.com").await.unwrap();
    assert_eq!(message, "Reset code sent to ada@example.com");

    let err = account
        .reset_password(PasswordReset::new("654321", "secret2"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Http { status: 400, .. }));

    let message = account
        .reset_password(PasswordReset::new("123456", "secret2"))
        .await
        .unwrap();
    assert_eq!(message, "Password has been reset");
    assert!(!account.is_authenticated());
}

#[tokio::test]
async fn test_update_profile_fields() {
    let base_url = spawn_backend(catalogue()).await;
    let api = CatalogApi::new(&config(&base_url)).unwrap();

    let updated = api
        .update_profile(7, ProfileChanges::new().first_name("Adele").phone("+39 333"))
        .await
        .unwrap();
    assert_eq!(updated.user.id, "7");
    assert_eq!(updated.user.first_name, "Adele");
    assert_eq!(updated.user.phone.as_deref(), Some("+39 333"));
    assert_eq!(updated.updated_fields.len(), 2);
}

#[tokio::test]
async fn test_update_profile_with_image() {
    let base_url = spawn_backend(catalogue()).await;
    let store = StorefrontStore::new(&config(&base_url)).unwrap();
    let account = store.account();

    account
        .login(Credentials::new("ada@example.com", PASSWORD))
        .await;
    let image = ProfileImage::new("ada.png", vec![7; 128]).unwrap();
    let outcome = account
        .update_profile(ProfileChanges::new().last_name("Lovelace"), Some(image))
        .await;
    assert_eq!(outcome, LoadOutcome::Applied);

    let user = account.user().unwrap();
    assert_eq!(user.last_name, "Lovelace");
    assert_eq!(user.profile_image.as_deref(), Some("ada.png"));
    assert_eq!(
        user.profile_image_url.as_deref(),
        Some("https://cdn.example.com/ada.png?type=image/png&size=128")
    );
}
