//! # Catalogue HTTP Client
//!
//! `CatalogApi` issues the form-encoded POSTs of the catalogue backend and
//! turns responses into typed pages.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        post_form(endpoint, body)                        │
//! │                                                                         │
//! │  1. base_url.join(endpoint)                                             │
//! │  2. POST, Content-Type: application/x-www-form-urlencoded               │
//! │     (token is always part of the body)                                  │
//! │  3. status check                                                        │
//! │     ├── 2xx  → decode JSON into the endpoint's envelope                 │
//! │     └── else → Http { status, message from body or status reason }     │
//! │  4. transport failure → Transport / Timeout                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Account endpoints send JSON instead of a form and carry no token; their
//! envelope embeds a status of its own, which is checked like the HTTP one.
//! The profile picture goes up as `multipart/form-data`.
//!
//! The token and passwords never appear in logs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use vetrina_core::validation::{
    validate_category, validate_collection_name, validate_email, validate_item_code,
};
use vetrina_core::{
    Category, Credentials, Page, PasswordReset, Product, ProductDetail, ProductScope,
    ProfileChanges, ProfileImage, ProfileUpdated, Registration, SubCategory, User,
    ValidationError,
};

use crate::config::{ClientConfig, EndpointSettings};
use crate::error::{ClientError, ClientResult};
use crate::wire::{
    AccountEnvelope, CategoriesEnvelope, CategoriesForm, ErrorBody, ForgotPasswordBody,
    ProductDetailForm, ProductsEnvelope, ProductsForm, ProfileUpdateBody, SubCategoriesEnvelope,
    SubCategoriesForm, UserData,
};

/// Client for the catalogue backend.
///
/// Cheap to clone: the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct CatalogApi {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    endpoints: EndpointSettings,
    page_size: u32,
    request_timeout_secs: u64,
}

impl CatalogApi {
    /// Builds a client from a validated configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(CatalogApi {
            http,
            base_url: config.base_url()?,
            token: config.server.api_token.clone(),
            endpoints: config.endpoints.clone(),
            page_size: config.page_size(),
            request_timeout_secs: config.server.request_timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Default page size for requests issued through this client.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    // =========================================================================
    // Endpoints
    // =========================================================================

    /// Fetches one page of categories.
    pub async fn fetch_categories(&self, offset: u32, limit: u32) -> ClientResult<Page<Category>> {
        let form = CategoriesForm {
            token: &self.token,
            offset,
            limit,
        };

        let envelope: CategoriesEnvelope = self.post_form(&self.endpoints.categories, &form).await?;
        let page = envelope.into_page(offset, limit);

        debug!(
            resource = "categories",
            offset = page.offset,
            items = page.len(),
            total = page.total,
            "Fetched categories page"
        );
        Ok(page)
    }

    /// Fetches one page of subcategories of `category`.
    pub async fn fetch_subcategories(
        &self,
        category: &str,
        offset: u32,
        limit: u32,
    ) -> ClientResult<Page<SubCategory>> {
        let category = validate_category(category)?;
        let form = SubCategoriesForm {
            token: &self.token,
            category: &category,
            offset,
            limit,
        };

        let envelope: SubCategoriesEnvelope =
            self.post_form(&self.endpoints.subcategories, &form).await?;

        if let Some(echoed) = envelope.category.as_deref() {
            if echoed != category {
                warn!(
                    requested = %category,
                    echoed = %echoed,
                    "Backend echoed a different category"
                );
            }
        }

        let page = envelope.into_page(offset, limit);
        debug!(
            resource = "subcategories",
            category = %category,
            offset = page.offset,
            items = page.len(),
            total = page.total,
            "Fetched subcategories page"
        );
        Ok(page)
    }

    /// Fetches one page of products for `scope`.
    pub async fn fetch_products(
        &self,
        scope: &ProductScope,
        offset: u32,
        limit: u32,
    ) -> ClientResult<Page<Product>> {
        let collection = validate_collection_name(&scope.collection_name)?;
        let form = ProductsForm {
            token: &self.token,
            collection_name: &collection,
            offset,
            limit,
            sort: scope.sort,
            lang: &scope.language,
        };

        let envelope: ProductsEnvelope = self.post_form(&self.endpoints.products, &form).await?;
        let page = envelope.into_page(offset, limit);

        debug!(
            resource = "products",
            collection = %collection,
            lang = %scope.language,
            sort = %scope.sort,
            offset = page.offset,
            items = page.len(),
            total = page.total,
            "Fetched products page"
        );
        Ok(page)
    }

    /// Fetches the full sheet of one product.
    pub async fn fetch_product_detail(&self, item_code: &str) -> ClientResult<ProductDetail> {
        let item_code = validate_item_code(item_code)?;
        let form = ProductDetailForm {
            token: &self.token,
            item_code: &item_code,
        };

        let detail: ProductDetail = self.post_form(&self.endpoints.product_detail, &form).await?;
        debug!(
            resource = "product_detail",
            item_code = %item_code,
            attributes = detail.data.len(),
            "Fetched product detail"
        );
        Ok(detail)
    }

    // =========================================================================
    // Account Endpoints
    // =========================================================================

    /// Creates an account and returns the new user.
    pub async fn register(&self, registration: Registration) -> ClientResult<User> {
        let registration = registration.validated()?;
        let url = self.endpoint_url(&self.endpoints.register)?;
        let request = self.http.post(url.clone()).json(&registration);

        let envelope: AccountEnvelope<UserData> = self.send_account(&url, request).await?;
        let user = require_data(envelope, "user")?.user;
        debug!(resource = "account", user_id = %user.id, "Registered");
        Ok(user)
    }

    /// Signs in with email and password.
    pub async fn login(&self, credentials: Credentials) -> ClientResult<User> {
        let credentials = credentials.validated()?;
        let url = self.endpoint_url(&self.endpoints.login)?;
        let request = self.http.post(url.clone()).json(&credentials);

        let envelope: AccountEnvelope<UserData> = self.send_account(&url, request).await?;
        let user = require_data(envelope, "user")?.user;
        debug!(resource = "account", user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Asks the backend to mail a reset code to `email`.
    ///
    /// Returns the server's confirmation message.
    pub async fn forgot_password(&self, email: &str) -> ClientResult<String> {
        let email = validate_email(email)?;
        let url = self.endpoint_url(&self.endpoints.forgot_password)?;
        let request = self
            .http
            .post(url.clone())
            .json(&ForgotPasswordBody { email: &email });

        let envelope: AccountEnvelope<serde_json::Value> = self.send_account(&url, request).await?;
        Ok(envelope
            .message()
            .unwrap_or_else(|| "Password reset code sent".to_string()))
    }

    /// Sets a new password using the mailed reset code.
    pub async fn reset_password(&self, reset: PasswordReset) -> ClientResult<String> {
        let reset = reset.validated()?;
        let url = self.endpoint_url(&self.endpoints.reset_password)?;
        let request = self.http.post(url.clone()).json(&reset);

        let envelope: AccountEnvelope<serde_json::Value> = self.send_account(&url, request).await?;
        Ok(envelope
            .message()
            .unwrap_or_else(|| "Password has been reset".to_string()))
    }

    /// Updates profile fields of `user_id`.
    pub async fn update_profile(
        &self,
        user_id: u64,
        changes: ProfileChanges,
    ) -> ClientResult<ProfileUpdated> {
        let changes = validated_changes(changes)?;
        let url = self.endpoint_url(&self.endpoints.update_profile)?;
        let request = self.http.put(url.clone()).json(&ProfileUpdateBody {
            user_id,
            changes: &changes,
        });

        let envelope: AccountEnvelope<ProfileUpdated> = self.send_account(&url, request).await?;
        let updated = require_data(envelope, "user")?;
        debug!(
            resource = "account",
            user_id,
            fields = ?updated.updated_fields,
            "Profile updated"
        );
        Ok(updated)
    }

    /// Updates profile fields of `user_id` and uploads a new picture.
    pub async fn update_profile_with_image(
        &self,
        user_id: u64,
        changes: ProfileChanges,
        image: ProfileImage,
    ) -> ClientResult<ProfileUpdated> {
        let changes = changes.validated()?;
        let url = self.endpoint_url(&self.endpoints.update_profile)?;

        let mut form = reqwest::multipart::Form::new().text("user_id", user_id.to_string());
        for (name, value) in changes.fields() {
            form = form.text(name, value);
        }
        let file_name = image.file_name().to_string();
        let content_type = image.content_type();
        let size = image.bytes().len();
        let part = reqwest::multipart::Part::bytes(image.into_bytes())
            .file_name(file_name)
            .mime_str(content_type)?;
        form = form.part("profile_image", part);

        let request = self.http.post(url.clone()).multipart(form);
        let envelope: AccountEnvelope<ProfileUpdated> = self.send_account(&url, request).await?;
        let updated = require_data(envelope, "user")?;
        debug!(
            resource = "account",
            user_id,
            image_bytes = size,
            fields = ?updated.updated_fields,
            "Profile updated with image"
        );
        Ok(updated)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn endpoint_url(&self, endpoint: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    async fn post_form<B, R>(&self, endpoint: &str, body: &B) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint_url(endpoint)?;
        let request = self.http.post(url.clone()).form(body);
        self.send(&url, request).await
    }

    /// Sends an account request and checks the status embedded in its body.
    async fn send_account<T>(
        &self,
        url: &Url,
        request: reqwest::RequestBuilder,
    ) -> ClientResult<AccountEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        let envelope: AccountEnvelope<T> = self.send(url, request).await?;

        if let Some(status) = envelope.failure_status() {
            let message = envelope
                .message()
                .unwrap_or_else(|| canonical_reason(status));
            warn!(%url, status, %message, "Account request rejected");
            return Err(ClientError::Http { status, message });
        }

        Ok(envelope)
    }

    async fn send<R>(&self, url: &Url, request: reqwest::RequestBuilder) -> ClientResult<R>
    where
        R: DeserializeOwned,
    {
        debug!(%url, "Sending request");

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| canonical_reason(status.as_u16()));
            warn!(%url, status = status.as_u16(), %message, "Backend returned an error status");
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(%url, error = %e, "Malformed response body");
            ClientError::Decode(e.to_string())
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.request_timeout_secs)
        } else {
            ClientError::from(err)
        }
    }
}

fn canonical_reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown status")
        .to_string()
}

fn require_data<T>(envelope: AccountEnvelope<T>, what: &str) -> ClientResult<T> {
    envelope
        .data
        .ok_or_else(|| ClientError::Decode(format!("response has no {} data", what)))
}

fn validated_changes(changes: ProfileChanges) -> ClientResult<ProfileChanges> {
    let changes = changes.validated()?;
    if changes.is_empty() {
        return Err(ValidationError::Required {
            field: "profile changes".to_string(),
        }
        .into());
    }
    Ok(changes)
}
