//! HTTP backend client.

use std::time::Duration;

use async_trait::async_trait;
use jiff::civil::Date;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{
    ApiError, Backend,
    models::{
        Banner, BannerDto, Category, CategoryDto, ConfirmPayload, ConflictBody, DeliveryReceipt,
        Envelope, NewOrder, OrderAccepted, OrderDto, OrderPage, OrderStatus, OrderStatusPayload,
        PageMeta, ProductDto, ProductPage, ProductsPayload, ProfileDto, RefreshPayload,
        RefreshedSession, ReportFormat, SignInPayload, SignedIn, UserProfile, stage_timestamp, text,
    },
};

/// Connection settings for the storefront backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the app API, e.g. `https://api.example.test/api/v1/app`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// Reqwest implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: Client,
}

impl HttpBackend {
    /// Builds the client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.http.get(self.url(path)).bearer_auth(token)
    }

    /// Reads an enveloped JSON response, mapping authorization failures and
    /// non-2xx statuses onto [`ApiError`].
    async fn read_envelope<T: DeserializeOwned>(
        response: Response,
    ) -> Result<Envelope<T>, ApiError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or(body);

            return Err(ApiError::UnexpectedResponse(format!(
                "status {status}: {message}"
            )));
        }

        Ok(response.json().await?)
    }

    /// Like [`Self::read_envelope`], but honors the envelope's own status
    /// code and requires a payload.
    async fn read_payload<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let envelope = Self::read_envelope::<T>(response).await?;

        if let Some(code) = envelope.code
            && code != 200
        {
            return Err(ApiError::UnexpectedResponse(
                envelope
                    .message
                    .unwrap_or_else(|| format!("backend reported code {code}")),
            ));
        }

        envelope
            .payload
            .ok_or_else(|| ApiError::UnexpectedResponse("response payload missing".to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn sign_in(&self, login: &str, password: &str) -> Result<SignedIn, ApiError> {
        let response = self
            .http
            .post(self.url("auth/sign-in"))
            .json(&serde_json::json!({ "login": login, "password": password }))
            .send()
            .await?;

        let payload: SignInPayload = Self::read_payload(response).await?;

        into_signed_in(payload)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<RefreshedSession, ApiError> {
        let response = self
            .http
            .post(self.url("auth/refresh"))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let payload: RefreshPayload = Self::read_payload(response).await?;

        Ok(RefreshedSession {
            access_token: payload.token.ok_or_else(|| {
                ApiError::UnexpectedResponse("refresh response carried no token".to_string())
            })?,
            refresh_token: payload.refresh_token,
        })
    }

    async fn request_password_reset(&self, login: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("auth/forget-password"))
            .json(&serde_json::json!({ "login": login }))
            .send()
            .await?;

        Self::read_envelope::<serde_json::Value>(response).await?;

        Ok(())
    }

    async fn set_password(&self, login: &str, password: &str) -> Result<SignedIn, ApiError> {
        let response = self
            .http
            .post(self.url("auth/set-password"))
            .json(&serde_json::json!({ "phone": login, "password": password }))
            .send()
            .await?;

        let payload: SignInPayload = Self::read_payload(response).await?;

        into_signed_in(payload)
    }

    async fn list_products(
        &self,
        token: &str,
        page: u32,
        limit: u32,
    ) -> Result<ProductPage, ApiError> {
        let response = self
            .get("products/all", token)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;

        let payload: ProductsPayload = Self::read_payload(response).await?;

        let meta = payload.meta.map_or(
            PageMeta {
                current_page: page,
                last_page: page,
            },
            |meta| PageMeta {
                current_page: meta.current_page.unwrap_or(page),
                last_page: meta.last_page.unwrap_or(page),
            },
        );

        Ok(ProductPage {
            products: payload
                .data
                .into_iter()
                .map(ProductDto::normalize)
                .collect(),
            meta,
        })
    }

    async fn list_categories(&self, token: &str) -> Result<Vec<Category>, ApiError> {
        let response = self.get("categories/all", token).send().await?;

        let payload: Vec<CategoryDto> = Self::read_payload(response).await?;

        Ok(payload
            .into_iter()
            .filter_map(CategoryDto::normalize)
            .collect())
    }

    async fn list_banners(&self, token: &str) -> Result<Vec<Banner>, ApiError> {
        let response = self.get("banners/all", token).send().await?;

        let payload: Vec<BannerDto> = Self::read_payload(response).await?;

        Ok(payload.into_iter().map(BannerDto::normalize).collect())
    }

    async fn customer_orders(
        &self,
        token: &str,
        page: u32,
        limit: u32,
    ) -> Result<OrderPage, ApiError> {
        let response = self
            .get("orders/customer", token)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;

        let envelope: Envelope<Vec<OrderDto>> = Self::read_envelope(response).await?;
        let orders: Vec<_> = envelope
            .payload
            .unwrap_or_default()
            .into_iter()
            .filter_map(OrderDto::normalize)
            .collect();

        Ok(OrderPage {
            total: envelope.total.unwrap_or(orders.len() as u64),
            orders,
        })
    }

    async fn order_status(&self, token: &str, order_id: &str) -> Result<OrderStatus, ApiError> {
        let response = self
            .get(&format!("orders/status/{order_id}"), token)
            .send()
            .await?;

        let payload: OrderStatusPayload = Self::read_payload(response).await?;

        Ok(OrderStatus {
            order_id: text(payload.order_id.as_ref()).unwrap_or_else(|| order_id.to_string()),
            flags: payload.status.unwrap_or_default().normalize(),
        })
    }

    async fn submit_order(&self, token: &str, order: &NewOrder) -> Result<OrderAccepted, ApiError> {
        let response = self
            .http
            .post(self.url("orders"))
            .bearer_auth(token)
            .json(order)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            // A stock conflict is a recoverable, user-correctable rejection:
            // the body carries the per-product availability the user can
            // adjust down to.
            if let Ok(conflict) = serde_json::from_str::<ConflictBody>(&body) {
                let adjustments = conflict.adjustments();

                if !adjustments.is_empty() {
                    debug!(lines = adjustments.len(), "order rejected with stock conflict");

                    return Err(ApiError::StockConflict(adjustments));
                }

                if let Some(message) = conflict.message {
                    return Err(ApiError::UnexpectedResponse(message));
                }
            }

            return Err(ApiError::UnexpectedResponse(format!(
                "order submission failed with status {status}: {body}"
            )));
        }

        let envelope: Envelope<serde_json::Value> = response.json().await?;
        let payload = envelope.payload.unwrap_or_default();

        Ok(OrderAccepted {
            id: text(payload.get("id")),
            code: text(payload.get("code")),
        })
    }

    async fn confirm_delivery(
        &self,
        token: &str,
        order_id: &str,
    ) -> Result<DeliveryReceipt, ApiError> {
        let response = self
            .http
            .post(self.url(&format!("orders/status/{order_id}/confirm")))
            .bearer_auth(token)
            .send()
            .await?;

        let envelope: Envelope<ConfirmPayload> = Self::read_envelope(response).await?;

        Ok(DeliveryReceipt {
            delivered_at: envelope
                .payload
                .and_then(|payload| stage_timestamp(payload.delivered_at.as_deref())),
        })
    }

    async fn sales_report(
        &self,
        token: &str,
        from: Date,
        to: Date,
    ) -> Result<serde_json::Value, ApiError> {
        let response = self
            .get("orders/reports", token)
            .query(&[("from", from.to_string()), ("to", to.to_string())])
            .send()
            .await?;

        Self::read_envelope::<serde_json::Value>(response)
            .await
            .map(|envelope| envelope.payload.unwrap_or_default())
    }

    async fn order_report(
        &self,
        token: &str,
        order_code: &str,
        format: ReportFormat,
    ) -> Result<Vec<u8>, ApiError> {
        let response = self
            .get(&format!("orders/reports/{order_code}"), token)
            .query(&[("format", format.as_str())])
            .header(reqwest::header::ACCEPT, "application/octet-stream")
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            return Err(ApiError::UnexpectedResponse(format!(
                "report download failed with status {status}"
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn profile(&self, token: &str) -> Result<Option<UserProfile>, ApiError> {
        let response = self.get("profile/users", token).send().await?;

        let payload: Vec<ProfileDto> = Self::read_payload(response).await?;

        Ok(payload.into_iter().next().map(ProfileDto::normalize))
    }
}

fn into_signed_in(payload: SignInPayload) -> Result<SignedIn, ApiError> {
    Ok(SignedIn {
        access_token: payload.token.ok_or_else(|| {
            ApiError::UnexpectedResponse("sign-in response carried no token".to_string())
        })?,
        refresh_token: payload.refresh_token,
        user: payload.user.normalize(),
    })
}
