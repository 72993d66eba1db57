use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{Credentials, LoginResponse};
use crate::error::{ApiError, Result};
use crate::listing::Listing;
use crate::messaging::{SmsReceipt, SmsRequest};
use crate::notifications::{Notification, NotificationFilters};

const USER_AGENT: &str = "CareDesk/0.1.0";

/// A file plus form fields for a multipart `POST`
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl Upload {
    pub fn new(file_field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_field: file_field.into(),
            file_name: file_name.into(),
            bytes,
            mime: None,
            fields: Vec::new(),
        }
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the `/api` routes of the backend
///
/// Every call is a single attempt. Callers decide whether to try again.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, None, None)
    }

    pub fn with_options(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send and turn any non-2xx answer into `ApiError::Http`
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        // Best effort: `{ "error": "..." }`, otherwise a generic message
        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("Request failed with status {}", status.as_u16()));

        warn!("{} -> {}", status, message);
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// `GET /api/<collection>[?status=..]`
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        status: Option<&str>,
    ) -> Result<Listing<T>> {
        self.list_at(collection, collection, status).await
    }

    /// Like `list`, for nested routes whose envelope key differs from the path
    /// (`sponsors/4/payments` answers `{ "payments": [...] }`)
    pub async fn list_at<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        status: Option<&str>,
    ) -> Result<Listing<T>> {
        let mut request = self.client.get(self.url(path));
        if let Some(status) = status {
            request = request.query(&[("status", status)]);
        }

        debug!("Fetching {} (status filter: {:?})", path, status);
        let response = self.send(request).await?;
        let value: Value = Self::decode(response).await?;
        let listing = Listing::from_value(value, key)?;

        if let Some(total) = listing.reported_total {
            if total != listing.items.len() as u64 {
                debug!(
                    "Server reports {} {} but returned {}",
                    total,
                    key,
                    listing.items.len()
                );
            }
        }
        Ok(listing)
    }

    /// `GET /api/<collection>/<id>`
    pub async fn get<T: DeserializeOwned>(&self, collection: &str, id: u64) -> Result<T> {
        let request = self.client.get(self.url(&format!("{}/{}", collection, id)));
        Self::decode(self.send(request).await?).await
    }

    /// `PUT /api/<collection>/<id>` with a JSON body
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        collection: &str,
        id: u64,
        body: &B,
    ) -> Result<T> {
        let request = self
            .client
            .put(self.url(&format!("{}/{}", collection, id)))
            .json(body);
        Self::decode(self.send(request).await?).await
    }

    /// `POST /api/<collection>` with a JSON body
    pub async fn create<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        collection: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.post(self.url(collection)).json(body);
        Self::decode(self.send(request).await?).await
    }

    /// `POST /api/<collection>` as multipart form data
    pub async fn create_multipart<T: DeserializeOwned>(
        &self,
        collection: &str,
        upload: Upload,
    ) -> Result<T> {
        let mut part = reqwest::multipart::Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(mime) = &upload.mime {
            part = part
                .mime_str(mime)
                .map_err(|e| ApiError::InvalidRequest(format!("bad mime type {}: {}", mime, e)))?;
        }

        let mut form = reqwest::multipart::Form::new();
        for (name, value) in upload.fields {
            form = form.text(name, value);
        }
        form = form.part(upload.file_field, part);

        let request = self.client.post(self.url(collection)).multipart(form);
        Self::decode(self.send(request).await?).await
    }

    /// Raw bytes from any `/api` path (report downloads)
    pub async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let request = self.client.get(self.url(path));
        let response = self.send(request).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// `POST /api/auth/login`
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let request = self.client.post(self.url("auth/login")).json(credentials);
        Self::decode(self.send(request).await?).await
    }

    /// Notifications for the dropdown, filtered client-side
    pub async fn notifications(&self, filters: &NotificationFilters) -> Result<Vec<Notification>> {
        let listing: Listing<Notification> = self.list("notifications", None).await?;
        Ok(filters.apply(listing.into_items()))
    }

    /// `PUT /api/notifications/<id>/read`
    pub async fn mark_notification_read(&self, id: u64) -> Result<()> {
        let request = self
            .client
            .put(self.url(&format!("notifications/{}/read", id)));
        self.send(request).await?;
        Ok(())
    }

    /// `POST /api/sms`
    pub async fn send_sms(&self, sms: &SmsRequest) -> Result<SmsReceipt> {
        self.create("sms", sms).await
    }
}
