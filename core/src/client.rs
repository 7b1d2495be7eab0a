//! Stateless HTTP request builder and response parser for one resource
//! collection.
//!
//! # Design
//! `ResourceClient` holds only the collection URL and a set of default
//! headers, and carries no mutable state between calls. Each CRUD operation
//! is split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`. Items and services pair
//! the two around a `Transport` call.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{take_id, Payload, ResourceId, ID_FIELD};

/// Request builder and response parser for `{base_url}/{resource}`.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    resource_url: String,
    headers: Vec<(String, String)>,
}

impl ResourceClient {
    pub fn new(base_url: &str, resource: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let resource = resource.trim_matches('/');
        let resource_url = if resource.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{resource}")
        };
        Self {
            resource_url,
            headers: Vec::new(),
        }
    }

    /// Add a header sent with every request built by this client.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn resource_url(&self) -> &str {
        &self.resource_url
    }

    /// `{resource_url}/{id}`. The id is inserted as is, without
    /// percent-encoding.
    pub fn item_url(&self, id: &ResourceId) -> String {
        format!("{}/{id}", self.resource_url)
    }

    pub fn build_list(&self) -> HttpRequest {
        self.request(HttpMethod::Get, self.resource_url.clone(), None)
    }

    pub fn build_get(&self, id: &ResourceId) -> HttpRequest {
        self.request(HttpMethod::Get, self.item_url(id), None)
    }

    pub fn build_create(&self, payload: &Payload) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(self.request(HttpMethod::Post, self.resource_url.clone(), Some(body)))
    }

    pub fn build_update(&self, id: &ResourceId, payload: &Payload) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(self.request(HttpMethod::Put, self.item_url(id), Some(body)))
    }

    pub fn build_delete(&self, id: &ResourceId) -> HttpRequest {
        self.request(HttpMethod::Delete, self.item_url(id), None)
    }

    /// Parse a collection response into `(id, payload)` pairs, in response
    /// order. Fails on the first record without an id.
    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<(ResourceId, Payload)>, ApiError> {
        check_status(&response)?;
        let records: Vec<Payload> =
            serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        records
            .into_iter()
            .map(|mut payload| match take_id(&mut payload)? {
                Some(id) => Ok((id, payload)),
                None => Err(ApiError::MissingId {
                    resource: self.resource_url.clone(),
                }),
            })
            .collect()
    }

    /// Parse a single-record response. Any `id` field in the body is
    /// dropped; the caller already knows which id it asked for.
    pub fn parse_get(&self, response: HttpResponse) -> Result<Payload, ApiError> {
        check_status(&response)?;
        let mut payload: Payload =
            serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        payload.remove(ID_FIELD);
        Ok(payload)
    }

    /// Extract the id the backend assigned to a newly created record.
    pub fn parse_create(&self, response: HttpResponse) -> Result<ResourceId, ApiError> {
        check_status(&response)?;
        let body: Value =
            serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        let missing = || ApiError::MissingId {
            resource: self.resource_url.clone(),
        };
        match body.get(ID_FIELD) {
            Some(value) => ResourceId::from_value(value)?.ok_or_else(missing),
            None => Err(missing()),
        }
    }

    pub fn parse_update(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<String>) -> HttpRequest {
        let mut headers = self.headers.clone();
        let has_content_type = headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
        if body.is_some() && !has_content_type {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            path,
            headers,
            body,
        }
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
