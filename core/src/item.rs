//! A single record of a REST collection and its persistence operations.
//!
//! # Design
//! `RestItem<R>` splits identity from business data. The id lives on the
//! item and is managed here; `R` only converts between its own fields and
//! the backend payload through the `Record` trait. Every item owns a clone of
//! the collection's `ResourceClient` and a handle to the transport, so items
//! never reach for shared state to persist themselves.
//!
//! The verb is chosen from the id: no id means the record has never been
//! persisted and `save` POSTs to the collection, an id means `save` PUTs to
//! the item URL. A successful `delete` clears the id, after which the item is
//! new again and a further `save` creates a fresh record.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::debug;

use crate::client::ResourceClient;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{Payload, ResourceId, ID_FIELD};

/// Conversion between a domain type and its backend payload.
pub trait Record: Send {
    /// Populate fields from a backend payload. The payload never contains
    /// the id.
    fn load(&mut self, payload: Payload) -> Result<(), ApiError>;

    /// Produce the backend payload for the current fields, without the id.
    fn dump(&self) -> Payload;
}

impl Record for Payload {
    fn load(&mut self, payload: Payload) -> Result<(), ApiError> {
        *self = payload;
        Ok(())
    }

    fn dump(&self) -> Payload {
        self.clone()
    }
}

/// One persisted-or-pending record. Derefs to the underlying `R`.
pub struct RestItem<R> {
    id: Option<ResourceId>,
    client: ResourceClient,
    transport: Arc<dyn Transport>,
    record: R,
}

impl<R: Record> RestItem<R> {
    /// A new, never-persisted item.
    pub fn new(client: ResourceClient, transport: Arc<dyn Transport>, record: R) -> Self {
        Self {
            id: None,
            client,
            transport,
            record,
        }
    }

    pub fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    /// True until the item is saved, and again after it is deleted.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn resource_url(&self) -> &str {
        self.client.resource_url()
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn into_record(self) -> R {
        self.record
    }

    /// Assign the id. Fails if the item already has one.
    pub fn set_id(&mut self, id: ResourceId) -> Result<(), ApiError> {
        if let Some(current) = &self.id {
            return Err(ApiError::IdAlreadySet {
                id: current.to_string(),
            });
        }
        self.id = Some(id);
        Ok(())
    }

    /// Hydrate from a backend payload and take `id` as the item's identity.
    pub fn load(&mut self, id: ResourceId, mut payload: Payload) -> Result<(), ApiError> {
        if let Some(current) = &self.id {
            return Err(ApiError::IdAlreadySet {
                id: current.to_string(),
            });
        }
        payload.remove(ID_FIELD);
        self.record.load(payload)?;
        self.set_id(id)
    }

    pub fn dump(&self) -> Payload {
        let mut payload = self.record.dump();
        payload.remove(ID_FIELD);
        payload
    }

    /// Create the record if it has no id, update it otherwise.
    pub async fn save(&mut self) -> Result<&mut Self, ApiError> {
        match self.id.clone() {
            None => self.create().await?,
            Some(id) => self.update(&id).await?,
        }
        Ok(self)
    }

    /// Delete the record and clear the id.
    pub async fn delete(&mut self) -> Result<&mut Self, ApiError> {
        let id = self.id.clone().ok_or(ApiError::NotPersisted)?;
        let request = self.client.build_delete(&id);
        let response = self.transport.execute(request).await?;
        self.client.parse_delete(response)?;
        debug!(resource = self.client.resource_url(), %id, "deleted record");
        self.id = None;
        Ok(self)
    }

    async fn create(&mut self) -> Result<(), ApiError> {
        let request = self.client.build_create(&self.dump())?;
        let response = self.transport.execute(request).await?;
        let id = self.client.parse_create(response)?;
        debug!(resource = self.client.resource_url(), %id, "created record");
        self.set_id(id)
    }

    async fn update(&mut self, id: &ResourceId) -> Result<(), ApiError> {
        let request = self.client.build_update(id, &self.dump())?;
        let response = self.transport.execute(request).await?;
        self.client.parse_update(response)?;
        debug!(resource = self.client.resource_url(), %id, "updated record");
        Ok(())
    }
}

impl<R> Deref for RestItem<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.record
    }
}

impl<R> DerefMut for RestItem<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.record
    }
}

impl<R: fmt::Debug> fmt::Debug for RestItem<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestItem")
            .field("id", &self.id)
            .field("resource_url", &self.client.resource_url())
            .field("record", &self.record)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;
    use crate::mock::MockTransport;

    #[derive(Debug, Default)]
    struct Note {
        text: String,
    }

    impl Record for Note {
        fn load(&mut self, payload: Payload) -> Result<(), ApiError> {
            self.text = payload
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            Ok(())
        }

        fn dump(&self) -> Payload {
            let mut payload = Payload::new();
            payload.insert("text".to_string(), json!(self.text));
            payload
        }
    }

    fn item(transport: &Arc<MockTransport>) -> RestItem<Note> {
        let client = ResourceClient::new("http://api", "notes");
        RestItem::new(client, transport.clone(), Note::default())
    }

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn new_item_has_no_id() {
        let transport = Arc::new(MockTransport::new());
        let item = item(&transport);
        assert!(item.is_new());
        assert_eq!(item.resource_url(), "http://api/notes");
    }

    #[test]
    fn set_id_twice_fails() {
        let transport = Arc::new(MockTransport::new());
        let mut item = item(&transport);
        item.set_id(ResourceId::from(1)).unwrap();
        let err = item.set_id(ResourceId::from(2)).unwrap_err();
        assert!(matches!(err, ApiError::IdAlreadySet { ref id } if id == "1"));
        assert_eq!(item.id(), Some(&ResourceId::from(1)));
    }

    #[test]
    fn load_on_loaded_item_fails() {
        let transport = Arc::new(MockTransport::new());
        let mut item = item(&transport);
        item.load(ResourceId::from(1), payload(json!({"text": "a"}))).unwrap();
        let err = item.load(ResourceId::from(2), payload(json!({"text": "b"}))).unwrap_err();
        assert!(matches!(err, ApiError::IdAlreadySet { .. }));
        assert_eq!(item.text, "a");
    }

    #[test]
    fn load_ignores_the_body_id() {
        let transport = Arc::new(MockTransport::new());
        let client = ResourceClient::new("http://api", "raw");
        let mut raw = RestItem::new(client, transport, Payload::new());
        raw.load(ResourceId::from(3), payload(json!({"id": {"nested": true}, "x": 1})))
            .unwrap();
        assert_eq!(raw.id(), Some(&ResourceId::from(3)));
        assert_eq!(raw.record(), &payload(json!({"x": 1})));
    }

    #[test]
    fn dump_never_contains_id() {
        let transport = Arc::new(MockTransport::new());
        let client = ResourceClient::new("http://api", "raw");
        let mut raw = RestItem::new(client, transport, Payload::new());
        raw.insert("id".to_string(), json!(9));
        raw.insert("x".to_string(), json!(1));
        assert_eq!(raw.dump(), payload(json!({"x": 1})));
    }

    #[tokio::test]
    async fn save_new_item_posts_and_assigns_id() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(201, json!({"id": "abc"}));
        let mut item = item(&transport);
        item.text = "hello".to_string();

        item.save().await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].path, "http://api/notes");
        let body: serde_json::Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"text": "hello"}));
        assert_eq!(item.id(), Some(&ResourceId::from("abc")));
    }

    #[tokio::test]
    async fn save_persisted_item_puts_without_changing_id() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, json!({}));
        let mut item = item(&transport);
        item.load(ResourceId::from(5), payload(json!({"text": "x"}))).unwrap();

        item.save().await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Put);
        assert_eq!(requests[0].path, "http://api/notes/5");
        assert_eq!(item.id(), Some(&ResourceId::from(5)));
    }

    #[tokio::test]
    async fn delete_clears_id_and_second_delete_fails() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(204, "");
        let mut item = item(&transport);
        item.load(ResourceId::from(5), payload(json!({"text": "x"}))).unwrap();

        item.delete().await.unwrap();
        assert!(item.is_new());

        let err = item.delete().await.unwrap_err();
        assert!(matches!(err, ApiError::NotPersisted));
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(transport.requests()[0].method, HttpMethod::Delete);
    }

    #[tokio::test]
    async fn save_after_delete_creates_again() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(204, "");
        transport.push_json(201, json!({"id": 6}));
        let mut item = item(&transport);
        item.load(ResourceId::from(5), payload(json!({"text": "x"}))).unwrap();

        item.delete().await.unwrap();
        item.save().await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[1].method, HttpMethod::Post);
        assert_eq!(item.id(), Some(&ResourceId::from(6)));
    }

    #[tokio::test]
    async fn failed_delete_keeps_id() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(500, "boom");
        let mut item = item(&transport);
        item.load(ResourceId::from(5), payload(json!({"text": "x"}))).unwrap();

        let err = item.delete().await.unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
        assert_eq!(item.id(), Some(&ResourceId::from(5)));
    }

    #[tokio::test]
    async fn failed_create_leaves_item_new() {
        let transport = Arc::new(MockTransport::new());
        transport.push_error("connection refused");
        let mut item = item(&transport);

        let err = item.save().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(item.is_new());
    }
}
