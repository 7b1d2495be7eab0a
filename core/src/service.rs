//! Factory and transport coordinator for a resource collection.
//!
//! # Design
//! `RestService<R>` owns the collection's `ResourceClient`, the transport,
//! and a factory closure producing a blank `R`. Every item it hands out
//! carries its own clone of the client and transport handle.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::client::ResourceClient;
use crate::error::ApiError;
use crate::item::{Record, RestItem};
use crate::transport::Transport;
use crate::types::ResourceId;

type Factory<R> = Arc<dyn Fn() -> R + Send + Sync>;

/// Reads a collection and creates items bound to it.
pub struct RestService<R> {
    client: ResourceClient,
    transport: Arc<dyn Transport>,
    factory: Factory<R>,
}

impl<R: Record> RestService<R> {
    pub fn new<F>(client: ResourceClient, transport: Arc<dyn Transport>, factory: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            client,
            transport,
            factory: Arc::new(factory),
        }
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    pub fn resource_url(&self) -> &str {
        self.client.resource_url()
    }

    /// Fetch the whole collection, preserving response order.
    ///
    /// Fails without returning partial results if any record lacks an id.
    pub async fn get_all(&self) -> Result<Vec<RestItem<R>>, ApiError> {
        let response = self.transport.execute(self.client.build_list()).await?;
        let records = self.client.parse_list(response)?;
        debug!(resource = self.client.resource_url(), count = records.len(), "fetched collection");
        records
            .into_iter()
            .map(|(id, payload)| -> Result<RestItem<R>, ApiError> {
                let mut item = self.create_new();
                item.load(id, payload)?;
                Ok(item)
            })
            .collect()
    }

    pub async fn get(&self, id: &ResourceId) -> Result<RestItem<R>, ApiError> {
        let response = self.transport.execute(self.client.build_get(id)).await?;
        let payload = self.client.parse_get(response)?;
        let mut item = self.create_new();
        item.load(id.clone(), payload)?;
        Ok(item)
    }

    /// A fresh item that has not been persisted yet.
    pub fn create_new(&self) -> RestItem<R> {
        RestItem::new(self.client.clone(), self.transport.clone(), (self.factory)())
    }
}

impl<R> Clone for RestService<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            transport: self.transport.clone(),
            factory: self.factory.clone(),
        }
    }
}

impl<R> fmt::Debug for RestService<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestService").field("client", &self.client).finish()
    }
}
