use super::client::{ApiClient, ApiRequest};
use super::models::{Contact, ContactFilter, EntityId, Group, Listing};
use crate::error::Result;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// Request shaping for one REST collection. Both collections expose the same
/// five calls and differ only in their path and response envelope key.
pub struct Resource<T> {
    api: ApiClient,
    collection: &'static str,
    envelope: &'static str,
    _entity: PhantomData<fn() -> T>,
}

pub type ContactApi = Resource<Contact>;
pub type GroupApi = Resource<Group>;

impl ContactApi {
    pub fn contacts(api: ApiClient) -> Self {
        Self::new(api, "contacts", "contact")
    }

    pub async fn get_all(&self, filter: &ContactFilter) -> Result<Listing<Contact>> {
        self.list(filter.query_pairs()).await
    }
}

impl GroupApi {
    pub fn groups(api: ApiClient) -> Self {
        Self::new(api, "groups", "group")
    }

    pub async fn get_all(&self) -> Result<Listing<Group>> {
        self.list(Vec::new()).await
    }
}

impl<T: DeserializeOwned> Resource<T> {
    fn new(api: ApiClient, collection: &'static str, envelope: &'static str) -> Self {
        Self {
            api,
            collection,
            envelope,
            _entity: PhantomData,
        }
    }

    async fn list(&self, query: Vec<(String, String)>) -> Result<Listing<T>> {
        let req = ApiRequest::new(Method::GET, &[self.collection]).with_query(query);
        let body = self.api.request(req).await?;
        Ok(Listing::from_value(body)?)
    }

    pub async fn get_by_id(&self, id: &EntityId) -> Result<T> {
        let req = ApiRequest::new(Method::GET, &[self.collection, id.as_str()]);
        let body = self.api.request(req).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn create<P: Serialize + ?Sized>(&self, payload: &P) -> Result<T> {
        let req = ApiRequest::new(Method::POST, &[self.collection])
            .with_body(serde_json::to_value(payload)?);
        let body = self.api.request(req).await?;
        self.unwrap_envelope(body)
    }

    pub async fn update<P: Serialize + ?Sized>(&self, id: &EntityId, payload: &P) -> Result<T> {
        let req = ApiRequest::new(Method::PUT, &[self.collection, id.as_str()])
            .with_body(serde_json::to_value(payload)?);
        let body = self.api.request(req).await?;
        self.unwrap_envelope(body)
    }

    /// Whatever the server sends back on delete is ignored.
    pub async fn delete(&self, id: &EntityId) -> Result<()> {
        let req = ApiRequest::new(Method::DELETE, &[self.collection, id.as_str()]);
        self.api.request(req).await?;
        Ok(())
    }

    // `{"contact": {...}}` normally; a bare entity is accepted too.
    fn unwrap_envelope(&self, mut body: Value) -> Result<T> {
        let entity = match body.get_mut(self.envelope).map(Value::take) {
            Some(inner) => inner,
            None => body,
        };
        Ok(serde_json::from_value(entity)?)
    }
}
