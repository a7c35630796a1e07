use serde::Serialize;
use serde_json::Value;

use crate::client::{ApiClient, RequestOptions};
use crate::error::ApiResult;
use crate::http::HttpMethod;

/// List/get/create/update/delete over one collection path, used for
/// patients and inventory.
pub struct ResourceApi<'a> {
    client: &'a ApiClient,
    base: &'static str,
}

impl<'a> ResourceApi<'a> {
    pub(crate) fn new(client: &'a ApiClient, base: &'static str) -> Self {
        Self { client, base }
    }

    pub fn path(&self) -> &'static str {
        self.base
    }

    pub fn list(&self) -> ApiResult<Value> {
        self.client.request(self.base, RequestOptions::get())
    }

    pub fn get(&self, id: &str) -> ApiResult<Value> {
        self.client.request(&self.item(id)?, RequestOptions::get())
    }

    pub fn create(&self, payload: &impl Serialize) -> ApiResult<Value> {
        let options = RequestOptions::json(HttpMethod::Post, payload)?;
        self.client.request(self.base, options)
    }

    pub fn update(&self, id: &str, payload: &impl Serialize) -> ApiResult<Value> {
        let options = RequestOptions::json(HttpMethod::Put, payload)?;
        self.client.request(&self.item(id)?, options)
    }

    pub fn delete(&self, id: &str) -> ApiResult<Value> {
        self.client.request(&self.item(id)?, RequestOptions::delete())
    }

    fn item(&self, id: &str) -> ApiResult<String> {
        super::item_path(self.base, id)
    }
}
