use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::{ApiClient, RequestOptions};
use crate::error::{ApiError, ApiResult};
use crate::http::HttpMethod;
use crate::types::AppointmentOutcome;

use super::ResourceApi;

const BASE: &str = "/api/appointments";
const MEET_LINK: &str = "meetLink";

/// `/api/appointments`, with meeting-link provisioning for online
/// consultations.
pub struct AppointmentsApi<'a> {
    client: &'a ApiClient,
    resource: ResourceApi<'a>,
}

impl<'a> AppointmentsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            resource: ResourceApi::new(client, BASE),
        }
    }

    pub fn list(&self) -> ApiResult<Value> {
        self.resource.list()
    }

    pub fn get(&self, id: &str) -> ApiResult<Value> {
        self.resource.get(id)
    }

    pub fn delete(&self, id: &str) -> ApiResult<Value> {
        self.resource.delete(id)
    }

    pub fn create(&self, payload: &impl Serialize) -> ApiResult<AppointmentOutcome> {
        let options = RequestOptions::json(HttpMethod::Post, &prepare(payload)?)?;
        self.client.request(BASE, options).map(into_outcome)
    }

    pub fn update(&self, id: &str, payload: &impl Serialize) -> ApiResult<AppointmentOutcome> {
        let path = super::item_path(BASE, id)?;
        let options = RequestOptions::json(HttpMethod::Put, &prepare(payload)?)?;
        self.client.request(&path, options).map(into_outcome)
    }
}

/// An appointment is online when flagged `isOnline` or booked with
/// consultation type `Online`.
pub(crate) fn is_online(payload: &Value) -> bool {
    payload.get("isOnline").and_then(Value::as_bool).unwrap_or(false)
        || payload.get("consultationType").and_then(Value::as_str) == Some("Online")
}

fn prepare(payload: &impl Serialize) -> ApiResult<Value> {
    let mut value =
        serde_json::to_value(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
    if is_online(&value) {
        if let Some(obj) = value.as_object_mut() {
            obj.insert("generateMeetLink".to_string(), Value::Bool(true));
        }
    }
    Ok(value)
}

/// Pulls the meeting link out of either the top level or `data`, and makes
/// sure it is present in both places of the returned payload.
pub(crate) fn into_outcome(mut payload: Value) -> AppointmentOutcome {
    let meeting_link = payload
        .get(MEET_LINK)
        .and_then(Value::as_str)
        .or_else(|| payload.get("data").and_then(|d| d.get(MEET_LINK)).and_then(Value::as_str))
        .map(str::to_string);

    if let (Some(link), Some(obj)) = (&meeting_link, payload.as_object_mut()) {
        obj.entry(MEET_LINK)
            .or_insert_with(|| Value::String(link.clone()));
        let data = obj
            .entry("data")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(data) = data.as_object_mut() {
            data.insert(MEET_LINK.to_string(), Value::String(link.clone()));
        }
    }

    AppointmentOutcome {
        payload,
        meeting_link,
    }
}
