use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use ureq::{Agent, RequestBuilder};

use crate::config::RemoteSettings;
use crate::error::{InvoiceError, Result};
use crate::invoice::Invoice;
use crate::store::{CounterSnapshot, CounterStore, InvoiceRepository};

/// Body of the shared counter document
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CounterDocument {
    last_number: u64,
}

/// A fetched document and its entity tag
struct Fetched {
    body: String,
    etag: Option<String>,
}

/// JSON document store reached over HTTP.
///
/// Invoices live at `{url}/{collection}/{name}`, the counter at
/// `{url}/{counter}`. A 404 means "no such document". Counter writes are
/// conditional on the `ETag` seen when the counter was read.
pub struct RemoteStore {
    agent: Agent,
    base_url: String,
    collection: String,
    counter_path: String,
    token: Option<String>,
}

impl RemoteStore {
    pub fn new(settings: &RemoteSettings) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            base_url: settings.url.trim_end_matches('/').to_string(),
            collection: settings.collection.trim_matches('/').to_string(),
            counter_path: settings.counter.trim_matches('/').to_string(),
            token: settings.token.clone(),
        }
    }

    fn document_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.collection,
            encode_segment(name)
        )
    }

    fn counter_url(&self) -> String {
        format!("{}/{}", self.base_url, self.counter_path)
    }

    fn authorize<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    /// GET a document; `Ok(None)` on 404.
    fn fetch(&self, url: &str, operation: &str) -> Result<Option<Fetched>> {
        debug!(url, "GET");
        let request = self.authorize(self.agent.get(url).header("Accept", "application/json"));

        let mut response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => return Ok(None),
            Err(e) => return Err(InvoiceError::remote(operation, e)),
        };

        let etag = response
            .headers()
            .get("etag")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| InvoiceError::remote(operation, e))?;

        Ok(Some(Fetched { body, etag }))
    }
}

impl InvoiceRepository for RemoteStore {
    fn save(&self, name: &str, invoice: &Invoice) -> Result<()> {
        let url = self.document_url(name);
        let body = serde_json::to_string(invoice)?;
        debug!(url = %url, "PUT");

        self.authorize(self.agent.put(&url))
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(|e| InvoiceError::remote("save", e))?;
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Invoice>> {
        let Some(fetched) = self.fetch(&self.document_url(name), "load")? else {
            return Ok(None);
        };
        let invoice = serde_json::from_str(&fetched.body)
            .map_err(|e| InvoiceError::remote("load", format!("malformed invoice: {e}")))?;
        Ok(Some(invoice))
    }
}

impl CounterStore for RemoteStore {
    fn read_counter(&self) -> Result<CounterSnapshot> {
        let Some(fetched) = self.fetch(&self.counter_url(), "counter read")? else {
            return Ok(CounterSnapshot::default());
        };
        let document: CounterDocument = serde_json::from_str(&fetched.body).map_err(|e| {
            InvoiceError::remote("counter read", format!("malformed counter: {e}"))
        })?;

        Ok(CounterSnapshot {
            last_number: Some(document.last_number),
            version: fetched.etag,
        })
    }

    fn write_counter(&self, next: u64, seen: &CounterSnapshot) -> Result<()> {
        let url = self.counter_url();
        let body = serde_json::to_string(&CounterDocument { last_number: next })?;
        debug!(url = %url, next, "PUT counter");

        let request = self
            .authorize(self.agent.put(&url))
            .header("Content-Type", "application/json");
        let request = match (&seen.version, seen.last_number) {
            (Some(tag), _) => request.header("If-Match", tag.as_str()),
            (None, None) => request.header("If-None-Match", "*"),
            // Counter exists but the store gave no ETag: nothing to check against.
            (None, Some(_)) => request,
        };

        match request.send(body) {
            Ok(_) => Ok(()),
            Err(ureq::Error::StatusCode(409 | 412)) => Err(InvoiceError::CounterConflict),
            Err(e) => Err(InvoiceError::remote("counter write", e)),
        }
    }
}

/// Percent-encode one URL path segment
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
