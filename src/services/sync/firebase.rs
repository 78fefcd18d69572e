//! Firebase Realtime Database channel over the REST API.
//!
//! Writes are `PUT {url}/{path}.json` on a worker thread. Subscriptions use
//! the streaming endpoint (`Accept: text/event-stream`) read on a dedicated
//! thread.

use std::io::{BufRead, BufReader};
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;

use crate::models::settings::RealtimeSettings;

use super::channel::{
    ChannelError, ChannelEvent, CompletionCallback, RealtimeChannel, UpdateCallback,
};

pub struct FirebaseChannel {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl FirebaseChannel {
    pub fn new(settings: &RealtimeSettings) -> Result<Self, ChannelError> {
        let base_url = settings.database_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("https://") {
            return Err(ChannelError::Request("database URL must use HTTPS".to_string()));
        }

        // No overall timeout: event streams stay open and writes are never
        // abandoned mid-flight.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| ChannelError::Request(err.without_url().to_string()))?;

        Ok(Self {
            client,
            base_url,
            auth_token: settings
                .auth_token
                .as_ref()
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let mut url = format!("{}/{}.json", self.base_url, path.trim_matches('/'));
        if let Some(token) = &self.auth_token {
            url.push_str("?auth=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }
}

impl RealtimeChannel for FirebaseChannel {
    fn subscribe(&mut self, path: &str, on_update: UpdateCallback) -> Result<(), ChannelError> {
        let url = self.endpoint(path);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .map_err(request_error)
            .and_then(check_status)?;

        let client = self.client.clone();
        thread::spawn(move || {
            let reason = run_event_stream(
                BufReader::new(response),
                || fetch_value(&client, &url),
                &on_update,
            );
            log::warn!("Realtime stream ended: {}", reason);
            on_update(ChannelEvent::Closed(reason));
        });

        Ok(())
    }

    fn read_once(&mut self, path: &str) -> Result<Option<Value>, ChannelError> {
        fetch_value(&self.client, &self.endpoint(path))
    }

    fn write(&mut self, path: &str, value: Value, on_complete: CompletionCallback) {
        let client = self.client.clone();
        let url = self.endpoint(path);

        thread::spawn(move || {
            let result = client
                .put(&url)
                .json(&value)
                .send()
                .map_err(request_error)
                .and_then(check_status)
                .map(|_| ());
            on_complete(result);
        });
    }
}

fn request_error(err: reqwest::Error) -> ChannelError {
    // Strip the URL so auth tokens never reach the logs.
    ChannelError::Request(err.without_url().to_string())
}

fn check_status(response: Response) -> Result<Response, ChannelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| status.to_string());

    if status.is_client_error() {
        Err(ChannelError::Rejected(detail))
    } else {
        Err(ChannelError::Request(detail))
    }
}

fn fetch_value(client: &Client, url: &str) -> Result<Option<Value>, ChannelError> {
    let value: Value = client
        .get(url)
        .send()
        .map_err(request_error)
        .and_then(check_status)?
        .json()
        .map_err(request_error)?;

    Ok((!value.is_null()).then_some(value))
}

/// Feeds stream events to `on_update` until the stream ends, returning the
/// reason it ended. A failed refetch skips that event only.
fn run_event_stream<R, F>(reader: R, refetch: F, on_update: &UpdateCallback) -> ChannelError
where
    R: BufRead,
    F: Fn() -> Result<Option<Value>, ChannelError>,
{
    let mut parser = EventStreamParser::default();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => return ChannelError::Closed(err.to_string()),
        };
        let Some(event) = parser.feed_line(&line) else {
            continue;
        };

        match interpret(&event) {
            StreamAction::Replace(value) => on_update(ChannelEvent::Value(value)),
            StreamAction::Refetch => match refetch() {
                Ok(value) => on_update(ChannelEvent::Value(value)),
                Err(err) => log::warn!("Skipping realtime change, refetch failed: {}", err),
            },
            StreamAction::KeepAlive => {}
            StreamAction::Close(reason) => return ChannelError::Closed(reason),
        }
    }

    ChannelError::Closed("connection closed by server".to_string())
}

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub event: String,
    pub data: String,
}

/// Accumulates `event:` / `data:` lines until the blank line that ends an
/// event.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    event: Option<String>,
    data: Vec<String>,
}

impl EventStreamParser {
    pub fn feed_line(&mut self, line: &str) -> Option<StreamEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            if self.event.is_none() && self.data.is_empty() {
                return None;
            }
            return Some(StreamEvent {
                event: self.event.take().unwrap_or_else(|| "message".to_string()),
                data: std::mem::take(&mut self.data).join("\n"),
            });
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamAction {
    /// Full value of the subscribed path.
    Replace(Option<Value>),
    /// Something below the path changed; read the whole value again.
    Refetch,
    KeepAlive,
    Close(String),
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    path: String,
    data: Value,
}

pub fn interpret(event: &StreamEvent) -> StreamAction {
    match event.event.as_str() {
        "put" | "patch" => match serde_json::from_str::<StreamPayload>(&event.data) {
            Ok(payload) if event.event == "put" && payload.path == "/" => {
                StreamAction::Replace((!payload.data.is_null()).then_some(payload.data))
            }
            Ok(_) => StreamAction::Refetch,
            Err(err) => {
                log::warn!("Unreadable realtime event payload: {}", err);
                StreamAction::Refetch
            }
        },
        "keep-alive" => StreamAction::KeepAlive,
        "cancel" => StreamAction::Close("subscription cancelled by security rules".to_string()),
        "auth_revoked" => StreamAction::Close("auth token expired or revoked".to_string()),
        other => {
            log::debug!("Ignoring realtime event '{}'", other);
            StreamAction::KeepAlive
        }
    }
}
