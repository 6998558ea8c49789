//! HTTP client and the [`Entity`] implementation backed by it.
//!
//! REST layout:
//!
//! ```text
//! GET|PUT|DELETE  /{kind}/{id}
//! POST            /{kind}
//! GET|POST        /{kind}/{id}/{collection}
//! DELETE          /{kind}/{id}/{collection}/{key}
//! GET|PUT         /{kind}/{id}/files/{name}/content
//! HEAD|GET|PUT    /{kind}/{id}/thumbnail
//! ```

use crate::kind::EntityKind;
use reconcile::record::into_record;
use reconcile::{Blob, Entity, Error, Record, Result, SubCollection};
use serde_json::Value;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use ureq::http::Response;
use ureq::{Body, RequestBuilder};

/// Maximum blob download size.
const MAX_BODY_SIZE: u64 = 100 * 1024 * 1024;

const USER_AGENT: &str = concat!("confsync/", env!("CARGO_PKG_VERSION"));

/// Blocking client for one configuration server.
pub struct Client {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Server base URL, without trailing slash.
    base_url: String,
    /// Bearer token, if the server requires one.
    token: Option<String>,
}

impl Client {
    /// Create a client. Every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            agent,
            base_url,
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle on one remote entity. Nothing is fetched until it is used.
    pub fn entity(&self, kind: EntityKind, id: impl Into<String>) -> HttpEntity<'_> {
        HttpEntity {
            client: self,
            kind,
            id: id.into(),
            staged: None,
        }
    }

    /// Build a URL from path segments, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> String {
        let path: Vec<String> = segments
            .iter()
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url, path.join("/"))
    }

    fn authorize<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        let request = request.header("User-Agent", USER_AGENT);
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }
}

/// A remote entity reached through a [`Client`].
pub struct HttpEntity<'a> {
    client: &'a Client,
    kind: EntityKind,
    id: String,
    staged: Option<Record>,
}

impl HttpEntity<'_> {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn url(&self, rest: &[&str]) -> String {
        let mut segments = vec![self.kind.as_str(), self.id.as_str()];
        segments.extend_from_slice(rest);
        self.client.url(&segments)
    }

    fn get(&self, url: &str, what: &str) -> Result<Response<Body>> {
        log::debug!("GET {url}");
        let request = self.client.authorize(self.client.agent.get(url));
        check(request.header("Accept", "application/json").call(), what)
    }

    fn get_value(&self, url: &str, what: &str) -> Result<Value> {
        let mut response = self.get(url, what)?;
        response
            .body_mut()
            .read_json()
            .map_err(|e| Error::Transport(format!("{what}: {e}")))
    }

    fn get_bytes(&self, url: &str, what: &str) -> Result<Blob<'static>> {
        log::debug!("GET {url}");
        let request = self.client.authorize(self.client.agent.get(url));
        let mut response = check(
            request.header("Accept", "application/octet-stream").call(),
            what,
        )?;
        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_SIZE)
            .read_to_vec()
            .map_err(|e| Error::Transport(format!("{what}: {e}")))?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn put_bytes(&self, url: &str, path: &Path, name: &str) -> Result<()> {
        let content = fs::read(path).map_err(|e| Error::content_read(name, e))?;
        log::debug!("PUT {} ({} bytes)", url, content.len());
        let request = self.client.authorize(self.client.agent.put(url));
        check(
            request
                .header("Content-Type", "application/octet-stream")
                .send(&content[..]),
            name,
        )?;
        Ok(())
    }

    fn send_json(&self, method: Method, url: &str, record: &Record, what: &str) -> Result<()> {
        log::debug!("{} {url}", method.as_str());
        let request = match method {
            Method::Post => self.client.agent.post(url),
            Method::Put => self.client.agent.put(url),
        };
        check(self.client.authorize(request).send_json(record), what)?;
        Ok(())
    }

    fn delete_url(&self, url: &str, what: &str) -> Result<()> {
        log::debug!("DELETE {url}");
        let request = self.client.authorize(self.client.agent.delete(url));
        check(request.call(), what)?;
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Method {
    Post,
    Put,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl Entity for HttpEntity<'_> {
    fn address(&self) -> String {
        format!("{}/{}", self.kind, self.id)
    }

    fn get_json(&self) -> Result<Record> {
        let address = self.address();
        let value = self.get_value(&self.url(&[]), &address)?;
        into_record(value)
            .ok_or_else(|| Error::Transport(format!("{address}: expected a JSON object")))
    }

    fn set_json(&mut self, record: Record) {
        self.staged = Some(record);
    }

    fn update(&mut self) -> Result<()> {
        let Some(record) = self.staged.take() else {
            return Ok(());
        };
        self.send_json(Method::Put, &self.url(&[]), &record, &self.address())
    }

    fn create(&mut self) -> Result<()> {
        let record = self.staged.take().unwrap_or_default();
        let url = self.client.url(&[self.kind.as_str()]);
        self.send_json(Method::Post, &url, &record, &self.address())
    }

    fn delete(&mut self) -> Result<()> {
        self.delete_url(&self.url(&[]), &self.address())
    }

    fn list(&self, collection: SubCollection) -> Result<Vec<Record>> {
        let what = format!("{} {}", self.address(), collection);
        match self.get_value(&self.url(&[collection.field()]), &what)? {
            Value::Array(items) => Ok(items.into_iter().filter_map(into_record).collect()),
            _ => Err(Error::Transport(format!("{what}: expected a JSON array"))),
        }
    }

    fn create_element(&mut self, collection: SubCollection, element: &Record) -> Result<()> {
        let what = format!(
            "{} {} {}",
            self.address(),
            collection,
            collection.element_key(element).unwrap_or_default()
        );
        self.send_json(Method::Post, &self.url(&[collection.field()]), element, &what)
    }

    fn delete_element(&mut self, collection: SubCollection, key: &str) -> Result<()> {
        let what = format!("{} {} {}", self.address(), collection, key);
        self.delete_url(&self.url(&[collection.field(), key]), &what)
    }

    fn file_content(&self, name: &str) -> Result<Blob<'_>> {
        let what = format!("{} file {}", self.address(), name);
        self.get_bytes(&self.url(&["files", name, "content"]), &what)
    }

    fn set_file_content(&mut self, name: &str, path: &Path) -> Result<()> {
        self.put_bytes(&self.url(&["files", name, "content"]), path, name)
    }

    fn has_thumbnail(&self) -> Result<bool> {
        let url = self.url(&["thumbnail"]);
        log::debug!("HEAD {url}");
        let request = self.client.authorize(self.client.agent.head(&url));
        match check(request.call(), &self.address()) {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn thumbnail_content(&self) -> Result<Blob<'_>> {
        let what = format!("{} thumbnail", self.address());
        self.get_bytes(&self.url(&["thumbnail"]), &what)
    }

    fn set_thumbnail_content(&mut self, path: &Path) -> Result<()> {
        self.put_bytes(&self.url(&["thumbnail"]), path, "thumb")
    }
}

/// Map a transport result and its status code onto engine errors.
fn check(
    result: std::result::Result<Response<Body>, ureq::Error>,
    what: &str,
) -> Result<Response<Body>> {
    let mut response = result.map_err(|e| Error::Transport(format!("{what}: {e}")))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.body_mut().read_to_string().unwrap_or_default();
    Err(status_error(status.as_u16(), what, &body))
}

fn status_error(status: u16, what: &str, body: &str) -> Error {
    if status == 404 {
        return Error::NotFound(what.to_string());
    }
    let message = server_message(body).unwrap_or_else(|| format!("HTTP {status}"));
    Error::rejected(format!("{what}: {message}"), Some(status))
}

/// Extract the error message from a response body.
///
/// JSON bodies with a `message`, `error` or `detail` string use that string;
/// other non-empty bodies are used as-is.
fn server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        let field = ["message", "error", "detail"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str));
        if let Some(message) = field {
            return Some(message.to_string());
        }
    }
    Some(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new("https://config.example.com/api/", None, Duration::from_secs(5))
    }

    #[test]
    fn test_base_url_trims_slash() {
        assert_eq!(client().base_url(), "https://config.example.com/api");
    }

    #[test]
    fn test_entity_urls() {
        let client = client();
        let entity = client.entity(EntityKind::Applications, "42");
        assert_eq!(entity.address(), "applications/42");
        assert_eq!(entity.url(&[]), "https://config.example.com/api/applications/42");
        assert_eq!(
            entity.url(&["files", "app.conf", "content"]),
            "https://config.example.com/api/applications/42/files/app.conf/content"
        );
    }

    #[test]
    fn test_segments_are_encoded() {
        let client = client();
        let entity = client.entity(EntityKind::Hosts, "web 1");
        assert_eq!(
            entity.url(&["settings", "a/b"]),
            "https://config.example.com/api/hosts/web%201/settings/a%2Fb"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error(404, "hosts/1", ""), Error::NotFound(_)));

        let err = status_error(422, "hosts/1", r#"{"message": "name is required"}"#);
        match err {
            Error::RemoteRejected { message, status } => {
                assert_eq!(message, "hosts/1: name is required");
                assert_eq!(status, Some(422));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = status_error(500, "hosts/1", "");
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_server_message() {
        assert_eq!(server_message("  "), None);
        assert_eq!(server_message("forbidden\n"), Some("forbidden".to_string()));
        assert_eq!(
            server_message(r#"{"error": "bad token"}"#),
            Some("bad token".to_string())
        );
        assert_eq!(
            server_message(r#"{"code": 7}"#),
            Some(r#"{"code": 7}"#.to_string())
        );
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        let client = Client::new("http://127.0.0.1:9", None, Duration::from_secs(2));
        let entity = client.entity(EntityKind::Hosts, "1");
        assert!(matches!(entity.get_json(), Err(Error::Transport(_))));
    }

    #[test]
    fn test_update_without_staged_record_is_noop() {
        let client = Client::new("http://127.0.0.1:9", None, Duration::from_secs(2));
        let mut entity = client.entity(EntityKind::Hosts, "1");
        assert!(entity.update().is_ok());
    }

    #[test]
    fn test_upload_of_missing_file_fails_before_request() {
        let tmp = tempfile::TempDir::new().unwrap();
        let client = Client::new("http://127.0.0.1:9", None, Duration::from_secs(2));
        let mut entity = client.entity(EntityKind::Applications, "1");
        let result = entity.set_file_content("f1", &tmp.path().join("missing"));
        assert!(matches!(result, Err(Error::ContentReadError { .. })));
    }
}
