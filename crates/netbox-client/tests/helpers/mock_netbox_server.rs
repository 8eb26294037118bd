//! Stateful mock NetBox server for integration testing.
//!
//! Keeps objects per endpoint in memory and serves them with the REST
//! conventions the client relies on: `{count, results}` list pages with
//! query filters and `limit`, 404 for unknown ids, token authentication.

#![allow(dead_code)]

use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use netbox_client::{ApiToken, NetboxClient};

pub const TEST_TOKEN: &str = "0123456789abcdef0123456789abcdef01234567";

#[derive(Default)]
struct Store {
    next_id: i64,
    objects: BTreeMap<String, BTreeMap<i64, Map<String, Value>>>,
    uppercase: BTreeSet<String>,
}

impl Store {
    fn normalize(&self, fields: &mut Map<String, Value>) {
        for name in &self.uppercase {
            if let Some(Value::String(s)) = fields.get_mut(name) {
                *s = s.to_uppercase();
            }
        }
    }
}

/// A mock NetBox server backed by an in-memory object store.
pub struct MockNetboxServer {
    server: MockServer,
    store: Arc<Mutex<Store>>,
}

impl MockNetboxServer {
    /// Start a server serving the given endpoints plus `extras/tags`.
    pub async fn start(endpoints: &[&str]) -> Self {
        let mock = Self {
            server: MockServer::start().await,
            store: Arc::new(Mutex::new(Store::default())),
        };
        mock.mount_endpoint("extras/tags").await;
        for endpoint in endpoints {
            mock.mount_endpoint(endpoint).await;
        }
        mock
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn client(&self) -> NetboxClient {
        self.client_with_token(TEST_TOKEN)
    }

    pub fn client_with_token(&self, token: &str) -> NetboxClient {
        NetboxClient::with_http_client(self.uri(), ApiToken::new(token), reqwest::Client::new())
    }

    /// Serve list/create/read/update/delete for one endpoint.
    pub async fn mount_endpoint(&self, endpoint: &str) {
        let store = self.store.clone();
        let endpoint_owned = endpoint.to_string();
        let base = self.uri();

        Mock::given(path_regex(format!(r"^/api/{endpoint}/(\d+/)?$")))
            .respond_with(move |req: &Request| respond(&store, &endpoint_owned, &base, req))
            .mount(&self.server)
            .await;
    }

    /// Serve `GET /api/status/`.
    pub async fn mount_status(&self, version: &str) {
        Mock::given(method("GET"))
            .and(path("/api/status/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "django-version": "5.0.9",
                "netbox-version": version,
                "python-version": "3.12.3",
                "plugins": {},
                "rq-workers-running": 1
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer every `http_method` request to `url_path` with `status`,
    /// ahead of the stateful handlers.
    pub async fn mount_failure(&self, http_method: &str, url_path: &str, status: u16) {
        Mock::given(method(http_method))
            .and(path(url_path))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({"detail": "injected failure"})),
            )
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Make the next stored object get `id`.
    pub fn start_ids_at(&self, id: i64) {
        self.store.lock().unwrap().next_id = id - 1;
    }

    /// Store an object directly. Returns its id.
    pub fn seed(&self, endpoint: &str, fields: Value) -> i64 {
        let Value::Object(fields) = fields else {
            panic!("seed objects must be JSON objects");
        };
        let mut store = self.store.lock().unwrap();
        store.next_id += 1;
        let id = store.next_id;
        store
            .objects
            .entry(endpoint.to_string())
            .or_default()
            .insert(id, fields);
        id
    }

    /// Seed a tag with a slug derived from its name.
    pub fn seed_tag(&self, name: &str) -> i64 {
        self.seed(
            "extras/tags",
            json!({"name": name, "slug": name.to_lowercase()}),
        )
    }

    pub fn get(&self, endpoint: &str, id: i64) -> Option<Value> {
        self.store
            .lock()
            .unwrap()
            .objects
            .get(endpoint)
            .and_then(|objects| objects.get(&id))
            .map(|fields| Value::Object(fields.clone()))
    }

    /// Delete out-of-band.
    pub fn remove(&self, endpoint: &str, id: i64) {
        if let Some(objects) = self.store.lock().unwrap().objects.get_mut(endpoint) {
            objects.remove(&id);
        }
    }

    /// Modify out-of-band.
    pub fn patch(&self, endpoint: &str, id: i64, fields: Value) {
        let mut store = self.store.lock().unwrap();
        let object = store
            .objects
            .get_mut(endpoint)
            .and_then(|objects| objects.get_mut(&id))
            .expect("patched object exists");
        if let Value::Object(fields) = fields {
            object.extend(fields);
        }
    }

    /// Store this string field upper-cased, like NetBox does for `http_method`.
    pub fn uppercase_field(&self, field: &str) {
        self.store.lock().unwrap().uppercase.insert(field.to_string());
    }

    /// Requests received so far as `"METHOD /path?query"`, tag lookups excluded.
    pub async fn requests(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| !req.url.path().starts_with("/api/extras/tags/"))
            .map(|req| match req.url.query() {
                Some(query) => format!("{} {}?{}", req.method, req.url.path(), query),
                None => format!("{} {}", req.method, req.url.path()),
            })
            .collect()
    }
}

fn respond(store: &Mutex<Store>, endpoint: &str, base: &str, req: &Request) -> ResponseTemplate {
    let token = req
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok());
    if token != Some(format!("Token {TEST_TOKEN}").as_str()) {
        return ResponseTemplate::new(403).set_body_json(json!({"detail": "Invalid token"}));
    }

    let id = req
        .url
        .path()
        .trim_start_matches(&format!("/api/{endpoint}/"))
        .trim_end_matches('/')
        .parse::<i64>()
        .ok();

    let mut store = store.lock().unwrap();
    match (req.method.as_str(), id) {
        ("GET", None) => list(&store, endpoint, base, req),
        ("POST", None) => {
            let Some(mut fields) = body(req) else {
                return bad_request();
            };
            store.normalize(&mut fields);
            store.next_id += 1;
            let id = store.next_id;
            store
                .objects
                .entry(endpoint.to_string())
                .or_default()
                .insert(id, fields.clone());
            ResponseTemplate::new(201).set_body_json(render(endpoint, base, id, &fields))
        }
        ("GET", Some(id)) => match store.objects.get(endpoint).and_then(|o| o.get(&id)) {
            Some(fields) => ResponseTemplate::new(200).set_body_json(render(endpoint, base, id, fields)),
            None => not_found(),
        },
        ("PUT", Some(id)) => {
            let Some(mut fields) = body(req) else {
                return bad_request();
            };
            store.normalize(&mut fields);
            match store.objects.get_mut(endpoint).and_then(|o| o.get_mut(&id)) {
                Some(slot) => {
                    *slot = fields;
                    ResponseTemplate::new(200).set_body_json(render(endpoint, base, id, slot))
                }
                None => not_found(),
            }
        }
        ("DELETE", Some(id)) => match store.objects.get_mut(endpoint).and_then(|o| o.remove(&id)) {
            Some(_) => ResponseTemplate::new(204),
            None => not_found(),
        },
        _ => ResponseTemplate::new(405).set_body_json(json!({"detail": "Method not allowed"})),
    }
}

fn list(store: &Store, endpoint: &str, base: &str, req: &Request) -> ResponseTemplate {
    let mut limit = usize::MAX;
    let mut filters = Vec::new();
    for (key, value) in req.url.query_pairs() {
        match key.as_ref() {
            "limit" => limit = value.parse().unwrap_or(usize::MAX),
            "offset" => {}
            _ => filters.push((key.into_owned(), value.into_owned())),
        }
    }

    let matches: Vec<Value> = store
        .objects
        .get(endpoint)
        .into_iter()
        .flatten()
        .filter(|(_, fields)| filters.iter().all(|(k, v)| field_matches(fields, k, v)))
        .map(|(id, fields)| render(endpoint, base, *id, fields))
        .collect();

    ResponseTemplate::new(200).set_body_json(json!({
        "count": matches.len(),
        "next": null,
        "previous": null,
        "results": matches.into_iter().take(limit).collect::<Vec<_>>(),
    }))
}

/// Match `param` against a top-level field, or `head_tail` against a
/// nested `head.tail` (NetBox's `vlan_vid` filters on `vlan.vid`).
fn field_matches(fields: &Map<String, Value>, param: &str, expected: &str) -> bool {
    let value = fields.get(param).or_else(|| {
        let (head, tail) = param.split_once('_')?;
        fields.get(head)?.get(tail)
    });
    match value {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        _ => false,
    }
}

fn render(endpoint: &str, base: &str, id: i64, fields: &Map<String, Value>) -> Value {
    let mut object = fields.clone();
    object.insert("id".into(), json!(id));
    object.insert("url".into(), json!(format!("{base}/api/{endpoint}/{id}/")));
    Value::Object(object)
}

fn body(req: &Request) -> Option<Map<String, Value>> {
    match serde_json::from_slice(&req.body) {
        Ok(Value::Object(fields)) => Some(fields),
        _ => None,
    }
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({"detail": "No object matches the given query."}))
}

fn bad_request() -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({"detail": "JSON parse error"}))
}
