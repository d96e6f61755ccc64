//! In-process stand-in for a 3x-ui panel.
//!
//! Serves the inbound API on an ephemeral port, keeps inbounds in memory,
//! and counts hits per endpoint so tests can assert exactly which calls a
//! client made.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use xui::PanelConfig;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "s3cret";
const COOKIE: &str = "3x-ui";

struct PanelState {
	generation: AtomicUsize,
	inbounds: Mutex<Vec<Value>>,
	hits: Mutex<HashMap<&'static str, usize>>,
	reject_list: AtomicUsize,
	del_client: Mutex<DelClient>,
	reject_update: AtomicBool,
	vanish_on_get: Mutex<Option<String>>,
	login_page_when_expired: AtomicBool,
}

/// How `delClient` answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DelClient {
	Works,
	Missing,
	Refuses,
}

impl PanelState {
	fn hit(&self, endpoint: &'static str) {
		*self.hits.lock().unwrap().entry(endpoint).or_default() += 1;
	}

	/// Reply to a request without a valid session cookie.
	fn unauthorized(&self) -> Response {
		if self.login_page_when_expired.load(Ordering::SeqCst) {
			let page = "<!DOCTYPE html><html><head><title>Login</title></head><body></body></html>";
			return ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], page).into_response();
		}
		StatusCode::UNAUTHORIZED.into_response()
	}

	fn authorized(&self, headers: &HeaderMap) -> bool {
		let expected = format!("{COOKIE}=s{}", self.generation.load(Ordering::SeqCst));
		headers
			.get_all(header::COOKIE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.flat_map(|value| value.split(';'))
			.any(|pair| pair.trim() == expected)
	}
}

pub struct MockPanel {
	addr: SocketAddr,
	root: String,
	state: Arc<PanelState>,
}

impl MockPanel {
	pub async fn start(inbounds: Vec<Value>) -> Self {
		Self::start_with_root("", inbounds).await
	}

	/// Serves the API under `root`, e.g. `/secret`.
	pub async fn start_with_root(root: &str, inbounds: Vec<Value>) -> Self {
		let state = Arc::new(PanelState {
			generation: AtomicUsize::new(1),
			inbounds: Mutex::new(inbounds),
			hits: Mutex::new(HashMap::new()),
			reject_list: AtomicUsize::new(0),
			del_client: Mutex::new(DelClient::Works),
			reject_update: AtomicBool::new(false),
			vanish_on_get: Mutex::new(None),
			login_page_when_expired: AtomicBool::new(false),
		});

		let api = Router::new()
			.route("/login", post(login))
			.route("/panel/api/inbounds/list", get(list))
			.route("/panel/api/inbounds/get/{id}", get(get_one))
			.route("/panel/api/inbounds/add", post(add))
			.route("/panel/api/inbounds/addClient", post(add_client))
			.route("/panel/api/inbounds/delClient/{id}/{uuid}", post(del_client))
			.route("/panel/api/inbounds/update/{id}", post(update))
			.route("/panel/api/inbounds/del/{id}", post(del))
			.with_state(state.clone());
		let app = if root.is_empty() { api } else { Router::new().nest(root, api) };

		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});

		Self {
			addr,
			root: root.to_string(),
			state,
		}
	}

	/// Configuration pointing at this panel with valid credentials.
	pub fn config(&self) -> PanelConfig {
		let config = PanelConfig::new("127.0.0.1", self.addr.port(), USERNAME, PASSWORD);
		if self.root.is_empty() { config } else { config.with_root_path(self.root.clone()) }
	}

	pub fn hits(&self, endpoint: &str) -> usize {
		self.state.hits.lock().unwrap().get(endpoint).copied().unwrap_or_default()
	}

	/// Answers the next `count` list calls with `success: false`.
	pub fn reject_list(&self, count: usize) {
		self.state.reject_list.store(count, Ordering::SeqCst);
	}

	/// Makes `delClient` answer 404, as on panels without the endpoint.
	pub fn disable_del_client(&self) {
		*self.state.del_client.lock().unwrap() = DelClient::Missing;
	}

	/// Makes `delClient` answer 200 with `success: false`.
	pub fn refuse_del_client(&self) {
		*self.state.del_client.lock().unwrap() = DelClient::Refuses;
	}

	/// Makes `update` answer `success: false`.
	pub fn reject_update(&self) {
		self.state.reject_update.store(true, Ordering::SeqCst);
	}

	/// Removes the client with `uuid` from its inbound right before the next
	/// `get` is answered, as if another operator deleted it concurrently.
	pub fn vanish_on_get(&self, uuid: &str) {
		*self.state.vanish_on_get.lock().unwrap() = Some(uuid.to_string());
	}

	/// Answers requests with a stale cookie with the HTML login page and a
	/// 200 status instead of 401.
	pub fn serve_login_page_when_expired(&self) {
		self.state.login_page_when_expired.store(true, Ordering::SeqCst);
	}

	/// Invalidates every issued session cookie.
	pub fn expire_sessions(&self) {
		self.state.generation.fetch_add(1, Ordering::SeqCst);
	}

	pub fn inbound(&self, id: i64) -> Option<Value> {
		self.state.inbounds.lock().unwrap().iter().find(|i| i["id"] == id).cloned()
	}

	pub fn inbound_count(&self) -> usize {
		self.state.inbounds.lock().unwrap().len()
	}

	/// Client ids stored in the inbound's `settings`.
	pub fn client_ids(&self, id: i64) -> Vec<String> {
		let Some(inbound) = self.inbound(id) else {
			return Vec::new();
		};
		let settings: Value = serde_json::from_str(inbound["settings"].as_str().unwrap()).unwrap();
		settings["clients"]
			.as_array()
			.unwrap()
			.iter()
			.map(|c| c["id"].as_str().unwrap_or_default().to_string())
			.collect()
	}
}

/// Inbound record in the shape the panel lists it.
pub fn inbound(id: i64, protocol: &str, port: u16, clients: Value, stream: Value) -> Value {
	json!({
		"id": id,
		"up": 0,
		"down": 0,
		"total": 0,
		"remark": format!("inbound-{id}"),
		"enable": true,
		"expiryTime": 0,
		"listen": "",
		"port": port,
		"protocol": protocol,
		"settings": json!({ "clients": clients, "decryption": "none", "fallbacks": [] }).to_string(),
		"streamSettings": stream.to_string(),
		"tag": format!("inbound-{port}"),
		"sniffing": "{\"enabled\":true}",
		"allocate": "{\"strategy\":\"always\"}",
		"clientStats": []
	})
}

fn ok(obj: Value) -> Response {
	Json(json!({ "success": true, "msg": "", "obj": obj })).into_response()
}

fn fail(msg: &str) -> Response {
	Json(json!({ "success": false, "msg": msg, "obj": null })).into_response()
}

async fn login(State(panel): State<Arc<PanelState>>, Form(form): Form<HashMap<String, String>>) -> Response {
	panel.hit("login");
	let valid = form.get("username").map(String::as_str) == Some(USERNAME)
		&& form.get("password").map(String::as_str) == Some(PASSWORD);
	if !valid {
		return fail("wrong username or password");
	}

	let cookie = format!("{COOKIE}=s{}; Path=/", panel.generation.load(Ordering::SeqCst));
	([(header::SET_COOKIE, cookie)], Json(json!({ "success": true, "msg": "Login successful", "obj": null }))).into_response()
}

async fn list(State(panel): State<Arc<PanelState>>, headers: HeaderMap) -> Response {
	panel.hit("list");
	if !panel.authorized(&headers) {
		return panel.unauthorized();
	}
	let rejected = panel
		.reject_list
		.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
		.is_ok();
	if rejected {
		return fail("");
	}
	ok(Value::Array(panel.inbounds.lock().unwrap().clone()))
}

async fn get_one(State(panel): State<Arc<PanelState>>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
	panel.hit("get");
	if !panel.authorized(&headers) {
		return panel.unauthorized();
	}
	let mut inbounds = panel.inbounds.lock().unwrap();
	if let Some(uuid) = panel.vanish_on_get.lock().unwrap().take() {
		for inbound in inbounds.iter_mut() {
			rewrite_clients(inbound, |clients| clients.retain(|c| c["id"] != uuid.as_str()));
		}
	}
	match inbounds.iter().find(|i| i["id"] == id) {
		Some(inbound) => ok(inbound.clone()),
		None => fail("Obtain Failed: record not found"),
	}
}

async fn add(State(panel): State<Arc<PanelState>>, headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
	panel.hit("add");
	if !panel.authorized(&headers) {
		return panel.unauthorized();
	}
	let mut inbounds = panel.inbounds.lock().unwrap();
	if inbounds.iter().any(|i| i["port"] == body["port"]) {
		return fail("Port already exists");
	}
	let id = inbounds.iter().filter_map(|i| i["id"].as_i64()).max().unwrap_or_default() + 1;
	body["id"] = json!(id);
	body["clientStats"] = json!([]);
	inbounds.push(body.clone());
	ok(body)
}

async fn add_client(
	State(panel): State<Arc<PanelState>>,
	headers: HeaderMap,
	Form(form): Form<HashMap<String, String>>,
) -> Response {
	panel.hit("addClient");
	if !panel.authorized(&headers) {
		return panel.unauthorized();
	}
	let Some(id) = form.get("id").and_then(|id| id.parse::<i64>().ok()) else {
		return fail("invalid id");
	};
	let Some(new) = form.get("settings").and_then(|s| serde_json::from_str::<Value>(s).ok()) else {
		return fail("invalid settings");
	};
	let new_clients = new["clients"].as_array().cloned().unwrap_or_default();

	let mut inbounds = panel.inbounds.lock().unwrap();
	let emails: Vec<String> = inbounds
		.iter()
		.filter_map(|i| serde_json::from_str::<Value>(i["settings"].as_str()?).ok())
		.flat_map(|s| s["clients"].as_array().cloned().unwrap_or_default())
		.filter_map(|c| c["email"].as_str().map(str::to_string))
		.collect();
	if let Some(dup) = new_clients.iter().find_map(|c| c["email"].as_str().filter(|e| emails.iter().any(|x| x == e))) {
		return fail(&format!("Duplicate email: {dup}"));
	}

	let Some(inbound) = inbounds.iter_mut().find(|i| i["id"] == id) else {
		return fail("Inbound not found");
	};
	rewrite_clients(inbound, |clients| clients.extend(new_clients));
	ok(Value::Null)
}

async fn del_client(
	State(panel): State<Arc<PanelState>>,
	headers: HeaderMap,
	Path((id, uuid)): Path<(i64, String)>,
) -> Response {
	panel.hit("delClient");
	if !panel.authorized(&headers) {
		return panel.unauthorized();
	}
	match *panel.del_client.lock().unwrap() {
		DelClient::Works => {}
		DelClient::Missing => return StatusCode::NOT_FOUND.into_response(),
		DelClient::Refuses => return fail("Delete client failed"),
	}

	let mut inbounds = panel.inbounds.lock().unwrap();
	let Some(inbound) = inbounds.iter_mut().find(|i| i["id"] == id) else {
		return fail("Inbound not found");
	};
	let mut removed = false;
	rewrite_clients(inbound, |clients| {
		let before = clients.len();
		clients.retain(|c| c["id"] != uuid.as_str());
		removed = clients.len() != before;
	});
	if removed { ok(Value::Null) } else { fail("Client not found") }
}

async fn update(
	State(panel): State<Arc<PanelState>>,
	headers: HeaderMap,
	Path(id): Path<i64>,
	Json(body): Json<Value>,
) -> Response {
	panel.hit("update");
	if !panel.authorized(&headers) {
		return panel.unauthorized();
	}
	if panel.reject_update.load(Ordering::SeqCst) {
		return fail("Update failed");
	}
	let mut inbounds = panel.inbounds.lock().unwrap();
	match inbounds.iter_mut().find(|i| i["id"] == id) {
		Some(inbound) => {
			*inbound = body;
			ok(inbound.clone())
		}
		None => fail("Inbound not found"),
	}
}

async fn del(State(panel): State<Arc<PanelState>>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
	panel.hit("del");
	if !panel.authorized(&headers) {
		return panel.unauthorized();
	}
	let mut inbounds = panel.inbounds.lock().unwrap();
	let before = inbounds.len();
	inbounds.retain(|i| i["id"] != id);
	if inbounds.len() != before { ok(json!(id)) } else { fail("Delete Failed") }
}

fn rewrite_clients(inbound: &mut Value, edit: impl FnOnce(&mut Vec<Value>)) {
	let mut settings: Value = serde_json::from_str(inbound["settings"].as_str().unwrap_or("{}")).unwrap_or_else(|_| json!({}));
	let mut clients = settings["clients"].as_array().cloned().unwrap_or_default();
	edit(&mut clients);
	settings["clients"] = Value::Array(clients);
	inbound["settings"] = Value::String(settings.to_string());
}

/// Captured log output, readable after the events fire.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
	pub fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
	}
}

impl std::io::Write for LogBuffer {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

/// Routes this thread's tracing events into a buffer until the guard drops.
///
/// Only reliable on the current-thread runtime `#[tokio::test]` uses by
/// default, where the client's futures are polled on the test thread.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, LogBuffer) {
	let buffer = LogBuffer::default();
	let writer = buffer.clone();
	let subscriber = tracing_subscriber::fmt()
		.with_writer(move || writer.clone())
		.with_ansi(false)
		.with_max_level(tracing::Level::DEBUG)
		.finish();
	(tracing::subscriber::set_default(subscriber), buffer)
}
