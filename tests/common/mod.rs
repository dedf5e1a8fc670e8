//! Shared fixtures for end-to-end tests
//!
//! [`FakeBackend`] is a stateful wiremock responder that behaves like the
//! Taskdeck server: accounts, bearer tokens, a rotating refresh cookie, per-user
//! tasks and the admin endpoints, all held in memory.

#![allow(dead_code)]

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use taskdeck::prelude::*;
use uuid::Uuid;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const PASSWORD: &str = "testpassword123";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "adminpassword123";

#[derive(Debug, Clone)]
struct Account {
	id: Uuid,
	email: String,
	password: String,
	is_admin: bool,
	is_active: bool,
	created_at: String,
	last_login_at: Option<String>,
}

impl Account {
	fn to_json(&self) -> Value {
		json!({
			"id": self.id,
			"email": self.email,
			"role": if self.is_admin { "admin" } else { "user" },
			"is_active": self.is_active,
			"created_at": self.created_at,
			"last_login_at": self.last_login_at,
		})
	}
}

#[derive(Debug, Clone)]
struct TaskRecord {
	id: Uuid,
	owner: Uuid,
	title: String,
	description: Option<String>,
	is_completed: bool,
	created_at: String,
	updated_at: String,
}

impl TaskRecord {
	fn to_json(&self) -> Value {
		json!({
			"id": self.id,
			"title": self.title,
			"description": self.description,
			"is_completed": self.is_completed,
			"created_at": self.created_at,
			"updated_at": self.updated_at,
		})
	}
}

#[derive(Debug, Default)]
struct State {
	accounts: Vec<Account>,
	// Newest first, like the server's `ORDER BY created_at DESC`.
	tasks: Vec<TaskRecord>,
	access_tokens: HashMap<String, Uuid>,
	refresh_tokens: HashMap<String, Uuid>,
}

/// The server emits naive timestamps; the client reads them as UTC.
fn now() -> String {
	Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn detail(status: u16, message: &str) -> ResponseTemplate {
	ResponseTemplate::new(status).set_body_json(json!({ "detail": message }))
}

fn validation_error(field: &str, message: &str) -> ResponseTemplate {
	ResponseTemplate::new(422).set_body_json(json!({
		"detail": [{ "loc": ["body", field], "msg": message, "type": "value_error" }]
	}))
}

fn json_body(request: &Request) -> Value {
	serde_json::from_slice(&request.body).unwrap_or(Value::Null)
}

fn bearer(request: &Request) -> Option<String> {
	request
		.headers
		.get("authorization")
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.strip_prefix("Bearer "))
		.map(str::to_string)
}

fn refresh_cookie(request: &Request) -> Option<String> {
	let header = request.headers.get("cookie")?.to_str().ok()?;
	header
		.split(';')
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(name, _)| *name == "refresh_token")
		.map(|(_, value)| value.to_string())
}

fn query(request: &Request) -> HashMap<String, String> {
	request.url.query_pairs().into_owned().collect()
}

impl State {
	fn account_index(&self, id: Uuid) -> Option<usize> {
		self.accounts.iter().position(|a| a.id == id)
	}

	fn authenticate(&self, request: &Request) -> Result<usize, ResponseTemplate> {
		let token = bearer(request).ok_or_else(|| detail(401, "Not authenticated"))?;
		let user_id = self
			.access_tokens
			.get(&token)
			.copied()
			.ok_or_else(|| detail(401, "Could not validate credentials"))?;
		match self.account_index(user_id) {
			Some(index) if self.accounts[index].is_active => Ok(index),
			_ => Err(detail(401, "User not found or inactive")),
		}
	}

	fn authenticate_admin(&self, request: &Request) -> Result<usize, ResponseTemplate> {
		let index = self.authenticate(request)?;
		if !self.accounts[index].is_admin {
			return Err(detail(403, "Admin access required"));
		}
		Ok(index)
	}

	fn issue_session(&mut self, index: usize, status: u16) -> ResponseTemplate {
		let account = &mut self.accounts[index];
		account.last_login_at = Some(now());
		let access = format!("access-{}", Uuid::new_v4());
		let refresh = Uuid::new_v4().to_string();
		let user = account.to_json();
		let user_id = account.id;

		self.access_tokens.insert(access.clone(), user_id);
		self.refresh_tokens.insert(refresh.clone(), user_id);

		ResponseTemplate::new(status)
			.insert_header(
				"set-cookie",
				format!("refresh_token={}; HttpOnly; Path=/; SameSite=Lax", refresh).as_str(),
			)
			.set_body_json(json!({
				"access_token": access,
				"token_type": "bearer",
				"user": user,
			}))
	}

	fn create_account(&mut self, email: &str, password: &str, is_admin: bool) -> usize {
		self.accounts.push(Account {
			id: Uuid::new_v4(),
			email: email.to_string(),
			password: password.to_string(),
			is_admin,
			is_active: true,
			created_at: now(),
			last_login_at: None,
		});
		self.accounts.len() - 1
	}

	fn register(&mut self, request: &Request) -> ResponseTemplate {
		let body = json_body(request);
		let email = body["email"].as_str().unwrap_or_default();
		let password = body["password"].as_str().unwrap_or_default();

		if !email.contains('@') {
			return validation_error("email", "value is not a valid email address");
		}
		if password.chars().count() < 8 {
			return validation_error("password", "String should have at least 8 characters");
		}
		if self.accounts.iter().any(|a| a.email == email) {
			return detail(409, "Email already registered");
		}

		let index = self.create_account(email, password, false);
		self.issue_session(index, 201)
	}

	fn login(&mut self, request: &Request) -> ResponseTemplate {
		let body = json_body(request);
		let email = body["email"].as_str().unwrap_or_default();
		let password = body["password"].as_str().unwrap_or_default();

		let Some(index) = self
			.accounts
			.iter()
			.position(|a| a.email == email && a.password == password)
		else {
			return detail(401, "Invalid email or password");
		};
		if !self.accounts[index].is_active {
			return detail(403, "Account is deactivated");
		}
		self.issue_session(index, 200)
	}

	fn logout(&mut self, request: &Request) -> ResponseTemplate {
		if let Some(refresh) = refresh_cookie(request) {
			self.refresh_tokens.remove(&refresh);
		}
		if let Some(access) = bearer(request) {
			self.access_tokens.remove(&access);
		}
		ResponseTemplate::new(204).insert_header("set-cookie", "refresh_token=; Max-Age=0; Path=/")
	}

	fn refresh(&mut self, request: &Request) -> ResponseTemplate {
		let Some(refresh) = refresh_cookie(request) else {
			return detail(401, "Refresh token required");
		};
		let Some(user_id) = self.refresh_tokens.remove(&refresh) else {
			return detail(401, "Invalid or expired refresh token");
		};
		if !self
			.account_index(user_id)
			.is_some_and(|i| self.accounts[i].is_active)
		{
			return detail(401, "User not found or inactive");
		}

		let access = format!("access-{}", Uuid::new_v4());
		let rotated = Uuid::new_v4().to_string();
		self.access_tokens.insert(access.clone(), user_id);
		self.refresh_tokens.insert(rotated.clone(), user_id);

		ResponseTemplate::new(200)
			.insert_header(
				"set-cookie",
				format!("refresh_token={}; HttpOnly; Path=/; SameSite=Lax", rotated).as_str(),
			)
			.set_body_json(json!({ "access_token": access, "token_type": "bearer" }))
	}

	fn me(&self, request: &Request) -> ResponseTemplate {
		match self.authenticate(request) {
			Ok(index) => ResponseTemplate::new(200).set_body_json(self.accounts[index].to_json()),
			Err(response) => response,
		}
	}

	fn list_tasks(&self, owner: Uuid, request: &Request) -> ResponseTemplate {
		let params = query(request);
		let is_completed = params
			.get("is_completed")
			.and_then(|v| v.parse::<bool>().ok());
		let limit = params
			.get("limit")
			.and_then(|v| v.parse::<usize>().ok())
			.unwrap_or(50);
		let offset = params
			.get("offset")
			.and_then(|v| v.parse::<usize>().ok())
			.unwrap_or(0);

		let matching: Vec<&TaskRecord> = self
			.tasks
			.iter()
			.filter(|t| t.owner == owner)
			.filter(|t| is_completed.is_none_or(|c| t.is_completed == c))
			.collect();
		let page: Vec<Value> = matching
			.iter()
			.skip(offset)
			.take(limit)
			.map(|t| t.to_json())
			.collect();

		ResponseTemplate::new(200).set_body_json(json!({ "tasks": page, "total": matching.len() }))
	}

	fn create_task(&mut self, owner: Uuid, request: &Request) -> ResponseTemplate {
		let body = json_body(request);
		let title = body["title"].as_str().unwrap_or_default();
		if title.is_empty() {
			return validation_error("title", "String should have at least 1 character");
		}

		let timestamp = now();
		let task = TaskRecord {
			id: Uuid::new_v4(),
			owner,
			title: title.to_string(),
			description: body["description"].as_str().map(str::to_string),
			is_completed: false,
			created_at: timestamp.clone(),
			updated_at: timestamp,
		};
		let response = ResponseTemplate::new(201).set_body_json(task.to_json());
		self.tasks.insert(0, task);
		response
	}

	fn task_index(&self, owner: Uuid, id: &str) -> Option<usize> {
		let id = Uuid::parse_str(id).ok()?;
		self.tasks
			.iter()
			.position(|t| t.id == id && t.owner == owner)
	}

	fn get_task(&self, owner: Uuid, id: &str) -> ResponseTemplate {
		match self.task_index(owner, id) {
			Some(index) => ResponseTemplate::new(200).set_body_json(self.tasks[index].to_json()),
			None => detail(404, "Task not found"),
		}
	}

	fn update_task(&mut self, owner: Uuid, id: &str, request: &Request) -> ResponseTemplate {
		let Some(index) = self.task_index(owner, id) else {
			return detail(404, "Task not found");
		};
		let body = json_body(request);
		if body["title"].as_str().is_some_and(str::is_empty) {
			return validation_error("title", "String should have at least 1 character");
		}

		let task = &mut self.tasks[index];
		if let Some(title) = body["title"].as_str() {
			task.title = title.to_string();
		}
		if let Some(description) = body["description"].as_str() {
			task.description = Some(description.to_string());
		}
		if let Some(is_completed) = body["is_completed"].as_bool() {
			task.is_completed = is_completed;
		}
		task.updated_at = now();
		ResponseTemplate::new(200).set_body_json(task.to_json())
	}

	fn delete_task(&mut self, owner: Uuid, id: &str) -> ResponseTemplate {
		match self.task_index(owner, id) {
			Some(index) => {
				self.tasks.remove(index);
				ResponseTemplate::new(204)
			}
			None => detail(404, "Task not found"),
		}
	}

	fn admin_json(&self, account: &Account) -> Value {
		let mut value = account.to_json();
		value["task_count"] = json!(self.tasks.iter().filter(|t| t.owner == account.id).count());
		value
	}

	fn admin_list_users(&self, request: &Request) -> ResponseTemplate {
		let params = query(request);
		let limit = params
			.get("limit")
			.and_then(|v| v.parse::<usize>().ok())
			.unwrap_or(50);
		let offset = params
			.get("offset")
			.and_then(|v| v.parse::<usize>().ok())
			.unwrap_or(0);

		let users: Vec<Value> = self
			.accounts
			.iter()
			.rev()
			.skip(offset)
			.take(limit)
			.map(|a| self.admin_json(a))
			.collect();
		ResponseTemplate::new(200)
			.set_body_json(json!({ "users": users, "total": self.accounts.len() }))
	}

	fn admin_user_index(&self, id: &str) -> Option<usize> {
		self.account_index(Uuid::parse_str(id).ok()?)
	}

	fn admin_get_user(&self, id: &str) -> ResponseTemplate {
		match self.admin_user_index(id) {
			Some(index) => {
				ResponseTemplate::new(200).set_body_json(self.admin_json(&self.accounts[index]))
			}
			None => detail(404, "User not found"),
		}
	}

	fn admin_update_user(&mut self, admin: usize, id: &str, request: &Request) -> ResponseTemplate {
		let Some(is_active) = json_body(request)["is_active"].as_bool() else {
			return validation_error("is_active", "Field required");
		};
		let Some(index) = self.admin_user_index(id) else {
			return detail(404, "User not found");
		};
		if index == admin && !is_active {
			return detail(400, "Cannot deactivate your own account");
		}

		self.accounts[index].is_active = is_active;
		ResponseTemplate::new(200).set_body_json(self.admin_json(&self.accounts[index]))
	}
}

/// In-memory stand-in for the Taskdeck server.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
	state: Arc<Mutex<State>>,
}

impl FakeBackend {
	/// Creates an account directly, bypassing `/auth/register`.
	pub fn seed_user(&self, email: &str, password: &str, is_admin: bool) -> Uuid {
		let mut state = self.state.lock();
		let index = state.create_account(email, password, is_admin);
		state.accounts[index].id
	}

	/// Deletes a task server-side, as another client would.
	pub fn remove_task(&self, id: Uuid) {
		self.state.lock().tasks.retain(|t| t.id != id);
	}

	pub fn task_count(&self, owner: Uuid) -> usize {
		self.state
			.lock()
			.tasks
			.iter()
			.filter(|t| t.owner == owner)
			.count()
	}

	pub fn is_active(&self, id: Uuid) -> Option<bool> {
		let state = self.state.lock();
		state.account_index(id).map(|i| state.accounts[i].is_active)
	}
}

impl Respond for FakeBackend {
	fn respond(&self, request: &Request) -> ResponseTemplate {
		let path = request.url.path().to_string();
		let Some(route) = path.strip_prefix("/api/") else {
			return detail(404, "Not Found");
		};
		let segments: Vec<&str> = route.trim_end_matches('/').split('/').collect();
		let mut state = self.state.lock();

		match (request.method.as_str(), segments.as_slice()) {
			("POST", ["auth", "register"]) => state.register(request),
			("POST", ["auth", "login"]) => state.login(request),
			("POST", ["auth", "logout"]) => state.logout(request),
			("POST", ["auth", "refresh"]) => state.refresh(request),
			("GET", ["auth", "me"]) => state.me(request),
			(verb, ["tasks", rest @ ..]) => {
				let owner = match state.authenticate(request) {
					Ok(index) => state.accounts[index].id,
					Err(response) => return response,
				};
				match (verb, rest) {
					("GET", []) => state.list_tasks(owner, request),
					("POST", []) => state.create_task(owner, request),
					("GET", [id]) => state.get_task(owner, id),
					("PUT", [id]) => state.update_task(owner, id, request),
					("DELETE", [id]) => state.delete_task(owner, id),
					_ => detail(405, "Method Not Allowed"),
				}
			}
			(verb, ["admin", "users", rest @ ..]) => {
				let admin = match state.authenticate_admin(request) {
					Ok(index) => index,
					Err(response) => return response,
				};
				match (verb, rest) {
					("GET", []) => state.admin_list_users(request),
					("GET", [id]) => state.admin_get_user(id),
					("PATCH", [id]) => state.admin_update_user(admin, id, request),
					_ => detail(405, "Method Not Allowed"),
				}
			}
			_ => detail(404, "Not Found"),
		}
	}
}

/// A running fake server plus handles to inspect its state.
pub struct TestEnv {
	pub server: MockServer,
	pub backend: FakeBackend,
}

impl TestEnv {
	pub async fn start() -> Self {
		Self::serve(MockServer::start().await).await
	}

	/// Like [`start`](Self::start), but the server stops listening when dropped
	/// instead of returning to wiremock's pool.
	pub async fn start_unpooled() -> Self {
		Self::serve(MockServer::builder().start().await).await
	}

	async fn serve(server: MockServer) -> Self {
		let backend = FakeBackend::default();
		Mock::given(any())
			.respond_with(backend.clone())
			.mount(&server)
			.await;
		Self { server, backend }
	}

	pub fn api_url(&self) -> String {
		format!("{}/api", self.server.uri())
	}

	/// A client with its own cookie jar and the given session.
	pub fn client_with(&self, session: Session) -> ApiClient {
		ApiClient::builder()
			.base_url(self.api_url())
			.session(session)
			.build()
			.unwrap()
	}

	/// A client that keeps its token and cookies on disk, like one CLI run.
	pub fn persistent_client(&self, token_path: &Path, cookie_path: &Path) -> ApiClient {
		ApiClient::builder()
			.base_url(self.api_url())
			.session(Session::new(FileTokenStorage::new(token_path)))
			.cookie_file(cookie_path)
			.build()
			.unwrap()
	}

	/// A client with a fresh in-memory session, like a new browser profile.
	pub fn client(&self) -> ApiClient {
		self.client_with(Session::in_memory())
	}

	/// Registers `email` through the API and returns a signed-in auth store.
	pub async fn signed_in(&self, email: &str) -> AuthStore {
		let auth = AuthStore::new(self.client());
		assert!(
			auth.register(email, PASSWORD).await,
			"register failed: {:?}",
			auth.error()
		);
		auth
	}

	/// Signs in as the seeded admin account.
	pub async fn signed_in_admin(&self) -> AuthStore {
		self.backend.seed_user(ADMIN_EMAIL, ADMIN_PASSWORD, true);
		let auth = AuthStore::new(self.client());
		assert!(
			auth.login(ADMIN_EMAIL, ADMIN_PASSWORD).await,
			"admin login failed: {:?}",
			auth.error()
		);
		auth
	}

	/// Request paths received so far, as `METHOD /path`.
	pub async fn requests(&self) -> Vec<String> {
		self.server
			.received_requests()
			.await
			.unwrap_or_default()
			.iter()
			.map(|r| format!("{} {}", r.method, r.url.path()))
			.collect()
	}
}

/// Unique email per test, mirroring `test-<timestamp>@example.com`.
pub fn unique_email() -> String {
	format!("test-{}@example.com", Uuid::new_v4().simple())
}
