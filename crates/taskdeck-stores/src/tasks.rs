//! Task store
//!
//! Holds the current user's tasks as last reported by the server. Local state is
//! only changed after the server confirms a mutation, and always with the entity
//! the server returned.
//!
//! Operations are applied in completion order. A `toggle_complete` that resolves
//! before a concurrently started `fetch_tasks` can be overwritten by the fetch's
//! older snapshot.

use futures_signals::signal::{Mutable, MutableSignal, MutableSignalCloned};
use futures_signals::signal_vec::{MutableSignalVec, MutableVec};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use taskdeck_client::ApiClient;
use taskdeck_client::models::{Task, TaskCreate, TaskListResponse, TaskQuery, TaskUpdate};
use tracing::debug;
use uuid::Uuid;

/// Which tasks [`TaskStore::filtered_tasks`] exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskFilter {
	#[default]
	All,
	Active,
	Completed,
}

impl TaskFilter {
	pub fn matches(self, task: &Task) -> bool {
		match self {
			Self::All => true,
			Self::Active => !task.is_completed,
			Self::Completed => task.is_completed,
		}
	}

	/// The matching `is_completed` query value.
	pub fn as_completed(self) -> Option<bool> {
		match self {
			Self::All => None,
			Self::Active => Some(false),
			Self::Completed => Some(true),
		}
	}
}

impl fmt::Display for TaskFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::All => write!(f, "all"),
			Self::Active => write!(f, "active"),
			Self::Completed => write!(f, "completed"),
		}
	}
}

impl FromStr for TaskFilter {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"all" => Ok(Self::All),
			"active" => Ok(Self::Active),
			"completed" => Ok(Self::Completed),
			other => Err(format!("unknown task filter: {}", other)),
		}
	}
}

fn task_endpoint(id: Uuid) -> String {
	format!("/tasks/{}", id)
}

/// Shared task list state
#[derive(Clone)]
pub struct TaskStore {
	client: ApiClient,
	tasks: MutableVec<Task>,
	total: Mutable<usize>,
	loading: Mutable<bool>,
	error: Mutable<Option<String>>,
	filter: Mutable<TaskFilter>,
}

impl TaskStore {
	pub fn new(client: ApiClient) -> Self {
		Self {
			client,
			tasks: MutableVec::new(),
			total: Mutable::new(0),
			loading: Mutable::new(false),
			error: Mutable::new(None),
			filter: Mutable::new(TaskFilter::All),
		}
	}

	pub fn client(&self) -> &ApiClient {
		&self.client
	}

	pub fn tasks(&self) -> Vec<Task> {
		self.tasks.lock_ref().to_vec()
	}

	pub fn task(&self, id: Uuid) -> Option<Task> {
		self.tasks.lock_ref().iter().find(|t| t.id == id).cloned()
	}

	pub fn total(&self) -> usize {
		self.total.get()
	}

	pub fn is_loading(&self) -> bool {
		self.loading.get()
	}

	pub fn error(&self) -> Option<String> {
		self.error.get_cloned()
	}

	pub fn filter(&self) -> TaskFilter {
		self.filter.get()
	}

	pub fn set_filter(&self, filter: TaskFilter) {
		self.filter.set_neq(filter);
	}

	pub fn clear_error(&self) {
		self.error.set_neq(None);
	}

	/// Changes to the collection, starting with its current contents.
	pub fn tasks_signal(&self) -> MutableSignalVec<Task> {
		self.tasks.signal_vec_cloned()
	}

	pub fn total_signal(&self) -> MutableSignal<usize> {
		self.total.signal()
	}

	pub fn loading_signal(&self) -> MutableSignal<bool> {
		self.loading.signal()
	}

	pub fn error_signal(&self) -> MutableSignalCloned<Option<String>> {
		self.error.signal_cloned()
	}

	pub fn filter_signal(&self) -> MutableSignal<TaskFilter> {
		self.filter.signal()
	}

	/// Tasks matching the current filter, in collection order.
	pub fn filtered_tasks(&self) -> Vec<Task> {
		let filter = self.filter.get();
		self.tasks
			.lock_ref()
			.iter()
			.filter(|task| filter.matches(task))
			.cloned()
			.collect()
	}

	/// Replaces the collection with the server's list.
	///
	/// On failure the previous collection is kept and the error recorded.
	pub async fn fetch_tasks(&self, is_completed: Option<bool>) {
		let query = TaskQuery::completed(is_completed);
		self.fetch_tasks_with(&query).await;
	}

	/// Like [`fetch_tasks`](Self::fetch_tasks), with pagination.
	pub async fn fetch_tasks_with(&self, query: &TaskQuery) {
		self.loading.set_neq(true);
		self.error.set_neq(None);

		let endpoint = query.endpoint();
		let response = self.client.get::<TaskListResponse>(&endpoint).await;

		if let Some(error) = response.error {
			self.error.set(Some(error));
		} else if let Some(list) = response.data {
			debug!(count = list.tasks.len(), total = list.total, "tasks fetched");
			self.tasks.lock_mut().replace_cloned(list.tasks);
			self.total.set(list.total);
		}

		self.loading.set_neq(false);
	}

	/// Creates a task and puts it at the front of the collection.
	pub async fn create_task(&self, data: TaskCreate) -> bool {
		self.error.set_neq(None);

		let response = self.client.post::<Task, _>("/tasks", Some(&data)).await;

		if let Some(error) = response.error {
			self.error.set(Some(error));
			return false;
		}
		match response.data {
			Some(task) => {
				debug!(task_id = %task.id, "task created");
				self.tasks.lock_mut().insert_cloned(0, task);
				*self.total.lock_mut() += 1;
				true
			}
			None => false,
		}
	}

	/// Sends a partial update and swaps in the server's version of the task.
	pub async fn update_task(&self, id: Uuid, data: TaskUpdate) -> bool {
		self.error.set_neq(None);

		let endpoint = task_endpoint(id);
		let response = self.client.put::<Task, _>(&endpoint, Some(&data)).await;

		if let Some(error) = response.error {
			self.error.set(Some(error));
			return false;
		}
		match response.data {
			Some(task) => {
				self.replace(task);
				true
			}
			None => false,
		}
	}

	/// Deletes a task. `total` never drops below zero.
	pub async fn delete_task(&self, id: Uuid) -> bool {
		self.error.set_neq(None);

		let response = self.client.delete::<Value>(&task_endpoint(id)).await;

		if let Some(error) = response.error {
			self.error.set(Some(error));
			return false;
		}

		debug!(task_id = %id, "task deleted");
		self.tasks.lock_mut().retain(|t| t.id != id);
		let mut total = self.total.lock_mut();
		*total = total.saturating_sub(1);
		true
	}

	/// Flips the completion flag of a locally known task.
	///
	/// Returns false without contacting the server if `id` is not in the collection.
	pub async fn toggle_complete(&self, id: Uuid) -> bool {
		let Some(current) = self.task(id).map(|t| t.is_completed) else {
			debug!(task_id = %id, "toggle requested for unknown task");
			return false;
		};

		self.update_task(id, TaskUpdate::completed(!current)).await
	}

	/// Re-reads a single task from the server.
	///
	/// The local entry is replaced if present; an unlisted task is not added.
	pub async fn refresh_task(&self, id: Uuid) -> bool {
		match self.get_task(id).await {
			Some(task) => {
				self.replace(task);
				true
			}
			None => false,
		}
	}

	/// Reads a single task from the server and makes sure it is in the collection.
	///
	/// A known entry is replaced in place; an unlisted one (for instance beyond
	/// the first page) is appended. `total` is left alone, since the task was
	/// already counted by the server.
	pub async fn load_task(&self, id: Uuid) -> bool {
		let Some(task) = self.get_task(id).await else {
			return false;
		};

		let mut tasks = self.tasks.lock_mut();
		match tasks.iter().position(|t| t.id == id) {
			Some(index) => tasks.set_cloned(index, task),
			None => {
				debug!(task_id = %id, "loaded unlisted task");
				tasks.push_cloned(task);
			}
		}
		true
	}

	async fn get_task(&self, id: Uuid) -> Option<Task> {
		self.error.set_neq(None);

		let response = self.client.get::<Task>(&task_endpoint(id)).await;

		if let Some(error) = response.error {
			self.error.set(Some(error));
			return None;
		}
		response.data
	}

	fn replace(&self, task: Task) {
		let mut tasks = self.tasks.lock_mut();
		if let Some(index) = tasks.iter().position(|t| t.id == task.id) {
			tasks.set_cloned(index, task);
		}
	}
}

impl fmt::Debug for TaskStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TaskStore")
			.field("client", &self.client)
			.field("tasks", &self.tasks.lock_ref().len())
			.field("total", &self.total.get())
			.field("filter", &self.filter.get())
			.field("error", &*self.error.lock_ref())
			.finish_non_exhaustive()
	}
}
