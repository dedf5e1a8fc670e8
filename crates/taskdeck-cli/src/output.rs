//! Terminal rendering for users, tasks and admin listings.

use chrono::{DateTime, Utc};
use colored::Colorize;
use taskdeck_client::models::{AdminUser, Role, Task, User};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

fn timestamp(value: &DateTime<Utc>) -> String {
	value.format(TIMESTAMP_FORMAT).to_string()
}

fn role_label(role: Role) -> String {
	match role {
		Role::Admin => role.to_string().magenta().bold().to_string(),
		Role::User => role.to_string(),
	}
}

fn status_label(is_active: bool) -> String {
	if is_active {
		"active".green().to_string()
	} else {
		"inactive".red().to_string()
	}
}

pub(crate) fn format_user(user: &User) -> String {
	let mut out = format!(
		"{} ({})\n  id:      {}\n  status:  {}\n  joined:  {}",
		user.email.bold(),
		role_label(user.role),
		user.id,
		status_label(user.is_active),
		timestamp(&user.created_at),
	);
	if let Some(last) = &user.last_login_at {
		out.push_str(&format!("\n  last in: {}", timestamp(last)));
	}
	out
}

pub(crate) fn format_task(task: &Task) -> String {
	let marker = if task.is_completed {
		"[x]".green().to_string()
	} else {
		"[ ]".to_string()
	};
	let title = if task.is_completed {
		task.title.dimmed().to_string()
	} else {
		task.title.clone()
	};
	let mut line = format!("{} {}  {}", marker, title, task.id.to_string().dimmed());
	if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
		line.push_str(&format!("\n      {}", description.italic()));
	}
	line
}

pub(crate) fn format_task_list(tasks: &[Task], total: usize) -> String {
	if tasks.is_empty() {
		return "No tasks.".dimmed().to_string();
	}
	let mut out: Vec<String> = tasks.iter().map(format_task).collect();
	let shown = format!("{} of {} shown", tasks.len(), total);
	out.push(shown.dimmed().to_string());
	out.join("\n")
}

pub(crate) fn format_admin_user(entry: &AdminUser) -> String {
	format!(
		"{}\n  tasks:   {}",
		format_user(&entry.user),
		entry.task_count
	)
}

pub(crate) fn format_admin_users(users: &[AdminUser], total: usize) -> String {
	if users.is_empty() {
		return "No users.".dimmed().to_string();
	}
	let mut out: Vec<String> = users
		.iter()
		.map(|entry| {
			format!(
				"{:<36}  {:<32}  {:<8}  {:>5}  {}",
				entry.user.id.to_string(),
				entry.user.email,
				entry.user.role.to_string(),
				entry.task_count,
				status_label(entry.user.is_active),
			)
		})
		.collect();
	out.insert(
		0,
		format!(
			"{:<36}  {:<32}  {:<8}  {:>5}  {}",
			"ID", "EMAIL", "ROLE", "TASKS", "STATUS"
		)
		.bold()
		.to_string(),
	);
	let shown = format!("{} of {} shown", users.len(), total);
	out.push(shown.dimmed().to_string());
	out.join("\n")
}

pub(crate) fn success(message: &str) {
	println!("{} {}", "✓".green().bold(), message);
}
