//! Task CLI commands

use anyhow::{bail, Result};
use clap::Args;

use super::output::{due_label, status_label, Output};
use crate::domain::{Date, Priority, SortKey, ToDo, ToDoManager, TodoFilter, TodoId, TodoUpdate};
use crate::storage::Workspace;

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,

    /// Category to group the task under
    #[arg(long, short)]
    pub category: Option<String>,

    /// Longer description
    #[arg(long, short)]
    pub description: Option<String>,

    /// Priority (critical, essential, important, moderate, background, low, parked)
    #[arg(long, short)]
    pub priority: Option<Priority>,

    /// Deadline (YYYY-MM-DD, today, tomorrow or +N days)
    #[arg(long)]
    pub deadline: Option<String>,

    /// Tag (repeatable)
    #[arg(long = "tag", short = 't')]
    pub tags: Vec<String>,

    /// Estimated effort in hours
    #[arg(long)]
    pub estimate: Option<f64>,

    /// Task this one depends on (repeatable)
    #[arg(long)]
    pub after: Vec<String>,

    /// Task that depends on this one (repeatable)
    #[arg(long)]
    pub blocks: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Sort keys, comma separated (priority, deadline, category, title, created_at)
    #[arg(long, short, value_delimiter = ',')]
    pub sort: Vec<SortKey>,

    /// Only this category
    #[arg(long, short)]
    pub category: Option<String>,

    /// Only this exact priority
    #[arg(long, short, conflicts_with = "min_priority")]
    pub priority: Option<Priority>,

    /// Only this priority or more important
    #[arg(long)]
    pub min_priority: Option<Priority>,

    /// Only tasks carrying this tag
    #[arg(long, short)]
    pub tag: Option<String>,

    /// Only done tasks
    #[arg(long, conflicts_with = "open")]
    pub done: bool,

    /// Only open tasks
    #[arg(long)]
    pub open: bool,

    /// Only overdue tasks
    #[arg(long)]
    pub overdue: bool,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID or unique prefix
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, short)]
    pub category: Option<String>,

    #[arg(long, short)]
    pub description: Option<String>,

    #[arg(long, short)]
    pub priority: Option<Priority>,

    /// New deadline; earlier dates are allowed here, unlike `extend`
    #[arg(long, conflicts_with = "clear_deadline")]
    pub deadline: Option<String>,

    #[arg(long)]
    pub clear_deadline: bool,

    /// Estimated effort in hours
    #[arg(long)]
    pub estimate: Option<f64>,

    /// Hours actually spent
    #[arg(long)]
    pub actual: Option<f64>,

    /// Tag to add (repeatable)
    #[arg(long)]
    pub add_tag: Vec<String>,

    /// Tag to remove (repeatable)
    #[arg(long)]
    pub remove_tag: Vec<String>,
}

/// Parses a deadline argument
///
/// Accepts `YYYY-MM-DD`, `today`, `tomorrow` and `+N` (days from today).
pub fn parse_date(input: &str, today: Date) -> Result<Date> {
    let input = input.trim();
    let date = match input.to_ascii_lowercase().as_str() {
        "today" => today,
        "tomorrow" => today.add_days(1)?,
        offset if offset.starts_with('+') => {
            let days: i64 = offset[1..]
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid day offset: {}", input))?;
            today.add_days(days)?
        }
        _ => input.parse()?,
    };
    Ok(date)
}

fn resolve_all(manager: &ToDoManager, queries: &[String]) -> Result<Vec<TodoId>> {
    queries
        .iter()
        .map(|q| manager.resolve(q).map_err(Into::into))
        .collect()
}

pub fn add(workspace: &Workspace, output: &Output, args: AddArgs) -> Result<()> {
    let mut manager = workspace.load()?;
    let today = Date::today();

    let mut todo = ToDo::new(args.title)?
        .with_category(args.category.unwrap_or_default())
        .with_description(args.description.unwrap_or_default());
    if let Some(priority) = args.priority {
        todo = todo.with_priority(priority);
    }
    if let Some(deadline) = &args.deadline {
        todo = todo.with_deadline(parse_date(deadline, today)?);
    }
    if let Some(hours) = args.estimate {
        todo = todo.with_estimated_time(hours)?;
    }
    for tag in args.tags {
        todo.add_tag(tag)?;
    }

    for dep in resolve_all(&manager, &args.after)? {
        todo.add_dependency(dep);
    }
    for dependent in resolve_all(&manager, &args.blocks)? {
        todo.add_dependent(dependent);
    }

    let id = manager.add_todo(todo)?;
    workspace.save(&manager)?;
    tracing::debug!(%id, "added task");

    let Some(todo) = manager.get(&id) else {
        bail!("Task vanished after insert: {}", id);
    };
    if output.is_json() {
        output.data(&todo.to_value());
    } else {
        output.success(&format!("Created task: {} - {}", id, todo.title()));
    }

    Ok(())
}

pub fn list(workspace: &Workspace, output: &Output, args: ListArgs) -> Result<()> {
    let manager = workspace.load()?;

    let mut filter = TodoFilter::new();
    if let Some(category) = args.category {
        filter = filter.category(category);
    }
    if let Some(priority) = args.priority {
        filter = filter.priority(priority);
    }
    if let Some(priority) = args.min_priority {
        filter = filter.priority_at_least(priority);
    }
    if let Some(tag) = args.tag {
        filter = filter.tag(tag);
    }
    if args.done {
        filter = filter.done(true);
    } else if args.open {
        filter = filter.done(false);
    }
    if args.overdue {
        filter = filter.overdue(true, Date::today());
    }

    let sort = if args.sort.is_empty() {
        workspace.config().default_sort.clone()
    } else {
        args.sort
    };
    tracing::debug!(?sort, ?filter, "listing tasks");

    let todos = manager.list_all(&sort, Some(&filter));
    output.todos(&todos, "No tasks");
    Ok(())
}

pub fn show(workspace: &Workspace, output: &Output, id_str: &str) -> Result<()> {
    let manager = workspace.load()?;
    let id = manager.resolve(id_str)?;
    let Some(todo) = manager.get(&id) else {
        bail!("Task not found: {}", id);
    };

    let blocking = manager.blocking_tasks(&id)?;
    let today = Date::today();

    if output.is_json() {
        let mut value = todo.to_value();
        if let Some(map) = value.as_object_mut() {
            map.insert("is_ready".into(), (!todo.is_done() && blocking.is_empty()).into());
            map.insert(
                "blocked_by".into(),
                blocking.iter().map(|b| b.to_string()).collect::<Vec<_>>().into(),
            );
            map.insert("is_overdue".into(), todo.is_overdue(&today).into());
        }
        output.data(&value);
        return Ok(());
    }

    println!("Task: {}", todo.id());
    println!("Title: {}", todo.title());
    println!("Status: {}", status_label(todo));
    println!("Priority: {}", todo.priority);
    if !todo.category.is_empty() {
        println!("Category: {}", todo.category);
    }
    if let Some(deadline) = todo.deadline {
        println!("Deadline: {} ({})", deadline, due_label(deadline, &today));
    }
    if !todo.tags.is_empty() {
        let tags: Vec<_> = todo.tags.iter().map(String::as_str).collect();
        println!("Tags: {}", tags.join(", "));
    }
    if let Some(hours) = todo.estimated_time() {
        println!("Estimate: {}h", hours);
    }
    if let Some(hours) = todo.actual_time() {
        println!("Spent: {}h", hours);
    }
    println!("Created: {}", todo.created_at().format("%Y-%m-%d %H:%M"));
    if let Some(completed) = todo.completed_at() {
        println!("Completed: {}", completed.format("%Y-%m-%d %H:%M"));
    }

    if !todo.dependencies().is_empty() {
        println!("\nDepends on:");
        for dep in todo.dependencies() {
            let label = manager
                .get(dep)
                .map(|d| format!("{} ({})", d.title(), status_label(d)))
                .unwrap_or_else(|| "?".to_string());
            println!("  {} {}", dep, label);
        }
    }
    if !todo.dependents().is_empty() {
        println!("\nRequired by:");
        for dependent in todo.dependents() {
            let title = manager.get(dependent).map(ToDo::title).unwrap_or("?");
            println!("  {} {}", dependent, title);
        }
    }

    if !todo.description.is_empty() {
        println!("\nDescription:");
        println!("{}", todo.description);
    }

    if !todo.is_done() {
        println!();
        if blocking.is_empty() {
            println!("Status: READY (all dependencies complete)");
        } else {
            println!("Status: BLOCKED (waiting on {} task(s))", blocking.len());
        }
    }

    Ok(())
}

pub fn done(
    workspace: &Workspace,
    output: &Output,
    id_str: &str,
    force: bool,
    actual: Option<f64>,
) -> Result<()> {
    let mut manager = workspace.load()?;
    let id = manager.resolve(id_str)?;

    if let Some(hours) = actual {
        let update = TodoUpdate {
            actual_time: Some(Some(hours)),
            ..Default::default()
        };
        manager.update_todo(&id, &update)?;
    }

    let eligible = if force {
        let skipped = manager.blocking_tasks(&id)?;
        if !skipped.is_empty() {
            tracing::warn!(%id, open = skipped.len(), "completing with open dependencies");
        }
        manager.force_complete(&id)?;
        Vec::new()
    } else {
        manager.complete(&id, true)?
    };
    workspace.save(&manager)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id.to_string(),
            "done": true,
            "actual_time": manager.get(&id).and_then(ToDo::actual_time),
            "now_ready": eligible.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        }));
    } else {
        output.success(&format!("Completed task: {}", id));
        for ready in &eligible {
            let title = manager.get(ready).map(ToDo::title).unwrap_or("?");
            println!("  now ready: {} {}", ready, title);
        }
    }

    Ok(())
}

/// Raises priorities of open tasks whose deadline is close or past
pub fn escalate(workspace: &Workspace, output: &Output) -> Result<()> {
    let mut manager = workspace.load()?;
    let escalated = manager.escalate_priorities(&Date::today());
    if !escalated.is_empty() {
        workspace.save(&manager)?;
    }
    tracing::debug!(count = escalated.len(), "escalated priorities");

    let todos: Vec<&ToDo> = escalated.iter().filter_map(|id| manager.get(id)).collect();
    if output.is_json() {
        output.todos(&todos, "");
    } else if todos.is_empty() {
        println!("No priorities changed.");
    } else {
        println!("Raised priority ({}):", todos.len());
        for todo in todos {
            println!("  {:<14} {:<11} {}", todo.id(), todo.priority, todo.title());
        }
    }

    Ok(())
}

pub fn undone(workspace: &Workspace, output: &Output, id_str: &str) -> Result<()> {
    let mut manager = workspace.load()?;
    let id = manager.resolve(id_str)?;

    let reopened = manager.reopen(&id)?;
    workspace.save(&manager)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id.to_string(),
            "done": false,
            "reopened_dependents": reopened.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
        }));
    } else {
        output.success(&format!("Reopened task: {}", id));
        for dependent in &reopened {
            println!("  also reopened: {}", dependent);
        }
    }

    Ok(())
}

pub fn start(workspace: &Workspace, output: &Output, id_str: &str) -> Result<()> {
    let mut manager = workspace.load()?;
    let id = manager.resolve(id_str)?;

    let blocking = manager.blocking_tasks(&id)?;
    if !blocking.is_empty() {
        tracing::warn!(%id, open = blocking.len(), "starting a blocked task");
    }
    manager.start(&id)?;
    workspace.save(&manager)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id.to_string(),
            "in_progress": true,
        }));
    } else {
        output.success(&format!("Started task: {}", id));
    }

    Ok(())
}

pub fn remove(workspace: &Workspace, output: &Output, id_str: &str) -> Result<()> {
    let mut manager = workspace.load()?;
    let id = manager.resolve(id_str)?;

    let removed = manager.remove_todo(&id)?;
    workspace.save(&manager)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id.to_string(),
            "removed": true,
        }));
    } else {
        output.success(&format!("Removed task: {} - {}", id, removed.title()));
    }

    Ok(())
}

pub fn add_dependency(
    workspace: &Workspace,
    output: &Output,
    task_str: &str,
    depends_on_str: &str,
) -> Result<()> {
    let mut manager = workspace.load()?;
    let task_id = manager.resolve(task_str)?;
    let depends_on_id = manager.resolve(depends_on_str)?;

    let reopened = manager.link(&task_id, &depends_on_id)?;
    workspace.save(&manager)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task_id.to_string(),
            "depends_on": depends_on_id.to_string(),
            "reopened": reopened.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
        }));
    } else {
        output.success(&format!("{} now depends on {}", task_id, depends_on_id));
        for id in &reopened {
            println!("  reopened: {}", id);
        }
    }

    Ok(())
}

pub fn remove_dependency(
    workspace: &Workspace,
    output: &Output,
    task_str: &str,
    depends_on_str: &str,
) -> Result<()> {
    let mut manager = workspace.load()?;
    let task_id = manager.resolve(task_str)?;
    let depends_on_id = manager.resolve(depends_on_str)?;

    manager.unlink(&task_id, &depends_on_id)?;
    workspace.save(&manager)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task_id.to_string(),
            "removed_dependency": depends_on_id.to_string(),
        }));
    } else {
        output.success(&format!(
            "{} no longer depends on {}",
            task_id, depends_on_id
        ));
    }

    Ok(())
}

pub fn extend(workspace: &Workspace, output: &Output, id_str: &str, date_str: &str) -> Result<()> {
    let mut manager = workspace.load()?;
    let id = manager.resolve(id_str)?;
    let date = parse_date(date_str, Date::today())?;

    manager.extend_deadline(&id, date)?;
    workspace.save(&manager)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id.to_string(),
            "deadline": date.to_string(),
        }));
    } else {
        output.success(&format!("Deadline of {} is now {}", id, date));
    }

    Ok(())
}

pub fn edit(workspace: &Workspace, output: &Output, args: EditArgs) -> Result<()> {
    let mut manager = workspace.load()?;
    let id = manager.resolve(&args.id)?;

    let deadline = match (&args.deadline, args.clear_deadline) {
        (_, true) => Some(None),
        (Some(d), false) => Some(Some(parse_date(d, Date::today())?)),
        (None, false) => None,
    };
    let update = TodoUpdate {
        title: args.title,
        category: args.category,
        description: args.description,
        priority: args.priority,
        deadline,
        estimated_time: args.estimate.map(Some),
        actual_time: args.actual.map(Some),
        add_tags: args.add_tag,
        remove_tags: args.remove_tag,
    };
    if update.is_empty() {
        bail!("Nothing to change; pass at least one attribute flag");
    }

    let value = manager.update_todo(&id, &update)?.to_value();
    workspace.save(&manager)?;

    if output.is_json() {
        output.data(&value);
    } else {
        output.success(&format!("Updated task: {}", id));
    }

    Ok(())
}
