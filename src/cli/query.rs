//! Query commands (ready, blocked, overdue, upcoming, stats, order)

use anyhow::{bail, Result};

use super::output::{due_label, Output};
use crate::domain::{Date, Priority, ToDo};
use crate::storage::Workspace;

/// Show tasks ready to work on
pub fn ready(workspace: &Workspace, output: &Output) -> Result<()> {
    let manager = workspace.load()?;
    let mut ready = manager.ready();
    ready.sort_by(|a, b| b.priority.cmp(&a.priority));
    tracing::debug!(count = ready.len(), "ready tasks");

    output.todos(&ready, "No tasks ready to work on.");
    Ok(())
}

/// Show blocked tasks and what they wait on
pub fn blocked(workspace: &Workspace, output: &Output) -> Result<()> {
    let manager = workspace.load()?;
    let blocked = manager.blocked();
    tracing::debug!(count = blocked.len(), "blocked tasks");

    let mut rows = Vec::with_capacity(blocked.len());
    for todo in &blocked {
        rows.push((*todo, manager.blocking_tasks(todo.id())?));
    }

    if output.is_json() {
        let items: Vec<_> = rows
            .iter()
            .map(|(todo, waiting_on)| {
                serde_json::json!({
                    "id": todo.id().to_string(),
                    "title": todo.title(),
                    "blocked_by": waiting_on.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
                })
            })
            .collect();
        output.data(&items);
    } else if rows.is_empty() {
        println!("No blocked tasks.");
    } else {
        println!("Blocked tasks ({}):", rows.len());
        println!("{:<14} {:<30} BLOCKED BY", "ID", "TITLE");
        println!("{}", "-".repeat(72));
        for (todo, waiting_on) in rows {
            let ids: Vec<_> = waiting_on.iter().map(|w| w.to_string()).collect();
            println!("{:<14} {:<30} {}", todo.id(), todo.title(), ids.join(", "));
        }
    }

    Ok(())
}

/// Show open tasks past their deadline
pub fn overdue(workspace: &Workspace, output: &Output) -> Result<()> {
    let manager = workspace.load()?;
    let today = Date::today();
    let mut overdue = manager.overdue(&today);
    overdue.sort_by_key(|t| t.deadline);

    if output.is_json() {
        output.todos(&overdue, "");
        return Ok(());
    }
    if overdue.is_empty() {
        println!("Nothing overdue.");
        return Ok(());
    }

    println!("Overdue tasks ({}):", overdue.len());
    print_due(&overdue, &today);
    Ok(())
}

/// Show open tasks due within `days` days
pub fn upcoming(workspace: &Workspace, output: &Output, days: Option<i64>) -> Result<()> {
    let days = days.unwrap_or(workspace.config().upcoming_days);
    if days < 0 {
        bail!("--days must not be negative");
    }

    let manager = workspace.load()?;
    let today = Date::today();
    let mut upcoming = manager.upcoming(&today, days);
    upcoming.sort_by_key(|t| t.deadline);

    if output.is_json() {
        output.todos(&upcoming, "");
        return Ok(());
    }
    if upcoming.is_empty() {
        println!("Nothing due in the next {} day(s).", days);
        return Ok(());
    }

    println!("Due in the next {} day(s):", days);
    print_due(&upcoming, &today);
    Ok(())
}

fn print_due(todos: &[&ToDo], today: &Date) {
    println!("{:<14} {:<11} {:<18} TITLE", "ID", "DEADLINE", "DUE");
    println!("{}", "-".repeat(72));
    for todo in todos {
        let Some(deadline) = todo.deadline else {
            continue;
        };
        println!(
            "{:<14} {:<11} {:<18} {}",
            todo.id(),
            deadline,
            due_label(deadline, today),
            todo.title()
        );
    }
}

/// Show collection statistics
pub fn stats(workspace: &Workspace, output: &Output, scope: Option<&str>) -> Result<()> {
    let manager = workspace.load()?;
    let stats = manager.stats(&Date::today());
    let scoped_hours = scope.map(|s| {
        manager
            .average_completion_time(Some(s))
            .map(|d| d.num_milliseconds() as f64 / 3_600_000.0)
    });

    if output.is_json() {
        let mut value = serde_json::to_value(&stats)?;
        if let (Some(scope), Some(map)) = (scope, value.as_object_mut()) {
            map.insert(
                "scope".into(),
                serde_json::json!({
                    "name": scope,
                    "average_completion_hours": scoped_hours.flatten(),
                }),
            );
        }
        output.data(&value);
        return Ok(());
    }

    println!("Tasks: {} total, {} open, {} done", stats.total, stats.open, stats.done);
    println!(
        "       {} ready, {} blocked, {} in progress, {} overdue",
        stats.ready, stats.blocked, stats.in_progress, stats.overdue
    );
    println!("Completion: {:.0}%", stats.completion_ratio * 100.0);
    match stats.average_completion_hours {
        Some(hours) => println!("Average time to complete: {:.1}h", hours),
        None => println!("Average time to complete: n/a"),
    }
    if let Some(scope) = scope {
        match scoped_hours.flatten() {
            Some(hours) => println!("Average time to complete ({}): {:.1}h", scope, hours),
            None => println!("Average time to complete ({}): n/a", scope),
        }
    }

    if !stats.by_priority.is_empty() {
        println!("\nBy priority:");
        for priority in Priority::ALL {
            if let Some(count) = stats.by_priority.get(&priority) {
                println!("  {:<11} {}", priority, count);
            }
        }
    }
    if !stats.by_category.is_empty() {
        println!("\nBy category:");
        for (category, count) in &stats.by_category {
            let name = if category.is_empty() { "(none)" } else { category.as_str() };
            println!("  {:<20} {}", name, count);
        }
    }

    Ok(())
}

/// List tasks with dependencies before dependents
pub fn order(workspace: &Workspace, output: &Output) -> Result<()> {
    let manager = workspace.load()?;
    let order = manager.topological_order()?;
    let todos: Vec<&ToDo> = order.iter().filter_map(|id| manager.get(id)).collect();

    output.todos(&todos, "No tasks");
    Ok(())
}
