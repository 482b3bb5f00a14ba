// goal.rs — Goal subcommands: list, add, show, edit, done, reopen, delete.

use chrono::NaiveDate;
use clap::Subcommand;
use mentor_app::AppContext;
use mentor_goal::{Goal, GoalDraft, GoalPatch, Priority};
use uuid::Uuid;

use super::{check_mark, require_user, truncate};

#[derive(Subcommand)]
pub enum GoalCommands {
    /// List your goals, newest first.
    List {
        /// Include completed goals.
        #[arg(long)]
        all: bool,
    },
    /// Add a goal.
    Add {
        /// Goal title (e.g., "Run a 10k").
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Target date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<NaiveDate>,
        /// low, medium, or high.
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },
    /// Show a goal and its steps.
    Show { id: Uuid },
    /// Change a goal's fields.
    Edit {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Mark a goal complete.
    Done { id: Uuid },
    /// Mark a completed goal as not done.
    Reopen { id: Uuid },
    /// Delete a goal and all of its steps.
    Delete { id: Uuid },
}

pub async fn execute(cmd: &GoalCommands, ctx: &AppContext) -> anyhow::Result<()> {
    require_user(ctx)?;
    match cmd {
        GoalCommands::List { all } => list_goals(ctx, *all).await,
        GoalCommands::Add {
            title,
            description,
            due,
            priority,
        } => {
            let mut draft = GoalDraft::new(title.as_str()).priority(*priority);
            draft.description = description.clone();
            draft.due_date = *due;
            let goal = ctx.goals().add_goal(draft).await?;
            println!("Goal added: {}", goal.id);
            println!("  Title:    {}", goal.title);
            println!("  Priority: {}", goal.priority);
            if ctx.suggestions_enabled() {
                println!("\nTip: `mentor step suggest {}` proposes steps for it.", goal.id);
            }
            Ok(())
        }
        GoalCommands::Show { id } => show_goal(ctx, *id).await,
        GoalCommands::Edit {
            id,
            title,
            description,
            clear_description,
            due,
            clear_due,
            priority,
        } => {
            let patch = GoalPatch {
                title: title.clone(),
                description: tri_state(description.clone(), *clear_description),
                due_date: tri_state(*due, *clear_due),
                priority: *priority,
                ..GoalPatch::default()
            };
            if patch.is_empty() {
                anyhow::bail!("Nothing to change. See `mentor goal edit --help`.");
            }
            let goal = ctx.goals().update_goal(*id, patch).await?;
            println!("Goal updated: {}", goal.title);
            Ok(())
        }
        GoalCommands::Done { id } => {
            let goal = ctx.goals().toggle_complete(*id, true).await?;
            println!("Completed: {}", goal.title);
            Ok(())
        }
        GoalCommands::Reopen { id } => {
            let goal = ctx.goals().toggle_complete(*id, false).await?;
            println!("Reopened: {}", goal.title);
            Ok(())
        }
        GoalCommands::Delete { id } => {
            ctx.goals().delete_goal(*id).await?;
            println!("Deleted goal: {}", id);
            Ok(())
        }
    }
}

/// `Some(Some(v))` to set, `Some(None)` to clear, `None` to leave alone.
fn tri_state<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

async fn list_goals(ctx: &AppContext, all: bool) -> anyhow::Result<()> {
    let goals: Vec<Goal> = ctx
        .goals()
        .fetch_goals()
        .await?
        .into_iter()
        .filter(|g| all || !g.is_completed)
        .collect();

    if goals.is_empty() {
        println!("No goals yet. Add one with `mentor goal add \"...\"`.");
        return Ok(());
    }

    println!(
        "{:<38} {:<4} {:<32} {:<8} {:<10}",
        "ID", "DONE", "TITLE", "PRIORITY", "DUE"
    );
    println!("{}", "-".repeat(96));
    for g in &goals {
        println!(
            "{:<38} {:<4} {:<32} {:<8} {:<10}",
            g.id,
            check_mark(g.is_completed),
            truncate(&g.title, 30),
            g.priority.to_string(),
            g.due_date.map(|d| d.to_string()).unwrap_or_default(),
        );
    }
    println!("\n{} goal(s).", goals.len());
    Ok(())
}

async fn show_goal(ctx: &AppContext, id: Uuid) -> anyhow::Result<()> {
    let goal = ctx.goals().fetch_goal_by_id(id).await?;
    let steps = ctx.goals().fetch_steps(id).await?;

    println!("Goal:      {}", goal.id);
    println!("Title:     {}", goal.title);
    if let Some(description) = &goal.description {
        println!("About:     {}", description);
    }
    println!("Priority:  {}", goal.priority);
    if let Some(due) = goal.due_date {
        println!("Due:       {}", due);
    }
    println!("Created:   {}", goal.created_at.to_rfc3339());
    match goal.completed_at {
        Some(at) => println!("Completed: {}", at.to_rfc3339()),
        None => println!("Completed: no"),
    }

    println!();
    if steps.is_empty() {
        println!("No steps yet.");
        return Ok(());
    }
    let done = steps.iter().filter(|s| s.is_completed).count();
    println!("Steps ({}/{} done):", done, steps.len());
    for step in &steps {
        println!("  {} {}  {}", check_mark(step.is_completed), step.id, step.title);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::signed_in_context;
    use mentor_gateway::StaticSuggestions;

    #[test]
    fn tri_state_maps_flags() {
        assert_eq!(tri_state(Some(1), false), Some(Some(1)));
        assert_eq!(tri_state::<i32>(None, true), Some(None));
        assert_eq!(tri_state::<i32>(None, false), None);
    }

    #[tokio::test]
    async fn add_edit_complete_and_delete() {
        let ctx = signed_in_context(StaticSuggestions::unavailable()).await;

        let add = GoalCommands::Add {
            title: "Learn Spanish".to_string(),
            description: Some("Conversational by June".to_string()),
            due: NaiveDate::from_ymd_opt(2030, 6, 1),
            priority: Priority::High,
        };
        execute(&add, &ctx).await.unwrap();
        let goal = ctx.goals().goals()[0].clone();
        assert_eq!(goal.priority, Priority::High);

        let edit = GoalCommands::Edit {
            id: goal.id,
            title: None,
            description: None,
            clear_description: true,
            due: None,
            clear_due: false,
            priority: None,
        };
        execute(&edit, &ctx).await.unwrap();
        assert!(ctx.goals().goals()[0].description.is_none());

        execute(&GoalCommands::Done { id: goal.id }, &ctx).await.unwrap();
        assert!(ctx.goals().goals()[0].is_completed);

        execute(&GoalCommands::Show { id: goal.id }, &ctx).await.unwrap();
        execute(&GoalCommands::Delete { id: goal.id }, &ctx).await.unwrap();
        assert!(ctx.goals().goals().is_empty());
    }

    #[tokio::test]
    async fn empty_edit_is_refused() {
        let ctx = signed_in_context(StaticSuggestions::unavailable()).await;
        let edit = GoalCommands::Edit {
            id: Uuid::new_v4(),
            title: None,
            description: None,
            clear_description: false,
            due: None,
            clear_due: false,
            priority: None,
        };
        assert!(execute(&edit, &ctx).await.is_err());
    }
}
