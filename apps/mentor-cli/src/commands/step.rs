// step.rs — Step subcommands: add, done, undo, rename, delete, suggest.
//
// Each run starts with an empty cache, so the goal's steps are fetched
// before any single-step change.

use clap::Subcommand;
use mentor_app::AppContext;
use mentor_goal::{GoalError, StepPatch};
use uuid::Uuid;

use super::{check_mark, require_user};

#[derive(Subcommand)]
pub enum StepCommands {
    /// Add a step to a goal.
    Add { goal_id: Uuid, title: String },
    /// Mark a step done.
    Done { goal_id: Uuid, step_id: Uuid },
    /// Mark a step not done.
    Undo { goal_id: Uuid, step_id: Uuid },
    /// Rename a step.
    Rename {
        goal_id: Uuid,
        step_id: Uuid,
        title: String,
    },
    /// Delete a step.
    Delete { goal_id: Uuid, step_id: Uuid },
    /// Ask the AI mentor to propose steps and add them.
    Suggest { goal_id: Uuid },
}

pub async fn execute(cmd: &StepCommands, ctx: &AppContext) -> anyhow::Result<()> {
    require_user(ctx)?;
    let goals = ctx.goals();
    match cmd {
        StepCommands::Add { goal_id, title } => {
            goals.fetch_steps(*goal_id).await?;
            let step = goals.add_step(*goal_id, title).await?;
            println!("Step added: {} ({})", step.title, step.id);
        }
        StepCommands::Done { goal_id, step_id } => {
            set_completed(ctx, *goal_id, *step_id, true).await?;
        }
        StepCommands::Undo { goal_id, step_id } => {
            set_completed(ctx, *goal_id, *step_id, false).await?;
        }
        StepCommands::Rename {
            goal_id,
            step_id,
            title,
        } => {
            goals.fetch_steps(*goal_id).await?;
            let patch = StepPatch {
                title: Some(title.clone()),
                ..StepPatch::default()
            };
            let step = goals.update_step(*goal_id, *step_id, patch).await?;
            println!("Step renamed: {}", step.title);
        }
        StepCommands::Delete { goal_id, step_id } => {
            goals.fetch_steps(*goal_id).await?;
            goals.delete_step(*goal_id, *step_id).await?;
            println!("Step deleted: {}", step_id);
        }
        StepCommands::Suggest { goal_id } => suggest(ctx, *goal_id).await?,
    }
    Ok(())
}

async fn set_completed(
    ctx: &AppContext,
    goal_id: Uuid,
    step_id: Uuid,
    completed: bool,
) -> anyhow::Result<()> {
    ctx.goals().fetch_steps(goal_id).await?;
    let step = ctx
        .goals()
        .update_step(goal_id, step_id, StepPatch::completed(completed))
        .await?;
    println!("{} {}", check_mark(step.is_completed), step.title);
    Ok(())
}

async fn suggest(ctx: &AppContext, goal_id: Uuid) -> anyhow::Result<()> {
    let goal = ctx.goals().fetch_goal_by_id(goal_id).await?;
    ctx.goals().fetch_steps(goal_id).await?;

    let created = match ctx.goals().generate_and_add_steps(&goal).await {
        Ok(created) => created,
        Err(GoalError::SuggestionUnavailable) => {
            anyhow::bail!(
                "AI step suggestions are not configured. Set GEMINI_API_KEY or add [gemini] api_key to mentor.toml."
            );
        }
        Err(e) => return Err(e.into()),
    };

    if created.is_empty() {
        println!("No steps were suggested for \"{}\".", goal.title);
        return Ok(());
    }
    println!("Added {} suggested step(s) to \"{}\":", created.len(), goal.title);
    for step in &created {
        println!("  {} {}", check_mark(step.is_completed), step.title);
    }
    Ok(())
}
