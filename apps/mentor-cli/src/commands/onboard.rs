// onboard.rs — First-run setup: Welcome, then Profile.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use mentor_app::AppContext;
use mentor_session::OnboardingStep;

use super::require_user;

#[derive(Args)]
pub struct OnboardArgs {
    /// Username to show on your profile.
    #[arg(long)]
    pub username: Option<String>,

    /// Personal website.
    #[arg(long)]
    pub website: Option<String>,

    /// Image file to use as your avatar.
    #[arg(long)]
    pub avatar: Option<PathBuf>,
}

pub async fn execute(args: &OnboardArgs, ctx: &AppContext) -> anyhow::Result<()> {
    require_user(ctx)?;
    if ctx
        .session()
        .profile()
        .is_some_and(|p| p.has_completed_onboarding())
    {
        println!("Setup is already complete.");
        return Ok(());
    }

    let mut flow = ctx.onboarding();
    while flow.current() != OnboardingStep::Profile {
        print_step(flow.step_number(), flow.step_count(), flow.current());
        if flow.current() == OnboardingStep::Welcome {
            println!("  Welcome to Lifelong Mentor. Set goals, break them into steps,");
            println!("  and track your progress over time.");
        }
        flow.next();
    }

    print_step(flow.step_number(), flow.step_count(), flow.current());
    flow.save_profile_details(args.username.as_deref(), args.website.as_deref())
        .await?;
    if let Some(path) = &args.avatar {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read avatar {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("avatar");
        let url = flow.upload_avatar(file_name, bytes).await?;
        println!("  Avatar uploaded: {}", url);
    }

    flow.finish().await?;
    println!("\nSetup complete. Add your first goal with `mentor goal add \"...\"`.");
    Ok(())
}

fn print_step(number: usize, count: usize, step: OnboardingStep) {
    println!("Step {} of {}: {}", number, count, step);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::signed_in_context;
    use mentor_gateway::StaticSuggestions;
    use tempfile::TempDir;

    #[tokio::test]
    async fn onboarding_saves_details_avatar_and_completes() {
        let ctx = signed_in_context(StaticSuggestions::unavailable()).await;
        let dir = TempDir::new().unwrap();
        let avatar = dir.path().join("me.jpg");
        std::fs::write(&avatar, [0xff, 0xd8, 0xff]).unwrap();

        let args = OnboardArgs {
            username: Some("grace".to_string()),
            website: None,
            avatar: Some(avatar),
        };
        execute(&args, &ctx).await.unwrap();

        let profile = ctx.session().profile().unwrap();
        assert_eq!(profile.username.as_deref(), Some("grace"));
        assert!(profile.avatar_url.as_deref().unwrap().ends_with(".jpg"));
        assert!(profile.has_completed_onboarding());
    }
}
