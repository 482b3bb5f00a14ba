// profile.rs — Profile subcommands: show, set, avatar.

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use mentor_app::AppContext;
use mentor_session::ProfileUpdate;

use super::require_user;

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show your profile.
    Show,
    /// Change profile fields.
    Set {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },
    /// Upload a new avatar image.
    Avatar {
        /// Image file.
        path: PathBuf,
    },
}

pub async fn execute(cmd: &ProfileCommands, ctx: &AppContext) -> anyhow::Result<()> {
    require_user(ctx)?;
    match cmd {
        ProfileCommands::Show => show(ctx),
        ProfileCommands::Set {
            username,
            full_name,
            website,
        } => {
            let update = ProfileUpdate {
                username: username.clone(),
                full_name: full_name.clone(),
                website: website.clone(),
                ..ProfileUpdate::default()
            };
            if update == ProfileUpdate::default() {
                anyhow::bail!("Nothing to change. Pass --username, --full-name, or --website.");
            }
            ctx.profiles().update_profile(update).await?;
            println!("Profile updated.");
            show(ctx)
        }
        ProfileCommands::Avatar { path } => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("avatar");
            let url = ctx.profiles().upload_avatar(file_name, bytes).await?;
            println!("Avatar uploaded: {}", url);
            Ok(())
        }
    }
}

fn show(ctx: &AppContext) -> anyhow::Result<()> {
    let Some(profile) = ctx.session().profile() else {
        println!("No profile yet. Run `mentor onboard` to create one.");
        return Ok(());
    };
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    println!("Username:  {}", field(&profile.username));
    println!("Full name: {}", field(&profile.full_name));
    println!("Website:   {}", field(&profile.website));
    println!("Avatar:    {}", field(&profile.avatar_url));
    if let Some(updated_at) = profile.updated_at {
        println!("Updated:   {}", updated_at.to_rfc3339());
    }
    Ok(())
}
