// auth.rs — Auth subcommands: sign-up, sign-in, sign-out, whoami.

use clap::Subcommand;
use mentor_app::AppContext;
use mentor_gateway::Credentials;

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account.
    SignUp {
        email: String,
        /// Password (or set MENTOR_PASSWORD).
        #[arg(long, env = "MENTOR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in to an existing account.
    SignIn {
        email: String,
        /// Password (or set MENTOR_PASSWORD).
        #[arg(long, env = "MENTOR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the saved session.
    SignOut,
    /// Show who is signed in.
    Whoami,
}

pub async fn execute(cmd: &AuthCommands, ctx: &AppContext) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::SignUp { email, password } => {
            let session = ctx
                .auth()
                .sign_up(&Credentials::new(email, password))
                .await?;
            match session {
                Some(session) => {
                    println!("Account created. Signed in as {}.", email);
                    println!("  User ID: {}", session.user.id);
                    println!("\nNext: run `mentor onboard` to set up your profile.");
                }
                None => println!("Account created. Check {} to confirm your email, then sign in.", email),
            }
            Ok(())
        }
        AuthCommands::SignIn { email, password } => {
            let session = ctx
                .auth()
                .sign_in(&Credentials::new(email, password))
                .await?;
            println!("Signed in as {}.", email);
            println!("  User ID: {}", session.user.id);
            Ok(())
        }
        AuthCommands::SignOut => {
            ctx.auth().sign_out().await?;
            println!("Signed out.");
            Ok(())
        }
        AuthCommands::Whoami => whoami(ctx),
    }
}

fn whoami(ctx: &AppContext) -> anyhow::Result<()> {
    let state = ctx.session().snapshot();
    let Some(user) = state.user else {
        println!("Not signed in.");
        return Ok(());
    };

    println!("User ID:  {}", user.id);
    if let Some(email) = &user.email {
        println!("Email:    {}", email);
    }
    match &state.profile {
        Some(profile) => {
            if let Some(username) = &profile.username {
                println!("Username: {}", username);
            }
            let setup = if profile.has_completed_onboarding() {
                "complete"
            } else {
                "incomplete (run `mentor onboard`)"
            };
            println!("Setup:    {}", setup);
        }
        None => println!("Profile:  not created yet (run `mentor onboard`)"),
    }
    Ok(())
}
