// mod.rs — Subcommand modules and the helpers they share.

pub mod auth;
pub mod goal;
pub mod onboard;
pub mod profile;
pub mod step;

use chrono::Utc;
use mentor_app::AppContext;
use uuid::Uuid;

/// Exchange an expired access token before anything else touches the backend.
pub async fn refresh_if_expired(ctx: &AppContext) {
    let Some(session) = ctx.gateway().session().await else {
        return;
    };
    if !session.is_expired_at(Utc::now().timestamp()) {
        return;
    }
    if let Err(e) = ctx.gateway().refresh_session().await {
        tracing::warn!(error = %e, "could not refresh expired session");
        eprintln!("Your session has expired. Run `mentor auth sign-in` again.");
    }
}

/// The signed-in user's id, or an error telling the user to sign in.
pub fn require_user(ctx: &AppContext) -> anyhow::Result<Uuid> {
    let state = ctx.session().snapshot();
    let Some(user_id) = state.user.as_ref().map(|user| user.id) else {
        anyhow::bail!("Not signed in. Run `mentor auth sign-in` first.");
    };
    if state.needs_onboarding() {
        eprintln!("Tip: finish setting up your account with `mentor onboard`.");
    }
    Ok(user_id)
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}

pub fn check_mark(done: bool) -> &'static str {
    if done {
        "[x]"
    } else {
        "[ ]"
    }
}
