// session_flow.rs — End-to-end session behavior against the in-memory gateway.

use std::sync::Arc;
use std::time::Duration;

use mentor_gateway::{tables, Credentials, DataGateway, MemoryGateway, AVATAR_BUCKET};
use mentor_session::{
    AuthService, OnboardingFlow, ProfileService, ProfileUpdate, SessionError, SessionListener,
    SessionState, SessionStore,
};
use serde_json::json;
use uuid::Uuid;

struct Harness {
    memory: Arc<MemoryGateway>,
    store: SessionStore,
    profiles: ProfileService,
    auth: AuthService,
}

fn harness(memory: MemoryGateway) -> Harness {
    let memory = Arc::new(memory);
    let gateway: Arc<dyn DataGateway> = memory.clone();
    let store = SessionStore::new();
    let profiles = ProfileService::new(Arc::clone(&gateway), store.clone());
    let auth = AuthService::new(gateway, store.clone(), profiles.clone());
    Harness {
        memory,
        store,
        profiles,
        auth,
    }
}

fn signed_in_harness() -> (Harness, Uuid) {
    let user_id = Uuid::new_v4();
    let h = harness(MemoryGateway::new().with_session(MemoryGateway::session_for(user_id)));
    (h, user_id)
}

/// Poll until the listener task has applied what we expect.
async fn settle(store: &SessionStore, done: impl Fn(&SessionState) -> bool) -> SessionState {
    for _ in 0..200 {
        let state = store.snapshot();
        if done(&state) {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session store never settled: {:?}", store.snapshot());
}

#[tokio::test]
async fn listener_applies_sign_in_and_sign_out() {
    let h = harness(MemoryGateway::new());
    let gateway: Arc<dyn DataGateway> = h.memory.clone();
    let _listener = SessionListener::attach(&gateway, h.store.clone(), h.profiles.clone());

    gateway
        .sign_up(&Credentials::new("ada@example.com", "hunter22"))
        .await
        .unwrap();
    let state = settle(&h.store, |s| s.is_signed_in() && s.is_resolved()).await;
    assert_eq!(
        state.user.and_then(|u| u.email).as_deref(),
        Some("ada@example.com")
    );

    h.store.set_profile(Some(mentor_session::Profile::empty(Uuid::new_v4())));
    gateway.sign_out().await.unwrap();
    let state = settle(&h.store, |s| !s.is_signed_in()).await;
    assert!(state.user.is_none());
    assert!(state.profile.is_none());
}

#[tokio::test]
async fn dropped_listener_stops_applying_events() {
    let h = harness(MemoryGateway::new());
    let gateway: Arc<dyn DataGateway> = h.memory.clone();
    let listener = SessionListener::attach(&gateway, h.store.clone(), h.profiles.clone());
    drop(listener);

    gateway
        .sign_up(&Credentials::new("ada@example.com", "hunter22"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let state = h.store.snapshot();
    assert!(!state.is_signed_in());
    assert!(state.loading);
}

#[tokio::test]
async fn store_is_current_as_soon_as_sign_in_returns() {
    let h = harness(MemoryGateway::new());
    let credentials = Credentials::new("ada@example.com", "hunter22");

    let created = h.auth.sign_up(&credentials).await.unwrap().unwrap();
    assert_eq!(h.store.current_user_id(), Some(created.user.id));
    h.profiles
        .update_profile(ProfileUpdate::default().username("ada"))
        .await
        .unwrap();

    h.auth.sign_out().await.unwrap();
    let state = h.store.snapshot();
    assert!(!state.is_signed_in());
    assert!(state.profile.is_none());

    let session = h.auth.sign_in(&credentials).await.unwrap();
    assert_eq!(h.store.current_user_id(), Some(session.user.id));
}

#[tokio::test]
async fn restore_session_loads_profile() {
    let (h, user_id) = signed_in_harness();
    h.memory
        .seed(tables::PROFILES, json!({"id": user_id, "username": "ada"}));

    let session = h.auth.restore_session().await;
    assert_eq!(session.map(|s| s.user.id), Some(user_id));

    let state = h.store.snapshot();
    assert!(state.is_resolved());
    assert_eq!(
        state.profile.and_then(|p| p.username).as_deref(),
        Some("ada")
    );
}

#[tokio::test]
async fn restore_without_session_still_resolves() {
    let h = harness(MemoryGateway::new());
    assert!(h.auth.restore_session().await.is_none());

    let state = h.store.snapshot();
    assert!(state.is_resolved());
    assert!(!state.is_signed_in());
    assert_eq!(h.memory.table_calls(), 0);
}

#[tokio::test]
async fn update_profile_requires_session() {
    let h = harness(MemoryGateway::new());
    let err = h
        .profiles
        .update_profile(ProfileUpdate::default().username("ada"))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::NotSignedIn);
    assert_eq!(err.to_string(), "No user logged in");
}

#[tokio::test]
async fn update_profile_stamps_owner_and_refreshes_cache() {
    let (h, user_id) = signed_in_harness();
    h.auth.restore_session().await;

    h.profiles
        .update_profile(ProfileUpdate::default().full_name("Ada Lovelace"))
        .await
        .unwrap();

    let profile = h.store.profile().unwrap();
    assert_eq!(profile.id, user_id);
    assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));
    assert!(profile.updated_at.is_some());
}

#[tokio::test]
async fn avatar_upload_stores_object_and_points_profile_at_it() {
    let (h, user_id) = signed_in_harness();
    h.auth.restore_session().await;

    let url = h
        .profiles
        .upload_avatar("me.PNG", vec![0x89, 0x50, 0x4e, 0x47])
        .await
        .unwrap();

    let prefix = format!("memory://storage/{}/{}/", AVATAR_BUCKET, user_id);
    assert!(url.starts_with(&prefix), "{}", url);
    assert!(url.ends_with(".png"), "{}", url);

    let path = url.trim_start_matches(&format!("memory://storage/{}/", AVATAR_BUCKET));
    assert_eq!(
        h.memory.object(AVATAR_BUCKET, path),
        Some(vec![0x89, 0x50, 0x4e, 0x47])
    );
    assert_eq!(h.store.profile().unwrap().avatar_url, Some(url));
}

#[tokio::test]
async fn avatar_without_extension_uses_bin() {
    let (h, _) = signed_in_harness();
    h.auth.restore_session().await;

    let url = h.profiles.upload_avatar("avatar", vec![1, 2, 3]).await.unwrap();
    assert!(url.ends_with(".bin"), "{}", url);
}

#[tokio::test]
async fn onboarding_marks_profile_complete() {
    let (h, _) = signed_in_harness();
    h.auth.restore_session().await;
    h.profiles
        .update_profile(ProfileUpdate::default().onboarding_complete(false))
        .await
        .unwrap();
    assert!(h.store.snapshot().needs_onboarding());

    let mut flow = OnboardingFlow::new(h.profiles.clone());
    flow.next();
    flow.save_profile_details(Some(" ada "), Some(""))
        .await
        .unwrap();
    flow.finish().await.unwrap();

    let state = h.store.snapshot();
    assert!(!state.needs_onboarding());
    let profile = state.profile.unwrap();
    assert_eq!(profile.username.as_deref(), Some("ada"));
    assert!(profile.website.is_none());
    assert!(profile.has_completed_onboarding());
}
