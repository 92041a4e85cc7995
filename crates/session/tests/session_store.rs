mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use haven_core::auth::{RegisterRequest, UpdateProfileRequest};
use haven_core::Role;
use haven_events::{LogoutReason, SessionEventKind};
use haven_session::credentials::{TOKEN_KEY, USER_KEY};
use haven_session::{
    navigate, BackoffConfig, CredentialState, GuardDecision, MemoryStorage, RevalidationPolicy,
    SessionError, Storage,
};
use tokio_util::sync::CancellationToken;

use common::{
    build_test_app, eventually, file_storage, stored_user, EMAIL, PASSWORD, SLOW_RESPONSE, TOKEN,
};

/// Both credential keys present, or neither.
fn storage_is_consistent(storage: &dyn Storage) -> bool {
    let token = storage.get(TOKEN_KEY).unwrap();
    let user = storage.get(USER_KEY).unwrap();
    token.is_some() == user.is_some()
}

fn fast_retry(max_attempts: u32) -> RevalidationPolicy {
    RevalidationPolicy::RetryTransient(BackoffConfig {
        max_attempts,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(40),
        multiplier: 2.0,
    })
}

#[tokio::test]
async fn login_persists_token_and_profile() {
    let dir = tempfile::tempdir().unwrap();
    let storage = file_storage(&dir);
    let app = build_test_app(storage.clone(), RevalidationPolicy::FailClosed).await;
    let mut rx = app.bus.subscribe();
    app.store.initialize().await;

    let user = app.store.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(user.role, Role::Patient);
    assert_eq!(user.home_path(), "/patient");

    let snap = app.store.snapshot();
    assert!(snap.is_authenticated());
    assert_eq!(snap.token.as_deref(), Some(TOKEN));
    assert_eq!(snap.user.as_ref().map(|u| u.id.as_str()), Some("u1"));

    assert_matches!(
        app.credentials.load().unwrap(),
        CredentialState::Present(c) if c.token == TOKEN && c.user.id == "u1"
    );
    assert!(storage_is_consistent(storage.as_ref()));
    assert_matches!(
        rx.recv().await.unwrap().kind,
        SessionEventKind::LoggedIn { role: Role::Patient, .. }
    );
}

#[tokio::test]
async fn failed_login_leaves_session_anonymous() {
    let storage = Arc::new(MemoryStorage::new());
    let app = build_test_app(storage.clone(), RevalidationPolicy::FailClosed).await;
    app.store.initialize().await;

    let err = app.store.login(EMAIL, "wrong").await.unwrap_err();
    assert_eq!(err.message(), "Invalid email or password");
    assert!(!app.store.is_authenticated());
    assert_eq!(app.credentials.load().unwrap(), CredentialState::Absent);
}

#[tokio::test]
async fn startup_with_valid_token_refreshes_profile() {
    let dir = tempfile::tempdir().unwrap();
    let storage = file_storage(&dir);
    let app = build_test_app(storage.clone(), RevalidationPolicy::FailClosed).await;
    app.credentials.save(TOKEN, &stored_user()).unwrap();

    let snap = app.store.initialize().await;
    assert!(!snap.loading);
    assert!(snap.is_authenticated());
    assert_eq!(snap.user.as_ref().map(|u| u.name.as_str()), Some("Fresh Name"));
    assert_matches!(
        app.credentials.load().unwrap(),
        CredentialState::Present(c) if c.user.name == "Fresh Name"
    );
}

#[tokio::test]
async fn startup_with_rejected_token_logs_out() {
    let dir = tempfile::tempdir().unwrap();
    let storage = file_storage(&dir);
    let app = build_test_app(storage.clone(), RevalidationPolicy::FailClosed).await;
    app.credentials.save("expired", &stored_user()).unwrap();

    let snap = app.store.initialize().await;
    assert!(!snap.loading);
    assert!(!snap.is_authenticated());
    assert_eq!(snap.token, None);
    assert_eq!(app.credentials.load().unwrap(), CredentialState::Absent);
    assert!(storage_is_consistent(storage.as_ref()));
}

#[tokio::test]
async fn startup_revalidation_runs_once() {
    let storage = Arc::new(MemoryStorage::new());
    let app = build_test_app(storage, RevalidationPolicy::FailClosed).await;
    app.credentials.save(TOKEN, &stored_user()).unwrap();

    let first = app.store.initialize().await;
    let second = app.store.initialize().await;
    assert_eq!(first, second);
    assert_eq!(app.backend.me_calls(), 1);
}

#[tokio::test]
async fn half_written_record_is_wiped_at_startup() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_many(&[(TOKEN_KEY, TOKEN.to_string())]).unwrap();
    let app = build_test_app(storage.clone(), RevalidationPolicy::FailClosed).await;
    let mut rx = app.bus.subscribe();

    let snap = app.store.initialize().await;
    assert!(!snap.is_authenticated());
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(app.backend.me_calls(), 0);
    assert_matches!(
        rx.try_recv().map(|e| e.kind),
        Ok(SessionEventKind::LoggedOut {
            reason: LogoutReason::CorruptCredentials
        })
    );
}

#[tokio::test]
async fn fail_closed_treats_outage_as_invalid_session() {
    let storage = Arc::new(MemoryStorage::new());
    let app = build_test_app(storage, RevalidationPolicy::FailClosed).await;
    app.credentials.save(TOKEN, &stored_user()).unwrap();
    app.backend.fail_me(1);

    let snap = app.store.initialize().await;
    assert!(!snap.is_authenticated());
    assert_eq!(app.backend.me_calls(), 1);
    assert_eq!(app.credentials.load().unwrap(), CredentialState::Absent);
}

#[tokio::test]
async fn retry_policy_rides_out_a_short_outage() {
    let storage = Arc::new(MemoryStorage::new());
    let app = build_test_app(storage, fast_retry(3)).await;
    app.credentials.save(TOKEN, &stored_user()).unwrap();
    app.backend.fail_me(2);

    let snap = app.store.initialize().await;
    assert!(snap.is_authenticated());
    assert_eq!(app.backend.me_calls(), 3);
}

#[tokio::test]
async fn retry_policy_gives_up_after_max_attempts() {
    let storage = Arc::new(MemoryStorage::new());
    let app = build_test_app(storage, fast_retry(2)).await;
    app.credentials.save(TOKEN, &stored_user()).unwrap();
    app.backend.fail_me(5);

    let snap = app.store.initialize().await;
    assert!(!snap.is_authenticated());
    assert_eq!(app.backend.me_calls(), 2);
    assert_eq!(app.credentials.load().unwrap(), CredentialState::Absent);
}

#[tokio::test]
async fn retry_policy_does_not_retry_a_rejected_token() {
    let storage = Arc::new(MemoryStorage::new());
    let app = build_test_app(storage, fast_retry(5)).await;
    app.credentials.save("expired", &stored_user()).unwrap();

    let snap = app.store.initialize().await;
    assert!(!snap.is_authenticated());
    assert_eq!(app.backend.me_calls(), 1);
}

#[tokio::test]
async fn any_401_clears_session_and_navigates_to_login() {
    let dir = tempfile::tempdir().unwrap();
    let storage = file_storage(&dir);
    let app = build_test_app(storage.clone(), RevalidationPolicy::FailClosed).await;
    app.store.initialize().await;
    app.store.login(EMAIL, PASSWORD).await.unwrap();

    let cancel = CancellationToken::new();
    let listener = app.store.spawn_listener(cancel.clone());
    let mut rx = app.bus.subscribe();

    let err = app.store.api().admin().users(None, None).await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    let store = app.store.clone();
    assert!(eventually(move || !store.is_authenticated()).await);
    assert_eq!(app.credentials.load().unwrap(), CredentialState::Absent);
    assert!(storage_is_consistent(storage.as_ref()));

    let mut kinds = Vec::new();
    while let Ok(Ok(event)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
        kinds.push(event.kind);
    }
    assert!(kinds.contains(&SessionEventKind::LoggedOut {
        reason: LogoutReason::Unauthenticated
    }));
    assert!(kinds.contains(&SessionEventKind::Navigate {
        to: "/login".into(),
        replace: true
    }));

    assert_eq!(
        navigate(&app.store.snapshot(), "/patient"),
        GuardDecision::Redirect {
            to: "/login",
            replace: true
        }
    );

    cancel.cancel();
    listener.await.unwrap();
}

#[tokio::test]
async fn late_401_from_previous_session_keeps_new_login() {
    let storage = Arc::new(MemoryStorage::new());
    let app = build_test_app(storage, RevalidationPolicy::FailClosed).await;
    app.store.initialize().await;
    app.store.login(EMAIL, PASSWORD).await.unwrap();

    let cancel = CancellationToken::new();
    let listener = app.store.spawn_listener(cancel.clone());
    let mut rx = app.bus.subscribe();

    // Sent under the first session; answered after the second one starts.
    let store = app.store.clone();
    let slow = tokio::spawn(async move { store.api().admin().analytics().await });
    tokio::time::sleep(SLOW_RESPONSE / 3).await;
    app.store.logout();
    app.store.login(EMAIL, PASSWORD).await.unwrap();

    assert_eq!(slow.await.unwrap().unwrap_err().status(), Some(401));
    loop {
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("signal published")
            .unwrap();
        if matches!(event.kind, SessionEventKind::Unauthenticated { .. }) {
            break;
        }
    }
    // Give the listener a chance to act on the signal.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(app.store.is_authenticated());
    assert_eq!(app.store.token().as_deref(), Some(TOKEN));
    assert_matches!(app.credentials.load().unwrap(), CredentialState::Present(_));

    cancel.cancel();
    listener.await.unwrap();
}

#[tokio::test]
async fn anonymous_startup_leaves_no_credential_file() {
    let dir = tempfile::tempdir().unwrap();
    let storage = file_storage(&dir);
    let app = build_test_app(storage.clone(), RevalidationPolicy::FailClosed).await;

    let snap = app.store.initialize().await;
    assert!(!snap.loading);
    assert!(!snap.is_authenticated());
    assert!(!storage.path().exists());
}

#[tokio::test]
async fn profile_update_replaces_cached_copy() {
    let storage = Arc::new(MemoryStorage::new());
    let app = build_test_app(storage, RevalidationPolicy::FailClosed).await;
    app.store.initialize().await;
    app.store.login(EMAIL, PASSWORD).await.unwrap();

    let request = UpdateProfileRequest {
        name: Some("Asha Rao".into()),
        ..Default::default()
    };
    let user = app.store.update_profile(&request).await.unwrap();
    assert_eq!(user.name, "Asha Rao");
    assert_eq!(app.store.user().map(|u| u.name), Some("Asha Rao".into()));
    assert_matches!(
        app.credentials.load().unwrap(),
        CredentialState::Present(c) if c.user.name == "Asha Rao" && c.token == TOKEN
    );

    assert_matches!(
        app.store.update_profile(&UpdateProfileRequest::default()).await,
        Err(SessionError::Invalid(_))
    );
}

#[tokio::test]
async fn register_does_not_start_a_session() {
    let storage = Arc::new(MemoryStorage::new());
    let app = build_test_app(storage, RevalidationPolicy::FailClosed).await;
    app.store.initialize().await;

    let request = RegisterRequest {
        email: "new.doctor@example.com".into(),
        name: "Dr. New".into(),
        phone: None,
        password: "longpass".into(),
        role: Role::Doctor,
    };
    let created = app.store.register(&request).await.unwrap();
    assert_eq!(created.role, Role::Doctor);
    assert!(!created.is_approved());
    assert!(!app.store.is_authenticated());
    assert_eq!(app.credentials.load().unwrap(), CredentialState::Absent);
}

#[tokio::test]
async fn role_redirect_after_login() {
    let storage = Arc::new(MemoryStorage::new());
    let app = build_test_app(storage, RevalidationPolicy::FailClosed).await;
    app.store.initialize().await;
    app.store.login(EMAIL, PASSWORD).await.unwrap();

    let snap = app.store.snapshot();
    assert_eq!(
        navigate(&snap, "/admin/users"),
        GuardDecision::Redirect {
            to: "/patient",
            replace: true
        }
    );
    assert_eq!(navigate(&snap, "/patient/treatment"), GuardDecision::Render);
}
