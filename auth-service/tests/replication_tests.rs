mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::Role;
use auth_service::domain::shadow::errors::ShadowStoreError;
use auth_service::domain::shadow::models::Disposition;
use auth_service::domain::shadow::models::MessageOutcome;
use auth_service::domain::shadow::ports::ShadowUserRepository;
use auth_service::domain::shadow::reconciler::Reconciler;
use auth_service::domain::token::models::TokenPolicy;
use auth_service::outbound::repositories::InMemoryShadowUserRepository;
use common::at;
use common::created;
use common::follow_up;
use common::TestApp;
use common::PASSWORD;
use reqwest::StatusCode;
use serde_json::json;
use serde_json::Value;
use user_facts::ApplyOutcome;
use user_facts::FactChange;
use user_facts::ShadowUser;
use user_facts::SkipReason;
use user_facts::Standing;
use user_facts::UserFact;
use user_facts::UserId;

#[tokio::test]
async fn test_duplicate_created_keeps_one_record() {
    let app = TestApp::spawn().await;
    let fact = app.register("buyer@example.com", Role::Buyer).await;

    let outcome = app.deliver(&fact).await;

    assert_eq!(
        outcome,
        MessageOutcome::Skipped {
            user_id: fact.user_id,
            reason: SkipReason::DuplicateNoChange,
        }
    );
    assert_eq!(outcome.disposition(), Disposition::Ack);
    assert_eq!(app.repository.len().await, 1);
}

#[tokio::test]
async fn test_facts_apply_in_any_order() {
    let app = TestApp::spawn().await;
    let base = app.register("buyer@example.com", Role::Buyer).await;

    let mut renamed = follow_up(&base, FactChange::FullNameChanged, at(10));
    renamed.full_name = "Renamed".to_string();
    let mut moved = follow_up(&base, FactChange::EmailChanged, at(20));
    moved.email = "moved@example.com".to_string();

    // Newer fact first.
    assert!(matches!(app.deliver(&moved).await, MessageOutcome::Applied { .. }));
    assert!(matches!(app.deliver(&renamed).await, MessageOutcome::Applied { .. }));

    let user = app.repository.find_by_id(&base.user_id).await.unwrap().unwrap();
    assert_eq!(user.full_name, "Renamed");
    assert_eq!(user.email, "moved@example.com");
    assert_eq!(user.last_applied_occurred_at, at(20));
}

#[tokio::test]
async fn test_late_status_change_does_not_override_newer_standing() {
    let app = TestApp::spawn().await;
    let base = app.register("buyer@example.com", Role::Buyer).await;

    let renamed = follow_up(&base, FactChange::FullNameChanged, at(10));
    let mut deactivated = follow_up(&base, FactChange::StatusChanged, at(5));
    deactivated.standing.is_active = false;

    app.deliver(&renamed).await;
    let outcome = app.deliver(&deactivated).await;

    assert_eq!(
        outcome,
        MessageOutcome::Skipped {
            user_id: base.user_id,
            reason: SkipReason::Stale,
        }
    );
    let user = app.repository.find_by_id(&base.user_id).await.unwrap().unwrap();
    assert!(user.is_active);
}

#[tokio::test]
async fn test_email_change_moves_login() {
    let app = TestApp::spawn().await;
    let base = app.register("old@example.com", Role::Buyer).await;

    let mut moved = follow_up(&base, FactChange::EmailChanged, at(10));
    moved.email = "new@example.com".to_string();
    app.deliver(&moved).await;

    assert_eq!(
        app.login("old@example.com", PASSWORD).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.login("new@example.com", PASSWORD).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_password_change_replaces_credential() {
    let app = TestApp::spawn().await;
    let base = app.register("buyer@example.com", Role::Buyer).await;

    let changed = follow_up(
        &base,
        FactChange::PasswordChanged {
            password_hash: app.verifier.hash("new_pass_word!").unwrap(),
        },
        at(10),
    );
    app.deliver(&changed).await;

    assert_eq!(
        app.login("buyer@example.com", PASSWORD).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.login("buyer@example.com", "new_pass_word!").await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_deactivation_blocks_login_and_refresh_but_not_issued_access() {
    let app = TestApp::spawn().await;
    let base = app.register("buyer@example.com", Role::Buyer).await;

    let body: Value = app
        .login("buyer@example.com", PASSWORD)
        .await
        .json()
        .await
        .unwrap();
    let access_token = body["data"]["access_token"].as_str().unwrap().to_string();
    let refresh_token = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let mut deactivated = follow_up(&base, FactChange::StatusChanged, at(10));
    deactivated.standing.is_active = false;
    app.deliver(&deactivated).await;

    assert_eq!(
        app.login("buyer@example.com", PASSWORD).await.status(),
        StatusCode::FORBIDDEN
    );

    let refreshed = app
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(refreshed.status(), StatusCode::FORBIDDEN);

    // Access tokens stay valid until they expire.
    let verified = app
        .get("/api/v1/auth/verify")
        .bearer_auth(&access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(verified.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unverified_user_cannot_login() {
    let app = TestApp::spawn().await;
    let mut fact = created(
        "fresh@example.com",
        Role::Buyer,
        &app.verifier.hash(PASSWORD).unwrap(),
        at(0),
    );
    fact.standing.is_verified = false;
    app.deliver(&fact).await;

    assert_eq!(
        app.login("fresh@example.com", PASSWORD).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_role_change_reaches_refreshed_tokens() {
    let app = TestApp::spawn_with_policy(TokenPolicy {
        rotate_refresh_tokens: false,
        ..TokenPolicy::default()
    })
    .await;
    let base = app.register("buyer@example.com", Role::Buyer).await;
    let body: Value = app
        .login("buyer@example.com", PASSWORD)
        .await
        .json()
        .await
        .unwrap();
    let refresh_token = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let mut promoted = follow_up(&base, FactChange::StatusChanged, at(10));
    promoted.standing = Standing {
        role: Role::Admin,
        ..base.standing
    };
    app.deliver(&promoted).await;

    let body: Value = app
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["refresh_token"], refresh_token.as_str());

    let access_token = body["data"]["access_token"].as_str().unwrap();
    let identity: Value = app
        .get("/api/v1/auth/verify")
        .bearer_auth(access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(identity["data"]["role"], "admin");
}

#[tokio::test]
async fn test_update_for_unknown_user_is_rejected_without_requeue() {
    let app = TestApp::spawn().await;
    let base = created("ghost@example.com", Role::Buyer, "hash", at(0));
    let renamed = follow_up(&base, FactChange::FullNameChanged, at(10));

    let outcome = app.deliver(&renamed).await;

    assert_eq!(outcome, MessageOutcome::UnknownUser(base.user_id));
    assert_eq!(outcome.disposition(), Disposition::Reject { requeue: false });
    assert!(app.repository.is_empty().await);
}

#[tokio::test]
async fn test_unparseable_messages_are_rejected_without_requeue() {
    let app = TestApp::spawn().await;

    let garbage = app
        .reconciler
        .handle("user.created", Some(b"{not json".as_slice()))
        .await;
    let empty = app.reconciler.handle("user.created", None).await;

    for outcome in [garbage, empty] {
        assert!(matches!(outcome, MessageOutcome::ParseFailed(_)));
        assert_eq!(outcome.disposition(), Disposition::Reject { requeue: false });
    }
    assert!(app.repository.is_empty().await);
}

#[tokio::test]
async fn test_fact_on_wrong_routing_key_is_rejected() {
    let app = TestApp::spawn().await;
    let fact = created("buyer@example.com", Role::Buyer, "hash", at(0));
    let payload = user_facts::messages::encode(&fact).unwrap();

    let outcome = app
        .reconciler
        .handle("user.status.updated", Some(payload.as_slice()))
        .await;

    assert!(matches!(outcome, MessageOutcome::ParseFailed(_)));
    assert!(app.repository.is_empty().await);
}

/// Store whose writes never finish.
struct StalledRepository;

#[async_trait]
impl ShadowUserRepository for StalledRepository {
    async fn upsert_if_newer(&self, _fact: &UserFact) -> Result<ApplyOutcome, ShadowStoreError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ApplyOutcome::Applied)
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<ShadowUser>, ShadowStoreError> {
        Ok(None)
    }

    async fn find_by_id(&self, _id: &UserId) -> Result<Option<ShadowUser>, ShadowStoreError> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_stalled_store_times_out_and_requeues() {
    let reconciler = Reconciler::new(Arc::new(StalledRepository), Duration::from_millis(50));
    let fact = created("buyer@example.com", Role::Buyer, "hash", at(0));

    let outcome = reconciler.apply(&fact).await;

    assert_eq!(outcome, MessageOutcome::TimedOut);
    assert_eq!(outcome.disposition(), Disposition::Reject { requeue: true });
}

#[tokio::test]
async fn test_reconcilers_sharing_a_store_converge() {
    let repository = Arc::new(InMemoryShadowUserRepository::new());
    let first = Arc::new(Reconciler::new(Arc::clone(&repository), Duration::from_secs(1)));
    let second = Arc::new(Reconciler::new(Arc::clone(&repository), Duration::from_secs(1)));

    let base = created("buyer@example.com", Role::Buyer, "hash", at(0));
    first.apply(&base).await;

    let mut renamed = follow_up(&base, FactChange::FullNameChanged, at(10));
    renamed.full_name = "Renamed".to_string();
    let mut deactivated = follow_up(&base, FactChange::StatusChanged, at(20));
    deactivated.standing.is_active = false;

    let (a, b) = tokio::join!(first.apply(&renamed), second.apply(&deactivated));
    assert_eq!(a.disposition(), Disposition::Ack);
    assert_eq!(b.disposition(), Disposition::Ack);

    let user = repository.find_by_id(&base.user_id).await.unwrap().unwrap();
    assert_eq!(user.full_name, "Renamed");
    assert!(!user.is_active);
    assert_eq!(user.last_applied_occurred_at, at(20));
}

#[tokio::test]
async fn test_refresh_after_email_reassigned_stays_with_original_account() {
    let app = TestApp::spawn().await;
    let alice = app.register("x@example.com", Role::Buyer).await;
    let body: Value = app
        .login("x@example.com", PASSWORD)
        .await
        .json()
        .await
        .unwrap();
    let alice_refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let mut moved = follow_up(&alice, FactChange::EmailChanged, at(10));
    moved.email = "y@example.com".to_string();
    assert!(matches!(app.deliver(&moved).await, MessageOutcome::Applied { .. }));

    let bob = created(
        "x@example.com",
        Role::Admin,
        &app.verifier.hash("bobs_password").unwrap(),
        at(20),
    );
    assert!(matches!(app.deliver(&bob).await, MessageOutcome::Applied { .. }));

    let response = app
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refresh_token": alice_refresh }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let claims = app
        .codec
        .verify(body["data"]["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(UserId(claims.uid), alice.user_id);
    assert_eq!(claims.sub, "y@example.com");
    assert_eq!(claims.role, Role::Buyer);
}
