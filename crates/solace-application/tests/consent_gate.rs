//! End-to-end scenarios for the consent gate: reconciliation against the
//! authoritative record, blocking behavior, grant/decline handling and
//! per-user isolation.

mod common;

use chrono::Utc;
use common::{
    RemoteCall, SurfaceEvent, bob_session, consent_of, harness, transport_error,
};
use solace_application::auth::AuthPhase;
use solace_core::consent::{ConsentCache, ConsentDecision};
use solace_core::session::SessionStore;

#[tokio::test]
async fn test_new_user_gate_closes_before_any_further_init() {
    let h = harness();
    // Authoritative record: no decision yet (default script).

    h.controller.submit_auth("bob", "secret1", None).await;

    assert_eq!(h.controller.phase().await, AuthPhase::ConsentPending);
    assert!(h.surface.contains(&SurfaceEvent::Enabled(false)));
    assert!(h.surface.contains(&SurfaceEvent::ConsentOpened));

    // The disable effect precedes everything after the gate; no statistics
    // or history call may have been issued.
    assert_eq!(
        h.remote
            .count_calls(|c| matches!(c, RemoteCall::FetchStatistics(_))),
        0
    );
    assert_eq!(
        h.remote
            .count_calls(|c| matches!(c, RemoteCall::FetchHistory(_))),
        0
    );
}

#[tokio::test]
async fn test_remote_grant_overwrites_stale_local_decline() {
    let h = harness();
    h.consent
        .write("u-bob", ConsentDecision::Declined, Utc::now())
        .await
        .unwrap();
    h.remote.script_consent(Ok(consent_of(Some(true))));

    h.controller.submit_auth("bob", "secret1", None).await;

    assert_eq!(h.controller.phase().await, AuthPhase::Ready);
    let record = h.consent.read("u-bob").await.unwrap();
    assert_eq!(record.decision, ConsentDecision::Granted);
    assert!(h.surface.contains(&SurfaceEvent::Enabled(true)));
    assert!(!h.surface.contains(&SurfaceEvent::ConsentOpened));
}

#[tokio::test]
async fn test_remote_decline_overwrites_stale_local_grant() {
    let h = harness();
    h.consent
        .write("u-bob", ConsentDecision::Granted, Utc::now())
        .await
        .unwrap();
    h.remote.script_consent(Ok(consent_of(Some(false))));

    h.controller.submit_auth("bob", "secret1", None).await;

    assert_eq!(h.controller.phase().await, AuthPhase::ConsentPending);
    assert!(h.surface.contains(&SurfaceEvent::ConsentOpened));
}

#[tokio::test]
async fn test_cached_grant_opens_gate_when_authority_unreachable() {
    let h = harness();
    h.consent
        .write("u-bob", ConsentDecision::Granted, Utc::now())
        .await
        .unwrap();
    h.remote.script_consent(Err(transport_error()));

    h.controller.submit_auth("bob", "secret1", None).await;

    assert_eq!(h.controller.phase().await, AuthPhase::Ready);
    assert!(h.surface.contains(&SurfaceEvent::Enabled(true)));
    assert!(!h.surface.contains(&SurfaceEvent::ConsentOpened));
}

#[tokio::test]
async fn test_failed_fetch_never_grants_access_for_new_user() {
    let h = harness();
    h.remote.script_consent(Err(transport_error()));

    h.controller.submit_auth("bob", "secret1", None).await;

    assert_eq!(h.controller.phase().await, AuthPhase::ConsentPending);
    assert!(h.surface.contains(&SurfaceEvent::Enabled(false)));
}

#[tokio::test]
async fn test_accept_records_grant_syncs_and_resumes_init() {
    let h = harness();
    h.controller.submit_auth("bob", "secret1", None).await;
    assert_eq!(h.controller.phase().await, AuthPhase::ConsentPending);

    h.controller.accept_consent().await;

    assert_eq!(h.controller.phase().await, AuthPhase::Ready);
    let record = h.consent.read("u-bob").await.unwrap();
    assert_eq!(record.decision, ConsentDecision::Granted);
    assert!(record.decided_at.is_some());

    assert!(h.surface.contains(&SurfaceEvent::ConsentClosed));
    assert!(h.surface.contains(&SurfaceEvent::Enabled(true)));
    assert_eq!(
        h.remote.count_calls(|c| matches!(
            c,
            RemoteCall::PushConsent {
                granted: true,
                ..
            }
        )),
        1
    );
    // The remaining initialization ran.
    assert_eq!(
        h.remote
            .count_calls(|c| matches!(c, RemoteCall::FetchStatistics(_))),
        1
    );
    assert_eq!(
        h.remote
            .count_calls(|c| matches!(c, RemoteCall::FetchHistory(_))),
        1
    );
}

#[tokio::test]
async fn test_decline_tears_down_even_when_sync_fails() {
    let h = harness();
    h.remote.script_push(Err(transport_error()));

    // Login with username "bob" / password "secret1"; the authoritative
    // record has no decision, so the gate closes.
    h.controller.submit_auth("bob", "secret1", None).await;
    assert_eq!(h.controller.phase().await, AuthPhase::ConsentPending);

    h.controller.decline_consent().await;

    // The local cache records the decline for bob specifically.
    let record = h.consent.read("u-bob").await.unwrap();
    assert_eq!(record.decision, ConsentDecision::Declined);

    // The best-effort notification was attempted and its failure ignored.
    assert_eq!(
        h.remote.count_calls(|c| matches!(
            c,
            RemoteCall::PushConsent {
                granted: false,
                ..
            }
        )),
        1
    );

    // The application is gone regardless.
    assert!(h.surface.position(|e| matches!(e, SurfaceEvent::TornDown(_))).is_some());
    assert_eq!(h.controller.phase().await, AuthPhase::Terminated);
}

#[tokio::test]
async fn test_decline_blocks_further_interaction() {
    let h = harness();
    h.controller.submit_auth("bob", "secret1", None).await;
    h.controller.decline_consent().await;

    h.controller.send_message("hello?").await;
    assert_eq!(
        h.remote.count_calls(|c| matches!(c, RemoteCall::SendChat(_))),
        0
    );
}

#[tokio::test]
async fn test_gate_is_keyed_per_user() {
    let h = harness();
    // A different user's grant must not open bob's gate.
    h.consent
        .write("u-alice", ConsentDecision::Granted, Utc::now())
        .await
        .unwrap();

    h.controller.submit_auth("bob", "secret1", None).await;

    assert_eq!(h.controller.phase().await, AuthPhase::ConsentPending);
    assert!(h.surface.contains(&SurfaceEvent::ConsentOpened));
    // Alice's record is untouched.
    let alice = h.consent.read("u-alice").await.unwrap();
    assert_eq!(alice.decision, ConsentDecision::Granted);
}

#[tokio::test]
async fn test_restored_session_reconciles_without_login() {
    let h = harness();
    h.sessions.establish(&bob_session()).await.unwrap();
    h.consent
        .write("u-bob", ConsentDecision::Granted, Utc::now())
        .await
        .unwrap();

    h.controller.start().await;

    assert_eq!(h.controller.phase().await, AuthPhase::Ready);
    assert_eq!(h.remote.count_calls(|c| matches!(c, RemoteCall::Login)), 0);
    assert_eq!(
        h.remote
            .count_calls(|c| matches!(c, RemoteCall::FetchConsent(_))),
        1
    );
    assert!(h.surface.contains(&SurfaceEvent::AuthenticatedView("bob".to_string())));
}

#[tokio::test]
async fn test_start_without_session_shows_auth_view() {
    let h = harness();

    h.controller.start().await;

    assert_eq!(h.controller.phase().await, AuthPhase::Anonymous);
    assert!(h.surface.contains(&SurfaceEvent::AuthView));
    assert!(h.remote.calls().is_empty());
}

#[tokio::test]
async fn test_logout_clears_session_and_resets_toggles() {
    let h = harness();
    h.consent
        .write("u-bob", ConsentDecision::Granted, Utc::now())
        .await
        .unwrap();
    h.controller.submit_auth("bob", "secret1", None).await;
    assert_eq!(h.controller.phase().await, AuthPhase::Ready);

    h.controller
        .set_user_kind(solace_core::chat::UserKind::Pet)
        .await;
    h.controller.toggle_auth_mode().await;

    h.controller.logout().await;

    assert_eq!(h.controller.phase().await, AuthPhase::Anonymous);
    assert!(h.controller.login_mode().await);
    assert_eq!(h.sessions.current().await, None);
    assert!(h.surface.contains(&SurfaceEvent::AuthView));
}

#[tokio::test]
async fn test_cancelled_logout_keeps_the_session() {
    let h = harness();
    h.consent
        .write("u-bob", ConsentDecision::Granted, Utc::now())
        .await
        .unwrap();
    h.controller.submit_auth("bob", "secret1", None).await;

    h.surface
        .allow_logout
        .store(false, std::sync::atomic::Ordering::SeqCst);
    h.controller.logout().await;

    assert_eq!(h.controller.phase().await, AuthPhase::Ready);
    assert!(h.sessions.current().await.is_some());
}

#[tokio::test]
async fn test_chat_reply_updates_panels_and_count() {
    let h = harness();
    h.consent
        .write("u-bob", ConsentDecision::Granted, Utc::now())
        .await
        .unwrap();
    h.controller.submit_auth("bob", "secret1", None).await;

    h.controller.send_message("I had a hard day").await;

    assert!(h.surface.contains(&SurfaceEvent::Mood(42.0)));
    assert_eq!(h.controller.conversation_count().await, 1);
    // User message first, companion reply after.
    let user_pos = h
        .surface
        .position(|e| matches!(e, SurfaceEvent::Message { speaker: solace_application::surface::Speaker::User, .. }))
        .unwrap();
    let bot_pos = h
        .surface
        .position(|e| matches!(e, SurfaceEvent::Message { speaker: solace_application::surface::Speaker::Companion, .. }))
        .unwrap();
    assert!(user_pos < bot_pos);
}

#[tokio::test]
async fn test_crisis_reply_is_flagged_for_distinct_styling() {
    let h = harness();
    h.consent
        .write("u-bob", ConsentDecision::Granted, Utc::now())
        .await
        .unwrap();
    h.controller.submit_auth("bob", "secret1", None).await;

    h.remote.script_chat(Ok(solace_core::chat::ChatReply {
        response: "Please reach out to someone you trust right now.".to_string(),
        alert: solace_core::chat::AlertFlag::Crisis,
        mood_index: Some(91.0),
        stage_info: Some("depression".to_string()),
    }));
    h.controller.send_message("I can't go on").await;

    let events = h.surface.events();
    assert!(events.iter().any(|e| matches!(
        e,
        SurfaceEvent::Message { crisis: true, .. }
    )));
    assert!(h.surface.contains(&SurfaceEvent::Stage("depression".to_string())));
}

#[tokio::test]
async fn test_endpoint_override_persists_and_repoints() {
    let h = harness();

    h.controller
        .override_endpoint("https://staging.example.net/api")
        .await
        .unwrap();

    assert_eq!(
        h.controller.endpoint().await.base(),
        "https://staging.example.net/api"
    );
    // An empty override is rejected rather than saved as a literal target.
    assert!(h.controller.override_endpoint("   ").await.is_err());
}
