//! Application lifecycle over the service API: create, accept, deferred
//! start, expiry, and cancellation re-validation.

use std::sync::Arc;
use std::time::Duration;

use combat_core::{BattleKind, BattleStatus, CharacterId, CombatConfig, CombatMode};
use combat_runtime::{
    ApplicationRequest, ApplicationStatus, CharacterRecord, CombatService, InMemoryCharacterStore,
    RuntimeError,
};

fn character(id: u64, name: &str, level: u32) -> CharacterRecord {
    CharacterRecord {
        id: CharacterId(id),
        name: name.into(),
        level,
        xp: 1_000,
        gold: 0,
        attack: 15,
        defense: 5,
        accuracy: 5,
        evasion: 5,
        hp_max: 100,
        mp_max: 50,
        items: vec![],
    }
}

fn request(applicant: u64) -> ApplicationRequest {
    ApplicationRequest {
        applicant: CharacterId(applicant),
        kind: BattleKind::Arena,
        mode: CombatMode::Alternating,
        countdown_secs: 120,
        trauma_percent: 15,
        level_range: None,
        invited: vec![],
        zone: None,
    }
}

fn service(config: CombatConfig) -> Arc<CombatService> {
    CombatService::builder()
        .config(config)
        .characters(Arc::new(InMemoryCharacterStore::with_records([
            character(1, "Aric", 10),
            character(2, "Bren", 12),
            character(3, "Cale", 40),
        ])))
        .build()
}

#[tokio::test]
async fn duplicate_open_application_is_rejected() {
    let service = service(CombatConfig::default());
    service.create_application(request(1)).await.unwrap();
    let err = service.create_application(request(1)).await.unwrap_err();
    assert!(matches!(err, RuntimeError::DuplicateApplication));
}

#[tokio::test]
async fn available_applications_exclude_own_and_level_gated_entries() {
    let service = service(CombatConfig::default());
    let mut narrow = request(1);
    narrow.level_range = Some((8, 15));
    service.create_application(narrow).await.unwrap();

    // The applicant does not see their own entry.
    assert!(
        service
            .available_applications(CharacterId(1))
            .unwrap()
            .is_empty()
    );
    // A level-12 character qualifies; a level-40 one does not.
    assert_eq!(
        service
            .available_applications(CharacterId(2))
            .unwrap()
            .len(),
        1
    );
    assert!(
        service
            .available_applications(CharacterId(3))
            .unwrap()
            .is_empty()
    );
}

#[tokio::test(start_paused = true)]
async fn accepted_application_schedules_the_deferred_start() {
    let service = service(CombatConfig::default());
    let application = service.create_application(request(1)).await.unwrap();

    let (accepted, handle) = service
        .accept_application(application.id, CharacterId(2))
        .await
        .unwrap();
    assert_eq!(accepted.status, ApplicationStatus::Matched);
    assert_eq!(accepted.acceptor, Some(CharacterId(2)));

    let battle = handle.state().await.unwrap();
    assert_eq!(battle.status, BattleStatus::Pending);
    assert_eq!(battle.trauma_percent, 15);

    // The countdown elapses; the deferred start fires and re-validates.
    tokio::time::sleep(Duration::from_secs(125)).await;
    let battle = handle.state().await.unwrap();
    assert_eq!(battle.status, BattleStatus::Active);
}

#[tokio::test(start_paused = true)]
async fn cancelled_match_voids_the_scheduled_start() {
    let service = service(CombatConfig::default());
    let application = service.create_application(request(1)).await.unwrap();
    let (_, handle) = service
        .accept_application(application.id, CharacterId(2))
        .await
        .unwrap();

    handle.cancel().await.unwrap();

    tokio::time::sleep(Duration::from_secs(400)).await;
    // The fired task found the match cancelled and did nothing.
    let battle = handle.state().await.unwrap();
    assert_eq!(battle.status, BattleStatus::Cancelled);
}

#[tokio::test]
async fn unaccepted_application_expires_and_leaves_matching_queries() {
    // A zero-second lifetime puts the deadline in the past immediately,
    // exercising the same exclusion and expiry paths the 10-minute timer
    // reaches in production.
    let mut config = CombatConfig::default();
    config.application_expiry_secs = 0;
    let service = service(config);

    let application = service.create_application(request(1)).await.unwrap();

    assert!(
        service
            .available_applications(CharacterId(2))
            .unwrap()
            .is_empty()
    );

    let expired = service.expire_due_applications();
    assert_eq!(expired, vec![application.id]);
    assert_eq!(
        service.application(application.id).unwrap().status,
        ApplicationStatus::Expired
    );

    let err = service
        .accept_application(application.id, CharacterId(2))
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::ApplicationExpired(_)));
}

#[tokio::test]
async fn accepting_twice_fails_the_second_caller() {
    let service = service(CombatConfig::default());
    let application = service.create_application(request(1)).await.unwrap();

    service
        .accept_application(application.id, CharacterId(2))
        .await
        .unwrap();
    let err = service
        .accept_application(application.id, CharacterId(3))
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::NotEligible { .. }));
}
