mod common;

use common::{Harness, avatar_box, drain};
use scenery_core::avatar::AvatarConfig;
use scenery_core::config::SceneryConfig;
use scenery_core::event::AppEvent;
use scenery_core::interaction::NoticeLevel;
use scenery_core::party::PartyConfig;
use scenery_core::storage::keys::PARTY_CONFIGS;
use scenery_infrastructure::MemoryKeyValueStore;
use serde_json::json;

fn full_record(id: &str, name: &str, timestamp: i64, boxes: serde_json::Value) -> serde_json::Value {
    json!({"id": id, "name": name, "timestamp": timestamp, "boxes": boxes})
}

fn avatar_box_json(box_id: &str, avatars: &[(&str, &str)]) -> serde_json::Value {
    let elements: Vec<_> = avatars
        .iter()
        .map(|(id, name)| json!({"id": id, "elementType": "avatar", "avatarData": {"name": name}}))
        .collect();
    json!({"id": box_id, "elements": elements})
}

async fn sorted_scene_keys(h: &Harness) -> Vec<String> {
    let mut keys = h.scene_keys().await;
    keys.sort();
    keys
}

// ============================================================================
// Listing and duplicates
// ============================================================================

#[tokio::test]
async fn test_list_is_idempotent_and_deduplicated() {
    let h = Harness::new();
    h.put_raw("scene:s1", full_record("s1", "Planning", 10, json!([]))).await;
    h.put_raw("scene:Planning", full_record("s1", "Planning (old)", 5, json!([]))).await;
    h.put_raw("scene:s2", full_record("s2", "Retro", 20, json!([]))).await;

    let first = h.services.scenes.list().await.unwrap();
    let second = h.services.scenes.list().await.unwrap();

    assert_eq!(first, second, "Listing twice should give the same result");
    let ids: Vec<&str> = first.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s2", "s1"], "Newest first, one row per id");
    assert_eq!(h.services.scenes.visible_scenes().await, first);
}

#[tokio::test]
async fn test_cleanup_keeps_id_keyed_record() {
    let h = Harness::new();
    h.put_raw("scene:s1", full_record("s1", "Planning", 1, json!([]))).await;
    h.put_raw("scene:Planning", full_record("s1", "Planning", 5, json!([]))).await;
    h.put_raw("scene:s2", full_record("s2", "Retro", 3, json!([]))).await;

    let removed = h.services.scenes.cleanup_duplicates().await.unwrap();

    assert_eq!(removed, vec!["scene:Planning".to_string()]);
    assert_eq!(
        sorted_scene_keys(&h).await,
        vec!["scene:s1".to_string(), "scene:s2".to_string()]
    );

    // Running again finds nothing left to remove
    let removed = h.services.scenes.cleanup_duplicates().await.unwrap();
    assert!(removed.is_empty());
}

// ============================================================================
// Save and load
// ============================================================================

#[tokio::test]
async fn test_save_then_load_preserves_scene() {
    let h = Harness::new();
    let scenes = &h.services.scenes;

    let created = scenes.create("Workshop").await;
    assert!(!created.has_unsaved_changes, "A fresh scene is not dirty");

    let boxes = vec![
        avatar_box("b1", None, &[("e1", "Alice"), ("e2", "Bob")]),
        avatar_box("b2", None, &[("e3", "Carol")]),
    ];
    let edited = boxes.clone();
    let updated = scenes
        .update(&created.id, move |scene| {
            scene.boxes = edited;
            scene.background_image = Some("data:image/png;base64,AAAA".to_string());
        })
        .await
        .unwrap();
    assert!(updated.has_unsaved_changes);

    let mut rx = h.services.events.subscribe();
    let outcome = scenes.save(&created.id).await.unwrap();
    assert!(!outcome.is_file_reference());
    assert!(outcome.size > 0);

    let events = drain(&mut rx);
    assert!(events.contains(&AppEvent::ScenesListChanged));
    assert!(events.contains(&AppEvent::StorageChanged {
        key: Some(format!("scene:{}", created.id))
    }));

    let open = scenes.active_scene().await.unwrap();
    assert!(!open.has_unsaved_changes, "Saving clears the dirty flag");
    assert!(open.timestamp > 0);

    scenes.close(&created.id).await.unwrap();
    assert!(scenes.open_scenes().await.is_empty());

    let loaded = scenes.load(&created.id).await.unwrap();
    assert_eq!(loaded.scene.name, "Workshop");
    assert_eq!(loaded.scene.boxes, boxes);
    assert_eq!(
        loaded.scene.background_image.as_deref(),
        Some("data:image/png;base64,AAAA")
    );
    assert!(loaded.avatars.is_clean());
    assert_eq!(
        h.runtime.log.calls(),
        vec!["init:Alice", "init:Bob", "init:Carol"]
    );
    assert_eq!(
        scenes.active_scene().await.map(|s| s.id),
        Some(created.id.clone())
    );
}

#[tokio::test]
async fn test_oversized_scene_is_saved_as_file_reference() {
    let mut config = SceneryConfig::default();
    config.storage.file_reference_threshold_bytes = 200;
    let h = Harness::with(config, MemoryKeyValueStore::new());
    let scenes = &h.services.scenes;

    let created = scenes.create("Large").await;
    let boxes = vec![avatar_box("b1", None, &[("e1", "Alice")])];
    let edited = boxes.clone();
    scenes
        .update(&created.id, move |scene| {
            scene.boxes = edited;
            scene.background_image = Some("x".repeat(1_000));
        })
        .await
        .unwrap();

    let outcome = scenes.save(&created.id).await.unwrap();
    assert!(outcome.is_file_reference());
    assert!(outcome.size > 200);

    let record = h.raw(&format!("scene:{}", created.id)).await.unwrap();
    assert_eq!(record["isFileReference"], true);
    let file_url = record["fileUrl"].as_str().unwrap().to_string();
    assert!(file_url.starts_with("blob:scenery/"));
    assert!(record.get("boxes").is_none(), "Record holds only the preview");
    assert_eq!(record["preview"]["boxes"][0]["avatarNames"], json!(["Alice"]));
    assert_eq!(h.blobs.len().await, 1);

    scenes.close(&created.id).await.unwrap();
    let loaded = scenes.load(&created.id).await.unwrap();

    assert_eq!(h.fetcher.urls.lock().unwrap().clone(), vec![file_url]);
    assert_eq!(loaded.scene.id, created.id);
    assert_eq!(loaded.scene.boxes, boxes);
    assert_eq!(loaded.scene.background_image.as_deref().map(str::len), Some(1_000));
}

#[tokio::test]
async fn test_failed_fetch_without_file_is_an_error() {
    let h = Harness::new();
    h.put_raw(
        "scene:lost",
        json!({
            "id": "lost",
            "name": "Lost",
            "timestamp": 7,
            "fileUrl": "blob:scenery/gone",
            "size": 3_000_000,
            "isFileReference": true,
            "preview": {"boxes": []}
        }),
    )
    .await;

    let err = h.services.scenes.load("lost").await.unwrap_err();

    assert!(err.is_fetch(), "Expected a fetch error, got {err}");
    assert_eq!(h.prompt.file_requests.lock().unwrap().clone(), vec!["Lost"]);
    assert_eq!(h.prompt.notices_of(NoticeLevel::Error).len(), 1);
    assert!(h.services.scenes.open_scenes().await.is_empty());
}

#[tokio::test]
async fn test_failed_fetch_recovers_from_provided_file() {
    let h = Harness::new();
    h.put_raw(
        "scene:lost",
        json!({
            "id": "lost",
            "name": "Lost",
            "timestamp": 7,
            "fileUrl": "blob:scenery/gone",
            "size": 3_000_000,
            "isFileReference": true,
            "preview": {"boxes": []}
        }),
    )
    .await;
    let payload = json!({
        "id": "exported-copy",
        "boxes": [avatar_box_json("b1", &[("e1", "Alice")])]
    });
    h.prompt.supply_scene_file(payload.to_string().into_bytes());

    let loaded = h.services.scenes.load("lost").await.unwrap();

    // The record's id wins; name and timestamp fill in what the file lacks
    assert_eq!(loaded.scene.id, "lost");
    assert_eq!(loaded.scene.name, "Lost");
    assert_eq!(loaded.scene.timestamp, 7);
    assert_eq!(loaded.scene.boxes.len(), 1);
    assert_eq!(h.runtime.log.calls(), vec!["init:Alice"]);
}

#[tokio::test]
async fn test_quota_failure_leaves_scene_untouched() {
    let h = Harness::with(SceneryConfig::default(), MemoryKeyValueStore::with_quota(400));
    let scenes = &h.services.scenes;

    let created = scenes.create("Too big").await;
    scenes
        .update(&created.id, |scene| {
            scene.background_image = Some("x".repeat(2_000));
        })
        .await
        .unwrap();

    let err = scenes.save(&created.id).await.unwrap_err();

    assert!(err.is_quota_exceeded(), "Expected quota error, got {err}");
    let errors = h.prompt.notices_of(NoticeLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Storage is full"));

    let open = scenes.active_scene().await.unwrap();
    assert!(open.has_unsaved_changes, "Dirty flag survives a failed save");
    assert_eq!(open.timestamp, 0);
    assert!(h.scene_keys().await.is_empty());
}

#[tokio::test]
async fn test_save_stamps_humans_and_party_copies() {
    let h = Harness::new();
    let services = &h.services;

    services
        .party
        .save_template(PartyConfig::new("Research"))
        .await
        .unwrap();
    services
        .participants
        .set_human_participants(vec!["Bob".to_string()])
        .await
        .unwrap();

    let created = services.scenes.create("Lab").await;
    services
        .scenes
        .update(&created.id, |scene| {
            scene
                .boxes
                .push(avatar_box("b1", Some("Research"), &[("e1", "Alice"), ("e2", "Bob")]));
        })
        .await
        .unwrap();

    services.scenes.save(&created.id).await.unwrap();

    let record = h.raw(&format!("scene:{}", created.id)).await.unwrap();
    let stored_box = &record["boxes"][0];
    assert_eq!(stored_box["partyConfig"]["name"], "Research");
    assert_eq!(stored_box["elements"][0]["avatarData"]["isHuman"], false);
    assert_eq!(stored_box["elements"][1]["avatarData"]["isHuman"], true);

    let configs = h.raw(PARTY_CONFIGS).await.unwrap();
    assert_eq!(configs["b1"]["name"], "Research");
}

#[tokio::test]
async fn test_load_applies_avatar_config_and_tolerates_failures() {
    let h = Harness::new();
    h.put_raw(
        "scene:s1",
        full_record(
            "s1",
            "Stage",
            1,
            json!([avatar_box_json("b1", &[("e1", "Alice"), ("e2", "Broken")])]),
        ),
    )
    .await;
    h.services
        .participants
        .save_avatar_config(
            "Alice",
            &AvatarConfig {
                voice: Some("alto".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    h.runtime.fail_for("Broken");

    let loaded = h.services.scenes.load("s1").await.unwrap();

    assert_eq!(loaded.avatars.succeeded, vec!["Alice".to_string()]);
    assert_eq!(loaded.avatars.failures.len(), 1);
    assert_eq!(loaded.avatars.failures[0].avatar_name, "Broken");
    assert_eq!(h.runtime.log.calls(), vec!["init:Alice", "voice:Alice:alto"]);
    assert_eq!(h.prompt.notices_of(NoticeLevel::Warning).len(), 1);
    // The scene is open despite the failing avatar
    assert_eq!(h.services.scenes.open_scenes().await.len(), 1);
}

#[tokio::test]
async fn test_avatar_without_name_keeps_scene_usable() {
    let h = Harness::new();
    h.put_raw(
        "scene:s1",
        full_record(
            "s1",
            "Nameless",
            10,
            json!([{
                "id": "b1",
                "elements": [{"id": "7", "elementType": "avatar", "avatarData": {"url": "x.vrm"}}]
            }]),
        ),
    )
    .await;

    let listed = h.services.scenes.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "s1");

    let loaded = h.services.scenes.load("s1").await.unwrap();
    let element = &loaded.scene.boxes[0].elements[0];
    assert_eq!(element.avatar_display_name(), "Avatar7");
}

#[tokio::test]
async fn test_saving_a_legacy_keyed_scene_drops_the_old_key() {
    let h = Harness::new();
    h.put_raw(
        "scene:Planning",
        full_record("s1", "Planning", 5, json!([avatar_box_json("b1", &[("e1", "Alice")])])),
    )
    .await;

    let loaded = h.services.scenes.load("s1").await.unwrap();
    assert_eq!(loaded.scene.name, "Planning");
    h.services
        .scenes
        .update("s1", |scene| scene.name = "Planning v2".to_string())
        .await
        .unwrap();
    h.services.scenes.save("s1").await.unwrap();

    assert_eq!(sorted_scene_keys(&h).await, vec!["scene:s1".to_string()]);
    assert_eq!(h.raw("scene:s1").await.unwrap()["name"], "Planning v2");
    assert!(h.services.scenes.cleanup_duplicates().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_reference_write_discards_the_payload() {
    let mut config = SceneryConfig::default();
    config.storage.file_reference_threshold_bytes = 200;
    let h = Harness::with(config, MemoryKeyValueStore::with_quota(100));
    let scenes = &h.services.scenes;

    let created = scenes.create("Large").await;
    scenes
        .update(&created.id, |scene| {
            scene.background_image = Some("x".repeat(1_000));
        })
        .await
        .unwrap();

    let err = scenes.save(&created.id).await.unwrap_err();

    assert!(err.is_quota_exceeded(), "Expected quota error, got {err}");
    assert!(h.blobs.is_empty().await, "No payload outlives a failed save");
    assert!(h.scene_keys().await.is_empty());
    assert!(scenes.active_scene().await.unwrap().has_unsaved_changes);
}

#[tokio::test]
async fn test_load_unknown_scene_is_not_found() {
    let h = Harness::new();

    let err = h.services.scenes.load("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_removes_exactly_its_party_configs() {
    let h = Harness::new();
    h.put_raw(
        "scene:s1",
        full_record(
            "s1",
            "Doomed",
            2,
            json!([avatar_box_json("b1", &[]), avatar_box_json("b2", &[])]),
        ),
    )
    .await;
    h.put_raw(
        "scene:Doomed",
        full_record("s1", "Doomed", 1, json!([avatar_box_json("b4", &[])])),
    )
    .await;
    h.put_raw(
        "scene:s2",
        full_record("s2", "Survivor", 3, json!([avatar_box_json("b3", &[])])),
    )
    .await;
    h.put_raw(
        PARTY_CONFIGS,
        json!({
            "b1": {"name": "Red"},
            "b2": {"name": "Red"},
            "b3": {"name": "Blue"},
            "b4": {"name": "Red"}
        }),
    )
    .await;
    h.services.scenes.list().await.unwrap();

    let deleted = h.services.scenes.delete("s1").await.unwrap();

    assert!(deleted);
    assert_eq!(sorted_scene_keys(&h).await, vec!["scene:s2".to_string()]);
    let configs = h.raw(PARTY_CONFIGS).await.unwrap();
    let remaining: Vec<&String> = configs.as_object().unwrap().keys().collect();
    assert_eq!(remaining, vec!["b3"]);
    assert_eq!(configs["b3"]["name"], "Blue");
    let confirmations = h.prompt.confirmations.lock().unwrap().clone();
    assert!(confirmations[0].contains("Doomed"));
    let visible: Vec<String> = h
        .services
        .scenes
        .visible_scenes()
        .await
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(visible, vec!["s2".to_string()]);
}

#[tokio::test]
async fn test_declined_delete_changes_nothing() {
    let h = Harness::new();
    h.put_raw(
        "scene:s1",
        full_record("s1", "Keep", 2, json!([avatar_box_json("b1", &[])])),
    )
    .await;
    h.put_raw(PARTY_CONFIGS, json!({"b1": {"name": "Red"}})).await;
    h.prompt.answer_confirm(false);

    let deleted = h.services.scenes.delete("s1").await.unwrap();

    assert!(!deleted);
    assert!(h.raw("scene:s1").await.is_some());
    assert_eq!(h.raw(PARTY_CONFIGS).await.unwrap(), json!({"b1": {"name": "Red"}}));
}

#[tokio::test]
async fn test_delete_of_unsaved_scene_clears_working_set() {
    let h = Harness::new();
    let created = h.services.scenes.create("Scratch").await;

    let deleted = h.services.scenes.delete(&created.id).await.unwrap();

    assert!(deleted);
    assert!(h.services.scenes.open_scenes().await.is_empty());
    assert!(h.services.scenes.active_scene().await.is_none());
}

// ============================================================================
// Close
// ============================================================================

#[tokio::test]
async fn test_close_stops_avatars_and_moves_active_scene() {
    let h = Harness::new();
    h.put_raw(
        "scene:s1",
        full_record("s1", "First", 1, json!([avatar_box_json("b1", &[("e1", "Alice")])])),
    )
    .await;
    h.put_raw(
        "scene:s2",
        full_record("s2", "Second", 2, json!([avatar_box_json("b2", &[("e2", "Bob")])])),
    )
    .await;

    let scenes = &h.services.scenes;
    scenes.load("s1").await.unwrap();
    scenes.load("s2").await.unwrap();
    assert_eq!(scenes.active_scene().await.map(|s| s.id).as_deref(), Some("s2"));

    let report = scenes.close("s2").await.unwrap();

    assert_eq!(report.succeeded, vec!["Bob".to_string()]);
    assert!(h.runtime.log.calls().contains(&"stop:Bob".to_string()));
    assert_eq!(h.runtime.live_instances(), 1);
    assert_eq!(scenes.active_scene().await.map(|s| s.id).as_deref(), Some("s1"));
    // Closing never deletes the stored copy
    assert!(h.raw("scene:s2").await.is_some());
}

#[tokio::test]
async fn test_close_unsaved_scene_drops_its_party_configs() {
    let h = Harness::new();
    let services = &h.services;
    services
        .party
        .save_template(PartyConfig::new("Research"))
        .await
        .unwrap();

    let draft = services.scenes.create("Draft").await;
    services
        .scenes
        .update(&draft.id, |scene| {
            scene.boxes.push(avatar_box("b9", None, &[("e1", "Alice")]));
        })
        .await
        .unwrap();
    services
        .party
        .assign_box(&draft.id, "b9", Some("Research"))
        .await
        .unwrap();
    assert_eq!(h.raw(PARTY_CONFIGS).await.unwrap()["b9"]["name"], "Research");

    services.scenes.close(&draft.id).await.unwrap();

    assert!(h.raw(PARTY_CONFIGS).await.unwrap().get("b9").is_none());
}

#[tokio::test]
async fn test_close_saved_scene_keeps_its_party_configs() {
    let h = Harness::new();
    let services = &h.services;
    services
        .party
        .save_template(PartyConfig::new("Research"))
        .await
        .unwrap();

    let created = services.scenes.create("Kept").await;
    services
        .scenes
        .update(&created.id, |scene| {
            scene
                .boxes
                .push(avatar_box("b5", Some("Research"), &[("e1", "Alice")]));
        })
        .await
        .unwrap();
    services.scenes.save(&created.id).await.unwrap();

    services.scenes.close(&created.id).await.unwrap();

    assert_eq!(h.raw(PARTY_CONFIGS).await.unwrap()["b5"]["name"], "Research");
}

#[tokio::test]
async fn test_update_and_activate_unknown_scene_fail() {
    let h = Harness::new();

    let err = h.services.scenes.update("nope", |_| {}).await.unwrap_err();
    assert!(err.is_not_found());
    let err = h.services.scenes.activate("nope").await.unwrap_err();
    assert!(err.is_not_found());
}
