use super::*;
use crate::stages::TextureImage;
use glam::DVec3;
use skeleton_snapshot::{CombineMode, SnapshotBuilder};

fn config() -> GenerationConfig {
    GenerationConfig::default().with_texture_size(32).unwrap()
}

fn one_tube() -> Snapshot {
    SnapshotBuilder::new()
        .tube_part("a", [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], 0.1)
        .leaf_component("ca", "a", CombineMode::Normal)
        .root_children(&["ca"])
        .build()
}

fn two_tubes() -> Snapshot {
    SnapshotBuilder::new()
        .tube_part("a", [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], 0.1)
        .tube_part("b", [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], 0.1)
        .part_attribute("b", "color", "#0000ff")
        .leaf_component("ca", "a", CombineMode::Normal)
        .leaf_component("cb", "b", CombineMode::Normal)
        .root_children(&["ca", "cb"])
        .pose_parameter("lift", "a-n0", "translateZ", 1.0)
        .motion("loop", &[("lift", 1.0)])
        .build()
}

#[test]
fn test_pipeline_runs_every_stage() {
    let mut pipeline = Pipeline::new(config());
    assert_eq!(
        pipeline.set_preview_pose(Some("lift".into())),
        RequestStatus::Skipped
    );
    assert_eq!(
        pipeline.pick(Ray::new(DVec3::new(1.03, -0.37, 5.0), DVec3::NEG_Z)),
        RequestStatus::Skipped
    );
    assert_eq!(pipeline.set_snapshot(two_tubes()), RequestStatus::Started);

    let published = pipeline.wait_idle();
    assert_eq!(published, 7);
    assert!(!pipeline.is_running());

    let outcome = pipeline.outcome().unwrap();
    assert!(outcome.succeeded, "{:?}", outcome.messages);
    assert_eq!(outcome.triangle_normals.len(), outcome.triangle_count());

    let texture = pipeline.texture().unwrap();
    assert!(texture.succeeded);
    let bytes = pipeline.store().get(texture.image.unwrap()).unwrap();
    let image = TextureImage::from_bytes(&bytes).unwrap();
    assert_eq!(image.size, 32);
    assert_eq!(pipeline.store().len(), 1);

    let rig = pipeline.rig().unwrap();
    assert!(rig.succeeded);
    assert_eq!(rig.bones.len(), 2);

    let motions = pipeline.motions().unwrap();
    assert_eq!(motions.motions["loop"].len(), 31);

    let preview = pipeline.pose_preview().unwrap();
    assert!(preview.succeeded);
    assert_eq!(preview.vertices.len(), outcome.vertex_count());

    let pick = pipeline.pick_result().unwrap();
    let hit = pick.hit.as_ref().unwrap();
    assert_eq!(hit.source.as_ref().map(|s| s.part_id.as_str()), Some("b"));
}

#[test]
fn test_snapshot_burst_collapses_to_trailing_run() {
    let mut pipeline = Pipeline::new(config());
    assert_eq!(pipeline.set_snapshot(one_tube()), RequestStatus::Started);
    for _ in 0..5 {
        assert_eq!(pipeline.set_snapshot(one_tube()), RequestStatus::Coalesced);
    }
    assert_eq!(pipeline.set_snapshot(two_tubes()), RequestStatus::Coalesced);

    pipeline.wait_idle();
    assert_eq!(pipeline.mesh_coordinator().runs_started(), 2);
    assert_eq!(pipeline.mesh_coordinator().runs_published(), 2);
    assert_eq!(pipeline.outcome().unwrap().mesh().shell_count(), 2);
}

#[test]
fn test_regeneration_reuses_cached_parts() {
    let mut pipeline = Pipeline::new(config());
    pipeline.set_snapshot(two_tubes());
    pipeline.wait_idle();
    pipeline.set_snapshot(two_tubes());
    pipeline.wait_idle();
    let stats = pipeline.cache().stats();
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hits, 2);
}

#[test]
fn test_pump_without_requests_publishes_nothing() {
    let mut pipeline = Pipeline::new(config());
    assert_eq!(pipeline.pump(), 0);
    assert_eq!(pipeline.wait_idle(), 0);
    assert!(pipeline.outcome().is_none());
}

#[test]
fn test_decode_failure_propagates_failed_outcomes() {
    let snapshot = SnapshotBuilder::new()
        .group_component("g", &["h"], CombineMode::Normal)
        .group_component("h", &["g"], CombineMode::Normal)
        .root_children(&["g"])
        .build();
    let mut pipeline = Pipeline::new(config());
    pipeline.set_snapshot(snapshot);
    pipeline.wait_idle();
    assert!(!pipeline.outcome().unwrap().succeeded);
    assert!(!pipeline.rig().unwrap().succeeded);
    assert!(pipeline.motions().is_none());
}

#[test]
fn test_malformed_entity_keeps_downstream_stages_running() {
    let mut snapshot = two_tubes();
    snapshot
        .nodes
        .get_mut("b-n0")
        .unwrap()
        .insert("radius".into(), "wide".into());
    let mut pipeline = Pipeline::new(config());
    pipeline.set_snapshot(snapshot);
    pipeline.wait_idle();
    let outcome = pipeline.outcome().unwrap();
    assert!(!outcome.succeeded);
    assert_eq!(outcome.triangle_count(), 32);
    assert!(pipeline.rig().unwrap().succeeded);
    assert!(pipeline.motions().unwrap().motions.contains_key("loop"));
}
