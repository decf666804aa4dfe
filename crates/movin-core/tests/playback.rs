//! End-to-end playback over parsed documents.

use std::sync::Arc;

use glam::Vec3;
use movin_core::{ease, Animator, BlendError, DocumentError};
use movin_data::Document;

const SLIDE: &str = r#"{
  "nm": "slide", "fr": 30, "ip": 0, "op": 30, "w": 200, "h": 200,
  "layers": [{
    "ind": 1, "nm": "box", "ip": 0, "op": 30,
    "ks": {
      "p": {"a": 1, "k": [
        {"t": 0, "s": [0, 0, 0], "e": [100, 0, 0]},
        {"t": 30, "s": [100, 0, 0]}
      ]},
      "o": {"a": 0, "k": 100}
    },
    "shapes": [{"it": [
      {"ty": "sh", "ks": {"a": 0, "k": {
        "c": true,
        "v": [[0, 0], [10, 0], [10, 10], [0, 10]],
        "i": [[0, 0], [0, 0], [0, 0], [0, 0]],
        "o": [[0, 0], [0, 0], [0, 0], [0, 0]]
      }}},
      {"ty": "fl", "c": {"a": 0, "k": [1, 0, 0, 1]}}
    ]}]
  }]
}"#;

const SLIDE_TARGET: &str = r#"{
  "nm": "slide-target", "fr": 30, "ip": 0, "op": 30, "w": 200, "h": 200,
  "layers": [{
    "ind": 1, "nm": "box", "ip": 0, "op": 30,
    "ks": {
      "p": {"a": 0, "k": [200, 50, 0]},
      "o": {"a": 0, "k": 100}
    },
    "shapes": [{"it": [
      {"ty": "sh", "ks": {"a": 0, "k": {
        "c": true,
        "v": [[0, 0], [20, 0], [20, 20], [0, 20]],
        "i": [[0, 0], [0, 0], [0, 0], [0, 0]],
        "o": [[0, 0], [0, 0], [0, 0], [0, 0]]
      }}},
      {"ty": "fl", "c": {"a": 0, "k": [0, 0, 1, 1]}}
    ]}]
  }]
}"#;

fn load(json: &str) -> Arc<Document> {
    Arc::new(Document::from_json(json).unwrap())
}

fn layer_position(animator: &Animator) -> Vec3 {
    animator.render_tree().layers[0]
        .transform
        .transform_point3(Vec3::ZERO)
}

#[test]
fn playback_reaches_the_midpoint() {
    let mut animator = Animator::new(load(SLIDE)).unwrap();
    animator.play();
    animator.advance(0.5);
    assert!((animator.frame() - 15.0).abs() < 1e-4);
    let p = layer_position(&animator);
    assert!((p.x - 50.0).abs() < 0.5, "midpoint x was {}", p.x);
}

#[test]
fn natural_completion_holds_the_final_pose() {
    // The layer's window closes at the document's last frame, the common
    // shape of real exports.
    let mut animator = Animator::new(load(SLIDE)).unwrap();
    animator.play();
    for _ in 0..8 {
        animator.advance(0.25);
    }
    assert!(!animator.is_playing());
    assert_eq!(animator.frame(), 30.0);

    let tree = animator.render_tree();
    assert_eq!(tree.layers.len(), 1, "layer vanished at completion");
    let p = tree.layers[0].transform.transform_point3(Vec3::ZERO);
    assert!((p.x - 100.0).abs() < 1e-3, "terminal pose was x={}", p.x);
}

#[test]
fn seek_and_playback_agree() {
    let mut played = Animator::new(load(SLIDE)).unwrap();
    played.play();
    for _ in 0..20 {
        played.advance(1.0 / 60.0);
    }

    let mut sought = Animator::new(load(SLIDE)).unwrap();
    sought.seek(played.frame());
    assert!((layer_position(&played).x - layer_position(&sought).x).abs() < 0.1);
}

#[test]
fn long_looping_session_does_not_drift() {
    let mut looped = Animator::new(load(SLIDE)).unwrap();
    looped.set_loop(true);
    looped.play();
    // An awkward delta that never lands on a frame boundary, over many loops.
    for _ in 0..500 {
        looped.advance(0.017);
    }

    let mut reference = Animator::new(load(SLIDE)).unwrap();
    reference.seek(looped.frame());
    assert!(
        (layer_position(&looped).x - layer_position(&reference).x).abs() < 0.5,
        "looped pose diverged from seek at frame {}",
        looped.frame()
    );
}

#[test]
fn visibility_window_gates_render_output() {
    let json = r#"{
      "fr": 30, "op": 30,
      "layers": [{
        "ind": 1, "ip": 10, "op": 20,
        "ks": {"o": {"a": 0, "k": 100}},
        "shapes": []
      }]
    }"#;
    let mut animator = Animator::new(load(json)).unwrap();
    animator.seek(5.0);
    assert!(animator.render_tree().layers.is_empty());
    animator.seek(10.0);
    assert_eq!(animator.render_tree().layers.len(), 1);
    animator.seek(19.9);
    assert_eq!(animator.render_tree().layers.len(), 1);
    animator.seek(20.0);
    assert!(animator.render_tree().layers.is_empty());
}

#[test]
fn blend_is_continuous_at_the_switch() {
    let mut animator = Animator::new(load(SLIDE)).unwrap();
    animator.play();
    animator.advance(0.5);
    let before = layer_position(&animator);

    animator
        .blend_to(load(SLIDE_TARGET), 30.0, ease::STRONG_IN_OUT)
        .unwrap();
    // One tiny tick into the blend: the pose must not jump.
    animator.advance(1.0 / 120.0);
    let after = layer_position(&animator);
    assert!(
        (before - after).length() < 2.0,
        "pose jumped from {before:?} to {after:?}"
    );
}

#[test]
fn blend_lands_on_target_pose_and_color() {
    let mut animator = Animator::new(load(SLIDE)).unwrap();
    animator.play();
    animator.advance(0.5);

    let target = load(SLIDE_TARGET);
    animator
        .blend_to(target.clone(), 15.0, ease::STRONG_IN_OUT)
        .unwrap();
    animator.advance(10.0);

    assert!(Arc::ptr_eq(animator.document(), &target));
    let tree = animator.render_tree();
    let p = tree.layers[0].transform.transform_point3(Vec3::ZERO);
    assert!((p.x - 200.0).abs() < 1e-3 && (p.y - 50.0).abs() < 1e-3);
    let fill = tree.layers[0].shapes[0].fill_color.unwrap();
    assert!(fill.z > 0.999 && fill.x < 1e-4, "fill was {fill:?}");
}

#[test]
fn blend_fires_completion_callback_once() {
    let mut animator = Animator::new(load(SLIDE)).unwrap();
    let count = std::rc::Rc::new(std::cell::Cell::new(0));
    let seen = count.clone();
    animator.on_complete(move || seen.set(seen.get() + 1));

    animator.play();
    animator
        .blend_to(load(SLIDE_TARGET), 15.0, ease::STRONG_IN_OUT)
        .unwrap();
    // Two ticks reach the end of the 15-frame blend window exactly.
    animator.advance(0.25);
    animator.advance(0.25);
    assert_eq!(count.get(), 1);
    // Playback carries on into the target without refiring.
    animator.advance(0.25);
    assert_eq!(count.get(), 1);
    assert!(animator.is_playing());
}

#[test]
fn blend_rejects_vertex_count_mismatch() {
    let bad_target = r#"{
      "fr": 30, "op": 30,
      "layers": [{
        "ind": 1,
        "ks": {"o": {"a": 0, "k": 100}},
        "shapes": [{"it": [
          {"ty": "sh", "ks": {"a": 0, "k": {
            "c": true,
            "v": [[0, 0], [10, 0], [5, 10]],
            "i": [[0, 0], [0, 0], [0, 0]],
            "o": [[0, 0], [0, 0], [0, 0]]
          }}},
          {"ty": "fl", "c": {"a": 0, "k": [0, 0, 1, 1]}}
        ]}]
      }]
    }"#;
    let mut animator = Animator::new(load(SLIDE)).unwrap();
    let err = animator
        .blend_to(load(bad_target), 10.0, ease::LINEAR)
        .unwrap_err();
    assert!(matches!(err, BlendError::VertexCount { current: 4, target: 3, .. }));
    // A failed blend leaves playback untouched.
    assert!(!animator.is_blending());
    animator.play();
    animator.advance(0.5);
    assert!((layer_position(&animator).x - 50.0).abs() < 0.5);
}

#[test]
fn instantiating_an_invalid_document_fails() {
    let doc = Arc::new(Document {
        name: None,
        frame_rate: 30.0,
        in_frame: 0.0,
        total_frames: 30.0,
        width: 100,
        height: 100,
        layers: vec![],
    });
    // The error taxonomy is reachable through this crate alone.
    assert!(matches!(
        Animator::new(doc),
        Err(DocumentError::NoLayers)
    ));
}

#[test]
fn stop_rewinds_to_first_frame() {
    let mut animator = Animator::new(load(SLIDE)).unwrap();
    animator.play();
    animator.advance(0.5);
    animator.stop();
    assert!(!animator.is_playing());
    assert_eq!(animator.frame(), 0.0);
    assert!(layer_position(&animator).x.abs() < 1e-4);
}
