//! Synthetic detector output for end-to-end tests.

use serde_json::{json, Map, Value};

/// (name, x, y) of an upright subject. Nose to left ankle spans exactly 500 px.
pub const STANDING: [(&str, f32, f32); 17] = [
    ("nose", 320.0, 52.0),
    ("left_eye", 312.0, 60.0),
    ("right_eye", 328.0, 60.0),
    ("left_ear", 300.0, 64.0),
    ("right_ear", 340.0, 64.0),
    ("left_shoulder", 280.0, 150.0),
    ("right_shoulder", 360.0, 150.0),
    ("left_elbow", 270.0, 230.0),
    ("right_elbow", 370.0, 230.0),
    ("left_wrist", 265.0, 300.0),
    ("right_wrist", 375.0, 300.0),
    ("left_hip", 295.0, 330.0),
    ("right_hip", 345.0, 330.0),
    ("left_knee", 300.0, 440.0),
    ("right_knee", 345.0, 440.0),
    ("left_ankle", 320.0, 552.0),
    ("right_ankle", 345.0, 550.0),
];

/// One JSON Lines frame in the named-landmark layout.
/// `moved` overrides the position of individual landmarks.
pub fn named_frame(frame: u64, moved: &[(&str, f32, f32)]) -> String {
    let mut keypoints = Map::new();
    for &(name, x, y) in STANDING.iter() {
        let (x, y) = moved
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|&(_, x, y)| (x, y))
            .unwrap_or((x, y));
        keypoints.insert(name.to_string(), json!([x, y, 0.9]));
    }
    json!({ "frame": frame, "timestamp_ms": frame * 33, "keypoints": Value::Object(keypoints) })
        .to_string()
}

/// Same subject in the 17-point MoveNet array layout.
pub fn movenet_frame(frame: u64) -> String {
    let points: Vec<Value> = STANDING.iter().map(|&(_, x, y)| json!([x, y, 0.8])).collect();
    json!({ "frame": frame, "format": "movenet", "keypoints": points }).to_string()
}

pub fn empty_frame(frame: u64) -> String {
    json!({ "frame": frame, "keypoints": null }).to_string()
}

pub fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() < eps
}
