use crate::measure::{Measurement, Rule};
use crate::measure::calculator::span_endpoints;
use crate::pose::{Keypoint, Landmark, Skeleton};

/// 骨格の接続定義 (開始ランドマーク, 終了ランドマーク)
pub const SKELETON_CONNECTIONS: [(Landmark, Landmark); 16] = [
    // 顔
    (Landmark::LeftEar, Landmark::LeftEye),
    (Landmark::LeftEye, Landmark::Nose),
    (Landmark::Nose, Landmark::RightEye),
    (Landmark::RightEye, Landmark::RightEar),
    // 上半身
    (Landmark::LeftShoulder, Landmark::RightShoulder),
    (Landmark::LeftShoulder, Landmark::LeftElbow),
    (Landmark::LeftElbow, Landmark::LeftWrist),
    (Landmark::RightShoulder, Landmark::RightElbow),
    (Landmark::RightElbow, Landmark::RightWrist),
    // 胴体
    (Landmark::LeftShoulder, Landmark::LeftHip),
    (Landmark::RightShoulder, Landmark::RightHip),
    (Landmark::LeftHip, Landmark::RightHip),
    // 下半身
    (Landmark::LeftHip, Landmark::LeftKnee),
    (Landmark::LeftKnee, Landmark::LeftAnkle),
    (Landmark::RightHip, Landmark::RightKnee),
    (Landmark::RightKnee, Landmark::RightAnkle),
];

/// キーポイントの色 (RGB)
pub const KEYPOINT_COLOR: u32 = 0x00FF00; // 緑

/// 骨格線の色 (RGB)
pub const SKELETON_COLOR: u32 = 0xFFFF00; // 黄色

/// 信頼度が低いキーポイントの色 (RGB)
pub const LOW_CONFIDENCE_COLOR: u32 = 0xFF0000; // 赤

/// 計測線の色 (RGB)
pub const MEASUREMENT_COLOR: u32 = 0xFF00FF; // マゼンタ

/// 描画する線分
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Keypoint,
    pub to: Keypoint,
    pub color: u32,
}

/// 描画する点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub landmark: Landmark,
    pub point: Keypoint,
    pub color: u32,
}

/// 両端が閾値以上の接続だけ返す
pub fn visible_segments(skeleton: &Skeleton, threshold: f32) -> Vec<Segment> {
    SKELETON_CONNECTIONS
        .iter()
        .filter_map(|&(a, b)| {
            Some(Segment {
                from: *skeleton.confident(a, threshold)?,
                to: *skeleton.confident(b, threshold)?,
                color: SKELETON_COLOR,
            })
        })
        .collect()
}

/// 検出済みの全ランドマーク。閾値未満は色を変える
pub fn keypoint_markers(skeleton: &Skeleton, threshold: f32) -> Vec<Marker> {
    Landmark::ALL
        .iter()
        .filter_map(|&landmark| {
            let point = *skeleton.get(landmark)?;
            let color = if point.is_valid(threshold) {
                KEYPOINT_COLOR
            } else {
                LOW_CONFIDENCE_COLOR
            };
            Some(Marker { landmark, point, color })
        })
        .collect()
}

/// 計測項目の算出に使った線分。計測できない場合は空
pub fn measurement_segments(skeleton: &Skeleton, measurement: Measurement, threshold: f32) -> Vec<Segment> {
    let segment = |from: Keypoint, to: Keypoint| Segment {
        from,
        to,
        color: MEASUREMENT_COLOR,
    };

    match measurement.rule() {
        Rule::Chain(landmarks) => {
            let points: Option<Vec<Keypoint>> = landmarks
                .iter()
                .map(|&l| skeleton.confident(l, threshold).copied())
                .collect();
            points
                .map(|p| p.windows(2).map(|w| segment(w[0], w[1])).collect())
                .unwrap_or_default()
        }
        Rule::Midpoints { from, to } => {
            let ends = (|| {
                let a = skeleton.confident(from[0], threshold)?;
                let b = skeleton.confident(from[1], threshold)?;
                let c = skeleton.confident(to[0], threshold)?;
                let d = skeleton.confident(to[1], threshold)?;
                Some((a.midpoint(b), c.midpoint(d)))
            })();
            ends.map(|(a, b)| vec![segment(a, b)]).unwrap_or_default()
        }
        Rule::Span { top, bottom } => span_endpoints(skeleton, top, bottom, threshold)
            .map(|(a, b)| vec![segment(a, b)])
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper_body() -> Skeleton {
        let mut s = Skeleton::new(0);
        s.set(Landmark::LeftShoulder, Keypoint::new(280.0, 150.0, 0.9));
        s.set(Landmark::RightShoulder, Keypoint::new(360.0, 150.0, 0.9));
        s.set(Landmark::LeftElbow, Keypoint::new(270.0, 230.0, 0.8));
        s.set(Landmark::LeftWrist, Keypoint::new(265.0, 300.0, 0.1));
        s.set(Landmark::LeftHip, Keypoint::new(295.0, 330.0, 0.9));
        s.set(Landmark::RightHip, Keypoint::new(345.0, 330.0, 0.9));
        s
    }

    #[test]
    fn test_visible_segments_skip_low_confidence() {
        let segments = visible_segments(&upper_body(), 0.3);
        // 肩-肩, 左肩-左肘, 左肩-左腰, 右肩-右腰, 腰-腰
        assert_eq!(segments.len(), 5);
        assert!(segments.iter().all(|s| s.color == SKELETON_COLOR));
        assert!(!segments.iter().any(|s| s.to.y == 300.0));
    }

    #[test]
    fn test_keypoint_markers_color_by_confidence() {
        let markers = keypoint_markers(&upper_body(), 0.3);
        assert_eq!(markers.len(), 6);
        let wrist = markers
            .iter()
            .find(|m| m.landmark == Landmark::LeftWrist)
            .unwrap();
        assert_eq!(wrist.color, LOW_CONFIDENCE_COLOR);
    }

    #[test]
    fn test_measurement_segments() {
        let s = upper_body();
        let shoulder = measurement_segments(&s, Measurement::ShoulderWidth, 0.3);
        assert_eq!(shoulder.len(), 1);
        assert_eq!(shoulder[0].color, MEASUREMENT_COLOR);

        let torso = measurement_segments(&s, Measurement::TorsoLength, 0.3);
        assert_eq!(torso.len(), 1);
        assert_eq!(torso[0].from.x, 320.0);
        assert_eq!(torso[0].to.y, 330.0);

        // 手首の信頼度不足
        assert!(measurement_segments(&s, Measurement::LeftArmLength, 0.3).is_empty());
        assert!(measurement_segments(&s, Measurement::Height, 0.3).is_empty());
    }
}
