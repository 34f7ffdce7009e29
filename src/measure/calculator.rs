use crate::config::MeasurementConfig;
use crate::pose::{Keypoint, Skeleton};

use super::calibrator::Calibration;
use super::definitions::{Measurement, Rule};

/// 1フレーム分の計測結果 (cm)。未定義の項目は None
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSet {
    pub frame_index: u64,
    values: [Option<f32>; Measurement::COUNT],
}

impl MeasurementSet {
    /// 全項目未定義
    pub fn undefined(frame_index: u64) -> Self {
        Self {
            frame_index,
            values: [None; Measurement::COUNT],
        }
    }

    pub fn get(&self, measurement: Measurement) -> Option<f32> {
        self.values[measurement as usize]
    }

    pub fn set(&mut self, measurement: Measurement, value: Option<f32>) {
        self.values[measurement as usize] = value;
    }

    /// 定義順に (項目, 値) を返す
    pub fn iter(&self) -> impl Iterator<Item = (Measurement, Option<f32>)> + '_ {
        Measurement::ALL.iter().map(move |&m| (m, self.get(m)))
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().flatten().count()
    }

    pub fn is_all_undefined(&self) -> bool {
        self.defined_count() == 0
    }
}

/// 折れ線の総延長
pub fn path_length(points: &[Keypoint]) -> f32 {
    points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// 頭部候補の最上点と足部候補の最下点
pub fn span_endpoints(
    skeleton: &Skeleton,
    top: &[crate::pose::Landmark],
    bottom: &[crate::pose::Landmark],
    threshold: f32,
) -> Option<(Keypoint, Keypoint)> {
    let top = top
        .iter()
        .filter_map(|&l| skeleton.confident(l, threshold))
        .min_by(|a, b| a.y.total_cmp(&b.y))?;
    let bottom = bottom
        .iter()
        .filter_map(|&l| skeleton.confident(l, threshold))
        .max_by(|a, b| a.y.total_cmp(&b.y))?;
    Some((*top, *bottom))
}

/// 計測項目のピクセル長（補正係数込み）
///
/// 使うランドマークのどれかが欠けている、または閾値未満なら None。
/// 座標が大きすぎて長さが有限にならない場合も None。
pub fn pixel_length(skeleton: &Skeleton, measurement: Measurement, threshold: f32) -> Option<f32> {
    let raw = match measurement.rule() {
        Rule::Chain(landmarks) => {
            let points = landmarks
                .iter()
                .map(|&l| skeleton.confident(l, threshold).copied())
                .collect::<Option<Vec<_>>>()?;
            path_length(&points)
        }
        Rule::Midpoints { from, to } => {
            let a = skeleton.confident(from[0], threshold)?;
            let b = skeleton.confident(from[1], threshold)?;
            let c = skeleton.confident(to[0], threshold)?;
            let d = skeleton.confident(to[1], threshold)?;
            a.midpoint(b).distance(&c.midpoint(d))
        }
        Rule::Span { top, bottom } => {
            let (top, bottom) = span_endpoints(skeleton, top, bottom, threshold)?;
            top.distance(&bottom)
        }
    };
    Some(raw * measurement.multiplier()).filter(|v| v.is_finite())
}

/// 全項目を計測する
///
/// 未キャリブレーションなら全項目未定義（0 ではない）。
/// 副作用なしの純関数で、同じ入力には同じ結果を返す。
pub fn compute_measurements(
    skeleton: &Skeleton,
    calibration: Option<&Calibration>,
    config: &MeasurementConfig,
) -> MeasurementSet {
    let mut set = MeasurementSet::undefined(skeleton.frame_index);
    let Some(calibration) = calibration else {
        return set;
    };

    for m in Measurement::ALL {
        let value = pixel_length(skeleton, m, config.confidence_threshold)
            .map(|px| calibration.to_cm(px))
            .filter(|cm| cm.is_finite());
        set.set(m, value);
    }
    set
}
