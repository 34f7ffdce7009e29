use crate::config::Config;
use crate::error::{Error, Result};
use crate::pose::{Landmark, Skeleton};

use super::calculator::{pixel_length, span_endpoints};
use super::definitions::{Measurement, FOOT_LANDMARKS, HEAD_LANDMARKS};

/// スケールの基準にした長さ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// ユーザーの身長
    Height,
    /// 実寸が既知の計測項目（肩幅など）
    Segment(Measurement),
}

/// キャリブレーション結果
///
/// 生成できた時点で有効。無効状態は `Option<Calibration>` の None で表す。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub reference: Reference,
    /// 基準の実寸 (cm)
    pub reference_cm: f32,
    /// 基準のピクセル長
    pub reference_pixels: f32,
    /// cm / px
    pub scale_factor: f32,
    /// キャリブレーションに使ったフレーム
    pub frame_index: u64,
}

impl Calibration {
    fn new(reference: Reference, reference_cm: f32, reference_pixels: f32, frame_index: u64) -> Self {
        Self {
            reference,
            reference_cm,
            reference_pixels,
            scale_factor: reference_cm / reference_pixels,
            frame_index,
        }
    }

    pub fn to_cm(&self, pixels: f32) -> f32 {
        pixels * self.scale_factor
    }

    /// 身長基準のときのみ身長を返す
    pub fn user_height_cm(&self) -> Option<f32> {
        match self.reference {
            Reference::Height => Some(self.reference_cm),
            Reference::Segment(_) => None,
        }
    }
}

fn check_reference(reference_cm: f32) -> Result<()> {
    if !(reference_cm.is_finite() && reference_cm > 0.0) {
        return Err(Error::InvalidReference(reference_cm));
    }
    Ok(())
}

fn check_pixels(pixel_height: f32, config: &Config) -> Result<()> {
    let min = config.calibration.min_pixel_height;
    // 設定値に関わらず 0 以下は逆数が取れない
    if !pixel_height.is_finite() || pixel_height <= 0.0 || pixel_height <= min {
        return Err(Error::DegenerateGeometry { pixel_height, min });
    }
    Ok(())
}

/// 全身のピクセル高さ
///
/// 頭部の最上点〜足部の最下点の直線距離。どちらかが見えない場合は
/// 設定に応じて肩〜足首の距離から推定する（左側優先）。
pub fn body_pixel_height(skeleton: &Skeleton, config: &Config) -> Option<f32> {
    let threshold = config.measurement.confidence_threshold;
    if let Some((top, bottom)) = span_endpoints(skeleton, HEAD_LANDMARKS, FOOT_LANDMARKS, threshold) {
        return Some(top.distance(&bottom));
    }

    if !config.calibration.shoulder_fallback {
        return None;
    }
    let ratio = config.calibration.shoulder_to_height_ratio;
    [
        (Landmark::LeftShoulder, Landmark::LeftAnkle),
        (Landmark::RightShoulder, Landmark::RightAnkle),
    ]
    .iter()
    .find_map(|&(shoulder, ankle)| {
        let s = skeleton.confident(shoulder, threshold)?;
        let a = skeleton.confident(ankle, threshold)?;
        log::debug!(
            "head/foot not visible, estimating height from {} -> {}",
            shoulder.name(),
            ankle.name()
        );
        Some(s.distance(a) / ratio)
    })
}

/// 身長を基準にキャリブレーションする
pub fn calibrate(skeleton: &Skeleton, height_cm: f32, config: &Config) -> Result<Calibration> {
    check_reference(height_cm)?;
    let pixel_height = body_pixel_height(skeleton, config).ok_or(Error::DetectionMissing)?;
    check_pixels(pixel_height, config)?;

    let calibration = Calibration::new(Reference::Height, height_cm, pixel_height, skeleton.frame_index);
    log::info!(
        "calibrated: height {:.1} cm, pixel height {:.2} px, scale {:.4} cm/px",
        height_cm,
        pixel_height,
        calibration.scale_factor
    );
    Ok(calibration)
}

/// 実寸が既知の計測項目を基準にキャリブレーションする
pub fn calibrate_from_reference(
    skeleton: &Skeleton,
    measurement: Measurement,
    known_cm: f32,
    config: &Config,
) -> Result<Calibration> {
    check_reference(known_cm)?;
    let pixels = pixel_length(skeleton, measurement, config.measurement.confidence_threshold)
        .ok_or(Error::DetectionMissing)?;
    check_pixels(pixels, config)?;

    let calibration = Calibration::new(
        Reference::Segment(measurement),
        known_cm,
        pixels,
        skeleton.frame_index,
    );
    log::info!(
        "calibrated from {}: {:.1} cm over {:.2} px, scale {:.4} cm/px",
        measurement.name(),
        known_cm,
        pixels,
        calibration.scale_factor
    );
    Ok(calibration)
}
