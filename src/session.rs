use chrono::{DateTime, Local};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::measure::{
    calibrate, calibrate_from_reference, compute_measurements, Calibration, Measurement,
    MeasurementSet, Stabilizer,
};
use crate::pose::{Detection, Skeleton};
use crate::record::MeasurementRecord;

/// 1フレーム処理後の結果
#[derive(Debug, Clone)]
pub struct FrameMeasurements {
    pub frame_index: u64,
    /// Calculator の生の値
    pub raw: MeasurementSet,
    /// Stabilizer を通した表示用の値
    pub stabilized: MeasurementSet,
    /// 描画用にそのまま渡す骨格（未検出フレームは None）
    pub skeleton: Option<Skeleton>,
}

/// 計測パイプラインの状態
///
/// キャリブレーション状態と平滑化窓はここだけが持つ。変更は `&mut self`
/// 経由のみなので書き込み手は常に1つ。
pub struct MeasurementSession {
    config: Config,
    calibration: Option<Calibration>,
    stabilizer: Stabilizer,
    current: Option<FrameMeasurements>,
    /// 安定化済みの値が1つ以上あった直近のフレーム
    last_measured: Option<FrameMeasurements>,
    /// 最初に成功するまで毎フレーム試す身長
    pending_height_cm: Option<f32>,
    frames_processed: u64,
}

impl MeasurementSession {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let stabilizer = Stabilizer::from_config(&config.stabilizer);
        Ok(Self {
            config,
            calibration: None,
            stabilizer,
            current: None,
            last_measured: None,
            pending_height_cm: None,
            frames_processed: 0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn current(&self) -> Option<&FrameMeasurements> {
        self.current.as_ref()
    }

    /// 何か計測できた直近のフレーム。再キャリブレーションで破棄される
    pub fn last_measured(&self) -> Option<&FrameMeasurements> {
        self.last_measured.as_ref()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// 新しいキャリブレーションを適用する
    ///
    /// 置き換えは一度の代入で行い、古い窓の値は捨てる。
    fn apply(&mut self, calibration: Calibration) -> Calibration {
        self.calibration = Some(calibration);
        self.stabilizer.reset();
        self.last_measured = None;
        self.pending_height_cm = None;
        calibration
    }

    /// 身長基準でキャリブレーションする。失敗時は既存の状態を変更しない
    pub fn calibrate(&mut self, skeleton: &Skeleton, height_cm: f32) -> Result<Calibration> {
        match calibrate(skeleton, height_cm, &self.config) {
            Ok(calibration) => Ok(self.apply(calibration)),
            Err(e) => {
                log::warn!("calibration failed on frame {}: {}", skeleton.frame_index, e);
                Err(e)
            }
        }
    }

    /// 既知の計測項目を基準にキャリブレーションする。失敗時は既存の状態を変更しない
    pub fn calibrate_from_reference(
        &mut self,
        skeleton: &Skeleton,
        measurement: Measurement,
        known_cm: f32,
    ) -> Result<Calibration> {
        match calibrate_from_reference(skeleton, measurement, known_cm, &self.config) {
            Ok(calibration) => Ok(self.apply(calibration)),
            Err(e) => {
                log::warn!("calibration failed on frame {}: {}", skeleton.frame_index, e);
                Err(e)
            }
        }
    }

    /// 身長だけ先に与えておき、計測可能な姿勢のフレームで自動キャリブレーションする
    pub fn calibrate_when_ready(&mut self, height_cm: f32) -> Result<()> {
        if !(height_cm.is_finite() && height_cm > 0.0) {
            return Err(Error::InvalidReference(height_cm));
        }
        self.pending_height_cm = Some(height_cm);
        Ok(())
    }

    pub fn is_waiting_for_calibration(&self) -> bool {
        self.pending_height_cm.is_some()
    }

    /// キャリブレーションを破棄する。以後の計測は全項目未定義
    pub fn clear_calibration(&mut self) {
        self.calibration = None;
        self.stabilizer.reset();
        self.last_measured = None;
        log::info!("calibration cleared");
    }

    /// 1フレーム処理する
    pub fn process(&mut self, detection: &Detection) -> &FrameMeasurements {
        self.frames_processed += 1;
        let frame_index = detection.frame_index();

        if let (Some(height), Some(skeleton)) = (self.pending_height_cm, detection.skeleton()) {
            let threshold = self.config.measurement.confidence_threshold;
            if skeleton.is_valid_pose(threshold) {
                // 失敗しても次フレームで再試行する
                let _ = self.calibrate(skeleton, height);
            }
        }

        let raw = match detection.skeleton() {
            Some(skeleton) => compute_measurements(
                skeleton,
                self.calibration.as_ref(),
                &self.config.measurement,
            ),
            None => {
                log::debug!("frame {}: no person detected", frame_index);
                MeasurementSet::undefined(frame_index)
            }
        };
        let stabilized = self.stabilizer.update(&raw);
        log::debug!(
            "frame {}: {} raw / {} stabilized measurements defined",
            frame_index,
            raw.defined_count(),
            stabilized.defined_count()
        );

        let frame = FrameMeasurements {
            frame_index,
            raw,
            stabilized,
            skeleton: detection.skeleton().cloned(),
        };
        if !frame.stabilized.is_all_undefined() {
            self.last_measured = Some(frame.clone());
        }
        self.current.insert(frame)
    }

    /// 現在の安定化済み計測値を記録用に取り出す
    pub fn save_record(&self, timestamp: DateTime<Local>) -> Result<MeasurementRecord> {
        self.record_of(self.current.as_ref(), timestamp)
    }

    /// 直近で計測できたフレームの値を記録用に取り出す（未検出フレームで終わった再生用）
    pub fn save_last_measured(&self, timestamp: DateTime<Local>) -> Result<MeasurementRecord> {
        self.record_of(self.last_measured.as_ref(), timestamp)
    }

    fn record_of(
        &self,
        frame: Option<&FrameMeasurements>,
        timestamp: DateTime<Local>,
    ) -> Result<MeasurementRecord> {
        let calibration = self.calibration.as_ref().ok_or(Error::NotCalibrated)?;
        let frame = frame.ok_or(Error::DetectionMissing)?;
        if frame.stabilized.is_all_undefined() {
            return Err(Error::DetectionMissing);
        }
        Ok(MeasurementRecord {
            timestamp,
            user_height_cm: calibration.user_height_cm(),
            values: frame.stabilized.clone(),
        })
    }
}
