use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Error;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub measurement: MeasurementConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub stabilizer: StabilizerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MeasurementConfig {
    /// キーポイントを採用する最小信頼度
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalibrationConfig {
    /// これ以下のピクセル身長はスケール算出に使わない
    #[serde(default = "default_min_pixel_height")]
    pub min_pixel_height: f32,
    /// 身長入力が不正なときに使う値（cm）
    #[serde(default = "default_height_cm")]
    pub default_height_cm: f32,
    /// 頭部・足部が見えないとき肩〜足首から全身高を推定する
    #[serde(default = "default_shoulder_fallback")]
    pub shoulder_fallback: bool,
    /// 肩〜足首 / 全身高 の比率
    #[serde(default = "default_shoulder_to_height_ratio")]
    pub shoulder_to_height_ratio: f32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StabilizeMethod {
    Median,
    Mean,
    Ema,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StabilizerConfig {
    /// 計測値ごとに保持するフレーム数
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_method")]
    pub method: StabilizeMethod,
    /// EMA係数 (0.0〜1.0, 大きいほど新しい値を重視)
    #[serde(default = "default_ema_alpha")]
    pub ema_alpha: f32,
    /// 今フレームで未定義の項目も直近の窓から値を出し続ける
    #[serde(default)]
    pub hold_missing: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

fn default_confidence_threshold() -> f32 { 0.3 }
fn default_min_pixel_height() -> f32 { 50.0 }
fn default_height_cm() -> f32 { 170.0 }
fn default_shoulder_fallback() -> bool { true }
fn default_shoulder_to_height_ratio() -> f32 { 0.75 }
fn default_window() -> usize { 10 }
fn default_method() -> StabilizeMethod { StabilizeMethod::Median }
fn default_ema_alpha() -> f32 { 0.3 }
fn default_csv_path() -> String { "outputs/measurements.csv".to_string() }

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_pixel_height: default_min_pixel_height(),
            default_height_cm: default_height_cm(),
            shoulder_fallback: default_shoulder_fallback(),
            shoulder_to_height_ratio: default_shoulder_to_height_ratio(),
        }
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            method: default_method(),
            ema_alpha: default_ema_alpha(),
            hold_missing: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 読み込みに失敗した場合は警告を出してデフォルト設定を返す
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("{} not found, using default config", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("failed to load {}: {:#}, using default config", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> std::result::Result<(), Error> {
        let threshold = self.measurement.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "measurement.confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.stabilizer.window == 0 {
            return Err(Error::Config("stabilizer.window must be at least 1".to_string()));
        }
        let alpha = self.stabilizer.ema_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::Config(format!(
                "stabilizer.ema_alpha must be within (0, 1], got {}",
                alpha
            )));
        }
        let ratio = self.calibration.shoulder_to_height_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(Error::Config(format!(
                "calibration.shoulder_to_height_ratio must be within (0, 1], got {}",
                ratio
            )));
        }
        if !(self.calibration.min_pixel_height >= 0.0) {
            return Err(Error::Config(format!(
                "calibration.min_pixel_height must be a non-negative number, got {}",
                self.calibration.min_pixel_height
            )));
        }
        if !(self.calibration.default_height_cm > 0.0) {
            return Err(Error::Config(
                "calibration.default_height_cm must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
