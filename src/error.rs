use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// 必要なランドマークが欠けている、または信頼度が閾値未満
    #[error("required landmarks missing or below confidence threshold")]
    DetectionMissing,

    /// 基準となるピクセル長が小さすぎてスケールを求められない
    #[error("reference pixel length {pixel_height:.1}px is at or below the minimum {min:.1}px")]
    DegenerateGeometry { pixel_height: f32, min: f32 },

    #[error("measurement requested before a successful calibration")]
    NotCalibrated,

    #[error("reference length must be a positive finite number, got {0}")]
    InvalidReference(f32),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// フレーム単位で回復可能なエラーか（撮り直し・再試行で解消する）
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DetectionMissing | Error::DegenerateGeometry { .. } | Error::NotCalibrated
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_recoverable() {
        assert!(Error::DetectionMissing.is_recoverable());
        assert!(Error::DegenerateGeometry { pixel_height: 2.0, min: 50.0 }.is_recoverable());
        assert!(Error::NotCalibrated.is_recoverable());
        assert!(!Error::InvalidReference(-1.0).is_recoverable());
        assert!(!Error::Config("window".to_string()).is_recoverable());
    }
}
