use std::fmt;

use super::calculator::MeasurementSet;
use super::definitions::Measurement;

/// 体のバランス指標。入力が揃っている項目のみ Some
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyProportions {
    /// 肩幅 / 胴の長さ
    pub shoulder_torso_ratio: Option<f32>,
    /// 左右の腕の短い方 / 長い方 (1.0 = 完全に対称)
    pub arm_symmetry: Option<f32>,
    pub arm_difference_cm: Option<f32>,
    pub leg_symmetry: Option<f32>,
    pub leg_difference_cm: Option<f32>,
}

fn symmetry(a: f32, b: f32) -> Option<f32> {
    let hi = a.max(b);
    if hi > 0.0 {
        Some(a.min(b) / hi)
    } else {
        None
    }
}

impl BodyProportions {
    pub fn from_measurements(set: &MeasurementSet) -> Self {
        let mut p = Self::default();

        if let (Some(shoulder), Some(torso)) = (
            set.get(Measurement::ShoulderWidth),
            set.get(Measurement::TorsoLength),
        ) {
            if torso > 0.0 {
                p.shoulder_torso_ratio = Some(shoulder / torso);
            }
        }

        if let (Some(l), Some(r)) = (
            set.get(Measurement::LeftArmLength),
            set.get(Measurement::RightArmLength),
        ) {
            p.arm_symmetry = symmetry(l, r);
            p.arm_difference_cm = Some((l - r).abs());
        }

        if let (Some(l), Some(r)) = (
            set.get(Measurement::LeftLegLength),
            set.get(Measurement::RightLegLength),
        ) {
            p.leg_symmetry = symmetry(l, r);
            p.leg_difference_cm = Some((l - r).abs());
        }

        p
    }
}

/// 妥当な範囲から外れた計測値
#[derive(Debug, Clone, PartialEq)]
pub struct RangeWarning {
    pub measurement: Measurement,
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.1}cm seems unusual (expected {:.0}-{:.0}cm)",
            self.measurement.label(),
            self.value,
            self.min,
            self.max
        )
    }
}

/// 範囲外の項目を警告として返す。計測結果自体は棄却しない
pub fn validate(set: &MeasurementSet) -> Vec<RangeWarning> {
    set.iter()
        .filter_map(|(m, value)| {
            let value = value?;
            let (min, max) = m.plausible_range()?;
            if value < min || value > max {
                Some(RangeWarning {
                    measurement: m,
                    value,
                    min,
                    max,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(values: &[(Measurement, f32)]) -> MeasurementSet {
        let mut set = MeasurementSet::undefined(0);
        for &(m, v) in values {
            set.set(m, Some(v));
        }
        set
    }

    #[test]
    fn test_proportions() {
        let set = set_of(&[
            (Measurement::ShoulderWidth, 40.0),
            (Measurement::TorsoLength, 50.0),
            (Measurement::LeftArmLength, 60.0),
            (Measurement::RightArmLength, 57.0),
        ]);
        let p = BodyProportions::from_measurements(&set);
        assert!((p.shoulder_torso_ratio.unwrap() - 0.8).abs() < 1e-6);
        assert!((p.arm_symmetry.unwrap() - 0.95).abs() < 1e-6);
        assert!((p.arm_difference_cm.unwrap() - 3.0).abs() < 1e-6);
        assert_eq!(p.leg_symmetry, None);
        assert_eq!(p.leg_difference_cm, None);
    }

    #[test]
    fn test_proportions_empty() {
        let p = BodyProportions::from_measurements(&MeasurementSet::undefined(0));
        assert_eq!(p, BodyProportions::default());
    }

    #[test]
    fn test_validate() {
        let set = set_of(&[
            (Measurement::ShoulderWidth, 28.0),
            (Measurement::TorsoLength, 55.0),
            (Measurement::LeftLegLength, 140.0),
            (Measurement::Height, 999.0),
        ]);
        let warnings = validate(&set);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].measurement, Measurement::ShoulderWidth);
        assert_eq!(warnings[1].measurement, Measurement::LeftLegLength);
        assert_eq!(
            warnings[0].to_string(),
            "Shoulder Width: 28.0cm seems unusual (expected 30-60cm)"
        );
    }
}
