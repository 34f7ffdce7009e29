use std::fmt::Write;

use crate::measure::{BodyProportions, Calibration, MeasurementSet, RangeWarning, Reference};

/// キャリブレーション状態の1行表示
pub fn calibration_status(calibration: Option<&Calibration>) -> String {
    match calibration {
        None => "NOT CALIBRATED".to_string(),
        Some(c) => match c.reference {
            Reference::Height => format!(
                "CALIBRATED (height {:.1} cm, {:.4} cm/px)",
                c.reference_cm, c.scale_factor
            ),
            Reference::Segment(m) => format!(
                "CALIBRATED ({} {:.1} cm, {:.4} cm/px)",
                m.label(),
                c.reference_cm,
                c.scale_factor
            ),
        },
    }
}

/// 計測結果の表示用テキスト。未定義の項目は出さない
pub fn format_report(set: &MeasurementSet, calibration: Option<&Calibration>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== BODY MEASUREMENTS ===");
    let _ = writeln!(out, "{}", calibration_status(calibration));
    for (m, value) in set.iter() {
        if let Some(v) = value {
            let _ = writeln!(out, "{}: {:.1} cm", m.label(), v);
        }
    }
    if calibration.is_some() && set.is_all_undefined() {
        let _ = writeln!(out, "(no measurable landmarks in frame {})", set.frame_index);
    }
    out
}

/// 体のバランスと範囲外警告
pub fn format_analysis(proportions: &BodyProportions, warnings: &[RangeWarning]) -> String {
    let mut out = String::new();
    let mut lines = Vec::new();
    if let Some(r) = proportions.shoulder_torso_ratio {
        lines.push(format!("Shoulder/Torso ratio: {:.2}", r));
    }
    if let (Some(s), Some(d)) = (proportions.arm_symmetry, proportions.arm_difference_cm) {
        lines.push(format!("Arm symmetry: {:.1}% (diff {:.1} cm)", s * 100.0, d));
    }
    if let (Some(s), Some(d)) = (proportions.leg_symmetry, proportions.leg_difference_cm) {
        lines.push(format!("Leg symmetry: {:.1}% (diff {:.1} cm)", s * 100.0, d));
    }
    if !lines.is_empty() {
        let _ = writeln!(out, "=== PROPORTIONS ===");
        for line in lines {
            let _ = writeln!(out, "{}", line);
        }
    }
    for w in warnings {
        let _ = writeln!(out, "warning: {}", w);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::measure::{calibrate, validate, Measurement};
    use crate::pose::{Keypoint, Landmark, Skeleton};

    fn calibration() -> Calibration {
        let mut s = Skeleton::new(0);
        s.set(Landmark::Nose, Keypoint::new(320.0, 50.0, 0.9));
        s.set(Landmark::LeftAnkle, Keypoint::new(320.0, 550.0, 0.9));
        calibrate(&s, 175.0, &Config::default()).unwrap()
    }

    #[test]
    fn test_report_not_calibrated() {
        let report = format_report(&MeasurementSet::undefined(3), None);
        assert_eq!(report, "=== BODY MEASUREMENTS ===\nNOT CALIBRATED\n");
    }

    #[test]
    fn test_report_lists_defined_values() {
        let cal = calibration();
        let mut set = MeasurementSet::undefined(3);
        set.set(Measurement::ShoulderWidth, Some(28.0));
        set.set(Measurement::LeftArmLength, Some(61.34));
        let report = format_report(&set, Some(&cal));
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[1], "CALIBRATED (height 175.0 cm, 0.3500 cm/px)");
        assert_eq!(lines[2], "Shoulder Width: 28.0 cm");
        assert_eq!(lines[3], "Left Arm Length: 61.3 cm");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_report_empty_frame_after_calibration() {
        let cal = calibration();
        let report = format_report(&MeasurementSet::undefined(9), Some(&cal));
        assert!(report.ends_with("(no measurable landmarks in frame 9)\n"));
    }

    #[test]
    fn test_analysis() {
        let mut set = MeasurementSet::undefined(0);
        set.set(Measurement::ShoulderWidth, Some(28.0));
        set.set(Measurement::TorsoLength, Some(56.0));
        let text = format_analysis(&BodyProportions::from_measurements(&set), &validate(&set));
        assert!(text.contains("Shoulder/Torso ratio: 0.50"));
        assert!(text.contains("warning: Shoulder Width: 28.0cm seems unusual"));
        assert_eq!(format_analysis(&BodyProportions::default(), &[]), "");
    }
}
