use std::collections::VecDeque;

use crate::config::{StabilizeMethod, StabilizerConfig};

use super::calculator::MeasurementSet;
use super::definitions::Measurement;

/// 計測値のフレーム間平滑化フィルタ
///
/// 項目ごとに直近 `window` 個の定義済みの値を保持し、
/// 中央値・平均・EMA のいずれかを出力する。未定義の値は窓に入れない。
pub struct Stabilizer {
    method: StabilizeMethod,
    alpha: f32,
    window: usize,
    hold_missing: bool,
    history: [VecDeque<f32>; Measurement::COUNT],
}

impl Stabilizer {
    pub fn new(window: usize, method: StabilizeMethod, alpha: f32) -> Self {
        let window = window.max(1);
        Self {
            method,
            alpha,
            window,
            hold_missing: false,
            history: std::array::from_fn(|_| VecDeque::with_capacity(window)),
        }
    }

    pub fn from_config(config: &StabilizerConfig) -> Self {
        Self::new(config.window, config.method, config.ema_alpha).with_hold_missing(config.hold_missing)
    }

    /// 今フレームで未定義の項目にも窓の値を出力するか
    pub fn with_hold_missing(mut self, hold: bool) -> Self {
        self.hold_missing = hold;
        self
    }

    pub fn update(&mut self, raw: &MeasurementSet) -> MeasurementSet {
        let mut out = MeasurementSet::undefined(raw.frame_index);
        for (m, value) in raw.iter() {
            let window = &mut self.history[m as usize];
            // 有限でない値は未定義と同じ扱いで窓に入れない
            if let Some(v) = value.filter(|v| v.is_finite()) {
                if window.len() == self.window {
                    window.pop_front();
                }
                window.push_back(v);
            } else if !self.hold_missing {
                continue;
            }
            if window.is_empty() {
                continue;
            }
            let smoothed = match self.method {
                StabilizeMethod::Median => median(window),
                StabilizeMethod::Mean => mean(window),
                StabilizeMethod::Ema => ema(window, self.alpha),
            };
            out.set(m, Some(smoothed));
        }
        out
    }

    pub fn window_len(&self, measurement: Measurement) -> usize {
        self.history[measurement as usize].len()
    }

    pub fn reset(&mut self) {
        for window in &mut self.history {
            window.clear();
        }
    }
}

fn median(values: &VecDeque<f32>) -> f32 {
    let mut sorted: Vec<f32> = values.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn mean(values: &VecDeque<f32>) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

/// 古い順に EMA を畳み込む。先頭の値はそのまま初期値にする
fn ema(values: &VecDeque<f32>, alpha: f32) -> f32 {
    let mut iter = values.iter();
    let first = match iter.next() {
        Some(v) => *v,
        None => return 0.0,
    };
    iter.fold(first, |prev, &v| alpha * v + (1.0 - alpha) * prev)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq_f32(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    fn shoulder(frame: u64, value: Option<f32>) -> MeasurementSet {
        let mut set = MeasurementSet::undefined(frame);
        set.set(Measurement::ShoulderWidth, value);
        set
    }

    fn feed(s: &mut Stabilizer, values: &[f32]) -> f32 {
        let mut last = None;
        for (i, v) in values.iter().enumerate() {
            last = s.update(&shoulder(i as u64, Some(*v))).get(Measurement::ShoulderWidth);
        }
        last.unwrap()
    }

    #[test]
    fn test_first_frame_passthrough() {
        let mut s = Stabilizer::new(10, StabilizeMethod::Median, 0.3);
        let out = s.update(&shoulder(0, Some(42.0)));
        assert_eq!(out.get(Measurement::ShoulderWidth), Some(42.0));
        assert_eq!(out.frame_index, 0);
    }

    #[test]
    fn test_median_converges() {
        let mut s = Stabilizer::new(10, StabilizeMethod::Median, 0.3);
        let result = feed(&mut s, &[10.0, 10.2, 9.8, 10.1]);
        assert!(approx_eq_f32(result, 10.0, 0.1), "got {}", result);
    }

    #[test]
    fn test_median_ignores_single_outlier() {
        let mut s = Stabilizer::new(10, StabilizeMethod::Median, 0.3);
        let result = feed(&mut s, &[10.0, 10.2, 25.0, 10.1]);
        assert!(approx_eq_f32(result, 10.0, 0.2), "got {}", result);

        let mut m = Stabilizer::new(10, StabilizeMethod::Mean, 0.3);
        let mean_result = feed(&mut m, &[10.0, 10.2, 25.0, 10.1]);
        assert!(mean_result > 13.0, "mean should be pulled by the outlier");
    }

    #[test]
    fn test_mean() {
        let mut s = Stabilizer::new(10, StabilizeMethod::Mean, 0.3);
        let result = feed(&mut s, &[10.0, 10.2, 9.8, 10.0]);
        assert!(approx_eq_f32(result, 10.0, 1e-5));
    }

    #[test]
    fn test_ema_full_weight_is_latest() {
        let mut s = Stabilizer::new(10, StabilizeMethod::Ema, 1.0);
        let result = feed(&mut s, &[1.0, 2.0, 3.0]);
        assert!(approx_eq_f32(result, 3.0, 1e-6));
    }

    #[test]
    fn test_ema_half() {
        let mut s = Stabilizer::new(10, StabilizeMethod::Ema, 0.5);
        // 0 -> 0.5*4 + 0.5*0 = 2
        let result = feed(&mut s, &[0.0, 4.0]);
        assert!(approx_eq_f32(result, 2.0, 1e-6));
    }

    #[test]
    fn test_window_is_bounded() {
        let mut s = Stabilizer::new(3, StabilizeMethod::Mean, 0.3);
        let result = feed(&mut s, &[100.0, 1.0, 2.0, 3.0]);
        assert_eq!(s.window_len(Measurement::ShoulderWidth), 3);
        assert!(approx_eq_f32(result, 2.0, 1e-6));
    }

    #[test]
    fn test_undefined_is_skipped_not_zero() {
        let mut s = Stabilizer::new(10, StabilizeMethod::Mean, 0.3);
        s.update(&shoulder(0, Some(10.0)));
        let out = s.update(&shoulder(1, None));
        assert_eq!(out.get(Measurement::ShoulderWidth), None);
        assert_eq!(s.window_len(Measurement::ShoulderWidth), 1);
        let out = s.update(&shoulder(2, Some(12.0)));
        assert_eq!(out.get(Measurement::ShoulderWidth), Some(11.0));
    }

    #[test]
    fn test_non_finite_value_never_enters_window() {
        for method in [StabilizeMethod::Mean, StabilizeMethod::Ema, StabilizeMethod::Median] {
            let mut s = Stabilizer::new(10, method, 0.5);
            s.update(&shoulder(0, Some(28.0)));
            let out = s.update(&shoulder(1, Some(f32::INFINITY)));
            assert_eq!(out.get(Measurement::ShoulderWidth), None);
            s.update(&shoulder(2, Some(f32::NAN)));
            assert_eq!(s.window_len(Measurement::ShoulderWidth), 1);
            let out = s.update(&shoulder(3, Some(28.0)));
            assert_eq!(out.get(Measurement::ShoulderWidth), Some(28.0));
        }
    }

    #[test]
    fn test_hold_missing() {
        let mut s = Stabilizer::new(10, StabilizeMethod::Mean, 0.3).with_hold_missing(true);
        s.update(&shoulder(0, Some(10.0)));
        let out = s.update(&shoulder(1, None));
        assert_eq!(out.get(Measurement::ShoulderWidth), Some(10.0));
    }

    #[test]
    fn test_never_defined_stays_undefined() {
        let mut s = Stabilizer::new(10, StabilizeMethod::Median, 0.3).with_hold_missing(true);
        let out = s.update(&shoulder(0, Some(10.0)));
        assert_eq!(out.get(Measurement::Height), None);
    }

    #[test]
    fn test_reset() {
        let mut s = Stabilizer::new(10, StabilizeMethod::Mean, 0.3);
        feed(&mut s, &[50.0, 50.0]);
        s.reset();
        assert_eq!(s.window_len(Measurement::ShoulderWidth), 0);
        // リセット後は古い値が混ざらない
        let out = s.update(&shoulder(5, Some(20.0)));
        assert_eq!(out.get(Measurement::ShoulderWidth), Some(20.0));
    }
}
