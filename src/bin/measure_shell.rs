use anyhow::{Context, Result};
use body_measure::config::Config;
use body_measure::measure::{validate, BodyProportions, Measurement};
use body_measure::pose::{JsonLinesSource, KeypointSource, Skeleton};
use body_measure::record::{open_csv, MeasurementRecord};
use body_measure::render::{format_analysis, format_report, visible_segments};
use body_measure::{Error, MeasurementSession};
use std::fs::File;
use std::io::{self, BufReader, Write};

const CONFIG_PATH: &str = "config.toml";

fn current_skeleton(session: &MeasurementSession) -> Option<Skeleton> {
    session.current().and_then(|f| f.skeleton.clone())
}

/// 最大 count フレーム進める。入力の終わりに達したら true
///
/// 壊れた行で止まっても、その行は読み飛ばされているので次の呼び出しで続きから読める。
fn advance<S: KeypointSource>(
    source: &mut S,
    session: &mut MeasurementSession,
    count: usize,
) -> Result<bool> {
    for _ in 0..count {
        match source.next_detection()? {
            Some(detection) => {
                session.process(&detection);
            }
            None => return Ok(true),
        }
    }
    Ok(false)
}

fn append_csv(path: &str, record: &MeasurementRecord) -> Result<()> {
    let mut writer = open_csv(path).with_context(|| format!("failed to open {}", path))?;
    writer
        .write_record(record)
        .with_context(|| format!("failed to write {}", path))
}

fn calibration_failed_message(e: &Error) -> String {
    if e.is_recoverable() {
        format!("キャリブレーション失敗: {}（姿勢を変えて再試行してください）", e)
    } else {
        format!("キャリブレーション失敗: {}", e)
    }
}

fn print_current(session: &MeasurementSession) {
    match session.current() {
        Some(frame) => {
            println!("フレーム {}", frame.frame_index);
            print!("{}", format_report(&frame.stabilized, session.calibration()));
            let proportions = BodyProportions::from_measurements(&frame.stabilized);
            print!("{}", format_analysis(&proportions, &validate(&frame.stabilized)));
        }
        None => println!("まだフレームを読み込んでいません"),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let path = std::env::args()
        .nth(1)
        .context("usage: measure-shell <frames.jsonl>")?;
    let file = File::open(&path).with_context(|| format!("failed to open {}", path))?;
    let mut source = JsonLinesSource::new(BufReader::new(file));

    let config = Config::load_or_default(CONFIG_PATH);
    let csv_path = config.output.csv_path.clone();
    let default_height = config.calibration.default_height_cm;
    let threshold = config.measurement.confidence_threshold;
    let mut session = MeasurementSession::new(config)?;

    println!("=== Body Measure Shell ({}) ===", env!("GIT_VERSION"));
    println!("入力: {}", path);
    println!();
    println!("コマンド:");
    println!("  n [k]         - kフレーム進める (既定 1)");
    println!("  c [cm]        - 現在のフレームで身長キャリブレーション (例: c 175)");
    println!("  r name cm     - 既知の長さでキャリブレーション (例: r shoulder_width 40)");
    println!("  x             - キャリブレーションを解除");
    println!("  p             - 計測結果を表示");
    println!("  s             - CSVに保存");
    println!("  q             - 終了");
    println!();

    let mut finished = false;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "n" if parts.len() <= 2 => {
                let count: usize = match parts.get(1).map(|s| s.parse()) {
                    None => 1,
                    Some(Ok(k)) => k,
                    Some(Err(_)) => {
                        println!("フレーム数が不正です: {}", parts[1]);
                        continue;
                    }
                };
                if finished {
                    println!("入力の終わりに達しています");
                    continue;
                }
                match advance(&mut source, &mut session, count) {
                    Ok(true) => {
                        finished = true;
                        println!("入力の終わりに達しました");
                    }
                    Ok(false) => {}
                    Err(e) => println!("読み込みエラー: {:#}", e),
                }
                if let Some(frame) = session.current() {
                    let (lines, confidence) = frame
                        .skeleton
                        .as_ref()
                        .map(|s| (visible_segments(s, threshold).len(), s.average_confidence()))
                        .unwrap_or((0, 0.0));
                    println!(
                        "フレーム {}: 骨格線 {} 本 (平均信頼度 {:.2}), 計測 {}/{} 項目",
                        frame.frame_index,
                        lines,
                        confidence,
                        frame.stabilized.defined_count(),
                        Measurement::COUNT
                    );
                }
            }
            "c" if parts.len() <= 2 => {
                let height = match parts.get(1).map(|s| s.parse::<f32>()) {
                    Some(Ok(h)) if h > 0.0 => h,
                    None => default_height,
                    _ => {
                        println!("身長が不正です。{} cm を使用します", default_height);
                        default_height
                    }
                };
                let Some(skeleton) = current_skeleton(&session) else {
                    println!("人物が検出されていません。n でフレームを進めてください");
                    continue;
                };
                if !skeleton.is_valid_pose(threshold) {
                    println!("肩と腰が見えていません。まっすぐ立った姿勢のフレームを選んでください");
                    continue;
                }
                match session.calibrate(&skeleton, height) {
                    Ok(c) => println!(
                        "キャリブレーション完了: {:.1} cm / {:.1} px = {:.4} cm/px",
                        c.reference_cm, c.reference_pixels, c.scale_factor
                    ),
                    Err(e) => println!("{}", calibration_failed_message(&e)),
                }
            }
            "r" if parts.len() == 3 => {
                let Some(measurement) = Measurement::from_name(parts[1]) else {
                    println!("不明な計測項目: {}", parts[1]);
                    continue;
                };
                let Ok(cm) = parts[2].parse::<f32>() else {
                    println!("長さが不正です: {}", parts[2]);
                    continue;
                };
                let Some(skeleton) = current_skeleton(&session) else {
                    println!("人物が検出されていません");
                    continue;
                };
                match session.calibrate_from_reference(&skeleton, measurement, cm) {
                    Ok(c) => println!(
                        "キャリブレーション完了 ({}): {:.4} cm/px",
                        measurement.label(),
                        c.scale_factor
                    ),
                    Err(e) => println!("{}", calibration_failed_message(&e)),
                }
            }
            "x" => {
                session.clear_calibration();
                println!("キャリブレーションを解除しました");
            }
            "p" => print_current(&session),
            "s" => match session.save_record(chrono::Local::now()) {
                Ok(record) => match append_csv(&csv_path, &record) {
                    Ok(()) => println!("保存しました: {}", csv_path),
                    Err(e) => println!("保存に失敗しました: {:#}", e),
                },
                Err(e) => println!("保存できません: {}", e),
            },
            "q" => {
                println!("終了します");
                break;
            }
            _ => {
                println!("不明なコマンド: {}", input.trim());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use body_measure::pose::{Detection, Keypoint, Landmark, MemorySource};
    use std::io::Cursor;

    fn frame_line(frame: u64) -> String {
        format!(
            r#"{{"frame": {}, "keypoints": {{"nose": [320, 50, 0.9], "left_shoulder": [280, 150, 0.9]}}}}"#,
            frame
        )
    }

    #[test]
    fn test_advance_continues_after_malformed_line() {
        let text = [frame_line(0), "{not json".to_string(), frame_line(2)].join("\n");
        let mut source = JsonLinesSource::new(Cursor::new(text.into_bytes()));
        let mut session = MeasurementSession::new(Config::default()).unwrap();

        let err = advance(&mut source, &mut session, 3).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"), "{:#}", err);
        assert_eq!(session.current().unwrap().frame_index, 0);

        assert!(!advance(&mut source, &mut session, 1).unwrap());
        assert_eq!(session.current().unwrap().frame_index, 2);
        assert!(advance(&mut source, &mut session, 1).unwrap());
    }

    #[test]
    fn test_advance_reports_end_of_input() {
        let mut skeleton = Skeleton::new(0);
        skeleton.set(Landmark::Nose, Keypoint::new(320.0, 50.0, 0.9));
        let mut source = MemorySource::new(vec![
            Detection::Person(skeleton),
            Detection::NoPerson { frame_index: 1 },
        ]);
        let mut session = MeasurementSession::new(Config::default()).unwrap();
        assert!(advance(&mut source, &mut session, 5).unwrap());
        assert_eq!(session.frames_processed(), 2);
    }

    #[test]
    fn test_append_csv_failure_is_an_error() {
        let dir = std::env::temp_dir().join(format!("measure-shell-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut session = MeasurementSession::new(Config::default()).unwrap();
        let mut skeleton = Skeleton::new(0);
        skeleton.set(Landmark::Nose, Keypoint::new(320.0, 50.0, 0.95));
        skeleton.set(Landmark::LeftAnkle, Keypoint::new(320.0, 550.0, 0.9));
        skeleton.set(Landmark::LeftShoulder, Keypoint::new(280.0, 150.0, 0.9));
        skeleton.set(Landmark::RightShoulder, Keypoint::new(360.0, 150.0, 0.9));
        session.calibrate(&skeleton, 175.0).unwrap();
        session.process(&Detection::Person(skeleton));
        let record = session.save_record(chrono::Local::now()).unwrap();

        // ディレクトリはファイルとして開けない
        assert!(append_csv(dir.to_str().unwrap(), &record).is_err());

        let csv = dir.join("out.csv");
        append_csv(csv.to_str().unwrap(), &record).unwrap();
        assert!(std::fs::read_to_string(&csv).unwrap().starts_with("timestamp"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_calibration_failed_message() {
        assert!(calibration_failed_message(&Error::DetectionMissing).contains("再試行"));
        assert!(!calibration_failed_message(&Error::InvalidReference(-1.0)).contains("再試行"));
    }
}
