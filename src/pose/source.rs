//! Keypoint sources.
//!
//! The detector itself lives outside this crate. Anything that can hand
//! over one skeleton per frame implements [`KeypointSource`]; the crate
//! ships a JSON-lines replay reader and an in-memory source.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::io::BufRead;

use super::keypoint::{Keypoint, Landmark, Skeleton};

/// One frame's detector output.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Person(Skeleton),
    /// The detector ran but found nobody, or the frame was dropped.
    NoPerson { frame_index: u64 },
}

impl Detection {
    pub fn frame_index(&self) -> u64 {
        match self {
            Detection::Person(s) => s.frame_index,
            Detection::NoPerson { frame_index } => *frame_index,
        }
    }

    pub fn skeleton(&self) -> Option<&Skeleton> {
        match self {
            Detection::Person(s) => Some(s),
            Detection::NoPerson { .. } => None,
        }
    }
}

pub trait KeypointSource {
    /// Returns `Ok(None)` once the stream is exhausted.
    fn next_detection(&mut self) -> Result<Option<Detection>>;
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum LineFormat {
    #[default]
    Mediapipe,
    Movenet,
}

#[derive(Debug, Deserialize)]
struct FrameLine {
    frame: Option<u64>,
    timestamp_ms: Option<u64>,
    #[serde(default)]
    format: LineFormat,
    #[serde(default)]
    keypoints: Option<serde_json::Value>,
}

/// Newline-delimited JSON replay of detector output.
///
/// ```text
/// {"frame": 0, "timestamp_ms": 0, "keypoints": {"nose": [320, 50, 0.98], ...}}
/// {"frame": 1, "keypoints": null}
/// {"frame": 2, "format": "movenet", "keypoints": [[320, 50, 0.9], ...]}
/// ```
pub struct JsonLinesSource<R> {
    reader: R,
    line_no: usize,
    next_frame: u64,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            next_frame: 0,
        }
    }

    fn parse_line(&mut self, line: &str) -> Result<Detection> {
        let parsed: FrameLine = serde_json::from_str(line)?;
        let frame_index = parsed.frame.unwrap_or(self.next_frame);
        self.next_frame = frame_index.saturating_add(1);

        let value = match parsed.keypoints {
            None | Some(serde_json::Value::Null) => {
                return Ok(Detection::NoPerson { frame_index });
            }
            Some(v) => v,
        };

        let mut skeleton = match parsed.format {
            LineFormat::Mediapipe => {
                let named: HashMap<String, [f32; 3]> = serde_json::from_value(value)?;
                let mut skeleton = Skeleton::new(frame_index);
                for (name, [x, y, c]) in named {
                    match Landmark::from_name(&name) {
                        Some(landmark) => skeleton.set(landmark, Keypoint::new(x, y, c)),
                        None => log::debug!("line {}: ignoring unknown landmark {:?}", self.line_no, name),
                    }
                }
                skeleton
            }
            LineFormat::Movenet => {
                let points: Vec<[f32; 3]> = serde_json::from_value(value)?;
                let points: [[f32; 3]; 17] = match points.try_into() {
                    Ok(p) => p,
                    Err(v) => bail!("movenet frame needs 17 keypoints, got {}", v.len()),
                };
                Skeleton::from_movenet(frame_index, &points)
            }
        };
        if let Some(ts) = parsed.timestamp_ms {
            skeleton = skeleton.with_timestamp(ts);
        }

        if skeleton.detected_count() == 0 {
            return Ok(Detection::NoPerson { frame_index });
        }
        Ok(Detection::Person(skeleton))
    }
}

impl<R: BufRead> KeypointSource for JsonLinesSource<R> {
    fn next_detection(&mut self) -> Result<Option<Detection>> {
        loop {
            let mut line = String::new();
            let n = self
                .reader
                .read_line(&mut line)
                .context("failed to read keypoint stream")?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let line_no = self.line_no;
            let detection = self
                .parse_line(trimmed)
                .with_context(|| format!("invalid keypoint frame on line {}", line_no))?;
            return Ok(Some(detection));
        }
    }
}

/// Pre-recorded detections, mostly for tests and the interactive shell.
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<Detection>,
}

impl MemorySource {
    pub fn new(frames: Vec<Detection>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl KeypointSource for MemorySource {
    fn next_detection(&mut self) -> Result<Option<Detection>> {
        Ok(self.frames.pop_front())
    }
}
