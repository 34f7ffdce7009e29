/// MediaPipe Pose の 33 ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum Landmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl Landmark {
    pub const COUNT: usize = 33;

    pub const ALL: [Landmark; Landmark::COUNT] = [
        Landmark::Nose,
        Landmark::LeftEyeInner,
        Landmark::LeftEye,
        Landmark::LeftEyeOuter,
        Landmark::RightEyeInner,
        Landmark::RightEye,
        Landmark::RightEyeOuter,
        Landmark::LeftEar,
        Landmark::RightEar,
        Landmark::MouthLeft,
        Landmark::MouthRight,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::LeftPinky,
        Landmark::RightPinky,
        Landmark::LeftIndex,
        Landmark::RightIndex,
        Landmark::LeftThumb,
        Landmark::RightThumb,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftAnkle,
        Landmark::RightAnkle,
        Landmark::LeftHeel,
        Landmark::RightHeel,
        Landmark::LeftFootIndex,
        Landmark::RightFootIndex,
    ];

    /// MoveNet (COCO 17点) の出力順に対応するランドマーク
    pub const MOVENET_ORDER: [Landmark; 17] = [
        Landmark::Nose,
        Landmark::LeftEye,
        Landmark::RightEye,
        Landmark::LeftEar,
        Landmark::RightEar,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftAnkle,
        Landmark::RightAnkle,
    ];

    /// snake_case 名 (JSON キーやログで使う)
    pub fn name(self) -> &'static str {
        match self {
            Landmark::Nose => "nose",
            Landmark::LeftEyeInner => "left_eye_inner",
            Landmark::LeftEye => "left_eye",
            Landmark::LeftEyeOuter => "left_eye_outer",
            Landmark::RightEyeInner => "right_eye_inner",
            Landmark::RightEye => "right_eye",
            Landmark::RightEyeOuter => "right_eye_outer",
            Landmark::LeftEar => "left_ear",
            Landmark::RightEar => "right_ear",
            Landmark::MouthLeft => "mouth_left",
            Landmark::MouthRight => "mouth_right",
            Landmark::LeftShoulder => "left_shoulder",
            Landmark::RightShoulder => "right_shoulder",
            Landmark::LeftElbow => "left_elbow",
            Landmark::RightElbow => "right_elbow",
            Landmark::LeftWrist => "left_wrist",
            Landmark::RightWrist => "right_wrist",
            Landmark::LeftPinky => "left_pinky",
            Landmark::RightPinky => "right_pinky",
            Landmark::LeftIndex => "left_index",
            Landmark::RightIndex => "right_index",
            Landmark::LeftThumb => "left_thumb",
            Landmark::RightThumb => "right_thumb",
            Landmark::LeftHip => "left_hip",
            Landmark::RightHip => "right_hip",
            Landmark::LeftKnee => "left_knee",
            Landmark::RightKnee => "right_knee",
            Landmark::LeftAnkle => "left_ankle",
            Landmark::RightAnkle => "right_ankle",
            Landmark::LeftHeel => "left_heel",
            Landmark::RightHeel => "right_heel",
            Landmark::LeftFootIndex => "left_foot_index",
            Landmark::RightFootIndex => "right_foot_index",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.name() == name)
    }
}

/// 単一キーポイント（ピクセル座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// 信頼度が閾値以上か
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }

    pub fn distance(&self, other: &Keypoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// 2点の中点。信頼度は低い方を引き継ぐ
    pub fn midpoint(&self, other: &Keypoint) -> Keypoint {
        Keypoint::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            self.confidence.min(other.confidence),
        )
    }
}

/// 1フレーム分の骨格。未検出のランドマークは None
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub keypoints: [Option<Keypoint>; Landmark::COUNT],
    pub frame_index: u64,
    pub timestamp_ms: Option<u64>,
}

impl Skeleton {
    pub fn new(frame_index: u64) -> Self {
        Self {
            keypoints: [None; Landmark::COUNT],
            frame_index,
            timestamp_ms: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    /// MoveNet の 17 点出力 (x, y, confidence) から作成
    pub fn from_movenet(frame_index: u64, points: &[[f32; 3]; 17]) -> Self {
        let mut skeleton = Self::new(frame_index);
        for (landmark, p) in Landmark::MOVENET_ORDER.iter().zip(points.iter()) {
            skeleton.set(*landmark, Keypoint::new(p[0], p[1], p[2]));
        }
        skeleton
    }

    pub fn set(&mut self, landmark: Landmark, keypoint: Keypoint) {
        self.keypoints[landmark as usize] = Some(keypoint);
    }

    pub fn get(&self, landmark: Landmark) -> Option<&Keypoint> {
        self.keypoints[landmark as usize].as_ref()
    }

    /// 閾値以上の信頼度で検出されているキーポイントのみ返す
    pub fn confident(&self, landmark: Landmark, threshold: f32) -> Option<&Keypoint> {
        self.get(landmark).filter(|kp| kp.is_valid(threshold))
    }

    /// 肩と腰が揃っていれば計測対象の姿勢とみなす
    pub fn is_valid_pose(&self, threshold: f32) -> bool {
        [
            Landmark::LeftShoulder,
            Landmark::RightShoulder,
            Landmark::LeftHip,
            Landmark::RightHip,
        ]
        .iter()
        .all(|&l| self.confident(l, threshold).is_some())
    }

    pub fn detected_count(&self) -> usize {
        self.keypoints.iter().flatten().count()
    }

    /// 検出済みキーポイントの平均信頼度
    pub fn average_confidence(&self) -> f32 {
        let count = self.detected_count();
        if count == 0 {
            return 0.0;
        }
        let sum: f32 = self.keypoints.iter().flatten().map(|k| k.confidence).sum();
        sum / count as f32
    }
}
