use crate::pose::Landmark;

/// 頭頂側の候補（最も上にあるものを採用）
pub const HEAD_LANDMARKS: &[Landmark] = &[
    Landmark::Nose,
    Landmark::LeftEyeInner,
    Landmark::LeftEye,
    Landmark::LeftEyeOuter,
    Landmark::RightEyeInner,
    Landmark::RightEye,
    Landmark::RightEyeOuter,
    Landmark::LeftEar,
    Landmark::RightEar,
];

/// 足元側の候補（最も下にあるものを採用）
pub const FOOT_LANDMARKS: &[Landmark] = &[
    Landmark::LeftAnkle,
    Landmark::RightAnkle,
    Landmark::LeftHeel,
    Landmark::RightHeel,
    Landmark::LeftFootIndex,
    Landmark::RightFootIndex,
];

/// ピクセル長の求め方
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// 連続する点の区間距離の総和（2点なら単純な距離）
    Chain(&'static [Landmark]),
    /// 2組の中点どうしの距離
    Midpoints {
        from: [Landmark; 2],
        to: [Landmark; 2],
    },
    /// 最上部の頭部点から最下部の足部点まで
    Span {
        top: &'static [Landmark],
        bottom: &'static [Landmark],
    },
}

/// 計測項目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum Measurement {
    Height = 0,
    ShoulderWidth = 1,
    ChestWidth = 2,
    HipWidth = 3,
    TorsoLength = 4,
    LeftArmLength = 5,
    RightArmLength = 6,
    LeftLegLength = 7,
    RightLegLength = 8,
}

impl Measurement {
    pub const COUNT: usize = 9;

    /// CSV の列順もこの順序
    pub const ALL: [Measurement; Measurement::COUNT] = [
        Measurement::Height,
        Measurement::ShoulderWidth,
        Measurement::ChestWidth,
        Measurement::HipWidth,
        Measurement::TorsoLength,
        Measurement::LeftArmLength,
        Measurement::RightArmLength,
        Measurement::LeftLegLength,
        Measurement::RightLegLength,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Measurement::Height => "height",
            Measurement::ShoulderWidth => "shoulder_width",
            Measurement::ChestWidth => "chest_width",
            Measurement::HipWidth => "hip_width",
            Measurement::TorsoLength => "torso_length",
            Measurement::LeftArmLength => "left_arm_length",
            Measurement::RightArmLength => "right_arm_length",
            Measurement::LeftLegLength => "left_leg_length",
            Measurement::RightLegLength => "right_leg_length",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.name() == name)
    }

    /// 表示用ラベル
    pub fn label(self) -> &'static str {
        match self {
            Measurement::Height => "Height",
            Measurement::ShoulderWidth => "Shoulder Width",
            Measurement::ChestWidth => "Chest Width",
            Measurement::HipWidth => "Hip Width",
            Measurement::TorsoLength => "Torso Length",
            Measurement::LeftArmLength => "Left Arm Length",
            Measurement::RightArmLength => "Right Arm Length",
            Measurement::LeftLegLength => "Left Leg Length",
            Measurement::RightLegLength => "Right Leg Length",
        }
    }

    pub fn rule(self) -> Rule {
        use Landmark::*;
        match self {
            Measurement::Height => Rule::Span {
                top: HEAD_LANDMARKS,
                bottom: FOOT_LANDMARKS,
            },
            Measurement::ShoulderWidth | Measurement::ChestWidth => {
                Rule::Chain(&[LeftShoulder, RightShoulder])
            }
            Measurement::HipWidth => Rule::Chain(&[LeftHip, RightHip]),
            Measurement::TorsoLength => Rule::Midpoints {
                from: [LeftShoulder, RightShoulder],
                to: [LeftHip, RightHip],
            },
            Measurement::LeftArmLength => Rule::Chain(&[LeftShoulder, LeftElbow, LeftWrist]),
            Measurement::RightArmLength => Rule::Chain(&[RightShoulder, RightElbow, RightWrist]),
            Measurement::LeftLegLength => Rule::Chain(&[LeftHip, LeftKnee, LeftAnkle]),
            Measurement::RightLegLength => Rule::Chain(&[RightHip, RightKnee, RightAnkle]),
        }
    }

    /// ピクセル長に掛ける補正係数
    /// 胸幅は肩峰間距離の約7割で近似する
    pub fn multiplier(self) -> f32 {
        match self {
            Measurement::ChestWidth => 0.7,
            _ => 1.0,
        }
    }

    /// 成人として妥当な範囲 (cm)。範囲外は警告のみ
    pub fn plausible_range(self) -> Option<(f32, f32)> {
        match self {
            Measurement::ShoulderWidth => Some((30.0, 60.0)),
            Measurement::LeftArmLength | Measurement::RightArmLength => Some((50.0, 90.0)),
            Measurement::LeftLegLength | Measurement::RightLegLength => Some((70.0, 130.0)),
            Measurement::TorsoLength => Some((40.0, 80.0)),
            _ => None,
        }
    }
}
