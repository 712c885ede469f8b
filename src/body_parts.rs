use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Muscle group targeted by an exercise.
///
/// The serialized form is the Japanese label so that backups written by
/// earlier versions of the log import unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    #[serde(rename = "脚")]
    Legs,
    #[serde(rename = "胸")]
    Chest,
    #[serde(rename = "背中")]
    Back,
    #[serde(rename = "肩")]
    Shoulders,
    #[serde(rename = "腕")]
    Arms,
}

/// Canonical display order of the body parts.
pub const ALL_BODY_PARTS: [BodyPart; 5] = [
    BodyPart::Legs,
    BodyPart::Chest,
    BodyPart::Back,
    BodyPart::Shoulders,
    BodyPart::Arms,
];

impl BodyPart {
    pub fn label(self) -> &'static str {
        match self {
            BodyPart::Legs => "脚",
            BodyPart::Chest => "胸",
            BodyPart::Back => "背中",
            BodyPart::Shoulders => "肩",
            BodyPart::Arms => "腕",
        }
    }

    /// Built-in exercise list used to seed a body part on first access.
    pub fn default_exercises(self) -> &'static [&'static str] {
        match self {
            BodyPart::Legs => &[
                "スクワット",
                "レッグプレス",
                "レッグカール",
                "レッグエクステンション",
                "カーフレイズ",
            ],
            BodyPart::Chest => &[
                "ベンチプレス",
                "ダンベルフライ",
                "インクラインベンチプレス",
                "チェストプレス",
                "ディップス",
            ],
            BodyPart::Back => &[
                "デッドリフト",
                "ラットプルダウン",
                "ベントオーバーロウ",
                "チンニング",
                "シーテッドロウ",
            ],
            BodyPart::Shoulders => &[
                "オーバーヘッドプレス",
                "サイドレイズ",
                "フロントレイズ",
                "リアレイズ",
                "アップライトロウ",
            ],
            BodyPart::Arms => &[
                "バーベルカール",
                "トライセプスエクステンション",
                "ハンマーカール",
                "スカルクラッシャー",
                "ケーブルカール",
            ],
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown body part: {0}")]
pub struct UnknownBodyPart(pub String);

impl FromStr for BodyPart {
    type Err = UnknownBodyPart;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_BODY_PARTS
            .into_iter()
            .find(|bp| bp.label() == s)
            .ok_or_else(|| UnknownBodyPart(s.to_string()))
    }
}
