use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use util::Reporter;

use crate::{
    props::{PropDescriptor, PropKind, PropValue},
    CaveRendered, CaveStored, HighScoreTable,
};

/// An ordered collection of caves plus game-wide metadata.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveSet {
    pub name: String,
    pub description: String,
    pub author: String,
    pub www: String,
    pub date: String,
    pub difficulty: String,
    pub charset: String,
    pub fontset: String,
    pub story: String,
    pub remark: String,
    /// Base64 encoded title screen image, passed through for the host.
    pub title_screen: String,
    pub title_screen_scroll: String,

    pub initial_lives: i32,
    pub maximum_lives: i32,
    pub bonus_life_score: i32,

    pub highscore: HighScoreTable,
    pub caves: Vec<CaveStored>,
}

impl Default for CaveSet {
    fn default() -> Self {
        CaveSet {
            name: String::new(),
            description: String::new(),
            author: String::new(),
            www: String::new(),
            date: String::new(),
            difficulty: String::new(),
            charset: String::new(),
            fontset: String::new(),
            story: String::new(),
            remark: String::new(),
            title_screen: String::new(),
            title_screen_scroll: String::new(),
            initial_lives: 3,
            maximum_lives: 9,
            bonus_life_score: 500,
            highscore: HighScoreTable::default(),
            caves: Vec::new(),
        }
    }
}

impl CaveSet {
    pub fn is_empty(&self) -> bool {
        self.caves.is_empty()
    }

    /// Verify every replay against its cave: rendering the cave with the
    /// replay's seed and level must reproduce the map the replay was
    /// recorded on.
    ///
    /// Returns the number of mismatching replays; each one is reported.
    /// Replays without a recorded checksum are left alone.
    pub fn check_replays(&self, report: &mut Reporter) -> usize {
        let mut bad = 0;
        for cave in &self.caves {
            for replay in &cave.replays {
                if replay.checksum == 0 {
                    continue;
                }
                let level = (replay.level - 1).clamp(0, crate::LEVELS as i32 - 1);
                let rendered = CaveRendered::new(
                    cave,
                    level as usize,
                    replay.seed as u32,
                );
                if rendered.checksum() != replay.checksum {
                    bad += 1;
                    report.warn(format!(
                        "cave '{}': replay by '{}' does not match the cave \
                         (checksum mismatch)",
                        cave.name, replay.player_name
                    ));
                }
            }
        }
        bad
    }

    pub fn has_replays(&self) -> bool {
        self.caves.iter().any(|c| !c.replays.is_empty())
    }
}

/// Property table for the `[game]` section.
pub fn caveset_properties() -> &'static [PropDescriptor<CaveSet>] {
    static TABLE: OnceLock<Vec<PropDescriptor<CaveSet>>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use PropKind::*;
        type D = PropDescriptor<CaveSet>;

        vec![
            D::new(
                "Name",
                Text,
                |s, _| PropValue::Text(s.name.clone()),
                |s, _, v| s.name = v.text(),
            )
            .always_save(),
            D::new(
                "Description",
                Text,
                |s, _| PropValue::Text(s.description.clone()),
                |s, _, v| s.description = v.text(),
            ),
            D::new(
                "Author",
                Text,
                |s, _| PropValue::Text(s.author.clone()),
                |s, _, v| s.author = v.text(),
            ),
            D::new(
                "WWW",
                Text,
                |s, _| PropValue::Text(s.www.clone()),
                |s, _, v| s.www = v.text(),
            ),
            D::new(
                "Date",
                Text,
                |s, _| PropValue::Text(s.date.clone()),
                |s, _, v| s.date = v.text(),
            ),
            D::new(
                "Difficulty",
                Text,
                |s, _| PropValue::Text(s.difficulty.clone()),
                |s, _, v| s.difficulty = v.text(),
            ),
            D::new(
                "Charset",
                Text,
                |s, _| PropValue::Text(s.charset.clone()),
                |s, _, v| s.charset = v.text(),
            ),
            D::new(
                "Fontset",
                Text,
                |s, _| PropValue::Text(s.fontset.clone()),
                |s, _, v| s.fontset = v.text(),
            ),
            D::new(
                "Story",
                LongText,
                |s, _| PropValue::Text(s.story.clone()),
                |s, _, v| s.story = v.text(),
            ),
            D::new(
                "Remark",
                LongText,
                |s, _| PropValue::Text(s.remark.clone()),
                |s, _, v| s.remark = v.text(),
            ),
            D::new(
                "TitleScreen",
                LongText,
                |s, _| PropValue::Text(s.title_screen.clone()),
                |s, _, v| s.title_screen = v.text(),
            ),
            D::new(
                "TitleScreenScroll",
                LongText,
                |s, _| PropValue::Text(s.title_screen_scroll.clone()),
                |s, _, v| s.title_screen_scroll = v.text(),
            ),
            D::new(
                "Lives",
                Int,
                |s, _| PropValue::Int(s.initial_lives),
                |s, _, v| s.initial_lives = v.int(),
            )
            .always_save(),
            D::new(
                "MaxLives",
                Int,
                |s, _| PropValue::Int(s.maximum_lives),
                |s, _, v| s.maximum_lives = v.int(),
            ),
            D::new(
                "BonusLife",
                Int,
                |s, _| PropValue::Int(s.bonus_life_score),
                |s, _, v| s.bonus_life_score = v.int(),
            )
            .always_save(),
        ]
    })
}
