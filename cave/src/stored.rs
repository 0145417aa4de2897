use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumString};
use util::{CaveMap, IndexMap};

use crate::{
    props::{PropDescriptor, PropKind, PropValue},
    CaveObject, Color, Dir, Element, HighScoreTable, Replay, Scheduling,
    LEVELS,
};

/// Rule-set presets named in caveset files.
///
/// Selecting one overwrites a batch of cave fields with the defaults of the
/// machine or engine the cave was authored for; later attributes can then
/// override individual fields.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Debug,
    Display,
    EnumString,
    SerializeDisplay,
    DeserializeFromStr,
)]
#[strum(ascii_case_insensitive)]
pub enum EngineVariant {
    #[strum(to_string = "BD1")]
    BD1,
    #[strum(to_string = "BD2")]
    BD2,
    #[strum(to_string = "PLCK")]
    Plck,
    #[strum(to_string = "1stB")]
    FirstB,
    #[strum(to_string = "CrDr")]
    CrDr,
    #[strum(to_string = "CrLi")]
    CrLi,
}

/// The authored, unrendered cave: everything the editor writes and the
/// caveset file stores.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveStored {
    pub name: String,
    pub description: String,
    pub author: String,
    pub www: String,
    pub date: String,
    pub story: String,
    pub remark: String,
    pub charset: String,
    pub fontset: String,

    pub intermission: bool,
    pub intermission_instantlife: bool,
    pub intermission_rewardlife: bool,
    pub selectable: bool,

    pub w: i32,
    pub h: i32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,

    pub diamond_value: i32,
    pub extra_diamond_value: i32,
    pub diamonds_needed: [i32; LEVELS],
    pub cave_time: [i32; LEVELS],
    pub time_value: [i32; LEVELS],
    pub max_time: i32,
    pub cave_delay: [i32; LEVELS],
    pub frame_time: [i32; LEVELS],
    pub hatching_delay: [i32; LEVELS],
    pub scheduling: Scheduling,
    pub pal_timing: bool,

    pub color_border: Color,
    pub color0: Color,
    pub color1: Color,
    pub color2: Color,
    pub color3: Color,
    /// Amoeba color.
    pub color4: Color,
    /// Slime color.
    pub color5: Color,

    pub initial_border: Element,
    pub initial_fill: Element,
    pub random_fill: [Element; 4],
    /// 0..255 thresholds compared against a random byte per cell.
    pub random_fill_probability: [i32; 4],
    /// Per-level render seeds; negative means pick a random seed.
    pub rand_seed: [i32; LEVELS],

    pub amoeba_time: [i32; LEVELS],
    /// Cell counts; serialized as a fraction of the cave area.
    pub amoeba_threshold: [i32; LEVELS],
    pub amoeba_growth_prob: i32,
    pub amoeba_fast_growth_prob: i32,
    pub amoeba_timer_started_immediately: bool,
    pub amoeba_timer_wait_for_hatching: bool,
    pub amoeba_too_big_effect: Element,
    pub amoeba_enclosed_effect: Element,

    pub magic_wall_time: [i32; LEVELS],
    pub magic_diamond_to: Element,
    pub magic_stone_to: Element,

    pub slime_permeability: i32,
    pub slime_permeability_c64: i32,
    pub slime_predictable: bool,

    pub gravity: Dir,
    pub gravity_change_time: i32,
    pub gravity_affects_all: bool,

    pub snap_element: Element,

    pub explosion_effect: Element,
    pub stone_bouncing_effect: Element,
    pub stone_falling_effect: Element,
    pub diamond_bouncing_effect: Element,
    pub diamond_falling_effect: Element,
    pub expanding_wall_looks_like: Element,
    pub dirt_looks_like: Element,

    pub map: Option<CaveMap<Element>>,
    pub objects: Vec<CaveObject>,
    pub replays: Vec<Replay>,
    pub highscore: HighScoreTable,
    /// Unrecognized attributes, re-emitted verbatim on save.
    pub tags: IndexMap<String, String>,
}

impl Default for CaveStored {
    fn default() -> Self {
        CaveStored {
            name: String::new(),
            description: String::new(),
            author: String::new(),
            www: String::new(),
            date: String::new(),
            story: String::new(),
            remark: String::new(),
            charset: String::new(),
            fontset: String::new(),

            intermission: false,
            intermission_instantlife: false,
            intermission_rewardlife: true,
            selectable: true,

            w: 40,
            h: 22,
            x1: 0,
            y1: 0,
            x2: 39,
            y2: 21,

            diamond_value: 0,
            extra_diamond_value: 0,
            diamonds_needed: [10; LEVELS],
            cave_time: [999; LEVELS],
            time_value: [1; LEVELS],
            max_time: 999,
            cave_delay: [0; LEVELS],
            frame_time: [200; LEVELS],
            hatching_delay: [21; LEVELS],
            scheduling: Scheduling::Milliseconds,
            pal_timing: false,

            color_border: Color::c64(0),
            color0: Color::c64(0),
            color1: Color::c64(8),
            color2: Color::c64(11),
            color3: Color::c64(1),
            color4: Color::c64(5),
            color5: Color::c64(6),

            initial_border: Element::SteelWall,
            initial_fill: Element::Dirt,
            random_fill: [Element::Space; 4],
            random_fill_probability: [0; 4],
            rand_seed: [-1; LEVELS],

            amoeba_time: [999; LEVELS],
            amoeba_threshold: [200; LEVELS],
            amoeba_growth_prob: 31_250,
            amoeba_fast_growth_prob: 250_000,
            amoeba_timer_started_immediately: true,
            amoeba_timer_wait_for_hatching: false,
            amoeba_too_big_effect: Element::Stone,
            amoeba_enclosed_effect: Element::Diamond,

            magic_wall_time: [999; LEVELS],
            magic_diamond_to: Element::StoneFalling,
            magic_stone_to: Element::DiamondFalling,

            slime_permeability: 1_000_000,
            slime_permeability_c64: 0,
            slime_predictable: true,

            gravity: Dir::Down,
            gravity_change_time: 10,
            gravity_affects_all: true,

            snap_element: Element::Space,

            explosion_effect: Element::Space,
            stone_bouncing_effect: Element::Stone,
            stone_falling_effect: Element::StoneFalling,
            diamond_bouncing_effect: Element::Diamond,
            diamond_falling_effect: Element::DiamondFalling,
            expanding_wall_looks_like: Element::Wall,
            dirt_looks_like: Element::Dirt,

            map: None,
            objects: Vec::new(),
            replays: Vec::new(),
            highscore: HighScoreTable::default(),
            tags: IndexMap::default(),
        }
    }
}

impl CaveStored {
    /// Area of the cave canvas, the scale for ratio-typed properties.
    pub fn area(&self) -> i32 {
        self.w * self.h
    }

    /// Set the batch of fields implied by an engine preset. Called before
    /// the other attributes of the cave are applied, so explicit settings
    /// win over the preset.
    pub fn set_engine_defaults(&mut self, engine: EngineVariant) {
        use EngineVariant::*;
        match engine {
            BD1 => {
                self.scheduling = Scheduling::BD1;
                self.pal_timing = true;
                self.cave_delay = [12, 6, 3, 1, 0];
                self.hatching_delay = [21; LEVELS];
                self.intermission_instantlife = true;
                self.intermission_rewardlife = false;
                self.amoeba_timer_started_immediately = true;
                self.amoeba_timer_wait_for_hatching = false;
                self.slime_predictable = true;
            }
            BD2 => {
                self.scheduling = Scheduling::BD2;
                self.pal_timing = true;
                self.cave_delay = [9, 8, 7, 6, 6];
                self.hatching_delay = [21; LEVELS];
                self.intermission_instantlife = true;
                self.intermission_rewardlife = false;
                self.amoeba_timer_started_immediately = false;
                self.slime_predictable = true;
            }
            Plck => {
                self.scheduling = Scheduling::Plck;
                self.pal_timing = true;
                self.cave_delay = [9; LEVELS];
                self.hatching_delay = [21; LEVELS];
                self.amoeba_timer_started_immediately = false;
                self.amoeba_timer_wait_for_hatching = true;
                self.slime_predictable = true;
            }
            FirstB => {
                self.scheduling = Scheduling::Plck;
                self.pal_timing = true;
                self.cave_delay = [9; LEVELS];
                self.hatching_delay = [2; LEVELS];
                self.amoeba_timer_started_immediately = false;
                self.amoeba_timer_wait_for_hatching = true;
                self.gravity_affects_all = false;
            }
            CrDr => {
                self.scheduling = Scheduling::CrDr7;
                self.pal_timing = true;
                self.cave_delay = [7; LEVELS];
                self.hatching_delay = [2; LEVELS];
                self.amoeba_timer_wait_for_hatching = true;
                self.gravity_affects_all = false;
                self.slime_predictable = false;
            }
            CrLi => {
                self.scheduling = Scheduling::CrLi;
                self.pal_timing = true;
                self.cave_delay = [7; LEVELS];
                self.hatching_delay = [2; LEVELS];
                self.amoeba_timer_wait_for_hatching = true;
                self.gravity_affects_all = false;
                self.slime_predictable = false;
            }
        }
    }
}

/// Property table for cave sections. This is the authoritative list of
/// attribute identifiers recognized inside `[cave]`.
pub fn cave_properties() -> &'static [PropDescriptor<CaveStored>] {
    static TABLE: OnceLock<Vec<PropDescriptor<CaveStored>>> = OnceLock::new();
    TABLE.get_or_init(build_cave_properties)
}

fn build_cave_properties() -> Vec<PropDescriptor<CaveStored>> {
    use PropKind::*;
    type D = PropDescriptor<CaveStored>;

    let mut t: Vec<D> = Vec::new();

    t.push(
        D::new(
            "Name",
            Text,
            |c, _| PropValue::Text(c.name.clone()),
            |c, _, v| c.name = v.text(),
        )
        .always_save(),
    );
    t.push(D::new(
        "Description",
        Text,
        |c, _| PropValue::Text(c.description.clone()),
        |c, _, v| c.description = v.text(),
    ));
    t.push(D::new(
        "Author",
        Text,
        |c, _| PropValue::Text(c.author.clone()),
        |c, _, v| c.author = v.text(),
    ));
    t.push(D::new(
        "WWW",
        Text,
        |c, _| PropValue::Text(c.www.clone()),
        |c, _, v| c.www = v.text(),
    ));
    t.push(D::new(
        "Date",
        Text,
        |c, _| PropValue::Text(c.date.clone()),
        |c, _, v| c.date = v.text(),
    ));
    t.push(D::new(
        "Story",
        LongText,
        |c, _| PropValue::Text(c.story.clone()),
        |c, _, v| c.story = v.text(),
    ));
    t.push(D::new(
        "Remark",
        LongText,
        |c, _| PropValue::Text(c.remark.clone()),
        |c, _, v| c.remark = v.text(),
    ));
    t.push(D::new(
        "Charset",
        Text,
        |c, _| PropValue::Text(c.charset.clone()),
        |c, _, v| c.charset = v.text(),
    ));
    t.push(D::new(
        "Fontset",
        Text,
        |c, _| PropValue::Text(c.fontset.clone()),
        |c, _, v| c.fontset = v.text(),
    ));

    // The six numbers of Size share one identifier and save as one line.
    t.push(
        D::new(
            "Size",
            Int,
            |c, _| PropValue::Int(c.w),
            |c, _, v| c.w = v.int(),
        )
        .always_save(),
    );
    t.push(D::new(
        "Size",
        Int,
        |c, _| PropValue::Int(c.h),
        |c, _, v| c.h = v.int(),
    ));
    t.push(D::new(
        "Size",
        Int,
        |c, _| PropValue::Int(c.x1),
        |c, _, v| c.x1 = v.int(),
    ));
    t.push(D::new(
        "Size",
        Int,
        |c, _| PropValue::Int(c.y1),
        |c, _, v| c.y1 = v.int(),
    ));
    t.push(D::new(
        "Size",
        Int,
        |c, _| PropValue::Int(c.x2),
        |c, _, v| c.x2 = v.int(),
    ));
    t.push(D::new(
        "Size",
        Int,
        |c, _| PropValue::Int(c.y2),
        |c, _, v| c.y2 = v.int(),
    ));

    t.push(D::new(
        "Intermission",
        Bool,
        |c, _| PropValue::Bool(c.intermission),
        |c, _, v| c.intermission = v.bool(),
    ));
    t.push(D::new(
        "IntermissionInstantLife",
        Bool,
        |c, _| PropValue::Bool(c.intermission_instantlife),
        |c, _, v| c.intermission_instantlife = v.bool(),
    ));
    t.push(D::new(
        "IntermissionRewardLife",
        Bool,
        |c, _| PropValue::Bool(c.intermission_rewardlife),
        |c, _, v| c.intermission_rewardlife = v.bool(),
    ));
    t.push(D::new(
        "Selectable",
        Bool,
        |c, _| PropValue::Bool(c.selectable),
        |c, _, v| c.selectable = v.bool(),
    ));

    t.push(D::new(
        "DiamondValue",
        Int,
        |c, _| PropValue::Int(c.diamond_value),
        |c, _, v| c.diamond_value = v.int(),
    ));
    t.push(D::new(
        "DiamondValue",
        Int,
        |c, _| PropValue::Int(c.extra_diamond_value),
        |c, _, v| c.extra_diamond_value = v.int(),
    ));
    t.push(
        D::new(
            "DiamondsRequired",
            Int,
            |c, i| PropValue::Int(c.diamonds_needed[i]),
            |c, i, v| c.diamonds_needed[i] = v.int(),
        )
        .per_level(),
    );
    t.push(
        D::new(
            "CaveTime",
            Int,
            |c, i| PropValue::Int(c.cave_time[i]),
            |c, i, v| c.cave_time[i] = v.int(),
        )
        .per_level(),
    );
    t.push(
        D::new(
            "TimeValue",
            Int,
            |c, i| PropValue::Int(c.time_value[i]),
            |c, i, v| c.time_value[i] = v.int(),
        )
        .per_level(),
    );
    t.push(D::new(
        "CaveMaxTime",
        Int,
        |c, _| PropValue::Int(c.max_time),
        |c, _, v| c.max_time = v.int(),
    ));
    t.push(
        D::new(
            "CaveDelay",
            Int,
            |c, i| PropValue::Int(c.cave_delay[i]),
            |c, i, v| c.cave_delay[i] = v.int(),
        )
        .per_level(),
    );
    t.push(
        D::new(
            "FrameTime",
            Int,
            |c, i| PropValue::Int(c.frame_time[i]),
            |c, i, v| c.frame_time[i] = v.int(),
        )
        .per_level(),
    );
    t.push(
        D::new(
            "HatchingDelay",
            Int,
            |c, i| PropValue::Int(c.hatching_delay[i]),
            |c, i, v| c.hatching_delay[i] = v.int(),
        )
        .per_level(),
    );
    t.push(D::new(
        "CaveScheduling",
        Scheduling,
        |c, _| PropValue::Scheduling(c.scheduling),
        |c, _, v| c.scheduling = v.scheduling(),
    ));
    t.push(D::new(
        "PALTiming",
        Bool,
        |c, _| PropValue::Bool(c.pal_timing),
        |c, _, v| c.pal_timing = v.bool(),
    ));

    // Border, background, three foregrounds, amoeba, slime. Parsed by the
    // codec, which accepts shorter legacy forms; saved through the table.
    t.push(D::new(
        "Colors",
        Color,
        |c, _| PropValue::Color(c.color_border),
        |c, _, v| c.color_border = v.color(),
    ));
    t.push(D::new(
        "Colors",
        Color,
        |c, _| PropValue::Color(c.color0),
        |c, _, v| c.color0 = v.color(),
    ));
    t.push(D::new(
        "Colors",
        Color,
        |c, _| PropValue::Color(c.color1),
        |c, _, v| c.color1 = v.color(),
    ));
    t.push(D::new(
        "Colors",
        Color,
        |c, _| PropValue::Color(c.color2),
        |c, _, v| c.color2 = v.color(),
    ));
    t.push(D::new(
        "Colors",
        Color,
        |c, _| PropValue::Color(c.color3),
        |c, _, v| c.color3 = v.color(),
    ));
    t.push(D::new(
        "Colors",
        Color,
        |c, _| PropValue::Color(c.color4),
        |c, _, v| c.color4 = v.color(),
    ));
    t.push(D::new(
        "Colors",
        Color,
        |c, _| PropValue::Color(c.color5),
        |c, _, v| c.color5 = v.color(),
    ));

    t.push(D::new(
        "InitialBorder",
        Element,
        |c, _| PropValue::Element(c.initial_border),
        |c, _, v| c.initial_border = v.element(),
    ));
    t.push(D::new(
        "InitialFill",
        Element,
        |c, _| PropValue::Element(c.initial_fill),
        |c, _, v| c.initial_fill = v.element(),
    ));
    t.push(
        D::new(
            "RandSeed",
            Int,
            |c, i| PropValue::Int(c.rand_seed[i]),
            |c, i, v| c.rand_seed[i] = v.int(),
        )
        .per_level(),
    );

    // Alternating element/threshold pairs, gathered into one line.
    for slot in 0..4 {
        t.push(
            D::new(
                "RandomFill",
                Element,
                |c, i| PropValue::Element(c.random_fill[i]),
                |c, i, v| c.random_fill[i] = v.element(),
            )
            .at(slot),
        );
        t.push(
            D::new(
                "RandomFill",
                Int,
                |c, i| PropValue::Int(c.random_fill_probability[i]),
                |c, i, v| c.random_fill_probability[i] = v.int(),
            )
            .at(slot),
        );
    }

    t.push(
        D::new(
            "AmoebaTime",
            Int,
            |c, i| PropValue::Int(c.amoeba_time[i]),
            |c, i, v| c.amoeba_time[i] = v.int(),
        )
        .per_level(),
    );
    t.push(
        D::new(
            "AmoebaThreshold",
            Ratio,
            |c, i| PropValue::Int(c.amoeba_threshold[i]),
            |c, i, v| c.amoeba_threshold[i] = v.int(),
        )
        .per_level(),
    );
    t.push(D::new(
        "AmoebaGrowthProb",
        Probability,
        |c, _| PropValue::Int(c.amoeba_growth_prob),
        |c, _, v| c.amoeba_growth_prob = v.int(),
    ));
    t.push(D::new(
        "AmoebaFastGrowthProb",
        Probability,
        |c, _| PropValue::Int(c.amoeba_fast_growth_prob),
        |c, _, v| c.amoeba_fast_growth_prob = v.int(),
    ));
    t.push(D::new(
        "AmoebaTimerStartedImmediately",
        Bool,
        |c, _| PropValue::Bool(c.amoeba_timer_started_immediately),
        |c, _, v| c.amoeba_timer_started_immediately = v.bool(),
    ));
    t.push(D::new(
        "AmoebaTimerWaitForHatching",
        Bool,
        |c, _| PropValue::Bool(c.amoeba_timer_wait_for_hatching),
        |c, _, v| c.amoeba_timer_wait_for_hatching = v.bool(),
    ));

    t.push(
        D::new(
            "MagicWallTime",
            Int,
            |c, i| PropValue::Int(c.magic_wall_time[i]),
            |c, i, v| c.magic_wall_time[i] = v.int(),
        )
        .per_level(),
    );
    t.push(D::new(
        "MagicWallProperties",
        Element,
        |c, _| PropValue::Element(c.magic_diamond_to),
        |c, _, v| c.magic_diamond_to = v.element(),
    ));
    t.push(D::new(
        "MagicWallProperties",
        Element,
        |c, _| PropValue::Element(c.magic_stone_to),
        |c, _, v| c.magic_stone_to = v.element(),
    ));

    t.push(D::new(
        "SlimePermeability",
        Probability,
        |c, _| PropValue::Int(c.slime_permeability),
        |c, _, v| c.slime_permeability = v.int(),
    ));
    t.push(D::new(
        "SlimePermeabilityC64",
        Int,
        |c, _| PropValue::Int(c.slime_permeability_c64),
        |c, _, v| c.slime_permeability_c64 = v.int(),
    ));
    // Not a file attribute of its own; implied by which permeability form
    // the file uses.
    t.push(
        D::new(
            "SlimePredictable",
            Bool,
            |c, _| PropValue::Bool(c.slime_predictable),
            |c, _, v| c.slime_predictable = v.bool(),
        )
        .dont_save(),
    );

    t.push(D::new(
        "Gravity",
        Direction,
        |c, _| PropValue::Dir(c.gravity),
        |c, _, v| c.gravity = v.dir(),
    ));
    t.push(D::new(
        "GravityChangeTime",
        Int,
        |c, _| PropValue::Int(c.gravity_change_time),
        |c, _, v| c.gravity_change_time = v.int(),
    ));
    t.push(D::new(
        "GravityAffectsAll",
        Bool,
        |c, _| PropValue::Bool(c.gravity_affects_all),
        |c, _, v| c.gravity_affects_all = v.bool(),
    ));
    t.push(D::new(
        "SnapElement",
        Element,
        |c, _| PropValue::Element(c.snap_element),
        |c, _, v| c.snap_element = v.element(),
    ));

    t.push(D::new(
        "EXPLOSION_EFFECT",
        Effect,
        |c, _| PropValue::Element(c.explosion_effect),
        |c, _, v| c.explosion_effect = v.element(),
    ));
    t.push(D::new(
        "BOUNCING_STONE",
        Effect,
        |c, _| PropValue::Element(c.stone_bouncing_effect),
        |c, _, v| c.stone_bouncing_effect = v.element(),
    ));
    t.push(D::new(
        "FALLING_STONE",
        Effect,
        |c, _| PropValue::Element(c.stone_falling_effect),
        |c, _, v| c.stone_falling_effect = v.element(),
    ));
    t.push(D::new(
        "BOUNCING_DIAMOND",
        Effect,
        |c, _| PropValue::Element(c.diamond_bouncing_effect),
        |c, _, v| c.diamond_bouncing_effect = v.element(),
    ));
    t.push(D::new(
        "FALLING_DIAMOND",
        Effect,
        |c, _| PropValue::Element(c.diamond_falling_effect),
        |c, _, v| c.diamond_falling_effect = v.element(),
    ));
    t.push(D::new(
        "EXPANDING_WALL_LOOKS_LIKE",
        Effect,
        |c, _| PropValue::Element(c.expanding_wall_looks_like),
        |c, _, v| c.expanding_wall_looks_like = v.element(),
    ));
    t.push(D::new(
        "DIRT_LOOKS_LIKE",
        Effect,
        |c, _| PropValue::Element(c.dirt_looks_like),
        |c, _, v| c.dirt_looks_like = v.element(),
    ));
    t.push(D::new(
        "AMOEBA_TOO_BIG",
        Effect,
        |c, _| PropValue::Element(c.amoeba_too_big_effect),
        |c, _, v| c.amoeba_too_big_effect = v.element(),
    ));
    t.push(D::new(
        "AMOEBA_ENCLOSED",
        Effect,
        |c, _| PropValue::Element(c.amoeba_enclosed_effect),
        |c, _, v| c.amoeba_enclosed_effect = v.element(),
    ));

    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::{save_properties, set_attribute};
    use pretty_assertions::assert_eq;
    use util::Reporter;

    #[test]
    fn default_save_is_minimal() {
        let cave = CaveStored::default();
        let mut out = Vec::new();
        save_properties(
            &mut out,
            &cave,
            &CaveStored::default(),
            cave_properties(),
            cave.area(),
        );
        // Always-save and color entries only.
        assert_eq!(
            out,
            vec![
                "Size=40 22 0 0 39 21".to_string(),
                "Colors=Black Black Orange Gray1 White Green Blue".to_string(),
            ]
        );
    }

    #[test]
    fn random_fill_pairs() {
        let mut cave = CaveStored::default();
        let mut report = Reporter::new();
        let area = cave.area();
        assert!(set_attribute(
            &mut cave,
            cave_properties(),
            "RandomFill",
            "BOULDER 80 DIAMOND 20",
            area,
            &mut report
        ));
        assert_eq!(cave.random_fill[0], Element::Stone);
        assert_eq!(cave.random_fill_probability[0], 80);
        assert_eq!(cave.random_fill[1], Element::Diamond);
        assert_eq!(cave.random_fill_probability[1], 20);
        assert!(!report.had_messages());
    }

    #[test]
    fn ratio_scales_with_cave_area() {
        let mut cave = CaveStored::default();
        let mut report = Reporter::new();
        let area = cave.area();
        set_attribute(
            &mut cave,
            cave_properties(),
            "AmoebaThreshold",
            "0.25",
            area,
            &mut report
        );
        assert_eq!(cave.amoeba_threshold[0], 220);
        assert_eq!(cave.amoeba_threshold[4], 220);
    }

    #[test]
    fn engine_presets_precede_overrides() {
        let mut cave = CaveStored::default();
        cave.set_engine_defaults(EngineVariant::Plck);
        assert_eq!(cave.scheduling, Scheduling::Plck);
        assert!(cave.pal_timing);

        let mut report = Reporter::new();
        let area = cave.area();
        set_attribute(
            &mut cave,
            cave_properties(),
            "CaveScheduling",
            "bd1",
            area,
            &mut report,
        );
        assert_eq!(cave.scheduling, Scheduling::BD1);
    }
}
