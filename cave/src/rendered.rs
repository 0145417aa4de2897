use glam::{ivec2, IVec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use util::{adler32, seeded_rng, CaveMap};

use crate::{CaveStored, Color, Dir, Element, Scheduling, SoundEvent, LEVELS};

/// What has happened to the player so far.
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum PlayerState {
    /// Not hatched from the inbox yet.
    #[default]
    NotYet,
    Living,
    Died,
    Timeout,
    Exited,
}

/// A cave instantiated at a concrete difficulty level from a stored cave
/// and a render seed. This is the structure the physics engine iterates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaveRendered {
    pub name: String,
    /// Story text shown before the first attempt at the cave.
    pub story: String,
    pub w: i32,
    pub h: i32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,

    pub intermission: bool,
    pub intermission_instantlife: bool,
    pub intermission_rewardlife: bool,

    pub color_border: Color,
    pub color0: Color,
    pub color1: Color,
    pub color2: Color,
    pub color3: Color,
    pub color4: Color,
    pub color5: Color,

    /// Difficulty level this cave was rendered on, zero-based.
    pub rendered_on: usize,
    pub render_seed: u32,

    pub map: CaveMap<Element>,

    pub player_state: PlayerState,
    pub player_pos: IVec2,

    /// Remaining cave time, in milliseconds scaled by `timing_factor`.
    pub time: i32,
    pub max_time: i32,
    /// 1200 on PAL timing caves, 1000 otherwise.
    pub timing_factor: i32,
    /// Bonus points per second of remaining time.
    pub time_value: i32,
    /// Milliseconds per cave iteration.
    pub speed: i32,
    pub hatching_delay: i32,

    pub diamonds_needed: i32,
    pub diamonds_collected: i32,
    pub diamond_value: i32,
    pub extra_diamond_value: i32,
    /// Points earned by the most recent iteration; read and folded into the
    /// player score by the game flow.
    pub score: i32,

    pub amoeba_time: i32,
    pub magic_wall_time: i32,
    pub gravity: Dir,
    pub gravity_change_time: i32,

    pub sound1: Option<SoundEvent>,
    pub sound2: Option<SoundEvent>,
    pub sound3: Option<SoundEvent>,
}

impl CaveRendered {
    /// Render a stored cave at a difficulty level with a given seed.
    ///
    /// The same (cave, level, seed) triple always produces the same map;
    /// replays depend on this.
    pub fn new(stored: &CaveStored, level: usize, seed: u32) -> Self {
        let level = level.min(LEVELS - 1);
        let mut rng = seeded_rng(seed);

        let mut map = match &stored.map {
            Some(map) => map.clone(),
            None => {
                let mut map =
                    CaveMap::new(stored.w, stored.h, stored.initial_fill);
                // Each cell draws one random byte, compared against the
                // cumulative per-element thresholds.
                for y in 0..stored.h {
                    for x in 0..stored.w {
                        let roll = rng.random_range(0..256);
                        let mut element = stored.initial_fill;
                        for slot in 0..4 {
                            if roll < stored.random_fill_probability[slot] {
                                element = stored.random_fill[slot];
                            }
                        }
                        map[(x, y)] = element;
                    }
                }
                for x in 0..stored.w {
                    map[(x, 0)] = stored.initial_border;
                    map[(x, stored.h - 1)] = stored.initial_border;
                }
                for y in 0..stored.h {
                    map[(0, y)] = stored.initial_border;
                    map[(stored.w - 1, y)] = stored.initial_border;
                }
                map
            }
        };

        for object in &stored.objects {
            if object.levels.contains_level(level) {
                object.draw(&mut map, &mut rng);
            }
        }

        let timing_factor = if stored.pal_timing { 1200 } else { 1000 };
        let speed = match stored.scheduling {
            Scheduling::Milliseconds => stored.frame_time[level],
            // The delay-constant models pace in hardware frames; this is
            // their millisecond equivalent.
            _ => 120 + stored.cave_delay[level] * 20,
        };

        CaveRendered {
            name: stored.name.clone(),
            story: stored.story.clone(),
            w: stored.w,
            h: stored.h,
            x1: stored.x1,
            y1: stored.y1,
            x2: stored.x2,
            y2: stored.y2,
            intermission: stored.intermission,
            intermission_instantlife: stored.intermission_instantlife,
            intermission_rewardlife: stored.intermission_rewardlife,
            color_border: stored.color_border,
            color0: stored.color0,
            color1: stored.color1,
            color2: stored.color2,
            color3: stored.color3,
            color4: stored.color4,
            color5: stored.color5,
            rendered_on: level,
            render_seed: seed,
            map,
            player_state: PlayerState::NotYet,
            player_pos: ivec2(-1, -1),
            time: stored.cave_time[level] * timing_factor,
            max_time: stored.max_time,
            timing_factor,
            time_value: stored.time_value[level],
            speed,
            hatching_delay: stored.hatching_delay[level],
            diamonds_needed: stored.diamonds_needed[level],
            diamonds_collected: 0,
            diamond_value: stored.diamond_value,
            extra_diamond_value: stored.extra_diamond_value,
            score: 0,
            amoeba_time: stored.amoeba_time[level] * timing_factor,
            magic_wall_time: stored.magic_wall_time[level] * timing_factor,
            gravity: stored.gravity,
            gravity_change_time: stored.gravity_change_time,
            sound1: None,
            sound2: None,
            sound3: None,
        }
    }

    /// Final pre-game setup: place the player at the inbox.
    pub fn setup_for_game(&mut self) {
        for (pos, &element) in self.map.iter() {
            if element == Element::Inbox {
                self.player_pos = pos;
                break;
            }
        }
        self.player_state = PlayerState::NotYet;
    }

    /// Adler-32 fingerprint of the rendered map, recorded into replays.
    pub fn checksum(&self) -> u32 {
        adler32(self.map.iter().map(|(_, &e)| e as u8))
    }

    /// Park a sound cue in the first free slot for the host to play.
    pub fn sound_play(&mut self, sound: SoundEvent) {
        for slot in [&mut self.sound1, &mut self.sound2, &mut self.sound3] {
            if slot.is_none() {
                *slot = Some(sound);
                return;
            }
        }
        // All slots taken; the newest cue wins the last slot.
        self.sound3 = Some(sound);
    }

    pub fn clear_sounds(&mut self) {
        self.sound1 = None;
        self.sound2 = None;
        self.sound3 = None;
    }

    /// Cue the bonus-count tick while remaining time is converted to score.
    pub fn set_seconds_sound(&mut self) {
        self.sound_play(SoundEvent::Bonus);
    }

    /// Remaining whole seconds of cave time.
    pub fn time_seconds(&self) -> i32 {
        self.time / self.timing_factor
    }
}
