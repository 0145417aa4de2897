use cave::{
    CaveRendered, CaveSet, CaveStored, Dir, PlayerState, Replay, SoundEvent,
    CAVE_SEED_MAX, LEVELS,
};
use rand::{Rng, SeedableRng};
use util::{CaveMap, GameRng};

use crate::{CaveEngine, SoundSink};

/// Milliseconds per animation frame; everything cosmetic runs at 25 Hz.
const ANIM_MS: i32 = 40;

/// Animation frames of the uncover animation after its setup frame.
const UNCOVER_FRAMES: i32 = 68;

/// Animation frames between bonus counting and the cover animation.
const WAIT_FRAMES: i32 = 98;

/// Animation frames of the cover animation between its start and end
/// frames; covering runs eight times faster than uncovering.
const COVER_FRAMES: i32 = 7;

/// Grace ticks of live input after a replay runs out of movements before
/// the cave is covered.
const REPLAY_EXHAUSTED_TICKS: i32 = 15;

/// A recorded failed run shorter than this many ticks is discarded.
const REPLAY_KEEP_LENGTH: usize = 16;

/// Version string recorded into replays.
const RECORDED_WITH: &str =
    concat!("rockfall ", env!("CARGO_PKG_VERSION"));

/// What kind of session this is.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GameKind {
    /// Full game from a caveset: lives, scores, highscores.
    Normal,
    /// Resumed from an in-memory snapshot; ends after one cave.
    Snapshot,
    /// Editor test run; restarts on death, no life counting.
    Test,
    /// Deterministic replay playback.
    Replay,
    /// A replay the player took over; continues as live play.
    ContinueReplay,
}

/// Returned by [`GameControl::main_int`]; tells the host what to draw or
/// tear down.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum State {
    /// A new cave was loaded; sizes and colors may have changed.
    CaveLoaded,
    /// Show the cave story, first frame.
    ShowStory,
    /// Story is on screen, waiting for fire.
    ShowStoryWait,
    /// The story was dismissed; prepare the play screen.
    PrepareFirstFrame,
    /// First frame of the cave on screen.
    FirstFrame,
    Nothing,
    /// Scores or time changed; redraw the status bar.
    LabelsChanged,
    /// The cave timed out at this exact moment.
    TimeoutNow,
    /// Out of lives; game over banner may be shown while covering plays.
    NoMoreLives,
    /// Session finished; destroy the control.
    Stop,
    /// Session finished as a game over; record game highscore.
    GameOver,
}

/// Host input for one `main_int` call.
#[derive(Copy, Clone, Debug)]
pub struct Input {
    pub player_move: Dir,
    pub fire: bool,
    pub suicide: bool,
    pub restart: bool,
    /// False pauses the cave; animation keeps running.
    pub allow_iterate: bool,
    /// Iterate at 25 fps regardless of cave speed.
    pub fast_forward: bool,
}

impl Default for Input {
    fn default() -> Self {
        Input {
            player_move: Dir::Still,
            fire: false,
            suicide: false,
            restart: false,
            allow_iterate: true,
            fast_forward: false,
        }
    }
}

/// Lifecycle phase of the current cave.
///
/// The frame counts in the payload-carrying phases are timing contracts:
/// uncovering takes 70 frames start to end, covering 8, and the wait
/// before covering about four seconds, all at 25 Hz.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Phase {
    LoadCave,
    ShowStory,
    ShowStoryWait,
    StoryClicked,
    StartUncover,
    Uncovering { left: i32 },
    UncoverAll,
    Running,
    CheckBonusTime,
    WaitingCover { left: i32 },
    CoverStart,
    Covering { left: i32 },
    CoverAll,
    Done,
}

/// Controls the flow of a game: loading caves from the caveset, passing
/// input to the cave iteration, uncover/cover animations, scores and
/// lives, recording and playing replays, highscores.
///
/// The host drives it by calling [`GameControl::main_int`] regularly with
/// the elapsed wall-clock time; the returned [`State`] says what changed.
/// The two side maps (`gfx_buffer`, `covered`) belong to the host's
/// renderer but live here so cave loading can size them.
pub struct GameControl {
    pub kind: GameKind,

    pub player_name: String,
    pub player_score: i32,
    pub player_lives: i32,

    caveset: Option<CaveSet>,
    /// The rendered cave being iterated.
    pub played_cave: Option<CaveRendered>,
    /// Cave under test in an editor session.
    test_cave: Option<CaveStored>,
    replay_from: Option<Replay>,
    replay_record: Option<Replay>,

    cave_index: usize,
    level_index: usize,
    cave_score: i32,

    /// Frames left of the bonus life flash.
    pub bonus_life_flash: i32,
    /// Cell animation phase, 0..8.
    pub animcycle: u8,
    pub story_shown: bool,
    replay_no_more_movements: i32,

    /// Cell indexes last drawn, -1 forces a repaint. Sized on cave load.
    pub gfx_buffer: CaveMap<i32>,
    /// Which cells are still hidden by the cover animation.
    pub covered: CaveMap<bool>,

    ms_game: i32,
    ms_anim: i32,
    phase: Phase,
    rng: GameRng,
}

impl GameControl {
    fn new(kind: GameKind) -> Self {
        GameControl {
            kind,
            player_name: String::new(),
            player_score: 0,
            player_lives: 0,
            caveset: None,
            played_cave: None,
            test_cave: None,
            replay_from: None,
            replay_record: None,
            cave_index: 0,
            level_index: 0,
            cave_score: 0,
            bonus_life_flash: 0,
            animcycle: 0,
            story_shown: false,
            replay_no_more_movements: 0,
            gfx_buffer: CaveMap::default(),
            covered: CaveMap::default(),
            ms_game: 0,
            ms_anim: 0,
            phase: Phase::LoadCave,
            rng: GameRng::from_rng(&mut rand::rng()),
        }
    }

    /// Start a full game from a caveset. The caveset is owned for the
    /// session; retrieve it with [`GameControl::into_caveset`] afterwards
    /// to persist highscores and recorded replays.
    pub fn new_normal(
        caveset: CaveSet,
        player_name: impl Into<String>,
        cave_index: usize,
        level_index: usize,
    ) -> Self {
        let mut g = GameControl::new(GameKind::Normal);
        g.player_lives = caveset.initial_lives;
        g.caveset = Some(caveset);
        g.player_name = player_name.into();
        g.cave_index = cave_index;
        g.level_index = level_index;
        g
    }

    /// Continue playing from a snapshot. No lives, no highscores;
    /// terminates after the cave ends.
    pub fn new_snapshot(snapshot: CaveRendered) -> Self {
        let mut g = GameControl::new(GameKind::Snapshot);
        g.played_cave = Some(snapshot);
        g
    }

    /// Test a cave from the editor; reloads forever.
    pub fn new_test(cave: CaveStored, level_index: usize) -> Self {
        let mut g = GameControl::new(GameKind::Test);
        g.test_cave = Some(cave);
        g.level_index = level_index;
        g
    }

    /// Play back a recorded replay of `caveset.caves[cave_index]`.
    pub fn new_replay(
        caveset: CaveSet,
        cave_index: usize,
        replay: Replay,
    ) -> Self {
        let mut g = GameControl::new(GameKind::Replay);
        g.caveset = Some(caveset);
        g.cave_index = cave_index;
        g.replay_from = Some(replay);
        g
    }

    pub fn caveset(&self) -> Option<&CaveSet> {
        self.caveset.as_ref()
    }

    /// Take the caveset back; the session is over.
    pub fn into_caveset(self) -> Option<CaveSet> {
        self.caveset
    }

    pub fn cave_index(&self) -> usize {
        self.cave_index
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    /// True when the cave is running or finished, so the score header
    /// should be shown.
    pub fn game_header(&self) -> bool {
        use Phase::*;
        matches!(
            self.phase,
            Running
                | CheckBonusTime
                | WaitingCover { .. }
                | CoverStart
                | Covering { .. }
                | CoverAll
                | Done
        )
    }

    /// A deep copy of the cave as currently played, usable to revert to
    /// or to start a snapshot session from.
    pub fn create_snapshot(&self) -> Option<CaveRendered> {
        self.played_cave.clone()
    }

    /// Award a bonus life, within the caveset maximum. The flash and
    /// jingle only happen when playing for real.
    fn add_bonus_life(&mut self, sound: &mut dyn SoundSink, inform_user: bool) {
        if matches!(self.kind, GameKind::Normal | GameKind::Test) && inform_user
        {
            sound.bonus_life();
            self.bonus_life_flash = 100;
        }

        if self.kind == GameKind::Normal {
            if let Some(caveset) = &self.caveset {
                if self.player_lives < caveset.maximum_lives {
                    self.player_lives += 1;
                }
            }
        }
    }

    /// Add points to the player, the cave and the replay being recorded;
    /// crossing a bonus-life score boundary awards a life.
    fn increment_score(&mut self, sound: &mut dyn SoundSink, increment: i32) {
        let bonus_every = self
            .caveset
            .as_ref()
            .map(|s| s.bonus_life_score)
            .unwrap_or(0);

        let crossed_before =
            if bonus_every > 0 { self.player_score / bonus_every } else { 0 };
        self.player_score += increment;
        self.cave_score += increment;
        if let Some(record) = self.replay_record.as_mut() {
            record.score += increment;
        }
        if bonus_every > 0 && self.player_score / bonus_every > crossed_before {
            self.add_bonus_life(sound, true);
        }
    }

    /// For normal games, step to the next cave, or to the next level after
    /// the last cave. The last level repeats forever.
    fn select_next_level_indexes(&mut self) {
        let cave_count =
            self.caveset.as_ref().map(|s| s.caves.len()).unwrap_or(0);

        self.cave_index += 1;
        if self.cave_index >= cave_count {
            self.cave_index = 0;
            if self.level_index < LEVELS - 1 {
                self.level_index += 1;
            }
        }

        // The story of the next cave has not been seen yet. Failing a cave
        // does not show its story again.
        self.story_shown = false;
    }

    /// Render and set up the cave to play, depending on the session kind.
    fn load_cave(&mut self, sound: &mut dyn SoundSink) {
        self.gfx_buffer.clear();
        self.covered.clear();
        self.cave_score = 0;

        match self.kind {
            GameKind::Normal => {
                let caveset =
                    self.caveset.as_ref().expect("normal game without caveset");
                let stored = &caveset.caves[self.cave_index];
                log::info!(
                    "loading cave '{}', level {}",
                    stored.name,
                    self.level_index + 1
                );

                let authored = stored.rand_seed[self.level_index];
                let seed = if authored >= 0 {
                    authored as u32
                } else {
                    self.rng.random_range(0..CAVE_SEED_MAX) as u32
                };

                let mut cave =
                    CaveRendered::new(stored, self.level_index, seed);
                cave.setup_for_game();

                if cave.intermission && cave.intermission_instantlife {
                    self.add_bonus_life(sound, false);
                }

                let record = Replay {
                    // Level is one-based in files.
                    level: self.level_index as i32 + 1,
                    seed: seed as i32,
                    checksum: cave.checksum(),
                    recorded_with: RECORDED_WITH.to_string(),
                    player_name: self.player_name.clone(),
                    ..Default::default()
                };
                self.replay_record = Some(record);
                self.played_cave = Some(cave);
            }

            GameKind::Test => {
                let stored =
                    self.test_cave.as_ref().expect("test game without cave");
                let seed = self.rng.random_range(0..CAVE_SEED_MAX) as u32;
                let mut cave =
                    CaveRendered::new(stored, self.level_index, seed);
                cave.setup_for_game();
                self.played_cave = Some(cave);
            }

            GameKind::Snapshot => {
                // The snapshot itself is the cave; created in the
                // constructor.
                assert!(
                    self.played_cave.is_some(),
                    "snapshot game without cave"
                );
            }

            GameKind::Replay => {
                let replay = self
                    .replay_from
                    .as_mut()
                    .expect("replay game without replay");
                replay.rewind();
                self.replay_no_more_movements = 0;

                let level =
                    (replay.level - 1).clamp(0, LEVELS as i32 - 1) as usize;
                let seed = replay.seed as u32;
                self.level_index = level;

                let caveset =
                    self.caveset.as_ref().expect("replay game without caveset");
                let mut cave = CaveRendered::new(
                    &caveset.caves[self.cave_index],
                    level,
                    seed,
                );
                cave.setup_for_game();

                self.replay_record = None;
                self.played_cave = Some(cave);
            }

            GameKind::ContinueReplay => {
                unreachable!("cannot load a cave in a diverged replay")
            }
        }

        self.ms_anim = 0;
        self.ms_game = 0;
        self.phase = Phase::ShowStory;
    }

    /// Show the cave story once per cave per session, for normal games
    /// with a story only.
    fn show_story(&mut self, sound: &mut dyn SoundSink) -> State {
        let cave = self.played_cave.as_mut().expect("no cave loaded");

        if !self.story_shown
            && self.kind == GameKind::Normal
            && !cave.story.is_empty()
        {
            // Stop any cover sound left from the previous cave while the
            // story is on screen.
            cave.clear_sounds();
            sound.play_sounds(cave.sound1, cave.sound2, cave.sound3);
            self.phase = Phase::ShowStoryWait;
            self.story_shown = true;
            State::ShowStory
        } else {
            self.phase = Phase::StoryClicked;
            State::Nothing
        }
    }

    /// Create the side maps and start the uncover animation.
    fn start_uncover(&mut self, sound: &mut dyn SoundSink) {
        let cave = self.played_cave.as_mut().expect("no cave loaded");

        self.gfx_buffer = CaveMap::new(cave.w, cave.h, -1);
        self.covered = CaveMap::new(cave.w, cave.h, true);

        cave.clear_sounds();
        cave.sound_play(SoundEvent::Cover);
        sound.play_sounds(cave.sound1, cave.sound2, cave.sound3);

        self.phase = Phase::Uncovering {
            left: UNCOVER_FRAMES,
        };
    }

    /// One animation frame of uncovering: clear random cells.
    ///
    /// The original uncovered one cell per line per frame on a 40 wide
    /// cave; scaling by the area keeps the wall-clock time equal for
    /// intermissions and other sizes.
    fn uncover_animation(&mut self) {
        let (w, h) = (self.covered.width(), self.covered.height());
        for _ in 0..(w * h / 40) {
            let x = self.rng.random_range(0..w);
            let y = self.rng.random_range(0..h);
            self.covered[(x, y)] = false;
        }
    }

    /// Uncover every cell and enter the running state.
    fn uncover_all(&mut self, sound: &mut dyn SoundSink) {
        self.covered.fill(false);

        // Stops the uncover sound.
        let cave = self.played_cave.as_mut().expect("no cave loaded");
        cave.clear_sounds();
        sound.play_sounds(cave.sound1, cave.sound2, cave.sound3);

        self.phase = Phase::Running;
    }

    /// One animation frame of covering, eight times the uncover speed.
    fn cover_animation(&mut self) {
        let (w, h) = (self.covered.width(), self.covered.height());
        for _ in 0..(w * h * 8 / 40) {
            let x = self.rng.random_range(0..w);
            let y = self.rng.random_range(0..h);
            self.covered[(x, y)] = true;
        }
    }

    /// The running cave: iterate as often as the elapsed time allows.
    fn iterate_cave(
        &mut self,
        millisecs_elapsed: i32,
        input: Input,
        engine: &mut dyn CaveEngine,
        sound: &mut dyn SoundSink,
    ) -> State {
        let mut ret = State::Nothing;

        let mut player_move = input.player_move;
        let mut fire = input.fire;
        let mut suicide = input.suicide;

        let speed = if input.fast_forward {
            // Ignore the cave speed and run at 25 fps.
            ANIM_MS
        } else {
            self.played_cave.as_ref().expect("no cave loaded").speed
        };

        // Touching the movement keys during a replay takes the cave over;
        // fire alone does not, it would trigger too easily.
        if self.kind == GameKind::Replay && player_move != Dir::Still {
            self.kind = GameKind::ContinueReplay;
            self.replay_from = None;
        }

        self.ms_game += millisecs_elapsed;

        loop {
            {
                let cave = self.played_cave.as_ref().expect("no cave loaded");
                if cave.player_state == PlayerState::Timeout
                    || self.ms_game < speed
                {
                    break;
                }
            }
            self.ms_game -= speed;

            if self.kind == GameKind::Replay {
                let replay = self
                    .replay_from
                    .as_mut()
                    .expect("replay game without replay");
                match replay.next_movement() {
                    Some(m) => {
                        player_move = m.dir;
                        fire = m.fire;
                        suicide = m.suicide;
                    }
                    None => {
                        // Out of recorded movements; give the player a
                        // grace period to take over, then wrap up.
                        self.replay_no_more_movements += 1;
                        if self.replay_no_more_movements
                            > REPLAY_EXHAUSTED_TICKS
                        {
                            self.phase = Phase::CoverStart;
                            break;
                        }
                    }
                }
            }

            if let Some(record) = self.replay_record.as_mut() {
                record.store_movement(player_move, fire, suicide);
            }

            let cave = self.played_cave.as_mut().expect("no cave loaded");
            let state_before = cave.player_state;
            engine.iterate(cave, player_move, fire, suicide);

            let earned = cave.score;
            let state_after = cave.player_state;
            let sounds = (cave.sound1, cave.sound2, cave.sound3);

            if earned != 0 {
                self.increment_score(sound, earned);
            }
            ret = State::LabelsChanged;
            if state_before != PlayerState::Timeout
                && state_after == PlayerState::Timeout
            {
                ret = State::TimeoutNow;
            }
            sound.play_sounds(sounds.0, sounds.1, sounds.2);
        }

        let player_state =
            self.played_cave.as_ref().expect("no cave loaded").player_state;

        if player_state == PlayerState::Exited {
            // Successful exit; start counting the remaining time as bonus.
            self.phase = Phase::CheckBonusTime;
            if let Some(record) = self.replay_record.as_mut() {
                record.success = true;
            }
            let cave = self.played_cave.as_mut().expect("no cave loaded");
            cave.clear_sounds();
            cave.sound_play(SoundEvent::Finished);
            sound.play_sounds(cave.sound1, cave.sound2, cave.sound3);
        }

        // Death or timeout with fire pressed, or an explicit restart
        // request, abandons the cave.
        let failed = matches!(
            player_state,
            PlayerState::Died | PlayerState::Timeout
        );
        if (failed && fire) || input.restart {
            if self.kind == GameKind::Normal && self.player_lives == 0 {
                self.phase = Phase::WaitingCover { left: WAIT_FRAMES };
            } else {
                self.phase = Phase::CoverStart;
            }
        }

        ret
    }

    /// One animation frame of converting remaining cave time to points.
    fn check_bonus_score(&mut self, sound: &mut dyn SoundSink) {
        let (remaining, timing_factor, time_value) = {
            let cave = self.played_cave.as_ref().expect("no cave loaded");
            (cave.time, cave.timing_factor, cave.time_value)
        };

        if remaining > 0 {
            // Over a minute left counts down nine seconds per frame, a
            // visibly fast counter; the tail counts one per frame.
            let (ticks, points) = if remaining > 60 * timing_factor {
                (9 * timing_factor, 9 * time_value)
            } else {
                (timing_factor, time_value)
            };
            {
                let cave = self.played_cave.as_mut().expect("no cave loaded");
                cave.time = (cave.time - ticks).max(0);
            }
            self.increment_score(sound, points);
        } else {
            self.phase = Phase::WaitingCover { left: WAIT_FRAMES };
        }

        let cave = self.played_cave.as_mut().expect("no cave loaded");
        cave.set_seconds_sound();
        sound.play_sounds(cave.sound1, cave.sound2, cave.sound3);
    }

    /// After the cover animation: bank the replay, manage lives and
    /// highscores, pick the next cave, and tell the host how it ended.
    fn finished_covering(&mut self) -> State {
        self.gfx_buffer.clear();
        self.covered.clear();

        let ret = match self.kind {
            GameKind::Normal => {
                let player_state = self
                    .played_cave
                    .as_ref()
                    .expect("no cave loaded")
                    .player_state;
                let (intermission, rewardlife) = {
                    let cave =
                        self.played_cave.as_ref().expect("no cave loaded");
                    (cave.intermission, cave.intermission_rewardlife)
                };

                // Keep the attempt if it won, or if it is long enough to
                // be worth watching.
                if let Some(record) = self.replay_record.take() {
                    if record.success || record.len() >= REPLAY_KEEP_LENGTH {
                        if let Some(caveset) = self.caveset.as_mut() {
                            caveset.caves[self.cave_index]
                                .replays
                                .push(record);
                        }
                    }
                }

                match player_state {
                    PlayerState::Exited => {
                        if intermission && rewardlife {
                            // Bonus life without the flash; the cave is
                            // already over.
                            if let Some(caveset) = &self.caveset {
                                if self.player_lives < caveset.maximum_lives
                                {
                                    self.player_lives += 1;
                                }
                            }
                        }
                        let name = self.player_name.clone();
                        let score = self.cave_score;
                        if let Some(caveset) = self.caveset.as_mut() {
                            caveset.caves[self.cave_index]
                                .highscore
                                .add(name, score);
                        }
                    }
                    PlayerState::Died | PlayerState::Timeout => {
                        if !intermission && self.player_lives > 0 {
                            self.player_lives -= 1;
                        }
                    }
                    PlayerState::Living | PlayerState::NotYet => {}
                }

                // Intermissions give a single chance; move on regardless.
                if player_state == PlayerState::Exited || intermission {
                    self.select_next_level_indexes();
                }

                if self.player_lives > 0 {
                    State::Nothing
                } else {
                    State::GameOver
                }
            }
            // The same cave reloads for another test round.
            GameKind::Test => State::Nothing,
            GameKind::Snapshot
            | GameKind::Replay
            | GameKind::ContinueReplay => State::Stop,
        };

        self.phase = Phase::LoadCave;
        ret
    }

    /// Advance the session by `millisecs_elapsed` of wall-clock time.
    ///
    /// Call this from a single host timer, typically every 20 or 40 ms.
    /// Animation paces itself to 25 Hz internally; the cave iterates at
    /// its own speed.
    pub fn main_int(
        &mut self,
        millisecs_elapsed: i32,
        input: Input,
        engine: &mut dyn CaveEngine,
        sound: &mut dyn SoundSink,
    ) -> State {
        self.ms_anim += millisecs_elapsed;
        let mut is_animation_frame = false;
        if self.ms_anim >= ANIM_MS {
            is_animation_frame = true;
            self.ms_anim -= ANIM_MS;
            if self.bonus_life_flash > 0 {
                self.bonus_life_flash -= 1;
            }
            self.animcycle = (self.animcycle + 1) % 8;
        }

        match self.phase {
            Phase::LoadCave => {
                self.load_cave(sound);
                State::CaveLoaded
            }
            Phase::ShowStory => self.show_story(sound),
            Phase::ShowStoryWait => {
                if input.fire || input.restart {
                    self.phase = Phase::StoryClicked;
                }
                State::ShowStoryWait
            }
            Phase::StoryClicked => {
                self.phase = Phase::StartUncover;
                State::PrepareFirstFrame
            }
            Phase::StartUncover => {
                self.start_uncover(sound);
                // The cave is on screen from here on; size and colors are
                // final.
                State::FirstFrame
            }
            Phase::Uncovering { left } => {
                if is_animation_frame {
                    self.uncover_animation();
                    self.phase = if left > 1 {
                        Phase::Uncovering { left: left - 1 }
                    } else {
                        Phase::UncoverAll
                    };
                }
                State::Nothing
            }
            Phase::UncoverAll => {
                self.uncover_all(sound);
                State::Nothing
            }
            Phase::Running => {
                if input.allow_iterate {
                    self.iterate_cave(millisecs_elapsed, input, engine, sound)
                } else {
                    State::Nothing
                }
            }
            Phase::CheckBonusTime => {
                if is_animation_frame {
                    self.check_bonus_score(sound);
                    State::LabelsChanged
                } else {
                    State::Nothing
                }
            }
            Phase::WaitingCover { left } => {
                if !is_animation_frame {
                    return State::Nothing;
                }
                let ret = if left == WAIT_FRAMES
                    && self.kind == GameKind::Normal
                    && self.player_lives == 0
                {
                    // The cover animation is still on the way; the host
                    // can show the game over banner meanwhile.
                    State::NoMoreLives
                } else {
                    State::Nothing
                };
                self.phase = if left > 1 {
                    Phase::WaitingCover { left: left - 1 }
                } else {
                    Phase::CoverStart
                };
                ret
            }
            Phase::CoverStart => {
                let cave = self.played_cave.as_mut().expect("no cave loaded");
                cave.clear_sounds();
                cave.sound_play(SoundEvent::Cover);
                sound.play_sounds(cave.sound1, cave.sound2, cave.sound3);
                self.phase = Phase::Covering { left: COVER_FRAMES };
                State::Nothing
            }
            Phase::Covering { left } => {
                if is_animation_frame {
                    self.cover_animation();
                    self.phase = if left > 1 {
                        Phase::Covering { left: left - 1 }
                    } else {
                        Phase::CoverAll
                    };
                }
                State::Nothing
            }
            Phase::CoverAll => {
                self.covered.fill(true);
                self.phase = Phase::Done;
                State::Nothing
            }
            Phase::Done => self.finished_covering(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullSound;
    use cave::Element;
    use pretty_assertions::assert_eq;
    use util::CaveMap;

    /// Scripted stand-in for the cave physics. Scores points per tick and
    /// flips the player state at a preset tick.
    struct FakePhysics {
        calls: i32,
        exit_at: i32,
        exit_into: PlayerState,
        score_per_tick: Vec<i32>,
    }

    impl FakePhysics {
        fn new(exit_at: i32, exit_into: PlayerState) -> Self {
            FakePhysics {
                calls: 0,
                exit_at,
                exit_into,
                score_per_tick: Vec::new(),
            }
        }
    }

    impl CaveEngine for FakePhysics {
        fn iterate(
            &mut self,
            cave: &mut CaveRendered,
            player_move: Dir,
            fire: bool,
            _suicide: bool,
        ) -> Dir {
            cave.score = if fire {
                5
            } else if player_move != Dir::Still {
                2
            } else {
                self.score_per_tick
                    .get(self.calls as usize)
                    .copied()
                    .unwrap_or(0)
            };
            self.calls += 1;
            if self.calls == self.exit_at {
                cave.player_state = self.exit_into;
            }
            player_move
        }
    }

    fn small_caveset() -> CaveSet {
        let mut cave = CaveStored {
            name: "test cave".to_string(),
            w: 6,
            h: 5,
            x2: 5,
            y2: 4,
            cave_time: [1; LEVELS],
            frame_time: [200; LEVELS],
            ..Default::default()
        };
        let mut map = CaveMap::new(6, 5, Element::Dirt);
        map[(2, 2)] = Element::Inbox;
        cave.map = Some(map);

        CaveSet {
            caves: vec![cave],
            ..Default::default()
        }
    }

    /// Step through load, story and uncover until the cave is running.
    fn run_until_running(
        g: &mut GameControl,
        engine: &mut FakePhysics,
    ) {
        let mut sound = NullSound;
        for _ in 0..1000 {
            if g.game_header() {
                return;
            }
            g.main_int(20, Input::default(), engine, &mut sound);
        }
        panic!("cave never started running");
    }

    /// Run main_int until the session reports Stop or GameOver.
    fn run_to_end(
        g: &mut GameControl,
        engine: &mut FakePhysics,
        input: Input,
    ) -> State {
        let mut sound = NullSound;
        for _ in 0..100_000 {
            match g.main_int(20, input, engine, &mut sound) {
                State::Stop => return State::Stop,
                State::GameOver => return State::GameOver,
                State::CaveLoaded => return State::CaveLoaded,
                _ => {}
            }
        }
        panic!("session never ended");
    }

    #[test]
    fn uncover_takes_seventy_frames() {
        let mut g =
            GameControl::new_normal(small_caveset(), "ada", 0, 0);
        let mut engine = FakePhysics::new(i32::MAX, PlayerState::Exited);
        let mut sound = NullSound;

        // Load; no story; prepare; first frame.
        assert_eq!(
            g.main_int(20, Input::default(), &mut engine, &mut sound),
            State::CaveLoaded
        );
        assert_eq!(
            g.main_int(20, Input::default(), &mut engine, &mut sound),
            State::Nothing
        );
        assert_eq!(
            g.main_int(20, Input::default(), &mut engine, &mut sound),
            State::PrepareFirstFrame
        );
        assert_eq!(
            g.main_int(20, Input::default(), &mut engine, &mut sound),
            State::FirstFrame
        );
        assert!(!g.covered.is_empty());
        assert!(g.covered.iter().all(|(_, &c)| c));

        // 68 animation frames of uncovering at 40 ms each, plus the
        // uncover-all frame, and the cave is running.
        let mut calls = 0;
        while !g.game_header() {
            g.main_int(20, Input::default(), &mut engine, &mut sound);
            calls += 1;
            assert!(calls < 1000, "stuck in uncover");
        }
        assert!(g.covered.iter().all(|(_, &c)| !c));
        assert_eq!(engine.calls, 0);
    }

    #[test]
    fn iterate_count_follows_elapsed_time() {
        let mut g =
            GameControl::new_normal(small_caveset(), "ada", 0, 0);
        let mut engine = FakePhysics::new(i32::MAX, PlayerState::Exited);
        run_until_running(&mut g, &mut engine);

        // Cave speed is 200 ms. 40 calls of 35 ms = 1400 ms -> 7 ticks.
        let mut sound = NullSound;
        for _ in 0..40 {
            g.main_int(35, Input::default(), &mut engine, &mut sound);
        }
        assert_eq!(engine.calls, 7);
    }

    #[test]
    fn bonus_life_on_score_boundary() {
        let mut g =
            GameControl::new_normal(small_caveset(), "ada", 0, 0);
        let mut engine = FakePhysics::new(i32::MAX, PlayerState::Exited);
        engine.score_per_tick = vec![100, 200, 100, 200];
        run_until_running(&mut g, &mut engine);

        assert_eq!(g.player_lives, 3);
        let mut sound = NullSound;
        for _ in 0..4 {
            g.main_int(200, Input::default(), &mut engine, &mut sound);
        }

        // Score went 100, 300, 400, 600: crossed the 500 boundary once.
        assert_eq!(g.player_score, 600);
        assert_eq!(g.player_lives, 4);
        assert!(g.bonus_life_flash > 0);
    }

    #[test]
    fn replay_record_and_playback_are_deterministic() {
        let mut g =
            GameControl::new_normal(small_caveset(), "ada", 0, 0);
        let mut engine = FakePhysics::new(30, PlayerState::Exited);
        run_until_running(&mut g, &mut engine);

        // Play 30 ticks with varying input, then let the end-of-cave flow
        // run to completion.
        let mut sound = NullSound;
        let mut step = 0;
        while g.game_header() {
            let input = Input {
                player_move: if step % 3 == 0 { Dir::Right } else { Dir::Still },
                fire: step % 2 == 0,
                ..Default::default()
            };
            step += 1;
            g.main_int(200, input, &mut engine, &mut sound);
        }
        let recorded_calls = engine.calls;
        let score = g.player_score;

        let caveset = g.into_caveset().unwrap();
        let replay = caveset.caves[0].replays.last().unwrap().clone();
        assert!(replay.success);
        assert_eq!(replay.score, score);
        assert_eq!(replay.len() as i32, recorded_calls);

        // Play it back; the scripted physics scores from the inputs, so an
        // identical score proves the input stream was reproduced.
        let mut g = GameControl::new_replay(caveset, 0, replay);
        let mut engine = FakePhysics::new(30, PlayerState::Exited);
        run_until_running(&mut g, &mut engine);
        let end = run_to_end(&mut g, &mut engine, Input::default());
        assert_eq!(end, State::Stop);
        assert_eq!(engine.calls, recorded_calls);
        assert_eq!(g.player_score, score);
        assert_eq!(
            g.played_cave.as_ref().unwrap().player_state,
            PlayerState::Exited
        );
    }

    #[test]
    fn replay_diverges_on_player_input() {
        let mut g =
            GameControl::new_normal(small_caveset(), "ada", 0, 0);
        let mut engine = FakePhysics::new(30, PlayerState::Exited);
        run_until_running(&mut g, &mut engine);
        let mut sound = NullSound;
        while g.game_header() {
            let input = Input {
                player_move: Dir::Right,
                ..Default::default()
            };
            g.main_int(200, input, &mut engine, &mut sound);
        }

        let caveset = g.into_caveset().unwrap();
        let replay = caveset.caves[0].replays.last().unwrap().clone();

        let mut g = GameControl::new_replay(caveset, 0, replay);
        let mut engine = FakePhysics::new(i32::MAX, PlayerState::Exited);
        run_until_running(&mut g, &mut engine);

        assert_eq!(g.kind, GameKind::Replay);
        let mut sound = NullSound;
        g.main_int(
            200,
            Input {
                player_move: Dir::Left,
                ..Default::default()
            },
            &mut engine,
            &mut sound,
        );
        assert_eq!(g.kind, GameKind::ContinueReplay);
    }

    #[test]
    fn death_costs_a_life() {
        let mut g = GameControl::new_normal(small_caveset(), "ada", 0, 0);
        let mut engine = FakePhysics::new(3, PlayerState::Died);
        run_until_running(&mut g, &mut engine);
        assert_eq!(g.player_lives, 3);

        // Die, press fire to confirm, let the cave cover.
        let input = Input {
            fire: true,
            ..Default::default()
        };
        let end = run_to_end(&mut g, &mut engine, input);
        assert_eq!(end, State::CaveLoaded);
        assert_eq!(g.player_lives, 2);
        // A failed cave is retried, not skipped.
        assert_eq!(g.cave_index(), 0);
        assert_eq!(g.level_index(), 0);
    }

    #[test]
    fn game_over_on_last_life() {
        let mut caveset = small_caveset();
        caveset.initial_lives = 1;
        let mut g = GameControl::new_normal(caveset, "ada", 0, 0);
        let mut engine = FakePhysics::new(3, PlayerState::Died);
        run_until_running(&mut g, &mut engine);

        let input = Input {
            fire: true,
            ..Default::default()
        };
        let end = run_to_end(&mut g, &mut engine, input);
        assert_eq!(end, State::GameOver);
        assert_eq!(g.player_lives, 0);
    }

    #[test]
    fn no_more_lives_is_flagged_while_covering() {
        // A session that starts with no lives at all: failing it shows the
        // game over banner during the long wait before covering.
        let mut caveset = small_caveset();
        caveset.initial_lives = 0;
        let mut g = GameControl::new_normal(caveset, "ada", 0, 0);
        let mut engine = FakePhysics::new(3, PlayerState::Died);
        run_until_running(&mut g, &mut engine);

        let mut sound = NullSound;
        let mut saw_no_more_lives = false;
        let end = loop {
            let state = g.main_int(
                200,
                Input {
                    fire: true,
                    ..Default::default()
                },
                &mut engine,
                &mut sound,
            );
            match state {
                State::NoMoreLives => saw_no_more_lives = true,
                State::GameOver | State::Stop | State::CaveLoaded => {
                    break state
                }
                _ => {}
            }
        };

        assert!(saw_no_more_lives);
        assert_eq!(end, State::GameOver);
    }

    #[test]
    fn failed_replays_kept_only_from_sixteen_ticks() {
        // A failed run is still worth keeping if it is long enough; the
        // cutoff is at sixteen recorded movements.
        for (death_tick, kept) in [(15, 0), (16, 1)] {
            let mut g =
                GameControl::new_normal(small_caveset(), "ada", 0, 0);
            let mut engine =
                FakePhysics::new(death_tick, PlayerState::Died);
            run_until_running(&mut g, &mut engine);

            let input = Input {
                fire: true,
                ..Default::default()
            };
            run_to_end(&mut g, &mut engine, input);

            let caveset = g.into_caveset().unwrap();
            assert_eq!(caveset.caves[0].replays.len(), kept);
            if kept == 1 {
                let replay = &caveset.caves[0].replays[0];
                assert!(!replay.success);
                assert_eq!(replay.len(), 16);
            }
        }
    }

    #[test]
    fn test_kind_reloads_the_same_cave() {
        let caveset = small_caveset();
        let mut g = GameControl::new_test(caveset.caves[0].clone(), 2);
        let mut engine = FakePhysics::new(3, PlayerState::Died);
        run_until_running(&mut g, &mut engine);

        let mut sound = NullSound;
        let end = loop {
            let state = g.main_int(
                200,
                Input {
                    fire: true,
                    ..Default::default()
                },
                &mut engine,
                &mut sound,
            );
            match state {
                State::CaveLoaded | State::Stop | State::GameOver => {
                    break state
                }
                _ => {}
            }
        };
        // Test sessions never stop; the cave just reloads.
        assert_eq!(end, State::CaveLoaded);
        assert_eq!(g.level_index(), 2);
    }

    #[test]
    fn snapshot_plays_one_cave_and_stops() {
        let caveset = small_caveset();
        let mut source =
            GameControl::new_normal(caveset, "ada", 0, 0);
        let mut engine = FakePhysics::new(i32::MAX, PlayerState::Exited);
        run_until_running(&mut source, &mut engine);
        let snapshot = source.create_snapshot().unwrap();

        let mut g = GameControl::new_snapshot(snapshot);
        let mut engine = FakePhysics::new(4, PlayerState::Exited);
        run_until_running(&mut g, &mut engine);
        let end = run_to_end(&mut g, &mut engine, Input::default());
        assert_eq!(end, State::Stop);
        assert_eq!(g.player_lives, 0);
    }

    #[test]
    fn next_cave_wraps_to_harder_level() {
        let mut g =
            GameControl::new_normal(small_caveset(), "ada", 0, 0);
        let mut engine = FakePhysics::new(5, PlayerState::Exited);
        run_until_running(&mut g, &mut engine);

        let mut sound = NullSound;
        while g.game_header() {
            g.main_int(200, Input::default(), &mut engine, &mut sound);
        }

        // One cave in the set: wrapping advances the difficulty level.
        assert_eq!(g.cave_index(), 0);
        assert_eq!(g.level_index(), 1);

        // A successful cave records the score in its highscore table.
        let caveset = g.caveset().unwrap();
        assert!(!caveset.caves[0].highscore.is_empty());
    }
}
