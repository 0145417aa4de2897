//! Cave data model shared by the file codec and the game engine.

/// Number of difficulty levels every cave is authored for.
pub const LEVELS: usize = 5;

/// Exclusive upper bound for cave render seeds.
pub const CAVE_SEED_MAX: i32 = 1 << 16;

mod caveset;
pub use caveset::{caveset_properties, CaveSet};

mod color;
pub use color::Color;

mod direction;
pub use direction::Dir;

mod element;
pub use element::Element;

mod highscore;
pub use highscore::{HighScore, HighScoreTable, HIGHSCORE_SIZE};

mod object;
pub use object::{CaveObject, LevelMask, ObjectKind};

pub mod props;

mod rendered;
pub use rendered::{CaveRendered, PlayerState};

mod replay;
pub use replay::{Movement, Replay, replay_properties};

mod scheduling;
pub use scheduling::Scheduling;

mod sound;
pub use sound::SoundEvent;

mod stored;
pub use stored::{cave_properties, CaveStored, EngineVariant};
