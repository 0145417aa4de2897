//! Game flow machinery: drives one play session over an injected cave
//! physics implementation.

use cave::{CaveRendered, Dir, SoundEvent};

mod control;
pub use control::{GameControl, GameKind, Input, State};

/// The cave physics, injected into the game flow.
///
/// One call advances the cave by a single tick. The implementation may
/// update the player state and position, the per-tick `score` field, the
/// remaining time and the sound slots. The returned direction is the move
/// actually performed (diagonal input may degrade to a straight move).
pub trait CaveEngine {
    fn iterate(
        &mut self,
        cave: &mut CaveRendered,
        player_move: Dir,
        fire: bool,
        suicide: bool,
    ) -> Dir;
}

/// Host-side audio. The game flow forwards the cave's sound slots here
/// after every iteration and at state transitions.
pub trait SoundSink {
    fn play_sounds(
        &mut self,
        sound1: Option<SoundEvent>,
        sound2: Option<SoundEvent>,
        sound3: Option<SoundEvent>,
    );

    /// Bonus life jingle, independent of the cave sound slots.
    fn bonus_life(&mut self) {}
}

/// Sink for headless hosts and tests.
pub struct NullSound;

impl SoundSink for NullSound {
    fn play_sounds(
        &mut self,
        _sound1: Option<SoundEvent>,
        _sound2: Option<SoundEvent>,
        _sound3: Option<SoundEvent>,
    ) {
    }
}
