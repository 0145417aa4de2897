use serde::{Deserialize, Serialize};

/// Sound cues raised by the cave and the game flow.
///
/// The core never mixes audio; it only parks at most three of these per
/// frame in the rendered cave's sound slots for the host to play.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum SoundEvent {
    /// Cover and uncover animation rumble.
    Cover,
    /// Cave completed.
    Finished,
    /// Bonus point tick while remaining time is counted down.
    Bonus,
    /// One-second tick when cave time runs low.
    Seconds,
    Explosion,
    Stone,
    Diamond,
    Timeout,
}
