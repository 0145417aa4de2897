use std::sync::OnceLock;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    props::{PropDescriptor, PropKind, PropValue},
    Dir,
};

/// One recorded input step, consumed 1:1 with cave iterations.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct Movement {
    pub dir: Dir,
    pub fire: bool,
    pub suicide: bool,
}

/// A recorded play attempt of one cave.
///
/// The seed and level, applied to the owning stored cave, reproduce the
/// starting map of the attempt; `checksum` carries an Adler-32 fingerprint
/// of that map for verification.
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Replay {
    /// One-based difficulty level, as written in files.
    pub level: i32,
    pub seed: i32,
    /// Persisted on the next caveset write.
    pub saved: bool,
    /// True if the player reached the exit.
    pub success: bool,
    pub checksum: u32,
    pub score: i32,
    pub player_name: String,
    pub date: String,
    pub recorded_with: String,
    pub comment: String,
    /// Playing time in seconds, informational.
    pub duration: i32,
    pub movements: Vec<Movement>,
    #[serde(skip)]
    pub cursor: usize,
}

impl Replay {
    pub fn store_movement(&mut self, dir: Dir, fire: bool, suicide: bool) {
        self.movements.push(Movement { dir, fire, suicide });
    }

    /// Restart playback from the first recorded movement.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// The next recorded movement, or `None` when the stream is exhausted.
    ///
    /// Exhaustion does not truncate the replay; rewinding restores the full
    /// stream.
    pub fn next_movement(&mut self) -> Option<Movement> {
        let m = self.movements.get(self.cursor).copied();
        if m.is_some() {
            self.cursor += 1;
        }
        m
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    /// Append movements from their text form, a whitespace separated list of
    /// run-length tokens like `r5 u . UR2 F k`.
    ///
    /// Uppercase move letters imply fire, `F` is fire in place, `k` is
    /// suicide, `.` stands still. `c`/`C` combination flags and unknown
    /// characters are ignored.
    pub fn append_movements(&mut self, text: &str) {
        for token in text.split_whitespace() {
            let (movement, count) = parse_token(token);
            for _ in 0..count {
                self.movements.push(movement);
            }
        }
    }

    /// The text form of the movement stream, identical runs grouped with a
    /// run-length suffix.
    pub fn movements_to_text(&self) -> String {
        let runs = self.movements.iter().chunk_by(|&&m| m);
        let mut tokens = Vec::new();
        for (movement, run) in &runs {
            let count = run.count();
            let mut token = movement_token(movement);
            if count > 1 {
                token.push_str(&count.to_string());
            }
            tokens.push(token);
        }
        tokens.join(" ")
    }
}

fn parse_token(token: &str) -> (Movement, usize) {
    let (mut up, mut down, mut left, mut right) = (false, false, false, false);
    let (mut fire, mut suicide) = (false, false);
    let mut digits = String::new();
    let mut digits_done = false;

    for c in token.chars() {
        if c.is_ascii_digit() {
            if !digits_done {
                digits.push(c);
            }
            continue;
        }
        // Only the first digit run counts as the run length.
        if !digits.is_empty() {
            digits_done = true;
        }
        match c {
            'u' => up = true,
            'U' => {
                up = true;
                fire = true;
            }
            'd' => down = true,
            'D' => {
                down = true;
                fire = true;
            }
            'l' => left = true,
            'L' => {
                left = true;
                fire = true;
            }
            'r' => right = true,
            'R' => {
                right = true;
                fire = true;
            }
            'F' => fire = true,
            'k' => suicide = true,
            // Still, and the "combined" flags nothing is done about.
            '.' | 'c' | 'C' => {}
            _ => {}
        }
    }

    let count = digits.parse().unwrap_or(1);
    (
        Movement {
            dir: Dir::from_keypress(up, down, left, right),
            fire,
            suicide,
        },
        count,
    )
}

fn movement_token(m: Movement) -> String {
    use Dir::*;

    let mut token = String::new();
    if m.suicide {
        token.push('k');
    }

    let letters = match m.dir {
        Still => "",
        Up => "u",
        UpRight => "ur",
        Right => "r",
        DownRight => "dr",
        Down => "d",
        DownLeft => "dl",
        Left => "l",
        UpLeft => "ul",
    };
    for c in letters.chars() {
        token.push(if m.fire { c.to_ascii_uppercase() } else { c });
    }

    if m.dir == Still {
        if m.fire {
            token.push('F');
        } else if !m.suicide {
            token.push('.');
        }
    }

    token
}

/// Property table for replay sections.
pub fn replay_properties() -> &'static [PropDescriptor<Replay>] {
    static TABLE: OnceLock<Vec<PropDescriptor<Replay>>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            PropDescriptor::new(
                "Level",
                PropKind::Int,
                |r: &Replay, _| PropValue::Int(r.level),
                |r, _, v| r.level = v.int(),
            )
            .always_save(),
            PropDescriptor::new(
                "RandSeed",
                PropKind::Int,
                |r: &Replay, _| PropValue::Int(r.seed),
                |r, _, v| r.seed = v.int(),
            )
            .always_save(),
            PropDescriptor::new(
                "Player",
                PropKind::Text,
                |r: &Replay, _| PropValue::Text(r.player_name.clone()),
                |r, _, v| r.player_name = v.text(),
            ),
            PropDescriptor::new(
                "Date",
                PropKind::Text,
                |r: &Replay, _| PropValue::Text(r.date.clone()),
                |r, _, v| r.date = v.text(),
            ),
            PropDescriptor::new(
                "RecordedWith",
                PropKind::Text,
                |r: &Replay, _| PropValue::Text(r.recorded_with.clone()),
                |r, _, v| r.recorded_with = v.text(),
            ),
            PropDescriptor::new(
                "Comment",
                PropKind::Text,
                |r: &Replay, _| PropValue::Text(r.comment.clone()),
                |r, _, v| r.comment = v.text(),
            ),
            PropDescriptor::new(
                "Duration",
                PropKind::Int,
                |r: &Replay, _| PropValue::Int(r.duration),
                |r, _, v| r.duration = v.int(),
            ),
            PropDescriptor::new(
                "Score",
                PropKind::Int,
                |r: &Replay, _| PropValue::Int(r.score),
                |r, _, v| r.score = v.int(),
            ),
            PropDescriptor::new(
                "Success",
                PropKind::Bool,
                |r: &Replay, _| PropValue::Bool(r.success),
                |r, _, v| r.success = v.bool(),
            ),
            PropDescriptor::new(
                "CheckSum",
                PropKind::Int,
                |r: &Replay, _| PropValue::Int(r.checksum as i32),
                |r, _, v| r.checksum = v.int() as u32,
            ),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck::{Arbitrary, Gen};

    fn movement(dir: Dir, fire: bool) -> Movement {
        Movement {
            dir,
            fire,
            suicide: false,
        }
    }

    #[test]
    fn run_length_encoding() {
        let mut replay = Replay::default();
        for _ in 0..7 {
            replay.store_movement(Dir::Right, false, false);
        }
        replay.store_movement(Dir::Still, false, false);
        for _ in 0..3 {
            replay.store_movement(Dir::Up, true, false);
        }

        assert_eq!(replay.movements_to_text(), "r7 . U3");

        let mut decoded = Replay::default();
        decoded.append_movements("r7 . U3");
        assert_eq!(decoded.movements(), replay.movements());
    }

    #[test]
    fn playback_and_rewind() {
        let mut replay = Replay::default();
        replay.append_movements("r2 k");
        assert_eq!(replay.next_movement(), Some(movement(Dir::Right, false)));
        assert_eq!(replay.next_movement(), Some(movement(Dir::Right, false)));
        assert_eq!(
            replay.next_movement(),
            Some(Movement {
                dir: Dir::Still,
                fire: false,
                suicide: true
            })
        );
        assert_eq!(replay.next_movement(), None);
        // Exhaustion must not truncate the stream.
        assert_eq!(replay.len(), 3);
        replay.rewind();
        assert_eq!(replay.next_movement(), Some(movement(Dir::Right, false)));
    }

    #[test]
    fn lenient_decoding() {
        let mut replay = Replay::default();
        // Unknown characters and combined flags are ignored, diagonals
        // combine, digits after letters give a run length.
        replay.append_movements("urC3 Fz dl");
        assert_eq!(
            replay.movements(),
            &[
                movement(Dir::UpRight, false),
                movement(Dir::UpRight, false),
                movement(Dir::UpRight, false),
                movement(Dir::Still, true),
                movement(Dir::DownLeft, false),
            ]
        );
    }

    impl Arbitrary for Movement {
        fn arbitrary(g: &mut Gen) -> Movement {
            use Dir::*;
            let dir = *g
                .choose(&[
                    Still, Up, UpRight, Right, DownRight, Down, DownLeft,
                    Left, UpLeft,
                ])
                .unwrap();
            Movement {
                dir,
                fire: bool::arbitrary(g),
                suicide: bool::arbitrary(g),
            }
        }
    }

    #[quickcheck_macros::quickcheck]
    fn movement_text_round_trips(movements: Vec<Movement>) -> bool {
        let mut replay = Replay::default();
        for m in &movements {
            replay.store_movement(m.dir, m.fire, m.suicide);
        }
        let mut decoded = Replay::default();
        decoded.append_movements(&replay.movements_to_text());
        decoded.movements() == replay.movements()
    }
}
