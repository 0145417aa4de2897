use glam::{ivec2, IVec2};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumIter, EnumString};

/// The eight compass directions plus standing still.
#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Hash,
    Debug,
    Display,
    EnumString,
    EnumIter,
    SerializeDisplay,
    DeserializeFromStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Dir {
    #[default]
    #[strum(to_string = "still")]
    Still,
    #[strum(to_string = "up")]
    Up,
    #[strum(to_string = "upright")]
    UpRight,
    #[strum(to_string = "right")]
    Right,
    #[strum(to_string = "downright")]
    DownRight,
    #[strum(to_string = "down")]
    Down,
    #[strum(to_string = "downleft")]
    DownLeft,
    #[strum(to_string = "left")]
    Left,
    #[strum(to_string = "upleft")]
    UpLeft,
}

impl Dir {
    /// Combine four pressed-key flags into a movement direction.
    pub fn from_keypress(up: bool, down: bool, left: bool, right: bool) -> Dir {
        use Dir::*;
        match (up, down, left, right) {
            (true, _, true, _) => UpLeft,
            (true, _, _, true) => UpRight,
            (_, true, true, _) => DownLeft,
            (_, true, _, true) => DownRight,
            (true, ..) => Up,
            (_, true, ..) => Down,
            (_, _, true, _) => Left,
            (_, _, _, true) => Right,
            _ => Still,
        }
    }

    pub fn delta(self) -> IVec2 {
        use Dir::*;
        match self {
            Still => ivec2(0, 0),
            Up => ivec2(0, -1),
            UpRight => ivec2(1, -1),
            Right => ivec2(1, 0),
            DownRight => ivec2(1, 1),
            Down => ivec2(0, 1),
            DownLeft => ivec2(-1, 1),
            Left => ivec2(-1, 0),
            UpLeft => ivec2(-1, -1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypress_combinations() {
        assert_eq!(Dir::from_keypress(false, false, false, false), Dir::Still);
        assert_eq!(Dir::from_keypress(true, false, false, false), Dir::Up);
        assert_eq!(Dir::from_keypress(true, false, false, true), Dir::UpRight);
        assert_eq!(Dir::from_keypress(false, true, true, false), Dir::DownLeft);
    }

    #[test]
    fn names() {
        assert_eq!("downleft".parse::<Dir>().unwrap(), Dir::DownLeft);
        assert_eq!(Dir::UpRight.to_string(), "upright");
    }
}
