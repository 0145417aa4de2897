use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use util::HashMap;

/// One kind of cave cell.
///
/// The string forms are the identifiers used in caveset files; they are the
/// single source of naming truth for both attribute values and map codes.
#[derive(
    Copy,
    Clone,
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
#[repr(u8)]
pub enum Element {
    #[strum(to_string = "SPACE")]
    Space,
    #[strum(to_string = "DIRT")]
    Dirt,
    #[strum(to_string = "WALL", serialize = "BRICKWALL")]
    Wall,
    #[strum(to_string = "MAGICWALL")]
    MagicWall,
    #[strum(to_string = "STEELWALL", serialize = "STEEL")]
    SteelWall,
    #[strum(to_string = "OUTBOX")]
    Outbox,
    #[strum(to_string = "HIDDENOUTBOX")]
    HiddenOutbox,
    #[strum(to_string = "INBOX")]
    Inbox,
    #[strum(to_string = "BOULDER", serialize = "STONE")]
    Stone,
    #[strum(to_string = "BOULDERf", serialize = "FALLINGBOULDER")]
    StoneFalling,
    #[strum(to_string = "DIAMOND")]
    Diamond,
    #[strum(to_string = "DIAMONDf", serialize = "FALLINGDIAMOND")]
    DiamondFalling,
    #[strum(to_string = "FIREFLYl")]
    FireflyLeft,
    #[strum(to_string = "FIREFLYu")]
    FireflyUp,
    #[strum(to_string = "FIREFLYr")]
    FireflyRight,
    #[strum(to_string = "FIREFLYd")]
    FireflyDown,
    #[strum(to_string = "BUTTERFLYl")]
    ButterflyLeft,
    #[strum(to_string = "BUTTERFLYu")]
    ButterflyUp,
    #[strum(to_string = "BUTTERFLYr")]
    ButterflyRight,
    #[strum(to_string = "BUTTERFLYd")]
    ButterflyDown,
    #[strum(to_string = "AMOEBA")]
    Amoeba,
    #[strum(to_string = "SLIME")]
    Slime,
    #[strum(to_string = "ACID")]
    Acid,
    #[strum(to_string = "DUMMY", serialize = "VOODOO")]
    Voodoo,
    #[strum(to_string = "HEXPANDINGWALL")]
    ExpandingWallHoriz,
    #[strum(to_string = "VEXPANDINGWALL")]
    ExpandingWallVert,
    #[strum(to_string = "EXPANDINGWALL")]
    ExpandingWall,
    #[strum(to_string = "BOMB")]
    Bomb,
    #[strum(to_string = "EXPLOSION1")]
    Explode1,
    #[strum(to_string = "EXPLOSION2")]
    Explode2,
    #[strum(to_string = "EXPLOSION3")]
    Explode3,
    #[strum(to_string = "EXPLOSION4")]
    Explode4,
    #[strum(to_string = "EXPLOSION5")]
    Explode5,
    #[strum(to_string = "PLAYER")]
    Player,
    #[strum(to_string = "UNKNOWN")]
    Unknown,
}

impl Element {
    /// The standard one-character map code, if the element has one.
    ///
    /// Elements that return `None` here cannot appear in a map without a
    /// `[mapcodes]` section assigning them a character.
    pub fn map_char(self) -> Option<char> {
        use Element::*;
        Some(match self {
            Space => ' ',
            Dirt => '.',
            Wall => 'w',
            MagicWall => 'M',
            SteelWall => 'W',
            Outbox => 'X',
            HiddenOutbox => 'H',
            Inbox => 'P',
            Stone => 'r',
            Diamond => 'd',
            FireflyLeft => 'Q',
            FireflyUp => 'o',
            FireflyRight => 'q',
            FireflyDown => 'O',
            ButterflyLeft => 'C',
            ButterflyUp => 'b',
            ButterflyRight => 'c',
            ButterflyDown => 'B',
            Amoeba => 'a',
            Slime => 's',
            Acid => 'Y',
            Voodoo => 'F',
            ExpandingWallHoriz => 'x',
            ExpandingWallVert => 'v',
            ExpandingWall => 'e',
            Bomb => 'N',
            _ => return None,
        })
    }

    /// The default character-to-element lookup used when reading maps.
    pub fn char_table() -> HashMap<char, Element> {
        Element::iter()
            .filter_map(|e| e.map_char().map(|c| (c, e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!("BOULDER".parse::<Element>().unwrap(), Element::Stone);
        // Compatibility alias and case-insensitivity.
        assert_eq!("stone".parse::<Element>().unwrap(), Element::Stone);
        assert_eq!(Element::Stone.to_string(), "BOULDER");
        assert!("GREMLIN".parse::<Element>().is_err());
    }

    #[test]
    fn char_table_is_injective() {
        let table = Element::char_table();
        for e in Element::iter() {
            if let Some(c) = e.map_char() {
                assert_eq!(table[&c], e);
            }
        }
    }
}
