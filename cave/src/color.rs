use std::{fmt, str::FromStr};

use anyhow::bail;
use rand::{seq::IndexedRandom, Rng};
use serde_with::{DeserializeFromStr, SerializeDisplay};

/// The 16 entry C64 palette, which is also the set of color names recognized
/// in caveset files.
const C64_PALETTE: [(&str, (u8, u8, u8)); 16] = [
    ("Black", (0x00, 0x00, 0x00)),
    ("White", (0xff, 0xff, 0xff)),
    ("Red", (0x68, 0x37, 0x2b)),
    ("Cyan", (0x70, 0xa4, 0xb2)),
    ("Purple", (0x6f, 0x3d, 0x86)),
    ("Green", (0x58, 0x8d, 0x43)),
    ("Blue", (0x35, 0x28, 0x79)),
    ("Yellow", (0xb8, 0xc7, 0x6f)),
    ("Orange", (0x6f, 0x4f, 0x25)),
    ("Brown", (0x43, 0x39, 0x00)),
    ("LightRed", (0x9a, 0x67, 0x59)),
    ("Gray1", (0x44, 0x44, 0x44)),
    ("Gray2", (0x6c, 0x6c, 0x6c)),
    ("LightGreen", (0x9a, 0xd2, 0x84)),
    ("LightBlue", (0x6c, 0x5e, 0xb5)),
    ("Gray3", (0x95, 0x95, 0x95)),
];

/// An RGB triple, or the "unknown" sentinel for a color that could not be
/// parsed and needs to be substituted before display.
#[derive(
    Copy, Clone, Eq, PartialEq, Hash, Debug, SerializeDisplay, DeserializeFromStr,
)]
pub enum Color {
    Rgb(u8, u8, u8),
    Unknown,
}

impl Default for Color {
    fn default() -> Self {
        Color::Rgb(0, 0, 0)
    }
}

impl Color {
    /// Look up a C64 palette entry by index 0..16.
    pub fn c64(index: usize) -> Color {
        let (_, (r, g, b)) = C64_PALETTE[index];
        Color::Rgb(r, g, b)
    }

    pub fn is_unknown(self) -> bool {
        self == Color::Unknown
    }

    /// Pick a random non-black C64 palette color.
    pub fn random_c64(rng: &mut impl Rng) -> Color {
        let (_, (r, g, b)) =
            C64_PALETTE[1..].choose(rng).expect("empty palette");
        Color::Rgb(*r, *g, *b)
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for (name, (r, g, b)) in C64_PALETTE {
            if name.eq_ignore_ascii_case(s) {
                return Ok(Color::Rgb(r, g, b));
            }
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() == 6 {
            if let Ok(n) = u32::from_str_radix(hex, 16) {
                return Ok(Color::Rgb(
                    (n >> 16) as u8,
                    (n >> 8) as u8,
                    n as u8,
                ));
            }
        }

        bail!("unknown color '{s}'")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Color::Rgb(r, g, b) => {
                // Palette colors print by name so files stay readable.
                for (name, rgb) in C64_PALETTE {
                    if rgb == (r, g, b) {
                        return write!(f, "{name}");
                    }
                }
                write!(f, "#{r:02x}{g:02x}{b:02x}")
            }
            Color::Unknown => write!(f, "Unknown"),
        }
    }
}
