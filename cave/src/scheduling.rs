use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumString};

/// Clock model used to pace cave iterations.
///
/// `Milliseconds` caves state their frame time directly; the other models
/// derive per-frame delays from per-level delay constants the way the
/// original machines did.
#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Debug,
    Display,
    EnumString,
    SerializeDisplay,
    DeserializeFromStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Scheduling {
    #[default]
    #[strum(to_string = "ms")]
    Milliseconds,
    #[strum(to_string = "bd1")]
    BD1,
    #[strum(to_string = "bd2")]
    BD2,
    #[strum(to_string = "plck")]
    Plck,
    #[strum(to_string = "crdr7")]
    CrDr7,
    #[strum(to_string = "crli")]
    CrLi,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!("plck".parse::<Scheduling>().unwrap(), Scheduling::Plck);
        assert_eq!("MS".parse::<Scheduling>().unwrap(), Scheduling::Milliseconds);
        assert_eq!(Scheduling::BD1.to_string(), "bd1");
    }
}
