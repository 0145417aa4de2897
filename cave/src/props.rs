//! Table-driven property reflection.
//!
//! Each describable structure (stored cave, caveset, replay) publishes a
//! static table mapping caveset-file identifiers to typed accessors. The
//! same table drives both attribute parsing and serialization, so an
//! identifier that loads is guaranteed to save.

use util::Reporter;

use crate::{Color, Dir, Element, Scheduling};

bitflags::bitflags! {
    #[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
    pub struct PropFlags: u8 {
        /// Emit the property even when it equals the default value.
        const ALWAYS_SAVE = 1 << 0;
        /// Never emit the property; it is loaded for compatibility only or
        /// handled explicitly by the codec.
        const DONT_SAVE = 1 << 1;
    }
}

/// Value classes a property can hold.
///
/// `Probability` is stored as parts-per-million and serialized as a 0..1
/// fraction; `Ratio` is stored as an absolute cell count and serialized as a
/// fraction of the cave area. `Effect` is an element whose serialized form
/// is `Effect=<identifier> <element>`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PropKind {
    Bool,
    Int,
    Probability,
    Ratio,
    Element,
    Effect,
    Direction,
    Scheduling,
    Color,
    Text,
    LongText,
}

/// A dynamically typed property value passing through the reflection layer.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum PropValue {
    Bool(bool),
    Int(i32),
    Element(Element),
    Dir(Dir),
    Scheduling(Scheduling),
    Color(Color),
    Text(String),
}

impl PropValue {
    pub fn bool(self) -> bool {
        match self {
            PropValue::Bool(v) => v,
            _ => panic!("property table type mismatch"),
        }
    }

    pub fn int(self) -> i32 {
        match self {
            PropValue::Int(v) => v,
            _ => panic!("property table type mismatch"),
        }
    }

    pub fn element(self) -> Element {
        match self {
            PropValue::Element(v) => v,
            _ => panic!("property table type mismatch"),
        }
    }

    pub fn dir(self) -> Dir {
        match self {
            PropValue::Dir(v) => v,
            _ => panic!("property table type mismatch"),
        }
    }

    pub fn scheduling(self) -> Scheduling {
        match self {
            PropValue::Scheduling(v) => v,
            _ => panic!("property table type mismatch"),
        }
    }

    pub fn color(self) -> Color {
        match self {
            PropValue::Color(v) => v,
            _ => panic!("property table type mismatch"),
        }
    }

    pub fn text(self) -> String {
        match self {
            PropValue::Text(v) => v,
            _ => panic!("property table type mismatch"),
        }
    }
}

/// One entry of a property table.
///
/// `count` > 1 describes a per-level array; the accessors take the slot
/// index. Several entries may share an identifier (for example the six
/// numbers of `Size`); adjacent entries with the same identifier serialize
/// onto a single line and parse from one parameter list.
#[derive(Copy, Clone)]
pub struct PropDescriptor<T: 'static> {
    pub identifier: &'static str,
    pub kind: PropKind,
    pub flags: PropFlags,
    /// Index passed to the accessors for the entry's first value slot.
    pub base: usize,
    pub count: usize,
    pub get: fn(&T, usize) -> PropValue,
    pub set: fn(&mut T, usize, PropValue),
}

impl<T> PropDescriptor<T> {
    pub fn new(
        identifier: &'static str,
        kind: PropKind,
        get: fn(&T, usize) -> PropValue,
        set: fn(&mut T, usize, PropValue),
    ) -> Self {
        PropDescriptor {
            identifier,
            kind,
            flags: PropFlags::empty(),
            base: 0,
            count: 1,
            get,
            set,
        }
    }

    /// Mark as a per-level array of five values.
    pub fn per_level(mut self) -> Self {
        self.count = crate::LEVELS;
        self
    }

    /// Address a specific slot of an array field from a one-value entry.
    pub fn at(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    pub fn always_save(mut self) -> Self {
        self.flags |= PropFlags::ALWAYS_SAVE;
        self
    }

    pub fn dont_save(mut self) -> Self {
        self.flags |= PropFlags::DONT_SAVE;
        self
    }
}

/// Parse a single parameter word into a value of the given kind.
fn parse_value(
    kind: PropKind,
    word: &str,
    ratio: i32,
) -> Result<PropValue, String> {
    match kind {
        PropKind::Bool => {
            if let Ok(n) = word.parse::<i32>() {
                return Ok(PropValue::Bool(n != 0));
            }
            if ["true", "yes", "on"].iter().any(|s| word.eq_ignore_ascii_case(s))
            {
                Ok(PropValue::Bool(true))
            } else if ["false", "no", "off"]
                .iter()
                .any(|s| word.eq_ignore_ascii_case(s))
            {
                Ok(PropValue::Bool(false))
            } else {
                Err("not a boolean".into())
            }
        }
        PropKind::Int => word
            .parse::<i32>()
            .map(PropValue::Int)
            .map_err(|_| "not a number".into()),
        PropKind::Probability => {
            let p: f64 = word.parse().map_err(|_| "not a number")?;
            if !(0.0..=1.0).contains(&p) {
                return Err("probability out of range".into());
            }
            Ok(PropValue::Int((p * 1e6 + 0.5) as i32))
        }
        PropKind::Ratio => {
            let p: f64 = word.parse().map_err(|_| "not a number")?;
            if !(0.0..=1.0).contains(&p) {
                return Err("ratio out of range".into());
            }
            Ok(PropValue::Int((p * ratio as f64 + 0.5) as i32))
        }
        PropKind::Element | PropKind::Effect => word
            .parse::<Element>()
            .map(PropValue::Element)
            .map_err(|_| format!("unknown element '{word}'")),
        PropKind::Direction => word
            .parse::<Dir>()
            .map(PropValue::Dir)
            .map_err(|_| format!("unknown direction '{word}'")),
        PropKind::Scheduling => word
            .parse::<Scheduling>()
            .map(PropValue::Scheduling)
            .map_err(|_| format!("unknown scheduling '{word}'")),
        PropKind::Color => word
            .parse::<Color>()
            .map(PropValue::Color)
            .map_err(|_| format!("unknown color '{word}'")),
        PropKind::Text | PropKind::LongText => {
            unreachable!("string properties take the whole line")
        }
    }
}

/// Apply one `identifier=parameters` attribute to a target through its
/// property table.
///
/// Returns false when the identifier is not in the table at all. Bad
/// parameters are reported and skipped, leaving the affected slots at their
/// prior values; extra parameters are reported and ignored.
pub fn set_attribute<T>(
    target: &mut T,
    table: &[PropDescriptor<T>],
    attrib: &str,
    param: &str,
    ratio: i32,
    report: &mut Reporter,
) -> bool {
    let entries: Vec<&PropDescriptor<T>> = table
        .iter()
        .filter(|d| d.identifier.eq_ignore_ascii_case(attrib))
        .collect();
    let Some(first) = entries.first() else {
        return false;
    };

    // String properties occupy the whole parameter part of the line.
    match first.kind {
        PropKind::Text => {
            (first.set)(target, 0, PropValue::Text(param.to_string()));
            return true;
        }
        PropKind::LongText => {
            (first.set)(target, 0, PropValue::Text(util::unescape(param)));
            return true;
        }
        _ => {}
    }

    let params: Vec<&str> = param.split_whitespace().collect();
    let mut paramindex = 0;

    for d in &entries {
        for slot in 0..d.count {
            let Some(word) = params.get(paramindex) else {
                // Fewer parameters than slots; earlier slots already
                // broadcast the last parsed value to the rest.
                break;
            };
            paramindex += 1;
            match parse_value(d.kind, word, ratio) {
                Ok(value) => {
                    for k in slot..d.count {
                        (d.set)(target, d.base + k, value.clone());
                    }
                }
                Err(msg) => report.warn(format!(
                    "invalid parameter '{word}' for attribute {attrib}: {msg}"
                )),
            }
        }
    }

    if paramindex < params.len() {
        report.warn(format!(
            "excess parameters for attribute '{attrib}': '{}'",
            params[paramindex]
        ));
    }

    true
}

/// Pending output line while serializing a property table.
struct LineAccum {
    identifier: Option<&'static str>,
    line: String,
    wrote_value: bool,
    should_write: bool,
}

impl LineAccum {
    fn flush(&mut self, out: &mut Vec<String>) {
        if self.identifier.take().is_some() && self.should_write {
            out.push(std::mem::take(&mut self.line));
        }
        self.line.clear();
        self.wrote_value = false;
        self.should_write = false;
    }
}

/// Serialize a property table to `identifier=values` lines.
///
/// A line is only emitted if some value differs from the default instance
/// or the entry is flagged `ALWAYS_SAVE`; colors always save. String
/// properties are emitted only when non-empty. Adjacent entries sharing an
/// identifier are gathered onto a single space-separated line.
pub fn save_properties<T>(
    out: &mut Vec<String>,
    target: &T,
    defaults: &T,
    table: &[PropDescriptor<T>],
    ratio: i32,
) {
    let mut accum = LineAccum {
        identifier: None,
        line: String::new(),
        wrote_value: false,
        should_write: false,
    };

    for d in table {
        if d.flags.contains(PropFlags::DONT_SAVE) {
            continue;
        }

        match d.kind {
            PropKind::Text => {
                accum.flush(out);
                let text = (d.get)(target, 0).text();
                if !text.is_empty() {
                    out.push(format!("{}={}", d.identifier, text));
                }
                continue;
            }
            PropKind::LongText => {
                accum.flush(out);
                let text = (d.get)(target, 0).text();
                if !text.is_empty() {
                    out.push(format!(
                        "{}={}",
                        d.identifier,
                        util::escape(&text)
                    ));
                }
                continue;
            }
            _ => {}
        }

        if accum.identifier != Some(d.identifier) {
            accum.flush(out);
            accum.identifier = Some(d.identifier);
            // Effects all serialize under the one "Effect=" identifier; the
            // table identifier becomes the first parameter instead.
            accum.line = if d.kind == PropKind::Effect {
                "Effect=".to_string()
            } else {
                format!("{}=", d.identifier)
            };
        }

        if d.flags.contains(PropFlags::ALWAYS_SAVE) {
            accum.should_write = true;
        }

        for slot in 0..d.count {
            let value = (d.get)(target, d.base + slot);
            let default = (d.get)(defaults, d.base + slot);

            if accum.wrote_value {
                accum.line.push(' ');
            }
            accum.wrote_value = true;

            match (d.kind, &value) {
                (PropKind::Bool, PropValue::Bool(v)) => {
                    accum.line.push_str(if *v { "true" } else { "false" })
                }
                (PropKind::Int, PropValue::Int(v)) => {
                    accum.line.push_str(&v.to_string())
                }
                (PropKind::Probability, PropValue::Int(v)) => accum
                    .line
                    .push_str(&format!("{:.5}", *v as f64 / 1e6)),
                (PropKind::Ratio, PropValue::Int(v)) => accum
                    .line
                    .push_str(&format!("{:.5}", *v as f64 / ratio as f64)),
                (PropKind::Element, PropValue::Element(e)) => {
                    accum.line.push_str(&e.to_string())
                }
                (PropKind::Effect, PropValue::Element(e)) => accum
                    .line
                    .push_str(&format!("{} {}", d.identifier, e)),
                (PropKind::Direction, PropValue::Dir(v)) => {
                    accum.line.push_str(&v.to_string())
                }
                (PropKind::Scheduling, PropValue::Scheduling(v)) => {
                    accum.line.push_str(&v.to_string())
                }
                (PropKind::Color, PropValue::Color(c)) => {
                    accum.line.push_str(&c.to_string())
                }
                _ => panic!("property table type mismatch"),
            }

            if d.kind == PropKind::Color || value != default {
                accum.should_write = true;
            }
        }
    }

    accum.flush(out);
}
