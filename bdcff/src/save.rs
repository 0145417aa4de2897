use cave::{
    cave_properties, caveset_properties, props::save_properties,
    replay_properties, CaveSet, CaveStored, Element, HighScoreTable, Replay,
};
use itertools::Itertools;
use util::{HashMap, IndexMap};

use crate::BDCFF_VERSION;

/// Characters that may never become map codes: they carry syntax in the
/// format itself.
const RESERVED_MAPCODE_CHARS: &str = "<>&[]/=\\";

/// Assign a map character to every element that occurs in a map but has no
/// standard code of its own.
///
/// Replacements come from the printable ASCII range minus the reserved
/// characters and anything already bound to another element.
fn assign_mapcodes(set: &CaveSet) -> IndexMap<Element, char> {
    let mut used: HashMap<char, Element> = Element::char_table();
    let mut extra: IndexMap<Element, char> = Default::default();

    for cave in &set.caves {
        let Some(map) = &cave.map else { continue };
        for (_, &element) in map.iter() {
            if element.map_char().is_some() || extra.contains_key(&element) {
                continue;
            }
            let code = (32u8..127)
                .map(char::from)
                .find(|c| {
                    !RESERVED_MAPCODE_CHARS.contains(*c)
                        && !used.contains_key(c)
                })
                .expect("ran out of map code characters");
            used.insert(code, element);
            extra.insert(element, code);
        }
    }

    extra
}

fn write_highscore(out: &mut Vec<String>, table: &HighScoreTable) {
    if table.is_empty() {
        return;
    }
    out.push("[highscore]".to_string());
    for entry in table.iter() {
        out.push(format!("{} {}", entry.score, entry.name));
    }
    out.push("[/highscore]".to_string());
}

fn write_replay(out: &mut Vec<String>, replay: &Replay) {
    if !replay.saved {
        return;
    }
    out.push(String::new());
    out.push("[replay]".to_string());
    save_properties(out, replay, &Replay::default(), replay_properties(), 0);
    out.push(format!("Movements={}", replay.movements_to_text()));
    out.push("[/replay]".to_string());
}

fn write_cave(
    out: &mut Vec<String>,
    cave: &CaveStored,
    extra_codes: &IndexMap<Element, char>,
) {
    out.push(String::new());
    out.push("[cave]".to_string());
    write_highscore(out, &cave.highscore);

    // The permeability attributes each imply a predictability setting, so
    // whichever contradicts the cave's actual setting must not be written.
    let mut lines = Vec::new();
    save_properties(
        &mut lines,
        cave,
        &CaveStored::default(),
        cave_properties(),
        cave.area(),
    );
    let contradiction = if cave.slime_predictable {
        "SlimePermeability="
    } else {
        "SlimePermeabilityC64="
    };
    lines.retain(|line| !line.starts_with(contradiction));
    out.append(&mut lines);

    for (attrib, param) in &cave.tags {
        out.push(format!("{attrib}={param}"));
    }

    if let Some(map) = &cave.map {
        out.push(String::new());
        out.push("[map]".to_string());
        let mut row = String::with_capacity(map.width() as usize);
        for y in 0..map.height() {
            row.clear();
            for x in 0..map.width() {
                let element = map[(x, y)];
                let code = element
                    .map_char()
                    .or_else(|| extra_codes.get(&element).copied())
                    .expect("map element has no assigned character");
                row.push(code);
            }
            out.push(row.clone());
        }
        out.push("[/map]".to_string());
    }

    if !cave.objects.is_empty() {
        out.push(String::new());
        out.push("[objects]".to_string());
        for object in &cave.objects {
            let scoped = object.levels != cave::LevelMask::all();
            if scoped {
                out.push(format!(
                    "[Level={}]",
                    object.levels.level_numbers().map(|n| n.to_string()).join(",")
                ));
            }
            out.push(object.to_string());
            if scoped {
                out.push("[/Level]".to_string());
            }
        }
        out.push("[/objects]".to_string());
    }

    for replay in &cave.replays {
        write_replay(out, replay);
    }

    out.push("[/cave]".to_string());
}

/// Serialize a caveset to BDCFF text.
pub fn save_caveset(set: &CaveSet) -> String {
    let mut out: Vec<String> = Vec::new();
    let extra_codes = assign_mapcodes(set);

    out.push("[BDCFF]".to_string());
    out.push(format!("Version={BDCFF_VERSION}"));

    if !extra_codes.is_empty() {
        out.push("[mapcodes]".to_string());
        out.push("Length=1".to_string());
        for (element, code) in &extra_codes {
            out.push(format!("{code}={element}"));
        }
        out.push("[/mapcodes]".to_string());
    }

    out.push("[game]".to_string());
    write_highscore(&mut out, &set.highscore);
    save_properties(
        &mut out,
        set,
        &CaveSet::default(),
        caveset_properties(),
        0,
    );
    out.push(format!("Levels={}", cave::LEVELS));

    for cave in &set.caves {
        write_cave(&mut out, cave, &extra_codes);
    }

    out.push("[/game]".to_string());
    out.push("[/BDCFF]".to_string());

    out.join("\n") + "\n"
}
