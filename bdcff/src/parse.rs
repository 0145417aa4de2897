use cave::{
    cave_properties, caveset_properties,
    props::{set_attribute, PropKind},
    replay_properties, CaveObject, CaveSet, CaveStored, Color, Element,
    EngineVariant, LevelMask, ObjectKind, Replay,
};
use glam::ivec2;
use rand::Rng;
use util::{CaveMap, HashMap, IndexMap, Reporter};

use crate::BDCFF_VERSION;

/// Default cave canvas: full size visible.
fn cavesize_defaults() -> [i32; 6] {
    [40, 22, 0, 0, 39, 21]
}

/// Default intermission canvas: full size with the upper left quarter
/// visible.
fn intermissionsize_defaults() -> [i32; 6] {
    [40, 22, 0, 0, 19, 11]
}

fn lookup<'a>(
    tags: &'a IndexMap<String, String>,
    attrib: &str,
) -> Option<&'a str> {
    tags.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(attrib))
        .map(|(_, v)| v.as_str())
}

fn remove_tag(tags: &mut IndexMap<String, String>, attrib: &str) {
    let key = tags
        .keys()
        .find(|k| k.eq_ignore_ascii_case(attrib))
        .cloned();
    if let Some(key) = key {
        tags.shift_remove(&key);
    }
}

/// Is the attribute meaningful inside a `[cave]` section (and therefore as
/// a `[game]` level default)?
fn is_cave_attribute(attrib: &str) -> bool {
    for compat in ["Engine", "BD1Scheduling", "SnapExplosions", "AmoebaProperties"]
    {
        if attrib.eq_ignore_ascii_case(compat) {
            return true;
        }
    }
    cave_properties()
        .iter()
        .any(|d| d.identifier.eq_ignore_ascii_case(attrib))
}

fn is_caveset_attribute(attrib: &str) -> bool {
    caveset_properties()
        .iter()
        .any(|d| d.identifier.eq_ignore_ascii_case(attrib))
}

/// Replace the cave's colors with a random C64 scheme.
fn set_random_c64_colors(cave: &mut CaveStored, rng: &mut impl Rng) {
    cave.color_border = Color::c64(0);
    cave.color0 = Color::c64(0);
    cave.color1 = Color::random_c64(rng);
    cave.color2 = Color::random_c64(rng);
    cave.color3 = Color::random_c64(rng);
    cave.color4 = cave.color3;
    cave.color5 = cave.color1;
}

/// The `Colors=` attribute comes in three-, five- and seven-token forms;
/// missing colors are derived, unparseable ones force a random scheme.
fn process_colors(cave: &mut CaveStored, param: &str, report: &mut Reporter) {
    let words: Vec<&str> = param.split_whitespace().collect();
    let color = |w: &&str| w.parse::<Color>().unwrap_or(Color::Unknown);

    let mut ok = true;
    match words.as_slice() {
        [c1, c2, c3] => {
            cave.color_border = Color::c64(0);
            cave.color0 = Color::c64(0);
            cave.color1 = color(c1);
            cave.color2 = color(c2);
            cave.color3 = color(c3);
            cave.color4 = cave.color3;
            cave.color5 = cave.color1;
        }
        [cb, c0, c1, c2, c3] => {
            cave.color_border = color(cb);
            cave.color0 = color(c0);
            cave.color1 = color(c1);
            cave.color2 = color(c2);
            cave.color3 = color(c3);
            cave.color4 = cave.color3;
            cave.color5 = cave.color1;
        }
        [cb, c0, c1, c2, c3, c4, c5] => {
            cave.color_border = color(cb);
            cave.color0 = color(c0);
            cave.color1 = color(c1);
            cave.color2 = color(c2);
            cave.color3 = color(c3);
            cave.color4 = color(c4);
            cave.color5 = color(c5);
        }
        _ => {
            report.warn(format!("invalid number of color strings: {param}"));
            ok = false;
        }
    }

    let any_unknown = [
        cave.color_border,
        cave.color0,
        cave.color1,
        cave.color2,
        cave.color3,
        cave.color4,
        cave.color5,
    ]
    .iter()
    .any(|c| c.is_unknown());

    if !ok || any_unknown {
        report.warn("created a new C64 color scheme");
        set_random_c64_colors(cave, &mut rand::rng());
    }
}

/// `Effect=name element` lines; the name is looked up among effect-typed
/// cave properties, with a handful of legacy aliases.
fn process_effect(cave: &mut CaveStored, param: &str, report: &mut Reporter) {
    let words: Vec<&str> = param.split_whitespace().collect();
    let [name, element] = words.as_slice() else {
        report.warn(format!("invalid effect specification '{param}'"));
        return;
    };

    let parse_element = |report: &mut Reporter| -> Option<Element> {
        match element.parse() {
            Ok(e) => Some(e),
            Err(_) => {
                report.warn(format!("unknown element '{element}'"));
                None
            }
        }
    };

    for d in cave_properties() {
        if d.kind == PropKind::Effect && d.identifier.eq_ignore_ascii_case(name)
        {
            if let Some(e) = parse_element(report) {
                (d.set)(cave, 0, cave::props::PropValue::Element(e));
            }
            return;
        }
    }

    // Aliases left behind by ancient memory-dump converters.
    if name.eq_ignore_ascii_case("BOUNCING_BOULDER") {
        if let Some(e) = parse_element(report) {
            cave.stone_bouncing_effect = e;
        }
    } else if name.eq_ignore_ascii_case("EXPLOSION3S") {
        if let Some(e) = parse_element(report) {
            cave.explosion_effect = e;
        }
    } else if name.eq_ignore_ascii_case("STARTING_FALING_DIAMOND") {
        if let Some(e) = parse_element(report) {
            cave.diamond_falling_effect = e;
        }
    } else if name.eq_ignore_ascii_case("DIRT") {
        if let Some(e) = parse_element(report) {
            cave.dirt_looks_like = e;
        }
    } else if name.eq_ignore_ascii_case("HEXPANDING_WALL")
        && element.eq_ignore_ascii_case("STEEL_HEXPANDING_WALL")
    {
        cave.expanding_wall_looks_like = Element::SteelWall;
    } else {
        report.warn(format!("invalid effect name '{name}'"));
    }
}

/// Apply one attribute to a cave, going through the compatibility special
/// cases before the property table.
fn apply_cave_attribute(
    cave: &mut CaveStored,
    attrib: &str,
    param: &str,
    report: &mut Reporter,
) -> bool {
    if attrib.eq_ignore_ascii_case("SnapExplosions") {
        if param.eq_ignore_ascii_case("true") {
            cave.snap_element = Element::Explode1;
        } else if param.eq_ignore_ascii_case("false") {
            cave.snap_element = Element::Space;
        } else {
            report.warn(format!("invalid param for '{attrib}': '{param}'"));
        }
        return true;
    }

    if attrib.eq_ignore_ascii_case("BD1Scheduling") {
        if param.eq_ignore_ascii_case("true")
            && cave.scheduling == cave::Scheduling::Plck
        {
            cave.scheduling = cave::Scheduling::BD1;
        }
        return true;
    }

    if attrib.eq_ignore_ascii_case("Engine") {
        match param.parse::<EngineVariant>() {
            Ok(engine) => cave.set_engine_defaults(engine),
            Err(_) => report.warn(format!(
                "invalid parameter '{param}' for attribute {attrib}"
            )),
        }
        return true;
    }

    if attrib.eq_ignore_ascii_case("AmoebaProperties") {
        let words: Vec<&str> = param.split_whitespace().collect();
        if let [too_big, enclosed] = words.as_slice() {
            match (too_big.parse(), enclosed.parse()) {
                (Ok(a), Ok(b)) => {
                    cave.amoeba_too_big_effect = a;
                    cave.amoeba_enclosed_effect = b;
                }
                _ => report.warn(format!(
                    "invalid elements for '{attrib}': '{param}'"
                )),
            }
        } else {
            report.warn(format!("invalid param for '{attrib}': '{param}'"));
        }
        return true;
    }

    if attrib.eq_ignore_ascii_case("Colors") {
        process_colors(cave, param, report);
        return true;
    }

    set_attribute(
        cave,
        cave_properties(),
        attrib,
        param,
        cave.area(),
        report,
    )
}

/// Process the attributes collected for one cave, in dependency order, then
/// read its map. Consumed tags are removed; the remainder is left for the
/// caller to treat as unknown.
#[allow(clippy::too_many_arguments)]
fn cave_process_tags(
    cave: &mut CaveStored,
    tags: &mut IndexMap<String, String>,
    map_lines: &[String],
    cavesize: &[i32; 6],
    intermissionsize: &[i32; 6],
    char_map: &HashMap<char, Element>,
    report: &mut Reporter,
) {
    // Cave name first, so later problems can be reported in its context.
    if let Some(name) = lookup(tags, "Name") {
        let name = name.to_string();
        apply_cave_attribute(cave, "Name", &name, report);
    }
    if cave.name.is_empty() {
        report.set_context("<unnamed cave>");
    } else {
        report.set_context(format!("Cave '{}'", cave.name));
    }

    // The engine preset rewrites many fields, so it must not clobber
    // explicitly given attributes: process it before everything else.
    if let Some(engine) = lookup(tags, "Engine") {
        let engine = engine.to_string();
        apply_cave_attribute(cave, "Engine", &engine, report);
        remove_tag(tags, "Engine");
    }

    // Intermission status decides which size defaults apply.
    if let Some(intermission) = lookup(tags, "Intermission") {
        let intermission = intermission.to_string();
        apply_cave_attribute(cave, "Intermission", &intermission, report);
        remove_tag(tags, "Intermission");
    }
    let size = if cave.intermission {
        intermissionsize
    } else {
        cavesize
    };
    cave.w = size[0];
    cave.h = size[1];
    cave.x1 = size[2];
    cave.y1 = size[3];
    cave.x2 = size[4];
    cave.y2 = size[5];

    // Size before anything ratio-typed; ratios scale by the cave area. The
    // two-number form means the whole canvas is visible.
    if let Some(size) = lookup(tags, "Size") {
        let mut parsed = [cave.w, cave.h, cave.x1, cave.y1, cave.x2, cave.y2];
        let prior = parsed;
        let size = size.to_string();
        process_size_attribute(&mut parsed, prior, "Size", &size, report);
        [cave.w, cave.h, cave.x1, cave.y1, cave.x2, cave.y2] = parsed;
        remove_tag(tags, "Size");
    }
    // Keep the visible window inside the canvas whatever the file said.
    cave.x2 = cave.x2.clamp(0, cave.w - 1);
    cave.y2 = cave.y2.clamp(0, cave.h - 1);
    cave.x1 = cave.x1.clamp(0, cave.x2);
    cave.y1 = cave.y1.clamp(0, cave.y2);

    // Which permeability form the file uses implies predictability; the
    // values themselves are applied below.
    if lookup(tags, "SlimePermeability").is_some() {
        cave.slime_predictable = false;
    }
    if lookup(tags, "SlimePermeabilityC64").is_some() {
        cave.slime_predictable = true;
    }

    // CaveDelay switches milliseconds scheduling to PLCK, but an explicit
    // FrameTime always wins and forces milliseconds.
    if lookup(tags, "CaveDelay").is_some()
        && cave.scheduling == cave::Scheduling::Milliseconds
    {
        cave.scheduling = cave::Scheduling::Plck;
    }
    if lookup(tags, "FrameTime").is_some() {
        cave.scheduling = cave::Scheduling::Milliseconds;
    }

    // Everything else, in file order.
    let pending: Vec<(String, String)> =
        tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    for (attrib, param) in pending {
        if apply_cave_attribute(cave, &attrib, &param, report) {
            remove_tag(tags, &attrib);
        }
    }

    if !map_lines.is_empty() {
        let visible_h = cave.y2 - cave.y1 + 1;
        let visible_w = cave.x2 - cave.x1 + 1;
        if map_lines.len() as i32 != cave.h
            && map_lines.len() as i32 != visible_h
        {
            report.warn(format!(
                "map error: cave height={} ({} visible), map height={}",
                cave.h,
                visible_h,
                map_lines.len()
            ));
        }

        // Short rows and missing rows stay filled with the border element.
        let mut map = CaveMap::new(cave.w, cave.h, cave.initial_border);
        for (y, row) in map_lines.iter().enumerate() {
            if y as i32 >= cave.h {
                break;
            }
            let len = row.chars().count() as i32;
            if len != cave.w && len != visible_w {
                report.warn(format!(
                    "map error in row {y}: cave width={} ({visible_w} \
                     visible), map width={len}",
                    cave.w
                ));
            }
            for (x, c) in row.chars().enumerate() {
                if x as i32 >= cave.w {
                    break;
                }
                let element = match char_map.get(&c) {
                    Some(&e) => e,
                    None => {
                        report.warn(format!("unknown map character '{c}'"));
                        Element::Unknown
                    }
                };
                map[(x as i32, y as i32)] = element;
            }
        }
        cave.map = Some(map);
    }
}

fn process_replay_tags(
    replay: &mut Replay,
    tags: &mut IndexMap<String, String>,
    report: &mut Reporter,
) {
    for (attrib, param) in std::mem::take(tags) {
        if attrib.eq_ignore_ascii_case("Movements") {
            replay.append_movements(&param);
        } else if !set_attribute(
            replay,
            replay_properties(),
            &attrib,
            &param,
            0,
            report,
        ) {
            report.warn(format!("unknown replay tag '{attrib}'"));
        }
    }
}

/// Parse a two- or six-number size attribute into a size array. Any other
/// arity resets to the given defaults with a warning.
fn process_size_attribute(
    target: &mut [i32; 6],
    defaults: [i32; 6],
    attrib: &str,
    param: &str,
    report: &mut Reporter,
) {
    let numbers: Vec<i32> = param
        .split_whitespace()
        .map_while(|w| w.parse().ok())
        .collect();
    match numbers.as_slice() {
        [w, h] => *target = [*w, *h, 0, 0, *w - 1, *h - 1],
        [w, h, x1, y1, x2, y2] => *target = [*w, *h, *x1, *y1, *x2, *y2],
        _ => {
            *target = defaults;
            report.warn(format!("invalid {attrib} tag: '{param}'"));
        }
    }
}

/// Parse BDCFF text into a caveset.
///
/// Never fails: anything unreadable is reported and skipped, unknown cave
/// attributes are preserved for round-tripping. Check
/// [`Reporter::had_messages`] to see whether the file was clean.
pub fn load_caveset(contents: &str, report: &mut Reporter) -> CaveSet {
    let mut set = CaveSet::default();

    let mut cavesize = cavesize_defaults();
    let mut intermissionsize = intermissionsize_defaults();
    let mut char_map = Element::char_table();

    // Attributes in [game] that are cave defaults collect in `tags` until
    // the first [cave]; inside a cave, its attributes collect there too.
    let mut tags: IndexMap<String, String> = Default::default();
    let mut replay_tags: IndexMap<String, String> = Default::default();
    let mut map_lines: Vec<String> = Vec::new();
    let mut version = String::from("0.32");
    let mut levels = LevelMask::all();

    // `[game]` attributes land in the default cave, which every following
    // [cave] starts as a copy of.
    let mut default_cave = CaveStored::default();
    let mut current: Option<CaveStored> = None;

    let mut reading_map = false;
    let mut reading_mapcodes = false;
    let mut reading_highscore = false;
    let mut reading_objects = false;
    let mut reading_demo = false;
    let mut reading_replay = false;

    for (lineno, raw) in contents.split('\n').enumerate() {
        report.set_context(format!("Line {}", lineno + 1));

        let line = raw.replace('\r', "");
        if line.is_empty() {
            continue;
        }

        // Comment lines; inside [map] a row may legitimately start with a
        // semicolon.
        if !reading_map && line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            let section = line.trim();
            let is = |name: &str| section.eq_ignore_ascii_case(name);

            if is("[cave]") {
                if !map_lines.is_empty() {
                    report.warn(
                        "new [cave] section, but already read some map lines",
                    );
                    map_lines.clear();
                }
                // Any pending [game] level defaults get baked into the
                // default cave before it is copied.
                cave_process_tags(
                    &mut default_cave,
                    &mut tags,
                    &[],
                    &cavesize,
                    &intermissionsize,
                    &char_map,
                    report,
                );
                current = Some(default_cave.clone());
            } else if is("[/cave]") {
                match current.take() {
                    Some(mut cave) => {
                        cave_process_tags(
                            &mut cave,
                            &mut tags,
                            &map_lines,
                            &cavesize,
                            &intermissionsize,
                            &char_map,
                            report,
                        );
                        for (attrib, param) in tags.drain(..) {
                            report.warn(format!("unknown tag '{attrib}'"));
                            cave.tags.insert(attrib, param);
                        }
                        set.caves.push(cave);
                    }
                    None => report.warn("[/cave] without [cave]"),
                }
                map_lines.clear();
            } else if is("[map]") {
                reading_map = true;
                if !map_lines.is_empty() {
                    report.warn(
                        "new [map] section, but already read some map lines",
                    );
                    map_lines.clear();
                }
            } else if is("[/map]") {
                reading_map = false;
            } else if is("[mapcodes]") {
                reading_mapcodes = true;
            } else if is("[/mapcodes]") {
                reading_mapcodes = false;
            } else if is("[highscore]") {
                reading_highscore = true;
            } else if is("[/highscore]") {
                reading_highscore = false;
            } else if is("[objects]") {
                reading_objects = true;
            } else if is("[/objects]") {
                reading_objects = false;
            } else if is("[demo]") {
                reading_demo = true;
                match &mut current {
                    Some(cave) => {
                        let replay = Replay {
                            saved: true,
                            // Shipped demos are taken to be winning runs.
                            success: true,
                            player_name: "???".to_string(),
                            ..Default::default()
                        };
                        cave.replays.push(replay);
                    }
                    None => {
                        report.warn("[demo] section must be in [cave] section")
                    }
                }
            } else if is("[/demo]") {
                reading_demo = false;
            } else if is("[replay]") {
                reading_replay = true;
            } else if is("[/replay]") {
                reading_replay = false;
                let mut replay = Replay {
                    saved: true,
                    ..Default::default()
                };
                process_replay_tags(&mut replay, &mut replay_tags, report);
                if replay.is_empty() {
                    report.warn("no movements in replay");
                } else {
                    match &mut current {
                        Some(cave) => cave.replays.push(replay),
                        None => {
                            report.warn("[replay] outside of a [cave]")
                        }
                    }
                }
            } else if section
                .get(..7)
                .is_some_and(|s| s.eq_ignore_ascii_case("[level="))
            {
                let numbers: Vec<i32> = section[7..]
                    .trim_end_matches(']')
                    .split(',')
                    .map_while(|w| w.trim().parse().ok())
                    .collect();
                levels = match LevelMask::from_level_numbers(
                    numbers.iter().copied(),
                ) {
                    Some(mask) if !numbers.is_empty() => mask,
                    _ => {
                        report.warn(format!("invalid levels tag: {section}"));
                        LevelMask::all()
                    }
                };
            } else if is("[/level]") {
                levels = LevelMask::all();
            } else if is("[game]")
                || is("[/game]")
                || is("[BDCFF]")
                || is("[/BDCFF]")
            {
                // Structure markers with nothing to do.
            } else {
                report.warn(format!("unknown section: '{section}'"));
            }
            continue;
        }

        if reading_map {
            // Raw, untrimmed: map rows may begin or end with spaces.
            map_lines.push(line);
            continue;
        }

        let line = line.trim();

        if reading_highscore {
            match line.split_once(' ') {
                Some((score, name)) => match score.parse::<i32>() {
                    Ok(score) => {
                        let table = match &mut current {
                            Some(cave) => &mut cave.highscore,
                            None => &mut set.highscore,
                        };
                        table.add(name, score);
                    }
                    Err(_) => report.warn("highscore format incorrect"),
                },
                None => report.warn("highscore format incorrect"),
            }
            continue;
        }

        if reading_demo {
            // Bare movement text, accumulated into the [demo] replay.
            if let Some(cave) = &mut current {
                if let Some(replay) = cave.replays.last_mut() {
                    replay.append_movements(line);
                }
            }
            continue;
        }

        if reading_objects {
            match line.parse::<CaveObject>() {
                Ok(mut object) => {
                    object.levels = levels;
                    match &mut current {
                        Some(cave) => cave.objects.push(object),
                        None => report
                            .warn("drawing object outside of a [cave]"),
                    }
                }
                Err(e) => {
                    report.warn(format!("invalid object specification: {e}"))
                }
            }
            continue;
        }

        if let Some((attrib, param)) = line.split_once('=') {
            let attrib = attrib.trim();
            let param = param.trim();

            if reading_replay {
                replay_tags.insert(attrib.to_string(), param.to_string());
            } else if reading_mapcodes {
                if attrib.eq_ignore_ascii_case("Length") {
                    if param != "1" {
                        report.warn(
                            "only one-character map codes are supported",
                        );
                    }
                } else if let Some(code) = attrib.chars().next() {
                    let element = match param.parse() {
                        Ok(e) => e,
                        Err(_) => {
                            report.warn(format!(
                                "unknown element '{param}' in mapcodes"
                            ));
                            Element::Unknown
                        }
                    };
                    char_map.insert(code, element);
                }
            } else if attrib.eq_ignore_ascii_case("Version") {
                version = param.to_string();
            } else if attrib.eq_ignore_ascii_case("Caves")
                || attrib.eq_ignore_ascii_case("Levels")
            {
                // Some files state their cave and level counts; implied by
                // the content here.
            } else if attrib.eq_ignore_ascii_case("CaveSize") {
                process_size_attribute(
                    &mut cavesize,
                    cavesize_defaults(),
                    "CaveSize",
                    param,
                    report,
                );
            } else if attrib.eq_ignore_ascii_case("IntermissionSize") {
                process_size_attribute(
                    &mut intermissionsize,
                    intermissionsize_defaults(),
                    "IntermissionSize",
                    param,
                    report,
                );
            } else if attrib.eq_ignore_ascii_case("Effect") {
                let target = current.as_mut().unwrap_or(&mut default_cave);
                process_effect(target, param, report);
            } else if current.is_some() {
                // Cave attributes are collected and processed together at
                // [/cave], where ordering constraints are applied.
                tags.insert(attrib.to_string(), param.to_string());
            } else if is_caveset_attribute(attrib) {
                set_attribute(
                    &mut set,
                    caveset_properties(),
                    attrib,
                    param,
                    0,
                    report,
                );
            } else if is_cave_attribute(attrib) {
                // A [game] level default for every cave that follows.
                tags.insert(attrib.to_string(), param.to_string());
            } else {
                report.warn(format!("invalid attribute for [game]: '{attrib}'"));
            }
            continue;
        }

        report.warn(format!("cannot parse line: {line}"));
    }

    if let Some(mut cave) = current.take() {
        report.warn("missing [/cave] at end of file");
        cave_process_tags(
            &mut cave,
            &mut tags,
            &map_lines,
            &cavesize,
            &intermissionsize,
            &char_map,
            report,
        );
        for (attrib, param) in tags.drain(..) {
            cave.tags.insert(attrib, param);
        }
        set.caves.push(cave);
        map_lines.clear();
    }
    if !map_lines.is_empty() {
        report.set_context("end of file");
        report.warn("still have some map lines read");
    }
    report.clear_context();

    // Files older than BDCFF 0.5 omit sizes: intermissions were authored on
    // a full 40x22 canvas with only the upper left 20x12 visible, and the
    // occluded band must be walled off so random fills keep their original
    // coordinates.
    if version == "0.32" {
        report.warn("no BDCFF version, or 0.32; \
                     using unspecified-intermission-size hack");
        for cave in &mut set.caves {
            if cave.intermission && cave.map.is_none() {
                cave.w = 40;
                cave.h = 22;
                cave.x1 = 0;
                cave.y1 = 0;
                cave.x2 = 19;
                cave.y2 = 11;

                let covers = [
                    ObjectKind::FilledRectangle {
                        p1: ivec2(0, 11),
                        p2: ivec2(39, 21),
                        border: cave.initial_border,
                        fill: cave.initial_border,
                    },
                    ObjectKind::FilledRectangle {
                        p1: ivec2(19, 0),
                        p2: ivec2(39, 21),
                        border: cave.initial_border,
                        fill: cave.initial_border,
                    },
                ];
                for kind in covers {
                    cave.objects.insert(0, CaveObject::new(kind));
                }
            }
        }
    } else if version != BDCFF_VERSION {
        report.warn(format!(
            "BDCFF version {version}, loaded caveset may have errors"
        ));
    }

    set.check_replays(report);

    set
}
