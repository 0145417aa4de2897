use bdcff::{load_caveset, save_caveset};
use cave::{Element, ObjectKind, Scheduling};
use pretty_assertions::assert_eq;
use util::Reporter;

const MINIMAL: &str = "[BDCFF]\nVersion=0.5\n[game]\nName=T\n[cave]\n\
    Name=C1\nSize=4 4\n[map]\nwwww\nw..w\nw.Pw\nwwww\n[/map]\n[/cave]\n\
    [/game]\n[/BDCFF]";

#[test]
fn minimal_load() {
    let mut report = Reporter::new();
    let set = load_caveset(MINIMAL, &mut report);

    assert_eq!(report.messages(), &[] as &[String]);
    assert_eq!(set.name, "T");
    assert_eq!(set.caves.len(), 1);

    let cave = &set.caves[0];
    assert_eq!(cave.name, "C1");
    assert_eq!((cave.w, cave.h), (4, 4));
    assert_eq!((cave.x1, cave.y1, cave.x2, cave.y2), (0, 0, 3, 3));

    let map = cave.map.as_ref().unwrap();
    assert_eq!(map[(2, 2)], Element::Inbox);
    assert_eq!(map[(0, 0)], Element::Wall);
    assert_eq!(map[(1, 1)], Element::Dirt);
}

#[test]
fn legacy_intermission_hack() {
    let text = "[BDCFF]\n[game]\nName=Old\n[cave]\nName=I1\n\
                Intermission=true\n[/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(text, &mut report);

    let cave = &set.caves[0];
    assert!(cave.intermission);
    assert_eq!((cave.w, cave.h), (40, 22));
    assert_eq!((cave.x2, cave.y2), (19, 11));

    // The occluded canvas region is walled off with the border element so
    // later random fills keep their original coordinates.
    let border = cave.initial_border;
    assert!(cave.objects.len() >= 2);
    for object in &cave.objects[..2] {
        match object.kind {
            ObjectKind::FilledRectangle { border: b, fill, .. } => {
                assert_eq!(b, border);
                assert_eq!(fill, border);
            }
            ref other => panic!("expected filled rectangle, got {other:?}"),
        }
    }
    assert!(report.had_messages());
}

#[test]
fn unknown_tag_round_trips() {
    let text = "[BDCFF]\nVersion=0.5\n[game]\nName=T\n[cave]\nName=C1\n\
                FutureThing=hello world\n[/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(text, &mut report);
    assert_eq!(
        set.caves[0].tags.get("FutureThing").map(String::as_str),
        Some("hello world")
    );

    let saved = save_caveset(&set);
    assert!(saved.contains("FutureThing=hello world"));

    let mut report = Reporter::new();
    let reloaded = load_caveset(&saved, &mut report);
    assert_eq!(
        reloaded.caves[0].tags.get("FutureThing").map(String::as_str),
        Some("hello world")
    );
}

#[test]
fn save_load_round_trip() {
    let mut report = Reporter::new();
    let mut set = load_caveset(MINIMAL, &mut report);

    // Decorate with the harder cases: highscores, long strings, scoped
    // objects, a charless element needing a generated map code.
    set.highscore.add("ada", 4200);
    set.caves[0].story = "two\nparagraphs".to_string();
    set.caves[0].highscore.add("bob", 100);
    {
        let mut object: cave::CaveObject =
            "Point=1 1 DIAMOND".parse().unwrap();
        object.levels = cave::LevelMask::from_level_numbers([2, 4]).unwrap();
        set.caves[0].objects.push(object);
    }
    if let Some(map) = &mut set.caves[0].map {
        map[(1, 2)] = Element::Player;
    }

    let saved = save_caveset(&set);
    let mut report = Reporter::new();
    let reloaded = load_caveset(&saved, &mut report);
    assert_eq!(report.messages(), &[] as &[String]);
    assert_eq!(reloaded, set);

    // Saving the reload reproduces the bytes, too.
    assert_eq!(save_caveset(&reloaded), saved);
}

#[test]
fn cavesize_two_number_form() {
    let text = "[BDCFF]\nVersion=0.5\n[game]\nName=T\nCaveSize=12 10\n\
                [cave]\nName=C\n[/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(text, &mut report);
    let cave = &set.caves[0];
    assert_eq!((cave.w, cave.h, cave.x1, cave.y1, cave.x2, cave.y2),
               (12, 10, 0, 0, 11, 9));
}

#[test]
fn cavesize_bad_arity_falls_back() {
    let text = "[BDCFF]\nVersion=0.5\n[game]\nName=T\nCaveSize=1 2 3\n\
                [cave]\nName=C\n[/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(text, &mut report);
    let cave = &set.caves[0];
    assert!(report.had_messages());
    assert_eq!((cave.w, cave.h, cave.x1, cave.y1, cave.x2, cave.y2),
               (40, 22, 0, 0, 39, 21));
}

#[test]
fn visible_only_map_accepted() {
    // A 40x22 cave with a 20x12 visible window and a map of just the
    // visible region: no warnings, rows padded with the border element.
    let mut text = String::from(
        "[BDCFF]\nVersion=0.5\n[game]\nName=T\n[cave]\nName=C\n\
         Size=40 22 0 0 19 11\n[map]\n",
    );
    for _ in 0..12 {
        text.push_str(&"w".repeat(20));
        text.push('\n');
    }
    text.push_str("[/map]\n[/cave]\n[/game]\n[/BDCFF]");

    let mut report = Reporter::new();
    let set = load_caveset(&text, &mut report);
    assert_eq!(report.messages(), &[] as &[String]);

    let map = set.caves[0].map.as_ref().unwrap();
    assert_eq!(map.width(), 40);
    assert_eq!(map[(5, 5)], Element::Wall);
    assert_eq!(map[(25, 5)], Element::SteelWall);
    assert_eq!(map[(5, 15)], Element::SteelWall);
}

#[test]
fn frame_time_wins_over_cave_delay() {
    let both = "[BDCFF]\nVersion=0.5\n[game]\nName=T\n[cave]\nName=C\n\
                CaveDelay=5\nFrameTime=100\n[/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(both, &mut report);
    assert_eq!(set.caves[0].scheduling, Scheduling::Milliseconds);
    assert_eq!(set.caves[0].frame_time, [100; cave::LEVELS]);

    let delay_only = "[BDCFF]\nVersion=0.5\n[game]\nName=T\n[cave]\nName=C\n\
                      CaveDelay=5\n[/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(delay_only, &mut report);
    assert_eq!(set.caves[0].scheduling, Scheduling::Plck);
}

#[test]
fn slime_permeability_implies_predictability() {
    let text = "[BDCFF]\nVersion=0.5\n[game]\nName=T\n[cave]\nName=C\n\
                SlimePermeability=0.5\n[/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(text, &mut report);
    let cave = &set.caves[0];
    assert!(!cave.slime_predictable);
    assert_eq!(cave.slime_permeability, 500_000);

    // On save, the attribute contradicting the final predictability setting
    // is suppressed.
    let saved = save_caveset(&set);
    assert!(saved.contains("SlimePermeability=0.50000"));
    assert!(!saved.contains("SlimePermeabilityC64="));
}

#[test]
fn snap_explosions_compat() {
    let text = "[BDCFF]\nVersion=0.5\n[game]\nName=T\n[cave]\nName=C\n\
                SnapExplosions=true\n[/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(text, &mut report);
    assert_eq!(set.caves[0].snap_element, Element::Explode1);
}

#[test]
fn game_level_defaults_copy_to_caves() {
    let text = "[BDCFF]\nVersion=0.5\n[game]\nName=T\nDiamondValue=7\n\
                [cave]\nName=A\n[/cave]\n[cave]\nName=B\nDiamondValue=9\n\
                [/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(text, &mut report);
    assert_eq!(set.caves[0].diamond_value, 7);
    assert_eq!(set.caves[1].diamond_value, 9);
}

#[test]
fn replay_section_parses() {
    let text = "[BDCFF]\nVersion=0.5\n[game]\nName=T\n[cave]\nName=C\n\
                Size=4 4\n[map]\nwwww\nw..w\nw.Pw\nwwww\n[/map]\n\
                [replay]\nLevel=2\nRandSeed=123\nPlayer=ada\nScore=60\n\
                Success=true\nMovements=r5 u2 F\n[/replay]\n\
                [replay]\nLevel=1\nRandSeed=9\n[/replay]\n\
                [/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(text, &mut report);

    // The second replay has no movements and is dropped with a warning.
    assert_eq!(set.caves[0].replays.len(), 1);
    assert!(report.messages().iter().any(|m| m.contains("no movements")));

    let replay = &set.caves[0].replays[0];
    assert_eq!(replay.level, 2);
    assert_eq!(replay.seed, 123);
    assert_eq!(replay.player_name, "ada");
    assert!(replay.success);
    assert!(replay.saved);
    assert_eq!(replay.len(), 8);
    assert_eq!(replay.movements_to_text(), "r5 u2 F");
}

#[test]
fn demo_section_attaches_to_cave() {
    let text = "[BDCFF]\nVersion=0.5\n[game]\nName=T\n[cave]\nName=C\n\
                [demo]\nr3 d2\nl1\n[/demo]\n[/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(text, &mut report);
    let replay = &set.caves[0].replays[0];
    assert_eq!(replay.player_name, "???");
    assert!(replay.success);
    assert_eq!(replay.len(), 6);

    // A demo outside any cave is dropped with a warning.
    let stray = "[BDCFF]\nVersion=0.5\n[game]\nName=T\n[demo]\nr3\n[/demo]\n\
                 [/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(stray, &mut report);
    assert!(set.caves.is_empty());
    assert!(report.had_messages());
}

#[test]
fn mapcodes_remap_characters() {
    let text = "[BDCFF]\nVersion=0.5\n[mapcodes]\nLength=1\n%=DIAMOND\n\
                [/mapcodes]\n[game]\nName=T\n[cave]\nName=C\nSize=3 3\n\
                [map]\nwww\nw%w\nwww\n[/map]\n[/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(text, &mut report);
    let map = set.caves[0].map.as_ref().unwrap();
    assert_eq!(map[(1, 1)], Element::Diamond);
}

#[test]
fn comments_and_crlf_tolerated() {
    let text = MINIMAL.replace('\n', "\r\n");
    let text = format!("; a comment\r\n{text}");
    let mut report = Reporter::new();
    let set = load_caveset(&text, &mut report);
    assert_eq!(report.messages(), &[] as &[String]);
    assert_eq!(set.caves.len(), 1);
}

#[test]
fn level_scoped_objects() {
    let text = "[BDCFF]\nVersion=0.5\n[game]\nName=T\n[cave]\nName=C\n\
                [objects]\n[Level=2,3]\nPoint=1 1 DIAMOND\n[/Level]\n\
                Point=2 2 BOULDER\n[/objects]\n[/cave]\n[/game]\n[/BDCFF]";
    let mut report = Reporter::new();
    let set = load_caveset(text, &mut report);
    let objects = &set.caves[0].objects;
    assert_eq!(objects.len(), 2);
    assert!(!objects[0].levels.contains_level(0));
    assert!(objects[0].levels.contains_level(1));
    assert_eq!(objects[1].levels, cave::LevelMask::all());
}
