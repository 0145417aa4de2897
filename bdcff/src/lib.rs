//! The BDCFF caveset file format.
//!
//! BDCFF is a line-oriented text format: `[section]` markers, `name=value`
//! attribute lines, plus raw map rows inside `[map]`. Parsing is lenient by
//! design; problems are reported through a [`util::Reporter`] and the loader
//! always produces a caveset. Only OS-level I/O failures are hard errors.

use std::path::Path;

use anyhow::Context;
use cave::CaveSet;
use util::Reporter;

/// Format version written to new files.
pub const BDCFF_VERSION: &str = "0.5";

mod parse;
pub use parse::load_caveset;

mod save;
pub use save::save_caveset;

/// Load a caveset file. Parse problems go to `report`; a missing or
/// unreadable file is an error.
pub fn load_caveset_path(
    path: impl AsRef<Path>,
    report: &mut Reporter,
) -> anyhow::Result<CaveSet> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(load_caveset(&contents, report))
}

/// Serialize a caveset and write it out.
pub fn save_caveset_path(
    path: impl AsRef<Path>,
    caveset: &CaveSet,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    std::fs::write(path, save_caveset(caveset))
        .with_context(|| format!("writing {}", path.display()))
}
