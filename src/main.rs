use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use util::Reporter;

#[derive(Parser, Debug)]
#[command(version, about = "Caveset file tool for the rockfall engine")]
enum Args {
    /// Show the contents of a caveset file.
    Info {
        /// BDCFF caveset file.
        file: PathBuf,
    },
    /// Load a caveset and write it back out, normalizing the format.
    Resave {
        /// BDCFF caveset file.
        file: PathBuf,
        /// Output path; defaults to overwriting the input.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Check every stored replay against its cave.
    VerifyReplays {
        /// BDCFF caveset file.
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut report = Reporter::new();

    match args {
        Args::Info { file } => {
            let set = bdcff::load_caveset_path(&file, &mut report)?;
            let name =
                if set.name.is_empty() { "(unnamed)" } else { set.name.as_str() };
            println!("{name}");
            if !set.author.is_empty() {
                println!("  by {}", set.author);
            }
            println!(
                "  {} caves, {} lives, bonus life every {} points",
                set.caves.len(),
                set.initial_lives,
                set.bonus_life_score
            );
            for cave in &set.caves {
                let kind = if cave.intermission {
                    "intermission"
                } else {
                    "cave"
                };
                let diamonds: Vec<String> = (0..cave::LEVELS)
                    .map(|l| cave.diamonds_needed[l].to_string())
                    .collect();
                println!(
                    "  {kind} '{}' {}x{}, diamonds {}, {} replays",
                    cave.name,
                    cave.w,
                    cave.h,
                    diamonds.join("/"),
                    cave.replays.len()
                );
            }
            print_diagnostics(&report);
        }
        Args::Resave { file, out } => {
            let set = bdcff::load_caveset_path(&file, &mut report)?;
            print_diagnostics(&report);
            let out = out.unwrap_or(file);
            bdcff::save_caveset_path(&out, &set)?;
            println!("wrote {}", out.display());
        }
        Args::VerifyReplays { file } => {
            let set = bdcff::load_caveset_path(&file, &mut report)?;
            report.take();
            let bad = set.check_replays(&mut report);
            let total: usize =
                set.caves.iter().map(|c| c.replays.len()).sum();
            print_diagnostics(&report);
            println!("{} of {} replays verified", total - bad, total);
            if bad > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_diagnostics(report: &Reporter) {
    for message in report.messages() {
        eprintln!("warning: {message}");
    }
}
