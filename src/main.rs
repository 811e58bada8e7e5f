//! TPF-ModManager - command-line front end.
//!
//! A thin presentation layer over [`ModManager`]: it collects a folder path
//! from the user, prints the catalog and forwards enable/disable/reorder
//! commands. All state handling lives in the library.
//!
//! # Execution Flow
//!
//! 1. Initialize logging → `<data dir>/tpfmm/logs/tpfmm.<date>`
//! 2. Load `settings.yaml` from the per-user config directory
//! 3. If no mods path is configured and the command needs one, ask for `set-path`
//! 4. Rescan the mods directory and run the command

use anyhow::{Context, Result, bail};
use tpfmm::{APP_NAME, APP_TITLE, ModEntry, ModManager, SettingsStore, VERSION};

const NO_PATH_MESSAGE: &str = "Please set the path to Transport Fever's 'mods' folder!";

enum Command {
    Path,
    SetPath { dir: String, force: bool },
    List,
    Enable(String),
    Disable(String),
    Reorder(Vec<String>),
    Help,
    Version,
}

fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let debug_mode = take_flag(&mut args, "--debug");
    let command = parse_args(&args)?;

    match command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            println!("{} v{}", APP_TITLE, VERSION);
            return Ok(());
        }
        _ => {}
    }

    let _guard = match tpfmm::logging::default_log_dir() {
        Some(log_dir) => Some(tpfmm::logging::setup_logging_with_console(
            &log_dir, APP_NAME, debug_mode, debug_mode,
        )?),
        None => None,
    };
    tracing::info!("Starting {} v{}", APP_TITLE, VERSION);

    let store = SettingsStore::user_default().context("Failed to locate settings directory")?;
    let mut manager = ModManager::new(store);

    run(&mut manager, command)
}

fn run(manager: &mut ModManager, command: Command) -> Result<()> {
    if let Command::SetPath { dir, force } = &command {
        let mods = if *force {
            manager.set_mods_path_allowing_unconventional(dir)?
        } else {
            manager.set_mods_path(dir)?
        };
        println!("Mods folder: {}", dir_label(manager));
        print_mods(&mods);
        return Ok(());
    }

    if manager.mods_path().is_none() {
        println!("{}", NO_PATH_MESSAGE);
        println!("Run `{} set-path <folder>` first.", APP_NAME);
        return Ok(());
    }

    if let Command::Path = command {
        println!("{}", dir_label(manager));
        return Ok(());
    }

    manager.refresh()?;

    match command {
        Command::List => print_mods(&manager.mods()),
        Command::Enable(id) => {
            manager.enable(&id)?;
            println!("Enabled {id}");
        }
        Command::Disable(id) => {
            manager.disable(&id)?;
            println!("Disabled {id}");
        }
        Command::Reorder(ids) => {
            manager.reorder(&ids)?;
            print_mods(&manager.mods());
        }
        Command::Path | Command::SetPath { .. } | Command::Help | Command::Version => {}
    }

    Ok(())
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some((first, rest)) = args.split_first() else {
        return Ok(Command::List);
    };

    let command = match first.as_str() {
        "--help" | "-h" | "help" => Command::Help,
        "--version" | "-V" => Command::Version,
        "path" => Command::Path,
        "list" => Command::List,
        "set-path" => {
            let mut rest = rest.to_vec();
            let force = take_flag(&mut rest, "--force");
            match rest.as_slice() {
                [dir] => Command::SetPath {
                    dir: dir.clone(),
                    force,
                },
                _ => bail!("set-path requires exactly one folder"),
            }
        }
        "enable" => Command::Enable(single_id(first, rest)?),
        "disable" => Command::Disable(single_id(first, rest)?),
        "reorder" => Command::Reorder(rest.to_vec()),
        other => bail!("Unknown command: {other} (try --help)"),
    };
    Ok(command)
}

fn single_id(command: &str, rest: &[String]) -> Result<String> {
    match rest {
        [id] => Ok(id.clone()),
        _ => bail!("{command} requires exactly one mod id"),
    }
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|arg| arg != flag);
    args.len() != before
}

fn dir_label(manager: &ModManager) -> String {
    manager
        .mods_path()
        .map(|path| path.to_string())
        .unwrap_or_default()
}

fn print_mods(mods: &[ModEntry]) {
    if mods.is_empty() {
        println!("No mods found.");
        return;
    }
    for entry in mods {
        let marker = if entry.enabled { "x" } else { " " };
        let version = entry
            .version_label()
            .map(|v| format!(" ({v})"))
            .unwrap_or_default();
        println!(
            "[{}] {:>3}  {:<40} {}{}",
            marker, entry.load_order, entry.id, entry.display_name, version
        );
    }
}

fn print_help() {
    println!("{} v{}", APP_TITLE, VERSION);
    println!();
    println!("Usage: {} [--debug] <command>", APP_NAME);
    println!();
    println!("Commands:");
    println!("  list                      List mods in load order (default)");
    println!("  path                      Show the configured mods folder");
    println!("  set-path <dir> [--force]  Set the mods folder");
    println!("                            (--force accepts a folder not named 'mods')");
    println!("  enable <id>               Enable a mod");
    println!("  disable <id>              Disable a mod");
    println!("  reorder <id>...           Set the load order (every mod id, once)");
}
