use clap::{value_parser, Arg, ArgAction, Command};
use log::Level;
use playcode::evaluator::DEFAULT_MAX_TAG_DEPTH;
use playcode::runner::{self, RunOptions};
use playcode::repl;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    let matches = Command::new("playcode")
        .about("Interpreter for the PlayCode scripting language")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("file")
                .help("The PlayCode source file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the token sequence after running")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ast")
                .long("ast")
                .help("Print the parsed program in canonical form after running")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("symbols")
                .long("symbols")
                .help("Print the final symbol and tag tables after running")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-tag-depth")
                .long("max-tag-depth")
                .value_name("N")
                .help("How deeply tag invocations may nest [default: 256]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log interpreter activity to stderr (-vv for more)")
                .action(ArgAction::Count),
        )
        .get_matches();

    init_logging(matches.get_count("verbose"));

    let options = RunOptions {
        show_tokens: matches.get_flag("tokens"),
        show_ast: matches.get_flag("ast"),
        show_symbols: matches.get_flag("symbols"),
        max_tag_depth: matches
            .get_one::<usize>("max-tag-depth")
            .copied()
            .unwrap_or(DEFAULT_MAX_TAG_DEPTH),
    };

    match matches.get_one::<String>("file") {
        Some(file_path) if !matches.get_flag("interactive") => run_file(file_path, &options),
        _ => repl::start(&options),
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => return,
        1 => Level::Debug,
        _ => Level::Trace,
    };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("Warning: could not initialise logging: {}", e);
    }
}

fn run_file(path: &str, options: &RunOptions) {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        process::exit(1);
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            let filename = path.display().to_string();
            if !runner::run(&source, Some(&filename), options) {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}
