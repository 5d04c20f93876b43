//! Jack compiler CLI entry point.
//!
//! Usage:
//!   jackc compile <file.jack | dir>     (writes a sibling .vm per source)
//!   jackc tokens <file.jack> [-o out]   (dump the token listing as XML)
//!   jackc parse <file.jack> [-o out]    (dump the parse tree as XML)

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::{Parser, Subcommand};
use log::{error, info};
use miette::Report;

use jack_compiler::driver::{self, DriverError};
use jack_compiler::lexer::Lexer;
use jack_compiler::{analyzer, xml};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a .jack file, or every .jack file in a directory
    Compile {
        #[arg(help = "A .jack file or a directory of .jack files")]
        path: PathBuf,
    },
    /// Print the token stream of a .jack file as XML
    Tokens {
        file: PathBuf,

        #[arg(short, long, help = "Write the listing here instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Print the parse tree of a .jack file as XML
    Parse {
        file: PathBuf,

        #[arg(short, long, help = "Write the tree here instead of stdout")]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let code = match cli.command {
        Command::Compile { path } => compile(path),
        Command::Tokens { file, output } => tokens(file, output),
        Command::Parse { file, output } => parse(file, output),
    };
    process::exit(code);
}

fn compile(path: PathBuf) -> i32 {
    let sources = match driver::collect_sources(&path) {
        Ok(sources) => sources,
        Err(err) => {
            let code = match err {
                DriverError::NotJackSource(_) => 64,
                _ => 74,
            };
            eprintln!("{:?}", Report::new(err));
            return code;
        }
    };

    let mut failed = 0;
    for source in &sources {
        match driver::compile_file(source) {
            Ok(out) => info!("compiled {} -> {}", source.display(), out.display()),
            Err(err) => {
                failed += 1;
                match &err {
                    DriverError::Compile(e) => {
                        let (line, column) = e.position();
                        error!("failed to compile {}:{}:{}", source.display(), line, column);
                    }
                    _ => error!("failed to compile {}", source.display()),
                }
                eprintln!("{:?}", Report::new(err));
            }
        }
    }

    if failed > 0 {
        error!("{} of {} file(s) failed", failed, sources.len());
        65
    } else {
        0
    }
}

fn tokens(file: PathBuf, output: Option<PathBuf>) -> i32 {
    let Some(source) = read_source(&file) else {
        return 74;
    };

    let mut lexer = Lexer::new(&source);
    let tokens = lexer.scan_tokens();
    if !lexer.errors().is_empty() {
        for err in lexer.into_errors() {
            eprintln!("{:?}", Report::new(err));
        }
        return 65;
    }

    emit(&xml::tokens_to_xml(&tokens), output)
}

fn parse(file: PathBuf, output: Option<PathBuf>) -> i32 {
    let Some(source) = read_source(&file) else {
        return 74;
    };

    match analyzer::parse_tree(&source) {
        Ok(tree) => emit(&tree, output),
        Err(err) => {
            let (line, column) = err.position();
            error!("failed to parse {}:{}:{}", file.display(), line, column);
            eprintln!("{:?}", Report::new(err));
            65
        }
    }
}

fn read_source(file: &Path) -> Option<String> {
    match fs::read_to_string(file) {
        Ok(s) => Some(s),
        Err(source) => {
            let err = DriverError::Read {
                path: file.to_path_buf(),
                source,
            };
            eprintln!("{:?}", Report::new(err));
            None
        }
    }
}

/// Write a listing to `output`, or to stdout when none is given.
fn emit(listing: &str, output: Option<PathBuf>) -> i32 {
    match output {
        Some(path) => match fs::write(&path, listing) {
            Ok(()) => {
                info!("wrote {}", path.display());
                0
            }
            Err(source) => {
                let err = DriverError::Write { path, source };
                eprintln!("{:?}", Report::new(err));
                74
            }
        },
        None => {
            print!("{}", listing);
            0
        }
    }
}
