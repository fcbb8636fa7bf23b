use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};
use log::error;

use mica_lang::error::MplError;
use mica_lang::{interpreter, lexer::Lexer, parser, typechecker};

#[derive(ClapParser, Debug)]
#[command(author, version, about = "Lexer, parser, type checker, and interpreter for the Mica language.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Source file to run, when no subcommand is given. Reads standard
    /// input when omitted entirely.
    file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the token stream and exit.
    Lex { file: Option<PathBuf> },
    /// Parse to an AST and print declaration names and statement counts.
    Parse { file: Option<PathBuf> },
    /// Run the lexer, parser, and type checker; report the first error.
    Check { file: Option<PathBuf> },
    /// Lex, parse, type-check, and run the program.
    Run { file: Option<PathBuf> },
}

fn main() -> ExitCode {
    simple_logger::init_with_level(log::Level::Warn).expect("logger already initialized");

    let cli = Cli::parse();

    let (mode, file) = match cli.command {
        Some(Command::Lex { file }) => ("lex", file),
        Some(Command::Parse { file }) => ("parse", file),
        Some(Command::Check { file }) => ("check", file),
        Some(Command::Run { file }) => ("run", file),
        None => ("run", cli.file),
    };

    let source = match read_source(file) {
        Ok(source) => source,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match execute(mode, &source) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn read_source(file: Option<PathBuf>) -> std::io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn execute(mode: &str, source: &str) -> Result<i32, MplError> {
    match mode {
        "lex" => {
            for token in Lexer::new(source).tokenize()? {
                println!("{token}");
            }
            Ok(0)
        }
        "parse" => {
            let tokens = Lexer::new(source).tokenize()?;
            let program = parser::parse(tokens)?;
            for decl in &program.decls {
                match decl {
                    mica_lang::ast::Decl::Function(f) => {
                        println!("fun {} ({} params, {} statements)", f.name.lexeme, f.params.len(), f.body.len())
                    }
                    mica_lang::ast::Decl::Type(t) => {
                        println!("type {} ({} fields)", t.name.lexeme, t.fields.len())
                    }
                }
            }
            Ok(0)
        }
        "check" => {
            let tokens = Lexer::new(source).tokenize()?;
            let program = parser::parse(tokens)?;
            typechecker::check(&program)?;
            println!("ok");
            Ok(0)
        }
        "run" => {
            let tokens = Lexer::new(source).tokenize()?;
            let program = parser::parse(tokens)?;
            typechecker::check(&program)?;
            interpreter::run(&program)
        }
        _ => unreachable!("clap restricts mode to the four known subcommands"),
    }
}
