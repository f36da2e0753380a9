use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser as ClapParser, ValueEnum};
use log::{info, warn};
use thiserror::Error;

use formic::cfg::repr::{Bnf, Didactic, GrammarRepr};
use formic::cfg::{Cfg, GrammarError};
use formic::lexer::{LexError, Lexer};
use formic::parser::{ll1::Ll1, slr1::Slr1, Parser};
use formic::regex::RegexError;

/// Parses an input file against a grammar: tokenize with the given token patterns, then
/// run an LL(1) or SLR(1) parse and print the verdict.
#[derive(Debug, ClapParser)]
#[command(name = "formic", version, about)]
struct Args {
    /// File holding the grammar, one production line per non-empty line ('#' comments)
    #[arg(short, long)]
    grammar: PathBuf,

    /// Grammar syntax
    #[arg(long, value_enum, default_value_t = Syntax::Bnf)]
    syntax: Syntax,

    /// Parsing method
    #[arg(short, long, value_enum, default_value_t = Method::Ll1)]
    method: Method,

    /// Token definition NAME=PATTERN; the name is the terminal used in the grammar
    #[arg(short, long = "token", value_name = "NAME=PATTERN")]
    tokens: Vec<String>,

    /// Characters to consume without emitting tokens
    #[arg(long, default_value = " \t\n")]
    ignore: String,

    /// Delimiter pattern forcing a token boundary
    #[arg(long = "delimiter", value_name = "PATTERN")]
    delimiters: Vec<String>,

    /// Print the token stream before parsing
    #[arg(short, long)]
    verbose: bool,

    /// File to parse
    input: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Syntax {
    Bnf,
    Didactic,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    Ll1,
    Slr1,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("bad grammar: {0}")]
    Grammar(#[from] GrammarError),
    #[error("bad token pattern: {0}")]
    Pattern(#[from] RegexError),
    #[error("token definition '{0}' is not NAME=PATTERN")]
    BadTokenDefinition(String),
    #[error("tokenization failed: {0}")]
    Lex(LexError),
    #[error("the grammar is not parseable with {0}")]
    NotParseable(&'static str),
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(accepted) => {
            if accepted {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<bool, CliError> {
    let repr: Rc<dyn GrammarRepr> = match args.syntax {
        Syntax::Bnf => Rc::new(Bnf),
        Syntax::Didactic => Rc::new(Didactic),
    };
    let mut cfg = Cfg::new(repr);
    let grammar_text = fs::read_to_string(&args.grammar)?;
    for line in grammar_text.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        cfg.add_line(line)?;
    }
    info!("loaded {} productions", cfg.len());
    if !cfg.is_consistent() {
        warn!("grammar uses undefined non-terminals");
    }

    let mut lexer = Lexer::new();
    for definition in &args.tokens {
        let (name, pattern) = definition
            .split_once('=')
            .ok_or_else(|| CliError::BadTokenDefinition(definition.clone()))?;
        lexer.add_token(name, pattern)?;
    }
    for c in args.ignore.chars() {
        lexer.ignore(c);
    }
    for pattern in &args.delimiters {
        lexer.add_delimiter(pattern)?;
    }

    let input = fs::read_to_string(&args.input)?;
    let tokens = lexer.tokenize(input.trim_end()).map_err(CliError::Lex)?;
    if args.verbose {
        for token in &tokens {
            println!("{}\t{}", token.kind, token.content);
        }
    }

    let parser: Box<dyn Parser> = match args.method {
        Method::Ll1 => Box::new(Ll1::new(&cfg)),
        Method::Slr1 => Box::new(Slr1::new(&cfg)),
    };
    if !parser.can_parse() {
        return Err(CliError::NotParseable(match args.method {
            Method::Ll1 => "LL(1)",
            Method::Slr1 => "SLR(1)",
        }));
    }

    let verdict = parser.parse(&tokens);
    if verdict.accepted {
        println!("Input accepted");
    } else {
        println!("Input rejected at token {}", verdict.error_index);
        println!("{}", verdict.error_message);
    }
    Ok(verdict.accepted)
}
