//! Grammar representation strategies. A [GrammarRepr] answers every syntax question a
//! [Cfg](crate::cfg::Cfg) has: what is a terminal, how does a production line decompose,
//! how is a production printed back. Two concrete representations are provided:
//!
//! * [Bnf]: `<X> ::= a <Y> b | c`, where non-terminals are `<...>` bracketed and
//!   terminals are bare whitespace-delimited runs or `'...'`/`"..."` quoted strings
//!   (quotes are stripped). Since brackets and quotes delimit symbols on their own,
//!   whitespace between symbols is optional: `<E1>::=+<T><E1>` works.
//! * [Didactic]: `X -> a Y b | c`, where symbols are whitespace-separated and a symbol
//!   starting with an uppercase letter is a non-terminal.

use std::fmt;
use std::rc::Rc;

use nom::bytes::complete::{tag, take_while1};
use nom::character::complete;
use nom::character::complete::multispace0;
use nom::combinator::{all_consuming, recognize, rest, verify};
use nom::sequence::{delimited, separated_pair};
use nom::{Finish, IResult};
use thiserror::Error;

/// A production line that does not parse under the active representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("malformed production line: '{0}'")]
    MalformedProduction(String),
}

/// Strategy interface for grammar syntax. Implementations must keep
/// [is_terminal](GrammarRepr::is_terminal) and
/// [is_non_terminal](GrammarRepr::is_non_terminal) pure and mutually exclusive.
pub trait GrammarRepr: fmt::Debug {
    fn is_terminal(&self, symbol: &str) -> bool {
        !self.is_non_terminal(symbol)
    }

    fn is_non_terminal(&self, symbol: &str) -> bool;

    /// Parses a production line `LHS ::= α₁ | α₂ | …` into one `(name, symbols)` pair
    /// per alternative. An empty alternative yields an empty symbol sequence (ε).
    fn decompose(&self, line: &str) -> Result<Vec<(String, Vec<String>)>, GrammarError>;

    /// Tokenizes a right-hand side into symbols.
    fn symbol_sequence(&self, input: &str) -> Vec<String>;

    /// Pretty-prints one production.
    fn readable_form(&self, name: &str, rhs: &[Rc<str>]) -> String;

    /// Strips syntactic decorations from a symbol (`<X>` becomes `X`).
    fn name<'a>(&self, symbol: &'a str) -> &'a str;

    /// The derived non-terminal minted when rewriting left recursion (`<X>` becomes
    /// `<X'>`).
    fn primed(&self, symbol: &str) -> String;
}

/// Angle-bracket BNF: `<X> ::= …`, terminals are everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bnf;

fn bnf_line(input: &str) -> IResult<&str, (&str, &str)> {
    all_consuming(separated_pair(
        recognize(delimited(
            complete::char('<'),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '\''),
            complete::char('>'),
        )),
        delimited(multispace0, tag("::="), multispace0),
        rest,
    ))(input)
}

impl GrammarRepr for Bnf {
    fn is_non_terminal(&self, symbol: &str) -> bool {
        symbol.len() > 2 && symbol.starts_with('<') && symbol.ends_with('>')
    }

    fn decompose(&self, line: &str) -> Result<Vec<(String, Vec<String>)>, GrammarError> {
        let line = line.trim();
        let (_, (head, body)) = bnf_line(line)
            .finish()
            .map_err(|_| GrammarError::MalformedProduction(line.to_string()))?;
        Ok(body
            .split('|')
            .map(|alternative| (head.to_string(), self.symbol_sequence(alternative)))
            .collect())
    }

    fn symbol_sequence(&self, input: &str) -> Vec<String> {
        let mut symbols = Vec::new();
        let mut buffer = String::new();
        let mut chars = input.chars();
        while let Some(c) = chars.next() {
            match c {
                '<' => {
                    if !buffer.is_empty() {
                        symbols.push(std::mem::take(&mut buffer));
                    }
                    let mut symbol = String::from('<');
                    for inner in chars.by_ref() {
                        symbol.push(inner);
                        if inner == '>' {
                            break;
                        }
                    }
                    symbols.push(symbol);
                }
                '\'' | '"' => {
                    if !buffer.is_empty() {
                        symbols.push(std::mem::take(&mut buffer));
                    }
                    let mut symbol = String::new();
                    for inner in chars.by_ref() {
                        if inner == c {
                            break;
                        }
                        symbol.push(inner);
                    }
                    if !symbol.is_empty() {
                        symbols.push(symbol);
                    }
                }
                c if c.is_whitespace() => {
                    if !buffer.is_empty() {
                        symbols.push(std::mem::take(&mut buffer));
                    }
                }
                c => buffer.push(c),
            }
        }
        if !buffer.is_empty() {
            symbols.push(buffer);
        }
        symbols
    }

    fn readable_form(&self, name: &str, rhs: &[Rc<str>]) -> String {
        let body: Vec<&str> = rhs.iter().map(|s| s.as_ref()).collect();
        format!("{} ::= {}", name, body.join(" "))
    }

    fn name<'a>(&self, symbol: &'a str) -> &'a str {
        if self.is_non_terminal(symbol) {
            &symbol[1..symbol.len() - 1]
        } else {
            symbol
        }
    }

    fn primed(&self, symbol: &str) -> String {
        format!("<{}'>", self.name(symbol))
    }
}

/// Didactic notation: `X -> …`, uppercase-initial symbols are non-terminals, everything
/// is whitespace-separated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Didactic;

fn didactic_line(input: &str) -> IResult<&str, (&str, &str)> {
    all_consuming(separated_pair(
        verify(
            take_while1(|c: char| !c.is_whitespace() && c != '-'),
            |head: &str| head.starts_with(|c: char| c.is_ascii_uppercase()),
        ),
        delimited(multispace0, tag("->"), multispace0),
        rest,
    ))(input)
}

impl GrammarRepr for Didactic {
    fn is_non_terminal(&self, symbol: &str) -> bool {
        symbol.starts_with(|c: char| c.is_ascii_uppercase())
    }

    fn decompose(&self, line: &str) -> Result<Vec<(String, Vec<String>)>, GrammarError> {
        let line = line.trim();
        let (_, (head, body)) = didactic_line(line)
            .finish()
            .map_err(|_| GrammarError::MalformedProduction(line.to_string()))?;
        Ok(body
            .split('|')
            .map(|alternative| (head.to_string(), self.symbol_sequence(alternative)))
            .collect())
    }

    fn symbol_sequence(&self, input: &str) -> Vec<String> {
        input.split_whitespace().map(str::to_string).collect()
    }

    fn readable_form(&self, name: &str, rhs: &[Rc<str>]) -> String {
        let body: Vec<&str> = rhs.iter().map(|s| s.as_ref()).collect();
        format!("{} -> {}", name, body.join(" "))
    }

    fn name<'a>(&self, symbol: &'a str) -> &'a str {
        symbol
    }

    fn primed(&self, symbol: &str) -> String {
        format!("{symbol}'")
    }
}
