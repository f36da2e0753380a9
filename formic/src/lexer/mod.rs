//! # Lexer
//! The [Lexer] turns raw character input into a stream of [Token]s using a set of named
//! regular expressions. Scanning is longest-match: at each position every registered
//! regex is fed characters until all of them abort or a boundary is hit, and the token
//! kind whose match extends furthest wins. Among equally long matches the kind registered
//! first wins, so the result is deterministic.
//!
//! Two auxiliary mechanisms control token boundaries:
//! * *ignored characters* ([Lexer::ignore]) are consumed without being emitted, and are
//!   stripped from the content of the tokens they touch;
//! * *delimiters* ([Lexer::add_delimiter]) are regexes that force a token boundary as
//!   soon as their first character matches.
//!
//! ```
//! use formic::lexer::Lexer;
//!
//! let mut lexer = Lexer::new();
//! lexer.add_token("T_NUMBER", "[0-9]+\\.?[0-9]*|\\.[0-9]+").unwrap();
//! lexer.add_token("T_PLUS", "\\+").unwrap();
//! lexer.ignore(' ');
//!
//! let tokens = lexer.tokenize("22 + 3.14").unwrap();
//! let kinds: Vec<&str> = tokens.iter().map(|t| t.kind.as_str()).collect();
//! assert_eq!(kinds, vec!["T_NUMBER", "T_PLUS", "T_NUMBER"]);
//! assert_eq!(tokens[2].content, "3.14");
//! ```
//!
//! When no registered regex matches at some position, [Lexer::tokenize] stops and returns
//! a [LexError] naming the offending substring; the tokens gathered up to that point are
//! carried inside the error.

use log::trace;
use std::collections::HashSet;
use thiserror::Error;

use crate::regex::{Regex, RegexError};

/// A lexed token: the registered kind that matched and the matched content with ignored
/// characters stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: String,
    pub content: String,
}

impl Token {
    pub fn new(kind: &str, content: &str) -> Self {
        Self {
            kind: kind.to_string(),
            content: content.to_string(),
        }
    }
}

/// Tokenization failure: no token kind matched at the current position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown symbol '{symbol}'")]
pub struct LexError {
    /// The offending substring, with ignored characters stripped.
    pub symbol: String,
    /// The tokens recognized before the failure.
    pub tokens: Vec<Token>,
}

struct TokenRule {
    kind: String,
    regex: Regex,
}

/// A longest-match tokenizer driven by [Regex] recognizers. See the
/// [module-level documentation](crate::lexer) for the scanning rules.
#[derive(Default)]
pub struct Lexer {
    rules: Vec<TokenRule>,
    blacklist: HashSet<char>,
    delimiters: Vec<Regex>,
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token kind with its pattern. Re-registering a kind replaces its
    /// pattern but keeps its priority.
    pub fn add_token(&mut self, kind: &str, pattern: &str) -> Result<&mut Self, RegexError> {
        let regex = Regex::new(pattern)?;
        match self.rules.iter_mut().find(|rule| rule.kind == kind) {
            Some(rule) => rule.regex = regex,
            None => self.rules.push(TokenRule {
                kind: kind.to_string(),
                regex,
            }),
        }
        Ok(self)
    }

    /// Drops a registered token kind. Unknown kinds are ignored.
    pub fn remove_token(&mut self, kind: &str) -> &mut Self {
        self.rules.retain(|rule| rule.kind != kind);
        self
    }

    /// Adds a character to the ignore set: it is consumed without being emitted and acts
    /// as a token boundary once a token has started.
    pub fn ignore(&mut self, c: char) -> &mut Self {
        self.blacklist.insert(c);
        self
    }

    /// Adds a delimiter: a regex forcing a token boundary whenever its first character
    /// matches the character under the cursor.
    pub fn add_delimiter(&mut self, pattern: &str) -> Result<&mut Self, RegexError> {
        self.delimiters.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Tokenizes the whole input. On failure the error carries the tokens gathered so
    /// far together with the unknown symbol.
    pub fn tokenize(&mut self, input: &str) -> Result<Vec<Token>, LexError> {
        let chars: Vec<char> = input.chars().collect();
        let mut tokens = Vec::new();
        let mut position = 0;
        while position < chars.len() {
            match self.read_next(&chars, position) {
                Ok((next, token)) => {
                    if let Some(token) = token {
                        tokens.push(token);
                    }
                    position = next;
                }
                Err(symbol) => return Err(LexError { symbol, tokens }),
            }
        }
        Ok(tokens)
    }

    /// Scans one token starting at `start`. Returns the position to continue from and
    /// the token, if the remaining input was not just ignored characters. The error value
    /// is the unknown symbol.
    fn read_next(
        &mut self,
        chars: &[char],
        start: usize,
    ) -> Result<(usize, Option<Token>), String> {
        for rule in self.rules.iter_mut() {
            rule.regex.reset();
        }
        let mut live: Vec<usize> = (0..self.rules.len()).collect();
        let mut last_match: Vec<Option<usize>> = vec![None; self.rules.len()];
        let mut found_relevant = false;

        let mut i = start;
        while i < chars.len() {
            let c = chars[i];
            if found_relevant {
                let boundary = self.delimiters.iter_mut().any(|delimiter| {
                    delimiter.reset();
                    delimiter.read(c);
                    delimiter.matches()
                }) || self.blacklist.contains(&c);
                if boundary {
                    return self.pick(chars, start, i, &last_match);
                }
            } else if self.blacklist.contains(&c) {
                i += 1;
                continue;
            }

            found_relevant = true;
            let rules = &mut self.rules;
            live.retain(|&idx| {
                let rule = &mut rules[idx];
                rule.regex.read(c);
                if rule.regex.matches() {
                    last_match[idx] = Some(i);
                }
                !rule.regex.aborted()
            });
            if live.is_empty() {
                return self.pick(chars, start, i, &last_match);
            }
            i += 1;
        }

        if !found_relevant {
            return Ok((chars.len(), None));
        }
        self.pick(chars, start, i, &last_match)
    }

    /// Picks the longest recorded match; ties go to the kind registered first. With no
    /// recorded match at all, the scanned substring is the error.
    fn pick(
        &self,
        chars: &[char],
        start: usize,
        upto: usize,
        last_match: &[Option<usize>],
    ) -> Result<(usize, Option<Token>), String> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, m) in last_match.iter().enumerate() {
            if let Some(end) = *m {
                if best.map_or(true, |(_, best_end)| end > best_end) {
                    best = Some((idx, end));
                }
            }
        }
        let Some((rule, end)) = best else {
            return Err(self.strip(chars, start, upto));
        };
        let content = self.strip(chars, start, end);
        trace!("picked {} '{}'", self.rules[rule].kind, content);
        Ok((end + 1, Some(Token::new(&self.rules[rule].kind, &content))))
    }

    /// The substring `from..=to` with ignored characters stripped.
    fn strip(&self, chars: &[char], from: usize, to: usize) -> String {
        let to = to.min(chars.len().saturating_sub(1));
        chars[from..=to]
            .iter()
            .filter(|c| !self.blacklist.contains(*c))
            .collect()
    }
}
