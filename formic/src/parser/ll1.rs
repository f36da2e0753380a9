//! LL(1) predictive parsing: a two-level table from (non-terminal, lookahead terminal)
//! to a production index, and a stack simulation of the leftmost derivation.

use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::cfg::{Cfg, Symbol};
use crate::lexer::Token;
use crate::parser::{ParseResult, Parser, END_OF_SENTENCE};

/// An LL(1) parser for a grammar. Construction builds the predictive table; a conflict
/// (two productions claiming the same cell) marks the grammar as not LL(1).
///
/// ```
/// use formic::cfg::Cfg;
/// use formic::lexer::Token;
/// use formic::parser::{ll1::Ll1, Parser};
///
/// let mut cfg = Cfg::bnf();
/// cfg.add_line("<E> ::= <T><E1>").unwrap();
/// cfg.add_line("<E1> ::= +<T><E1> |").unwrap();
/// cfg.add_line("<T> ::= <F><T1>").unwrap();
/// cfg.add_line("<T1> ::= *<F><T1> |").unwrap();
/// cfg.add_line("<F> ::= (<E>) | id").unwrap();
///
/// let parser = Ll1::new(&cfg);
/// assert!(parser.can_parse());
/// let tokens: Vec<Token> = ["id", "+", "id"]
///     .iter()
///     .map(|t| Token::new(t, t))
///     .collect();
/// assert!(parser.parse(&tokens).accepted);
/// ```
pub struct Ll1 {
    cfg: Cfg,
    table: HashMap<Symbol, HashMap<Symbol, usize>>,
    conflict: bool,
}

impl Ll1 {
    /// Builds the predictive table for `cfg`. For each production `A → α`, every
    /// terminal in FIRST(α) selects it; if α is nullable, so does every terminal in
    /// FOLLOW(A), plus the end marker when A is endable.
    pub fn new(cfg: &Cfg) -> Self {
        let cfg = cfg.clone();
        let mut table: HashMap<Symbol, HashMap<Symbol, usize>> = HashMap::new();
        let mut conflict = false;

        'build: for index in 0..cfg.len() {
            let name = cfg.production(index).name().to_string();
            for symbol in cfg.production_first(index) {
                let row = table.entry(Rc::from(name.as_str())).or_default();
                if row.insert(symbol.clone(), index).is_some() {
                    debug!("LL(1) conflict at ({name}, {symbol})");
                    conflict = true;
                    break 'build;
                }
            }
            if cfg.production_nullable(index) {
                let mut follow = cfg.follow(&name);
                if cfg.endable(&name) {
                    follow.insert(Rc::from(END_OF_SENTENCE));
                }
                for symbol in follow {
                    let row = table.entry(Rc::from(name.as_str())).or_default();
                    if row.insert(symbol.clone(), index).is_some() {
                        debug!("LL(1) conflict at ({name}, {symbol})");
                        conflict = true;
                        break 'build;
                    }
                }
            }
        }

        Self {
            cfg,
            table,
            conflict,
        }
    }

    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    /// Expands non-terminals on the stack top until it holds a terminal (or the end
    /// marker), following the table row selected by the lookahead.
    fn unwind(&self, stack: &mut Vec<Symbol>, lookahead: &str) -> Result<(), String> {
        let Some(top) = stack.last() else {
            return Ok(());
        };
        if &**top == END_OF_SENTENCE || self.cfg.is_terminal(top) {
            return Ok(());
        }
        let index = self
            .table
            .get(top)
            .and_then(|row| row.get(lookahead))
            .copied()
            .ok_or_else(|| format!("Unexpected token '{lookahead}'"))?;
        let rhs: Vec<Symbol> = self.cfg.production(index).rhs().to_vec();
        stack.pop();
        for symbol in rhs.iter().rev() {
            stack.push(symbol.clone());
        }
        self.unwind(stack, lookahead)
    }
}

impl Parser for Ll1 {
    fn can_parse(&self) -> bool {
        !self.conflict
    }

    /// Stack-driven predictive parse. The stack starts with the end marker and the start
    /// symbol; for each input token (plus a logical end token) the stack is unwound and
    /// the top must then match the token.
    ///
    /// # Panics
    /// Panics if the grammar is not LL(1); check [can_parse](Parser::can_parse) first.
    fn parse(&self, tokens: &[Token]) -> ParseResult {
        assert!(self.can_parse(), "grammar is not LL(1)");
        let Some(start) = self.cfg.start_symbol() else {
            return ParseResult::rejected(tokens, 0, "Grammar has no productions");
        };
        let mut stack: Vec<Symbol> = vec![Rc::from(END_OF_SENTENCE), Rc::from(start)];

        for i in 0..=tokens.len() {
            let lookahead: &str = tokens.get(i).map_or(END_OF_SENTENCE, |t| &t.kind);
            if let Err(message) = self.unwind(&mut stack, lookahead) {
                return ParseResult::rejected(tokens, i, &message);
            }
            match stack.last() {
                Some(top) if &**top == lookahead => {
                    stack.pop();
                }
                Some(top) => {
                    let message =
                        format!("Unexpected token '{lookahead}', expected '{top}'");
                    return ParseResult::rejected(tokens, i, &message);
                }
                None => {
                    let message = format!("Unexpected token '{lookahead}'");
                    return ParseResult::rejected(tokens, i, &message);
                }
            }
        }
        if !stack.is_empty() {
            let top = stack.last().expect("stack is non-empty").clone();
            let message = format!("Unexpected end of input, expected '{top}'");
            return ParseResult::rejected(tokens, tokens.len(), &message);
        }
        ParseResult::accepted()
    }
}
