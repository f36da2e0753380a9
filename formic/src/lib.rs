//!# formic
//!
//! `formic` is a toolkit of formal-language algorithms: deterministic finite automata
//! with minimization and Boolean algebra, regular expressions compiled to ε-NFAs,
//! longest-match lexing, context-free grammar analysis (FIRST/FOLLOW, recursion and
//! factoring diagnosis, left-recursion elimination), and LL(1)/SLR(1) parser
//! construction.
//!
//! ## Usage
//!
//! The pieces compose into a classic front-end pipeline: a [Lexer](lexer::Lexer) turns
//! characters into tokens, a [Cfg](cfg::Cfg) describes the language, and a parser built
//! from the grammar accepts or rejects the token stream with a diagnosed error site:
//!
//! ```rust
//! use formic::cfg::Cfg;
//! use formic::lexer::Lexer;
//! use formic::parser::{ll1::Ll1, Parser};
//!
//! // Tokens
//! let mut lexer = Lexer::new();
//! lexer.add_token("id", "[a-z]+").unwrap();
//! lexer.add_token("+", "\\+").unwrap();
//! lexer.add_token("*", "\\*").unwrap();
//! lexer.ignore(' ');
//!
//! // Grammar
//! let mut cfg = Cfg::bnf();
//! cfg.add_line("<E> ::= <T><E1>").unwrap();
//! cfg.add_line("<E1> ::= +<T><E1> |").unwrap();
//! cfg.add_line("<T> ::= id<T1>").unwrap();
//! cfg.add_line("<T1> ::= * id<T1> |").unwrap();
//!
//! // Parser
//! let parser = Ll1::new(&cfg);
//! assert!(parser.can_parse());
//!
//! let tokens = lexer.tokenize("speed * time + distance").unwrap();
//! assert!(parser.parse(&tokens).accepted);
//!
//! let tokens = lexer.tokenize("speed * * time").unwrap();
//! let verdict = parser.parse(&tokens);
//! assert!(!verdict.accepted);
//! assert_eq!(verdict.error_index, 2);
//! ```
//!
//! The automata layer stands on its own as well:
//!
//! ```rust
//! use formic::dfa::Dfa;
//!
//! let mut ends_in_one = Dfa::new();
//! ends_in_one.add_state("zero").add_state("one");
//! ends_in_one.add_transition("zero", "zero", '0');
//! ends_in_one.add_transition("zero", "one", '1');
//! ends_in_one.add_transition("one", "zero", '0');
//! ends_in_one.add_transition("one", "one", '1');
//! ends_in_one.accept(["one"]);
//!
//! let minimized = ends_in_one.minimized();
//! assert!(minimized.equivalent_to(&ends_in_one));
//! assert!(ends_in_one.complement().complement().equivalent_to(&ends_in_one));
//! ```
//!
//! ## Operations
//!
//! * [Building](dfa::Dfa::add_state), [running](dfa::Dfa::read) and
//!   [simplifying](dfa::Dfa::without_useless_states) DFAs
//! * [Minimizing a DFA](dfa::Dfa::minimized) by partition refinement
//! * DFA Boolean algebra: [complement](dfa::Dfa::complement),
//!   [intersection](dfa::Dfa::intersection), [union](dfa::Dfa::union),
//!   [containment](dfa::Dfa::contains) and [equivalence](dfa::Dfa::equivalent_to)
//! * [Compiling regular expressions](regex::Regex::new) and
//!   [scanning them progressively](regex::Regex::read)
//! * [Longest-match tokenization](lexer::Lexer::tokenize)
//! * Grammar analysis: [FIRST](cfg::Cfg::first), [FOLLOW](cfg::Cfg::follow),
//!   [nullability](cfg::Cfg::nullable), [left-reachability](cfg::Cfg::range),
//!   [recursion](cfg::Cfg::recursion_type) and
//!   [factoring](cfg::Cfg::non_factoring_type) diagnosis,
//!   [left-recursion elimination](cfg::Cfg::without_recursion)
//! * Parser construction: [LL(1)](parser::ll1::Ll1) and [SLR(1)](parser::slr1::Slr1)

pub mod cfg;
pub mod dfa;
pub mod index_set;
pub mod lexer;
pub mod parser;
pub mod regex;

#[cfg(test)]
mod tests;
