//! SLR(1) parsing: the LR(0) item collection, a FOLLOW-restricted action/goto table, and
//! the shift-reduce simulation.

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use log::debug;

use crate::cfg::{Cfg, Symbol};
use crate::lexer::Token;
use crate::parser::{ParseResult, Parser, END_OF_SENTENCE};

/// An LR(0) item without its annotation: a production and a dot position inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct ItemCore {
    production: usize,
    dot: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Accept,
    Shift,
    Goto,
    Reduce,
}

/// An annotated LR(0) item: what the parser does when this item is active.
#[derive(Clone, Debug)]
struct Item {
    core: ItemCore,
    action: Action,
    target: usize,
}

/// One state of the LR(0) collection: its defining kernel and the closed item list.
#[derive(Clone, Debug)]
struct Lr0State {
    kernel: BTreeSet<ItemCore>,
    items: Vec<Item>,
}

/// An SLR(1) parser for a grammar. Construction augments the grammar with
/// `S' → S EOS`, builds the LR(0) collection and fills the action/goto table, reducing
/// only under the FOLLOW set of the production's left-hand side. Any doubly-assigned
/// cell marks the grammar as not SLR(1).
///
/// ```
/// use formic::cfg::Cfg;
/// use formic::lexer::Token;
/// use formic::parser::{slr1::Slr1, Parser};
///
/// let mut cfg = Cfg::bnf();
/// cfg.add_line("<S> ::= 'a' <S> 'b' | 'a' 'b'").unwrap();
/// let parser = Slr1::new(&cfg);
/// assert!(parser.can_parse());
///
/// let tokens: Vec<Token> = "aaabbb".chars().map(|c| {
///     let s = c.to_string();
///     Token::new(&s, &s)
/// }).collect();
/// assert!(parser.parse(&tokens).accepted);
/// ```
pub struct Slr1 {
    cfg: Cfg,
    table: HashMap<usize, HashMap<Symbol, (Action, usize)>>,
    conflict: bool,
}

impl Slr1 {
    pub fn new(cfg: &Cfg) -> Self {
        let cfg = cfg.clone();
        let mut table: HashMap<usize, HashMap<Symbol, (Action, usize)>> = HashMap::new();
        let mut conflict = false;

        let start: Option<String> = cfg.start_symbol().map(str::to_string);
        let Some(start) = start else {
            return Self {
                cfg,
                table,
                conflict: true,
            };
        };

        // Augment with S' -> S EOS; the sentinel is carried as an ordinary terminal so
        // that FOLLOW propagation puts it into every endable non-terminal's set.
        let mut augmented = cfg.clone();
        let start_symbol: Symbol = Rc::from(start.as_str());
        let primed: Symbol = Rc::from(augmented.primed(&start).as_str());
        let eos: Symbol = Rc::from(END_OF_SENTENCE);
        augmented.push_production(primed, vec![start_symbol, eos.clone()]);
        let augmented_index = augmented.len() - 1;

        let states = collect(&augmented, augmented_index);
        debug!("LR(0) collection has {} states", states.len());

        for (state_index, state) in states.iter().enumerate() {
            let row = table.entry(state_index).or_default();
            for item in &state.items {
                match item.action {
                    Action::Accept => {
                        if row.contains_key(&*eos) {
                            debug!("SLR(1) accept conflict in state {state_index}");
                            conflict = true;
                        }
                        row.insert(eos.clone(), (Action::Accept, 0));
                    }
                    Action::Shift | Action::Goto => {
                        let prod = augmented.production(item.core.production);
                        let symbol = prod.rhs()[item.core.dot].clone();
                        if let Some(&(action, target)) = row.get(&symbol) {
                            if action != item.action || target != item.target {
                                debug!(
                                    "SLR(1) shift/goto conflict in state {state_index} on '{symbol}'"
                                );
                                conflict = true;
                            }
                        }
                        row.insert(symbol, (item.action, item.target));
                    }
                    Action::Reduce => {
                        let name = augmented.production(item.target).name().to_string();
                        for symbol in augmented.follow(&name) {
                            if row.contains_key(&symbol) {
                                debug!(
                                    "SLR(1) reduce conflict in state {state_index} on '{symbol}'"
                                );
                                conflict = true;
                            }
                            row.insert(symbol, (Action::Reduce, item.target));
                        }
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
}

/// Builds the LR(0) collection of the augmented grammar. States are discovered
/// breadth-first; a state whose kernel equals an existing one is reused. The worklist is
/// an index into the state vector, so growing it never invalidates anything.
fn collect(augmented: &Cfg, augmented_index: usize) -> Vec<Lr0State> {
    let initial_kernel = BTreeSet::from([ItemCore {
        production: augmented_index,
        dot: 0,
    }]);
    let mut states = vec![Lr0State {
        kernel: initial_kernel.clone(),
        items: Vec::new(),
    }];
    let mut state_by_kernel: HashMap<BTreeSet<ItemCore>, usize> =
        HashMap::from([(initial_kernel, 0)]);

    let mut pending = 0;
    while pending < states.len() {
        let cores = closure(augmented, &states[pending].kernel);

        // Group the items by their post-dot symbol, in first-seen order
        let mut group_order: Vec<Symbol> = Vec::new();
        let mut groups: HashMap<Symbol, Vec<ItemCore>> = HashMap::new();
        for core in &cores {
            let prod = augmented.production(core.production);
            if core.dot < prod.len() {
                let symbol = prod.rhs()[core.dot].clone();
                if !groups.contains_key(&symbol) {
                    group_order.push(symbol.clone());
                }
                groups.entry(symbol).or_default().push(ItemCore {
                    production: core.production,
                    dot: core.dot + 1,
                });
            }
        }

        // Allocate or reuse the successor state of each group
        let mut target_of: HashMap<Symbol, usize> = HashMap::new();
        for symbol in &group_order {
            let kernel: BTreeSet<ItemCore> = groups[symbol].iter().copied().collect();
            let target = match state_by_kernel.get(&kernel) {
                Some(&existing) => existing,
                None => {
                    let fresh = states.len();
                    state_by_kernel.insert(kernel.clone(), fresh);
                    states.push(Lr0State {
                        kernel,
                        items: Vec::new(),
                    });
                    fresh
                }
            };
            target_of.insert(symbol.clone(), target);
        }

        // Annotate every item of this state
        let mut items = Vec::with_capacity(cores.len());
        for core in cores {
            let prod = augmented.production(core.production);
            let item = if core.production == augmented_index && core.dot == 1 {
                Item {
                    core,
                    action: Action::Accept,
                    target: 0,
                }
            } else if core.dot < prod.len() {
                let symbol = &prod.rhs()[core.dot];
                let action = if &**symbol == END_OF_SENTENCE || augmented.is_terminal(symbol) {
                    Action::Shift
                } else {
                    Action::Goto
                };
                Item {
                    core,
                    action,
                    target: target_of[symbol],
                }
            } else {
                Item {
                    core,
                    action: Action::Reduce,
                    target: core.production,
                }
            };
            items.push(item);
        }
        states[pending].items = items;
        pending += 1;
    }
    states
}

/// The closure of a kernel: every `B → · γ` for a non-terminal `B` right after a dot.
/// The sentinel never expands.
fn closure(augmented: &Cfg, kernel: &BTreeSet<ItemCore>) -> Vec<ItemCore> {
    let mut cores: Vec<ItemCore> = kernel.iter().copied().collect();
    let mut seen: std::collections::HashSet<ItemCore> = cores.iter().copied().collect();
    let mut next = 0;
    while next < cores.len() {
        let core = cores[next];
        next += 1;
        let prod = augmented.production(core.production);
        if core.dot >= prod.len() {
            continue;
        }
        let symbol = &prod.rhs()[core.dot];
        if &**symbol == END_OF_SENTENCE || !augmented.is_non_terminal(symbol) {
            continue;
        }
        for &index in augmented.productions_of(symbol) {
            let candidate = ItemCore {
                production: index,
                dot: 0,
            };
            if seen.insert(candidate) {
                cores.push(candidate);
            }
        }
    }
    cores
}

impl Parser for Slr1 {
    fn can_parse(&self) -> bool {
        !self.conflict
    }

    /// Shift-reduce simulation over the action/goto table. A reduce pops one state per
    /// right-hand-side symbol and buffers the produced non-terminal; the following goto
    /// consumes the buffer, never the input.
    ///
    /// # Panics
    /// Panics if the grammar is not SLR(1); check [can_parse](Parser::can_parse) first.
    fn parse(&self, tokens: &[Token]) -> ParseResult {
        assert!(self.can_parse(), "grammar is not SLR(1)");
        let mut state_stack: Vec<usize> = vec![0];
        let mut pointer = 0;
        let mut reduced: Option<Symbol> = None;
        loop {
            let lookahead: Symbol = match &reduced {
                Some(symbol) => symbol.clone(),
                None => tokens
                    .get(pointer)
                    .map_or_else(|| Rc::from(END_OF_SENTENCE), |t| Rc::from(t.kind.as_str())),
            };
            let top = *state_stack.last().expect("state stack never runs empty");
            let row = self.table.get(&top).expect("every state has a table row");
            let Some(&(action, target)) = row.get(&lookahead) else {
                let message = format!("Unexpected token '{lookahead}'");
                return ParseResult::rejected(tokens, pointer, &message);
            };
            match action {
                Action::Accept => return ParseResult::accepted(),
                Action::Shift => {
                    state_stack.push(target);
                    pointer += 1;
                }
                Action::Goto => {
                    state_stack.push(target);
                    reduced = None;
                }
                Action::Reduce => {
                    let prod = self.cfg.production(target);
                    for _ in 0..prod.len() {
                        state_stack.pop();
                    }
                    reduced = Some(prod.lhs().clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(kinds: &[&str]) -> Vec<Token> {
        kinds.iter().map(|k| Token::new(k, k)).collect()
    }

    fn chars(input: &str) -> Vec<Token> {
        input
            .chars()
            .map(|c| {
                let s = c.to_string();
                Token::new(&s, &s)
            })
            .collect()
    }

    fn nested_ab_grammar() -> Cfg {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= 'a' <S> 'b' | 'a' 'b'").unwrap();
        cfg
    }

    #[test]
    fn accepts_nested_pairs() {
        let parser = Slr1::new(&nested_ab_grammar());
        assert!(parser.can_parse());
        assert!(parser.parse(&chars("ab")).accepted);
        assert!(parser.parse(&chars("aaabbb")).accepted);
        assert!(parser.parse(&chars("aaaaabbbbb")).accepted);
    }

    #[test]
    fn rejects_unbalanced_pairs() {
        let parser = Slr1::new(&nested_ab_grammar());
        assert!(!parser.parse(&chars("aabbb")).accepted);
        assert!(!parser.parse(&chars("aaabb")).accepted);
        assert!(!parser.parse(&chars("")).accepted);
        assert!(!parser.parse(&chars("ba")).accepted);
    }

    #[test]
    fn error_site_is_reported() {
        let parser = Slr1::new(&nested_ab_grammar());
        let result = parser.parse(&chars("abb"));
        assert!(!result.accepted);
        assert_eq!(result.error_index, 2);
    }

    #[test]
    fn handles_left_recursive_grammars() {
        // left recursion is fine bottom-up; this is the classical LR example
        let mut cfg = Cfg::bnf();
        cfg.add_line("<E> ::= <E> + <T> | <T>").unwrap();
        cfg.add_line("<T> ::= <T> * <F> | <F>").unwrap();
        cfg.add_line("<F> ::= ( <E> ) | id").unwrap();
        let parser = Slr1::new(&cfg);
        assert!(parser.can_parse());
        assert!(parser.parse(&tokens(&["id", "+", "id", "*", "id"])).accepted);
        assert!(parser.parse(&tokens(&["(", "id", "+", "id", ")", "*", "id"])).accepted);
        assert!(!parser.parse(&tokens(&["id", "+", "+", "id"])).accepted);
        assert!(!parser.parse(&tokens(&["id", "+"])).accepted);
    }

    #[test]
    fn ambiguous_grammars_conflict() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= <S><S>|a|").unwrap();
        let parser = Slr1::new(&cfg);
        assert!(!parser.can_parse());
    }

    #[test]
    fn goto_after_reduce_consumes_no_input() {
        let parser = Slr1::new(&nested_ab_grammar());
        // "ab" needs exactly one reduce of S -> a b followed by the accept; if the goto
        // consumed input the accept lookahead would be wrong
        assert!(parser.parse(&chars("ab")).accepted);
        assert!(!parser.parse(&chars("abb")).accepted);
    }

    #[test]
    fn empty_grammar_cannot_parse() {
        let cfg = Cfg::bnf();
        let parser = Slr1::new(&cfg);
        assert!(!parser.can_parse());
    }
}
