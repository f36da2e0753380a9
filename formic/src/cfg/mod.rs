//! # Context-free grammars
//! The [Cfg] struct holds an ordered sequence of [Production]s together with the indexes
//! and caches needed by the grammar algorithms: nullability, FIRST and FOLLOW sets,
//! left-reachability ([range](Cfg::range)), left-recursion and factoring-conflict
//! classification, and direct left-recursion elimination.
//!
//! How production lines are written is not fixed: a [Cfg] holds a shared
//! [GrammarRepr](repr::GrammarRepr) strategy, chosen at construction, that classifies
//! symbols and parses/pretty-prints productions. [Cfg::bnf] uses `<X> ::= …` lines,
//! [Cfg::didactic] uses `X -> …` lines with uppercase-initial non-terminals.
//!
//! ```
//! use formic::cfg::Cfg;
//!
//! let mut cfg = Cfg::bnf();
//! cfg.add_line("<E> ::= <T><E1>").unwrap();
//! cfg.add_line("<E1> ::= +<T><E1> |").unwrap();
//! cfg.add_line("<T> ::= <F><T1>").unwrap();
//! cfg.add_line("<T1> ::= *<F><T1> |").unwrap();
//! cfg.add_line("<F> ::= (<E>) | id").unwrap();
//!
//! assert!(cfg.is_consistent());
//! assert_eq!(cfg.first("<E>"), ["(", "id"].iter().map(|s| (*s).into()).collect());
//! assert!(cfg.nullable("<E1>"));
//! assert!(!cfg.nullable("<E>"));
//! assert_eq!(cfg.follow("<E>"), [")"].iter().map(|s| (*s).into()).collect());
//! assert!(cfg.endable("<E>"));
//! ```
//!
//! ## Caching
//! FIRST/nullability and FOLLOW/endability are computed lazily by the `&self` query
//! methods and memoized behind an interior-mutable cell; any mutation
//! ([add](Cfg::add), [add_line](Cfg::add_line), [clear](Cfg::clear)) invalidates both
//! cache generations. Queries after a mutation therefore always agree with a fresh
//! recomputation.
//!
//! The end-of-input sentinel is carried as `"$"` while FOLLOW sets are computed, and is
//! then split off: [Cfg::follow] never contains it, and [Cfg::endable] answers whether
//! it was there.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use log::trace;

pub mod repr;

pub use repr::GrammarError;
use repr::{Bnf, Didactic, GrammarRepr};

/// Grammar symbols are opaque interned strings; identity is string equality.
pub type Symbol = Rc<str>;

/// The end-of-string sentinel used while FOLLOW sets are solved.
const END_OF_STRING: &str = "$";

/// One production: a non-terminal name and a possibly empty sequence of symbols.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Production {
    name: Symbol,
    rhs: Vec<Symbol>,
}

impl Production {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn lhs(&self) -> &Symbol {
        &self.name
    }

    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }
}

/// How a non-terminal refers back to itself (left recursion) or how its alternatives
/// collide (factoring): directly, through other non-terminals, or not at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceType {
    None,
    Direct,
    Indirect,
}

#[derive(Clone, Debug, Default)]
struct Caches {
    first_valid: bool,
    follow_valid: bool,
    nullable_by_symbol: HashMap<Symbol, bool>,
    production_first: Vec<HashSet<Symbol>>,
    production_nullable: Vec<bool>,
    follow_sets: HashMap<Symbol, HashSet<Symbol>>,
    endable: HashSet<Symbol>,
}

/// A context-free grammar. See the [module-level documentation](crate::cfg) for an
/// overview of the operations.
#[derive(Clone, Debug)]
pub struct Cfg {
    repr: Rc<dyn GrammarRepr>,
    productions: Vec<Production>,
    by_name: HashMap<Symbol, Vec<usize>>,
    lhs_order: Vec<Symbol>,
    non_terminals: HashSet<Symbol>,
    terminals: HashSet<Symbol>,
    caches: RefCell<Caches>,
}

impl Default for Cfg {
    fn default() -> Self {
        Self::bnf()
    }
}

impl Cfg {
    /// Creates an empty grammar using the given representation. The representation is
    /// shared, so several grammars can hold the same one.
    pub fn new(repr: Rc<dyn GrammarRepr>) -> Self {
        Self {
            repr,
            productions: Vec::new(),
            by_name: HashMap::new(),
            lhs_order: Vec::new(),
            non_terminals: HashSet::new(),
            terminals: HashSet::new(),
            caches: RefCell::new(Caches::default()),
        }
    }

    /// An empty grammar in angle-bracket BNF (`<X> ::= …`).
    pub fn bnf() -> Self {
        Self::new(Rc::new(Bnf))
    }

    /// An empty grammar in didactic notation (`X -> …`).
    pub fn didactic() -> Self {
        Self::new(Rc::new(Didactic))
    }

    /// Adds one production with an explicit left-hand side; the right-hand side is
    /// tokenized by the representation.
    ///
    /// # Panics
    /// Panics if `name` is not a non-terminal under the grammar's representation.
    pub fn add(&mut self, name: &str, rhs: &str) -> &mut Self {
        assert!(
            self.repr.is_non_terminal(name),
            "'{name}' is not a non-terminal"
        );
        let symbols = self
            .repr
            .symbol_sequence(rhs)
            .into_iter()
            .map(Rc::from)
            .collect();
        self.push_production(Rc::from(name), symbols);
        self
    }

    /// Parses a full production line (`<X> ::= α | β`) and adds every alternative.
    pub fn add_line(&mut self, line: &str) -> Result<&mut Self, GrammarError> {
        for (name, symbols) in self.repr.decompose(line)? {
            let rhs = symbols.into_iter().map(Rc::from).collect();
            self.push_production(Rc::from(name), rhs);
        }
        Ok(self)
    }

    pub(crate) fn push_production(&mut self, name: Symbol, rhs: Vec<Symbol>) {
        for symbol in &rhs {
            if self.repr.is_terminal(symbol) {
                self.terminals.insert(symbol.clone());
            } else {
                self.non_terminals.insert(symbol.clone());
            }
        }
        self.non_terminals.insert(name.clone());
        if !self.by_name.contains_key(&name) {
            self.lhs_order.push(name.clone());
        }
        self.by_name
            .entry(name.clone())
            .or_default()
            .push(self.productions.len());
        self.productions.push(Production { name, rhs });
        self.invalidate();
    }

    /// Removes every production.
    pub fn clear(&mut self) {
        self.productions.clear();
        self.by_name.clear();
        self.lhs_order.clear();
        self.non_terminals.clear();
        self.terminals.clear();
        self.invalidate();
    }

    /// The number of productions.
    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    pub fn production(&self, index: usize) -> &Production {
        &self.productions[index]
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// The indexes of the productions defining `name`, in insertion order.
    pub fn productions_of(&self, name: &str) -> &[usize] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The left-hand side of the first-added production, which acts as the start symbol.
    pub fn start_symbol(&self) -> Option<&str> {
        self.productions.first().map(|prod| prod.name())
    }

    pub fn non_terminals(&self) -> &HashSet<Symbol> {
        &self.non_terminals
    }

    pub fn terminals(&self) -> &HashSet<Symbol> {
        &self.terminals
    }

    pub fn is_terminal(&self, symbol: &str) -> bool {
        self.repr.is_terminal(symbol)
    }

    pub fn is_non_terminal(&self, symbol: &str) -> bool {
        self.repr.is_non_terminal(symbol)
    }

    pub(crate) fn primed(&self, symbol: &str) -> String {
        self.repr.primed(symbol)
    }

    pub fn to_readable(&self, index: usize) -> String {
        let prod = &self.productions[index];
        self.repr.readable_form(&prod.name, &prod.rhs)
    }

    /// Checks that every non-terminal used in a right-hand side is defined by at least
    /// one production.
    pub fn is_consistent(&self) -> bool {
        let defined: HashSet<&Symbol> = self.productions.iter().map(|prod| &prod.name).collect();
        self.productions.iter().all(|prod| {
            prod.rhs
                .iter()
                .all(|symbol| self.repr.is_terminal(symbol) || defined.contains(symbol))
        })
    }

    /// FIRST of a symbol sequence: the terminals that can begin a derivation of it.
    pub fn first(&self, sequence: &str) -> HashSet<Symbol> {
        let symbols = self.intern_sequence(sequence);
        self.first_of(&symbols)
    }

    /// FIRST of an already tokenized sequence.
    pub fn first_of(&self, symbols: &[Symbol]) -> HashSet<Symbol> {
        self.update_first();
        let caches = self.caches.borrow();
        let mut result = HashSet::new();
        for symbol in symbols {
            if self.repr.is_terminal(symbol) {
                result.insert(symbol.clone());
                break;
            }
            if let Some(indexes) = self.by_name.get(symbol) {
                for &index in indexes {
                    result.extend(caches.production_first[index].iter().cloned());
                }
            }
            if !caches.nullable_by_symbol.get(symbol).copied().unwrap_or(false) {
                break;
            }
        }
        result
    }

    /// Checks if a symbol sequence can derive the empty string.
    pub fn nullable(&self, sequence: &str) -> bool {
        let symbols = self.intern_sequence(sequence);
        self.update_first();
        let caches = self.caches.borrow();
        symbols.iter().all(|symbol| {
            !self.repr.is_terminal(symbol)
                && caches.nullable_by_symbol.get(symbol).copied().unwrap_or(false)
        })
    }

    /// The cached FIRST set of one production.
    pub fn production_first(&self, index: usize) -> HashSet<Symbol> {
        self.update_first();
        self.caches.borrow().production_first[index].clone()
    }

    /// Whether one production can derive the empty string.
    pub fn production_nullable(&self, index: usize) -> bool {
        self.update_first();
        self.caches.borrow().production_nullable[index]
    }

    /// FOLLOW of a non-terminal: the terminals that can appear immediately after it in
    /// some derivation. The end-of-input sentinel is never included; ask
    /// [endable](Cfg::endable) instead. Terminals have an empty FOLLOW.
    pub fn follow(&self, symbol: &str) -> HashSet<Symbol> {
        if self.repr.is_terminal(symbol) {
            return HashSet::new();
        }
        self.update_follow();
        self.caches
            .borrow()
            .follow_sets
            .get(symbol)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the non-terminal can end a complete derivation (the sentinel was in its
    /// FOLLOW set). False for terminals.
    pub fn endable(&self, symbol: &str) -> bool {
        if self.repr.is_terminal(symbol) {
            return false;
        }
        self.update_follow();
        self.caches.borrow().endable.contains(symbol)
    }

    /// The non-terminals left-reachable from a symbol sequence: every `B` with
    /// `α ⇒* B γ` walking only the leftmost symbols, skipping over nullable ones.
    pub fn range(&self, sequence: &str) -> HashSet<Symbol> {
        let symbols = self.intern_sequence(sequence);
        let mut result = HashSet::new();
        for symbol in &symbols {
            let mut visited = HashSet::new();
            if self.populate_range_by_symbol(symbol, &mut result, &mut visited, false) {
                break;
            }
        }
        result
    }

    /// Checks if any non-terminal is left-recursive.
    pub fn is_recursive(&self) -> bool {
        self.non_terminals
            .iter()
            .any(|symbol| self.range(symbol).contains(symbol))
    }

    /// Classifies the left recursion of a non-terminal: [Direct](ReferenceType::Direct)
    /// if some production rewrites it to itself (allowing a nullable prefix),
    /// [Indirect](ReferenceType::Indirect) if it only reaches itself through other
    /// non-terminals.
    pub fn recursion_type(&self, symbol: &str) -> ReferenceType {
        if self.repr.is_terminal(symbol) {
            return ReferenceType::None;
        }
        if let Some(indexes) = self.by_name.get(symbol) {
            for &index in indexes {
                for s in &self.productions[index].rhs {
                    if &**s == symbol {
                        return ReferenceType::Direct;
                    }
                    if self.repr.is_terminal(s) || !self.symbol_nullable(s) {
                        break;
                    }
                }
            }
        }
        if self.range(symbol).contains(symbol) {
            return ReferenceType::Indirect;
        }
        ReferenceType::None
    }

    /// Checks if no non-terminal has a factoring conflict.
    pub fn is_factored(&self) -> bool {
        self.non_terminals
            .iter()
            .all(|symbol| self.non_factoring_type(symbol) == ReferenceType::None)
    }

    /// Classifies the factoring conflict of a non-terminal:
    /// [Direct](ReferenceType::Direct) if two alternatives share a leading terminal,
    /// [Indirect](ReferenceType::Indirect) if two alternatives have overlapping FIRST
    /// sets.
    pub fn non_factoring_type(&self, symbol: &str) -> ReferenceType {
        if self.repr.is_terminal(symbol) {
            return ReferenceType::None;
        }
        self.update_first();
        let caches = self.caches.borrow();
        let mut leading_terminals: HashSet<Symbol> = HashSet::new();
        let mut seen_firsts: HashSet<Symbol> = HashSet::new();
        let mut indirect = false;
        if let Some(indexes) = self.by_name.get(symbol) {
            for &index in indexes {
                let prod = &self.productions[index];
                let Some(head) = prod.rhs.first() else {
                    continue;
                };
                if self.repr.is_terminal(head) && !leading_terminals.insert(head.clone()) {
                    return ReferenceType::Direct;
                }
                if !indirect {
                    for s in &caches.production_first[index] {
                        if !seen_firsts.insert(s.clone()) {
                            indirect = true;
                            break;
                        }
                    }
                }
            }
        }
        if indirect {
            ReferenceType::Indirect
        } else {
            ReferenceType::None
        }
    }

    /// Rewrites away direct left recursion: `A → A α | β` becomes `A → β A'` and
    /// `A' → α A' | ε`. The result is a new grammar sharing this one's representation.
    ///
    /// # Panics
    /// Panics if some non-terminal is indirectly left-recursive; check with
    /// [recursion_type](Cfg::recursion_type) first.
    pub fn without_recursion(&self) -> Cfg {
        let mut result = Cfg::new(self.repr.clone());
        for name in &self.lhs_order {
            match self.recursion_type(name) {
                ReferenceType::None => {
                    for &index in &self.by_name[name] {
                        let prod = &self.productions[index];
                        result.push_production(prod.name.clone(), prod.rhs.clone());
                    }
                }
                ReferenceType::Indirect => {
                    panic!("indirect left recursion elimination is not implemented");
                }
                ReferenceType::Direct => {
                    let primed: Symbol = Rc::from(self.repr.primed(name));
                    for &index in &self.by_name[name] {
                        let prod = &self.productions[index];
                        if prod.rhs.first() == Some(name) {
                            let mut rhs = prod.rhs[1..].to_vec();
                            rhs.push(primed.clone());
                            result.push_production(primed.clone(), rhs);
                        } else {
                            let mut rhs = prod.rhs.clone();
                            rhs.push(primed.clone());
                            result.push_production(name.clone(), rhs);
                        }
                    }
                    result.push_production(primed, Vec::new());
                }
            }
        }
        result
    }

    fn intern_sequence(&self, sequence: &str) -> Vec<Symbol> {
        self.repr
            .symbol_sequence(sequence)
            .into_iter()
            .map(Rc::from)
            .collect()
    }

    fn symbol_nullable(&self, symbol: &str) -> bool {
        if self.repr.is_terminal(symbol) {
            return false;
        }
        self.update_first();
        self.caches
            .borrow()
            .nullable_by_symbol
            .get(symbol)
            .copied()
            .unwrap_or(false)
    }

    /// FIRST of a single symbol: the symbol itself for terminals, the union of the
    /// defining productions' FIRST sets otherwise.
    fn first_single(&self, symbol: &Symbol) -> HashSet<Symbol> {
        if self.repr.is_terminal(symbol) {
            return HashSet::from([symbol.clone()]);
        }
        self.update_first();
        let caches = self.caches.borrow();
        let mut result = HashSet::new();
        if let Some(indexes) = self.by_name.get(symbol) {
            for &index in indexes {
                result.extend(caches.production_first[index].iter().cloned());
            }
        }
        result
    }

    fn invalidate(&mut self) {
        let mut caches = self.caches.borrow_mut();
        caches.first_valid = false;
        caches.follow_valid = false;
    }

    /// Computes nullability and FIRST for every production, then memoizes. The first
    /// pass over the productions fills preliminary sets; the second pass completes sets
    /// whose dependencies were filled in after they were first visited.
    fn update_first(&self) {
        if self.caches.borrow().first_valid {
            return;
        }
        let n = self.productions.len();
        let mut nullability: HashMap<Symbol, bool> = HashMap::new();
        let mut production_nullable = vec![false; n];
        let mut production_first: Vec<HashSet<Symbol>> = vec![HashSet::new(); n];
        let mut visited: HashSet<usize> = HashSet::new();
        for index in 0..n {
            self.update_nullability(
                index,
                &mut visited,
                &mut nullability,
                &mut production_nullable,
                &mut production_first,
            );
        }

        let mut first_by_name: HashMap<Symbol, HashSet<Symbol>> = HashMap::new();
        for _pass in 0..2 {
            visited.clear();
            for index in 0..n {
                self.populate_first(
                    index,
                    &mut visited,
                    &nullability,
                    &mut first_by_name,
                    &mut production_first,
                    &mut production_nullable,
                );
            }
        }
        trace!("first sets recomputed for {n} productions");

        let mut caches = self.caches.borrow_mut();
        caches.nullable_by_symbol = nullability;
        caches.production_first = production_first;
        caches.production_nullable = production_nullable;
        caches.first_valid = true;
    }

    /// Settles the nullability of one production and of everything it depends on. A
    /// non-terminal with no production proving nullability is concluded non-nullable.
    /// The visited set breaks cycles in recursive grammars.
    fn update_nullability(
        &self,
        index: usize,
        visited: &mut HashSet<usize>,
        concluded: &mut HashMap<Symbol, bool>,
        production_nullable: &mut [bool],
        production_first: &mut [HashSet<Symbol>],
    ) {
        let prod = &self.productions[index];
        if visited.contains(&index) || concluded.contains_key(&prod.name) {
            return;
        }
        visited.insert(index);
        production_first[index].clear();
        production_nullable[index] = false;

        // First, try to conclude without recursing
        let mut all_nullable = true;
        for symbol in &prod.rhs {
            if self.repr.is_terminal(symbol) {
                return;
            }
            match concluded.get(symbol) {
                None => all_nullable = false,
                Some(false) => return,
                Some(true) => {}
            }
        }
        if all_nullable {
            concluded.insert(prod.name.clone(), true);
            production_nullable[index] = true;
            return;
        }

        for symbol in &prod.rhs {
            if concluded.contains_key(symbol) {
                continue;
            }
            if let Some(indexes) = self.by_name.get(symbol) {
                for &i in indexes {
                    self.update_nullability(
                        i,
                        visited,
                        concluded,
                        production_nullable,
                        production_first,
                    );
                }
            }
            if !concluded.contains_key(symbol) {
                // no production proved the symbol nullable, so it isn't
                concluded.insert(symbol.clone(), false);
                return;
            }
        }
        concluded.insert(prod.name.clone(), true);
        production_nullable[index] = true;
    }

    fn populate_first(
        &self,
        index: usize,
        visited: &mut HashSet<usize>,
        nullability: &HashMap<Symbol, bool>,
        first_by_name: &mut HashMap<Symbol, HashSet<Symbol>>,
        production_first: &mut [HashSet<Symbol>],
        production_nullable: &mut [bool],
    ) {
        if !visited.insert(index) {
            return;
        }
        let prod = &self.productions[index];
        for symbol in &prod.rhs {
            if self.repr.is_terminal(symbol) {
                production_first[index].insert(symbol.clone());
                first_by_name
                    .entry(prod.name.clone())
                    .or_default()
                    .insert(symbol.clone());
                return;
            }
            if let Some(indexes) = self.by_name.get(symbol) {
                for &i in indexes {
                    self.populate_first(
                        i,
                        visited,
                        nullability,
                        first_by_name,
                        production_first,
                        production_nullable,
                    );
                }
            }
            if let Some(set) = first_by_name.get(symbol) {
                let additions: Vec<Symbol> = set.iter().cloned().collect();
                for s in additions {
                    production_first[index].insert(s.clone());
                    first_by_name
                        .entry(prod.name.clone())
                        .or_default()
                        .insert(s);
                }
            }
            if !nullability.get(symbol).copied().unwrap_or(false) {
                return;
            }
        }
        production_nullable[index] = true;
    }

    /// Computes every FOLLOW set: first-based contributions with a dependency graph for
    /// nullable suffixes, then propagation to a fixed point, then extraction of the
    /// end-of-string sentinel into the endable set.
    fn update_follow(&self) {
        if self.caches.borrow().follow_valid {
            return;
        }
        self.update_first();
        let end: Symbol = Rc::from(END_OF_STRING);
        let mut follow_sets: HashMap<Symbol, HashSet<Symbol>> = HashMap::new();
        let mut dependencies: HashMap<Symbol, HashSet<Symbol>> = HashMap::new();
        if let Some(start) = self.productions.first() {
            follow_sets
                .entry(start.name.clone())
                .or_default()
                .insert(end.clone());
        }

        for prod in &self.productions {
            for (i, symbol) in prod.rhs.iter().enumerate() {
                if self.repr.is_terminal(symbol) {
                    continue;
                }
                let mut nullable_suffix = true;
                for later in &prod.rhs[i + 1..] {
                    let firsts = self.first_single(later);
                    follow_sets.entry(symbol.clone()).or_default().extend(firsts);
                    if !self.symbol_nullable(later) {
                        nullable_suffix = false;
                        break;
                    }
                }
                if nullable_suffix && *symbol != prod.name {
                    dependencies
                        .entry(symbol.clone())
                        .or_default()
                        .insert(prod.name.clone());
                }
            }
        }

        let pairs: Vec<(Symbol, Vec<Symbol>)> = dependencies
            .into_iter()
            .map(|(destination, origins)| (destination, origins.into_iter().collect()))
            .collect();
        let mut stable = false;
        while !stable {
            stable = true;
            for (destination, origins) in &pairs {
                for origin in origins {
                    let additions: Vec<Symbol> = follow_sets
                        .get(origin)
                        .map(|set| set.iter().cloned().collect())
                        .unwrap_or_default();
                    let target = follow_sets.entry(destination.clone()).or_default();
                    let before = target.len();
                    target.extend(additions);
                    if target.len() != before {
                        stable = false;
                    }
                }
            }
        }

        let mut endable = HashSet::new();
        for symbol in &self.non_terminals {
            if let Some(set) = follow_sets.get_mut(symbol) {
                if set.remove(&end) {
                    endable.insert(symbol.clone());
                }
            }
        }

        let mut caches = self.caches.borrow_mut();
        caches.follow_sets = follow_sets;
        caches.endable = endable;
        caches.follow_valid = true;
    }

    fn populate_range(
        &self,
        index: usize,
        result: &mut HashSet<Symbol>,
        visited: &mut HashSet<usize>,
    ) {
        if !visited.insert(index) {
            return;
        }
        for symbol in &self.productions[index].rhs {
            if self.populate_range_by_symbol(symbol, result, visited, true) {
                return;
            }
        }
    }

    /// Extends `result` with the non-terminals left-reachable through `symbol`. Returns
    /// true when the walk must stop (a terminal or a non-nullable symbol).
    fn populate_range_by_symbol(
        &self,
        symbol: &Symbol,
        result: &mut HashSet<Symbol>,
        visited: &mut HashSet<usize>,
        push: bool,
    ) -> bool {
        if self.repr.is_terminal(symbol) {
            return true;
        }
        if push {
            result.insert(symbol.clone());
        }
        if let Some(indexes) = self.by_name.get(symbol) {
            for &index in indexes {
                self.populate_range(index, result, visited);
            }
        }
        !self.symbol_nullable(symbol)
    }
}

/// Grammars are equal when they have exactly the same productions (as pretty-printed
/// strings); language equivalence is undecidable and not attempted.
impl PartialEq for Cfg {
    fn eq(&self, other: &Self) -> bool {
        if self.productions.len() != other.productions.len() {
            return false;
        }
        let mine: HashSet<String> = (0..self.len()).map(|i| self.to_readable(i)).collect();
        (0..other.len()).all(|i| mine.contains(&other.to_readable(i)))
    }
}

impl fmt::Display for Cfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in &self.lhs_order {
            for &index in &self.by_name[name] {
                writeln!(f, "{}", self.to_readable(index))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<Symbol> {
        items.iter().map(|s| Rc::from(*s)).collect()
    }

    #[test]
    fn symbol_lists() {
        let mut cfg = Cfg::bnf();
        cfg.add("<S>", "a<A>b").add("<S>", "");
        cfg.add("<A>", "a<A>").add("<A>", "b<A>").add("<A>", "");
        assert_eq!(*cfg.terminals(), set(&["a", "b"]));
        assert_eq!(*cfg.non_terminals(), set(&["<S>", "<A>"]));
    }

    #[test]
    fn consistency() {
        let mut cfg = Cfg::bnf();
        assert!(cfg.is_consistent());
        cfg.add("<S>", "a<A>b").add("<S>", "");
        assert!(!cfg.is_consistent());
        cfg.add("<A>", "a<A>").add("<A>", "b<A>").add("<A>", "");
        assert!(cfg.is_consistent());
    }

    #[test]
    fn first_easy() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= <A><B>").unwrap();
        cfg.add_line("<A> ::= a<A>|").unwrap();
        cfg.add_line("<B> ::= b<B>|").unwrap();
        assert_eq!(cfg.first("<S>"), set(&["a", "b"]));
        assert_eq!(cfg.first("<A>"), set(&["a"]));
        assert_eq!(cfg.first("<B>"), set(&["b"]));
        assert!(cfg.nullable("<S>"));
        assert!(cfg.nullable("<A>"));
        assert!(cfg.nullable("<B>"));
    }

    #[test]
    fn first_self_loop() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= <S>a|").unwrap();
        assert_eq!(cfg.first("<S>"), set(&["a"]));
        assert!(cfg.nullable("<S>"));
    }

    #[test]
    fn first_expression_grammar() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<E> ::= <T><E1>").unwrap();
        cfg.add_line("<E1> ::= +<T><E1>|").unwrap();
        cfg.add_line("<T> ::= <F><T1>").unwrap();
        cfg.add_line("<T1> ::= *<F><T1>|").unwrap();
        cfg.add_line("<F> ::= (<E>)|i").unwrap();
        assert_eq!(cfg.first("<E>"), set(&["(", "i"]));
        assert_eq!(cfg.first("<E1>"), set(&["+"]));
        assert_eq!(cfg.first("<T>"), set(&["(", "i"]));
        assert_eq!(cfg.first("<T1>"), set(&["*"]));
        assert_eq!(cfg.first("<F>"), set(&["(", "i"]));
        assert!(!cfg.nullable("<E>"));
        assert!(cfg.nullable("<E1>"));
        assert!(!cfg.nullable("<T>"));
        assert!(cfg.nullable("<T1>"));
        assert!(!cfg.nullable("<F>"));
        assert_eq!(cfg.first("<E1><E>"), set(&["+", "(", "i"]));
    }

    #[test]
    fn first_with_recursion_loop() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= <A>x|y").unwrap();
        cfg.add_line("<A> ::= <S>w|z").unwrap();
        assert_eq!(cfg.first("<S>"), set(&["y", "z"]));
        assert_eq!(cfg.first("<A>"), set(&["y", "z"]));
        assert!(!cfg.nullable("<S>"));
        assert!(!cfg.nullable("<A>"));
    }

    #[test]
    fn first_nullable_chain() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= <A><B><C><S>e|").unwrap();
        cfg.add_line("<A> ::= a<A>|").unwrap();
        cfg.add_line("<B> ::= b<B>|").unwrap();
        cfg.add_line("<C> ::= c<C>|").unwrap();
        assert_eq!(cfg.first("<S>"), set(&["a", "b", "c", "e"]));
        assert!(cfg.nullable("<S>"));
        assert!(cfg.nullable("<A>"));
        assert!(cfg.nullable("<B>"));
        assert!(cfg.nullable("<C>"));
    }

    #[test]
    fn first_hard() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= <S>s|<B><C><D>").unwrap();
        cfg.add_line("<A> ::= <S><A>a|").unwrap();
        cfg.add_line("<B> ::= <C>c").unwrap();
        cfg.add_line("<C> ::= <B>b|<S>s|<A>").unwrap();
        cfg.add_line("<D> ::= <D>d|<D><B>|").unwrap();
        assert_eq!(cfg.first("<S>"), set(&["c"]));
        assert_eq!(cfg.first("<A>"), set(&["c"]));
        assert_eq!(cfg.first("<B>"), set(&["c"]));
        assert_eq!(cfg.first("<C>"), set(&["c"]));
        assert_eq!(cfg.first("<D>"), set(&["c", "d"]));
        assert!(!cfg.nullable("<S>"));
        assert!(cfg.nullable("<A>"));
        assert!(!cfg.nullable("<B>"));
        assert!(cfg.nullable("<C>"));
        assert!(cfg.nullable("<D>"));
    }

    #[test]
    fn queries_follow_mutation() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= a").unwrap();
        assert_eq!(cfg.first("<S>"), set(&["a"]));
        cfg.add_line("<S> ::= b").unwrap();
        assert_eq!(cfg.first("<S>"), set(&["a", "b"]));
        cfg.clear();
        cfg.add_line("<S> ::= c").unwrap();
        assert_eq!(cfg.first("<S>"), set(&["c"]));
    }

    #[test]
    fn range() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= <S>a|<A><B>|c").unwrap();
        cfg.add_line("<A> ::= d<A>|<A>e|").unwrap();
        cfg.add_line("<B> ::= b").unwrap();
        assert_eq!(cfg.range("<S>"), set(&["<S>", "<A>", "<B>"]));
        assert_eq!(cfg.range("<A>"), set(&["<A>"]));
        assert_eq!(cfg.range("<B>"), set(&[]));

        cfg.clear();
        cfg.add_line("<S> ::= <S>s|<B><C><D>").unwrap();
        cfg.add_line("<A> ::= <S><A>a|").unwrap();
        cfg.add_line("<B> ::= <C>c").unwrap();
        cfg.add_line("<C> ::= <B>b|<S>s|<A>").unwrap();
        cfg.add_line("<D> ::= <D>d|<D><B>|").unwrap();
        assert_eq!(cfg.range("<S>"), set(&["<S>", "<A>", "<B>", "<C>"]));
        assert_eq!(cfg.range("<A>"), set(&["<S>", "<A>", "<B>", "<C>"]));
        assert_eq!(cfg.range("<B>"), set(&["<S>", "<A>", "<B>", "<C>"]));
        assert_eq!(cfg.range("<C>"), set(&["<S>", "<A>", "<B>", "<C>"]));
        assert_eq!(cfg.range("<D>"), set(&["<S>", "<A>", "<B>", "<C>", "<D>"]));
    }

    #[test]
    fn follow() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= <A><B><C>|e").unwrap();
        cfg.add_line("<A> ::= a<A>|").unwrap();
        cfg.add_line("<B> ::= b<B>|<A><C>d").unwrap();
        cfg.add_line("<C> ::= c<C>|").unwrap();
        assert_eq!(cfg.follow("<S>"), set(&[]));
        assert_eq!(cfg.follow("<A>"), set(&["a", "b", "c", "d"]));
        assert_eq!(cfg.follow("<B>"), set(&["c"]));
        assert_eq!(cfg.follow("<C>"), set(&["d"]));
        assert!(cfg.endable("<S>"));
        assert!(!cfg.endable("<A>"));
        assert!(cfg.endable("<B>"));
        assert!(cfg.endable("<C>"));
    }

    #[test]
    fn follow_expression_grammar() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<E> ::= <T><E1>").unwrap();
        cfg.add_line("<E1> ::= +<T><E1>|").unwrap();
        cfg.add_line("<T> ::= <F><T1>").unwrap();
        cfg.add_line("<T1> ::= *<F><T1>|").unwrap();
        cfg.add_line("<F> ::= (<E>)|i").unwrap();
        assert_eq!(cfg.follow("<E>"), set(&[")"]));
        assert_eq!(cfg.follow("<E1>"), set(&[")"]));
        assert_eq!(cfg.follow("<T>"), set(&[")", "+"]));
        assert_eq!(cfg.follow("<T1>"), set(&[")", "+"]));
        assert_eq!(cfg.follow("<F>"), set(&[")", "+", "*"]));
        for nt in ["<E>", "<E1>", "<T>", "<T1>", "<F>"] {
            assert!(cfg.endable(nt), "{nt} should be endable");
        }
        assert_eq!(cfg.follow("i"), set(&[]));
        assert!(!cfg.endable("i"));
    }

    #[test]
    fn recursion() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= a<S>b|").unwrap();
        assert!(!cfg.is_recursive());

        cfg.clear();
        cfg.add_line("<S> ::= <S>a|").unwrap();
        assert!(cfg.is_recursive());

        cfg.clear();
        cfg.add_line("<S> ::= <A><S><B>|").unwrap();
        cfg.add_line("<A> ::= a|").unwrap();
        cfg.add_line("<B> ::= <S>b|c").unwrap();
        assert!(cfg.is_recursive());
        assert_eq!(cfg.recursion_type("<S>"), ReferenceType::Direct);
        assert_eq!(cfg.recursion_type("<A>"), ReferenceType::None);
        assert_eq!(cfg.recursion_type("<B>"), ReferenceType::Indirect);
    }

    #[test]
    fn factoring() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= a<S>b|").unwrap();
        assert!(cfg.is_factored());

        cfg.clear();
        cfg.add_line("<S> ::= <A><S><B>|").unwrap();
        cfg.add_line("<A> ::= a|").unwrap();
        cfg.add_line("<B> ::= <S>b|<C>").unwrap();
        cfg.add_line("<C> ::= c<C>|c<A>|").unwrap();
        assert!(!cfg.is_factored());
        assert_eq!(cfg.non_factoring_type("<S>"), ReferenceType::None);
        assert_eq!(cfg.non_factoring_type("<A>"), ReferenceType::None);
        assert_eq!(cfg.non_factoring_type("<B>"), ReferenceType::Indirect);
        assert_eq!(cfg.non_factoring_type("<C>"), ReferenceType::Direct);
    }

    #[test]
    fn recursion_elimination() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= <S>a|b").unwrap();
        let mut expected = Cfg::bnf();
        expected.add_line("<S> ::= b<S'>").unwrap();
        expected.add_line("<S'> ::= a<S'>|").unwrap();
        assert_eq!(cfg.without_recursion(), expected);

        cfg.clear();
        cfg.add_line("<S> ::= <S><S>a|b<A>").unwrap();
        cfg.add_line("<A> ::= b<B>c|<A>e|").unwrap();
        cfg.add_line("<B> ::= <B>a|<B>b|c|d|").unwrap();
        let mut expected = Cfg::bnf();
        expected.add_line("<S> ::= b<A><S'>").unwrap();
        expected.add_line("<S'> ::= <S>a<S'>|").unwrap();
        expected.add_line("<A> ::= b<B>c<A'>|<A'>").unwrap();
        expected.add_line("<A'> ::= e<A'>|").unwrap();
        expected.add_line("<B> ::= c<B'>|d<B'>|<B'>").unwrap();
        expected.add_line("<B'> ::= a<B'>|b<B'>|").unwrap();
        assert_eq!(cfg.without_recursion(), expected);
    }

    #[test]
    fn didactic_representation() {
        let mut cfg = Cfg::didactic();
        cfg.add_line("S -> a A b | ").unwrap();
        cfg.add_line("A -> a A | b A | ").unwrap();
        assert_eq!(*cfg.terminals(), set(&["a", "b"]));
        assert_eq!(*cfg.non_terminals(), set(&["S", "A"]));
        assert_eq!(cfg.first("S"), set(&["a"]));
        assert!(cfg.nullable("S"));
        assert!(cfg.is_consistent());
    }

    #[test]
    fn display_prints_every_production() {
        let mut cfg = Cfg::bnf();
        cfg.add_line("<S> ::= a<S>|b").unwrap();
        let printed = cfg.to_string();
        assert!(printed.contains("<S> ::= a <S>"));
        assert!(printed.contains("<S> ::= b"));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        let mut cfg = Cfg::bnf();
        assert!(cfg.add_line("S ::= a").is_err());
        assert!(cfg.add_line("<S> -> a").is_err());
        assert_eq!(cfg.len(), 0);
    }
}
