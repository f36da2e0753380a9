//! Language-level operations on DFAs: minimization by partition refinement, the pair-state
//! product construction, and the Boolean closure (complement, intersection, union,
//! difference, containment, equivalence) built on top of it.
//!
//! ```
//! use formic::dfa::Dfa;
//!
//! // Unary counters: multiples of 2 and multiples of 3
//! let mut by2 = Dfa::new();
//! by2.add_state("e").add_state("o");
//! by2.add_transition("e", "o", 'a');
//! by2.add_transition("o", "e", 'a');
//! by2.accept(["e"]);
//!
//! let mut by3 = Dfa::new();
//! by3.add_state("r0").add_state("r1").add_state("r2");
//! by3.add_transition("r0", "r1", 'a');
//! by3.add_transition("r1", "r2", 'a');
//! by3.add_transition("r2", "r0", 'a');
//! by3.accept(["r0"]);
//!
//! // Their intersection accepts multiples of 6
//! let mut by6 = by2.intersection(&by3);
//! for len in 0..=12 {
//!     by6.reset();
//!     (0..len).for_each(|_| by6.read('a'));
//!     assert_eq!(by6.accepts(), len % 6 == 0);
//! }
//!
//! // Every language contains itself, and the complement flips acceptance
//! assert!(by2.contains(&by2));
//! assert!(by2.complement().complement().equivalent_to(&by2));
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};

use log::debug;

use crate::dfa::{Dfa, State};
use crate::index_set::IndexSet;

impl Dfa {
    /// Returns the minimized form of this DFA: unreachable states are removed first
    /// (partition refinement assumes reachability), then equivalent states are collapsed.
    /// The result accepts exactly the same language and no two of its states are
    /// equivalent.
    pub fn minimized(&self) -> Dfa {
        self.without_unreachable_states().without_equivalent_states()
    }

    /// Collapses equivalent states using Hopcroft-style partition refinement,
    /// O(k·n·log n) for an alphabet of size k. The automaton is temporarily completed
    /// with a materialized error state; the partition that ends up holding that sink is
    /// dropped from the result, so the output has a partial transition function again.
    ///
    /// Each kept partition becomes one state, named after its smallest-index
    /// representative. If the initial state turns out to be equivalent to the sink (the
    /// automaton accepts nothing), the result is the empty DFA.
    pub fn without_equivalent_states(&self) -> Dfa {
        if self.states.is_empty() {
            return Dfa::new();
        }
        let mut work = self.clone();
        let sink_name = work
            .materialize_error_state(true)
            .expect("forced materialization always adds a sink");
        let sink = work
            .state_index(&sink_name)
            .expect("sink was just added");
        let n = work.len();
        let alphabet = work.alphabet();

        let mut finals = IndexSet::with_capacity(n);
        for (idx, state) in work.states.iter().enumerate() {
            if state.accepting {
                finals.insert(idx);
            }
        }
        let nonfinals = !&finals;

        let mut partitions: Vec<IndexSet> = Vec::new();
        if !finals.is_empty() {
            partitions.push(finals.clone());
        }
        if !nonfinals.is_empty() {
            partitions.push(nonfinals);
        }
        let mut worklist: Vec<IndexSet> = if finals.is_empty() {
            Vec::new()
        } else {
            vec![finals]
        };

        while let Some(splitter) = worklist.pop() {
            for &c in &alphabet {
                let preds = work.predecessors_on(c, &splitter);
                if preds.is_empty() {
                    continue;
                }
                let mut refined = Vec::with_capacity(partitions.len());
                for class in partitions.drain(..) {
                    let inter = &class & &preds;
                    let diff = &class - &preds;
                    if inter.is_empty() || diff.is_empty() {
                        refined.push(class);
                        continue;
                    }
                    if let Some(pos) = worklist.iter().position(|w| *w == class) {
                        worklist.swap_remove(pos);
                        worklist.push(inter.clone());
                        worklist.push(diff.clone());
                    } else if inter.count() <= diff.count() {
                        worklist.push(inter.clone());
                    } else {
                        worklist.push(diff.clone());
                    }
                    refined.push(inter);
                    refined.push(diff);
                }
                partitions = refined;
            }
        }
        debug!("partition refinement settled on {} classes", partitions.len());

        partitions.retain(|class| !class.contains(sink));
        partitions.sort_by_key(|class| class.any().unwrap_or(usize::MAX));

        let mut class_of = vec![usize::MAX; n];
        for (k, class) in partitions.iter().enumerate() {
            for idx in class.iter() {
                class_of[idx] = k;
            }
        }
        if class_of[work.initial] == usize::MAX {
            // the initial state is equivalent to the sink: the language is empty
            return Dfa::new();
        }

        let mut result = Dfa::with_capacity(partitions.len());
        for class in &partitions {
            let rep = class.any().expect("partitions are never empty");
            result.add_state(&work.states[rep].name);
            let added = result.states.len() - 1;
            result.states[added].accepting = work.states[rep].accepting;
        }
        for (k, class) in partitions.iter().enumerate() {
            let rep = class.any().expect("partitions are never empty");
            for (&c, &target) in &work.states[rep].transitions {
                let target_class = class_of[target];
                if target_class != usize::MAX {
                    result.states[k].transitions.insert(c, target_class);
                }
            }
        }
        result.initial = class_of[work.initial];
        result.reset();
        result
    }

    /// Builds the product construction of two DFAs over the union of their alphabets:
    /// states of the result are reachable pairs of states, stepped in lockstep. Whether a
    /// pair is accepting is decided by `combinator`. Both operands are completed with a
    /// materialized error state on private copies, so this is side-effect-free.
    ///
    /// `intersection` and `union` are instances of this with `&&` and `||`.
    pub fn product_construction(
        &self,
        other: &Dfa,
        mut combinator: impl FnMut(&State, &State) -> bool,
    ) -> Dfa {
        if self.is_empty() || other.is_empty() {
            return Dfa::new();
        }
        let mut left = self.clone();
        let mut right = other.clone();
        let alphabet: BTreeSet<char> = self
            .alphabet()
            .union(&other.alphabet())
            .copied()
            .collect();
        left.complete_over(&alphabet);
        right.complete_over(&alphabet);

        let start = (left.initial, right.initial);
        let mut order: Vec<(usize, usize)> = vec![start];
        let mut index_of: HashMap<(usize, usize), usize> = HashMap::from([(start, 0)]);
        let mut transitions: Vec<Vec<(char, usize)>> = Vec::new();
        let mut accepting: Vec<bool> = Vec::new();

        let mut i = 0;
        while i < order.len() {
            let (p, q) = order[i];
            let mut row = Vec::with_capacity(alphabet.len());
            for &c in &alphabet {
                let pair = (left.states[p].transitions[&c], right.states[q].transitions[&c]);
                let next_index = order.len();
                let target = *index_of.entry(pair).or_insert(next_index);
                if target == next_index {
                    order.push(pair);
                }
                row.push((c, target));
            }
            accepting.push(combinator(&left.states[p], &right.states[q]));
            transitions.push(row);
            i += 1;
        }
        debug!("product construction explored {} state pairs", order.len());

        let mut names: Vec<String> = order
            .iter()
            .map(|&(p, q)| format!("({},{})", left.states[p].name, right.states[q].name))
            .collect();
        let distinct: HashSet<&str> = names.iter().map(String::as_str).collect();
        if distinct.len() != names.len() {
            names = (0..order.len()).map(|idx| idx.to_string()).collect();
        }

        let mut result = Dfa::with_capacity(order.len());
        for (idx, name) in names.iter().enumerate() {
            result.add_state(name);
            result.states[idx].accepting = accepting[idx];
        }
        for (idx, row) in transitions.into_iter().enumerate() {
            for (c, target) in row {
                result.states[idx].transitions.insert(c, target);
            }
        }
        result.reset();
        result
    }

    /// Returns the complement of this DFA with respect to its own alphabet: the copy is
    /// completed with a materialized error state, then every accepting flag is flipped.
    /// A materialized sink that ends up non-accepting is dropped again.
    pub fn complement(&self) -> Dfa {
        let mut result = self.clone();
        let sink = result.materialize_error_state(false);
        for state in result.states.iter_mut() {
            state.accepting = !state.accepting;
        }
        if let Some(name) = sink {
            let idx = result.state_index(&name).expect("sink was just added");
            if !result.states[idx].accepting {
                result.remove_state(&name);
            }
        }
        result.reset();
        result
    }

    /// Returns a DFA accepting the strings accepted by both operands.
    pub fn intersection(&self, other: &Dfa) -> Dfa {
        self.product_construction(other, |s1, s2| s1.accepting && s2.accepting)
    }

    /// Returns a DFA accepting the strings accepted by either operand (or both).
    pub fn union(&self, other: &Dfa) -> Dfa {
        self.product_construction(other, |s1, s2| s1.accepting || s2.accepting)
    }

    /// Returns a DFA accepting the strings accepted by `self` but not by `other`.
    pub fn difference(&self, other: &Dfa) -> Dfa {
        self.product_construction(other, |s1, s2| s1.accepting && !s2.accepting)
    }

    /// Returns a DFA accepting the strings accepted by exactly one of the operands.
    pub fn symmetric_difference(&self, other: &Dfa) -> Dfa {
        self.product_construction(other, |s1, s2| s1.accepting != s2.accepting)
    }

    /// Checks if some accepting state is reachable from the initial state, i.e. whether
    /// the language of this DFA is non-empty.
    pub fn has_reachable_accepting_state(&self) -> bool {
        !self.is_empty()
            && self
                .reachable_states()
                .iter()
                .any(|idx| self.states[idx].accepting)
    }

    /// Checks language containment: `self.contains(other)` is true iff every string
    /// accepted by `other` is accepted by `self`, decided by intersecting `other` with
    /// the complement of `self` and testing emptiness.
    pub fn contains(&self, other: &Dfa) -> bool {
        !self.complement().intersection(other).has_reachable_accepting_state()
    }

    /// Checks language equality through mutual containment.
    pub fn equivalent_to(&self, other: &Dfa) -> bool {
        self.contains(other) && other.contains(self)
    }
}
