use crate::dfa::Dfa;
use crate::regex::Regex;
use ::regex::Regex as LibRegex;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALPHABET: [char; 3] = ['a', 'b', 'c'];

fn accepts(dfa: &Dfa, input: &str) -> bool {
    let mut run = dfa.clone();
    run.reset();
    run.read_str(input);
    run.accepts()
}

#[test]
fn seeded_probe_agreement_after_minimization() {
    // A hand-rolled automaton probed with seeded random strings: minimization must not
    // change any verdict
    let mut dfa = Dfa::new();
    for name in ["q0", "q1", "q2", "q3", "q4"] {
        dfa.add_state(name);
    }
    for (from, on, to) in [
        ("q0", 'a', "q1"),
        ("q0", 'b', "q2"),
        ("q1", 'a', "q3"),
        ("q1", 'b', "q2"),
        ("q2", 'a', "q1"),
        ("q2", 'b', "q4"),
        ("q3", 'a', "q3"),
        ("q4", 'b', "q4"),
    ] {
        dfa.add_transition(from, to, on);
    }
    dfa.accept(["q3", "q4"]);
    let minimized = dfa.minimized();

    let mut rng = StdRng::seed_from_u64(0xf0421);
    for _ in 0..500 {
        let len = rng.gen_range(0..12);
        let input: String = (0..len)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
            .collect();
        assert_eq!(accepts(&dfa, &input), accepts(&minimized, &input), "input {input:?}");
    }
}

proptest! {
    /// Minimization preserves the language and reaches a fixed point
    #[test]
    fn dfa_minimize_preserves_language(dfa in complete_dfa(8)) {
        let minimized = dfa.minimized();
        prop_assert!(minimized.len() <= dfa.len());
        prop_assert!(minimized.equivalent_to(&dfa), "minimized DFA should be equivalent to original");
        prop_assert_eq!(minimized.minimized().len(), minimized.len(), "minimization should be a fixed point");
    }

    /// Double complement gives back the same language
    #[test]
    fn dfa_double_complement(dfa in complete_dfa(8)) {
        let back = dfa.complement().complement();
        prop_assert!(back.equivalent_to(&dfa));
    }

    /// The complement accepts exactly the rejected strings of the alphabet
    #[test]
    fn dfa_complement_flips_verdicts(
        dfa in complete_dfa(8),
        probes in prop::collection::vec("[a-c]{0,8}", 30)
    ) {
        let inverted = dfa.complement();
        for probe in &probes {
            prop_assert_eq!(accepts(&dfa, probe), !accepts(&inverted, probe));
        }
    }

    /// Binary operations agree with the Boolean combination of the operand verdicts
    #[test]
    fn dfa_binary_ops(
        dfa1 in complete_dfa(6),
        dfa2 in complete_dfa(6),
        probes in prop::collection::vec("[a-c]{0,8}", 30)
    ) {
        let intersection = dfa1.intersection(&dfa2);
        let union = dfa1.union(&dfa2);
        let difference = dfa1.difference(&dfa2);
        let symmetric_difference = dfa1.symmetric_difference(&dfa2);
        for probe in &probes {
            let r1 = accepts(&dfa1, probe);
            let r2 = accepts(&dfa2, probe);
            prop_assert_eq!(accepts(&intersection, probe), r1 && r2);
            prop_assert_eq!(accepts(&union, probe), r1 || r2);
            prop_assert_eq!(accepts(&difference, probe), r1 && !r2);
            prop_assert_eq!(accepts(&symmetric_difference, probe), r1 != r2);
        }
    }

    /// Union contains both operands, both operands contain the intersection
    #[test]
    fn dfa_containment_lattice(dfa1 in complete_dfa(6), dfa2 in complete_dfa(6)) {
        let union = dfa1.union(&dfa2);
        let intersection = dfa1.intersection(&dfa2);
        prop_assert!(union.contains(&dfa1));
        prop_assert!(union.contains(&dfa2));
        prop_assert!(dfa1.contains(&intersection));
        prop_assert!(dfa2.contains(&intersection));
    }

    /// Union and intersection with itself change nothing
    #[test]
    fn dfa_self_absorption(dfa in complete_dfa(8)) {
        prop_assert!(dfa.union(&dfa).equivalent_to(&dfa));
        prop_assert!(dfa.intersection(&dfa).equivalent_to(&dfa));
    }

    /// The regex engine agrees with the `regex` crate on generated patterns
    #[test]
    fn regex_agrees_with_library(
        pattern in random_regex(),
        probes in prop::collection::vec("[a-c]{0,6}", 20)
    ) {
        let mut ours = Regex::new(&pattern).unwrap();
        let lib = LibRegex::new(&format!("^(?:{pattern})$")).unwrap();
        for probe in &probes {
            prop_assert_eq!(
                ours.is_match(probe),
                lib.is_match(probe),
                "pattern {} on input {:?}", pattern, probe
            );
        }
        prop_assert_eq!(ours.is_match(""), lib.is_match(""));
    }
}

prop_compose! {
    /// A random DFA over {a, b, c} with a complete transition function
    fn complete_dfa(max_states: usize)
        (num_states in 1..max_states)
        (
            transitions in prop::collection::vec(
                prop::collection::vec(0..num_states, ALPHABET.len()..=ALPHABET.len()),
                num_states..=num_states
            ),
            accepting in prop::collection::vec(any::<bool>(), num_states..=num_states),
            initial in 0..num_states,
        )
    -> Dfa {
        let num_states = transitions.len();
        let mut dfa = Dfa::with_capacity(num_states);
        for i in 0..num_states {
            dfa.add_state(&format!("s{i}"));
        }
        for (i, row) in transitions.iter().enumerate() {
            let from = format!("s{i}");
            for (k, &target) in row.iter().enumerate() {
                dfa.add_transition(&from, &format!("s{target}"), ALPHABET[k]);
            }
        }
        let accept_names: Vec<String> = accepting
            .iter()
            .enumerate()
            .filter_map(|(i, &is_accepting)| is_accepting.then(|| format!("s{i}")))
            .collect();
        dfa.accept(accept_names.iter().map(String::as_str));
        dfa.set_initial(&format!("s{initial}"));
        dfa.reset();
        dfa
    }
}

fn random_regex() -> impl Strategy<Value = String> {
    "[a-c]".prop_recursive(6, 48, 8, |inner| {
        prop_oneof![
            10 => prop::collection::vec(inner.clone(), 1..5)
                .prop_map(|parts| format!("({})", parts.join(""))),
            10 => prop::collection::vec(inner.clone(), 1..5).prop_map(|parts| parts.join("|")),
            3 => inner.clone().prop_map(|r| format!("({r})*")),
            3 => inner.clone().prop_map(|r| format!("({r})+")),
            2 => inner.clone().prop_map(|r| format!("({r})?")),
        ]
    })
}
