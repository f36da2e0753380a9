use criterion::{black_box, criterion_group, criterion_main, Criterion};
use formic::cfg::Cfg;
use formic::dfa::Dfa;
use formic::lexer::Lexer;
use formic::parser::slr1::Slr1;
use formic::regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    static ref DATE_PATTERN: String =
        "[A-Za-z0-9_ ]+ \\((0[1-9]|[12][0-9]|3[01])\\.(0[1-9]|1[0-2])\\.[0-9]{1,4}\\)"
            .to_string();
    static ref ARITHMETIC_INPUT: String = "22 3.14 + 7 * 9 + 0.5 * 1024 + 3 * 2.71 "
        .repeat(32);
}

/// A DFA accepting unary strings whose length is divisible by `modulus`, padded with
/// redundant state pairs so minimization has work to do.
fn padded_counter(modulus: usize) -> Dfa {
    let mut dfa = Dfa::with_capacity(2 * modulus);
    for i in 0..2 * modulus {
        dfa.add_state(&format!("s{i}"));
    }
    for i in 0..2 * modulus {
        let from = format!("s{i}");
        let to = format!("s{}", (i + 1) % modulus + modulus * usize::from(i < modulus));
        dfa.add_transition(&from, &to, 'a');
    }
    let upper = format!("s{modulus}");
    dfa.accept(["s0", upper.as_str()]);
    dfa
}

pub fn minimization(c: &mut Criterion) {
    let dfa = padded_counter(64);
    c.bench_function("minimize", |b| b.iter(|| black_box(&dfa).minimized()));
}

pub fn powerset(c: &mut Criterion) {
    let by_seven = padded_counter(7);
    let by_eleven = padded_counter(11);
    c.bench_function("union", |b| {
        b.iter(|| by_seven.union(black_box(&by_eleven)))
    });
    c.bench_function("intersection", |b| {
        b.iter(|| by_seven.intersection(black_box(&by_eleven)))
    });
    c.bench_function("equivalence check", |b| {
        b.iter(|| by_seven.equivalent_to(black_box(&by_eleven)))
    });
}

pub fn regex_scan(c: &mut Criterion) {
    c.bench_function("regex compile", |b| {
        b.iter(|| Regex::new(black_box(&DATE_PATTERN)).unwrap())
    });

    let mut regex = Regex::new(&DATE_PATTERN).unwrap();
    c.bench_function("regex scan", |b| {
        b.iter(|| regex.is_match(black_box("Albert Einstein (14.03.1879)")))
    });
}

pub fn lexing(c: &mut Criterion) {
    let mut lexer = Lexer::new();
    lexer
        .add_token("T_NUMBER", "[0-9]+\\.?[0-9]*|\\.[0-9]+")
        .unwrap();
    lexer.add_token("T_PLUS", "\\+").unwrap();
    lexer.add_token("T_TIMES", "\\*").unwrap();
    lexer.ignore(' ');
    c.bench_function("lexer tokenize", |b| {
        b.iter(|| lexer.tokenize(black_box(&ARITHMETIC_INPUT)).unwrap())
    });
}

pub fn table_construction(c: &mut Criterion) {
    let mut cfg = Cfg::bnf();
    cfg.add_line("<E> ::= <E> + <T> | <T>").unwrap();
    cfg.add_line("<T> ::= <T> * <F> | <F>").unwrap();
    cfg.add_line("<F> ::= ( <E> ) | id").unwrap();
    c.bench_function("slr1 table", |b| b.iter(|| Slr1::new(black_box(&cfg))));
}

criterion_group!(
    benches,
    minimization,
    powerset,
    regex_scan,
    lexing,
    table_construction
);
criterion_main!(benches);
