//! Pattern compilation: lexing the surface syntax into tokens, building the composition
//! list, normalizing multiplicities into their three canonical shapes, and emitting the
//! ε-NFA executed by [Regex](crate::regex::Regex).

use nom::branch::alt;
use nom::bytes::complete::{take, take_while1};
use nom::character::complete;
use nom::character::complete::digit1;
use nom::combinator::{map, map_res, opt, verify};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded};
use nom::IResult;
use thiserror::Error;

use crate::regex::{CharClass, CharPattern, NfaState};

/// Errors detected while compiling a pattern. Runtime scanning cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegexError {
    #[error("unbalanced parenthesis in pattern")]
    UnbalancedParenthesis,
    #[error("unterminated character class in pattern")]
    UnbalancedClass,
    #[error("invalid repetition count in pattern")]
    InvalidRepetition,
    #[error("quantifier with no preceding atom")]
    DanglingQuantifier,
    #[error("trailing escape in pattern")]
    TrailingEscape,
    #[error("unexpected character '{0}' in pattern")]
    Unexpected(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    Star,
    Plus,
    Question,
    Repeat(u32, Option<u32>),
}

#[derive(Debug, Clone)]
enum PatternToken {
    Open,
    Close,
    Or,
    Atom(CharPattern),
    Quantifier(Quantifier),
}

/// One element of the lexed pattern. The whole pattern is implicitly wrapped in one
/// group-start/group-end pair; `level` is the nesting depth, with the contents of a group
/// one level above the group markers themselves.
#[derive(Debug, Clone)]
struct Composition {
    kind: CompKind,
    min: u32,
    /// `None` means unbounded.
    max: Option<u32>,
    level: u32,
}

#[derive(Debug, Clone)]
enum CompKind {
    Atom(CharPattern),
    Or,
    GroupStart,
    GroupEnd,
}

/// Compiles a pattern into its ε-NFA: the state list, the start state and the accepting
/// state.
pub(crate) fn compile(pattern: &str) -> Result<(Vec<NfaState>, usize, usize), RegexError> {
    let tokens = lex(pattern)?;
    let comps = compositions(tokens)?;
    let comps = normalize(comps);
    Ok(emit(&comps))
}

fn lex(pattern: &str) -> Result<Vec<PatternToken>, RegexError> {
    let (rest, tokens) = many0(token)(pattern).map_err(|_| RegexError::UnbalancedClass)?;
    if let Some(c) = rest.chars().next() {
        return Err(match c {
            '[' => RegexError::UnbalancedClass,
            '{' => RegexError::InvalidRepetition,
            '\\' => RegexError::TrailingEscape,
            other => RegexError::Unexpected(other),
        });
    }
    Ok(tokens)
}

fn token(input: &str) -> IResult<&str, PatternToken> {
    alt((
        escaped_char,
        char_class,
        repetition,
        map(complete::char('('), |_| PatternToken::Open),
        map(complete::char(')'), |_| PatternToken::Close),
        map(complete::char('|'), |_| PatternToken::Or),
        map(complete::char('*'), |_| PatternToken::Quantifier(Quantifier::Star)),
        map(complete::char('+'), |_| PatternToken::Quantifier(Quantifier::Plus)),
        map(complete::char('?'), |_| PatternToken::Quantifier(Quantifier::Question)),
        map(complete::char('.'), |_| PatternToken::Atom(CharPattern::Wildcard)),
        literal,
    ))(input)
}

fn escaped_char(input: &str) -> IResult<&str, PatternToken> {
    map(preceded(complete::char('\\'), take(1usize)), |s: &str| {
        PatternToken::Atom(CharPattern::Literal(one_char(s)))
    })(input)
}

fn char_class(input: &str) -> IResult<&str, PatternToken> {
    map(
        delimited(
            complete::char('['),
            take_while1(|c| c != ']'),
            complete::char(']'),
        ),
        |inner: &str| PatternToken::Atom(CharPattern::Class(parse_class(inner))),
    )(input)
}

fn repetition(input: &str) -> IResult<&str, PatternToken> {
    map(
        delimited(
            complete::char('{'),
            pair(number, opt(preceded(complete::char(','), opt(number)))),
            complete::char('}'),
        ),
        |(min, upper)| {
            let max = match upper {
                None => Some(min),
                Some(None) => None,
                Some(Some(n)) => Some(n),
            };
            PatternToken::Quantifier(Quantifier::Repeat(min, max))
        },
    )(input)
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse)(input)
}

fn literal(input: &str) -> IResult<&str, PatternToken> {
    map(
        verify(take(1usize), |s: &str| !is_reserved(one_char(s))),
        |s: &str| PatternToken::Atom(CharPattern::Literal(one_char(s))),
    )(input)
}

// Helper to take a &str known to hold exactly one char
fn one_char(s: &str) -> char {
    s.chars().next().expect("take(1) yields one char")
}

fn is_reserved(c: char) -> bool {
    ['(', ')', '[', '{', '|', '*', '+', '?', '\\', '.'].contains(&c)
}

/// Parses the inside of a `[...]` class: optional leading `^` negation, then single
/// characters and `a-z` ranges. A hyphen that cannot begin a range is literal.
fn parse_class(inner: &str) -> CharClass {
    let chars: Vec<char> = inner.chars().collect();
    let (negated, start) = if chars.len() > 1 && chars[0] == '^' {
        (true, 1)
    } else {
        (false, 0)
    };
    let mut singles = Vec::new();
    let mut ranges = Vec::new();
    let mut i = start;
    while i < chars.len() {
        if chars.get(i + 1) == Some(&'-') && i + 2 < chars.len() {
            ranges.push((chars[i], chars[i + 2]));
            i += 3;
        } else {
            singles.push(chars[i]);
            i += 1;
        }
    }
    CharClass {
        negated,
        singles,
        ranges,
    }
}

/// Builds the composition list from the token stream, wrapping the whole pattern in one
/// implicit group and attaching quantifiers to the preceding atom or group.
fn compositions(tokens: Vec<PatternToken>) -> Result<Vec<Composition>, RegexError> {
    let unit = |kind, level| Composition {
        kind,
        min: 1,
        max: Some(1),
        level,
    };
    let mut comps = vec![unit(CompKind::GroupStart, 0)];
    let mut level = 1;
    for token in tokens {
        match token {
            PatternToken::Open => {
                comps.push(unit(CompKind::GroupStart, level));
                level += 1;
            }
            PatternToken::Close => {
                if level == 1 {
                    return Err(RegexError::UnbalancedParenthesis);
                }
                level -= 1;
                comps.push(unit(CompKind::GroupEnd, level));
            }
            PatternToken::Or => comps.push(unit(CompKind::Or, level)),
            PatternToken::Atom(pattern) => comps.push(unit(CompKind::Atom(pattern), level)),
            PatternToken::Quantifier(quantifier) => {
                let holder = comps.last_mut().expect("the outer group start is always there");
                let quantifiable = matches!(holder.kind, CompKind::Atom(_))
                    || (matches!(holder.kind, CompKind::GroupEnd) && holder.level >= 1);
                if !quantifiable || (holder.min, holder.max) != (1, Some(1)) {
                    return Err(RegexError::DanglingQuantifier);
                }
                let (min, max) = match quantifier {
                    Quantifier::Star => (0, None),
                    Quantifier::Plus => (1, None),
                    Quantifier::Question => (0, Some(1)),
                    Quantifier::Repeat(min, max) => {
                        if matches!(max, Some(n) if n < min) {
                            return Err(RegexError::InvalidRepetition);
                        }
                        (min, max)
                    }
                };
                holder.min = min;
                holder.max = max;
            }
        }
    }
    if level != 1 {
        return Err(RegexError::UnbalancedParenthesis);
    }
    comps.push(unit(CompKind::GroupEnd, 0));
    Ok(comps)
}

/// Index of the group start matching the group end at `end`: the nearest preceding start
/// on the same level.
fn matching_start(comps: &[Composition], end: usize) -> usize {
    let level = comps[end].level;
    (0..end)
        .rev()
        .find(|&i| matches!(comps[i].kind, CompKind::GroupStart) && comps[i].level == level)
        .expect("group ends always have a matching start")
}

/// Index of the group end matching the group start at `start`.
fn group_close(comps: &[Composition], start: usize) -> usize {
    let level = comps[start].level;
    (start + 1..comps.len())
        .find(|&i| matches!(comps[i].kind, CompKind::GroupEnd) && comps[i].level == level)
        .expect("group starts always have a matching end")
}

/// Index of the group end closing the context an `|` at `or` belongs to.
fn enclosing_end(comps: &[Composition], or: usize) -> usize {
    let level = comps[or].level - 1;
    (or + 1..comps.len())
        .find(|&i| matches!(comps[i].kind, CompKind::GroupEnd) && comps[i].level == level)
        .expect("every context is closed")
}

/// A branch head candidate: skips over an `|` (empty branch) to the closing group end.
fn resolve(comps: &[Composition], idx: usize) -> usize {
    if matches!(comps[idx].kind, CompKind::Or) {
        enclosing_end(comps, idx)
    } else {
        idx
    }
}

/// Expands every non-canonical multiplicity until only `[1,1]`, `[0,1]` and `[0,∞)`
/// remain. `T{m,n}` becomes a copy of `T` followed by `T{m-1,n-1}`; with a zero minimum
/// the copy is optional instead. For groups the whole bracketed span is duplicated.
fn normalize(mut comps: Vec<Composition>) -> Vec<Composition> {
    'scan: loop {
        for i in 0..comps.len() {
            let (min, max) = (comps[i].min, comps[i].max);
            if matches!((min, max), (1, Some(1)) | (0, Some(1)) | (0, None)) {
                continue;
            }
            let start = if matches!(comps[i].kind, CompKind::GroupEnd) {
                matching_start(&comps, i)
            } else {
                i
            };
            let span = comps[start..=i].to_vec();
            let holder = span.len() - 1;
            let mut replacement: Vec<Composition> = Vec::new();
            if max != Some(0) {
                let mut head = span.clone();
                let mut tail = span;
                if min >= 1 {
                    head[holder].min = 1;
                    head[holder].max = Some(1);
                    tail[holder].min = min - 1;
                    tail[holder].max = max.map(|m| m - 1);
                } else {
                    let m = max.expect("an unbounded zero-minimum is canonical");
                    head[holder].min = 0;
                    head[holder].max = Some(1);
                    tail[holder].min = 0;
                    tail[holder].max = Some(m - 1);
                }
                replacement.extend(head);
                replacement.extend(tail);
            }
            comps.splice(start..=i, replacement);
            continue 'scan;
        }
        break;
    }
    comps
}

/// Emits the ε-NFA. Every non-`|` composition gets an entry and an exit state; atoms put
/// their character edge between the two, group markers an ε edge. Exits are wired to the
/// entries of the successor compositions: the next one in sequence, jumping over `|` to
/// the closing context, and for group starts one head per alternative. Canonical
/// multiplicities become a skip edge (`min == 0`) and a loop edge (unbounded `max`), both
/// anchored at the group start for groups and at the atom itself otherwise.
fn emit(comps: &[Composition]) -> (Vec<NfaState>, usize, usize) {
    let mut entry = vec![usize::MAX; comps.len()];
    let mut exit = vec![usize::MAX; comps.len()];
    let mut counter = 0;
    for (i, comp) in comps.iter().enumerate() {
        if !matches!(comp.kind, CompKind::Or) {
            entry[i] = counter;
            exit[i] = counter + 1;
            counter += 2;
        }
    }
    let accepting = counter;
    let mut states = vec![
        NfaState {
            edge: None,
            epsilon: Vec::new(),
        };
        accepting + 1
    ];

    for (i, comp) in comps.iter().enumerate() {
        match &comp.kind {
            CompKind::Or => continue,
            CompKind::Atom(pattern) => {
                states[entry[i]].edge = Some((pattern.clone(), exit[i]));
            }
            CompKind::GroupStart | CompKind::GroupEnd => {
                states[entry[i]].epsilon.push(exit[i]);
            }
        }

        if i + 1 == comps.len() {
            states[exit[i]].epsilon.push(accepting);
        } else if matches!(comp.kind, CompKind::GroupStart) {
            let close = group_close(comps, i);
            states[exit[i]].epsilon.push(entry[resolve(comps, i + 1)]);
            for j in i + 1..close {
                if matches!(comps[j].kind, CompKind::Or) && comps[j].level == comp.level + 1 {
                    states[exit[i]].epsilon.push(entry[resolve(comps, j + 1)]);
                }
            }
        } else {
            let next = if matches!(comps[i + 1].kind, CompKind::Or) {
                enclosing_end(comps, i + 1)
            } else {
                i + 1
            };
            states[exit[i]].epsilon.push(entry[next]);
        }

        let loop_entry = if matches!(comp.kind, CompKind::GroupEnd) {
            entry[matching_start(comps, i)]
        } else {
            entry[i]
        };
        if comp.min == 0 {
            states[loop_entry].epsilon.push(exit[i]);
        }
        if comp.max.is_none() {
            states[exit[i]].epsilon.push(loop_entry);
        }
    }
    (states, 0, accepting)
}
