//! # Regular expressions
//! The [Regex] struct compiles an extended regular-expression syntax into an ε-NFA and
//! executes it by subset simulation. Supported syntax: literal characters, the `.`
//! wildcard, character classes `[...]` with ranges and `^` negation, alternation `|`,
//! grouping `(...)`, the quantifiers `*`, `+`, `?` and counted repetition `{m}`, `{m,}`,
//! `{m,n}`, and `\` escapes. There are no anchors: a regex always matches the whole of
//! the input it has been fed.
//!
//! ```
//! use formic::regex::Regex;
//!
//! let mut regex = Regex::new("ab*c").unwrap();
//! assert!(regex.is_match("ac"));
//! assert!(regex.is_match("abbbc"));
//! assert!(!regex.is_match("abcd"));
//!
//! let mut date = Regex::new("[0-9]{2}\\.[0-9]{2}").unwrap();
//! assert!(date.is_match("14.03"));
//! assert!(!date.is_match("14.3"));
//! ```
//!
//! ## Progressive scanning
//! Besides whole-string matching, a regex can be driven one character at a time, which is
//! what the [Lexer](crate::lexer::Lexer) builds its longest-match loop on. [Regex::read]
//! advances the set of active states, [Regex::matches] asks whether the characters read
//! so far form a match, and [Regex::aborted] reports that the active set ran empty. Once
//! aborted, a scanner stays aborted until [Regex::reset]:
//!
//! ```
//! use formic::regex::Regex;
//!
//! let mut regex = Regex::new("ab+c?").unwrap();
//! regex.read('a');
//! assert!(!regex.matches() && !regex.aborted());
//! regex.read('b');
//! assert!(regex.matches());
//! regex.read('c');
//! assert!(regex.matches());
//! regex.read('d');
//! assert!(!regex.matches() && regex.aborted());
//! ```
//!
//! Malformed patterns (unbalanced brackets, a quantifier with nothing to apply to) are
//! rejected at compile time with a [RegexError]; scanning itself cannot fail.

use std::collections::HashSet;

mod parse;

pub use parse::RegexError;

/// A single-character pattern on an ε-NFA edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharPattern {
    Literal(char),
    Wildcard,
    Class(CharClass),
}

impl CharPattern {
    fn matches(&self, c: char) -> bool {
        match self {
            CharPattern::Literal(l) => *l == c,
            CharPattern::Wildcard => true,
            CharPattern::Class(class) => class.matches(c),
        }
    }
}

/// A character class: single characters plus inclusive ranges, possibly negated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pub(crate) negated: bool,
    pub(crate) singles: Vec<char>,
    pub(crate) ranges: Vec<(char, char)>,
}

impl CharClass {
    fn matches(&self, c: char) -> bool {
        let inside = self.singles.contains(&c)
            || self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
        inside != self.negated
    }
}

/// A state of the compiled ε-NFA: at most one character-matching edge plus any number of
/// ε (spontaneous) transitions.
#[derive(Debug, Clone)]
pub(crate) struct NfaState {
    pub(crate) edge: Option<(CharPattern, usize)>,
    pub(crate) epsilon: Vec<usize>,
}

/// A compiled regular expression together with its scan cursor (the ε-closed set of
/// active states). The automaton itself is immutable after construction; [Regex::reset]
/// rewinds the cursor for a fresh scan.
#[derive(Debug, Clone)]
pub struct Regex {
    pattern: String,
    states: Vec<NfaState>,
    start: usize,
    accepting: usize,
    active: HashSet<usize>,
}

impl Regex {
    /// Compiles a pattern. See the [module-level documentation](crate::regex) for the
    /// supported syntax.
    pub fn new(pattern: &str) -> Result<Self, RegexError> {
        let (states, start, accepting) = parse::compile(pattern)?;
        let mut regex = Self {
            pattern: pattern.to_string(),
            states,
            start,
            accepting,
            active: HashSet::new(),
        };
        regex.reset();
        Ok(regex)
    }

    /// The pattern this regex was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Rewinds the scan cursor: the active set becomes the ε-closure of the start state.
    pub fn reset(&mut self) {
        self.active.clear();
        self.active.insert(self.start);
        let mut active = std::mem::take(&mut self.active);
        self.expand_spontaneous(&mut active);
        self.active = active;
    }

    /// Feeds one character to the scanner: every active state follows its matching edge
    /// (if any), and the resulting set is ε-closed. An empty active set stays empty.
    pub fn read(&mut self, c: char) {
        let mut next = HashSet::new();
        for &idx in &self.active {
            if let Some((pattern, target)) = &self.states[idx].edge {
                if pattern.matches(c) {
                    next.insert(*target);
                }
            }
        }
        self.expand_spontaneous(&mut next);
        self.active = next;
    }

    /// Checks whether the characters read since the last reset form a full match.
    pub fn matches(&self) -> bool {
        self.active.contains(&self.accepting)
    }

    /// Checks whether the scan has run out of active states. Once aborted, every further
    /// [read](Regex::read) keeps the scanner aborted.
    pub fn aborted(&self) -> bool {
        self.active.is_empty()
    }

    /// Resets the scanner and matches the whole input.
    pub fn is_match(&mut self, input: &str) -> bool {
        self.reset();
        input.chars().for_each(|c| self.read(c));
        self.matches()
    }

    /// Extends a state set with everything reachable over ε transitions.
    fn expand_spontaneous(&self, set: &mut HashSet<usize>) {
        let mut queue: Vec<usize> = set.iter().copied().collect();
        while let Some(state) = queue.pop() {
            for &target in &self.states[state].epsilon {
                if set.insert(target) {
                    queue.push(target);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regex(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap()
    }

    #[test]
    fn basic_matching() {
        let mut r = regex("abc");
        assert!(!r.is_match("ab"));
        assert!(!r.is_match("xyz"));
        assert!(r.is_match("abc"));
        assert!(!r.is_match("abcd"));

        let mut r = regex("ab*c");
        assert!(!r.is_match("ab"));
        assert!(r.is_match("abc"));
        assert!(r.is_match("ac"));
        assert!(r.is_match("abbbbbbbc"));
        assert!(!r.is_match("abbbbbbbcc"));

        let mut r = regex("ab+c");
        assert!(r.is_match("abc"));
        assert!(!r.is_match("ac"));
        assert!(r.is_match("abbc"));
        assert!(!r.is_match("abcd"));
    }

    #[test]
    fn alternation() {
        let mut r = regex("ab+c|ac*b");
        assert!(r.is_match("abbbbc"));
        assert!(r.is_match("accccccb"));
        assert!(r.is_match("ab"));
        assert!(!r.is_match("abbccb"));

        let mut r = regex("(ba|a(ba)*a)*(ab)*");
        assert!(r.is_match("bababaabababaaba"));
        assert!(r.is_match("ababab"));
        assert!(!r.is_match("abbaba"));
        assert!(!r.is_match("ababa"));
        assert!(r.is_match("aaaaaaaaaaaa"));
        assert!(!r.is_match("aaaaaaaaaabb"));

        let mut r = regex("0?(10)*1?");
        assert!(r.is_match(""));
        assert!(r.is_match("0"));
        assert!(r.is_match("1"));
        assert!(r.is_match("01010101010101"));
        assert!(r.is_match("01010101010"));
        assert!(r.is_match("101010101"));
        assert!(r.is_match("1010101010"));
        assert!(!r.is_match("0110101010"));
        assert!(!r.is_match("10010101010101"));
        assert!(!r.is_match("00110011"));
    }

    #[test]
    fn empty_branches() {
        let mut r = regex("a|");
        assert!(r.is_match("a"));
        assert!(r.is_match(""));
        assert!(!r.is_match("b"));

        let mut r = regex("(|x)y");
        assert!(r.is_match("y"));
        assert!(r.is_match("xy"));
        assert!(!r.is_match("x"));
    }

    #[test]
    fn progressive_scan_latches_on_abort() {
        let mut r = regex("ab+c?");
        r.read('a');
        assert!(!r.matches());
        assert!(!r.aborted());
        r.read('b');
        assert!(r.matches());
        r.read('b');
        assert!(r.matches());
        r.read('c');
        assert!(r.matches());
        r.read('c');
        assert!(!r.matches());
        assert!(r.aborted());
        r.read('a');
        assert!(r.aborted());

        r.reset();
        r.read('a');
        r.read('b');
        assert!(r.matches());
        assert!(!r.aborted());
    }

    #[test]
    fn wildcard() {
        let mut r = regex(".");
        assert!(r.is_match("."));
        assert!(r.is_match("a"));
        assert!(r.is_match("@"));
        assert!(!r.is_match(""));
        assert!(!r.is_match("az"));

        let mut r = regex("a+.*z?");
        assert!(r.is_match("a"));
        assert!(r.is_match("aaaskm@mk94mkz"));
        assert!(!r.is_match("bz"));
        assert!(!r.is_match("z"));

        let mut r = regex(".*@.+@");
        assert!(r.is_match("@a@"));
        assert!(r.is_match("abc@@@"));
        assert!(r.is_match("abc@xyz@"));
        assert!(r.is_match("@@@@@@@@@"));
        assert!(!r.is_match("@a"));
        assert!(!r.is_match("@@"));
    }

    #[test]
    fn character_classes() {
        let mut r = regex("[0-9]+");
        assert!(r.is_match("0"));
        assert!(r.is_match("10239023"));
        assert!(!r.is_match("381933d12938"));
        assert!(!r.is_match(""));
        assert!(!r.is_match("@"));

        let mut r = regex("[A-Za-z_][A-Za-z0-9_]* = [0-9]+");
        assert!(r.is_match("three = 3"));
        assert!(r.is_match("_valid = 77"));
        assert!(r.is_match("_ = 3"));
        assert!(!r.is_match("3ab = 9"));
        assert!(!r.is_match("num$ = 0"));
        assert!(!r.is_match("abc = def"));

        let mut r = regex("[^0-9]+");
        assert!(r.is_match("abc"));
        assert!(!r.is_match("ab1c"));
    }

    #[test]
    fn escape_sequences() {
        let mut r = regex("\\(.*\\)");
        assert!(r.is_match("()"));
        assert!(r.is_match("(abc)"));
        assert!(r.is_match("())))()((()()()()()"));
        assert!(!r.is_match("("));
        assert!(!r.is_match(")("));
        assert!(!r.is_match("(abc)def"));

        let mut r = regex("[0-9]+\\.?[0-9]*|\\.[0-9]+");
        assert!(r.is_match("29302930"));
        assert!(r.is_match("10230.23123"));
        assert!(r.is_match(".8245227"));
        assert!(r.is_match("3.1415926"));
        assert!(r.is_match("965."));
        assert!(!r.is_match(""));
        assert!(!r.is_match("123.456.789"));
        assert!(!r.is_match("."));
        assert!(!r.is_match("1234S6789"));
    }

    #[test]
    fn counted_repetition() {
        let mut r = regex("a{3}b{4}");
        assert!(r.is_match("aaabbbb"));
        assert!(!r.is_match(""));
        assert!(!r.is_match("ab"));
        assert!(!r.is_match("aaabbb"));
        assert!(!r.is_match("aabbbb"));

        let mut r = regex(".{3,8}");
        assert!(r.is_match("@#$"));
        assert!(r.is_match("abcd5678"));
        assert!(!r.is_match(""));
        assert!(!r.is_match("Y"));
        assert!(!r.is_match("123456789"));

        let mut r = regex("a{2,}");
        assert!(r.is_match("aa"));
        assert!(r.is_match("aaaaaaaaaaaaaaa"));
        assert!(!r.is_match("a"));
        assert!(!r.is_match("aaaaaaaaaaaaaaab"));
    }

    #[test]
    fn composite_date_pattern() {
        let mut r = regex(
            "[A-Za-z0-9_ ]+ \\((0[1-9]|[12][0-9]|3[01])\\.(0[1-9]|1[0-2])\\.[0-9]{1,4}\\)",
        );
        assert!(r.is_match("Albert Einstein (14.03.1879)"));
        assert!(r.is_match("Isaac Newton (04.01.1643)"));
        assert!(r.is_match("Marie Curie (07.11.1867)"));
        assert!(r.is_match("Today (30.07.2016)"));
        assert!(r.is_match("1234 (31.12.9999)"));
        assert!(!r.is_match("wtf (32.01.2016)"));
        assert!(!r.is_match("wtf (20.13.2016)"));
        assert!(!r.is_match("wtf (01.01.10000)"));
        assert!(!r.is_match("wtf (01.01.2016"));
        assert!(!r.is_match("(01.01.2016)"));
    }
}
