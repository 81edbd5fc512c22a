//! Matcher engine: walks one command's token tree over the words of a line.
//!
//! The walk serves two callers. The candidate filter asks "how does this
//! command see the word at position N?" and gets back the terminals that
//! accepted that word ([`match_at`]). The resolver asks "does this command
//! consume the whole line, and with which arguments?" ([`match_line`]).
//!
//! Argument capture follows declaration order. Literals contribute nothing,
//! every other terminal contributes the word it matched, and keyword groups
//! contribute one entry per slot argument whether or not the slot was used,
//! so that handlers can index arguments positionally.

use crate::hooks::{DomainMatchers, PermissiveMatchers};
use crate::token::{KeywordSlot, SlotToken, Terminal, Token, TokenTree};
use crate::word::{FilterMode, WordMatch, match_word};

/// Argument ceiling used when the configuration does not set one.
pub const DEFAULT_ARGC_MAX: usize = 25;

/// Position value meaning "match the whole line".
pub const WHOLE_LINE: usize = usize::MAX;

/// Result of walking one command over a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// Every token up to the position of interest matched.
    Ok,
    /// The command consumed the entire line.
    Complete,
    /// The line ended before a mandatory token.
    Incomplete,
    NoMatch,
    /// A keyword group could not decide between two slots.
    Ambiguous,
    /// More values than the argument ceiling.
    ExceedArgLimit,
}

impl MatchStatus {
    /// Whether the walk stopped without matching.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            MatchStatus::Incomplete
                | MatchStatus::NoMatch
                | MatchStatus::Ambiguous
                | MatchStatus::ExceedArgLimit
        )
    }
}

/// Collaborators and limits a match runs with.
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
    pub domain: &'a dyn DomainMatchers,
    pub argc_max: usize,
}

impl MatchContext<'static> {
    /// A context with no domain validators wired in.
    pub fn permissive(argc_max: usize) -> Self {
        Self {
            domain: &PermissiveMatchers,
            argc_max,
        }
    }
}

impl Default for MatchContext<'static> {
    fn default() -> Self {
        Self::permissive(DEFAULT_ARGC_MAX)
    }
}

/// Captured argument values in declaration order. `None` marks an absent
/// value (an unused keyword slot, or an empty word).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Argv {
    values: Vec<Option<String>>,
}

impl Argv {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`. Slots past the end read as absent, like the unused
    /// tail of a fixed-size argument array.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.values.iter().map(|v| v.as_deref())
    }
}

/// A terminal that accepted the word at the position of interest.
#[derive(Debug, Clone, Copy)]
pub struct Matched<'t> {
    pub kind: WordMatch,
    pub terminal: &'t Terminal,
}

/// Outcome of [`match_at`].
#[derive(Debug, Clone)]
pub struct PositionMatch<'t> {
    pub status: MatchStatus,
    /// Best rank among `matched`, `NoMatch` if nothing was recorded.
    pub best: WordMatch,
    pub matched: Vec<Matched<'t>>,
}

/// Match `words` against `tree` up to and including `position`, recording
/// every terminal that accepted the word at `position`.
pub fn match_at<'t>(
    tree: &'t TokenTree,
    words: &[String],
    position: usize,
    filter: FilterMode,
    ctx: &MatchContext<'_>,
) -> PositionMatch<'t> {
    let mut walk = Walk::new(words, filter, position, ctx, true);
    let status = walk.run(tree, None);
    PositionMatch {
        status,
        best: walk.best,
        matched: walk.matched,
    }
}

/// Match the whole line and capture its arguments.
///
/// The status is `Complete` only if every word was consumed (a single
/// trailing empty word is tolerated).
pub fn match_line(
    tree: &TokenTree,
    words: &[String],
    filter: FilterMode,
    ctx: &MatchContext<'_>,
) -> (MatchStatus, Argv) {
    let mut args = ArgBuffer::new(ctx.argc_max);
    let mut walk = Walk::new(words, filter, WHOLE_LINE, ctx, false);
    let status = walk.run(tree, Some(&mut args));
    (status, Argv { values: args.values })
}

/// Whole-line status without capturing arguments.
pub fn line_status(
    tree: &TokenTree,
    words: &[String],
    filter: FilterMode,
    ctx: &MatchContext<'_>,
) -> MatchStatus {
    Walk::new(words, filter, WHOLE_LINE, ctx, false).run(tree, None)
}

// ---------------------------------------------------------------------------
// Argument buffer
// ---------------------------------------------------------------------------

struct Overflow;

struct ArgBuffer {
    values: Vec<Option<String>>,
    cap: usize,
}

impl ArgBuffer {
    fn new(cap: usize) -> Self {
        Self {
            values: Vec::new(),
            cap,
        }
    }

    fn push(&mut self, value: Option<&str>) -> Result<(), Overflow> {
        self.push_owned(value.map(str::to_string))
    }

    fn push_owned(&mut self, value: Option<String>) -> Result<(), Overflow> {
        if self.values.len() >= self.cap {
            return Err(Overflow);
        }
        self.values.push(value.filter(|v| !v.is_empty()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// The walk
// ---------------------------------------------------------------------------

struct Walk<'t, 'w> {
    words: &'w [String],
    filter: FilterMode,
    position: usize,
    word_index: usize,
    domain: &'w dyn DomainMatchers,
    argc_max: usize,
    recording: bool,
    best: WordMatch,
    matched: Vec<Matched<'t>>,
}

impl<'t, 'w> Walk<'t, 'w> {
    fn new(
        words: &'w [String],
        filter: FilterMode,
        position: usize,
        ctx: &MatchContext<'w>,
        recording: bool,
    ) -> Self {
        Self {
            words,
            filter,
            position,
            word_index: 0,
            domain: ctx.domain,
            argc_max: ctx.argc_max,
            recording,
            best: WordMatch::NoMatch,
            matched: Vec::new(),
        }
    }

    fn words_left(&self) -> bool {
        self.word_index < self.words.len()
    }

    fn current(&self) -> &'w str {
        let words = self.words;
        &words[self.word_index]
    }

    fn past_position(&self) -> bool {
        self.word_index > self.position
    }

    fn record(&mut self, kind: WordMatch, terminal: &'t Terminal) {
        if self.recording && self.word_index == self.position {
            self.matched.push(Matched { kind, terminal });
            self.best = self.best.max(kind);
        }
    }

    fn run(&mut self, tree: &'t TokenTree, mut args: Option<&mut ArgBuffer>) -> MatchStatus {
        for token in tree.tokens() {
            let rv = match token {
                Token::Terminal(t) => self.terminal(t, args.as_deref_mut()),
                Token::Multiple(alts) => self.multiple(alts, args.as_deref_mut()),
                Token::Keyword(slots) => self.keyword(slots, args.as_deref_mut()),
            };
            if rv.is_failure() {
                return rv;
            }
            if self.past_position() {
                return MatchStatus::Ok;
            }
        }

        let total = self.words.len();
        if self.word_index >= total
            || (self.word_index + 1 == total && self.words[self.word_index].is_empty())
        {
            MatchStatus::Complete
        } else {
            MatchStatus::NoMatch
        }
    }

    fn terminal(&mut self, t: &'t Terminal, mut args: Option<&mut ArgBuffer>) -> MatchStatus {
        if !self.words_left() {
            // A missing optional value is simply not captured.
            return if t.is_option() {
                MatchStatus::Ok
            } else {
                MatchStatus::Incomplete
            };
        }
        let word = self.current();
        let kind = match_word(t, self.filter, word, self.domain);
        if kind == WordMatch::NoMatch {
            return MatchStatus::NoMatch;
        }
        if t.records()
            && let Some(args) = args.as_deref_mut()
            && args.push(Some(t.literal().unwrap_or(word))).is_err()
        {
            return MatchStatus::ExceedArgLimit;
        }
        self.record(kind, t);
        self.word_index += 1;

        if t.is_vararg() {
            while self.words_left() {
                let word = self.current();
                if !word.is_empty()
                    && let Some(args) = args.as_deref_mut()
                    && args.push(Some(word)).is_err()
                {
                    return MatchStatus::ExceedArgLimit;
                }
                self.word_index += 1;
            }
        }
        MatchStatus::Ok
    }

    fn multiple(&mut self, alts: &'t [Terminal], args: Option<&mut ArgBuffer>) -> MatchStatus {
        if !self.words_left() {
            return MatchStatus::Incomplete;
        }
        let word = self.current();
        let mut best = WordMatch::NoMatch;
        let mut value: &str = word;
        for alt in alts {
            let kind = match_word(alt, self.filter, word, self.domain);
            if kind == WordMatch::NoMatch {
                continue;
            }
            self.record(kind, alt);
            // Equal ranks keep the earlier alternative.
            if kind > best {
                best = kind;
                value = alt.literal().unwrap_or(word);
            }
        }
        self.word_index += 1;

        if best == WordMatch::NoMatch {
            return MatchStatus::NoMatch;
        }
        if let Some(args) = args
            && args.push(Some(value)).is_err()
        {
            return MatchStatus::ExceedArgLimit;
        }
        MatchStatus::Ok
    }

    fn keyword(&mut self, slots: &'t [KeywordSlot], args: Option<&mut ArgBuffer>) -> MatchStatus {
        let mut used = vec![false; slots.len()];
        let mut captured: Vec<Option<ArgBuffer>> = slots.iter().map(|_| None).collect();
        let collecting = args.is_some();

        let read = self.read_keywords(slots, &mut used, collecting.then_some(&mut captured));
        if read.is_failure() {
            return read;
        }
        match args {
            Some(args) => match flatten_slots(slots, &used, captured, args) {
                Ok(()) => read,
                Err(Overflow) => MatchStatus::ExceedArgLimit,
            },
            None => read,
        }
    }

    fn read_keywords(
        &mut self,
        slots: &'t [KeywordSlot],
        used: &mut [bool],
        mut captured: Option<&mut Vec<Option<ArgBuffer>>>,
    ) -> MatchStatus {
        loop {
            if !self.words_left() {
                return MatchStatus::Ok;
            }
            let word = self.current();
            let mut found = None;
            let mut best = WordMatch::NoMatch;
            let mut tied = false;
            for (i, slot) in slots.iter().enumerate() {
                if used[i] {
                    continue;
                }
                let kind = match_word(&slot.keyword, self.filter, word, self.domain);
                if kind == WordMatch::NoMatch {
                    continue;
                }
                self.record(kind, &slot.keyword);
                if kind > best {
                    best = kind;
                    found = Some(i);
                    tied = false;
                } else if kind == best {
                    tied = true;
                }
            }
            // A tie at the best rank is only tolerable while listing what
            // could come next at the position of interest.
            if tied && (self.word_index != self.position || captured.is_some()) {
                return MatchStatus::Ambiguous;
            }
            let Some(found) = found else {
                return MatchStatus::NoMatch;
            };
            self.word_index += 1;
            if self.past_position() {
                return MatchStatus::Ok;
            }
            used[found] = true;

            let cap = self.argc_max;
            let mut slot_args = captured
                .as_deref_mut()
                .map(|c| c[found].insert(ArgBuffer::new(cap)));
            for arg in &slots[found].args {
                let rv = match arg {
                    SlotToken::Terminal(t) => self.terminal(t, slot_args.as_deref_mut()),
                    SlotToken::Multiple(alts) => self.multiple(alts, slot_args.as_deref_mut()),
                };
                if rv.is_failure() {
                    return rv;
                }
                if self.past_position() {
                    return MatchStatus::Ok;
                }
            }
        }
    }
}

/// Lay keyword results out in declared slot order.
fn flatten_slots(
    slots: &[KeywordSlot],
    used: &[bool],
    captured: Vec<Option<ArgBuffer>>,
    out: &mut ArgBuffer,
) -> Result<(), Overflow> {
    for ((slot, &was_used), sub) in slots.iter().zip(used).zip(captured) {
        if slot.args.is_empty() {
            // Bare keywords report which ones fired.
            out.push(was_used.then_some(slot.keyword.text()))?;
        } else if let Some(sub) = sub {
            for value in sub.values {
                out.push_owned(value)?;
            }
        } else {
            for _ in 0..slot.value_arity() {
                out.push(None)?;
            }
        }
    }
    Ok(())
}
