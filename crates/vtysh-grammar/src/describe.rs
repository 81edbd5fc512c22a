//! Interactive help (`?`) and TAB completion.
//!
//! Both walk the line the way the resolver does, narrowing candidates word
//! by word, then look at what the survivors accept at the last word. The
//! last word is often empty: the operator typed a space and asked what may
//! follow.

use log::warn;

use crate::error::MatchError;
use crate::filter::{Candidate, filter_candidates, narrow_or_err};
use crate::matcher::{MatchContext, MatchStatus, line_status};
use crate::token::{Class, Terminal};
use crate::word::{FilterMode, WordMatch, match_word};

/// Marker entry meaning "the line is valid as typed".
pub const CR_LITERAL: &str = "<cr>";

/// One row of the help table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    /// Literal or placeholder, as written in the grammar.
    pub literal: String,
    pub help: String,
}

impl HelpEntry {
    fn new(literal: &str, help: String) -> Self {
        Self {
            literal: literal.to_string(),
            help,
        }
    }

    pub fn is_cr(&self) -> bool {
        self.literal == CR_LITERAL
    }
}

/// Help table for a line, sorted by literal with any `<cr>` entry last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Description {
    pub entries: Vec<HelpEntry>,
    /// Literals whose help text differed between commands.
    pub conflicts: usize,
}

impl Description {
    pub fn literals(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.literal.as_str()).collect()
    }

    fn insert(&mut self, literal: &str, help: String, conflict_text: &str) {
        match self.entries.iter_mut().find(|e| e.literal == literal) {
            Some(existing) if existing.help != help && existing.help != conflict_text => {
                warn!(
                    "help for {literal:?} differs between commands: {:?} vs {:?}",
                    existing.help, help
                );
                existing.help = conflict_text.to_string();
                self.conflicts += 1;
            },
            Some(_) => {},
            None => self.entries.push(HelpEntry::new(literal, help)),
        }
    }

    fn finish(mut self, valid_as_is: bool) -> Result<Self, MatchError> {
        self.entries.sort_by(|a, b| a.literal.cmp(&b.literal));
        if valid_as_is {
            self.entries.push(HelpEntry::new(CR_LITERAL, String::new()));
        }
        if self.entries.is_empty() {
            Err(MatchError::NoMatch)
        } else {
            Ok(self)
        }
    }
}

/// Outcome of a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A single literal fits: replace the word with it.
    Full(String),
    /// Several literals share a prefix longer than the typed word.
    Partial(String),
    /// Several literals diverge right away; show them all, sorted.
    List(Vec<String>),
}

enum Stop {
    LastWord,
    /// A vararg swallowed the rest of the line.
    Vararg,
}

/// Narrow through every word but the last, then filter at the last.
fn narrow_to_last(
    candidates: &mut Vec<Candidate<'_>>,
    words: &[String],
    ctx: &MatchContext<'_>,
) -> Result<Stop, MatchError> {
    let last = words.len() - 1;
    for (index, word) in words[..last].iter().enumerate() {
        let best = filter_candidates(candidates, words, index, FilterMode::Relaxed, ctx)?;
        if best == WordMatch::Vararg {
            return Ok(Stop::Vararg);
        }
        narrow_or_err(candidates, best, word)?;
    }
    filter_candidates(candidates, words, last, FilterMode::Relaxed, ctx)?;
    Ok(Stop::LastWord)
}

/// The text a matched terminal contributes to the help table, if any.
fn entry_literal<'t>(terminal: &'t Terminal, word: &str, ctx: &MatchContext<'_>) -> Option<&'t str> {
    match terminal.class() {
        Class::Word => terminal.text().starts_with(word).then(|| terminal.text()),
        Class::Variable | Class::Option(_) | Class::Vararg | Class::Range(_) | Class::Domain(_) => {
            Some(terminal.text())
        },
        Class::Ipv4 | Class::Ipv4Prefix | Class::Ipv4Netmask | Class::Ipv6 | Class::Ipv6Prefix => {
            (match_word(terminal, FilterMode::Relaxed, word, ctx.domain) != WordMatch::NoMatch)
                .then(|| terminal.text())
        },
    }
}

fn with_trailing_word(words: &[String]) -> Vec<String> {
    if words.is_empty() {
        vec![String::new()]
    } else {
        words.to_vec()
    }
}

/// Build the help table for the last word of `words`.
///
/// `conflict_text` replaces the help of a literal that two commands
/// describe differently.
pub fn describe(
    mut candidates: Vec<Candidate<'_>>,
    words: &[String],
    ctx: &MatchContext<'_>,
    conflict_text: &str,
) -> Result<Description, MatchError> {
    let words = with_trailing_word(words);
    let last = words.len() - 1;
    let mut desc = Description::default();

    if let Stop::Vararg = narrow_to_last(&mut candidates, &words, ctx)? {
        for cand in &candidates {
            for m in cand.matched.iter().filter(|m| m.terminal.is_vararg()) {
                desc.insert(m.terminal.text(), m.terminal.display_help(), conflict_text);
            }
        }
        return desc.finish(true);
    }

    let word = words[last].as_str();
    for cand in &candidates {
        for m in &cand.matched {
            if let Some(literal) = entry_literal(m.terminal, word, ctx) {
                desc.insert(literal, m.terminal.display_help(), conflict_text);
            }
        }
    }

    let valid_as_is = word.is_empty()
        && candidates.iter().any(|c| {
            line_status(c.tree, &words[..last], FilterMode::Relaxed, ctx) == MatchStatus::Complete
        });
    desc.finish(valid_as_is)
}

/// Complete the last word of `words` against the literals that may follow.
pub fn complete(
    mut candidates: Vec<Candidate<'_>>,
    words: &[String],
    ctx: &MatchContext<'_>,
) -> Result<Completion, MatchError> {
    let words = with_trailing_word(words);
    let word = words[words.len() - 1].as_str();

    let mut found: Vec<&str> = Vec::new();
    if let Stop::LastWord = narrow_to_last(&mut candidates, &words, ctx)? {
        for m in candidates.iter().flat_map(|c| &c.matched) {
            let t = m.terminal;
            if matches!(t.class(), Class::Word) && t.text().starts_with(word) {
                found.push(t.text());
            }
        }
    }
    found.sort_unstable();
    found.dedup();

    match found.as_slice() {
        [] if word.is_empty() => Err(MatchError::NothingToDo),
        [] => Err(MatchError::NoMatch),
        [only] => Ok(Completion::Full((*only).to_string())),
        many => {
            let prefix = common_prefix(many);
            if prefix.len() > word.len() {
                Ok(Completion::Partial(prefix.to_string()))
            } else {
                Ok(Completion::List(many.iter().map(|s| s.to_string()).collect()))
            }
        },
    }
}

fn common_prefix<'a>(items: &[&'a str]) -> &'a str {
    let Some((first, rest)) = items.split_first() else {
        return "";
    };
    let mut len = first.len();
    for item in rest {
        len = first
            .char_indices()
            .zip(item.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8())
            .min(len);
    }
    &first[..len]
}
