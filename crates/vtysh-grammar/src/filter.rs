//! Candidate filter: narrows a mode's commands one word position at a time.

use crate::error::MatchError;
use crate::matcher::{MatchContext, MatchStatus, Matched, match_at};
use crate::token::TokenTree;
use crate::word::{FilterMode, Validity, WordMatch, ipv4_prefix, ipv6_prefix};

/// A command still in the running, with the terminals that accepted the
/// word at the last filtered position.
#[derive(Debug, Clone)]
pub struct Candidate<'t> {
    /// Caller's handle for the command (its index in the mode).
    pub id: usize,
    pub tree: &'t TokenTree,
    pub matched: Vec<Matched<'t>>,
}

impl<'t> Candidate<'t> {
    pub fn new(id: usize, tree: &'t TokenTree) -> Self {
        Self {
            id,
            tree,
            matched: Vec::new(),
        }
    }
}

/// Verdict of the ambiguity check at one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narrowing {
    /// Survivors agree on a single reading of the word.
    Unique,
    /// Two different literals fit the word equally well.
    Ambiguous,
    /// The word is a partially typed prefix address.
    Incomplete,
}

/// Match every candidate up to `position`, dropping those that fail.
///
/// Returns the best rank any survivor achieved at `position`. A candidate
/// reporting an ambiguous keyword group or an argument overflow aborts the
/// whole pass.
pub fn filter_candidates<'t>(
    candidates: &mut Vec<Candidate<'t>>,
    words: &[String],
    position: usize,
    filter: FilterMode,
    ctx: &MatchContext<'_>,
) -> Result<WordMatch, MatchError> {
    let mut best = WordMatch::NoMatch;
    let mut survivors = Vec::with_capacity(candidates.len());
    for mut cand in candidates.drain(..) {
        let m = match_at(cand.tree, words, position, filter, ctx);
        match m.status {
            MatchStatus::Ambiguous => return Err(MatchError::Ambiguous),
            MatchStatus::ExceedArgLimit => {
                return Err(MatchError::ExceedArgcMax { max: ctx.argc_max });
            },
            MatchStatus::NoMatch | MatchStatus::Incomplete => continue,
            MatchStatus::Ok | MatchStatus::Complete => {},
        }
        best = best.max(m.best);
        cand.matched = m.matched;
        survivors.push(cand);
    }
    *candidates = survivors;
    Ok(best)
}

/// Check the survivors' readings of `word` at rank `best` and drop the
/// candidates that only reached a lower rank.
///
/// Candidates that recorded nothing at the position (the line ended inside
/// them, or they stopped short) are kept.
pub fn narrow(candidates: &mut Vec<Candidate<'_>>, best: WordMatch, word: &str) -> Narrowing {
    let mut literal: Option<&str> = None;
    let mut verdict = Narrowing::Unique;
    let mut keep = Vec::with_capacity(candidates.len());

    for cand in candidates.iter() {
        if cand.matched.is_empty() {
            keep.push(true);
            continue;
        }
        let mut hits = 0;
        for m in cand.matched.iter().filter(|m| m.kind == best) {
            hits += 1;
            match best {
                // Exact readings all equal the word, so they never disagree
                // once options are unwrapped to their literal.
                WordMatch::Partly
                | WordMatch::Range
                | WordMatch::RangeComma
                | WordMatch::RangeList
                | WordMatch::RangeCommaList
                | WordMatch::Exact => {
                    let text = m.terminal.literal().unwrap_or(m.terminal.text());
                    match literal {
                        Some(seen) if seen != text => verdict = Narrowing::Ambiguous,
                        Some(_) => {},
                        None => literal = Some(text),
                    }
                },
                WordMatch::Ipv4Prefix if ipv4_prefix(word) == Validity::Partial => {
                    verdict = Narrowing::Incomplete;
                },
                WordMatch::Ipv6Prefix if ipv6_prefix(word) == Validity::Partial => {
                    verdict = Narrowing::Incomplete;
                },
                _ => {},
            }
        }
        keep.push(hits > 0);
        if verdict != Narrowing::Unique {
            return verdict;
        }
    }

    let mut flags = keep.into_iter();
    candidates.retain(|_| flags.next().unwrap_or(true));
    Narrowing::Unique
}

/// Run [`narrow`] and map its verdict to an error.
pub(crate) fn narrow_or_err(
    candidates: &mut Vec<Candidate<'_>>,
    best: WordMatch,
    word: &str,
) -> Result<(), MatchError> {
    match narrow(candidates, best, word) {
        Narrowing::Unique => Ok(()),
        Narrowing::Ambiguous => Err(MatchError::Ambiguous),
        Narrowing::Incomplete => Err(MatchError::Incomplete),
    }
}
