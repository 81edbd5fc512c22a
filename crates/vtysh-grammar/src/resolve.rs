//! Execution resolver: picks the one command a line invokes.

use log::trace;

use crate::error::MatchError;
use crate::filter::{Candidate, filter_candidates, narrow_or_err};
use crate::matcher::{Argv, MatchContext, MatchStatus, line_status, match_line};
use crate::word::{FilterMode, WordMatch};

/// The winning command and its captured arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub id: usize,
    pub argv: Argv,
}

/// Resolve `words` to exactly one of `candidates`.
///
/// Candidates are narrowed word by word, then every survivor is checked
/// against the whole line. Exactly one complete match wins. An empty line
/// matches nothing.
pub fn resolve(
    mut candidates: Vec<Candidate<'_>>,
    words: &[String],
    filter: FilterMode,
    ctx: &MatchContext<'_>,
) -> Result<Resolution, MatchError> {
    if words.is_empty() {
        return Err(MatchError::NoMatch);
    }

    for (index, word) in words.iter().enumerate() {
        let best = filter_candidates(&mut candidates, words, index, filter, ctx)?;
        if best == WordMatch::Vararg {
            break;
        }
        narrow_or_err(&mut candidates, best, word)?;
    }

    let mut winner = None;
    let mut complete = 0;
    let mut incomplete = 0;
    for cand in &candidates {
        match line_status(cand.tree, words, filter, ctx) {
            MatchStatus::Complete => {
                complete += 1;
                winner.get_or_insert(cand);
            },
            MatchStatus::Incomplete => incomplete += 1,
            _ => {},
        }
    }
    trace!(
        "resolve {:?}: {} complete, {} incomplete of {}",
        words,
        complete,
        incomplete,
        candidates.len()
    );

    let cand = match (complete, winner) {
        (1, Some(cand)) => cand,
        (0, _) if incomplete > 0 => return Err(MatchError::Incomplete),
        (0, _) => return Err(MatchError::NoMatch),
        _ => return Err(MatchError::Ambiguous),
    };

    let (status, argv) = match_line(cand.tree, words, filter, ctx);
    match status {
        MatchStatus::Complete => Ok(Resolution { id: cand.id, argv }),
        MatchStatus::Ambiguous => Err(MatchError::Ambiguous),
        MatchStatus::ExceedArgLimit => Err(MatchError::ExceedArgcMax { max: ctx.argc_max }),
        _ => Err(MatchError::NoMatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use crate::hooks::DynHelpTable;
    use crate::token::TokenTree;

    fn trees(formats: &[&str]) -> Vec<TokenTree> {
        let table = DynHelpTable::new();
        formats
            .iter()
            .map(|f| compile(f, "", "", &table).unwrap())
            .collect()
    }

    fn run(trees: &[TokenTree], line: &str, filter: FilterMode) -> Result<Resolution, MatchError> {
        let cands = trees.iter().enumerate().map(|(i, t)| Candidate::new(i, t)).collect();
        let words: Vec<String> = line.split_whitespace().map(String::from).collect();
        resolve(cands, &words, filter, &MatchContext::default())
    }

    fn relaxed(trees: &[TokenTree], line: &str) -> Result<Resolution, MatchError> {
        run(trees, line, FilterMode::Relaxed)
    }

    #[test]
    fn resolves_abbreviated_command() {
        let t = trees(&["show version", "show interface IFNAME", "configure terminal"]);
        let r = relaxed(&t, "sh int eth0").unwrap();
        assert_eq!(r.id, 1);
        assert_eq!(r.argv.get(0), Some("eth0"));
    }

    #[test]
    fn exact_beats_longer_literal() {
        let t = trees(&["show", "showall"]);
        assert_eq!(relaxed(&t, "show").unwrap().id, 0);
    }

    #[test]
    fn ambiguous_prefix() {
        let t = trees(&["show version", "show vlan"]);
        assert_eq!(relaxed(&t, "show v"), Err(MatchError::Ambiguous));
    }

    #[test]
    fn unknown_and_incomplete() {
        let t = trees(&["show version", "interface IFNAME"]);
        assert_eq!(relaxed(&t, "reboot"), Err(MatchError::NoMatch));
        assert_eq!(relaxed(&t, "interface"), Err(MatchError::Incomplete));
        assert_eq!(relaxed(&t, ""), Err(MatchError::NoMatch));
    }

    #[test]
    fn placeholders_disambiguated_by_trailing_literal() {
        let t = trees(&["user NAME add", "user ID remove"]);
        let r = relaxed(&t, "user bob rem").unwrap();
        assert_eq!(r.id, 1);
        assert_eq!(r.argv.get(0), Some("bob"));
    }

    #[test]
    fn two_complete_readings_are_ambiguous() {
        let t = trees(&["user NAME", "user ID"]);
        assert_eq!(relaxed(&t, "user bob"), Err(MatchError::Ambiguous));
    }

    #[test]
    fn optional_literal_not_confused_with_plain_literal() {
        let t = trees(&["show interface [brief]", "show interface brief WORD"]);
        assert_eq!(relaxed(&t, "show interface br").unwrap().id, 0);
        assert_eq!(relaxed(&t, "show interface brief eth0").unwrap().id, 1);
    }

    #[test]
    fn exact_keyword_slot_selected() {
        let t = trees(&["set {interface X|internal Y|inter Z}"]);
        let r = relaxed(&t, "set inter 5").unwrap();
        assert_eq!(r.argv.values(), &[None, None, Some("5".to_string())]);
        assert_eq!(relaxed(&t, "set inte 5"), Err(MatchError::Ambiguous));
    }

    #[test]
    fn vararg_stops_narrowing() {
        let t = trees(&["echo .MESSAGE", "show version"]);
        let r = relaxed(&t, "echo show version now").unwrap();
        assert_eq!(r.id, 0);
        assert_eq!(r.argv.len(), 3);
    }

    #[test]
    fn strict_filter_requires_full_words() {
        let t = trees(&["show version"]);
        assert_eq!(run(&t, "sh ver", FilterMode::Strict), Err(MatchError::NoMatch));
        assert!(run(&t, "show version", FilterMode::Strict).is_ok());
    }

    #[test]
    fn partial_prefix_address_is_incomplete() {
        let t = trees(&["ip route A.B.C.D/M A.B.C.D"]);
        assert_eq!(relaxed(&t, "ip route 10.0.0.0/ 1.1.1.1"), Err(MatchError::Incomplete));
    }

    #[test]
    fn argument_overflow_reported_with_limit() {
        let t = trees(&["echo .MESSAGE"]);
        let cands = vec![Candidate::new(0, &t[0])];
        let words: Vec<String> = "echo a b c".split(' ').map(String::from).collect();
        let err = resolve(cands, &words, FilterMode::Relaxed, &MatchContext::permissive(2)).unwrap_err();
        assert_eq!(err, MatchError::ExceedArgcMax { max: 2 });
    }
}
