//! Grammar construction and line matching errors.

use std::fmt;

/// A malformed format string. Raised once, while commands are installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// The format string being compiled.
    pub format: String,
    /// 1-based column of the offending character.
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LEAD: &str = "Error parsing command: \"";
        writeln!(f, "{LEAD}{}\"", self.format)?;
        writeln!(f, "{:>width$}", '^', width = LEAD.len() + self.offset)?;
        write!(f, "{} at offset {}.", self.message, self.offset)
    }
}

impl std::error::Error for CompileError {}

/// Why a line did not resolve to exactly one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("% Unknown command.")]
    NoMatch,

    #[error("% Command incomplete.")]
    Incomplete,

    #[error("% Ambiguous command.")]
    Ambiguous,

    #[error("% Too many arguments (limit {max}).")]
    ExceedArgcMax { max: usize },

    /// Completion was requested on an empty word with nothing to offer.
    #[error("% Nothing to complete.")]
    NothingToDo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_points_at_offset() {
        let e = CompileError {
            format: "show (a|b".into(),
            offset: 10,
            message: "Unclosed group/keyword".into(),
        };
        let text = e.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Error parsing command: \"show (a|b\"");
        // The caret sits under the 10th character of the format string.
        let caret = lines[1].find('^').unwrap();
        let quote = lines[0].find('"').unwrap();
        assert_eq!(caret, quote + 10);
        assert_eq!(lines[2], "Unclosed group/keyword at offset 10.");
    }

    #[test]
    fn match_error_messages() {
        assert_eq!(MatchError::NoMatch.to_string(), "% Unknown command.");
        assert_eq!(MatchError::Incomplete.to_string(), "% Command incomplete.");
        assert_eq!(MatchError::Ambiguous.to_string(), "% Ambiguous command.");
        assert_eq!(
            MatchError::ExceedArgcMax { max: 25 }.to_string(),
            "% Too many arguments (limit 25)."
        );
    }
}
