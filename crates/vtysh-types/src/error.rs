//! Error types for the vtysh grammar engine.

use std::io;

/// Errors produced outside of line matching: configuration, grammar
/// installation, and command execution.
///
/// Matching outcomes (unknown, incomplete, ambiguous input) are not errors
/// in this sense; the grammar crate returns them as values.
#[derive(Debug, thiserror::Error)]
pub enum VtyshError {
    #[error("config error: {0}")]
    Config(String),

    #[error("grammar error: {0}")]
    Grammar(String),

    #[error("unknown mode: {0}")]
    UnknownMode(String),

    #[error("command error: {0}")]
    Command(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, VtyshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let e = VtyshError::Config("missing key".into());
        assert_eq!(format!("{e}"), "config error: missing key");
    }

    #[test]
    fn grammar_error_display() {
        let e = VtyshError::Grammar("Unbalanced parenthesis.".into());
        assert_eq!(format!("{e}"), "grammar error: Unbalanced parenthesis.");
    }

    #[test]
    fn unknown_mode_display() {
        let e = VtyshError::UnknownMode("router-bgp".into());
        assert_eq!(format!("{e}"), "unknown mode: router-bgp");
    }

    #[test]
    fn command_error_display() {
        let e = VtyshError::Command("no such action".into());
        assert_eq!(format!("{e}"), "command error: no such action");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: VtyshError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let bad_toml = "this is [[[not valid toml";
        let toml_err = toml::from_str::<toml::Value>(bad_toml).unwrap_err();
        let e: VtyshError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn result_alias_err() {
        let r: Result<i32> = Err(VtyshError::Grammar("oops".into()));
        assert!(r.is_err());
    }
}
