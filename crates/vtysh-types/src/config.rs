//! Shell configuration and the command definition schema.
//!
//! A definition file is TOML: top-level settings, then `[[mode]]` tables
//! describing the modes and `[[command]]` tables describing the commands
//! installed into them.
//!
//! ```toml
//! hostname = "leaf1"
//! exec_mode = "enable"
//!
//! [[mode]]
//! name = "enable"
//! prompt = "%s# "
//!
//! [[command]]
//! modes = ["enable"]
//! format = "show version"
//! help = """
//! Show running system information
//! Displays software version"""
//! action = "show-version"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, VtyshError};

/// Top-level shell configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    /// Hostname substituted for `%s` in prompts.
    #[serde(default = "default_hostname")]
    pub hostname: String,
    /// Maximum number of values a single command may capture.
    #[serde(default = "default_argc_max")]
    pub argc_max: usize,
    /// Description shown when two help entries share a literal but not a
    /// help text.
    #[serde(default = "default_help_conflict_text")]
    pub help_conflict_text: String,
    /// `env_logger` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Mode that `do`-prefixed lines are resolved in.
    #[serde(default)]
    pub exec_mode: Option<String>,
    /// Mode the shell starts in (defaults to the first declared mode).
    #[serde(default)]
    pub start_mode: Option<String>,
    #[serde(default, rename = "mode")]
    pub modes: Vec<ModeDef>,
    #[serde(default, rename = "command")]
    pub commands: Vec<CommandDef>,
}

fn default_hostname() -> String {
    "switch".to_string()
}
fn default_argc_max() -> usize {
    25
}
fn default_help_conflict_text() -> String {
    "(help text differs between commands)".to_string()
}
fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            argc_max: default_argc_max(),
            help_conflict_text: default_help_conflict_text(),
            log_filter: default_log_filter(),
            exec_mode: None,
            start_mode: None,
            modes: Vec::new(),
            commands: Vec::new(),
        }
    }
}

/// One `[[mode]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ModeDef {
    pub name: String,
    /// Prompt template; `%s` is replaced by the hostname.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Mode to retry in when a line does not resolve here.
    #[serde(default)]
    pub parent: Option<String>,
    /// Whether `do <exec command>` is accepted in this mode.
    #[serde(default)]
    pub allow_do: bool,
}

fn default_prompt() -> String {
    "%s> ".to_string()
}

/// One `[[command]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandDef {
    /// Modes the command is installed into.
    pub modes: Vec<String>,
    /// Grammar format string, e.g. `"ip route A.B.C.D/M (A.B.C.D|INTERFACE)"`.
    pub format: String,
    /// Newline separated help, one line per grammar atom.
    #[serde(default)]
    pub help: String,
    /// Newline separated dynamic-help callback names, one per atom.
    #[serde(default)]
    pub dyn_help: String,
    /// Name of the action the shell binds to this command.
    pub action: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub not_enabled: bool,
    #[serde(default)]
    pub no_lock: bool,
    #[serde(default)]
    pub non_standard: bool,
}

impl ShellConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ShellConfig = toml::from_str(text)?;
        config.validate()?;
        log::debug!(
            "parsed shell config: {} modes, {} commands",
            config.modes.len(),
            config.commands.len()
        );
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| VtyshError::Config(format!("{}: {e}", path.display())))
    }

    /// Mode the shell should start in.
    pub fn initial_mode(&self) -> Option<&str> {
        self.start_mode
            .as_deref()
            .or_else(|| self.modes.first().map(|m| m.name.as_str()))
    }

    fn validate(&self) -> Result<()> {
        if self.argc_max == 0 {
            return Err(VtyshError::Config("argc_max must be at least 1".into()));
        }
        let known = |name: &str| self.modes.iter().any(|m| m.name == name);
        for mode in &self.modes {
            if let Some(parent) = &mode.parent
                && !known(parent)
            {
                return Err(VtyshError::UnknownMode(parent.clone()));
            }
        }
        for name in self.exec_mode.iter().chain(self.start_mode.iter()) {
            if !known(name) {
                return Err(VtyshError::UnknownMode(name.clone()));
            }
        }
        for cmd in &self.commands {
            if let Some(missing) = cmd.modes.iter().find(|m| !known(m)) {
                return Err(VtyshError::UnknownMode(missing.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
hostname = "leaf1"
exec_mode = "enable"

[[mode]]
name = "enable"
prompt = "%s# "

[[mode]]
name = "config"
prompt = "%s(config)# "
parent = "enable"
allow_do = true

[[command]]
modes = ["enable"]
format = "show version"
help = """
Show running system information
Displays software version"""
action = "show-version"

[[command]]
modes = ["config"]
format = "hostname WORD"
action = "hostname"
hidden = true
"#;

    #[test]
    fn parses_modes_and_commands() {
        let cfg = ShellConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cfg.hostname, "leaf1");
        assert_eq!(cfg.modes.len(), 2);
        assert_eq!(cfg.modes[1].parent.as_deref(), Some("enable"));
        assert!(cfg.modes[1].allow_do);
        assert_eq!(cfg.commands.len(), 2);
        assert!(cfg.commands[1].hidden);
        assert!(!cfg.commands[0].hidden);
        assert_eq!(cfg.commands[0].help.lines().count(), 2);
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg = ShellConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.hostname, "switch");
        assert_eq!(cfg.argc_max, 25);
        assert_eq!(cfg.log_filter, "warn");
        assert!(cfg.modes.is_empty());
        assert!(cfg.initial_mode().is_none());
    }

    #[test]
    fn initial_mode_prefers_start_mode() {
        let mut cfg = ShellConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cfg.initial_mode(), Some("enable"));
        cfg.start_mode = Some("config".into());
        assert_eq!(cfg.initial_mode(), Some("config"));
    }

    #[test]
    fn zero_argc_max_rejected() {
        let err = ShellConfig::from_toml_str("argc_max = 0").unwrap_err();
        assert!(format!("{err}").contains("argc_max"));
    }

    #[test]
    fn command_in_unknown_mode_rejected() {
        let text = r#"
[[mode]]
name = "enable"

[[command]]
modes = ["nowhere"]
format = "show version"
action = "show-version"
"#;
        match ShellConfig::from_toml_str(text) {
            Err(VtyshError::UnknownMode(m)) => assert_eq!(m, "nowhere"),
            other => panic!("expected unknown mode, got {other:?}"),
        }
    }

    #[test]
    fn unknown_parent_rejected() {
        let text = r#"
[[mode]]
name = "config"
parent = "enable"
"#;
        assert!(matches!(
            ShellConfig::from_toml_str(text),
            Err(VtyshError::UnknownMode(_))
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            ShellConfig::from_toml_str("[[mode]\nname ="),
            Err(VtyshError::TomlParse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vtysh.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = ShellConfig::load(&path).unwrap();
        assert_eq!(cfg.commands[0].action, "show-version");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ShellConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, VtyshError::Io(_)));
    }
}
