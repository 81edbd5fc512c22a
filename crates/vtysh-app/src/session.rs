//! One operator session: the current mode, the registry, and line handling.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use vtysh_grammar::{
    Completion, Description, DomainMatchers, ModeId, Registry, split_for_help, split_line,
};
use vtysh_types::config::ShellConfig;
use vtysh_types::error::{Result, VtyshError};

use crate::actions::{Action, InterfaceConfig, Outcome, RunningConfig};

const CONFIG_MODE: &str = "config";
const INTERFACE_MODE: &str = "interface";

/// Name validators for the demo device.
struct DemoMatchers;

impl DomainMatchers for DemoMatchers {
    fn is_ifname(&self, word: &str) -> bool {
        word.starts_with(|c: char| c.is_ascii_alphabetic())
            && word.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-'))
    }

    fn is_vlan(&self, word: &str) -> bool {
        word.parse::<u16>().is_ok_and(|v| (1..=4094).contains(&v))
    }

    fn is_mac(&self, word: &str) -> bool {
        let parts: Vec<&str> = word.split(':').collect();
        parts.len() == 6
            && parts
                .iter()
                .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
    }
}

pub struct Session {
    registry: Registry<Action>,
    mode: ModeId,
    exec: ModeId,
    config: ModeId,
    iface_mode: ModeId,
    interface: Option<String>,
    running: Arc<Mutex<RunningConfig>>,
    default_hostname: String,
    finished: bool,
}

impl Session {
    /// Build the registry from `config` and start in its initial mode.
    pub fn new(config: &ShellConfig) -> Result<Self> {
        let running = Arc::new(Mutex::new(RunningConfig {
            hostname: config.hostname.clone(),
            ..Default::default()
        }));

        let mut registry: Registry<Action> = Registry::from_config(config)?;
        registry.set_domain_matchers(DemoMatchers);
        let known = Arc::clone(&running);
        registry.register_dyn_help("ifnames", move |_| {
            let running = lock(&known);
            if running.interfaces.is_empty() {
                String::new()
            } else {
                let names: Vec<&str> = running.interfaces.keys().map(String::as_str).collect();
                format!("Interface's name (configured: {})", names.join(", "))
            }
        });
        registry.install_defs(config, |def| def.action.parse::<Action>())?;

        let global = Arc::clone(&running);
        registry.set_config_writer(CONFIG_MODE, move |out| lock(&global).write_global(out))?;
        let interfaces = Arc::clone(&running);
        registry.set_config_writer(INTERFACE_MODE, move |out| lock(&interfaces).write_interfaces(out))?;

        let require = |name: &str| {
            registry
                .mode_id(name)
                .ok_or_else(|| VtyshError::UnknownMode(name.to_string()))
        };
        let exec = match registry.exec_mode() {
            Some(id) => id,
            None => return Err(VtyshError::Config("exec_mode is not set".into())),
        };
        let mode = require(config.initial_mode().unwrap_or(CONFIG_MODE))?;
        let config_id = require(CONFIG_MODE)?;
        let iface_mode = require(INTERFACE_MODE)?;

        Ok(Self {
            registry,
            mode,
            exec,
            config: config_id,
            iface_mode,
            interface: None,
            running,
            default_hostname: config.hostname.clone(),
            finished: false,
        })
    }

    pub fn registry(&self) -> &Registry<Action> {
        &self.registry
    }

    pub fn mode(&self) -> ModeId {
        self.mode
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn default_hostname(&self) -> &str {
        &self.default_hostname
    }

    pub fn running(&self) -> MutexGuard<'_, RunningConfig> {
        lock(&self.running)
    }

    pub fn prompt(&self) -> String {
        let hostname = self.running().hostname.clone();
        self.registry
            .node(self.mode)
            .map(|n| n.prompt(&hostname))
            .unwrap_or_else(|| format!("{hostname}> "))
    }

    pub fn enter_config(&mut self) {
        self.mode = self.config;
    }

    pub fn enter_interface(&mut self, name: &str) {
        self.interface = Some(name.to_string());
        self.mode = self.iface_mode;
    }

    /// Leave the current mode; leaving the exec mode ends the session.
    pub fn exit_mode(&mut self) {
        if self.mode == self.iface_mode {
            self.interface = None;
            self.mode = self.config;
        } else if self.mode == self.config {
            self.mode = self.exec;
        } else {
            self.finished = true;
        }
    }

    pub fn end(&mut self) {
        self.interface = None;
        self.mode = self.exec;
    }

    /// Apply `edit` to the interface being configured.
    pub fn with_interface(&mut self, edit: impl FnOnce(&mut InterfaceConfig)) -> Outcome {
        let Some(name) = self.interface.clone() else {
            return Outcome::Warning("no interface selected".into());
        };
        edit(self.running().interfaces.entry(name).or_default());
        Outcome::Success(String::new())
    }

    /// Handle one typed line and return what to print.
    ///
    /// A trailing `?` asks for help on the text before it, a trailing TAB
    /// asks for completion, anything else is executed.
    pub fn handle_line(&mut self, line: &str) -> String {
        if let Some(before) = line.strip_suffix('?') {
            return self.help(before);
        }
        if let Some(before) = line.strip_suffix('\t') {
            return self.completion(before);
        }
        let Some(words) = split_line(line) else {
            return String::new();
        };
        let resolved = match self.registry.resolve(self.mode, &words) {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!("{line:?}: {e}");
                return e.to_string();
            },
        };
        match resolved.element.handler().run(self, &resolved.argv) {
            Outcome::Success(text) => text,
            Outcome::Warning(text) => {
                warn!("{}: {text}", resolved.element.format());
                format!("% {text}")
            },
        }
    }

    fn help(&self, line: &str) -> String {
        match self.registry.describe(self.mode, &split_for_help(line)) {
            Ok(desc) => render_description(&desc),
            Err(e) => e.to_string(),
        }
    }

    fn completion(&self, line: &str) -> String {
        match self.registry.complete(self.mode, &split_for_help(line)) {
            Ok(Completion::Full(word)) => format!("{}{word} ", typed_prefix(line)),
            Ok(Completion::Partial(prefix)) => format!("{}{prefix}", typed_prefix(line)),
            Ok(Completion::List(words)) => words.join("  "),
            Err(e) => e.to_string(),
        }
    }
}

fn lock(running: &Mutex<RunningConfig>) -> MutexGuard<'_, RunningConfig> {
    running.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The line up to the start of its last, partially typed word.
fn typed_prefix(line: &str) -> &str {
    line.trim_end_matches(|c: char| !c.is_whitespace())
}

fn render_description(desc: &Description) -> String {
    let width = desc.entries.iter().map(|e| e.literal.len()).max().unwrap_or(0);
    desc.entries
        .iter()
        .map(|e| format!("  {:<width$}  {}", e.literal, e.help).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
