//! Command registry: modes, their installed commands, and the entry points
//! the shell calls for each typed line.
//!
//! # Lifecycle
//!
//! The registry is populated once, sequentially, at startup (modes first,
//! then dynamic-help callbacks and domain matchers, then commands) and is
//! only read afterwards. It performs no locking. Anything that mutates it
//! after startup must be serialized against matching by the caller.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use log::{debug, trace};
use vtysh_types::config::{CommandDef, ShellConfig};
use vtysh_types::error::{Result, VtyshError};

use crate::compile::compile;
use crate::describe::{Completion, Description, complete, describe};
use crate::error::MatchError;
use crate::filter::Candidate;
use crate::hooks::{DomainMatchers, DynHelpTable, PermissiveMatchers};
use crate::matcher::{Argv, DEFAULT_ARGC_MAX, MatchContext};
use crate::resolve::resolve;
use crate::token::TokenTree;
use crate::word::FilterMode;

bitflags! {
    /// Per-command attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommandAttrs: u8 {
        /// Executable but never offered by help, completion or listings.
        const HIDDEN = 1 << 0;
        /// Kept for old scripts; behaves like `HIDDEN`.
        const DEPRECATED = 1 << 1;
        /// Installed but switched off: never matches.
        const NOT_ENABLED = 1 << 2;
        /// Runs without taking the configuration lock.
        const NO_LOCK = 1 << 3;
        /// Vendor extension outside the standard command set.
        const NON_STANDARD = 1 << 4;
    }
}

impl CommandAttrs {
    /// Attributes requested by a `[[command]]` table.
    pub fn from_def(def: &CommandDef) -> Self {
        let mut attrs = CommandAttrs::empty();
        attrs.set(CommandAttrs::HIDDEN, def.hidden);
        attrs.set(CommandAttrs::DEPRECATED, def.deprecated);
        attrs.set(CommandAttrs::NOT_ENABLED, def.not_enabled);
        attrs.set(CommandAttrs::NO_LOCK, def.no_lock);
        attrs.set(CommandAttrs::NON_STANDARD, def.non_standard);
        attrs
    }

    /// Whether the command can be executed at all.
    pub fn executable(self) -> bool {
        !self.contains(CommandAttrs::NOT_ENABLED)
    }

    /// Whether help, completion and listings show the command.
    pub fn visible(self) -> bool {
        !self.intersects(CommandAttrs::HIDDEN | CommandAttrs::DEPRECATED | CommandAttrs::NOT_ENABLED)
    }
}

/// A command to install: grammar, help, attributes and the caller's handler.
pub struct CommandDefinition<H> {
    pub format: String,
    pub help: String,
    /// Newline separated dynamic-help names, one per grammar atom.
    pub dyn_help: String,
    pub attrs: CommandAttrs,
    pub handler: H,
}

impl<H> CommandDefinition<H> {
    pub fn new(format: &str, help: &str, handler: H) -> Self {
        Self {
            format: format.to_string(),
            help: help.to_string(),
            dyn_help: String::new(),
            attrs: CommandAttrs::empty(),
            handler,
        }
    }

    pub fn with_dyn_help(mut self, names: &str) -> Self {
        self.dyn_help = names.to_string();
        self
    }

    pub fn with_attrs(mut self, attrs: CommandAttrs) -> Self {
        self.attrs = attrs;
        self
    }
}

/// An installed command. Shared between every mode it was installed into.
pub struct CommandElement<H> {
    format: String,
    help: String,
    attrs: CommandAttrs,
    handler: H,
    tree: TokenTree,
}

impl<H> CommandElement<H> {
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn attrs(&self) -> CommandAttrs {
        self.attrs
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn tree(&self) -> &TokenTree {
        &self.tree
    }
}

impl<H> fmt::Debug for CommandElement<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandElement")
            .field("format", &self.format)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

/// Writes the running configuration of one mode.
pub type ConfigWriter = Box<dyn Fn(&mut dyn fmt::Write) -> fmt::Result>;

/// Handle of a mode inside one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeId(usize);

/// A mode: a prompt and the commands valid at it.
pub struct CommandNode<H> {
    name: String,
    prompt: String,
    parent: Option<ModeId>,
    allow_do: bool,
    elements: Vec<Arc<CommandElement<H>>>,
    config_writer: Option<ConfigWriter>,
}

impl<H> CommandNode<H> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ModeId> {
        self.parent
    }

    pub fn allows_do(&self) -> bool {
        self.allow_do
    }

    pub fn elements(&self) -> &[Arc<CommandElement<H>>] {
        &self.elements
    }

    /// The prompt with every `%s` replaced by `hostname`.
    pub fn prompt(&self, hostname: &str) -> String {
        self.prompt.replace("%s", hostname)
    }

    fn candidates(&self, keep: impl Fn(CommandAttrs) -> bool) -> Vec<Candidate<'_>> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| keep(e.attrs))
            .map(|(i, e)| Candidate::new(i, &e.tree))
            .collect()
    }
}

/// A line resolved to one command.
#[derive(Debug)]
pub struct Resolved<H> {
    pub element: Arc<CommandElement<H>>,
    pub argv: Argv,
    /// Mode the command was found in (the exec mode for `do`, or an
    /// ancestor after fallback).
    pub mode: ModeId,
}

/// All modes and commands of a shell.
pub struct Registry<H> {
    nodes: Vec<CommandNode<H>>,
    index: HashMap<String, ModeId>,
    dyn_help: DynHelpTable,
    domain: Box<dyn DomainMatchers>,
    argc_max: usize,
    exec_mode: Option<ModeId>,
    conflict_text: String,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Registry<H> {
    /// An empty registry with permissive domain matchers.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            dyn_help: DynHelpTable::new(),
            domain: Box::new(PermissiveMatchers),
            argc_max: DEFAULT_ARGC_MAX,
            exec_mode: None,
            conflict_text: ShellConfig::default().help_conflict_text,
        }
    }

    /// Create the modes and limits described by `config`. Commands are
    /// installed separately with [`install_defs`](Self::install_defs) once
    /// dynamic help and domain matchers are in place.
    pub fn from_config(config: &ShellConfig) -> Result<Self> {
        let mut reg = Self::new();
        reg.argc_max = config.argc_max;
        reg.conflict_text = config.help_conflict_text.clone();
        for def in &config.modes {
            let id = reg.add_mode(&def.name, &def.prompt)?;
            reg.nodes[id.0].allow_do = def.allow_do;
        }
        for def in &config.modes {
            if let Some(parent) = &def.parent {
                reg.set_parent(&def.name, parent)?;
            }
        }
        if let Some(name) = &config.exec_mode {
            reg.set_exec_mode(name)?;
        }
        Ok(reg)
    }

    // -- Setup --

    /// Add a mode. Names must be unique.
    pub fn add_mode(&mut self, name: &str, prompt: &str) -> Result<ModeId> {
        if self.index.contains_key(name) {
            return Err(VtyshError::Config(format!("duplicate mode: {name}")));
        }
        let id = ModeId(self.nodes.len());
        self.nodes.push(CommandNode {
            name: name.to_string(),
            prompt: prompt.to_string(),
            parent: None,
            allow_do: false,
            elements: Vec::new(),
            config_writer: None,
        });
        self.index.insert(name.to_string(), id);
        debug!("added mode {name}");
        Ok(id)
    }

    /// Set the mode a failed line is retried in.
    pub fn set_parent(&mut self, mode: &str, parent: &str) -> Result<()> {
        let parent = self.require(parent)?;
        let id = self.require(mode)?;
        self.nodes[id.0].parent = Some(parent);
        Ok(())
    }

    /// Accept `do <command>` in `mode`.
    pub fn set_allow_do(&mut self, mode: &str, allow: bool) -> Result<()> {
        let id = self.require(mode)?;
        self.nodes[id.0].allow_do = allow;
        Ok(())
    }

    /// Set the mode `do`-prefixed lines are resolved in.
    pub fn set_exec_mode(&mut self, mode: &str) -> Result<()> {
        self.exec_mode = Some(self.require(mode)?);
        Ok(())
    }

    pub fn set_argc_max(&mut self, argc_max: usize) {
        self.argc_max = argc_max;
    }

    pub fn set_domain_matchers(&mut self, matchers: impl DomainMatchers + 'static) {
        self.domain = Box::new(matchers);
    }

    /// Register a dynamic-help callback. Only commands installed afterwards
    /// see it.
    pub fn register_dyn_help<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.dyn_help.register(name, callback);
    }

    /// Attach the writer that renders `mode`'s running configuration.
    pub fn set_config_writer<F>(&mut self, mode: &str, writer: F) -> Result<()>
    where
        F: Fn(&mut dyn fmt::Write) -> fmt::Result + 'static,
    {
        let id = self.require(mode)?;
        self.nodes[id.0].config_writer = Some(Box::new(writer));
        Ok(())
    }

    /// Install a command into every mode in `modes`.
    ///
    /// # Panics
    ///
    /// Panics with a caret diagnostic if the format string is malformed, or
    /// if a mode is unknown. Command tables are fixed at build time, so
    /// either is a bug in the table.
    pub fn install(&mut self, modes: &[&str], def: CommandDefinition<H>) -> Arc<CommandElement<H>> {
        match self.try_install(modes, def) {
            Ok(element) => element,
            Err(e) => panic!("{e}"),
        }
    }

    /// Install a command, reporting a malformed grammar as an error.
    pub fn try_install(
        &mut self,
        modes: &[&str],
        def: CommandDefinition<H>,
    ) -> Result<Arc<CommandElement<H>>> {
        let ids = modes
            .iter()
            .map(|m| self.require(m))
            .collect::<Result<Vec<_>>>()?;
        let tree = compile(&def.format, &def.help, &def.dyn_help, &self.dyn_help)
            .map_err(|e| VtyshError::Grammar(e.to_string()))?;
        let element = Arc::new(CommandElement {
            format: def.format,
            help: def.help,
            attrs: def.attrs,
            handler: def.handler,
            tree,
        });
        for id in ids {
            self.nodes[id.0].elements.push(Arc::clone(&element));
        }
        debug!("installed {:?} into {}", element.format, modes.join(", "));
        Ok(element)
    }

    /// Install every `[[command]]` of `config`, binding each action name to
    /// a handler through `bind`.
    pub fn install_defs<F>(&mut self, config: &ShellConfig, mut bind: F) -> Result<()>
    where
        F: FnMut(&CommandDef) -> Result<H>,
    {
        for cmd in &config.commands {
            let handler = bind(cmd)?;
            let def = CommandDefinition::new(&cmd.format, &cmd.help, handler)
                .with_dyn_help(&cmd.dyn_help)
                .with_attrs(CommandAttrs::from_def(cmd));
            let modes: Vec<&str> = cmd.modes.iter().map(String::as_str).collect();
            self.try_install(&modes, def)?;
        }
        Ok(())
    }

    // -- Lookup --

    pub fn mode_id(&self, name: &str) -> Option<ModeId> {
        self.index.get(name).copied()
    }

    pub fn node(&self, mode: ModeId) -> Option<&CommandNode<H>> {
        self.nodes.get(mode.0)
    }

    pub fn modes(&self) -> impl Iterator<Item = (ModeId, &CommandNode<H>)> {
        self.nodes.iter().enumerate().map(|(i, n)| (ModeId(i), n))
    }

    pub fn exec_mode(&self) -> Option<ModeId> {
        self.exec_mode
    }

    pub fn argc_max(&self) -> usize {
        self.argc_max
    }

    fn require(&self, name: &str) -> Result<ModeId> {
        self.mode_id(name)
            .ok_or_else(|| VtyshError::UnknownMode(name.to_string()))
    }

    fn context(&self) -> MatchContext<'_> {
        MatchContext {
            domain: self.domain.as_ref(),
            argc_max: self.argc_max,
        }
    }

    /// `do <rest>` in a mode that allows it: the mode to use and the rest.
    fn do_shortcut<'w>(&self, mode: ModeId, words: &'w [String]) -> Option<(ModeId, &'w [String])> {
        let node = self.nodes.get(mode.0)?;
        match words {
            [first, rest @ ..] if node.allow_do && first == "do" && !rest.is_empty() => {
                self.exec_mode.map(|exec| (exec, rest))
            },
            _ => None,
        }
    }

    // -- Matching --

    /// Resolve a line to one executable command.
    ///
    /// A line that fails in `mode` is retried in each ancestor in turn. If
    /// every ancestor fails too, the error from `mode` itself is returned.
    pub fn resolve(&self, mode: ModeId, words: &[String]) -> std::result::Result<Resolved<H>, MatchError> {
        self.resolve_with(mode, words, FilterMode::Relaxed)
    }

    /// Like [`resolve`](Self::resolve) but literals must be typed in full
    /// and addresses must be complete. Used for configuration replay.
    pub fn resolve_strict(
        &self,
        mode: ModeId,
        words: &[String],
    ) -> std::result::Result<Resolved<H>, MatchError> {
        self.resolve_with(mode, words, FilterMode::Strict)
    }

    fn resolve_with(
        &self,
        mode: ModeId,
        words: &[String],
        filter: FilterMode,
    ) -> std::result::Result<Resolved<H>, MatchError> {
        if let Some((exec, rest)) = self.do_shortcut(mode, words) {
            return self.resolve_in(exec, rest, filter);
        }
        let first = match self.resolve_in(mode, words, filter) {
            Ok(found) => return Ok(found),
            Err(e) => e,
        };
        let mut current = self.nodes.get(mode.0).and_then(|n| n.parent);
        while let Some(parent) = current {
            trace!("retrying {:?} in parent mode {}", words, self.nodes[parent.0].name);
            if let Ok(found) = self.resolve_in(parent, words, filter) {
                return Ok(found);
            }
            current = self.nodes[parent.0].parent;
        }
        Err(first)
    }

    fn resolve_in(
        &self,
        mode: ModeId,
        words: &[String],
        filter: FilterMode,
    ) -> std::result::Result<Resolved<H>, MatchError> {
        let node = self.nodes.get(mode.0).ok_or(MatchError::NoMatch)?;
        let found = resolve(node.candidates(CommandAttrs::executable), words, filter, &self.context())?;
        Ok(Resolved {
            element: Arc::clone(&node.elements[found.id]),
            argv: found.argv,
            mode,
        })
    }

    /// Help table for the last word of `words` (see
    /// [`split_for_help`](crate::line::split_for_help)).
    pub fn describe(&self, mode: ModeId, words: &[String]) -> std::result::Result<Description, MatchError> {
        let (mode, words) = self.do_shortcut(mode, words).unwrap_or((mode, words));
        let node = self.nodes.get(mode.0).ok_or(MatchError::NoMatch)?;
        describe(node.candidates(CommandAttrs::visible), words, &self.context(), &self.conflict_text)
    }

    /// Complete the last word of `words`.
    pub fn complete(&self, mode: ModeId, words: &[String]) -> std::result::Result<Completion, MatchError> {
        let (mode, words) = self.do_shortcut(mode, words).unwrap_or((mode, words));
        let node = self.nodes.get(mode.0).ok_or(MatchError::NoMatch)?;
        complete(node.candidates(CommandAttrs::visible), words, &self.context())
    }

    // -- Output --

    /// Formats of the visible commands in `mode`, sorted.
    pub fn list(&self, mode: ModeId) -> Vec<&str> {
        let Some(node) = self.nodes.get(mode.0) else {
            return Vec::new();
        };
        let mut formats: Vec<&str> = node
            .elements
            .iter()
            .filter(|e| e.attrs.visible())
            .map(|e| e.format.as_str())
            .collect();
        formats.sort_unstable();
        formats.dedup();
        formats
    }

    /// Run every mode's config writer, in the order modes were added.
    pub fn write_config(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        for node in &self.nodes {
            if let Some(writer) = &node.config_writer {
                writer(&mut *out)?;
            }
        }
        Ok(())
    }
}
