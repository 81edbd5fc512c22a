//! Command grammar engine for a network-device configuration shell.
//!
//! Commands are declared as format strings (`"ip route A.B.C.D/M
//! (A.B.C.D|INTERFACE) [<1-255>]"`) with one help line per atom. The
//! registry compiles each into a token tree at install time, then answers
//! three questions about typed lines: which command does this line run
//! (with which arguments), what may be typed next (`?`), and how does the
//! current word complete (TAB).

pub mod compile;
pub mod describe;
pub mod error;
pub mod filter;
pub mod hooks;
pub mod line;
pub mod matcher;
pub mod registry;
pub mod resolve;
pub mod token;
pub mod word;

/// Compile a format string into a token tree.
pub use compile::compile;
/// Help-table and completion results.
pub use describe::{CR_LITERAL, Completion, Description, HelpEntry};
/// Grammar and matching errors.
pub use error::{CompileError, MatchError};
/// Collaborator hooks: domain name validators and dynamic help.
pub use hooks::{DomainMatchers, DynHelpTable, DynamicHelp, PermissiveMatchers};
/// Line splitting for execution and for help.
pub use line::{split_for_help, split_line};
/// Captured argument values.
pub use matcher::Argv;
/// Modes, installed commands and the per-line entry points.
pub use registry::{
    CommandAttrs, CommandDefinition, CommandElement, CommandNode, ModeId, Registry, Resolved,
};
/// The compiled grammar.
pub use token::{Terminal, TokenTree};
/// Word match ranks and filter strictness.
pub use word::{FilterMode, WordMatch};
