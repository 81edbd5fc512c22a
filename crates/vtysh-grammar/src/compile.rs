//! Format string compiler.
//!
//! Turns a command definition such as
//!
//! ```text
//! ip route A.B.C.D/M (A.B.C.D|INTERFACE) [<1-255>]
//! ```
//!
//! together with its newline separated help text into a [`TokenTree`].
//! Control characters are `{ } ( ) |`; every other whitespace-delimited run
//! is one terminal whose class follows from its text (see
//! [`Class::of`](crate::token::Class::of)).
//!
//! Each terminal takes the next help line in traversal order, and the next
//! dynamic-help name when a name stream is given. A malformed format is a
//! programming error in the command table and is reported with a caret
//! diagnostic.

use crate::error::CompileError;
use crate::hooks::DynHelpTable;
use crate::token::{KeywordSlot, SlotToken, Terminal, Token, TokenTree};

/// Compile a format string into a token tree.
pub fn compile(
    format: &str,
    help: &str,
    dyn_names: &str,
    table: &DynHelpTable,
) -> Result<TokenTree, CompileError> {
    Compiler::new(format, help, dyn_names, table).run()
}

/// Walks the help text: blank lines are skipped, each entry is one line.
struct HelpCursor<'a> {
    rest: &'a str,
}

impl<'a> HelpCursor<'a> {
    fn next_entry(&mut self) -> &'a str {
        let s = self.rest.trim_start();
        let end = s.find(['\r', '\n']).unwrap_or(s.len());
        let (entry, rest) = s.split_at(end);
        self.rest = rest;
        entry.trim_end()
    }
}

/// Walks the dynamic-help names: one line per terminal, blank means none.
struct NameCursor<'a> {
    lines: Option<std::str::Lines<'a>>,
}

impl<'a> NameCursor<'a> {
    fn next_name(&mut self) -> Option<&'a str> {
        let name = self.lines.as_mut()?.next()?.trim();
        (!name.is_empty()).then_some(name)
    }
}

#[derive(Default)]
struct MultipleState {
    alts: Vec<Terminal>,
    just_read_word: bool,
}

#[derive(Default)]
struct KeywordState {
    done: Vec<KeywordSlot>,
    keyword: Option<Terminal>,
    args: Vec<SlotToken>,
}

impl KeywordState {
    fn close_slot(&mut self) {
        if let Some(keyword) = self.keyword.take() {
            let args = std::mem::take(&mut self.args);
            self.done.push(KeywordSlot { keyword, args });
        }
    }
}

struct Compiler<'a> {
    format: &'a str,
    pos: usize,
    help: HelpCursor<'a>,
    names: NameCursor<'a>,
    table: &'a DynHelpTable,
    top: Vec<Token>,
    keyword: Option<KeywordState>,
    multiple: Option<MultipleState>,
}

impl<'a> Compiler<'a> {
    fn new(format: &'a str, help: &'a str, dyn_names: &'a str, table: &'a DynHelpTable) -> Self {
        let names = if dyn_names.trim().is_empty() {
            None
        } else {
            Some(dyn_names.lines())
        };
        Self {
            format,
            pos: 0,
            help: HelpCursor { rest: help },
            names: NameCursor { lines: names },
            table,
            top: Vec::new(),
            keyword: None,
            multiple: None,
        }
    }

    fn error(&self, message: &str) -> CompileError {
        CompileError {
            format: self.format.to_string(),
            offset: self.pos + 1,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.format[self.pos..].chars().next()
    }

    fn run(mut self) -> Result<TokenTree, CompileError> {
        loop {
            while let Some(c) = self.peek()
                && c.is_whitespace()
            {
                self.pos += c.len_utf8();
            }
            match self.peek() {
                None => {
                    if self.keyword.is_some() || self.multiple.is_some() {
                        return Err(self.error("Unclosed group/keyword"));
                    }
                    return Ok(TokenTree::new(self.top));
                },
                Some('{') => self.begin_keyword()?,
                Some('(') => self.begin_multiple()?,
                Some('}') => self.end_keyword()?,
                Some(')') => self.end_multiple()?,
                Some('|') => self.pipe()?,
                Some(_) => self.read_word()?,
            }
        }
    }

    fn begin_keyword(&mut self) -> Result<(), CompileError> {
        if self.keyword.is_some() || self.multiple.is_some() {
            return Err(self.error("Unexpected '{'"));
        }
        self.pos += 1;
        self.keyword = Some(KeywordState::default());
        Ok(())
    }

    fn begin_multiple(&mut self) -> Result<(), CompileError> {
        if let Some(kw) = &self.keyword
            && kw.keyword.is_none()
        {
            return Err(self.error("Keyword starting with '('"));
        }
        if self.multiple.is_some() {
            return Err(self.error("Nested group"));
        }
        self.pos += 1;
        self.multiple = Some(MultipleState::default());
        Ok(())
    }

    fn end_keyword(&mut self) -> Result<(), CompileError> {
        if self.multiple.is_some() || self.keyword.is_none() {
            return Err(self.error("Unexpected '}'"));
        }
        if self.keyword.as_ref().is_some_and(|kw| kw.keyword.is_none()) {
            return Err(self.error("Empty keyword group"));
        }
        self.pos += 1;
        if let Some(mut kw) = self.keyword.take() {
            kw.close_slot();
            self.top.push(Token::Keyword(kw.done));
        }
        Ok(())
    }

    fn end_multiple(&mut self) -> Result<(), CompileError> {
        let Some(state) = self.multiple.take() else {
            return Err(self.error("Unbalanced parenthesis"));
        };
        if state.alts.is_empty() {
            self.multiple = Some(state);
            return Err(self.error("Empty multiple section"));
        }
        if !state.just_read_word {
            // `(a|)`: the empty alternative still owns a help line.
            self.help.next_entry();
        }
        self.pos += 1;
        match &mut self.keyword {
            Some(kw) => kw.args.push(SlotToken::Multiple(state.alts)),
            None => self.top.push(Token::Multiple(state.alts)),
        }
        Ok(())
    }

    fn pipe(&mut self) -> Result<(), CompileError> {
        if let Some(state) = &mut self.multiple {
            state.just_read_word = false;
        } else if let Some(kw) = &mut self.keyword {
            if kw.keyword.is_none() {
                return Err(self.error("Empty keyword slot"));
            }
            kw.close_slot();
        } else {
            return Err(self.error("Unexpected '|'"));
        }
        self.pos += 1;
        Ok(())
    }

    fn read_word(&mut self) -> Result<(), CompileError> {
        let format = self.format;
        let rest = &format[self.pos..];
        let len = rest
            .find(|c: char| c.is_whitespace() || "(){}|".contains(c))
            .unwrap_or(rest.len());
        let text = &rest[..len];

        let help = self.help.next_entry();
        let callback = match self.names.next_name() {
            Some(name) => {
                let cb = self.table.get(name);
                if cb.is_none() {
                    log::warn!("dynamic help '{name}' for '{text}' is not registered");
                }
                cb
            },
            None => None,
        };
        let terminal = Terminal::new(text, help)
            .map_err(|msg| self.error(msg))?
            .with_dyn_help(callback);
        self.pos += len;

        if let Some(state) = &mut self.multiple {
            state.alts.push(terminal);
            state.just_read_word = true;
        } else if let Some(kw) = &mut self.keyword {
            if kw.keyword.is_none() {
                kw.keyword = Some(terminal);
            } else {
                kw.args.push(SlotToken::Terminal(terminal));
            }
        } else {
            self.top.push(Token::Terminal(terminal));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Class;

    fn build(format: &str, help: &str) -> TokenTree {
        compile(format, help, "", &DynHelpTable::new()).unwrap()
    }

    fn fails(format: &str) -> CompileError {
        compile(format, "", "", &DynHelpTable::new()).unwrap_err()
    }

    #[test]
    fn plain_words() {
        let tree = build("show version", "Show things\nVersion info\n");
        assert_eq!(tree.len(), 2);
        let terms = tree.terminals();
        assert_eq!(terms[0].text(), "show");
        assert_eq!(terms[0].help(), "Show things");
        assert_eq!(terms[1].help(), "Version info");
    }

    #[test]
    fn help_lines_skip_blanks_and_trim() {
        let tree = build("a b", "  first  \n\n\n second\r\n");
        let terms = tree.terminals();
        assert_eq!(terms[0].help(), "first");
        assert_eq!(terms[1].help(), "second");
    }

    #[test]
    fn missing_help_is_empty() {
        let tree = build("a b c", "only one");
        assert_eq!(tree.terminals()[2].help(), "");
    }

    #[test]
    fn multiple_group() {
        let tree = build("ip route A.B.C.D/M (A.B.C.D|INTERFACE) [<1-255>]", "");
        assert_eq!(tree.len(), 5);
        match &tree.tokens()[3] {
            Token::Multiple(alts) => {
                assert_eq!(alts.len(), 2);
                assert_eq!(alts[0].class(), &Class::Ipv4);
                assert_eq!(alts[1].class(), &Class::Variable);
            },
            other => panic!("expected multiple, got {other:?}"),
        }
        assert!(matches!(&tree.tokens()[4], Token::Terminal(t) if t.is_option()));
    }

    #[test]
    fn keyword_group_slots() {
        let tree = build("show {a X|b Y (p|q)|c}", "");
        let Token::Keyword(slots) = &tree.tokens()[1] else {
            panic!("expected keyword group");
        };
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].keyword.text(), "a");
        assert_eq!(slots[0].args.len(), 1);
        assert_eq!(slots[1].keyword.text(), "b");
        assert_eq!(slots[1].args.len(), 2);
        assert!(matches!(slots[1].args[1], SlotToken::Multiple(_)));
        assert!(slots[2].args.is_empty());
    }

    #[test]
    fn help_follows_traversal_order() {
        let tree = build("x {a A|b} (c|d)", "1\n2\n3\n4\n5\n6\n");
        let helps: Vec<&str> = tree.terminals().iter().map(|t| t.help()).collect();
        assert_eq!(helps, vec!["1", "2", "3", "4", "5", "6"]);
    }

    #[test]
    fn empty_alternative_discards_one_help_line() {
        let tree = build("show (self|) next", "Show\nSelf\nEmpty\nNext\n");
        let Token::Multiple(alts) = &tree.tokens()[1] else {
            panic!("expected multiple");
        };
        assert_eq!(alts.len(), 1);
        assert_eq!(tree.terminals()[2].help(), "Next");
    }

    #[test]
    fn dynamic_help_names_resolve() {
        let mut table = DynHelpTable::new();
        table.register("ifnames", |_| "eth0 eth1".to_string());
        let tree = compile("interface IFNAME", "Select\nName\n", "\nifnames\n", &table).unwrap();
        let terms = tree.terminals();
        assert!(!terms[0].has_dyn_help());
        assert!(terms[1].has_dyn_help());
        assert_eq!(terms[1].display_help(), "eth0 eth1");
    }

    #[test]
    fn unresolved_dynamic_help_is_tolerated() {
        let tree = compile("interface IFNAME", "", "\nmissing", &DynHelpTable::new()).unwrap();
        assert!(!tree.terminals()[1].has_dyn_help());
    }

    #[test]
    fn empty_format_is_empty_tree() {
        assert!(build("", "").is_empty());
        assert!(build("   ", "").is_empty());
    }

    #[test]
    fn nested_keyword_rejected() {
        let e = fails("{a {b}}");
        assert_eq!(e.message, "Unexpected '{'");
        assert_eq!(e.offset, 4);
    }

    #[test]
    fn keyword_inside_multiple_rejected() {
        assert_eq!(fails("(a|{b})").message, "Unexpected '{'");
    }

    #[test]
    fn nested_multiple_rejected() {
        assert_eq!(fails("(a|(b|c))").message, "Nested group");
    }

    #[test]
    fn keyword_starting_with_group_rejected() {
        assert_eq!(fails("{(a|b)}").message, "Keyword starting with '('");
    }

    #[test]
    fn unbalanced_closers_rejected() {
        assert_eq!(fails("a)").message, "Unbalanced parenthesis");
        assert_eq!(fails("a}").message, "Unexpected '}'");
        assert_eq!(fails("{a)").message, "Unbalanced parenthesis");
        assert_eq!(fails("(a}").message, "Unexpected '}'");
    }

    #[test]
    fn empty_groups_rejected() {
        assert_eq!(fails("()").message, "Empty multiple section");
        assert_eq!(fails("{}").message, "Empty keyword group");
        assert_eq!(fails("{a|}").message, "Empty keyword group");
        assert_eq!(fails("{a||b}").message, "Empty keyword slot");
    }

    #[test]
    fn unclosed_group_points_past_end() {
        let e = fails("show (a|b");
        assert_eq!(e.message, "Unclosed group/keyword");
        assert_eq!(e.offset, 10);
    }

    #[test]
    fn stray_pipe_rejected() {
        assert_eq!(fails("a | b").message, "Unexpected '|'");
    }

    #[test]
    fn malformed_atom_rejected() {
        let e = fails("set <cr>");
        assert_eq!(e.message, "Malformed range");
        assert_eq!(e.offset, 5);
    }
}
