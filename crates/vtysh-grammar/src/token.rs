//! Token model: the compiled form of a command format string.
//!
//! A command compiles to a flat sequence of [`Token`]s. Groups nest at most
//! one level: a [`Token::Multiple`] holds plain terminals, and a keyword
//! slot holds terminals and multiples but never another keyword group. The
//! types enforce this, which also bounds matcher recursion.

use std::fmt;

use crate::hooks::DynamicHelp;

/// One grammar unit.
#[derive(Debug, Clone)]
pub enum Token {
    /// A single-word atom.
    Terminal(Terminal),
    /// `(a|b|c)`: exactly one alternative consumes one word.
    Multiple(Vec<Terminal>),
    /// `{a X|b Y}`: any subset of the slots, each at most once.
    Keyword(Vec<KeywordSlot>),
}

/// A token allowed inside a keyword slot.
#[derive(Debug, Clone)]
pub enum SlotToken {
    Terminal(Terminal),
    Multiple(Vec<Terminal>),
}

impl SlotToken {
    /// Whether this token contributes a value to the argument vector.
    pub fn produces_value(&self) -> bool {
        match self {
            SlotToken::Terminal(t) => t.records(),
            SlotToken::Multiple(_) => true,
        }
    }
}

/// One `|`-separated branch of a keyword group: the keyword itself followed
/// by the arguments it takes.
#[derive(Debug, Clone)]
pub struct KeywordSlot {
    pub keyword: Terminal,
    pub args: Vec<SlotToken>,
}

impl KeywordSlot {
    /// Number of argument-vector entries this slot fills when it is absent.
    pub fn value_arity(&self) -> usize {
        self.args.iter().filter(|a| a.produces_value()).count()
    }
}

/// The compiled grammar of one command.
#[derive(Debug, Clone, Default)]
pub struct TokenTree {
    tokens: Vec<Token>,
}

impl TokenTree {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Every terminal in declaration order, including group members.
    pub fn terminals(&self) -> Vec<&Terminal> {
        let mut out = Vec::new();
        for token in &self.tokens {
            match token {
                Token::Terminal(t) => out.push(t),
                Token::Multiple(alts) => out.extend(alts),
                Token::Keyword(slots) => {
                    for slot in slots {
                        out.push(&slot.keyword);
                        for arg in &slot.args {
                            match arg {
                                SlotToken::Terminal(t) => out.push(t),
                                SlotToken::Multiple(alts) => out.extend(alts),
                            }
                        }
                    }
                },
            }
        }
        out
    }
}

/// Numeric range expansion profile, selected by the `C:`, `L:` or `A:`
/// prefix inside `<...>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeProfile {
    /// `<1-10>`: one number.
    Single,
    /// `<C:1-10>`: comma separated numbers, `1,3,5`.
    Comma,
    /// `<L:1-10>`: one number or one span, `2-7`.
    List,
    /// `<A:1-10>`: comma separated numbers and spans, `1,3-5,9`.
    CommaList,
}

/// Bounds and profile of a `<lo-hi>` atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub min: u64,
    pub max: u64,
    pub profile: RangeProfile,
}

impl RangeSpec {
    /// Parse the text of a range atom, brackets included.
    pub fn parse(text: &str) -> Result<Self, &'static str> {
        let inner = text
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or("Malformed range")?;
        let (profile, bounds) = match inner.split_once(':') {
            None => (RangeProfile::Single, inner),
            Some(("C", rest)) => (RangeProfile::Comma, rest),
            Some(("L", rest)) => (RangeProfile::List, rest),
            Some(("A", rest)) => (RangeProfile::CommaList, rest),
            Some(_) => return Err("Unknown range profile"),
        };
        let (lo, hi) = bounds.split_once('-').ok_or("Malformed range")?;
        let min = parse_decimal(lo).ok_or("Malformed range bound")?;
        let max = parse_decimal(hi).ok_or("Malformed range bound")?;
        if min > max {
            return Err("Range lower bound exceeds upper bound");
        }
        Ok(Self { min, max, profile })
    }

    pub fn contains(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Parse a non-empty run of ASCII digits.
pub(crate) fn parse_decimal(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Device-specific name classes, validated through
/// [`DomainMatchers`](crate::hooks::DomainMatchers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainClass {
    IfName,
    Port,
    Vlan,
    Mac,
}

/// How a terminal matches a word, derived from the atom's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Class {
    /// A literal keyword, matched exactly or by prefix.
    Word,
    /// An upper-case placeholder such as `WORD`; matches anything.
    Variable,
    /// `.LINE`: swallows the rest of the line.
    Vararg,
    Range(RangeSpec),
    Ipv4,
    Ipv4Prefix,
    Ipv4Netmask,
    Ipv6,
    Ipv6Prefix,
    Domain(DomainClass),
    /// `[x]`: may be omitted at the end of the line; when present the word
    /// is checked against the inner atom's class.
    Option(Box<Class>),
}

impl Class {
    /// Derive the class of a grammar atom.
    pub fn of(text: &str) -> Result<Self, &'static str> {
        let class = match text {
            "A.B.C.D" => Class::Ipv4,
            "A.B.C.D/M" => Class::Ipv4Prefix,
            "A.B.C.D/W.X.Y.Z" => Class::Ipv4Netmask,
            "X:X::X:X" => Class::Ipv6,
            "X:X::X:X/M" => Class::Ipv6Prefix,
            "IFNAME" => Class::Domain(DomainClass::IfName),
            "PORT" => Class::Domain(DomainClass::Port),
            "VLAN" => Class::Domain(DomainClass::Vlan),
            "A:B:C:D:E:F" => Class::Domain(DomainClass::Mac),
            _ if text.starts_with('[') => {
                let inner = text
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .filter(|s| !s.is_empty())
                    .ok_or("Malformed optional atom")?;
                Class::Option(Box::new(Class::of(inner)?))
            },
            _ if text.starts_with('.') => Class::Vararg,
            _ if text.starts_with('<') => Class::Range(RangeSpec::parse(text)?),
            _ if is_placeholder(text) => Class::Variable,
            _ => Class::Word,
        };
        Ok(class)
    }

    /// The class that actually judges a word: the inner class for options.
    pub fn effective(&self) -> &Class {
        match self {
            Class::Option(inner) => inner.effective(),
            other => other,
        }
    }
}

fn is_placeholder(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_uppercase()) && !text.chars().any(|c| c.is_ascii_lowercase())
}

/// A single-word grammar atom.
#[derive(Clone)]
pub struct Terminal {
    text: String,
    class: Class,
    help: String,
    dyn_help: Option<DynamicHelp>,
}

impl Terminal {
    /// Build a terminal from its atom text, deriving the class.
    pub fn new(text: &str, help: &str) -> Result<Self, &'static str> {
        Ok(Self {
            text: text.to_string(),
            class: Class::of(text)?,
            help: help.to_string(),
            dyn_help: None,
        })
    }

    pub(crate) fn with_dyn_help(mut self, callback: Option<DynamicHelp>) -> Self {
        self.dyn_help = callback;
        self
    }

    /// The raw atom, e.g. `<1-255>` or `[detail]`.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    /// The static help line.
    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn has_dyn_help(&self) -> bool {
        self.dyn_help.is_some()
    }

    /// Help to display: the dynamic help when it produces something,
    /// otherwise the static line.
    pub fn display_help(&self) -> String {
        if let Some(cb) = &self.dyn_help {
            let text = cb(&self.text);
            if !text.is_empty() {
                return text;
            }
        }
        self.help.clone()
    }

    /// Whether a matched word is captured into the argument vector.
    /// Only plain literals are implicit.
    pub fn records(&self) -> bool {
        !matches!(self.class, Class::Word)
    }

    pub fn is_option(&self) -> bool {
        matches!(self.class, Class::Option(_))
    }

    pub fn is_vararg(&self) -> bool {
        matches!(self.class, Class::Vararg)
    }

    /// The literal keyword this terminal compares against, if it is a
    /// literal or an optional literal (`[detail]` yields `detail`).
    pub fn literal(&self) -> Option<&str> {
        match &self.class {
            Class::Word => Some(&self.text),
            Class::Option(inner) if matches!(**inner, Class::Word) => {
                Some(&self.text[1..self.text.len() - 1])
            },
            _ => None,
        }
    }

    /// The text an inner class is judged against: the atom without the
    /// option brackets.
    pub(crate) fn inner_text(&self) -> &str {
        match &self.class {
            Class::Option(_) => &self.text[1..self.text.len() - 1],
            _ => &self.text,
        }
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("text", &self.text)
            .field("class", &self.class)
            .field("help", &self.help)
            .field("dyn_help", &self.dyn_help.is_some())
            .finish()
    }
}
