//! Word-level matching: one input word against one terminal.
//!
//! The result is a [`WordMatch`] rank. Ranks order candidates: when several
//! terminals accept the same word the highest rank wins, and two different
//! literals sharing the highest rank make the word ambiguous.

use std::net::Ipv6Addr;

use crate::hooks::DomainMatchers;
use crate::token::{Class, DomainClass, RangeProfile, RangeSpec, Terminal, parse_decimal};

/// Quality of a word-to-terminal match, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WordMatch {
    NoMatch,
    /// Free-form placeholder (`WORD`, `[WORD]`).
    Extend,
    Range,
    Ipv4Netmask,
    Ipv4Prefix,
    Ipv4,
    Ipv6Prefix,
    Ipv6,
    /// Interface, port, VLAN or MAC name.
    DomainName,
    Vararg,
    /// Prefix of a literal.
    Partly,
    RangeComma,
    RangeList,
    RangeCommaList,
    /// The literal itself.
    Exact,
}

/// How strictly literals and addresses are judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Literals must be typed in full, addresses must be complete.
    Strict,
    /// Literal prefixes and partially typed addresses are accepted.
    Relaxed,
}

/// Syntactic verdict of an address validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Invalid,
    /// Could still become valid with more characters.
    Partial,
    Complete,
}

impl Validity {
    fn passes(self, filter: FilterMode) -> bool {
        match filter {
            FilterMode::Relaxed => self != Validity::Invalid,
            FilterMode::Strict => self == Validity::Complete,
        }
    }
}

/// Rank `word` against `terminal`.
///
/// An empty word stands for "nothing typed yet": in relaxed mode it is a
/// prefix of everything.
pub fn match_word(
    terminal: &Terminal,
    filter: FilterMode,
    word: &str,
    domain: &dyn DomainMatchers,
) -> WordMatch {
    if word.is_empty() {
        return match filter {
            FilterMode::Relaxed => WordMatch::Partly,
            FilterMode::Strict => WordMatch::NoMatch,
        };
    }
    match_class(terminal.class(), terminal.inner_text(), filter, word, domain)
}

fn match_class(
    class: &Class,
    text: &str,
    filter: FilterMode,
    word: &str,
    domain: &dyn DomainMatchers,
) -> WordMatch {
    let gate = |v: Validity, rank: WordMatch| {
        if v.passes(filter) { rank } else { WordMatch::NoMatch }
    };
    match class {
        Class::Vararg => WordMatch::Vararg,
        Class::Variable => WordMatch::Extend,
        Class::Range(spec) => range_match(spec, word),
        Class::Ipv4 => gate(ipv4(word), WordMatch::Ipv4),
        Class::Ipv4Prefix => gate(ipv4_prefix(word), WordMatch::Ipv4Prefix),
        Class::Ipv4Netmask => gate(ipv4_netmask(word), WordMatch::Ipv4Netmask),
        Class::Ipv6 => gate(ipv6(word), WordMatch::Ipv6),
        Class::Ipv6Prefix => gate(ipv6_prefix(word), WordMatch::Ipv6Prefix),
        Class::Domain(kind) => {
            let ok = match kind {
                DomainClass::IfName => domain.is_ifname(word),
                DomainClass::Port => domain.is_port(word),
                DomainClass::Vlan => domain.is_vlan(word),
                DomainClass::Mac => domain.is_mac(word),
            };
            if ok { WordMatch::DomainName } else { WordMatch::NoMatch }
        },
        Class::Option(inner) => match_class(inner, text, filter, word, domain),
        Class::Word => match filter {
            _ if text == word => WordMatch::Exact,
            FilterMode::Relaxed if text.starts_with(word) => WordMatch::Partly,
            _ => WordMatch::NoMatch,
        },
    }
}

// ---------------------------------------------------------------------------
// Numeric ranges
// ---------------------------------------------------------------------------

/// Rank a word against a range atom. A single number ranks as
/// [`WordMatch::Range`]; lists rank by the profile that allowed them.
pub fn range_match(spec: &RangeSpec, word: &str) -> WordMatch {
    if let Some(value) = parse_decimal(word) {
        return if spec.contains(value) { WordMatch::Range } else { WordMatch::NoMatch };
    }
    let accepted = match spec.profile {
        RangeProfile::Single => false,
        RangeProfile::Comma => comma_elements(word, |e| single_in(spec, e)),
        RangeProfile::List => span_in(spec, word),
        RangeProfile::CommaList => comma_elements(word, |e| single_in(spec, e) || span_in(spec, e)),
    };
    if !accepted {
        return WordMatch::NoMatch;
    }
    match spec.profile {
        RangeProfile::Comma => WordMatch::RangeComma,
        RangeProfile::List => WordMatch::RangeList,
        _ => WordMatch::RangeCommaList,
    }
}

fn single_in(spec: &RangeSpec, text: &str) -> bool {
    parse_decimal(text).is_some_and(|v| spec.contains(v))
}

/// `lo-hi` with both ends inside the range and `lo < hi`.
fn span_in(spec: &RangeSpec, text: &str) -> bool {
    let Some((lo, hi)) = text.split_once('-') else {
        return false;
    };
    match (parse_decimal(lo), parse_decimal(hi)) {
        (Some(lo), Some(hi)) => lo < hi && spec.contains(lo) && spec.contains(hi),
        _ => false,
    }
}

fn comma_elements(word: &str, accept: impl Fn(&str) -> bool) -> bool {
    word.split(',').all(accept)
}

// ---------------------------------------------------------------------------
// IPv4
// ---------------------------------------------------------------------------

/// Dotted-quad address, e.g. `10.1.2.3`. `10.1.` is partial.
pub fn ipv4(word: &str) -> Validity {
    let octets: Vec<&str> = word.split('.').collect();
    if octets.len() > 4 {
        return Validity::Invalid;
    }
    let last = octets.len() - 1;
    for (i, octet) in octets.iter().enumerate() {
        if octet.is_empty() {
            // Only a trailing dot is tolerated, and only after an octet.
            return if i == last && i > 0 { Validity::Partial } else { Validity::Invalid };
        }
        if octet.len() > 3 || parse_decimal(octet).is_none_or(|v| v > 255) {
            return Validity::Invalid;
        }
    }
    if octets.len() < 4 { Validity::Partial } else { Validity::Complete }
}

/// `A.B.C.D/M` with `M <= 32`. An address without a mask is partial.
pub fn ipv4_prefix(word: &str) -> Validity {
    let Some((addr, mask)) = word.split_once('/') else {
        return match ipv4(word) {
            Validity::Invalid => Validity::Invalid,
            _ => Validity::Partial,
        };
    };
    if ipv4(addr) != Validity::Complete {
        return Validity::Invalid;
    }
    if mask.is_empty() {
        return Validity::Partial;
    }
    match parse_decimal(mask) {
        Some(len) if mask.len() <= 2 && len <= 32 => Validity::Complete,
        _ => Validity::Invalid,
    }
}

/// `A.B.C.D/W.X.Y.Z` where the mask is contiguous.
pub fn ipv4_netmask(word: &str) -> Validity {
    let Some((addr, mask)) = word.split_once('/') else {
        return match ipv4(word) {
            Validity::Invalid => Validity::Invalid,
            _ => Validity::Partial,
        };
    };
    if ipv4(addr) != Validity::Complete {
        return Validity::Invalid;
    }
    if mask.is_empty() {
        return Validity::Partial;
    }
    match ipv4(mask) {
        Validity::Complete if is_contiguous_mask(mask) => Validity::Complete,
        Validity::Complete | Validity::Invalid => Validity::Invalid,
        Validity::Partial => Validity::Partial,
    }
}

fn is_contiguous_mask(mask: &str) -> bool {
    let bits = mask
        .split('.')
        .filter_map(parse_decimal)
        .fold(0u32, |acc, octet| (acc << 8) | octet as u32);
    bits.leading_ones() + bits.trailing_zeros() == 32
}

// ---------------------------------------------------------------------------
// IPv6
// ---------------------------------------------------------------------------

/// Colon-hex address. Anything that could still grow into one is partial.
pub fn ipv6(word: &str) -> Validity {
    if word.parse::<Ipv6Addr>().is_ok() {
        return Validity::Complete;
    }
    if !word
        .chars()
        .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.')
    {
        return Validity::Invalid;
    }
    if word.contains(":::") || word.matches("::").count() > 1 {
        return Validity::Invalid;
    }
    let groups: Vec<&str> = word.split(':').collect();
    if groups.len() > 8 {
        return Validity::Invalid;
    }
    let last = groups.len() - 1;
    for (i, group) in groups.iter().enumerate() {
        if group.contains('.') {
            // Embedded IPv4 tail.
            if i != last || ipv4(group) == Validity::Invalid {
                return Validity::Invalid;
            }
        } else if group.len() > 4 {
            return Validity::Invalid;
        }
    }
    Validity::Partial
}

/// `X:X::X:X/M` with `M <= 128`. An address without a mask is partial.
pub fn ipv6_prefix(word: &str) -> Validity {
    let Some((addr, mask)) = word.split_once('/') else {
        return match ipv6(word) {
            Validity::Invalid => Validity::Invalid,
            _ => Validity::Partial,
        };
    };
    if ipv6(addr) != Validity::Complete {
        return Validity::Invalid;
    }
    if mask.is_empty() {
        return Validity::Partial;
    }
    match parse_decimal(mask) {
        Some(len) if mask.len() <= 3 && len <= 128 => Validity::Complete,
        _ => Validity::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::PermissiveMatchers;

    fn rank(atom: &str, filter: FilterMode, word: &str) -> WordMatch {
        let t = Terminal::new(atom, "").unwrap();
        match_word(&t, filter, word, &PermissiveMatchers)
    }

    fn relaxed(atom: &str, word: &str) -> WordMatch {
        rank(atom, FilterMode::Relaxed, word)
    }

    #[test]
    fn rank_order_follows_specificity() {
        assert!(WordMatch::NoMatch < WordMatch::Extend);
        assert!(WordMatch::Extend < WordMatch::Range);
        assert!(WordMatch::Ipv4Prefix < WordMatch::Ipv4);
        assert!(WordMatch::Ipv6 < WordMatch::DomainName);
        assert!(WordMatch::Vararg < WordMatch::Partly);
        assert!(WordMatch::Partly < WordMatch::RangeComma);
        assert!(WordMatch::RangeCommaList < WordMatch::Exact);
    }

    #[test]
    fn literal_prefix_and_exact() {
        assert_eq!(relaxed("show", "show"), WordMatch::Exact);
        assert_eq!(relaxed("show", "sh"), WordMatch::Partly);
        assert_eq!(relaxed("show", "shows"), WordMatch::NoMatch);
        assert_eq!(rank("show", FilterMode::Strict, "sh"), WordMatch::NoMatch);
        assert_eq!(rank("show", FilterMode::Strict, "show"), WordMatch::Exact);
    }

    #[test]
    fn empty_word_depends_on_filter() {
        assert_eq!(relaxed("A.B.C.D", ""), WordMatch::Partly);
        assert_eq!(rank("WORD", FilterMode::Strict, ""), WordMatch::NoMatch);
    }

    #[test]
    fn variables_and_varargs() {
        assert_eq!(relaxed("WORD", "anything"), WordMatch::Extend);
        assert_eq!(relaxed(".LINE", "anything"), WordMatch::Vararg);
    }

    #[test]
    fn option_judged_by_inner_atom() {
        assert_eq!(relaxed("[detail]", "det"), WordMatch::Partly);
        assert_eq!(relaxed("[detail]", "brief"), WordMatch::NoMatch);
        assert_eq!(relaxed("[WORD]", "x"), WordMatch::Extend);
        assert_eq!(relaxed("[<1-255>]", "7"), WordMatch::Range);
        assert_eq!(relaxed("[<1-255>]", "300"), WordMatch::NoMatch);
    }

    #[test]
    fn simple_range_bounds() {
        for ok in ["1", "5", "10"] {
            assert_eq!(relaxed("<1-10>", ok), WordMatch::Range, "{ok}");
        }
        for bad in ["0", "11", "abc", "1,2", "-1", "+3"] {
            assert_eq!(relaxed("<1-10>", bad), WordMatch::NoMatch, "{bad}");
        }
    }

    #[test]
    fn comma_range_profile() {
        assert_eq!(relaxed("<C:1-10>", "1,3,5"), WordMatch::RangeComma);
        assert_eq!(relaxed("<C:1-10>", "4"), WordMatch::Range);
        assert_eq!(relaxed("<C:1-10>", "1,11"), WordMatch::NoMatch);
        assert_eq!(relaxed("<C:1-10>", "11"), WordMatch::NoMatch);
        assert_eq!(relaxed("<C:1-10>", "1,,2"), WordMatch::NoMatch);
        assert_eq!(relaxed("<C:1-10>", "2-4"), WordMatch::NoMatch);
    }

    #[test]
    fn list_range_profile() {
        assert_eq!(relaxed("<L:1-10>", "2-7"), WordMatch::RangeList);
        assert_eq!(relaxed("<L:1-10>", "7-2"), WordMatch::NoMatch);
        assert_eq!(relaxed("<L:1-10>", "3-3"), WordMatch::NoMatch);
        assert_eq!(relaxed("<L:1-10>", "2-12"), WordMatch::NoMatch);
        assert_eq!(relaxed("<L:1-10>", "1,2"), WordMatch::NoMatch);
    }

    #[test]
    fn comma_list_range_profile() {
        assert_eq!(relaxed("<A:1-10>", "1,3-5,9"), WordMatch::RangeCommaList);
        assert_eq!(relaxed("<A:1-10>", "3-5"), WordMatch::RangeCommaList);
        assert_eq!(relaxed("<A:1-10>", "1,5-3"), WordMatch::NoMatch);
        assert_eq!(relaxed("<A:1-10>", "1,3-50"), WordMatch::NoMatch);
    }

    #[test]
    fn ipv4_validator() {
        assert_eq!(ipv4("10.0.0.1"), Validity::Complete);
        assert_eq!(ipv4("10.0"), Validity::Partial);
        assert_eq!(ipv4("10.0."), Validity::Partial);
        assert_eq!(ipv4("10"), Validity::Partial);
        assert_eq!(ipv4("10..1"), Validity::Invalid);
        assert_eq!(ipv4(".1"), Validity::Invalid);
        assert_eq!(ipv4("256.0.0.1"), Validity::Invalid);
        assert_eq!(ipv4("1.2.3.4.5"), Validity::Invalid);
        assert_eq!(ipv4("1.2.3.4."), Validity::Invalid);
        assert_eq!(ipv4("1.2.x.4"), Validity::Invalid);
        assert_eq!(ipv4("1.2.3.0001"), Validity::Invalid);
    }

    #[test]
    fn ipv4_prefix_validator() {
        assert_eq!(ipv4_prefix("10.0.0.0/8"), Validity::Complete);
        assert_eq!(ipv4_prefix("10.0.0.0/"), Validity::Partial);
        assert_eq!(ipv4_prefix("10.0.0.0"), Validity::Partial);
        assert_eq!(ipv4_prefix("10.0"), Validity::Partial);
        assert_eq!(ipv4_prefix("10.0/8"), Validity::Invalid);
        assert_eq!(ipv4_prefix("10.0.0.0/33"), Validity::Invalid);
        assert_eq!(ipv4_prefix("10.0.0.0/8x"), Validity::Invalid);
    }

    #[test]
    fn ipv4_netmask_validator() {
        assert_eq!(ipv4_netmask("10.0.0.0/255.0.0.0"), Validity::Complete);
        assert_eq!(ipv4_netmask("10.0.0.0/255.255"), Validity::Partial);
        assert_eq!(ipv4_netmask("10.0.0.0/"), Validity::Partial);
        assert_eq!(ipv4_netmask("10.0.0.0/255.0.255.0"), Validity::Invalid);
        assert_eq!(ipv4_netmask("10.0.0.0/8"), Validity::Partial);
    }

    #[test]
    fn ipv6_validator() {
        assert_eq!(ipv6("2001:db8::1"), Validity::Complete);
        assert_eq!(ipv6("::"), Validity::Complete);
        assert_eq!(ipv6("::ffff:10.0.0.1"), Validity::Complete);
        assert_eq!(ipv6("2001:db8:"), Validity::Partial);
        assert_eq!(ipv6("fe80"), Validity::Partial);
        assert_eq!(ipv6("2001:::1"), Validity::Invalid);
        assert_eq!(ipv6("1::2::3"), Validity::Invalid);
        assert_eq!(ipv6("12345::"), Validity::Invalid);
        assert_eq!(ipv6("gg::1"), Validity::Invalid);
        assert_eq!(ipv6("1:2:3:4:5:6:7:8:9"), Validity::Invalid);
    }

    #[test]
    fn ipv6_prefix_validator() {
        assert_eq!(ipv6_prefix("2001:db8::/32"), Validity::Complete);
        assert_eq!(ipv6_prefix("2001:db8::/"), Validity::Partial);
        assert_eq!(ipv6_prefix("2001:db8::"), Validity::Partial);
        assert_eq!(ipv6_prefix("2001:db8::/129"), Validity::Invalid);
        assert_eq!(ipv6_prefix("2001:db8/64"), Validity::Invalid);
    }

    #[test]
    fn strict_filter_requires_complete_addresses() {
        assert_eq!(rank("A.B.C.D", FilterMode::Strict, "10.0"), WordMatch::NoMatch);
        assert_eq!(rank("A.B.C.D", FilterMode::Relaxed, "10.0"), WordMatch::Ipv4);
        assert_eq!(rank("A.B.C.D/M", FilterMode::Strict, "10.0.0.0/8"), WordMatch::Ipv4Prefix);
        assert_eq!(rank("X:X::X:X", FilterMode::Strict, "fe80"), WordMatch::NoMatch);
    }

    #[test]
    fn domain_classes_use_hooks() {
        struct NoVlans;
        impl DomainMatchers for NoVlans {
            fn is_vlan(&self, _: &str) -> bool {
                false
            }
        }
        let vlan = Terminal::new("VLAN", "").unwrap();
        let ifname = Terminal::new("IFNAME", "").unwrap();
        assert_eq!(match_word(&vlan, FilterMode::Relaxed, "10", &NoVlans), WordMatch::NoMatch);
        assert_eq!(match_word(&ifname, FilterMode::Relaxed, "eth0", &NoVlans), WordMatch::DomainName);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_dotted_quad_is_complete(a in 0u8.., b in 0u8.., c in 0u8.., d in 0u8..) {
                let addr = format!("{a}.{b}.{c}.{d}");
                prop_assert_eq!(ipv4(&addr), Validity::Complete);
            }

            #[test]
            fn prefixes_of_a_quad_are_never_invalid(a in 0u8.., b in 0u8.., c in 0u8.., d in 0u8..) {
                let addr = format!("{a}.{b}.{c}.{d}");
                for end in 1..=addr.len() {
                    prop_assert_ne!(ipv4(&addr[..end]), Validity::Invalid, "{}", &addr[..end]);
                }
            }

            #[test]
            fn range_accepts_exactly_its_bounds(lo in 0u64..1000, span in 0u64..1000, probe in 0u64..3000) {
                let spec = RangeSpec::parse(&format!("<{lo}-{}>", lo + span)).unwrap();
                let inside = probe >= lo && probe <= lo + span;
                let expected = if inside { WordMatch::Range } else { WordMatch::NoMatch };
                prop_assert_eq!(range_match(&spec, &probe.to_string()), expected);
            }

            #[test]
            fn std_ipv6_display_is_complete(segs in proptest::array::uniform8(any::<u16>())) {
                let addr = Ipv6Addr::from(segs).to_string();
                prop_assert_eq!(ipv6(&addr), Validity::Complete);
            }
        }
    }
}
