//! Splitting typed lines into words.

/// Split a line for execution. Blank lines and comments (`!` or `#` as the
/// first non-blank character) yield `None`.
pub fn split_line(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with(['!', '#']) {
        return None;
    }
    Some(trimmed.split_whitespace().map(String::from).collect())
}

/// Split a line for help or completion. A line that is empty or ends in
/// whitespace gets a trailing empty word: the operator is asking about the
/// next word, not the one already typed.
pub fn split_for_help(line: &str) -> Vec<String> {
    let mut words: Vec<String> = line.split_whitespace().map(String::from).collect();
    if line.is_empty() || line.ends_with(char::is_whitespace) {
        words.push(String::new());
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_any_whitespace() {
        assert_eq!(
            split_line("  show \t ip   route ").unwrap(),
            vec!["show", "ip", "route"]
        );
    }

    #[test]
    fn blank_and_comment_lines_skipped() {
        assert_eq!(split_line(""), None);
        assert_eq!(split_line("   \t"), None);
        assert_eq!(split_line("! interface eth0"), None);
        assert_eq!(split_line("  # note"), None);
    }

    #[test]
    fn help_split_marks_next_word() {
        assert_eq!(split_for_help(""), vec![""]);
        assert_eq!(split_for_help("show"), vec!["show"]);
        assert_eq!(split_for_help("show "), vec!["show", ""]);
        assert_eq!(split_for_help("show ip\t"), vec!["show", "ip", ""]);
    }
}
