//! Quoting rules for each shell's string grammar.
//!
//! Every piece of free text that reaches a script (descriptions, tooltips,
//! paths) passes through one of these functions. Names and flags are validated
//! as bare tokens by the tree builder and are still quoted where the grammar
//! allows, so a missed validation cannot turn into code execution.

/// Collapse all whitespace, including newlines, into single spaces.
pub fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// POSIX single quotes, shared by bash and zsh: `'` becomes `'\''`.
pub fn posix_single(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Quote only when the text contains anything beyond a conservative set of
/// path characters. Used for activation commands shown to the user.
pub fn posix_word(text: &str) -> String {
    let plain = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '~' | '+' | ','));
    if plain {
        text.to_string()
    } else {
        posix_single(text)
    }
}

/// fish single quotes: backslash and `'` are the only escapes.
pub fn fish_single(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if matches!(c, '\\' | '\'') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// PowerShell single quotes. PowerShell also treats the typographic single
/// quotes as delimiters, so those are doubled as well.
pub fn powershell_single(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
            out.push(c);
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// One `name:description` item for zsh's `_describe`, single-quoted.
///
/// A colon in the name would be read as the separator, so it is escaped.
pub fn zsh_describe_item(name: &str, description: &str) -> String {
    let name = name.replace(':', "\\:");
    let description = one_line(description);
    if description.is_empty() {
        posix_single(&name)
    } else {
        posix_single(&format!("{name}:{description}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_collapses_newlines() {
        assert_eq!(one_line("  Deploy\nthe   app\t now "), "Deploy the app now");
    }

    #[test]
    fn test_posix_single_escapes_quotes_only() {
        assert_eq!(posix_single("it's"), r"'it'\''s'");
        assert_eq!(posix_single("$HOME `id` [x]"), "'$HOME `id` [x]'");
    }

    #[test]
    fn test_posix_word_quotes_when_needed() {
        assert_eq!(posix_word("/home/me/.bashrc"), "/home/me/.bashrc");
        assert_eq!(posix_word("/home/my user/.bashrc"), "'/home/my user/.bashrc'");
        assert_eq!(posix_word(""), "''");
    }

    #[test]
    fn test_fish_single_escapes_backslash_and_quote() {
        assert_eq!(fish_single(r"a\b'c"), r"'a\\b\'c'");
        assert_eq!(fish_single("$var (cmd)"), "'$var (cmd)'");
    }

    #[test]
    fn test_powershell_single_doubles_all_quote_forms() {
        assert_eq!(powershell_single("it's"), "'it''s'");
        assert_eq!(powershell_single("it\u{2019}s"), "'it\u{2019}\u{2019}s'");
        assert_eq!(powershell_single("$env:PATH"), "'$env:PATH'");
    }

    #[test]
    fn test_zsh_describe_item() {
        assert_eq!(zsh_describe_item("deploy", "Ship it"), "'deploy:Ship it'");
        assert_eq!(zsh_describe_item("a:b", ""), r"'a\:b'");
        assert_eq!(
            zsh_describe_item("x", "don't [panic]"),
            r"'x:don'\''t [panic]'"
        );
    }
}
