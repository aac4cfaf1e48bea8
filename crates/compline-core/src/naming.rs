//! Derived identifiers for a CLI name.
//!
//! Generated scripts define shell functions and environment variables whose
//! names must not collide with anything else the user has loaded, so every
//! identifier is derived from the CLI name with an injective encoding.

/// Encode a CLI name into a shell function identifier fragment.
///
/// ASCII alphanumerics are kept, `_` is doubled and every other byte becomes
/// `_` followed by two lowercase hex digits. Distinct names therefore never
/// map to the same identifier (`my-cli` -> `my_2dcli`, `my_cli` -> `my__cli`).
#[must_use]
pub fn shell_ident(cli_name: &str) -> String {
    let mut out = String::with_capacity(cli_name.len() + 4);
    for byte in cli_name.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => out.push(char::from(byte)),
            b'_' => out.push_str("__"),
            other => {
                out.push('_');
                out.push_str(&format!("{other:02x}"));
            },
        }
    }
    out
}

/// Prefix for environment variables owned by a CLI (`my-cli` -> `MY_CLI`).
#[must_use]
pub fn env_prefix(cli_name: &str) -> String {
    cli_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Environment variable that explicitly selects the shell (`COMPLINE_SHELL`).
#[must_use]
pub fn shell_override_var(cli_name: &str) -> String {
    format!("{}_SHELL", env_prefix(cli_name))
}

/// Environment variable exported by a sourced completion block
/// (`COMPLINE_COMPLETION`).
#[must_use]
pub fn session_marker_var(cli_name: &str) -> String {
    format!("{}_COMPLETION", env_prefix(cli_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_ident_keeps_simple_names() {
        assert_eq!(shell_ident("compline"), "compline");
        assert_eq!(shell_ident("Tool2"), "Tool2");
    }

    #[test]
    fn test_shell_ident_is_injective_on_separators() {
        assert_eq!(shell_ident("my-cli"), "my_2dcli");
        assert_eq!(shell_ident("my_cli"), "my__cli");
        assert_eq!(shell_ident("my.cli"), "my_2ecli");
        assert_ne!(shell_ident("a-b"), shell_ident("a_b"));
    }

    #[test]
    fn test_env_names() {
        assert_eq!(env_prefix("my-cli"), "MY_CLI");
        assert_eq!(shell_override_var("compline"), "COMPLINE_SHELL");
        assert_eq!(session_marker_var("my-cli"), "MY_CLI_COMPLETION");
    }
}
