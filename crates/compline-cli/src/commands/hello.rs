//! `hello` built-in

use crate::cli::HelloArgs;

/// The greeting printed for `args`.
pub fn greeting(args: &HelloArgs) -> String {
    format!("Hello, {}!", args.name.as_deref().unwrap_or("world"))
}

/// Print the greeting.
pub fn execute(args: &HelloArgs) {
    println!("{}", greeting(args));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_defaults_to_world() {
        assert_eq!(greeting(&HelloArgs::default()), "Hello, world!");
        let named = HelloArgs {
            name: Some("Ada".into()),
        };
        assert_eq!(greeting(&named), "Hello, Ada!");
    }
}
