//! Property-based tests for source validation.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::validate::{is_valid_source_url, resolve_relative_feed};
    use proptest::prelude::*;
    use std::path::Path;

    proptest! {
        /// Property: validation never panics and is deterministic
        #[test]
        fn validation_is_deterministic(input in ".*") {
            prop_assert_eq!(is_valid_source_url(&input), is_valid_source_url(&input));
        }

        /// Property: whitespace-only input is always rejected
        #[test]
        fn whitespace_is_rejected(input in "[ \t\r\n]*") {
            prop_assert!(!is_valid_source_url(&input));
        }

        /// Property: https URLs with a simple host are accepted
        #[test]
        fn https_hosts_are_accepted(host in "[a-z][a-z0-9]{0,20}(\\.[a-z]{2,5})?", path in "(/[a-z0-9]{1,8}){0,4}") {
            let url = format!("https://{}{}", host, path);
            prop_assert!(is_valid_source_url(&url), "rejected {}", url);
        }

        /// Property: schemes other than http/https are rejected
        #[test]
        fn other_schemes_are_rejected(scheme in "(ftp|file|javascript|ssh|data|git)", rest in "[a-z0-9/]{1,20}") {
            let url = format!("{}://{}", scheme, rest);
            prop_assert!(!is_valid_source_url(&url), "accepted {}", url);
        }

        /// Property: resolving a plain relative name yields a valid local path
        #[test]
        fn relative_names_resolve_to_valid_paths(name in "[a-zA-Z0-9_-]{1,16}") {
            let resolved = resolve_relative_feed(Path::new("/repo/config"), &name);
            prop_assert!(is_valid_source_url(&resolved), "rejected {}", resolved);
        }
    }
}
