//! Platform capability for encrypted credentials.
//!
//! A `Password` entry in `packageSourceCredentials` is encrypted with the
//! Windows data protection API and can only be read back on a machine that
//! has it. Rather than checking the OS inline, the resolver is given a
//! [`PasswordDecryptor`]; hosts without the facility use [`NoDecryption`].

/// Decrypts `Password` values from `packageSourceCredentials`.
pub trait PasswordDecryptor: Send + Sync {
    /// Returns the clear-text password, or `None` if it cannot be decrypted
    /// on this platform.
    fn decrypt(&self, encrypted: &str) -> Option<String>;
}

/// Decryptor for platforms without a data protection facility.
///
/// Every encrypted password is reported as undecryptable, so only
/// `ClearTextPassword` entries contribute a password.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDecryption;

impl PasswordDecryptor for NoDecryption {
    fn decrypt(&self, _encrypted: &str) -> Option<String> {
        None
    }
}

impl<F> PasswordDecryptor for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn decrypt(&self, encrypted: &str) -> Option<String> {
        self(encrypted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_decryption_never_decrypts() {
        assert_eq!(NoDecryption.decrypt("AQAAANCMnd8BFdERjHoAwE"), None);
    }

    #[test]
    fn test_closure_decryptor() {
        let decryptor = |value: &str| Some(value.chars().rev().collect::<String>());
        assert_eq!(decryptor.decrypt("terces").as_deref(), Some("secret"));
    }
}
