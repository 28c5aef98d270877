//! Common types used throughout dropweb.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Placeholder in an account URL template that is replaced by the page name.
pub const NAME_PLACEHOLDER: &str = "%s";

/// Characters escaped when a page name is substituted into a URL.
///
/// `/` is kept so nested names map onto nested remote paths.
const NAME_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Name of a published document; the cache key for its page record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageName(String);

impl PageName {
    /// Create a new PageName.
    ///
    /// # Preconditions
    /// - `name` must be non-empty
    /// - `name` must not contain control characters
    ///
    /// # Errors
    /// - Returns error if the name is empty or contains control characters
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Page name cannot be empty".to_string(),
            ));
        }
        if name.chars().any(char::is_control) {
            return Err(crate::Error::InvalidInput(
                "Page name cannot contain control characters".to_string(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name in a form safe to splice into a URL path.
    pub fn url_encoded(&self) -> String {
        utf8_percent_encode(&self.0, NAME_ENCODE_SET).to_string()
    }
}

impl TryFrom<String> for PageName {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::new(value)
    }
}

impl From<PageName> for String {
    fn from(name: PageName) -> Self {
        name.0
    }
}

impl fmt::Display for PageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decryption password that zeroizes on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// Wrap a password.
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Get the password bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password([REDACTED])")
    }
}

/// The single publishing account: where documents live and how to open them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Pattern for a document URL, e.g. `http://store/%s.txt`.
    pub url_template: String,
    /// Password for encrypted documents.
    pub password: Password,
}

impl Account {
    /// Create a new account.
    ///
    /// # Errors
    /// - Returns error if `url_template` has no `%s` placeholder
    pub fn new(url_template: impl Into<String>, password: Password) -> crate::Result<Self> {
        let account = Self {
            url_template: url_template.into(),
            password,
        };
        account.validate()?;
        Ok(account)
    }

    /// Check that the URL template can address more than one document.
    ///
    /// Accounts read from configuration files bypass `new`, so loaders
    /// call this before handing them out.
    ///
    /// # Errors
    /// - `Error::Configuration` if `url_template` has no `%s` placeholder
    pub fn validate(&self) -> crate::Result<()> {
        if !self.url_template.contains(NAME_PLACEHOLDER) {
            return Err(crate::Error::Configuration(format!(
                "URL template has no {} placeholder: {}",
                NAME_PLACEHOLDER, self.url_template
            )));
        }
        Ok(())
    }

    /// Build the remote address of a document.
    pub fn url_for(&self, name: &PageName) -> String {
        self.url_template
            .replacen(NAME_PLACEHOLDER, &name.url_encoded(), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_name_creation() {
        let name = PageName::new("diary").unwrap();
        assert_eq!(name.as_str(), "diary");
    }

    #[test]
    fn test_page_name_empty_fails() {
        assert!(PageName::new("").is_err());
        assert!(PageName::new("bad\nname").is_err());
    }

    #[test]
    fn test_page_name_url_encoding() {
        let name = PageName::new("notes/2011 march?").unwrap();
        assert_eq!(name.url_encoded(), "notes/2011%20march%3F");
    }

    #[test]
    fn test_page_name_deserialize_validates() {
        assert!(serde_json::from_str::<PageName>("\"\"").is_err());
        let name: PageName = serde_json::from_str("\"wiki\"").unwrap();
        assert_eq!(name.as_str(), "wiki");
    }

    #[test]
    fn test_account_url_for() {
        let account = Account::new("http://store/%s.txt", Password::new("hunter2")).unwrap();
        let name = PageName::new("diary").unwrap();
        assert_eq!(account.url_for(&name), "http://store/diary.txt");
    }

    #[test]
    fn test_account_requires_placeholder() {
        let result = Account::new("http://store/diary.txt", Password::new("x"));
        assert!(matches!(result, Err(crate::Error::Configuration(_))));
    }

    #[test]
    fn test_deserialized_account_is_validated() {
        let json = r#"{"url_template": "http://store/diary.txt", "password": "x"}"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert!(matches!(
            account.validate(),
            Err(crate::Error::Configuration(_))
        ));
    }

    #[test]
    fn test_password_debug_redacted() {
        let password = Password::new("hunter2");
        assert!(!format!("{:?}", password).contains("hunter2"));
    }
}
