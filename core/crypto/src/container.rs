//! Legacy encrypted text file container.
//!
//! # Format
//! - Header: the 12-byte magic `VimCrypt~01!`
//! - Body: the document encrypted with [`crate::legacy`]
//!
//! The header carries no key material; it only marks the payload as
//! encrypted and is discarded before decryption.

use crate::legacy;

/// Marker at the start of an encrypted payload.
pub const MAGIC: &[u8] = b"VimCrypt~01!";

/// Size of the fixed header skipped before decryption.
pub const HEADER_SIZE: usize = 12;

/// Check whether a payload uses the encrypted container.
pub fn is_encrypted(raw: &[u8]) -> bool {
    raw.starts_with(MAGIC)
}

/// Open a payload if it is encrypted.
///
/// # Returns
/// - `None` if the payload does not start with [`MAGIC`]
/// - `Some(plaintext)` otherwise; a wrong password yields garbage
pub fn open(raw: &[u8], password: &[u8]) -> Option<Vec<u8>> {
    if !is_encrypted(raw) {
        return None;
    }
    Some(legacy::decrypt(&raw[HEADER_SIZE..], password))
}

/// Produce an encrypted container for a plaintext.
pub fn seal(plaintext: &[u8], password: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(HEADER_SIZE + plaintext.len());
    output.extend_from_slice(MAGIC);
    output.extend_from_slice(&legacy::encrypt(plaintext, password));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_magic_is_header_sized() {
        assert_eq!(MAGIC.len(), HEADER_SIZE);
    }

    #[test]
    fn test_plaintext_is_not_opened() {
        assert!(!is_encrypted(b"title: Foo\n\nbody"));
        assert_eq!(open(b"title: Foo\n\nbody", b"pw"), None);
    }

    #[test]
    fn test_magic_must_be_prefix() {
        let mut raw = b"note: ".to_vec();
        raw.extend_from_slice(&seal(b"inner", b"pw"));
        assert!(!is_encrypted(&raw));
    }

    #[test]
    fn test_header_only() {
        assert_eq!(open(MAGIC, b"pw"), Some(Vec::new()));
    }

    #[test]
    fn test_seal_layout() {
        let sealed = seal(b"hello", b"hunter2");
        assert_eq!(&sealed[..HEADER_SIZE], MAGIC);
        assert_eq!(&sealed[HEADER_SIZE..], &[0x85, 0x9e, 0x27, 0xd8, 0x92]);
    }

    proptest! {
        #[test]
        fn prop_seal_open_roundtrip(
            password in proptest::collection::vec(any::<u8>(), 1..32),
            plaintext in proptest::collection::vec(any::<u8>(), 0..512),
        ) {
            let sealed = seal(&plaintext, &password);
            prop_assert!(is_encrypted(&sealed));
            prop_assert_eq!(open(&sealed, &password), Some(plaintext));
        }
    }
}
