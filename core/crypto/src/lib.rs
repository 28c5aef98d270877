//! Legacy password-based stream cipher for dropweb.
//!
//! This module provides:
//! - The plaintext-feedback XOR stream cipher used by the text editor's
//!   `VimCrypt~01!` encrypted file format
//! - Detection and opening of that container format
//!
//! # Security
//! This cipher is weak and kept only to read archives that already use it.
//! Do not use it to protect new data.
//! - Key schedule state is zeroized on drop
//! - No plaintext or password material is ever logged

pub mod container;
pub mod legacy;

pub use container::{is_encrypted, open, seal, HEADER_SIZE, MAGIC};
pub use legacy::{decrypt, encrypt, StreamCipher};
