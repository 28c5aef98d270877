//! Password-derived plaintext-feedback stream cipher.
//!
//! Three 32-bit words form the key schedule. They are seeded from the
//! password and then advanced once per plaintext byte, so every byte of
//! keystream depends on all plaintext before it. Decryption is therefore
//! strictly sequential within one stream; independent streams are fully
//! parallel because each owns its own schedule.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Initial key schedule words.
const INITIAL_KEYS: [u32; 3] = [0x1234_5678, 0x2345_6789, 0x3456_7890];

/// Linear congruential multiplier for the middle key word.
const KEY1_MULTIPLIER: u32 = 134_775_813;

/// Reflected CRC-32 polynomial.
const CRC32_POLY: u32 = 0xEDB8_8320;

/// One-byte CRC-32 lookup table, built at compile time and shared read-only.
static CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC32_POLY
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Standard one-byte CRC-32 update.
#[inline]
fn crc32_step(byte: u8, crc: u32) -> u32 {
    (crc >> 8) ^ CRC_TABLE[((crc ^ byte as u32) & 0xFF) as usize]
}

/// Key schedule of one encryption or decryption stream.
///
/// The schedule is owned by exactly one stream and zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StreamCipher {
    keys: [u32; 3],
}

impl StreamCipher {
    /// Derive a key schedule from a password.
    ///
    /// Any byte sequence is accepted, including the empty password.
    pub fn new(password: &[u8]) -> Self {
        let mut cipher = Self { keys: INITIAL_KEYS };
        for &byte in password {
            cipher.update(byte);
        }
        cipher
    }

    /// Advance the schedule by one plaintext byte.
    fn update(&mut self, byte: u8) {
        let [k0, k1, k2] = &mut self.keys;
        *k0 = crc32_step(byte, *k0);
        *k1 = k1
            .wrapping_add(*k0 & 0xFF)
            .wrapping_mul(KEY1_MULTIPLIER)
            .wrapping_add(1);
        *k2 = crc32_step((*k1 >> 24) as u8, *k2);
    }

    /// Next keystream byte for the current schedule.
    #[inline]
    fn keystream_byte(&self) -> u8 {
        let k = self.keys[2] | 2;
        (k.wrapping_mul(k ^ 1) >> 8) as u8
    }

    /// Decrypt one byte and feed the recovered plaintext back into the schedule.
    pub fn decrypt_byte(&mut self, cipher: u8) -> u8 {
        let plain = cipher ^ self.keystream_byte();
        self.update(plain);
        plain
    }

    /// Encrypt one byte and feed the plaintext into the schedule.
    pub fn encrypt_byte(&mut self, plain: u8) -> u8 {
        let cipher = plain ^ self.keystream_byte();
        self.update(plain);
        cipher
    }

    /// Decrypt a buffer in place, continuing the current stream.
    pub fn decrypt_in_place(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            *byte = self.decrypt_byte(*byte);
        }
    }

    /// Encrypt a buffer in place, continuing the current stream.
    pub fn encrypt_in_place(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            *byte = self.encrypt_byte(*byte);
        }
    }
}

/// Decrypt a complete ciphertext with a password.
///
/// There is no failure mode: a wrong password yields garbage plaintext of
/// the same length.
pub fn decrypt(ciphertext: &[u8], password: &[u8]) -> Vec<u8> {
    let mut output = ciphertext.to_vec();
    StreamCipher::new(password).decrypt_in_place(&mut output);
    output
}

/// Encrypt a complete plaintext with a password.
pub fn encrypt(plaintext: &[u8], password: &[u8]) -> Vec<u8> {
    let mut output = plaintext.to_vec();
    StreamCipher::new(password).encrypt_in_place(&mut output);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hex(data: &[u8]) -> String {
        data.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_crc_table_known_entries() {
        assert_eq!(CRC_TABLE[0], 0);
        assert_eq!(CRC_TABLE[1], 0x7707_3096);
        assert_eq!(CRC_TABLE[255], 0x2D02_EF8D);
    }

    #[test]
    fn test_key_setup() {
        let cipher = StreamCipher::new(b"hunter2");
        assert_eq!(cipher.keys, [0x11ca_d7dc, 0x852d_d4c2, 0x5a7d_c902]);
    }

    #[test]
    fn test_empty_password_keeps_initial_keys() {
        let cipher = StreamCipher::new(b"");
        assert_eq!(cipher.keys, INITIAL_KEYS);
    }

    #[test]
    fn test_known_ciphertext() {
        assert_eq!(hex(&encrypt(b"hello", b"hunter2")), "859e27d892");
        assert_eq!(
            hex(&encrypt(b"Hello, World!", b"secret")),
            "8075f632204de888f5ffb089d5"
        );
    }

    #[test]
    fn test_known_plaintext() {
        let ciphertext = [0x85, 0x9e, 0x27, 0xd8, 0x92];
        assert_eq!(decrypt(&ciphertext, b"hunter2"), b"hello");
    }

    #[test]
    fn test_empty_payload() {
        assert!(decrypt(b"", b"hunter2").is_empty());
        assert!(encrypt(b"", b"hunter2").is_empty());
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let plaintext = b"one byte at a time, split across calls";
        let ciphertext = encrypt(plaintext, b"pw");

        let mut cipher = StreamCipher::new(b"pw");
        let (head, tail) = ciphertext.split_at(11);
        let mut head = head.to_vec();
        let mut tail = tail.to_vec();
        cipher.decrypt_in_place(&mut head);
        cipher.decrypt_in_place(&mut tail);
        head.extend_from_slice(&tail);

        assert_eq!(head, plaintext);
    }

    #[test]
    fn test_wrong_password_yields_garbage() {
        let plaintext = b"the quick brown fox jumps over the lazy dog";
        let ciphertext = encrypt(plaintext, b"right");
        let garbage = decrypt(&ciphertext, b"wrong");

        assert_eq!(garbage.len(), plaintext.len());
        assert_ne!(garbage, plaintext);
    }

    proptest! {
        #[test]
        fn prop_crc_step_matches_crc32(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let crc = data.iter().fold(0xFFFF_FFFFu32, |crc, &b| crc32_step(b, crc));
            prop_assert_eq!(!crc, crc32fast::hash(&data));
        }

        #[test]
        fn prop_roundtrip(
            password in proptest::collection::vec(any::<u8>(), 1..32),
            plaintext in proptest::collection::vec(any::<u8>(), 0..1024),
        ) {
            let ciphertext = encrypt(&plaintext, &password);
            prop_assert_eq!(decrypt(&ciphertext, &password), plaintext);
        }

        #[test]
        fn prop_deterministic(
            password in proptest::collection::vec(any::<u8>(), 1..32),
            ciphertext in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            prop_assert_eq!(decrypt(&ciphertext, &password), decrypt(&ciphertext, &password));
        }

        #[test]
        fn prop_password_byte_changes_schedule(
            password in proptest::collection::vec(any::<u8>(), 1..32),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let mut other = password.clone();
            let i = index.index(other.len());
            other[i] ^= flip;

            let a = StreamCipher::new(&password);
            let b = StreamCipher::new(&other);
            prop_assert_ne!(a.keys, b.keys);
        }
    }
}
