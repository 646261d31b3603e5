//! XTEA payload encryption.
//!
//! Optional confidentiality for trace payloads: a 64-bit-block XTEA cipher
//! (32 rounds) keyed by a 128-bit pre-shared key, applied in place to the
//! payload region of a frame before buffering. Framing bytes needed for
//! resynchronization (sync marker, length byte, escape delimiter) and the
//! cycle stamp are never encrypted.
//!
//! Payloads are zero-padded to the 8-byte block size before encryption; the
//! host applies the same rule, decrypting block-wise and discarding the pad
//! using the id's declared payload length. XTEA has no key schedule worth
//! the name, so the cipher is const-constructible and fits in a static.
//!
//! # Examples
//!
//! ```
//! use tracewire::cipher::Xtea;
//!
//! let xtea = Xtea::new([0xEABB_EC6F, 0x3180_4EB9, 0x68E2_FAEA, 0xAEF1_5054]);
//! let mut block = [0u8; 8];
//! xtea.encrypt_in_place(&mut block);
//! xtea.decrypt_in_place(&mut block);
//! assert_eq!(block, [0u8; 8]);
//! ```

/// Cipher block size in bytes. Payloads are padded to a multiple of this.
pub const BLOCK_SIZE: usize = 8;

/// XTEA round count (the standard 64 Feistel rounds = 32 cycles).
const ROUNDS: u32 = 32;

/// The XTEA key-mixing constant (golden-ratio derived).
const DELTA: u32 = 0x9E37_79B9;

/// XTEA block cipher over a fixed pre-shared key.
#[derive(Clone, Copy)]
pub struct Xtea {
    key: [u32; 4],
}

impl Xtea {
    /// Create a cipher from the 128-bit pre-shared key.
    pub const fn new(key: [u32; 4]) -> Self {
        Self { key }
    }

    /// Create a cipher from 16 raw key bytes (big-endian words).
    pub const fn from_bytes(k: [u8; 16]) -> Self {
        let mut key = [0u32; 4];
        let mut i = 0;
        while i < 4 {
            key[i] = u32::from_be_bytes([k[4 * i], k[4 * i + 1], k[4 * i + 2], k[4 * i + 3]]);
            i += 1;
        }
        Self { key }
    }

    /// Encrypt one 64-bit block (two big-endian u32 halves).
    fn encrypt_block(&self, v: [u32; 2]) -> [u32; 2] {
        let [mut v0, mut v1] = v;
        let mut sum = 0u32;
        for _ in 0..ROUNDS {
            v0 = v0.wrapping_add(
                (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1))
                    ^ sum.wrapping_add(self.key[(sum & 3) as usize]),
            );
            sum = sum.wrapping_add(DELTA);
            v1 = v1.wrapping_add(
                (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                    ^ sum.wrapping_add(self.key[((sum >> 11) & 3) as usize]),
            );
        }
        [v0, v1]
    }

    /// Decrypt one 64-bit block.
    fn decrypt_block(&self, v: [u32; 2]) -> [u32; 2] {
        let [mut v0, mut v1] = v;
        let mut sum = DELTA.wrapping_mul(ROUNDS);
        for _ in 0..ROUNDS {
            v1 = v1.wrapping_sub(
                (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                    ^ sum.wrapping_add(self.key[((sum >> 11) & 3) as usize]),
            );
            sum = sum.wrapping_sub(DELTA);
            v0 = v0.wrapping_sub(
                (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1))
                    ^ sum.wrapping_add(self.key[(sum & 3) as usize]),
            );
        }
        [v0, v1]
    }

    /// Encrypt a block-aligned byte region in place (big-endian words).
    ///
    /// # Panics
    ///
    /// Debug-asserts `data.len()` is a multiple of [`BLOCK_SIZE`]; the frame
    /// pipeline pads before calling.
    pub fn encrypt_in_place(&self, data: &mut [u8]) {
        debug_assert_eq!(data.len() % BLOCK_SIZE, 0);
        for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
            let v = load_block(chunk);
            store_block(chunk, self.encrypt_block(v));
        }
    }

    /// Decrypt a block-aligned byte region in place. Host contract.
    pub fn decrypt_in_place(&self, data: &mut [u8]) {
        debug_assert_eq!(data.len() % BLOCK_SIZE, 0);
        for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
            let v = load_block(chunk);
            store_block(chunk, self.decrypt_block(v));
        }
    }
}

#[inline]
fn load_block(chunk: &[u8]) -> [u32; 2] {
    [
        u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
        u32::from_be_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
    ]
}

#[inline]
fn store_block(chunk: &mut [u8], v: [u32; 2]) {
    chunk[..4].copy_from_slice(&v[0].to_be_bytes());
    chunk[4..].copy_from_slice(&v[1].to_be_bytes());
}
