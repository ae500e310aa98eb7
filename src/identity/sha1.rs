//! Streaming SHA-1 block hasher.
//!
//! A faithful implementation of the RFC 3174 algorithm with cross-call
//! buffering of partial blocks: callers may feed fragments of any length and
//! the compression function runs once per complete 64-byte block. The digest
//! is bit-for-bit identical to the historical implementation the test
//! identifier scheme was built on, which is the sole reason this exists
//! instead of a library hash - identifiers derived from it must never change.
//!
//! Not a security primitive. Do not use it for anything but deterministic IDs.
//!
//! # Reference
//! - [RFC 3174](https://tools.ietf.org/html/rfc3174)

/// Size of one message block in bytes.
pub const BLOCK_BYTES: usize = 64;
/// Size of the final digest in bytes.
pub const DIGEST_BYTES: usize = 20;

/// Streaming SHA-1 state.
///
/// State machine: `Initial -> Accumulating -> Finalized`. [`Sha1::reset`]
/// returns to `Initial`; calling [`Sha1::process_block`] or
/// [`Sha1::process_final_block`] on a finalized hasher is a contract violation
/// and panics rather than producing a wrong digest.
pub struct Sha1 {
    h0: u32,
    h1: u32,
    h2: u32,
    h3: u32,
    h4: u32,

    /// Low 32 bits of the message bit length
    count0: u32,
    /// High 32 bits of the message bit length
    count1: u32,

    /// Pending partial block carried across calls
    buffer: [u8; BLOCK_BYTES],
    finalized: bool,
}

impl Default for Sha1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha1 {
    /// Create a hasher in its initial state.
    #[must_use]
    pub fn new() -> Sha1 {
        Sha1 {
            // as defined in https://tools.ietf.org/html/rfc3174#section-6.1
            h0: 0x6745_2301,
            h1: 0xEFCD_AB89,
            h2: 0x98BA_DCFE,
            h3: 0x1032_5476,
            h4: 0xC3D2_E1F0,
            count0: 0,
            count1: 0,
            buffer: [0; BLOCK_BYTES],
            finalized: false,
        }
    }

    /// Return the hasher to its initial state so it can be reused.
    pub fn reset(&mut self) {
        self.h0 = 0x6745_2301;
        self.h1 = 0xEFCD_AB89;
        self.h2 = 0x98BA_DCFE;
        self.h3 = 0x1032_5476;
        self.h4 = 0xC3D2_E1F0;
        self.count0 = 0;
        self.count1 = 0;
        self.finalized = false;
    }

    /// Feed `message` into the hash, buffering any trailing partial block.
    ///
    /// Accepts any length, including zero. The bit-length counter spans two
    /// 32-bit words, so messages beyond 4 GiB are counted correctly.
    ///
    /// # Panics
    /// Panics if the hasher was finalized and not reset.
    pub fn process_block(&mut self, message: &[u8]) {
        assert!(
            !self.finalized,
            "hash state was finalized; reset() before appending more data"
        );

        // Number of bytes mod 64 currently buffered
        let mut index = ((self.count0 >> 3) & 63) as usize;

        let length = message.len();
        let low_bits = ((length as u64) << 3) as u32;
        self.count0 = self.count0.wrapping_add(low_bits);
        if self.count0 < low_bits {
            self.count1 = self.count1.wrapping_add(1);
        }
        self.count1 = self.count1.wrapping_add((length >> 29) as u32);

        let part_len = BLOCK_BYTES - index;
        let mut i = 0;

        if length >= part_len {
            if index != 0 {
                self.buffer[index..].copy_from_slice(&message[..part_len]);
                self.transform();
                i = part_len;
            }

            while i + (BLOCK_BYTES - 1) < length {
                self.buffer.copy_from_slice(&message[i..i + BLOCK_BYTES]);
                self.transform();
                i += BLOCK_BYTES;
            }

            if length == i {
                return;
            }

            index = 0;
        }

        self.buffer[index..index + (length - i)].copy_from_slice(&message[i..]);
    }

    /// Append the RFC 3174 padding and bit-length trailer, finish any pending
    /// blocks and write the 20-byte digest big-endian into `digest`.
    ///
    /// This is a one-shot terminal operation; the hasher must be [`Sha1::reset`]
    /// before any further use.
    ///
    /// # Panics
    /// Panics if the hasher was already finalized.
    pub fn process_final_block(&mut self, digest: &mut [u8; DIGEST_BYTES]) {
        assert!(
            !self.finalized,
            "hash state was already finalized; reset() before reuse"
        );

        let mut final_count = [0u8; 8];
        final_count[..4].copy_from_slice(&self.count1.to_be_bytes());
        final_count[4..].copy_from_slice(&self.count0.to_be_bytes());

        self.process_block(&[0x80]);
        while self.count0 & 504 != 448 {
            self.process_block(&[0x00]);
        }
        self.process_block(&final_count);
        self.finalized = true;

        digest[0..4].copy_from_slice(&self.h0.to_be_bytes());
        digest[4..8].copy_from_slice(&self.h1.to_be_bytes());
        digest[8..12].copy_from_slice(&self.h2.to_be_bytes());
        digest[12..16].copy_from_slice(&self.h3.to_be_bytes());
        digest[16..20].copy_from_slice(&self.h4.to_be_bytes());
    }

    /// Hash `message` in one shot into `digest`.
    ///
    /// # Panics
    /// Panics if the hasher was finalized and not reset.
    pub fn compute_hash(&mut self, message: &[u8], digest: &mut [u8; DIGEST_BYTES]) {
        self.process_block(message);
        self.process_final_block(digest);
    }

    /// Run the 80-round compression function over the buffered block.
    fn transform(&mut self) {
        let mut w = [0u32; 16];
        for (i, chunk) in self.buffer.chunks_exact(4).enumerate() {
            w[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        let mut a = self.h0;
        let mut b = self.h1;
        let mut c = self.h2;
        let mut d = self.h3;
        let mut e = self.h4;

        for t in 0..80 {
            let word = if t < 16 {
                w[t]
            } else {
                let value = (w[(t + 13) & 15] ^ w[(t + 8) & 15] ^ w[(t + 2) & 15] ^ w[t & 15])
                    .rotate_left(1);
                w[t & 15] = value;
                value
            };

            let (f, k) = match t {
                0..=19 => ((b & (c ^ d)) ^ d, 0x5A82_7999),
                20..=39 => (b ^ c ^ d, 0x6ED9_EBA1),
                40..=59 => (((b | c) & d) | (b & c), 0x8F1B_BCDC),
                _ => (b ^ c ^ d, 0xCA62_C1D6),
            };

            let temp = a
                .rotate_left(5)
                .wrapping_add(f)
                .wrapping_add(e)
                .wrapping_add(k)
                .wrapping_add(word);
            e = d;
            d = c;
            c = b.rotate_left(30);
            b = a;
            a = temp;
        }

        self.h0 = self.h0.wrapping_add(a);
        self.h1 = self.h1.wrapping_add(b);
        self.h2 = self.h2.wrapping_add(c);
        self.h3 = self.h3.wrapping_add(d);
        self.h4 = self.h4.wrapping_add(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(digest: &[u8; DIGEST_BYTES]) -> String {
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn hash_of(message: &[u8]) -> String {
        let mut hasher = Sha1::new();
        let mut digest = [0u8; DIGEST_BYTES];
        hasher.compute_hash(message, &mut digest);
        hex(&digest)
    }

    #[test]
    fn rfc_vectors() {
        assert_eq!(hash_of(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(hash_of(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(
            hash_of(b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq"),
            "84983e441c3bd26ebaae4aa1f95129e5e54670f1"
        );
        assert_eq!(
            hash_of(
                b"abcdefghbcdefghicdefghijdefghijkefghijklfghijklmghijklmn\
                  hijklmnoijklmnopjklmnopqklmnopqrlmnopqrsmnopqrstnopqrstu"
            ),
            "a49b2446a02c645bf419f995b67091253a04a259"
        );
    }

    #[test]
    fn one_million_a() {
        let message = vec![b'a'; 1_000_000];
        assert_eq!(
            hash_of(&message),
            "34aa973cd4c4daa4f61eeb2bdbad27316534016f"
        );
    }

    #[test]
    fn long_repeated_input_matches_reference() {
        use sha1::{Digest, Sha1 as RefSha1};

        for length in [1_000_000usize, 10_000_000] {
            let message = vec![b'a'; length];

            let reference = RefSha1::digest(&message);
            let mut digest = [0u8; DIGEST_BYTES];
            Sha1::new().compute_hash(&message, &mut digest);

            assert_eq!(digest.as_slice(), reference.as_slice(), "length {length}");
        }
    }

    #[test]
    fn streaming_matches_one_shot() {
        let message: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();

        // chunk sizes chosen to hit boundaries mid-block, on-block and beyond
        for chunk_size in [1, 3, 63, 64, 65, 127, 500] {
            let mut hasher = Sha1::new();
            for chunk in message.chunks(chunk_size) {
                hasher.process_block(chunk);
            }
            let mut streamed = [0u8; DIGEST_BYTES];
            hasher.process_final_block(&mut streamed);

            assert_eq!(hex(&streamed), hash_of(&message), "chunk size {chunk_size}");
        }
    }

    #[test]
    fn matches_reference_implementation() {
        use sha1::{Digest, Sha1 as RefSha1};

        let message: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 256) as u8).collect();

        let reference = RefSha1::digest(&message);
        let mut digest = [0u8; DIGEST_BYTES];
        Sha1::new().compute_hash(&message, &mut digest);

        assert_eq!(digest.as_slice(), reference.as_slice());
    }

    #[test]
    fn reset_allows_reuse() {
        let mut hasher = Sha1::new();
        let mut first = [0u8; DIGEST_BYTES];
        hasher.compute_hash(b"abc", &mut first);

        hasher.reset();
        let mut second = [0u8; DIGEST_BYTES];
        hasher.compute_hash(b"abc", &mut second);

        assert_eq!(first, second);
    }

    #[test]
    #[should_panic(expected = "finalized")]
    fn finalize_twice_panics() {
        let mut hasher = Sha1::new();
        let mut digest = [0u8; DIGEST_BYTES];
        hasher.process_final_block(&mut digest);
        hasher.process_final_block(&mut digest);
    }

    #[test]
    #[should_panic(expected = "finalized")]
    fn append_after_finalize_panics() {
        let mut hasher = Sha1::new();
        let mut digest = [0u8; DIGEST_BYTES];
        hasher.process_final_block(&mut digest);
        hasher.process_block(b"more");
    }
}
