//! Stable test-identifier derivation.
//!
//! A discovered test case is identified by hashing a canonical sequence of
//! fragments (executor URI, source path, namespace, `.`, class name, `.`,
//! method name) through the streaming [`sha1::Sha1`] core and reinterpreting
//! the first 16 digest bytes as a GUID-shaped 128-bit value. The identifier is
//! purely deterministic: the same fragment sequence always yields the same ID,
//! regardless of how the fragments are split across [`TestIdProvider::append`]
//! calls. That determinism is the whole contract - hosts use the ID as a cache
//! and dedup key across repeated discovery runs on the same binary.
//!
//! String fragments are hashed as their UTF-16 little-endian encoding, raw
//! byte fragments as-is; both feed the identical rolling hash state.

pub mod sha1;

use uguid::Guid;

use crate::identity::sha1::{Sha1, DIGEST_BYTES};

/// Rolling identifier generator over one hasher instance.
///
/// Single-owner and single-threaded; hold one instance per discovery lane and
/// reset it between test cases via [`TestIdProvider::id_and_reset`].
///
/// # Examples
///
/// ```rust
/// use testscope::identity::TestIdProvider;
///
/// let mut provider = TestIdProvider::new();
/// provider.append_str("abc");
/// assert_eq!(
///     provider.id_and_reset().to_string(),
///     "1af4049f-8584-1614-2050-e3d68c1a7abb"
/// );
/// ```
pub struct TestIdProvider {
    hasher: Sha1,
}

impl Default for TestIdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TestIdProvider {
    /// Create a provider with a fresh hash state.
    #[must_use]
    pub fn new() -> TestIdProvider {
        TestIdProvider {
            hasher: Sha1::new(),
        }
    }

    /// Append a string fragment, hashed as UTF-16LE code units.
    pub fn append_str(&mut self, value: &str) {
        let mut encoded = Vec::with_capacity(value.len() * 2);
        for unit in value.encode_utf16() {
            encoded.extend_from_slice(&unit.to_le_bytes());
        }
        self.hasher.process_block(&encoded);
    }

    /// Append raw bytes verbatim.
    pub fn append(&mut self, bytes: &[u8]) {
        self.hasher.process_block(bytes);
    }

    /// Finalize the rolling hash into a 128-bit identifier and reset the
    /// hasher for the next test case.
    ///
    /// The identifier carries the first 16 of the 20 digest bytes in the byte
    /// layout a GUID uses; it is an opaque stable key, not a generated GUID.
    #[must_use]
    pub fn id_and_reset(&mut self) -> Guid {
        let mut digest = [0u8; DIGEST_BYTES];
        self.hasher.process_final_block(&mut digest);
        self.hasher.reset();

        let mut id = [0u8; 16];
        id.copy_from_slice(&digest[..16]);
        Guid::from_bytes(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uguid::guid;

    #[test]
    fn empty_input() {
        let mut provider = TestIdProvider::new();
        provider.append_str("");
        assert_eq!(
            provider.id_and_reset(),
            guid!("eea339da-6b5e-0d4b-3255-bfef95601890")
        );
    }

    #[test]
    fn simple_string() {
        let mut provider = TestIdProvider::new();
        provider.append_str("abc");
        assert_eq!(
            provider.id_and_reset(),
            guid!("1af4049f-8584-1614-2050-e3d68c1a7abb")
        );
    }

    #[test]
    fn uri_and_name() {
        let mut provider = TestIdProvider::new();
        provider.append_str("adapter://");
        provider.append_str("name1");
        assert_eq!(
            provider.id_and_reset(),
            guid!("740b9afc-3350-4257-ca01-5bd47799147d")
        );
    }

    #[test]
    fn fragment_boundaries_do_not_matter() {
        let mut provider = TestIdProvider::new();
        provider.append_str("adapter://namesamplenam.testname");
        let whole = provider.id_and_reset();

        for fragment in ["adapter://", "name", "samplenam", ".", "testname"] {
            provider.append_str(fragment);
        }
        let split = provider.id_and_reset();

        assert_eq!(whole, split);
        assert_eq!(whole, guid!("119c5b31-c0fb-1c12-6d1a-d617bb2bd996"));
    }

    #[test]
    fn longer_namespace() {
        let mut provider = TestIdProvider::new();
        provider.append_str("adapter://namesamplenamespace.testname");
        assert_eq!(
            provider.id_and_reset(),
            guid!("2a4c33ec-6115-4bd7-2e94-71f2fd3a5ee3")
        );
    }

    #[test]
    fn block_sized_input() {
        // 32 UTF-16 characters fill exactly one 64-byte hash block
        let mut provider = TestIdProvider::new();
        provider.append_str(&"a".repeat(32));
        assert_eq!(
            provider.id_and_reset(),
            guid!("99b1aec7-ff50-5229-a378-70ca37914c90")
        );
    }

    #[test]
    fn large_input() {
        let mut provider = TestIdProvider::new();
        for _ in 0..100_000 {
            provider.append_str("abc");
        }
        assert_eq!(
            provider.id_and_reset(),
            guid!("11dbfc20-b34a-eef6-158e-ea8c201dfff9")
        );
    }

    #[test]
    fn mixed_str_and_bytes_agree() {
        let mut provider = TestIdProvider::new();
        provider.append_str("abc");
        let from_str = provider.id_and_reset();

        provider.append(&[b'a', 0, b'b', 0, b'c', 0]);
        let from_bytes = provider.id_and_reset();

        assert_eq!(from_str, from_bytes);
    }

    #[test]
    fn reusable_after_reset() {
        let mut provider = TestIdProvider::new();
        provider.append_str("abc");
        let first = provider.id_and_reset();
        provider.append_str("abc");
        let second = provider.id_and_reset();
        assert_eq!(first, second);
    }
}
