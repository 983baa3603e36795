//! Codepoint set builder
//!
//! Decodes a UTF-8 character sample into the sorted, deduplicated list of
//! codepoints to pack.

use std::path::Path;

use font_common::{BufferError, TypedBuffer};

use crate::error::PackError;

/// Codepoint reserved for the "missing glyph" placeholder
pub const PLACEHOLDER_CODEPOINT: u32 = 0;

/// Sorted, duplicate-free set of Unicode scalar values
pub struct CodepointSet {
    codepoints: TypedBuffer<u32>,
}

impl CodepointSet {
    /// Read and decode a chars file
    pub fn from_chars_file(path: &Path, strict: bool) -> Result<Self, PackError> {
        let bytes = std::fs::read(path).map_err(|source| PackError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::decode(&bytes, strict).map_err(|e| e.in_file(path))?;
        tracing::info!(
            "Read {} unique codepoints from {:?} ({} bytes)",
            set.len(),
            path,
            bytes.len()
        );
        Ok(set)
    }

    /// Decode `bytes` as UTF-8, then sort and deduplicate
    ///
    /// Malformed sequences (including a multi-byte sequence cut short by the
    /// end of input) are logged and skipped, or rejected when `strict`.
    pub fn decode(bytes: &[u8], strict: bool) -> Result<Self, PackError> {
        // Upper bound: one codepoint per byte
        let mut codepoints = TypedBuffer::new("codepoints", bytes.len())?;

        let mut offset = 0;
        for chunk in bytes.utf8_chunks() {
            for c in chunk.valid().chars() {
                codepoints.push(c as u32)?;
            }
            offset += chunk.valid().len();

            let invalid = chunk.invalid();
            if !invalid.is_empty() {
                if strict {
                    return Err(PackError::MalformedUtf8 { path: None, offset });
                }
                tracing::warn!(
                    "Skipping malformed UTF-8 at byte {}: {:02x?}",
                    offset,
                    invalid
                );
                offset += invalid.len();
            }
        }

        let mut set = Self { codepoints };
        set.sort_dedup();
        Ok(set)
    }

    fn sort_dedup(&mut self) {
        let values = self.codepoints.as_mut_slice();
        values.sort_unstable();

        // Single pass over sorted values, compacting in place
        let mut unique = 0;
        for i in 0..values.len() {
            if i == 0 || values[i] != values[unique - 1] {
                values[unique] = values[i];
                unique += 1;
            }
        }
        self.codepoints.truncate(unique);
    }

    /// Make sure the placeholder codepoint is present (always at index 0)
    pub fn insert_placeholder(&mut self) -> Result<(), BufferError> {
        if self.codepoints.at(0) == Some(&PLACEHOLDER_CODEPOINT) {
            return Ok(());
        }
        self.codepoints.push(PLACEHOLDER_CODEPOINT)?;
        self.codepoints.as_mut_slice().rotate_right(1);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.codepoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codepoints.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        self.codepoints.as_slice()
    }

    pub fn contains(&self, codepoint: u32) -> bool {
        self.as_slice().binary_search(&codepoint).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.codepoints.iter().copied()
    }
}

impl std::fmt::Debug for CodepointSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<u32> {
        CodepointSet::decode(bytes, false).unwrap().as_slice().to_vec()
    }

    #[test]
    fn test_sorted_and_unique() {
        assert_eq!(decode(b"banana"), vec!['a' as u32, 'b' as u32, 'n' as u32]);
    }

    #[test]
    fn test_empty_input() {
        let set = CodepointSet::decode(b"", false).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_multibyte_sequences() {
        // 1, 2, 3 and 4 byte encodings
        let text = "zé€😀é";
        assert_eq!(decode(text.as_bytes()), vec![0x7A, 0xE9, 0x20AC, 0x1F600]);
    }

    #[test]
    fn test_reencoding_matches_sorted_unique_chars() {
        let text = "Mon super hamster fait du Taekwondo ! Sérieux !\n";
        let set = CodepointSet::decode(text.as_bytes(), false).unwrap();

        let reencoded: String = set.iter().filter_map(char::from_u32).collect();
        let mut expected: Vec<char> = text.chars().collect();
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(reencoded, expected.into_iter().collect::<String>());
    }

    #[test]
    fn test_strictly_ascending() {
        let set = CodepointSet::decode("the quick brown fox jumps over the lazy dog".as_bytes(), false)
            .unwrap();
        assert!(set.as_slice().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_truncated_sequence_at_end_is_dropped() {
        // "AB" followed by the first two bytes of "€" (E2 82 AC)
        assert_eq!(decode(b"AB\xE2\x82"), vec![0x41, 0x42]);
    }

    #[test]
    fn test_truncated_sequence_strict() {
        let err = CodepointSet::decode(b"AB\xE2\x82", true).unwrap_err();
        assert!(matches!(
            err,
            PackError::MalformedUtf8 {
                path: None,
                offset: 2
            }
        ));
    }

    #[test]
    fn test_invalid_bytes_in_the_middle() {
        assert_eq!(decode(b"a\xFFb\xC0\xAFc"), vec![0x61, 0x62, 0x63]);
    }

    #[test]
    fn test_insert_placeholder() {
        let mut set = CodepointSet::decode(b"BA", false).unwrap();
        set.insert_placeholder().unwrap();
        assert_eq!(set.as_slice(), &[0, 0x41, 0x42]);

        // Idempotent
        set.insert_placeholder().unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains(0));
    }

    #[test]
    fn test_placeholder_already_in_input() {
        let mut set = CodepointSet::decode(b"A\0", false).unwrap();
        set.insert_placeholder().unwrap();
        assert_eq!(set.as_slice(), &[0, 0x41]);
    }

    #[test]
    fn test_from_chars_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chars.txt");
        std::fs::write(&path, "cab\n").unwrap();
        let set = CodepointSet::from_chars_file(&path, false).unwrap();
        assert_eq!(set.as_slice(), &[0x0A, 0x61, 0x62, 0x63]);

        std::fs::write(&path, b"ok\xF0\x9F").unwrap();
        let err = CodepointSet::from_chars_file(&path, true).unwrap_err();
        assert!(matches!(err, PackError::MalformedUtf8 { path: Some(_), offset: 2 }));

        let missing = CodepointSet::from_chars_file(&dir.path().join("none.txt"), false);
        assert!(matches!(missing, Err(PackError::ReadInput { .. })));
    }
}
