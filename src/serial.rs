use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::{DoubleArray, Node, Result, TrieError};

/// Bytes per serialized slot: `base` then `check`, both little-endian `i32`.
pub(crate) const SLOT_SIZE: usize = 8;

/// Smallest image that still holds the header and the root.
pub(crate) const MIN_SLOTS: usize = 2;

#[inline]
fn read_i32(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Decodes a raw slot image. Trailing bytes that do not form a whole slot are
/// ignored; free-list and occupancy invariants are not validated.
pub(crate) fn decode_slots(bytes: &[u8]) -> Result<Vec<Node>> {
    if bytes.len() / SLOT_SIZE < MIN_SLOTS {
        return Err(TrieError::TruncatedData);
    }
    Ok(bytes
        .chunks_exact(SLOT_SIZE)
        .map(|slot| Node::from_raw(read_i32(&slot[..4]), read_i32(&slot[4..])))
        .collect())
}

/// Sibling path used while saving: `<path>.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

impl DoubleArray {
    /// Serializes every slot, in index order, as little-endian `base`/`check`
    /// pairs. There is no header; the slot count is `len / 8`.
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.nodes.len() * SLOT_SIZE);
        self.write_to(&mut buf);
        buf
    }

    /// Writes the serialized slots directly into `buf`.
    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        for node in &self.nodes {
            buf.extend_from_slice(&node.base().to_le_bytes());
            buf.extend_from_slice(&node.check().to_le_bytes());
        }
    }

    /// Deserializes a double-array trie from a slot image.
    ///
    /// # Errors
    /// Returns [`TrieError::TruncatedData`] if fewer than two slots are present.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode_slots(bytes).map(Self::from_nodes)
    }

    /// Writes the slot image to `path`.
    ///
    /// The image goes to a sibling temporary file that is then renamed over
    /// `path`, so an existing file is not truncated by a failed save.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), slots = self.nodes.len()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = temp_path(path);
        let bytes = self.as_bytes();
        if let Err(e) = fs::write(&tmp, &bytes).and_then(|()| fs::rename(&tmp, path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(bytes = bytes.len(), "saved slot image");
        Ok(())
    }

    /// Replaces the whole slot array with the image stored at `path`.
    ///
    /// The trie is left untouched if reading or decoding fails.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = fs::read(path.as_ref())?;
        self.nodes = decode_slots(&bytes)?;
        debug!(slots = self.nodes.len(), "loaded slot image");
        Ok(())
    }

    /// Reads a trie from the image stored at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut da = Self::with_capacity(MIN_SLOTS);
        da.load(path)?;
        Ok(da)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SearchMatch;
    use test_log::test;

    fn sample() -> DoubleArray {
        let mut da = DoubleArray::with_capacity(64);
        assert!(da.build(&["a", "ab", "abc", "b", "bc", "東京", "東京都"]));
        assert!(da.erase(b"b"));
        da
    }

    #[test]
    fn byte_layout_is_raw_slots() {
        let da = DoubleArray::with_capacity(4);
        let bytes = da.as_bytes();
        assert_eq!(bytes.len(), 4 * SLOT_SIZE);
        // header: 0 entries, free head 2
        assert_eq!(&bytes[0..8], &[0, 0, 0, 0, 2, 0, 0, 0]);
        // slot 2: free, next 3
        assert_eq!(&bytes[16..24], &[0, 0, 0, 0, 0xFD, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn bytes_round_trip() {
        let da = sample();
        let restored = DoubleArray::from_bytes(&da.as_bytes()).unwrap();
        assert_eq!(restored.num_nodes(), da.num_nodes());
        assert_eq!(restored.num_entries(), da.num_entries());
        for key in ["a", "ab", "abc", "b", "bc", "東京", "東京都", "x"] {
            assert_eq!(restored.exact_match(key.as_bytes()), da.exact_match(key.as_bytes()));
        }
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let da = sample();
        let mut bytes = da.as_bytes();
        bytes.extend_from_slice(&[1, 2, 3]);
        let restored = DoubleArray::from_bytes(&bytes).unwrap();
        assert_eq!(restored.num_nodes(), da.num_nodes());
    }

    #[test]
    fn truncated_data_error() {
        assert!(matches!(
            DoubleArray::from_bytes(&[]),
            Err(TrieError::TruncatedData)
        ));
        assert!(matches!(
            DoubleArray::from_bytes(&[0; 15]),
            Err(TrieError::TruncatedData)
        ));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.da");
        let da = sample();
        da.save(&path).unwrap();
        assert_eq!(
            fs::metadata(&path).unwrap().len() as usize,
            da.num_nodes() * SLOT_SIZE
        );
        assert!(!temp_path(&path).exists());

        let mut loaded = DoubleArray::new();
        loaded.load(&path).unwrap();
        let all: Vec<SearchMatch> = loaded.enumerate(b"").collect();
        assert_eq!(all, da.enumerate(b"").collect::<Vec<_>>());
        let cps: Vec<_> = loaded.common_prefix_search("東京都庁".as_bytes()).collect();
        assert_eq!(cps, da.common_prefix_search("東京都庁".as_bytes()).collect::<Vec<_>>());

        let opened = DoubleArray::open(&path).unwrap();
        assert_eq!(opened.exact_match(b"abc"), Some(3));
    }

    #[test]
    fn loaded_trie_stays_mutable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.da");
        sample().save(&path).unwrap();

        let mut da = DoubleArray::open(&path).unwrap();
        assert!(da.insert(b"new"));
        assert!(da.erase(b"abc"));
        assert_eq!(da.exact_match(b"new"), Some(8));
        assert_eq!(da.exact_match(b"abc"), None);
        assert_eq!(da.exact_match(b"ab"), Some(2));
    }

    #[test]
    fn failed_load_leaves_trie_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut da = sample();
        let before = da.as_bytes();

        let missing = da.load(dir.path().join("missing.da"));
        assert!(matches!(missing, Err(TrieError::Io(_))));

        let short = dir.path().join("short.da");
        fs::write(&short, [0u8; 12]).unwrap();
        assert!(matches!(da.load(&short), Err(TrieError::TruncatedData)));

        assert_eq!(da.as_bytes(), before);
    }

    #[test]
    fn failed_save_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("dict.da");
        assert!(matches!(sample().save(&path), Err(TrieError::Io(_))));
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.da");
        sample().save(&path).unwrap();

        let mut small = DoubleArray::with_capacity(4);
        assert!(small.insert(b"q"));
        small.save(&path).unwrap();
        let reopened = DoubleArray::open(&path).unwrap();
        assert_eq!(reopened.exact_match(b"q"), Some(1));
        assert_eq!(reopened.exact_match(b"a"), None);
    }
}
