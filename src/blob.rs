//! Session-scoped object URLs standing in for browser blob URLs.

use std::collections::HashMap;
use std::fmt;

const SCHEME_PREFIX: &str = "blob:image-converter/";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct Blob {
    mime: String,
    bytes: Vec<u8>,
}

/// Holds the bytes behind every live object URL.
#[derive(Debug, Default)]
pub struct BlobStore {
    next: u64,
    blobs: HashMap<ObjectUrl, Blob>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, mime: &str, bytes: Vec<u8>) -> ObjectUrl {
        self.next += 1;
        let url = ObjectUrl(format!("{}{}", SCHEME_PREFIX, self.next));
        self.blobs.insert(
            url.clone(),
            Blob {
                mime: mime.to_string(),
                bytes,
            },
        );
        url
    }

    pub fn get(&self, url: &ObjectUrl) -> Option<&[u8]> {
        self.blobs.get(url).map(|b| b.bytes.as_slice())
    }

    pub fn mime(&self, url: &ObjectUrl) -> Option<&str> {
        self.blobs.get(url).map(|b| b.mime.as_str())
    }

    pub fn size(&self, url: &ObjectUrl) -> Option<u64> {
        self.blobs.get(url).map(|b| b.bytes.len() as u64)
    }

    /// Releases the bytes; later lookups return `None`.
    pub fn revoke(&mut self, url: &ObjectUrl) {
        self.blobs.remove(url);
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_unique_and_revocable() {
        let mut store = BlobStore::new();
        let a = store.create("image/png", vec![1, 2, 3]);
        let b = store.create("image/png", vec![4]);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("blob:"));
        assert_eq!(store.size(&a), Some(3));

        store.revoke(&a);
        assert_eq!(store.get(&a), None);
        assert_eq!(store.get(&b), Some(&[4u8][..]));
        assert_eq!(store.len(), 1);
    }
}
