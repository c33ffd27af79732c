//! Pattern brush image library
//!
//! Pattern brushes reference their bitmap through a `<pattern id="img-N-ref">`
//! definition. Identical bitmaps are emitted once and shared by id.

/// One emitted pattern bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub id: u32,
    header: Vec<u8>,
    bits: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct ImageLibrary {
    entries: Vec<ImageEntry>,
}

impl ImageLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of a bitmap already in the library with the same header and bits.
    pub fn find(&self, header: &[u8], bits: &[u8]) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.header == header && e.bits == bits)
            .map(|e| e.id)
    }

    /// Register a bitmap and return its id. Ids start at 1.
    pub fn add(&mut self, header: &[u8], bits: &[u8]) -> u32 {
        let id = self.entries.len() as u32 + 1;
        self.entries.push(ImageEntry {
            id,
            header: header.to_vec(),
            bits: bits.to_vec(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut lib = ImageLibrary::new();
        assert_eq!(lib.add(b"h1", b"b1"), 1);
        assert_eq!(lib.add(b"h2", b"b2"), 2);
        assert_eq!(lib.len(), 2);
    }

    #[test]
    fn test_find_matches_content() {
        let mut lib = ImageLibrary::new();
        let id = lib.add(b"header", b"bits");
        assert_eq!(lib.find(b"header", b"bits"), Some(id));
        assert_eq!(lib.find(b"header", b"other"), None);
    }
}
