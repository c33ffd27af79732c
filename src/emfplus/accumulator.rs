//! Reassembly of EMF+ OBJECT records split across several comments

/// An object whose payload is still arriving.
#[derive(Debug)]
struct Pending {
    object_type: u8,
    object_id: u8,
    total: usize,
    buffer: Vec<u8>,
}

/// Holds at most one partially received object.
#[derive(Debug, Default)]
pub struct ObjectAccumulator {
    pending: Option<Pending>,
}

impl ObjectAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new object of `total` bytes with its first fragment.
    pub fn start(&mut self, object_type: u8, object_id: u8, total: usize, fragment: &[u8]) {
        let mut buffer = Vec::with_capacity(total.min(1 << 20));
        buffer.extend_from_slice(fragment);
        self.pending = Some(Pending { object_type, object_id, total, buffer });
    }

    /// Append a fragment if it belongs to the pending object. Returns false
    /// when nothing is pending or the fragment is for another object.
    pub fn append(&mut self, object_type: u8, object_id: u8, fragment: &[u8]) -> bool {
        match self.pending.as_mut() {
            Some(p) if p.object_type == object_type && p.object_id == object_id => {
                p.buffer.extend_from_slice(fragment);
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the declared size has been reached.
    pub fn is_complete(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| p.buffer.len() >= p.total)
    }

    /// Hand out whatever has been accumulated and reset.
    pub fn take(&mut self) -> Option<(u8, u8, Vec<u8>)> {
        self.pending.take().map(|p| (p.object_type, p.object_id, p.buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_until_total() {
        let mut acc = ObjectAccumulator::new();
        acc.start(1, 3, 6, &[1, 2]);
        assert!(acc.is_pending());
        assert!(!acc.is_complete());
        assert!(acc.append(1, 3, &[3, 4]));
        assert!(!acc.is_complete());
        assert!(acc.append(1, 3, &[5, 6]));
        assert!(acc.is_complete());
        assert_eq!(acc.take(), Some((1, 3, vec![1, 2, 3, 4, 5, 6])));
        assert!(!acc.is_pending());
    }

    #[test]
    fn test_foreign_fragment_rejected() {
        let mut acc = ObjectAccumulator::new();
        assert!(!acc.append(1, 0, &[0]));
        acc.start(1, 0, 8, &[0; 4]);
        assert!(!acc.append(2, 0, &[0]));
        assert!(!acc.append(1, 1, &[0]));
        assert!(acc.append(1, 0, &[0; 4]));
        assert!(acc.is_complete());
    }
}
