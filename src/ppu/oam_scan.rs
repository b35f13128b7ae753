use super::constants::*;
use super::memory::Oam;

/// An object picked during ObjectScan, with the coordinates latched at scan time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectedObject {
    pub index: u8,
    pub y: u8,
    pub x: u8,
}

/// Up to ten objects visible on the current scanline, in draw-priority order
/// once `resolve_order` has run.
#[derive(Debug, Clone, Default)]
pub struct LineObjects {
    objects: [SelectedObject; MAX_OBJECTS_PER_LINE],
    len: usize,
    fetched: u16, // Bit per slot, set once the slot's fetch penalty has been paid
}

impl LineObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.fetched = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, slot: usize) -> SelectedObject {
        self.objects[slot]
    }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[SelectedObject] {
        &self.objects[..self.len]
    }

    /// Evaluates object table entry `index` against `line`. Entries with X = 0 are
    /// never selected; once ten objects are held further entries are skipped.
    pub fn scan_entry(&mut self, oam: &Oam, index: usize, line: u8, height: u8) -> bool {
        if self.len == MAX_OBJECTS_PER_LINE {
            return false;
        }
        let entry = oam.object(index);
        if entry.x == 0 {
            return false;
        }
        let top = entry.y as i16 - OBJECT_Y_BIAS;
        let line = line as i16;
        if line < top || line >= top + height as i16 {
            return false;
        }
        self.objects[self.len] = SelectedObject {
            index: index as u8,
            y: entry.y,
            x: entry.x,
        };
        self.len += 1;
        true
    }

    /// Orders the selection for compositing. Entries were collected in table order,
    /// so a stable sort on X breaks ties by ascending table index.
    pub fn resolve_order(&mut self, by_x: bool) {
        if by_x {
            self.objects[..self.len].sort_by_key(|object| (object.x, object.index));
        }
    }

    /// Marks `slot` as fetched, returning `true` the first time on this line.
    pub fn mark_fetched(&mut self, slot: usize) -> bool {
        let bit = 1u16 << slot;
        let first = self.fetched & bit == 0;
        self.fetched |= bit;
        first
    }
}
