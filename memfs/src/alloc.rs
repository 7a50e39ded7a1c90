#[derive(Debug, PartialEq, Clone, Copy)]
pub enum State {
    Free,
    Used,
}

/// One bit per inode number, set when the number is in use.
///
/// Bit 0 is never handed out since inode numbers start at 1.
#[derive(Debug, Clone)]
pub struct Bitmap {
    bitmap: Vec<u64>,
    len: usize,
}

impl Bitmap {
    /// Creates a bitmap tracking `len` slots, all free.
    pub fn new(len: usize) -> Self {
        Self {
            bitmap: vec![0; (len + 63) / 64],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn get(&self, nr: usize) -> State {
        assert!(nr < self.len, "bitmap index {} out of range", nr);
        // Grab the u64 containing the significant bit.
        let word = self.bitmap[nr / 64];

        let mask = 0b01_u64 << (nr % 64);
        if word & mask == 0 {
            State::Free
        } else {
            State::Used
        }
    }

    pub fn set_reserved(&mut self, nr: usize) {
        assert!(nr < self.len, "bitmap index {} out of range", nr);
        self.bitmap[nr / 64] |= 0b01_u64 << (nr % 64);
    }

    pub fn set_free(&mut self, nr: usize) {
        assert!(nr < self.len, "bitmap index {} out of range", nr);
        self.bitmap[nr / 64] &= !(0b01_u64 << (nr % 64));
    }

    pub fn count_free(&self) -> usize {
        let used: u32 = self.bitmap.iter().map(|word| word.count_ones()).sum();
        self.len - used as usize
    }
}

/// Walks the bitmap from a starting slot and yields every free slot in
/// ascending order, so the first item is always the lowest free number.
pub struct NextAvailableAllocation<'a> {
    /// Keeps track of the next starting place for looking for free slots.
    marker: usize,
    bitmap: &'a Bitmap,
}

impl<'a> NextAvailableAllocation<'a> {
    pub fn new(bitmap: &'a Bitmap, start: usize) -> Self {
        Self {
            marker: start,
            bitmap,
        }
    }
}

impl<'a> Iterator for NextAvailableAllocation<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while self.marker < self.bitmap.len() {
            let candidate = self.marker;
            self.marker += 1;
            if let State::Free = self.bitmap.get(candidate) {
                return Some(candidate);
            }
        }
        None
    }
}
