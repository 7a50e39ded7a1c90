/// Identifies a formatted volume. Kept for parity with on-disk filesystems,
/// nothing in memory checks it.
pub const SB_MAGIC: u32 = 0xDEAD_BEEF;

pub const BLOCK_SIZE: u32 = 4096;
pub const DEFAULT_BLOCKS: u32 = 1024;
pub const DEFAULT_INODES: u32 = 256;

/// Volume wide counters and constants.
///
/// The number of inodes ultimately sets the upper bound on how many files and
/// directories can exist at once. Block counters are carried but never change
/// since file data lives in plain byte buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperBlock {
    /// A 32-bit identifying constant.
    pub sb_magic: u32,
    /// Size in bytes of a logical block.
    pub block_size: u32,
    /// Logical blocks in the volume.
    pub blocks_count: u32,
    /// Blocks available to be allocated.
    pub free_blocks_count: u32,
    /// Total inode numbers, numbered `1..=inodes_count`.
    pub inodes_count: u32,
    /// The number of remaining available inodes.
    pub free_inodes_count: u32,
    /// Mount state, always false for an in-memory volume.
    pub mounted: bool,
}

impl SuperBlock {
    pub fn new(inodes_count: u32, block_size: u32, blocks_count: u32) -> Self {
        Self {
            sb_magic: SB_MAGIC,
            block_size,
            blocks_count,
            free_blocks_count: blocks_count,
            inodes_count,
            // All inodes are initially free.
            free_inodes_count: inodes_count,
            mounted: false,
        }
    }

    pub(crate) fn note_allocated(&mut self) {
        debug_assert!(self.free_inodes_count > 0);
        self.free_inodes_count -= 1;
    }

    pub(crate) fn note_freed(&mut self) {
        debug_assert!(self.free_inodes_count < self.inodes_count);
        self.free_inodes_count += 1;
    }

    /// Inodes currently in use, root included.
    pub fn used_inodes(&self) -> u32 {
        self.inodes_count - self.free_inodes_count
    }
}

impl Default for SuperBlock {
    fn default() -> Self {
        SuperBlock::new(DEFAULT_INODES, BLOCK_SIZE, DEFAULT_BLOCKS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_superblock_matches_volume_constants() {
        let sb = SuperBlock::default();

        assert_eq!(sb.sb_magic, 0xDEAD_BEEF);
        assert_eq!(sb.block_size, 4096);
        assert_eq!(sb.blocks_count, 1024);
        assert_eq!(sb.free_blocks_count, 1024);
        assert_eq!(sb.inodes_count, 256);
        assert_eq!(sb.free_inodes_count, 256);
        assert!(!sb.mounted);
    }

    #[test]
    fn counters_track_allocations() {
        let mut sb = SuperBlock::new(4, BLOCK_SIZE, 8);
        sb.note_allocated();
        sb.note_allocated();
        assert_eq!(sb.used_inodes(), 2);

        sb.note_freed();
        assert_eq!(sb.free_inodes_count, 3);
        assert_eq!(sb.used_inodes(), 1);
    }
}
