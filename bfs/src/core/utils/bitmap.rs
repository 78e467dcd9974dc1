// SPDX-License-Identifier: MIT

//! Bit operations over the free-block bitmap.
//!
//! Bit `n` describes block `n`; bit 0 is the LSB of byte 0. A set bit means
//! the block is in use. The bitmap region is padded to whole blocks, so every
//! query takes an explicit `end` bound (the block count) and never looks at
//! padding bits.

pub trait BitmapOps {
    /// Sets or clears bit `bit`. Out-of-range bits are ignored.
    fn set_bit(&mut self, bit: usize, value: bool);

    /// Returns bit `bit`, `false` when out of range.
    fn get_bit(&self, bit: usize) -> bool;

    /// Counts set bits in `[start, end)`.
    fn count_ones_in_range(&self, start: usize, end: usize) -> usize;

    /// Counts clear bits in `[start, end)`.
    fn count_zeros_in_range(&self, start: usize, end: usize) -> usize {
        end.saturating_sub(start) - self.count_ones_in_range(start, end)
    }

    /// First clear bit in `[start, end)`.
    fn find_first_zero(&self, start: usize, end: usize) -> Option<usize>;
}

impl BitmapOps for [u8] {
    #[inline]
    fn set_bit(&mut self, bit: usize, value: bool) {
        if let Some(byte) = self.get_mut(bit / 8) {
            let mask = 1u8 << (bit % 8);
            if value {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
        }
    }

    #[inline]
    fn get_bit(&self, bit: usize) -> bool {
        self.get(bit / 8)
            .is_some_and(|b| (b & (1 << (bit % 8))) != 0)
    }

    fn count_ones_in_range(&self, start: usize, end: usize) -> usize {
        let end = end.min(self.len() * 8);
        if start >= end {
            return 0;
        }
        (start..end).filter(|&i| self.get_bit(i)).count()
    }

    fn find_first_zero(&self, start: usize, end: usize) -> Option<usize> {
        let end = end.min(self.len() * 8);
        let mut bit = start;
        while bit < end {
            // Skip full bytes when aligned
            if bit % 8 == 0 && self[bit / 8] == 0xFF {
                bit += 8;
                continue;
            }
            if !self.get_bit(bit) {
                return Some(bit);
            }
            bit += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_bit() {
        let mut bitmap = [0u8; 4];

        bitmap.set_bit(0, true);
        bitmap.set_bit(7, true);
        bitmap.set_bit(8, true);
        assert_eq!(bitmap[0], 0b1000_0001);
        assert_eq!(bitmap[1], 0b0000_0001);

        bitmap.set_bit(0, false);
        assert!(!bitmap.get_bit(0));
        assert!(bitmap.get_bit(7));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut bitmap = [0u8; 2];
        bitmap.set_bit(100, true);
        assert_eq!(bitmap, [0, 0]);
        assert!(!bitmap.get_bit(100));
        assert_eq!(bitmap.find_first_zero(0, 100), Some(0));
        assert_eq!(bitmap.count_ones_in_range(4, 100), 0);
    }

    #[test]
    fn test_counts_respect_end() {
        let bitmap = [0b1010_1010u8, 0b1111_0000];

        assert_eq!(bitmap.count_ones_in_range(0, 8), 4);
        assert_eq!(bitmap.count_ones_in_range(8, 12), 0);
        assert_eq!(bitmap.count_zeros_in_range(8, 12), 4);
        assert_eq!(bitmap.count_zeros_in_range(3, 3), 0);
    }

    #[test]
    fn test_find_first_zero_bounded() {
        let bitmap = [0xFFu8, 0b1111_1110, 0x00];
        assert_eq!(bitmap.find_first_zero(0, 24), Some(8));

        let bitmap = [0xFFu8, 0b1111_1101];
        assert_eq!(bitmap.find_first_zero(0, 16), Some(9));
        assert_eq!(bitmap.find_first_zero(10, 16), None);

        // Padding bits past `end` are never handed out
        let bitmap = [0b0000_1111u8];
        assert_eq!(bitmap.find_first_zero(0, 4), None);
        assert_eq!(bitmap.find_first_zero(0, 5), Some(4));
    }
}
