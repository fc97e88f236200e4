//! Rolling checksum block appended after each chunk's payload.
//!
//! This is not an error-correcting code. Each value is `(Σ nibble[i]·(i+1) + e·13) mod 16`,
//! regenerable from the payload alone; decoders may compare it but never correct with it.

use crate::capacity::ecc_len;

/// Offset added per ECC column.
const ECC_STEP: u32 = 13;

/// Position-weighted sum of a run's nibbles, weights starting at 1, modulo 2^32.
///
/// Only the low four bits are ever used, so the sum wraps instead of overflowing.
pub fn weighted_sum(nibbles: &[u8]) -> u32 {
    nibbles.iter().enumerate().fold(0u32, |acc, (i, &n)| {
        acc.wrapping_add(u32::from(n).wrapping_mul((i as u32).wrapping_add(1)))
    })
}

/// ECC values for a payload run; `ceil(len / 4)` entries.
pub fn ecc_block(nibbles: &[u8]) -> Vec<u8> {
    let sum = weighted_sum(nibbles);
    (0..ecc_len(nibbles.len()) as u32)
        .map(|e| (sum.wrapping_add(e * ECC_STEP) & 0x0F) as u8)
        .collect()
}

/// True if `stored` matches the block regenerated from `nibbles`.
pub fn verify(nibbles: &[u8], stored: &[u8]) -> bool {
    ecc_block(nibbles) == stored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_char_block() {
        // 'A','B' → [4,1,4,2]: 4 + 2 + 12 + 8 = 26
        let nibbles = [4, 1, 4, 2];
        assert_eq!(weighted_sum(&nibbles), 26);
        assert_eq!(ecc_block(&nibbles), vec![10]);
    }

    #[test]
    fn block_steps_by_thirteen() {
        let nibbles = [1u8; 9];
        // sum = 45, K = 3
        assert_eq!(ecc_block(&nibbles), vec![45 & 15, (45 + 13) & 15, (45 + 26) & 15]);
    }

    #[test]
    fn empty_run_has_no_block() {
        assert!(ecc_block(&[]).is_empty());
    }

    #[test]
    fn long_runs_wrap_without_overflow() {
        // 40_000 nibbles of 0xF: the exact sum is 15 * 40_000 * 40_001 / 2 > u32::MAX
        let nibbles = vec![0x0Fu8; 40_000];
        let exact: u64 = (1..=40_000u64).map(|w| 15 * w).sum();
        assert!(exact > u64::from(u32::MAX));
        let block = ecc_block(&nibbles);
        assert_eq!(block.len(), 10_000);
        assert_eq!(u64::from(block[0]), exact & 0x0F);
        assert!(verify(&nibbles, &block));
    }

    #[test]
    fn verify_detects_swapped_nibbles() {
        let block = ecc_block(&[1, 2, 3, 4]);
        assert!(verify(&[1, 2, 3, 4], &block));
        assert!(!verify(&[2, 1, 3, 4], &block));
    }
}
