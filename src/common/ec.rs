use std::ops::Deref;

use crate::common::metadata::{ECLevel, Version};

// Galois field arithmetic over GF(2^8) with reducing polynomial 0x11D
//------------------------------------------------------------------------------

/// Russian peasant multiplication of two field elements.
pub fn gf_mul(x: u8, y: u8) -> u8 {
    let (x, y) = (u32::from(x), u32::from(y));
    let mut product = 0u32;
    for i in (0..8).rev() {
        product = (product << 1) ^ ((product >> 7) * 0x11D);
        product ^= x * ((y >> i) & 1);
    }
    debug_assert!(product >> 8 == 0, "Field product out of range: {product}");
    product as u8
}

// Reed-Solomon generator & remainder
//------------------------------------------------------------------------------

/// Generator polynomial (x - a^0)(x - a^1)...(x - a^(degree-1)) with a = 0x02.
/// Coefficients are stored highest power first, excluding the leading 1.
pub fn rs_divisor(degree: usize) -> Vec<u8> {
    debug_assert!(degree <= 255, "Divisor degree out of range: {degree}");

    if degree == 0 {
        return vec![];
    }

    let mut divisor = vec![0u8; degree];
    divisor[degree - 1] = 1;

    let mut root = 1u8;
    for _ in 0..degree {
        for j in 0..degree {
            divisor[j] = gf_mul(divisor[j], root);
            if j + 1 < degree {
                divisor[j] ^= divisor[j + 1];
            }
        }
        root = gf_mul(root, 0x02);
    }
    divisor
}

/// Remainder of polynomial long division of `data` by `divisor`. The
/// remainder coefficients are the ecc codewords of the block.
pub fn rs_remainder(data: &[u8], divisor: &[u8]) -> Vec<u8> {
    let mut rem = vec![0u8; divisor.len()];
    if divisor.is_empty() {
        return rem;
    }

    for &byte in data {
        let factor = byte ^ rem[0];
        rem.rotate_left(1);
        rem[divisor.len() - 1] = 0;
        for (r, &d) in rem.iter_mut().zip(divisor.iter()) {
            *r ^= gf_mul(d, factor);
        }
    }
    rem
}

// Block layout & interleaving
//------------------------------------------------------------------------------

/// Splits the data codewords into ec blocks. The first
/// `blocks - raw % blocks` blocks are one byte shorter than the rest.
pub fn blockify(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<&[u8]> {
    let raw = version.total_codewords();
    let blocks = version.block_count(ec_level);
    let ecc_per_block = version.ecc_per_block(ec_level);
    let short_count = blocks - raw % blocks;
    let short_len = raw / blocks - ecc_per_block;

    debug_assert!(
        data.len() == short_len * blocks + (blocks - short_count),
        "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
        data.len(),
        short_len * blocks + (blocks - short_count)
    );

    let mut data_blocks = Vec::with_capacity(blocks);
    let mut offset = 0;
    for i in 0..blocks {
        let len = short_len + usize::from(i >= short_count);
        data_blocks.push(&data[offset..offset + len]);
        offset += len;
    }
    data_blocks
}

/// Ecc generator: computes the per block Reed-Solomon remainders for the
/// blockified data codewords.
pub fn ecc(data: &[u8], version: Version, ec_level: ECLevel) -> (Vec<&[u8]>, Vec<Vec<u8>>) {
    let data_blocks = blockify(data, version, ec_level);

    let divisor = rs_divisor(version.ecc_per_block(ec_level));
    let ecc_blocks = data_blocks.iter().map(|b| rs_remainder(b, &divisor)).collect::<Vec<_>>();

    (data_blocks, ecc_blocks)
}

/// Interleaves codewords column major across the ragged block grid; a burst
/// of damage then spreads over all blocks.
pub fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
    let max_block_size = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
    let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
    let mut res = Vec::with_capacity(total_size);
    for i in 0..max_block_size {
        for b in blocks {
            if i < b.len() {
                res.push(b[i]);
            }
        }
    }
    res
}


#[cfg(test)]
mod rs_tests {
    use super::{rs_divisor, rs_remainder};

    #[test]
    fn test_divisor_degrees() {
        for d in [0, 1, 2, 7, 10, 30, 68, 255] {
            assert_eq!(rs_divisor(d).len(), d);
        }
    }

    #[test]
    fn test_divisor_small() {
        // (x - 1) -> x + 1
        assert_eq!(rs_divisor(1), vec![1]);
        // (x - 1)(x - a) -> x^2 + 3x + 2
        assert_eq!(rs_divisor(2), vec![3, 2]);
        // (x^2 + 3x + 2)(x - a^2) -> x^3 + 7x^2 + 14x + 8
        assert_eq!(rs_divisor(3), vec![7, 14, 8]);
    }

    #[test]
    fn test_remainder_degree_zero() {
        assert_eq!(rs_remainder(&[0x55], &rs_divisor(0)), vec![]);
    }

    #[test]
    fn test_remainder_of_zero_padded_byte() {
        let divisor = rs_divisor(10);
        for b in [0u8, 1, 0x80, 0xFF] {
            let mut data = vec![0u8; 9];
            data.push(b);
            let rem = rs_remainder(&data, &divisor);
            assert_eq!(rem.iter().any(|&r| r != 0), b != 0);
        }
    }

    #[test]
    fn test_poly_mod_1() {
        let rem = rs_remainder(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11", &rs_divisor(10));
        assert_eq!(&*rem, b"\xc4#'w\xeb\xd7\xe7\xe2]\x17");
    }

    #[test]
    fn test_poly_mod_2() {
        let rem = rs_remainder(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec", &rs_divisor(13));
        assert_eq!(&*rem, b"\xa8H\x16R\xd96\x9c\x00.\x0f\xb4z\x10");
    }

    #[test]
    fn test_poly_mod_3() {
        let rem = rs_remainder(b"CUF\x86W&U\xc2w2\x06\x12\x06g&", &rs_divisor(18));
        assert_eq!(&*rem, b"\xd5\xc7\x0b-s\xf7\xf1\xdf\xe5\xf8\x9au\x9aoV\xa1o'");
    }
}
