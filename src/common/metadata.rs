use std::ops::Deref;

use crate::common::codec::Mode;
use crate::common::error::{QRError, QRResult};
use crate::common::mask::MaskPattern;

// Version
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct Version(usize);

impl Deref for Version {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Version {
    pub const MIN: Version = Version(1);
    pub const MAX: Version = Version(40);

    pub fn new(version: usize) -> QRResult<Self> {
        if (1..=40).contains(&version) {
            Ok(Self(version))
        } else {
            Err(QRError::InvalidArgument)
        }
    }

    pub(crate) const fn from_index(version: usize) -> Self {
        debug_assert!(1 <= version && version <= 40, "Invalid version");
        Self(version)
    }

    pub const fn width(self) -> usize {
        self.0 * 4 + 17
    }

    /// Version range bucket: 0 for v1-9, 1 for v10-26, 2 for v27-40. Selects
    /// count indicator widths and the Annex J mode switch thresholds.
    pub const fn bucket(self) -> usize {
        match self.0 {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        }
    }

    /// Modules left over for data after all function patterns are reserved.
    pub fn raw_data_modules(self) -> usize {
        let v = self.0;
        let mut count = (16 * v + 128) * v + 64;
        if v >= 2 {
            let aligns = v / 7 + 2;
            count -= (25 * aligns - 10) * aligns - 55;
            if v >= 7 {
                count -= 36;
            }
        }
        count
    }

    pub fn total_codewords(self) -> usize {
        self.raw_data_modules() >> 3
    }

    /// Data modules that hold neither a data nor an ecc codeword bit.
    pub fn remainder_bits(self) -> usize {
        self.raw_data_modules() & 7
    }

    pub fn data_codewords(self, ec_level: ECLevel) -> usize {
        self.total_codewords() - self.block_count(ec_level) * self.ecc_per_block(ec_level)
    }

    pub fn data_bit_capacity(self, ec_level: ECLevel) -> usize {
        self.data_codewords(ec_level) << 3
    }

    pub fn block_count(self, ec_level: ECLevel) -> usize {
        EC_BLOCK_COUNT[self.0 - 1][ec_level as usize]
    }

    pub fn ecc_per_block(self, ec_level: ECLevel) -> usize {
        ECC_PER_BLOCK[self.0 - 1][ec_level as usize]
    }

    pub fn char_count_bits(self, mode: Mode) -> usize {
        match self.bucket() {
            0 => match mode {
                Mode::Numeric => 10,
                Mode::Alphanumeric => 9,
                Mode::Byte => 8,
                Mode::Kanji => 8,
            },
            1 => match mode {
                Mode::Numeric => 12,
                Mode::Alphanumeric => 11,
                Mode::Byte => 16,
                Mode::Kanji => 10,
            },
            _ => match mode {
                Mode::Numeric => 14,
                Mode::Alphanumeric => 13,
                Mode::Byte => 16,
                Mode::Kanji => 12,
            },
        }
    }

    /// Alignment pattern center coordinates, ascending, used on both axes.
    /// The centers form an arithmetic sequence ending at width - 7, except the
    /// gap between the first and second position which absorbs the rounding.
    pub fn alignment_positions(self) -> Vec<i16> {
        let v = self.0;
        if v == 1 {
            return vec![];
        }
        let aligns = v / 7 + 2;
        let step = if v == 32 { 26 } else { (4 * v + 2 * aligns + 1) / (2 * aligns - 2) * 2 };

        let last = (self.width() - 7) as i16;
        let mut positions = vec![6; aligns];
        for (i, slot) in positions.iter_mut().enumerate().skip(1) {
            *slot = last - ((aligns - 1 - i) * step) as i16;
        }
        positions
    }

    /// 18-bit version information: version in the high 6 bits followed by the
    /// 12-bit Golay remainder over GF(2) with generator 0x1F25.
    pub fn info(self) -> u32 {
        debug_assert!(self.0 >= 7, "Version info only exists for versions 7-40");

        let version = self.0 as u32;
        let mut rem = version;
        for _ in 0..12 {
            rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
        }
        let info = version << 12 | rem;
        debug_assert!(info >> 18 == 0, "Version info overflowed 18 bits: {info}");
        info
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    /// Levels above self, weakest first. Candidates for the capacity planner's
    /// error correction boost.
    pub(crate) fn stronger(self) -> impl Iterator<Item = ECLevel> {
        [Self::L, Self::M, Self::Q, Self::H].into_iter().filter(move |&l| l > self)
    }
}

// Format information
//------------------------------------------------------------------------------

/// 15-bit format information: 2 ec level bits and 3 mask bits followed by the
/// 10-bit BCH remainder modulo 0x537, the whole masked with 0x5412. The ec
/// level bits follow the standard's non-monotone mapping (L=01, M=00, Q=11,
/// H=10), which is the table index with its low bit flipped.
pub fn format_info(ec_level: ECLevel, mask_pattern: MaskPattern) -> u32 {
    let data = ((ec_level as u32) ^ 1) << 3 | u32::from(*mask_pattern);
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    let info = (data << 10 | rem) ^ 0x5412;
    debug_assert!(info >> 15 == 0, "Format info overflowed 15 bits: {info}");
    info
}

// Global constants
//------------------------------------------------------------------------------

// Ecc codewords per block, indexed by version - 1 and ec level
static ECC_PER_BLOCK: [[usize; 4]; 40] = [
    [7, 10, 13, 17],
    [10, 16, 22, 28],
    [15, 26, 18, 22],
    [20, 18, 26, 16],
    [26, 24, 18, 22],
    [18, 16, 24, 28],
    [20, 18, 18, 26],
    [24, 22, 22, 26],
    [30, 22, 20, 24],
    [18, 26, 24, 28],
    [20, 30, 28, 24],
    [24, 22, 26, 28],
    [26, 22, 24, 22],
    [30, 24, 20, 24],
    [22, 24, 30, 24],
    [24, 28, 24, 30],
    [28, 28, 28, 28],
    [30, 26, 28, 28],
    [28, 26, 26, 26],
    [28, 26, 30, 28],
    [28, 26, 28, 30],
    [28, 28, 30, 24],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [26, 28, 30, 30],
    [28, 28, 28, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
];

// Error correction block count, indexed by version - 1 and ec level
static EC_BLOCK_COUNT: [[usize; 4]; 40] = [
    [1, 1, 1, 1],
    [1, 1, 1, 1],
    [1, 1, 2, 2],
    [1, 2, 2, 4],
    [1, 2, 4, 4],
    [2, 4, 4, 4],
    [2, 4, 6, 5],
    [2, 4, 6, 6],
    [2, 5, 8, 8],
    [4, 5, 8, 8],
    [4, 5, 8, 11],
    [4, 8, 10, 11],
    [4, 9, 12, 16],
    [4, 9, 16, 16],
    [6, 10, 12, 18],
    [6, 10, 17, 16],
    [6, 11, 16, 19],
    [6, 13, 18, 21],
    [7, 14, 21, 25],
    [8, 16, 20, 25],
    [8, 17, 23, 25],
    [9, 17, 23, 34],
    [9, 18, 25, 30],
    [10, 20, 27, 32],
    [12, 21, 29, 35],
    [12, 23, 34, 37],
    [12, 25, 34, 40],
    [13, 26, 35, 42],
    [14, 28, 38, 45],
    [15, 29, 40, 48],
    [16, 31, 43, 51],
    [17, 33, 45, 54],
    [18, 35, 48, 57],
    [19, 37, 51, 60],
    [19, 38, 53, 63],
    [20, 40, 56, 66],
    [21, 43, 59, 70],
    [22, 45, 62, 74],
    [24, 47, 65, 77],
    [25, 49, 68, 81],
];
