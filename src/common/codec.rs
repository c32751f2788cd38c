pub use encode::*;

use crate::common::error::{QRError, QRResult};
use crate::common::metadata::Version;

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    Byte = 0b0100,
    Kanji = 0b1000,
}

impl Mode {
    pub fn indicator(self) -> u8 {
        self as u8
    }

    /// Whether a code point can be carried by a segment of this mode. Byte
    /// segments admit Kanji code points as their two Shift JIS bytes.
    pub fn contains(self, cp: u16) -> bool {
        match self {
            Self::Numeric => is_numeric(cp),
            Self::Alphanumeric => alphanumeric_index(cp).is_some(),
            Self::Byte => cp <= 0xFF || is_kanji(cp),
            Self::Kanji => is_kanji(cp),
        }
    }

    /// Payload bits for a run of code points in this mode.
    pub fn encoded_len(self, data: &[u16]) -> usize {
        match self {
            Self::Numeric => (data.len() * 10 + 2) / 3,
            Self::Alphanumeric => (data.len() * 11 + 1) / 2,
            Self::Byte => data.iter().map(|&c| if c > 0xFF { 16 } else { 8 }).sum(),
            Self::Kanji => data.len() * 13,
        }
    }

    /// Value of the character count indicator: code points, except in byte
    /// mode which counts bytes.
    pub fn char_count(self, data: &[u16]) -> usize {
        match self {
            Self::Byte => data.iter().map(|&c| if c > 0xFF { 2 } else { 1 }).sum(),
            _ => data.len(),
        }
    }
}

// Character classes
//------------------------------------------------------------------------------

#[inline]
fn is_numeric(cp: u16) -> bool {
    (0x30..=0x39).contains(&cp)
}

/// Position of a code point in the 45 character alphanumeric set, or None
/// when it is not a member. Membership and index are distinct queries; the
/// digit '0' maps to index 0.
#[inline]
fn alphanumeric_index(cp: u16) -> Option<u16> {
    match cp {
        0x30..=0x39 => Some(cp - 0x30),
        0x41..=0x5A => Some(cp - 0x41 + 10),
        0x20 => Some(36),
        0x24 => Some(37),
        0x25 => Some(38),
        0x2A => Some(39),
        0x2B => Some(40),
        0x2D => Some(41),
        0x2E => Some(42),
        0x2F => Some(43),
        0x3A => Some(44),
        _ => None,
    }
}

/// Shift JIS double byte ranges of Annex H.
#[inline]
fn is_kanji(cp: u16) -> bool {
    (0x8140..=0x9FFC).contains(&cp) || (0xE040..=0xEBBF).contains(&cp)
}

/// Exclusive byte class: representable in 8 bits but in no richer class.
#[inline]
fn is_byte_class(cp: u16) -> bool {
    cp <= 0xFF && alphanumeric_index(cp).is_none()
}

/// Alphanumeric class excluding digits, as the segmentation rules use it.
#[inline]
fn is_exclusive_alnum(cp: u16) -> bool {
    !is_numeric(cp) && alphanumeric_index(cp).is_some()
}


// Segment
//------------------------------------------------------------------------------

/// A maximal run of code points carried in one mode. `start` is the offset of
/// `data` within the full input, used to anchor ECI headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub mode: Mode,
    pub start: usize,
    pub data: &'a [u16],
}

impl Segment<'_> {
    pub fn bit_len(&self, version: Version) -> usize {
        MODE_INDICATOR_LEN + version.char_count_bits(self.mode) + self.mode.encoded_len(self.data)
    }
}


// Segmenter
//------------------------------------------------------------------------------

mod segmenter {
    use itertools::Itertools;

    use super::{is_byte_class, is_exclusive_alnum, is_kanji, is_numeric, Mode, Segment};
    use crate::common::error::{QRError, QRResult};

    /// Greedy optimal partition of the input into mode runs, following the
    /// switch thresholds of ISO/IEC 18004 Annex J. `bucket` is the version
    /// range bucket the thresholds are indexed by.
    pub(super) fn compute_segments(data: &[u16], bucket: usize) -> Vec<Segment> {
        if data.is_empty() {
            return vec![];
        }

        let mut mode = initial_mode(data, bucket);
        let mut modes = Vec::with_capacity(data.len());
        for (current, &c) in data.iter().enumerate() {
            mode = next_mode(mode, data, current, c, bucket);
            modes.push(mode);
        }

        let mut segments = Vec::new();
        let mut start = 0;
        for (mode, group) in &modes.iter().chunk_by(|&&m| m) {
            let len = group.count();
            segments.push(Segment { mode, start, data: &data[start..start + len] });
            start += len;
        }
        segments
    }

    /// One segment spanning the whole input, for a caller supplied mode.
    pub(super) fn override_segments(data: &[u16], mode: Mode) -> QRResult<Vec<Segment>> {
        if !data.iter().all(|&c| mode.contains(c)) {
            return Err(QRError::IncompatibleOverride);
        }
        if data.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![Segment { mode, start: 0, data }])
    }

    fn next_mode(mode: Mode, data: &[u16], current: usize, c: u16, bucket: usize) -> Mode {
        match mode {
            Mode::Numeric => {
                if is_kanji(c) {
                    Mode::Kanji
                } else if is_byte_class(c) {
                    Mode::Byte
                } else if is_exclusive_alnum(c) {
                    Mode::Alphanumeric
                } else {
                    Mode::Numeric
                }
            }
            Mode::Alphanumeric => {
                if is_kanji(c) {
                    Mode::Kanji
                } else if is_byte_class(c) {
                    Mode::Byte
                } else if is_numeric(c) && numeric_run(data, current) >= 13 + 2 * bucket {
                    Mode::Numeric
                } else {
                    Mode::Alphanumeric
                }
            }
            Mode::Byte | Mode::Kanji => {
                let mut next = mode;
                if mode == Mode::Byte
                    && is_kanji(c)
                    && kanji_run(data, current) >= 9 + (3 * bucket).min(4)
                {
                    next = Mode::Kanji;
                }
                if alphanumeric_run(data, current) >= 11 + (4 * bucket).min(5) {
                    next = Mode::Alphanumeric;
                }
                if next == mode {
                    let run = numeric_run(data, current);
                    if run >= 6 + (2 * bucket).min(3)
                        || (run >= 6 + bucket
                            && data.get(current + run).copied().is_some_and(is_exclusive_alnum))
                    {
                        next = Mode::Numeric;
                    }
                }
                // A Kanji segment admits nothing but Kanji
                if next == mode && mode == Mode::Kanji && !is_kanji(c) {
                    next = Mode::Byte;
                }
                next
            }
        }
    }

    /// Initial mode selection, the four cases of Annex J.
    pub(super) fn initial_mode(data: &[u16], bucket: usize) -> Mode {
        let c0 = data[0];

        // Case 1
        if is_byte_class(c0) {
            return Mode::Byte;
        }

        // Case 2
        if is_kanji(c0) {
            return match data.get(1).copied() {
                Some(c1) if is_numeric(c1) || is_exclusive_alnum(c1) => Mode::Kanji,
                Some(c1)
                    if is_byte_class(c1)
                        && kanji_run(data, 1) >= if bucket == 2 { 6 } else { 5 } =>
                {
                    Mode::Byte
                }
                _ => Mode::Kanji,
            };
        }

        // Case 3
        if is_exclusive_alnum(c0) {
            let run = alphanumeric_run(data, 0);
            return match data.get(run).copied() {
                Some(c) if run < 6 + bucket && (is_byte_class(c) || is_kanji(c)) => Mode::Byte,
                _ => Mode::Alphanumeric,
            };
        }

        // Case 4
        debug_assert!(is_numeric(c0), "Unclassified code point: {c0}");
        let run = numeric_run(data, 0);
        match data.get(run).copied() {
            Some(c)
                if run < if bucket == 2 { 5 } else { 4 } && (is_byte_class(c) || is_kanji(c)) =>
            {
                Mode::Byte
            }
            Some(c) if run < 7 + bucket && is_exclusive_alnum(c) => Mode::Alphanumeric,
            _ => Mode::Numeric,
        }
    }

    fn numeric_run(data: &[u16], start: usize) -> usize {
        data[start..].iter().take_while(|&&c| is_numeric(c)).count()
    }

    fn alphanumeric_run(data: &[u16], start: usize) -> usize {
        data[start..].iter().take_while(|&&c| is_exclusive_alnum(c)).count()
    }

    fn kanji_run(data: &[u16], start: usize) -> usize {
        data[start..].iter().take_while(|&&c| is_kanji(c)).count()
    }

}

// Fnc1 & structured append options
//------------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub enum Fnc1 {
    #[default]
    None,
    First,
    Second,
}

/// Position of a symbol in a structured append group. `parity` is the XOR of
/// every byte of the full message before splitting.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct StructuredAppend {
    index: u8,
    count: u8,
    parity: u8,
}

impl StructuredAppend {
    pub fn new(index: u8, count: u8, parity: u8) -> QRResult<Self> {
        if count == 0 || count > 16 || index >= count {
            return Err(QRError::InvalidArgument);
        }
        Ok(Self { index, count, parity })
    }

    pub fn index(self) -> u8 {
        self.index
    }

    pub fn count(self) -> u8 {
        self.count
    }

    pub fn parity(self) -> u8 {
        self.parity
    }
}

// Writer for encoded data
//------------------------------------------------------------------------------

mod writer {
    use std::cmp::min;

    use super::{
        alphanumeric_index, Fnc1, Mode, Segment, StructuredAppend, ECI_INDICATOR,
        FNC1_FIRST_INDICATOR, FNC1_SECOND_INDICATOR, MAX_ECI_VALUE, MODE_INDICATOR_LEN,
        PADDING_CODEWORDS, STRUCTURED_APPEND_INDICATOR,
    };
    use crate::common::bitstream::BitStream;
    use crate::common::error::{QRError, QRResult};
    use crate::common::metadata::Version;

    pub fn push_segment(seg: &Segment, version: Version, out: &mut BitStream) -> QRResult<()> {
        push_header(seg, version, out)?;
        match seg.mode {
            Mode::Numeric => push_numeric_data(seg.data, out),
            Mode::Alphanumeric => push_alphanumeric_data(seg.data, out),
            Mode::Byte => push_byte_data(seg.data, out),
            Mode::Kanji => push_kanji_data(seg.data, out),
        }
    }

    fn push_header(seg: &Segment, version: Version, out: &mut BitStream) -> QRResult<()> {
        out.push_bits(seg.mode.indicator(), MODE_INDICATOR_LEN)?;
        let char_count = seg.mode.char_count(seg.data);
        let len_bits = version.char_count_bits(seg.mode);
        debug_assert!(
            char_count < (1 << len_bits),
            "Char count exceeds indicator width: Char count {char_count}, Width {len_bits}"
        );
        out.push_bits(char_count as u32, len_bits)
    }

    fn push_numeric_data(data: &[u16], out: &mut BitStream) -> QRResult<()> {
        for chunk in data.chunks(3) {
            let value = chunk.iter().fold(0u32, |n, &c| n * 10 + u32::from(c - 0x30));
            out.push_bits(value, chunk.len() * 3 + 1)?;
        }
        Ok(())
    }

    fn push_alphanumeric_data(data: &[u16], out: &mut BitStream) -> QRResult<()> {
        for chunk in data.chunks(2) {
            let value = chunk
                .iter()
                .try_fold(0u32, |n, &c| Some(n * 45 + u32::from(alphanumeric_index(c)?)))
                .ok_or(QRError::Internal)?;
            out.push_bits(value, chunk.len() * 5 + 1)?;
        }
        Ok(())
    }

    fn push_byte_data(data: &[u16], out: &mut BitStream) -> QRResult<()> {
        for &c in data {
            if c > 0xFF {
                out.push_bits(c, 16)?;
            } else {
                out.push_bits(c as u8, 8)?;
            }
        }
        Ok(())
    }

    fn push_kanji_data(data: &[u16], out: &mut BitStream) -> QRResult<()> {
        for &c in data {
            let shifted = match c {
                0x8140..=0x9FFC => c - 0x8140,
                0xE040..=0xEBBF => c - 0xC140,
                _ => return Err(QRError::Internal),
            };
            let packed = u32::from(shifted >> 8) * 0xC0 + u32::from(shifted & 0xFF);
            out.push_bits(packed, 13)?;
        }
        Ok(())
    }

    /// ECI header: mode indicator followed by the 8, 16 or 24 bit designator.
    pub fn push_eci(value: u32, out: &mut BitStream) -> QRResult<()> {
        if value > MAX_ECI_VALUE {
            return Err(QRError::InvalidArgument);
        }
        out.push_bits(ECI_INDICATOR, MODE_INDICATOR_LEN)?;
        if value < 128 {
            out.push_bits(value, 8)
        } else if value < 16384 {
            out.push_bits(0b10 << 14 | value, 16)
        } else {
            out.push_bits(0b110 << 21 | value, 24)
        }
    }

    pub fn eci_designator_bits(value: u32) -> usize {
        if value < 128 {
            8
        } else if value < 16384 {
            16
        } else {
            24
        }
    }

    pub fn push_fnc1(fnc1: Fnc1, out: &mut BitStream) -> QRResult<()> {
        match fnc1 {
            Fnc1::None => Ok(()),
            Fnc1::First => out.push_bits(FNC1_FIRST_INDICATOR, MODE_INDICATOR_LEN),
            Fnc1::Second => out.push_bits(FNC1_SECOND_INDICATOR, MODE_INDICATOR_LEN),
        }
    }

    pub fn push_structured_append(sa: StructuredAppend, out: &mut BitStream) -> QRResult<()> {
        out.push_bits(STRUCTURED_APPEND_INDICATOR, MODE_INDICATOR_LEN)?;
        out.push_bits(sa.index(), 4)?;
        out.push_bits(sa.count() - 1, 4)?;
        out.push_bits(sa.parity(), 8)
    }

    pub fn push_terminator(out: &mut BitStream) -> QRResult<()> {
        let bit_len = out.len();
        let bit_capacity = out.capacity();
        if bit_len < bit_capacity {
            let term_len = min(4, bit_capacity - bit_len);
            out.push_bits(0u8, term_len)?;
        }
        Ok(())
    }

    pub fn pad_remaining_capacity(out: &mut BitStream) -> QRResult<()> {
        push_padding_bits(out)?;
        push_padding_codewords(out)
    }

    fn push_padding_bits(out: &mut BitStream) -> QRResult<()> {
        let offset = out.len() & 7;
        if offset > 0 {
            out.push_bits(0u8, 8 - offset)?;
        }
        Ok(())
    }

    fn push_padding_codewords(out: &mut BitStream) -> QRResult<()> {
        debug_assert!(
            out.len() & 7 == 0,
            "Bit offset should be zero before padding codewords: {}",
            out.len() & 7
        );

        let remain_byte_capacity = (out.capacity() - out.len()) >> 3;
        for pc in PADDING_CODEWORDS.iter().copied().cycle().take(remain_byte_capacity) {
            out.push_bits(pc, 8)?;
        }
        Ok(())
    }

}

// Encoder & capacity planner
//------------------------------------------------------------------------------

mod encode {
    use std::collections::BTreeMap;

    use super::{is_kanji, segmenter, writer, Fnc1, Mode, Segment, StructuredAppend};
    use super::{MAX_ECI_VALUE, MODE_INDICATOR_LEN, STRUCTURED_APPEND_HEADER_LEN};
    use crate::common::bitstream::BitStream;
    use crate::common::error::{QRError, QRResult};
    use crate::common::metadata::{ECLevel, Version};

    /// Everything the planner and writer need to know about one symbol's
    /// payload. `eci` maps input positions to ECI assignment values.
    #[derive(Debug, Clone, Copy)]
    pub struct EncodeInput<'a> {
        pub data: &'a [u16],
        pub eci: &'a BTreeMap<usize, u32>,
        pub mode: Option<Mode>,
        pub fnc1: Fnc1,
        pub structured_append: Option<StructuredAppend>,
    }

    /// Encodes at the smallest version that fits the data at `ec_level`.
    pub fn encode(
        input: &EncodeInput,
        ec_level: ECLevel,
        boost: bool,
    ) -> QRResult<(BitStream, Version, ECLevel)> {
        ensure_encodable(input)?;
        let (version, segments) = find_optimal_version(input, ec_level)?;
        let ec_level = boosted(boost, bits_needed(&segments, input, version), version, ec_level);
        let stream = write_stream(&segments, input, version, ec_level)?;
        Ok((stream, version, ec_level))
    }

    /// Encodes at a caller pinned version, or fails with DataTooLong.
    pub fn encode_with_version(
        input: &EncodeInput,
        ec_level: ECLevel,
        version: Version,
        boost: bool,
    ) -> QRResult<(BitStream, ECLevel)> {
        ensure_encodable(input)?;
        let segments = segments(input, version.bucket())?;
        let size = bits_needed(&segments, input, version);
        if size > version.data_bit_capacity(ec_level) {
            return Err(QRError::DataTooLong);
        }
        let ec_level = boosted(boost, size, version, ec_level);
        let stream = write_stream(&segments, input, version, ec_level)?;
        Ok((stream, ec_level))
    }

    fn ensure_encodable(input: &EncodeInput) -> QRResult<()> {
        if input.eci.values().any(|&v| v > MAX_ECI_VALUE) {
            return Err(QRError::InvalidArgument);
        }
        if input.mode.is_none() && !input.data.iter().all(|&c| c <= 0xFF || is_kanji(c)) {
            return Err(QRError::InvalidArgument);
        }
        Ok(())
    }

    fn segments<'a>(input: &EncodeInput<'a>, bucket: usize) -> QRResult<Vec<Segment<'a>>> {
        let segments = match input.mode {
            Some(mode) => segmenter::override_segments(input.data, mode)?,
            None => segmenter::compute_segments(input.data, bucket),
        };
        Ok(split_at_eci(segments, input.data, input.eci))
    }

    /// Splits segments at interior ECI assignment positions so every
    /// assignment lands on a segment boundary.
    fn split_at_eci<'a>(
        segments: Vec<Segment<'a>>,
        data: &'a [u16],
        eci: &BTreeMap<usize, u32>,
    ) -> Vec<Segment<'a>> {
        if eci.is_empty() {
            return segments;
        }
        let mut out = Vec::with_capacity(segments.len() + eci.len());
        for seg in segments {
            let end = seg.start + seg.data.len();
            let mut cursor = seg.start;
            for (&pos, _) in eci.range(seg.start + 1..end) {
                out.push(Segment { mode: seg.mode, start: cursor, data: &data[cursor..pos] });
                cursor = pos;
            }
            out.push(Segment { mode: seg.mode, start: cursor, data: &data[cursor..end] });
        }
        out
    }

    /// Total bit need of the stream before terminator and padding, framing
    /// included.
    fn bits_needed(segments: &[Segment], input: &EncodeInput, version: Version) -> usize {
        let mut bits = segments.iter().map(|s| s.bit_len(version)).sum::<usize>();
        if input.structured_append.is_some() {
            bits += STRUCTURED_APPEND_HEADER_LEN;
        }
        if input.fnc1 != Fnc1::None {
            bits += MODE_INDICATOR_LEN;
        }
        bits += input
            .eci
            .iter()
            .filter(|(&pos, _)| pos < input.data.len())
            .map(|(_, &v)| MODE_INDICATOR_LEN + writer::eci_designator_bits(v))
            .sum::<usize>();
        bits
    }

    fn find_optimal_version<'a>(
        input: &EncodeInput<'a>,
        ec_level: ECLevel,
    ) -> QRResult<(Version, Vec<Segment<'a>>)> {
        let mut segments = vec![];
        for v in *Version::MIN..=*Version::MAX {
            let version = Version::from_index(v);
            if v == 1 || v == 10 || v == 27 {
                segments = self::segments(input, version.bucket())?;
            }
            if bits_needed(&segments, input, version) <= version.data_bit_capacity(ec_level) {
                return Ok((version, segments));
            }
        }
        Err(QRError::DataTooLong)
    }

    /// Upgrades to the strongest level whose capacity still holds the data at
    /// the chosen version. Capacity shrinks monotonically with level, so the
    /// strongest fitting level is the last fitting one.
    fn boosted(boost: bool, size: usize, version: Version, ec_level: ECLevel) -> ECLevel {
        if !boost {
            return ec_level;
        }
        let mut best = ec_level;
        for stronger in ec_level.stronger() {
            if size <= version.data_bit_capacity(stronger) {
                best = stronger;
            }
        }
        best
    }

    fn write_stream(
        segments: &[Segment],
        input: &EncodeInput,
        version: Version,
        ec_level: ECLevel,
    ) -> QRResult<BitStream> {
        let mut stream = BitStream::new(version.data_bit_capacity(ec_level));
        if let Some(sa) = input.structured_append {
            writer::push_structured_append(sa, &mut stream)?;
        }
        writer::push_fnc1(input.fnc1, &mut stream)?;
        for seg in segments {
            if let Some(&value) = input.eci.get(&seg.start) {
                writer::push_eci(value, &mut stream)?;
            }
            writer::push_segment(seg, version, &mut stream)?;
        }
        writer::push_terminator(&mut stream)?;
        writer::pad_remaining_capacity(&mut stream)?;
        Ok(stream)
    }

    #[cfg(test)]
    mod encode_tests {
        use std::collections::BTreeMap;

        use test_case::test_case;

        use super::{encode, encode_with_version, EncodeInput};
        use crate::common::codec::{Fnc1, Mode, StructuredAppend};
        use crate::common::error::QRError;
        use crate::common::metadata::{ECLevel, Version};

        fn cps(data: &str) -> Vec<u16> {
            data.chars().map(|c| c as u16).collect()
        }

        fn input<'a>(data: &'a [u16], eci: &'a BTreeMap<usize, u32>) -> EncodeInput<'a> {
            EncodeInput { data, eci, mode: None, fnc1: Fnc1::None, structured_append: None }
        }

        #[test]
        fn test_encode_numeric_reference() {
            // The ISO/IEC 18004 Annex I example: "01234567" at 1-M
            let data = cps("01234567");
            let eci = BTreeMap::new();
            let (stream, _) =
                encode_with_version(&input(&data, &eci), ECLevel::M, Version::from_index(1), false)
                    .unwrap();
            assert_eq!(
                stream.data(),
                [
                    0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC,
                    0x11, 0xEC, 0x11
                ]
            );
        }

        #[test]
        fn test_encode_alphanumeric_reference() {
            let data = cps("HELLO WORLD");
            let eci = BTreeMap::new();
            let (stream, ver, ecl) = encode(&input(&data, &eci), ECLevel::Q, false).unwrap();
            assert_eq!(*ver, 1);
            assert_eq!(ecl, ECLevel::Q);
            assert_eq!(stream.data()[..8], [0x20, 0x5B, 0x0B, 0x78, 0xD1, 0x72, 0xDC, 0x4D]);
        }

        #[test]
        fn test_encode_kanji() {
            let data = [0x935F, 0xE4AA];
            let eci = BTreeMap::new();
            let (stream, _) =
                encode_with_version(&input(&data, &eci), ECLevel::L, Version::from_index(1), false)
                    .unwrap();
            assert_eq!(stream.data()[..6], [0x80, 0x26, 0xCF, 0xEA, 0xA8, 0x00]);
        }

        #[test]
        fn test_encode_eci_framing() {
            let data = [0xA1, 0xA2, 0xA3, 0xA4, 0xA5];
            let eci = BTreeMap::from([(0usize, 6u32)]);
            let (stream, _) =
                encode_with_version(&input(&data, &eci), ECLevel::L, Version::from_index(1), false)
                    .unwrap();
            // ECI header 0111 00000110, then byte mode header and the data
            assert_eq!(stream.data()[..8], [0x70, 0x64, 0x05, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5]);
        }

        #[test]
        fn test_encode_eci_split_mid_stream() {
            let data = cps("abcdef");
            let eci = BTreeMap::from([(3usize, 9u32)]);
            let (stream, _) =
                encode_with_version(&input(&data, &eci), ECLevel::L, Version::from_index(1), false)
                    .unwrap();
            // byte(abc) | eci 9 | byte(def)
            assert_eq!(stream.data()[..9], [0x40, 0x36, 0x16, 0x26, 0x37, 0x09, 0x40, 0x36, 0x46]);
        }

        #[test]
        fn test_encode_fnc1_first() {
            let data = cps("01234567");
            let eci = BTreeMap::new();
            let mut inp = input(&data, &eci);
            inp.fnc1 = Fnc1::First;
            let (stream, _) =
                encode_with_version(&inp, ECLevel::M, Version::from_index(1), false).unwrap();
            // 0101 precedes the numeric segment header
            assert_eq!(stream.data()[..2], [0b01010001, 0b00000010]);
        }

        #[test]
        fn test_encode_structured_append_header() {
            let data = cps("ABCDEFG");
            let eci = BTreeMap::new();
            let mut inp = input(&data, &eci);
            inp.structured_append = Some(StructuredAppend::new(0, 4, 0x1B).unwrap());
            let (stream, _) =
                encode_with_version(&inp, ECLevel::L, Version::from_index(1), false).unwrap();
            // 0011 | index 0 | count - 1 | parity 0x1B
            assert_eq!(stream.data()[..3], [0x30, 0x31, 0xB2]);
        }

        #[test]
        fn test_empty_data() {
            let data = [];
            let eci = BTreeMap::new();
            let (stream, ver, _) = encode(&input(&data, &eci), ECLevel::L, false).unwrap();
            assert_eq!(*ver, 1);
            assert_eq!(stream.data()[..2], [0x00, 0xEC]);
        }

        #[test]
        fn test_unencodable_code_point() {
            let data = [0x0100];
            let eci = BTreeMap::new();
            assert_eq!(
                encode(&input(&data, &eci), ECLevel::L, false).unwrap_err(),
                QRError::InvalidArgument
            );
        }

        #[test_case("aaaaa11111AAA", 1, ECLevel::L)]
        #[test_case("A11111111111111", 1, ECLevel::L)]
        #[test_case("aAAAAAAAAAAAaAAAAAAAAAAAaAAAAAAAAAAAaAAAAAAAAAAAaAAAAAAAAAAA", 4, ECLevel::L)]
        fn test_find_optimal_version(data: &str, expected_version: usize, ecl: ECLevel) {
            let data = cps(data);
            let eci = BTreeMap::new();
            let (_, ver, _) = encode(&input(&data, &eci), ecl, false).unwrap();
            assert_eq!(*ver, expected_version);
        }

        #[test]
        fn test_byte_capacity_boundary() {
            let data = vec![0x61u16; 2953];
            let eci = BTreeMap::new();
            let (_, ver, _) = encode(&input(&data, &eci), ECLevel::L, false).unwrap();
            assert_eq!(*ver, 40);

            let data = vec![0x61u16; 2954];
            assert_eq!(
                encode(&input(&data, &eci), ECLevel::L, false).unwrap_err(),
                QRError::DataTooLong
            );
        }

        #[test]
        fn test_ec_boost() {
            let data = cps("01234567");
            let eci = BTreeMap::new();
            // 41 bits of segment data fit even 1-H (72 bits)
            let (_, ver, ecl) = encode(&input(&data, &eci), ECLevel::M, true).unwrap();
            assert_eq!(*ver, 1);
            assert_eq!(ecl, ECLevel::H);
            // Unboosted encoding keeps the requested level
            let (_, _, ecl) = encode(&input(&data, &eci), ECLevel::M, false).unwrap();
            assert_eq!(ecl, ECLevel::M);
        }

        #[test]
        fn test_boost_never_grows_version() {
            let data = cps("HELLO WORLD");
            let eci = BTreeMap::new();
            let (_, ver, ecl) = encode(&input(&data, &eci), ECLevel::Q, true).unwrap();
            // 74 bits do not fit 1-H (72 bits), so Q stands
            assert_eq!(*ver, 1);
            assert_eq!(ecl, ECLevel::Q);
        }

        #[test]
        fn test_override_mode() {
            let data = cps("12345678");
            let eci = BTreeMap::new();
            let mut inp = input(&data, &eci);
            inp.mode = Some(Mode::Byte);
            let (stream, _) =
                encode_with_version(&inp, ECLevel::L, Version::from_index(1), false).unwrap();
            assert_eq!(stream.data()[..3], [0x40, 0x83, 0x13]);

            inp.mode = Some(Mode::Alphanumeric);
            assert!(encode_with_version(&inp, ECLevel::L, Version::from_index(1), false).is_ok());

            let data = cps("hello");
            let mut inp = input(&data, &eci);
            inp.mode = Some(Mode::Numeric);
            assert_eq!(encode(&inp, ECLevel::L, false).unwrap_err(), QRError::IncompatibleOverride);
        }

        #[test]
        fn test_pinned_version_too_small() {
            let data = vec![0x61u16; 30];
            let eci = BTreeMap::new();
            assert_eq!(
                encode_with_version(&input(&data, &eci), ECLevel::L, Version::from_index(1), false)
                    .unwrap_err(),
                QRError::DataTooLong
            );
        }
    }
}

// Global constants
//------------------------------------------------------------------------------

pub(crate) static PADDING_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];

pub(crate) const MODE_INDICATOR_LEN: usize = 4;

pub(crate) const ECI_INDICATOR: u8 = 0b0111;

pub(crate) const FNC1_FIRST_INDICATOR: u8 = 0b0101;

pub(crate) const FNC1_SECOND_INDICATOR: u8 = 0b1001;

pub(crate) const STRUCTURED_APPEND_INDICATOR: u8 = 0b0011;

pub(crate) const STRUCTURED_APPEND_HEADER_LEN: usize = 20;

pub(crate) const MAX_ECI_VALUE: u32 = 999_999;
