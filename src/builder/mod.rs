mod qr;

pub use qr::{Color, Module, QR};

use std::collections::BTreeMap;

use crate::common::codec::{encode, encode_with_version, EncodeInput};
use crate::common::codec::{Fnc1, Mode, StructuredAppend};
use crate::common::ec;
use crate::common::error::{QRError, QRResult};
use crate::common::mask::{apply_best_mask, MaskPattern};
use crate::common::metadata::{ECLevel, Version};

// Builder
//------------------------------------------------------------------------------

/// Assembles one QR symbol (or a structured append group) from a character
/// string and a set of options.
pub struct QRBuilder<'a> {
    data: &'a str,
    version: Option<Version>,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
    mode: Option<Mode>,
    fnc1: Fnc1,
    structured_append: Option<StructuredAppend>,
    eci: BTreeMap<usize, u32>,
    boost_ec: bool,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a str) -> Self {
        Self {
            data,
            version: None,
            ec_level: ECLevel::L,
            mask: None,
            mode: None,
            fnc1: Fnc1::None,
            structured_append: None,
            eci: BTreeMap::new(),
            boost_ec: false,
        }
    }

    pub fn data(&mut self, data: &'a str) -> &mut Self {
        self.data = data;
        self
    }

    /// Pins the version; unset, the planner picks the smallest fitting one.
    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    /// Pins the mask; unset, the penalty search picks one.
    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    /// Forces single segment encoding in the given mode.
    pub fn mode(&mut self, mode: Mode) -> &mut Self {
        self.mode = Some(mode);
        self
    }

    pub fn fnc1(&mut self, fnc1: Fnc1) -> &mut Self {
        self.fnc1 = fnc1;
        self
    }

    pub fn structured_append(&mut self, structured_append: StructuredAppend) -> &mut Self {
        self.structured_append = Some(structured_append);
        self
    }

    /// Assigns an ECI value from the given input position onward. Positions
    /// index the normalized code point sequence, after escape processing.
    pub fn eci(&mut self, position: usize, value: u32) -> &mut Self {
        self.eci.insert(position, value);
        self
    }

    /// Allows the planner to raise the error correction level when the data
    /// still fits the chosen version at the stronger level.
    pub fn ec_boost(&mut self, boost: bool) -> &mut Self {
        self.boost_ec = boost;
        self
    }

    pub fn metadata(&self) -> String {
        match self.version {
            Some(v) => format!("{{ Version: {:?}, Ec level: {:?} }}", *v, self.ec_level),
            None => format!("{{ Version: None, Ec level: {:?} }}", self.ec_level),
        }
    }
}


// Build pipeline
//------------------------------------------------------------------------------

impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QR> {
        let (code_points, mut eci) = parse_input(self.data)?;
        eci.extend(self.eci.iter().map(|(&p, &v)| (p, v)));
        self.build_symbol(&code_points, &eci, self.structured_append)
    }

    /// Encodes the input as a structured append group of `count` symbols of
    /// near equal length, all sharing the parity byte of the full message.
    pub fn build_group(&self, count: usize) -> QRResult<Vec<QR>> {
        if count == 0 || count > 16 {
            return Err(QRError::InvalidArgument);
        }
        let (code_points, eci) = parse_input(self.data)?;
        let parity = parity_of(&code_points);

        let base = code_points.len() / count;
        let extra = code_points.len() % count;
        let mut group = Vec::with_capacity(count);
        let mut start = 0;
        for i in 0..count {
            let len = base + usize::from(i < extra);
            let chunk = &code_points[start..start + len];
            let chunk_eci = eci
                .range(start..start + len)
                .map(|(&p, &v)| (p - start, v))
                .collect::<BTreeMap<_, _>>();
            let sa = StructuredAppend::new(i as u8, count as u8, parity)?;
            group.push(self.build_symbol(chunk, &chunk_eci, Some(sa))?);
            start += len;
        }
        Ok(group)
    }

    fn build_symbol(
        &self,
        data: &[u16],
        eci: &BTreeMap<usize, u32>,
        structured_append: Option<StructuredAppend>,
    ) -> QRResult<QR> {
        let input = EncodeInput { data, eci, mode: self.mode, fnc1: self.fnc1, structured_append };

        // Encode data optimally
        let (stream, version, ec_level) = match self.version {
            Some(version) => {
                let (stream, ec_level) =
                    encode_with_version(&input, self.ec_level, version, self.boost_ec)?;
                (stream, version, ec_level)
            }
            None => encode(&input, self.ec_level, self.boost_ec)?,
        };

        debug_assert!(
            stream.data().len() == version.data_codewords(ec_level),
            "Encoded stream length {} doesn't match data codeword count {}",
            stream.data().len(),
            version.data_codewords(ec_level)
        );

        // Compute ecc and interleave into the final codeword sequence
        let (data_blocks, ecc_blocks) = ec::ecc(stream.data(), version, ec_level);
        let mut payload = ec::interleave(&data_blocks);
        payload.extend(ec::interleave(&ecc_blocks));

        // Construct the matrix
        let mut qr = QR::new(version, ec_level);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(&payload);

        match self.mask {
            Some(mask) => qr.apply_mask(mask),
            None => {
                apply_best_mask(&mut qr);
            }
        }

        Ok(qr)
    }
}

// Input normalization
//------------------------------------------------------------------------------

/// Normalizes the input into a code point sequence and the ECI assignments
/// embedded in it. A backslash followed by six digits is an ECI assignment at
/// that position; a doubled backslash is a literal one.
fn parse_input(data: &str) -> QRResult<(Vec<u16>, BTreeMap<usize, u32>)> {
    let chars = data.chars().collect::<Vec<_>>();
    let mut code_points = Vec::with_capacity(chars.len());
    let mut eci = BTreeMap::new();

    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            if chars.get(i + 1) == Some(&'\\') {
                code_points.push(u16::from(b'\\'));
                i += 2;
                continue;
            }
            if i + 7 > chars.len() || !chars[i + 1..i + 7].iter().all(|c| c.is_ascii_digit()) {
                return Err(QRError::InvalidEciEscape);
            }
            let value = chars[i + 1..i + 7]
                .iter()
                .collect::<String>()
                .parse::<u32>()
                .map_err(|_| QRError::InvalidEciEscape)?;
            eci.insert(code_points.len(), value);
            i += 7;
        } else {
            let cp = u32::from(chars[i]);
            if cp > 0xFFFF {
                return Err(QRError::InvalidArgument);
            }
            code_points.push(cp as u16);
            i += 1;
        }
    }
    Ok((code_points, eci))
}

/// XOR over the byte expansion of the message: two bytes for a Kanji code
/// point, one otherwise. Shared by every symbol of a structured append group.
fn parity_of(code_points: &[u16]) -> u8 {
    code_points.iter().fold(0, |parity, &cp| {
        if cp > 0xFF {
            parity ^ (cp >> 8) as u8 ^ (cp & 0xFF) as u8
        } else {
            parity ^ cp as u8
        }
    })
}

#[cfg(test)]
mod input_tests {
    use std::collections::BTreeMap;

    use super::{parity_of, parse_input};
    use crate::common::error::QRError;

    #[test]
    fn test_plain_input() {
        let (cps, eci) = parse_input("AB01").unwrap();
        assert_eq!(cps, vec![0x41, 0x42, 0x30, 0x31]);
        assert!(eci.is_empty());
    }

    #[test]
    fn test_literal_backslash() {
        let (cps, eci) = parse_input(r"a\\b").unwrap();
        assert_eq!(cps, vec![0x61, 0x5C, 0x62]);
        assert!(eci.is_empty());
    }

    #[test]
    fn test_eci_escape() {
        let (cps, eci) = parse_input(r"\000026abc").unwrap();
        assert_eq!(cps, vec![0x61, 0x62, 0x63]);
        assert_eq!(eci, BTreeMap::from([(0, 26)]));

        let (cps, eci) = parse_input(r"ab\000009cd").unwrap();
        assert_eq!(cps, vec![0x61, 0x62, 0x63, 0x64]);
        assert_eq!(eci, BTreeMap::from([(2, 9)]));
    }

    #[test]
    fn test_invalid_eci_escape() {
        assert_eq!(parse_input(r"ab\12").unwrap_err(), QRError::InvalidEciEscape);
        assert_eq!(parse_input(r"ab\12345x").unwrap_err(), QRError::InvalidEciEscape);
        assert_eq!(parse_input(r"ab\").unwrap_err(), QRError::InvalidEciEscape);
    }

    #[test]
    fn test_parity() {
        let (cps, _) = parse_input("ABCDEFGHIJKLMNOPQRSTUVWXYZ").unwrap();
        assert_eq!(parity_of(&cps), 0x1B);
        assert_eq!(parity_of(&[0x935F]), 0x93 ^ 0x5F);
        assert_eq!(parity_of(&[]), 0);
    }
}
