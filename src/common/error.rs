use std::fmt::{Debug, Display, Error, Formatter};

// Error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    InvalidArgument,
    IncompatibleOverride,
    DataTooLong,
    InvalidEciEscape,
    Internal,
}

impl Display for QRError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let msg = match *self {
            Self::InvalidArgument => "Argument out of range",
            Self::IncompatibleOverride => "Mode override cannot encode an input character",
            Self::DataTooLong => "Data too long for the allowed versions",
            Self::InvalidEciEscape => "Invalid ECI escape sequence in input",
            Self::Internal => "Internal invariant violated",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for QRError {}

pub type QRResult<T> = Result<T, QRError>;
