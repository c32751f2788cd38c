#![allow(clippy::items_after_test_module)]

pub mod builder;
mod common;

pub use builder::{QRBuilder, QR};
pub use common::codec::{Fnc1, Mode, StructuredAppend};
pub use common::error::{QRError, QRResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{ECLevel, Version};
