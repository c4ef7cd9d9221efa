//! Byte-level primitives for the save buffer.
//!
//! Every value in a `gameX.fm` file sits at a fixed offset. Integers are
//! little-endian and unsigned, text is space padded ASCII. Writers touch
//! exactly the requested range and nothing else.

use thiserror::Error;

use crate::layout::{FieldKind, FieldSpec};

/// Widest integer field the codec handles.
pub const MAX_UNSIGNED_WIDTH: usize = 4;

const PAD_BYTE: u8 = b' ';
const PLACEHOLDER: char = '\u{FFFD}';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("cannot read {width} bytes at {offset:#06x}: buffer is {len} bytes")]
    TruncatedRead {
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("cannot write {width} bytes at {offset:#06x}: buffer is {len} bytes")]
    TruncatedWrite {
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("value {value} does not fit in {width} byte(s) (max {max})")]
    ValueOutOfRange { value: u64, width: usize, max: u64 },

    #[error("text {value:?} is {actual} characters, field holds {length}")]
    StringTooLong {
        value: String,
        actual: usize,
        length: usize,
    },

    #[error("text {value:?} contains non-ASCII characters")]
    NonAsciiText { value: String },

    #[error("unsupported integer width {0}, expected 1..=4")]
    InvalidWidth(usize),

    #[error("{found} value does not match a {expected} field")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// A decoded field, detached from the buffer it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Unsigned(u32),
    Text(String),
    Item(u8),
}

impl FieldValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Unsigned(_) => "integer",
            Self::Text(_) => "text",
            Self::Item(_) => "item code",
        }
    }
}

/// Largest value representable in `width` bytes.
pub fn max_for_width(width: usize) -> Result<u32, CodecError> {
    if width == 0 || width > MAX_UNSIGNED_WIDTH {
        return Err(CodecError::InvalidWidth(width));
    }
    Ok(((1u64 << (8 * width)) - 1) as u32)
}

pub fn read_unsigned(buf: &[u8], offset: usize, width: usize) -> Result<u32, CodecError> {
    max_for_width(width)?;
    let bytes = slice_at(buf, offset, width)?;
    let mut le = [0u8; MAX_UNSIGNED_WIDTH];
    le[..width].copy_from_slice(bytes);
    Ok(u32::from_le_bytes(le))
}

pub fn write_unsigned(
    buf: &mut [u8],
    offset: usize,
    width: usize,
    value: u32,
) -> Result<(), CodecError> {
    let max = max_for_width(width)?;
    if value > max {
        return Err(CodecError::ValueOutOfRange {
            value: value as u64,
            width,
            max: max as u64,
        });
    }
    let len = buf.len();
    let target = slice_at_mut(buf, offset, width).ok_or(CodecError::TruncatedWrite {
        offset,
        width,
        len,
    })?;
    target.copy_from_slice(&value.to_le_bytes()[..width]);
    Ok(())
}

/// Decodes `length` bytes as ASCII. Bytes outside ASCII become U+FFFD and only
/// trailing spaces are trimmed.
pub fn read_text(buf: &[u8], offset: usize, length: usize) -> Result<String, CodecError> {
    let bytes = slice_at(buf, offset, length)?;
    let end = bytes
        .iter()
        .rposition(|&b| b != PAD_BYTE)
        .map_or(0, |pos| pos + 1);
    Ok(bytes[..end]
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { PLACEHOLDER })
        .collect())
}

/// Writes `value` right-padded with spaces so exactly `length` bytes change.
pub fn write_text(
    buf: &mut [u8],
    offset: usize,
    length: usize,
    value: &str,
) -> Result<(), CodecError> {
    if !value.is_ascii() {
        return Err(CodecError::NonAsciiText {
            value: value.to_string(),
        });
    }
    if value.len() > length {
        return Err(CodecError::StringTooLong {
            value: value.to_string(),
            actual: value.len(),
            length,
        });
    }
    let len = buf.len();
    let target = slice_at_mut(buf, offset, length).ok_or(CodecError::TruncatedWrite {
        offset,
        width: length,
        len,
    })?;
    let (text, pad) = target.split_at_mut(value.len());
    text.copy_from_slice(value.as_bytes());
    pad.fill(PAD_BYTE);
    Ok(())
}

pub fn read_field(buf: &[u8], spec: &FieldSpec) -> Result<FieldValue, CodecError> {
    match spec.kind {
        FieldKind::UnsignedInt => read_unsigned(buf, spec.offset, spec.width).map(FieldValue::Unsigned),
        FieldKind::PaddedText { length } => read_text(buf, spec.offset, length).map(FieldValue::Text),
        FieldKind::ItemCode(_) => slice_at(buf, spec.offset, 1).map(|b| FieldValue::Item(b[0])),
    }
}

pub fn write_field(buf: &mut [u8], spec: &FieldSpec, value: &FieldValue) -> Result<(), CodecError> {
    match (spec.kind, value) {
        (FieldKind::UnsignedInt, FieldValue::Unsigned(v)) => {
            write_unsigned(buf, spec.offset, spec.width, *v)
        }
        (FieldKind::PaddedText { length }, FieldValue::Text(s)) => {
            write_text(buf, spec.offset, length, s)
        }
        (FieldKind::ItemCode(_), FieldValue::Item(code)) => {
            write_unsigned(buf, spec.offset, 1, u32::from(*code))
        }
        (kind, other) => Err(CodecError::KindMismatch {
            expected: kind.name(),
            found: other.kind_name(),
        }),
    }
}

fn slice_at(buf: &[u8], offset: usize, width: usize) -> Result<&[u8], CodecError> {
    offset
        .checked_add(width)
        .and_then(|end| buf.get(offset..end))
        .ok_or(CodecError::TruncatedRead {
            offset,
            width,
            len: buf.len(),
        })
}

fn slice_at_mut(buf: &mut [u8], offset: usize, width: usize) -> Option<&mut [u8]> {
    let end = offset.checked_add(width)?;
    buf.get_mut(offset..end)
}
