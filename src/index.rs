use crate::{error::Error, Result};

/// Maximum amount of lines a file may have
pub const MAX_LINES: u64 = 1_000_000_000;

/// Maximum amount of characters within a single line
pub const MAX_LINE_LENGTH: u64 = 1_000;

/// In UTF-8 a character takes up to 4 bytes
pub const MAX_CHAR_BYTES: u64 = 4;

/// Max file size in bytes
pub const MAX_FILE_SIZE: u64 = MAX_LINES * MAX_LINE_LENGTH * MAX_CHAR_BYTES;

/// Amount of decimal digits of a single offset record. Every offset below `MAX_FILE_SIZE` fits
/// into this width.
pub const OFFSET_WIDTH: usize = decimal_digits(MAX_FILE_SIZE);

/// Length of a record in bytes, including its trailing `\n`
pub const RECORD_LEN: usize = OFFSET_WIDTH + 1;

/// Largest offset which can be encoded using `OFFSET_WIDTH` digits
pub const MAX_OFFSET: u64 = 10u64.pow(OFFSET_WIDTH as u32) - 1;

const fn decimal_digits(mut n: u64) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// Encodes `offset` into a zero padded record.
pub fn encode_record(offset: u64) -> Result<[u8; RECORD_LEN]> {
    if offset > MAX_OFFSET {
        return Err(Error::FileTooLarge(offset));
    }

    let mut record = [b'0'; RECORD_LEN];
    record[OFFSET_WIDTH] = b'\n';

    let mut rest = offset;
    for slot in record[..OFFSET_WIDTH].iter_mut().rev() {
        if rest == 0 {
            break;
        }
        *slot = b'0' + (rest % 10) as u8;
        rest /= 10;
    }

    Ok(record)
}

/// Decodes a single record. `record` must be exactly `OFFSET_WIDTH` ASCII digits followed by `\n`.
pub fn decode_record(record: &[u8]) -> Result<u64> {
    if record.len() != RECORD_LEN || record[OFFSET_WIDTH] != b'\n' {
        return Err(Error::MalformedIndex);
    }

    record[..OFFSET_WIDTH].iter().try_fold(0u64, |acc, b| {
        if b.is_ascii_digit() {
            Ok(acc * 10 + (b - b'0') as u64)
        } else {
            Err(Error::MalformedIndex)
        }
    })
}

/// Returns the position of the record of `line` within the index. `None` if the position can't
/// be represented.
#[inline]
pub fn record_position(line: u64) -> Option<u64> {
    line.checked_mul(RECORD_LEN as u64)
}

/// Returns the amount of records an index of `len` bytes holds.
pub fn record_count(len: u64) -> Result<u64> {
    if len % RECORD_LEN as u64 != 0 {
        return Err(Error::MalformedIndex);
    }
    Ok(len / RECORD_LEN as u64)
}
