//! Text decoding for submission files.

use encoding_rs::{Encoding, UTF_8};

use crate::error::{IngestError, Result};

/// Default encoding label of submission files.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Resolve an encoding label such as `utf8`, `utf-8` or `windows-1252`.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    let normalized = label.trim();
    let normalized = if normalized.eq_ignore_ascii_case("utf8") {
        "utf-8"
    } else {
        normalized
    };
    Encoding::for_label(normalized.as_bytes()).ok_or_else(|| IngestError::UnknownEncoding {
        label: label.to_string(),
    })
}

/// Decode `bytes` strictly: malformed input is an error, never replaced.
///
/// A leading UTF-8 byte order mark is removed.
pub fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let encoding = resolve_encoding(label)?;
    if encoding == UTF_8 {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        return match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_string()),
            Err(error) => Err(IngestError::Decode {
                encoding: encoding.name().to_string(),
                offset: error.valid_up_to(),
            }),
        };
    }
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| IngestError::Decode {
            encoding: encoding.name().to_string(),
            offset: first_invalid_offset(encoding, bytes),
        })
}

fn first_invalid_offset(encoding: &'static Encoding, bytes: &[u8]) -> usize {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .unwrap_or(bytes.len() * 3 + 16);
    let mut buffer = String::with_capacity(capacity);
    let (result, read) =
        decoder.decode_to_string_without_replacement(bytes, &mut buffer, true);
    match result {
        encoding_rs::DecoderResult::Malformed(bad, after) => {
            read.saturating_sub(usize::from(bad) + usize::from(after))
        }
        _ => read,
    }
}
