//! # Type1 Segment Extraction
//!
//! A PFB file wraps a Type1 program in segments, each introduced by a 6-byte
//! header (`0x80`, segment type, 32-bit length):
//!
//! ```text
//! [hdr] clear-text ... currentfile eexec\r   <- segment 1
//! [hdr] encrypted binary ...                 <- segment 2
//! [hdr] 0000000000...0000 cleartomark        <- trailer, not embedded
//! ```
//!
//! PDF embeds segments 1 and 2 only. Segment boundaries are found by
//! searching for the `eexec` token and the first run of ASCII zeros.

use crate::error::MakeFontError;
use crate::search;

/// Marker byte opening every PFB segment header.
pub const PFB_MARKER: u8 = 128;
const PFB_HEADER_LEN: usize = 6;

const EEXEC: &[u8] = b"eexec";
const ZERO_RUN: &[u8] = b"00000000";

/// The two embeddable segments of a Type1 program, borrowed from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Type1Segments<'a> {
    pub clear_text: &'a [u8],
    pub binary: &'a [u8],
}

/// Locate the clear-text and binary segments of a Type1 font program.
pub fn extract(data: &[u8]) -> Result<Type1Segments<'_>, MakeFontError> {
    let pfb = data.first() == Some(&PFB_MARKER);
    let body = if pfb { skip_header(data)? } else { data };

    let eexec = search::find(body, EEXEC).ok_or_else(|| invalid("no 'eexec' token"))?;
    // token plus its line terminator
    let size1 = eexec + EEXEC.len() + 1;
    let clear_text = body
        .get(..size1)
        .ok_or_else(|| invalid("program ends after 'eexec'"))?;

    let mut rest = &body[size1..];
    if pfb && rest.first() == Some(&PFB_MARKER) {
        rest = skip_header(rest)?;
    }

    let mut size2 = search::find(rest, ZERO_RUN).ok_or_else(|| invalid("no zero-padding trailer"))?;
    // The trailer of a PFB sits in its own segment; leave its header out.
    if pfb && size2 >= PFB_HEADER_LEN && rest[size2 - PFB_HEADER_LEN] == PFB_MARKER {
        size2 -= PFB_HEADER_LEN;
    }
    log::debug!("Type1 segments: {} + {} bytes", size1, size2);

    Ok(Type1Segments {
        clear_text,
        binary: &rest[..size2],
    })
}

fn skip_header(data: &[u8]) -> Result<&[u8], MakeFontError> {
    data.get(PFB_HEADER_LEN..)
        .ok_or_else(|| invalid("truncated segment header"))
}

fn invalid(reason: &str) -> MakeFontError {
    MakeFontError::InvalidFontFile(format!("font file does not seem to be valid Type1 ({})", reason))
}
