// Copyright 2025-2026 CEMAXECUTER LLC

/// Magic word opening every frame on the UART stream.
pub const MAGIC: [u8; 8] = [0x02, 0x01, 0x04, 0x03, 0x06, 0x05, 0x08, 0x07];

/// Find every non-overlapping marker occurrence at or after `start`, in order.
///
/// A marker found inside payload data is reported like any other; frame
/// boundaries are purely marker-delimited.
pub fn find_markers(buf: &[u8], start: usize) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut pos = start;

    while pos + MAGIC.len() <= buf.len() {
        match buf[pos..].windows(MAGIC.len()).position(|w| w == MAGIC) {
            Some(rel) => {
                let at = pos + rel;
                offsets.push(at);
                pos = at + MAGIC.len();
            }
            None => break,
        }
    }

    offsets
}

/// Byte ranges of fully bounded frame candidates: each interval between
/// consecutive markers. The last marker opens a frame whose end is unknown
/// and is not included.
pub fn frame_candidates(markers: &[usize]) -> impl Iterator<Item = std::ops::Range<usize>> + '_ {
    markers.windows(2).map(|w| w[0]..w[1])
}
