// Copyright 2025-2026 CEMAXECUTER LLC

//! Wire layout of published messages.
//!
//! Heatmap message (little-endian):
//! ```text
//! frame_number u32 | ny u32 | nx u32 | x[nx] f64 | y[ny] f64 | values[ny*nx] f64 (row-major)
//! ```
//! Sample block messages carry `ComplexSampleMatrix::to_wire_bytes()` unchanged.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array2;

use mw_dsp::HeatmapGrid;

use crate::error::MessageError;

pub const TOPIC_SAMPLES: &str = "radar";
pub const TOPIC_HEATMAP: &str = "heatmap";

const HEATMAP_PREAMBLE_LEN: usize = 12;

pub fn encode_heatmap(frame_number: u32, grid: &HeatmapGrid) -> Vec<u8> {
    let (ny, nx) = grid.values.dim();
    let mut buf = Vec::with_capacity(HEATMAP_PREAMBLE_LEN + 8 * (nx + ny + nx * ny));

    // Writes into a Vec cannot fail.
    let _ = buf.write_u32::<LittleEndian>(frame_number);
    let _ = buf.write_u32::<LittleEndian>(ny as u32);
    let _ = buf.write_u32::<LittleEndian>(nx as u32);
    for &v in grid.x.iter().chain(grid.y.iter()) {
        let _ = buf.write_f64::<LittleEndian>(v);
    }
    for &v in grid.values.iter() {
        let _ = buf.write_f64::<LittleEndian>(v);
    }
    buf
}

pub fn decode_heatmap(buf: &[u8]) -> Result<(u32, HeatmapGrid), MessageError> {
    let mut cur = Cursor::new(buf);
    let truncated = |needed: usize| MessageError::Truncated {
        needed,
        got: buf.len(),
    };
    let preamble = |_| truncated(HEATMAP_PREAMBLE_LEN);
    let frame_number = cur.read_u32::<LittleEndian>().map_err(preamble)?;
    let ny = cur.read_u32::<LittleEndian>().map_err(preamble)? as usize;
    let nx = cur.read_u32::<LittleEndian>().map_err(preamble)? as usize;

    // Dimensions are untrusted; a size that overflows can never be satisfied.
    let needed = nx
        .checked_mul(ny)
        .and_then(|cells| cells.checked_add(nx))
        .and_then(|n| n.checked_add(ny))
        .and_then(|n| n.checked_mul(8))
        .and_then(|n| n.checked_add(HEATMAP_PREAMBLE_LEN))
        .ok_or_else(|| truncated(usize::MAX))?;
    if buf.len() < needed {
        return Err(truncated(needed));
    }
    if buf.len() > needed {
        return Err(MessageError::TrailingBytes {
            extra: buf.len() - needed,
        });
    }

    let mut read_f64s = |n: usize| -> Result<Vec<f64>, MessageError> {
        (0..n)
            .map(|_| cur.read_f64::<LittleEndian>().map_err(|_| truncated(needed)))
            .collect()
    };
    let x = read_f64s(nx)?;
    let y = read_f64s(ny)?;
    let flat = read_f64s(nx * ny)?;
    let values = Array2::from_shape_vec((ny, nx), flat).map_err(|_| truncated(needed))?;

    Ok((frame_number, HeatmapGrid { x, y, values }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> HeatmapGrid {
        HeatmapGrid {
            x: vec![-1.0, 0.0, 1.0],
            y: vec![0.0, 2.0],
            values: Array2::from_shape_fn((2, 3), |(r, c)| (r * 10 + c) as f64),
        }
    }

    #[test]
    fn test_heatmap_layout() {
        let buf = encode_heatmap(7, &sample_grid());
        assert_eq!(buf.len(), 12 + 8 * (3 + 2 + 6));
        assert_eq!(&buf[0..4], &7u32.to_le_bytes());
        assert_eq!(&buf[4..8], &2u32.to_le_bytes()); // ny
        assert_eq!(&buf[8..12], &3u32.to_le_bytes()); // nx
        assert_eq!(&buf[12..20], &(-1.0f64).to_le_bytes());
        // values start after x and y; row 1 col 0 is the fourth value
        let off = 12 + 8 * 5 + 8 * 3;
        assert_eq!(&buf[off..off + 8], &10.0f64.to_le_bytes());
    }

    #[test]
    fn test_heatmap_decode() {
        let grid = sample_grid();
        let (frame, decoded) = decode_heatmap(&encode_heatmap(42, &grid)).unwrap();
        assert_eq!(frame, 42);
        assert_eq!(decoded, grid);
    }

    #[test]
    fn test_heatmap_oversized_dimensions() {
        let mut buf = 9u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode_heatmap(&buf),
            Err(MessageError::Truncated { got: 12, .. })
        ));

        // Large but representable: rejected on length before any allocation.
        let mut buf = 9u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&0x1000_0000u32.to_le_bytes());
        assert!(matches!(
            decode_heatmap(&buf),
            Err(MessageError::Truncated { got: 12, .. })
        ));
    }

    #[test]
    fn test_heatmap_decode_errors() {
        let buf = encode_heatmap(1, &sample_grid());
        assert!(matches!(
            decode_heatmap(&buf[..8]),
            Err(MessageError::Truncated { needed: 12, got: 8 })
        ));
        assert!(matches!(
            decode_heatmap(&buf[..buf.len() - 1]),
            Err(MessageError::Truncated { .. })
        ));
        let mut long = buf.clone();
        long.push(0);
        assert_eq!(
            decode_heatmap(&long),
            Err(MessageError::TrailingBytes { extra: 1 })
        );
    }
}
