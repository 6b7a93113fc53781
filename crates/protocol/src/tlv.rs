// Copyright 2025-2026 CEMAXECUTER LLC

//! Payload decoders for the TLV records that carry more than raw samples.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::DecodeError;
use crate::frame::FrameReader;

/// numObj(2) + xyzQFormat(2) descriptor ahead of the object list.
pub const OBJ_DESCR_LEN: usize = 4;
pub const OBJ_RECORD_LEN: usize = 12;
pub const STATS_LEN: usize = 6 * 4;

/// One detected point as laid out by the firmware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedObject {
    pub range_idx: u16,
    pub doppler_idx: i16,
    pub peak_val: u16,
    /// Metres, already scaled by the Q-format exponent.
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Decoded detected-points record.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObjects {
    pub q_format: u16,
    /// First two rows of the object bytes viewed as a 12 x numObj row-major
    /// matrix, combined little-endian.
    pub range_indices: Vec<u16>,
    pub objects: Vec<DetectedObject>,
}

/// Firmware timing statistics (record type 6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub inter_chirp_processing_margin: u32,
    pub inter_frame_processing_margin: u32,
    pub inter_frame_processing_time: u32,
    pub transmit_output_time: u32,
    pub active_frame_cpu_load: u32,
    pub inter_frame_cpu_load: u32,
}

pub(crate) fn parse_detected_objects(r: &mut FrameReader<'_>) -> Result<DetectedObjects, DecodeError> {
    let num_obj = r.u16("numObj")? as usize;
    let q_format = r.u16("xyzQFormat")?;
    let data = r.take(num_obj * OBJ_RECORD_LEN, "detected objects")?;

    let range_indices = (0..num_obj)
        .map(|c| data[c] as u16 | (data[num_obj + c] as u16) << 8)
        .collect();

    let scale = 2f64.powi(-(q_format as i32));
    let objects = data
        .chunks_exact(OBJ_RECORD_LEN)
        .map(|rec| DetectedObject {
            range_idx: LittleEndian::read_u16(&rec[0..2]),
            doppler_idx: LittleEndian::read_i16(&rec[2..4]),
            peak_val: LittleEndian::read_u16(&rec[4..6]),
            x: LittleEndian::read_i16(&rec[6..8]) as f64 * scale,
            y: LittleEndian::read_i16(&rec[8..10]) as f64 * scale,
            z: LittleEndian::read_i16(&rec[10..12]) as f64 * scale,
        })
        .collect();

    Ok(DetectedObjects {
        q_format,
        range_indices,
        objects,
    })
}

/// `payload` must hold at least STATS_LEN bytes.
pub(crate) fn parse_stats(payload: &[u8]) -> FrameStats {
    let word = |i: usize| LittleEndian::read_u32(&payload[i * 4..i * 4 + 4]);
    FrameStats {
        inter_chirp_processing_margin: word(0),
        inter_frame_processing_margin: word(1),
        inter_frame_processing_time: word(2),
        transmit_output_time: word(3),
        active_frame_cpu_load: word(4),
        inter_frame_cpu_load: word(5),
    }
}
