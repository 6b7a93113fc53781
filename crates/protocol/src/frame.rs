// Copyright 2025-2026 CEMAXECUTER LLC

use byteorder::{ByteOrder, LittleEndian};

use crate::error::DecodeError;
use crate::geometry::AntennaGeometry;
use crate::sync::MAGIC;
use crate::tlv::{self, DetectedObjects, FrameStats};

/// Magic word plus seven u32 header fields.
pub const FRAME_HEADER_LEN: usize = MAGIC.len() + 7 * 4;
pub const TLV_HEADER_LEN: usize = 8;

/// TLV record types emitted by the sensor demo firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlvType {
    DetectedPoints,
    RangeProfile,
    NoiseProfile,
    /// Raw complex samples per virtual antenna and range bin.
    AzimuthStaticHeatmap,
    RangeDopplerHeatmap,
    Stats,
    Unknown(u32),
}

impl From<u32> for TlvType {
    fn from(value: u32) -> Self {
        match value {
            1 => TlvType::DetectedPoints,
            2 => TlvType::RangeProfile,
            3 => TlvType::NoiseProfile,
            4 => TlvType::AzimuthStaticHeatmap,
            5 => TlvType::RangeDopplerHeatmap,
            6 => TlvType::Stats,
            other => TlvType::Unknown(other),
        }
    }
}

/// Fixed header following the magic word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u32,
    pub total_packet_length: u32,
    pub frame_number: u32,
    pub time_cpu_cycles: u32,
    pub platform: u32,
    pub num_detected_obj: u32,
    pub num_tlvs: u32,
}

/// Descriptor of one TLV record; `offset` is the payload start within the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvRecord {
    pub tlv_type: TlvType,
    pub length: u32,
    pub offset: usize,
}

/// Raw azimuth static heatmap payload, exactly as captured from the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntennaSampleBlock(pub Vec<u8>);

impl AntennaSampleBlock {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One decoded frame candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: FrameHeader,
    pub tlvs: Vec<TlvRecord>,
    pub detected_objects: Option<DetectedObjects>,
    pub stats: Option<FrameStats>,
    pub sample_block: Option<AntennaSampleBlock>,
    /// Length of the marker-delimited candidate, marker included.
    pub candidate_len: usize,
}

/// Bounds-checked little-endian reader over one frame candidate.
pub(crate) struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::TruncatedFrame {
                field,
                offset: self.pos,
                needed: n,
                frame_len: self.buf.len(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub(crate) fn u16(&mut self, field: &'static str) -> Result<u16, DecodeError> {
        Ok(LittleEndian::read_u16(self.take(2, field)?))
    }

    pub(crate) fn u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        Ok(LittleEndian::read_u32(self.take(4, field)?))
    }
}

/// Decode one marker-delimited frame candidate (marker included).
///
/// The azimuth static heatmap record is captured with the length implied by
/// `geometry`, not its own length field. Fewer bytes are captured only when
/// the frame ends first; the sample decoder rejects such a block.
pub fn decode_frame(frame: &[u8], geometry: &AntennaGeometry) -> Result<Frame, DecodeError> {
    let mut r = FrameReader::new(frame);
    r.take(MAGIC.len(), "magic")?;

    let header = FrameHeader {
        version: r.u32("version")?,
        total_packet_length: r.u32("totalPacketLength")?,
        frame_number: r.u32("frameNumber")?,
        time_cpu_cycles: r.u32("timeCpuCycles")?,
        platform: r.u32("platform")?,
        num_detected_obj: r.u32("numDetectedObj")?,
        num_tlvs: r.u32("numTLVs")?,
    };

    let mut out = Frame {
        header,
        tlvs: Vec::with_capacity((header.num_tlvs as usize).min(16)),
        detected_objects: None,
        stats: None,
        sample_block: None,
        candidate_len: frame.len(),
    };

    for _ in 0..header.num_tlvs {
        let tlv_type = TlvType::from(r.u32("tlv type")?);
        let length = r.u32("tlv length")?;
        let offset = r.position();

        if length as usize > r.remaining() {
            return Err(DecodeError::TruncatedFrame {
                field: "tlv payload",
                offset,
                needed: length as usize,
                frame_len: frame.len(),
            });
        }

        match tlv_type {
            TlvType::DetectedPoints if length >= tlv::OBJ_DESCR_LEN as u32 => {
                out.detected_objects = Some(tlv::parse_detected_objects(&mut r)?);
            }
            // A later record replaces an earlier one in the same frame.
            TlvType::AzimuthStaticHeatmap => {
                let n = geometry.sample_block_len().min(r.remaining());
                let block = r.take(n, "azimuth static heatmap")?;
                out.sample_block = Some(AntennaSampleBlock(block.to_vec()));
            }
            TlvType::Stats if length as usize >= tlv::STATS_LEN => {
                let payload = r.take(length as usize, "stats")?;
                out.stats = Some(tlv::parse_stats(payload));
            }
            _ => {
                log::trace!("skipping TLV {:?} ({} bytes)", tlv_type, length);
                r.take(length as usize, "tlv payload")?;
            }
        }

        out.tlvs.push(TlvRecord {
            tlv_type,
            length,
            offset,
        });
    }

    Ok(out)
}
