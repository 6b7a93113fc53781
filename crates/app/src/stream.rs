// Copyright 2025-2026 CEMAXECUTER LLC

use mw_dsp::{ComplexSampleMatrix, ConfigError, GridConfig, HeatmapGrid, HeatmapTransform, SampleDecoder};
use mw_protocol::{decode_frame, find_markers, frame_candidates, AntennaGeometry, DecodeError, Frame, MAGIC};

/// Default cap on buffered bytes while no complete frame is bounded.
pub const DEFAULT_MAX_BUFFER_LEN: usize = 4 * 1024 * 1024;

/// Non-fatal failure for one frame candidate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("frame at stream offset {stream_offset}: {error}")]
pub struct FrameError {
    /// Absolute offset of the candidate's marker in the input stream.
    pub stream_offset: u64,
    /// Present when the header was long enough to carry it.
    pub frame_number: Option<u32>,
    pub error: DecodeError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub stream_offset: u64,
    pub frame: Frame,
    pub samples: Option<ComplexSampleMatrix>,
    pub heatmap: Option<HeatmapGrid>,
}

/// Everything one `ingest` call produced, in stream order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutput {
    pub frames: Vec<DecodedFrame>,
    pub errors: Vec<FrameError>,
}

impl IngestOutput {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub bytes_ingested: u64,
    pub frames_decoded: u64,
    pub sample_blocks: u64,
    pub heatmaps: u64,
    pub decode_errors: u64,
    pub bytes_discarded: u64,
}

/// Marker-synchronised frame decoding over an arbitrarily chunked byte stream.
///
/// Each call to [`ingest`](Self::ingest) appends a chunk, decodes every frame
/// that is bounded by two markers, and keeps the bytes from the last marker
/// on for the next call. Output does not depend on how the stream is split.
pub struct StreamPipeline {
    geometry: AntennaGeometry,
    sample_decoder: SampleDecoder,
    /// `None` when only sample blocks are wanted.
    transform: Option<HeatmapTransform>,
    buffer: Vec<u8>,
    /// Stream offset of `buffer[0]`.
    buffer_start: u64,
    max_buffer_len: usize,
    stats: PipelineStats,
}

impl StreamPipeline {
    pub fn new(geometry: AntennaGeometry, grid: GridConfig) -> Result<Self, ConfigError> {
        let transform = HeatmapTransform::new(geometry, grid)?;
        let mut pipeline = Self::samples_only(geometry);
        pipeline.transform = Some(transform);
        Ok(pipeline)
    }

    /// Decode frames and sample blocks without building heatmaps.
    pub fn samples_only(geometry: AntennaGeometry) -> Self {
        Self {
            geometry,
            sample_decoder: SampleDecoder::new(geometry),
            transform: None,
            buffer: Vec::new(),
            buffer_start: 0,
            max_buffer_len: DEFAULT_MAX_BUFFER_LEN,
            stats: PipelineStats::default(),
        }
    }

    pub fn set_max_buffer_len(&mut self, len: usize) {
        self.max_buffer_len = len.max(MAGIC.len());
    }

    pub fn geometry(&self) -> &AntennaGeometry {
        &self.geometry
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Bytes carried over to the next call.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn ingest(&mut self, chunk: &[u8]) -> IngestOutput {
        self.stats.bytes_ingested += chunk.len() as u64;
        self.buffer.extend_from_slice(chunk);

        let markers = find_markers(&self.buffer, 0);
        let mut out = IngestOutput::default();

        for range in frame_candidates(&markers) {
            let stream_offset = self.buffer_start + range.start as u64;
            let decoded = decode_frame(&self.buffer[range.clone()], &self.geometry);
            match decoded {
                Ok(frame) => self.finish_frame(stream_offset, frame, &mut out),
                Err(error) => {
                    let frame_number = peek_frame_number(&self.buffer[range]);
                    log::debug!(
                        "dropping frame at offset {} (frame {:?}): {}",
                        stream_offset,
                        frame_number,
                        error
                    );
                    self.stats.decode_errors += 1;
                    out.errors.push(FrameError {
                        stream_offset,
                        frame_number,
                        error,
                    });
                }
            }
        }

        match markers.last() {
            Some(&last) if markers.len() >= 2 => self.consume(last),
            first => self.enforce_limit(first.copied()),
        }

        out
    }

    fn finish_frame(&mut self, stream_offset: u64, frame: Frame, out: &mut IngestOutput) {
        let header = &frame.header;
        if header.total_packet_length as usize != frame.candidate_len {
            log::debug!(
                "frame {}: totalPacketLength {} but markers bound {} bytes",
                header.frame_number,
                header.total_packet_length,
                frame.candidate_len
            );
        }
        self.stats.frames_decoded += 1;

        let mut samples = None;
        let mut heatmap = None;
        if let Some(block) = &frame.sample_block {
            match self.sample_decoder.decode(block) {
                Ok(matrix) => {
                    self.stats.sample_blocks += 1;
                    if let Some(transform) = self.transform.as_mut() {
                        heatmap = Some(transform.apply(&matrix));
                        self.stats.heatmaps += 1;
                    }
                    samples = Some(matrix);
                }
                Err(error) => {
                    self.stats.decode_errors += 1;
                    out.errors.push(FrameError {
                        stream_offset,
                        frame_number: Some(frame.header.frame_number),
                        error,
                    });
                }
            }
        }

        log::debug!(
            "frame {} at offset {}: {} TLVs, {} bytes",
            frame.header.frame_number,
            stream_offset,
            frame.tlvs.len(),
            frame.candidate_len
        );

        out.frames.push(DecodedFrame {
            stream_offset,
            frame,
            samples,
            heatmap,
        });
    }

    /// Drop everything before buffer index `upto`.
    fn consume(&mut self, upto: usize) {
        self.buffer.drain(..upto);
        self.buffer_start += upto as u64;
    }

    /// Fewer than two markers: keep everything unless over the cap. Over the
    /// cap, a lone marker and the frame it opens are kept and only the bytes
    /// before it go. With no marker, only a tail that could still hold the
    /// start of a split marker is kept.
    fn enforce_limit(&mut self, marker: Option<usize>) {
        if self.buffer.len() <= self.max_buffer_len {
            return;
        }
        let drop = match marker {
            Some(at) => at,
            None => self.buffer.len() - (MAGIC.len() - 1),
        };
        if drop == 0 {
            return;
        }
        log::warn!(
            "no frame bounded in {} buffered bytes, discarding {}",
            self.buffer.len(),
            drop
        );
        self.stats.bytes_discarded += drop as u64;
        self.consume(drop);
    }
}

/// frameNumber sits at bytes 16..20 of a candidate.
fn peek_frame_number(candidate: &[u8]) -> Option<u32> {
    candidate
        .get(16..20)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
}
