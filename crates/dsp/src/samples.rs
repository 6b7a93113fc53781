// Copyright 2025-2026 CEMAXECUTER LLC

//! Decoding of the azimuth static heatmap record into complex samples.

use byteorder::{ByteOrder, LittleEndian};
use ndarray::{Array2, ShapeBuilder};
use num_complex::Complex64;

use mw_protocol::{AntennaGeometry, AntennaSampleBlock, DecodeError};

use crate::error::WireError;

/// Bytes per complex value in the transport encoding (two f64).
pub const WIRE_BYTES_PER_SAMPLE: usize = 16;

/// Reinterpret a little-endian 16-bit word as two's complement: values
/// above 32767 become `value - 65536`.
#[inline]
pub fn to_signed(word: u16) -> i16 {
    word as i16
}

/// Group bytes into little-endian 16-bit words and apply the signed
/// wraparound. A trailing odd byte is ignored.
pub fn decode_words(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|w| to_signed(LittleEndian::read_u16(w)))
        .collect()
}

/// Complex samples shaped (virtual antenna, range bin).
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSampleMatrix {
    data: Array2<Complex64>,
}

impl ComplexSampleMatrix {
    pub fn zeros(geometry: &AntennaGeometry) -> Self {
        Self {
            data: Array2::zeros((geometry.num_virtual_antennas(), geometry.num_range_bins)),
        }
    }

    pub fn from_array(data: Array2<Complex64>) -> Self {
        Self { data }
    }

    /// Shape a flat sequence in sensor order (antenna index fastest).
    fn from_stream_order(samples: Vec<Complex64>, geometry: &AntennaGeometry) -> Option<Self> {
        let shape = (geometry.num_virtual_antennas(), geometry.num_range_bins).f();
        Array2::from_shape_vec(shape, samples).ok().map(|data| Self { data })
    }

    pub fn data(&self) -> &Array2<Complex64> {
        &self.data
    }

    pub fn num_antennas(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_range_bins(&self) -> usize {
        self.data.ncols()
    }

    /// Samples in sensor stream order: antenna index varies fastest.
    pub fn stream_order(&self) -> impl Iterator<Item = &Complex64> + '_ {
        self.data.t().into_iter()
    }

    /// Flat transport encoding: each sample as little-endian f64 real then
    /// imaginary, in sensor stream order.
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.data.len() * WIRE_BYTES_PER_SAMPLE];
        for (chunk, v) in buf.chunks_exact_mut(WIRE_BYTES_PER_SAMPLE).zip(self.stream_order()) {
            LittleEndian::write_f64(&mut chunk[..8], v.re);
            LittleEndian::write_f64(&mut chunk[8..], v.im);
        }
        buf
    }

    pub fn from_wire_bytes(bytes: &[u8], geometry: &AntennaGeometry) -> Result<Self, WireError> {
        let expected = geometry.num_samples() * WIRE_BYTES_PER_SAMPLE;
        if bytes.len() != expected {
            return Err(WireError::LengthMismatch {
                expected,
                got: bytes.len(),
            });
        }
        let samples = bytes
            .chunks_exact(WIRE_BYTES_PER_SAMPLE)
            .map(|c| Complex64::new(LittleEndian::read_f64(&c[..8]), LittleEndian::read_f64(&c[8..])))
            .collect();
        Self::from_stream_order(samples, geometry).ok_or(WireError::LengthMismatch {
            expected,
            got: bytes.len(),
        })
    }
}

/// Turns raw antenna sample blocks into complex matrices for one geometry.
#[derive(Debug, Clone)]
pub struct SampleDecoder {
    geometry: AntennaGeometry,
}

impl SampleDecoder {
    pub fn new(geometry: AntennaGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &AntennaGeometry {
        &self.geometry
    }

    /// Words pair up as (real, imaginary); pairs fill the matrix column-major.
    pub fn decode(&self, block: &AntennaSampleBlock) -> Result<ComplexSampleMatrix, DecodeError> {
        let expected = self.geometry.sample_block_len();
        let mismatch = DecodeError::SampleBlockSizeMismatch {
            expected,
            got: block.len(),
        };
        if block.len() != expected {
            return Err(mismatch);
        }

        let words = decode_words(block.as_bytes());
        let samples = words
            .chunks_exact(2)
            .map(|iq| Complex64::new(iq[0] as f64, iq[1] as f64))
            .collect();

        ComplexSampleMatrix::from_stream_order(samples, &self.geometry).ok_or(mismatch)
    }
}
