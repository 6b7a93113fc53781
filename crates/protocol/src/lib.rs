// Copyright 2025-2026 CEMAXECUTER LLC

//! Wire-level handling of the mmWave demo UART output: marker search,
//! frame header and TLV decoding.

pub mod error;
pub mod frame;
pub mod geometry;
pub mod sync;
pub mod tlv;

pub use error::DecodeError;
pub use frame::{decode_frame, AntennaSampleBlock, Frame, FrameHeader, TlvRecord, TlvType};
pub use geometry::AntennaGeometry;
pub use sync::{find_markers, frame_candidates, MAGIC};
pub use tlv::{DetectedObject, DetectedObjects, FrameStats};
