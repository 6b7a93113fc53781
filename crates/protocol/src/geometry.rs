// Copyright 2025-2026 CEMAXECUTER LLC

/// Bytes per complex antenna sample: 16-bit real + 16-bit imaginary.
pub const BYTES_PER_SAMPLE: usize = 4;

/// Antenna array and range FFT layout the sensor was configured with.
/// Fixed for the lifetime of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AntennaGeometry {
    pub num_tx_azim_ant: usize,
    pub num_rx_ant: usize,
    /// Always a power of two.
    pub num_range_bins: usize,
}

impl Default for AntennaGeometry {
    fn default() -> Self {
        Self::new(2, 4, 256)
    }
}

impl AntennaGeometry {
    /// `num_range_bins` is rounded up to the next power of two.
    pub fn new(num_tx_azim_ant: usize, num_rx_ant: usize, num_range_bins: usize) -> Self {
        Self {
            num_tx_azim_ant,
            num_rx_ant,
            num_range_bins: pow2_roundup(num_range_bins),
        }
    }

    /// Derive antenna counts from the firmware channel-enable bitmasks.
    /// Azimuth TX antennas are the low two TX bits, RX antennas the low four.
    pub fn from_channel_masks(tx_channel_en: u8, rx_channel_en: u8, num_range_bins: usize) -> Self {
        let tx = (tx_channel_en & 0b11).count_ones() as usize;
        let rx = (rx_channel_en & 0b1111).count_ones() as usize;
        Self::new(tx, rx, num_range_bins)
    }

    pub fn num_virtual_antennas(&self) -> usize {
        self.num_tx_azim_ant * self.num_rx_ant
    }

    /// Number of complex samples in one azimuth static heatmap TLV.
    pub fn num_samples(&self) -> usize {
        self.num_virtual_antennas() * self.num_range_bins
    }

    /// Byte length of the azimuth static heatmap TLV payload.
    pub fn sample_block_len(&self) -> usize {
        self.num_samples() * BYTES_PER_SAMPLE
    }
}

/// Smallest power of two >= `x` (1 for 0).
pub fn pow2_roundup(x: usize) -> usize {
    x.max(1).next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let g = AntennaGeometry::default();
        assert_eq!(g.num_virtual_antennas(), 8);
        assert_eq!(g.num_range_bins, 256);
        assert_eq!(g.sample_block_len(), 8192);
    }

    #[test]
    fn test_range_bins_rounded() {
        assert_eq!(AntennaGeometry::new(2, 4, 200).num_range_bins, 256);
        assert_eq!(AntennaGeometry::new(2, 4, 257).num_range_bins, 512);
        assert_eq!(pow2_roundup(0), 1);
        assert_eq!(pow2_roundup(1), 1);
        assert_eq!(pow2_roundup(64), 64);
    }

    #[test]
    fn test_from_channel_masks() {
        let g = AntennaGeometry::from_channel_masks(0b101, 0b1111, 256);
        // bit 2 of the TX mask is the elevation antenna, not azimuth
        assert_eq!(g.num_tx_azim_ant, 1);
        assert_eq!(g.num_rx_ant, 4);

        let g = AntennaGeometry::from_channel_masks(0b011, 0b0101, 100);
        assert_eq!(g.num_virtual_antennas(), 4);
        assert_eq!(g.num_range_bins, 128);
    }
}
