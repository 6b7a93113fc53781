// Copyright 2025-2026 CEMAXECUTER LLC

use std::path::Path;
use std::time::Instant;

use crossbeam::channel;

use mw_dsp::{ComplexSampleMatrix, HeatmapGrid, HeatmapTransform};
use mw_output::{PublishError, Publisher, Subscriber, TOPIC_SAMPLES};
use mw_source::file::FileSource;
use mw_source::ByteSource;

use crate::config::Config;
use crate::stream::{IngestOutput, PipelineStats, StreamPipeline};

/// What to do with each decoded frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Output {
    /// Build heatmaps and publish them.
    #[default]
    Heatmaps,
    /// Publish raw sample blocks for a remote subscriber; no transform.
    Samples,
}

/// Read a byte stream from a file or device node and decode it to heatmaps.
pub fn run_file(
    file_path: &Path,
    config: &Config,
    output: Output,
    publisher: Option<&dyn Publisher>,
    print_stats: bool,
) -> Result<PipelineStats, String> {
    let geometry = config.geometry();
    log::info!(
        "geometry: {} TX x {} RX, {} range bins ({} byte sample blocks)",
        geometry.num_tx_azim_ant,
        geometry.num_rx_ant,
        geometry.num_range_bins,
        geometry.sample_block_len()
    );

    let mut pipeline = match output {
        Output::Heatmaps => StreamPipeline::new(geometry, config.grid())
            .map_err(|e| format!("invalid grid configuration: {}", e))?,
        Output::Samples => StreamPipeline::samples_only(geometry),
    };
    pipeline.set_max_buffer_len(config.max_buffer_len);

    let mut source = FileSource::new(file_path.to_string_lossy().to_string());
    source.set_chunk_size(config.chunk_size);

    let (tx, rx) = channel::bounded(64);

    let reader_thread = std::thread::spawn(move || source.start(tx));

    let stats_start = Instant::now();
    let mut last_stats = Instant::now();
    let mut result = Ok(());

    for chunk in rx.iter() {
        let out = pipeline.ingest(&chunk);
        if let Err(e) = handle_output(out, output, publisher) {
            result = Err(format!("publish failed: {}", e));
            break;
        }

        if print_stats && last_stats.elapsed().as_secs() >= 5 {
            let elapsed = stats_start.elapsed().as_secs_f64();
            eprintln!("[{:.1}s] {}", elapsed, format_stats(pipeline.stats()));
            last_stats = Instant::now();
        }
    }

    // Unblocks the reader if we stopped early.
    drop(rx);
    match reader_thread.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(format!("byte source: {}", e)),
        Err(_) => return Err("byte source thread panicked".to_string()),
    }

    let stats = *pipeline.stats();
    if print_stats {
        eprintln!(
            "done ({:.1}s): {}",
            stats_start.elapsed().as_secs_f64(),
            format_stats(&stats)
        );
    }
    log::info!(
        "finished: {} frames, {} decode errors, {} bytes left unframed",
        stats.frames_decoded,
        stats.decode_errors,
        pipeline.buffered().len()
    );

    result.map(|_| stats)
}

fn handle_output(
    out: IngestOutput,
    output: Output,
    publisher: Option<&dyn Publisher>,
) -> Result<(), PublishError> {
    for err in &out.errors {
        log::warn!("{}", err);
    }

    for decoded in out.frames {
        let frame_number = decoded.frame.header.frame_number;
        match (output, publisher) {
            (Output::Samples, Some(p)) => {
                if let Some(samples) = &decoded.samples {
                    p.publish_samples(samples)?;
                }
            }
            (Output::Heatmaps, Some(p)) => {
                if let Some(grid) = &decoded.heatmap {
                    p.publish_heatmap(frame_number, grid)?;
                }
            }
            (_, None) => {
                if let Some(grid) = &decoded.heatmap {
                    log_heatmap(frame_number, grid);
                }
            }
        }
    }

    Ok(())
}

fn log_heatmap(frame_number: u32, grid: &HeatmapGrid) {
    if let Some((peak, x, y)) = grid.peak() {
        log::info!(
            "frame {}: peak {:.1} at x={:.2} m y={:.2} m",
            frame_number,
            peak,
            x,
            y
        );
    }
}

fn format_stats(stats: &PipelineStats) -> String {
    format!(
        "bytes: {} frames: {} samples: {} heatmaps: {} errors: {} discarded: {}",
        stats.bytes_ingested,
        stats.frames_decoded,
        stats.sample_blocks,
        stats.heatmaps,
        stats.decode_errors,
        stats.bytes_discarded,
    )
}

/// Counters for subscriber mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriberStats {
    pub received: u64,
    pub heatmaps: u64,
    pub rejected: u64,
}

/// Receive transported sample blocks and turn them into heatmaps.
///
/// Heatmaps are numbered in arrival order since sample block messages carry
/// no frame number.
pub fn run_subscriber(
    subscriber: &mut dyn Subscriber,
    config: &Config,
    publisher: Option<&dyn Publisher>,
) -> Result<SubscriberStats, String> {
    let geometry = config.geometry();
    let mut transform = HeatmapTransform::new(geometry, config.grid())
        .map_err(|e| format!("invalid grid configuration: {}", e))?;
    let mut stats = SubscriberStats::default();

    subscriber
        .run(&mut |topic, payload| {
            if topic != TOPIC_SAMPLES {
                return;
            }
            stats.received += 1;
            let samples = match ComplexSampleMatrix::from_wire_bytes(payload, &geometry) {
                Ok(samples) => samples,
                Err(e) => {
                    log::warn!("rejecting sample block: {}", e);
                    stats.rejected += 1;
                    return;
                }
            };
            let grid = transform.apply(&samples);
            let seq = stats.heatmaps as u32;
            stats.heatmaps += 1;
            match publisher {
                Some(p) => {
                    if let Err(e) = p.publish_heatmap(seq, &grid) {
                        log::warn!("publish failed: {}", e);
                    }
                }
                None => log_heatmap(seq, &grid),
            }
        })
        .map_err(|e| format!("subscriber failed: {}", e))?;

    log::info!(
        "subscriber finished: {} received, {} heatmaps, {} rejected",
        stats.received,
        stats.heatmaps,
        stats.rejected
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::tests::{small_geometry, three_frame_stream};
    use mw_output::{channel_pair, decode_heatmap, Message, TOPIC_HEATMAP};
    use std::io::Write;

    fn small_config() -> Config {
        Config {
            num_tx_azim_ant: 1,
            num_rx_ant: 2,
            num_range_bins: 4,
            num_angle_bins: 8,
            range_idx_to_meters: 0.5,
            range_width: 2.0,
            range_depth: 2.0,
            grid_points_x: 5,
            grid_points_y: 4,
            chunk_size: 7,
            ..Config::default()
        }
    }

    fn temp_stream(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("mw_app_{}_{}", std::process::id(), name));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&three_frame_stream(&small_geometry())).unwrap();
        path
    }

    fn drain(mut subscriber: impl Subscriber) -> Vec<Message> {
        let mut got = Vec::new();
        subscriber
            .run(&mut |topic, payload| {
                got.push(Message {
                    topic: topic.to_string(),
                    payload: payload.to_vec(),
                })
            })
            .unwrap();
        got
    }

    #[test]
    fn test_run_file_publishes_heatmaps() {
        let path = temp_stream("heatmaps");
        let (publisher, subscriber) = channel_pair(16, &[]);

        let stats = run_file(&path, &small_config(), Output::Heatmaps, Some(&publisher), false).unwrap();
        drop(publisher);
        std::fs::remove_file(&path).ok();

        assert_eq!(stats.frames_decoded, 3);
        assert_eq!(stats.heatmaps, 2);

        let got = drain(subscriber);
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|m| m.topic == TOPIC_HEATMAP));
        let (frame, grid) = decode_heatmap(&got[1].payload).unwrap();
        assert_eq!(frame, 11);
        assert_eq!(grid.values.dim(), (4, 5));
    }

    #[test]
    fn test_split_across_processes() {
        let path = temp_stream("samples");
        let config = small_config();

        let (publisher, subscriber) = channel_pair(16, &[]);
        let stats = run_file(&path, &config, Output::Samples, Some(&publisher), false).unwrap();
        drop(publisher);
        std::fs::remove_file(&path).ok();
        assert_eq!(stats.sample_blocks, 2);
        assert_eq!(stats.heatmaps, 0);

        // The remote half rebuilds the same heatmaps from the sample blocks.
        let (heatmap_pub, heatmap_sub) = channel_pair(16, &[]);
        let mut samples_sub = subscriber;
        let sub_stats = run_subscriber(&mut samples_sub, &config, Some(&heatmap_pub)).unwrap();
        drop(heatmap_pub);
        assert_eq!(
            sub_stats,
            SubscriberStats {
                received: 2,
                heatmaps: 2,
                rejected: 0
            }
        );

        let mut local = StreamPipeline::new(config.geometry(), config.grid()).unwrap();
        let expected: Vec<HeatmapGrid> = local
            .ingest(&three_frame_stream(&small_geometry()))
            .frames
            .into_iter()
            .filter_map(|f| f.heatmap)
            .collect();

        let remote: Vec<HeatmapGrid> = drain(heatmap_sub)
            .iter()
            .map(|m| decode_heatmap(&m.payload).unwrap().1)
            .collect();
        assert_eq!(remote, expected);
    }

    #[test]
    fn test_subscriber_rejects_bad_block() {
        let (publisher, mut subscriber) = channel_pair(4, &[]);
        publisher.publish(TOPIC_SAMPLES, &[0u8; 5]).unwrap();
        publisher.publish("other", &[0u8; 5]).unwrap();
        drop(publisher);

        let stats = run_subscriber(&mut subscriber, &small_config(), None).unwrap();
        assert_eq!(stats.received, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.heatmaps, 0);
    }

    #[test]
    fn test_missing_input() {
        let err = run_file(
            Path::new("/nonexistent/mw_app_input.bin"),
            &small_config(),
            Output::Heatmaps,
            None,
            false,
        )
        .unwrap_err();
        assert!(err.contains("mw_app_input.bin"));
    }
}
