// Copyright 2025-2026 CEMAXECUTER LLC

use crossbeam::channel::{self, Receiver, Sender, TrySendError};

use mw_dsp::{ComplexSampleMatrix, HeatmapGrid};

use crate::error::PublishError;
use crate::message::{self, TOPIC_HEATMAP, TOPIC_SAMPLES};

/// Topic-addressed byte sink.
pub trait Publisher: Send {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;

    fn publish_samples(&self, samples: &ComplexSampleMatrix) -> Result<(), PublishError> {
        self.publish(TOPIC_SAMPLES, &samples.to_wire_bytes())
    }

    fn publish_heatmap(&self, frame_number: u32, grid: &HeatmapGrid) -> Result<(), PublishError> {
        self.publish(TOPIC_HEATMAP, &message::encode_heatmap(frame_number, grid))
    }
}

/// Delivers `(topic, payload)` pairs to a callback until the feed ends.
pub trait Subscriber {
    fn run(&mut self, on_message: &mut dyn FnMut(&str, &[u8])) -> Result<(), PublishError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// In-process publisher over a bounded channel. Messages are dropped, not
/// queued, when the channel is full.
pub struct ChannelPublisher {
    tx: Sender<Message>,
}

pub struct ChannelSubscriber {
    rx: Receiver<Message>,
    topics: Vec<String>,
}

/// Connected publisher/subscriber pair. An empty `topics` list receives all.
pub fn channel_pair(capacity: usize, topics: &[&str]) -> (ChannelPublisher, ChannelSubscriber) {
    let (tx, rx) = channel::bounded(capacity);
    (
        ChannelPublisher { tx },
        ChannelSubscriber {
            rx,
            topics: topics.iter().map(|t| t.to_string()).collect(),
        },
    )
}

impl Publisher for ChannelPublisher {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let msg = Message {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        };
        match self.tx.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                log::debug!("channel full, dropping {} message", topic);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(PublishError::Disconnected),
        }
    }
}

impl ChannelSubscriber {
    fn wants(&self, topic: &str) -> bool {
        self.topics.is_empty() || self.topics.iter().any(|t| topic.starts_with(t.as_str()))
    }
}

impl Subscriber for ChannelSubscriber {
    fn run(&mut self, on_message: &mut dyn FnMut(&str, &[u8])) -> Result<(), PublishError> {
        while let Ok(msg) = self.rx.recv() {
            if self.wants(&msg.topic) {
                on_message(&msg.topic, &msg.payload);
            }
        }
        Ok(())
    }
}
