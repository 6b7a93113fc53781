// Copyright 2025-2026 CEMAXECUTER LLC

pub mod error;
pub mod message;
pub mod publish;

#[cfg(feature = "zmq")]
pub mod zmq_pub;

pub use error::{MessageError, PublishError};
pub use message::{decode_heatmap, encode_heatmap, TOPIC_HEATMAP, TOPIC_SAMPLES};
pub use publish::{channel_pair, ChannelPublisher, ChannelSubscriber, Message, Publisher, Subscriber};
