// Copyright 2025-2026 CEMAXECUTER LLC

use crate::error::PublishError;
use crate::publish::{Publisher, Subscriber};

fn transport(context: &str) -> impl Fn(zmq::Error) -> PublishError + '_ {
    move |e| PublishError::Transport {
        context: context.to_string(),
        message: e.to_string(),
    }
}

/// ZMQ PUB socket. Each message is two frames: topic, payload.
pub struct ZmqPublisher {
    socket: zmq::Socket,
    _ctx: zmq::Context,
}

impl ZmqPublisher {
    /// PUB socket that connects out to a binding subscriber.
    pub fn connect(endpoint: &str) -> Result<Self, PublishError> {
        let (ctx, socket) = Self::socket()?;
        socket
            .connect(endpoint)
            .map_err(transport(&format!("connect to {}", endpoint)))?;
        log::info!("ZMQ PUB: connected to {}", endpoint);
        Ok(Self { socket, _ctx: ctx })
    }

    /// PUB socket that subscribers connect to.
    pub fn bind(endpoint: &str) -> Result<Self, PublishError> {
        let (ctx, socket) = Self::socket()?;
        socket
            .bind(endpoint)
            .map_err(transport(&format!("bind {}", endpoint)))?;
        log::info!("ZMQ PUB: bound to {}", endpoint);
        Ok(Self { socket, _ctx: ctx })
    }

    fn socket() -> Result<(zmq::Context, zmq::Socket), PublishError> {
        let ctx = zmq::Context::new();
        let socket = ctx.socket(zmq::PUB).map_err(transport("PUB socket"))?;
        socket.set_sndhwm(1000).map_err(transport("set_sndhwm"))?;
        Ok((ctx, socket))
    }
}

// zmq::Socket is Send but not Sync; the publisher is owned by one thread.
impl Publisher for ZmqPublisher {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        // DONTWAIT: a slow subscriber must not stall frame decoding.
        match self
            .socket
            .send(topic.as_bytes(), zmq::DONTWAIT | zmq::SNDMORE)
            .and_then(|_| self.socket.send(payload, zmq::DONTWAIT))
        {
            Ok(()) => Ok(()),
            Err(zmq::Error::EAGAIN) => {
                log::debug!("ZMQ PUB: high water mark, dropping {} message", topic);
                Ok(())
            }
            Err(e) => Err(transport("send")(e)),
        }
    }
}

/// ZMQ SUB socket, topic-filtered by prefix.
pub struct ZmqSubscriber {
    socket: zmq::Socket,
    _ctx: zmq::Context,
}

impl ZmqSubscriber {
    /// SUB socket that binds and waits for publishers to connect.
    pub fn bind(endpoint: &str, topics: &[&str]) -> Result<Self, PublishError> {
        let ctx = zmq::Context::new();
        let socket = ctx.socket(zmq::SUB).map_err(transport("SUB socket"))?;
        for topic in topics {
            socket
                .set_subscribe(topic.as_bytes())
                .map_err(transport("set_subscribe"))?;
        }
        socket
            .bind(endpoint)
            .map_err(transport(&format!("bind {}", endpoint)))?;
        log::info!("ZMQ SUB: bound to {} (topics {:?})", endpoint, topics);

        Ok(Self {
            socket,
            _ctx: ctx,
        })
    }
}

impl Subscriber for ZmqSubscriber {
    fn run(&mut self, on_message: &mut dyn FnMut(&str, &[u8])) -> Result<(), PublishError> {
        loop {
            let frames = match self.socket.recv_multipart(0) {
                Ok(frames) => frames,
                Err(zmq::Error::EINTR) => continue,
                Err(e) => return Err(transport("recv")(e)),
            };
            if frames.len() != 2 {
                log::warn!("ZMQ SUB: ignoring message with {} frames", frames.len());
                continue;
            }
            let topic = String::from_utf8_lossy(&frames[0]);
            on_message(&topic, &frames[1]);
        }
    }
}
