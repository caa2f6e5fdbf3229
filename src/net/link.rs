//! Connection to the peer: fire-and-forget sends and a receiver thread
//! feeding a bounded inbox that the main loop drains once per step.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};

use super::message::Message;
use super::transport::{NetError, Transport};

/// Decoded messages waiting for the main loop. A full inbox blocks the
/// receiver thread.
pub const INBOX_CAPACITY: usize = 1024;

pub struct PeerLink {
    transport: Arc<dyn Transport>,
    inbox: Receiver<Message>,
    receiver: Option<JoinHandle<()>>,
}

impl PeerLink {
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self, NetError> {
        let (tx, inbox) = crossbeam_channel::bounded(INBOX_CAPACITY);
        let reader = Arc::clone(&transport);
        let receiver = thread::Builder::new()
            .name("peer-recv".into())
            .spawn(move || receive_loop(reader.as_ref(), tx))?;
        Ok(Self {
            transport,
            inbox,
            receiver: Some(receiver),
        })
    }

    /// Send without waiting; failures are logged and dropped
    pub fn send(&self, msg: &Message) {
        if let Err(e) = self.transport.send(&msg.encode()) {
            warn!("Dropped outgoing {:?}: {e}", msg.kind());
        }
    }

    /// Everything received since the last drain, in arrival order
    pub fn drain(&self) -> impl Iterator<Item = Message> + '_ {
        self.inbox.try_iter()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Message> {
        self.inbox.recv_timeout(timeout).ok()
    }

    /// False once the receiver thread has stopped
    pub fn is_connected(&self) -> bool {
        self.receiver.as_ref().is_some_and(|h| !h.is_finished())
    }
}

fn receive_loop(transport: &dyn Transport, inbox: Sender<Message>) {
    loop {
        let frame = match transport.recv() {
            Ok(frame) => frame,
            Err(NetError::Disconnected) => {
                info!("Peer disconnected");
                return;
            }
            Err(e) => {
                warn!("Receive failed: {e}");
                return;
            }
        };
        match Message::decode(&frame) {
            Ok(msg) => {
                if inbox.send(msg).is_err() {
                    debug!("Inbox closed, stopping receiver");
                    return;
                }
            }
            Err(e) => warn!("Skipping frame {frame:02x?}: {e}"),
        }
    }
}

impl Drop for PeerLink {
    fn drop(&mut self) {
        self.transport.close();
        if let Some(handle) = self.receiver.take() {
            // Keep draining so a full inbox cannot wedge the receiver
            while !handle.is_finished() {
                self.inbox.try_iter().for_each(drop);
                thread::yield_now();
            }
            if handle.join().is_err() {
                warn!("Receiver thread panicked");
            }
        }
    }
}
