//! Byte transports carrying 4-byte frames between the two peers

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender};
use log::info;

use super::message::Frame;

#[derive(Debug)]
pub enum NetError {
    Io(io::Error),
    /// The peer went away or the transport was closed
    Disconnected,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Io(e) => write!(f, "network I/O error: {e}"),
            NetError::Disconnected => write!(f, "peer disconnected"),
        }
    }
}

impl std::error::Error for NetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetError::Io(e) => Some(e),
            NetError::Disconnected => None,
        }
    }
}

impl From<io::Error> for NetError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => NetError::Disconnected,
            _ => NetError::Io(e),
        }
    }
}

/// A reliable, ordered pipe of frames. `recv` blocks until a whole frame
/// arrives; `close` must unblock a pending `recv` on another thread.
pub trait Transport: Send + Sync {
    fn send(&self, frame: &Frame) -> Result<(), NetError>;
    fn recv(&self) -> Result<Frame, NetError>;
    fn close(&self);
}

/// One TCP connection to the peer
pub struct TcpTransport {
    reader: Mutex<TcpStream>,
    writer: Mutex<TcpStream>,
    control: TcpStream,
    peer: SocketAddr,
}

impl TcpTransport {
    /// Wait for a single peer on `port`
    pub fn listen(port: u16) -> Result<Self, NetError> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        info!("Waiting for a peer on port {port}");
        let (stream, addr) = listener.accept()?;
        info!("Peer connected from {addr}");
        Self::from_stream(stream)
    }

    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, NetError> {
        let stream = TcpStream::connect(addr)?;
        let transport = Self::from_stream(stream)?;
        info!("Connected to {}", transport.peer);
        Ok(transport)
    }

    pub fn from_stream(stream: TcpStream) -> Result<Self, NetError> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        Ok(Self {
            reader: Mutex::new(stream.try_clone()?),
            writer: Mutex::new(stream.try_clone()?),
            control: stream,
            peer,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Transport for TcpTransport {
    fn send(&self, frame: &Frame) -> Result<(), NetError> {
        let mut writer = self.writer.lock().map_err(|_| NetError::Disconnected)?;
        writer.write_all(frame)?;
        Ok(())
    }

    fn recv(&self) -> Result<Frame, NetError> {
        let mut reader = self.reader.lock().map_err(|_| NetError::Disconnected)?;
        let mut frame = Frame::default();
        reader.read_exact(&mut frame)?;
        Ok(frame)
    }

    fn close(&self) {
        // Already-closed sockets report NotConnected; nothing left to do then
        let _ = self.control.shutdown(Shutdown::Both);
    }
}

/// In-memory transport, used for tests and local play
pub struct ChannelTransport {
    /// `None` marks the end of the stream
    tx: Sender<Option<Frame>>,
    /// Our own inbox, so `close` can wake a blocked `recv`
    wake: Sender<Option<Frame>>,
    rx: Receiver<Option<Frame>>,
    closed: AtomicBool,
}

impl ChannelTransport {
    /// Two connected ends
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = crossbeam_channel::unbounded();
        let (b_tx, b_rx) = crossbeam_channel::unbounded();
        let a = Self {
            tx: b_tx.clone(),
            wake: a_tx.clone(),
            rx: a_rx,
            closed: AtomicBool::new(false),
        };
        let b = Self {
            tx: a_tx,
            wake: b_tx,
            rx: b_rx,
            closed: AtomicBool::new(false),
        };
        (a, b)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, frame: &Frame) -> Result<(), NetError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(NetError::Disconnected);
        }
        self.tx
            .send(Some(*frame))
            .map_err(|_| NetError::Disconnected)
    }

    fn recv(&self) -> Result<Frame, NetError> {
        match self.rx.recv() {
            Ok(Some(frame)) => Ok(frame),
            Ok(None) | Err(_) => Err(NetError::Disconnected),
        }
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Either end may already be gone
        let _ = self.tx.send(None);
        let _ = self.wake.send(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_channel_pair_delivers_in_order() {
        let (a, b) = ChannelTransport::pair();
        a.send(&[1, 2, 3, 4]).unwrap();
        a.send(&[5, 6, 7, 8]).unwrap();
        assert_eq!(b.recv().unwrap(), [1, 2, 3, 4]);
        assert_eq!(b.recv().unwrap(), [5, 6, 7, 8]);
    }

    #[test]
    fn test_channel_close_wakes_both_ends() {
        let (a, b) = ChannelTransport::pair();
        let a = Arc::new(a);
        let waiter = {
            let a = Arc::clone(&a);
            thread::spawn(move || a.recv())
        };
        a.close();
        assert!(matches!(waiter.join().unwrap(), Err(NetError::Disconnected)));
        assert!(matches!(b.recv(), Err(NetError::Disconnected)));
        assert!(matches!(a.send(&[0; 4]), Err(NetError::Disconnected)));
    }

    #[test]
    fn test_tcp_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let transport = TcpTransport::from_stream(stream).unwrap();
            let frame = transport.recv().unwrap();
            transport.send(&frame.map(|b| b + 1)).unwrap();
        });

        let client = TcpTransport::connect(addr).unwrap();
        client.send(&[1, 2, 3, 4]).unwrap();
        assert_eq!(client.recv().unwrap(), [2, 3, 4, 5]);
        server.join().unwrap();

        // Server side dropped its socket
        assert!(matches!(client.recv(), Err(NetError::Disconnected)));
    }

    #[test]
    fn test_eof_maps_to_disconnected() {
        let err: NetError = io::Error::from(io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(err, NetError::Disconnected));
        let err: NetError = io::Error::from(io::ErrorKind::PermissionDenied).into();
        assert!(matches!(err, NetError::Io(_)));
    }
}
