//! OSC ingress for the rack control server.
//!
//! A UDP listener thread decodes incoming OSC packets and pushes recognized
//! commands into the shared sink. An optional outbound client sends
//! best-effort feedback messages (e.g. to a phone controller).

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use rack_core::{Command, normalize_osc};
use rosc::{OscMessage, OscPacket, OscType, encoder};
use tracing::{debug, info, warn};

/// How long the listener blocks per recv before checking the shutdown flag.
const RECV_TIMEOUT: Duration = Duration::from_millis(50);

struct FeedbackClient {
    socket: UdpSocket,
    target: SocketAddr,
}

pub struct OscIngress {
    sink: Sender<Command>,
    shutdown: Arc<AtomicBool>,
    listener: Mutex<Option<JoinHandle<()>>>,
    listen_port: Mutex<Option<u16>>,
    client: Mutex<Option<FeedbackClient>>,
}

impl OscIngress {
    pub fn new(sink: Sender<Command>) -> Self {
        Self {
            sink,
            shutdown: Arc::new(AtomicBool::new(false)),
            listener: Mutex::new(None),
            listen_port: Mutex::new(None),
            client: Mutex::new(None),
        }
    }

    /// Bind a UDP listener and start accepting datagrams on a background
    /// thread. A busy port returns an error rather than crashing.
    pub fn start(&self, port: u16) -> Result<(), String> {
        self.stop();

        let socket = UdpSocket::bind(("0.0.0.0", port))
            .map_err(|e| format!("failed to bind OSC port {port}: {e}"))?;
        socket
            .set_read_timeout(Some(RECV_TIMEOUT))
            .map_err(|e| format!("failed to set OSC read timeout: {e}"))?;
        // Resolve the real port so callers can pass 0 for an ephemeral one
        let local_port = socket.local_addr().map(|addr| addr.port()).unwrap_or(port);

        self.shutdown.store(false, Ordering::SeqCst);
        let shutdown = self.shutdown.clone();
        let sink = self.sink.clone();

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; rosc::decoder::MTU];
            while !shutdown.load(Ordering::SeqCst) {
                match socket.recv_from(&mut buf) {
                    Ok((size, _addr)) => match rosc::decoder::decode_udp(&buf[..size]) {
                        Ok((_, packet)) => handle_packet(&packet, &sink),
                        Err(e) => debug!("dropping malformed OSC packet: {}", e),
                    },
                    Err(ref e)
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            || e.kind() == std::io::ErrorKind::TimedOut =>
                    {
                        continue;
                    }
                    Err(e) => {
                        warn!("OSC socket error: {}", e);
                        break;
                    }
                }
            }
        });

        *self.listener.lock() = Some(handle);
        *self.listen_port.lock() = Some(local_port);
        info!("OSC server listening on 0.0.0.0:{}", local_port);
        Ok(())
    }

    /// Port the listener is currently bound to, if running.
    pub fn listen_port(&self) -> Option<u16> {
        *self.listen_port.lock()
    }

    /// Configure the outbound UDP sender for feedback messages.
    pub fn setup_client(&self, target_host: &str, target_port: u16) -> Result<(), String> {
        let target = (target_host, target_port)
            .to_socket_addrs()
            .map_err(|e| format!("invalid OSC feedback target {target_host}:{target_port}: {e}"))?
            .next()
            .ok_or_else(|| format!("OSC feedback target {target_host} did not resolve"))?;
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| format!("failed to bind OSC feedback socket: {e}"))?;
        *self.client.lock() = Some(FeedbackClient { socket, target });
        Ok(())
    }

    /// Best-effort feedback send. No-op without a configured client; encode
    /// or send failures are logged and swallowed.
    pub fn send_feedback(&self, addr: &str, args: Vec<OscType>) {
        let client = self.client.lock();
        let Some(client) = client.as_ref() else {
            return;
        };
        let packet = OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        });
        match encoder::encode(&packet) {
            Ok(buf) => {
                if let Err(e) = client.socket.send_to(&buf, client.target) {
                    debug!("OSC feedback send failed: {}", e);
                }
            }
            Err(e) => debug!("OSC feedback encode failed: {}", e),
        }
    }

    /// Stop the listener thread. Idempotent.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.listener.lock().take() {
            let _ = handle.join();
        }
        *self.listen_port.lock() = None;
    }
}

impl Drop for OscIngress {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Normalize every message in a packet, recursing into bundles. Recognized
/// commands go to the sink; unrecognized addresses are dropped.
fn handle_packet(packet: &OscPacket, sink: &Sender<Command>) {
    match packet {
        OscPacket::Message(msg) => match normalize_osc(&msg.addr, &msg.args) {
            Some(command) => {
                let _ = sink.send(command);
            }
            None => debug!("unrecognized OSC address: {}", msg.addr),
        },
        OscPacket::Bundle(bundle) => {
            for inner in &bundle.content {
                handle_packet(inner, sink);
            }
        }
    }
}
