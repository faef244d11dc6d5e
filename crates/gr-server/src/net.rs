//! TCP transport.
//!
//! Each connection gets a reader task and a writer task. The reader forwards
//! the login and every intent line to the intake; the writer compresses and
//! frames whatever envelopes the simulation hands to the connection's
//! [`FrameSink`]. The tick itself runs on the task calling [`serve_until`].

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use gr_core::ActorId;
use gr_simulation::{DeliveryError, Envelope, IntakeError, IntakeHandle, Login, Outbound, Simulation};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::codec;

const PING: &str = "ping";
const PONG: &[u8] = b"pong";

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("connection closed before login")]
    NoLogin,

    #[error("bad login: {0}")]
    Login(#[from] serde_json::Error),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginLine {
    account_id: i64,
    username: String,
}

/// Hands serialized envelopes to a connection's writer task.
#[derive(Debug)]
pub struct FrameSink {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl Outbound for FrameSink {
    fn deliver(&self, envelope: &Envelope) -> Result<(), DeliveryError> {
        let payload = serde_json::to_vec(envelope)?;
        self.tx.send(payload).map_err(|_| DeliveryError::Closed)
    }
}

/// Accept connections on `listener` and tick `sim` at its configured period
/// until `shutdown` resolves. Returns the simulation for inspection.
pub async fn serve_until<F>(
    listener: TcpListener,
    mut sim: Simulation,
    shutdown: F,
) -> io::Result<Simulation>
where
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    let period = sim.config().tick_period;
    let accept = tokio::spawn(accept_loop(listener, sim.intake_handle()));
    info!(%addr, ?period, "listening");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = interval.tick() => match sim.tick() {
                Ok(report) => {
                    if report.micros > period.as_micros() {
                        warn!(tick = report.tick, micros = report.micros, "tick overran its period");
                    }
                }
                Err(e) => error!(error = %e, "tick failed"),
            },
        }
    }

    accept.abort();
    info!(tick = sim.current_tick(), "server stopped");
    Ok(sim)
}

async fn accept_loop(listener: TcpListener, intake: IntakeHandle) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let intake = intake.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, peer, intake).await {
                        debug!(%peer, error = %e, "connection ended");
                    }
                });
            }
            Err(e) => warn!(error = %e, "accept failed"),
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    intake: IntakeHandle,
) -> Result<(), NetError> {
    stream.set_nodelay(true)?;
    let (read, write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    let first = lines.next_line().await?.ok_or(NetError::NoLogin)?;
    let login: LoginLine = serde_json::from_str(first.trim())?;
    let session = ActorId::new();

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        if let Err(e) = write_frames(write, rx).await {
            debug!(%peer, error = %e, "writer stopped");
        }
    });

    info!(%peer, player = %session, account = login.account_id, "login");
    intake.join(
        session,
        Login {
            account_id: login.account_id,
            username: login.username,
        },
        Box::new(FrameSink { tx: tx.clone() }),
    )?;

    let result = read_intents(&mut lines, session, &intake, &tx).await;
    if let Err(e) = intake.leave(session) {
        debug!(player = %session, error = %e, "leave not delivered");
    }
    result
}

async fn read_intents(
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
    session: ActorId,
    intake: &IntakeHandle,
    tx: &mpsc::UnboundedSender<Vec<u8>>,
) -> Result<(), NetError> {
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == PING {
            if tx.send(PONG.to_vec()).is_err() {
                break;
            }
            continue;
        }
        match intake.submit_wire(session, line) {
            Ok(()) => {}
            Err(IntakeError::Malformed(e)) => {
                warn!(player = %session, error = %e, "malformed intent");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn write_frames(
    mut write: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
) -> io::Result<()> {
    while let Some(payload) = rx.recv().await {
        let frame = codec::encode(&payload)?;
        write.write_all(&frame).await?;
    }
    write.shutdown().await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gr_core::{CollisionMap, ContentRegistry};
    use gr_simulation::{MemoryStore, SimConfig};
    use tokio::io::AsyncReadExt;

    use super::*;

    fn test_sim() -> Simulation {
        let config = SimConfig::default()
            .with_seed(1)
            .with_tick_period(Duration::from_millis(20));
        Simulation::new(
            CollisionMap::open(16, 16),
            ContentRegistry::builtin(),
            Box::new(MemoryStore::new()),
            config,
        )
    }

    #[tokio::test]
    async fn login_gets_snapshot_and_pong() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(b"{\"accountId\":1,\"username\":\"ada\"}\nping\n{\"action\":\"nonsense\"}\n")
                .await
                .unwrap();
            let mut buf = Vec::new();
            let mut frames = Vec::new();
            while frames.len() < 2 {
                let mut chunk = [0u8; 4096];
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "server closed the connection");
                buf.extend_from_slice(&chunk[..n]);
                while let Ok((payload, used)) = codec::client::decode(&buf) {
                    frames.push(payload);
                    buf.drain(..used);
                }
            }
            frames
        });

        let shutdown = async {
            while !client.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        let sim = tokio::time::timeout(
            Duration::from_secs(10),
            serve_until(listener, test_sim(), shutdown),
        )
        .await
        .unwrap()
        .unwrap();

        let frames = client.await.unwrap();
        assert!(frames.iter().any(|f| f.as_slice() == PONG));
        let snapshot = frames
            .iter()
            .filter(|f| f.as_slice() != PONG)
            .map(|f| serde_json::from_slice::<serde_json::Value>(f).unwrap())
            .find(|v| v.get("playerID").is_some())
            .unwrap();
        assert_eq!(snapshot["players"][0]["username"], "ada");
        assert!(sim.current_tick() > 0);
    }

    #[tokio::test]
    async fn garbage_login_is_dropped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"hello\n").await.unwrap();
            let mut rest = Vec::new();
            stream.read_to_end(&mut rest).await.unwrap();
            rest
        });

        let shutdown = async {
            while !client.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        let sim = tokio::time::timeout(
            Duration::from_secs(10),
            serve_until(listener, test_sim(), shutdown),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(client.await.unwrap().is_empty());
        assert_eq!(sim.world().player_count(), 0);
    }
}
