//! Authoritative race state and the task that owns it
//!
//! Every mutation of a race goes through a single task that drains a command
//! queue in receipt order. HTTP handlers hold a [`RaceHandle`] and never touch
//! the state directly, so a `start` can never interleave with an `update` and
//! ticks are applied one at a time.

use crate::api::{CircuitStatus, DragStatus, RaceSnapshot};
use crate::utils::RaceClock;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use shared::{CircuitConfig, CircuitRace, DragConfig, DragRace, KeySet, Race, RaceError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Frame times above this are applied but logged, they usually mean a stalled client.
const LARGE_DELTA_WARNING: f32 = 0.25;

/// Capacity of the command queue between handlers and the race task.
const COMMAND_QUEUE_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceKind {
    Circuit,
    Drag,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Race(#[from] RaceError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("race task is not running")]
    Closed,
}

/// The live circuit and drag races plus the configs used to reset them.
#[derive(Debug, Clone)]
pub struct RaceSession {
    circuit_config: CircuitConfig,
    drag_config: DragConfig,
    circuit: CircuitRace,
    drag: DragRace,
    ticks: u64,
}

impl RaceSession {
    pub fn new(circuit_config: CircuitConfig, drag_config: DragConfig) -> Result<Self, RaceError> {
        Ok(Self {
            circuit: CircuitRace::new(circuit_config)?,
            drag: DragRace::new(drag_config)?,
            circuit_config,
            drag_config,
            ticks: 0,
        })
    }

    pub fn circuit(&self) -> &CircuitRace {
        &self.circuit
    }

    pub fn drag(&self) -> &DragRace {
        &self.drag
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Replaces the race with a fresh one and starts it at `now`.
    pub fn restart(&mut self, kind: RaceKind, now: f64) -> Result<(), RaceError> {
        match kind {
            RaceKind::Circuit => {
                self.circuit = CircuitRace::new(self.circuit_config)?;
                self.circuit.start(now);
            }
            RaceKind::Drag => {
                self.drag = DragRace::new(self.drag_config)?;
                self.drag.start(now);
            }
        }
        info!("{:?} race reset and started", kind);
        Ok(())
    }

    pub fn update(
        &mut self,
        kind: RaceKind,
        delta: f32,
        now: f64,
        keys: &KeySet,
    ) -> Result<RaceSnapshot, RaceError> {
        if delta > LARGE_DELTA_WARNING {
            warn!("Large delta time received ({:.3}s) for {:?} race", delta, kind);
        }

        match kind {
            RaceKind::Circuit => self.circuit.update(delta, now, keys)?,
            RaceKind::Drag => self.drag.update(delta, now, keys)?,
        }

        self.ticks += 1;
        if self.ticks % 600 == 0 {
            debug!("Tick {}: applied {:?} update", self.ticks, kind);
        }
        Ok(self.snapshot(kind))
    }

    pub fn snapshot(&self, kind: RaceKind) -> RaceSnapshot {
        match kind {
            RaceKind::Circuit => RaceSnapshot::Circuit(CircuitStatus::from(&self.circuit)),
            RaceKind::Drag => RaceSnapshot::Drag(DragStatus::from(&self.drag)),
        }
    }
}

/// Requests processed by the race task, each with its own reply channel.
#[derive(Debug)]
pub enum RaceCommand {
    Start {
        kind: RaceKind,
        reply: oneshot::Sender<Result<f64, RaceError>>,
    },
    Update {
        kind: RaceKind,
        delta: f32,
        keys: KeySet,
        reply: oneshot::Sender<Result<RaceSnapshot, RaceError>>,
    },
    Snapshot {
        kind: RaceKind,
        reply: oneshot::Sender<RaceSnapshot>,
    },
    Shutdown,
}

/// Cloneable sender side of the race task.
#[derive(Debug, Clone)]
pub struct RaceHandle {
    commands: mpsc::Sender<RaceCommand>,
}

impl RaceHandle {
    /// Moves `session` into a new task and returns a handle to it.
    pub fn spawn(session: RaceSession) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(COMMAND_QUEUE_SIZE);
        let task = tokio::spawn(run_race_task(session, receiver, RaceClock::new()));
        (Self { commands }, task)
    }

    /// Resets and starts a race, returning its start timestamp in milliseconds.
    pub async fn start(&self, kind: RaceKind) -> Result<f64, SessionError> {
        let (reply, response) = oneshot::channel();
        self.send(RaceCommand::Start { kind, reply }).await?;
        Ok(response.await.map_err(|_| SessionError::Closed)??)
    }

    pub async fn update(
        &self,
        kind: RaceKind,
        delta: f32,
        keys: KeySet,
    ) -> Result<RaceSnapshot, SessionError> {
        let (reply, response) = oneshot::channel();
        self.send(RaceCommand::Update {
            kind,
            delta,
            keys,
            reply,
        })
        .await?;
        Ok(response.await.map_err(|_| SessionError::Closed)??)
    }

    pub async fn snapshot(&self, kind: RaceKind) -> Result<RaceSnapshot, SessionError> {
        let (reply, response) = oneshot::channel();
        self.send(RaceCommand::Snapshot { kind, reply }).await?;
        response.await.map_err(|_| SessionError::Closed)
    }

    /// Asks the race task to exit once the commands queued before this one are done.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(RaceCommand::Shutdown).await
    }

    async fn send(&self, command: RaceCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

/// Drains race commands in receipt order until shutdown or until every handle is dropped.
async fn run_race_task(
    mut session: RaceSession,
    mut commands: mpsc::Receiver<RaceCommand>,
    clock: RaceClock,
) {
    info!("Race task started");

    while let Some(command) = commands.recv().await {
        match command {
            RaceCommand::Start { kind, reply } => {
                let now = clock.now_millis();
                let result = session.restart(kind, now).map(|_| now);
                let _ = reply.send(result);
            }
            RaceCommand::Update {
                kind,
                delta,
                keys,
                reply,
            } => {
                let result = session.update(kind, delta, clock.now_millis(), &keys);
                if let Err(e) = &result {
                    warn!("Rejected {:?} update: {}", kind, e);
                }
                let _ = reply.send(result);
            }
            RaceCommand::Snapshot { kind, reply } => {
                let _ = reply.send(session.snapshot(kind));
            }
            RaceCommand::Shutdown => break,
        }
    }

    info!("Race task stopped after {} ticks", session.ticks());
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn session() -> RaceSession {
        RaceSession::new(CircuitConfig::with_laps(3), DragConfig::default()).unwrap()
    }

    fn drag_status(snapshot: RaceSnapshot) -> DragStatus {
        match snapshot {
            RaceSnapshot::Drag(status) => status,
            other => panic!("expected drag status, got {:?}", other),
        }
    }

    fn circuit_status(snapshot: RaceSnapshot) -> CircuitStatus {
        match snapshot {
            RaceSnapshot::Circuit(status) => status,
            other => panic!("expected circuit status, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = RaceSession::new(CircuitConfig::with_laps(-2), DragConfig::default());
        assert!(matches!(result, Err(RaceError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_update_before_start_reports_idle_race() {
        let mut session = session();
        let status = drag_status(
            session
                .update(RaceKind::Drag, 0.1, 100.0, &KeySet::from_keys(["KeyW"]))
                .unwrap(),
        );
        assert!(!status.game_started);
        assert_eq!(status.creature1_x, -10.0);
        assert_eq!(status.creature1_speed, 0.0);
    }

    #[test]
    fn test_restart_resets_positions() {
        let mut session = session();
        session.restart(RaceKind::Circuit, 0.0).unwrap();
        session
            .update(RaceKind::Circuit, 0.1, 100.0, &KeySet::from_keys(["KeyW"]))
            .unwrap();
        assert!(session.circuit().z() > 0.0);

        session.restart(RaceKind::Circuit, 500.0).unwrap();
        assert_eq!(session.circuit().position(), (10.0, 1.0, 0.0));
        assert_eq!(session.circuit().start_time(), 500.0);
        assert!(session.circuit().is_started());
    }

    #[test]
    fn test_races_are_independent() {
        let mut session = session();
        session.restart(RaceKind::Drag, 0.0).unwrap();
        let keys = KeySet::from_keys(["KeyW", "ArrowUp"]);
        session.update(RaceKind::Drag, 0.1, 100.0, &keys).unwrap();

        assert!(session.drag().racer_a().x > -10.0);
        assert!(session.drag().racer_b().x > -10.0);
        assert!(!session.circuit().is_started());
        assert_eq!(session.circuit().position(), (10.0, 1.0, 0.0));
        assert_eq!(session.ticks(), 1);
    }

    #[test]
    fn test_negative_delta_rejected() {
        let mut session = session();
        session.restart(RaceKind::Circuit, 0.0).unwrap();
        let err = session
            .update(RaceKind::Circuit, -0.5, 100.0, &KeySet::new())
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(session.ticks(), 0);
    }

    #[tokio::test]
    async fn test_handle_round_trip() {
        let (handle, task) = RaceHandle::spawn(session());

        let start_time = handle.start(RaceKind::Circuit).await.unwrap();
        assert!(start_time >= 0.0);

        let status = circuit_status(
            handle
                .update(RaceKind::Circuit, 0.1, KeySet::from_keys(["move-forward"]))
                .await
                .unwrap(),
        );
        assert_eq!(status.speed, 15.0);
        assert_approx_eq!(status.z, 1.5, 1e-6);

        let status = circuit_status(handle.snapshot(RaceKind::Circuit).await.unwrap());
        assert_approx_eq!(status.z, 1.5, 1e-6);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_reports_invalid_input() {
        let (handle, _task) = RaceHandle::spawn(session());
        handle.start(RaceKind::Drag).await.unwrap();

        let err = handle
            .update(RaceKind::Drag, -1.0, KeySet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Race(RaceError::InvalidInput(_))));
    }

    #[test]
    fn test_handle_after_shutdown_is_closed() {
        tokio_test::block_on(async {
            let (handle, task) = RaceHandle::spawn(session());
            handle.shutdown().await.unwrap();
            task.await.unwrap();

            let err = handle.snapshot(RaceKind::Drag).await.unwrap_err();
            assert!(matches!(err, SessionError::Closed));
        });
    }
}
