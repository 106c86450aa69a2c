//! Looped playback of rendered artifacts
//!
//! Each artifact gets its own thread that repeatedly spawns the synthesis
//! engine on it. All loops of a session share one [`CancellationToken`];
//! stopping cancels the token, terminates whatever process each loop is
//! tracking and joins the threads.

use super::engine::SynthEngine;
use crate::config::{LoopMode, PlaybackConfig};
use crate::error::HarmonyError;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Process slot shared between a loop thread and the orchestrator
type Slot = Arc<Mutex<Option<Child>>>;

/// Why a playback loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// The stop token was cancelled
    Cancelled,
    /// The engine exited unsuccessfully
    Crashed(String),
    /// The engine could not be started
    SpawnFailed(String),
}

/// Result of [`Orchestrator::stop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    /// A session was stopped
    Stopped {
        /// Processes that were still running and had to be terminated
        terminated: usize,
    },
    /// No session was active
    NothingToStop,
}

struct PlaybackLoop {
    label: String,
    slot: Slot,
    handle: JoinHandle<LoopExit>,
}

struct PlaybackSession {
    token: CancellationToken,
    loops: Vec<PlaybackLoop>,
}

/// Runs one looping playback per artifact and stops them together
pub struct Orchestrator<E: SynthEngine> {
    engine: Arc<E>,
    config: PlaybackConfig,
    session: Option<PlaybackSession>,
}

impl<E: SynthEngine> Orchestrator<E> {
    /// Create an idle orchestrator
    pub fn new(engine: E, config: PlaybackConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            config,
            session: None,
        }
    }

    /// True while a session exists and at least one of its loops is running
    pub fn is_playing(&self) -> bool {
        self.session.as_ref().is_some_and(|session| {
            !session.token.is_cancelled()
                && session.loops.iter().any(|lp| !lp.handle.is_finished())
        })
    }

    /// Start looping `beat` and `progression` concurrently
    ///
    /// An active session is stopped first.
    ///
    /// # Errors
    ///
    /// Returns `HarmonyError::InvalidInput` ("Missing music files.") if either
    /// artifact does not exist, or `HarmonyError::Playback` if a loop thread
    /// could not be started
    pub fn play(&mut self, beat: &Path, progression: &Path) -> Result<(), HarmonyError> {
        self.play_all(&[("beat", beat), ("progression", progression)])
    }

    /// Start one loop per `(label, artifact)` pair
    pub fn play_all(&mut self, artifacts: &[(&str, &Path)]) -> Result<(), HarmonyError> {
        if artifacts.is_empty() || artifacts.iter().any(|(_, path)| !path.is_file()) {
            return Err(HarmonyError::InvalidInput("Missing music files.".to_string()));
        }

        if self.session.is_some() {
            log::info!("Playback already active, stopping it first");
            self.stop();
        }

        let token = CancellationToken::new();
        let mut session = PlaybackSession {
            token: token.clone(),
            loops: Vec::with_capacity(artifacts.len()),
        };

        for (label, artifact) in artifacts {
            let slot: Slot = Arc::new(Mutex::new(None));
            let worker = LoopWorker {
                engine: Arc::clone(&self.engine),
                artifact: artifact.to_path_buf(),
                label: label.to_string(),
                slot: Arc::clone(&slot),
                token: token.clone(),
                mode: self.config.loop_mode,
                poll_interval: self.config.poll_interval(),
                grace_period: self.config.grace_period(),
            };

            let spawned = thread::Builder::new()
                .name(format!("playback-{}", label))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => session.loops.push(PlaybackLoop {
                    label: label.to_string(),
                    slot,
                    handle,
                }),
                Err(e) => {
                    // Tear down the loops that did start
                    self.session = Some(session);
                    self.stop();
                    return Err(HarmonyError::Playback(format!(
                        "Failed to start playback thread: {}",
                        e
                    )));
                }
            }
        }

        log::info!(
            "Playback started with {} ({} loops)",
            self.engine.name(),
            session.loops.len()
        );
        self.session = Some(session);
        Ok(())
    }

    /// Stop every loop of the active session
    ///
    /// Idempotent: with nothing playing this returns
    /// [`StopStatus::NothingToStop`]. That includes a session whose loops
    /// have all ended on their own; their threads are still joined.
    pub fn stop(&mut self) -> StopStatus {
        let Some(session) = self.session.take() else {
            return StopStatus::NothingToStop;
        };

        let live = session
            .loops
            .iter()
            .any(|lp| !lp.handle.is_finished() || lock_slot(&lp.slot).is_some());
        session.token.cancel();

        let grace_period = self.config.grace_period();
        let poll_interval = self.config.poll_interval();
        let mut terminated = 0;
        for lp in &session.loops {
            let child = lock_slot(&lp.slot).take();
            if let Some(child) = child {
                if terminate_child(child, grace_period, poll_interval, &lp.label) {
                    terminated += 1;
                }
            }
        }

        for lp in session.loops {
            match lp.handle.join() {
                Ok(exit) => log::debug!("Playback loop '{}' ended: {:?}", lp.label, exit),
                Err(_) => log::error!("Playback loop '{}' panicked", lp.label),
            }
        }

        if !live {
            log::info!("Playback loops had already ended");
            return StopStatus::NothingToStop;
        }

        log::info!("Playback stopped ({} process(es) terminated)", terminated);
        StopStatus::Stopped { terminated }
    }
}

impl<E: SynthEngine> Drop for Orchestrator<E> {
    fn drop(&mut self) {
        self.stop();
    }
}

struct LoopWorker<E: SynthEngine> {
    engine: Arc<E>,
    artifact: PathBuf,
    label: String,
    slot: Slot,
    token: CancellationToken,
    mode: LoopMode,
    poll_interval: Duration,
    grace_period: Duration,
}

impl<E: SynthEngine> LoopWorker<E> {
    fn run(self) -> LoopExit {
        let mut iteration = 0u64;
        while !self.token.is_cancelled() {
            iteration += 1;
            log::debug!("Loop '{}' iteration {}", self.label, iteration);

            let child = match self.engine.spawn(&self.artifact) {
                Ok(child) => child,
                Err(e) => {
                    log::error!("Loop '{}' could not start playback: {}", self.label, e);
                    return LoopExit::SpawnFailed(e.to_string());
                }
            };

            {
                let mut slot = lock_slot(&self.slot);
                // Stop may have emptied the slots already; it will not see this child
                if self.token.is_cancelled() {
                    drop(slot);
                    terminate_child(child, Duration::ZERO, self.poll_interval, &self.label);
                    return LoopExit::Cancelled;
                }
                *slot = Some(child);
            }

            let outcome = match self.mode {
                LoopMode::WaitForExit => self.wait_for_exit(),
                LoopMode::FixedDelay { delay_ms } => {
                    self.wait_fixed_delay(Duration::from_millis(delay_ms))
                }
            };
            if let Some(exit) = outcome {
                return exit;
            }
        }
        LoopExit::Cancelled
    }

    /// Poll the tracked process until it exits or the token is cancelled
    fn wait_for_exit(&self) -> Option<LoopExit> {
        loop {
            if self.token.is_cancelled() {
                return Some(LoopExit::Cancelled);
            }
            match self.poll_child() {
                ChildState::Running => thread::sleep(self.poll_interval),
                ChildState::Exited => return None,
                ChildState::Gone => return Some(LoopExit::Cancelled),
                ChildState::Failed(exit) => return Some(exit),
            }
        }
    }

    /// Sleep for `delay` in poll-sized chunks, then replace the process if it
    /// is still running
    fn wait_fixed_delay(&self, delay: Duration) -> Option<LoopExit> {
        let deadline = Instant::now() + delay;
        let mut running = true;
        while Instant::now() < deadline {
            if self.token.is_cancelled() {
                return Some(LoopExit::Cancelled);
            }
            if running {
                match self.poll_child() {
                    ChildState::Running => {}
                    ChildState::Exited => running = false,
                    ChildState::Gone => return Some(LoopExit::Cancelled),
                    ChildState::Failed(exit) => return Some(exit),
                }
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            thread::sleep(remaining.min(self.poll_interval));
        }

        if running {
            let child = lock_slot(&self.slot).take();
            if let Some(child) = child {
                terminate_child(child, self.grace_period, self.poll_interval, &self.label);
            }
        }
        None
    }

    fn poll_child(&self) -> ChildState {
        let mut slot = lock_slot(&self.slot);
        let Some(child) = slot.as_mut() else {
            return ChildState::Gone;
        };
        match child.try_wait() {
            Ok(None) => ChildState::Running,
            Ok(Some(status)) => {
                slot.take();
                if status.success() || self.token.is_cancelled() {
                    ChildState::Exited
                } else {
                    log::error!("Loop '{}': playback process failed ({})", self.label, status);
                    ChildState::Failed(LoopExit::Crashed(status.to_string()))
                }
            }
            Err(e) => {
                log::error!("Loop '{}': cannot poll playback process: {}", self.label, e);
                ChildState::Failed(LoopExit::Crashed(e.to_string()))
            }
        }
    }
}

enum ChildState {
    Running,
    Exited,
    Gone,
    Failed(LoopExit),
}

fn lock_slot(slot: &Slot) -> MutexGuard<'_, Option<Child>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Terminate `child`: SIGTERM on Unix, wait up to `grace_period`, then kill
///
/// Returns true if the process was still running when called.
fn terminate_child(
    mut child: Child,
    grace_period: Duration,
    poll_interval: Duration,
    label: &str,
) -> bool {
    if let Ok(Some(_)) = child.try_wait() {
        return false;
    }

    request_exit(&child);

    let deadline = Instant::now() + grace_period;
    while Instant::now() < deadline {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) => thread::sleep(poll_interval.min(deadline.saturating_duration_since(Instant::now()))),
            Err(_) => break,
        }
    }

    if let Ok(None) = child.try_wait() {
        log::warn!("Playback process for '{}' ignored termination, killing it", label);
        if let Err(e) = child.kill() {
            log::warn!("Failed to kill playback process for '{}': {}", label, e);
        }
    }
    if let Err(e) = child.wait() {
        log::warn!("Failed to reap playback process for '{}': {}", label, e);
    }
    true
}

#[cfg(unix)]
fn request_exit(child: &Child) {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: kill(2) only sends a signal; the pid belongs to a child we have not reaped
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        log::debug!(
            "SIGTERM to pid {} failed: {}",
            pid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn request_exit(_child: &Child) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::{Command, Stdio};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Runs `sh -c <script>` regardless of the artifact
    struct ShellEngine {
        script: String,
        spawns: Arc<AtomicUsize>,
    }

    impl ShellEngine {
        fn new(script: &str) -> (Self, Arc<AtomicUsize>) {
            let spawns = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    script: script.to_string(),
                    spawns: Arc::clone(&spawns),
                },
                spawns,
            )
        }
    }

    impl SynthEngine for ShellEngine {
        fn spawn(&self, _artifact: &Path) -> Result<Child, HarmonyError> {
            self.spawns.fetch_add(1, Ordering::SeqCst);
            Command::new("sh")
                .arg("-c")
                .arg(&self.script)
                .stdout(Stdio::null())
                .spawn()
                .map_err(|e| HarmonyError::Playback(e.to_string()))
        }
    }

    fn artifacts() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let beat = dir.path().join("beat.mid");
        let piano = dir.path().join("piano.mid");
        std::fs::write(&beat, b"MThd").unwrap();
        std::fs::write(&piano, b"MThd").unwrap();
        (dir, beat, piano)
    }

    fn fast_config() -> PlaybackConfig {
        PlaybackConfig {
            grace_period_ms: 500,
            poll_interval_ms: 5,
            ..PlaybackConfig::default()
        }
    }

    #[test]
    fn test_stop_with_nothing_playing() {
        let (engine, _) = ShellEngine::new("exit 0");
        let mut orchestrator = Orchestrator::new(engine, fast_config());
        assert_eq!(orchestrator.stop(), StopStatus::NothingToStop);
        assert_eq!(orchestrator.stop(), StopStatus::NothingToStop);
    }

    #[test]
    fn test_missing_files_rejected() {
        let (engine, spawns) = ShellEngine::new("exit 0");
        let mut orchestrator = Orchestrator::new(engine, fast_config());
        let err = orchestrator
            .play(Path::new("/nonexistent/a.mid"), Path::new("/nonexistent/b.mid"))
            .unwrap_err();
        assert_eq!(err, HarmonyError::InvalidInput("Missing music files.".to_string()));
        assert_eq!(spawns.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_long_running_processes_are_terminated() {
        let (_dir, beat, piano) = artifacts();
        let (engine, spawns) = ShellEngine::new("sleep 30");
        let mut orchestrator = Orchestrator::new(engine, fast_config());

        orchestrator.play(&beat, &piano).unwrap();
        let started = Instant::now();
        while spawns.load(Ordering::SeqCst) < 2 && started.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(50));
        assert!(orchestrator.is_playing());

        let stop_started = Instant::now();
        assert_eq!(orchestrator.stop(), StopStatus::Stopped { terminated: 2 });
        assert!(stop_started.elapsed() < Duration::from_secs(5));
        assert!(!orchestrator.is_playing());
        assert_eq!(orchestrator.stop(), StopStatus::NothingToStop);
    }

    #[test]
    fn test_short_processes_loop() {
        let (_dir, beat, piano) = artifacts();
        let (engine, spawns) = ShellEngine::new("exit 0");
        let mut orchestrator = Orchestrator::new(engine, fast_config());

        orchestrator.play(&beat, &piano).unwrap();
        let started = Instant::now();
        while spawns.load(Ordering::SeqCst) < 6 && started.elapsed() < Duration::from_secs(10) {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(spawns.load(Ordering::SeqCst) >= 6, "loops should respawn");
        assert!(matches!(orchestrator.stop(), StopStatus::Stopped { .. }));
    }

    #[test]
    fn test_crashing_engine_ends_loop() {
        let (_dir, beat, piano) = artifacts();
        let (engine, spawns) = ShellEngine::new("exit 3");
        let mut orchestrator = Orchestrator::new(engine, fast_config());

        orchestrator.play(&beat, &piano).unwrap();
        let started = Instant::now();
        while orchestrator.is_playing() && started.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!orchestrator.is_playing());
        // One attempt per loop, no retries
        assert_eq!(spawns.load(Ordering::SeqCst), 2);
        assert_eq!(orchestrator.stop(), StopStatus::NothingToStop);
    }

    #[test]
    fn test_play_while_active_restarts() {
        let (_dir, beat, piano) = artifacts();
        let (engine, spawns) = ShellEngine::new("sleep 30");
        let mut orchestrator = Orchestrator::new(engine, fast_config());

        orchestrator.play(&beat, &piano).unwrap();
        let started = Instant::now();
        while spawns.load(Ordering::SeqCst) < 2 && started.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(spawns.load(Ordering::SeqCst), 2);

        // Replaying terminates the first pair before starting a new one
        orchestrator.play(&beat, &piano).unwrap();
        let started = Instant::now();
        while spawns.load(Ordering::SeqCst) < 4 && started.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(50));
        assert_eq!(spawns.load(Ordering::SeqCst), 4);
        assert!(orchestrator.is_playing());
        assert_eq!(orchestrator.stop(), StopStatus::Stopped { terminated: 2 });
        assert!(!orchestrator.is_playing());
    }

    #[test]
    fn test_fixed_delay_mode_replaces_process() {
        let (_dir, beat, piano) = artifacts();
        let (engine, spawns) = ShellEngine::new("sleep 30");
        let config = PlaybackConfig {
            loop_mode: LoopMode::FixedDelay { delay_ms: 30 },
            ..fast_config()
        };
        let mut orchestrator = Orchestrator::new(engine, config);

        orchestrator.play(&beat, &piano).unwrap();
        let started = Instant::now();
        while spawns.load(Ordering::SeqCst) < 6 && started.elapsed() < Duration::from_secs(10) {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(spawns.load(Ordering::SeqCst) >= 6);
        assert!(matches!(orchestrator.stop(), StopStatus::Stopped { .. }));
    }
}
