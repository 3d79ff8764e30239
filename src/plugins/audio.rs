//! Subprocess-backed audio plugin
//!
//! Each team gets a long-lived worker process (a voice client) supervised by
//! a [`TeamAudioWorker`]: a bounded single-producer command queue feeds the
//! worker, and a one-shot shutdown signal plus a bounded grace period govern
//! teardown. Commands are best-effort and fire-and-forget: a crashed or
//! hanging worker never blocks the plugin bus.

use crate::config::AudioSettings;
use crate::error::{MatchError, Result};
use crate::plugins::bus::MatchPlugin;
use crate::plugins::event::{EventKind, MatchEvent};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Depth of the per-worker command queue; overflow drops commands
const COMMAND_QUEUE_DEPTH: usize = 32;

/// How long a worker gets to exit on its own before being killed
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A command on the worker queue. `Disconnect` is the in-band sentinel that
/// tells the worker to leave its voice channel without exiting.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AudioCommand {
    Play { channel_id: u64, file: PathBuf },
    Disconnect,
}

/// Supervisor for one team's voice-client process.
///
/// `start` spawns the process and the pump task that feeds it; `stop` sends
/// the one-shot shutdown signal. The pump owns the child: after shutdown (or
/// queue closure) it drops the worker's stdin and waits up to
/// [`SHUTDOWN_GRACE`] before hard-killing.
pub struct TeamAudioWorker {
    team_id: u8,
    token: String,
    binary: PathBuf,
    tx: Option<mpsc::Sender<AudioCommand>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TeamAudioWorker {
    pub fn new(team_id: u8, token: impl Into<String>, binary: impl Into<PathBuf>) -> Self {
        Self {
            team_id,
            token: token.into(),
            binary: binary.into(),
            tx: None,
            shutdown: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.tx.is_some()
    }

    /// Sender clone for work that outlives a single dispatch (countdowns)
    pub fn sender(&self) -> Option<mpsc::Sender<AudioCommand>> {
        self.tx.clone()
    }

    pub fn start(&mut self) {
        info!("Starting audio worker for team {}", self.team_id);
        self.stop();

        let child = Command::new(&self.binary)
            .arg("--team")
            .arg(self.team_id.to_string())
            .arg("--token")
            .arg(&self.token)
            .stdin(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!(
                    "Could not spawn audio worker for team {} ({}): {}",
                    self.team_id,
                    self.binary.display(),
                    e
                );
                return;
            }
        };

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(pump_worker(self.team_id, child, rx, shutdown_rx));

        self.tx = Some(tx);
        self.shutdown = Some(shutdown_tx);
        info!("Started audio worker for team {}", self.team_id);
    }

    /// Signal the worker to shut down. Graceful-exit waiting and the hard
    /// kill happen on the pump task, so this never blocks.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.tx = None;
    }

    /// Queue the disconnect sentinel
    pub fn disconnect_voice(&mut self) {
        if self.tx.is_some() {
            self.enqueue(AudioCommand::Disconnect);
        }
    }

    /// Queue a sound cue. Missing files are skipped; a dead worker is
    /// restarted once before the command is dropped.
    pub fn play_sound(&mut self, channel_id: u64, file: &Path) {
        if !file.is_file() {
            info!(
                "Audio worker {} skipping missing file: {}",
                self.team_id,
                file.display()
            );
            return;
        }
        self.enqueue(AudioCommand::Play {
            channel_id,
            file: file.to_path_buf(),
        });
    }

    fn enqueue(&mut self, command: AudioCommand) {
        if self.tx.is_none() {
            self.start();
        }
        let Some(tx) = self.tx.as_ref() else {
            warn!(
                "Audio worker {} unavailable, dropping {:?}",
                self.team_id, command
            );
            return;
        };
        match tx.try_send(command) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(cmd)) => {
                warn!("Audio worker {} queue full, dropping {:?}", self.team_id, cmd);
            }
            Err(mpsc::error::TrySendError::Closed(cmd)) => {
                // Worker died; restart and retry once.
                warn!("Audio worker {} is gone, restarting", self.team_id);
                self.start();
                if let Some(tx) = self.tx.as_ref() {
                    if tx.try_send(cmd).is_err() {
                        warn!("Audio worker {} still unavailable", self.team_id);
                    }
                }
            }
        }
    }
}

/// Feed queued commands to the worker's stdin until shutdown, then grant the
/// grace period and kill if it is exceeded.
async fn pump_worker(
    team_id: u8,
    mut child: Child,
    mut rx: mpsc::Receiver<AudioCommand>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut stdin = child.stdin.take();
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            command = rx.recv() => {
                let Some(command) = command else { break };
                let Some(pipe) = stdin.as_mut() else { continue };
                let mut line = match serde_json::to_vec(&command) {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Audio worker {} command encode failed: {}", team_id, e);
                        continue;
                    }
                };
                line.push(b'\n');
                if let Err(e) = pipe.write_all(&line).await {
                    warn!("Audio worker {} rejected command: {}", team_id, e);
                }
            }
        }
    }

    // EOF on stdin tells the worker to wind down.
    drop(stdin);
    match timeout(SHUTDOWN_GRACE, child.wait()).await {
        Ok(Ok(status)) => debug!("Audio worker {} exited: {}", team_id, status),
        Ok(Err(e)) => warn!("Audio worker {} wait failed: {}", team_id, e),
        Err(_) => {
            warn!("Audio worker {} did not exit in time, killing", team_id);
            let _ = child.kill().await;
        }
    }
}

/// Plays sound cues into each team's voice channel as the match progresses
pub struct AudioPlugin {
    settings: AudioSettings,
    workers: [TeamAudioWorker; 2],
}

impl AudioPlugin {
    /// Construct and start both workers. Fails with `PluginDisabled` when
    /// either bot token is missing, which the bus catches and logs.
    pub fn create(settings: &AudioSettings) -> Result<Box<dyn MatchPlugin>> {
        if settings.team_1_token.is_empty() || settings.team_2_token.is_empty() {
            return Err(MatchError::PluginDisabled {
                reason: "missing audio bot token".to_string(),
            }
            .into());
        }
        let mut plugin = AudioPlugin {
            settings: settings.clone(),
            workers: [
                TeamAudioWorker::new(1, &settings.team_1_token, &settings.worker_binary),
                TeamAudioWorker::new(2, &settings.team_2_token, &settings.worker_binary),
            ],
        };
        for worker in plugin.workers.iter_mut() {
            worker.start();
        }
        Ok(Box::new(plugin))
    }

    fn sound(&self, name: &str) -> Option<PathBuf> {
        self.settings.sounds.get(name).cloned()
    }

    /// Cue played into the shared lobby channel, by team 1's worker
    fn play_lobby(&mut self, name: &str) {
        let Some(file) = self.sound(name) else {
            debug!("No sound configured for '{}'", name);
            return;
        };
        let channel = self.settings.lobby_channel;
        self.workers[0].play_sound(channel, &file);
    }

    /// Cue played into both team channels
    fn play_all(&mut self, name: &str) {
        let Some(file) = self.sound(name) else {
            debug!("No sound configured for '{}'", name);
            return;
        };
        let channels = [self.settings.team_1_channel, self.settings.team_2_channel];
        for (worker, channel) in self.workers.iter_mut().zip(channels) {
            worker.play_sound(channel, &file);
        }
    }

    /// Long-running countdown cues are handed off to their own task so the
    /// bus is never blocked.
    fn schedule_countdown(&mut self) {
        let steps: Vec<(u64, PathBuf)> = [("starts_in_30", 0), ("starts_in_10", 20), ("starts_in_5", 5)]
            .iter()
            .filter_map(|(name, delay)| self.sound(name).map(|file| (*delay, file)))
            .collect();
        let targets: Vec<(mpsc::Sender<AudioCommand>, u64)> = self
            .workers
            .iter()
            .zip([self.settings.team_1_channel, self.settings.team_2_channel])
            .filter_map(|(worker, channel)| worker.sender().map(|tx| (tx, channel)))
            .collect();
        if steps.is_empty() || targets.is_empty() {
            return;
        }
        tokio::spawn(async move {
            for (delay, file) in steps {
                if delay > 0 {
                    sleep(Duration::from_secs(delay)).await;
                }
                for (tx, channel) in &targets {
                    let _ = tx.try_send(AudioCommand::Play {
                        channel_id: *channel,
                        file: file.clone(),
                    });
                }
            }
        });
    }
}

/// Cue key for a faction pick ("team_1_picked_nc_faction")
fn faction_cue(team: crate::types::TeamId, faction: crate::types::Faction) -> String {
    format!("team_{}_picked_{}_faction", team.number(), faction.tag())
}

/// Cue key for a specific base pick ("picked_base_chac")
fn base_cue(base: &str) -> String {
    format!("picked_base_{}", base)
}

#[async_trait]
impl MatchPlugin for AudioPlugin {
    fn subscriptions(&self) -> Vec<EventKind> {
        vec![
            EventKind::MatchLaunching,
            EventKind::CaptainsSelected,
            EventKind::TeamsDone,
            EventKind::FactionPick,
            EventKind::FactionsPicked,
            EventKind::BaseSelected,
            EventKind::TeamReady,
            EventKind::MatchStarting,
            EventKind::RoundOver,
            EventKind::MatchOver,
        ]
    }

    fn handle(&mut self, event: &MatchEvent) -> Result<()> {
        match event {
            MatchEvent::MatchLaunching => self.play_lobby("lobby_ready"),
            MatchEvent::CaptainsSelected => self.play_lobby("select_teams"),
            MatchEvent::TeamsDone => self.play_lobby("select_factions"),
            MatchEvent::FactionPick { team, faction } => {
                self.play_lobby(&faction_cue(*team, *faction));
            }
            MatchEvent::FactionsPicked { base } => {
                if base.is_none() {
                    self.play_lobby("select_base");
                }
            }
            MatchEvent::BaseSelected { base } => {
                self.play_all("base_selected");
                let specific = base_cue(base);
                if self.settings.sounds.contains_key(&specific) {
                    self.play_all(&specific);
                } else {
                    self.play_all("unknown_base");
                }
                self.play_all("ready_prompt");
            }
            MatchEvent::TeamReady { team } => {
                self.play_all(&format!("team_{}_ready", team.number()));
            }
            MatchEvent::MatchStarting => self.schedule_countdown(),
            MatchEvent::RoundOver { switch_sides, .. } => {
                self.play_all("round_over");
                if *switch_sides {
                    self.play_all("switch_sides");
                    self.play_all("ready_prompt");
                }
            }
            MatchEvent::MatchOver => {
                self.play_all("match_over");
                for worker in self.workers.iter_mut() {
                    worker.disconnect_voice();
                }
            }
            MatchEvent::PlayerSub { .. } => {}
        }
        Ok(())
    }

    async fn async_clean(&mut self) -> Result<()> {
        for worker in self.workers.iter_mut() {
            worker.disconnect_voice();
            worker.stop();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Faction, TeamId};

    fn test_settings() -> AudioSettings {
        AudioSettings {
            team_1_token: "token-1".to_string(),
            team_2_token: "token-2".to_string(),
            worker_binary: PathBuf::from("cat"),
            lobby_channel: 100,
            team_1_channel: 101,
            team_2_channel: 102,
            sounds: Default::default(),
        }
    }

    #[test]
    fn test_cue_keys() {
        assert_eq!(
            faction_cue(TeamId::One, Faction::NC),
            "team_1_picked_nc_faction"
        );
        assert_eq!(
            faction_cue(TeamId::Two, Faction::TR),
            "team_2_picked_tr_faction"
        );
        assert_eq!(base_cue("chac"), "picked_base_chac");
    }

    #[test]
    fn test_plugin_disabled_without_tokens() {
        let mut settings = test_settings();
        settings.team_2_token = String::new();
        let err = AudioPlugin::create(&settings).err().unwrap();
        let err = err.downcast::<MatchError>().unwrap();
        assert!(matches!(err, MatchError::PluginDisabled { .. }));
    }

    #[tokio::test]
    async fn test_worker_start_stop() {
        let mut worker = TeamAudioWorker::new(1, "token", "cat");
        assert!(!worker.is_running());

        worker.start();
        assert!(worker.is_running());

        worker.disconnect_voice();
        worker.stop();
        assert!(!worker.is_running());
    }

    #[tokio::test]
    async fn test_worker_tolerates_missing_binary() {
        let mut worker = TeamAudioWorker::new(2, "token", "/nonexistent/voice-client");
        worker.start();
        assert!(!worker.is_running());

        // Best-effort: enqueueing against a dead worker must not panic
        worker.play_sound(42, Path::new("/nonexistent/sound.wav"));
        worker.stop();
    }

    #[tokio::test]
    async fn test_missing_sound_file_is_skipped() {
        let mut worker = TeamAudioWorker::new(1, "token", "cat");
        worker.start();
        // File does not exist, so nothing is queued and nothing panics.
        worker.play_sound(42, Path::new("/nonexistent/sound.wav"));
        worker.stop();
    }
}
