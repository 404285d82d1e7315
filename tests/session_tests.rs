// Session state machine tests driven against scripted collaborators:
// no real FFmpeg, hotkeys, or audio driver involved.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use screenrec::audio::plan;
use screenrec::config::CaptureConfig;
use screenrec::encoder::{build_capture_command, EncoderCommand};
use screenrec::error::RecorderError;
use screenrec::flash::FlashSignal;
use screenrec::hotkeys::HotkeySource;
use screenrec::postprocess::{OutputArtifact, PostProcessor};
use screenrec::session::{
    EncoderLauncher, EncoderProcess, RecordingSession, RoutingProvisioner, SessionDeps,
    SessionState, SessionTiming,
};

#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<&'static str>>>);

impl EventLog {
    fn push(&self, event: &'static str) {
        self.0.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| **e == event).count()
    }

    fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| *e == event)
    }
}

struct FakeProvisioner {
    log: EventLog,
}

#[async_trait::async_trait]
impl RoutingProvisioner for FakeProvisioner {
    async fn provision(&self) -> Result<(), RecorderError> {
        // Simulate the driver install taking real time.
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.log.push("provision");
        Ok(())
    }
}

/// Start fires immediately. Stop either fires immediately or errors the
/// test if the session consults it on a duration-bounded run.
struct FakeHotkeys {
    log: EventLog,
    stop_allowed: bool,
}

#[async_trait::async_trait]
impl HotkeySource for FakeHotkeys {
    async fn wait_start(&self) -> Result<()> {
        self.log.push("start-hotkey");
        Ok(())
    }

    async fn wait_stop(&self) -> Result<()> {
        if !self.stop_allowed {
            anyhow::bail!("stop hotkey must not be consulted on a duration-bounded session");
        }
        self.log.push("stop-hotkey");
        Ok(())
    }
}

struct FakeFlash {
    log: EventLog,
}

impl FlashSignal for FakeFlash {
    fn fire(&self) {
        self.log.push("flash");
    }
}

struct FakeProcess {
    log: EventLog,
    stopped: Arc<tokio::sync::Notify>,
    /// When true the process only exits after a stop command (unbounded
    /// session); when false it exits on its own (duration bound).
    exits_on_stop: bool,
}

#[async_trait::async_trait]
impl EncoderProcess for FakeProcess {
    async fn send_stop(&mut self) -> Result<()> {
        self.log.push("send-stop");
        self.stopped.notify_one();
        Ok(())
    }

    async fn wait(&mut self) -> Result<bool> {
        if self.exits_on_stop {
            self.stopped.notified().await;
        }
        self.log.push("exited");
        Ok(true)
    }
}

struct FakeLauncher {
    log: EventLog,
    output: PathBuf,
    creates_file: bool,
    exits_on_stop: bool,
}

#[async_trait::async_trait]
impl EncoderLauncher for FakeLauncher {
    async fn launch(
        &self,
        _command: &EncoderCommand,
    ) -> Result<Box<dyn EncoderProcess>, RecorderError> {
        self.log.push("spawn");
        if self.creates_file {
            let output = self.output.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                let _ = tokio::fs::write(&output, b"raw").await;
            });
        }
        Ok(Box::new(FakeProcess {
            log: self.log.clone(),
            stopped: Arc::new(tokio::sync::Notify::new()),
            exits_on_stop: self.exits_on_stop,
        }))
    }
}

struct FakePostProcessor {
    log: EventLog,
    fail: bool,
}

#[async_trait::async_trait]
impl PostProcessor for FakePostProcessor {
    async fn finalize(&self, path: &std::path::Path) -> Result<OutputArtifact, RecorderError> {
        self.log.push("finalize");
        if self.fail {
            return Err(RecorderError::Probe {
                path: path.to_path_buf(),
            });
        }
        Ok(OutputArtifact {
            path: path.to_path_buf(),
            duration_secs: 10.0,
        })
    }
}

struct Scenario {
    system_audio: bool,
    microphone: bool,
    duration: Option<u32>,
    creates_file: bool,
    with_provisioner: bool,
    failing_postprocess: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            system_audio: false,
            microphone: false,
            duration: None,
            creates_file: true,
            with_provisioner: false,
            failing_postprocess: false,
        }
    }
}

fn test_timing() -> SessionTiming {
    SessionTiming {
        poll_interval: Duration::from_millis(5),
        spawn_timeout: Duration::from_millis(300),
        start_grace: Duration::from_millis(5),
    }
}

fn build_session(scenario: Scenario, output: PathBuf, log: EventLog) -> RecordingSession {
    let (source, inputs) = plan(scenario.system_audio, scenario.microphone);
    let devices: Vec<String> = inputs
        .iter()
        .map(|i| format!("device-{}", i.input_index))
        .collect();

    let config = CaptureConfig {
        width: 1920,
        height: 1080,
        fps: 15,
        show_mouse: false,
        duration: scenario.duration,
        output: output.clone(),
    };
    let command = build_capture_command("ffmpeg", &config, &inputs, &devices);

    let deps = SessionDeps {
        provisioner: scenario
            .with_provisioner
            .then(|| Arc::new(FakeProvisioner { log: log.clone() }) as Arc<dyn RoutingProvisioner>),
        launcher: Arc::new(FakeLauncher {
            log: log.clone(),
            output,
            creates_file: scenario.creates_file,
            exits_on_stop: scenario.duration.is_none(),
        }),
        hotkeys: Arc::new(FakeHotkeys {
            log: log.clone(),
            stop_allowed: scenario.duration.is_none(),
        }),
        flash: Arc::new(FakeFlash { log: log.clone() }),
        postprocessor: Arc::new(FakePostProcessor {
            log: log.clone(),
            fail: scenario.failing_postprocess,
        }),
    };

    RecordingSession::new(config, source, command, deps).with_timing(test_timing())
}

fn output_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("out.mp4")
}

#[tokio::test]
async fn test_duration_path_completes_without_stop_hotkey() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = EventLog::default();
    let mut session = build_session(
        Scenario {
            duration: Some(5),
            ..Scenario::default()
        },
        output_path(&dir),
        log.clone(),
    );

    session.run().await?;

    assert_eq!(session.state(), SessionState::Done);
    assert_eq!(log.count("send-stop"), 0, "duration path must not send a stop command");
    assert_eq!(log.count("stop-hotkey"), 0);
    assert_eq!(log.count("finalize"), 1);
    Ok(())
}

#[tokio::test]
async fn test_hotkey_path_sends_stop_exactly_once() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = EventLog::default();
    let mut session = build_session(Scenario::default(), output_path(&dir), log.clone());

    session.run().await?;

    assert_eq!(session.state(), SessionState::Done);
    assert_eq!(log.count("send-stop"), 1);
    assert!(
        log.position("stop-hotkey").unwrap() < log.position("send-stop").unwrap(),
        "stop command follows the stop hotkey"
    );
    Ok(())
}

#[tokio::test]
async fn test_provisioning_completes_before_armed() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = EventLog::default();
    let mut session = build_session(
        Scenario {
            system_audio: true,
            duration: Some(5),
            with_provisioner: true,
            ..Scenario::default()
        },
        output_path(&dir),
        log.clone(),
    );

    session.run().await?;

    // The ready flash (entering Armed) and the start hotkey both come
    // strictly after provisioning finished.
    let provision = log.position("provision").expect("provision ran");
    assert!(provision < log.position("flash").unwrap());
    assert!(provision < log.position("start-hotkey").unwrap());
    Ok(())
}

#[tokio::test]
async fn test_provisioning_skipped_without_system_audio() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = EventLog::default();
    let mut session = build_session(
        Scenario {
            microphone: true,
            duration: Some(5),
            with_provisioner: true,
            ..Scenario::default()
        },
        output_path(&dir),
        log.clone(),
    );

    session.run().await?;

    assert_eq!(log.count("provision"), 0);
    Ok(())
}

#[tokio::test]
async fn test_spawn_timeout_fails_session() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = EventLog::default();
    let mut session = build_session(
        Scenario {
            duration: Some(5),
            creates_file: false,
            ..Scenario::default()
        },
        output_path(&dir),
        log.clone(),
    );

    let err = session.run().await.unwrap_err();

    assert!(err.to_string().contains("no output file"), "got: {err}");
    assert_eq!(session.state(), SessionState::Failed);
    // The child is still awaited before the session gives up.
    assert_eq!(log.count("exited"), 1);
    assert_eq!(log.count("finalize"), 0);
    Ok(())
}

#[tokio::test]
async fn test_postprocess_failure_fails_session() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = EventLog::default();
    let mut session = build_session(
        Scenario {
            duration: Some(5),
            failing_postprocess: true,
            ..Scenario::default()
        },
        output_path(&dir),
        log.clone(),
    );

    let err = session.run().await.unwrap_err();

    assert!(err.to_string().contains("duration"), "got: {err}");
    assert_eq!(session.state(), SessionState::Failed);
    Ok(())
}

#[tokio::test]
async fn test_session_is_not_reentrant() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = EventLog::default();
    let mut session = build_session(Scenario::default(), output_path(&dir), log.clone());

    session.run().await?;
    assert_eq!(session.state(), SessionState::Done);

    let err = session.run().await.unwrap_err();
    assert!(err.to_string().contains("illegal session transition"), "got: {err}");
    Ok(())
}
