use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use screenrec::audio::{
    plan, resolve_capture_devices, CableManager, CableProvisioner, DeviceDirectory, Direction,
    PowershellDeviceDirectory,
};
use screenrec::encoder::build_capture_command;
use screenrec::error::RecorderError;
use screenrec::flash::ScreenFlash;
use screenrec::hotkeys::GlobalHotkeys;
use screenrec::lifecycle::{self, CleanupGuard};
use screenrec::postprocess::FfmpegPostProcessor;
use screenrec::session::{
    FfmpegLauncher, RecordingSession, RoutingProvisioner, SessionDeps,
};
use screenrec::{CaptureConfig, Cli, Settings};
use tracing::info;

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    // Teardown must run exactly once no matter how the process ends.
    let cleanup = CleanupGuard::new({
        let manager = CableManager::new();
        move || manager.teardown()
    });
    if cli.system_audio {
        lifecycle::register_console_close_handler(cleanup.clone());
    }
    lifecycle::ensure_elevated();

    let result = run(&cli);
    if let Err(e) = &result {
        eprintln!("ERROR: {e:#}");
    }

    if cli.system_audio {
        cleanup.run();
        if !cli.silently {
            pause();
        }
    }

    if result.is_err() {
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::load("config/screenrec")?;
    let config = CaptureConfig::from_cli(cli, &settings)?;
    let (source, inputs) = plan(cli.system_audio, cli.microphone);

    let directory: Arc<dyn DeviceDirectory> = Arc::new(PowershellDeviceDirectory);
    let devices = resolve_capture_devices(source, directory.as_ref())?;

    // The real speakers must be known before provisioning switches the
    // defaults onto the cable; the repeater routes audio back to them.
    let speaker = if source.uses_system_audio() {
        Some(
            directory
                .get_default(Direction::Render)?
                .ok_or(RecorderError::DeviceNotFound { role: "playback" })?,
        )
    } else {
        None
    };

    info!("screenrec v{}", env!("CARGO_PKG_VERSION"));
    info!("Resolution: {}", config.resolution());
    info!("FPS: {}", config.fps);
    if let Some(s) = &speaker {
        info!("System audio: {}", s.name);
    }
    if source.uses_microphone() {
        // The microphone is always the last capture device in ingestion order.
        if let Some(mic) = devices.last() {
            info!("Microphone: {}", mic);
        }
    }
    info!("Mouse: {}", if config.show_mouse { "Yes" } else { "No" });
    if let Some(d) = config.duration {
        info!("Duration: {}s", d);
    }
    info!("Output file: {}", config.output.display());

    let command = build_capture_command(&settings.ffmpeg_path, &config, &inputs, &devices);

    let provisioner = speaker.map(|s| {
        Arc::new(CableProvisioner {
            manager: CableManager::new(),
            directory: Arc::clone(&directory),
            speaker_name: s.name,
        }) as Arc<dyn RoutingProvisioner>
    });

    let deps = SessionDeps {
        provisioner,
        launcher: Arc::new(FfmpegLauncher),
        hotkeys: Arc::new(GlobalHotkeys),
        flash: Arc::new(ScreenFlash),
        postprocessor: Arc::new(FfmpegPostProcessor::new(settings.ffmpeg_path.clone())),
    };

    let mut session = RecordingSession::new(config, source, command, deps);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(session.run())?;
    Ok(())
}

fn pause() {
    print!("Press Enter to exit...");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}
