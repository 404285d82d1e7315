pub mod cable;
pub mod devices;
pub mod route;

pub use cable::{CableManager, CableProvisioner};
pub use devices::{
    resolve_capture_devices, AudioDevice, DeviceDirectory, Direction, PowershellDeviceDirectory,
    Role,
};
pub use route::{plan, AudioInput, AudioSource, CABLE_CAPTURE_DEVICE};
