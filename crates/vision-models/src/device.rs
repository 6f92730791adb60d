//! Compute device selection.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Compute backend reported with every inference result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// NVIDIA GPU.
    Cuda,
    /// Apple Metal Performance Shaders.
    Mps,
    /// Generic processor.
    Cpu,
}

impl Device {
    /// Pick the first available backend: `cuda`, then `mps`, then `cpu`.
    pub fn select(probe: &dyn DeviceProbe) -> Self {
        if probe.cuda_available() {
            Self::Cuda
        } else if probe.mps_available() {
            Self::Mps
        } else {
            Self::Cpu
        }
    }

    /// Lowercase name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::Mps => "mps",
            Self::Cpu => "cpu",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accelerator availability checks.
pub trait DeviceProbe: Send + Sync {
    /// Whether a CUDA-capable GPU is usable.
    fn cuda_available(&self) -> bool;

    /// Whether the Metal (MPS) backend is usable.
    fn mps_available(&self) -> bool;
}

/// Probe backed by the host operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl DeviceProbe for SystemProbe {
    fn cuda_available(&self) -> bool {
        // CUDA_VISIBLE_DEVICES="" or "-1" hides every GPU from the process.
        if let Ok(visible) = std::env::var("CUDA_VISIBLE_DEVICES") {
            let visible = visible.trim();
            if visible.is_empty() || visible == "-1" {
                return false;
            }
        }

        Path::new("/dev/nvidiactl").exists() || Path::new("/proc/driver/nvidia/version").exists()
    }

    fn mps_available(&self) -> bool {
        cfg!(all(target_os = "macos", target_arch = "aarch64"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe {
        cuda: bool,
        mps: bool,
    }

    impl DeviceProbe for FixedProbe {
        fn cuda_available(&self) -> bool {
            self.cuda
        }

        fn mps_available(&self) -> bool {
            self.mps
        }
    }

    #[test]
    fn test_select_prefers_cuda() {
        let probe = FixedProbe { cuda: true, mps: true };
        assert_eq!(Device::select(&probe), Device::Cuda);
    }

    #[test]
    fn test_select_falls_back_to_mps() {
        let probe = FixedProbe { cuda: false, mps: true };
        assert_eq!(Device::select(&probe), Device::Mps);
    }

    #[test]
    fn test_select_defaults_to_cpu() {
        let probe = FixedProbe { cuda: false, mps: false };
        assert_eq!(Device::select(&probe), Device::Cpu);
    }

    #[test]
    fn test_device_serialization() {
        assert_eq!(serde_json::to_string(&Device::Cuda).unwrap(), "\"cuda\"");
        assert_eq!(Device::Mps.to_string(), "mps");
    }
}
