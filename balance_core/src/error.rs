use std::fmt;

/// Errors surfaced by the simulation core.
///
/// Configuration and programmer errors (`InvalidTimestep`, `InvalidBodyParameters`,
/// `CaptureZoneMisconfigured`, `InvalidConfig`) are fatal where they occur and are never
/// silently clamped. `SensorUnavailable` is reported by pose sources; the control loop
/// logs it and carries on as if nothing was detected.
#[derive(Clone, Debug, PartialEq)]
pub enum SimError {
    SensorUnavailable(String),
    InvalidTimestep(f32),
    InvalidBodyParameters(String),
    CaptureZoneMisconfigured(String),
    InvalidConfig(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorUnavailable(reason) => write!(f, "pose sensor unavailable: {reason}"),
            Self::InvalidTimestep(dt) => {
                write!(f, "invalid timestep {dt}: must be finite and positive")
            }
            Self::InvalidBodyParameters(reason) => write!(f, "invalid body parameters: {reason}"),
            Self::CaptureZoneMisconfigured(reason) => {
                write!(f, "capture zone misconfigured: {reason}")
            }
            Self::InvalidConfig(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_value() {
        let msg = SimError::InvalidTimestep(-0.5).to_string();
        assert!(msg.contains("-0.5"));

        let msg = SimError::CaptureZoneMisconfigured("max_x 900 exceeds width 800".into());
        assert!(msg.to_string().contains("900"));
    }
}
