//! Session arbitration type definitions
//!
//! Consumer identities and the platform signals relayed by the arbiter.

use serde::{Deserialize, Serialize};

/// Logical holder of the shared hardware audio session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consumer {
    /// Foreground narrated-book player
    Playback,
    /// Voice-memo recorder
    Recording,
    /// Ambient background loop (white noise), owned outside the core
    AmbientLoop,
}

impl std::fmt::Display for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Consumer::Playback => write!(f, "playback"),
            Consumer::Recording => write!(f, "recording"),
            Consumer::AmbientLoop => write!(f, "ambient_loop"),
        }
    }
}

/// Audio interruption phase (phone call, alarm, another app taking audio)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionKind {
    Began,
    EndedShouldResume,
    EndedShouldNotResume,
}

/// Audio route change reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteChangeKind {
    /// Previous output disappeared (headphones unplugged, bluetooth dropped)
    OldDeviceUnavailable,
    Other,
}

/// Application lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    EnteredBackground,
    EnteredForeground,
    WillTerminate,
}

/// Inbound notification from the platform audio subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformSignal {
    Interruption { kind: InterruptionKind },
    RouteChange { kind: RouteChangeKind },
    Lifecycle { kind: LifecycleKind },
}

/// Session-level notification re-published by the arbiter to its subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    Interruption(InterruptionKind),
    RouteChange(RouteChangeKind),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_ordering_is_stable() {
        let mut consumers = vec![Consumer::AmbientLoop, Consumer::Playback, Consumer::Recording];
        consumers.sort();
        assert_eq!(
            consumers,
            vec![Consumer::Playback, Consumer::Recording, Consumer::AmbientLoop]
        );
    }

    #[test]
    fn test_platform_signal_json_shape() {
        let json = r#"{"type":"interruption","kind":"ended_should_resume"}"#;
        let signal: PlatformSignal = serde_json::from_str(json).unwrap();
        assert_eq!(
            signal,
            PlatformSignal::Interruption {
                kind: InterruptionKind::EndedShouldResume
            }
        );

        let json = r#"{"type":"route_change","kind":"old_device_unavailable"}"#;
        let signal: PlatformSignal = serde_json::from_str(json).unwrap();
        assert_eq!(
            signal,
            PlatformSignal::RouteChange {
                kind: RouteChangeKind::OldDeviceUnavailable
            }
        );
    }

    #[test]
    fn test_consumer_display() {
        assert_eq!(Consumer::AmbientLoop.to_string(), "ambient_loop");
    }
}
