//! Phase-end notifications.
//!
//! Playback itself lives outside the core. The session only decides *whether*
//! a sound should be played and *which* one, then hands that to a [`Notifier`].

use serde::{Deserialize, Serialize};

/// Which boundary was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyEvent {
    WorkEnd,
    BreakEnd,
}

/// Built-in sound catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoundId {
    None,
    Beep,
    Default,
    Alert,
    Warning,
    Digital,
    Bird,
    Alarm,
    Music,
    Drop,
    Bell,
    Horn,
}

impl SoundId {
    pub const ALL: [SoundId; 12] = [
        SoundId::None,
        SoundId::Beep,
        SoundId::Default,
        SoundId::Alert,
        SoundId::Warning,
        SoundId::Digital,
        SoundId::Bird,
        SoundId::Alarm,
        SoundId::Music,
        SoundId::Drop,
        SoundId::Bell,
        SoundId::Horn,
    ];

    pub fn is_silent(self) -> bool {
        self == SoundId::None
    }
}

impl std::str::FromStr for SoundId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_ascii_uppercase()))
            .map_err(|_| format!("unknown sound: {s}"))
    }
}

/// Receiver for phase-end notifications (audio, desktop toast, ...).
pub trait Notifier: Send {
    fn notify(&self, event: NotifyEvent, sound: SoundId);
}

/// Default notifier: records the notification in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: NotifyEvent, sound: SoundId) {
        tracing::info!(?event, ?sound, "phase notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_ids_parse_case_insensitively() {
        assert_eq!("alarm".parse::<SoundId>().unwrap(), SoundId::Alarm);
        assert_eq!("NONE".parse::<SoundId>().unwrap(), SoundId::None);
        assert!("kazoo".parse::<SoundId>().is_err());
    }

    #[test]
    fn sound_ids_serialize_screaming() {
        assert_eq!(serde_json::to_string(&SoundId::Default).unwrap(), "\"DEFAULT\"");
        assert_eq!(
            serde_json::to_string(&NotifyEvent::BreakEnd).unwrap(),
            "\"BREAK_END\""
        );
    }
}
