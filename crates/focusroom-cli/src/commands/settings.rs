use clap::Subcommand;
use focusroom_core::{SettingsPatch, SoundId};
use serde_json::Value;

use super::{open_session, print_json, Access, CmdResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the session settings as JSON
    Show,
    /// Update one setting (e.g. "workDuration 1800", "workEndSound bell")
    Set {
        /// Setting name as shown by `settings show`
        key: String,
        /// New value
        value: String,
    },
    /// List the available notification sounds
    Sounds,
}

pub fn run(action: SettingsAction) -> CmdResult {
    match action {
        SettingsAction::Show => {
            let (_, _, session) = open_session(Access::Read)?;
            print_json(session.settings())?;
        }
        SettingsAction::Set { key, value } => {
            let patch = parse_patch(&key, &value)?;
            let (_lock, _, mut session) = open_session(Access::Write)?;
            session.update_settings(patch);
            session.flush();
            print_json(session.settings())?;
        }
        SettingsAction::Sounds => print_json(&SoundId::ALL)?,
    }
    Ok(())
}

fn parse_patch(key: &str, value: &str) -> Result<SettingsPatch, Box<dyn std::error::Error>> {
    let value = if key.ends_with("Sound") {
        serde_json::to_value(value.parse::<SoundId>()?)?
    } else {
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
    };

    let mut obj = serde_json::Map::new();
    obj.insert(key.to_string(), value);
    let patch: SettingsPatch = serde_json::from_value(Value::Object(obj))
        .map_err(|e| format!("invalid value for {key}: {e}"))?;
    if patch.is_empty() {
        return Err(format!("unknown setting: {key}").into());
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_sound_settings() {
        let patch = parse_patch("workDuration", "1800").unwrap();
        assert_eq!(patch.work_duration, Some(1800));

        let patch = parse_patch("breakEndSound", "bell").unwrap();
        assert_eq!(patch.break_end_sound, Some(SoundId::Bell));

        let patch = parse_patch("soundEnabled", "false").unwrap();
        assert_eq!(patch.sound_enabled, Some(false));
    }

    #[test]
    fn rejects_unknown_or_mistyped_settings() {
        assert!(parse_patch("colour", "blue").is_err());
        assert!(parse_patch("workDuration", "soon").is_err());
        assert!(parse_patch("workEndSound", "kazoo").is_err());
    }
}
