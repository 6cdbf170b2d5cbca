//! Operator event markers
//!
//! Each command sets the session's event tag; the tag sticks to every reading
//! that arrives until the next command. Commands are not validated against
//! each other, the last one wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator-triggered event commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventCommand {
    /// Heater switched on
    Heater,
    /// Cooler switched on
    Cooler,
    /// Window opened
    WindowOpen,
    /// Door opened
    DoorOpen,
    /// Door closed
    DoorClose,
    /// Camera switched on
    CameraOn,
    /// Camera switched off
    CameraOff,
    /// Start the test clock
    StartTest,
    /// Stop the test clock
    StopTest,
    /// Clear the current tag
    Clear,
}

impl EventCommand {
    /// Every command, in the order a control panel lists them
    pub const ALL: [EventCommand; 10] = [
        EventCommand::Heater,
        EventCommand::Cooler,
        EventCommand::WindowOpen,
        EventCommand::DoorOpen,
        EventCommand::DoorClose,
        EventCommand::CameraOn,
        EventCommand::CameraOff,
        EventCommand::StartTest,
        EventCommand::StopTest,
        EventCommand::Clear,
    ];

    /// Tag written into readings while this command is active
    pub fn tag(&self) -> &'static str {
        match self {
            EventCommand::Heater => "HEATER_ON",
            EventCommand::Cooler => "COOLER_ON",
            EventCommand::WindowOpen => "WINDOW_OPEN",
            EventCommand::DoorOpen => "DOOR_OPEN",
            EventCommand::DoorClose => "DOOR_CLOSE",
            EventCommand::CameraOn => "CAMERA_ON",
            EventCommand::CameraOff => "CAMERA_OFF",
            EventCommand::StartTest => "TEST_START",
            EventCommand::StopTest => "TEST_STOP",
            EventCommand::Clear => "",
        }
    }

    /// Operator-facing command name
    pub fn name(&self) -> &'static str {
        match self {
            EventCommand::Heater => "heater",
            EventCommand::Cooler => "cooler",
            EventCommand::WindowOpen => "window-open",
            EventCommand::DoorOpen => "door-open",
            EventCommand::DoorClose => "door-close",
            EventCommand::CameraOn => "camera-on",
            EventCommand::CameraOff => "camera-off",
            EventCommand::StartTest => "start-test",
            EventCommand::StopTest => "stop-test",
            EventCommand::Clear => "clear",
        }
    }
}

impl fmt::Display for EventCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned for an unknown command name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown event command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for EventCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        EventCommand::ALL
            .into_iter()
            .find(|cmd| cmd.name() == normalized)
            .ok_or_else(|| UnknownCommand(s.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_names() {
        assert_eq!("heater".parse(), Ok(EventCommand::Heater));
        assert_eq!("Door-Open".parse(), Ok(EventCommand::DoorOpen));
        assert_eq!("start_test".parse(), Ok(EventCommand::StartTest));
        assert_eq!(" clear ".parse(), Ok(EventCommand::Clear));
        assert_eq!(
            "launch".parse::<EventCommand>(),
            Err(UnknownCommand("launch".to_string()))
        );
    }

    #[test]
    fn test_names_round_trip() {
        for cmd in EventCommand::ALL {
            assert_eq!(cmd.name().parse(), Ok(cmd));
        }
    }

    #[test]
    fn test_only_clear_has_empty_tag() {
        for cmd in EventCommand::ALL {
            assert_eq!(cmd.tag().is_empty(), cmd == EventCommand::Clear);
        }
    }
}
