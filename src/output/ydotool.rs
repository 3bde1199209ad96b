//! ydotool-based keystroke output
//!
//! Uses ydotool to simulate keyboard input. This works on all Wayland
//! compositors and on X11 because ydotool uses the uinput kernel interface.
//!
//! Requires:
//! - ydotool installed
//! - ydotoold daemon running (systemctl --user start ydotool)
//! - User in 'input' group

use super::{run_tool, tool_available, KeyCommand, KeystrokeSink};
use crate::error::OutputError;
use tokio::process::Command;

// Linux input event codes (KEY_* in input-event-codes.h)
const KEY_ENTER: u16 = 28;
const KEY_BACKSPACE: u16 = 14;
const KEY_LEFTCTRL: u16 = 29;
const KEY_V: u16 = 47;

/// ydotool-based keystroke output
#[derive(Debug, Default)]
pub struct YdotoolSink;

impl YdotoolSink {
    pub fn new() -> Self {
        Self
    }

    /// Arguments for `ydotool key`: press/release pairs as `code:1` / `code:0`
    fn key_args(key: KeyCommand) -> Vec<String> {
        let mut args = vec!["key".to_string()];
        let press_release = |code: u16| [format!("{}:1", code), format!("{}:0", code)];
        match key {
            KeyCommand::Enter => args.extend(press_release(KEY_ENTER)),
            KeyCommand::Backspace => args.extend(press_release(KEY_BACKSPACE)),
            KeyCommand::Paste => args.extend([
                format!("{}:1", KEY_LEFTCTRL),
                format!("{}:1", KEY_V),
                format!("{}:0", KEY_V),
                format!("{}:0", KEY_LEFTCTRL),
            ]),
        }
        args
    }

    fn map_daemon_error(e: OutputError) -> OutputError {
        match e {
            OutputError::InjectionFailed(stderr)
                if stderr.contains("socket")
                    || stderr.contains("connect")
                    || stderr.contains("daemon") =>
            {
                OutputError::YdotoolNotRunning
            }
            other => other,
        }
    }
}

#[async_trait::async_trait]
impl KeystrokeSink for YdotoolSink {
    async fn write(&self, ch: char) -> Result<(), OutputError> {
        if ch == '\n' {
            return self.send(KeyCommand::Enter).await;
        }

        // The -- ensures a '-' character isn't treated as an option
        let mut cmd = Command::new("ydotool");
        cmd.args(["type", "--"]).arg(ch.to_string());

        run_tool(&mut cmd, OutputError::YdotoolNotFound)
            .await
            .map_err(Self::map_daemon_error)
    }

    async fn send(&self, key: KeyCommand) -> Result<(), OutputError> {
        let mut cmd = Command::new("ydotool");
        cmd.args(Self::key_args(key));

        run_tool(&mut cmd, OutputError::YdotoolNotFound)
            .await
            .map_err(Self::map_daemon_error)
            .map_err(|e| match e {
                OutputError::InjectionFailed(msg) => OutputError::KeyFailed(key.to_string(), msg),
                other => other,
            })
    }

    fn is_available(&self) -> bool {
        tool_available("ydotool")
    }

    fn name(&self) -> &'static str {
        "ydotool"
    }
}
