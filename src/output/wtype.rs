//! wtype-based keystroke output
//!
//! Uses wtype to simulate keyboard input on Wayland. This is the preferred
//! method on Wayland because no daemon is required (unlike ydotool) and
//! Unicode characters are typed directly.
//!
//! Requires:
//! - wtype installed
//! - Running on Wayland (WAYLAND_DISPLAY set)

use super::{run_tool, tool_available, KeyCommand, KeystrokeSink};
use crate::error::OutputError;
use tokio::process::Command;

/// wtype-based keystroke output
#[derive(Debug, Default)]
pub struct WtypeSink;

impl WtypeSink {
    pub fn new() -> Self {
        Self
    }

    fn key_args(key: KeyCommand) -> &'static [&'static str] {
        match key {
            KeyCommand::Enter => &["-k", "Return"],
            KeyCommand::Backspace => &["-k", "BackSpace"],
            KeyCommand::Paste => &["-M", "ctrl", "-k", "v", "-m", "ctrl"],
        }
    }
}

#[async_trait::async_trait]
impl KeystrokeSink for WtypeSink {
    async fn write(&self, ch: char) -> Result<(), OutputError> {
        match ch {
            '\n' => self.send(KeyCommand::Enter).await,
            '\t' => {
                let mut cmd = Command::new("wtype");
                cmd.args(["-k", "Tab"]);
                run_tool(&mut cmd, OutputError::WtypeNotFound).await
            }
            _ => {
                let mut cmd = Command::new("wtype");
                cmd.arg("--").arg(ch.to_string());
                run_tool(&mut cmd, OutputError::WtypeNotFound).await
            }
        }
    }

    async fn send(&self, key: KeyCommand) -> Result<(), OutputError> {
        let mut cmd = Command::new("wtype");
        cmd.args(Self::key_args(key));

        run_tool(&mut cmd, OutputError::WtypeNotFound)
            .await
            .map_err(|e| match e {
                OutputError::InjectionFailed(msg) => OutputError::KeyFailed(key.to_string(), msg),
                other => other,
            })
    }

    fn is_available(&self) -> bool {
        tool_available("wtype")
    }

    fn name(&self) -> &'static str {
        "wtype"
    }
}
