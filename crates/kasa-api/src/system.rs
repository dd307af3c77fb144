// System endpoints
//
// Identity and status snapshot, relay and indicator control, reboot.

use tracing::debug;

use crate::client::KasaClient;
use crate::command::Command;
use crate::error::Error;
use crate::models::SysInfo;

impl KasaClient {
    /// Fetch the plug's identity and status snapshot.
    ///
    /// `{"system":{"get_sysinfo":{}}}`
    pub async fn get_sysinfo(&mut self) -> Result<SysInfo, Error> {
        let command = Command::GetSysInfo;
        let response = self.execute(command).await?;
        response
            .system
            .and_then(|s| s.get_sysinfo)
            .ok_or_else(|| missing(command))
    }

    /// Switch the relay.
    ///
    /// `{"system":{"set_relay_state":{"state":0|1}}}`
    pub async fn set_relay_state(&mut self, on: bool) -> Result<(), Error> {
        debug!(on, "setting relay state");
        self.execute(Command::SetRelayState { on }).await?;
        Ok(())
    }

    /// Switch the indicator light. `off: true` turns the light off.
    ///
    /// `{"system":{"set_led_off":{"off":0|1}}}`
    pub async fn set_led_off(&mut self, off: bool) -> Result<(), Error> {
        debug!(off, "setting indicator light");
        self.execute(Command::SetLedOff { off }).await?;
        Ok(())
    }

    /// Schedule a reboot after `delay_secs` (at least one second).
    ///
    /// `{"system":{"reboot":{"delay":N}}}`
    pub async fn reboot(&mut self, delay_secs: u32) -> Result<(), Error> {
        debug!(delay_secs, "requesting reboot");
        self.execute(Command::Reboot { delay_secs }).await?;
        Ok(())
    }
}

pub(crate) fn missing(command: Command) -> Error {
    Error::MissingResponse {
        target: command.target().to_string(),
        command: command.name().into(),
    }
}
