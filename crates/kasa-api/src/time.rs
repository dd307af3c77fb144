// Time endpoints

use crate::client::KasaClient;
use crate::command::Command;
use crate::error::Error;
use crate::models::{DeviceClock, TimeZone};
use crate::system::missing;

impl KasaClient {
    /// Read the plug's local wall clock.
    ///
    /// `{"time":{"get_time":{}}}`
    pub async fn get_time(&mut self) -> Result<DeviceClock, Error> {
        let command = Command::GetTime;
        let response = self.execute(command).await?;
        response
            .time
            .and_then(|t| t.get_time)
            .ok_or_else(|| missing(command))
    }

    /// Read the plug's timezone table index.
    ///
    /// `{"time":{"get_timezone":{}}}`
    pub async fn get_timezone(&mut self) -> Result<TimeZone, Error> {
        let command = Command::GetTimezone;
        let response = self.execute(command).await?;
        response
            .time
            .and_then(|t| t.get_timezone)
            .ok_or_else(|| missing(command))
    }
}
