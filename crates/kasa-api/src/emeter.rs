// Energy meter endpoints
//
// Only energy-monitoring models answer these; others reply with a
// namespace-level `err_code` of -1.

use crate::client::KasaClient;
use crate::command::Command;
use crate::error::Error;
use crate::models::Realtime;
use crate::system::missing;

impl KasaClient {
    /// Read instantaneous current, voltage and power plus the energy total.
    ///
    /// `{"emeter":{"get_realtime":{}}}`
    pub async fn get_realtime(&mut self) -> Result<Realtime, Error> {
        let command = Command::GetRealtime;
        let response = self.execute(command).await?;
        response
            .emeter
            .and_then(|e| e.get_realtime)
            .ok_or_else(|| missing(command))
    }
}
