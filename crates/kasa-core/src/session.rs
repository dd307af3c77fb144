// ── Device session ──
//
// Lifecycle and high-level operations for one plug connection. The
// session owns the `KasaClient`; the caller owns the `DeviceState` and
// lends it to each operation. Exchanges are strictly sequential, and a
// second concurrent call on the same session fails with `Busy` instead
// of interleaving frames.

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Utc};
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, info, warn};

use kasa_api::{Command, KasaClient, Request, Response};

use crate::config::PlugConfig;
use crate::error::{CoreError, ErrorKind, Property};
use crate::model::{DeviceState, DeviceTime, Energy};

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

// ── Session ──────────────────────────────────────────────────────

/// A session with a single plug.
///
/// Does not connect on construction; call [`connect()`](Self::connect).
/// A transport failure during any operation drops the connection and
/// moves the session back to `Disconnected`.
pub struct Session {
    config: PlugConfig,
    client: Mutex<Option<KasaClient>>,
    connection_state: watch::Sender<ConnectionState>,
}

impl Session {
    pub fn new(config: PlugConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            client: Mutex::new(None),
            connection_state,
        }
    }

    pub fn config(&self) -> &PlugConfig {
        &self.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Open the TCP connection. Sends no command.
    ///
    /// Reconnecting an already connected session replaces the old
    /// connection.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let mut slot = self.acquire()?;
        if let Some(old) = slot.take() {
            debug!("replacing existing plug connection");
            close_quietly(old).await;
            self.connection_state.send_replace(ConnectionState::Disconnected);
        }

        let client = KasaClient::connect(
            &self.config.host,
            self.config.port,
            &self.config.transport(),
        )
        .await?;

        *slot = Some(client);
        self.connection_state.send_replace(ConnectionState::Connected);
        info!(addr = %self.config.address(), "session connected");
        Ok(())
    }

    /// Close the connection, waiting for any in-flight operation first.
    ///
    /// Disconnecting an already disconnected session is a no-op.
    pub async fn disconnect(&self) {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.take() {
            close_quietly(client).await;
            info!(addr = %self.config.address(), "session disconnected");
        }
        self.connection_state.send_replace(ConnectionState::Disconnected);
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection_state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.connection_state.borrow() == ConnectionState::Connected
    }

    // ── Raw exchanges ────────────────────────────────────────────

    /// Send a typed command and return the checked response envelope.
    pub async fn send_command(&self, command: Command) -> Result<Response, CoreError> {
        let mut slot = self.acquire()?;
        let result = connected(&mut slot)?.execute(command).await.map_err(CoreError::from);
        self.settle(&mut slot, result)
    }

    /// Send an arbitrary request and return the reply as loose JSON.
    pub async fn send_request(&self, request: &Request) -> Result<serde_json::Value, CoreError> {
        let mut slot = self.acquire()?;
        let result = connected(&mut slot)?.send_raw(request).await.map_err(CoreError::from);
        self.settle(&mut slot, result)
    }

    // ── Device operations ────────────────────────────────────────

    /// Re-read sysinfo, device time and energy telemetry into `state`.
    ///
    /// Not transactional: a failing sub-query leaves the fields mapped by
    /// earlier sub-queries in place.
    pub async fn refresh_state(&self, state: &mut DeviceState) -> Result<(), CoreError> {
        let mut slot = self.acquire()?;
        let result = refresh(connected(&mut slot)?, state).await;
        self.settle(&mut slot, result)
    }

    /// Switch the relay. Fails with `AlreadyInState` if the freshly
    /// refreshed state already matches.
    pub async fn set_relay_state(
        &self,
        state: &mut DeviceState,
        on: bool,
    ) -> Result<(), CoreError> {
        let mut slot = self.acquire()?;
        let result = switch_relay(connected(&mut slot)?, state, Some(on)).await;
        self.settle(&mut slot, result).map(|_| ())
    }

    /// Flip the relay to the opposite of its freshly refreshed state.
    /// Returns the new relay state.
    pub async fn toggle_relay(&self, state: &mut DeviceState) -> Result<bool, CoreError> {
        let mut slot = self.acquire()?;
        let result = switch_relay(connected(&mut slot)?, state, None).await;
        self.settle(&mut slot, result)
    }

    /// Switch the indicator light. Fails with `AlreadyInState` if the
    /// freshly refreshed state already matches.
    pub async fn set_indicator_state(
        &self,
        state: &mut DeviceState,
        on: bool,
    ) -> Result<(), CoreError> {
        let mut slot = self.acquire()?;
        let result = switch_indicator(connected(&mut slot)?, state, Some(on)).await;
        self.settle(&mut slot, result).map(|_| ())
    }

    /// Flip the indicator light to the opposite of its refreshed state.
    /// Returns the new light state.
    pub async fn toggle_indicator(&self, state: &mut DeviceState) -> Result<bool, CoreError> {
        let mut slot = self.acquire()?;
        let result = switch_indicator(connected(&mut slot)?, state, None).await;
        self.settle(&mut slot, result)
    }

    /// Schedule a reboot. No precondition; the delay is at least one second.
    pub async fn reboot(&self, delay_secs: u32) -> Result<(), CoreError> {
        let mut slot = self.acquire()?;
        let result = connected(&mut slot)?.reboot(delay_secs).await.map_err(CoreError::from);
        self.settle(&mut slot, result)
    }

    /// Cumulative energy in watt-hours.
    pub async fn energy_total(&self) -> Result<i64, CoreError> {
        let mut slot = self.acquire()?;
        let result = connected(&mut slot)?
            .get_realtime()
            .await
            .map(|realtime| realtime.total_wh)
            .map_err(CoreError::from);
        self.settle(&mut slot, result)
    }

    /// Device-local instant at which the relay last switched on.
    ///
    /// Refreshes `state` first; fails with `RelayOff` if the relay is off.
    pub async fn power_on_time(
        &self,
        state: &mut DeviceState,
    ) -> Result<DateTime<FixedOffset>, CoreError> {
        let mut slot = self.acquire()?;
        let result = refresh(connected(&mut slot)?, state).await;
        self.settle(&mut slot, result)?;
        power_on_instant(state)
    }

    // ── Internal helpers ─────────────────────────────────────────

    fn acquire(&self) -> Result<MutexGuard<'_, Option<KasaClient>>, CoreError> {
        self.client.try_lock().map_err(|_| CoreError::Busy)
    }

    /// Drop the connection if `result` is a transport failure.
    fn settle<T>(
        &self,
        slot: &mut Option<KasaClient>,
        result: Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        if let Err(err) = &result {
            if err.kind() == ErrorKind::Transport && slot.take().is_some() {
                warn!(addr = %self.config.address(), error = %err, "dropping plug connection");
                self.connection_state.send_replace(ConnectionState::Disconnected);
            }
        }
        result
    }
}

fn connected(slot: &mut Option<KasaClient>) -> Result<&mut KasaClient, CoreError> {
    slot.as_mut().ok_or(CoreError::NotConnected)
}

async fn close_quietly(client: KasaClient) {
    if let Err(e) = client.close().await {
        warn!(error = %e, "closing plug connection failed (non-fatal)");
    }
}

// ── Operation bodies ─────────────────────────────────────────────

async fn refresh(client: &mut KasaClient, state: &mut DeviceState) -> Result<(), CoreError> {
    let info = client.get_sysinfo().await?;
    state.apply_sysinfo(&info);

    let clock = client.get_time().await?;
    let zone = client.get_timezone().await?;
    state.time = Some(DeviceTime::from_wire(&clock, &zone)?);

    let realtime = client.get_realtime().await?;
    state.energy = Energy::from(&realtime);

    state.refreshed_at = Some(Utc::now());
    debug!(
        alias = %state.alias,
        power_on = state.power_on,
        light_on = state.light_on,
        "device state refreshed"
    );
    Ok(())
}

/// Refresh, then drive the relay to `target` (or the opposite of the
/// refreshed state when `None`).
async fn switch_relay(
    client: &mut KasaClient,
    state: &mut DeviceState,
    target: Option<bool>,
) -> Result<bool, CoreError> {
    refresh(client, state).await?;
    let on = target.unwrap_or(!state.power_on);
    if state.power_on == on {
        return Err(CoreError::AlreadyInState {
            property: Property::Power,
            on,
        });
    }

    client.set_relay_state(on).await?;
    state.power_on = on;
    if !on {
        state.uptime_secs = 0;
    }

    let realtime = client.get_realtime().await?;
    state.energy = Energy::from(&realtime);
    Ok(on)
}

/// Refresh, then drive the indicator light to `target` (or the opposite
/// of the refreshed state when `None`).
async fn switch_indicator(
    client: &mut KasaClient,
    state: &mut DeviceState,
    target: Option<bool>,
) -> Result<bool, CoreError> {
    refresh(client, state).await?;
    let on = target.unwrap_or(!state.light_on);
    if state.light_on == on {
        return Err(CoreError::AlreadyInState {
            property: Property::Light,
            on,
        });
    }

    client.set_led_off(!on).await?;
    state.light_on = on;
    Ok(on)
}

/// `device time - uptime`, for a relay that is on.
fn power_on_instant(state: &DeviceState) -> Result<DateTime<FixedOffset>, CoreError> {
    if !state.power_on {
        return Err(CoreError::RelayOff);
    }
    let now = state.time.ok_or_else(|| CoreError::Protocol {
        message: "device time unavailable".into(),
    })?;
    let uptime = i64::try_from(state.uptime_secs)
        .ok()
        .and_then(ChronoDuration::try_seconds)
        .ok_or_else(|| CoreError::Protocol {
            message: format!("uptime out of range: {}s", state.uptime_secs),
        })?;
    now.local
        .checked_sub_signed(uptime)
        .ok_or_else(|| CoreError::Protocol {
            message: format!("uptime out of range: {}s", state.uptime_secs),
        })
}
