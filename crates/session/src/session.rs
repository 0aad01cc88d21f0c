use std::sync::Arc;

use eyre::WrapErr;
use gate::{CapabilityGate, SessionFlags, Subscription};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::{
    connection::{Connection, Connector, Target},
    error::{Result, SessionError},
    internals::SessionInternals,
    protocol::PauseOnExceptions,
    readiness,
    records::{DebuggerEvent, LogpointHit, TrackedBreakpoint},
    signal::{InspectorSignal, ProcessSignaller},
    sink::EventSink,
};

/// A debugging session with a single Node.js inspector
pub struct Session {
    internals: Arc<SessionInternals>,
    connection: Mutex<Option<Box<dyn Connection>>>,
    connector: Arc<dyn Connector>,
    signaller: Arc<dyn ProcessSignaller>,
    config: config::InspectorConfig,
}

impl Session {
    /// Create a disconnected session with its own [`CapabilityGate`]
    pub fn new(connector: impl Connector + 'static, config: &config::Config) -> Self {
        Self::with_gate(connector, Arc::new(CapabilityGate::new()), config)
    }

    /// Create a disconnected session that mirrors its flags into `gate`
    pub fn with_gate(
        connector: impl Connector + 'static,
        gate: Arc<CapabilityGate>,
        config: &config::Config,
    ) -> Self {
        Self {
            internals: Arc::new(SessionInternals::new(gate, &config.logpoints.sentinel)),
            connection: Mutex::new(None),
            connector: Arc::new(connector),
            signaller: Arc::new(InspectorSignal),
            config: config.inspector.clone(),
        }
    }

    /// Replace how processes are asked to open their inspector
    pub fn with_signaller(mut self, signaller: impl ProcessSignaller + 'static) -> Self {
        self.signaller = Arc::new(signaller);
        self
    }

    /// Connect to the configured host and port
    pub async fn connect_default(&self) -> Result<()> {
        self.connect_to(Target::address(&self.config.host, self.config.port))
            .await
    }

    /// Connect to `target`.
    ///
    /// An existing connection is closed first, and subscribers see that
    /// disconnect before the new connection. If any configuration step
    /// fails the new connection is closed again and the session stays
    /// disconnected.
    #[tracing::instrument(skip(self, target), fields(%target))]
    pub async fn connect_to(&self, target: Target) -> Result<()> {
        let mut slot = self.connection.lock().await;
        if let Some(previous) = slot.take() {
            tracing::info!("closing existing connection before reconnecting");
            self.teardown(previous).await;
        }

        let generation = self.internals.begin_attempt();

        tracing::debug!("opening inspector connection");
        let mut connection = self
            .connector
            .connect(&target)
            .await
            .map_err(|e| SessionError::connection(&target, e))?;

        if let Err(e) = self.configure(connection.as_mut(), generation).await {
            tracing::warn!(error = %e, "configuring connection failed, rolling back");
            self.internals.abandon_attempt(generation);
            if let Err(close_error) = connection.close().await {
                tracing::warn!(error = %close_error, "closing connection after failed configuration");
            }
            return Err(SessionError::connection(&target, e));
        }

        *slot = Some(connection);
        self.internals.mark_connected(generation, target);
        tracing::info!("connected to inspector");
        Ok(())
    }

    async fn configure(&self, connection: &mut dyn Connection, generation: u64) -> eyre::Result<()> {
        connection
            .enable_debugger()
            .await
            .context("enabling Debugger domain")?;
        connection
            .enable_runtime()
            .await
            .context("enabling Runtime domain")?;
        connection
            .set_pause_on_exceptions(PauseOnExceptions::None)
            .await
            .context("setting pause on exceptions")?;
        connection
            .set_async_call_stack_depth(self.config.async_call_stack_depth)
            .await
            .context("setting async call stack depth")?;
        connection
            .register_listeners(EventSink::new(&self.internals, generation))
            .context("registering listeners")?;
        Ok(())
    }

    /// Signal process `pid` to open its inspector, wait for `port` (the
    /// configured port by default) to accept connections, then connect.
    ///
    /// Waiting is bounded by the configured readiness timeout.
    #[tracing::instrument(skip(self))]
    pub async fn enable_remote_debugging_for(&self, pid: i32, port: Option<u16>) -> Result<()> {
        let port = port.unwrap_or(self.config.port);

        self.signaller
            .signal_ready(pid)
            .map_err(|e| SessionError::SignalDelivery {
                pid,
                message: format!("{e:#}"),
            })?;

        let waited = readiness::wait_for_port(
            &self.config.host,
            port,
            self.config.readiness_timeout(),
            self.config.readiness_poll_interval(),
        )
        .await
        .map_err(|elapsed| SessionError::ReadinessTimeout { port, elapsed })?;
        tracing::debug!(?waited, "inspector port open");

        self.connect_to(Target::address(&self.config.host, port))
            .await
    }

    /// Close the connection, if any. Calling this while disconnected does
    /// nothing.
    #[tracing::instrument(skip(self))]
    pub async fn disconnect(&self) {
        let mut slot = self.connection.lock().await;
        match slot.take() {
            Some(connection) => {
                self.teardown(connection).await;
                tracing::info!("disconnected from inspector");
            }
            None => tracing::debug!("already disconnected"),
        }
    }

    async fn teardown(&self, mut connection: Box<dyn Connection>) {
        if let Err(e) = connection.close().await {
            tracing::warn!(error = %e, "error closing inspector connection");
        }
        self.internals.mark_disconnected();
    }

    /// The live connection, or `None` while disconnected
    pub async fn client(&self) -> Option<MappedMutexGuard<'_, dyn Connection>> {
        let guard = self.connection.lock().await;
        MutexGuard::try_map(guard, |slot| slot.as_deref_mut()).ok()
    }

    pub fn is_connected(&self) -> bool {
        self.flags().is_connected
    }

    pub fn is_paused(&self) -> bool {
        self.flags().is_paused
    }

    pub fn flags(&self) -> SessionFlags {
        self.internals.flags()
    }

    /// The target of the current connection
    pub fn target(&self) -> Option<Target> {
        self.internals.with_state(|state| state.target.clone())
    }

    pub fn gate(&self) -> &Arc<CapabilityGate> {
        &self.internals.gate
    }

    pub fn logpoint_hits(&self) -> Vec<LogpointHit> {
        self.internals.with_state(|state| state.logpoint_hits.clone())
    }

    pub fn clear_logpoint_hits(&self) {
        self.internals.with_state(|state| state.logpoint_hits.clear());
    }

    pub fn debugger_events(&self) -> Vec<DebuggerEvent> {
        self.internals
            .with_state(|state| state.debugger_events.clone())
    }

    pub fn clear_debugger_events(&self) {
        self.internals
            .with_state(|state| state.debugger_events.clear());
    }

    /// Remember `breakpoint`, replacing any with the same id
    pub fn track_breakpoint(&self, breakpoint: TrackedBreakpoint) {
        tracing::debug!(
            breakpoint_id = %breakpoint.breakpoint_id,
            logpoint = breakpoint.is_logpoint(),
            "tracking breakpoint"
        );
        self.internals.with_state(|state| {
            state
                .breakpoints
                .insert(breakpoint.breakpoint_id.clone(), breakpoint);
        });
    }

    /// Forget a breakpoint. Unknown ids are ignored.
    pub fn untrack_breakpoint(&self, breakpoint_id: &str) -> Option<TrackedBreakpoint> {
        self.internals
            .with_state(|state| state.breakpoints.shift_remove(breakpoint_id))
    }

    pub fn tracked_breakpoint(&self, breakpoint_id: &str) -> Option<TrackedBreakpoint> {
        self.internals
            .with_state(|state| state.breakpoints.get(breakpoint_id).cloned())
    }

    /// Tracked breakpoints in the order they were first added
    pub fn tracked_breakpoints(&self) -> Vec<TrackedBreakpoint> {
        self.internals
            .with_state(|state| state.breakpoints.values().cloned().collect())
    }

    pub fn clear_tracked_breakpoints(&self) {
        self.internals.with_state(|state| state.breakpoints.clear());
    }

    /// Edge-triggered connection/pause changes
    pub fn on_state_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionFlags) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.internals.channels.state_change.subscribe(callback)
    }

    /// Every `Debugger.paused`, including repeats
    pub fn on_debugger_paused<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DebuggerEvent) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.internals.channels.debugger_paused.subscribe(callback)
    }

    /// Every `Debugger.resumed`, including repeats
    pub fn on_debugger_resumed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DebuggerEvent) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.internals.channels.debugger_resumed.subscribe(callback)
    }

    pub fn on_logpoint_hit<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&LogpointHit) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.internals.channels.logpoint_hit.subscribe(callback)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("flags", &self.flags())
            .field("target", &self.target())
            .finish()
    }
}
