use eyre::WrapErr;
use nix::{
    sys::signal::{Signal, kill},
    unistd::Pid,
};

/// Asks a running process to open its inspector port
pub trait ProcessSignaller: Send + Sync {
    fn signal_ready(&self, pid: i32) -> eyre::Result<()>;
}

/// Sends `SIGUSR1`, which makes a Node.js process start its inspector
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectorSignal;

impl ProcessSignaller for InspectorSignal {
    fn signal_ready(&self, pid: i32) -> eyre::Result<()> {
        // 0 and negative pids address process groups
        eyre::ensure!(pid > 0, "invalid pid {pid}");

        tracing::debug!(%pid, "sending SIGUSR1");
        kill(Pid::from_raw(pid), Signal::SIGUSR1)
            .wrap_err_with(|| format!("sending SIGUSR1 to process {pid}"))
    }
}
