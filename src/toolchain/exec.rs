use crate::{
    errors::{WrapError, WrapResult},
    toolchain::{Exit, Invocation, Launcher},
};
use async_trait::async_trait;
use std::io;
use std::time::Instant;
use tokio::{
    process::Command,
    sync::Mutex,
    time::{timeout, Duration},
};
use tracing::{info, warn};

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::{ctrl_c, CtrlC};

/// Ctrl-C listener. Registration happens on `install`, so an interrupt
/// arriving while no child runs is held until the next launch sees it.
struct Interrupt {
    #[cfg(unix)]
    inner: Signal,
    #[cfg(windows)]
    inner: CtrlC,
}

impl Interrupt {
    fn install() -> io::Result<Self> {
        #[cfg(unix)]
        let inner = signal(SignalKind::interrupt())?;
        #[cfg(windows)]
        let inner = ctrl_c()?;
        Ok(Self { inner })
    }

    async fn recv(&mut self) {
        // a closed stream means the runtime is going away, not an interrupt
        if self.inner.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    /// True if an interrupt arrived since the last check.
    async fn pending(&mut self) -> bool {
        timeout(Duration::ZERO, self.recv()).await.is_ok()
    }
}

/// Runs invocations as real child processes sharing the wrapper's stdio.
pub struct ProcessLauncher {
    interrupt: Mutex<Interrupt>,
}

impl ProcessLauncher {
    /// Must be called from within the runtime, before any step whose
    /// cleanup depends on seeing Ctrl-C.
    pub fn new() -> io::Result<Self> {
        Ok(Self { interrupt: Mutex::new(Interrupt::install()?) })
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, inv: &Invocation) -> WrapResult<Exit> {
        let mut interrupt = self.interrupt.lock().await;
        if interrupt.pending().await {
            warn!(program = %inv.program.display(), "interrupted before start");
            return Err(WrapError::Interrupted);
        }

        let mut command = Command::new(&inv.program);
        command.args(&inv.args);
        command.current_dir(&inv.cwd);

        let start = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|source| WrapError::Spawn { program: inv.program.clone(), source })?;

        let status = tokio::select! {
            status = child.wait() => status,
            _ = interrupt.recv() => {
                warn!(program = %inv.program.display(), "interrupted, stopping child");
                let _ = child.kill().await;
                return Err(WrapError::Interrupted);
            }
        };
        let status = status.map_err(|source| WrapError::Spawn { program: inv.program.clone(), source })?;

        let exit = Exit::from(status);
        info!(
            program = %inv.program.display(),
            code = ?exit.code,
            duration_ms = start.elapsed().as_millis() as u64,
            "child exited"
        );
        Ok(exit)
    }
}
