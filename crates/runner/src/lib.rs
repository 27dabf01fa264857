//! A process runner for long-running services with graceful shutdown.
//!
//! Named processes run concurrently until one fails or a shutdown signal
//! (SIGINT/SIGTERM) arrives; every process then sees its cancellation token
//! trip. Closers run afterwards under a bounded timeout regardless of how
//! the processes stopped. The process exits 0 after a clean shutdown and
//! non-zero when any process failed.
//!
//! # Example
//!
//! ```no_run
//! use pylon_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     Runner::new()
//!         .with_named_process("heartbeat", |ctx| async move {
//!             loop {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => break,
//!                     _ = tokio::time::sleep(Duration::from_secs(1)) => {
//!                         tracing::info!("tick");
//!                     }
//!                 }
//!             }
//!             Ok(())
//!         })
//!         .with_closer(|| async move {
//!             tracing::info!("cleaning up");
//!             Ok(())
//!         })
//!         .with_closer_timeout(Duration::from_secs(5))
//!         .run()
//!         .await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Boxed future returned by an app process or a closer.
pub type ProcessFuture = Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>;

/// An app process: receives a cancellation token, runs until done or
/// cancelled.
pub type AppProcess = Box<dyn FnOnce(CancellationToken) -> ProcessFuture + Send>;

/// A cleanup function executed after all processes have stopped.
pub type Closer = Box<dyn FnOnce() -> ProcessFuture + Send>;

struct NamedProcess {
    name: String,
    process: AppProcess,
}

pub struct Runner {
    processes: Vec<NamedProcess>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Adds a named app process. The name appears in shutdown logs.
    ///
    /// If any process returns an error, all processes are cancelled and the
    /// runner exits non-zero after the closers complete.
    pub fn with_named_process<F, Fut>(mut self, name: impl Into<String>, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.processes.push(NamedProcess {
            name: name.into(),
            process: Box::new(|token| Box::pin(process(token))),
        });
        self
    }

    /// Adds a closer, executed after all processes have stopped regardless
    /// of whether they stopped due to error or cancellation.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    /// Bounds how long closers may run. Default is 10 seconds.
    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Uses an externally owned cancellation token, allowing callers to
    /// trigger shutdown without a signal.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs all processes to completion and exits the process.
    pub async fn run(self) {
        let exit_code = self.execute().await;
        std::process::exit(exit_code);
    }

    /// Everything `run` does short of exiting, returning the exit code.
    async fn execute(self) -> i32 {
        let token = self.cancellation_token;
        let closers = self.closers;
        let closer_timeout = self.closer_timeout;

        let mut join_set = JoinSet::new();
        for named in self.processes {
            let process_token = token.clone();
            let NamedProcess { name, process } = named;
            join_set.spawn(async move {
                let result = process(process_token).await;
                (name, result)
            });
        }

        let interrupt_token = token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("received interrupt signal");
                    interrupt_token.cancel();
                }
                Err(e) => {
                    error!(error = %e, "failed to install interrupt handler");
                }
            }
        });

        #[cfg(unix)]
        {
            let terminate_token = token.clone();
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                match signal(SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                        info!("received terminate signal");
                        terminate_token.cancel();
                    }
                    Err(e) => {
                        error!(error = %e, "failed to install terminate handler");
                    }
                }
            });
        }

        let mut failed = false;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    debug!(process = %name, "process finished");
                }
                Ok((name, Err(e))) => {
                    error!(process = %name, "process failed: {:#}", e);
                    failed = true;
                    token.cancel();
                }
                Err(e) => {
                    error!(error = %e, "process panicked");
                    failed = true;
                    token.cancel();
                }
            }
        }

        if !closers.is_empty() {
            info!(timeout = ?closer_timeout, "running closers");
            match tokio::time::timeout(closer_timeout, run_closers(closers)).await {
                Ok(()) => info!("all closers completed"),
                Err(_) => error!(timeout = ?closer_timeout, "closers timed out"),
            }
        }

        if failed {
            error!("shutting down after process failure");
            1
        } else {
            info!("shutting down normally");
            0
        }
    }
}

async fn run_closers(closers: Vec<Closer>) {
    let mut closer_set = JoinSet::new();
    for closer in closers {
        closer_set.spawn(closer());
    }

    while let Some(result) = closer_set.join_next().await {
        match result {
            Ok(Ok(())) => debug!("closer completed"),
            Ok(Err(e)) => error!("closer failed: {:#}", e),
            Err(e) => error!(error = %e, "closer panicked"),
        }
    }
}
