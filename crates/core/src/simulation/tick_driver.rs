//! Continuous simulation timer
//!
//! Runs on the caller's side of the command queue. It posts one tick as soon
//! as it starts, then one every period. A tick is never posted while a previously posted one is still
//! pending, so a slow backend makes the simulation slower rather than letting
//! ticks pile up. Changing the period restarts the wait.

use super::worker::CommandPort;
use crate::config::clamp_tick_delay;
use crate::error::LifeError;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, error};

enum DriverControl {
    SetDelay(Duration),
    Stop,
}

/// Timer thread posting periodic ticks to one engine
pub(crate) struct TickDriver {
    control: mpsc::Sender<DriverControl>,
    thread: Option<thread::JoinHandle<()>>,
}

impl TickDriver {
    /// Post a tick to `target` now, then one every `delay`
    ///
    /// # Errors
    ///
    /// - [`LifeError::EngineStopped`] if the target's worker has exited
    /// - [`LifeError::UnsupportedEnvironment`] if the OS refuses a thread
    pub(crate) fn start(target: CommandPort, delay: Duration) -> Result<Self, LifeError> {
        let (control, commands) = mpsc::channel();
        let delay = clamp_tick_delay(delay);

        target.post_tick_if_idle()?;

        let thread = thread::Builder::new()
            .name("life-tick-driver".to_string())
            .spawn(move || drive(&target, &commands, delay))
            .map_err(|e| {
                LifeError::UnsupportedEnvironment(format!("failed to spawn tick driver: {e}"))
            })?;

        debug!("Tick driver started ({:?})", delay);
        Ok(Self {
            control,
            thread: Some(thread),
        })
    }

    /// Change the period and restart the wait
    pub(crate) fn set_delay(&self, delay: Duration) {
        let _ = self.control.send(DriverControl::SetDelay(clamp_tick_delay(delay)));
    }

    /// Stop posting ticks and wait for the timer thread
    pub(crate) fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.control.send(DriverControl::Stop);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Tick driver panicked");
            }
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn drive(target: &CommandPort, commands: &mpsc::Receiver<DriverControl>, mut delay: Duration) {
    loop {
        match commands.recv_timeout(delay) {
            Ok(DriverControl::SetDelay(new_delay)) => delay = new_delay,
            Ok(DriverControl::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if target.post_tick_if_idle().is_err() {
                    debug!("Engine stopped, tick driver exiting");
                    break;
                }
            }
        }
    }
    debug!("Tick driver stopped");
}
