//! Motion controller seam
//!
//! The command server talks to the robot through [`MotionController`].
//! Each request returns the SDK status: `Ok` for success, a nonzero code
//! otherwise.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use super::parser::{Command, Reply, Velocity};

/// A motion request was refused or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("motion request failed with code {0}")]
pub struct MotionError(pub i32);

/// Robot motion interface
pub trait MotionController: Send + Sync + 'static {
    /// Rise to the standing posture
    fn stand_up(&self) -> impl Future<Output = Result<(), MotionError>> + Send;

    /// Lower to the resting posture
    fn stand_down(&self) -> impl Future<Output = Result<(), MotionError>> + Send;

    /// Enter balanced standing, required before velocity control
    fn balance_stand(&self) -> impl Future<Output = Result<(), MotionError>> + Send;

    /// Move with a body-frame velocity
    fn move_velocity(
        &self,
        velocity: Velocity,
    ) -> impl Future<Output = Result<(), MotionError>> + Send;

    /// Stop any ongoing movement
    fn stop_move(&self) -> impl Future<Output = Result<(), MotionError>> + Send;
}

/// Run one command against a controller and map the outcome to a reply
pub async fn execute<C: MotionController>(controller: &C, command: Command) -> Reply {
    let result = match command {
        Command::StandUp => controller.stand_up().await,
        Command::SitDown => controller.stand_down().await,
        Command::Stop => controller.stop_move().await,
        Command::Quit => return Reply::Ok,
        movement => match movement.velocity() {
            Some(velocity) => {
                // The move itself decides the reply
                if let Err(e) = controller.balance_stand().await {
                    tracing::warn!(command = %movement, error = %e, "Balance stand failed");
                }
                controller.move_velocity(velocity).await
            }
            None => return Reply::Unknown,
        },
    };

    match result {
        Ok(()) => Reply::Ok,
        Err(e) => {
            tracing::warn!(command = %command, error = %e, "Motion command failed");
            Reply::Err
        }
    }
}

/// A call made on a [`LoggingController`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCall {
    StandUp,
    StandDown,
    BalanceStand,
    Move(Velocity),
    StopMove,
}

/// Controller without hardware: logs every request and always succeeds
#[derive(Debug, Default)]
pub struct LoggingController {
    calls: Mutex<Vec<MotionCall>>,
}

impl LoggingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<MotionCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: MotionCall) -> Result<(), MotionError> {
        tracing::info!(call = ?call, "Motion request");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        Ok(())
    }
}

impl MotionController for LoggingController {
    async fn stand_up(&self) -> Result<(), MotionError> {
        self.record(MotionCall::StandUp)
    }

    async fn stand_down(&self) -> Result<(), MotionError> {
        self.record(MotionCall::StandDown)
    }

    async fn balance_stand(&self) -> Result<(), MotionError> {
        self.record(MotionCall::BalanceStand)
    }

    async fn move_velocity(&self, velocity: Velocity) -> Result<(), MotionError> {
        self.record(MotionCall::Move(velocity))
    }

    async fn stop_move(&self) -> Result<(), MotionError> {
        self.record(MotionCall::StopMove)
    }
}
