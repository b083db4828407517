//! Controller and Host Bring-up
//!
//! Runs the radio controller and host stack through their init/enable steps
//! in order. The first failing step aborts the sequence and is returned as an
//! initialization error; whether that is fatal is the caller's decision.

use crate::ble::host::HostError;
use crate::error::AdvError;

/// Bring-up stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitStage {
    ControllerInit,
    ControllerEnable,
    HostInit,
    HostEnable,
}

/// Radio controller and host stack lifecycle
pub trait RadioController {
    fn init_controller(&mut self) -> Result<(), HostError>;

    /// Enable the controller in BLE-only mode
    fn enable_controller(&mut self) -> Result<(), HostError>;

    fn init_host(&mut self) -> Result<(), HostError>;

    fn enable_host(&mut self) -> Result<(), HostError>;
}

fn stage(stage: InitStage, result: Result<(), HostError>) -> Result<(), AdvError> {
    match result {
        Ok(()) => {
            debug!("bring-up: {:?} done", stage);
            Ok(())
        }
        Err(error) => {
            error!("bring-up: {:?} failed, error code = {:x}", stage, error.code());
            Err(AdvError::Initialization { stage, error })
        }
    }
}

/// Bring the controller and host stack up
pub fn bring_up<C: RadioController>(radio: &mut C) -> Result<(), AdvError> {
    stage(InitStage::ControllerInit, radio.init_controller())?;
    stage(InitStage::ControllerEnable, radio.enable_controller())?;
    info!("enable host stack");
    stage(InitStage::HostInit, radio.init_host())?;
    stage(InitStage::HostEnable, radio.enable_host())?;
    info!("BLE controller and host stack up");
    Ok(())
}
