//! Customer Energy Manager.

use async_trait::async_trait;
use enumset::EnumSet;

use crate::{core::control_type::ControlType, prelude::*};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`{requested}` is not offered by the resource manager (available: {available:?})")]
    Unavailable { requested: ControlType, available: EnumSet<ControlType> },
}

/// Owner of the active control type.
#[async_trait]
pub trait Cem: Send {
    /// Currently active control type, if any has been activated yet.
    fn control_type(&self) -> Option<ControlType>;

    async fn activate_control_type(&mut self, control_type: ControlType) -> Result<(), Error>;
}

/// In-process CEM which steers a resource manager offering a fixed set of control types.
#[must_use]
pub struct LocalCem {
    available: EnumSet<ControlType>,
    active: Option<ControlType>,
}

impl LocalCem {
    /// Deselection is always available.
    pub fn new(available: impl IntoIterator<Item = ControlType>) -> Self {
        let available = available.into_iter().collect::<EnumSet<_>>() | ControlType::NoSelection;
        Self { available, active: None }
    }

    pub const fn available(&self) -> EnumSet<ControlType> {
        self.available
    }
}

#[async_trait]
impl Cem for LocalCem {
    fn control_type(&self) -> Option<ControlType> {
        self.active
    }

    #[instrument(skip_all, fields(control_type = %control_type))]
    async fn activate_control_type(&mut self, control_type: ControlType) -> Result<(), Error> {
        if !self.available.contains(control_type) {
            return Err(Error::Unavailable { requested: control_type, available: self.available });
        }
        if self.active == Some(control_type) {
            debug!("already active");
        } else {
            info!(previous = ?self.active, "activated");
        }
        self.active = Some(control_type);
        Ok(())
    }
}
