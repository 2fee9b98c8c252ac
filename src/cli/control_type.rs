use clap::Parser;

use crate::{
    cli::{ConnectionArgs, HomeAssistantArgs},
    core::{cem::LocalCem, control_type::ControlType},
    prelude::*,
    services,
};

#[derive(Parser)]
pub struct ChangeControlTypeArgs {
    /// Control type name, for example: `FILL_RATE_BASED_CONTROL`.
    pub control_type: String,

    /// Control types offered by the resource manager.
    #[clap(
        long = "available-control-types",
        env = "AVAILABLE_CONTROL_TYPES",
        value_delimiter = ',',
        num_args = 1..,
        default_value = "FILL_RATE_BASED_CONTROL",
    )]
    pub available: Vec<ControlType>,

    #[clap(flatten)]
    pub connection: ConnectionArgs,

    #[clap(flatten)]
    pub home_assistant: HomeAssistantArgs,
}

impl ChangeControlTypeArgs {
    #[instrument(skip_all)]
    pub async fn run(&self) -> Result {
        let publisher =
            self.home_assistant.try_new_publisher(self.connection.try_new_client()?)?;
        let mut cem = LocalCem::new(self.available.iter().copied());
        debug!(available = ?cem.available(), "CEM is ready");
        let control_type =
            services::change_control_type(&mut cem, &publisher, &self.control_type).await?;
        info!(%control_type, "changed");
        Ok(())
    }
}
