use clap::{Parser, Subcommand};
use utils::version;

use crate::config::daemon::DaemonArgs;
use crate::config::devices::ShowDevicesArgs;

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Advertise device resources of this node until terminated
    Daemon(Box<DaemonArgs>),
    /// Print the device snapshot of this node without contacting the cluster
    #[command(name = "show-devices")]
    ShowDevices(ShowDevicesArgs),
}
