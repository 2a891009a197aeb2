use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::devices::DeviceArgs;

#[derive(Parser, Clone, Debug)]
pub struct DaemonArgs {
    #[arg(
        long,
        env = "KUBECONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to kubeconfig file (defaults to cluster config or ~/.kube/config)"
    )]
    pub kubeconfig: Option<PathBuf>,

    #[arg(
        long,
        env = "NODE_NAME",
        help = "Node name to advertise for, defaults to the OS hostname"
    )]
    pub hostname_override: Option<String>,

    #[arg(
        long,
        env = "NODE_IP",
        help = "IP address of the node, detected from the hostname when unset"
    )]
    pub node_ip: Option<String>,

    #[arg(
        long,
        env = "ADVERTISE_INTERVAL_MS",
        default_value = "20000",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Interval between device advertisements in milliseconds"
    )]
    pub advertise_interval_ms: u64,

    #[arg(
        long,
        env = "ADVERTISE_RETRY_INTERVAL_MS",
        default_value = "5000",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Interval between retries after a failed advertisement in milliseconds"
    )]
    pub retry_interval_ms: u64,

    #[command(flatten)]
    pub devices: DeviceArgs,
}

impl DaemonArgs {
    pub fn advertise_interval(&self) -> Duration {
        Duration::from_millis(self.advertise_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::config::Cli;
    use crate::config::Commands;

    fn parse_daemon(args: &[&str]) -> DaemonArgs {
        let cli = Cli::try_parse_from(["device-advertiser", "daemon"].iter().chain(args))
            .expect("should parse daemon args");
        match cli.command {
            Commands::Daemon(args) => *args,
            Commands::ShowDevices(_) => panic!("expected daemon command"),
        }
    }

    #[test]
    fn defaults_match_advertisement_cadence() {
        let args = parse_daemon(&["--hostname-override", "node-a"]);
        assert_eq!(args.advertise_interval(), Duration::from_millis(20_000));
        assert_eq!(args.retry_interval(), Duration::from_millis(5_000));
        assert!(args.devices.enable_nvidia);
        assert_eq!(args.hostname_override.as_deref(), Some("node-a"));
    }

    #[test]
    fn explicit_flags_override_defaults() {
        let args = parse_daemon(&[
            "--node-ip",
            "10.0.0.5",
            "--advertise-interval-ms",
            "1000",
            "--retry-interval-ms",
            "250",
            "--enable-nvidia",
            "false",
            "--static-devices-path",
            "/etc/devices.yaml",
        ]);
        assert_eq!(args.node_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(args.advertise_interval(), Duration::from_millis(1_000));
        assert_eq!(args.retry_interval(), Duration::from_millis(250));
        assert!(!args.devices.enable_nvidia);
        assert_eq!(
            args.devices.static_devices_path,
            Some(PathBuf::from("/etc/devices.yaml"))
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = Cli::try_parse_from([
            "device-advertiser",
            "daemon",
            "--advertise-interval-ms",
            "0",
        ]);
        assert!(result.is_err());
    }
}
