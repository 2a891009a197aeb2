use anyhow::Result;
use clap::Parser;
use device_advertiser::app::build_device_manager;
use device_advertiser::app::ApplicationBuilder;
use device_advertiser::config::Cli;
use device_advertiser::config::Commands;
use device_advertiser::config::DaemonArgs;
use device_advertiser::config::ShowDevicesArgs;
use device_advertiser::host;
use device_advertiser::traits::DeviceManager;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon(daemon_args) => run_daemon(*daemon_args).await,
        Commands::ShowDevices(show_devices_args) => run_show_devices(show_devices_args).await,
    }
}

async fn run_daemon(daemon_args: DaemonArgs) -> Result<()> {
    let _guard = utils::logging::init();

    tracing::info!("Starting device advertiser {}", &**version::VERSION);

    let app = ApplicationBuilder::new(daemon_args).build().await?;
    app.run().await?;

    tracing::info!("Device advertiser stopped");
    Ok(())
}

async fn run_show_devices(args: ShowDevicesArgs) -> Result<()> {
    let _guard = utils::logging::init();

    let hostname = host::get_hostname(args.hostname_override.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to resolve hostname: {e:?}"))?;
    let device_manager = build_device_manager(&args.devices)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize devices: {e:?}"))?;

    let mut node_info = api_types::NodeInfo::with_name(hostname);
    device_manager.update_node_info(&mut node_info);

    println!("{}", serde_json::to_string_pretty(&node_info)?);
    Ok(())
}
