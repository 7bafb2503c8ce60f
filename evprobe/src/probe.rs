use crate::config;
use anyhow::{Context, Error};
use input::Monitor;
use tokio::time;

pub fn print_net(config: &config::Net, iface: &str) -> Result<(), Error> {
    let device = input::net_device(&config.class_path, iface).with_context(|| {
        format!("Failed to look up {} in {}", iface, config.class_path.display())
    })?;
    print!("{}", device);
    Ok(())
}

pub fn print_block(config: &config::Block) -> Result<(), Error> {
    let devices =
        input::block_devices(config.filter()).context("Failed to enumerate block devices")?;
    for device in devices {
        println!("{}", device);
    }
    Ok(())
}

pub async fn print_hotplug(config: &config::Monitor) -> Result<(), Error> {
    let mut monitor = Monitor::new(config.subsystem.as_deref(), config.devtype.as_deref())
        .context("Failed to set up the udev monitor")?;

    log::info!("Waiting for {} events", config.subsystem.as_deref().unwrap_or("udev"));

    loop {
        let event = monitor.recv().await.context("Failed to receive from the udev monitor")?;
        print!("{}", event);
        time::sleep(config.interval()).await;
    }
}
