use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = trackviz::config::Config::parse();
    if cfg.list_devices {
        trackviz::audio::list_input_devices()?;
        return Ok(());
    }

    trackviz::app::run(cfg)
}
