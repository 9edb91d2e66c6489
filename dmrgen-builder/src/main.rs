use dmrgen_builder::config;
use dmrgen_builder::module::datasource::{
    Geocoder, JsonAnalogRepeaters, JsonDeviceDirectory, JsonTalkgroupRegistry, NoGeocoder, TableGeocoder,
};
use dmrgen_builder::output;
use dmrgen_builder::pipeline::assemble;
use dmrgen_builder::recipe::{DataSources, RegionalRecipe};

use anyhow::{Context, Result};
use chrono::Utc;

fn main() -> Result<()> {
    // Load configuration
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    config::read_config(&config_path)?;
    let config = config::CONFIG.get().context("Configuration not loaded")?;

    // Initialize logging
    let _logging_guard = dmrgen_builder::logging::init_logging("logs", "dmrgen-builder", &config.log_level)?;

    tracing::info!("dmrgen builder starting...");
    tracing::info!("Station {} ({})", config.station.callsign, config.station.dmr_id);

    // Data sources
    let talkgroups = JsonTalkgroupRegistry::from_file(&config.data.talkgroups)?;
    let devices = JsonDeviceDirectory::from_file(&config.data.devices)?;
    let analog = JsonAnalogRepeaters::from_file(&config.data.analog_repeaters)?;
    let geocoder: Box<dyn Geocoder> = match &config.data.geocoder {
        Some(path) => Box::new(TableGeocoder::from_file(path)?),
        None => Box::new(NoGeocoder),
    };

    let sources = DataSources {
        talkgroups: &talkgroups,
        devices: &devices,
        bindings: &devices,
        analog: &analog,
        geocoder: geocoder.as_ref(),
    };

    let mut recipe = RegionalRecipe::new(config, sources, Utc::now())?;
    let codeplug = assemble(&mut recipe).context("Failed to assemble codeplug")?;

    let template = output::load_template(&config.data.template)?;
    let document = output::merge_into_template(template, &codeplug)?;
    output::write_codeplug(&config.data.output, &document)?;
    tracing::info!("Done: {}", codeplug.stats());

    Ok(())
}
