//! APRS beacon channel and configurations

use dmrgen_common::{AnalogAprsConfig, AnalogChannel, ContactId, DigitalAprsConfig, Sequence, TxPower};
use serde::{Deserialize, Serialize};

use crate::error::CodeplugError;
use crate::module::generator::{GenerationState, Source};

/// Regional APRS frequency plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AprsRegion {
    #[default]
    Eu,
    Us,
}

impl AprsRegion {
    /// Simplex APRS frequency in MHz
    pub fn frequency(&self) -> f64 {
        match self {
            AprsRegion::Eu => 144.800,
            AprsRegion::Us => 144.390,
        }
    }
}

/// Analog APRS: one beacon channel, then the configuration pointing at it.
///
/// The channel is drawn from the channel sequence and the configuration
/// from the APRS sequence, each exactly once.
pub struct AnalogAprs {
    callsign: String,
    region: AprsRegion,
    channel: GenerationState<AnalogChannel>,
    config: Option<AnalogAprsConfig>,
}

impl AnalogAprs {
    pub fn new(callsign: impl Into<String>, region: AprsRegion) -> Self {
        Self {
            callsign: callsign.into(),
            region,
            channel: GenerationState::NotStarted,
            config: None,
        }
    }

    /// The beacon channel, allocating its identifier on first use.
    pub fn channel(&mut self, seq: &mut Sequence) -> AnalogChannel {
        let frequency = self.region.frequency();
        let channels = self.channel.get_or_generate(|| {
            let mut channel = AnalogChannel::new(seq.next_id(), "APRS", frequency, frequency);
            channel.tx_power = TxPower::Max;
            vec![channel]
        });
        channels[0].clone()
    }

    /// The beacon configuration. The channel must have been generated first.
    pub fn config(&mut self, seq: &mut Sequence) -> Result<AnalogAprsConfig, CodeplugError> {
        if let Some(config) = &self.config {
            return Ok(config.clone());
        }

        let channel_id = self
            .channel
            .entities()
            .and_then(|channels| channels.first())
            .map(|channel| channel.id)
            .ok_or(CodeplugError::AprsChannelMissing)?;

        let config = AnalogAprsConfig {
            id: seq.next_id(),
            name: "Analog APRS".to_string(),
            channel_id,
            source: format!("{}-7", self.callsign),
            destination: "APAT81-0".to_string(),
            path: vec!["WIDE1-1".to_string(), "WIDE2-1".to_string()],
            period: 60,
            icon: "Runner".to_string(),
            message: format!("{} testing", self.callsign),
        };
        self.config = Some(config.clone());
        Ok(config)
    }
}

impl Source<AnalogChannel> for AnalogAprs {
    fn label(&self) -> String {
        format!("analog APRS ({:.3} MHz)", self.region.frequency())
    }

    fn produce(&mut self, seq: &mut Sequence) -> Vec<AnalogChannel> {
        vec![self.channel(seq)]
    }
}

/// DMR APRS: position reports sent to a gateway contact.
pub struct DigitalAprs {
    contact_id: ContactId,
    config: Option<DigitalAprsConfig>,
}

impl DigitalAprs {
    pub fn new(contact_id: ContactId) -> Self {
        Self {
            contact_id,
            config: None,
        }
    }

    pub fn config(&mut self, seq: &mut Sequence) -> DigitalAprsConfig {
        let contact_id = self.contact_id;
        self.config
            .get_or_insert_with(|| DigitalAprsConfig {
                id: seq.next_id(),
                name: "DMR APRS".to_string(),
                period: 180,
                contact_id,
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analog_aprs_channel_then_config() {
        let mut aprs = AnalogAprs::new("SP5ABC", AprsRegion::Eu);
        let mut channels = Sequence::new();
        let mut configs = Sequence::new();

        let channel = aprs.channel(&mut channels);
        assert_eq!(channel.name, "APRS");
        assert_eq!(channel.rx_freq, 144.800);
        assert_eq!(channel.tx_power, TxPower::Max);

        let config = aprs.config(&mut configs).unwrap();
        assert_eq!(config.channel_id, channel.id);
        assert_eq!(config.source, "SP5ABC-7");
        assert_eq!(config.message, "SP5ABC testing");
        assert_eq!(config.path, vec!["WIDE1-1", "WIDE2-1"]);
        assert_eq!(config.period, 60);

        // repeated calls do not allocate again
        assert_eq!(aprs.channel(&mut channels).id, channel.id);
        assert_eq!(aprs.config(&mut configs).unwrap().id, config.id);
        assert_eq!(channels.allocated(), 1);
        assert_eq!(configs.allocated(), 1);
    }

    #[test]
    fn test_analog_aprs_config_before_channel_fails() {
        let mut aprs = AnalogAprs::new("SP5ABC", AprsRegion::Eu);
        let mut configs = Sequence::new();
        assert!(matches!(aprs.config(&mut configs), Err(CodeplugError::AprsChannelMissing)));
        assert_eq!(configs.allocated(), 0);
    }

    #[test]
    fn test_us_frequency() {
        let mut aprs = AnalogAprs::new("N0CALL", AprsRegion::Us);
        let mut seq = Sequence::new();
        let produced = aprs.produce(&mut seq);
        assert_eq!(produced[0].rx_freq, 144.390);
    }

    #[test]
    fn test_digital_aprs_config() {
        let mut aprs = DigitalAprs::new(1);
        let mut seq = Sequence::new();
        let config = aprs.config(&mut seq);
        assert_eq!(config.name, "DMR APRS");
        assert_eq!(config.period, 180);
        assert_eq!(config.contact_id, 1);
        assert_eq!(aprs.config(&mut seq), config);
        assert_eq!(seq.allocated(), 1);
    }
}
