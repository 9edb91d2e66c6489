//! Analog channel producers: PMR446 ladder and repeater directory

use dmrgen_common::{AnalogChannel, AprsId, Sequence, TxPower};

use super::located_hints;
use crate::module::datasource::{AnalogRepeater, AnalogRepeaterDirectory, Geocoder};
use crate::module::generator::Generate;

const PMR446_BASE_MHZ: f64 = 446.00625;
const PMR446_STEP_MHZ: f64 = 0.0125;
const PMR446_CHANNELS: u32 = 16;
const PMR446_TONE_HZ: f64 = 110.9;

/// Minimum split for a record to count as a repeater
const MIN_SPLIT_MHZ: f64 = 0.0001;

/// The sixteen licence-free PMR446 channels, "PMR 1" to "PMR 16".
#[derive(Debug, Clone, Default)]
pub struct Pmr446Channels {
    pub aprs_id: Option<AprsId>,
}

impl Pmr446Channels {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Generate for Pmr446Channels {
    type Entity = AnalogChannel;

    fn label(&self) -> String {
        "PMR446".to_string()
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<AnalogChannel> {
        (0..PMR446_CHANNELS)
            .map(|index| {
                let frequency = PMR446_BASE_MHZ + f64::from(index) * PMR446_STEP_MHZ;
                let mut channel = AnalogChannel::new(seq.next_id(), format!("PMR {}", index + 1), frequency, frequency);
                channel.tx_power = TxPower::Low;
                channel.rx_tone = Some(PMR446_TONE_HZ);
                channel.tx_tone = Some(PMR446_TONE_HZ);
                channel.aprs_id = self.aprs_id;
                channel
            })
            .collect()
    }
}

/// One channel per on-air analog repeater of a regional export.
///
/// Records without coordinates are located through the geocoder when they
/// name a place.
pub struct RepeaterAnalogChannels<'d, A: AnalogRepeaterDirectory + ?Sized> {
    repeaters: &'d A,
    geocoder: &'d dyn Geocoder,
    pub aprs_id: Option<AprsId>,
}

impl<'d, A: AnalogRepeaterDirectory + ?Sized> RepeaterAnalogChannels<'d, A> {
    pub fn new(repeaters: &'d A, geocoder: &'d dyn Geocoder) -> Self {
        Self {
            repeaters,
            geocoder,
            aprs_id: None,
        }
    }

    fn usable(repeater: &AnalogRepeater) -> bool {
        // records without a status are assumed on air
        if repeater.status.is_some_and(|status| !status.is_on_air()) {
            return false;
        }
        let (output, input) = (repeater.output_freq, repeater.input_freq);
        output.is_finite() && input.is_finite() && output > 0.0 && input > 0.0 && (input - output).abs() >= MIN_SPLIT_MHZ
    }

    fn channel(&self, seq: &mut Sequence, repeater: &AnalogRepeater) -> AnalogChannel {
        let callsign = repeater.callsign.trim();
        let name = if callsign.is_empty() {
            format!("{:.4}", repeater.output_freq)
        } else {
            callsign.to_string()
        };

        let location = repeater.coordinates().or_else(|| {
            let place = repeater.city.as_deref().or(repeater.qth.as_deref())?;
            self.geocoder
                .locate(place, repeater.state.as_deref(), repeater.country.as_deref())
        });

        let mut channel = AnalogChannel::new(seq.next_id(), name, repeater.output_freq, repeater.input_freq);
        channel.tx_power = TxPower::High;
        channel.rx_tone = repeater.ctcss_tx;
        channel.tx_tone = repeater.ctcss_rx;
        channel.aprs_id = self.aprs_id;
        channel.hints = located_hints(
            location,
            repeater.locator.clone(),
            Some(callsign.to_string()),
            repeater.qth.clone().or_else(|| repeater.city.clone()),
        );
        channel
    }
}

impl<A: AnalogRepeaterDirectory + ?Sized> Generate for RepeaterAnalogChannels<'_, A> {
    type Entity = AnalogChannel;

    fn label(&self) -> String {
        "repeater directory (analog)".to_string()
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<AnalogChannel> {
        let all = self.repeaters.repeaters();
        let channels: Vec<AnalogChannel> = all
            .iter()
            .filter(|repeater| Self::usable(repeater))
            .map(|repeater| self.channel(seq, repeater))
            .collect();

        let unlocated = channels.iter().filter(|c| c.hints.coordinates().is_none()).count();
        tracing::info!(
            "{} analog channels from {} repeater records ({} without location)",
            channels.len(),
            all.len(),
            unlocated
        );
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::datasource::{JsonAnalogRepeaters, NoGeocoder, TableGeocoder};
    use crate::module::generator::{Producer, Source};
    use dmrgen_common::{ChannelWidth, Coordinates};

    #[test]
    fn test_pmr446_ladder() {
        let mut seq = Sequence::new();
        let channels = Producer::new(Pmr446Channels::new()).produce(&mut seq);

        assert_eq!(channels.len(), 16);
        assert_eq!(channels[0].name, "PMR 1");
        assert_eq!(channels[0].rx_freq, 446.00625);
        assert_eq!(channels[15].name, "PMR 16");
        assert!((channels[15].rx_freq - 446.19375).abs() < 1e-9);
        assert!(channels.iter().all(|c| c.rx_tone == Some(110.9) && c.width == ChannelWidth::Narrow));
        assert!(channels.iter().all(|c| c.tx_power == TxPower::Low));
    }

    fn repeaters() -> JsonAnalogRepeaters {
        JsonAnalogRepeaters::parse(
            r#"[
                {"callsign": "SR5W", "output_freq": 145.6, "input_freq": 145.0, "ctcss_tx": 127.3, "ctcss_rx": 88.5,
                 "lat": 52.2, "lng": 21.0, "qth": "Warszawa", "status": "WORKING"},
                {"callsign": "SR5OFF", "output_freq": 145.625, "input_freq": 145.025, "status": "OFF"},
                {"callsign": "SR5SPX", "output_freq": 145.5, "input_freq": 145.5},
                {"callsign": "", "output_freq": 439.125, "input_freq": 431.525, "city": "Springfield", "state": "IL"},
                {"callsign": "SR5Z", "output_freq": 0, "input_freq": 145.0}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_repeater_channels_skip_unusable_records() {
        let repeaters = repeaters();
        let mut seq = Sequence::new();
        let channels = Producer::new(RepeaterAnalogChannels::new(&repeaters, &NoGeocoder)).produce(&mut seq);

        let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["SR5W", "439.1250"]);

        let sr5w = &channels[0];
        assert_eq!(sr5w.rx_freq, 145.6);
        assert_eq!(sr5w.tx_freq, 145.0);
        assert_eq!(sr5w.rx_tone, Some(127.3));
        assert_eq!(sr5w.tx_tone, Some(88.5));
        assert_eq!(sr5w.hints.qth.as_deref(), Some("Warszawa"));
        assert!(sr5w.hints.locator.is_some());

        assert!(channels[1].hints.rpt_callsign.is_none());
        assert!(channels[1].hints.coordinates().is_none());
    }

    #[test]
    fn test_repeater_channels_geocoder_fallback() {
        let repeaters = repeaters();
        let mut geocoder = TableGeocoder::default();
        geocoder.insert("Springfield", Some("IL"), None, Coordinates::new(39.78, -89.65).unwrap());

        let mut seq = Sequence::new();
        let channels = Producer::new(RepeaterAnalogChannels::new(&repeaters, &geocoder)).produce(&mut seq);
        let located = channels[1].hints.coordinates().unwrap();
        assert_eq!(located.lat, 39.78);
    }
}
