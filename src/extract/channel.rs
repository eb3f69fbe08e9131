//! Heuristic mapping of header labels to sensor channels.
//!
//! GL860 exports label their columns with units rather than names, and the same unit can
//! appear twice (ambient and device temperature). Columns are offered left to right to an
//! ordered list of [`ChannelMatcher`]s; the first matcher whose channel is still free claims
//! the column, and a claimed channel is never reassigned.

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

const TEMPERATURE_TOKENS: [&str; 3] = ["degc", "°c", "℃"];
const HUMIDITY_TOKENS: [&str; 2] = ["%", "rh"];
const IRRADIANCE_TOKENS: [&str; 2] = ["w/m2", "w/m²"];
const ILLUMINANCE_TOKENS: [&str; 1] = ["lux"];
const TIMESTAMP_TOKENS: [&str; 2] = ["time", "時間"];
const ADMINISTRATIVE_LABELS: [&str; 3] = ["no.", "no", "number"];
const UNNAMED_PREFIX: &str = "unnamed";

/// `.1`, `.2`, … appended to repeated labels
static DUPLICATE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\d+$").expect("Hardcode regex pattern"));

/// The five semantic slots a reading can populate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Temperature,
    Humidity,
    Irradiance,
    Illuminance,
    DeviceTemperature,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::Irradiance,
        Channel::Illuminance,
        Channel::DeviceTemperature,
    ];

    /// Zero-based slot, `channel_1` is 0
    pub fn index(self) -> usize {
        match self {
            Channel::Temperature => 0,
            Channel::Humidity => 1,
            Channel::Irradiance => 2,
            Channel::Illuminance => 3,
            Channel::DeviceTemperature => 4,
        }
    }

    /// Column of the readings table holding this channel
    pub fn column_name(self) -> &'static str {
        match self {
            Channel::Temperature => "channel1_temperature",
            Channel::Humidity => "channel2_humidity",
            Channel::Irradiance => "channel3_uv",
            Channel::Illuminance => "channel4_lux",
            Channel::DeviceTemperature => "channel5_device_temp",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
            Channel::Irradiance => "UV",
            Channel::Illuminance => "illuminance",
            Channel::DeviceTemperature => "device temperature",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CH{}", self.index() + 1)
    }
}

/// A column label as the data region presents it.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    /// Column index (0-based)
    pub column: usize,
    /// Label with a `.N` suffix when it repeats an earlier one
    pub label: String,
}

impl Header {
    pub fn new(column: usize, label: &str) -> Header {
        Header {
            column,
            label: label.to_owned(),
        }
    }

    fn lower(&self) -> String {
        self.label.to_lowercase()
    }

    fn contains_any(&self, tokens: &[&str]) -> bool {
        let lower = self.lower();
        tokens.iter().any(|token| lower.contains(token))
    }

    pub fn is_timestamp(&self) -> bool {
        self.contains_any(&TIMESTAMP_TOKENS)
    }

    pub fn is_temperature(&self) -> bool {
        self.contains_any(&TEMPERATURE_TOKENS)
    }

    /// Row numbers and columns without a label.
    pub fn is_administrative(&self) -> bool {
        let lower = self.lower();
        let lower = lower.trim();
        lower.is_empty() || lower.starts_with(UNNAMED_PREFIX) || ADMINISTRATIVE_LABELS.contains(&lower)
    }

    /// Whether the label repeats an earlier one, e.g. the second `degC` column `degC.1`.
    pub fn is_duplicate(&self) -> bool {
        DUPLICATE_SUFFIX.is_match(self.label.trim())
    }
}

/// Suffixes repeated labels with their occurrence count: `degC`, `degC.1`, `degC.2`.
pub fn deduplicate_labels(headers: &mut [Header]) {
    let mut seen = std::collections::HashMap::<String, usize>::new();
    for header in headers.iter_mut() {
        let count = seen.entry(header.label.clone()).or_insert(0);
        if *count > 0 {
            header.label = format!("{}.{}", header.label, count);
        }
        *count += 1;
    }
}

/// Column assignment for every channel. Slots are filled once and never overwritten.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelMap {
    slots: [Option<Header>; 5],
}

impl ChannelMap {
    /// The header assigned to `channel`
    pub fn header(&self, channel: Channel) -> Option<&Header> {
        self.slots[channel.index()].as_ref()
    }

    /// The column assigned to `channel`
    pub fn column(&self, channel: Channel) -> Option<usize> {
        self.header(channel).map(|header| header.column)
    }

    pub fn is_assigned(&self, channel: Channel) -> bool {
        self.slots[channel.index()].is_some()
    }

    /// Number of assigned channels
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Claims `channel` for `header`. Returns false when the slot is already taken.
    fn assign(&mut self, channel: Channel, header: &Header) -> bool {
        let slot = &mut self.slots[channel.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(header.clone());
        true
    }
}

impl Display for ChannelMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let assignments: Vec<String> = Channel::ALL
            .iter()
            .map(|channel| match self.header(*channel) {
                Some(header) => format!("{}={}", channel, header.label),
                None => format!("{}=-", channel),
            })
            .collect();
        write!(f, "{}", assignments.join(", "))
    }
}

/// What a matcher may look at besides the header itself.
pub struct MatchContext<'a> {
    /// Number of temperature-unit columns among the data headers
    pub temperature_columns: usize,
    /// Assignments made so far
    pub assigned: &'a ChannelMap,
}

/// A predicate deciding whether a header belongs to one channel.
pub trait ChannelMatcher {
    fn matches(&self, header: &Header, context: &MatchContext<'_>) -> Option<Channel>;
}

/// First temperature column: `degC`, `°C` or `℃` without a duplicate suffix.
pub struct AmbientTemperature;

impl ChannelMatcher for AmbientTemperature {
    fn matches(&self, header: &Header, _: &MatchContext<'_>) -> Option<Channel> {
        (header.is_temperature() && !header.is_duplicate()).then_some(Channel::Temperature)
    }
}

/// `%` or `RH`.
pub struct RelativeHumidity;

impl ChannelMatcher for RelativeHumidity {
    fn matches(&self, header: &Header, _: &MatchContext<'_>) -> Option<Channel> {
        header.contains_any(&HUMIDITY_TOKENS).then_some(Channel::Humidity)
    }
}

/// `W/m2` without a duplicate suffix.
pub struct SolarIrradiance;

impl ChannelMatcher for SolarIrradiance {
    fn matches(&self, header: &Header, _: &MatchContext<'_>) -> Option<Channel> {
        (header.contains_any(&IRRADIANCE_TOKENS) && !header.is_duplicate()).then_some(Channel::Irradiance)
    }
}

/// `lux`.
pub struct Illuminance;

impl ChannelMatcher for Illuminance {
    fn matches(&self, header: &Header, _: &MatchContext<'_>) -> Option<Channel> {
        header.contains_any(&ILLUMINANCE_TOKENS).then_some(Channel::Illuminance)
    }
}

/// A repeated temperature column, or any further temperature column once channel 1 is taken
/// by another column and the sheet has at least two of them.
pub struct DeviceTemperature;

impl ChannelMatcher for DeviceTemperature {
    fn matches(&self, header: &Header, context: &MatchContext<'_>) -> Option<Channel> {
        if !header.is_temperature() {
            return None;
        }
        let ambient_elsewhere = context
            .assigned
            .column(Channel::Temperature)
            .is_some_and(|column| column != header.column);
        let second_temperature = context.temperature_columns >= 2 && ambient_elsewhere;
        (header.is_duplicate() || second_temperature).then_some(Channel::DeviceTemperature)
    }
}

/// The matchers in priority order.
pub fn default_matchers() -> Vec<Box<dyn ChannelMatcher>> {
    vec![
        Box::new(AmbientTemperature),
        Box::new(RelativeHumidity),
        Box::new(SolarIrradiance),
        Box::new(Illuminance),
        Box::new(DeviceTemperature),
    ]
}

/// Assigns data columns to channels, scanning `headers` left to right.
///
/// Matchers whose channel is already taken are skipped, so a column falls through to the
/// next matcher that still has a free slot. Columns no matcher claims are ignored.
pub fn classify(headers: &[Header], matchers: &[Box<dyn ChannelMatcher>]) -> ChannelMap {
    let temperature_columns = headers.iter().filter(|header| header.is_temperature()).count();
    let mut map = ChannelMap::default();
    for header in headers.iter().filter(|header| !header.is_administrative()) {
        let context = MatchContext {
            temperature_columns,
            assigned: &map,
        };
        let channel = matchers
            .iter()
            .filter_map(|matcher| matcher.matches(header, &context))
            .find(|channel| !map.is_assigned(*channel));
        if let Some(channel) = channel {
            map.assign(channel, header);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(labels: &[&str]) -> Vec<Header> {
        let mut headers: Vec<Header> = labels
            .iter()
            .enumerate()
            .map(|(column, label)| Header::new(column, label))
            .collect();
        deduplicate_labels(&mut headers);
        headers
    }

    fn columns(map: &ChannelMap) -> [Option<usize>; 5] {
        Channel::ALL.map(|channel| map.column(channel))
    }

    #[test]
    fn test_deduplicate_labels() {
        let headers = headers(&["degC", "%", "degC", "degC", "lux"]);
        let labels: Vec<&str> = headers.iter().map(|header| header.label.as_str()).collect();
        assert_eq!(labels, vec!["degC", "%", "degC.1", "degC.2", "lux"]);
    }

    #[test]
    fn test_full_gl860_layout() {
        let map = classify(&headers(&["degC", "%", "W/m2", "lux", "degC"]), &default_matchers());
        assert_eq!(columns(&map), [Some(0), Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(map.to_string(), "CH1=degC, CH2=%, CH3=W/m2, CH4=lux, CH5=degC.1");
    }

    #[test]
    fn test_partial_layout_leaves_other_slots_empty() {
        let map = classify(&headers(&["degC", "%RH", "W/m2"]), &default_matchers());
        assert_eq!(columns(&map), [Some(0), Some(1), Some(2), None, None]);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_two_temperature_columns_split_between_ambient_and_device() {
        let map = classify(&headers(&["℃", "%", "℃"]), &default_matchers());
        assert_eq!(map.column(Channel::Temperature), Some(0));
        assert_eq!(map.column(Channel::DeviceTemperature), Some(2));
    }

    #[test]
    fn test_distinct_temperature_labels_still_fill_device_slot() {
        let map = classify(&headers(&["°C", "degC"]), &default_matchers());
        assert_eq!(map.column(Channel::Temperature), Some(0));
        assert_eq!(map.column(Channel::DeviceTemperature), Some(1));
    }

    #[test]
    fn test_single_temperature_column_never_becomes_device_temperature() {
        let map = classify(&headers(&["%", "degC"]), &default_matchers());
        assert_eq!(map.column(Channel::Temperature), Some(1));
        assert!(!map.is_assigned(Channel::DeviceTemperature));
    }

    #[test]
    fn test_third_temperature_column_is_ignored() {
        let map = classify(&headers(&["degC", "degC", "degC"]), &default_matchers());
        assert_eq!(columns(&map), [Some(0), None, None, None, Some(1)]);
    }

    #[test]
    fn test_repeated_humidity_keeps_first_column() {
        let map = classify(&headers(&["%", "%"]), &default_matchers());
        assert_eq!(map.column(Channel::Humidity), Some(0));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_administrative_columns_are_ignored() {
        let map = classify(&headers(&["NO.", "Unnamed: 3", "Number", "lux"]), &default_matchers());
        assert_eq!(columns(&map), [None, None, None, Some(3), None]);
    }

    #[test]
    fn test_header_predicates() {
        assert!(Header::new(1, "Time").is_timestamp());
        assert!(Header::new(1, "Date&Time").is_timestamp());
        assert!(Header::new(1, "時間").is_timestamp());
        assert!(!Header::new(1, "degC").is_timestamp());
        assert!(Header::new(0, "NO.").is_administrative());
        assert!(Header::new(0, " ").is_administrative());
        assert!(!Header::new(0, "Notes").is_administrative());
        assert!(Header::new(4, "degC.1").is_duplicate());
        assert!(!Header::new(4, "W/m2").is_duplicate());
    }

    #[test]
    fn test_custom_matcher_order() {
        struct AnythingIsIlluminance;
        impl ChannelMatcher for AnythingIsIlluminance {
            fn matches(&self, _: &Header, _: &MatchContext<'_>) -> Option<Channel> {
                Some(Channel::Illuminance)
            }
        }

        let matchers: Vec<Box<dyn ChannelMatcher>> = vec![Box::new(AnythingIsIlluminance), Box::new(AmbientTemperature)];
        let map = classify(&headers(&["degC", "degC"]), &matchers);
        assert_eq!(map.column(Channel::Illuminance), Some(0));
        assert_eq!(map.column(Channel::Temperature), Some(1));
    }
}
