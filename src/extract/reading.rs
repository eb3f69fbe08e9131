use crate::extract::channel::Channel;
use chrono::NaiveDateTime;

/// One sensor sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    /// Year of the export period, not of `timestamp`
    pub year: i32,
    /// Month of the export period, not of `timestamp`
    pub month: u32,
    pub timestamp: NaiveDateTime,
    /// Values indexed by [`Channel::index`], `None` where the sheet had no usable number
    pub channels: [Option<f64>; 5],
}

impl Reading {
    pub fn channel(&self, channel: Channel) -> Option<f64> {
        self.channels[channel.index()]
    }
}
