//! Profile manager and the module arguments it creates and later matches.
//!
//! The manager keeps no record of what it created. Every deploy and reset
//! re-derives object identity from the module argument strings below, so a
//! reset works after a restart or against devices made by another process,
//! as long as no two profiles share a `virtual_sink`.

use crate::config::Profile;
use crate::pactl::Client;

pub(crate) const NULL_SINK_MODULE: &str = "module-null-sink";
pub(crate) const LOOPBACK_MODULE: &str = "module-loopback";

/// Loopback latency requested for real-time monitoring.
pub(crate) const LOOPBACK_LATENCY_ARG: &str = "latency_msec=1";

/// Deploys and resets routing profiles against a sound server.
pub struct Manager {
    client: Client,
}

impl Manager {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }
}

/// `sink_name=<name>` argument of a null sink.
pub(crate) fn sink_name_arg(name: &str) -> String {
    format!("sink_name={}", name)
}

/// Properties that make the mic sink show up as a virtual microphone in mixers.
pub(crate) fn mic_properties_arg(profile: &Profile) -> String {
    let description = profile.mic_description().replace('"', "'");
    format!(
        "sink_properties=device.description=\"{}\" device.class=\"audio\" media.class=\"Audio/Source/Virtual\" device.icon_name=\"audio-input-microphone\"",
        description
    )
}

/// Arguments that identify the loopback from `monitor` into `mic_sink`.
pub(crate) fn loopback_args(monitor: &str, mic_sink: &str) -> [String; 2] {
    [format!("source={}", monitor), format!("sink={}", mic_sink)]
}
