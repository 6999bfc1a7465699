//! Per-venue codec and transport selection.

use crate::adapter::outbound::venue::codec_for;
use crate::adapter::outbound::websocket::WebSocketTransport;
use crate::error::ConfigError;
use crate::infrastructure::config::venue::VenueConfig;
use crate::port::outbound::feed::VenueCodec;

/// Decoder for the venue's configured wire format.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when no codec is registered under
/// the configured name.
pub fn build_codec(venue: &VenueConfig) -> Result<Box<dyn VenueCodec>, ConfigError> {
    codec_for(venue.codec.as_str()).ok_or_else(|| ConfigError::InvalidValue {
        field: "venues.codec",
        reason: format!("no codec named '{}'", venue.codec),
    })
}

#[must_use]
pub fn build_transport(venue: &VenueConfig) -> WebSocketTransport {
    WebSocketTransport::new(venue.ws_url.clone())
}
