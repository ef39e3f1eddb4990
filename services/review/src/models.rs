//! Review models decoded from process records

use serde::Serialize;

use crate::models::channel::ChannelData;

pub mod channel;

/// Everything the review page needs about an actionable process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewData {
    pub process_id: String,
    pub channel_id: String,
    pub channel: ChannelData,
}
