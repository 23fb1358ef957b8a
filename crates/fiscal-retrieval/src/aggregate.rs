//! Result assembly for the two request shapes.

use fiscal_core::types::{ChannelResult, ChannelType, Filters, Hit};

use crate::dedup::dedupe;
use crate::filters;

/// Filters a channel sees on the multi-source path: the request filters (or
/// the defaults) restricted to that channel.
pub fn channel_filters(requested: Option<&Filters>, channel: ChannelType) -> Filters {
    let mut filters = requested.cloned().unwrap_or_default();
    filters.source_types = Some(vec![channel]);
    filters
}

/// One channel's pipeline: dedupe within the channel, filter, cap.
pub fn per_channel(channel: ChannelType, hits: Vec<Hit>, filters: &Filters, top_k: usize) -> ChannelResult {
    let mut hits = filters::apply(dedupe(hits), filters);
    hits.truncate(top_k);
    ChannelResult { source_type: channel, hits }
}

/// Single-query path: channel results concatenated in request order, filtered
/// when filters were supplied, deduped, then capped.
pub fn merged(per_channel_hits: Vec<Vec<Hit>>, filters: Option<&Filters>, top_k: usize) -> Vec<Hit> {
    let mut hits: Vec<Hit> = per_channel_hits.into_iter().flatten().collect();
    if let Some(filters) = filters {
        hits = filters::apply(hits, filters);
    }
    let mut hits = dedupe(hits);
    hits.truncate(top_k);
    hits
}

/// Cross-channel union, deduped again. The groups are read, never modified.
pub fn aggregate(groups: &[ChannelResult]) -> Vec<Hit> {
    dedupe(groups.iter().flat_map(|g| g.hits.iter().cloned()).collect())
}
