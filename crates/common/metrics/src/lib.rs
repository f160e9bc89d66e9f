pub mod helpers;

use helpers::{SLOT_DURATION_BUCKETS, create_histogram_vec, create_int_counter_vec};
use prometheus_exporter::prometheus::{HistogramVec, IntCounterVec};

lazy_static::lazy_static! {
    pub static ref FETCH_DURATION: HistogramVec = create_histogram_vec(
        "tessera_fetch_duration_seconds",
        "Duration of fetching the unsigned data of a duty",
        &["duty"],
        SLOT_DURATION_BUCKETS
    );

    pub static ref FETCH_ERRORS: IntCounterVec = create_int_counter_vec(
        "tessera_fetch_errors_total",
        "Number of failed duty fetches",
        &["duty"]
    );

    pub static ref LEADERCAST_BROADCAST_ERRORS: IntCounterVec = create_int_counter_vec(
        "tessera_leadercast_broadcast_errors_total",
        "Number of peers a leader-cast broadcast failed to reach",
        &[]
    );

    pub static ref LEADERCAST_INBOUND_DROPPED: IntCounterVec = create_int_counter_vec(
        "tessera_leadercast_inbound_dropped_total",
        "Number of inbound leader-cast messages discarded",
        &["reason"]
    );
}
