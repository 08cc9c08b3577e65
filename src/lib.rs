pub mod aggregate;
pub mod error;
pub mod flight;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stats;

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/wing_stats.rs"));
}
