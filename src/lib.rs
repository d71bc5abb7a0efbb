pub mod overlay;
pub mod stamp;

pub use stamp::{
    DateSource, OutputPolicy, ResolvedDate, SaveOptions, StampError, TimestampResult,
    add_timestamp,
};
