pub mod resilient_source;

pub use resilient_source::ResilientSource;
