pub mod producer;

pub use producer::{Producer, ProducerHandle, SampleSink};
