pub mod decode;
#[cfg(feature = "live")]
pub mod device;
pub mod feeder;
pub mod ingest;

/// Something delivering audio to an `IngestAdapter` in the background.
pub trait SampleSource {
    /// True once no more audio will arrive.
    fn is_finished(&self) -> bool;
    fn stop(self: Box<Self>);
}
