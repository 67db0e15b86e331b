use super::supervisor::TelemetrySnapshot;
use crate::{error, info};
use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::Path,
};
use strum_macros::Display;
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};

#[derive(Debug, Display)]
pub enum RecorderError {
    Io(std::io::Error),
    Encode(bincode::error::EncodeError),
}

impl std::error::Error for RecorderError {}

impl From<std::io::Error> for RecorderError {
    fn from(value: std::io::Error) -> Self { RecorderError::Io(value) }
}

impl From<bincode::error::EncodeError> for RecorderError {
    fn from(value: bincode::error::EncodeError) -> Self { RecorderError::Encode(value) }
}

/// Appends telemetry frames to a sink, one `bincode` record per snapshot.
pub struct FlightRecorder<W: Write> {
    sink: W,
    frames: u64,
}

impl FlightRecorder<BufWriter<std::fs::File>> {
    /// Opens `path` for appending, creating it if missing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, RecorderError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> FlightRecorder<W> {
    /// About one second of frames at the default loop rate.
    const FLUSH_EVERY: u64 = 250;

    pub fn new(sink: W) -> Self { Self { sink, frames: 0 } }

    /// Encodes one frame, returns its size in bytes.
    pub fn record(&mut self, snapshot: &TelemetrySnapshot) -> Result<usize, RecorderError> {
        let written = bincode::serde::encode_into_std_write(snapshot, &mut self.sink, bincode::config::standard())?;
        self.frames += 1;
        Ok(written)
    }

    pub fn frames(&self) -> u64 { self.frames }

    pub fn flush(&mut self) -> Result<(), RecorderError> { Ok(self.sink.flush()?) }

    pub fn into_inner(self) -> W { self.sink }

    /// Records every snapshot published on `rx` on the blocking pool until the
    /// sender is dropped or a write fails. Sink writes never run on the thread
    /// driving the control loop. Resolves to the number of frames written.
    ///
    /// # Panics
    /// If called outside a tokio runtime.
    pub fn spawn(self, rx: watch::Receiver<TelemetrySnapshot>) -> JoinHandle<u64>
    where
        W: Send + 'static,
    {
        let handle = Handle::current();
        tokio::task::spawn_blocking(move || self.drain(&handle, rx))
    }

    fn drain(mut self, handle: &Handle, mut rx: watch::Receiver<TelemetrySnapshot>) -> u64 {
        while handle.block_on(rx.changed()).is_ok() {
            let snapshot = *rx.borrow_and_update();
            let res = self.record(&snapshot).and_then(|_| {
                if self.frames % Self::FLUSH_EVERY == 0 { self.flush() } else { Ok(()) }
            });
            if let Err(e) = res {
                error!("Flight recorder stopped after {} frames: {e:?}", self.frames);
                return self.frames;
            }
        }
        if let Err(e) = self.flush() {
            error!("Flight recorder flush failed: {e:?}");
        }
        info!("Flight recorder closed with {} frames", self.frames);
        self.frames
    }
}
