//! JSON-lines stream sink (the default, writing to stdout)

use crate::miner::Item;
use crate::output::traits::{Sink, SinkResult};
use std::io::{self, Stdout, Write};
use std::sync::Mutex;

/// Writes each record as one compact JSON line to a stream
pub struct StreamSink<W> {
    writer: Mutex<W>,
}

impl StreamSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, W> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Sink for StreamSink<W> {
    fn write_item(&self, item: &Item) -> SinkResult<()> {
        let mut line = serde_json::to_vec(&item.metadata)?;
        line.push(b'\n');

        let mut writer = self.lock();
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }

    fn finish(&self) -> SinkResult<()> {
        self.lock().flush()?;
        Ok(())
    }
}
