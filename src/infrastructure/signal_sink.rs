use crate::domain::ports::SignalSink;
use crate::domain::signal::Signal;
use anyhow::{Context, Result};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Writes each signal as one JSON object per line.
pub struct JsonLinesSignalSink<W: Write + Send> {
    writer: W,
    written: usize,
}

impl<W: Write + Send> JsonLinesSignalSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> SignalSink for JsonLinesSignalSink<W> {
    fn publish(&mut self, signal: &Signal) -> Result<()> {
        serde_json::to_writer(&mut self.writer, signal)
            .with_context(|| format!("Failed to serialize signal {}", signal.id))?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush signal output")
    }
}

/// Collects signals in memory; clones of [`handle`](Self::handle) observe them.
#[derive(Debug, Clone, Default)]
pub struct InMemorySignalSink {
    signals: Arc<Mutex<Vec<Signal>>>,
}

impl InMemorySignalSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<Signal>>> {
        Arc::clone(&self.signals)
    }
}

impl SignalSink for InMemorySignalSink {
    fn publish(&mut self, signal: &Signal) -> Result<()> {
        self.signals
            .lock()
            .map_err(|_| anyhow::anyhow!("signal buffer lock poisoned"))?
            .push(signal.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::smc::Bias;
    use uuid::Uuid;

    fn signal() -> Signal {
        Signal {
            id: Uuid::new_v4(),
            symbol: "XAUUSD".to_string(),
            bias: Bias::Bearish,
            confidence: 76.0,
            entry: 2000.0,
            tp1: 1995.0,
            tp2: 1991.0,
            tp3: 1985.0,
            sl: 2004.0,
            risk_reward: 1.25,
            zone: None,
            reasons: vec!["Downtrend structure (+15)".to_string()],
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_json_lines_output() {
        let mut sink = JsonLinesSignalSink::new(Vec::new());
        sink.publish(&signal()).unwrap();
        sink.publish(&signal()).unwrap();
        assert_eq!(sink.written(), 2);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Signal = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.bias, Bias::Bearish);
        assert_eq!(parsed.tp1, 1995.0);
    }

    #[test]
    fn test_in_memory_handle_sees_published() {
        let mut sink = InMemorySignalSink::new();
        let handle = sink.handle();
        sink.publish(&signal()).unwrap();
        assert_eq!(handle.lock().unwrap().len(), 1);
    }
}
