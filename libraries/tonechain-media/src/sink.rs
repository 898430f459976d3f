/// File sink
use crate::buffer::Buffer;
use crate::caps::Caps;
use crate::error::FlowError;
use crate::processor::Processor;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Writes every byte buffer it receives to a file (`filesink`)
///
/// The file is created when caps are negotiated, i.e. only once data is
/// actually about to flow.
pub struct FileSink {
    location: PathBuf,
    file: Option<BufWriter<File>>,
    written: u64,
}

impl FileSink {
    /// Create a sink for `location`
    pub fn new(location: PathBuf) -> Self {
        Self {
            location,
            file: None,
            written: 0,
        }
    }

    fn write_error(&self, e: std::io::Error) -> FlowError {
        FlowError::resource(
            "Error while writing to file",
            format!("{}: {}", self.location.display(), e),
        )
    }
}

impl Processor for FileSink {
    fn negotiate(&mut self, caps: &Caps) -> Result<Caps, FlowError> {
        let file = File::create(&self.location).map_err(|e| {
            FlowError::resource(
                "Could not open file for writing",
                format!("{}: {}", self.location.display(), e),
            )
        })?;
        self.file = Some(BufWriter::new(file));
        Ok(caps.clone())
    }

    fn process(&mut self, buffer: Buffer) -> Result<Option<Buffer>, FlowError> {
        let Buffer::Bytes(bytes) = buffer else {
            return Err(FlowError::NotNegotiated(
                "filesink expects encoded bytes".to_string(),
            ));
        };
        let Some(file) = self.file.as_mut() else {
            return Err(FlowError::NotNegotiated("filesink not negotiated".to_string()));
        };

        if let Err(e) = file.write_all(&bytes) {
            return Err(self.write_error(e));
        }
        self.written += bytes.len() as u64;
        Ok(None)
    }

    fn finish(&mut self) -> Result<Option<Buffer>, FlowError> {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                return Err(self.write_error(e));
            }
            tracing::debug!(
                "filesink: wrote {} bytes to {}",
                self.written,
                self.location.display()
            );
        }
        Ok(None)
    }
}
