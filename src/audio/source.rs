use std::fs::File;
use std::io::{BufReader, ErrorKind, Seek, SeekFrom};
use std::path::Path;

use hound::WavReader;

use crate::error::{CwaveError, Result};
use crate::wav::{WavHeader, wav_error};

/// One stereo input sample
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f64,
    pub right: f64,
}

impl StereoFrame {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }
}

/// Rewindable source of stereo frames with a known length
pub trait StereoSource: Send {
    fn sample_rate(&self) -> u32;

    /// Total number of frames
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next frame, or `None` once all `len()` frames were read
    fn next_frame(&mut self) -> Result<Option<StereoFrame>>;

    /// Restart from the first frame
    fn rewind(&mut self) -> Result<()>;
}

/// Frames held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: Vec<StereoFrame>,
    position: usize,
    sample_rate: u32,
}

impl MemorySource {
    pub fn new(frames: Vec<StereoFrame>, sample_rate: u32) -> Self {
        Self {
            frames,
            position: 0,
            sample_rate,
        }
    }

    /// Build from interleaved [L, R, L, R, ...] 16-bit samples
    pub fn from_interleaved(samples: &[i16], sample_rate: u32) -> Self {
        let frames = samples
            .chunks_exact(2)
            .map(|c| StereoFrame::new(c[0] as f64, c[1] as f64))
            .collect();
        Self::new(frames, sample_rate)
    }
}

impl StereoSource for MemorySource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn len(&self) -> usize {
        self.frames.len()
    }

    fn next_frame(&mut self) -> Result<Option<StereoFrame>> {
        let frame = self.frames.get(self.position).copied();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }
}

/// Streaming reader for canonical 16-bit stereo WAV files
///
/// The 44-byte canonical header is checked first; samples are then decoded
/// by `hound`.
pub struct WavFileSource {
    reader: WavReader<BufReader<File>>,
    header: WavHeader,
    position: usize,
}

impl WavFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = BufReader::new(File::open(path.as_ref())?);
        let header = WavHeader::read_from(&mut file)?;
        file.seek(SeekFrom::Start(0))?;
        let reader = WavReader::new(file).map_err(wav_error)?;
        if reader.duration() != header.frames {
            return Err(CwaveError::Format(format!(
                "WAVE header declares {} frames, decoder found {}",
                header.frames,
                reader.duration()
            )));
        }
        log::debug!(
            "WAV input: {} frames at {} Hz ({:.2} s)",
            header.frames,
            header.sample_rate,
            header.duration_secs()
        );
        Ok(Self {
            reader,
            header,
            position: 0,
        })
    }

    fn truncated(&self) -> CwaveError {
        CwaveError::Io(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!(
                "input WAV data ends at frame {} of {}",
                self.position, self.header.frames
            ),
        ))
    }
}

impl StereoSource for WavFileSource {
    fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    fn len(&self) -> usize {
        self.header.frames as usize
    }

    fn next_frame(&mut self) -> Result<Option<StereoFrame>> {
        if self.position >= self.len() {
            return Ok(None);
        }
        let mut samples = self.reader.samples::<i16>();
        let (left, right) = match (samples.next(), samples.next()) {
            (Some(left), Some(right)) => (left.map_err(wav_error)?, right.map_err(wav_error)?),
            (Some(Err(e)), None) => return Err(wav_error(e)),
            _ => return Err(self.truncated()),
        };
        self.position += 1;
        Ok(Some(StereoFrame::new(left as f64, right as f64)))
    }

    fn rewind(&mut self) -> Result<()> {
        self.reader.seek(0)?;
        self.position = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::save_wav;

    #[test]
    fn test_memory_source_reads_and_rewinds() {
        let mut source = MemorySource::from_interleaved(&[1, 2, 3, 4, 5, 6], 8000);
        assert_eq!(source.len(), 3);

        assert_eq!(source.next_frame().unwrap(), Some(StereoFrame::new(1.0, 2.0)));
        assert_eq!(source.next_frame().unwrap(), Some(StereoFrame::new(3.0, 4.0)));
        assert_eq!(source.next_frame().unwrap(), Some(StereoFrame::new(5.0, 6.0)));
        assert_eq!(source.next_frame().unwrap(), None);

        source.rewind().unwrap();
        assert_eq!(source.next_frame().unwrap(), Some(StereoFrame::new(1.0, 2.0)));
    }

    #[test]
    fn test_wav_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.wav");
        save_wav(&path, &[100, -100, i16::MAX, i16::MIN], 44_100).unwrap();

        let mut source = WavFileSource::open(&path).unwrap();
        assert_eq!(source.sample_rate(), 44_100);
        assert_eq!(source.len(), 2);
        assert_eq!(source.next_frame().unwrap(), Some(StereoFrame::new(100.0, -100.0)));
        assert_eq!(
            source.next_frame().unwrap(),
            Some(StereoFrame::new(32_767.0, -32_768.0))
        );
        assert_eq!(source.next_frame().unwrap(), None);

        source.rewind().unwrap();
        assert_eq!(source.next_frame().unwrap(), Some(StereoFrame::new(100.0, -100.0)));
    }

    #[test]
    fn test_wav_file_source_truncated_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.wav");
        save_wav(&path, &[1, 2, 3, 4], 8000).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 2);
        std::fs::write(&path, &bytes).unwrap();

        let mut source = WavFileSource::open(&path).unwrap();
        assert!(source.next_frame().unwrap().is_some());
        assert!(matches!(source.next_frame(), Err(CwaveError::Io(_))));
    }
}
