// Channel data source - replay of pre-recorded channel files
//
// Each physical channel is simulated by one CSV recording. On every poll a
// channel hands out its next page of `(time, velocity)` readings; the
// manager gathers one page per channel into a frame and pushes it to the
// consumer at a fixed interval.
//
// Recording layout: a header row, then one reading per row with the
// relative time in seconds in column 1 and the velocity in column 2
// (column 0, the absolute timestamp, is ignored).
//
// Termination: the frame in which every channel is empty is still sent,
// then the producer stops. It also stops as soon as the consumer hangs up.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::analysis::Sample;
use crate::config::SourceConfig;
use crate::error::SourceError;

/// One page per channel, in channel order
pub type Frame = Vec<Vec<Sample>>;

const TIME_COLUMN: usize = 1;
const VELOCITY_COLUMN: usize = 2;

/// Something that yields successive pages of one channel's readings
///
/// An empty page means the channel is exhausted.
pub trait ChannelSource: Send {
    fn next_vector(&mut self) -> Vec<Sample>;
}

/// Pages through a recording loaded in memory
pub struct RecordedChannel {
    samples: Vec<Sample>,
    cursor: usize,
    page_size: usize,
}

impl RecordedChannel {
    pub fn from_samples(samples: Vec<Sample>, page_size: usize) -> Self {
        Self {
            samples,
            cursor: 0,
            page_size: page_size.max(1),
        }
    }

    /// Load a CSV recording (header row skipped)
    pub fn open<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let unreadable = |reason: String| SourceError::RecordingUnreadable {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| unreadable(e.to_string()))?;

        let mut samples = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| unreadable(e.to_string()))?;
            let column = |index: usize, name: &str| -> Result<f64, SourceError> {
                let malformed = |reason: String| SourceError::MalformedRow {
                    path: path.to_path_buf(),
                    row: row + 1,
                    reason,
                };
                record
                    .get(index)
                    .ok_or_else(|| malformed(format!("missing {} column", name)))?
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| malformed(format!("{} is not a number: {}", name, e)))
            };
            samples.push(Sample::new(
                column(TIME_COLUMN, "time")?,
                column(VELOCITY_COLUMN, "velocity")?,
            ));
        }

        log::info!(
            "[RecordedChannel] Loaded {} readings from {}",
            samples.len(),
            path.display()
        );

        Ok(Self::from_samples(samples, page_size))
    }

    pub fn remaining(&self) -> usize {
        self.samples.len() - self.cursor
    }
}

impl ChannelSource for RecordedChannel {
    fn next_vector(&mut self) -> Vec<Sample> {
        let end = (self.cursor + self.page_size).min(self.samples.len());
        let page = self.samples[self.cursor..end].to_vec();
        self.cursor = end;
        page
    }
}

/// `.csv` files in `dir`, sorted by file name
pub fn discover_recordings<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, SourceError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| SourceError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut recordings: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    recordings.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(recordings)
}

/// Polls every channel on a fixed cadence and forwards the frames
pub struct SourceManager {
    channels: Vec<Box<dyn ChannelSource>>,
    poll_interval: Duration,
}

impl SourceManager {
    pub fn new(channels: Vec<Box<dyn ChannelSource>>, poll_interval: Duration) -> Self {
        Self {
            channels,
            poll_interval,
        }
    }

    /// One recorded channel per configured channel; channel i replays the
    /// i-th recording of `data_dir`
    pub fn from_config(config: &SourceConfig, channel_count: usize) -> Result<Self, SourceError> {
        let recordings = discover_recordings(&config.data_dir)?;
        if recordings.len() < channel_count {
            return Err(SourceError::NotEnoughRecordings {
                expected: channel_count,
                found: recordings.len(),
            });
        }

        let channels = recordings
            .iter()
            .take(channel_count)
            .map(|path| {
                RecordedChannel::open(path, config.page_size)
                    .map(|channel| Box::new(channel) as Box<dyn ChannelSource>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(
            channels,
            Duration::from_millis(config.poll_interval_ms),
        ))
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Next page of every channel
    pub fn poll(&mut self) -> Frame {
        self.channels
            .iter_mut()
            .map(|channel| channel.next_vector())
            .collect()
    }

    /// Produce frames until every channel is exhausted
    ///
    /// Returns the number of frames delivered.
    pub async fn run(mut self, tx: mpsc::Sender<Frame>) -> usize {
        let mut sent = 0;

        loop {
            let frame = self.poll();
            let exhausted = frame.iter().all(Vec::is_empty);

            if tx.send(frame).await.is_err() {
                log::warn!("[SourceManager] Consumer hung up after {} frames", sent);
                break;
            }
            sent += 1;

            if exhausted {
                log::info!("[SourceManager] All channels exhausted after {} frames", sent);
                break;
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn readings(n: usize) -> Vec<Sample> {
        (0..n).map(|i| Sample::new(i as f64, i as f64 * 2.0)).collect()
    }

    fn write_recording(dir: &Path, name: &str, rows: usize) -> PathBuf {
        let path = dir.join(name);
        let mut contents = String::from("time_abs,time_rel(sec),velocity(m/s)\n");
        for i in 0..rows {
            contents.push_str(&format!(
                "2024-01-01T00:00:{:02},{},{}\n",
                i % 60,
                i as f64 * 0.5,
                i as f64 * 1e-9
            ));
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_recorded_channel_pages_then_stays_empty() {
        let mut channel = RecordedChannel::from_samples(readings(5), 2);
        assert_eq!(channel.next_vector().len(), 2);
        assert_eq!(channel.next_vector().len(), 2);
        assert_eq!(channel.next_vector(), vec![Sample::new(4.0, 8.0)]);
        assert!(channel.next_vector().is_empty());
        assert!(channel.next_vector().is_empty());
        assert_eq!(channel.remaining(), 0);
    }

    #[test]
    fn test_open_reads_time_and_velocity_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_recording(dir.path(), "a.csv", 3);

        let mut channel = RecordedChannel::open(&path, 10).unwrap();
        let page = channel.next_vector();
        assert_eq!(page.len(), 3, "header row is not a reading");
        assert_eq!(page[2], Sample::new(1.0, 2e-9));
    }

    #[test]
    fn test_open_rejects_malformed_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "a,b,c\nx,0.5,oops\n").unwrap();

        let err = RecordedChannel::open(&path, 10).err().unwrap();
        assert!(matches!(err, SourceError::MalformedRow { row: 1, .. }));
    }

    #[test]
    fn test_discover_sorts_csv_files() {
        let dir = TempDir::new().unwrap();
        write_recording(dir.path(), "b.csv", 1);
        write_recording(dir.path(), "a.csv", 1);
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let found = discover_recordings(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_from_config_requires_one_recording_per_channel() {
        let dir = TempDir::new().unwrap();
        write_recording(dir.path(), "a.csv", 1);
        let config = SourceConfig {
            data_dir: dir.path().to_path_buf(),
            ..SourceConfig::default()
        };

        let err = SourceManager::from_config(&config, 2).err().unwrap();
        assert_eq!(
            err,
            SourceError::NotEnoughRecordings {
                expected: 2,
                found: 1
            }
        );
    }

    #[tokio::test]
    async fn test_run_stops_after_all_empty_frame() {
        let channels: Vec<Box<dyn ChannelSource>> = vec![
            Box::new(RecordedChannel::from_samples(readings(3), 2)),
            Box::new(RecordedChannel::from_samples(readings(1), 2)),
        ];
        let manager = SourceManager::new(channels, Duration::from_millis(1));
        let (tx, mut rx) = mpsc::channel(16);

        let sent = manager.run(tx).await;

        let mut frames = Vec::new();
        while let Some(frame) = rx.recv().await {
            frames.push(frame);
        }
        assert_eq!(sent, 3);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(frames[1].iter().map(Vec::len).collect::<Vec<_>>(), vec![1, 0]);
        assert!(frames[2].iter().all(Vec::is_empty));
    }

    #[tokio::test]
    async fn test_run_stops_when_consumer_hangs_up() {
        let channels: Vec<Box<dyn ChannelSource>> =
            vec![Box::new(RecordedChannel::from_samples(readings(100), 1))];
        let manager = SourceManager::new(channels, Duration::from_millis(1));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        assert_eq!(manager.run(tx).await, 0);
    }
}
