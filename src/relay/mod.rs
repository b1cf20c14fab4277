// WindowRelay - turns the stream of source frames into detection batches
//
// Frames are appended per channel. Every `frames_per_check` frames the relay
// checks whether each channel holds a full window; if so it cuts the most
// recent `window_len` readings of every channel into a batch. The frame
// counter resets on every check, whether or not a batch was produced.
//
// Only the most recent `window_len` readings are retained per channel, which
// is all a batch can ever use.
//
// One channel at a time can be selected for preview. Selecting it yields an
// overview of its retained readings; after that every non-empty page of the
// channel yields an update. Both keep every PREVIEW_STRIDE-th reading.

use std::collections::VecDeque;

use crate::analysis::{Sample, Segment};
use crate::config::RelayConfig;
use crate::sink::{ChannelPreview, PreviewKind};
use crate::source::Frame;

/// Keep one reading in this many for previews
pub const PREVIEW_STRIDE: usize = 48;

/// Every `stride`-th sample, starting with the first
pub fn decimate<'a, I>(samples: I, stride: usize) -> Vec<Sample>
where
    I: IntoIterator<Item = &'a Sample>,
{
    samples.into_iter().step_by(stride.max(1)).copied().collect()
}

pub struct WindowRelay {
    buffers: Vec<VecDeque<Sample>>,
    window_len: usize,
    frames_per_check: u32,
    frames_seen: u32,
    /// 0-based index of the previewed channel
    preview_channel: Option<usize>,
    pending_preview: Option<ChannelPreview>,
}

impl WindowRelay {
    pub fn new(channel_count: usize, window_len: usize, frames_per_check: u32) -> Self {
        Self {
            buffers: (0..channel_count)
                .map(|_| VecDeque::with_capacity(window_len))
                .collect(),
            window_len: window_len.max(1),
            frames_per_check: frames_per_check.max(1),
            frames_seen: 0,
            preview_channel: None,
            pending_preview: None,
        }
    }

    pub fn from_config(config: &RelayConfig, channel_count: usize) -> Self {
        let mut relay = Self::new(channel_count, config.window_len, config.frames_per_check);
        // Nothing is buffered yet, so the overview would be empty
        let _ = relay.select_channel(config.preview_channel);
        relay
    }

    /// Preview `channel` (numbered from 1), or stop previewing with `None`
    ///
    /// Returns the overview of what is already retained for the channel. An
    /// unknown channel clears the selection.
    pub fn select_channel(&mut self, channel: Option<usize>) -> Option<ChannelPreview> {
        self.pending_preview = None;
        self.preview_channel = match channel {
            Some(n) if (1..=self.buffers.len()).contains(&n) => Some(n - 1),
            Some(n) => {
                log::warn!(
                    "[WindowRelay] Cannot preview channel {}, relay tracks {}",
                    n,
                    self.buffers.len()
                );
                None
            }
            None => None,
        };

        let index = self.preview_channel?;
        Some(ChannelPreview {
            kind: PreviewKind::Overview,
            channel: index + 1,
            samples: decimate(&self.buffers[index], PREVIEW_STRIDE),
        })
    }

    /// Update preview produced by the last `push`, if any
    pub fn take_preview(&mut self) -> Option<ChannelPreview> {
        self.pending_preview.take()
    }

    /// Readings currently held for `channel`
    pub fn buffered(&self, channel: usize) -> usize {
        self.buffers.get(channel).map_or(0, VecDeque::len)
    }

    /// Absorb one frame; returns a batch when a check fires with full windows
    pub fn push(&mut self, frame: Frame) -> Option<Vec<Segment>> {
        if frame.len() != self.buffers.len() {
            log::warn!(
                "[WindowRelay] Frame has {} channels, relay tracks {}",
                frame.len(),
                self.buffers.len()
            );
        }

        self.pending_preview = self
            .preview_channel
            .and_then(|index| frame.get(index).map(|page| (index, page)))
            .filter(|(_, page)| !page.is_empty())
            .map(|(index, page)| ChannelPreview {
                kind: PreviewKind::Update,
                channel: index + 1,
                samples: decimate(page, PREVIEW_STRIDE),
            });

        for (buffer, page) in self.buffers.iter_mut().zip(frame) {
            buffer.extend(page);
            let excess = buffer.len().saturating_sub(self.window_len);
            buffer.drain(..excess);
        }

        self.frames_seen += 1;
        if self.frames_seen < self.frames_per_check {
            return None;
        }
        self.frames_seen = 0;

        if let Some((channel, buffer)) = self
            .buffers
            .iter()
            .enumerate()
            .find(|(_, buffer)| buffer.len() < self.window_len)
        {
            log::debug!(
                "[WindowRelay] Not enough data for analysis: channel {} has {}/{}",
                channel + 1,
                buffer.len(),
                self.window_len
            );
            return None;
        }

        Some(
            self.buffers
                .iter()
                .map(|buffer| Segment::new(buffer.iter().copied().collect()))
                .collect(),
        )
    }
}
