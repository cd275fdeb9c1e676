// src/data_input/episodes.rs

use chrono::NaiveDateTime;

use crate::data_input::time_frame::TimeFrame;
use crate::error::{PlotError, Result};
use crate::overlay::SentinelPolarity;

/// Ground-truth label attached to an episode. Encoded as `1` for non-wear in episode tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeLabel {
    NonWear,
    Wear,
}

impl From<i64> for EpisodeLabel {
    fn from(code: i64) -> Self {
        if code == 1 {
            EpisodeLabel::NonWear
        } else {
            EpisodeLabel::Wear
        }
    }
}

/// A contiguous interval of a mask series with an identifier and a label.
/// `start` and `stop` are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub counter: String,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub label: EpisodeLabel,
}

impl Episode {
    pub fn new(
        counter: impl Into<String>,
        start: NaiveDateTime,
        stop: NaiveDateTime,
        label: EpisodeLabel,
    ) -> Result<Self> {
        let counter = counter.into();
        if stop < start {
            return Err(PlotError::InvalidData(format!(
                "episode {counter} stops ({stop}) before it starts ({start})"
            )));
        }
        Ok(Self {
            counter,
            start,
            stop,
            label,
        })
    }

    /// Builds an episode from row positions of `frame`; `stop_index` is exclusive.
    pub fn from_positions(
        frame: &TimeFrame,
        counter: impl Into<String>,
        start_index: usize,
        stop_index: usize,
        label: EpisodeLabel,
    ) -> Result<Self> {
        let counter = counter.into();
        if start_index >= stop_index || stop_index > frame.len() {
            return Err(PlotError::InvalidData(format!(
                "episode {counter} has rows {start_index}..{stop_index} outside a frame of {} rows",
                frame.len()
            )));
        }
        let index = frame.index();
        Self::new(counter, index[start_index], index[stop_index - 1], label)
    }
}

/// Extracts each contiguous run of flagged samples in `column` as an episode.
/// Counters are the 1-based run number.
pub fn episodes_from_mask(
    frame: &TimeFrame,
    column: &str,
    polarity: SentinelPolarity,
    label: EpisodeLabel,
) -> Result<Vec<Episode>> {
    let values = frame.column(column)?;
    let index = frame.index();
    let mut episodes = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, value) in values.iter().enumerate() {
        match (polarity.is_flagged(*value), run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                let counter = (episodes.len() + 1).to_string();
                episodes.push(Episode::new(counter, index[start], index[i - 1], label)?);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        let counter = (episodes.len() + 1).to_string();
        episodes.push(Episode::new(counter, index[start], index[values.len() - 1], label)?);
    }
    Ok(episodes)
}
