//! Playback progress reporting.

use serde::Serialize;

use crate::client::Client;
use crate::error::Result;

/// What happened to the playing item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayEvent {
    Start,
    Stop,
    Pause,
    Unpause,
    TimeUpdate,
}

impl PlayEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::TimeUpdate => "timeupdate",
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
struct PlayStatusBody<'a> {
    item_id: &'a str,
    position_ticks: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_paused: Option<bool>,
}

fn play_status(song_id: &str, event: PlayEvent, position_ticks: i64) -> (&'static str, PlayStatusBody<'_>) {
    let mut body = PlayStatusBody {
        item_id: song_id,
        position_ticks,
        event_name: None,
        is_paused: None,
    };
    let path = match event {
        PlayEvent::Start => "/Sessions/Playing",
        PlayEvent::Stop => {
            body.is_paused = Some(true);
            "/Sessions/Playing/Stopped"
        }
        PlayEvent::Pause | PlayEvent::Unpause => {
            body.is_paused = Some(event == PlayEvent::Pause);
            body.event_name = Some(event.as_str());
            "/Sessions/Playing/Progress"
        }
        PlayEvent::TimeUpdate => {
            body.event_name = Some(event.as_str());
            "/Sessions/Playing/Progress"
        }
    };
    (path, body)
}

impl Client {
    /// Report playback of `song_id` at `position_ticks` (100 ns units).
    pub fn update_play_status(&self, song_id: &str, event: PlayEvent, position_ticks: i64) -> Result<()> {
        let (path, body) = play_status(song_id, event, position_ticks);
        self.post(path, &self.default_params(), &body)
            .map_err(|e| e.context("update play status"))?;
        Ok(())
    }
}
