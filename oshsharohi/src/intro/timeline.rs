//! The intro step table as data.

use std::time::Duration;

use oshsharohi_core::config::schema::{IntroCue, IntroTimelineConfig};
use serde::Serialize;

/// Observable progress of the intro on one page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntroStage {
    /// Controller not constructed yet
    Idle,
    /// Waiting for the unlock gesture
    GateShown,
    /// Unlocked; soundtrack requested
    AudioStarted,
    /// Wind and gauge running
    GaugeAnimating,
    Engulf,
    LogoReveal,
    LineReveal,
    FadeOut,
    /// Intro UI detached
    Removed,
    /// Already seen this session; nothing ran
    Skipped,
}

impl IntroStage {
    /// Stage entered when `cue` fires, if the cue moves the stage at all.
    #[must_use]
    pub const fn entered_by(cue: IntroCue) -> Option<Self> {
        match cue {
            IntroCue::Launch => Some(Self::GaugeAnimating),
            IntroCue::Engulf => Some(Self::Engulf),
            IntroCue::LogoReveal => Some(Self::LogoReveal),
            IntroCue::LineReveal => Some(Self::LineReveal),
            IntroCue::FadeOut => Some(Self::FadeOut),
            IntroCue::Remove => Some(Self::Removed),
            IntroCue::RemoveGate | IntroCue::SettleShake | IntroCue::ReleaseScroll => None,
        }
    }

    /// Whether the intro will never run (again) on this page load.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Removed | Self::Skipped)
    }
}

impl std::fmt::Display for IntroStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::GateShown => "gate_shown",
            Self::AudioStarted => "audio_started",
            Self::GaugeAnimating => "gauge_animating",
            Self::Engulf => "engulf",
            Self::LogoReveal => "logo_reveal",
            Self::LineReveal => "line_reveal",
            Self::FadeOut => "fade_out",
            Self::Removed => "removed",
            Self::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// One scheduled cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub offset_ms: u64,
    pub cue: IntroCue,
}

impl TimelineEntry {
    #[must_use]
    pub const fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_ms)
    }
}

/// Cues of one intro run ordered by offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntroTimeline {
    entries: Vec<TimelineEntry>,
}

impl IntroTimeline {
    /// Builds the table from configured offsets.
    ///
    /// Each reveal that shakes the screen (`Engulf`, `LogoReveal`) gets a
    /// `SettleShake` `shake_ms` later.
    #[must_use]
    pub fn from_config(config: &IntroTimelineConfig) -> Self {
        let t = config;
        let mut entries = vec![
            TimelineEntry {
                offset_ms: t.launch_ms,
                cue: IntroCue::Launch,
            },
            TimelineEntry {
                offset_ms: t.remove_gate_ms,
                cue: IntroCue::RemoveGate,
            },
            TimelineEntry {
                offset_ms: t.engulf_ms,
                cue: IntroCue::Engulf,
            },
            TimelineEntry {
                offset_ms: t.engulf_ms.saturating_add(t.shake_ms),
                cue: IntroCue::SettleShake,
            },
            TimelineEntry {
                offset_ms: t.logo_reveal_ms,
                cue: IntroCue::LogoReveal,
            },
            TimelineEntry {
                offset_ms: t.line_reveal_ms,
                cue: IntroCue::LineReveal,
            },
            TimelineEntry {
                offset_ms: t.logo_reveal_ms.saturating_add(t.shake_ms),
                cue: IntroCue::SettleShake,
            },
            TimelineEntry {
                offset_ms: t.fade_out_ms,
                cue: IntroCue::FadeOut,
            },
            TimelineEntry {
                offset_ms: t.remove_ms,
                cue: IntroCue::Remove,
            },
            TimelineEntry {
                offset_ms: t.release_scroll_ms,
                cue: IntroCue::ReleaseScroll,
            },
        ];
        entries.sort_by_key(|e| e.offset_ms);
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offset of the first occurrence of `cue`.
    #[must_use]
    pub fn offset_of(&self, cue: IntroCue) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.cue == cue)
            .map(|e| e.offset_ms)
    }

    /// Entries up to and including the first occurrence of `cue`.
    #[must_use]
    pub fn until(&self, cue: IntroCue) -> Self {
        let end = self
            .entries
            .iter()
            .position(|e| e.cue == cue)
            .map_or(self.entries.len(), |i| i + 1);
        Self {
            entries: self.entries[..end].to_vec(),
        }
    }

    /// Stage the run is in `elapsed_ms` after launch.
    #[must_use]
    pub fn stage_at(&self, elapsed_ms: u64) -> IntroStage {
        self.entries
            .iter()
            .take_while(|e| e.offset_ms <= elapsed_ms)
            .filter_map(|e| IntroStage::entered_by(e.cue))
            .last()
            .unwrap_or(IntroStage::AudioStarted)
    }

    /// Offset of the final cue.
    #[must_use]
    pub fn total_ms(&self) -> u64 {
        self.entries.last().map_or(0, |e| e.offset_ms)
    }
}

impl Default for IntroTimeline {
    fn default() -> Self {
        Self::from_config(&IntroTimelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let timeline = IntroTimeline::default();
        let table: Vec<(u64, IntroCue)> = timeline
            .entries()
            .iter()
            .map(|e| (e.offset_ms, e.cue))
            .collect();
        assert_eq!(
            table,
            vec![
                (0, IntroCue::Launch),
                (1500, IntroCue::RemoveGate),
                (6000, IntroCue::Engulf),
                (6500, IntroCue::SettleShake),
                (6800, IntroCue::LogoReveal),
                (7100, IntroCue::LineReveal),
                (7300, IntroCue::SettleShake),
                (9800, IntroCue::FadeOut),
                (11_600, IntroCue::Remove),
                (11_800, IntroCue::ReleaseScroll),
            ]
        );
        assert_eq!(timeline.total_ms(), 11_800);
    }

    #[test]
    fn test_stage_at() {
        let timeline = IntroTimeline::default();
        assert_eq!(timeline.stage_at(0), IntroStage::GaugeAnimating);
        assert_eq!(timeline.stage_at(5999), IntroStage::GaugeAnimating);
        assert_eq!(timeline.stage_at(6000), IntroStage::Engulf);
        assert_eq!(timeline.stage_at(7000), IntroStage::LogoReveal);
        assert_eq!(timeline.stage_at(7100), IntroStage::LineReveal);
        assert_eq!(timeline.stage_at(9800), IntroStage::FadeOut);
        assert_eq!(timeline.stage_at(20_000), IntroStage::Removed);
    }

    #[test]
    fn test_until_cuts_after_cue() {
        let timeline = IntroTimeline::default().until(IntroCue::LogoReveal);
        assert_eq!(timeline.len(), 5);
        assert_eq!(timeline.entries().last().map(|e| e.cue), Some(IntroCue::LogoReveal));
    }

    #[test]
    fn test_offset_of() {
        let timeline = IntroTimeline::default();
        assert_eq!(timeline.offset_of(IntroCue::SettleShake), Some(6500));
        assert_eq!(timeline.offset_of(IntroCue::FadeOut), Some(9800));
    }

    #[test]
    fn test_custom_shake_length() {
        let config = IntroTimelineConfig {
            shake_ms: 200,
            ..IntroTimelineConfig::default()
        };
        let timeline = IntroTimeline::from_config(&config);
        assert_eq!(timeline.offset_of(IntroCue::SettleShake), Some(6200));
    }

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [IntroStage::GateShown, IntroStage::LogoReveal, IntroStage::Skipped] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{stage}\""));
        }
    }
}
