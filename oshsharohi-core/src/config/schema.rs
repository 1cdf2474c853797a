//! Configuration schema types
//!
//! These types are deserialized from the YAML site configuration. Every
//! section is optional; omitted sections and fields take the defaults the
//! site ships with.

use serde::{Deserialize, Serialize};

/// Session storage key recording that the intro has been shown.
pub const INTRO_SEEN_KEY: &str = "oshsharohi_intro_seen";

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root configuration for the site runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct SiteConfig {
    /// Cockpit gate and intro sequence
    #[serde(default)]
    pub intro: IntroConfig,

    /// Scroll reveal of content blocks
    #[serde(default)]
    pub reveal: RevealConfig,

    /// Stat and spec counters
    #[serde(default)]
    pub counters: CounterConfig,

    /// Page-to-page navigation chrome
    #[serde(default)]
    pub navigation: NavigationConfig,
}

// ============================================================================
// Intro
// ============================================================================

/// Intro gate, audio and timeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields, default)]
pub struct IntroConfig {
    /// Session storage key for the "intro seen" flag
    pub session_key: String,

    /// Initial playback volume (0.0 - 1.0)
    pub audio_volume: f64,

    /// Volume removed on each fade-out tick
    pub audio_fade_step: f64,

    /// Interval between fade-out ticks
    pub audio_fade_interval_ms: u64,

    /// Cue offsets, measured from sequence launch
    pub timeline: IntroTimelineConfig,

    /// Speed gauge animation
    pub gauge: GaugeConfig,

    /// Wind streak particles
    pub wind: WindConfig,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            session_key: INTRO_SEEN_KEY.to_string(),
            audio_volume: 0.5,
            audio_fade_step: 0.05,
            audio_fade_interval_ms: 100,
            timeline: IntroTimelineConfig::default(),
            gauge: GaugeConfig::default(),
            wind: WindConfig::default(),
        }
    }
}

/// Offsets of every intro cue relative to the launch instant.
///
/// The stage cues (`launch_ms` through `release_scroll_ms`) must be
/// non-decreasing; `remove_gate_ms` is independent of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields, default)]
pub struct IntroTimelineConfig {
    /// Audio restart, wind and gauge start
    pub launch_ms: u64,
    /// Cockpit overlay removal after its hide transition
    pub remove_gate_ms: u64,
    /// Stripes engulf the screen, wind stops
    pub engulf_ms: u64,
    /// Logo appears
    pub logo_reveal_ms: u64,
    /// Underline appears
    pub line_reveal_ms: u64,
    /// Overlay and audio fade out
    pub fade_out_ms: u64,
    /// Overlay detached
    pub remove_ms: u64,
    /// Page scrolling re-enabled
    pub release_scroll_ms: u64,
    /// Length of each screen shake
    pub shake_ms: u64,
}

impl Default for IntroTimelineConfig {
    fn default() -> Self {
        Self {
            launch_ms: 0,
            remove_gate_ms: 1500,
            engulf_ms: 6000,
            logo_reveal_ms: 6800,
            line_reveal_ms: 7100,
            fade_out_ms: 9800,
            remove_ms: 11_600,
            release_scroll_ms: 11_800,
            shake_ms: 500,
        }
    }
}

impl IntroTimelineConfig {
    /// Stage cues in their required order, paired with their offsets.
    #[must_use]
    pub const fn stage_offsets(&self) -> [(IntroCue, u64); 7] {
        [
            (IntroCue::Launch, self.launch_ms),
            (IntroCue::Engulf, self.engulf_ms),
            (IntroCue::LogoReveal, self.logo_reveal_ms),
            (IntroCue::LineReveal, self.line_reveal_ms),
            (IntroCue::FadeOut, self.fade_out_ms),
            (IntroCue::Remove, self.remove_ms),
            (IntroCue::ReleaseScroll, self.release_scroll_ms),
        ]
    }
}

/// A named point in the intro timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum IntroCue {
    /// Audio, wind and gauge start
    Launch,
    /// Cockpit overlay detached
    RemoveGate,
    /// Stripes engulf, background darkens
    Engulf,
    /// Shake class cleared
    SettleShake,
    /// Logo shown
    LogoReveal,
    /// Underline shown
    LineReveal,
    /// Overlay fades, audio ramps down
    FadeOut,
    /// Overlay removed
    Remove,
    /// Scroll lock released
    ReleaseScroll,
}

impl IntroCue {
    /// Snake-case name used in logs and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Launch => "launch",
            Self::RemoveGate => "remove_gate",
            Self::Engulf => "engulf",
            Self::SettleShake => "settle_shake",
            Self::LogoReveal => "logo_reveal",
            Self::LineReveal => "line_reveal",
            Self::FadeOut => "fade_out",
            Self::Remove => "remove",
            Self::ReleaseScroll => "release_scroll",
        }
    }
}

impl std::fmt::Display for IntroCue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speed gauge animation.
///
/// `target` and `dial_max` are deliberately different scales: the needle
/// ramps to `target` while the dial face and fill arc span `dial_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields, default)]
pub struct GaugeConfig {
    /// Ramp duration
    pub duration_ms: u64,
    /// Final displayed speed
    pub target: u32,
    /// Top of the dial face
    pub dial_max: u32,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            duration_ms: 6000,
            target: 120,
            dial_max: 180,
        }
    }
}

/// Wind streak particles spawned during the gauge ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields, default)]
pub struct WindConfig {
    /// Spawn interval
    pub interval_ms: u64,
    /// Narrowest streak in pixels
    pub min_width_px: f64,
    /// Widest streak in pixels
    pub max_width_px: f64,
    /// Shortest streak lifetime in seconds
    pub min_duration_s: f64,
    /// Longest streak lifetime in seconds
    pub max_duration_s: f64,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            min_width_px: 50.0,
            max_width_px: 200.0,
            min_duration_s: 0.5,
            max_duration_s: 0.9,
        }
    }
}

// ============================================================================
// Reveal & Counters
// ============================================================================

/// Scroll reveal of content cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields, default)]
pub struct RevealConfig {
    /// Delay added per element within one visibility batch
    pub stagger_ms: u64,
    /// Visible fraction that triggers the reveal
    pub threshold: f64,
    /// Initial downward offset of hidden elements in pixels
    pub offset_px: f64,
    /// Transition length of the reveal
    pub transition_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            stagger_ms: 100,
            threshold: 0.1,
            offset_px: 40.0,
            transition_ms: 800,
        }
    }
}

/// Animated numeric counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields, default)]
pub struct CounterConfig {
    /// Visible fraction that starts the counters
    pub threshold: f64,
    /// Length of each stat ramp
    pub duration_ms: u64,
    /// Delay added per stat within one container
    pub stagger_ms: u64,
    /// Number of frames a spec value takes to count up
    pub spec_frames: u32,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            duration_ms: 2500,
            stagger_ms: 200,
            spec_frames: 60,
        }
    }
}

// ============================================================================
// Navigation
// ============================================================================

/// Page transition timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields, default)]
pub struct NavigationConfig {
    /// Delay between the exit animation and the location change
    pub exit_delay_ms: u64,
    /// Time the same-page flash stays before fading
    pub flash_hold_ms: u64,
    /// Fade length of the flash before removal
    pub flash_fade_ms: u64,
    /// Length of the content pulse
    pub pulse_ms: u64,
    /// Delay before the page-enter transition activates
    pub enter_delay_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            exit_delay_ms: 300,
            flash_hold_ms: 500,
            flash_fade_ms: 300,
            pulse_ms: 600,
            enter_delay_ms: 10,
        }
    }
}
