//! Typing jobs
//!
//! A [`TypingJob`] is the immutable description of one run: the text, the
//! emission mode, pacing parameters and the timing profile. Jobs are built
//! through [`TypingJobBuilder`], which rejects values that would make the
//! engine misbehave (zero speed, jitter outside 0..=1, ...).

use crate::error::JobError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SPEED_CPM: u32 = 1200;
pub const DEFAULT_JITTER: f64 = 0.1;
pub const DEFAULT_TYPO_PROBABILITY: f64 = 0.03;

/// Emission strategy
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypingMode {
    /// Copy everything to the clipboard and paste once
    Turbo,
    /// Paste line by line, pressing Enter between lines
    Block,
    /// Type character by character with jittered delays (default)
    #[default]
    Natural,
    /// Natural typing plus thinking pauses and self-corrected typos
    SuperHuman,
}

/// How a pause request takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseStyle {
    /// Stop advancing as soon as the pause flag is set
    Immediate,
    /// Keep typing until the next space, tab or newline
    Smart,
}

impl TypingMode {
    /// Pause style the hotkey should use for this mode
    pub fn pause_style(&self) -> PauseStyle {
        match self {
            TypingMode::Turbo | TypingMode::Block => PauseStyle::Immediate,
            TypingMode::Natural | TypingMode::SuperHuman => PauseStyle::Smart,
        }
    }
}

impl fmt::Display for TypingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypingMode::Turbo => "Turbo (Instant Paste)",
            TypingMode::Block => "Block (Line-by-Line)",
            TypingMode::Natural => "Natural (Keystrokes)",
            TypingMode::SuperHuman => "Super-Human (Typo+Correct)",
        };
        f.write_str(name)
    }
}

impl FromStr for TypingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "turbo" | "paste" => Ok(TypingMode::Turbo),
            "block" | "lines" => Ok(TypingMode::Block),
            "natural" | "keystrokes" => Ok(TypingMode::Natural),
            "super_human" | "superhuman" | "human" => Ok(TypingMode::SuperHuman),
            other => Err(format!(
                "unknown typing mode '{}' (expected turbo, block, natural or super_human)",
                other
            )),
        }
    }
}

/// Fixed delays used by the strategies
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    /// Number of one-second countdown ticks before the first keystroke
    pub countdown_ticks: u32,
    /// Length of one countdown tick
    pub countdown_tick: Duration,
    /// Granularity of pause and stop checks
    pub poll_interval: Duration,
    /// Wait between a clipboard copy and the paste command
    pub clipboard_settle: Duration,
    /// Wait after each pasted line in block mode
    pub line_delay: Duration,
    /// Range of the pause after a newline in super-human mode
    pub think: (Duration, Duration),
    /// Range of the pause between a typo and its backspace
    pub reaction: (Duration, Duration),
    /// Range of the pause between the backspace and the corrected character
    pub correction: (Duration, Duration),
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            countdown_ticks: 5,
            countdown_tick: Duration::from_secs(1),
            poll_interval: Duration::from_millis(100),
            clipboard_settle: Duration::from_millis(50),
            line_delay: Duration::from_millis(300),
            think: (Duration::from_millis(1000), Duration::from_millis(3000)),
            reaction: (Duration::from_millis(100), Duration::from_millis(300)),
            correction: (Duration::from_millis(50), Duration::from_millis(100)),
        }
    }
}

impl Timing {
    fn validate(&self) -> Result<(), JobError> {
        if self.poll_interval.is_zero() {
            return Err(JobError::InvalidTiming(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        for (name, (min, max)) in [
            ("think", self.think),
            ("reaction", self.reaction),
            ("correction", self.correction),
        ] {
            if min > max {
                return Err(JobError::InvalidTiming(format!(
                    "{} range is inverted ({:?} > {:?})",
                    name, min, max
                )));
            }
        }
        Ok(())
    }
}

/// Keyboard neighbours used to pick plausible typos
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyTable {
    neighbors: HashMap<char, Vec<char>>,
}

const QWERTY_NEIGHBORS: &[(char, &str)] = &[
    ('a', "qwsz"),
    ('b', "vghn"),
    ('c', "xdfv"),
    ('d', "serfcx"),
    ('e', "wsdr"),
    ('f', "drtgv"),
    ('g', "ftyhb"),
    ('h', "gyunj"),
    ('i', "ujko"),
    ('j', "hunik"),
    ('k', "jiolm"),
    ('l', "kop"),
    ('m', "njk"),
    ('n', "bhjm"),
    ('o', "iklp"),
    ('p', "ol"),
    ('q', "wa"),
    ('r', "edft"),
    ('s', "awedxz"),
    ('t', "rfgy"),
    ('u', "yhji"),
    ('v', "cfgb"),
    ('w', "qase"),
    ('x', "zsdc"),
    ('y', "tghu"),
    ('z', "asx"),
    (' ', " "),
];

impl AdjacencyTable {
    /// Neighbours on a standard US QWERTY layout
    pub fn qwerty() -> Self {
        Self::from_pairs(QWERTY_NEIGHBORS.iter().copied())
    }

    /// Build a table from `(key, neighbours)` pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (char, &'a str)>) -> Self {
        let neighbors = pairs
            .into_iter()
            .map(|(key, near)| (key.to_ascii_lowercase(), near.chars().collect()))
            .collect();
        Self { neighbors }
    }

    /// Neighbours of a lowercase key, if it has any
    pub fn neighbors(&self, key: char) -> Option<&[char]> {
        self.neighbors
            .get(&key)
            .map(Vec::as_slice)
            .filter(|n| !n.is_empty())
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

impl Default for AdjacencyTable {
    fn default() -> Self {
        Self::qwerty()
    }
}

/// One validated typing run
#[derive(Debug, Clone)]
pub struct TypingJob {
    text: String,
    mode: TypingMode,
    speed_cpm: u32,
    jitter: f64,
    typo_probability: f64,
    adjacency: AdjacencyTable,
    timing: Timing,
    seed: Option<u64>,
}

impl TypingJob {
    pub fn builder(text: impl Into<String>) -> TypingJobBuilder {
        TypingJobBuilder::new(text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> TypingMode {
        self.mode
    }

    pub fn speed_cpm(&self) -> u32 {
        self.speed_cpm
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    pub fn typo_probability(&self) -> f64 {
        self.typo_probability
    }

    pub fn adjacency(&self) -> &AdjacencyTable {
        &self.adjacency
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Builder for [`TypingJob`]
#[derive(Debug, Clone)]
pub struct TypingJobBuilder {
    text: String,
    mode: TypingMode,
    speed_cpm: u32,
    jitter: f64,
    typo_probability: f64,
    adjacency: AdjacencyTable,
    timing: Timing,
    seed: Option<u64>,
}

impl TypingJobBuilder {
    fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: TypingMode::default(),
            speed_cpm: DEFAULT_SPEED_CPM,
            jitter: DEFAULT_JITTER,
            typo_probability: DEFAULT_TYPO_PROBABILITY,
            adjacency: AdjacencyTable::default(),
            timing: Timing::default(),
            seed: None,
        }
    }

    pub fn mode(mut self, mode: TypingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn speed_cpm(mut self, speed_cpm: u32) -> Self {
        self.speed_cpm = speed_cpm;
        self
    }

    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn typo_probability(mut self, probability: f64) -> Self {
        self.typo_probability = probability;
        self
    }

    pub fn adjacency(mut self, adjacency: AdjacencyTable) -> Self {
        self.adjacency = adjacency;
        self
    }

    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Seed the random source for reproducible runs
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<TypingJob, JobError> {
        let text = self.text.replace("\r\n", "\n");
        if text.is_empty() {
            return Err(JobError::EmptyText);
        }
        if self.speed_cpm == 0 {
            return Err(JobError::InvalidSpeed(self.speed_cpm));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(JobError::InvalidJitter(self.jitter));
        }
        if !(0.0..=1.0).contains(&self.typo_probability) {
            return Err(JobError::InvalidTypoProbability(self.typo_probability));
        }
        self.timing.validate()?;

        Ok(TypingJob {
            text,
            mode: self.mode,
            speed_cpm: self.speed_cpm,
            jitter: self.jitter,
            typo_probability: self.typo_probability,
            adjacency: self.adjacency,
            timing: self.timing,
            seed: self.seed,
        })
    }
}

/// Human-readable label for a typing speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedTier {
    Grandma,
    AverageJoe,
    ProGamer,
    Hyper,
    Matrix,
}

impl SpeedTier {
    pub fn from_cpm(cpm: u32) -> Self {
        match cpm {
            0..=499 => SpeedTier::Grandma,
            500..=1199 => SpeedTier::AverageJoe,
            1200..=1999 => SpeedTier::ProGamer,
            2000..=2999 => SpeedTier::Hyper,
            _ => SpeedTier::Matrix,
        }
    }
}

impl fmt::Display for SpeedTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SpeedTier::Grandma => "Grandma (Comfortably Slow)",
            SpeedTier::AverageJoe => "Average Joe (Human)",
            SpeedTier::ProGamer => "Pro Gamer (Fast)",
            SpeedTier::Hyper => "ADHD Monkey (Hyper)",
            SpeedTier::Matrix => "Matrix Mode (Godlike)",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let job = TypingJob::builder("hello").build().unwrap();
        assert_eq!(job.text(), "hello");
        assert_eq!(job.mode(), TypingMode::Natural);
        assert_eq!(job.speed_cpm(), DEFAULT_SPEED_CPM);
        assert_eq!(job.jitter(), DEFAULT_JITTER);
        assert_eq!(job.typo_probability(), DEFAULT_TYPO_PROBABILITY);
        assert!(job.seed().is_none());
        assert_eq!(job.timing().countdown_ticks, 5);
    }

    #[test]
    fn test_crlf_is_normalized() {
        let job = TypingJob::builder("one\r\ntwo\r\n").build().unwrap();
        assert_eq!(job.text(), "one\ntwo\n");
    }

    #[test]
    fn test_rejects_zero_speed() {
        let err = TypingJob::builder("x").speed_cpm(0).build().unwrap_err();
        assert_eq!(err, JobError::InvalidSpeed(0));
    }

    #[test]
    fn test_rejects_empty_text() {
        let err = TypingJob::builder("").build().unwrap_err();
        assert_eq!(err, JobError::EmptyText);
    }

    #[test]
    fn test_rejects_out_of_range_fractions() {
        assert!(matches!(
            TypingJob::builder("x").jitter(1.5).build(),
            Err(JobError::InvalidJitter(_))
        ));
        assert!(matches!(
            TypingJob::builder("x").jitter(f64::NAN).build(),
            Err(JobError::InvalidJitter(_))
        ));
        assert!(matches!(
            TypingJob::builder("x").typo_probability(-0.1).build(),
            Err(JobError::InvalidTypoProbability(_))
        ));
    }

    #[test]
    fn test_rejects_bad_timing() {
        let timing = Timing {
            poll_interval: Duration::ZERO,
            ..Timing::default()
        };
        assert!(matches!(
            TypingJob::builder("x").timing(timing).build(),
            Err(JobError::InvalidTiming(_))
        ));

        let timing = Timing {
            think: (Duration::from_secs(3), Duration::from_secs(1)),
            ..Timing::default()
        };
        assert!(matches!(
            TypingJob::builder("x").timing(timing).build(),
            Err(JobError::InvalidTiming(_))
        ));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("turbo".parse::<TypingMode>(), Ok(TypingMode::Turbo));
        assert_eq!("Block".parse::<TypingMode>(), Ok(TypingMode::Block));
        assert_eq!("super-human".parse::<TypingMode>(), Ok(TypingMode::SuperHuman));
        assert_eq!("super_human".parse::<TypingMode>(), Ok(TypingMode::SuperHuman));
        assert!("warp".parse::<TypingMode>().is_err());
    }

    #[test]
    fn test_pause_style_per_mode() {
        assert_eq!(TypingMode::Turbo.pause_style(), PauseStyle::Immediate);
        assert_eq!(TypingMode::Block.pause_style(), PauseStyle::Immediate);
        assert_eq!(TypingMode::Natural.pause_style(), PauseStyle::Smart);
        assert_eq!(TypingMode::SuperHuman.pause_style(), PauseStyle::Smart);
    }

    #[test]
    fn test_qwerty_adjacency() {
        let table = AdjacencyTable::qwerty();
        assert_eq!(table.len(), 27);
        assert_eq!(table.neighbors('a'), Some(&['q', 'w', 's', 'z'][..]));
        assert_eq!(table.neighbors(' '), Some(&[' '][..]));
        assert_eq!(table.neighbors('1'), None);
        assert_eq!(table.neighbors('A'), None);
    }

    #[test]
    fn test_empty_neighbor_list_is_none() {
        let table = AdjacencyTable::from_pairs([('a', ""), ('B', "vn")]);
        assert_eq!(table.neighbors('a'), None);
        assert_eq!(table.neighbors('b'), Some(&['v', 'n'][..]));
    }

    #[test]
    fn test_speed_tiers() {
        assert_eq!(SpeedTier::from_cpm(300), SpeedTier::Grandma);
        assert_eq!(SpeedTier::from_cpm(500), SpeedTier::AverageJoe);
        assert_eq!(SpeedTier::from_cpm(1200), SpeedTier::ProGamer);
        assert_eq!(SpeedTier::from_cpm(2500), SpeedTier::Hyper);
        assert_eq!(SpeedTier::from_cpm(4000), SpeedTier::Matrix);
        assert_eq!(SpeedTier::from_cpm(4000).to_string(), "Matrix Mode (Godlike)");
    }
}
