//! Autotyper: types text into the focused window like a human
//!
//! This library provides the core functionality for:
//! - Emitting text as simulated input under four strategies (instant paste,
//!   per-line paste, natural typing, typing with corrected typos)
//! - Pausing, resuming and stopping a run from a global hotkey
//! - Injecting keystrokes via wtype/ydotool and pasting via wl-clipboard
//!
//! # Architecture
//!
//! ```text
//!                       ┌─────────────────────────────────────┐
//!                       │              Session                │
//!                       └─────────────────────────────────────┘
//!                          │                │               ▲
//!                          │ job            │ build         │ EngineEvent
//!                          ▼                ▼               │ (progress, status,
//!   ┌──────────────┐  ┌──────────────┐  ┌──────────────┐    │  finished)
//!   │    Hotkey    │  │    Engine    │  │   Backends   │    │
//!   │    (rdev)    │  │ state + task │  │ sink / clip  │    │
//!   └──────────────┘  └──────────────┘  └──────────────┘    │
//!          │                ▲   │              ▲            │
//!          │ press / speed  │   │ strategy     │            │
//!          ▼                │   ▼              │            │
//!   ┌──────────────┐        │ ┌─────────────────────────────┴──┐
//!   │    Router    │────────┘ │ turbo │ block │ natural │ human │
//!   │ pause / stop │          └────────────────────────────────┘
//!   └──────────────┘                       │
//!                                          ▼
//!                                 wtype / ydotool / wl-copy
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod hotkey;
pub mod job;
pub mod output;
pub mod router;
pub mod session;
pub mod state;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use engine::{Engine, EngineEvent};
pub use error::{AutotyperError, Result};
pub use job::{TypingJob, TypingMode};
pub use session::Session;
