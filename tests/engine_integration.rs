//! Deterministic engine integration tests using recording backends
//!
//! Every test runs on tokio's paused clock, so delays are exact and a run
//! of hundreds of simulated seconds finishes instantly.

use autotyper::engine::{Engine, EngineEvent, SmartPause};
use autotyper::error::OutputError;
use autotyper::job::{AdjacencyTable, Timing, TypingJob, TypingMode};
use autotyper::output::{ClipboardService, KeyCommand, KeystrokeSink};
use autotyper::state::Phase;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Write(char),
    Key(KeyCommand),
}

type Hook = Box<dyn FnMut(char) + Send>;

/// Records every keystroke with the (paused) time it was sent
#[derive(Default)]
struct RecordingSink {
    ops: Mutex<Vec<(Instant, Op)>>,
    hook: Mutex<Option<Hook>>,
}

impl RecordingSink {
    /// Run `hook` after every written character
    fn on_write(&self, hook: impl FnMut(char) + Send + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().iter().map(|(_, op)| *op).collect()
    }

    fn timed_ops(&self) -> Vec<(Instant, Op)> {
        self.ops.lock().unwrap().clone()
    }

    fn written(&self) -> String {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Write(ch) => Some(ch),
                Op::Key(_) => None,
            })
            .collect()
    }

    /// Text left in an editor after applying every op
    fn replayed(&self) -> String {
        let mut buffer = String::new();
        for op in self.ops() {
            match op {
                Op::Write(ch) => buffer.push(ch),
                Op::Key(KeyCommand::Backspace) => {
                    buffer.pop();
                }
                Op::Key(KeyCommand::Enter) => buffer.push('\n'),
                Op::Key(KeyCommand::Paste) => {}
            }
        }
        buffer
    }
}

#[async_trait::async_trait]
impl KeystrokeSink for RecordingSink {
    async fn write(&self, ch: char) -> Result<(), OutputError> {
        self.ops.lock().unwrap().push((Instant::now(), Op::Write(ch)));
        if let Some(hook) = self.hook.lock().unwrap().as_mut() {
            hook(ch);
        }
        Ok(())
    }

    async fn send(&self, key: KeyCommand) -> Result<(), OutputError> {
        self.ops.lock().unwrap().push((Instant::now(), Op::Key(key)));
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Records every clipboard copy
#[derive(Default)]
struct RecordingClipboard {
    copies: Mutex<Vec<String>>,
}

impl RecordingClipboard {
    fn copies(&self) -> Vec<String> {
        self.copies.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ClipboardService for RecordingClipboard {
    async fn copy(&self, text: &str) -> Result<(), OutputError> {
        self.copies.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn paste(&self) -> Result<String, OutputError> {
        Ok(self.copies.lock().unwrap().last().cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Fails on the third keystroke
#[derive(Default)]
struct FailingSink {
    count: Mutex<usize>,
}

#[async_trait::async_trait]
impl KeystrokeSink for FailingSink {
    async fn write(&self, _ch: char) -> Result<(), OutputError> {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        if *count >= 3 {
            return Err(OutputError::InjectionFailed("device unplugged".to_string()));
        }
        Ok(())
    }

    async fn send(&self, _key: KeyCommand) -> Result<(), OutputError> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

struct PanickingSink;

#[async_trait::async_trait]
impl KeystrokeSink for PanickingSink {
    async fn write(&self, _ch: char) -> Result<(), OutputError> {
        panic!("sink exploded");
    }

    async fn send(&self, _key: KeyCommand) -> Result<(), OutputError> {
        panic!("sink exploded");
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

struct Harness {
    engine: Engine,
    events: UnboundedReceiver<EngineEvent>,
    sink: Arc<RecordingSink>,
    clipboard: Arc<RecordingClipboard>,
}

fn harness() -> Harness {
    let sink = Arc::new(RecordingSink::default());
    let clipboard = Arc::new(RecordingClipboard::default());
    let (engine, events) = Engine::new(sink.clone(), clipboard.clone());
    Harness {
        engine,
        events,
        sink,
        clipboard,
    }
}

/// Timing profile without a countdown
fn no_countdown() -> Timing {
    Timing {
        countdown_ticks: 0,
        ..Timing::default()
    }
}

fn job(text: &str, mode: TypingMode) -> TypingJob {
    TypingJob::builder(text)
        .mode(mode)
        .timing(no_countdown())
        .seed(1)
        .build()
        .unwrap()
}

/// Collect events until the run finishes
async fn wait_finished(events: &mut UnboundedReceiver<EngineEvent>) -> (bool, Vec<EngineEvent>) {
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        if let EngineEvent::Finished { success } = event {
            return (success, seen);
        }
        seen.push(event);
    }
    panic!("event channel closed before the run finished");
}

/// Wait for the first status event
async fn wait_status(events: &mut UnboundedReceiver<EngineEvent>) -> (String, bool) {
    while let Some(event) = events.recv().await {
        if let EngineEvent::Status { message, paused } = event {
            return (message, paused);
        }
    }
    panic!("event channel closed before a status event");
}

fn progress_messages(events: &[EngineEvent]) -> Vec<(u8, String)> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Progress { percent, message } => Some((*percent, message.clone())),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Natural mode
// ============================================================================

#[tokio::test(start_paused = true)]
async fn natural_types_every_character() {
    let mut h = harness();
    let text = "Hello, world!\n\tSecond line.";
    assert!(h.engine.start(job(text, TypingMode::Natural)));

    let (success, _) = wait_finished(&mut h.events).await;
    assert!(success);
    assert_eq!(h.sink.written(), text);
    assert!(h.clipboard.copies().is_empty());
    assert!(!h.engine.is_running());
    assert_eq!(h.engine.phase(), Phase::Finished { success: true });
}

#[tokio::test(start_paused = true)]
async fn natural_reports_progress_every_tenth_character() {
    let mut h = harness();
    let text = "abcdefghijklmnopqrstuvwxy"; // 25 chars
    h.engine.start(job(text, TypingMode::Natural));

    let (_, events) = wait_finished(&mut h.events).await;
    let progress = progress_messages(&events);
    assert_eq!(
        progress,
        vec![
            (0, "Typing...".to_string()),
            (4, "Typing... 4%".to_string()),
            (44, "Typing... 44%".to_string()),
            (84, "Typing... 84%".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn zero_jitter_gives_exact_delays() {
    let mut h = harness();
    let job = TypingJob::builder("abcdefgh")
        .speed_cpm(600)
        .jitter(0.0)
        .timing(no_countdown())
        .build()
        .unwrap();
    h.engine.start(job);
    wait_finished(&mut h.events).await;

    let times: Vec<Instant> = h.sink.timed_ops().into_iter().map(|(t, _)| t).collect();
    assert_eq!(times.len(), 8);
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_millis(100));
    }
}

#[tokio::test(start_paused = true)]
async fn jittered_delays_stay_within_bounds() {
    let mut h = harness();
    let job = TypingJob::builder("the quick brown fox jumps over the lazy dog")
        .speed_cpm(600)
        .jitter(0.5)
        .seed(9)
        .timing(no_countdown())
        .build()
        .unwrap();
    h.engine.start(job);
    wait_finished(&mut h.events).await;

    let times: Vec<Instant> = h.sink.timed_ops().into_iter().map(|(t, _)| t).collect();
    let gaps: Vec<Duration> = times.windows(2).map(|p| p[1] - p[0]).collect();
    for gap in &gaps {
        // 100ms +/- 50%, plus timer rounding to whole milliseconds
        assert!(*gap >= Duration::from_millis(50), "{:?}", gap);
        assert!(*gap <= Duration::from_millis(152), "{:?}", gap);
    }
    assert!(gaps.iter().any(|g| *g != gaps[0]), "delays never varied");
}

#[tokio::test(start_paused = true)]
async fn speed_change_applies_to_the_next_character() {
    let mut h = harness();
    let job = TypingJob::builder("abc")
        .speed_cpm(600)
        .jitter(0.0)
        .timing(no_countdown())
        .build()
        .unwrap();

    let engine = h.engine.clone();
    h.sink.on_write(move |ch| {
        if ch == 'a' {
            engine.speed_up(600);
        }
    });
    h.engine.start(job);
    wait_finished(&mut h.events).await;

    let times: Vec<Instant> = h.sink.timed_ops().into_iter().map(|(t, _)| t).collect();
    assert_eq!(times[1] - times[0], Duration::from_millis(50));
    assert_eq!(times[2] - times[1], Duration::from_millis(50));
}

// ============================================================================
// Stop
// ============================================================================

#[tokio::test(start_paused = true)]
async fn stop_ends_run_within_one_poll_interval() {
    let mut h = harness();
    let job = TypingJob::builder("x".repeat(50))
        .speed_cpm(600)
        .jitter(0.0)
        .timing(no_countdown())
        .build()
        .unwrap();
    let started = Instant::now();
    h.engine.start(job);

    let engine = h.engine.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1050)).await;
        engine.stop();
    });

    let (success, _) = wait_finished(&mut h.events).await;
    let stop_latency = started.elapsed() - Duration::from_millis(1050);
    assert!(!success);
    assert!(stop_latency <= Duration::from_millis(100), "{:?}", stop_latency);

    let typed = h.sink.written().len();
    assert!(typed < 50);
    assert_eq!(typed, 11);

    // Nothing else arrives after the finish
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.sink.written().len(), typed);
}

#[tokio::test(start_paused = true)]
async fn stop_during_countdown_sends_nothing() {
    let mut h = harness();
    let job = TypingJob::builder("never typed")
        .mode(TypingMode::Turbo)
        .build()
        .unwrap();
    h.engine.start(job);

    let engine = h.engine.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        engine.stop();
    });

    let (success, events) = wait_finished(&mut h.events).await;
    assert!(!success);
    assert!(h.sink.ops().is_empty());
    assert!(h.clipboard.copies().is_empty());
    assert_eq!(h.engine.phase(), Phase::Finished { success: false });
    assert_eq!(
        progress_messages(&events),
        vec![
            (0, "Starting in 5s... SWITCH WINDOW!".to_string()),
            (0, "Starting in 4s... SWITCH WINDOW!".to_string()),
            (0, "Starting in 3s... SWITCH WINDOW!".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn stop_while_paused_finishes() {
    let mut h = harness();
    h.engine.start(job("some text to type", TypingMode::Natural));
    h.engine.toggle_pause();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(h.sink.ops().is_empty());
    assert!(h.engine.is_running());

    h.engine.stop();
    let (success, _) = wait_finished(&mut h.events).await;
    assert!(!success);
    assert!(h.sink.ops().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_during_thinking_pause() {
    let mut h = harness();
    let job = TypingJob::builder("line one\nline two")
        .mode(TypingMode::SuperHuman)
        .typo_probability(0.0)
        .timing(Timing {
            think: (Duration::from_secs(60), Duration::from_secs(60)),
            ..no_countdown()
        })
        .build()
        .unwrap();

    let engine = h.engine.clone();
    h.sink.on_write(move |ch| {
        if ch == '\n' {
            engine.stop();
        }
    });
    let started = Instant::now();
    h.engine.start(job);

    let (success, _) = wait_finished(&mut h.events).await;
    assert!(!success);
    assert_eq!(h.sink.written(), "line one\n");
    assert!(started.elapsed() < Duration::from_secs(60));
}

// ============================================================================
// Pause
// ============================================================================

#[tokio::test(start_paused = true)]
async fn smart_pause_waits_for_word_boundary() {
    let mut h = harness();
    let engine = h.engine.clone();
    h.sink.on_write(move |ch| {
        if ch == 'e' && !engine.is_paused() && !engine.is_pause_pending() {
            assert_eq!(engine.toggle_smart_pause(), SmartPause::Pending);
        }
    });
    h.engine.start(job("hello world", TypingMode::Natural));

    let (message, paused) = wait_status(&mut h.events).await;
    assert_eq!(message, "PAUSED (Smart)");
    assert!(paused);
    assert!(h.engine.is_paused());
    assert_eq!(h.sink.written(), "hello ");

    // Held while paused
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(h.sink.written(), "hello ");

    assert_eq!(h.engine.toggle_smart_pause(), SmartPause::Resumed);
    let (success, _) = wait_finished(&mut h.events).await;
    assert!(success);
    assert_eq!(h.sink.written(), "hello world");
}

#[tokio::test(start_paused = true)]
async fn immediate_pause_holds_block_mode_between_lines() {
    let mut h = harness();
    h.engine.start(job("one\ntwo\nthree", TypingMode::Block));

    // Pause as soon as the first line is reported
    while let Some(event) = h.events.recv().await {
        if let EngineEvent::Progress { message, .. } = event {
            if message == "Line 1/3" {
                assert!(h.engine.toggle_pause());
                break;
            }
        }
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.clipboard.copies(), vec!["one"]);

    assert!(!h.engine.toggle_pause());
    let (success, _) = wait_finished(&mut h.events).await;
    assert!(success);
    assert_eq!(h.clipboard.copies(), vec!["one", "two", "three"]);
}

#[tokio::test(start_paused = true)]
async fn pending_pause_applies_at_next_line_in_block_mode() {
    let mut h = harness();
    h.engine.start(job("one\ntwo", TypingMode::Block));
    h.engine.toggle_smart_pause();

    let (message, paused) = wait_status(&mut h.events).await;
    assert_eq!(message, "PAUSED");
    assert!(paused);
    assert!(h.clipboard.copies().is_empty());

    h.engine.stop();
    let (success, _) = wait_finished(&mut h.events).await;
    assert!(!success);
}

// ============================================================================
// Block and Turbo
// ============================================================================

#[tokio::test(start_paused = true)]
async fn block_pastes_each_line_with_enter_between() {
    let mut h = harness();
    h.engine.start(job("first\n\nthird", TypingMode::Block));

    let (success, events) = wait_finished(&mut h.events).await;
    assert!(success);
    assert_eq!(h.clipboard.copies(), vec!["first", "", "third"]);
    assert_eq!(
        h.sink.ops(),
        vec![
            Op::Key(KeyCommand::Paste),
            Op::Key(KeyCommand::Enter),
            Op::Key(KeyCommand::Paste),
            Op::Key(KeyCommand::Enter),
            Op::Key(KeyCommand::Paste),
        ]
    );

    let progress = progress_messages(&events);
    assert_eq!(progress.last(), Some(&(100, "Line 3/3".to_string())));
}

/// Run a block job, stop it after `stop_after`, and return what reached the
/// backends. Every recorded keystroke must predate the stop.
async fn stop_block_run(
    text: &str,
    timing: Timing,
    stop_after: Duration,
) -> (bool, Vec<Op>, Vec<String>) {
    let mut h = harness();
    let job = TypingJob::builder(text)
        .mode(TypingMode::Block)
        .timing(timing)
        .build()
        .unwrap();
    assert!(h.engine.start(job));

    tokio::time::sleep(stop_after).await;
    let stopped_at = Instant::now();
    h.engine.stop();

    let (success, _) = wait_finished(&mut h.events).await;
    for (at, op) in h.sink.timed_ops() {
        assert!(at <= stopped_at, "{:?} sent after stop", op);
    }
    (success, h.sink.ops(), h.clipboard.copies())
}

#[tokio::test(start_paused = true)]
async fn block_stop_between_paste_and_enter_sends_no_enter() {
    let timing = Timing {
        clipboard_settle: Duration::from_secs(1),
        ..no_countdown()
    };
    // Paste at 1s, Enter would follow at 2s
    let (success, ops, copies) =
        stop_block_run("a\nb", timing, Duration::from_millis(1450)).await;

    assert!(!success);
    assert_eq!(ops, vec![Op::Key(KeyCommand::Paste)]);
    assert_eq!(copies, vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn block_stop_between_copy_and_paste_sends_nothing() {
    let timing = Timing {
        clipboard_settle: Duration::from_secs(1),
        ..no_countdown()
    };
    let (success, ops, copies) =
        stop_block_run("a\nb", timing, Duration::from_millis(450)).await;

    assert!(!success);
    assert!(ops.is_empty());
    assert_eq!(copies, vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn block_stop_between_lines_skips_remaining_lines() {
    // Paste at 50ms, Enter at 100ms, then a 300ms line delay
    let (success, ops, copies) =
        stop_block_run("one\ntwo\nthree", no_countdown(), Duration::from_millis(250)).await;

    assert!(!success);
    assert_eq!(
        ops,
        vec![Op::Key(KeyCommand::Paste), Op::Key(KeyCommand::Enter)]
    );
    assert_eq!(copies, vec!["one"]);
}

#[tokio::test(start_paused = true)]
async fn turbo_copies_once_and_pastes_once() {
    let mut h = harness();
    let text = "all of it\nat once";
    h.engine.start(job(text, TypingMode::Turbo));

    let (success, events) = wait_finished(&mut h.events).await;
    assert!(success);
    assert_eq!(h.clipboard.copies(), vec![text]);
    assert_eq!(h.sink.ops(), vec![Op::Key(KeyCommand::Paste)]);
    assert_eq!(
        progress_messages(&events).last(),
        Some(&(100, "Paste Complete.".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn turbo_ignores_pause() {
    let mut h = harness();
    h.engine.start(job("pasted anyway", TypingMode::Turbo));
    h.engine.toggle_smart_pause();

    let (success, _) = wait_finished(&mut h.events).await;
    assert!(success);
    assert_eq!(h.sink.ops(), vec![Op::Key(KeyCommand::Paste)]);
}

// ============================================================================
// Super-human mode
// ============================================================================

#[tokio::test(start_paused = true)]
async fn typos_are_corrected_back_to_the_source() {
    let mut h = harness();
    let text = "Hello World";
    let job = TypingJob::builder(text)
        .mode(TypingMode::SuperHuman)
        .typo_probability(1.0)
        .jitter(0.0)
        .seed(7)
        .timing(no_countdown())
        .build()
        .unwrap();
    h.engine.start(job);

    let (success, _) = wait_finished(&mut h.events).await;
    assert!(success);
    assert_eq!(h.sink.replayed(), text);

    // Every character has neighbours: typo, backspace, intended char
    let ops = h.sink.ops();
    let source: Vec<char> = text.chars().collect();
    assert_eq!(ops.len(), source.len() * 3);
    let qwerty = AdjacencyTable::qwerty();
    for (chunk, &intended) in ops.chunks(3).zip(&source) {
        let Op::Write(typo) = chunk[0] else {
            panic!("expected a typo, got {:?}", chunk[0]);
        };
        let near = qwerty.neighbors(intended.to_ascii_lowercase()).unwrap();
        assert!(near.contains(&typo.to_ascii_lowercase()));
        assert_eq!(typo.is_uppercase(), intended.is_uppercase());
        assert_eq!(chunk[1], Op::Key(KeyCommand::Backspace));
        assert_eq!(chunk[2], Op::Write(intended));
    }
}

#[tokio::test(start_paused = true)]
async fn characters_without_neighbours_are_never_mistyped() {
    let mut h = harness();
    let job = TypingJob::builder("123.!?")
        .mode(TypingMode::SuperHuman)
        .typo_probability(1.0)
        .timing(no_countdown())
        .build()
        .unwrap();
    h.engine.start(job);

    let (success, _) = wait_finished(&mut h.events).await;
    assert!(success);
    assert!(!h.sink.ops().contains(&Op::Key(KeyCommand::Backspace)));
    assert_eq!(h.sink.written(), "123.!?");
}

#[tokio::test(start_paused = true)]
async fn newline_is_followed_by_a_thinking_pause() {
    let mut h = harness();
    let job = TypingJob::builder("a\nb")
        .mode(TypingMode::SuperHuman)
        .typo_probability(0.0)
        .speed_cpm(6000)
        .jitter(0.0)
        .timing(Timing {
            think: (Duration::from_secs(2), Duration::from_secs(2)),
            ..no_countdown()
        })
        .build()
        .unwrap();
    h.engine.start(job);

    let (success, events) = wait_finished(&mut h.events).await;
    assert!(success);

    let ops = h.sink.timed_ops();
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[1].1, Op::Write('\n'));
    assert_eq!(ops[1].0 - ops[0].0, Duration::from_millis(10));
    assert_eq!(ops[2].0 - ops[1].0, Duration::from_secs(2));
    assert!(progress_messages(&events)
        .iter()
        .any(|(_, message)| message == "Thinking..."));
}

// ============================================================================
// Run lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn concurrent_start_is_rejected() {
    let mut h = harness();
    assert!(h.engine.start(job("first", TypingMode::Natural)));
    assert!(!h.engine.start(job("second", TypingMode::Natural)));

    let (success, _) = wait_finished(&mut h.events).await;
    assert!(success);
    assert_eq!(h.sink.written(), "first");

    assert!(h.engine.start(job("third", TypingMode::Natural)));
    wait_finished(&mut h.events).await;
    assert_eq!(h.sink.written(), "firstthird");
}

#[tokio::test(start_paused = true)]
async fn start_after_stop_waits_for_the_worker() {
    let mut h = harness();
    h.engine.start(job("first run", TypingMode::Natural));
    h.engine.stop();
    assert!(!h.engine.is_running());

    // Previous worker has not observed the stop yet
    assert!(!h.engine.start(job("second run", TypingMode::Natural)));

    let (success, _) = wait_finished(&mut h.events).await;
    assert!(!success);
    assert!(h.engine.start(job("second run", TypingMode::Natural)));
    let (success, _) = wait_finished(&mut h.events).await;
    assert!(success);
}

#[tokio::test(start_paused = true)]
async fn failing_sink_finishes_unsuccessfully() {
    let clipboard = Arc::new(RecordingClipboard::default());
    let (engine, mut events) = Engine::new(Arc::new(FailingSink::default()), clipboard);
    engine.start(job("doomed text", TypingMode::Natural));

    let (success, _) = wait_finished(&mut events).await;
    assert!(!success);
    assert!(!engine.is_running());
}

#[tokio::test(start_paused = true)]
async fn panicking_sink_finishes_unsuccessfully() {
    let clipboard = Arc::new(RecordingClipboard::default());
    let (engine, mut events) = Engine::new(Arc::new(PanickingSink), clipboard);
    engine.start(job("boom", TypingMode::Natural));

    let (success, _) = wait_finished(&mut events).await;
    assert!(!success);

    // The engine is usable again afterwards
    assert!(engine.start(job("again", TypingMode::Turbo)));
    let (success, _) = wait_finished(&mut events).await;
    assert!(!success);
}
