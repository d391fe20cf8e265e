//! Offline simulator for feedpin - replays a JSON event script against an
//! in-memory feed and outputs the resulting trace as JSON
//!
//! Usage:
//!   feedpin_sim <script.json>                # Output trace to stdout
//!   feedpin_sim <script.json> -o trace.json  # Output trace to file
//!
//! Script format:
//!
//! ```json
//! {
//!   "config": { "bottomThresholdPx": 200 },
//!   "initial": { "scrollTop": 0, "scrollHeight": 5000, "clientHeight": 400 },
//!   "events": [
//!     { "at": 600, "type": "bootstrap" },
//!     { "type": "settle" },
//!     { "at": 900, "type": "input", "kind": "wheel" },
//!     { "at": 950, "type": "scroll", "to": 1200 },
//!     { "type": "append", "px": 300 }
//!   ]
//! }
//! ```

#![allow(clippy::exit)]

use std::cell::Cell;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use feedpin::enforce::{EnforcePhase, WriteOutcome};
use feedpin::intent::InputKind;
use feedpin::{ControlledFeed, PinConfig, ScrollMetrics, ScrollSurface};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Script {
    #[serde(default)]
    config: PinConfig,
    initial: Initial,
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Initial {
    scroll_top: f64,
    scroll_height: f64,
    client_height: f64,
}

#[derive(Debug, Deserialize)]
struct Event {
    /// Timestamp in ms; omitted means "same time as the previous event".
    at: Option<f64>,
    #[serde(flatten)]
    action: Action,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Action {
    Input { kind: String },
    Scroll { to: f64 },
    Append { px: f64 },
    /// Content grows right after the next write (reflow racing the write).
    GrowAfterWrite { px: f64 },
    ContentChanged,
    Frame,
    Settle,
    Tick,
    Bootstrap,
    Resume,
    SetEnabled { enabled: bool },
    Remove,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Step {
    at: f64,
    action: Action,
    pinned: bool,
    enabled: bool,
    phase: String,
    scroll_top: f64,
    scroll_height: f64,
    distance: f64,
    writes: u32,
    affordance_suppressed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<String>,
}

/// In-memory scroll container.
struct SimFeed {
    metrics: Cell<ScrollMetrics>,
    writes: Cell<u32>,
    suppressed: Cell<bool>,
    live: Cell<bool>,
    grow_after_write: Cell<f64>,
}

impl SimFeed {
    fn new(initial: &Initial) -> Self {
        Self {
            metrics: Cell::new(ScrollMetrics::new(
                initial.scroll_top,
                initial.scroll_height,
                initial.client_height,
            )),
            writes: Cell::new(0),
            suppressed: Cell::new(false),
            live: Cell::new(true),
            grow_after_write: Cell::new(0.0),
        }
    }

    fn update(&self, f: impl FnOnce(&mut ScrollMetrics)) {
        let mut metrics = self.metrics.get();
        f(&mut metrics);
        self.metrics.set(metrics);
    }
}

impl PartialEq for SimFeed {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl ScrollSurface for SimFeed {
    fn metrics(&self) -> ScrollMetrics {
        self.metrics.get()
    }

    fn scroll_to_bottom(&self) {
        self.writes.set(self.writes.get() + 1);
        let grow = self.grow_after_write.replace(0.0);
        self.update(|m| {
            m.scroll_top = m.max_scroll_top();
            m.scroll_height += grow;
        });
    }

    fn set_affordance_suppressed(&self, suppressed: bool) {
        self.suppressed.set(suppressed);
    }

    fn is_live(&self) -> bool {
        self.live.get()
    }
}

fn phase_name(phase: EnforcePhase) -> String {
    format!("{phase:?}")
}

fn apply(feed: &mut ControlledFeed<SimFeed>, action: &Action, now: f64) -> Option<String> {
    match action {
        Action::Input { kind } => match InputKind::from_event_type(kind) {
            Some(kind) => feed.on_input(kind, now),
            None => return Some(format!("unknown input kind {kind:?}")),
        },
        Action::Scroll { to } => {
            let to = *to;
            feed.surface()
                .update(|m| m.scroll_top = to.clamp(0.0, m.max_scroll_top()));
            feed.on_scroll(now);
        }
        Action::Append { px } => {
            let px = *px;
            feed.surface().update(|m| m.scroll_height += px);
            feed.on_content_changed();
        }
        Action::GrowAfterWrite { px } => feed.surface().grow_after_write.set(*px),
        Action::ContentChanged => {
            feed.on_content_changed();
        }
        Action::Frame => {
            feed.on_frame();
        }
        Action::Settle => {
            let mut frames = 0;
            while feed.needs_frame() && frames < 16 {
                feed.on_frame();
                frames += 1;
            }
            return Some(format!("{frames} frames"));
        }
        Action::Tick => {
            let outcome = match feed.on_tick() {
                WriteOutcome::Skipped => "skipped",
                WriteOutcome::Settled => "settled",
                WriteOutcome::Overshot => "overshot",
            };
            return Some(outcome.to_string());
        }
        Action::Bootstrap => {
            feed.on_bootstrap();
        }
        Action::Resume => {
            feed.resume(now);
        }
        Action::SetEnabled { enabled } => {
            feed.set_enabled(*enabled, now);
        }
        Action::Remove => feed.surface().live.set(false),
    }
    None
}

fn simulate(script: Script) -> Vec<Step> {
    let mut feed = ControlledFeed::new(SimFeed::new(&script.initial), script.config);
    let mut now = 0.0;
    let mut trace = Vec::with_capacity(script.events.len());

    for event in script.events {
        if let Some(at) = event.at {
            now = at;
        }
        let outcome = apply(&mut feed, &event.action, now);
        let surface = feed.surface();
        let metrics = surface.metrics();
        trace.push(Step {
            at: now,
            action: event.action,
            pinned: feed.is_pinned(),
            enabled: feed.is_enabled(),
            phase: phase_name(feed.enforcement_phase()),
            scroll_top: metrics.scroll_top,
            scroll_height: metrics.scroll_height,
            distance: metrics.distance_from_bottom(),
            writes: surface.writes.get(),
            affordance_suppressed: surface.suppressed.get(),
            outcome,
        });
    }
    trace
}

/// Command line: the script path and an optional `-o <file>` destination.
#[derive(Debug, PartialEq, Eq)]
struct Args {
    script: PathBuf,
    output: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Option<Self> {
        let mut script = None;
        let mut output = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-o" | "--output" => output = Some(PathBuf::from(args.next()?)),
                "-h" | "--help" => return None,
                _ if script.is_none() => script = Some(PathBuf::from(&arg)),
                _ => return None,
            }
        }
        Some(Self {
            script: script?,
            output,
        })
    }
}

fn run(args: &Args) -> feedpin::Result<()> {
    let script: Script = serde_json::from_str(&fs::read_to_string(&args.script)?)?;
    script.config.validate()?;

    let json = serde_json::to_string_pretty(&simulate(script))?;
    match &args.output {
        Some(path) => {
            fs::write(path, &json)?;
            eprintln!("Written: {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

fn main() {
    let Some(args) = Args::parse(env::args().skip(1)) else {
        eprintln!("Usage: feedpin_sim <script.json> [-o trace.json]");
        std::process::exit(2);
    };
    if let Err(e) = run(&args) {
        eprintln!("{}: {e}", args.script.display());
        std::process::exit(1);
    }
}
