//! Terminal ownership and the main event loop.

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::keymap::command_for;
use super::ui;
use crate::audio::sink::AudioSink;
use crate::engine::{Command, Metronome, MetronomeSnapshot, Scheduler, TimerEvent};
use crate::error::log_audio_error;

/// How long the input thread blocks before rechecking its stop flag
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Raw-mode alternate-screen terminal, restored when dropped.
pub struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    notice: Option<String>,
    restored: bool,
}

impl TerminalSession {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(err);
        }

        match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => Ok(Self {
                terminal,
                notice: None,
                restored: false,
            }),
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
                Err(err)
            }
        }
    }

    /// Keep `notice` on screen under the status line for the rest of the session.
    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn draw(&mut self, snapshot: &MetronomeSnapshot) -> io::Result<()> {
        let notice = self.notice.as_deref();
        self.terminal
            .draw(|frame| ui::render(frame, snapshot, notice))?;
        Ok(())
    }

    /// Leave raw mode and the alternate screen. Safe to call more than once.
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, Show)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(error = %err, "failed to restore terminal");
        }
    }
}

/// Input delivered to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Command(Command),
    /// Terminal resized; nothing changed but the screen must be redrawn
    Redraw,
    /// Reading terminal input failed
    Failed(String),
}

/// Background thread forwarding terminal key presses as [`InputEvent`]s.
pub struct InputReader {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputReader {
    pub fn spawn(tx: mpsc::UnboundedSender<InputEvent>) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("metronome-input".to_string())
            .spawn(move || read_input(&stop_flag, &tx))?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_input(stop: &AtomicBool, tx: &mpsc::UnboundedSender<InputEvent>) {
    while !stop.load(Ordering::Acquire) {
        let event = match event::poll(INPUT_POLL) {
            Ok(false) => continue,
            Ok(true) => event::read(),
            Err(err) => Err(err),
        };

        let forwarded = match event {
            Ok(Event::Key(key)) => match command_for(&key) {
                Some(command) => InputEvent::Command(command),
                None => continue,
            },
            Ok(Event::Resize(..)) => InputEvent::Redraw,
            Ok(_) => continue,
            Err(err) => {
                let _ = tx.send(InputEvent::Failed(err.to_string()));
                return;
            }
        };

        if tx.send(forwarded).is_err() {
            return;
        }
    }
}

/// Run until quit, redrawing after every handled event.
///
/// Timer events and input are consumed one at a time, so the metronome is
/// only ever touched from this loop. `draw` is called once up front and
/// again after each event that does not quit.
pub async fn run_event_loop<S, K, D>(
    metronome: &mut Metronome<S, K>,
    timers: &mut mpsc::UnboundedReceiver<TimerEvent>,
    input: &mut mpsc::UnboundedReceiver<InputEvent>,
    mut draw: D,
) -> Result<()>
where
    S: Scheduler,
    K: AudioSink,
    D: FnMut(&MetronomeSnapshot) -> io::Result<()>,
{
    draw(&metronome.snapshot()).context("drawing the first frame")?;

    while !metronome.is_quit() {
        tokio::select! {
            Some(timer) = timers.recv() => {
                metronome.handle_timer(timer);
            }
            received = input.recv() => match received {
                Some(InputEvent::Command(command)) => {
                    debug!(?command, "input command");
                    metronome
                        .apply(command)
                        .context("releasing audio output")?;
                }
                Some(InputEvent::Redraw) => {}
                Some(InputEvent::Failed(reason)) => {
                    // The input error is the one reported; a failed release is only logged
                    if let Err(err) = metronome.quit() {
                        log_audio_error(&err, "run_event_loop");
                    }
                    bail!("terminal input failed: {}", reason);
                }
                None => {
                    metronome.quit().context("releasing audio output")?;
                }
            },
        }

        if !metronome.is_quit() {
            draw(&metronome.snapshot()).context("drawing frame")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::click::ClickWaveform;
    use crate::audio::stubs::RecordingSink;
    use crate::engine::{MetronomeSettings, PlaybackState, TokioScheduler};
    use crate::error::AudioError;

    /// Sink whose device release always fails
    #[derive(Default)]
    struct StuckSink {
        shutdown_calls: usize,
    }

    impl AudioSink for StuckSink {
        fn play(&mut self, _waveform: ClickWaveform) -> std::result::Result<(), AudioError> {
            Ok(())
        }

        fn shutdown(&mut self) -> std::result::Result<(), AudioError> {
            self.shutdown_calls += 1;
            Err(AudioError::HardwareError {
                details: "device busy".to_string(),
            })
        }

        fn sample_rate(&self) -> u32 {
            44_100
        }

        fn is_shut_down(&self) -> bool {
            false
        }
    }

    fn tokio_metronome() -> (
        Metronome<TokioScheduler, RecordingSink>,
        mpsc::UnboundedReceiver<TimerEvent>,
    ) {
        let (scheduler, timers) = TokioScheduler::new();
        let mut metronome =
            Metronome::new(MetronomeSettings::default(), scheduler, RecordingSink::default());
        metronome.start();
        (metronome, timers)
    }

    fn send_after(tx: &mpsc::UnboundedSender<InputEvent>, after_ms: u64, event: InputEvent) {
        let tx = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(after_ms)).await;
            let _ = tx.send(event);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_plays_beats_until_quit() {
        let (mut metronome, mut timers) = tokio_metronome();
        let (tx, mut input) = mpsc::unbounded_channel();
        send_after(&tx, 1100, InputEvent::Command(Command::Quit));

        let mut frames = Vec::new();
        run_event_loop(&mut metronome, &mut timers, &mut input, |snapshot| {
            frames.push(*snapshot);
            Ok(())
        })
        .await
        .unwrap();

        assert!(metronome.is_quit());
        assert_eq!(metronome.sink().play_count(), 2);
        assert_eq!(metronome.beat_index(), 2);
        assert!(metronome.sink().is_shut_down());
        assert!(frames.iter().any(|f| f.beat_index == 1));
        assert_eq!(frames.first().map(|f| f.beat_index), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_applies_commands() {
        let (mut metronome, mut timers) = tokio_metronome();
        let (tx, mut input) = mpsc::unbounded_channel();
        send_after(&tx, 100, InputEvent::Command(Command::IncreaseTempo));
        send_after(&tx, 200, InputEvent::Command(Command::TogglePlay));
        send_after(&tx, 3000, InputEvent::Command(Command::Quit));

        let mut last = None;
        run_event_loop(&mut metronome, &mut timers, &mut input, |snapshot| {
            last = Some(*snapshot);
            Ok(())
        })
        .await
        .unwrap();

        let last = last.unwrap();
        assert_eq!(last.tempo.bpm(), 125);
        assert_eq!(last.playback, PlaybackState::Paused);
        // Paused before the first beat was due
        assert_eq!(metronome.sink().play_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_failure_ends_loop_with_error() {
        let (mut metronome, mut timers) = tokio_metronome();
        let (tx, mut input) = mpsc::unbounded_channel();
        tx.send(InputEvent::Failed("stdin closed".to_string())).unwrap();

        let result = run_event_loop(&mut metronome, &mut timers, &mut input, |_| Ok(())).await;

        assert!(result.is_err());
        assert!(metronome.is_quit());
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_failure_reported_when_release_also_fails() {
        let (scheduler, mut timers) = TokioScheduler::new();
        let mut metronome =
            Metronome::new(MetronomeSettings::default(), scheduler, StuckSink::default());
        metronome.start();
        let (tx, mut input) = mpsc::unbounded_channel();
        tx.send(InputEvent::Failed("stdin closed".to_string())).unwrap();

        let err = run_event_loop(&mut metronome, &mut timers, &mut input, |_| Ok(()))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("terminal input failed: stdin closed"));
        assert!(metronome.is_quit());
        assert_eq!(metronome.sink().shutdown_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_input_quits() {
        let (mut metronome, mut timers) = tokio_metronome();
        let (tx, mut input) = mpsc::unbounded_channel::<InputEvent>();
        drop(tx);

        run_event_loop(&mut metronome, &mut timers, &mut input, |_| Ok(()))
            .await
            .unwrap();
        assert!(metronome.sink().is_shut_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_draw_failure_is_reported() {
        let (mut metronome, mut timers) = tokio_metronome();
        let (_tx, mut input) = mpsc::unbounded_channel();

        let result = run_event_loop(&mut metronome, &mut timers, &mut input, |_| {
            Err(io::Error::new(io::ErrorKind::Other, "no terminal"))
        })
        .await;
        assert!(result.is_err());
    }
}
