use crate::error::StartupError;
use crate::scheduler::InputEvent;
use crossterm::cursor;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::stream::LocalBoxStream;
use futures::StreamExt;
use std::io::stdout;
use tracing::warn;

/// Raw mode plus alternate screen for as long as the guard lives.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn acquire() -> Result<Self, StartupError> {
        enable_raw_mode()?;
        // Construct early so a failure below still restores raw mode.
        let guard = TerminalGuard { _private: () };
        execute!(stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), cursor::Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

pub fn map_key(key: KeyEvent) -> InputEvent {
    if key.kind != KeyEventKind::Press {
        return InputEvent::Other;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => InputEvent::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => InputEvent::Quit,
        _ => InputEvent::Other,
    }
}

pub fn map_event(event: Event) -> InputEvent {
    match event {
        Event::Key(key) => map_key(key),
        Event::Resize(w, h) => InputEvent::Resize(w, h),
        _ => InputEvent::Other,
    }
}

/// Terminal input as scheduler events. A read error ends the session.
pub fn input_events() -> LocalBoxStream<'static, InputEvent> {
    EventStream::new()
        .map(|res| match res {
            Ok(event) => map_event(event),
            Err(e) => {
                warn!("Terminal input error: {}", e);
                InputEvent::Quit
            }
        })
        .boxed_local()
}
