use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Duration;

/// What the front end wants done, before hit testing resolves pointer
/// positions into simulation commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Feed(usize),
    Pet,
    Play,
    ToggleSleep,
    CleanOldest,
    ToggleFoodMenu,
    ToggleColor,
    Quit,
    PointerDown(u16, u16),
    PointerMove(u16, u16),
    PointerUp(u16, u16),
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<Event>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        let ev = event::read()?;
        let keep = match &ev {
            Event::Key(k) => k.kind == KeyEventKind::Press,
            Event::Mouse(_) => true,
            _ => false,
        };
        if keep {
            out.push(ev);
            if out.len() >= 64 {
                break;
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event(ev: &Event) -> Option<Command> {
    match ev {
        Event::Key(k) => {
            if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
                return Some(Command::Quit);
            }
            map_key(k.code)
        }
        Event::Mouse(m) => map_mouse(m),
        _ => None,
    }
}

fn map_key(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'f' => Some(Command::ToggleFoodMenu),
            'p' => Some(Command::Play),
            'e' | ' ' => Some(Command::Pet),
            's' => Some(Command::ToggleSleep),
            'c' => Some(Command::CleanOldest),
            'k' => Some(Command::ToggleColor),
            'q' => Some(Command::Quit),
            d @ '1'..='9' => Some(Command::Feed(d as usize - '1' as usize)),
            _ => None,
        },
        KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

fn map_mouse(m: &MouseEvent) -> Option<Command> {
    let (x, y) = (m.column, m.row);
    match m.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Command::PointerDown(x, y)),
        MouseEventKind::Up(MouseButton::Left) => Some(Command::PointerUp(x, y)),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            Some(Command::PointerMove(x, y))
        }
        _ => None,
    }
}
