use aerobot_proto::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Physical input device the key events come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// Full keyboard: arrows, paging keys, letters and function keys.
    #[default]
    Keyboard,
    /// Contact-pad board that only emits arrows, space and a mouse click.
    MakeyMakey,
}

/// Translates terminal events into commands. Space toggles take-off / land,
/// so the map tracks whether the vehicle was last told to fly.
#[derive(Debug, Clone)]
pub struct KeyMap {
    layout: Layout,
    started: bool,
}

impl KeyMap {
    pub fn new(layout: Layout) -> Self {
        Self { layout, started: false }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn map_key(&mut self, key: &KeyEvent) -> Command {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Command::Exit;
        }

        let cmd = match key.code {
            KeyCode::Up => Command::Forward,
            KeyCode::Down => Command::Backward,
            KeyCode::Left => Command::Left,
            KeyCode::Right => Command::Right,
            KeyCode::Char(' ') => self.toggle_flight(),
            _ if self.layout == Layout::Keyboard => self.map_advanced(key.code),
            _ => Command::None,
        };
        if cmd == Command::PalmLand {
            self.started = false;
        }
        cmd
    }

    pub fn map_mouse(&self, ev: &MouseEvent) -> Command {
        match (self.layout, ev.kind) {
            (Layout::MakeyMakey, MouseEventKind::Down(MouseButton::Left)) => Command::Exit,
            _ => Command::None,
        }
    }

    fn toggle_flight(&mut self) -> Command {
        self.started = !self.started;
        if self.started {
            Command::TakeOff
        } else {
            Command::Land
        }
    }

    fn map_advanced(&self, code: KeyCode) -> Command {
        match code {
            KeyCode::PageUp | KeyCode::Char('u') | KeyCode::Char('U') => Command::Up,
            KeyCode::PageDown | KeyCode::Char('d') | KeyCode::Char('D') => Command::Down,
            KeyCode::Char('l') | KeyCode::Char('L') => Command::RotateLeft,
            KeyCode::Char('r') | KeyCode::Char('R') => Command::RotateRight,
            KeyCode::Char('p') | KeyCode::Char('P') => Command::PalmLand,
            KeyCode::F(1) => Command::FrontFlip,
            KeyCode::F(2) => Command::BackFlip,
            KeyCode::F(3) => Command::RightFlip,
            KeyCode::F(4) => Command::LeftFlip,
            KeyCode::F(5) => Command::Bounce,
            _ => Command::None,
        }
    }
}

/// Control reference printed before the terminal switches to raw mode.
pub fn help(layout: Layout) -> String {
    let exit = match layout {
        Layout::Keyboard => "    CTRL + C: Emergency landing and EXIT",
        Layout::MakeyMakey => "    CTRL + C/Left Click: Emergency landing and EXIT",
    };
    let mut out = format!("\nCONTROLS\n------------------------------\n{}\n\n", exit);
    out.push_str("       SPACE: Takeoff/Land\n");
    out.push_str("    ARROW UP: Forward\n");
    out.push_str("  ARROW DOWN: Backward\n");
    out.push_str("  ARROW LEFT: Move left\n");
    out.push_str(" ARROW RIGHT: Move right\n");
    if layout == Layout::Keyboard {
        out.push_str("   U/PAGE UP: Up\n");
        out.push_str(" D/PAGE DOWN: Down\n");
        out.push_str("           L: Rotate left\n");
        out.push_str("           R: Rotate right\n");
        out.push_str("           P: Palm land\n");
        out.push_str("          F1: Front flip (BE CAREFUL)\n");
        out.push_str("          F2: Back flip (BE CAREFUL)\n");
        out.push_str("          F3: Right flip (BE CAREFUL)\n");
        out.push_str("          F4: Left flip (BE CAREFUL)\n");
        out.push_str("          F5: Bounce | Stop bouncing (BE CAREFUL)\n");
    }
    out
}
