use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::fmt::Write as _;
use std::io::{self, stdout, Write};
use std::time::Duration;

/// A single cell in the terminal buffer
#[derive(Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg: None,
            bold: false,
        }
    }
}

/// Double-buffered terminal canvas
pub struct Terminal {
    width: u16,
    height: u16,
    buffer: Vec<Vec<Cell>>,
    alternate_screen: bool,
}

impl Terminal {
    /// Take over the terminal (raw mode + alternate screen) when
    /// `alternate_screen` is set; otherwise just size a buffer.
    pub fn new(alternate_screen: bool) -> io::Result<Self> {
        let (width, height) = size()?;

        if alternate_screen {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
        }

        Ok(Self::with_buffer(width, height, alternate_screen))
    }

    /// Off-screen buffer of a fixed size (print mode and tests)
    pub fn offscreen(width: u16, height: u16) -> Self {
        Self::with_buffer(width, height, false)
    }

    fn with_buffer(width: u16, height: u16, alternate_screen: bool) -> Self {
        Self {
            width,
            height,
            buffer: vec![vec![Cell::default(); width as usize]; height as usize],
            alternate_screen,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.buffer = vec![vec![Cell::default(); width as usize]; height as usize];
    }

    pub fn clear(&mut self) {
        for row in &mut self.buffer {
            row.fill(Cell::default());
        }
    }

    pub fn clear_screen(&self) -> io::Result<()> {
        execute!(stdout(), Clear(ClearType::All))?;
        Ok(())
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.buffer.get(y as usize)?.get(x as usize)
    }

    /// Set a character at position with optional color
    pub fn set_with_bg(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        fg: Option<Color>,
        bg: Option<Color>,
        bold: bool,
    ) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize][x as usize] = Cell { ch, fg, bg, bold };
        }
    }

    /// Write a string starting at position, keeping each cell's background
    pub fn set_str(&mut self, x: i32, y: i32, s: &str, fg: Option<Color>, bold: bool) {
        for (i, ch) in s.chars().enumerate() {
            let bg = self.get(x + i as i32, y).and_then(|c| c.bg);
            self.set_with_bg(x + i as i32, y, ch, fg, bg, bold);
        }
    }

    /// Write a string over a solid background
    pub fn set_str_bg(&mut self, x: i32, y: i32, s: &str, fg: Option<Color>, bg: Color, bold: bool) {
        for (i, ch) in s.chars().enumerate() {
            self.set_with_bg(x + i as i32, y, ch, fg, Some(bg), bold);
        }
    }

    /// Flush the whole buffer to the screen
    pub fn present(&self) -> io::Result<()> {
        let mut out = stdout().lock();

        for (y, row) in self.buffer.iter().enumerate() {
            queue!(out, MoveTo(0, y as u16))?;
            let mut fg: Option<Color> = None;
            let mut bg: Option<Color> = None;
            let mut bold = false;

            for cell in row {
                if cell.bold != bold {
                    let attr = if cell.bold { Attribute::Bold } else { Attribute::NormalIntensity };
                    queue!(out, SetAttribute(attr))?;
                    bold = cell.bold;
                }
                if cell.fg != fg {
                    queue!(out, SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
                    fg = cell.fg;
                }
                if cell.bg != bg {
                    queue!(out, SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
                    bg = cell.bg;
                }
                queue!(out, Print(cell.ch))?;
            }
            queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;
        }

        out.flush()
    }

    /// Next input event if one is waiting (non-blocking)
    pub fn poll_event(&self) -> io::Result<Option<Event>> {
        if poll(Duration::from_millis(0))? {
            return Ok(Some(read()?));
        }
        Ok(None)
    }

    pub fn sleep(&self, seconds: f32) {
        std::thread::sleep(Duration::from_secs_f32(seconds.max(0.0)));
    }

    /// Buffer as ANSI-colored text (print mode)
    pub fn to_ansi_string(&self) -> String {
        let mut out = String::new();
        for row in &self.buffer {
            for cell in row {
                if cell.fg.is_none() && cell.bg.is_none() && !cell.bold {
                    out.push(cell.ch);
                    continue;
                }
                if cell.bold {
                    out.push_str("\x1b[1m");
                }
                if let Some(code) = cell.fg.and_then(|c| ansi_code(c, false)) {
                    out.push_str(&code);
                }
                if let Some(code) = cell.bg.and_then(|c| ansi_code(c, true)) {
                    out.push_str(&code);
                }
                out.push(cell.ch);
                out.push_str("\x1b[0m");
            }
            out.push('\n');
        }
        out
    }

    pub fn print_to_stdout(&self) -> io::Result<()> {
        let mut out = stdout().lock();
        out.write_all(self.to_ansi_string().as_bytes())?;
        out.flush()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = execute!(stdout(), ResetColor, Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

/// SGR escape for a color; `None` for colors with no fixed code
fn ansi_code(color: Color, background: bool) -> Option<String> {
    let base = if background { 10 } else { 0 };
    let mut s = String::new();
    match color {
        Color::Rgb { r, g, b } => {
            let _ = write!(s, "\x1b[{};2;{};{};{}m", 38 + base, r, g, b);
        }
        Color::AnsiValue(v) => {
            let _ = write!(s, "\x1b[{};5;{}m", 38 + base, v);
        }
        other => {
            let code = match other {
                Color::Black => 30,
                Color::DarkRed => 31,
                Color::DarkGreen => 32,
                Color::DarkYellow => 33,
                Color::DarkBlue => 34,
                Color::DarkMagenta => 35,
                Color::DarkCyan => 36,
                Color::Grey => 37,
                Color::DarkGrey => 90,
                Color::Red => 91,
                Color::Green => 92,
                Color::Yellow => 93,
                Color::Blue => 94,
                Color::Magenta => 95,
                Color::Cyan => 96,
                Color::White => 97,
                _ => return None,
            };
            let _ = write!(s, "\x1b[{}m", code + base);
        }
    }
    Some(s)
}

/// Enables mouse reporting for as long as it lives
pub struct MouseCaptureGuard;

impl MouseCaptureGuard {
    pub fn enable() -> io::Result<Self> {
        execute!(stdout(), EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for MouseCaptureGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture);
    }
}
