use crate::colors::text;
use crate::terminal::Terminal;
use crossterm::style::Color;

pub const HELP_TEXT: &str = "\
sunmap: live day/night terminator

  1-5     speed 1x 60x 600x 3600x 86400x
  -       reverse time
  0       pause
  r       back to now
  g       toggle grid
  mouse   hover a city for local time
  ?       close this help
  q/Esc   quit";

/// Box geometry for `lines`: 2 chars padding each side, border rows top and bottom
fn box_size(lines: &[&str]) -> (usize, usize) {
    let max_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    (max_width + 4, lines.len() + 2)
}

/// Bordered box with its top-left corner at (`start_x`, `start_y`).
/// `last_color` overrides the text color of the final line.
fn draw_box(term: &mut Terminal, start_x: usize, start_y: usize, lines: &[&str], last_color: Option<Color>) {
    let (box_width, box_height) = box_size(lines);
    let inner = box_width - 4;
    let border = Some(text::TOOLTIP_BORDER);
    let (x0, y0) = (start_x as i32, start_y as i32);
    let x1 = (start_x + box_width - 1) as i32;

    term.set_with_bg(x0, y0, '┌', border, Some(text::OVERLAY_BG), false);
    for x in x0 + 1..x1 {
        term.set_with_bg(x, y0, '─', border, Some(text::OVERLAY_BG), false);
    }
    term.set_with_bg(x1, y0, '┐', border, Some(text::OVERLAY_BG), false);

    for (i, line) in lines.iter().enumerate() {
        let y = y0 + 1 + i as i32;
        term.set_with_bg(x0, y, '│', border, Some(text::OVERLAY_BG), false);
        let padding = inner.saturating_sub(line.chars().count());
        let padded = format!(" {}{} ", line, " ".repeat(padding));
        let fg = match last_color {
            Some(color) if i + 1 == lines.len() => color,
            _ => text::TOOLTIP_TEXT,
        };
        term.set_str_bg(x0 + 1, y, &padded, Some(fg), text::OVERLAY_BG, i == 0);
        term.set_with_bg(x1, y, '│', border, Some(text::OVERLAY_BG), false);
    }

    let bottom = (start_y + box_height - 1) as i32;
    term.set_with_bg(x0, bottom, '└', border, Some(text::OVERLAY_BG), false);
    for x in x0 + 1..x1 {
        term.set_with_bg(x, bottom, '─', border, Some(text::OVERLAY_BG), false);
    }
    term.set_with_bg(x1, bottom, '┘', border, Some(text::OVERLAY_BG), false);
}

/// Render a centered help overlay box with the provided text.
pub fn render_help_overlay(term: &mut Terminal, width: u16, height: u16, help_text: &str) {
    if help_text.is_empty() {
        return;
    }
    let lines: Vec<&str> = help_text.lines().collect();
    let (box_width, box_height) = box_size(&lines);
    let start_x = (width as usize).saturating_sub(box_width) / 2;
    let start_y = (height as usize).saturating_sub(box_height) / 2;
    draw_box(term, start_x, start_y, &lines, None);
}

/// Tooltip next to the pointer cell, flipped left/up when it would run
/// off the right or bottom edge. `accent` colors the last line.
pub fn render_tooltip(term: &mut Terminal, column: u16, row: u16, lines: &[String], accent: Option<Color>) {
    if lines.is_empty() {
        return;
    }
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    let (box_width, box_height) = box_size(&lines);
    let (width, height) = term.size();
    let (width, height) = (width as usize, height as usize);
    let (col, row) = (column as usize, row as usize);

    let start_x = if col + 2 + box_width <= width {
        col + 2
    } else {
        col.saturating_sub(box_width + 1)
    };
    let start_y = if row + 1 + box_height <= height {
        row + 1
    } else {
        row.saturating_sub(box_height)
    };
    draw_box(term, start_x, start_y, &lines, accent);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(term: &Terminal, x: i32, y: i32) -> char {
        term.get(x, y).map(|c| c.ch).unwrap_or('?')
    }

    #[test]
    fn help_box_is_centered() {
        let mut term = Terminal::offscreen(20, 6);
        render_help_overlay(&mut term, 20, 6, "ab\ncd");
        // 6 wide, 4 tall
        assert_eq!(ch(&term, 7, 1), '┌');
        assert_eq!(ch(&term, 12, 1), '┐');
        assert_eq!(ch(&term, 7, 4), '└');
        assert_eq!(ch(&term, 12, 4), '┘');
        assert_eq!(ch(&term, 9, 2), 'a');
        assert_eq!(ch(&term, 10, 3), 'd');
    }

    #[test]
    fn empty_text_draws_nothing() {
        let mut term = Terminal::offscreen(10, 4);
        render_help_overlay(&mut term, 10, 4, "");
        render_tooltip(&mut term, 0, 0, &[], None);
        assert_eq!(ch(&term, 0, 0), ' ');
    }

    #[test]
    fn tooltip_flips_at_edges() {
        let lines = vec!["Tokyo".to_string()];
        // box is 9 x 3

        let mut term = Terminal::offscreen(40, 10);
        render_tooltip(&mut term, 2, 2, &lines, None);
        assert_eq!(ch(&term, 4, 3), '┌');

        let mut term = Terminal::offscreen(40, 10);
        render_tooltip(&mut term, 36, 8, &lines, None);
        assert_eq!(ch(&term, 26, 5), '┌');
        assert_eq!(ch(&term, 34, 7), '┘');
    }

    #[test]
    fn tooltip_accent_colors_last_line() {
        let lines = vec!["Tokyo".to_string(), "Night  sun -20.0°".to_string()];
        let mut term = Terminal::offscreen(40, 10);
        render_tooltip(&mut term, 2, 2, &lines, Some(text::NIGHT));
        // box at (4, 3); text starts two columns in
        assert_eq!(term.get(6, 4).and_then(|c| c.fg), Some(text::TOOLTIP_TEXT));
        assert_eq!(term.get(6, 5).map(|c| c.ch), Some('N'));
        assert_eq!(term.get(6, 5).and_then(|c| c.fg), Some(text::NIGHT));
    }
}
