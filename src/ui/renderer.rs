//! Panel renderer using crossterm
//!
//! Draws the docked panel at the bottom of the screen:
//!
//! ```text
//! row 0          hint banner
//! ...            (host area)
//! topbar_row     title, progress gauge, [clear] [max] [close]
//! body rows      visible emulator lines
//! ```
//!
//! Frames are wrapped in synchronized updates to prevent tearing.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    style::{Attribute, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

use crate::config::ColorScheme;
use crate::core::layout::PanelLayout;
use crate::core::term::{AttrFlags, CellAttrs, Color, Emulator, TermEmulator};

const TITLE: &str = " termdock ";
const GAUGE_WIDTH: usize = 20;

/// Begin a render frame (synchronized update, hide cursor, disable autowrap)
fn begin_frame<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "\x1b[?2026h")?; // Begin synchronized update
    write!(out, "\x1b[?7l")?; // Disable autowrap
    execute!(out, Hide)?;
    Ok(())
}

/// End a render frame (enable autowrap, end synchronized update, flush)
fn end_frame<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "\x1b[?7h")?; // Enable autowrap
    write!(out, "\x1b[?2026l")?; // End synchronized update
    out.flush()?;
    Ok(())
}

/// Terminal modes held for the lifetime of the host. Everything acquired
/// here is released on drop, including on early return and panic unwind.
pub struct TerminalGuard {
    keyboard_enhanced: bool,
}

impl TerminalGuard {
    pub fn acquire() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        // From here on an early return restores the terminal through Drop
        let mut guard = Self {
            keyboard_enhanced: false,
        };
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste,
            Clear(ClearType::All)
        )?;

        // Without disambiguation Ctrl+M arrives as Enter
        if matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )?;
            guard.keyboard_enhanced = true;
        } else {
            warn!("Keyboard enhancement unsupported; Ctrl+M is reported as Enter");
        }
        debug!("Terminal acquired (keyboard enhancement: {})", guard.keyboard_enhanced);

        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        if self.keyboard_enhanced {
            let _ = execute!(stdout, PopKeyboardEnhancementFlags);
        }
        let _ = write!(stdout, "\x1b[?7h\x1b[?2026l");
        let _ = execute!(
            stdout,
            ResetColor,
            SetAttribute(Attribute::Reset),
            Show,
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = stdout.flush();
        let _ = terminal::disable_raw_mode();
    }
}

/// Clickable topbar control
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Clear,
    Maximize,
    Close,
}

const CONTROLS: [(Control, &str); 3] = [
    (Control::Clear, " clear "),
    (Control::Maximize, " max "),
    (Control::Close, " close "),
];

/// What a mouse position lands on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTarget {
    Control(Control),
    /// Topbar outside the controls (drag handle)
    Topbar,
    /// Emulator area, relative to the body origin
    Body { col: u16, row: u16 },
}

/// Screen placement of the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelGeometry {
    pub width: u16,
    pub height: u16,
    pub topbar_row: u16,
    pub body_rows: u16,
}

impl PanelGeometry {
    /// Dock the panel at the bottom. Row 0 is kept for the banner, so the
    /// body never grows past `height - 2` rows.
    pub fn compute(width: u16, height: u16, emulator_rows: u16) -> Self {
        let body_rows = emulator_rows.min(height.saturating_sub(2));
        Self {
            width,
            height,
            topbar_row: height.saturating_sub(body_rows + 1),
            body_rows,
        }
    }

    pub fn body_top(&self) -> u16 {
        self.topbar_row + 1
    }

    /// Column span of each control, right-aligned on the topbar
    pub fn control_spans(&self) -> Vec<(Control, u16, u16)> {
        let total: u16 = CONTROLS.iter().map(|(_, label)| label.len() as u16).sum();
        let mut x = self.width.saturating_sub(total + 1);
        CONTROLS
            .iter()
            .map(|(control, label)| {
                let start = x;
                x += label.len() as u16;
                (*control, start, x)
            })
            .collect()
    }

    pub fn hit_test(&self, col: u16, row: u16) -> Option<HitTarget> {
        if row == self.topbar_row {
            let control = self
                .control_spans()
                .into_iter()
                .find(|(_, start, end)| (*start..*end).contains(&col))
                .map(|(control, _, _)| control);
            return Some(control.map_or(HitTarget::Topbar, HitTarget::Control));
        }
        if row > self.topbar_row && row < self.body_top() + self.body_rows && col < self.width {
            return Some(HitTarget::Body {
                col,
                row: row - self.body_top(),
            });
        }
        None
    }
}

/// Text progress bar
pub fn gauge(value: f32, width: usize) -> String {
    let filled = ((value.clamp(0.0, 100.0) / 100.0) * width as f32).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        value
    )
}

/// Everything a frame needs
pub struct Frame<'a> {
    pub layout: &'a PanelLayout,
    pub progress: Option<f32>,
    pub emulator: Option<&'a TermEmulator>,
}

/// Panel renderer
pub struct PanelRenderer {
    pub color_scheme: ColorScheme,
    banner: String,
    geometry: PanelGeometry,
}

impl PanelRenderer {
    pub fn new(color_scheme: ColorScheme, banner: impl Into<String>) -> Self {
        Self {
            color_scheme,
            banner: banner.into(),
            geometry: PanelGeometry::compute(0, 0, 0),
        }
    }

    /// Geometry of the last rendered frame
    pub fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    /// Get terminal size
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    pub fn render(&mut self, frame: &Frame) -> io::Result<()> {
        let (width, height) = Self::size()?;
        let emulator_rows = frame.emulator.map_or(0, TermEmulator::rows);
        self.geometry = PanelGeometry::compute(width, height, emulator_rows);

        let stdout = io::stdout();
        let mut out = io::BufWriter::with_capacity(65536, stdout.lock());

        begin_frame(&mut out)?;
        let result = self.render_frame(&mut out, frame);
        let _ = end_frame(&mut out);
        result
    }

    fn render_frame<W: Write>(&self, out: &mut W, frame: &Frame) -> io::Result<()> {
        let geo = self.geometry;
        self.render_banner(out)?;

        // Host area between the banner and the panel
        execute!(out, ResetColor, SetAttribute(Attribute::Reset))?;
        for row in 1..geo.topbar_row {
            execute!(out, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
        }

        self.render_topbar(out, frame)?;
        if let Some(emulator) = frame.emulator {
            self.render_body(out, emulator)?;
            self.place_cursor(out, frame, emulator)?;
        }
        execute!(out, ResetColor, SetAttribute(Attribute::Reset))?;
        Ok(())
    }

    fn render_banner<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let cs = &self.color_scheme;
        let width = self.geometry.width as usize;
        execute!(
            out,
            MoveTo(0, 0),
            SetBackgroundColor(cs.banner_bg.to_crossterm()),
            SetForegroundColor(cs.banner_fg.to_crossterm())
        )?;
        write!(out, "{}", fit_to_width(&format!(" {}", self.banner), width))?;
        Ok(())
    }

    fn render_topbar<W: Write>(&self, out: &mut W, frame: &Frame) -> io::Result<()> {
        let cs = &self.color_scheme;
        let geo = self.geometry;
        let width = geo.width as usize;

        let mut left = TITLE.to_string();
        if let Some(value) = frame.progress {
            left.push_str(&gauge(value, GAUGE_WIDTH));
        }
        if let Some(emulator) = frame.emulator {
            if emulator.state.is_scrolled() {
                left.push_str(&format!("  [↑ {} lines]", emulator.state.scroll_offset));
            }
        }

        execute!(
            out,
            MoveTo(0, geo.topbar_row),
            SetBackgroundColor(cs.topbar_bg.to_crossterm()),
            SetForegroundColor(cs.topbar_fg.to_crossterm())
        )?;
        write!(out, "{}", fit_to_width(&left, width))?;

        // Gauge track and fill drawn over the title bar
        if let Some(value) = frame.progress {
            let filled = ((value.clamp(0.0, 100.0) / 100.0) * GAUGE_WIDTH as f32).round() as usize;
            let x = (TITLE.len() + 1) as u16;
            if x as usize + GAUGE_WIDTH < width {
                execute!(
                    out,
                    MoveTo(x, geo.topbar_row),
                    SetForegroundColor(cs.progress_fg.to_crossterm())
                )?;
                write!(out, "{}", "#".repeat(filled))?;
                execute!(out, SetForegroundColor(cs.progress_track.to_crossterm()))?;
                write!(out, "{}", "-".repeat(GAUGE_WIDTH - filled))?;
            }
        }

        for (control, start, _) in geo.control_spans() {
            let active = match control {
                Control::Clear => false,
                Control::Maximize => frame.layout.is_maximized(),
                Control::Close => frame.layout.is_closed(),
            };
            let (bg, fg) = if active {
                (cs.control_active_bg, cs.control_active_fg)
            } else {
                (cs.topbar_bg, cs.topbar_fg)
            };
            let label = CONTROLS
                .iter()
                .find(|(c, _)| *c == control)
                .map_or("", |(_, label)| *label);
            execute!(
                out,
                MoveTo(start, geo.topbar_row),
                SetBackgroundColor(bg.to_crossterm()),
                SetForegroundColor(fg.to_crossterm())
            )?;
            write!(out, "{}", label)?;
        }
        Ok(())
    }

    fn render_body<W: Write>(&self, out: &mut W, emulator: &TermEmulator) -> io::Result<()> {
        let geo = self.geometry;
        let state = &emulator.state;
        let num_cols = geo.width;
        let has_selection = state.selection.is_some();
        let first = state.first_visible_line();

        let mut line_buffer = String::with_capacity(256);

        for row in 0..geo.body_rows {
            execute!(out, MoveTo(0, geo.body_top() + row))?;
            self.apply_attrs(out, &CellAttrs::default(), false)?;
            write!(out, "\x1b[K")?;

            let abs = first + row as usize;
            let Some(line) = state.lines.get(abs) else {
                continue;
            };

            let mut current_attrs = CellAttrs::default();
            let mut current_selected = false;
            let mut col_idx: u16 = 0;
            for cell in &line.cells {
                if col_idx >= num_cols {
                    break;
                }
                if cell.is_continuation() {
                    col_idx += 1;
                    continue;
                }
                let width = cell.width.max(1) as u16;
                if col_idx + width > num_cols {
                    break;
                }

                let is_selected = has_selection && state.is_selected(col_idx, abs);
                if (cell.attrs != current_attrs || is_selected != current_selected)
                    && !line_buffer.is_empty()
                {
                    self.apply_attrs(out, &current_attrs, current_selected)?;
                    write!(out, "{}", line_buffer)?;
                    line_buffer.clear();
                }
                current_attrs = cell.attrs.clone();
                current_selected = is_selected;

                line_buffer.push_str(cell.display_char());
                col_idx += width;
            }

            if !line_buffer.is_empty() {
                self.apply_attrs(out, &current_attrs, current_selected)?;
                write!(out, "{}", line_buffer)?;
                line_buffer.clear();
            }
        }
        Ok(())
    }

    fn place_cursor<W: Write>(
        &self,
        out: &mut W,
        frame: &Frame,
        emulator: &TermEmulator,
    ) -> io::Result<()> {
        let geo = self.geometry;
        let state = &emulator.state;
        if frame.layout.is_closed() || !emulator.has_focus() || state.is_scrolled() {
            return Ok(());
        }
        let last = state.lines.len().saturating_sub(1);
        let row = last.saturating_sub(state.first_visible_line());
        if row < geo.body_rows as usize && state.cursor_col < geo.width as usize {
            execute!(out, MoveTo(state.cursor_col as u16, geo.body_top() + row as u16), Show)?;
        }
        Ok(())
    }

    /// Apply cell attributes with selection highlighting
    fn apply_attrs<W: Write>(&self, out: &mut W, attrs: &CellAttrs, selected: bool) -> io::Result<()> {
        let cs = &self.color_scheme;
        execute!(out, SetAttribute(Attribute::Reset))?;

        let (mut fg, mut bg) = if selected {
            (cs.selection_fg.to_crossterm(), cs.selection_bg.to_crossterm())
        } else {
            let fg = match attrs.fg {
                Color::Default => cs.output_fg.to_crossterm(),
                other => other.to_crossterm(),
            };
            let bg = match attrs.bg {
                Color::Default => cs.panel_bg.to_crossterm(),
                other => other.to_crossterm(),
            };
            (fg, bg)
        };
        if attrs.flags.contains(AttrFlags::INVERSE) && !selected {
            std::mem::swap(&mut fg, &mut bg);
        }
        execute!(out, SetForegroundColor(fg), SetBackgroundColor(bg))?;

        if attrs.flags.contains(AttrFlags::BOLD) {
            execute!(out, SetAttribute(Attribute::Bold))?;
        }
        if attrs.flags.contains(AttrFlags::DIM) {
            execute!(out, SetAttribute(Attribute::Dim))?;
        }
        if attrs.flags.contains(AttrFlags::ITALIC) {
            execute!(out, SetAttribute(Attribute::Italic))?;
        }
        if attrs.flags.contains(AttrFlags::UNDERLINE) {
            execute!(out, SetAttribute(Attribute::Underlined))?;
        }
        Ok(())
    }
}

/// Pad or cut text to exactly `width` display columns
fn fit_to_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width.saturating_sub(out.width())));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_docks_at_bottom() {
        let geo = PanelGeometry::compute(80, 24, 10);
        assert_eq!(geo.topbar_row, 13);
        assert_eq!(geo.body_top(), 14);
        assert_eq!(geo.body_rows, 10);

        // Body never covers the banner
        let tall = PanelGeometry::compute(80, 24, 100);
        assert_eq!(tall.body_rows, 22);
        assert_eq!(tall.topbar_row, 1);

        // Closed panel keeps its topbar on the last row
        let closed = PanelGeometry::compute(80, 24, 0);
        assert_eq!(closed.topbar_row, 23);
    }

    #[test]
    fn test_hit_test() {
        let geo = PanelGeometry::compute(80, 24, 10);
        let spans = geo.control_spans();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[2].2, 79);

        for (control, start, end) in &spans {
            assert_eq!(geo.hit_test(*start, 13), Some(HitTarget::Control(*control)));
            assert_eq!(geo.hit_test(end - 1, 13), Some(HitTarget::Control(*control)));
        }
        assert_eq!(geo.hit_test(0, 13), Some(HitTarget::Topbar));
        assert_eq!(geo.hit_test(5, 14), Some(HitTarget::Body { col: 5, row: 0 }));
        assert_eq!(geo.hit_test(5, 23), Some(HitTarget::Body { col: 5, row: 9 }));
        assert_eq!(geo.hit_test(5, 3), None);
    }

    #[test]
    fn test_gauge() {
        assert_eq!(gauge(0.0, 4), "[----]   0%");
        assert_eq!(gauge(50.0, 4), "[##--]  50%");
        assert_eq!(gauge(100.0, 4), "[####] 100%");
    }

    #[test]
    fn test_topbar_draws_gauge_track() {
        use crate::core::layout::PanelBounds;

        let mut renderer = PanelRenderer::new(ColorScheme::default(), "banner");
        renderer.geometry = PanelGeometry::compute(80, 24, 10);
        let layout = PanelLayout::new(PanelBounds::new(30, 200, 500).unwrap());
        let track = "\x1b[38;2;80;80;80m";

        let mut out = Vec::new();
        let frame = Frame { layout: &layout, progress: Some(50.0), emulator: None };
        renderer.render_topbar(&mut out, &frame).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&format!("{}{}", track, "-".repeat(GAUGE_WIDTH / 2))));

        let mut out = Vec::new();
        let frame = Frame { layout: &layout, progress: None, emulator: None };
        renderer.render_topbar(&mut out, &frame).unwrap();
        assert!(!String::from_utf8(out).unwrap().contains(track));
    }

    #[test]
    fn test_fit_to_width() {
        assert_eq!(fit_to_width("abc", 5), "abc  ");
        assert_eq!(fit_to_width("abcdef", 3), "abc");
        assert_eq!(fit_to_width("日本語", 5), "日本 ");
    }
}
