//! Floating overlay widget for the context menu.
//!
//! Pure presentation: paints whatever entry list it is given near the
//! anchor cell. Composition and visibility decisions live in
//! [`crate::entries`] and [`crate::context_menu`].

use ftui::layout::Rect;
use ftui::{Cell, Frame, PackedRgba};

use crate::entries::{Emphasis, MenuEntry};

/// Opaque positioning handle: the cell the menu opens next to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuAnchor {
    pub col: u16,
    pub row: u16,
}

impl MenuAnchor {
    #[must_use]
    pub const fn new(col: u16, row: u16) -> Self {
        Self { col, row }
    }
}

const MENU_BG: PackedRgba = PackedRgba::rgb(30, 30, 35);
const MENU_BORDER: PackedRgba = PackedRgba::rgb(80, 80, 100);
const MENU_SELECTED_BG: PackedRgba = PackedRgba::rgb(60, 80, 120);
const MENU_FG: PackedRgba = PackedRgba::rgb(200, 200, 200);
const MENU_SELECTED_FG: PackedRgba = PackedRgba::rgb(255, 255, 255);
const MENU_HEADER_FG: PackedRgba = PackedRgba::rgb(140, 140, 160);
const MENU_DANGER_FG: PackedRgba = PackedRgba::rgb(255, 100, 100);

const MIN_WIDTH: usize = 24;
const MAX_WIDTH: usize = 46;

/// The context menu overlay widget.
pub struct ContextMenuWidget<'a> {
    entries: &'a [MenuEntry],
    selected: usize,
    anchor: MenuAnchor,
}

impl<'a> ContextMenuWidget<'a> {
    #[must_use]
    pub const fn new(entries: &'a [MenuEntry], selected: usize, anchor: MenuAnchor) -> Self {
        Self {
            entries,
            selected,
            anchor,
        }
    }

    /// The box the menu occupies: sized to the widest row, clamped into
    /// the terminal area, positioned at the anchor.
    #[must_use]
    pub fn layout(&self, terminal_area: Rect) -> Rect {
        let max_row_len = self
            .entries
            .iter()
            .map(|entry| entry.label.chars().count() + 2)
            .max()
            .unwrap_or(MIN_WIDTH);
        let width = (max_row_len + 4).clamp(MIN_WIDTH, MAX_WIDTH) as u16;
        let width = width.min(terminal_area.width);
        let height = ((self.entries.len() + 2) as u16).min(terminal_area.height);

        let x = self
            .anchor
            .col
            .min(terminal_area.width.saturating_sub(width));
        let y = self
            .anchor
            .row
            .min(terminal_area.height.saturating_sub(height));
        Rect::new(x, y, width, height)
    }

    /// Paint the overlay into the frame.
    pub fn render(&self, terminal_area: Rect, frame: &mut Frame) {
        if self.entries.is_empty() || terminal_area.width < 4 || terminal_area.height < 3 {
            return;
        }
        let area = self.layout(terminal_area);

        // Clear the area with the menu background.
        for row in area.y..area.bottom() {
            for col in area.x..area.right() {
                let mut cell = Cell::from_char(' ');
                cell.bg = MENU_BG;
                frame.buffer.set_fast(col, row, cell);
            }
        }

        let inner = Rect::new(
            area.x + 1,
            area.y + 1,
            area.width.saturating_sub(2),
            area.height.saturating_sub(2),
        );

        for (i, entry) in self.entries.iter().enumerate() {
            if i >= inner.height as usize {
                break;
            }
            let row = inner.y + i as u16;
            let is_selected = entry.is_actionable() && i == self.selected;

            let mut text = String::new();
            match entry.icon {
                Some(icon) => text.push(icon.glyph()),
                None => text.push(' '),
            }
            text.push(' ');
            text.push_str(&entry.label);

            let fg = if entry.emphasis == Emphasis::Danger {
                MENU_DANGER_FG
            } else if !entry.is_actionable() {
                MENU_HEADER_FG
            } else if is_selected {
                MENU_SELECTED_FG
            } else {
                MENU_FG
            };
            let bg = if is_selected { MENU_SELECTED_BG } else { MENU_BG };

            let mut col = inner.x;
            for ch in text.chars() {
                if col >= inner.right() {
                    break;
                }
                let mut cell = Cell::from_char(ch);
                cell.fg = fg;
                cell.bg = bg;
                frame.buffer.set_fast(col, row, cell);
                col += 1;
            }
            while col < inner.right() {
                let mut cell = Cell::from_char(' ');
                cell.bg = bg;
                frame.buffer.set_fast(col, row, cell);
                col += 1;
            }
        }

        self.render_border(area, frame);
    }

    fn render_border(&self, area: Rect, frame: &mut Frame) {
        let border_cell = |ch: char| -> Cell {
            let mut cell = Cell::from_char(ch);
            cell.fg = MENU_BORDER;
            cell.bg = MENU_BG;
            cell
        };

        frame.buffer.set_fast(area.x, area.y, border_cell('┌'));
        for col in (area.x + 1)..area.right().saturating_sub(1) {
            frame.buffer.set_fast(col, area.y, border_cell('─'));
        }
        frame
            .buffer
            .set_fast(area.right().saturating_sub(1), area.y, border_cell('┐'));

        for row in (area.y + 1)..area.bottom().saturating_sub(1) {
            frame.buffer.set_fast(area.x, row, border_cell('│'));
            frame
                .buffer
                .set_fast(area.right().saturating_sub(1), row, border_cell('│'));
        }

        frame
            .buffer
            .set_fast(area.x, area.bottom().saturating_sub(1), border_cell('└'));
        for col in (area.x + 1)..area.right().saturating_sub(1) {
            frame
                .buffer
                .set_fast(col, area.bottom().saturating_sub(1), border_cell('─'));
        }
        frame.buffer.set_fast(
            area.right().saturating_sub(1),
            area.bottom().saturating_sub(1),
            border_cell('┘'),
        );

        // Title
        let title = " Actions ";
        let title_x = area.x + 2;
        for (i, ch) in title.chars().enumerate() {
            let col = title_x + i as u16;
            if col < area.right().saturating_sub(1) {
                frame.buffer.set_fast(col, area.y, border_cell(ch));
            }
        }
    }
}
