use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    text::Line,
    widgets::{Cell, Paragraph, Row, Table, TableState},
    DefaultTerminal, Frame,
};
use uuid::Uuid;

use crate::form::{FormOutcome, RecordForm};
use crate::reports::matches_query;
use crate::store::Dataset;
use crate::tui::{self, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

const PAGE_SIZE: usize = 15;

enum BrowseMode {
    Normal,
    /// Editing the search query; the table filters live as it changes.
    Search,
    Form(RecordForm),
    ConfirmDelete(Uuid),
}

pub enum BrowseAction {
    Continue,
    Close,
}

/// Scrollable, searchable record table with inline add/edit/delete. Holds
/// only view state; the dataset itself is passed into each call so edits
/// land directly in the caller's session.
pub struct RecordBrowser {
    offset: usize,
    visible_count: usize,
    selected: usize,
    query: String,
    mode: BrowseMode,
    status_message: Option<String>,
    table_state: TableState,
}

impl Default for RecordBrowser {
    fn default() -> Self {
        Self {
            offset: 0,
            visible_count: PAGE_SIZE,
            selected: 0,
            query: String::new(),
            mode: BrowseMode::Normal,
            status_message: None,
            table_state: TableState::default(),
        }
    }
}

impl RecordBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices into `data.records` that pass the current search filter,
    /// in display order (import order, newest manual entries first).
    fn visible_indices(&self, data: &Dataset) -> Vec<usize> {
        data.records
            .iter()
            .enumerate()
            .filter(|(_, r)| matches_query(r, self.query.trim()))
            .map(|(i, _)| i)
            .collect()
    }

    fn selected_record_idx(&self, data: &Dataset) -> Option<usize> {
        self.visible_indices(data).get(self.offset + self.selected).copied()
    }

    pub fn run(&mut self, data: &mut Dataset) -> io::Result<()> {
        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            ratatui::restore();
            hook(info);
        }));

        let mut terminal = ratatui::init();
        let result = self.event_loop(&mut terminal, data);
        ratatui::restore();
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal, data: &mut Dataset) -> io::Result<()> {
        loop {
            terminal.draw(|frame| self.draw_frame(frame, data))?;

            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) = event::read()?
            {
                if kind != KeyEventKind::Press {
                    continue;
                }
                if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
                    break;
                }
                if let BrowseAction::Close = self.handle_key(code, data) {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Draw the browser into the given frame. Callable from an external
    /// event loop (the dashboard embeds it as a screen).
    pub fn draw_frame(&mut self, frame: &mut Frame, data: &Dataset) {
        let area = frame.area();

        let panel_height: u16 = match &self.mode {
            BrowseMode::Form(form) => form.height(),
            BrowseMode::ConfirmDelete(_) => 1,
            _ => 0,
        };

        let areas = Layout::vertical([
            Constraint::Length(1),            // title
            Constraint::Fill(1),              // table
            Constraint::Length(panel_height), // form / confirm panel
            Constraint::Length(1),            // status
            Constraint::Length(1),            // keys
        ])
        .split(area);
        let title_area = areas[0];
        let table_area = areas[1];
        let panel_area = areas[2];
        let status_area = areas[3];
        let keys_area = areas[4];

        frame.render_widget(Paragraph::new("消費紀錄").style(HEADER_STYLE), title_area);

        let visible = self.visible_indices(data);

        // Fixed columns: marker + date + one per bank + total; the note
        // column takes the rest and wraps.
        let amount_width = 12u16;
        let num_cols = 4 + data.bank_names.len() as u16;
        let fixed_cols = 2 + 8 + amount_width * (data.bank_names.len() as u16 + 1);
        let spacing = num_cols - 1;
        let note_width = table_area.width.saturating_sub(fixed_cols + spacing) as usize;
        let note_width = note_width.max(10);

        let header_overhead = 2u16; // header row + bottom_margin
        let available_height = table_area.height.saturating_sub(header_overhead) as usize;
        let mut rendered_rows = Vec::new();
        let mut total_height = 0usize;
        let mut vis = 0usize;

        for &rec_idx in visible.iter().skip(self.offset) {
            let rec = &data.records[rec_idx];
            let (wrapped_note, line_count) = tui::wrap_text(&rec.note, note_width);
            let h = line_count as usize;
            if total_height + h > available_height && vis > 0 {
                break;
            }

            let mut cells: Vec<Cell> = vec![
                Cell::from(if rec.has_discrepancy() { "!" } else { "" }),
                Cell::from(rec.date.clone()),
            ];
            for bank in &data.bank_names {
                cells.push(Cell::from(tui::money_span(rec.bank_amount(bank))));
            }
            cells.push(Cell::from(tui::total_span(rec.total)));
            cells.push(Cell::from(wrapped_note));

            rendered_rows.push(Row::new(cells).height(line_count));
            total_height += h;
            vis += 1;
        }

        self.visible_count = vis.max(1);

        let mut widths = vec![Constraint::Length(2), Constraint::Length(8)];
        widths.extend(
            std::iter::repeat(Constraint::Length(amount_width))
                .take(data.bank_names.len() + 1),
        );
        widths.push(Constraint::Fill(1));

        let mut header_cells: Vec<String> = vec![String::new(), "日期".to_string()];
        header_cells.extend(data.bank_names.iter().cloned());
        header_cells.push("總消費".to_string());
        header_cells.push("備註".to_string());

        self.table_state.select(Some(self.selected));
        let table = Table::new(rendered_rows, widths)
            .header(Row::new(header_cells).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut self.table_state);

        if panel_height > 0 {
            let panel_lines: Vec<Line> = match &self.mode {
                BrowseMode::Form(form) => form.lines(),
                BrowseMode::ConfirmDelete(_) => {
                    vec![Line::from("  Delete the selected record? y/n")]
                }
                _ => vec![],
            };
            frame.render_widget(Paragraph::new(panel_lines), panel_area);
        }

        let end_row = (self.offset + self.visible_count).min(visible.len());
        let filter = if self.query.trim().is_empty() {
            String::new()
        } else {
            format!(" | filter: {}", self.query.trim())
        };
        let status = match &self.status_message {
            Some(msg) => format!(
                "Rows {}-{} of {}{} | {}",
                (self.offset + 1).min(end_row),
                end_row,
                visible.len(),
                filter,
                msg
            ),
            None => format!(
                "Rows {}-{} of {}{}",
                (self.offset + 1).min(end_row),
                end_row,
                visible.len(),
                filter
            ),
        };
        frame.render_widget(Paragraph::new(status).style(FOOTER_STYLE), status_area);

        let keys_widget = match &self.mode {
            BrowseMode::Normal => Paragraph::new(
                "\u{2191}/\u{2193}:select  a:add  e:edit  d:delete  /:search  q:quit",
            )
            .style(FOOTER_STYLE),
            BrowseMode::Search => Paragraph::new(format!("Search: {}\u{2588}", self.query)),
            BrowseMode::Form(_) => {
                Paragraph::new("Tab/\u{2191}/\u{2193}:field  Enter=save  Esc=cancel")
                    .style(FOOTER_STYLE)
            }
            BrowseMode::ConfirmDelete(_) => {
                Paragraph::new("y=delete  n/Esc=keep").style(FOOTER_STYLE)
            }
        };
        frame.render_widget(keys_widget, keys_area);
    }

    /// Handle one key press, mutating the dataset for committed edits.
    pub fn handle_key(&mut self, code: KeyCode, data: &mut Dataset) -> BrowseAction {
        match &mut self.mode {
            BrowseMode::Normal => {
                self.status_message = None;
                return self.handle_normal_key(code, data);
            }
            BrowseMode::Search => match code {
                KeyCode::Esc => {
                    self.query.clear();
                    self.reset_scroll();
                    self.mode = BrowseMode::Normal;
                }
                KeyCode::Enter => self.mode = BrowseMode::Normal,
                KeyCode::Backspace => {
                    self.query.pop();
                    self.reset_scroll();
                }
                KeyCode::Char(c) => {
                    self.query.push(c);
                    self.reset_scroll();
                }
                _ => {}
            },
            BrowseMode::Form(form) => match form.handle_key(code) {
                FormOutcome::Continue => {}
                FormOutcome::Cancel => self.mode = BrowseMode::Normal,
                FormOutcome::Saved(record) => {
                    let editing = form.is_edit();
                    if editing {
                        match data.update_record(record) {
                            Ok(()) => self.status_message = Some("Record updated".to_string()),
                            Err(e) => self.status_message = Some(format!("Edit failed: {e}")),
                        }
                    } else {
                        data.add_record(record);
                        self.offset = 0;
                        self.selected = 0;
                        self.status_message = Some("Record added".to_string());
                    }
                    self.mode = BrowseMode::Normal;
                }
            },
            BrowseMode::ConfirmDelete(id) => match code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    let id = *id;
                    match data.delete_record(id) {
                        Ok(removed) => {
                            self.status_message = Some(format!("Deleted {}", removed.date));
                        }
                        Err(e) => self.status_message = Some(format!("Delete failed: {e}")),
                    }
                    self.clamp_selection(data);
                    self.mode = BrowseMode::Normal;
                }
                KeyCode::Char('n') | KeyCode::Esc => self.mode = BrowseMode::Normal,
                _ => {}
            },
        }
        BrowseAction::Continue
    }

    fn handle_normal_key(&mut self, code: KeyCode, data: &mut Dataset) -> BrowseAction {
        let visible = self.visible_indices(data);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return BrowseAction::Close,
            KeyCode::Down => {
                if self.selected + 1 < self.visible_count.min(visible.len().saturating_sub(self.offset)) {
                    self.selected += 1;
                } else if self.offset + self.visible_count < visible.len() {
                    self.offset += 1;
                }
            }
            KeyCode::Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                } else if self.offset > 0 {
                    self.offset -= 1;
                }
            }
            KeyCode::PageDown | KeyCode::Right => {
                let new_offset = self.offset + self.visible_count;
                if new_offset < visible.len() {
                    self.offset = new_offset;
                }
                self.selected = 0;
            }
            KeyCode::PageUp | KeyCode::Left => {
                self.offset = self.offset.saturating_sub(self.visible_count);
                self.selected = 0;
            }
            KeyCode::Home => {
                self.offset = 0;
                self.selected = 0;
            }
            KeyCode::End => {
                self.offset = visible.len().saturating_sub(PAGE_SIZE);
                self.selected = 0;
            }
            KeyCode::Char('/') => self.mode = BrowseMode::Search,
            KeyCode::Char('a') => {
                self.mode = BrowseMode::Form(RecordForm::new_add(&data.bank_names));
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(idx) = self.selected_record_idx(data) {
                    self.mode = BrowseMode::Form(RecordForm::new_edit(
                        &data.records[idx],
                        &data.bank_names,
                    ));
                }
            }
            KeyCode::Char('d') => {
                if let Some(idx) = self.selected_record_idx(data) {
                    self.mode = BrowseMode::ConfirmDelete(data.records[idx].id);
                }
            }
            _ => {}
        }
        BrowseAction::Continue
    }

    fn reset_scroll(&mut self) {
        self.offset = 0;
        self.selected = 0;
    }

    fn clamp_selection(&mut self, data: &Dataset) {
        let len = self.visible_indices(data).len();
        if self.offset >= len {
            self.offset = len.saturating_sub(1);
        }
        let remaining = len.saturating_sub(self.offset);
        if remaining > 0 && self.selected >= remaining {
            self.selected = remaining - 1;
        }
        if remaining == 0 {
            self.selected = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "日期,中信金額,-,-,-,-,國泰金額,-,-,-,-,總消費,-,-,-,家用,房租,定期,額外,備註\n\
                       22/01,100,x,x,x,x,200,x,x,x,x,300,a,b,c,0,0,0,0,groceries\n\
                       22/02,10,x,x,x,x,20,x,x,x,x,30,a,b,c,0,0,0,0,travel\n\
                       22/03,5,x,x,x,x,5,x,x,x,x,10,a,b,c,0,0,0,0,misc\n";

    fn dataset() -> Dataset {
        Dataset::from_csv(CSV).unwrap()
    }

    fn type_str(browser: &mut RecordBrowser, data: &mut Dataset, s: &str) {
        for c in s.chars() {
            browser.handle_key(KeyCode::Char(c), data);
        }
    }

    #[test]
    fn test_selection_moves_within_visible_rows() {
        let mut data = dataset();
        let mut browser = RecordBrowser::new();
        assert_eq!(browser.selected, 0);
        browser.handle_key(KeyCode::Down, &mut data);
        assert_eq!(browser.selected, 1);
        browser.handle_key(KeyCode::Up, &mut data);
        browser.handle_key(KeyCode::Up, &mut data);
        assert_eq!(browser.selected, 0);
    }

    #[test]
    fn test_search_filters_live() {
        let mut data = dataset();
        let mut browser = RecordBrowser::new();
        browser.handle_key(KeyCode::Char('/'), &mut data);
        type_str(&mut browser, &mut data, "trav");
        assert_eq!(browser.visible_indices(&data), vec![1]);

        // Esc clears the filter entirely
        browser.handle_key(KeyCode::Esc, &mut data);
        assert_eq!(browser.visible_indices(&data).len(), 3);
    }

    #[test]
    fn test_search_matches_dates_too() {
        let mut data = dataset();
        let mut browser = RecordBrowser::new();
        browser.handle_key(KeyCode::Char('/'), &mut data);
        type_str(&mut browser, &mut data, "22/0");
        browser.handle_key(KeyCode::Enter, &mut data);
        assert_eq!(browser.visible_indices(&data).len(), 3);
    }

    #[test]
    fn test_add_flow_prepends_record() {
        let mut data = dataset();
        let mut browser = RecordBrowser::new();
        browser.handle_key(KeyCode::Char('a'), &mut data);
        assert!(matches!(browser.mode, BrowseMode::Form(_)));
        // The add form prefills a valid date, so Enter saves immediately.
        browser.handle_key(KeyCode::Enter, &mut data);
        assert!(matches!(browser.mode, BrowseMode::Normal));
        assert_eq!(data.len(), 4);
        assert_eq!(data.records[0].total, 0.0);
    }

    #[test]
    fn test_edit_flow_updates_in_place() {
        let mut data = dataset();
        let id = data.records[0].id;
        let mut browser = RecordBrowser::new();
        browser.handle_key(KeyCode::Char('e'), &mut data);
        // Append to the date field, then save.
        for key in [KeyCode::Backspace, KeyCode::Char('9')] {
            browser.handle_key(key, &mut data);
        }
        browser.handle_key(KeyCode::Enter, &mut data);
        assert_eq!(data.len(), 3);
        assert_eq!(data.records[0].id, id);
        assert_eq!(data.records[0].date, "22/09");
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut data = dataset();
        let mut browser = RecordBrowser::new();

        browser.handle_key(KeyCode::Char('d'), &mut data);
        browser.handle_key(KeyCode::Char('n'), &mut data);
        assert_eq!(data.len(), 3);

        browser.handle_key(KeyCode::Char('d'), &mut data);
        browser.handle_key(KeyCode::Char('y'), &mut data);
        assert_eq!(data.len(), 2);
        assert_eq!(data.records[0].date, "22/02");
    }

    #[test]
    fn test_delete_clamps_selection() {
        let mut data = dataset();
        let mut browser = RecordBrowser::new();
        browser.handle_key(KeyCode::Down, &mut data);
        browser.handle_key(KeyCode::Down, &mut data);
        assert_eq!(browser.selected, 2);
        browser.handle_key(KeyCode::Char('d'), &mut data);
        browser.handle_key(KeyCode::Char('y'), &mut data);
        assert_eq!(data.len(), 2);
        assert!(browser.selected < 2);
    }

    #[test]
    fn test_quit_from_normal_mode() {
        let mut data = dataset();
        let mut browser = RecordBrowser::new();
        assert!(matches!(
            browser.handle_key(KeyCode::Char('q'), &mut data),
            BrowseAction::Close
        ));
    }
}
