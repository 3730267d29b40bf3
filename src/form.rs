use crossterm::event::KeyCode;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use uuid::Uuid;

use crate::error::CardbookError;
use crate::importer::{is_valid_date, parse_money};
use crate::models::ExpenseRecord;
use crate::tui::{ERROR_STYLE, FOOTER_STYLE};

const CATEGORY_LABELS: [&str; 4] = ["家用", "房租", "定期", "額外"];

pub enum FormOutcome {
    Continue,
    Cancel,
    /// The form produced a record. For edits the id matches the record
    /// being edited; for adds it is fresh.
    Saved(ExpenseRecord),
}

/// Field-by-field entry form for one expense record. Works for both manual
/// entry and edits; the date is re-validated on every keystroke and saving
/// is disabled while it is invalid. `total` is not directly editable; it
/// is derived as the sum of the bank amounts at submission time.
pub struct RecordForm {
    editing_id: Option<Uuid>,
    bank_names: Vec<String>,
    labels: Vec<String>,
    values: Vec<String>,
    selected: usize,
}

impl RecordForm {
    /// Blank form for manual entry, date prefilled with the current month.
    pub fn new_add(bank_names: &[String]) -> Self {
        let date = chrono::Local::now().format("%y/%m").to_string();
        let mut form = Self::empty(bank_names);
        form.values[0] = date;
        form
    }

    /// Form prefilled from an existing record; its id is kept on save.
    pub fn new_edit(record: &ExpenseRecord, bank_names: &[String]) -> Self {
        let mut form = Self::empty(bank_names);
        form.editing_id = Some(record.id);
        form.values[0] = record.date.clone();
        for (i, bank) in form.bank_names.iter().enumerate() {
            form.values[1 + i] = format_amount(record.bank_amount(bank));
        }
        let n = form.bank_names.len();
        form.values[n + 1] = format_amount(record.family);
        form.values[n + 2] = format_amount(record.rent);
        form.values[n + 3] = format_amount(record.periodic);
        form.values[n + 4] = format_amount(record.extra);
        form.values[n + 5] = record.note.clone();
        form
    }

    fn empty(bank_names: &[String]) -> Self {
        let mut labels = vec!["日期 (YY/MM)".to_string()];
        labels.extend(bank_names.iter().cloned());
        labels.extend(CATEGORY_LABELS.iter().map(|s| s.to_string()));
        labels.push("備註".to_string());
        let values = vec![String::new(); labels.len()];
        Self {
            editing_id: None,
            bank_names: bank_names.to_vec(),
            labels,
            values,
            selected: 0,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing_id.is_some()
    }

    pub fn title(&self) -> &'static str {
        if self.is_edit() {
            "Edit record"
        } else {
            "Add record"
        }
    }

    fn date(&self) -> &str {
        self.values[0].trim()
    }

    /// Inline validation message; present whenever the date field fails the
    /// YY/MM check. Saving is blocked while this is Some.
    pub fn date_error(&self) -> Option<String> {
        if is_valid_date(self.date()) {
            None
        } else {
            Some(CardbookError::InvalidDate(self.date().to_string()).to_string())
        }
    }

    pub fn can_save(&self) -> bool {
        self.date_error().is_none()
    }

    /// Bank amounts as currently typed, in roster order.
    fn bank_values(&self) -> Vec<(String, f64)> {
        self.bank_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), parse_money(&self.values[1 + i])))
            .collect()
    }

    /// The headline total shown live in the form: sum of bank amounts,
    /// categories excluded.
    pub fn running_total(&self) -> f64 {
        self.bank_values().iter().map(|(_, v)| v).sum()
    }

    fn build_record(&self) -> ExpenseRecord {
        let n = self.bank_names.len();
        ExpenseRecord {
            id: self.editing_id.unwrap_or_else(Uuid::new_v4),
            date: self.date().to_string(),
            banks: self.bank_values().into_iter().collect(),
            total: self.running_total(),
            family: parse_money(&self.values[n + 1]),
            rent: parse_money(&self.values[n + 2]),
            periodic: parse_money(&self.values[n + 3]),
            extra: parse_money(&self.values[n + 4]),
            note: self.values[n + 5].trim().to_string(),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> FormOutcome {
        match code {
            KeyCode::Esc => return FormOutcome::Cancel,
            KeyCode::Enter => {
                if self.can_save() {
                    return FormOutcome::Saved(self.build_record());
                }
            }
            KeyCode::Down | KeyCode::Tab => {
                self.selected = (self.selected + 1) % self.values.len();
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.selected = self
                    .selected
                    .checked_sub(1)
                    .unwrap_or(self.values.len() - 1);
            }
            KeyCode::Backspace => {
                self.values[self.selected].pop();
            }
            KeyCode::Char(c) => {
                self.values[self.selected].push(c);
            }
            _ => {}
        }
        FormOutcome::Continue
    }

    /// Render the form as lines for the browser's panel area.
    pub fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(
            format!("  {}", self.title()),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        for (i, (label, value)) in self.labels.iter().zip(&self.values).enumerate() {
            let cursor = if i == self.selected { "\u{2588}" } else { "" };
            let marker = if i == self.selected { ">" } else { " " };
            lines.push(Line::from(format!("  {marker} {label}: {value}{cursor}")));
        }
        lines.push(Line::from(Span::styled(
            format!("    總消費 (銀行加總): {}", crate::fmt::money(self.running_total())),
            FOOTER_STYLE,
        )));
        if let Some(err) = self.date_error() {
            lines.push(Line::from(Span::styled(format!("    {err}"), ERROR_STYLE)));
        }
        lines
    }

    /// Panel height needed to draw the form.
    pub fn height(&self) -> u16 {
        // title + fields + running total + possible error line
        self.values.len() as u16 + 3
    }
}

fn format_amount(v: f64) -> String {
    if v == 0.0 {
        String::new()
    } else if v == v.floor() {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn roster() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    fn type_str(form: &mut RecordForm, s: &str) {
        for c in s.chars() {
            form.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_total_is_sum_of_banks_only() {
        let mut form = RecordForm::new_add(&roster());
        form.values[0] = "25/01".to_string();
        form.values[1] = "100".to_string(); // bank A
        form.values[2] = "50".to_string(); // bank B
        form.values[3] = "20".to_string(); // family

        assert_eq!(form.running_total(), 150.0);
        let FormOutcome::Saved(rec) = form.handle_key(KeyCode::Enter) else {
            panic!("expected save");
        };
        assert_eq!(rec.total, 150.0);
        assert_eq!(rec.family, 20.0);
        assert_eq!(rec.bank_amount("A"), 100.0);
        assert_eq!(rec.bank_amount("B"), 50.0);
    }

    #[test]
    fn test_invalid_date_blocks_save() {
        let mut form = RecordForm::new_add(&roster());
        form.values[0] = "not-a-date".to_string();
        assert!(!form.can_save());
        assert!(form.date_error().is_some());
        assert!(matches!(
            form.handle_key(KeyCode::Enter),
            FormOutcome::Continue
        ));

        form.values[0] = "25/01".to_string();
        assert!(form.can_save());
        assert!(matches!(
            form.handle_key(KeyCode::Enter),
            FormOutcome::Saved(_)
        ));
    }

    #[test]
    fn test_date_revalidated_per_keystroke() {
        let mut form = RecordForm::new_add(&roster());
        form.values[0].clear();
        assert!(form.date_error().is_some());
        type_str(&mut form, "25");
        assert!(form.date_error().is_some());
        type_str(&mut form, "/01");
        assert!(form.date_error().is_none());
        form.handle_key(KeyCode::Backspace);
        form.handle_key(KeyCode::Backspace);
        form.handle_key(KeyCode::Backspace);
        assert!(form.date_error().is_some());
    }

    #[test]
    fn test_edit_keeps_id_and_prefills() {
        let rec = ExpenseRecord {
            id: Uuid::new_v4(),
            date: "22/05".to_string(),
            banks: HashMap::from([("A".to_string(), 1200.0)]),
            total: 1200.0,
            family: 0.0,
            rent: 3000.0,
            periodic: 0.0,
            extra: 0.0,
            note: "note".to_string(),
        };
        let mut form = RecordForm::new_edit(&rec, &roster());
        assert!(form.is_edit());
        assert_eq!(form.values[0], "22/05");
        assert_eq!(form.values[1], "1200");
        assert_eq!(form.values[2], ""); // zero amounts prefill as blank

        let FormOutcome::Saved(edited) = form.handle_key(KeyCode::Enter) else {
            panic!("expected save");
        };
        assert_eq!(edited.id, rec.id);
        assert_eq!(edited.rent, 3000.0);
        assert_eq!(edited.note, "note");
    }

    #[test]
    fn test_field_navigation_wraps() {
        let mut form = RecordForm::new_add(&roster());
        let count = form.values.len();
        assert_eq!(form.selected, 0);
        form.handle_key(KeyCode::Up);
        assert_eq!(form.selected, count - 1);
        form.handle_key(KeyCode::Tab);
        assert_eq!(form.selected, 0);
        form.handle_key(KeyCode::Down);
        assert_eq!(form.selected, 1);
    }

    #[test]
    fn test_esc_cancels() {
        let mut form = RecordForm::new_add(&roster());
        assert!(matches!(form.handle_key(KeyCode::Esc), FormOutcome::Cancel));
    }

    #[test]
    fn test_add_prefills_current_month() {
        let form = RecordForm::new_add(&roster());
        assert!(is_valid_date(form.values[0].trim()));
    }
}
