use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};

use crate::browser::{BrowseAction, RecordBrowser};
use crate::error::Result;
use crate::fmt::money_compact;
use crate::reports::{self, Stats};
use crate::store::Dataset;
use crate::tui::{money_span, total_span, FOOTER_STYLE, HEADER_STYLE};

const MENU_ITEMS: [&str; 3] = ["Browse & edit records", "Reload the CSV", "Quit"];

enum Screen {
    Home,
    Browse(RecordBrowser),
}

struct Dashboard {
    file: String,
    screen: Screen,
    menu_selection: usize,
    stats: Stats,
    status_message: Option<String>,
}

impl Dashboard {
    fn new(file: &str, data: &Dataset) -> Self {
        Self {
            file: file.to_string(),
            screen: Screen::Home,
            menu_selection: 0,
            stats: reports::compute_stats(data),
            status_message: None,
        }
    }

    /// Recompute the derived aggregates. Called whenever the dataset may
    /// have changed (browser edits, reload).
    fn refresh(&mut self, data: &Dataset) {
        self.stats = reports::compute_stats(data);
    }

    /// Re-read the source file. A failed parse leaves the current dataset
    /// in place and only reports the problem.
    fn reload(&mut self, data: &mut Dataset) {
        let outcome = std::fs::read_to_string(&self.file)
            .map_err(crate::error::CardbookError::from)
            .and_then(|text| data.try_import(&text));
        match outcome {
            Ok(count) => {
                self.refresh(data);
                self.status_message = Some(format!("Reloaded {count} records"));
            }
            Err(e) => {
                self.status_message = Some(format!("Reload failed: {e}"));
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame, data: &Dataset) {
        if let Screen::Browse(ref mut browser) = self.screen {
            browser.draw_frame(frame, data);
            return;
        }
        self.draw_home(frame, data);
    }

    fn draw_home(&self, frame: &mut Frame, data: &Dataset) {
        let area = frame.area();
        let border_style = Style::default().fg(Color::DarkGray);

        let menu_rows = MENU_ITEMS.len() as u16 + 1;
        let [header_area, sep1, stats_area, sep2, chart_area, sep3, menu_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(6),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(menu_rows),
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" 總表 \u{2014} {}", self.file)).style(HEADER_STYLE),
            header_area,
        );

        let sep_line = "\u{2501}".repeat(area.width as usize);
        let sep_widget = Paragraph::new(sep_line.as_str()).style(border_style);
        frame.render_widget(sep_widget.clone(), sep1);
        frame.render_widget(sep_widget.clone(), sep2);
        frame.render_widget(sep_widget, sep3);

        // Headline numbers left, per-bank totals right
        let [left_area, right_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(stats_area);

        let mut stats_lines = vec![
            Line::from(vec![
                Span::raw(" 總消費          "),
                total_span(self.stats.total_spent),
            ]),
            Line::from(vec![
                Span::raw(" 平均每月        "),
                money_span(self.stats.avg_spent),
            ]),
        ];
        if let Some(max) = &self.stats.max_month {
            stats_lines.push(Line::from(vec![
                Span::raw(format!(" 最高月份 {}   ", max.date)),
                money_span(max.total),
            ]));
        }
        stats_lines.push(Line::from(format!(" 紀錄筆數        {}", data.len())));
        if self.stats.discrepancies > 0 {
            stats_lines.push(Line::from(Span::styled(
                format!(
                    " ! {} record(s) total \u{2260} bank sum",
                    self.stats.discrepancies
                ),
                Style::default().fg(Color::Yellow),
            )));
        }
        frame.render_widget(Paragraph::new(stats_lines), left_area);

        let mut bank_lines = vec![Line::from(Span::styled(
            " 各銀行總計",
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        for (name, total) in &self.stats.bank_totals {
            bank_lines.push(Line::from(vec![
                Span::raw(format!(" {name:<10}")),
                money_span(*total),
            ]));
        }
        frame.render_widget(Paragraph::new(bank_lines), right_area);

        // Per-bank bar chart with y-axis tick labels
        if !self.stats.bank_totals.is_empty() {
            let max_val = self
                .stats
                .bank_totals
                .iter()
                .map(|(_, v)| *v)
                .fold(1.0_f64, f64::max);
            let (top_tick, mid_tick) = y_axis_ticks(max_val);
            let top_label = money_compact(top_tick);
            let mid_label = money_compact(mid_tick);
            let y_label_width = top_label.len().max(mid_label.len()) as u16 + 1;

            let [y_axis_area, bar_area] =
                Layout::horizontal([Constraint::Length(y_label_width), Constraint::Fill(1)])
                    .areas(chart_area);

            let inner_height = bar_area.height.saturating_sub(2); // title + bank labels
            let mid_row = inner_height / 2;
            let mut y_lines: Vec<Line> = vec![Line::from("")]; // title row
            for row in 0..inner_height {
                if row == 0 {
                    y_lines.push(Line::from(Span::styled(
                        format!("{:>width$}", top_label, width = y_label_width as usize),
                        FOOTER_STYLE,
                    )));
                } else if row == mid_row {
                    y_lines.push(Line::from(Span::styled(
                        format!("{:>width$}", mid_label, width = y_label_width as usize),
                        FOOTER_STYLE,
                    )));
                } else {
                    y_lines.push(Line::from(""));
                }
            }
            frame.render_widget(Paragraph::new(y_lines), y_axis_area);

            let bar_style = Style::default().fg(Color::Cyan);
            let groups: Vec<BarGroup> = self
                .stats
                .bank_totals
                .iter()
                .map(|(name, total)| {
                    let bars = vec![Bar::default().value(*total as u64).style(bar_style)];
                    BarGroup::default()
                        .label(Line::from(name.as_str()))
                        .bars(&bars)
                })
                .collect();

            let block = Block::default()
                .title("各銀行消費")
                .title_style(Style::default().add_modifier(Modifier::BOLD))
                .borders(Borders::NONE);

            let mut chart = BarChart::default()
                .block(block)
                .bar_width(6)
                .bar_gap(0)
                .group_gap(2);
            for group in &groups {
                chart = chart.data(group.clone());
            }
            frame.render_widget(chart, bar_area);
        }

        // Command menu
        let [menu_title_area, menu_items_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(menu_area);
        frame.render_widget(
            Paragraph::new(Span::styled(
                " What would you like to do?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            menu_title_area,
        );
        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let marker = if i == self.menu_selection { ">" } else { " " };
                let style = if i == self.menu_selection {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(format!(" {marker} {item}"), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(menu_lines), menu_items_area);

        if let Some(msg) = &self.status_message {
            frame.render_widget(
                Paragraph::new(format!(" {msg}")).style(Style::default().fg(Color::Yellow)),
                hints_area,
            );
        } else {
            frame.render_widget(
                Paragraph::new(" Up/Down=navigate  Enter=select  r=reload  q=quit")
                    .style(FOOTER_STYLE),
                hints_area,
            );
        }
    }

    /// Returns true when the dashboard should exit.
    fn handle_home_key(&mut self, code: KeyCode, data: &mut Dataset) -> bool {
        self.status_message = None;
        match code {
            KeyCode::Up => self.menu_selection = self.menu_selection.saturating_sub(1),
            KeyCode::Down => {
                self.menu_selection = (self.menu_selection + 1).min(MENU_ITEMS.len() - 1)
            }
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('r') => self.reload(data),
            KeyCode::Enter => match self.menu_selection {
                0 => self.screen = Screen::Browse(RecordBrowser::new()),
                1 => self.reload(data),
                2 => return true,
                _ => {}
            },
            _ => {}
        }
        false
    }
}

/// Round y-axis tick values (top and mid) for the per-bank chart.
fn y_axis_ticks(max_val: f64) -> (f64, f64) {
    let steps = [
        1000.0, 2500.0, 5000.0, 10000.0, 25000.0, 50000.0, 100000.0, 250000.0, 500000.0,
        1_000_000.0, 2_500_000.0, 5_000_000.0, 10_000_000.0,
    ];
    let top = steps
        .iter()
        .copied()
        .find(|&s| s >= max_val)
        .unwrap_or(max_val);
    (top, top / 2.0)
}

pub fn run(file: &str) -> Result<()> {
    let mut data = super::load_dataset(file)?;
    let mut dashboard = Dashboard::new(file, &data);

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = dashboard.event_loop(&mut terminal, &mut data);
    ratatui::restore();
    result
}

impl Dashboard {
    fn event_loop(&mut self, terminal: &mut DefaultTerminal, data: &mut Dataset) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame, data))?;

            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                break;
            }

            match &mut self.screen {
                Screen::Browse(browser) => {
                    if let BrowseAction::Close = browser.handle_key(key.code, data) {
                        self.screen = Screen::Home;
                        self.refresh(data);
                    }
                }
                Screen::Home => {
                    if self.handle_home_key(key.code, data) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
