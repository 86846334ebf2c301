//! Panels drawn by the terminal UI

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};
use ratatui::Frame;
use std::collections::VecDeque;

use super::{Phase, Progress};

pub struct StatusPanel {
    pub phase: Phase,
    pub info: String,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            phase: Phase::Fetching,
            info: String::new(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let color = if self.phase == Phase::Complete {
            Color::Green
        } else {
            Color::Yellow
        };
        let style = Style::default().fg(color).add_modifier(Modifier::BOLD);

        let lines = vec![
            Line::from(Span::styled(format!(" {}", self.phase), style)),
            Line::from(Span::styled(
                format!(" {}", self.info),
                Style::default().fg(Color::Gray),
            )),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" porydex-db ")
            .border_style(Style::default().fg(Color::Red));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

#[derive(Default)]
pub struct ProgressPanel {
    pub current: Option<Progress>,
}

impl ProgressPanel {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::Red));

        let Some(progress) = &self.current else {
            frame.render_widget(Block::default().borders(Borders::NONE), area);
            return;
        };

        let label = if progress.total > 0 {
            format!("{} {}/{}", progress.label, progress.current, progress.total)
        } else {
            progress.label.clone()
        };

        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(Color::Yellow).bg(Color::Black))
            .ratio(progress.ratio())
            .label(label);

        frame.render_widget(gauge, area);
    }
}

/// Bounded history of log lines; the newest line is highlighted
pub struct ActivityPanel {
    entries: VecDeque<String>,
    capacity: usize,
}

impl ActivityPanel {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message.into());
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(Style::default().fg(Color::Red));

        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.entries.len().saturating_sub(visible);
        let last = self.entries.len().saturating_sub(1);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, entry)| {
                let fg = if i == last { Color::White } else { Color::DarkGray };
                ListItem::new(Span::styled(format!(" {}", entry), Style::default().fg(fg)))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}
