use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Config;
use crate::model::{CampaignInterval, CampaignStatus, ContextEvent};
use crate::projection::{MonthProjection, WeekProjection};

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    max_inline_badges: usize,
    cell_width: usize,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.display.color,
            max_inline_badges: cfg.display.max_inline_badges.max(1),
            cell_width: cfg.display.cell_width.max(6),
        }
    }

    pub fn plain(max_inline_badges: usize, cell_width: usize) -> Self {
        Self {
            color: false,
            max_inline_badges: max_inline_badges.max(1),
            cell_width: cell_width.max(6),
        }
    }

    #[tracing::instrument(skip_all)]
    pub fn print_month(&self, projection: &MonthProjection) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.write_month(out, projection)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_week(&self, projection: &WeekProjection) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.write_week(out, projection)
    }

    /// Six week rows of seven cells. Each cell lists campaigns, then events,
    /// up to the badge limit, then a `+N more` line.
    pub fn write_month<W: Write>(&self, mut out: W, projection: &MonthProjection) -> anyhow::Result<()> {
        writeln!(out, "{}", projection.month.format("%B %Y"))?;

        let headers = WEEKDAY_LABELS.iter().map(|label| label.to_string()).collect();
        let mut rows = Vec::new();

        for (week_idx, week) in projection.cells.chunks(7).enumerate() {
            if week_idx > 0 {
                rows.push(vec![String::new(); 7]);
            }

            let columns = week
                .iter()
                .map(|cell| {
                    let mut lines = vec![self.day_label(cell.date, cell.is_current_month, cell.is_today)];
                    lines.extend(self.badges(&cell.campaigns, &cell.events));
                    if let Some(weather) = &cell.weather {
                        lines.push(format!("~{:?}", weather.condition).to_ascii_lowercase());
                    }
                    lines
                })
                .collect::<Vec<_>>();

            let height = columns.iter().map(Vec::len).max().unwrap_or(1);
            for line in 0..height {
                rows.push(
                    columns
                        .iter()
                        .map(|lines| lines.get(line).cloned().unwrap_or_default())
                        .collect(),
                );
            }
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    /// Day header, one text line per lane, then the per-day event list.
    pub fn write_week<W: Write>(&self, mut out: W, projection: &WeekProjection) -> anyhow::Result<()> {
        let width = self.cell_width;

        let header = projection
            .week_days
            .iter()
            .map(|day| {
                let label = fit(&day.date.format("%a %d").to_string(), width - 1);
                let padded = pad(&label, width);
                if day.is_today { self.paint(&padded, "1;33") } else { padded }
            })
            .collect::<String>();
        writeln!(out, "{}", header.trim_end())?;
        writeln!(out, "{}", "-".repeat(width * projection.week_days.len()))?;

        for row in 0..projection.max_rows {
            let mut blocks = projection
                .blocks
                .iter()
                .filter(|block| block.assignment.row == row)
                .collect::<Vec<_>>();
            blocks.sort_by_key(|block| block.assignment.start_column);

            let mut line = String::new();
            let mut cursor = 0;
            for block in blocks {
                let start = block.assignment.start_column * width;
                let span = block.assignment.span() * width - 1;
                line.push_str(&" ".repeat(start.saturating_sub(cursor)));

                let open = if block.edges.continues_before { '<' } else { '[' };
                let close = if block.edges.continues_after { '>' } else { ']' };
                let inner = fit(block.campaign.id(), span.saturating_sub(2));
                let fill = "=".repeat(span.saturating_sub(2 + UnicodeWidthStr::width(inner.as_str())));
                let bar = format!("{open}{inner}{fill}{close}");
                line.push_str(&self.paint(&bar, status_color(block.campaign.status())));

                cursor = start + span;
            }
            writeln!(out, "{}", line.trim_end())?;
        }

        for day in &projection.week_days {
            if day.events.is_empty() {
                continue;
            }
            let names = day.events.iter().map(event_label).collect::<Vec<_>>().join(", ");
            writeln!(out, "{}: {}", day.date.format("%a %d"), names)?;
        }

        Ok(())
    }

    fn day_label(&self, date: NaiveDate, current_month: bool, today: bool) -> String {
        let label = if current_month {
            date.format("%e").to_string()
        } else {
            format!("({})", date.format("%-d"))
        };
        if today {
            self.paint(&format!("{label}*"), "1;33")
        } else {
            label
        }
    }

    fn badges(&self, campaigns: &[CampaignInterval], events: &[ContextEvent]) -> Vec<String> {
        let limit = self.max_inline_badges;
        let width = self.cell_width;
        let total = campaigns.len() + events.len();

        let mut lines = campaigns
            .iter()
            .map(|campaign| self.paint(&fit(campaign.id(), width), status_color(campaign.status())))
            .chain(events.iter().map(|event| fit(&format!("@{}", event_label(event)), width)))
            .take(limit)
            .collect::<Vec<_>>();

        if total > limit {
            lines.push(format!("+{} more", total - limit));
        }
        lines
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn status_color(status: CampaignStatus) -> &'static str {
    match status {
        CampaignStatus::Active => "32",
        CampaignStatus::Scheduled => "36",
        CampaignStatus::Completed => "90",
        CampaignStatus::Cancelled => "31",
    }
}

fn event_label(event: &ContextEvent) -> String {
    event.name().unwrap_or(event.id()).to_string()
}

/// Truncates to at most `width` display columns, marking the cut with `…`.
fn fit(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push('…');
    out
}

fn pad(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(visible)))
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        let mut line = String::new();
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            line.push_str(&format!("{}{} ", cell, " ".repeat(padding)));
        }
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
