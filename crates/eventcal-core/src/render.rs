use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::error::DisplayMessage;
use crate::legend::LegendData;
use crate::session::{RenderOutcome, RenderedCalendar};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip_all)]
    pub fn print_outcome(&mut self, outcome: &RenderOutcome) -> anyhow::Result<()> {
        match outcome {
            RenderOutcome::Message(message) => self.print_message(*message),
            RenderOutcome::Calendar(calendar) => self.print_calendar(calendar),
        }
    }

    pub fn print_json(&mut self, outcome: &RenderOutcome) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, outcome)?;
        writeln!(out)?;
        Ok(())
    }

    pub fn print_message(&mut self, message: DisplayMessage) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", self.paint(message.text(), "31"))?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(events = calendar.events.len()))]
    pub fn print_calendar(&mut self, calendar: &RenderedCalendar) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(
            out,
            "view  {}    date  {}",
            calendar.view.selected_view.as_key(),
            calendar.view.selected_date
        )?;
        if let Some(legend) = &calendar.legend {
            writeln!(out, "{}", self.legend_line(legend))?;
        }
        writeln!(out)?;

        if calendar.events.is_empty() {
            writeln!(out, "{}", calendar.config.strings.no_events_message)?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Start".to_string(),
            "End".to_string(),
            "Event".to_string(),
            "Group".to_string(),
            "Color".to_string(),
        ];

        let mut rows = Vec::with_capacity(calendar.events.len());
        for event in &calendar.events {
            let start = event
                .start
                .map(|dt| dt.format(DATE_FORMAT).to_string())
                .unwrap_or_else(|| "-".to_string());
            let end = event
                .end
                .map(|dt| dt.format(DATE_FORMAT).to_string())
                .unwrap_or_default();

            rows.push(vec![
                self.paint(&event.id.to_string(), "33"),
                start,
                end,
                event.title.clone(),
                event.group.clone(),
                event.color.clone(),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn legend_line(&self, legend: &LegendData) -> String {
        let keys = legend
            .entries
            .iter()
            .map(|entry| format!("{} {}", self.paint("■", "36"), entry.key_name))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}: {}", legend.title, keys)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
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

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
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

#[cfg(test)]
mod tests {
    use super::{strip_ansi, write_table};

    #[test]
    fn pads_by_display_width() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["ID".to_string(), "Event".to_string()],
            vec![
                vec!["\x1b[33m0\x1b[0m".to_string(), "Réunion".to_string()],
                vec!["1".to_string(), "会議".to_string()],
            ],
        )
        .expect("table");

        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID Event   ");
        assert_eq!(lines[1], "-- ------- ");
        assert_eq!(strip_ansi(lines[2]), "0  Réunion ");
        assert_eq!(lines[3], "1  会議    ");
    }
}
