//! Terminal rendering for fieldops types.
//!
//! Extension traits and helpers that color core types with owo_colors, plus
//! the character layout of the timeline grid.

use std::collections::BTreeSet;

use chrono_tz::Tz;
use fieldops_core::filter::CategoryCounts;
use fieldops_core::format;
use fieldops_core::timeline::{DayTimeline, TechnicianRow, TimelineBar, TimelineWindow};
use fieldops_core::validation::ValidationReport;
use fieldops_core::{Category, Event, EventStatus, StatusColor};
use fieldops_provider_espocrm::SourceFailure;
use owo_colors::OwoColorize;

pub const FAILURE_BANNER: &str = "Αποτυχία φόρτωσης ραντεβού. Παρακαλώ δοκιμάστε ξανά.";

/// Width of the technician name column in the timeline
const NAME_WIDTH: usize = 18;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

fn paint(text: &str, color: StatusColor) -> String {
    match color {
        StatusColor::Blue => text.blue().to_string(),
        StatusColor::Cyan => text.cyan().to_string(),
        StatusColor::Yellow => text.yellow().to_string(),
        StatusColor::Green => text.green().to_string(),
        StatusColor::Red => text.red().to_string(),
        StatusColor::Magenta => text.magenta().to_string(),
        StatusColor::Grey => text.bright_black().to_string(),
    }
}

fn category_color(category: Category) -> StatusColor {
    match category {
        Category::Autopsy => StatusColor::Magenta,
        Category::Construction => StatusColor::Blue,
        Category::Splicing => StatusColor::Cyan,
        Category::Earthwork => StatusColor::Yellow,
    }
}

impl Render for EventStatus {
    fn render(&self) -> String {
        paint(self.code(), self.color())
    }
}

impl Render for Category {
    fn render(&self) -> String {
        paint(&format!("[{}]", self.glyph()), category_color(*self))
    }
}

impl Render for CategoryCounts {
    fn render(&self) -> String {
        self.iter()
            .map(|(category, n)| format!("{} {} {}", category.render(), category.label(), n))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

impl Render for ValidationReport {
    fn render(&self) -> String {
        let Some(tab) = self.first_tab() else {
            return "ok".green().to_string();
        };
        let fields = self.missing_on(tab).join(", ");
        let mut line = format!("{} {}", tab.to_string().red(), fields);
        let others = self.missing.len() - self.missing_on(tab).len();
        if others > 0 {
            line.push_str(&format!(" (+{others} on other tabs)").dimmed().to_string());
        }
        line
    }
}

/// One event line: time range, category, title, status, address
pub fn event_line(event: &Event, tz: Tz) -> String {
    let mut line = format!(
        "{} {} {} {}",
        format::time_range(event.start, event.end, tz),
        event.category.render(),
        event.title,
        event.status.render()
    );
    if let Some(address) = &event.address {
        line.push_str(&format!(" {}", address.dimmed()));
    }
    line
}

/// Error banner for sources that failed to load, `None` when all succeeded
pub fn failure_banner(failures: &[SourceFailure]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }

    let entities: BTreeSet<&str> = failures.iter().map(|f| f.entity.as_str()).collect();
    let mut lines = vec![
        format!("{} {}", "!".red().bold(), FAILURE_BANNER.red()),
        format!(
            "  {}",
            entities.into_iter().collect::<Vec<_>>().join(", ").dimmed()
        ),
    ];
    if failures.iter().any(|f| f.unauthorized) {
        lines.push(format!(
            "  {}",
            "The server rejected the token. Check session.toml or FIELDOPS_TOKEN.".yellow()
        ));
    }

    Some(lines.join("\n"))
}

/// Hour labels aligned over a time axis of `width` columns
pub fn hour_ruler(window: TimelineWindow, width: usize) -> String {
    let hours = window.hours().max(1) as usize;
    let mut ruler = vec![' '; width];

    for step in 0..hours {
        let column = step * width / hours;
        let label = format!("{:02}", window.start_hour as usize + step);
        if column + label.len() > width {
            break;
        }
        for (offset, c) in label.chars().enumerate() {
            ruler[column + offset] = c;
        }
    }

    ruler.into_iter().collect()
}

/// Which bar covers each column of one lane. Later bars win a shared column.
pub fn layout_lane(
    timeline: &DayTimeline,
    bars: &[&TimelineBar],
    width: usize,
) -> Vec<Option<usize>> {
    let mut cells = vec![None; width];
    if width == 0 {
        return cells;
    }

    for (index, bar) in bars.iter().enumerate() {
        let from = (timeline.offset_fraction(bar.start) * width as f64).floor() as usize;
        let to = (timeline.offset_fraction(bar.end) * width as f64).ceil() as usize;
        let from = from.min(width - 1);
        let to = to.clamp(from + 1, width);
        for cell in &mut cells[from..to] {
            *cell = Some(index);
        }
    }

    cells
}

fn render_lane(timeline: &DayTimeline, bars: &[&TimelineBar], width: usize) -> String {
    layout_lane(timeline, bars, width)
        .into_iter()
        .map(|cell| match cell {
            Some(index) => {
                let event = bars[index].event;
                paint(&event.category.glyph().to_string(), event.status.color())
            }
            None => "·".bright_black().to_string(),
        })
        .collect()
}

fn name_column(name: &str) -> String {
    let count = name.chars().count();
    if count <= NAME_WIDTH {
        format!("{name:<NAME_WIDTH$}")
    } else {
        let truncated: String = name.chars().take(NAME_WIDTH - 1).collect();
        format!("{truncated}…")
    }
}

/// All lanes of one technician, one line per lane
pub fn technician_row(timeline: &DayTimeline, row: &TechnicianRow, width: usize) -> Vec<String> {
    (0..row.lane_count)
        .map(|lane| {
            let bars: Vec<&TimelineBar> = row.lane(lane).collect();
            let label = if lane == 0 {
                name_column(&row.technician).bold().to_string()
            } else {
                " ".repeat(NAME_WIDTH)
            };
            let overflow = if row.overflowed && lane + 1 == row.lane_count {
                " +".red().to_string()
            } else {
                String::new()
            };
            format!("{label} │{}│{overflow}", render_lane(timeline, &bars, width))
        })
        .collect()
}

/// The whole grid: ruler line plus every technician's lanes
pub fn timeline_grid(timeline: &DayTimeline, width: usize) -> String {
    let mut lines = vec![format!(
        "{} {}",
        " ".repeat(NAME_WIDTH + 1),
        hour_ruler(timeline.window, width).dimmed()
    )];
    for row in &timeline.rows {
        lines.extend(technician_row(timeline, row, width));
    }
    lines.join("\n")
}
