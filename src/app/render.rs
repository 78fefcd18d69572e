//! Plain-text rendering of a [`ScheduleView`] for the terminal shell.

use crate::models::schedule::Day;
use crate::services::notification::Notice;

use super::{CellView, ScheduleView};

const TIME_WIDTH: usize = 5;
const CELL_WIDTH: usize = 14;

/// Grid table followed by the status line. The current cell is marked
/// with `*`; in edit mode the header says so.
pub fn render_view(view: &ScheduleView) -> String {
    let mut out = String::new();

    out.push_str(&format!("{:<TIME_WIDTH$}", "Time"));
    for day in Day::ALL {
        out.push_str(&format!(" | {:<CELL_WIDTH$}", day.short_label()));
    }
    out.push('\n');
    out.push_str(&"-".repeat(TIME_WIDTH + Day::ALL.len() * (CELL_WIDTH + 3)));
    out.push('\n');

    for row in &view.rows {
        out.push_str(&format!("{:<TIME_WIDTH$}", row.time.label()));
        for cell in &row.cells {
            out.push_str(&format!(" | {:<CELL_WIDTH$}", cell_text(cell)));
        }
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&status_line(view));
    out.push('\n');

    if let Some(modal) = &view.modal {
        let activity = if modal.activity.is_empty() {
            "(blank)"
        } else {
            modal.activity.as_str()
        };
        out.push_str(&format!(
            "Editing {} {}: [{}] {}\n",
            modal.day, modal.time, modal.entry_type, activity
        ));
    }

    out
}

pub fn status_line(view: &ScheduleView) -> String {
    let mode = if view.is_edit_mode { "Editing" } else { "Viewing" };
    format!("{} | {} | {}", view.status_label(), mode, view.clock)
}

pub fn render_notice(notice: &Notice) -> String {
    format!("{} {}", notice.level.icon(), notice.message)
}

fn cell_text(cell: &CellView) -> String {
    let marker = if cell.is_current { "*" } else { "" };
    let budget = CELL_WIDTH - marker.len();

    let activity = &cell.cell.activity;
    let text = if activity.chars().count() > budget {
        let mut clipped: String = activity.chars().take(budget.saturating_sub(1)).collect();
        clipped.push('~');
        clipped
    } else {
        activity.clone()
    };

    format!("{}{}", marker, text)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::app::ScheduleApp;
    use crate::models::schedule::{EntryType, ScheduleGrid, TimeSlot};
    use crate::models::settings::AppConfig;
    use crate::services::storage::MemoryStorage;
    use crate::services::sync::channel::LocalOnlyChannel;

    fn app() -> ScheduleApp {
        let mut app = ScheduleApp::with_grid(
            &AppConfig::default(),
            ScheduleGrid::new(),
            Box::new(LocalOnlyChannel),
            Box::new(MemoryStorage::new()),
        );
        app.start();
        app
    }

    #[test]
    fn test_render_marks_current_cell_and_free_slots() {
        let mut app = app();
        app.enter_edit_mode();
        app.commit_entry(
            Day::Monday,
            TimeSlot::new(9).unwrap(),
            "Design review",
            EntryType::Meeting,
        );
        app.save();

        // 2024-03-04 was a Monday.
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
        let text = render_view(&app.view(&now));
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("Time  | Mon"));
        assert!(lines[2].starts_with("09:00 | *Design review"));
        assert!(lines[3].starts_with("10:00 | Free"));
        assert!(text.contains("Offline Mode | Viewing | 09:30:00 (UTC+00:00)"));
    }

    #[test]
    fn test_long_activity_is_clipped() {
        let mut app = app();
        app.enter_edit_mode();
        app.commit_entry(
            Day::Tuesday,
            TimeSlot::new(10).unwrap(),
            "An exceptionally long workshop title",
            EntryType::Learning,
        );

        let now = Utc.with_ymd_and_hms(2024, 3, 4, 20, 0, 0).unwrap();
        let text = render_view(&app.view(&now));
        assert!(text.contains("An exceptiona~"));
        assert!(text.contains("| Editing |"));
    }

    #[test]
    fn test_modal_is_described() {
        let mut app = app();
        app.enter_edit_mode();
        app.open_modal(Day::Sunday, TimeSlot::new(11).unwrap());

        let now = Utc.with_ymd_and_hms(2024, 3, 4, 20, 0, 0).unwrap();
        let text = render_view(&app.view(&now));
        assert!(text.contains("Editing sunday 11:00: [empty] (blank)"));
    }

    #[test]
    fn test_render_notice_uses_level_icon() {
        assert_eq!(render_notice(&Notice::success("Saved")), "✓ Saved");
    }
}
