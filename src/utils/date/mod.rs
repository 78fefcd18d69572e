// Date utility functions
// Maps wall-clock time onto the schedule grid.

use chrono::{DateTime, Datelike, Offset, TimeZone, Timelike};

use crate::models::schedule::{Day, TimeSlot};

/// Day and hour slot containing `now`. The slot may fall outside the
/// displayed rows (e.g. 20:00); check [`TimeSlot::is_displayed`].
pub fn current_position<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<(Day, TimeSlot)> {
    let day = Day::from_weekday(now.weekday());
    TimeSlot::new(now.hour() as u8).map(|slot| (day, slot))
}

/// Clock text such as `14:05:09 (UTC+10:00)`.
pub fn clock_label<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    let offset_secs = now.offset().fix().local_minus_utc();
    let sign = if offset_secs < 0 { '-' } else { '+' };
    let minutes = offset_secs.unsigned_abs() / 60;

    format!(
        "{:02}:{:02}:{:02} (UTC{}{:02}:{:02})",
        now.hour(),
        now.minute(),
        now.second(),
        sign,
        minutes / 60,
        minutes % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use test_case::test_case;

    fn at(
        offset_hours: i32,
        y: i32,
        m: u32,
        d: u32,
        h: u32,
        min: u32,
        s: u32,
    ) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, s)
            .unwrap()
    }

    #[test]
    fn test_current_position_inside_grid() {
        // 2024-03-04 was a Monday.
        let now = at(0, 2024, 3, 4, 10, 30, 0);
        let (day, slot) = current_position(&now).unwrap();
        assert_eq!(day, Day::Monday);
        assert_eq!(slot.label(), "10:00");
        assert!(slot.is_displayed());
    }

    #[test]
    fn test_current_position_outside_displayed_hours() {
        let now = at(0, 2024, 3, 10, 21, 0, 0);
        let (day, slot) = current_position(&now).unwrap();
        assert_eq!(day, Day::Sunday);
        assert!(!slot.is_displayed());
    }

    #[test_case(10, "14:05:09 (UTC+10:00)" ; "east of utc")]
    #[test_case(0, "14:05:09 (UTC+00:00)" ; "utc")]
    #[test_case(-5, "14:05:09 (UTC-05:00)" ; "west of utc")]
    fn test_clock_label(offset_hours: i32, expected: &str) {
        let now = at(offset_hours, 2024, 3, 4, 14, 5, 9);
        assert_eq!(clock_label(&now), expected);
    }
}
