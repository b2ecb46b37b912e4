use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

/// Batas selisih `end - start` untuk generate slot. Kedua tanggal inclusive,
/// jadi range terpanjang mencakup 91 tanggal kalender.
pub const MAX_GENERATION_DAYS: i64 = 90;

/// Batas panjang isi message chat
pub const MAX_MESSAGE_LENGTH: usize = 2000;

static WALL_CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}):(\d{2})(?::(\d{2}))?$").unwrap());

// Parse wall-clock string "HH:MM" atau "HH:MM:SS"
pub fn parse_wall_clock(value: &str) -> Option<NaiveTime> {
    let caps = WALL_CLOCK.captures(value.trim())?;

    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    let second: u32 = match caps.get(3) {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };

    NaiveTime::from_hms_opt(hour, minute, second)
}

// Day of week pakai convention 0=Monday ... 6=Sunday
pub fn is_valid_day_of_week(day: i16) -> bool {
    (0..=6).contains(&day)
}

// Validate window template: kedua jam valid dan start < end
pub fn is_valid_wall_clock_window(start: &str, end: &str) -> bool {
    match (parse_wall_clock(start), parse_wall_clock(end)) {
        (Some(s), Some(e)) => s < e,
        _ => false,
    }
}

// Validate date range untuk generate slot
pub fn validate_generation_range(start: NaiveDate, end: NaiveDate) -> Result<(), String> {
    if end < start {
        return Err("end_date must not be before start_date".to_string());
    }

    // Selisih tepat 90 hari masih diterima
    let span = (end - start).num_days();
    if span > MAX_GENERATION_DAYS {
        return Err(format!(
            "Date range too large: {} days (max {})",
            span, MAX_GENERATION_DAYS
        ));
    }

    Ok(())
}

// Validate isi message: tidak kosong dan tidak melebihi batas
pub fn is_valid_message_content(content: &str) -> bool {
    !content.trim().is_empty() && content.chars().count() <= MAX_MESSAGE_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_clock_formats() {
        assert_eq!(parse_wall_clock("09:00"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_wall_clock("09:30:15"), NaiveTime::from_hms_opt(9, 30, 15));
        assert_eq!(parse_wall_clock(" 23:59 "), NaiveTime::from_hms_opt(23, 59, 0));
        assert_eq!(parse_wall_clock("24:00"), None);
        assert_eq!(parse_wall_clock("9:00"), None);
        assert_eq!(parse_wall_clock("09:60"), None);
        assert_eq!(parse_wall_clock("nine"), None);
        assert_eq!(parse_wall_clock(""), None);
    }

    #[test]
    fn test_day_of_week() {
        assert!(is_valid_day_of_week(0));
        assert!(is_valid_day_of_week(6));
        assert!(!is_valid_day_of_week(7));
        assert!(!is_valid_day_of_week(-1));
    }

    #[test]
    fn test_wall_clock_window() {
        assert!(is_valid_wall_clock_window("09:00", "10:00"));
        assert!(!is_valid_wall_clock_window("10:00", "10:00"));
        assert!(!is_valid_wall_clock_window("11:00", "10:00"));
        assert!(!is_valid_wall_clock_window("xx", "10:00"));
    }

    #[test]
    fn test_generation_range() {
        let start = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        assert!(validate_generation_range(start, start).is_ok());
        assert!(validate_generation_range(start, start + chrono::Duration::days(90)).is_ok());
        assert!(validate_generation_range(start, start + chrono::Duration::days(91)).is_err());
        assert!(validate_generation_range(start, start - chrono::Duration::days(1)).is_err());
    }

    #[test]
    fn test_generation_range_boundary_is_ninety_one_calendar_dates() {
        let start = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        let last_allowed = NaiveDate::from_ymd_opt(2027, 1, 30).unwrap();

        // 1 Nov 2026 .. 30 Jan 2027 inclusive = 91 tanggal
        assert_eq!(start.iter_days().take_while(|d| *d <= last_allowed).count(), 91);
        assert!(validate_generation_range(start, last_allowed).is_ok());
        assert!(validate_generation_range(start, last_allowed.succ_opt().unwrap()).is_err());
    }

    #[test]
    fn test_message_content() {
        assert!(is_valid_message_content("halo"));
        assert!(!is_valid_message_content("   "));
        assert!(!is_valid_message_content(&"a".repeat(MAX_MESSAGE_LENGTH + 1)));
        assert!(is_valid_message_content(&"a".repeat(MAX_MESSAGE_LENGTH)));
    }
}
