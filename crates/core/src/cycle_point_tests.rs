use super::*;

fn p(y: i32, mo: u32, d: u32, h: u32) -> CyclePoint {
    CyclePoint::new(Calendar::Gregorian, y, mo, d, h, 0, 0)
}

#[test]
fn parse_and_format_round_trip() {
    let point = CyclePoint::parse("2020-01-01T00:00:00Z", Calendar::Gregorian).unwrap();
    assert_eq!(point.format(), "2020-01-01T00:00:00Z");
}

#[test]
fn parse_rejects_malformed_input() {
    assert!(CyclePoint::parse("not-a-point", Calendar::Gregorian).is_err());
}

#[test]
fn ordering_is_chronological() {
    let a = p(2020, 1, 1, 0);
    let b = p(2020, 1, 1, 1);
    assert!(a < b);
    assert_eq!(a, p(2020, 1, 1, 0));
}

#[test]
fn add_offset_hour_carries_into_next_day() {
    let point = p(2020, 1, 1, 23);
    let next = point.add_offset(&CycleOffset::hours(1));
    assert_eq!(next, p(2020, 1, 2, 0));
}

#[test]
fn add_offset_month_carries_into_next_year() {
    let point = p(2020, 12, 15, 0);
    let offset = CycleOffset::parse("P1M").unwrap();
    let next = point.add_offset(&offset);
    assert_eq!(next, p(2021, 1, 15, 0));
}

#[test]
fn add_offset_clamps_day_to_shorter_month() {
    // Jan 31 + 1 month -> Feb has no 31st, clamp to the 29th (2020 is a leap year).
    let point = p(2020, 1, 31, 0);
    let offset = CycleOffset::parse("P1M").unwrap();
    let next = point.add_offset(&offset);
    assert_eq!(next, p(2020, 2, 29, 0));
}

#[test]
fn days_360_calendar_has_30_day_months() {
    let point = CyclePoint::new(Calendar::Days360, 2020, 1, 30, 0, 0, 0);
    let next = point.add_offset(&CycleOffset::parse("P1D").unwrap());
    assert_eq!(next, CyclePoint::new(Calendar::Days360, 2020, 2, 1, 0, 0, 0));
}

#[test]
fn negative_offset_parses_and_subtracts() {
    let offset = CycleOffset::parse("-PT1H").unwrap();
    assert_eq!(offset.hours, -1);
    let point = p(2020, 1, 1, 1);
    assert_eq!(point.add_offset(&offset), p(2020, 1, 1, 0));
}

#[test]
fn display_round_trips_through_parse() {
    let offset = CycleOffset::parse("P1DT2H30M").unwrap();
    assert_eq!(offset.to_string(), "P1DT2H30M");
}
