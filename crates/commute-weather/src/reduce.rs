use crate::types::{condition_glyph, ForecastDay, ForecastPeriod};

/// Days in the summary
pub const FORECAST_DAYS: usize = 5;

/// Periods considered; two per day
const MAX_PERIODS: usize = FORECAST_DAYS * 2;

/// Estimated spread between high and low when a night period is missing
const MISSING_LOW_OFFSET: i32 = 10;

/// Pair consecutive periods (day, night) into at most five days.
///
/// The first period of each pair supplies the date, high and condition; the
/// second supplies the low. A pair without a second period estimates the
/// low as ten degrees below the high.
pub fn reduce_periods(periods: &[ForecastPeriod]) -> Vec<ForecastDay> {
    let considered = &periods[..periods.len().min(MAX_PERIODS)];

    considered
        .chunks(2)
        .map(|pair| {
            let day = &pair[0];
            let low_temp = pair
                .get(1)
                .map(|night| night.temperature)
                .unwrap_or(day.temperature - MISSING_LOW_OFFSET);

            ForecastDay {
                date: day.start_time.format("%b %-d").to_string(),
                weekday_label: day.start_time.format("%a").to_string(),
                high_temp: day.temperature,
                low_temp,
                condition_text: day.short_forecast.clone(),
                icon_glyph: condition_glyph(&day.short_forecast).to_string(),
            }
        })
        .take(FORECAST_DAYS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn periods(count: usize) -> Vec<ForecastPeriod> {
        let start = DateTime::parse_from_rfc3339("2024-10-21T06:00:00-07:00").unwrap();
        (0..count)
            .map(|i| {
                let is_day = i % 2 == 0;
                ForecastPeriod {
                    name: None,
                    start_time: start + Duration::hours(12 * i as i64),
                    is_daytime: Some(is_day),
                    temperature: if is_day { 70 + i as i32 } else { 50 + i as i32 },
                    temperature_unit: Some("F".to_string()),
                    short_forecast: if is_day { "Sunny" } else { "Clear" }.to_string(),
                }
            })
            .collect()
    }

    #[test]
    fn test_ten_periods_yield_five_days() {
        let days = reduce_periods(&periods(10));
        assert_eq!(days.len(), 5);
        assert_eq!(days[0].high_temp, 70);
        assert_eq!(days[0].low_temp, 51);
        assert_eq!(days[4].high_temp, 78);
        assert_eq!(days[4].low_temp, 59);
    }

    #[test]
    fn test_extra_periods_ignored() {
        assert_eq!(reduce_periods(&periods(14)).len(), 5);
    }

    #[test]
    fn test_three_periods_yield_two_days() {
        let days = reduce_periods(&periods(3));
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].low_temp, 51);
        // Night missing: low estimated from the high
        assert_eq!(days[1].high_temp, 72);
        assert_eq!(days[1].low_temp, 62);
    }

    #[test]
    fn test_no_periods() {
        assert!(reduce_periods(&[]).is_empty());
    }

    #[test]
    fn test_labels_use_period_offset() {
        let days = reduce_periods(&periods(4));
        // 2024-10-21 is a Monday
        assert_eq!(days[0].date, "Oct 21");
        assert_eq!(days[0].weekday_label, "Mon");
        assert_eq!(days[1].date, "Oct 22");
        assert_eq!(days[1].weekday_label, "Tue");
    }

    #[test]
    fn test_condition_and_glyph_from_day_period() {
        let days = reduce_periods(&periods(2));
        assert_eq!(days[0].condition_text, "Sunny");
        assert_eq!(days[0].icon_glyph, "☀️");
    }

    #[test]
    fn test_zero_degree_night_is_kept() {
        let mut input = periods(2);
        input[1].temperature = 0;
        let days = reduce_periods(&input);
        assert_eq!(days[0].low_temp, 0);
    }
}
