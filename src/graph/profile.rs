use crate::gtfs::models::GtfsCalendar;
use chrono::Weekday;
use std::str::FromStr;
use thiserror::Error;

/// The service slice a graph build looks at: one weekday plus the hour
/// window used for headway sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    pub weekday: Weekday,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for Profile {
    fn default() -> Self {
        // Morning commute window.
        Self {
            weekday: Weekday::Mon,
            start_hour: 7,
            end_hour: 8,
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseProfileError {
    #[error("expected weekday:HH-HH")]
    InvalidFormat,
    #[error("unknown weekday")]
    InvalidWeekday,
    #[error("invalid hour window")]
    InvalidHours,
}

impl FromStr for Profile {
    type Err = ParseProfileError;

    /// Parses the CLI form `monday:07-08`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (weekday, window) = s
            .split_once(':')
            .ok_or(ParseProfileError::InvalidFormat)?;
        let weekday: Weekday = weekday
            .trim()
            .parse()
            .map_err(|_| ParseProfileError::InvalidWeekday)?;
        let (start, end) = window
            .split_once('-')
            .ok_or(ParseProfileError::InvalidFormat)?;
        let start_hour: u32 = start
            .trim()
            .parse()
            .map_err(|_| ParseProfileError::InvalidHours)?;
        let end_hour: u32 = end
            .trim()
            .parse()
            .map_err(|_| ParseProfileError::InvalidHours)?;
        // The service-day clock runs past 24 for owl trips, so 48 is the cap.
        if start_hour >= end_hour || end_hour > 48 {
            return Err(ParseProfileError::InvalidHours);
        }
        Ok(Self {
            weekday,
            start_hour,
            end_hour,
        })
    }
}

impl Profile {
    pub fn weekday_name(&self) -> &'static str {
        match self.weekday {
            Weekday::Mon => "monday",
            Weekday::Tue => "tuesday",
            Weekday::Wed => "wednesday",
            Weekday::Thu => "thursday",
            Weekday::Fri => "friday",
            Weekday::Sat => "saturday",
            Weekday::Sun => "sunday",
        }
    }

    /// Metadata key of this profile, e.g. `monday_07_08`.
    pub fn key(&self) -> String {
        format!(
            "{}_{:02}_{:02}",
            self.weekday_name(),
            self.start_hour,
            self.end_hour
        )
    }

    /// Whether a calendar row has this profile's weekday flag set.
    pub fn service_runs(&self, calendar: &GtfsCalendar) -> bool {
        let flag = match self.weekday {
            Weekday::Mon => calendar.monday,
            Weekday::Tue => calendar.tuesday,
            Weekday::Wed => calendar.wednesday,
            Weekday::Thu => calendar.thursday,
            Weekday::Fri => calendar.friday,
            Weekday::Sat => calendar.saturday,
            Weekday::Sun => calendar.sunday,
        };
        flag == 1
    }

    /// Whether a second-of-day falls inside the headway window.
    pub fn window_contains(&self, seconds: u32) -> bool {
        (self.start_hour * 3600..self.end_hour * 3600).contains(&seconds)
    }
}

#[cfg(test)]
fn calendar(service_id: &str, monday: u8, saturday: u8) -> GtfsCalendar {
    GtfsCalendar {
        service_id: service_id.into(),
        monday,
        tuesday: 0,
        wednesday: 0,
        thursday: 0,
        friday: 0,
        saturday,
        sunday: 0,
    }
}

#[test]
fn parse_profile_test() {
    let profile: Profile = "monday:07-08".parse().unwrap();
    assert_eq!(profile, Profile::default());

    let profile: Profile = "saturday:10-12".parse().unwrap();
    assert_eq!(profile.weekday, Weekday::Sat);
    assert_eq!(profile.start_hour, 10);
    assert_eq!(profile.end_hour, 12);
}

#[test]
fn parse_profile_invalid_test() {
    assert!("monday".parse::<Profile>().is_err());
    assert!("noday:07-08".parse::<Profile>().is_err());
    assert!("monday:08-07".parse::<Profile>().is_err());
    assert!("monday:07-49".parse::<Profile>().is_err());
}

#[test]
fn profile_key_test() {
    assert_eq!(Profile::default().key(), "monday_07_08");
}

#[test]
fn service_runs_test() {
    let profile = Profile::default();
    assert!(profile.service_runs(&calendar("S1", 1, 0)));
    assert!(!profile.service_runs(&calendar("S2", 0, 1)));
}

#[test]
fn window_contains_test() {
    let profile = Profile::default();
    assert!(profile.window_contains(7 * 3600));
    assert!(profile.window_contains(8 * 3600 - 1));
    assert!(!profile.window_contains(8 * 3600));
    assert!(!profile.window_contains(6 * 3600));
}
