use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Seconds since midnight of the service day.
///
/// GTFS allows hours of 24 and above for trips that run past midnight, so a
/// `Time` is not bounded to one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time(u32);

impl From<u32> for Time {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Add<Duration> for Time {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0
    }
}

impl Time {
    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }

    /// Elapsed time from `earlier` to `self`, or `None` when `earlier` is
    /// actually later. Schedule data does contain such rows; callers treat
    /// them as corrupt and skip.
    pub const fn since(&self, earlier: Time) -> Option<Duration> {
        match self.0.checked_sub(earlier.0) {
            Some(secs) => Some(Duration(secs)),
            None => None,
        }
    }

    pub fn to_hms_string(&self) -> String {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        format!("{:02}:{:02}:{:02}", h, m, s)
    }

    /// Parses a `HH:MM:SS` string. Every field is parsed independently, so
    /// hour values of 24 and above are accepted.
    pub fn from_hms(time: &str) -> Option<Self> {
        const HOUR_TO_SEC: u32 = 60 * 60;
        const MINUTE_TO_SEC: u32 = 60;
        let mut split = time.trim().split(':');
        let hours: u32 = split.next()?.parse().ok()?;
        let minutes: u32 = split.next()?.parse().ok()?;
        let seconds: u32 = split.next()?.parse().ok()?;
        if split.next().is_some() {
            return None;
        }
        Some(Self(hours * HOUR_TO_SEC + minutes * MINUTE_TO_SEC + seconds))
    }
}

#[test]
fn parse_unparse_1() {
    let time = "00:00:00";
    let stime = Time::from_hms(time).unwrap();
    assert_eq!(time, stime.to_hms_string())
}

#[test]
fn parse_unparse_2() {
    let time = "12:30:30";
    let stime = Time::from_hms(time).unwrap();
    assert_eq!(time, stime.to_hms_string())
}

#[test]
fn valid_time_test_1() {
    let time = "00:01:30";
    assert_eq!(Time::from_hms(time).unwrap().as_seconds(), 90);
}

#[test]
fn valid_time_test_2() {
    let time = "07:00:00";
    assert_eq!(Time::from_hms(time).unwrap().as_seconds(), 25200);
}

#[test]
fn after_midnight_time_test() {
    // GTFS service-day clock keeps counting past 24h.
    let time = "25:10:00";
    assert_eq!(Time::from_hms(time).unwrap().as_seconds(), 90600);
}

#[test]
fn invalid_time_test_1() {
    let time = "00:00:0a";
    assert!(Time::from_hms(time).is_none())
}

#[test]
fn invalid_time_test_2() {
    let time = "00:00";
    assert!(Time::from_hms(time).is_none())
}

#[test]
fn invalid_time_test_3() {
    let time = "00:00:00:00";
    assert!(Time::from_hms(time).is_none())
}

#[test]
fn since_test() {
    let a = Time::from_seconds(100);
    let b = Time::from_seconds(160);
    assert_eq!(b.since(a), Some(Duration::from_seconds(60)));
    assert_eq!(a.since(b), None);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(u32);

impl From<u32> for Duration {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Duration {
    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes * 60)
    }

    pub const fn from_hours(hours: u32) -> Self {
        Self(hours * 60 * 60)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }

    pub fn as_minutes_f64(&self) -> f64 {
        f64::from(self.0) / 60.0
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}
