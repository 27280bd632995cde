use chrono::{Datelike, Local, Months, NaiveDate};

/// A calendar month, held as its first day.
///
/// Month arithmetic saturates at the bounds of `NaiveDate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(NaiveDate);

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self(date - chrono::Days::new(u64::from(date.day0())))
    }

    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    /// Parse `YYYY-MM` (a trailing `-DD` is tolerated and ignored).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let head = s.get(..7).unwrap_or(s);
        NaiveDate::parse_from_str(&format!("{head}-01"), "%Y-%m-%d")
            .ok()
            .map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.offset(1)
            .first_day()
            .pred_opt()
            .filter(|d| *d >= self.0)
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::containing(date) == *self
    }

    /// Shift by `delta` months (negative goes back in time).
    pub fn offset(&self, delta: i32) -> Self {
        self.checked_offset(delta).unwrap_or(*self)
    }

    /// Like [`Month::offset`], but `None` past the bounds of `NaiveDate`.
    pub fn checked_offset(&self, delta: i32) -> Option<Self> {
        let shifted = if delta >= 0 {
            self.0.checked_add_months(Months::new(delta.unsigned_abs()))
        } else {
            self.0.checked_sub_months(Months::new(delta.unsigned_abs()))
        };
        shifted.map(Self)
    }

    /// Number of whole months between the earliest representable month and
    /// this one.
    pub fn months_since_min(&self) -> usize {
        let min = Self::containing(NaiveDate::MIN);
        let years = i64::from(self.year()) - i64::from(min.year());
        let months = years * 12 + i64::from(self.month()) - i64::from(min.month());
        usize::try_from(months).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    pub fn prev(&self) -> Self {
        self.offset(-1)
    }

    /// Short chart label, e.g. `Jan 2024`.
    pub fn label(&self) -> String {
        self.0.format("%b %Y").to_string()
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}
