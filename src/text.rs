//! Normalization and parsing of recognized scoreboard text.
//!
//! Recognized text arrives with predictable damage: the letter O read in
//! place of zero, the "4" of "4TH" dropped or smeared into "A"/"I" shapes,
//! and a clock that loses its separators once the display switches to
//! tenths under a minute. The functions here repair those shapes before
//! the pipeline validates anything.

/// Replaces the common zero misreads (letter O, either case) with the
/// digit zero. Applied to clock text before parsing.
pub fn normalize_clock(raw: &str) -> String {
    raw.trim().replace(['O', 'o'], "0")
}

/// Uppercases a quarter reading and repairs truncated "4TH" shapes.
///
/// "ATH" is a 4 whose diagonal was lost; a token starting "4TI" is a
/// smeared H. Everything else passes through uppercased, including
/// partial or unknown tokens, which later fall through the offset table.
pub fn normalize_quarter(raw: &str) -> String {
    let qtr = raw.trim().to_uppercase().replace("ATH", "4TH");
    if qtr.starts_with("4TI") {
        return "4TH".to_string();
    }
    qtr
}

/// Parses a normalized clock reading into seconds remaining in the quarter.
///
/// Formats, tried in order:
/// 1. `M:SS`: minutes and seconds split on the colon.
/// 2. A token containing `.`: directly a decimal number of seconds.
/// 3. Three digits: the sub-minute display with the dot lost, two digits
///    of seconds and one of tenths ("125" is 12.5s).
/// 4. Two digits: the same display closer to zero ("12" is 1.2s).
///
/// Anything else is unparsable and returns `None`.
pub fn parse_clock_seconds(clock: &str) -> Option<f64> {
    let clock = normalize_clock(clock);

    if let Some((mins, secs)) = clock.split_once(':') {
        let mins: f64 = mins.parse().ok()?;
        let secs: f64 = secs.parse().ok()?;
        return Some(mins * 60.0 + secs);
    }

    if clock.contains('.') {
        return clock.parse().ok();
    }

    if !clock.is_empty() && clock.chars().all(|c| c.is_ascii_digit()) {
        match clock.len() {
            3 => return format!("{}.{}", &clock[..2], &clock[2..]).parse().ok(),
            2 => return format!("{}.{}", &clock[..1], &clock[1..]).parse().ok(),
            _ => return None,
        }
    }

    None
}

/// A game period parsed from the quarter field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quarter {
    First,
    Second,
    Third,
    Fourth,
    Overtime,
    /// A reading the offset table does not know. Kept rather than rejected;
    /// it scores like the fourth quarter.
    Unknown,
}

impl Quarter {
    /// Maps a normalized quarter label to a period.
    pub fn from_label(label: &str) -> Self {
        match label {
            "1ST" => Quarter::First,
            "2ND" => Quarter::Second,
            "3RD" => Quarter::Third,
            "4TH" => Quarter::Fourth,
            "OT" => Quarter::Overtime,
            _ => Quarter::Unknown,
        }
    }

    /// Absolute game seconds remaining at the start of this period, under
    /// 12-minute quarters.
    ///
    /// Overtime has no defined offset in the coefficient data and scores
    /// like the fourth quarter with the clock near zero; callers log when
    /// they consume one so the approximation is visible.
    pub fn start_offset_seconds(self) -> f64 {
        match self {
            Quarter::First => 36.0 * 60.0,
            Quarter::Second => 24.0 * 60.0,
            Quarter::Third => 12.0 * 60.0,
            Quarter::Fourth => 0.0,
            Quarter::Overtime | Quarter::Unknown => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quarter::First => "1ST",
            Quarter::Second => "2ND",
            Quarter::Third => "3RD",
            Quarter::Fourth => "4TH",
            Quarter::Overtime => "OT",
            Quarter::Unknown => "?",
        }
    }
}

impl std::fmt::Display for Quarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
