use anyhow::{Result, anyhow, bail, ensure};
use logos::{Lexer, Logos};
use std::{
    fmt,
    ops::{Add, AddAssign},
    str::FromStr,
    time::Duration,
};

/// Logical simulation time
///
/// This is the offset since the beginning of the run, as advanced by the
/// host simulator. Nothing in this crate reads the wall clock: every
/// operation that depends on time is handed the current [`SimTime`].
///
/// ```
/// # use resman_core::SimTime;
/// # use std::time::Duration;
/// let t = SimTime::from_secs(500) + Duration::from_millis(250);
/// assert_eq!(t.to_string(), "500.25");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimTime(Duration);

impl SimTime {
    pub const ZERO: Self = Self(Duration::ZERO);

    pub const fn new(since_start: Duration) -> Self {
        Self(since_start)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0.as_secs_f64()
    }

    /// time elapsed since `earlier`, `0` if `earlier` is in the future
    #[inline]
    pub fn saturating_since(self, earlier: Self) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for SimTime {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<Duration> for SimTime {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs;
    }
}

impl From<Duration> for SimTime {
    fn from(since_start: Duration) -> Self {
        Self(since_start)
    }
}

/// Formats as fractional seconds (`500`, `0.5`), the unit message
/// identifiers are stamped with.
impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_secs_f64(), f)
    }
}

impl FromStr for SimTime {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(Self)
    }
}

/// Parse a human readable duration.
///
/// A sequence of `<number><unit>` pairs is summed (`1m 30s`). A single
/// number without unit is read as seconds, which is how the simulator's
/// settings files express intervals.
///
/// ```
/// # use resman_core::time::parse_duration;
/// # use std::time::Duration;
/// assert_eq!(parse_duration("500").unwrap(), Duration::from_secs(500));
/// assert_eq!(parse_duration("1m 30s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let mut lex = Lexer::new(s);

    let mut total = Duration::ZERO;
    let mut pairs = 0usize;

    while let Some(next) = lex.next() {
        let number: Token = next.map_err(|()| anyhow!("Failed to parse: {s}"))?;

        ensure!(
            number == Token::Value,
            "Expecting duration to starts with number. Cannot parse {s}"
        );
        let number: f64 = lex.slice().parse()?;

        let secs = match lex.next() {
            None if pairs == 0 => number,
            None => bail!("Expecting a measure, failed to parse: {s}"),
            Some(Err(())) => bail!("Failed to parse: {s}"),
            Some(Ok(measure)) => match measure {
                Token::NanoSeconds => number / 1_000_000_000.0,
                Token::MicroSeconds => number / 1_000_000.0,
                Token::MilliSeconds => number / 1_000.0,
                Token::Seconds => number,
                Token::Minutes => number * 60.0,
                Token::Hours => number * 3_600.0,
                Token::Value => bail!("Failed to parse `{s}', expecting a measure."),
            },
        };
        total += Duration::try_from_secs_f64(secs)?;
        pairs += 1;
    }

    ensure!(pairs > 0, "Empty duration");
    Ok(total)
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")] // Ignore this regex pattern between tokens
enum Token {
    #[token("ns")]
    NanoSeconds,
    #[regex("us|μs")]
    MicroSeconds,
    #[token("ms")]
    MilliSeconds,
    #[token("s")]
    Seconds,
    #[token("m")]
    Minutes,
    #[token("h")]
    Hours,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Value,
}
