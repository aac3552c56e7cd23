use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Layout shared by formatting and parsing: `YYYY-MM-DD HH:MM:SS`
pub const LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset used when the configured zone name cannot be resolved (UTC+8)
pub const FALLBACK_OFFSET_SECS: i32 = 8 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

/// Renders and reads publish timestamps in one resolved zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeNormalizer {
    zone: Zone,
}

impl TimeNormalizer {
    /// Resolve an IANA zone name, falling back to a fixed +08:00 offset.
    pub fn new(name: &str) -> Self {
        match name.parse::<Tz>() {
            Ok(tz) => Self {
                zone: Zone::Named(tz),
            },
            Err(e) => {
                warn!(
                    "Unknown timezone '{}' ({}), falling back to UTC+8",
                    name, e
                );
                Self::fallback()
            }
        }
    }

    pub fn fallback() -> Self {
        let offset = FixedOffset::east_opt(FALLBACK_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
        Self {
            zone: Zone::Fixed(offset),
        }
    }

    #[cfg(test)]
    fn is_fallback(&self) -> bool {
        matches!(self.zone, Zone::Fixed(_))
    }

    pub fn format(&self, instant: DateTime<Utc>) -> String {
        match self.zone {
            Zone::Named(tz) => instant.with_timezone(&tz).format(LAYOUT).to_string(),
            Zone::Fixed(offset) => instant.with_timezone(&offset).format(LAYOUT).to_string(),
        }
    }

    pub fn now(&self) -> String {
        self.format(Utc::now())
    }

    /// Read a local timestamp back into an instant.
    ///
    /// Returns `None` when the text does not match [`LAYOUT`] or names a local
    /// time that does not exist in the zone. Ambiguous local times (DST
    /// fall-back) resolve to the earlier instant.
    pub fn parse(&self, text: &str) -> Option<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(text, LAYOUT).ok()?;
        match self.zone {
            Zone::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            Zone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self::new("Asia/Shanghai")
    }
}
