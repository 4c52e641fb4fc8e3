use chrono::{DateTime, FixedOffset, Utc};
use invoker_agent::{ToolContext, ToolError, TypedTool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CurrentTimeArgs {
    /// `UTC` or a fixed offset such as `+05:30`. Defaults to the tool's zone.
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CurrentTimeOutput {
    pub timezone: String,
    /// RFC 3339 timestamp.
    pub datetime: String,
}

#[derive(Debug, Clone)]
pub struct CurrentTime {
    default_timezone: String,
}

impl Default for CurrentTime {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrentTime {
    pub fn new() -> Self {
        Self {
            default_timezone: "UTC".to_string(),
        }
    }

    pub fn with_default_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.default_timezone = timezone.into();
        self
    }

    pub fn at(&self, now: DateTime<Utc>, timezone: Option<&str>) -> Result<CurrentTimeOutput, ToolError> {
        let timezone = timezone
            .map(str::trim)
            .filter(|tz| !tz.is_empty())
            .unwrap_or(self.default_timezone.as_str());
        let offset = parse_timezone(timezone)?;
        Ok(CurrentTimeOutput {
            timezone: timezone.to_string(),
            datetime: now.with_timezone(&offset).to_rfc3339(),
        })
    }
}

impl TypedTool for CurrentTime {
    type Args = CurrentTimeArgs;
    type Output = CurrentTimeOutput;

    const NAME: &'static str = "current_time";
    const DESCRIPTION: &'static str =
        "Get the current date and time in ISO 8601 format for a timezone (UTC or a fixed offset).";

    async fn run(&self, args: Self::Args, _ctx: ToolContext) -> Result<Self::Output, ToolError> {
        self.at(Utc::now(), args.timezone.as_deref())
    }
}

/// Accepts `UTC`, `Z`, `GMT` and offsets written `+HH:MM`, `+HHMM` or `+HH`.
pub fn parse_timezone(timezone: &str) -> Result<FixedOffset, ToolError> {
    let invalid = || {
        ToolError::InvalidArgument(format!(
            "unsupported timezone '{timezone}': use UTC or an offset like +05:30"
        ))
    };

    let tz = timezone.trim();
    if ["utc", "z", "gmt"].contains(&tz.to_ascii_lowercase().as_str()) {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match tz.as_bytes().first() {
        Some(b'+') => (1, &tz[1..]),
        Some(b'-') => (-1, &tz[1..]),
        _ => return Err(invalid()),
    };

    let digits = match rest.find(':') {
        None => rest.to_string(),
        Some(2) if rest.len() == 5 => format!("{}{}", &rest[..2], &rest[3..]),
        Some(_) => return Err(invalid()),
    };
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = match digits.len() {
        2 => (&digits[..2], "00"),
        4 => (&digits[..2], &digits[2..]),
        _ => return Err(invalid()),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
