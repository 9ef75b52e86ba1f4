//! The template-variable clock.
//!
//! Query filters inside view definitions may reference wall clock-derived
//! values through `{{token}}` placeholders, e.g. `due: "{{today}}"`. Tokens
//! are resolved once, at parse time, so a parsed [`crate::ViewDefinition`]
//! always carries concrete timestamps.

use std::collections::BTreeMap;

use serde_yaml::Value as YamlValue;
use time::{
    format_description::{well_known::Rfc3339, FormatItem},
    macros::{format_description, time},
    Date, Duration, OffsetDateTime, Time,
};

use crate::Error;

/// The format used for date-only values (`2022-01-02`).
pub(crate) const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

const DAY_END: Time = time!(23:59:59.999);

/// Resolved values for every supported template variable.
///
/// `today` resolves to a bare date; every other token resolves to an RFC 3339
/// timestamp. Weeks start on Monday.
#[derive(Debug, Clone)]
pub struct TemplateVars(BTreeMap<&'static str, String>);

impl TemplateVars {
    /// Compute all template variables from the current UTC wall-clock time.
    pub fn now() -> Self {
        Self::at(OffsetDateTime::now_utc())
    }

    /// Compute all template variables from the given instant.
    pub fn at(now: OffsetDateTime) -> Self {
        let date = now.date();
        let week_start = date - Duration::days(date.weekday().number_days_from_monday() as i64);
        let month_start = date.replace_day(1).unwrap_or(date);
        let month_end = date
            .replace_day(time::util::days_in_year_month(date.year(), date.month()))
            .unwrap_or(date);

        let mut vars = BTreeMap::new();
        vars.insert("today", format_date(date));
        vars.insert("todayStart", start_of(date));
        vars.insert("todayEnd", end_of(date));
        vars.insert("startOfWeek", start_of(week_start));
        vars.insert("endOfWeek", end_of(week_start + Duration::days(6)));
        vars.insert("startOfMonth", start_of(month_start));
        vars.insert("endOfMonth", end_of(month_end));
        vars.insert("now", format_rfc3339(now));
        Self(vars)
    }

    /// Get the resolved value for the given token identifier, if it is one of
    /// the supported tokens.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(AsRef::as_ref)
    }

    /// Recursively substitute template variables through the strings,
    /// sequences and mappings of a YAML value.
    ///
    /// Tokens whose identifier is not recognized are left verbatim.
    pub fn substitute(&self, value: YamlValue) -> YamlValue {
        match value {
            YamlValue::String(s) => YamlValue::String(self.substitute_str(&s)),
            YamlValue::Sequence(seq) => {
                YamlValue::Sequence(seq.into_iter().map(|v| self.substitute(v)).collect())
            }
            YamlValue::Mapping(m) => YamlValue::Mapping(
                m.into_iter().map(|(k, v)| (k, self.substitute(v))).collect(),
            ),
            other => other,
        }
    }

    fn substitute_str(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut rest = s;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    match self.get(after[..end].trim()) {
                        Some(value) => out.push_str(value),
                        // Unknown tokens stay as literal text.
                        None => out.push_str(&rest[start..start + end + 4]),
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    // No closing braces; nothing left to substitute.
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Parse either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date, the two
/// forms Codex stores in frontmatter properties. Bare dates are taken as
/// midnight UTC.
pub(crate) fn parse_timestamp(s: &str) -> Result<OffsetDateTime, Error> {
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(dt);
    }
    Date::parse(s, DATE_FORMAT)
        .map(|d| d.midnight().assume_utc())
        .map_err(|_| Error::InvalidDate(s.to_string()))
}

fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}

fn start_of(date: Date) -> String {
    format_rfc3339(date.midnight().assume_utc())
}

fn end_of(date: Date) -> String {
    format_rfc3339(date.with_time(DAY_END).assume_utc())
}

// RFC 3339 formatting of a UTC timestamp cannot fail.
fn format_rfc3339(dt: OffsetDateTime) -> String {
    dt.format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;
    use time::macros::datetime;

    fn vars() -> TemplateVars {
        // A Wednesday.
        TemplateVars::at(datetime!(2022-06-15 14:30:00 UTC))
    }

    #[test]
    fn today_is_a_parseable_date() {
        let vars = TemplateVars::now();
        let today = vars.get("today").unwrap();
        Date::parse(today, DATE_FORMAT).unwrap();
    }

    #[test]
    fn now_is_a_parseable_timestamp() {
        let vars = TemplateVars::now();
        parse_timestamp(vars.get("now").unwrap()).unwrap();
    }

    #[test]
    fn week_starts_on_monday() {
        let vars = vars();
        assert_eq!(vars.get("startOfWeek").unwrap(), "2022-06-13T00:00:00Z");
        assert_eq!(vars.get("endOfWeek").unwrap(), "2022-06-19T23:59:59.999Z");
    }

    #[test]
    fn month_bounds() {
        let vars = vars();
        assert_eq!(vars.get("startOfMonth").unwrap(), "2022-06-01T00:00:00Z");
        assert_eq!(vars.get("endOfMonth").unwrap(), "2022-06-30T23:59:59.999Z");
    }

    #[test]
    fn substitution_walks_nested_values() {
        let vars = vars();
        let value: YamlValue = serde_yaml::from_str(
            r#"
            due: "{{today}}"
            range:
              - "{{startOfWeek}}"
              - "{{endOfWeek}}"
            "#,
        )
        .unwrap();
        let substituted = vars.substitute(value);
        assert_eq!(substituted["due"], YamlValue::String("2022-06-15".to_string()));
        assert_eq!(
            substituted["range"][0],
            YamlValue::String("2022-06-13T00:00:00Z".to_string())
        );
    }

    #[test]
    fn unknown_tokens_are_left_verbatim() {
        let vars = vars();
        assert_eq!(vars.substitute_str("{{nonsense}}"), "{{nonsense}}");
        assert_eq!(vars.substitute_str("due {{today}} {{wat}}"), "due 2022-06-15 {{wat}}");
        assert_eq!(vars.substitute_str("{{unterminated"), "{{unterminated");
    }
}
