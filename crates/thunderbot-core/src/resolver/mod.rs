//! Response resolution: maps a message body to the answer configured for it.
//!
//! Rules are scanned twice in declaration order: first for a whole-body
//! match against `exact_texts`, then for a substring match against
//! `contains_texts`. The first hit with a non-empty answer wins. When nothing
//! matches, the default answer applies (literal text, file contents, or a
//! time-of-day greeting).


use crate::settings::{DefaultAnswer, Rule, TimeOfDayAnswers};
use chrono::{NaiveDateTime, Timelike};
use std::borrow::Cow;
use std::path::Path;
use tracing::warn;

/// Period of the day used to pick a time-of-day answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Night,
    Dawn,
}

impl DayPeriod {
    /// Bucket an hour (0-23).
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=23 => Self::Night,
            _ => Self::Dawn,
        }
    }
}

impl TimeOfDayAnswers {
    /// The answer configured for `period`.
    pub fn for_period(&self, period: DayPeriod) -> &str {
        match period {
            DayPeriod::Morning => &self.morning,
            DayPeriod::Afternoon => &self.afternoon,
            DayPeriod::Night => &self.night,
            DayPeriod::Dawn => &self.dawn,
        }
    }
}

/// Resolve the response for a message body.
///
/// Returns `None` when the message should be ignored.
pub fn resolve(
    body: &str,
    rules: &[Rule],
    default_answer: &DefaultAnswer,
    now: NaiveDateTime,
) -> Option<String> {
    let body = Body::new(body);
    exact_match(&body, rules)
        .or_else(|| contains_match(&body, rules))
        .map(str::to_string)
        .or_else(|| default_response(default_answer, now))
        .filter(|response| !response.is_empty())
}

/// A message body with its case-folded form computed once.
struct Body<'a> {
    text: &'a str,
    folded: String,
}

impl<'a> Body<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            folded: text.to_lowercase(),
        }
    }

    fn as_case(&self, case_sensitive: bool) -> &str {
        if case_sensitive {
            self.text
        } else {
            &self.folded
        }
    }
}

/// First rule whose exact candidates include `body` and whose exact answer is set.
fn exact_match<'a>(body: &Body<'_>, rules: &'a [Rule]) -> Option<&'a str> {
    rules.iter().find_map(|rule| {
        let hit = candidates(&rule.exact_texts).any(|c| equals(body, c, rule.case_sensitive));
        answer_if(hit, &rule.answer_to_exact)
    })
}

/// First rule with a candidate contained in `body` and a contains answer set.
fn contains_match<'a>(body: &Body<'_>, rules: &'a [Rule]) -> Option<&'a str> {
    rules.iter().find_map(|rule| {
        let hit = candidates(&rule.contains_texts).any(|c| contains(body, c, rule.case_sensitive));
        answer_if(hit, &rule.answer_to_contains)
    })
}

/// Non-empty candidates, in declaration order.
fn candidates(texts: &[String]) -> impl Iterator<Item = &str> {
    texts.iter().map(String::as_str).filter(|c| !c.is_empty())
}

fn answer_if(hit: bool, answer: &str) -> Option<&str> {
    (hit && !answer.is_empty()).then_some(answer)
}

fn fold(text: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.to_lowercase())
    }
}

fn equals(body: &Body<'_>, candidate: &str, case_sensitive: bool) -> bool {
    body.as_case(case_sensitive) == fold(candidate, case_sensitive)
}

fn contains(body: &Body<'_>, candidate: &str, case_sensitive: bool) -> bool {
    body.as_case(case_sensitive)
        .contains(fold(candidate, case_sensitive).as_ref())
}

/// Fallback when no rule matched.
fn default_response(default_answer: &DefaultAnswer, now: NaiveDateTime) -> Option<String> {
    let text = default_answer.text.as_deref().filter(|t| !t.is_empty())?;

    if default_answer.by_time_of_day {
        let period = DayPeriod::from_hour(now.hour());
        return Some(default_answer.time_of_day.for_period(period).to_string());
    }

    // The answer may name a file whose contents are the reply.
    let path = Path::new(text);
    if path.is_file() {
        match std::fs::read_to_string(path) {
            Ok(content) => return Some(content),
            Err(e) => warn!("failed to read default answer file {}: {e}", path.display()),
        }
    }

    Some(text.to_string())
}
