use chrono::{DateTime, Datelike, Local, Months, NaiveDate, NaiveDateTime, TimeDelta};
use rand::{Rng, RngCore};
use serde_json::{Map, Value};

use crate::errors::GenerationError;
use crate::generators::{Generator, GeneratorRegistry};
use crate::params::{ParamKind, ParamSpec, int_range, validate_params};
use crate::value::{GeneratedValue, Temporal, strftime};

const SECONDS_PER_DAY: i64 = 86_400;
const MAX_TIME_DELTA_DAYS: i64 = 30;

const DATE_PARAMS: &[ParamSpec] = &[ParamSpec::new("pattern", ParamKind::String, "\"%Y-%m-%d\"")];
const TIME_PARAMS: &[ParamSpec] = &[ParamSpec::new("pattern", ParamKind::String, "\"%H:%M:%S\"")];
const DATE_OF_BIRTH_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("minimum_age", ParamKind::Int, "0"),
    ParamSpec::new("maximum_age", ParamKind::Int, "115"),
];

/// How a drawn moment is turned into a value.
#[derive(Clone, Copy)]
enum Shape {
    Pattern(&'static str),
    DateObject,
    TimeObject,
    DateTime,
    UnixTime,
}

struct MomentEntry {
    id: &'static str,
    doc: &'static str,
    shape: Shape,
}

const MOMENTS: &[MomentEntry] = &[
    MomentEntry {
        id: "date_object",
        doc: "Random date between 1970-01-01 and today.",
        shape: Shape::DateObject,
    },
    MomentEntry {
        id: "date_time",
        doc: "Random datetime between 1970-01-01 and now.",
        shape: Shape::DateTime,
    },
    MomentEntry {
        id: "time_object",
        doc: "Random time of day.",
        shape: Shape::TimeObject,
    },
    MomentEntry {
        id: "iso8601",
        doc: "Random datetime as an ISO 8601 string.",
        shape: Shape::Pattern("%Y-%m-%dT%H:%M:%S"),
    },
    MomentEntry {
        id: "unix_time",
        doc: "Random number of seconds since the Unix epoch.",
        shape: Shape::UnixTime,
    },
    MomentEntry {
        id: "year",
        doc: "Random year as a string.",
        shape: Shape::Pattern("%Y"),
    },
    MomentEntry {
        id: "month",
        doc: "Random two-digit month as a string.",
        shape: Shape::Pattern("%m"),
    },
    MomentEntry {
        id: "month_name",
        doc: "Random month name.",
        shape: Shape::Pattern("%B"),
    },
    MomentEntry {
        id: "day_of_month",
        doc: "Random two-digit day of month as a string.",
        shape: Shape::Pattern("%d"),
    },
    MomentEntry {
        id: "day_of_week",
        doc: "Random weekday name.",
        shape: Shape::Pattern("%A"),
    },
];

pub fn register(registry: &mut GeneratorRegistry) {
    for entry in MOMENTS {
        registry.register_generator(Box::new(MomentGenerator { entry }));
    }
    registry.register_generator(Box::new(PatternGenerator {
        id: "date",
        doc: "Random date formatted with `pattern`.",
        specs: DATE_PARAMS,
        default_pattern: "%Y-%m-%d",
    }));
    registry.register_generator(Box::new(PatternGenerator {
        id: "time",
        doc: "Random time formatted with `pattern`.",
        specs: TIME_PARAMS,
        default_pattern: "%H:%M:%S",
    }));
    registry.register_generator(Box::new(DateOfBirthGenerator));
    registry.register_generator(Box::new(TimeDeltaGenerator));
}

struct MomentGenerator {
    entry: &'static MomentEntry,
}

impl Generator for MomentGenerator {
    fn id(&self) -> &'static str {
        self.entry.id
    }

    fn module(&self) -> &'static str {
        "date_time"
    }

    fn doc(&self) -> &'static str {
        self.entry.doc
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        validate_params(args, &[], self.entry.id)?;
        let moment = random_moment(rng);
        let value = match self.entry.shape {
            Shape::Pattern(pattern) => {
                GeneratedValue::Text(strftime(Temporal::Timestamp(moment), pattern)?)
            }
            Shape::DateObject => GeneratedValue::Date(moment.date()),
            Shape::TimeObject => GeneratedValue::Time(moment.time()),
            Shape::DateTime => GeneratedValue::Timestamp(moment),
            Shape::UnixTime => GeneratedValue::Int(moment.and_utc().timestamp()),
        };
        Ok(value)
    }
}

struct PatternGenerator {
    id: &'static str,
    doc: &'static str,
    specs: &'static [ParamSpec],
    default_pattern: &'static str,
}

impl Generator for PatternGenerator {
    fn id(&self) -> &'static str {
        self.id
    }

    fn module(&self) -> &'static str {
        "date_time"
    }

    fn doc(&self) -> &'static str {
        self.doc
    }

    fn params(&self) -> &'static [ParamSpec] {
        self.specs
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, self.specs, self.id)?;
        let pattern = params.get_str("pattern").unwrap_or(self.default_pattern);
        let moment = random_moment(rng);
        Ok(GeneratedValue::Text(strftime(
            Temporal::Timestamp(moment),
            pattern,
        )?))
    }
}

struct DateOfBirthGenerator;

impl Generator for DateOfBirthGenerator {
    fn id(&self) -> &'static str {
        "date_of_birth"
    }

    fn module(&self) -> &'static str {
        "date_time"
    }

    fn doc(&self) -> &'static str {
        "Birth date of someone aged between `minimum_age` and `maximum_age`."
    }

    fn params(&self) -> &'static [ParamSpec] {
        DATE_OF_BIRTH_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, DATE_OF_BIRTH_PARAMS, "date_of_birth")?;
        let (minimum_age, maximum_age) = int_range(
            &params,
            "date_of_birth",
            ("minimum_age", "maximum_age"),
            (0, 115),
        )?;
        if minimum_age < 0 {
            return Err(GenerationError::InvalidArgument(
                "date_of_birth(): minimum_age must be >= 0".to_string(),
            ));
        }

        let today = Local::now().date_naive();
        let latest = years_before(today, minimum_age)?;
        // Someone aged `maximum_age` was born at most `maximum_age + 1` years ago.
        let earliest = years_before(today, maximum_age + 1)?
            .succ_opt()
            .unwrap_or(latest);
        let span = (latest - earliest).num_days().max(0);
        let offset = rng.random_range(0..=span);
        Ok(GeneratedValue::Date(earliest + TimeDelta::days(offset)))
    }
}

struct TimeDeltaGenerator;

impl Generator for TimeDeltaGenerator {
    fn id(&self) -> &'static str {
        "time_delta"
    }

    fn module(&self) -> &'static str {
        "date_time"
    }

    fn doc(&self) -> &'static str {
        "Random duration of up to thirty days."
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        validate_params(args, &[], "time_delta")?;
        let seconds = rng.random_range(0..=MAX_TIME_DELTA_DAYS * SECONDS_PER_DAY);
        Ok(GeneratedValue::Duration(TimeDelta::seconds(seconds)))
    }
}

/// Uniform moment between the Unix epoch and now, at second precision.
pub fn random_moment(rng: &mut dyn RngCore) -> NaiveDateTime {
    let now = Local::now().naive_local();
    let upper = now.and_utc().timestamp().max(0);
    let seconds = rng.random_range(0..=upper);
    DateTime::from_timestamp(seconds, 0)
        .map(|moment| moment.naive_utc())
        .unwrap_or_default()
}

fn years_before(date: NaiveDate, years: i64) -> Result<NaiveDate, GenerationError> {
    u32::try_from(years)
        .ok()
        .and_then(|years| years.checked_mul(12))
        .and_then(|months| date.checked_sub_months(Months::new(months)))
        .ok_or_else(|| {
            GenerationError::InvalidArgument(format!(
                "date_of_birth(): age {years} is out of range for {}",
                date.year()
            ))
        })
}
