use thiserror::Error;

/// Raw fields of one `swallows` line, exactly as they appear in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergerTokens {
    pub time: String,
    pub primary_id: String,
    pub secondary_id: String,
    pub primary_mass: String,
    pub secondary_mass: String,
}

/// One black-hole swallow event. `secondary_id` is the hole being absorbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergerEvent {
    pub time: f64, // scale factor, (0, 1]
    pub primary_id: i64,
    pub secondary_id: i64,
    pub primary_mass: f64,
    pub secondary_mass: f64,
}

impl MergerEvent {
    #[inline]
    pub fn redshift(&self) -> f64 {
        1.0 / self.time - 1.0
    }
    /// Ghost placeholders carry a non-positive mass on either side.
    #[inline]
    pub fn is_physical(&self) -> bool {
        self.primary_mass > 0.0 && self.secondary_mass > 0.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LineError {
    #[error("no {0} field")]
    MissingField(&'static str),
    #[error("empty {0} field")]
    EmptyValue(&'static str),
    #[error("mass group is not closed by ')'")]
    UnterminatedGroup,
    #[error("{field} {value:?} is not a valid number")]
    BadNumber { field: &'static str, value: String },
    #[error("scale factor {0} outside (0, 1]")]
    TimeOutOfRange(f64),
}

fn number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, LineError> {
    value.parse().map_err(|_| LineError::BadNumber {
        field,
        value: value.to_string(),
    })
}

fn particle_id(field: &'static str, value: &str) -> Result<i64, LineError> {
    let id: i64 = number(field, value)?;
    if id < 0 {
        return Err(LineError::BadNumber {
            field,
            value: value.to_string(),
        });
    }
    Ok(id)
}

impl TryFrom<&MergerTokens> for MergerEvent {
    type Error = LineError;

    fn try_from(tokens: &MergerTokens) -> Result<Self, Self::Error> {
        let time: f64 = number("time", &tokens.time)?;
        if !(time > 0.0 && time <= 1.0) {
            return Err(LineError::TimeOutOfRange(time));
        }
        Ok(MergerEvent {
            time,
            primary_id: particle_id("primary id", &tokens.primary_id)?,
            secondary_id: particle_id("secondary id", &tokens.secondary_id)?,
            primary_mass: number("primary mass", &tokens.primary_mass)?,
            secondary_mass: number("secondary mass", &tokens.secondary_mass)?,
        })
    }
}

/// Log order is shard order, not time order.
pub fn sort_by_time(events: &mut [MergerEvent]) {
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(time: &str, id1: &str, id2: &str, m1: &str, m2: &str) -> MergerTokens {
        MergerTokens {
            time: time.into(),
            primary_id: id1.into(),
            secondary_id: id2.into(),
            primary_mass: m1.into(),
            secondary_mass: m2.into(),
        }
    }

    #[test]
    fn converts_valid_tokens() {
        let ev = MergerEvent::try_from(&tokens("0.18", "100", "200", "5.0", "3e-1")).unwrap();
        assert_eq!(ev.primary_id, 100);
        assert_eq!(ev.secondary_id, 200);
        assert_eq!(ev.secondary_mass, 0.3);
        assert!((ev.redshift() - 4.555_555).abs() < 1e-5);
    }

    #[test]
    fn rejects_scale_factor_outside_unit_interval() {
        for t in ["0", "-0.5", "1.2", "NaN"] {
            let err = MergerEvent::try_from(&tokens(t, "1", "2", "1", "1")).unwrap_err();
            assert!(matches!(err, LineError::TimeOutOfRange(_)), "{t}: {err}");
        }
        assert!(MergerEvent::try_from(&tokens("1.0", "1", "2", "1", "1")).is_ok());
    }

    #[test]
    fn rejects_negative_and_garbage_ids() {
        let err = MergerEvent::try_from(&tokens("0.5", "-4", "2", "1", "1")).unwrap_err();
        assert_eq!(
            err,
            LineError::BadNumber {
                field: "primary id",
                value: "-4".into()
            }
        );
        assert!(MergerEvent::try_from(&tokens("0.5", "4", "x2", "1", "1")).is_err());
    }

    #[test]
    fn ghost_events_are_not_physical() {
        let ev = MergerEvent::try_from(&tokens("0.5", "1", "2", "1.0", "0")).unwrap();
        assert!(!ev.is_physical());
    }

    #[test]
    fn sorts_by_scale_factor() {
        let mut evs: Vec<MergerEvent> = ["0.3", "0.1", "0.2"]
            .iter()
            .map(|t| MergerEvent::try_from(&tokens(t, "1", "2", "1", "1")).unwrap())
            .collect();
        sort_by_time(&mut evs);
        let times: Vec<f64> = evs.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0.1, 0.2, 0.3]);
    }
}
