//! Expansion of recurring templates into dated sessions.
//!
//! `SessionDates` is the pure calendar part: a lazy, deterministic walk from
//! the anchor date to the end of the horizon. `SessionGenerator` persists the
//! result, reusing sessions that already exist for a date.

use crate::db::db_utils::{fmt_date, is_unique_violation};
use crate::db::log::audit;
use crate::db::pool::DbPool;
use crate::db::services::{find_instance, get_service, insert_service, load_service};
use crate::core::services::ensure_time_range;
use crate::errors::{AppError, AppResult};
use crate::models::recurrence::RecurrencePattern;
use crate::models::service::{InstanceOverrides, NewService, Service, ServiceKind};
use chrono::{Datelike, Days, Months, NaiveDate};

/// Dates produced by a template over a horizon of whole calendar months.
#[derive(Debug, Clone)]
pub struct SessionDates {
    anchor: NaiveDate,
    pattern: RecurrencePattern,
    months: u32,
    from: NaiveDate,
    end: Option<NaiveDate>,
    step: u32,
}

impl SessionDates {
    pub fn new(anchor: NaiveDate, pattern: RecurrencePattern, horizon_months: u32) -> Self {
        Self {
            anchor,
            pattern,
            months: horizon_months,
            from: anchor,
            end: horizon_end(anchor, horizon_months),
            step: 0,
        }
    }

    /// Skip the dates before `from`. The horizon then counts from the month
    /// of `from` instead of the anchor's. Steps are still taken from the
    /// anchor, so weekdays and days of month stay aligned with it.
    pub fn starting_at(self, from: NaiveDate) -> Self {
        if from <= self.anchor {
            return self;
        }
        Self {
            from,
            end: horizon_end(from, self.months),
            ..self
        }
    }
}

impl Iterator for SessionDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let end = self.end?;
        loop {
            let next = match self.pattern {
                RecurrencePattern::Weekly => self
                    .anchor
                    .checked_add_days(Days::new(7 * u64::from(self.step))),
                // chrono clamps to the last day of shorter months
                RecurrencePattern::Monthly => {
                    self.anchor.checked_add_months(Months::new(self.step))
                }
                RecurrencePattern::None => None,
            }?;

            if next > end {
                self.end = None;
                return None;
            }

            self.step += 1;
            if next >= self.from {
                return Some(next);
            }
        }
    }
}

/// Last day of the month `months - 1` months after the anchor's month.
/// A horizon of zero months covers nothing.
fn horizon_end(anchor: NaiveDate, months: u32) -> Option<NaiveDate> {
    if months == 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), 1)?
        .checked_add_months(Months::new(months))?
        .pred_opt()
}

/// Check that `template` can spawn sessions and return its pattern and anchor.
fn recurrence_of(
    template: &Service,
    today: NaiveDate,
) -> AppResult<(RecurrencePattern, NaiveDate)> {
    match &template.kind {
        ServiceKind::Template { pattern, .. } if pattern.is_none() => {
            Err(AppError::InvalidPattern(template.id))
        }
        ServiceKind::Template { pattern, anchor } => Ok((*pattern, anchor.unwrap_or(today))),
        _ => Err(AppError::InvalidTemplate(template.id)),
    }
}

pub fn session_dates(
    template: &Service,
    horizon_months: u32,
    today: NaiveDate,
) -> AppResult<SessionDates> {
    let (pattern, anchor) = recurrence_of(template, today)?;
    Ok(SessionDates::new(anchor, pattern, horizon_months))
}

/// Build the session a template would produce on `date`.
pub fn instance_from(
    template: &Service,
    date: NaiveDate,
    overrides: &InstanceOverrides,
) -> NewService {
    NewService {
        name: template.name.clone(),
        start_time: overrides.start_time.unwrap_or(template.start_time),
        end_time: overrides.end_time.or(template.end_time),
        location: overrides
            .location
            .clone()
            .or_else(|| template.location.clone()),
        description: template.description.clone(),
        kind: ServiceKind::Instance {
            parent: template.id,
            date,
        },
    }
}

/// Lazy sequence of the sessions `template` produces over the horizon,
/// optionally starting at `from` instead of the anchor.
pub fn expand(
    template: &Service,
    horizon_months: u32,
    today: NaiveDate,
    from: Option<NaiveDate>,
) -> AppResult<impl Iterator<Item = NewService> + '_> {
    let mut dates = session_dates(template, horizon_months, today)?;
    if let Some(from) = from {
        dates = dates.starting_at(from);
    }
    let defaults = InstanceOverrides::default();
    Ok(dates.map(move |d| instance_from(template, d, &defaults)))
}

/// Outcome of a bulk generation run.
#[derive(Debug)]
pub struct Generated {
    pub instances: Vec<Service>,
    pub created: usize,
}

pub struct SessionGenerator;

impl SessionGenerator {
    /// Persist every session of the horizon; dates that already have a
    /// session are reused as they are.
    pub fn generate(
        pool: &mut DbPool,
        template_id: i64,
        horizon_months: u32,
        today: NaiveDate,
    ) -> AppResult<Generated> {
        Self::generate_from(pool, template_id, horizon_months, today, None)
    }

    /// Same as `generate`, but sessions before `from` are skipped and the
    /// horizon starts at `from` when it lies after the anchor.
    pub fn generate_from(
        pool: &mut DbPool,
        template_id: i64,
        horizon_months: u32,
        today: NaiveDate,
        from: Option<NaiveDate>,
    ) -> AppResult<Generated> {
        let template = get_service(&pool.conn, template_id)?;
        let tx = pool.conn.transaction()?;

        let mut instances = Vec::new();
        let mut created = 0;

        for new in expand(&template, horizon_months, today, from)? {
            let ServiceKind::Instance { date, .. } = new.kind else {
                continue;
            };

            if let Some(existing) = find_instance(&tx, template.id, &date)? {
                instances.push(existing);
                continue;
            }

            let id = insert_service(&tx, &new)?;
            if let Some(svc) = load_service(&tx, id)? {
                instances.push(svc);
                created += 1;
            }
        }

        audit(
            &tx,
            "generate",
            &template.name,
            &format!(
                "{} session(s) created, {} already present",
                created,
                instances.len() - created
            ),
        )?;
        tx.commit()?;

        Ok(Generated { instances, created })
    }

    /// Add one session on `date`, with optional per-date overrides.
    /// A second call for the same date fails with `DuplicateInstance`.
    pub fn add_instance(
        pool: &mut DbPool,
        template_id: i64,
        date: NaiveDate,
        overrides: &InstanceOverrides,
    ) -> AppResult<Service> {
        let template = get_service(&pool.conn, template_id)?;
        recurrence_of(&template, date)?;

        let duplicate = || AppError::DuplicateInstance {
            template: template.id,
            date: fmt_date(&date),
        };

        if find_instance(&pool.conn, template.id, &date)?.is_some() {
            return Err(duplicate());
        }

        let new = instance_from(&template, date, overrides);
        ensure_time_range(new.start_time, new.end_time)?;

        let id = match insert_service(&pool.conn, &new) {
            Ok(id) => id,
            // another client inserted the same date in between
            Err(AppError::Db(e)) if is_unique_violation(&e) => return Err(duplicate()),
            Err(e) => return Err(e),
        };

        audit(
            &pool.conn,
            "add_instance",
            &template.name,
            &format!("Session added on {}", fmt_date(&date)),
        )?;

        get_service(&pool.conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize::init_db;
    use chrono::NaiveTime;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn template(pattern: RecurrencePattern, anchor: Option<NaiveDate>) -> Service {
        Service {
            id: 1,
            name: "Sunday Service".into(),
            start_time: t(9, 0),
            end_time: Some(t(11, 0)),
            location: Some("Main hall".into()),
            description: None,
            kind: ServiceKind::Template { pattern, anchor },
            created_at: String::new(),
        }
    }

    fn setup() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        pool
    }

    fn seed_template(pool: &DbPool, pattern: RecurrencePattern) -> i64 {
        let tpl = template(pattern, Some(d(2024, 1, 7)));
        insert_service(
            &pool.conn,
            &NewService {
                name: tpl.name,
                start_time: tpl.start_time,
                end_time: tpl.end_time,
                location: tpl.location,
                description: None,
                kind: tpl.kind,
            },
        )
        .unwrap()
    }

    #[test]
    fn weekly_sunday_service_covers_january() {
        let tpl = template(RecurrencePattern::Weekly, Some(d(2024, 1, 7)));
        let dates: Vec<_> = session_dates(&tpl, 1, d(2030, 1, 1)).unwrap().collect();
        assert_eq!(
            dates,
            vec![d(2024, 1, 7), d(2024, 1, 14), d(2024, 1, 21), d(2024, 1, 28)]
        );
    }

    #[test]
    fn weekly_dates_are_seven_days_apart_and_after_anchor() {
        let anchor = d(2024, 3, 13);
        let tpl = template(RecurrencePattern::Weekly, Some(anchor));
        let dates: Vec<_> = session_dates(&tpl, 3, anchor).unwrap().collect();

        assert!(!dates.is_empty());
        assert!(dates.iter().all(|x| *x >= anchor));
        for pair in dates.windows(2) {
            assert_eq!((pair[1] - pair[0]).num_days(), 7);
        }
        assert!(*dates.last().unwrap() <= d(2024, 5, 31));
    }

    #[test]
    fn monthly_clamps_to_end_of_short_months() {
        let tpl = template(RecurrencePattern::Monthly, Some(d(2024, 1, 31)));
        let dates: Vec<_> = session_dates(&tpl, 4, d(2024, 1, 1)).unwrap().collect();
        assert_eq!(
            dates,
            vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31), d(2024, 4, 30)]
        );
    }

    #[test]
    fn missing_anchor_starts_today() {
        let tpl = template(RecurrencePattern::Weekly, None);
        let first = session_dates(&tpl, 1, d(2024, 5, 2)).unwrap().next();
        assert_eq!(first, Some(d(2024, 5, 2)));
    }

    #[test]
    fn zero_horizon_is_empty() {
        let tpl = template(RecurrencePattern::Weekly, Some(d(2024, 1, 7)));
        assert_eq!(session_dates(&tpl, 0, d(2024, 1, 7)).unwrap().count(), 0);
    }

    #[test]
    fn expansion_rejects_non_templates_and_missing_pattern() {
        let mut one_off = template(RecurrencePattern::Weekly, None);
        one_off.kind = ServiceKind::OneOff { date: d(2024, 1, 7) };
        assert!(matches!(
            session_dates(&one_off, 1, d(2024, 1, 7)),
            Err(AppError::InvalidTemplate(1))
        ));

        let no_pattern = template(RecurrencePattern::None, None);
        assert!(matches!(
            session_dates(&no_pattern, 1, d(2024, 1, 7)),
            Err(AppError::InvalidPattern(1))
        ));
    }

    #[test]
    fn expanded_sessions_inherit_template_fields() {
        let tpl = template(RecurrencePattern::Weekly, Some(d(2024, 1, 7)));
        let first = expand(&tpl, 1, d(2024, 1, 7), None).unwrap().next().unwrap();
        assert_eq!(first.start_time, t(9, 0));
        assert_eq!(first.end_time, Some(t(11, 0)));
        assert_eq!(first.location.as_deref(), Some("Main hall"));
        assert_eq!(
            first.kind,
            ServiceKind::Instance {
                parent: 1,
                date: d(2024, 1, 7)
            }
        );
    }

    #[test]
    fn generate_twice_reuses_existing_sessions() {
        let mut pool = setup();
        let id = seed_template(&pool, RecurrencePattern::Weekly);

        let first = SessionGenerator::generate(&mut pool, id, 1, d(2024, 1, 1)).unwrap();
        assert_eq!(first.created, 4);

        let second = SessionGenerator::generate(&mut pool, id, 1, d(2024, 1, 1)).unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.instances.len(), 4);

        let ids: Vec<_> = first.instances.iter().map(|s| s.id).collect();
        let again: Vec<_> = second.instances.iter().map(|s| s.id).collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn add_instance_twice_fails_with_duplicate() {
        let mut pool = setup();
        let id = seed_template(&pool, RecurrencePattern::Weekly);
        let overrides = InstanceOverrides {
            location: Some("Annex".into()),
            start_time: Some(t(10, 0)),
            end_time: None,
        };

        let inst =
            SessionGenerator::add_instance(&mut pool, id, d(2024, 2, 14), &overrides).unwrap();
        assert_eq!(inst.parent_id(), Some(id));
        assert_eq!(inst.location.as_deref(), Some("Annex"));
        assert_eq!(inst.start_time, t(10, 0));
        assert_eq!(inst.end_time, Some(t(11, 0)));

        let again = SessionGenerator::add_instance(&mut pool, id, d(2024, 2, 14), &overrides);
        assert!(matches!(again, Err(AppError::DuplicateInstance { .. })));

        let n: i64 = pool
            .conn
            .query_row(
                "SELECT COUNT(*) FROM services WHERE parent_id = ?1",
                [id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn starting_later_skips_past_dates_and_moves_the_horizon() {
        let tpl = template(RecurrencePattern::Weekly, Some(d(2024, 1, 7)));
        let dates: Vec<_> = session_dates(&tpl, 1, d(2024, 1, 1))
            .unwrap()
            .starting_at(d(2024, 3, 5))
            .collect();
        assert_eq!(
            dates,
            vec![d(2024, 3, 10), d(2024, 3, 17), d(2024, 3, 24), d(2024, 3, 31)]
        );

        // an earlier start changes nothing
        let early: Vec<_> = session_dates(&tpl, 1, d(2024, 1, 1))
            .unwrap()
            .starting_at(d(2023, 12, 1))
            .collect();
        assert_eq!(early.first(), Some(&d(2024, 1, 7)));
        assert_eq!(early.len(), 4);
    }

    #[test]
    fn monthly_start_keeps_the_anchor_day() {
        let tpl = template(RecurrencePattern::Monthly, Some(d(2024, 1, 31)));
        let dates: Vec<_> = session_dates(&tpl, 2, d(2024, 1, 1))
            .unwrap()
            .starting_at(d(2024, 3, 1))
            .collect();
        assert_eq!(dates, vec![d(2024, 3, 31), d(2024, 4, 30)]);
    }

    #[test]
    fn generate_from_persists_only_upcoming_sessions() {
        let mut pool = setup();
        let id = seed_template(&pool, RecurrencePattern::Weekly);

        let generated =
            SessionGenerator::generate_from(&mut pool, id, 1, d(2024, 3, 5), Some(d(2024, 3, 5)))
                .unwrap();
        assert_eq!(generated.created, 4);
        assert!(generated.instances.iter().all(|s| s.date() >= Some(d(2024, 3, 5))));
        assert!(find_instance(&pool.conn, id, &d(2024, 1, 7)).unwrap().is_none());
    }

    #[test]
    fn add_instance_rejects_start_after_end() {
        let mut pool = setup();
        let id = seed_template(&pool, RecurrencePattern::Weekly);
        let overrides = InstanceOverrides {
            start_time: Some(t(12, 0)),
            ..Default::default()
        };

        let res = SessionGenerator::add_instance(&mut pool, id, d(2024, 2, 14), &overrides);
        assert!(matches!(res, Err(AppError::InvalidTime(_))));
        assert!(find_instance(&pool.conn, id, &d(2024, 2, 14)).unwrap().is_none());

        // moving both ends keeps the session valid
        let shifted = InstanceOverrides {
            start_time: Some(t(12, 0)),
            end_time: Some(t(13, 30)),
            ..Default::default()
        };
        let inst =
            SessionGenerator::add_instance(&mut pool, id, d(2024, 2, 14), &shifted).unwrap();
        assert_eq!(inst.end_time, Some(t(13, 30)));
    }

    #[test]
    fn add_instance_refuses_sessions_and_one_offs() {
        let mut pool = setup();
        let id = seed_template(&pool, RecurrencePattern::Weekly);
        let session =
            SessionGenerator::add_instance(&mut pool, id, d(2024, 2, 14), &Default::default())
                .unwrap();

        let res = SessionGenerator::add_instance(
            &mut pool,
            session.id,
            d(2024, 2, 21),
            &Default::default(),
        );
        assert!(matches!(res, Err(AppError::InvalidTemplate(sid)) if sid == session.id));

        let one_off = insert_service(
            &pool.conn,
            &NewService {
                name: "Carol Night".into(),
                start_time: t(19, 0),
                end_time: None,
                location: None,
                description: None,
                kind: ServiceKind::OneOff { date: d(2024, 12, 20) },
            },
        )
        .unwrap();
        let none = InstanceOverrides::default();
        let res = SessionGenerator::add_instance(&mut pool, one_off, d(2024, 12, 27), &none);
        assert!(matches!(res, Err(AppError::InvalidTemplate(sid)) if sid == one_off));
    }

    #[test]
    fn add_instance_requires_a_patterned_template() {
        let mut pool = setup();
        let id = seed_template(&pool, RecurrencePattern::None);
        let res =
            SessionGenerator::add_instance(&mut pool, id, d(2024, 2, 14), &Default::default());
        assert!(matches!(res, Err(AppError::InvalidPattern(_))));
    }
}
