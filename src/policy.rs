//! Caller-supplied per-day policies.
//!
//! Policies are shared closures compared by identity: the controller only
//! re-evaluates a policy across the visible window when the caller hands it a
//! *different* closure, never when the same closure is passed again.
use std::fmt;
use std::sync::Arc;
use time::Date;

/// A shared policy function, compared by reference identity
pub struct Policy<F: ?Sized>(Arc<F>);

pub type DayPredicate = Policy<dyn Fn(Date) -> bool + Send + Sync>;

/// Maps a day to zero or more custom labels
pub type DayLabeler = Policy<dyn Fn(Date) -> Vec<String> + Send + Sync>;

/// Derives a range endpoint from a clicked or hovered day
pub type DateOffset = Policy<dyn Fn(Date) -> Date + Send + Sync>;

impl<F: ?Sized> Policy<F> {
    /// Returns whether both handles refer to the same closure
    pub fn same(&self, other: &Policy<F>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<F: ?Sized> Clone for Policy<F> {
    fn clone(&self) -> Policy<F> {
        Policy(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Policy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Policy")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

impl DayPredicate {
    pub fn new<P>(predicate: P) -> DayPredicate
    where
        P: Fn(Date) -> bool + Send + Sync + 'static,
    {
        let predicate: Arc<dyn Fn(Date) -> bool + Send + Sync> = Arc::new(predicate);
        Policy(predicate)
    }

    pub fn test(&self, day: Date) -> bool {
        (self.0)(day)
    }
}

impl DayLabeler {
    pub fn new<L>(labeler: L) -> DayLabeler
    where
        L: Fn(Date) -> Vec<String> + Send + Sync + 'static,
    {
        let labeler: Arc<dyn Fn(Date) -> Vec<String> + Send + Sync> = Arc::new(labeler);
        Policy(labeler)
    }

    pub fn labels(&self, day: Date) -> Vec<String> {
        (self.0)(day)
    }
}

impl DateOffset {
    pub fn new<O>(offset: O) -> DateOffset
    where
        O: Fn(Date) -> Date + Send + Sync + 'static,
    {
        let offset: Arc<dyn Fn(Date) -> Date + Send + Sync> = Arc::new(offset);
        Policy(offset)
    }

    pub fn apply(&self, day: Date) -> Date {
        (self.0)(day)
    }
}

/// Compares two optional policies by identity; two absent policies are the
/// same
pub fn same_policy<F: ?Sized>(a: Option<&Policy<F>>, b: Option<&Policy<F>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same(b),
        (None, None) => true,
        _ => false,
    }
}

/// The full set of per-day policies a controller consults.  Every policy is
/// optional; an absent predicate never matches and an absent labeler yields no
/// labels.
#[derive(Clone, Debug, Default)]
pub struct Policies {
    pub is_outside_range: Option<DayPredicate>,
    pub is_day_blocked: Option<DayPredicate>,
    pub is_day_highlighted: Option<DayPredicate>,
    pub classify_day: Option<DayLabeler>,
    pub start_date_offset: Option<DateOffset>,
    pub end_date_offset: Option<DateOffset>,
}

impl Policies {
    pub fn new() -> Policies {
        Policies::default()
    }

    pub fn with_outside_range(mut self, predicate: DayPredicate) -> Policies {
        self.is_outside_range = Some(predicate);
        self
    }

    pub fn with_day_blocked(mut self, predicate: DayPredicate) -> Policies {
        self.is_day_blocked = Some(predicate);
        self
    }

    pub fn with_day_highlighted(mut self, predicate: DayPredicate) -> Policies {
        self.is_day_highlighted = Some(predicate);
        self
    }

    pub fn with_classifier(mut self, labeler: DayLabeler) -> Policies {
        self.classify_day = Some(labeler);
        self
    }

    pub fn with_start_date_offset(mut self, offset: DateOffset) -> Policies {
        self.start_date_offset = Some(offset);
        self
    }

    pub fn with_end_date_offset(mut self, offset: DateOffset) -> Policies {
        self.end_date_offset = Some(offset);
        self
    }

    pub fn outside_range(&self, day: Date) -> bool {
        self.is_outside_range.as_ref().is_some_and(|p| p.test(day))
    }

    pub fn day_blocked(&self, day: Date) -> bool {
        self.is_day_blocked.as_ref().is_some_and(|p| p.test(day))
    }

    pub fn day_highlighted(&self, day: Date) -> bool {
        self.is_day_highlighted.as_ref().is_some_and(|p| p.test(day))
    }

    pub fn labels(&self, day: Date) -> Vec<String> {
        self.classify_day
            .as_ref()
            .map(|c| c.labels(day))
            .unwrap_or_default()
    }

    /// Returns whether range selection is derived from offsets rather than two
    /// manual clicks
    pub fn has_offset(&self) -> bool {
        self.start_date_offset.is_some() || self.end_date_offset.is_some()
    }

    /// The start of the range implied by choosing `day`
    pub fn offset_start(&self, day: Date) -> Date {
        self.start_date_offset
            .as_ref()
            .map_or(day, |offset| offset.apply(day))
    }

    /// The end of the range implied by choosing `day`
    pub fn offset_end(&self, day: Date) -> Date {
        self.end_date_offset
            .as_ref()
            .map_or(day, |offset| offset.apply(day))
    }
}
