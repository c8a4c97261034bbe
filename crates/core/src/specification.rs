//! Specification pattern: composable query predicates with eager-load hints.
//!
//! A specification bundles three things about a query over `T`:
//!
//! - an optional predicate ([`Criteria`]); no predicate means "no constraint"
//! - typed eager-load selectors ([`Include`])
//! - string eager-load paths for dynamic/nested navigation (`"utility_accounts.service_address"`)
//!
//! Repositories translate a specification into whatever their store needs; an
//! in-memory evaluation only has to honour [`Specification::is_satisfied_by`].
//!
//! ```ignore
//! let active = BaseSpecification::new().where_(|c: &Customer| c.has_utility_accounts());
//! let failed = BaseSpecification::new().where_(|c: &Customer| c.sync_status() == SyncStatus::Failed);
//! let spec = active.and(&failed.not());
//! let matches = spec.filter(customers.iter());
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

/// A cloneable, thread-safe predicate over `T`.
pub struct Criteria<T> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Criteria<T> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    pub fn evaluate(&self, entity: &T) -> bool {
        (self.predicate)(entity)
    }
}

impl<T: 'static> Criteria<T> {
    /// Logical conjunction (short-circuits on `self`).
    pub fn and(&self, other: &Criteria<T>) -> Criteria<T> {
        let (left, right) = (self.clone(), other.clone());
        Criteria::new(move |e: &T| left.evaluate(e) && right.evaluate(e))
    }

    /// Logical disjunction (short-circuits on `self`).
    pub fn or(&self, other: &Criteria<T>) -> Criteria<T> {
        let (left, right) = (self.clone(), other.clone());
        Criteria::new(move |e: &T| left.evaluate(e) || right.evaluate(e))
    }

    /// Logical negation.
    pub fn negate(&self) -> Criteria<T> {
        let inner = self.clone();
        Criteria::new(move |e: &T| !inner.evaluate(e))
    }
}

impl<T> Clone for Criteria<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> core::fmt::Debug for Criteria<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Criteria(..)")
    }
}

/// Typed eager-load selector: names a navigation of `T` that should be loaded
/// together with it.
pub struct Include<T> {
    navigation: &'static str,
    _entity: PhantomData<fn(&T)>,
}

impl<T> Include<T> {
    pub const fn new(navigation: &'static str) -> Self {
        Self {
            navigation,
            _entity: PhantomData,
        }
    }

    pub fn navigation(&self) -> &'static str {
        self.navigation
    }
}

impl<T> Clone for Include<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Include<T> {}

impl<T> PartialEq for Include<T> {
    fn eq(&self, other: &Self) -> bool {
        self.navigation == other.navigation
    }
}

impl<T> Eq for Include<T> {}

impl<T> core::fmt::Debug for Include<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Include").field(&self.navigation).finish()
    }
}

/// A named, composable query over `T`.
pub trait Specification<T> {
    /// Predicate, if any. `None` means every entity matches.
    fn criteria(&self) -> Option<&Criteria<T>>;

    /// Typed eager-load selectors.
    fn includes(&self) -> &[Include<T>];

    /// String eager-load paths (dynamic / nested navigation).
    fn include_paths(&self) -> &[String];

    /// Evaluate the predicate in memory. Vacuously true without a predicate.
    fn is_satisfied_by(&self, entity: &T) -> bool {
        self.criteria().is_none_or(|c| c.evaluate(entity))
    }
}

/// Concrete specification built up by hand.
pub struct BaseSpecification<T> {
    criteria: Option<Criteria<T>>,
    includes: Vec<Include<T>>,
    include_paths: Vec<String>,
}

impl<T> BaseSpecification<T> {
    /// A specification with no predicate and nothing to eager-load.
    pub fn new() -> Self {
        Self {
            criteria: None,
            includes: Vec::new(),
            include_paths: Vec::new(),
        }
    }

    pub fn with_criteria(mut self, criteria: Criteria<T>) -> Self {
        self.criteria = Some(criteria);
        self
    }

    /// Set the predicate from a closure.
    pub fn where_<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.with_criteria(Criteria::new(predicate))
    }

    pub fn include(mut self, include: Include<T>) -> Self {
        self.includes.push(include);
        self
    }

    pub fn include_path(mut self, path: impl Into<String>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    fn from_parts(
        criteria: Option<Criteria<T>>,
        includes: Vec<Include<T>>,
        include_paths: Vec<String>,
    ) -> Self {
        Self {
            criteria,
            includes,
            include_paths,
        }
    }
}

impl<T> Default for BaseSpecification<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BaseSpecification<T> {
    fn clone(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            includes: self.includes.clone(),
            include_paths: self.include_paths.clone(),
        }
    }
}

impl<T> core::fmt::Debug for BaseSpecification<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BaseSpecification")
            .field("criteria", &self.criteria)
            .field("includes", &self.includes)
            .field("include_paths", &self.include_paths)
            .finish()
    }
}

impl<T> Specification<T> for BaseSpecification<T> {
    fn criteria(&self) -> Option<&Criteria<T>> {
        self.criteria.as_ref()
    }

    fn includes(&self) -> &[Include<T>] {
        &self.includes
    }

    fn include_paths(&self) -> &[String] {
        &self.include_paths
    }
}

fn concat<X: Clone>(left: &[X], right: &[X]) -> Vec<X> {
    left.iter().chain(right).cloned().collect()
}

macro_rules! composite_specification {
    ($name:ident) => {
        impl<T> Specification<T> for $name<T> {
            fn criteria(&self) -> Option<&Criteria<T>> {
                self.merged.criteria()
            }

            fn includes(&self) -> &[Include<T>] {
                self.merged.includes()
            }

            fn include_paths(&self) -> &[String] {
                self.merged.include_paths()
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                Self {
                    merged: self.merged.clone(),
                }
            }
        }

        impl<T> core::fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.merged).finish()
            }
        }

        impl<T> From<$name<T>> for BaseSpecification<T> {
            fn from(value: $name<T>) -> Self {
                value.merged
            }
        }
    };
}

/// Both operands must hold.
///
/// Predicate: `left && right` when both are present, whichever is present
/// otherwise, none if neither is. Eager-load lists are concatenated
/// (left first) and not deduplicated.
pub struct AndSpecification<T> {
    merged: BaseSpecification<T>,
}

impl<T: 'static> AndSpecification<T> {
    pub fn new<L, R>(left: &L, right: &R) -> Self
    where
        L: Specification<T> + ?Sized,
        R: Specification<T> + ?Sized,
    {
        let criteria = match (left.criteria(), right.criteria()) {
            (Some(l), Some(r)) => Some(l.and(r)),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        };
        Self {
            merged: BaseSpecification::from_parts(
                criteria,
                concat(left.includes(), right.includes()),
                concat(left.include_paths(), right.include_paths()),
            ),
        }
    }
}

composite_specification!(AndSpecification);

/// At least one operand must hold.
///
/// An unconstrained operand already matches everything, so the disjunction is
/// unconstrained as soon as either side has no predicate. Eager-load lists are
/// concatenated (left first).
pub struct OrSpecification<T> {
    merged: BaseSpecification<T>,
}

impl<T: 'static> OrSpecification<T> {
    pub fn new<L, R>(left: &L, right: &R) -> Self
    where
        L: Specification<T> + ?Sized,
        R: Specification<T> + ?Sized,
    {
        let criteria = match (left.criteria(), right.criteria()) {
            (Some(l), Some(r)) => Some(l.or(r)),
            _ => None,
        };
        Self {
            merged: BaseSpecification::from_parts(
                criteria,
                concat(left.includes(), right.includes()),
                concat(left.include_paths(), right.include_paths()),
            ),
        }
    }
}

composite_specification!(OrSpecification);

/// Negates the inner predicate.
///
/// Negating "no constraint" stays "no constraint"; it does not turn into
/// "reject everything". Eager-load lists are copied unchanged.
pub struct NotSpecification<T> {
    merged: BaseSpecification<T>,
}

impl<T: 'static> NotSpecification<T> {
    pub fn new<S>(inner: &S) -> Self
    where
        S: Specification<T> + ?Sized,
    {
        Self {
            merged: BaseSpecification::from_parts(
                inner.criteria().map(Criteria::negate),
                inner.includes().to_vec(),
                inner.include_paths().to_vec(),
            ),
        }
    }
}

composite_specification!(NotSpecification);

/// Combinators available on every specification.
pub trait SpecificationExt<T: 'static>: Specification<T> {
    fn and<S>(&self, other: &S) -> AndSpecification<T>
    where
        S: Specification<T> + ?Sized,
    {
        AndSpecification::new(self, other)
    }

    fn or<S>(&self, other: &S) -> OrSpecification<T>
    where
        S: Specification<T> + ?Sized,
    {
        OrSpecification::new(self, other)
    }

    fn not(&self) -> NotSpecification<T> {
        NotSpecification::new(self)
    }

    /// Evaluate in memory, keeping the entities that satisfy this specification.
    fn filter<'a, I>(&self, entities: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        entities
            .into_iter()
            .filter(|e| self.is_satisfied_by(e))
            .collect()
    }
}

impl<T: 'static, S> SpecificationExt<T> for S where S: Specification<T> + ?Sized {}
