//! Visitor registry and recomposition.
//!
//! The registry maps a spec type name to either a visitor factory or a
//! recomposer that rewrites the spec into another registered type before
//! dispatch. It is assembled once with [`RegistryBuilder`] and only read
//! afterwards, so it can be shared between threads without locking.
//!
//! Recomposition chains are checked at build time: every target must be
//! registered and no chain may lead back to one of its own sources. `resolve`
//! additionally bounds chain length by the configured depth.

use std::{borrow::Cow, collections::BTreeMap, fmt, sync::Arc};

use crate::{
    error::{FormSpecError, Result},
    spec::FormSpec,
    visitor::{Visitor, VisitorContext},
};

/// Builds the visitor of one spec type.
pub type VisitorFactory =
    Arc<dyn Fn(&FormSpec, &VisitorContext) -> Result<Box<dyn Visitor>> + Send + Sync>;

/// Rewrites a spec into an equivalent spec of another type.
pub type RecomposeFn = Arc<dyn Fn(&FormSpec) -> Result<FormSpec> + Send + Sync>;

#[derive(Clone)]
struct Recomposition {
    target: &'static str,
    recompose: RecomposeFn,
}

impl Recomposition {
    fn apply(&self, source_type: &'static str, spec: &FormSpec) -> Result<FormSpec> {
        let produced = (self.recompose)(spec)?;
        if produced.type_name() != self.target {
            return Err(FormSpecError::UnexpectedRecomposition {
                source_type,
                declared: self.target,
                produced: produced.type_name(),
            });
        }
        debug!("recomposed `{source_type}` into `{}`", self.target);
        Ok(produced)
    }
}

/// How a registered type is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Dispatched to a visitor.
    Visitor,
    /// Rewritten into the given type first.
    Recomposed(&'static str),
}

/// Collects registrations and checks them in [`RegistryBuilder::build`].
#[derive(Default)]
pub struct RegistryBuilder {
    visitors: BTreeMap<&'static str, VisitorFactory>,
    recomposers: BTreeMap<&'static str, Recomposition>,
    fallback: Option<Recomposition>,
}

impl RegistryBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the visitor factory of `type_name`.
    pub fn register_visitor(
        mut self,
        type_name: &'static str,
        factory: impl Fn(&FormSpec, &VisitorContext) -> Result<Box<dyn Visitor>> + Send + Sync + 'static,
    ) -> Self {
        self.visitors.insert(type_name, Arc::new(factory));
        self
    }

    /// Register a recomposer rewriting `source` specs into `target` specs.
    ///
    /// A recomposer takes precedence over a visitor registered for the same
    /// source type.
    pub fn register_recomposer(
        mut self,
        source: &'static str,
        target: &'static str,
        recompose: impl Fn(&FormSpec) -> Result<FormSpec> + Send + Sync + 'static,
    ) -> Self {
        self.recomposers.insert(
            source,
            Recomposition {
                target,
                recompose: Arc::new(recompose),
            },
        );
        self
    }

    /// Recomposer applied to specs of any unregistered type.
    pub fn unknown_fallback(
        mut self,
        target: &'static str,
        recompose: impl Fn(&FormSpec) -> Result<FormSpec> + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Some(Recomposition {
            target,
            recompose: Arc::new(recompose),
        });
        self
    }

    fn is_registered(&self, type_name: &str) -> bool {
        self.visitors.contains_key(type_name) || self.recomposers.contains_key(type_name)
    }

    /// Check the recomposition graph and freeze the registry.
    ///
    /// # Errors
    ///
    /// - [`FormSpecError::UnregisteredTarget`] if a recomposer targets a type
    ///   that is neither a visitor nor a recomposer source.
    /// - [`FormSpecError::RecompositionCycle`] if following targets from some
    ///   source leads back into the chain.
    pub fn build(self) -> Result<VisitorRegistry> {
        for (&source, recomposition) in &self.recomposers {
            if !self.is_registered(recomposition.target) {
                return Err(FormSpecError::UnregisteredTarget {
                    source_type: source,
                    target: recomposition.target,
                });
            }
        }
        if let Some(fallback) = &self.fallback {
            if !self.is_registered(fallback.target) {
                return Err(FormSpecError::UnregisteredTarget {
                    source_type: "<unknown>",
                    target: fallback.target,
                });
            }
        }

        // Every source has exactly one target, so a cycle shows up as a
        // repeated type while walking the chain.
        for &source in self.recomposers.keys() {
            let mut chain = vec![source];
            let mut current = source;
            while let Some(next) = self.recomposers.get(current) {
                current = next.target;
                let seen = chain.contains(&current);
                chain.push(current);
                if seen {
                    return Err(FormSpecError::RecompositionCycle(chain));
                }
            }
        }

        debug!(
            "visitor registry built: {} visitors, {} recomposers",
            self.visitors.len(),
            self.recomposers.len()
        );
        Ok(VisitorRegistry {
            visitors: self.visitors,
            recomposers: self.recomposers,
            fallback: self.fallback,
        })
    }
}

/// Immutable mapping from spec type to visitor.
pub struct VisitorRegistry {
    visitors: BTreeMap<&'static str, VisitorFactory>,
    recomposers: BTreeMap<&'static str, Recomposition>,
    fallback: Option<Recomposition>,
}

impl fmt::Debug for VisitorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisitorRegistry")
            .field("visitors", &self.visitors.keys().collect::<Vec<_>>())
            .field(
                "recomposers",
                &self
                    .recomposers
                    .iter()
                    .map(|(s, r)| (*s, r.target))
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl VisitorRegistry {
    /// Start a new registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Whether `type_name` has a visitor or a recomposer.
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.registration(type_name).is_some()
    }

    /// How `type_name` is handled, if registered.
    pub fn registration(&self, type_name: &str) -> Option<Registration> {
        if let Some(r) = self.recomposers.get(type_name) {
            Some(Registration::Recomposed(r.target))
        } else if self.visitors.contains_key(type_name) {
            Some(Registration::Visitor)
        } else {
            None
        }
    }

    /// Every registered type with its handling, sorted by type name.
    pub fn registrations(&self) -> Vec<(&'static str, Registration)> {
        let mut all: Vec<_> = self
            .visitors
            .keys()
            .filter(|t| !self.recomposers.contains_key(*t))
            .map(|t| (*t, Registration::Visitor))
            .chain(
                self.recomposers
                    .iter()
                    .map(|(s, r)| (*s, Registration::Recomposed(r.target))),
            )
            .collect();
        all.sort_by_key(|(t, _)| *t);
        all
    }

    /// Target of the unknown-type fallback, if installed.
    pub fn fallback_target(&self) -> Option<&'static str> {
        self.fallback.as_ref().map(|f| f.target)
    }

    /// Apply recomposers until `spec` has a type with a visitor.
    ///
    /// # Errors
    ///
    /// Propagates recomposer errors, and fails with
    /// [`FormSpecError::RecompositionDepth`] after `max_depth` steps or
    /// [`FormSpecError::NoVisitor`] if an unregistered type is reached and no
    /// fallback is installed.
    pub fn normalize<'a>(&self, spec: &'a FormSpec, max_depth: usize) -> Result<Cow<'a, FormSpec>> {
        let origin = spec.type_name();
        let mut current = Cow::Borrowed(spec);
        let mut depth = 0;
        loop {
            let type_name = current.type_name();
            let recomposition = match self.recomposers.get(type_name) {
                Some(r) => r,
                None if self.visitors.contains_key(type_name) => return Ok(current),
                None => match &self.fallback {
                    Some(fallback) => {
                        debug!("no visitor for `{type_name}`, using the `{}` fallback", fallback.target);
                        fallback
                    }
                    None => return Err(FormSpecError::NoVisitor(type_name)),
                },
            };
            if depth == max_depth {
                return Err(FormSpecError::RecompositionDepth(origin, max_depth));
            }
            depth += 1;
            current = Cow::Owned(recomposition.apply(type_name, &current)?);
        }
    }

    /// Build the visitor of `spec` for the given context.
    pub fn resolve(&self, spec: &FormSpec, ctx: &VisitorContext) -> Result<Box<dyn Visitor>> {
        let spec = self.normalize(spec, ctx.config().max_recomposition_depth)?;
        let type_name = spec.type_name();
        let factory = self
            .visitors
            .get(type_name)
            .ok_or(FormSpecError::NoVisitor(type_name))?;
        trace!("resolved visitor for `{type_name}`");
        factory(spec.as_ref(), ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        spec::{Float, Integer, Legacy, TextInput, kind},
        visitor::{FloatVisitor, IntegerVisitor, LegacyVisitor, StringVisitor},
    };

    fn to_integer(_: &FormSpec) -> Result<FormSpec> {
        Ok(Integer::default().into())
    }

    fn to_float(_: &FormSpec) -> Result<FormSpec> {
        Ok(Float::default().into())
    }

    #[test]
    fn test_cycle_rejected() {
        let err = VisitorRegistry::builder()
            .register_recomposer(kind::INTEGER, kind::FLOAT, to_float)
            .register_recomposer(kind::FLOAT, kind::INTEGER, to_integer)
            .build()
            .unwrap_err();
        let FormSpecError::RecompositionCycle(chain) = err else {
            panic!("expected a cycle error");
        };
        assert_eq!(chain.first(), chain.last());
    }

    #[test]
    fn test_unregistered_target_rejected() {
        let err = VisitorRegistry::builder()
            .register_recomposer(kind::INTEGER, kind::FLOAT, to_float)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            FormSpecError::UnregisteredTarget {
                source_type: kind::INTEGER,
                target: kind::FLOAT
            }
        ));
    }

    #[test]
    fn test_declared_target_enforced() {
        let registry = VisitorRegistry::builder()
            .register_visitor(kind::FLOAT, FloatVisitor::factory)
            .register_visitor(kind::INTEGER, IntegerVisitor::factory)
            .register_recomposer(kind::STRING, kind::FLOAT, to_integer)
            .build()
            .unwrap();
        let err = registry
            .normalize(&TextInput::default().into(), 8)
            .unwrap_err();
        assert!(matches!(
            err,
            FormSpecError::UnexpectedRecomposition {
                produced: kind::INTEGER,
                ..
            }
        ));
    }

    #[test]
    fn test_depth_guard() {
        let registry = VisitorRegistry::builder()
            .register_visitor(kind::INTEGER, IntegerVisitor::factory)
            .register_visitor(kind::STRING, StringVisitor::factory)
            .register_recomposer(kind::STRING, kind::FLOAT, to_float)
            .register_recomposer(kind::FLOAT, kind::INTEGER, to_integer)
            .build()
            .unwrap();
        let spec: FormSpec = TextInput::default().into();
        assert_eq!(
            registry.normalize(&spec, 2).unwrap().type_name(),
            kind::INTEGER
        );
        assert!(matches!(
            registry.normalize(&spec, 1),
            Err(FormSpecError::RecompositionDepth(kind::STRING, 1))
        ));
    }

    #[test]
    fn test_unknown_fallback() {
        let without = VisitorRegistry::builder()
            .register_visitor(kind::INTEGER, IntegerVisitor::factory)
            .build()
            .unwrap();
        let spec: FormSpec = TextInput::default().into();
        assert!(matches!(
            without.normalize(&spec, 8),
            Err(FormSpecError::NoVisitor(kind::STRING))
        ));

        let with = VisitorRegistry::builder()
            .register_visitor(kind::LEGACY, LegacyVisitor::factory)
            .unknown_fallback(kind::LEGACY, |spec| {
                Ok(Legacy {
                    original_type: spec.type_name().to_string(),
                    ..Legacy::default()
                }
                .into())
            })
            .build()
            .unwrap();
        let normalized = with.normalize(&spec, 8).unwrap();
        let FormSpec::Legacy(legacy) = normalized.as_ref() else {
            panic!("not recomposed into legacy");
        };
        assert_eq!(legacy.original_type, kind::STRING);
        assert_eq!(with.fallback_target(), Some(kind::LEGACY));
    }

    #[test]
    fn test_registrations() {
        let registry = VisitorRegistry::builder()
            .register_visitor(kind::INTEGER, IntegerVisitor::factory)
            .register_recomposer(kind::FLOAT, kind::INTEGER, to_integer)
            .build()
            .unwrap();
        assert_eq!(
            registry.registrations(),
            vec![
                (kind::FLOAT, Registration::Recomposed(kind::INTEGER)),
                (kind::INTEGER, Registration::Visitor),
            ]
        );
        assert!(!registry.is_registered(kind::STRING));
    }
}
