//! Owned linked list of strategies.

use tracing::{debug, info};

use super::{ExtractionInput, ExtractionStrategy};
use crate::models::ExtractionResult;

/// A strategy and, optionally, the chain to consult after it.
///
/// Each node owns its fallback, so a chain can never be cyclic or shared.
pub struct StrategyChain {
    strategy: Box<dyn ExtractionStrategy>,
    fallback: Option<Box<StrategyChain>>,
}

impl StrategyChain {
    pub fn new(strategy: impl ExtractionStrategy + 'static) -> Self {
        Self::from_boxed(Box::new(strategy))
    }

    pub fn from_boxed(strategy: Box<dyn ExtractionStrategy>) -> Self {
        Self {
            strategy,
            fallback: None,
        }
    }

    /// Append a strategy at the end of the chain.
    pub fn with_fallback(self, strategy: impl ExtractionStrategy + 'static) -> Self {
        self.with_fallback_boxed(Box::new(strategy))
    }

    pub fn with_fallback_boxed(mut self, strategy: Box<dyn ExtractionStrategy>) -> Self {
        self.append(strategy);
        self
    }

    fn append(&mut self, strategy: Box<dyn ExtractionStrategy>) {
        match &mut self.fallback {
            Some(next) => next.append(strategy),
            None => self.fallback = Some(Box::new(StrategyChain::from_boxed(strategy))),
        }
    }

    /// Put a strategy in front of the chain.
    pub fn prepend(self, strategy: Box<dyn ExtractionStrategy>) -> Self {
        Self {
            strategy,
            fallback: Some(Box::new(self)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ExtractionStrategy> {
        std::iter::successors(Some(self), |node| node.fallback.as_deref()).map(|node| node.strategy.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|s| s.name()).collect()
    }

    /// Any strategy in the chain wants a file on disk.
    pub fn requires_file(&self) -> bool {
        self.iter().any(|s| s.requires_file())
    }

    /// Run every strategy and fold the results with [`ExtractionResult::merge`].
    ///
    /// Nothing short-circuits: a complete primary result still has its
    /// confidence capped by every later strategy.
    pub fn run(&self, input: &ExtractionInput<'_>) -> ExtractionResult {
        info!("Running strategy chain {:?}", self.names());
        let mut strategies = self.iter();
        let first = strategies.next().map(|s| s.extract(input)).unwrap_or_default();
        strategies.fold(first, |merged, strategy| {
            let result = strategy.extract(input);
            debug!(
                "{} -> number={:?} country={:?} expiry={:?} confidence={:.2}",
                strategy.name(),
                result.number,
                result.issued_country,
                result.expiration_date,
                result.confidence
            );
            merged.merge(result)
        })
    }
}

impl std::fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StrategyChain").field(&self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixed {
        name: &'static str,
        result: ExtractionResult,
        wants_file: bool,
    }

    impl Fixed {
        fn new(name: &'static str, result: ExtractionResult) -> Self {
            Self {
                name,
                result,
                wants_file: false,
            }
        }
    }

    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn extract(&self, _input: &ExtractionInput<'_>) -> ExtractionResult {
            self.result.clone()
        }

        fn requires_file(&self) -> bool {
            self.wants_file
        }
    }

    #[test]
    fn test_append_and_prepend_order() {
        let chain = StrategyChain::new(Fixed::new("a", ExtractionResult::new()))
            .with_fallback(Fixed::new("b", ExtractionResult::new()))
            .with_fallback(Fixed::new("c", ExtractionResult::new()))
            .prepend(Box::new(Fixed::new("z", ExtractionResult::new())));
        assert_eq!(chain.names(), vec!["z", "a", "b", "c"]);
    }

    #[test]
    fn test_run_merges_every_strategy() {
        let mut weak = ExtractionResult::new();
        weak.add_error("bad");
        weak.add_error("worse");

        let chain = StrategyChain::new(Fixed::new(
            "primary",
            ExtractionResult::new().with_number("A1").with_country("ESP"),
        ))
        .with_fallback(Fixed::new("weak", weak))
        .with_fallback(Fixed::new(
            "filler",
            ExtractionResult::new().with_number("B2").with_country("FRA"),
        ));

        let result = chain.run(&ExtractionInput::new(""));
        assert_eq!(result.number.as_deref(), Some("A1"));
        assert_eq!(result.issued_country.as_deref(), Some("ESP"));
        assert_eq!(result.expiration_date, None);
        assert!((result.confidence - 0.6).abs() < 1e-6);
        assert_eq!(result.validation_errors, vec!["bad".to_string(), "worse".to_string()]);
    }

    #[test]
    fn test_requires_file() {
        let mut wants = Fixed::new("mrz", ExtractionResult::new());
        wants.wants_file = true;
        let chain = StrategyChain::new(Fixed::new("gen", ExtractionResult::new()));
        assert!(!chain.requires_file());
        assert!(chain.prepend(Box::new(wants)).requires_file());
    }
}
