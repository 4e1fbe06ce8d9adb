//! Strategy lookup and chain assembly.

use std::sync::Arc;

use tracing::debug;

use super::{
    EgyptianPassportStrategy, EuDocumentStrategy, ExtractionInput, ExtractionStrategy, GenericStrategy,
    IdCardStrategy, MrzStrategy, SpanishPassportStrategy, StrategyChain, UsPassportStrategy, VisaStrategy,
};
use crate::models::ExtractionResult;
use crate::mrz::{DEFAULT_MIN_SCORE, MrzReader};

/// Registry keys, in passport-chain order for the country strategies.
pub const KEYS: &[&str] = &["MRZ", "ESP", "EGY", "EU", "USA", "GEN", "VISA", "ID"];

/// Country strategies tried after the MRZ in a passport chain.
const PASSPORT_COUNTRIES: &[&str] = &["ESP", "EGY", "EU", "USA"];

/// Issuing states whose documents the EU strategy understands.
const EU_STATES: &[&str] = &[
    "AUT", "BEL", "BGR", "HRV", "CYP", "CZE", "DNK", "EST", "FIN", "FRA", "DEU", "GRC", "HUN", "IRL", "ITA", "LVA",
    "LTU", "LUX", "MLT", "NLD", "POL", "PRT", "ROU", "SVK", "SVN", "ESP", "SWE",
];

/// Builds strategies and strategy chains.
///
/// Chains are built fresh for every call; nothing is shared between them
/// except the MRZ reader.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    mrz_reader: Option<Arc<dyn MrzReader>>,
    min_mrz_score: Option<u8>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mrz_reader(mut self, reader: Arc<dyn MrzReader>) -> Self {
        self.mrz_reader = Some(reader);
        self
    }

    pub fn with_min_mrz_score(mut self, score: u8) -> Self {
        self.min_mrz_score = Some(score);
        self
    }

    /// A single strategy for an exact registry key.
    pub fn create(&self, key: &str) -> Option<Box<dyn ExtractionStrategy>> {
        let strategy: Box<dyn ExtractionStrategy> = match key {
            "MRZ" => {
                let mut mrz = MrzStrategy::new().with_min_score(self.min_mrz_score.unwrap_or(DEFAULT_MIN_SCORE));
                if let Some(reader) = &self.mrz_reader {
                    mrz = mrz.with_reader(Arc::clone(reader));
                }
                Box::new(mrz)
            }
            "ESP" => Box::new(SpanishPassportStrategy),
            "EGY" => Box::new(EgyptianPassportStrategy),
            "EU" => Box::new(EuDocumentStrategy),
            "USA" => Box::new(UsPassportStrategy),
            "GEN" => Box::new(GenericStrategy),
            "VISA" => Box::new(VisaStrategy),
            "ID" => Box::new(IdCardStrategy),
            _ => return None,
        };
        Some(strategy)
    }

    fn chain_of(&self, keys: &[&str]) -> StrategyChain {
        let mut strategies = keys.iter().filter_map(|key| self.create(key));
        let first = strategies.next().unwrap_or_else(|| Box::new(GenericStrategy));
        let mut chain = StrategyChain::from_boxed(first);
        for strategy in strategies {
            chain = chain.with_fallback_boxed(strategy);
        }
        chain
    }

    /// The passport chain, led by `lead` when it names a country strategy.
    fn passport_chain(&self, lead: Option<&str>) -> StrategyChain {
        let lead = lead.filter(|key| PASSPORT_COUNTRIES.contains(key));
        let mut keys: Vec<&str> = lead.into_iter().collect();
        keys.push("MRZ");
        keys.extend(PASSPORT_COUNTRIES.iter().filter(|key| Some(**key) != lead));
        keys.push("GEN");
        self.chain_of(&keys)
    }

    /// Chain for a document-type hint.
    ///
    /// `passport` is MRZ, then every country strategy, then Generic.
    /// `visa` and the ID-card hints map to their strategies; any other exact
    /// key maps to itself and everything else is Generic.
    pub fn get_strategy(&self, hint: &str) -> StrategyChain {
        let chain = match hint.to_lowercase().as_str() {
            "passport" => self.passport_chain(None),
            "visa" => self.chain_of(&["VISA"]),
            "id" | "id_card" | "drivers_license" => self.chain_of(&["ID"]),
            _ if KEYS.contains(&hint) => self.chain_of(&[hint]),
            _ => self.chain_of(&["GEN"]),
        };
        debug!("Strategy chain for {:?}: {:?}", hint, chain.names());
        chain
    }

    /// Chain for a hint, re-rooted once the issuing country is known.
    ///
    /// Passports lead with the country's own strategy; ID cards from EU
    /// states get the EU strategy in front.
    pub fn get_strategy_for(&self, hint: &str, country: Option<&str>) -> StrategyChain {
        let Some(code) = country else {
            return self.get_strategy(hint);
        };
        let kind = hint.to_lowercase();
        let lead = country_key(code);

        if kind == "passport" && lead.is_some() {
            let chain = self.passport_chain(lead);
            debug!("Re-rooted passport chain for {}: {:?}", code, chain.names());
            return chain;
        }
        if matches!(kind.as_str(), "id" | "id_card") && EU_STATES.contains(&code) {
            let chain = self.get_strategy(hint).prepend(Box::new(EuDocumentStrategy));
            debug!("Re-rooted ID chain for {}: {:?}", code, chain.names());
            return chain;
        }
        self.get_strategy(hint)
    }

    /// Run a passport chain that treats `country_code` as the known issuing
    /// country, letting its strategy take precedence.
    pub fn extract_with_country(&self, input: &ExtractionInput<'_>, country_code: &str) -> ExtractionResult {
        self.get_strategy_for("passport", Some(country_code)).run(input)
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("mrz_reader", &self.mrz_reader.is_some())
            .field("min_mrz_score", &self.min_mrz_score)
            .finish()
    }
}

/// Registry key of the country strategy for an issuing state.
fn country_key(code: &str) -> Option<&'static str> {
    match code {
        "ESP" => Some("ESP"),
        "EGY" => Some("EGY"),
        "USA" => Some("USA"),
        _ if EU_STATES.contains(&code) => Some("EU"),
        _ => None,
    }
}

/// Chain for a document-type hint using a default registry.
pub fn get_strategy(hint: &str) -> StrategyChain {
    StrategyRegistry::new().get_strategy(hint)
}
