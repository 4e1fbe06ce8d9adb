//! ISO 3166-1 alpha-3 reference data.
//!
//! Read-only, built once on first use.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;

use super::text::fold_upper;

const ISO_ALPHA3: &str = "\
ABW AFG AGO AIA ALA ALB AND ARE ARG ARM ASM ATA ATF ATG AUS AUT AZE BDI BEL BEN BES BFA BGD BGR BHR \
BHS BIH BLM BLR BLZ BMU BOL BRA BRB BRN BTN BVT BWA CAF CAN CCK CHE CHL CHN CIV CMR COD COG COK COL \
COM CPV CRI CUB CUW CXR CYM CYP CZE DEU DJI DMA DNK DOM DZA ECU EGY ERI ESH ESP EST ETH FIN FJI FLK \
FRA FRO FSM GAB GBR GEO GGY GHA GIB GIN GLP GMB GNB GNQ GRC GRD GRL GTM GUF GUM GUY HKG HMD HND HRV \
HTI HUN IDN IMN IND IOT IRL IRN IRQ ISL ISR ITA JAM JEY JOR JPN KAZ KEN KGZ KHM KIR KNA KOR KWT LAO \
LBN LBR LBY LCA LIE LKA LSO LTU LUX LVA MAC MAF MAR MCO MDA MDG MDV MEX MHL MKD MLI MLT MMR MNE MNG \
MNP MOZ MRT MSR MTQ MUS MWI MYS MYT NAM NCL NER NFK NGA NIC NIU NLD NOR NPL NRU NZL OMN PAK PAN PCN \
PER PHL PLW PNG POL PRI PRK PRT PRY PSE PYF QAT REU ROU RUS RWA SAU SDN SEN SGP SGS SHN SJM SLB SLE \
SLV SMR SOM SPM SRB SSD STP SUR SVK SVN SWE SWZ SXM SYC SYR TCA TCD TGO THA TJK TKL TKM TLS TON TTO \
TUN TUR TUV TWN TZA UGA UKR UMI URY USA UZB VAT VCT VEN VGB VIR VNM VUT WLF WSM YEM ZAF ZMB ZWE";

/// Country names as printed on documents (English and native forms, diacritics folded).
const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("UNITED STATES OF AMERICA", "USA"),
    ("UNITED STATES", "USA"),
    ("ESTADOS UNIDOS MEXICANOS", "MEX"),
    ("ESTADOS UNIDOS", "USA"),
    ("UNITED KINGDOM", "GBR"),
    ("GREAT BRITAIN", "GBR"),
    ("REINO DE ESPANA", "ESP"),
    ("ESPANA", "ESP"),
    ("SPAIN", "ESP"),
    ("BUNDESREPUBLIK DEUTSCHLAND", "DEU"),
    ("DEUTSCHLAND", "DEU"),
    ("GERMANY", "DEU"),
    ("REPUBLIQUE FRANCAISE", "FRA"),
    ("FRANCE", "FRA"),
    ("REPUBBLICA ITALIANA", "ITA"),
    ("ITALIA", "ITA"),
    ("ITALY", "ITA"),
    ("PORTUGAL", "PRT"),
    ("NEDERLAND", "NLD"),
    ("NETHERLANDS", "NLD"),
    ("BELGIQUE", "BEL"),
    ("BELGIE", "BEL"),
    ("BELGIUM", "BEL"),
    ("OSTERREICH", "AUT"),
    ("AUSTRIA", "AUT"),
    ("SCHWEIZ", "CHE"),
    ("SUISSE", "CHE"),
    ("SWITZERLAND", "CHE"),
    ("POLSKA", "POL"),
    ("POLAND", "POL"),
    ("ARAB REPUBLIC OF EGYPT", "EGY"),
    ("EGYPT", "EGY"),
    ("CANADA", "CAN"),
    ("MEXICO", "MEX"),
    ("ARGENTINA", "ARG"),
    ("BRASIL", "BRA"),
    ("BRAZIL", "BRA"),
    ("COLOMBIA", "COL"),
    ("VENEZUELA", "VEN"),
    ("PERU", "PER"),
    ("CHILE", "CHL"),
    ("ECUADOR", "ECU"),
    ("CUBA", "CUB"),
    ("INDIA", "IND"),
    ("CHINA", "CHN"),
    ("JAPAN", "JPN"),
    ("MOROCCO", "MAR"),
    ("MAROC", "MAR"),
    ("TURKIYE", "TUR"),
    ("TURKEY", "TUR"),
    ("UKRAINE", "UKR"),
    ("ROMANIA", "ROU"),
    ("IRELAND", "IRL"),
    ("AUSTRALIA", "AUS"),
];

/// Values that look like codes but must never be accepted.
pub const DENYLIST: &[&str] = &["XXX", "ZZZ", "UNK", "N/A", "NA", "TBD"];

lazy_static! {
    static ref CODES: HashSet<&'static str> = ISO_ALPHA3.split_whitespace().collect();

    static ref NAMES: HashMap<&'static str, &'static str> = COUNTRY_NAMES.iter().copied().collect();

    // Longest names first so "UNITED STATES OF AMERICA" wins over "UNITED STATES".
    static ref NAME_PATTERN: Regex = {
        let mut names: Vec<&str> = COUNTRY_NAMES.iter().map(|(name, _)| *name).collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));
        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"\b(?:{})\b", alternation)).unwrap()
    };

    static ref CODE_SHAPE: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();
}

/// Whether `code` is a real ISO 3166-1 alpha-3 code.
pub fn is_iso_alpha3(code: &str) -> bool {
    CODES.contains(code)
}

/// Full country-code validation: shape, denylist, ISO membership.
pub fn is_valid_country_code(code: &str) -> bool {
    CODE_SHAPE.is_match(code) && !DENYLIST.contains(&code) && is_iso_alpha3(code)
}

/// Find the first country name mentioned in `text` and return its alpha-3 code.
pub fn find_country_name(text: &str) -> Option<&'static str> {
    let folded = fold_upper(text);
    let found = NAME_PATTERN.find(&folded)?;
    NAMES.get(found.as_str()).copied()
}
