//! Curated alias table for team names fuzzy matching alone gets wrong.
//!
//! Keys are already-normalized alternate spellings (acronyms, short forms,
//! pre-rebrand names); values are canonical roster display names. The matcher
//! normalizes the value again before looking it up in the roster, so a value
//! only needs to be spelled the way the roster provider spells it.
//!
//! Extra aliases can be merged from a JSON file, either a flat object
//! (`{"zags": "Gonzaga"}`) or wrapped (`{"aliases": {"zags": "Gonzaga"}}`).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::normalize::normalize;

/// Built-in aliases: (normalized alternate spelling, canonical display name)
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    // Acronyms and flagship disambiguation
    ("uconn", "Connecticut"),
    ("umass", "Massachusetts"),
    ("ole miss", "Mississippi"),
    ("olemiss", "Mississippi"),
    ("penn", "Pennsylvania"),
    ("penn state", "Penn State"),
    ("psu", "Penn State"),
    ("miami fl", "Miami (FL)"),
    ("miami oh", "Miami (OH)"),
    ("miami florida", "Miami (FL)"),
    ("miami ohio", "Miami (OH)"),
    ("the u", "Miami (FL)"),
    ("unc", "North Carolina"),
    ("nc state", "NC State"),
    ("ncsu", "NC State"),
    ("nc st", "NC State"),
    ("nova", "Villanova"),
    ("cuse", "Syracuse"),
    ("ku", "Kansas"),
    ("uk", "Kentucky"),
    ("bama", "Alabama"),
    ("cincy", "Cincinnati"),
    ("mizzou", "Missouri"),
    ("wazzu", "Washington State"),
    ("gt", "Georgia Tech"),
    ("cu", "Colorado"),
    ("colo", "Colorado"),
    ("ksu", "Kansas State"),
    ("k state", "Kansas State"),
    ("ttu", "Texas Tech"),
    ("umd", "Maryland"),
    ("rutg", "Rutgers"),
    ("illini", "Illinois"),
    ("texas a m", "Texas A&M"),
    ("texas am", "Texas A&M"),
    ("texas a and m", "Texas A&M"),
    ("tamu", "Texas A&M"),
    ("mich st", "Michigan State"),
    ("mich state", "Michigan State"),
    ("michigan st", "Michigan State"),
    ("msu", "Michigan State"),
    ("southern california", "USC"),
    ("southern cal", "USC"),
    ("louisiana state", "LSU"),
    ("brigham young", "BYU"),
    ("southern methodist", "SMU"),
    ("texas christian", "TCU"),
    ("pitt", "Pittsburgh"),
    ("cal", "California"),
    ("california berkeley", "California"),
    ("uc berkeley", "California"),
    ("va tech", "Virginia Tech"),
    ("vt", "Virginia Tech"),
    ("west virginia", "West Virginia"),
    ("wvu", "West Virginia"),
    ("ohio state", "Ohio State"),
    ("osu", "Ohio State"),
    ("arizona state", "Arizona State"),
    ("asu", "Arizona State"),
    ("florida state", "Florida State"),
    ("fsu", "Florida State"),
    ("washington state", "Washington State"),
    ("wsu", "Washington State"),
    ("george washington", "George Washington"),
    ("gw", "George Washington"),

    // Saints
    ("st johns", "St. John's (NY)"),
    ("saint johns", "St. John's (NY)"),
    ("st johns ny", "St. John's (NY)"),
    ("sju", "St. John's (NY)"),
    ("st marys", "Saint Mary's (CA)"),
    ("saint marys", "Saint Mary's (CA)"),
    ("st marys ca", "Saint Mary's (CA)"),
    ("smc", "Saint Mary's (CA)"),
    ("st louis", "Saint Louis"),
    ("saint louis", "Saint Louis"),
    ("slu", "Saint Louis"),
    ("st josephs", "Saint Joseph's"),
    ("saint josephs", "Saint Joseph's"),
    ("st josephs pa", "Saint Joseph's"),
    ("st bonaventure", "St. Bonaventure"),
    ("saint bonaventure", "St. Bonaventure"),
    ("st bonnies", "St. Bonaventure"),
    ("st peters", "Saint Peter's"),
    ("saint peters", "Saint Peter's"),
    ("st thomas", "St. Thomas (MN)"),
    ("saint thomas", "St. Thomas (MN)"),
    ("st thomas mn", "St. Thomas (MN)"),

    // Loyolas
    ("loyola", "Loyola Chicago"),
    ("loyola chi", "Loyola Chicago"),
    ("loyola il", "Loyola Chicago"),
    ("loyola md", "Loyola Maryland"),
    ("loyola marymount", "Loyola Marymount"),
    ("lmu", "Loyola Marymount"),

    // California systems
    ("ucla", "UCLA"),
    ("uc santa barbara", "UC Santa Barbara"),
    ("ucsb", "UC Santa Barbara"),
    ("uc irvine", "UC Irvine"),
    ("uci", "UC Irvine"),
    ("uc davis", "UC Davis"),
    ("ucd", "UC Davis"),
    ("uc riverside", "UC Riverside"),
    ("ucr", "UC Riverside"),
    ("uc san diego", "UC San Diego"),
    ("ucsd", "UC San Diego"),
    ("cal state fullerton", "Cal State Fullerton"),
    ("csuf", "Cal State Fullerton"),
    ("cal state bakersfield", "Cal State Bakersfield"),
    ("csub", "Cal State Bakersfield"),
    ("bakersfield", "Cal State Bakersfield"),
    ("cal state northridge", "CSUN"),
    ("csun", "CSUN"),
    ("northridge", "CSUN"),
    ("san diego st", "San Diego State"),
    ("san jose st", "San Jose State"),
    ("sjsu", "San Jose State"),

    // Mid-major acronyms, Florida schools
    ("virginia commonwealth", "VCU"),
    ("central florida", "UCF"),
    ("nevada las vegas", "UNLV"),
    ("florida international", "FIU"),
    ("fiu", "FIU"),
    ("florida atlantic", "FAU"),
    ("fau", "FAU"),
    ("florida gulf coast", "FGCU"),
    ("fla gulf coast", "FGCU"),
    ("fgcu", "FGCU"),
    ("south florida", "South Florida"),
    ("usf", "South Florida"),

    // UNC / UT / Texas A&M systems
    ("unc wilmington", "UNCW"),
    ("uncw", "UNCW"),
    ("unc greensboro", "UNCG"),
    ("uncg", "UNCG"),
    ("unc asheville", "UNC Asheville"),
    ("unca", "UNC Asheville"),
    ("texas el paso", "UTEP"),
    ("texas san antonio", "UTSA"),
    ("ut arlington", "UT Arlington"),
    ("uta", "UT Arlington"),
    ("ut rio grande valley", "UTRGV"),
    ("texas pan american", "UTRGV"),
    ("utrgv", "UTRGV"),
    ("texas a m cc", "Texas A&M-Corpus Christi"),
    ("texas am cc", "Texas A&M-Corpus Christi"),
    ("tamucc", "Texas A&M-Corpus Christi"),
    ("texas a m corpus christi", "Texas A&M-Corpus Christi"),
    ("alabama birmingham", "UAB"),
    ("illinois chicago", "UIC"),

    // Rebrands and renamed programs
    ("iupui", "IU Indianapolis"),
    ("indiana purdue indianapolis", "IU Indianapolis"),
    ("iu indy", "IU Indianapolis"),
    ("dixie state", "Utah Tech"),
    ("ipfw", "Purdue Fort Wayne"),
    ("fort wayne", "Purdue Fort Wayne"),
    ("ualr", "Little Rock"),
    ("arkansas little rock", "Little Rock"),
    ("ark little rock", "Little Rock"),
    ("nebraska omaha", "Omaha"),
    ("uno", "Omaha"),
    ("liu brooklyn", "LIU"),
    ("long island", "LIU"),
    ("mass lowell", "UMass Lowell"),
    ("uml", "UMass Lowell"),
    ("suny albany", "UAlbany"),
    ("albany", "UAlbany"),

    // Directionals and regional variants
    ("louisiana lafayette", "Louisiana"),
    ("ul lafayette", "Louisiana"),
    ("ull", "Louisiana"),
    ("louisiana monroe", "ULM"),
    ("ul monroe", "ULM"),
    ("ulm", "ULM"),
    ("western mich", "Western Michigan"),
    ("wmu", "Western Michigan"),
    ("central mich", "Central Michigan"),
    ("cmu", "Central Michigan"),
    ("eastern mich", "Eastern Michigan"),
    ("emu", "Eastern Michigan"),
    ("northern ill", "Northern Illinois"),
    ("niu", "Northern Illinois"),
    ("southern ill", "Southern Illinois"),
    ("siu", "Southern Illinois"),
    ("southern illinois edwardsville", "SIU Edwardsville"),
    ("siue", "SIU Edwardsville"),
    ("wisconsin green bay", "Green Bay"),
    ("uwgb", "Green Bay"),
    ("wisconsin milwaukee", "Milwaukee"),
    ("uwm", "Milwaukee"),
    ("missouri kansas city", "Kansas City"),
    ("umkc", "Kansas City"),
    ("col of charleston", "College of Charleston"),
    ("charleston", "College of Charleston"),
    ("cofc", "College of Charleston"),
    ("stephen f austin", "Stephen F. Austin"),
    ("sfa", "Stephen F. Austin"),
    ("detroit", "Detroit Mercy"),
    ("udm", "Detroit Mercy"),
    ("bowling green", "Bowling Green"),
    ("bgsu", "Bowling Green"),
    ("middle tenn", "Middle Tennessee"),
    ("mtsu", "Middle Tennessee"),
    ("east tennessee state", "ETSU"),
    ("southern miss", "Southern Miss"),
    ("usm", "Southern Miss"),
    ("north carolina a t", "North Carolina A&T"),
    ("nc a t", "North Carolina A&T"),
    ("ncat", "North Carolina A&T"),
    ("north carolina central", "North Carolina Central"),
    ("nccu", "North Carolina Central"),
];

/// Alias file format, accepted in either shape
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AliasFileFormat {
    Wrapped { aliases: HashMap<String, String> },
    Flat(HashMap<String, String>),
}

/// Lookup table from normalized alternate spelling to canonical display name
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<Box<str>, Box<str>>,
}

impl AliasTable {
    /// Table holding only the compiled-in aliases
    pub fn builtin() -> Self {
        let mut entries = HashMap::with_capacity(DEFAULT_ALIASES.len());
        for (alias, canonical) in DEFAULT_ALIASES {
            entries.insert((*alias).into(), (*canonical).into());
        }
        Self { entries }
    }

    /// Built-in aliases, plus `TEAM_ALIASES_FILE` if set.
    ///
    /// A missing or unreadable file is logged and ignored.
    pub fn from_env() -> Self {
        match std::env::var("TEAM_ALIASES_FILE") {
            Ok(path) if !path.trim().is_empty() => match Self::load_from(&path) {
                Ok(table) => table,
                Err(e) => {
                    warn!("Failed to load alias file {}: {:#}", path, e);
                    Self::builtin()
                }
            },
            _ => Self::builtin(),
        }
    }

    /// Built-in aliases with the entries of a JSON file merged over them
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading alias file {:?}", path))?;
        let extra = match serde_json::from_str::<AliasFileFormat>(&contents)
            .with_context(|| format!("parsing alias file {:?}", path))?
        {
            AliasFileFormat::Wrapped { aliases } => aliases,
            AliasFileFormat::Flat(aliases) => aliases,
        };

        let mut table = Self::builtin();
        let mut merged = 0usize;
        for (alias, canonical) in extra {
            if table.insert(&alias, &canonical) {
                merged += 1;
            }
        }
        info!(
            "Merged {} aliases from {:?} ({} total)",
            merged,
            path,
            table.len()
        );
        Ok(table)
    }

    /// Add or replace an alias. The alias is normalized first; returns false
    /// (and leaves the table unchanged) if either side is blank or the alias
    /// normalizes to nothing.
    pub fn insert(&mut self, alias: &str, canonical: &str) -> bool {
        if canonical.trim().is_empty() {
            debug!("Skipping alias {:?}: empty canonical name", alias);
            return false;
        }
        let key = match normalize(alias) {
            Ok(key) if !key.is_empty() => key,
            _ => {
                debug!("Skipping alias {:?}: does not normalize to a key", alias);
                return false;
            }
        };
        self.entries
            .insert(key.into_boxed_str(), canonical.trim().into());
        true
    }

    /// Canonical display name for an already-normalized key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
