//! Definition and reference extraction
//!
//! Finds the object a file defines (`CREATE VIEW x` / `INSERT INTO x`) and
//! every object it reads from (`FROM x` / `JOIN x`).

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use viewtrace_core::{ConfigError, Identifier, Normalizer, QUOTE_CHARS};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// What one file contributes to the graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Object the file defines, if any
    pub definition: Option<Identifier>,

    /// Objects the definition reads from, never including itself
    pub dependencies: BTreeSet<Identifier>,
}

impl Extraction {
    pub fn is_definition(&self) -> bool {
        self.definition.is_some()
    }
}

/// Pattern-based extractor for view definition files
#[derive(Debug, Clone)]
pub struct DefinitionExtractor {
    normalizer: Normalizer,

    /// `create view <id>` or `insert into <id>`
    definition: Regex,

    /// `from <id>` or `join <id>`
    reference: Regex,
}

impl Default for DefinitionExtractor {
    fn default() -> Self {
        // The default delimiter always yields valid patterns.
        Self::new(Normalizer::default()).expect("default extractor patterns are valid")
    }
}

impl DefinitionExtractor {
    /// Create an extractor whose identifier grammar includes the
    /// normalizer's qualifier delimiter
    pub fn new(normalizer: Normalizer) -> Result<Self, ConfigError> {
        let token = identifier_token(normalizer.delimiter());

        let definition = Regex::new(&format!(r"\b(?:create\s+view|insert\s+into)\s+({token})"))
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        let reference = Regex::new(&format!(r"\b(?:from|join)\s+({token})"))
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        Ok(Self {
            normalizer,
            definition,
            reference,
        })
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Extract the definition and its references from one file's text
    ///
    /// Files without a `CREATE VIEW`/`INSERT INTO` statement yield an empty
    /// extraction, even if they contain `FROM` clauses. References are taken
    /// from the whole file, including text before the definition.
    pub fn extract(&self, text: &str) -> Extraction {
        let collapsed = collapse_whitespace(text).to_lowercase();

        let Some(captures) = self.definition.captures(&collapsed) else {
            return Extraction::default();
        };

        let defined = self.normalizer.normalize(&captures[1]);
        if defined.is_empty() {
            return Extraction::default();
        }

        let dependencies = self
            .reference
            .captures_iter(&collapsed)
            .map(|c| self.normalizer.normalize(&c[1]))
            .filter(|dep| !dep.is_empty() && *dep != defined)
            .collect();

        Extraction {
            definition: Some(defined),
            dependencies,
        }
    }
}

/// Replace every run of whitespace with a single space
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

/// Maximal run of word characters, dots, quotes and the qualifier delimiter
fn identifier_token(delimiter: char) -> String {
    let mut class = String::from(r"\w.");
    for c in QUOTE_CHARS.iter().chain(std::iter::once(&delimiter)) {
        class.push_str(&regex::escape(&c.to_string()));
    }
    format!("[{class}]+")
}
