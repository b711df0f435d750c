use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::language::Language;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};
use crate::core::error::{Error, Result};
use crate::schema::schema::Schema;

/// Text analysis pipeline
pub struct Analyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
    pub name: String,
}

impl Analyzer {
    pub fn new(name: String, tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            tokenizer,
            filters: Vec::new(),
            name,
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = self.tokenizer.tokenize(text);

        for filter in &self.filters {
            if tokens.is_empty() {
                break;
            }
            tokens = filter.filter(tokens);
        }

        tokens
    }

    /// Full-text chain: words, lowercased, stop words removed where the
    /// language has a list, stemmed for the language when a stemmer exists.
    pub fn standard(lang: Language) -> Self {
        let mut analyzer = Analyzer::new(
            format!("standard_{}", lang.code()),
            Box::new(StandardTokenizer::default()),
        )
        .add_filter(Box::new(LowercaseFilter));

        if let Some(stop_words) = StopWordFilter::for_language(lang) {
            analyzer = analyzer.add_filter(Box::new(stop_words));
        }
        if let Some(algorithm) = lang.stemmer() {
            analyzer = analyzer.add_filter(Box::new(StemmerFilter::new(algorithm)));
        }
        analyzer
    }

    /// Words lowercased, no stemming.
    pub fn text(_lang: Language) -> Self {
        Analyzer::new("text".to_string(), Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(LowercaseFilter))
    }
}

pub type AnalyzerFactory = fn(Language) -> Analyzer;

/// Registry of named analyzers, built per language on first use
pub struct AnalyzerRegistry {
    factories: RwLock<HashMap<String, AnalyzerFactory>>,
    built: RwLock<HashMap<(String, Language), Arc<Analyzer>>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        let registry = AnalyzerRegistry {
            factories: RwLock::new(HashMap::new()),
            built: RwLock::new(HashMap::new()),
        };
        registry.register("standard", Analyzer::standard);
        registry.register("text", Analyzer::text);
        registry
    }

    /// Registers (or replaces) a factory; analyzers already built under
    /// that name are dropped.
    pub fn register(&self, name: &str, factory: AnalyzerFactory) {
        self.factories.write().insert(name.to_string(), factory);
        self.built.write().retain(|(built_name, _), _| built_name != name);
    }

    pub fn get(&self, name: &str, lang: Language) -> Result<Arc<Analyzer>> {
        let key = (name.to_string(), lang);
        if let Some(analyzer) = self.built.read().get(&key) {
            return Ok(analyzer.clone());
        }

        let factory = self.factories
            .read()
            .get(name)
            .copied()
            .ok_or_else(|| Error::AnalyzerNotFound(name.to_string()))?;

        let mut built = self.built.write();
        let analyzer = built.entry(key).or_insert_with(|| Arc::new(factory(lang)));
        Ok(analyzer.clone())
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyzer chains of every schema field, resolved for one language.
///
/// A field without a chain is a keyword field: a non-empty value is indexed
/// as a single term.
#[derive(Clone, Default)]
pub struct PerFieldAnalyzer {
    pub lang: Language,
    fields: HashMap<String, Arc<Analyzer>>,
}

impl PerFieldAnalyzer {
    pub fn new(lang: Language) -> Self {
        PerFieldAnalyzer {
            lang,
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, field: &str, analyzer: Arc<Analyzer>) -> Self {
        self.fields.insert(field.to_string(), analyzer);
        self
    }

    pub fn analyzer(&self, field: &str) -> Option<&Arc<Analyzer>> {
        self.fields.get(field)
    }

    /// Terms a value of `field` indexes to.
    pub fn terms(&self, field: &str, value: &str) -> Vec<String> {
        match self.fields.get(field) {
            Some(analyzer) => analyzer
                .analyze(value)
                .into_iter()
                .map(|token| token.text)
                .collect(),
            None if value.is_empty() => Vec::new(),
            None => vec![value.to_string()],
        }
    }

    /// Whether indexing `value` into `field` would produce at least one term.
    pub fn is_any_token(&self, field: &str, value: &str) -> bool {
        match self.fields.get(field) {
            Some(analyzer) => !analyzer.analyze(value).is_empty(),
            None => !value.is_empty(),
        }
    }
}

/// Turns a document language into the analyzer chains of the write path.
pub trait AnalyzerResolver: Send + Sync {
    fn resolve(&self, lang: Language) -> Result<PerFieldAnalyzer>;
}

/// Resolves each schema field's declared analyzer through a registry.
pub struct SchemaAnalyzers {
    schema: Arc<Schema>,
    registry: Arc<AnalyzerRegistry>,
}

impl SchemaAnalyzers {
    pub fn new(schema: Arc<Schema>, registry: Arc<AnalyzerRegistry>) -> Self {
        SchemaAnalyzers { schema, registry }
    }
}

impl AnalyzerResolver for SchemaAnalyzers {
    fn resolve(&self, lang: Language) -> Result<PerFieldAnalyzer> {
        let mut per_field = PerFieldAnalyzer::new(lang);
        for field in self.schema.fields() {
            if let Some(name) = &field.analyzer {
                per_field = per_field.with_field(&field.name, self.registry.get(name, lang)?);
            }
        }
        Ok(per_field)
    }
}
