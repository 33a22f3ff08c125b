use std::{
    borrow::Cow,
    collections::{BTreeMap, HashSet},
};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Dimension, DimensionScorer, ScoringContext, clamp_score};
use crate::{Candidate, Job};

const NEUTRAL: f64 = 50.0;
/// The corpus is always the pair being compared.
const CORPUS_SIZE: f64 = 2.0;

// Runs of two or more word characters.
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern compiles"));

static STOP_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// Bag-of-terms representation of one side of a pair.
///
/// Built once per entity; bulk runs reuse the anchor's document for every pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermDocument {
    blank: bool,
    counts: BTreeMap<String, u32>,
}

impl TermDocument {
    pub fn from_text(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let mut counts = BTreeMap::new();
        for token in TOKEN_RE.find_iter(&lowered) {
            let term = token.as_str();
            if STOP_WORDS.contains(term) {
                continue;
            }
            *counts.entry(term.to_string()).or_insert(0) += 1;
        }

        Self {
            blank: text.trim().is_empty(),
            counts,
        }
    }

    pub fn for_candidate(candidate: &Candidate) -> Self {
        Self::from_text(&candidate_text(candidate))
    }

    pub fn for_job(job: &Job) -> Self {
        Self::from_text(&job_text(job))
    }

    pub fn is_blank(&self) -> bool {
        self.blank
    }

    pub fn term_count(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}

/// Name, skills, education and years of experience.
pub fn candidate_text(candidate: &Candidate) -> String {
    format!(
        "{} {} {} {}",
        candidate.name,
        candidate.skills.join(" "),
        candidate.education,
        candidate.experience_years
    )
}

/// Title, description, required and preferred skills.
pub fn job_text(job: &Job) -> String {
    format!(
        "{} {} {} {}",
        job.title,
        job.description,
        job.required_skills.join(" "),
        job.preferred_skills.join(" ")
    )
}

/// Cosine similarity of smoothed TF-IDF vectors over the two-document corpus.
///
/// Returns `None` when the combined vocabulary is empty.
pub fn tfidf_cosine(a: &TermDocument, b: &TermDocument) -> Option<f64> {
    let vocabulary: Vec<&str> = {
        let mut terms: Vec<&str> = a.terms().chain(b.terms()).collect();
        terms.sort_unstable();
        terms.dedup();
        terms
    };
    if vocabulary.is_empty() {
        return None;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for term in vocabulary {
        let tf_a = a.term_count(term) as f64;
        let tf_b = b.term_count(term) as f64;
        let df = (tf_a > 0.0) as u8 as f64 + (tf_b > 0.0) as u8 as f64;
        let idf = ((1.0 + CORPUS_SIZE) / (1.0 + df)).ln() + 1.0;

        let wa = tf_a * idf;
        let wb = tf_b * idf;
        dot += wa * wb;
        norm_a += wa * wa;
        norm_b += wb * wb;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }

    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

pub fn score_documents(candidate: &TermDocument, job: &TermDocument) -> f64 {
    if candidate.is_blank() || job.is_blank() {
        return NEUTRAL;
    }

    match tfidf_cosine(candidate, job) {
        Some(similarity) => (similarity * 100.0).min(100.0),
        None => NEUTRAL,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticScorer;

impl DimensionScorer for SemanticScorer {
    fn dimension(&self) -> Dimension {
        Dimension::Semantic
    }

    fn score(&self, candidate: &Candidate, job: &Job, ctx: &ScoringContext<'_>) -> f64 {
        let candidate_doc = match ctx.candidate_document {
            Some(doc) => Cow::Borrowed(doc),
            None => Cow::Owned(TermDocument::for_candidate(candidate)),
        };
        let job_doc = match ctx.job_document {
            Some(doc) => Cow::Borrowed(doc),
            None => Cow::Owned(TermDocument::for_job(job)),
        };

        clamp_score(
            Dimension::Semantic,
            score_documents(&candidate_doc, &job_doc),
        )
    }
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or",
    "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part",
    "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together", "too",
    "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_drops_stop_words_and_short_tokens() {
        let doc = TermDocument::from_text("The Rust and the Tokio a b Rust, go");
        assert_eq!(doc.term_count("rust"), 2);
        assert_eq!(doc.term_count("tokio"), 1);
        assert_eq!(doc.term_count("the"), 0);
        assert_eq!(doc.term_count("go"), 0);
        assert_eq!(doc.term_count("b"), 0);
    }

    #[test]
    fn identical_documents_are_fully_similar() {
        let a = TermDocument::from_text("rust tokio postgres");
        let b = TermDocument::from_text("postgres tokio rust");
        let sim = tfidf_cosine(&a, &b).unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
        assert!((score_documents(&a, &b) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_documents_score_zero() {
        let a = TermDocument::from_text("rust tokio");
        let b = TermDocument::from_text("java spring");
        assert_eq!(score_documents(&a, &b), 0.0);
    }

    #[test]
    fn shared_terms_are_down_weighted_by_idf() {
        // rust shared (idf 1.0), tokio/spring unique (idf 1 + ln 1.5).
        let a = TermDocument::from_text("rust tokio");
        let b = TermDocument::from_text("rust spring");
        let unique = 1.0 + 1.5f64.ln();
        let expected = 1.0 / (1.0 + unique * unique);
        let sim = tfidf_cosine(&a, &b).unwrap();
        assert!((sim - expected).abs() < 1e-9);
    }

    #[test]
    fn blank_blob_is_neutral() {
        let blank = TermDocument::from_text("   ");
        let other = TermDocument::from_text("rust developer");
        assert_eq!(score_documents(&blank, &other), 50.0);
    }

    #[test]
    fn job_without_text_fields_is_neutral() {
        let candidate = Candidate {
            name: "Ada".into(),
            skills: vec!["rust".into()],
            ..Candidate::default()
        };
        let job = Job::default();
        assert!(TermDocument::for_job(&job).is_blank());
        assert_eq!(
            SemanticScorer.score(&candidate, &job, &ScoringContext::now()),
            50.0
        );
    }

    #[test]
    fn empty_vocabulary_is_neutral() {
        let a = TermDocument::from_text("the and of");
        let b = TermDocument::from_text("a an it");
        assert_eq!(score_documents(&a, &b), 50.0);
    }

    #[test]
    fn one_sided_vocabulary_scores_zero() {
        let a = TermDocument::from_text("the and of");
        let b = TermDocument::from_text("rust developer");
        assert_eq!(score_documents(&a, &b), 0.0);
    }

    #[test]
    fn cached_documents_match_fresh_computation() {
        let candidate = Candidate {
            name: "Ada".into(),
            skills: vec!["Rust".into(), "Postgres".into()],
            education: "Bachelor of Science".into(),
            experience_years: 6.0,
            ..Candidate::default()
        };
        let job = Job {
            title: "Backend Engineer".into(),
            description: "Rust services on Postgres".into(),
            required_skills: vec!["rust".into()],
            ..Job::default()
        };

        let fresh = SemanticScorer.score(&candidate, &job, &ScoringContext::now());

        let candidate_doc = TermDocument::for_candidate(&candidate);
        let job_doc = TermDocument::for_job(&job);
        let ctx = ScoringContext::now()
            .with_candidate_document(&candidate_doc)
            .with_job_document(&job_doc);
        let cached = SemanticScorer.score(&candidate, &job, &ctx);

        assert_eq!(fresh, cached);
        assert!(fresh > 0.0 && fresh < 100.0);
    }
}
