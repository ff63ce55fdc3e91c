use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use itertools::Itertools;
use rayon::prelude::*;
use wikimine::extract::{MatcherConfig, PhraseGatherer, StretchMatcher};
use wikimine::index::PhraseVocabulary;

const NB_SENTENCES: usize = 200;

// synthetic text: repeated sentences mixing known and unknown phrases
fn text() -> String {
    (0..NB_SENTENCES)
        .map(|i| {
            format!(
                "In {} the city of new york hosted the united nations general assembly [note {}]. ",
                1900 + i,
                i
            )
        })
        .join("")
}

fn vocabulary() -> Arc<PhraseVocabulary> {
    let phrases = [
        "new york",
        "new york city",
        "united nations",
        "united nations general assembly",
        "general assembly",
        "the city",
        "hosted",
    ];
    Arc::new(phrases.iter().collect())
}

pub fn stretch_matcher(c: &mut Criterion) {
    let text = text();
    let matcher = StretchMatcher::new(vocabulary(), MatcherConfig::default());
    c.bench_function("stretch matcher", |b| {
        b.iter(|| black_box(matcher.find(black_box(&text))))
    });
}

// one record per sentence, matched concurrently
pub fn stretch_matcher_par(c: &mut Criterion) {
    let text = text();
    let records: Vec<&str> = text.split(". ").collect();
    let matcher = StretchMatcher::new(vocabulary(), MatcherConfig::default());
    c.bench_function("stretch matcher par records", |b| {
        b.iter(|| {
            let found: usize = records.par_iter().map(|r| matcher.find(r).len()).sum();
            black_box(found)
        })
    });
}

pub fn phrase_gatherer(c: &mut Criterion) {
    let text = text();
    let gatherer = PhraseGatherer::default();
    c.bench_function("phrase gatherer", |b| {
        b.iter(|| black_box(gatherer.gather(black_box(&text))))
    });
}

criterion_group!(benches, stretch_matcher, stretch_matcher_par, phrase_gatherer);
criterion_main!(benches);
