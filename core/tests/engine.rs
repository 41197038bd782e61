use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use rwg_core::{
    Analyzer, Config, Edit, JsonLinesStore, Session, SuggestionBook, SuggestionRecord,
    SuggestionStore,
};

const DOC: &str = "치료는 치료다. 이 치료는 길다.";

const ARTICLE: &str = "김해adhd 클리닉은 김해 지역 아동의 adhd 치료를 돕습니다.\n\
adhd 치료는 꾸준한 상담이 중요합니다! 김해adhd 클리닉에서 상담을 받으세요.\n\
치료 기간은 얼마나 걸릴까요? 상담 후에 치료 계획을 세웁니다.";

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let mut dir = std::env::temp_dir();
        let unique = format!(
            "{prefix}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        dir.push(unique);
        fs::create_dir_all(&dir).expect("create temp dir");
        Self { path: dir }
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn analyzer() -> Analyzer {
    Analyzer::new(Config::default()).unwrap()
}

fn analyze(text: &str) -> rwg_core::FrequencyReport {
    analyzer().analyze(text, &HashSet::new())
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn worked_example_counts_and_highlights() {
    let a = analyzer();
    let report = a.analyze(DOC, &HashSet::new());
    assert_eq!(report.count("치료"), 3);
    assert!(report.is_target("치료"));

    let annotated = a.annotate(DOC, &report.targets);
    let ordinals: Vec<usize> = annotated.occurrences_of("치료").map(|o| o.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2]);
}

#[test]
fn worked_example_edits() {
    let a = analyzer();
    assert_eq!(
        a.replace_occurrence(DOC, "치료", 1, "관리"),
        "치료는 관리다. 이 치료는 길다."
    );

    let sentence = a.extract_sentence(DOC, "치료", 2).expect("third occurrence");
    assert_eq!(sentence.text, "이 치료는 길다.");
    let expected_start = DOC.find(" 이").unwrap();
    assert_eq!(sentence.start, expected_start);
    assert_eq!(sentence.end, DOC.len());
}

#[test]
fn counts_match_independent_substring_search() {
    let report = analyze(ARTICLE);
    assert!(!report.counts.is_empty());
    for (head, count) in &report.counts {
        let independent = ARTICLE.matches(head.as_str()).count();
        assert_eq!(
            *count, independent,
            "count for {head:?} disagrees with substring search"
        );
    }
}

#[test]
fn headwords_respect_length_and_stopword_invariants() {
    let cfg = Config::default();
    let report = analyze(ARTICLE);
    for head in report.counts.keys() {
        assert!(head.chars().count() >= 2, "short headword {head:?}");
        assert!(!cfg.stopwords.contains(head), "stopword headword {head:?}");
    }
}

#[test]
fn nested_targets_do_not_corrupt_annotation() {
    let a = analyzer();
    let report = a.analyze(ARTICLE, &HashSet::new());
    assert!(report.is_target("김해adhd"));
    assert!(report.is_target("adhd"));

    let annotated = a.annotate(ARTICLE, &report.targets);
    assert_eq!(annotated.source_text(), ARTICLE);
    for occ in annotated.occurrences() {
        assert_eq!(&ARTICLE[occ.start..occ.end], occ.word);
    }
    let nested: Vec<_> = annotated.occurrences_of("김해adhd").collect();
    assert_eq!(nested.len(), 2);
    // "adhd" inside "김해adhd" is consumed by the longer target.
    assert_eq!(annotated.occurrences_of("adhd").count(), 2);
}

#[test]
fn annotation_round_trips_for_many_target_sets() {
    let a = analyzer();
    let sets = [
        words(&[]),
        words(&["치료"]),
        words(&["치료", "치료는", "료"]),
        words(&["adhd", "김해adhd", "김해", "d"]),
        words(&["상담", "상담을", "담"]),
        words(&["없는단어"]),
    ];
    for targets in &sets {
        let annotated = a.annotate(ARTICLE, targets);
        assert_eq!(annotated.source_text(), ARTICLE, "targets {targets:?}");
        let mut last_end = 0;
        for occ in annotated.occurrences() {
            assert!(occ.start >= last_end, "overlap for targets {targets:?}");
            last_end = occ.end;
        }
        for target in targets {
            let ordinals: Vec<usize> = annotated
                .occurrences_of(target)
                .map(|o| o.ordinal)
                .collect();
            let expected: Vec<usize> = (0..ordinals.len()).collect();
            assert_eq!(ordinals, expected, "ordinals for {target:?}");
        }
    }
}

#[test]
fn filtered_annotation_keeps_ordinals() {
    let a = analyzer();
    let targets = words(&["김해adhd", "adhd", "치료"]);
    let full = a.annotate(ARTICLE, &targets);
    let filtered = a.annotate_only(ARTICLE, &targets, "치료");
    let full_ordinals: Vec<usize> = full.occurrences_of("치료").map(|o| o.ordinal).collect();
    let filtered_ordinals: Vec<usize> = filtered.occurrences().map(|o| o.ordinal).collect();
    assert_eq!(full_ordinals, filtered_ordinals);
    assert_eq!(filtered.source_text(), ARTICLE);
}

#[test]
fn out_of_range_ordinal_leaves_text_unchanged() {
    let a = analyzer();
    let count = ARTICLE.matches("상담").count();
    for ordinal in count..count + 3 {
        assert_eq!(a.replace_occurrence(ARTICLE, "상담", ordinal, "면담"), ARTICLE);
        assert!(a.extract_sentence(ARTICLE, "상담", ordinal).is_none());
    }
}

#[test]
fn sentence_extraction_stops_at_newline_and_question_mark() {
    let a = analyzer();
    let sentence = a.extract_sentence(ARTICLE, "치료", 2).expect("third 치료");
    assert_eq!(sentence.text, "치료 기간은 얼마나 걸릴까요?");
    let sentence = a.extract_sentence(ARTICLE, "치료", 0).expect("first 치료");
    assert_eq!(
        sentence.text,
        "김해adhd 클리닉은 김해 지역 아동의 adhd 치료를 돕습니다."
    );
}

#[test]
fn nested_target_edits_address_highlighted_spans() {
    let a = analyzer();
    let book = SuggestionBook::default();
    let mut session = Session::new(ARTICLE);
    let view = session.view(&a, &book);
    let spans: Vec<_> = view.annotated.occurrences_of("adhd").cloned().collect();
    assert_eq!(spans.len(), 2);

    // Replace the highlighted occurrences last-first so earlier spans stay valid.
    for occ in spans.iter().rev() {
        session = session.apply(
            &a,
            &book,
            &Edit::Occurrence {
                word: occ.word.clone(),
                ordinal: occ.ordinal,
                replacement: "ADHD".into(),
            },
        );
    }
    assert_eq!(session.text().matches("김해adhd").count(), 2);
    assert_eq!(session.text().matches("ADHD").count(), 2);
    for occ in &spans {
        assert_eq!(&session.text()[occ.start..occ.end], "ADHD");
    }
}

#[test]
fn json_lines_store_round_trip_feeds_targets() {
    let tmp = TempDir::new("rwg-store");
    let path = tmp.path.join("nested/suggestions.jsonl");
    let a = analyzer();
    let mut store = JsonLinesStore::new(&path);

    assert!(SuggestionBook::load(&store).is_empty());

    let key =
        rwg_core::suggest::propose(&mut store, a.normalizer(), "길다.", "짧지 않다").unwrap();
    assert_eq!(key, "길다");
    store
        .append(SuggestionRecord::new("길다", "오래 걸린다"))
        .unwrap();

    let book = SuggestionBook::load(&store);
    assert_eq!(book.lookup("길다"), ["짧지 않다", "오래 걸린다"]);

    let view = Session::new(DOC).view(&a, &book);
    assert!(view.report.is_target("길다"));
}

#[test]
fn malformed_store_degrades_to_empty_book() {
    let tmp = TempDir::new("rwg-store-bad");
    let path = tmp.path.join("suggestions.jsonl");
    fs::write(
        &path,
        "{\"target_word\":\"치료\",\"replace_word\":\"관리\"}\nnot json\n",
    )
    .unwrap();
    let store = JsonLinesStore::new(&path);
    assert!(store.records().is_err());
    assert!(SuggestionBook::load(&store).is_empty());
}

#[test]
fn session_loop_recomputes_after_each_edit() {
    let a = analyzer();
    // Keep the word highlighted even once its count falls under the threshold.
    let book = SuggestionBook::from_records(&[SuggestionRecord::new("치료", "관리")]);
    let mut session = Session::new(ARTICLE);
    let initial = session.view(&a, &book).report.count("치료");
    assert!(initial >= 4);

    for _ in 0..initial {
        let view = session.view(&a, &book);
        let Some(first) = view.annotated.locate("치료", 0).cloned() else {
            break;
        };
        session = session.select(first.word.clone(), first.ordinal);
        session = session.apply(
            &a,
            &book,
            &Edit::Occurrence {
                word: first.word,
                ordinal: first.ordinal,
                replacement: "관리".into(),
            },
        );
    }
    let view = session.view(&a, &book);
    assert_eq!(view.report.count("치료"), 0);
    assert!(!view.report.is_target("치료"));
}
