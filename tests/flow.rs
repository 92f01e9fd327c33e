//! End-to-end runs of the answer-refinement workflow against mock
//! collaborators, counting every completion call.

use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use svarflyt::collaborators::{
    CollaboratorError, Passage, RetrievalOutcome, Retriever, TextCompleter,
};
use svarflyt::flow::readability::{NO_IMPROVEMENT_FEEDBACK, lix_score};
use svarflyt::flow::validate::rejection_reply;
use svarflyt::flow::{AnswerFlow, FlowSettings};
use svarflyt::runtime::{EventBusConfig, RunnerError, RuntimeConfig, SinkConfig};
use svarflyt::scheduler::SchedulerError;
use svarflyt::state::{Readability, ReadabilityBand, Verdict};

const SIMPLE_ANSWER: &str = "Kort tekst. Enkel sak.";
const COMPLEX_ANSWER: &str = "kompliserte akademiske formuleringer.";
const INDEX_DESCRIPTION: &str = "Indeksen dekker personvern og GDPR";

struct FixedRetriever {
    outcome: RetrievalOutcome,
}

impl FixedRetriever {
    fn accepted(answer: &str) -> Self {
        Self {
            outcome: RetrievalOutcome {
                answer: answer.to_string(),
                passages: vec![
                    Passage::new(Some(0.92), "t1")
                        .with_title("Kilde A")
                        .with_url("https://example.org/a"),
                    Passage::new(Some(0.45), "t2")
                        .with_title("Under cutoff")
                        .with_url("https://example.org/b"),
                    Passage::new(Some(0.81), "t3")
                        .with_title("Kilde B")
                        .with_url("https://example.org/c"),
                ],
            },
        }
    }

    fn rejected() -> Self {
        Self {
            outcome: RetrievalOutcome {
                answer: "Fant ingenting relevant.".to_string(),
                passages: vec![Passage::new(Some(0.31), "svakt treff")],
            },
        }
    }
}

#[async_trait]
impl Retriever for FixedRetriever {
    async fn query(&self, _query: &str) -> Result<RetrievalOutcome, CollaboratorError> {
        Ok(self.outcome.clone())
    }
}

struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    async fn query(&self, _query: &str) -> Result<RetrievalOutcome, CollaboratorError> {
        Err(CollaboratorError::retrieval("index unreachable"))
    }
}

/// Completer that dispatches on prompt prefix and counts every call.
struct CountingCompleter {
    title_calls: AtomicUsize,
    summary_calls: AtomicUsize,
    rewrite_calls: AtomicUsize,
    rewrite_result: String,
}

impl CountingCompleter {
    fn new(rewrite_result: &str) -> Arc<Self> {
        Arc::new(Self {
            title_calls: AtomicUsize::new(0),
            summary_calls: AtomicUsize::new(0),
            rewrite_calls: AtomicUsize::new(0),
            rewrite_result: rewrite_result.to_string(),
        })
    }

    fn counts(&self) -> (usize, usize, usize) {
        (
            self.title_calls.load(Ordering::SeqCst),
            self.summary_calls.load(Ordering::SeqCst),
            self.rewrite_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl TextCompleter for CountingCompleter {
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
        if prompt.starts_with("Give a title") {
            self.title_calls.fetch_add(1, Ordering::SeqCst);
            Ok("Tittel".to_string())
        } else if prompt.starts_with("Please provide a summary") {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            Ok("Sammendrag.".to_string())
        } else if prompt.starts_with("Improve readability") {
            self.rewrite_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rewrite_result.clone())
        } else {
            Err(CollaboratorError::completion(format!(
                "unexpected prompt: {prompt}"
            )))
        }
    }
}

fn settings() -> FlowSettings {
    FlowSettings::default()
        .with_index_description(INDEX_DESCRIPTION)
        .with_runtime(RuntimeConfig::default().with_event_bus(EventBusConfig {
            sinks: vec![SinkConfig::Memory],
        }))
}

fn flow(
    retriever: impl Retriever + 'static,
    completer: Arc<CountingCompleter>,
    settings: FlowSettings,
) -> AnswerFlow {
    AnswerFlow::new(Arc::new(retriever), completer, settings).unwrap()
}

#[tokio::test]
async fn accepted_readable_answer_skips_the_rewrite_loop() {
    let completer = CountingCompleter::new(SIMPLE_ANSWER);
    let flow = flow(
        FixedRetriever::accepted(SIMPLE_ANSWER),
        completer.clone(),
        settings(),
    );

    let state = flow.run("Hva er GDPR?").await.unwrap();

    assert_eq!(state.validation, Some(Verdict::Accepted));
    assert_eq!(state.readable, Some(Readability::Readable));
    assert_eq!(state.rewrite_passes, 0);
    assert_eq!(state.feedback, NO_IMPROVEMENT_FEEDBACK);
    assert_eq!(completer.counts(), (1, 1, 0));

    let markdown = state.structured_answer.unwrap();
    assert!(markdown.starts_with("# Oppsummering av spørsmålet\n\n"));
    assert!(markdown.contains("## Tittel\nTittel\n\n"));
    assert!(markdown.contains("## Kort sammendrag av spørsmålet\nSammendrag.\n\n"));
    assert!(markdown.contains(&format!("## Lettlest svar\n{SIMPLE_ANSWER}\n\n")));
}

#[tokio::test]
async fn references_keep_passage_order_and_respect_the_cutoff() {
    let completer = CountingCompleter::new(SIMPLE_ANSWER);
    let flow = flow(
        FixedRetriever::accepted(SIMPLE_ANSWER),
        completer,
        settings(),
    );

    let state = flow.run("Hva er GDPR?").await.unwrap();

    let names: Vec<_> = state
        .references
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["Kilde A", "Kilde B"]);

    let markdown = state.structured_answer.unwrap();
    assert!(markdown.contains(
        "## Referanser\n- [Kilde A](https://example.org/a) (Relevans: 0.92)\n\
         - [Kilde B](https://example.org/c) (Relevans: 0.81)\n"
    ));
}

#[tokio::test]
async fn unreadable_answer_is_rewritten_once_when_the_rewrite_reads_well() {
    let completer = CountingCompleter::new(SIMPLE_ANSWER);
    let flow = flow(
        FixedRetriever::accepted(COMPLEX_ANSWER),
        completer.clone(),
        settings(),
    );

    let state = flow.run("Hva er GDPR?").await.unwrap();

    assert_eq!(state.rewrite_passes, 1);
    assert_eq!(state.readable, Some(Readability::Readable));
    assert_eq!(state.answer, SIMPLE_ANSWER);
    assert_eq!(completer.counts(), (1, 1, 1));
    assert!(
        state
            .structured_answer
            .unwrap()
            .contains(&format!("## Lettlest svar\n{SIMPLE_ANSWER}\n\n"))
    );
}

#[tokio::test]
async fn rewrite_loop_stops_at_the_configured_cap() {
    // The rewrite never improves, so the cap is what ends the loop.
    let completer = CountingCompleter::new(COMPLEX_ANSWER);
    let flow = flow(
        FixedRetriever::accepted(COMPLEX_ANSWER),
        completer.clone(),
        settings().with_max_rewrite_passes(Some(2)),
    );

    let state = flow.run("Hva er GDPR?").await.unwrap();

    assert_eq!(state.rewrite_passes, 2);
    assert_eq!(state.readable, Some(Readability::NotReadable));
    assert_eq!(completer.counts().2, 2);
    // The run still completes with a structured answer.
    assert!(
        state
            .structured_answer
            .unwrap()
            .contains(&format!("## Lettlest svar\n{COMPLEX_ANSWER}\n\n"))
    );
}

#[tokio::test]
async fn rejected_retrieval_yields_exactly_the_apology() {
    let completer = CountingCompleter::new(SIMPLE_ANSWER);
    let flow = flow(FixedRetriever::rejected(), completer.clone(), settings());

    let state = flow.run("Hvordan baker jeg boller?").await.unwrap();

    assert_eq!(state.validation, Some(Verdict::Rejected));
    assert_eq!(
        state.structured_answer,
        Some(rejection_reply(INDEX_DESCRIPTION))
    );
    // None of the enrichment branch runs on rejection.
    assert_eq!(completer.counts(), (0, 0, 0));
    assert!(state.references.is_empty());
    assert_eq!(state.title, "");
}

#[tokio::test]
async fn retriever_failure_is_an_error_not_a_rejection() {
    let completer = CountingCompleter::new(SIMPLE_ANSWER);
    let flow = AnswerFlow::new(Arc::new(FailingRetriever), completer, settings()).unwrap();

    let err = flow.run("Hva er GDPR?").await.unwrap_err();
    assert!(matches!(
        err,
        RunnerError::Scheduler(SchedulerError::NodeRun { .. })
    ));
}

#[tokio::test]
async fn answer_returns_just_the_markdown() {
    let completer = CountingCompleter::new(SIMPLE_ANSWER);
    let flow = flow(
        FixedRetriever::accepted(SIMPLE_ANSWER),
        completer,
        settings(),
    );

    let markdown = flow.answer("Hva er GDPR?").await.unwrap();
    assert!(markdown.starts_with("# Oppsummering av spørsmålet"));
}

proptest! {
    #[test]
    fn lix_score_is_finite_and_positive(text in ".{0,200}") {
        let score = lix_score(&text);
        prop_assert!(score.is_finite());
        prop_assert!(score > 0.0);
    }

    #[test]
    fn every_score_maps_to_a_labeled_band(score in 0.0f64..200.0) {
        let band = ReadabilityBand::for_score(score);
        prop_assert!(!band.label().is_empty());
    }
}
