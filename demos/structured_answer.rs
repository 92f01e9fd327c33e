//! End-to-end demonstration of the answer-refinement workflow.
//!
//! Runs two queries against canned collaborators: one whose retrieval
//! clears the similarity cutoff (accepted, enriched, readability-checked)
//! and one that misses it (rejected with the Norwegian apology). No real
//! index or model is required.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use svarflyt::collaborators::{
    CollaboratorError, Passage, RetrievalOutcome, Retriever, TextCompleter,
};
use svarflyt::flow::{AnswerFlow, FlowSettings};

/// Retriever returning fixed passages; relevance depends on the query.
struct CannedIndex;

#[async_trait]
impl Retriever for CannedIndex {
    async fn query(&self, query: &str) -> Result<RetrievalOutcome, CollaboratorError> {
        if query.contains("GDPR") {
            Ok(RetrievalOutcome {
                answer: "Personvernforordningen representerer omfattende reguleringsbestemmelser \
                         angående behandlingsgrunnlag, informasjonssikkerhet og dokumentasjonskrav."
                    .to_string(),
                passages: vec![
                    Passage::new(Some(0.92), "GDPR-oversikt")
                        .with_title("Hva er GDPR?")
                        .with_url("https://example.org/gdpr"),
                    Passage::new(Some(0.81), "Behandlingsgrunnlag")
                        .with_title("  Behandlingsgrunnlag")
                        .with_url("https://example.org/grunnlag"),
                    Passage::new(Some(0.42), "Lite relevant avsnitt"),
                ],
            })
        } else {
            Ok(RetrievalOutcome {
                answer: "Fant ingenting relevant.".to_string(),
                passages: vec![Passage::new(Some(0.31), "Svakt treff")],
            })
        }
    }
}

/// Completer with just enough behavior to drive every prompt in the flow.
struct CannedModel;

#[async_trait]
impl TextCompleter for CannedModel {
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
        if prompt.starts_with("Give a title") {
            Ok("Spørsmål om GDPR".to_string())
        } else if prompt.starts_with("Please provide a summary") {
            Ok("Jeg lurer på hva GDPR er.".to_string())
        } else if prompt.starts_with("Improve readability") {
            Ok("GDPR er regler om personvern. De gjelder i hele EU. Du har flere rettigheter."
                .to_string())
        } else {
            Err(CollaboratorError::completion(format!(
                "unexpected prompt: {prompt}"
            )))
        }
    }
}

async fn run_demo() -> miette::Result<()> {
    let flow = AnswerFlow::new(
        Arc::new(CannedIndex),
        Arc::new(CannedModel),
        FlowSettings::default()
            .with_index_description("Indeksen dekker personvern, GDPR og informasjonssikkerhet"),
    )?;

    info!("running accepted query");
    let accepted = flow.run("Hva er GDPR?").await.map_err(miette::Report::from)?;
    println!("\n--- accepted ---");
    println!("{}", accepted.structured_answer.clone().unwrap_or_default());
    println!(
        "(rewrite passes: {}, lix: {:?})",
        accepted.rewrite_passes,
        accepted.readability.map(|r| r.score)
    );

    info!("running rejected query");
    let rejected = flow
        .answer("Hvordan baker jeg boller?")
        .await
        .map_err(miette::Report::from)?;
    println!("\n--- rejected ---");
    println!("{rejected}");

    Ok(())
}

fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("error,svarflyt=info"))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing();
    miette::set_panic_hook();
    run_demo().await
}
