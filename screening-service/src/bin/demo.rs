//! Demo: screen one subject end to end against an in-memory list source

use match_engine::{CandidateRecord, Category, Subject, SubjectKind};
use screening_service::{ListSource, ScreeningConfig, ScreeningService, SourceRegistry};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let source = Arc::new(ListSource::new());
    source.load_records(
        Category::Sanction,
        vec![CandidateRecord {
            name: "Maria Otaibi".to_string(),
            alias_names: vec!["M. Otaibi".to_string()],
            countries: vec!["SA".to_string()],
            category: Category::Sanction,
            source_id: "DEMO-SDN-001".to_string(),
            pep_role: None,
            raw: json!({"listed": "2019-04-02"}),
        }],
    );
    source.load_records(
        Category::Pep,
        vec![CandidateRecord {
            name: "Maria Al Otaibi".to_string(),
            alias_names: vec![],
            countries: vec!["SA".to_string()],
            category: Category::Pep,
            source_id: "DEMO-PEP-014".to_string(),
            pep_role: None,
            raw: json!({"position": "Deputy Minister"}),
        }],
    );

    let service = ScreeningService::start(
        ScreeningConfig::default(),
        SourceRegistry::single(source),
    )?;

    let subject = Subject::new("Maria Al-Otaibi", SubjectKind::Individual)?.with_country("SA");
    let job_id = service.create_job(subject).await?;
    println!("Created screening job {}", job_id);

    loop {
        let job = service.get_status(job_id).await?;
        println!(
            "[{:>3}%] {:?} current_step={:?}",
            job.progress_percent, job.status, job.current_step
        );
        if job.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let result = service.get_result(job_id).await?;
    println!(
        "Risk: {} (score {}), factors: {:?}",
        result.assessment.level, result.assessment.score, result.assessment.factors
    );
    println!("{}", serde_json::to_string_pretty(&result.report)?);

    service.shutdown().await?;
    Ok(())
}
