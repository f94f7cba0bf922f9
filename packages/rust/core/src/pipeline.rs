//! End-to-end fill pipeline: form → fields → query map → answers → fill plan.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use formfill_forms::{FillPlan, FillStatus, FormSource};
use formfill_knowledge::{KnowledgeBase, RenderStyle};
use formfill_shared::{
    FieldAnswer, FieldDescriptor, FormFillError, QueryMap, Result, RunId,
};

use crate::mapping::MappingGenerator;

/// Configuration for [`run_fill`].
#[derive(Debug, Clone)]
pub struct FillConfig {
    /// Where to read the form from.
    pub form: FormSource,
    /// Knowledge base JSON file.
    pub knowledge_base: PathBuf,
}

/// Everything a run produced, written out as the run report.
#[derive(Debug, Clone, Serialize)]
pub struct FillReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub form_source: String,
    pub knowledge_base: String,
    /// Name of the mapping generator (model id or `static`).
    pub mapper: String,
    pub fields: Vec<FieldDescriptor>,
    pub query_map: QueryMap,
    pub answers: Vec<FieldAnswer>,
    pub plan: FillPlan,
    pub elapsed_ms: u64,
}

impl FillReport {
    /// Number of answers that resolved to data.
    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.found).count()
    }

    pub fn ready(&self) -> usize {
        self.plan.count(FillStatus::Ready)
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each field's query is resolved.
    fn field_resolved(&self, label: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &FillReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn field_resolved(&self, _label: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &FillReport) {}
}

/// Run the full fill pipeline.
///
/// 1. Load the form and scrape its fields
/// 2. Load the knowledge base
/// 3. Generate the query map
/// 4. Resolve every query
/// 5. Plan the fill
#[instrument(skip_all, fields(form = %config.form, mapper = mapper.name()))]
pub async fn run_fill<M: MappingGenerator>(
    config: &FillConfig,
    mapper: &M,
    progress: &dyn ProgressReporter,
) -> Result<FillReport> {
    let start = Instant::now();
    let run_id = RunId::new();
    let started_at = Utc::now();

    info!(%run_id, "starting fill run");

    // --- Phase 1: Form ---
    progress.phase("Scraping form fields");
    let html = formfill_forms::load_form_html(&config.form).await?;
    let fields = formfill_forms::scrape_form_fields(&html);
    if fields.is_empty() {
        return Err(FormFillError::validation(format!(
            "no fillable fields found in {}",
            config.form
        )));
    }

    // --- Phase 2: Knowledge base ---
    progress.phase("Loading knowledge base");
    let kb = KnowledgeBase::load(&config.knowledge_base);
    kb.validate();

    // --- Phase 3: Mapping ---
    progress.phase("Mapping fields to knowledge base");
    let query_map = mapper.generate(&fields, kb.schema()).await?;
    if query_map.is_empty() {
        warn!("query map is empty, no fields will be answered");
    }

    // --- Phase 4: Queries ---
    progress.phase("Resolving queries");
    let answers = execute_queries(&kb, &query_map, progress);

    // --- Phase 5: Plan ---
    progress.phase("Planning fill");
    let plan = formfill_forms::plan_fill(&fields, &answers);

    let report = FillReport {
        run_id,
        started_at,
        form_source: config.form.to_string(),
        knowledge_base: config.knowledge_base.display().to_string(),
        mapper: mapper.name().to_string(),
        fields,
        query_map,
        answers,
        plan,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        fields = report.fields.len(),
        answered = report.answered(),
        ready = report.ready(),
        elapsed_ms = report.elapsed_ms,
        "fill run complete"
    );

    progress.done(&report);
    Ok(report)
}

/// Resolve every mapping. A bad path only affects its own field.
pub fn execute_queries(
    kb: &KnowledgeBase,
    query_map: &QueryMap,
    progress: &dyn ProgressReporter,
) -> Vec<FieldAnswer> {
    let total = query_map.len();

    query_map
        .iter()
        .enumerate()
        .map(|(i, mapping)| {
            let resolution = kb.resolve(&mapping.path);
            let found = formfill_knowledge::is_answer(&resolution);
            let answer = formfill_knowledge::render(&resolution, RenderStyle::Compact);

            match &resolution {
                Ok(_) => info!(label = %mapping.label, path = %mapping.path, found, "field answered"),
                Err(failure) => {
                    warn!(label = %mapping.label, path = %mapping.path, %failure, "no data for field")
                }
            }
            progress.field_resolved(&mapping.label, i + 1, total);

            FieldAnswer {
                label: mapping.label.clone(),
                path: mapping.path.clone(),
                answer,
                found,
            }
        })
        .collect()
}

/// Write the report as `fill-<run_id>.json` under `dir`. Returns the file path.
pub fn write_report(report: &FillReport, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| FormFillError::io(dir, e))?;

    let path = dir.join(format!("fill-{}.json", report.run_id));
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| FormFillError::validation(format!("failed to serialize report: {e}")))?;
    std::fs::write(&path, json).map_err(|e| FormFillError::io(&path, e))?;

    info!(path = %path.display(), "wrote fill report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::StaticMapper;
    use formfill_knowledge::NOT_FOUND;
    use std::sync::Mutex;

    const FORM: &str = "../../../fixtures/html/job_form.html";
    const KB: &str = "../../../fixtures/json/user_data.fixture.json";

    fn config() -> FillConfig {
        FillConfig {
            form: FormSource::parse(FORM).unwrap(),
            knowledge_base: PathBuf::from(KB),
        }
    }

    fn fixture_map() -> QueryMap {
        [
            ("Full Name", "personal_info.full_name"),
            ("Email Address", "'personal_info.email'"),
            ("Phone Number", "personal_info.phone"),
            ("LinkedIn Profile", "personal_info.linkedin"),
            ("Current Job Title", "work_experience[0].job_title"),
            ("Preferred Work Mode", "custom_questions.preferred_work_mode"),
            ("Do you require visa sponsorship?", "custom_questions.requires_sponsorship"),
            ("Favourite Colour", "personal_info.colour"),
        ]
        .into_iter()
        .collect()
    }

    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
        resolved: Mutex<Vec<(String, usize, usize)>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }
        fn field_resolved(&self, label: &str, current: usize, total: usize) {
            self.resolved.lock().unwrap().push((label.to_string(), current, total));
        }
        fn done(&self, _report: &FillReport) {}
    }

    #[tokio::test]
    async fn end_to_end_with_static_mapper() {
        let mapper = StaticMapper::new(fixture_map());
        let progress = RecordingProgress::default();
        let report = run_fill(&config(), &mapper, &progress).await.unwrap();

        assert_eq!(report.fields.len(), 7);
        assert_eq!(report.mapper, "static");
        assert_eq!(report.answers.len(), 8);

        let answer = |label: &str| {
            report
                .answers
                .iter()
                .find(|a| a.label == label)
                .unwrap()
                .clone()
        };
        assert_eq!(answer("Full Name").answer, "Ada Lovelace");
        assert_eq!(answer("Email Address").answer, "ada@example.com");
        assert_eq!(answer("Current Job Title").answer, "Senior Software Engineer");
        assert!(!answer("LinkedIn Profile").found);
        assert_eq!(answer("LinkedIn Profile").answer, NOT_FOUND);

        assert_eq!(report.answered(), 6);
        assert_eq!(report.plan.count(FillStatus::Ready), 6);
        assert_eq!(report.plan.count(FillStatus::NoData), 1);
        assert_eq!(report.plan.count(FillStatus::UnknownField), 1);

        let phases = progress.phases.lock().unwrap();
        assert_eq!(phases.first().map(String::as_str), Some("Scraping form fields"));
        assert_eq!(progress.resolved.lock().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn missing_knowledge_base_still_completes() {
        let dir = tempfile::tempdir().unwrap();
        let config = FillConfig {
            form: FormSource::parse(FORM).unwrap(),
            knowledge_base: dir.path().join("missing.json"),
        };
        let report = run_fill(&config, &StaticMapper::new(fixture_map()), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(report.answered(), 0);
        assert!(report.answers.iter().all(|a| a.answer == NOT_FOUND));
        assert_eq!(report.ready(), 0);
    }

    #[tokio::test]
    async fn empty_form_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let form = dir.path().join("empty.html");
        std::fs::write(&form, "<html><body><p>Closed</p></body></html>").unwrap();
        let config = FillConfig {
            form: FormSource::Local(form),
            knowledge_base: PathBuf::from(KB),
        };
        let err = run_fill(&config, &StaticMapper::default(), &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, FormFillError::Validation { .. }));
    }

    #[test]
    fn bad_paths_do_not_affect_good_ones() {
        let kb = KnowledgeBase::load(KB);
        let map: QueryMap = [
            ("A", "]]]not a path[[["),
            ("B", "education[5].school"),
            ("C", "skills[0]"),
            ("D", "education[0].school"),
        ]
        .into_iter()
        .collect();
        let answers = execute_queries(&kb, &map, &SilentProgress);
        let found: Vec<_> = answers.iter().map(|a| a.found).collect();
        assert_eq!(found, vec![false, false, false, true]);
        assert_eq!(answers[3].answer, "University of London");
    }

    #[tokio::test]
    async fn blank_paths_are_not_typed_into_fields() {
        let kb = KnowledgeBase::load(KB);
        let map: QueryMap = [("Full Name", ""), ("Email Address", "''")]
            .into_iter()
            .collect();
        let answers = execute_queries(&kb, &map, &SilentProgress);
        assert!(answers.iter().all(|a| !a.found));
        assert!(answers.iter().all(|a| a.answer == NOT_FOUND));

        let html = formfill_forms::load_form_html(&FormSource::parse(FORM).unwrap())
            .await
            .unwrap();
        let fields = formfill_forms::scrape_form_fields(&html);
        let plan = formfill_forms::plan_fill(&fields, &answers);
        assert_eq!(plan.count(FillStatus::NoData), 2);
        assert_eq!(plan.count(FillStatus::Ready), 0);
    }

    #[test]
    fn containers_and_scalars_render_for_text() {
        let kb = KnowledgeBase::load(KB);
        let map: QueryMap = [
            ("Years", "custom_questions.years_of_experience"),
            ("Relocate", "custom_questions.willing_to_relocate"),
            ("Frameworks", "skills.frameworks"),
            ("End", "work_experience[0].end_date"),
        ]
        .into_iter()
        .collect();
        let answers = execute_queries(&kb, &map, &SilentProgress);
        assert_eq!(answers[0].answer, "9");
        assert_eq!(answers[1].answer, "true");
        assert_eq!(answers[2].answer, r#"["Tokio","Axum","React"]"#);
        assert!(!answers[3].found);
        assert_eq!(answers[3].answer, NOT_FOUND);
    }

    #[tokio::test]
    async fn report_is_written_as_json() {
        let report = run_fill(&config(), &StaticMapper::new(fixture_map()), &SilentProgress)
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&report, &dir.path().join("reports")).unwrap();

        assert!(path.file_name().unwrap().to_string_lossy().starts_with("fill-"));
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["run_id"], report.run_id.to_string());
        assert_eq!(written["fields"].as_array().unwrap().len(), 7);
        assert_eq!(written["plan"][0]["status"], "ready");
    }
}
