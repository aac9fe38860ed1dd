use crate::core::config::Config;
use crate::core::error::{GenerationError, WorkflowError};
use crate::core::io::Storage;
use crate::core::state::{new_id, SavedWork, Script, StoryParameters};
use crate::services::generation::Generator;
use crate::services::llm::{ChatMessage, LlmClient};
use crate::services::prompt::{self, StructuredRequest};
use crate::services::script::{assemble_full, assemble_incremental};
use crate::services::store::StoryStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SAVE_SUCCESS_MESSAGE: &str =
    "Histoire sauvegardée avec succès ! Retrouvez-la dans \"Mes Histoires\".";
pub const SAVE_FAILURE_MESSAGE: &str =
    "Impossible de sauvegarder : l'espace de stockage local est peut-être plein.";
const NO_CHAPTER_MESSAGE: &str = "Aucun chapitre à générer : ajoutez au moins un chapitre.";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Home,
    FormEntry,
    Loading {
        message: String,
    },
    SummaryReview,
    ResultsReview,
    SavedList,
}

/// How to settle the call currently in flight.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum PendingJob {
    /// Success goes to summary review, failure back to the form.
    Summary,
    FullScript { failure_stage: Stage },
    /// Failure restores `original`, never the truncated copy shown while loading.
    Continuation { original: Script },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct WorkflowState {
    pub stage: Stage,
    pub params: Option<StoryParameters>,
    pub summary: Option<String>,
    pub script: Option<Script>,
    pub error: Option<String>,
    pub loading: bool,
    /// Id of the saved record this work belongs to; `None` until first save.
    pub story_id: Option<String>,
    pub pending: Option<PendingJob>,
}

impl WorkflowState {
    fn begin_loading(&mut self, message: &str, job: PendingJob) {
        self.error = None;
        self.loading = true;
        self.stage = Stage::Loading {
            message: message.to_string(),
        };
        self.pending = Some(job);
    }

    fn finish_loading(&mut self) {
        self.loading = false;
        self.pending = None;
    }
}

/// Identity and timestamp used if the work has never been saved.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveStamp {
    pub fresh_id: String,
    pub created_at: i64,
}

impl SaveStamp {
    pub fn now() -> Self {
        Self {
            fresh_id: new_id(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    StartNew,
    OpenSaved,
    LoadSaved(SavedWork),
    SubmitForm(StoryParameters),
    RegenerateSummary,
    ApproveSummary,
    RegenerateAll,
    /// Keep chapters `0..=index`, regenerate the rest.
    RegenerateFrom(usize),
    Save(SaveStamp),
    BackToForm,
    BackHome,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Summary(Vec<ChatMessage>),
    Script {
        request: StructuredRequest,
        /// `Some` for a continuation: new chapters are appended to it.
        prior: Option<Script>,
    },
    Save(SavedWork),
}

#[derive(Debug)]
pub enum Completion {
    Summary(Result<String, GenerationError>),
    Script(Result<Script, GenerationError>),
    Saved { id: String, result: Result<(), String> },
}

fn require<'a, T>(value: &'a Option<T>, what: &'static str) -> Result<&'a T, WorkflowError> {
    value.as_ref().ok_or(WorkflowError::MissingData(what))
}

fn start_full_script(
    state: &WorkflowState,
    next: &mut WorkflowState,
    message: &str,
    failure_stage: Stage,
) -> Result<Option<Effect>, WorkflowError> {
    let params = require(&state.params, "paramètres de l'histoire")?;
    let summary = require(&state.summary, "résumé")?;
    match prompt::build_script_request(params, summary, None) {
        Some(request) => {
            next.begin_loading(message, PendingJob::FullScript { failure_stage });
            Ok(Some(Effect::Script { request, prior: None }))
        }
        None => {
            next.error = Some(NO_CHAPTER_MESSAGE.to_string());
            Ok(None)
        }
    }
}

/// Applies `event` to `state`. Rejected events leave `state` untouched.
pub fn transition(
    state: &WorkflowState,
    event: Event,
) -> Result<(WorkflowState, Option<Effect>), WorkflowError> {
    if state.loading {
        return Err(WorkflowError::Busy);
    }
    let mut next = state.clone();

    let effect = match event {
        Event::StartNew => {
            next.params = None;
            next.summary = None;
            next.script = None;
            next.story_id = None;
            next.error = None;
            next.stage = Stage::FormEntry;
            None
        }
        Event::OpenSaved => {
            next.stage = Stage::SavedList;
            None
        }
        Event::LoadSaved(work) => {
            next.params = Some(work.form_data);
            next.summary = Some(work.summary);
            next.script = Some(work.script);
            next.story_id = Some(work.id);
            next.error = None;
            next.stage = Stage::ResultsReview;
            None
        }
        Event::SubmitForm(params) => {
            let messages = prompt::build_summary_request(&params);
            next.params = Some(params);
            next.begin_loading("Génération du résumé...", PendingJob::Summary);
            Some(Effect::Summary(messages))
        }
        Event::RegenerateSummary => {
            let params = require(&state.params, "paramètres de l'histoire")?;
            next.begin_loading("Génération d'un nouveau résumé...", PendingJob::Summary);
            Some(Effect::Summary(prompt::build_summary_request(params)))
        }
        Event::ApproveSummary => start_full_script(
            state,
            &mut next,
            "Génération du script complet...",
            Stage::SummaryReview,
        )?,
        Event::RegenerateAll => start_full_script(
            state,
            &mut next,
            "Régénération du script complet...",
            Stage::ResultsReview,
        )?,
        Event::RegenerateFrom(index) => {
            let params = require(&state.params, "paramètres de l'histoire")?;
            let summary = require(&state.summary, "résumé")?;
            let script = require(&state.script, "script")?;
            let truncated = script.truncated_through(index);
            match prompt::build_script_request(params, summary, Some(&truncated)) {
                Some(request) => {
                    next.script = Some(truncated.clone());
                    next.begin_loading(
                        "Génération de la suite du script...",
                        PendingJob::Continuation {
                            original: script.clone(),
                        },
                    );
                    Some(Effect::Script {
                        request,
                        prior: Some(truncated),
                    })
                }
                None => {
                    // Configured chapters are already covered: keep the cut, call nothing.
                    log::info!(
                        "No chapter left after chapter {}, skipping generation",
                        index.saturating_add(1)
                    );
                    next.script = Some(truncated);
                    next.error = None;
                    next.stage = Stage::ResultsReview;
                    None
                }
            }
        }
        Event::Save(stamp) => {
            let params = require(&state.params, "paramètres de l'histoire")?;
            let summary = require(&state.summary, "résumé")?;
            let script = require(&state.script, "script")?;
            Some(Effect::Save(SavedWork {
                id: state.story_id.clone().unwrap_or(stamp.fresh_id),
                created_at: stamp.created_at,
                form_data: params.clone(),
                summary: summary.clone(),
                script: script.clone(),
            }))
        }
        Event::BackToForm => {
            next.error = None;
            next.summary = None;
            next.stage = Stage::FormEntry;
            None
        }
        Event::BackHome => {
            next.stage = Stage::Home;
            None
        }
    };

    Ok((next, effect))
}

/// Settles an effect started by [`transition`].
pub fn complete(state: &WorkflowState, completion: Completion) -> Result<WorkflowState, WorkflowError> {
    let mut next = state.clone();

    match completion {
        Completion::Saved { id, result } => {
            if result.is_ok() {
                next.story_id = Some(id);
            }
        }
        Completion::Summary(result) => {
            if !state.loading || state.pending != Some(PendingJob::Summary) {
                return Err(WorkflowError::NoPendingJob);
            }
            next.finish_loading();
            match result {
                Ok(summary) => {
                    next.summary = Some(summary);
                    next.stage = Stage::SummaryReview;
                }
                Err(e) => {
                    next.error = Some(e.to_string());
                    next.stage = Stage::FormEntry;
                }
            }
        }
        Completion::Script(result) => {
            let job = match (&state.pending, state.loading) {
                (Some(job), true) if *job != PendingJob::Summary => job.clone(),
                _ => return Err(WorkflowError::NoPendingJob),
            };
            next.finish_loading();
            match result {
                Ok(script) => {
                    next.script = Some(script);
                    next.stage = Stage::ResultsReview;
                }
                Err(e) => {
                    next.error = Some(e.to_string());
                    next.stage = match job {
                        PendingJob::Continuation { original } => {
                            next.script = Some(original);
                            Stage::ResultsReview
                        }
                        PendingJob::FullScript { failure_stage } => failure_stage,
                        PendingJob::Summary => Stage::FormEntry,
                    };
                }
            }
        }
    }

    Ok(next)
}

// --- Controller ---

/// Blocking, user-facing notifications (save outcome).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::info!("{}", message);
    }
}

pub struct WorkflowManager {
    state: WorkflowState,
    generator: Generator,
    store: StoryStore,
    notifier: Box<dyn Notifier>,
}

impl WorkflowManager {
    pub fn new(
        config: &Config,
        llm: Box<dyn LlmClient>,
        storage: Arc<dyn Storage>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            state: WorkflowState::default(),
            generator: Generator::new(llm, &config.llm),
            store: StoryStore::new(storage, &config.storage.bucket),
            notifier,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// First half of a transition: state moves (to loading if needed), effect returned.
    pub fn begin(&mut self, event: Event) -> Result<Option<Effect>, WorkflowError> {
        let (next, effect) = transition(&self.state, event)?;
        self.state = next;
        Ok(effect)
    }

    /// Performs the effect's single async operation.
    pub async fn run(&self, effect: Effect) -> Completion {
        match effect {
            Effect::Summary(messages) => {
                let result = self.generator.generate_summary(&messages).await;
                if let Err(e) = &result {
                    log::warn!("Summary generation failed: {}", e);
                }
                Completion::Summary(result)
            }
            Effect::Script { request, prior } => {
                let result = match self.generator.generate_script(&request).await {
                    Ok(payload) => match &prior {
                        Some(prior) => assemble_incremental(prior, &payload),
                        None => assemble_full(&payload),
                    },
                    Err(e) => Err(e),
                };
                if let Err(e) = &result {
                    log::warn!("Script generation failed: {}", e);
                }
                Completion::Script(result)
            }
            Effect::Save(work) => {
                let result = self.store.save(&work).await.map_err(|e| format!("{:#}", e));
                Completion::Saved { id: work.id, result }
            }
        }
    }

    pub fn complete(&mut self, completion: Completion) -> Result<(), WorkflowError> {
        if let Completion::Saved { result, .. } = &completion {
            match result {
                Ok(()) => self.notifier.notify(SAVE_SUCCESS_MESSAGE),
                Err(_) => self.notifier.notify(SAVE_FAILURE_MESSAGE),
            }
        }
        self.state = complete(&self.state, completion)?;
        Ok(())
    }

    /// `begin`, `run` and `complete` in one go.
    pub async fn dispatch(&mut self, event: Event) -> Result<&WorkflowState, WorkflowError> {
        if let Some(effect) = self.begin(event)? {
            let completion = self.run(effect).await;
            self.complete(completion)?;
        }
        Ok(&self.state)
    }

    pub async fn save(&mut self) -> Result<&WorkflowState, WorkflowError> {
        self.dispatch(Event::Save(SaveStamp::now())).await
    }

    pub async fn saved_works(&self) -> Vec<SavedWork> {
        self.store.list_recent().await
    }

    pub async fn delete_saved(&self, id: &str) -> anyhow::Result<()> {
        self.store.delete(id).await
    }
}
