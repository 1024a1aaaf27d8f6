//! Query orchestrator for Coursemate.
//!
//! Wires the agent, the course index, the tool registry and conversation
//! history together, and runs one question through them.

use crate::agent::Agent;
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::index::{CourseIndex, MemoryCourseIndex};
use crate::llm::{ModelService, OpenAiModel};
use crate::session::{ConversationHistory, SessionManager};
use crate::tools::{CourseSearchTool, Source, ToolRegistry};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// The main orchestrator for answering course questions.
pub struct Orchestrator {
    settings: Settings,
    agent: Agent,
    index: Arc<dyn CourseIndex>,
    registry: ToolRegistry,
    sessions: Arc<dyn ConversationHistory>,
}

/// Answer to one question, with the passages that backed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// Summary of the indexed course catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

impl Orchestrator {
    /// Create a new orchestrator with default components.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let model = OpenAiModel::with_settings(&settings.model)?;
        info!("Using model {}", model.model());

        let catalog_path = settings.catalog_path();
        let index = MemoryCourseIndex::load(&catalog_path, settings.search.max_results)?;
        let sessions = SessionManager::new(settings.session.max_history);

        Self::with_components(
            settings,
            prompts,
            Arc::new(model),
            Arc::new(index),
            Arc::new(sessions),
        )
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        model: Arc<dyn ModelService>,
        index: Arc<dyn CourseIndex>,
        sessions: Arc<dyn ConversationHistory>,
    ) -> Result<Self> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CourseSearchTool::new(index.clone())))?;

        Ok(Self {
            settings,
            agent: Agent::new(model, prompts.agent_system()),
            index,
            registry,
            sessions,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Conversation history store.
    pub fn sessions(&self) -> &Arc<dyn ConversationHistory> {
        &self.sessions
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Answer a question, optionally continuing a session.
    ///
    /// Provenance is gathered in a buffer private to this call, so concurrent
    /// queries never see each other's sources.
    #[instrument(skip(self))]
    pub async fn query(&self, text: &str, session_id: Option<&str>) -> Result<QueryResult> {
        let history = match session_id {
            Some(id) => self.sessions.history(id)?,
            None => None,
        };

        let specs = self.registry.list_specs();
        let mut tools = self.registry.session();
        tools.reset_sources();

        let answer = self
            .agent
            .generate(text, history.as_deref(), Some(specs.as_slice()), Some(&mut tools))
            .await?;

        let sources = tools.take_sources();

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, text, &answer)?;
        }

        info!("Answered with {} sources", sources.len());

        Ok(QueryResult { answer, sources })
    }

    /// Count and list the indexed courses.
    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        let course_titles = self.index.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}
