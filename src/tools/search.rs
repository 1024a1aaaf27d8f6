//! Course content search tool.

use super::{Source, Tool, ToolOutput, ToolSpec};
use crate::error::{CoursemateError, Result};
use crate::index::{CourseIndex, SearchMatch, SearchQuery};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tool name advertised to the model.
pub const SEARCH_TOOL_NAME: &str = "search_course_content";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<u32>,
}

/// Searches course material with optional course and lesson filters.
pub struct CourseSearchTool {
    index: Arc<dyn CourseIndex>,
}

impl CourseSearchTool {
    pub fn new(index: Arc<dyn CourseIndex>) -> Self {
        Self { index }
    }

    async fn run(&self, args: &SearchArgs) -> ToolOutput {
        let query = SearchQuery {
            query: &args.query,
            course_name: args.course_name.as_deref(),
            lesson_number: args.lesson_number,
        };

        let matches = match self.index.search(&query).await {
            Ok(matches) => matches,
            // Index failures are shown to the model as-is.
            Err(CoursemateError::Index(message)) => {
                return ToolOutput::with_sources(message, Vec::new())
            }
            Err(e) => return ToolOutput::with_sources(e.to_string(), Vec::new()),
        };

        if matches.is_empty() {
            return ToolOutput::with_sources(no_content_message(args), Vec::new());
        }

        debug!("Search returned {} passages", matches.len());

        let mut blocks = Vec::with_capacity(matches.len());
        let mut sources = Vec::with_capacity(matches.len());

        for m in &matches {
            let label = source_label(m);
            blocks.push(format!("[{}]\n{}", label, m.text));
            sources.push(Source {
                url: self.link_for(m).await,
                label,
            });
        }

        ToolOutput::with_sources(blocks.join("\n\n"), sources)
    }

    async fn link_for(&self, m: &SearchMatch) -> Option<String> {
        let lesson = m.lesson_number?;
        match self.index.lesson_link(&m.course_title, lesson).await {
            Ok(link) => link,
            Err(e) => {
                warn!(
                    "Lesson link lookup failed for {} lesson {}: {}",
                    m.course_title, lesson, e
                );
                None
            }
        }
    }
}

/// "<course title>" plus " - Lesson <n>" when the passage has a lesson.
fn source_label(m: &SearchMatch) -> String {
    match m.lesson_number {
        Some(n) => format!("{} - Lesson {}", m.course_title, n),
        None => m.course_title.clone(),
    }
}

fn no_content_message(args: &SearchArgs) -> String {
    let mut filters = String::new();
    if let Some(course) = &args.course_name {
        filters.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = args.lesson_number {
        filters.push_str(&format!(" in lesson {}", lesson));
    }
    format!("No relevant content found{}.", filters)
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput> {
        let args: SearchArgs = serde_json::from_value(arguments)
            .map_err(|e| CoursemateError::ToolExecution(format!("Invalid search arguments: {}", e)))?;
        Ok(self.run(&args).await)
    }
}
