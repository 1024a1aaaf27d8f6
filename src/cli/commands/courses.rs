//! Courses command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::index::{CourseIndex, MemoryCourseIndex};
use anyhow::Result;

/// List the courses in the catalog.
pub async fn run_courses(settings: Settings) -> Result<()> {
    preflight::check(Operation::Courses, &settings)?;

    let index = MemoryCourseIndex::load(&settings.catalog_path(), settings.search.max_results)?;
    let titles = index.course_titles().await?;

    if titles.is_empty() {
        Output::info("No courses indexed yet.");
        Output::kv("Catalog", &settings.catalog_path().display().to_string());
        return Ok(());
    }

    Output::header(&format!("Courses ({})", titles.len()));
    for title in &titles {
        Output::list_item(title);
    }

    Ok(())
}
