use std::sync::LazyLock;

use log::{debug, info};
use regex::Regex;
use thiserror::Error;

use super::client::{LanguageModel, ModelError};
use crate::models::job::{ExtractedJobs, JobPosting};

const EXTRACT_PROMPT: &str = include_str!("extract_prompt.txt");
const EMAIL_PROMPT: &str = include_str!("email_prompt.txt");

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Context too big. Unable to parse jobs.")]
    MalformedModelOutput(#[source] serde_json::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// The two prompts of the pipeline: pull postings out of a page, then write
/// one email per posting.
pub struct Chain<M: LanguageModel> {
    llm: M,
}

impl<M: LanguageModel> Chain<M> {
    pub fn new(llm: M) -> Self {
        Self { llm }
    }

    #[cfg(test)]
    pub(crate) fn model(&self) -> &M {
        &self.llm
    }

    pub async fn extract_jobs(&self, cleaned_text: &str) -> Result<Vec<JobPosting>, ExtractionError> {
        info!("extracting job postings from page text");
        debug!("page text length: {}", cleaned_text.len());

        let prompt = EXTRACT_PROMPT.replace("{page_data}", cleaned_text);
        let response = self.llm.complete(&prompt).await?;

        let jobs = parse_jobs(&response)
            .map_err(|e| {
                debug!("JSON parsing failed: {}", e);
                ExtractionError::MalformedModelOutput(e)
            })?
            .into_vec();

        info!("extracted {} job postings", jobs.len());
        Ok(jobs)
    }

    /// Returns the model's answer verbatim.
    pub async fn write_mail(&self, job: &JobPosting, links: &[String]) -> Result<String, ModelError> {
        info!("drafting email for {}", job.display_role());

        let prompt = EMAIL_PROMPT
            .replace("{job_description}", &serde_json::to_string_pretty(job)?)
            .replace("{link_list}", &serde_json::to_string(links)?);

        self.llm.complete(&prompt).await
    }
}

/// Parses the model's reply, tolerating a Markdown code fence around the JSON.
fn parse_jobs(response: &str) -> Result<ExtractedJobs, serde_json::Error> {
    let body = CODE_FENCE
        .captures(response)
        .and_then(|c| c.get(1))
        .map_or(response, |m| m.as_str());

    serde_json::from_str(body.trim())
}
