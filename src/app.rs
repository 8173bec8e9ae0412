use std::io::{self, BufRead, Write};

use colored::Colorize;
use log::{debug, info, warn};
use thiserror::Error;

use crate::chat::chain::{Chain, ExtractionError};
use crate::chat::client::{LanguageModel, ModelError};
use crate::loader::{LoadError, PageLoader};
use crate::portfolio::{LinkSource, PortfolioError};
use crate::utils::text::clean_text;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No data found at the provided URL.")]
    NoData,
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("failed to draft email for {role}: {source}")]
    Drafting {
        role: String,
        #[source]
        source: ModelError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftedEmail {
    pub role: String,
    pub links: Vec<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Emails(Vec<DraftedEmail>),
    /// The page was read but the model found no postings on it.
    NoJobs,
}

/// Runs the URL -> emails pipeline, one request at a time.
pub struct App<L, M, P>
where
    L: PageLoader,
    M: LanguageModel,
    P: LinkSource,
{
    loader: L,
    chain: Chain<M>,
    portfolio: P,
}

impl<L, M, P> App<L, M, P>
where
    L: PageLoader,
    M: LanguageModel,
    P: LinkSource,
{
    pub fn new(loader: L, chain: Chain<M>, portfolio: P) -> Self {
        Self {
            loader,
            chain,
            portfolio,
        }
    }

    pub async fn generate(&mut self, url: &str) -> Result<Outcome, PipelineError> {
        let pages = self.loader.load(url).await?;
        let page = pages.first().ok_or(PipelineError::NoData)?;
        info!(
            "loaded page {} ({})",
            page.url,
            page.title.as_deref().unwrap_or("untitled")
        );

        let data = clean_text(&page.content);
        self.portfolio.ensure_loaded()?;

        let jobs = self.chain.extract_jobs(&data).await?;
        if jobs.is_empty() {
            return Ok(Outcome::NoJobs);
        }

        let mut emails = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let links = self.portfolio.links_for(&job.skills);
            debug!("portfolio links for {}: {:?}", job.display_role(), links);
            let body = self
                .chain
                .write_mail(job, &links)
                .await
                .map_err(|source| PipelineError::Drafting {
                    role: job.display_role().to_string(),
                    source,
                })?;

            emails.push(DraftedEmail {
                role: job.display_role().to_string(),
                links,
                body,
            });
        }

        info!("drafted {} emails", emails.len());
        Ok(Outcome::Emails(emails))
    }

    /// Runs one request and prints whatever came of it. Failures are reported
    /// to `out`, never propagated; only writing to `out` can fail. Returns
    /// whether the request succeeded.
    pub async fn handle<W: Write>(&mut self, url: &str, out: &mut W) -> io::Result<bool> {
        let result = self.generate(url).await;
        if let Err(e) = &result {
            warn!("request for {} failed: {}", url, e);
        }
        render(&result, out)?;
        Ok(result.is_ok())
    }

    /// Reads URLs line by line until EOF, `quit` or `exit`. A blank line
    /// submits `default_url`.
    pub async fn run_session<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        out: &mut W,
        title: &str,
        default_url: &str,
    ) -> io::Result<()> {
        writeln!(out, "{}", title.bold().magenta())?;

        loop {
            write!(
                out,
                "\n{} ",
                format!("Enter a Job Posting URL [{}]:", default_url).cyan()
            )?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }

            let url = match line.trim() {
                "quit" | "exit" => break,
                "" => default_url,
                url => url,
            };
            self.handle(url, out).await?;
        }

        Ok(())
    }
}

pub fn render<W: Write>(result: &Result<Outcome, PipelineError>, out: &mut W) -> io::Result<()> {
    match result {
        Ok(Outcome::Emails(emails)) => {
            for email in emails {
                writeln!(
                    out,
                    "\n{}",
                    format!("Cold Email for {}", email.role).bold().cyan()
                )?;
                writeln!(out, "```markdown\n{}\n```", email.body.trim_end())?;
            }
        }
        Ok(Outcome::NoJobs) => {
            writeln!(
                out,
                "{}",
                "No job postings found in the extracted data.".yellow()
            )?;
        }
        Err(PipelineError::NoData) => {
            writeln!(out, "{}", PipelineError::NoData.to_string().red())?;
        }
        Err(e) => {
            writeln!(out, "{}", format!("An error occurred: {}", e).red())?;
        }
    }
    Ok(())
}
