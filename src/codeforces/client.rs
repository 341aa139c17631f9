// src/codeforces/client.rs
use crate::utils::error::FetchError;
use reqwest::header;
use std::time::Duration;

const CODEFORCES_BASE_URL: &str = "https://codeforces.com";
// Codeforces throttles anonymous scrapers aggressively; keep a comfortable
// gap between requests.
const REQUEST_DELAY_MS: u64 = 400;
const USER_AGENT: &str = concat!("cf_extractor/", env!("CARGO_PKG_VERSION"));

/// Creates a reqwest client configured for Codeforces.
fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
}

/// Downloads one page and returns its body as text.
/// Includes the User-Agent and a fixed inter-request delay.
async fn fetch_page(url: &str) -> Result<String, FetchError> {
    let client = build_client()?;

    tracing::debug!("Fetching {}", url);
    tokio::time::sleep(Duration::from_millis(REQUEST_DELAY_MS)).await;

    let response = client
        .get(url)
        .header(header::ACCEPT, "text/html,*/*")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        if status == reqwest::StatusCode::FORBIDDEN {
            tracing::warn!("Received 403 Forbidden - likely rate limited.");
            return Err(FetchError::RateLimited);
        }
        return Err(FetchError::Http(status));
    }

    let body = response.text().await?;
    tracing::debug!("Downloaded {} bytes from {}", body.len(), url);

    Ok(body)
}

/// Fetches the contest index page for a contest id.
pub async fn fetch_contest_page(contest_id: &str) -> Result<String, FetchError> {
    let url = format!("{}/contest/{}", CODEFORCES_BASE_URL, contest_id);
    match fetch_page(&url).await {
        Err(FetchError::Http(status)) if status == reqwest::StatusCode::NOT_FOUND => {
            Err(FetchError::ContestNotFound(contest_id.to_string()))
        }
        other => other,
    }
}

/// Fetches the statement page of one problem.
pub async fn fetch_problem_page(contest_id: &str, letter: &str) -> Result<String, FetchError> {
    let url = format!(
        "{}/contest/{}/problem/{}",
        CODEFORCES_BASE_URL, contest_id, letter
    );
    match fetch_page(&url).await {
        Err(FetchError::Http(status)) if status == reqwest::StatusCode::NOT_FOUND => {
            Err(FetchError::ProblemNotFound {
                contest: contest_id.to_string(),
                letter: letter.to_string(),
            })
        }
        other => other,
    }
}
