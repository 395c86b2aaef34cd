use crate::config::{DateWindow, FetchConfig, RepoId};
use crate::error::Result;
use crate::fetcher::Fetcher;
use chrono::{DateTime, Utc};
use octocrab::models::issues::Issue;
use octocrab::models::pulls::PullRequest;
use octocrab::models::repos::RepoCommit;
use octocrab::{Octocrab, Page};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLabel {
    pub name: String,
}

/// An issue or pull request as returned by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub number: u64,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    /// `None` when the source record carried no label collection at all.
    #[serde(default)]
    pub labels: Option<Vec<RawLabel>>,
}

/// A complete, already-paginated fetch result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawData {
    pub repository: Option<String>,
    #[serde(default)]
    pub start_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub end_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub issues: Vec<RawItem>,
    #[serde(default)]
    pub pulls: Vec<RawItem>,
    /// Logins with no commits before the window, or `None` when not looked up.
    #[serde(default)]
    pub new_contributors: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
    max_pages: u32,
}

impl GitHubClient {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(token) = &config.github_token {
            builder = builder.personal_token(token.clone());
        }
        if let Some(url) = &config.github_api_url {
            builder = builder.base_uri(url.as_str())?;
        }

        Ok(Self {
            octocrab: builder.build()?,
            max_pages: config.max_github_api_pages,
        })
    }

    /// Open issues created inside `window`. The issues endpoint also lists pull
    /// requests; those are skipped here and fetched separately.
    pub async fn fetch_issues(&self, repo_id: &RepoId, window: &DateWindow) -> Result<Vec<RawItem>> {
        let mut current_page: Page<Issue> = self
            .octocrab
            .issues(&repo_id.owner, &repo_id.repo)
            .list()
            .state(octocrab::params::State::Open)
            .sort(octocrab::params::issues::Sort::Created)
            .direction(octocrab::params::Direction::Descending)
            .per_page(100)
            .send()
            .await?;

        let mut items = Vec::new();
        let mut page_count = 1;

        loop {
            let mut reached_cutoff = false;

            for issue in &current_page {
                if issue.created_at.date_naive() < window.start {
                    reached_cutoff = true;
                    break;
                }
                if issue.pull_request.is_some() || !window.contains(issue.created_at.date_naive()) {
                    continue;
                }
                items.push(RawItem {
                    number: issue.number,
                    html_url: issue.html_url.to_string(),
                    created_at: issue.created_at,
                    labels: Some(
                        issue
                            .labels
                            .iter()
                            .map(|label| RawLabel { name: label.name.clone() })
                            .collect(),
                    ),
                });
            }

            if reached_cutoff {
                break;
            }
            if page_count >= self.max_pages {
                warn_page_limit("issues", self.max_pages, repo_id);
                break;
            }

            match self.octocrab.get_page::<Issue>(&current_page.next).await? {
                Some(next_page) => {
                    current_page = next_page;
                    page_count += 1;
                }
                None => break,
            }
        }

        tracing::debug!(repository = %repo_id, count = items.len(), pages = page_count, "Fetched issues");
        Ok(items)
    }

    /// Open pull requests created inside `window`.
    pub async fn fetch_pulls(&self, repo_id: &RepoId, window: &DateWindow) -> Result<Vec<RawItem>> {
        let mut current_page: Page<PullRequest> = self
            .octocrab
            .pulls(&repo_id.owner, &repo_id.repo)
            .list()
            .state(octocrab::params::State::Open)
            .sort(octocrab::params::pulls::Sort::Created)
            .direction(octocrab::params::Direction::Descending)
            .per_page(100)
            .send()
            .await?;

        let mut items = Vec::new();
        let mut page_count = 1;

        loop {
            let mut reached_cutoff = false;

            for pr in &current_page {
                // Entries without a creation date cannot be placed in the window.
                let Some(created_at) = pr.created_at else {
                    continue;
                };
                if created_at.date_naive() < window.start {
                    reached_cutoff = true;
                    break;
                }
                if !window.contains(created_at.date_naive()) {
                    continue;
                }
                items.push(RawItem {
                    number: pr.number,
                    html_url: pr
                        .html_url
                        .as_ref()
                        .map(|url| url.to_string())
                        .unwrap_or_else(|| format!("https://github.com/{repo_id}/pull/{}", pr.number)),
                    created_at,
                    labels: pr.labels.as_ref().map(|labels| {
                        labels
                            .iter()
                            .map(|label| RawLabel { name: label.name.clone() })
                            .collect()
                    }),
                });
            }

            if reached_cutoff {
                break;
            }
            if page_count >= self.max_pages {
                warn_page_limit("pull requests", self.max_pages, repo_id);
                break;
            }

            match self.octocrab.get_page::<PullRequest>(&current_page.next).await? {
                Some(next_page) => {
                    current_page = next_page;
                    page_count += 1;
                }
                None => break,
            }
        }

        tracing::debug!(repository = %repo_id, count = items.len(), pages = page_count, "Fetched pull requests");
        Ok(items)
    }

    /// Logins of commit authors inside `window` who had no commits before it,
    /// sorted.
    pub async fn fetch_new_contributors(
        &self,
        repo_id: &RepoId,
        window: &DateWindow,
    ) -> Result<Vec<String>> {
        let mut current_page: Page<RepoCommit> = self
            .octocrab
            .repos(&repo_id.owner, &repo_id.repo)
            .list_commits()
            .since(window.start_time())
            .until(window.end_time())
            .per_page(100)
            .send()
            .await?;

        let mut authors = BTreeSet::new();
        let mut page_count = 1;

        loop {
            // Commits by unlinked emails carry no GitHub author.
            authors.extend(
                current_page
                    .items
                    .iter()
                    .filter_map(|commit| commit.author.as_ref())
                    .map(|author| author.login.clone()),
            );

            if page_count >= self.max_pages {
                warn_page_limit("commits", self.max_pages, repo_id);
                break;
            }

            match self.octocrab.get_page::<RepoCommit>(&current_page.next).await? {
                Some(next_page) => {
                    current_page = next_page;
                    page_count += 1;
                }
                None => break,
            }
        }

        tracing::debug!(repository = %repo_id, count = authors.len(), "Fetched commit authors");

        let checks = authors.iter().map(|login| self.has_commits_before(repo_id, login, window));
        let earlier = futures::future::try_join_all(checks).await?;

        Ok(authors
            .into_iter()
            .zip(earlier)
            .filter_map(|(login, has_earlier)| (!has_earlier).then_some(login))
            .collect())
    }

    async fn has_commits_before(&self, repo_id: &RepoId, login: &str, window: &DateWindow) -> Result<bool> {
        let page: Page<RepoCommit> = self
            .octocrab
            .repos(&repo_id.owner, &repo_id.repo)
            .list_commits()
            .author(login)
            .until(window.start_time())
            .per_page(1)
            .send()
            .await?;
        Ok(!page.items.is_empty())
    }
}

fn warn_page_limit(kind: &str, max_pages: u32, repo_id: &RepoId) {
    tracing::warn!(
        "Hit max_github_api_pages ({}) fetching {} for repo {} before reaching the start of the window. Data may be incomplete.",
        max_pages,
        kind,
        repo_id
    );
}

impl Fetcher for GitHubClient {
    fn fetch(
        &self,
        repo_id: &RepoId,
        window: &DateWindow,
    ) -> impl Future<Output = Result<RawData>> + Send {
        async move {
            let (issues, pulls, new_contributors) = futures::try_join!(
                self.fetch_issues(repo_id, window),
                self.fetch_pulls(repo_id, window),
                self.fetch_new_contributors(repo_id, window)
            )?;

            Ok(RawData {
                repository: Some(repo_id.to_string()),
                start_date: Some(window.start),
                end_date: Some(window.end),
                issues,
                pulls,
                new_contributors: Some(new_contributors),
            })
        }
    }
}
