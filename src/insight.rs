//! AI insight client.
//!
//! Formats a bounded summary of the current workload plus a free-text prompt
//! and forwards it to a hosted text-generation service, asking for the reply
//! in the caller's locale. The summary carries task titles, statuses,
//! priorities and due dates, and project/department names only; no user
//! identities beyond counts leave the process.
//!
//! Failures are [`AiError`] and never fatal: the caller shows a localized
//! fallback message and the rest of the dashboard keeps working. No retries
//! and no timeout beyond what the HTTP client enforces.

use serde::{Deserialize, Serialize};

use crate::collections::Workspace;
use crate::error::AiError;
use crate::fields::{Locale, Priority, Status};

/// How many task lines the context summary may carry. Tasks are taken in
/// due-date order so the most pressing ones survive the cap.
pub const TASK_CONTEXT_LIMIT: usize = 50;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// One task, reduced to what the model needs.
#[derive(Debug, Clone, Serialize)]
struct TaskBrief {
    title: String,
    status: Status,
    priority: Priority,
    due: String,
}

/// The bounded state summary sent alongside every insight prompt.
#[derive(Debug, Clone)]
pub struct InsightContext {
    total_tasks: usize,
    departments: Vec<String>,
    projects: Vec<String>,
    tasks: Vec<TaskBrief>,
}

impl InsightContext {
    pub fn from_workspace(workspace: &Workspace) -> InsightContext {
        let mut tasks: Vec<&crate::task::Task> = workspace.tasks.values().collect();
        tasks.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        tasks.truncate(TASK_CONTEXT_LIMIT);

        InsightContext {
            total_tasks: workspace.tasks.len(),
            departments: workspace.departments.values().map(|d| d.name.clone()).collect(),
            projects: workspace.projects.values().map(|p| p.name.clone()).collect(),
            tasks: tasks
                .into_iter()
                .map(|t| TaskBrief {
                    title: t.title.clone(),
                    status: t.status,
                    priority: t.priority,
                    due: t.due_date.to_string(),
                })
                .collect(),
        }
    }
}

fn insight_prompt(prompt: &str, context: &InsightContext, locale: Locale) -> String {
    let detail = serde_json::to_string(&context.tasks).unwrap_or_else(|_| "[]".to_string());
    format!(
        "You are the team dashboard AI assistant.\n\
         LANGUAGE: You MUST respond in {language}.\n\
         \n\
         Context Data:\n\
         - Total Tasks: {total}\n\
         - Departments: {departments}\n\
         - Projects: {projects}\n\
         - Tasks Detail: {detail}\n\
         \n\
         Rules:\n\
         1. Responses must be short, actionable, and clear.\n\
         2. Prioritize urgent and overdue tasks first.\n\
         3. No unnecessary explanations.\n\
         4. Format with markdown (bullets, bold text).\n\
         \n\
         User Prompt: {prompt}",
        language = locale.language_name(),
        total = context.total_tasks,
        departments = context.departments.join(", "),
        projects = context.projects.join(", "),
    )
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

/// Client for a `models/{model}:generateContent` style text-generation API.
pub struct InsightClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl InsightClient {
    /// Environment variable holding the API key.
    pub const API_KEY_ENV: &'static str = "WORKDASH_AI_KEY";
    /// Optional override for the service base URL.
    pub const BASE_URL_ENV: &'static str = "WORKDASH_AI_URL";

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> InsightClient {
        InsightClient {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Build a client from the environment.
    pub fn from_env() -> Result<InsightClient, AiError> {
        let api_key =
            std::env::var(Self::API_KEY_ENV).map_err(|_| AiError::MissingApiKey(Self::API_KEY_ENV))?;
        let base_url =
            std::env::var(Self::BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self::new(base_url, api_key))
    }

    /// Answer a free-text prompt against the current workload summary.
    pub async fn request_insight(
        &self,
        prompt: &str,
        context: &InsightContext,
        locale: Locale,
    ) -> Result<String, AiError> {
        self.generate(insight_prompt(prompt, context, locale)).await
    }

    /// Expand a short task title or idea into a professional two-sentence
    /// description.
    pub async fn describe_task(&self, short_input: &str, locale: Locale) -> Result<String, AiError> {
        self.generate(format!(
            "Transform this short task title or idea into a professional 2-sentence \
             description for a task management system. Respond in {}. Input: \"{}\"",
            locale.language_name(),
            short_input
        ))
        .await
    }

    async fn generate(&self, text: String) -> Result<String, AiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api { status, body });
        }

        let body: GenerateResponse = response.json().await?;
        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(AiError::EmptyResponse)
    }
}
