/// PostgREST table transport
///
/// Talks to the hosted backend's REST interface at
/// `{project_url}/rest/v1/{table}` using `reqwest`.
///
/// # Requests
///
/// ```text
/// GET    /rest/v1/tasks?select=*
/// POST   /rest/v1/tasks              body: [row]
/// PATCH  /rest/v1/tasks?id=eq.42     body: {fields}
/// DELETE /rest/v1/tasks?id=eq.42
/// ```
///
/// Owner-scoped writes add `&user_id=eq.<uuid>`; row-level security on the
/// backend enforces the same condition.
///
/// Every request carries `apikey: <project key>` and
/// `Authorization: Bearer <user token or project key>`. Writes ask for
/// `Prefer: return=representation` so the affected rows come back.
///
/// No retries and no explicit timeout: the first failure is returned as a
/// [`RemoteError`].
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::Table;
/// use taskboard_shared::remote::{ProjectConfig, PostgrestStore, TableStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgrestStore::new(ProjectConfig::new(
///     "https://project.supabase.co",
///     "anon-key",
/// ));
///
/// let rows = store.select_all(Table::Tasks, None).await?;
/// println!("{} tasks", rows.len());
/// # Ok(())
/// # }
/// ```

use super::{RowFilter, TableStore};
use crate::{
    error::{RemoteError, RemoteResult},
    models::Table,
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value as JsonValue;

/// Connection settings for the hosted backend
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Project URL without trailing slash (e.g. `https://xyz.supabase.co`)
    pub project_url: String,

    /// Project API key (anon key)
    pub api_key: String,
}

impl ProjectConfig {
    /// Creates a configuration, normalizing the URL
    pub fn new(project_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_url: project_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// REST endpoint of `table`
    pub fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.project_url, table.name())
    }

    /// Identity endpoint (e.g. `auth_url("token")`)
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.project_url, path)
    }
}

/// Table transport backed by PostgREST
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: reqwest::Client,
    config: ProjectConfig,
}

impl PostgrestStore {
    /// Creates a store with a fresh HTTP client
    pub fn new(config: ProjectConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Creates a store sharing an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: ProjectConfig) -> Self {
        Self { client, config }
    }

    /// Connection settings
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    fn request(&self, method: Method, table: Table, access_token: Option<&str>) -> RequestBuilder {
        self.client
            .request(method, self.config.table_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token.unwrap_or(&self.config.api_key))
    }

    fn write_request(
        &self,
        method: Method,
        table: Table,
        access_token: Option<&str>,
    ) -> RequestBuilder {
        self.request(method, table, access_token)
            .header("Prefer", "return=representation")
    }
}

#[async_trait]
impl TableStore for PostgrestStore {
    fn name(&self) -> &str {
        "postgrest"
    }

    async fn select_all(
        &self,
        table: Table,
        access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>> {
        tracing::debug!(%table, "select *");

        let response = self
            .request(Method::GET, table, access_token)
            .query(&[("select", "*")])
            .send()
            .await?;

        read_rows(response).await
    }

    async fn insert(
        &self,
        table: Table,
        row: JsonValue,
        access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>> {
        tracing::debug!(%table, "insert");

        let response = self
            .write_request(Method::POST, table, access_token)
            .json(&[row])
            .send()
            .await?;

        read_rows(response).await
    }

    async fn update(
        &self,
        table: Table,
        filter: RowFilter,
        changes: JsonValue,
        access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>> {
        tracing::debug!(%table, id = filter.id, "update");

        let response = self
            .write_request(Method::PATCH, table, access_token)
            .query(&filter_query(table, &filter))
            .json(&changes)
            .send()
            .await?;

        read_rows(response).await
    }

    async fn delete(
        &self,
        table: Table,
        filter: RowFilter,
        access_token: Option<&str>,
    ) -> RemoteResult<Vec<JsonValue>> {
        tracing::debug!(%table, id = filter.id, "delete");

        let response = self
            .write_request(Method::DELETE, table, access_token)
            .query(&filter_query(table, &filter))
            .send()
            .await?;

        read_rows(response).await
    }

    async fn ping(&self) -> RemoteResult<()> {
        let response = self
            .client
            .get(format!("{}/rest/v1/", self.config.project_url))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::from_response(status.as_u16(), &body))
        }
    }
}

/// Query parameters addressing the rows of a write
fn filter_query(table: Table, filter: &RowFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![("id", format!("eq.{}", filter.id))];
    if let Some((column, owner)) = filter.owner_condition(table) {
        query.push((column, format!("eq.{}", owner)));
    }
    query
}

/// Reads a PostgREST response into rows, mapping failures to `RemoteError`
async fn read_rows(response: Response) -> RemoteResult<Vec<JsonValue>> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(RemoteError::from_response(status.as_u16(), &body));
    }

    // 204 No Content when the backend ignores `Prefer`
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<JsonValue>(&body)? {
        JsonValue::Array(rows) => Ok(rows),
        JsonValue::Null => Ok(Vec::new()),
        row => Ok(vec![row]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_strips_trailing_slash() {
        let config = ProjectConfig::new("https://example.supabase.co/", "key");
        assert_eq!(config.project_url, "https://example.supabase.co");
        assert_eq!(
            config.table_url(Table::UserData),
            "https://example.supabase.co/rest/v1/user_data"
        );
        assert_eq!(
            config.auth_url("logout"),
            "https://example.supabase.co/auth/v1/logout"
        );
    }

    #[test]
    fn test_filter_query_adds_owner_on_tasks() {
        let owner = uuid::Uuid::new_v4();
        let filter = RowFilter::id(7).owned_by(owner);

        assert_eq!(
            filter_query(Table::Tasks, &filter),
            vec![("id", "eq.7".to_string()), ("user_id", format!("eq.{}", owner))]
        );
        assert_eq!(
            filter_query(Table::UserData, &filter),
            vec![("id", "eq.7".to_string())]
        );
    }
}
