use anyhow::{Context, Result};
use async_trait::async_trait;
use common::{
    Task, TaskAssignmentRequest, TaskAssignmentResponse, TaskCompleteRequest,
    TaskCompleteResponse, WorkerId,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::sleep;
use tracing::warn;

use crate::config::RetryPolicy;

/// Las dos llamadas que el worker le hace al master.
#[async_trait]
pub trait CoordinatorRpc: Send + Sync {
    /// Pide la siguiente tarea (puede ser Wait o Exit).
    async fn assign_task(&self) -> Result<Task>;

    /// Reporta una tarea terminada. Ok(false) = el master la descartó.
    async fn report_completion(&self, task: &Task) -> Result<bool>;
}

/// Cliente HTTP/JSON contra el router del master.
#[derive(Debug, Clone)]
pub struct HttpCoordinatorClient {
    client: Client,
    base_url: String,
    worker_id: WorkerId,
    retry: RetryPolicy,
}

impl HttpCoordinatorClient {
    pub fn new(base_url: impl Into<String>, worker_id: impl Into<WorkerId>, retry: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            worker_id: worker_id.into(),
            retry,
        }
    }

    async fn post_once<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// POST con reintentos acotados; si se agotan, el error sube y el
    /// worker termina.
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0;
        loop {
            match self.post_once(&url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!(
                        "error llamando a {} (intento {}/{}): {:#}",
                        url, attempt, self.retry.max_retries, e
                    );
                    sleep(self.retry.backoff).await;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("master inalcanzable en {} tras {} reintentos", url, attempt)
                    })
                }
            }
        }
    }
}

#[async_trait]
impl CoordinatorRpc for HttpCoordinatorClient {
    async fn assign_task(&self) -> Result<Task> {
        let req = TaskAssignmentRequest {
            worker_id: self.worker_id.clone(),
        };
        let resp: TaskAssignmentResponse = self.post("/api/v1/tasks/next", &req).await?;
        Ok(resp.task)
    }

    async fn report_completion(&self, task: &Task) -> Result<bool> {
        let req = TaskCompleteRequest {
            worker_id: self.worker_id.clone(),
            task: task.clone(),
        };
        let resp: TaskCompleteResponse = self.post("/api/v1/tasks/complete", &req).await?;
        Ok(resp.accepted)
    }
}
