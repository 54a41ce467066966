//! Task lifecycle events
//!
//! Events are published in the background: a failed publish is logged and
//! dropped. Publishes still in flight can be awaited before shutdown, but
//! no delivery guarantee is assumed by anything in this crate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::EventsConfig;
use crate::model::Task;

/// Kind of lifecycle change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskEventType {
    Created,
    Updated,
    Completed,
    Deleted,
}

/// Payload published to the task events topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskEvent {
    pub event_type: TaskEventType,
    pub id: i64,
    pub title: String,
    pub user_id: Option<String>,
}

impl TaskEvent {
    pub fn new(event_type: TaskEventType, task: &Task) -> Self {
        Self {
            event_type,
            id: task.id,
            title: task.title.clone(),
            user_id: task.user_id.clone(),
        }
    }
}

/// Sink for task events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event. Implementations report failures through logging only.
    async fn publish(&self, event: TaskEvent);
}

/// Spawn a publish into `tasks` without waiting for it. Finished
/// publishes are reaped first so the set only holds work in flight.
pub fn publish_in_background(
    tasks: &mut JoinSet<()>,
    publisher: Arc<dyn EventPublisher>,
    event: TaskEvent,
) {
    while tasks.try_join_next().is_some() {}
    tasks.spawn(async move {
        publisher.publish(event).await;
    });
}

/// Publisher that only writes events to the log
#[derive(Debug, Default, Clone)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: TaskEvent) {
        info!(
            event_type = ?event.event_type,
            task_id = event.id,
            title = %event.title,
            "Task event"
        );
    }
}

/// Publisher for the Dapr sidecar pub/sub HTTP API
#[derive(Debug, Clone)]
pub struct DaprPublisher {
    client: reqwest::Client,
    url: String,
    topic: String,
}

impl DaprPublisher {
    const TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(http_port: u16, pubsub_name: &str, topic: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: format!(
                "http://localhost:{}/v1.0/publish/{}/{}",
                http_port, pubsub_name, topic
            ),
            topic: topic.to_string(),
        }
    }

    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.dapr_http_port, &config.pubsub_name, &config.topic)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventPublisher for DaprPublisher {
    async fn publish(&self, event: TaskEvent) {
        match self.client.post(&self.url).json(&event).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(topic = %self.topic, task_id = event.id, "Published task event");
            }
            Ok(resp) => {
                warn!(
                    topic = %self.topic,
                    task_id = event.id,
                    status = %resp.status(),
                    "Event publish rejected by sidecar"
                );
            }
            Err(e) => {
                warn!(topic = %self.topic, task_id = event.id, error = %e, "Failed to publish task event");
            }
        }
    }
}

/// Build the publisher selected by configuration
pub fn publisher_from_config(config: &EventsConfig) -> Arc<dyn EventPublisher> {
    if config.enabled {
        Arc::new(DaprPublisher::from_config(config))
    } else {
        Arc::new(LogPublisher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskStatus;

    #[test]
    fn test_event_payload_shape() {
        let task = Task {
            id: 7,
            title: "Water plants".to_string(),
            description: None,
            status: TaskStatus::Completed,
            user_id: Some("u1".to_string()),
        };
        let json = serde_json::to_value(TaskEvent::new(TaskEventType::Completed, &task)).unwrap();
        assert_eq!(json["event_type"], "completed");
        assert_eq!(json["id"], 7);
        assert_eq!(json["title"], "Water plants");
        assert_eq!(json["user_id"], "u1");
    }

    #[test]
    fn test_dapr_url() {
        let publisher = DaprPublisher::new(3500, "kafka-pubsub", "task-events");
        assert_eq!(
            publisher.url(),
            "http://localhost:3500/v1.0/publish/kafka-pubsub/task-events"
        );
    }
}
