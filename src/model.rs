use chrono::{DateTime, Local};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Pods,
    Services,
    Events,
}

impl ResourceKind {
    pub const ALL: [Self; 3] = [Self::Pods, Self::Services, Self::Events];

    pub fn title(self) -> &'static str {
        match self {
            Self::Pods => "Pods",
            Self::Services => "Services",
            Self::Events => "Events",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            Self::Pods => "pod",
            Self::Services => "service",
            Self::Events => "event",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Self::Pods => "pods",
            Self::Services => "services",
            Self::Events => "events",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Pods => "/pods",
            Self::Services => "/services",
            Self::Events => "/events",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Count label shown above each table: "No pods", "Total: 1 pod",
/// "Total: 5 pods". Pluralized only when the count is not exactly one.
pub fn count_label(kind: ResourceKind, count: usize) -> String {
    if count == 0 {
        format!("No {}", kind.plural())
    } else if count == 1 {
        format!("Total: 1 {}", kind.singular())
    } else {
        format!("Total: {count} {}s", kind.singular())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Pod {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pod_ip: Option<String>,
}

/// A service target port is either a numeric port or a named port.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PortTarget {
    Number(i64),
    Name(String),
}

impl Display for PortTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(port) => write!(f, "{port}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServicePort {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub port: Option<i64>,
    #[serde(default)]
    pub target_port: Option<PortTarget>,
    #[serde(default)]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Service {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub service_type: Option<String>,
    #[serde(default)]
    pub cluster_ip: Option<String>,
    #[serde(default)]
    pub external_ips: Option<Vec<String>>,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
    #[serde(default)]
    pub selector: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InvolvedObject {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Event {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub involved_object: Option<InvolvedObject>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub first_timestamp: Option<String>,
    #[serde(default)]
    pub last_timestamp: Option<String>,
}

impl Event {
    /// Last seen wins over first seen, matching the backend ordering.
    pub fn last_seen(&self) -> Option<&str> {
        self.last_timestamp
            .as_deref()
            .or(self.first_timestamp.as_deref())
    }
}

/// A typed record collection as loaded from one backend endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Records {
    Pods(Vec<Pod>),
    Services(Vec<Service>),
    Events(Vec<Event>),
}

impl Records {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Pods(_) => ResourceKind::Pods,
            Self::Services(_) => ResourceKind::Services,
            Self::Events(_) => ResourceKind::Events,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Pods(pods) => pods.len(),
            Self::Services(services) => services.len(),
            Self::Events(events) => events.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowData {
    pub name: String,
    pub namespace: Option<String>,
    pub columns: Vec<String>,
    /// Lowercased concatenation of the kind-specific searchable fields.
    pub search_text: String,
}

impl RowData {
    pub fn matches_filter(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        self.search_text.contains(&query.to_lowercase())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<RowData>,
    pub records: Option<Records>,
    pub selected: usize,
    pub loading: bool,
    pub last_refreshed: Option<DateTime<Local>>,
    pub error: Option<String>,
}

impl TableData {
    pub fn set_rows(
        &mut self,
        headers: Vec<String>,
        rows: Vec<RowData>,
        records: Records,
        refreshed_at: DateTime<Local>,
    ) {
        self.headers = headers;
        self.rows = rows;
        self.records = Some(records);
        self.last_refreshed = Some(refreshed_at);
        self.loading = false;
        self.error = None;
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    pub fn set_error(&mut self, error: impl Into<String>, refreshed_at: DateTime<Local>) {
        self.error = Some(error.into());
        self.last_refreshed = Some(refreshed_at);
        self.loading = false;
        self.selected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::{ResourceKind, RowData, count_label};

    #[test]
    fn endpoints_match_backend_routes() {
        assert_eq!(ResourceKind::Pods.endpoint(), "/pods");
        assert_eq!(ResourceKind::Services.endpoint(), "/services");
        assert_eq!(ResourceKind::Events.endpoint(), "/events");
    }

    #[test]
    fn count_label_pluralizes_only_when_not_one() {
        assert_eq!(count_label(ResourceKind::Pods, 0), "No pods");
        assert_eq!(count_label(ResourceKind::Pods, 1), "Total: 1 pod");
        assert_eq!(count_label(ResourceKind::Pods, 5), "Total: 5 pods");
        assert_eq!(count_label(ResourceKind::Services, 2), "Total: 2 services");
        assert_eq!(count_label(ResourceKind::Events, 0), "No events");
    }

    #[test]
    fn empty_query_matches_everything() {
        let row = RowData {
            name: "api".to_string(),
            namespace: Some("default".to_string()),
            columns: vec!["api".to_string()],
            search_text: "api default 10.0.0.1".to_string(),
        };
        assert!(row.matches_filter(""));
        assert!(row.matches_filter("   "));
    }

    #[test]
    fn filter_is_case_insensitive() {
        let row = RowData {
            name: "api".to_string(),
            namespace: Some("kube-system".to_string()),
            columns: Vec::new(),
            search_text: "api kube-system warning".to_string(),
        };
        assert!(row.matches_filter("WARN"));
        assert!(row.matches_filter("warn"));
        assert!(row.matches_filter("Kube-SYSTEM"));
        assert!(!row.matches_filter("missing"));
    }
}
