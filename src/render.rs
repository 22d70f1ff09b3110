use crate::model::{
    Event, Pod, Records, ResourceKind, RowData, Service, ServicePort, TableData, count_label,
};
use chrono::{DateTime, Local, NaiveDateTime};
use std::collections::BTreeMap;
use std::fmt::Write as _;

const MESSAGE_PREVIEW_CHARS: usize = 80;

/// Escapes a backend-sourced string for inlining into markup. Ampersand
/// first so already-produced entities are not double-mangled.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Formats a raw backend timestamp for display. The backend stringifies
/// Python datetimes, so both RFC 3339 and "%Y-%m-%d %H:%M:%S(+tz)" arrive
/// here. Absent or literal-"None" input yields "N/A"; anything unparseable
/// is returned unchanged.
pub fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "N/A".to_string();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "None" {
        return "N/A".to_string();
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, pattern) {
            return parsed
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();
        }
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return parsed.format("%Y-%m-%d %H:%M:%S").to_string();
    }

    raw.to_string()
}

/// Badge style class for a service type: lowercased with whitespace
/// stripped ("Load Balancer" and "LoadBalancer" select the same class).
pub fn service_type_class(service_type: &str) -> String {
    service_type
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Warning events get the warning badge; every other type (including
/// unknown ones) falls back to the normal badge.
pub fn event_badge_class(event_type: &str) -> &'static str {
    if event_type.eq_ignore_ascii_case("warning") {
        "badge-warning"
    } else {
        "badge-normal"
    }
}

pub fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let mut preview = message
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    preview.push('…');
    preview
}

pub fn empty_state_message(kind: ResourceKind) -> String {
    format!("No {} found", kind.plural())
}

pub fn headers(kind: ResourceKind) -> Vec<String> {
    let headers: &[&str] = match kind {
        ResourceKind::Pods => &["Namespace", "Name", "Pod IP"],
        ResourceKind::Services => &[
            "Namespace",
            "Name",
            "Type",
            "Cluster IP",
            "Ports",
            "Selector",
        ],
        ResourceKind::Events => &[
            "Type",
            "Namespace",
            "Reason",
            "Message",
            "Object",
            "Last Seen",
        ],
    };
    headers.iter().map(|h| h.to_string()).collect()
}

pub fn port_items(ports: &[ServicePort]) -> Vec<String> {
    ports
        .iter()
        .map(|p| {
            let port = p
                .port
                .map(|port| port.to_string())
                .unwrap_or_else(|| "-".to_string());
            let target = p
                .target_port
                .as_ref()
                .map(|target| target.to_string())
                .unwrap_or_else(|| "-".to_string());
            let protocol = p.protocol.as_deref().unwrap_or("-");
            format!("{port}:{target}/{protocol}")
        })
        .collect()
}

pub fn selector_items(selector: Option<&BTreeMap<String, String>>) -> Vec<String> {
    selector
        .map(|selector| {
            selector
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect()
        })
        .unwrap_or_default()
}

/// Builds display headers and table rows for a loaded collection. The
/// search text mirrors the per-kind searchable fields, lowercased once so
/// filtering stays a cheap substring test.
pub fn table_rows(records: &Records) -> (Vec<String>, Vec<RowData>) {
    let headers = headers(records.kind());
    let rows = match records {
        Records::Pods(pods) => pods.iter().map(pod_row).collect(),
        Records::Services(services) => services.iter().map(service_row).collect(),
        Records::Events(events) => events.iter().map(event_row).collect(),
    };
    (headers, rows)
}

fn pod_row(pod: &Pod) -> RowData {
    let name = pod.name.clone().unwrap_or_default();
    let namespace = pod.namespace.clone();
    let ip = pod.pod_ip.clone().unwrap_or_else(|| "N/A".to_string());
    let search_text = search_text([
        pod.name.as_deref(),
        pod.namespace.as_deref(),
        pod.pod_ip.as_deref(),
    ]);

    RowData {
        columns: vec![
            namespace.clone().unwrap_or_else(|| "-".to_string()),
            name.clone(),
            ip,
        ],
        name,
        namespace,
        search_text,
    }
}

fn service_row(service: &Service) -> RowData {
    let name = service.name.clone().unwrap_or_default();
    let namespace = service.namespace.clone();
    let ports = port_items(&service.ports);
    let ports_cell = if ports.is_empty() {
        "None".to_string()
    } else {
        ports.join(", ")
    };
    let selectors = selector_items(service.selector.as_ref());
    let selector_cell = if selectors.is_empty() {
        "None".to_string()
    } else {
        selectors.join(",")
    };
    let search_text = search_text([
        service.name.as_deref(),
        service.namespace.as_deref(),
        service.service_type.as_deref(),
        service.cluster_ip.as_deref(),
    ]);

    RowData {
        columns: vec![
            namespace.clone().unwrap_or_else(|| "-".to_string()),
            name.clone(),
            service.service_type.clone().unwrap_or_else(|| "-".to_string()),
            service.cluster_ip.clone().unwrap_or_else(|| "N/A".to_string()),
            ports_cell,
            selector_cell,
        ],
        name,
        namespace,
        search_text,
    }
}

fn event_row(event: &Event) -> RowData {
    let name = event.name.clone().unwrap_or_default();
    let namespace = event.namespace.clone();
    let object = event.involved_object.as_ref();
    let object_cell = format!(
        "{}/{}",
        object
            .and_then(|o| o.kind.as_deref())
            .unwrap_or("N/A"),
        object
            .and_then(|o| o.name.as_deref())
            .unwrap_or("N/A"),
    );
    let message = event.message.as_deref().unwrap_or("N/A");
    let search_text = search_text([
        event.name.as_deref(),
        event.namespace.as_deref(),
        event.reason.as_deref(),
        event.message.as_deref(),
        object.and_then(|o| o.kind.as_deref()),
        object.and_then(|o| o.name.as_deref()),
    ]);

    RowData {
        columns: vec![
            event.event_type.clone().unwrap_or_else(|| "Normal".to_string()),
            namespace.clone().unwrap_or_else(|| "-".to_string()),
            event.reason.clone().unwrap_or_else(|| "-".to_string()),
            truncate_message(message, MESSAGE_PREVIEW_CHARS),
            object_cell,
            format_timestamp(event.last_seen().or(Some("Unknown"))),
        ],
        name,
        namespace,
        search_text,
    }
}

fn search_text<const N: usize>(fields: [Option<&str>; N]) -> String {
    fields
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Renders the three tables as one self-contained HTML document. Every
/// backend-sourced string passes through the escaper.
pub fn render_report(tables: &[(ResourceKind, &TableData)]) -> String {
    let mut out = String::new();
    out.push_str(REPORT_HEAD);
    let _ = writeln!(
        out,
        "<p class=\"generated\">Generated {}</p>",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    for (kind, table) in tables {
        out.push_str(&render_section(*kind, table));
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn render_section(kind: ResourceKind, table: &TableData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<section id=\"{}\">", kind.plural());
    let _ = writeln!(out, "<h2>{}</h2>", kind.title());

    if let Some(error) = &table.error {
        let _ = writeln!(out, "<p class=\"error\">{}</p>", escape_html(error));
        out.push_str("</section>\n");
        return out;
    }

    let count = table.records.as_ref().map(Records::len).unwrap_or(0);
    let _ = writeln!(
        out,
        "<p class=\"count\">{}</p>",
        escape_html(&count_label(kind, count))
    );

    out.push_str("<table>\n<thead><tr>");
    for header in headers(kind) {
        let _ = write!(out, "<th>{}</th>", escape_html(&header));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    out.push_str(&render_body_rows(kind, table));
    out.push_str("</tbody>\n</table>\n</section>\n");
    out
}

fn render_body_rows(kind: ResourceKind, table: &TableData) -> String {
    let columns = headers(kind).len();
    match table.records.as_ref() {
        Some(records) if !records.is_empty() => match records {
            Records::Pods(pods) => pods.iter().map(pod_html_row).collect(),
            Records::Services(services) => services.iter().map(service_html_row).collect(),
            Records::Events(events) => events.iter().map(event_html_row).collect(),
        },
        _ => format!(
            "<tr><td colspan=\"{columns}\" class=\"empty\">{}</td></tr>\n",
            escape_html(&empty_state_message(kind))
        ),
    }
}

fn pod_html_row(pod: &Pod) -> String {
    format!(
        "<tr><td><span class=\"namespace-badge\">{}</span></td>\
         <td><strong>{}</strong></td><td><code>{}</code></td></tr>\n",
        escape_html(pod.namespace.as_deref().unwrap_or("")),
        escape_html(pod.name.as_deref().unwrap_or("")),
        escape_html(pod.pod_ip.as_deref().unwrap_or("N/A")),
    )
}

fn service_html_row(service: &Service) -> String {
    let ports = port_items(&service.ports);
    let ports_html = if ports.is_empty() {
        "<span class=\"muted\">None</span>".to_string()
    } else {
        let items = ports
            .iter()
            .map(|item| format!("<span class=\"port-item\">{}</span>", escape_html(item)))
            .collect::<String>();
        format!("<div class=\"port-list\">{items}</div>")
    };

    let selectors = selector_items(service.selector.as_ref());
    let selector_html = if selectors.is_empty() {
        "<span class=\"muted\">None</span>".to_string()
    } else {
        let lines = selectors
            .iter()
            .map(|item| escape_html(item))
            .collect::<Vec<_>>()
            .join("<br>");
        format!("<div class=\"selector-list\">{lines}</div>")
    };

    let service_type = service.service_type.as_deref().unwrap_or("");
    format!(
        "<tr><td><span class=\"namespace-badge\">{}</span></td>\
         <td><strong>{}</strong></td>\
         <td><span class=\"badge badge-{}\">{}</span></td>\
         <td><code>{}</code></td><td>{ports_html}</td><td>{selector_html}</td></tr>\n",
        escape_html(service.namespace.as_deref().unwrap_or("")),
        escape_html(service.name.as_deref().unwrap_or("")),
        service_type_class(service_type),
        escape_html(service_type),
        escape_html(service.cluster_ip.as_deref().unwrap_or("N/A")),
    )
}

fn event_html_row(event: &Event) -> String {
    let object = event.involved_object.as_ref();
    let message = event.message.as_deref().unwrap_or("N/A");
    let last_seen = format_timestamp(event.last_seen().or(Some("Unknown")));
    let event_type = event.event_type.as_deref().unwrap_or("Normal");
    format!(
        "<tr><td><span class=\"badge {}\">{}</span></td>\
         <td><span class=\"namespace-badge\">{}</span></td>\
         <td><strong>{}</strong></td>\
         <td class=\"message\" title=\"{}\">{}</td>\
         <td><div class=\"object-info\"><span class=\"object-kind\">{}</span><br>\
         <small>{}</small></div></td>\
         <td><small>{}</small></td></tr>\n",
        event_badge_class(event_type),
        escape_html(event_type),
        escape_html(event.namespace.as_deref().unwrap_or("")),
        escape_html(event.reason.as_deref().unwrap_or("")),
        escape_html(message),
        escape_html(&truncate_message(message, MESSAGE_PREVIEW_CHARS)),
        escape_html(object.and_then(|o| o.kind.as_deref()).unwrap_or("N/A")),
        escape_html(object.and_then(|o| o.name.as_deref()).unwrap_or("N/A")),
        escape_html(&last_seen),
    )
}

const REPORT_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Cluster report</title>
<style>
body { font-family: sans-serif; margin: 2rem; color: #1f2937; }
table { border-collapse: collapse; width: 100%; margin-bottom: 2rem; }
th, td { border: 1px solid #e5e7eb; padding: 6px 10px; text-align: left; vertical-align: top; }
th { background: #f3f4f6; }
.count, .generated { color: #6b7280; font-size: 0.9rem; }
.error { color: #b91c1c; background: #fef2f2; padding: 8px 12px; border-radius: 4px; }
.empty { text-align: center; padding: 40px; color: #6b7280; }
.muted { color: #9ca3af; }
.badge { padding: 2px 8px; border-radius: 10px; font-size: 0.85rem; }
.badge-warning { background: #fef3c7; color: #92400e; }
.badge-normal { background: #d1fae5; color: #065f46; }
.namespace-badge { background: #e0e7ff; color: #3730a3; padding: 2px 8px; border-radius: 10px; }
.port-item { background: #f3f4f6; border-radius: 4px; padding: 1px 6px; margin-right: 4px; }
.message { max-width: 300px; overflow: hidden; text-overflow: ellipsis; }
</style>
</head>
<body>
<h1>Cluster report</h1>
"#;
