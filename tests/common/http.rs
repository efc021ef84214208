//! Inspection helpers for wiremock servers

#![allow(dead_code)]

use wiremock::MockServer;

/// `User-Agent` of every request the server received, in arrival order.
///
/// wiremock stores header values split at commas, so a browser UA such as
/// `(KHTML, like Gecko)` arrives in pieces; they are joined back here.
pub async fn received_user_agents(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| {
            request
                .headers
                .iter()
                .find(|(name, _)| name.as_str().eq_ignore_ascii_case("user-agent"))
                .map(|(_, values)| values.iter().map(|v| v.as_str().trim()).collect::<Vec<_>>().join(", "))
        })
        .collect()
}
