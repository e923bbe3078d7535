mod common;

use common::{API_KEY, McpClient, start_gateway};
use serde_json::json;

#[tokio::test]
async fn initialize_ping_and_notifications() -> anyhow::Result<()> {
    let (server, _vendors) = start_gateway(API_KEY).await?;
    let client = McpClient::bearer(server.base_url());

    let init = client
        .request(
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "revops-integration-tests", "version": "0" }
            }),
        )
        .await?;
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
    assert!(init["result"]["capabilities"]["tools"].is_object());
    assert_eq!(init["result"]["serverInfo"]["name"], "RevOps Functions Server");

    let pong = client.request("ping", json!({})).await?;
    assert_eq!(pong["result"], json!({}));

    let resp = client
        .post_raw(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string())
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);

    let resp = client
        .post_raw(json!({ "jsonrpc": "2.0", "id": null, "method": "ping" }).to_string())
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let v: serde_json::Value = resp.json().await?;
    assert_eq!(v["result"], json!({}));
    assert_eq!(v["id"], serde_json::Value::Null);

    server.stop().await
}

#[tokio::test]
async fn tools_list_advertises_every_tool() -> anyhow::Result<()> {
    let (server, vendors) = start_gateway(API_KEY).await?;
    let client = McpClient::bearer(server.base_url());

    let resp = client.request("tools/list", json!({})).await?;
    let tools = resp["result"]["tools"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    let mut names: Vec<String> = tools
        .iter()
        .filter_map(|t| t["name"].as_str().map(str::to_string))
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "create_calendar_event",
            "create_salesforce_lead",
            "delete_calendar_event",
            "find_salesforce_contact_or_lead",
            "get_calendar_free_busy",
            "log_salesforce_task",
            "send_email",
            "update_calendar_event",
        ]
    );
    for t in &tools {
        assert_eq!(t["inputSchema"]["type"], "object", "{t}");
    }
    assert_eq!(vendors.count(), 0);

    server.stop().await
}

#[tokio::test]
async fn unknown_tool_is_a_structured_error_without_vendor_calls() -> anyhow::Result<()> {
    let (server, vendors) = start_gateway(API_KEY).await?;
    let client = McpClient::bearer(server.base_url());

    let resp = client.call_tool("send_fax", json!({})).await?;
    assert_eq!(resp["error"]["code"], -32602);
    assert_eq!(resp["error"]["message"], "unknown tool: send_fax");
    assert!(resp.get("result").is_none());
    assert_eq!(vendors.count(), 0);

    server.stop().await
}

#[tokio::test]
async fn protocol_errors() -> anyhow::Result<()> {
    let (server, _vendors) = start_gateway(API_KEY).await?;
    let client = McpClient::bearer(server.base_url());

    let unknown = client.request("resources/list", json!({})).await?;
    assert_eq!(unknown["error"]["code"], -32601);

    let resp = client.post_raw("{not json".to_string()).await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let v: serde_json::Value = resp.json().await?;
    assert_eq!(v["error"]["code"], -32700);
    assert_eq!(v["id"], serde_json::Value::Null);

    let resp = client
        .post_raw(json!({ "jsonrpc": "2.0", "id": 3 }).to_string())
        .await?;
    let v: serde_json::Value = resp.json().await?;
    assert_eq!(v["error"]["code"], -32600);
    assert_eq!(v["id"], 3);

    server.stop().await
}

#[tokio::test]
async fn invalid_arguments_are_rejected_before_vendor_calls() -> anyhow::Result<()> {
    let (server, vendors) = start_gateway(API_KEY).await?;
    let client = McpClient::bearer(server.base_url());

    let resp = client
        .call_tool("send_email", json!({ "to": "a@example.com", "subject": "s" }))
        .await?;
    assert_eq!(resp["error"]["code"], -32602);
    assert_eq!(resp["error"]["data"]["violations"][0]["parameter"], "message_text");

    let resp = client
        .call_tool(
            "create_calendar_event",
            json!({ "event_details": { "summary": "x", "start": { "date_time": "2024-01-15T09:00:00Z" } } }),
        )
        .await?;
    assert_eq!(resp["error"]["code"], -32602);

    let resp = client
        .call_tool(
            "create_salesforce_lead",
            json!({ "fields": { "LastName": "Smith", "Industry": "Retail" } }),
        )
        .await?;
    assert_eq!(resp["error"]["code"], -32602);

    let resp = client
        .call_tool("delete_calendar_event", json!({ "event_id": "   " }))
        .await?;
    assert_eq!(resp["error"]["code"], -32602);

    let resp = client
        .call_tool(
            "send_email",
            json!({ "to": "   ", "subject": "s", "message_text": "m" }),
        )
        .await?;
    assert_eq!(resp["error"]["code"], -32602);

    assert_eq!(vendors.count(), 0);

    server.stop().await
}

#[tokio::test]
async fn blank_lookup_is_not_found_without_querying() -> anyhow::Result<()> {
    let (server, vendors) = start_gateway(API_KEY).await?;
    let client = McpClient::bearer(server.base_url());

    let resp = client
        .call_tool("find_salesforce_contact_or_lead", json!({ "email": " ", "phone": "" }))
        .await?;
    assert_eq!(resp["result"]["isError"], false);
    assert_eq!(resp["result"]["structuredContent"], json!({ "found": false }));
    assert_eq!(vendors.count(), 0);

    let resp = client
        .call_tool("find_salesforce_contact_or_lead", json!({ "email": "nobody@example.com" }))
        .await?;
    assert_eq!(resp["result"]["structuredContent"], json!({ "found": false }));
    assert_eq!(vendors.count(), 2);

    server.stop().await
}

#[tokio::test]
async fn empty_lead_gets_unknown_last_name_and_company() -> anyhow::Result<()> {
    let (server, vendors) = start_gateway(API_KEY).await?;
    let client = McpClient::bearer(server.base_url());

    let resp = client
        .call_tool("create_salesforce_lead", json!({ "fields": {} }))
        .await?;
    assert_eq!(resp["result"]["isError"], false);
    assert_eq!(resp["result"]["structuredContent"]["id"], "00TXX0000001");
    assert_eq!(
        vendors.created(),
        vec![(
            "Lead".to_string(),
            json!({ "LastName": "Unknown", "Company": "Unknown" })
        )]
    );

    server.stop().await
}

#[tokio::test]
async fn task_logging_reports_success_or_failure_in_payload() -> anyhow::Result<()> {
    let (server, vendors) = start_gateway(API_KEY).await?;
    let client = McpClient::bearer(server.base_url());
    let args = json!({ "person_id": "003XX000004TmiQYAS", "subject": "Call", "body": "Notes" });

    let ok = client.call_tool("log_salesforce_task", args.clone()).await?;
    assert_eq!(ok["result"]["isError"], false);
    assert_eq!(
        ok["result"]["structuredContent"],
        json!({ "success": true, "id": "00TXX0000001" })
    );

    vendors.fail_with("INVALID_CROSS_REFERENCE_KEY");
    let failed = client.call_tool("log_salesforce_task", args).await?;
    assert!(failed.get("error").is_none());
    assert_eq!(failed["result"]["isError"], true);
    assert_eq!(failed["result"]["structuredContent"]["success"], false);
    assert!(
        failed["result"]["structuredContent"]["error"]
            .as_str()
            .is_some_and(|e| e.contains("INVALID_CROSS_REFERENCE_KEY"))
    );

    server.stop().await
}

#[tokio::test]
async fn vendor_failures_are_tagged_results() -> anyhow::Result<()> {
    let (server, vendors) = start_gateway(API_KEY).await?;
    let client = McpClient::bearer(server.base_url());
    vendors.fail_with("connection refused");

    let resp = client
        .call_tool("delete_calendar_event", json!({ "event_id": "evt-1" }))
        .await?;
    assert_eq!(resp["result"]["isError"], true);
    assert_eq!(resp["result"]["structuredContent"]["success"], false);
    let text = resp["result"]["content"][0]["text"].as_str().unwrap_or_default();
    assert!(text.contains("connection refused"), "{text}");
    assert_eq!(vendors.calls(), vec!["calendar.delete:primary:evt-1".to_string()]);

    server.stop().await
}
