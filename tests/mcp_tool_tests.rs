mod common;

use common::{REALM, spawn_authenticated_services, spawn_services};
use quickbooks_bridge::BridgeError;
use quickbooks_bridge::mcp::QuickBooksTools;
use rmcp::model::JsonObject;
use serde_json::{Value, json};

fn args(v: Value) -> JsonObject {
    match v {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

#[tokio::test]
async fn auth_tools_describe_connection() {
    let (_mock, _cfg, services) = spawn_services().await;
    let tools = QuickBooksTools::new(services.gateway.clone());

    let text = tools
        .dispatch("getAuthStatus", JsonObject::new())
        .await
        .expect("status");
    assert!(text.starts_with("Not authenticated with QuickBooks\n\nStatus: "));
    assert!(text.contains("\"isAuthenticated\": false"));

    let text = tools
        .dispatch("initiateAuth", JsonObject::new())
        .await
        .expect("initiate");
    assert!(text.starts_with(
        "Please visit the following URL to authenticate with QuickBooks:\n\nhttps://appcenter.intuit.com/connect/oauth2?"
    ));
    assert!(text.contains("state=quickbooks-bridge"));
}

#[tokio::test]
async fn reads_report_not_authenticated_without_session() {
    let (mock, _cfg, services) = spawn_services().await;
    let tools = QuickBooksTools::new(services.gateway.clone());

    let err = tools
        .dispatch("getCustomers", JsonObject::new())
        .await
        .expect_err("not connected");
    assert!(matches!(err, BridgeError::NotAuthenticated));
    assert_eq!(mock.api_hits(), 0);
}

#[tokio::test]
async fn read_tools_format_results() {
    let (mock, _cfg, services) = spawn_authenticated_services().await;
    let tools = QuickBooksTools::new(services.gateway.clone());

    let text = tools
        .dispatch("getCustomers", args(json!({ "limit": 5, "nameFilter": "Amy" })))
        .await
        .expect("customers");
    assert!(text.starts_with("Found 1 customers:\n\n"));
    assert!(text.contains("Amy's Bird Sanctuary"));
    assert_eq!(mock.api_call(0).param("maxresults"), Some("5"));

    let text = tools
        .dispatch("getInvoices", JsonObject::new())
        .await
        .expect("invoices");
    assert!(text.starts_with("Found 1 invoices:\n\n"));
    assert_eq!(mock.api_call(1).param("maxresults"), Some("100"));

    let text = tools
        .dispatch("getAccounts", args(json!({ "accountType": "Bank", "active": true })))
        .await
        .expect("accounts");
    assert!(text.starts_with("Found 1 accounts:\n\n"));

    let text = tools
        .dispatch(
            "getProfitAndLoss",
            args(json!({ "startDate": "2024-01-01", "endDate": "2024-06-30" })),
        )
        .await
        .expect("pnl");
    assert!(text.starts_with("Profit and Loss report for 2024-01-01 to 2024-06-30:\n\n"));
    assert_eq!(mock.api_call(3).param("accounting_method"), Some("Accrual"));

    let text = tools
        .dispatch(
            "getBalanceSheet",
            args(json!({ "asOfDate": "2024-06-30", "accountingMethod": "Cash" })),
        )
        .await
        .expect("balance sheet");
    assert!(text.starts_with("Balance Sheet report as of 2024-06-30:\n\n"));
    assert_eq!(mock.api_call(4).param("accounting_method"), Some("Cash"));

    let text = tools
        .dispatch("getAuthStatus", JsonObject::new())
        .await
        .expect("status");
    assert!(text.starts_with("Authenticated with QuickBooks\n\nStatus: "));
    assert!(text.contains(REALM));
}

#[tokio::test]
async fn malformed_arguments_are_rejected_before_any_request() {
    let (mock, _cfg, services) = spawn_authenticated_services().await;
    let tools = QuickBooksTools::new(services.gateway.clone());

    let cases = [
        ("getCustomers", json!({ "limit": 0 })),
        ("getCustomers", json!({ "limit": 1001 })),
        ("getInvoices", json!({ "offset": -1 })),
        ("getAccounts", json!({ "active": "yes" })),
        ("getProfitAndLoss", json!({ "endDate": "2024-06-30" })),
        ("getBalanceSheet", json!({})),
    ];
    for (tool, raw) in cases {
        let err = tools.dispatch(tool, args(raw)).await.expect_err("rejected");
        assert!(matches!(err, BridgeError::Validation(_)), "{tool}: {err}");
    }

    let err = tools
        .dispatch("deleteCompany", JsonObject::new())
        .await
        .expect_err("unknown");
    assert!(matches!(err, BridgeError::Validation(ref m) if m == "Unknown tool: deleteCompany"));
    assert_eq!(mock.api_hits(), 0);
}
