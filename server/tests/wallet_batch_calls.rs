
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::Result;
use serde_json::json;
use setup::{MockWallet, TestEnvironment, WALLET_ACCOUNT};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn connected_account_and_atomic_support_are_reported() -> Result<()> {
    let env = TestEnvironment::new(Some(MockWallet::supporting_atomic_batches())).await?;

    let (status, body) = env.get("/v1/wallet/account").await?;
    assert_eq!(status, 200);
    let address: Address = serde_json::from_value(body["result"]["address"].clone())?;
    assert_eq!(address, WALLET_ACCOUNT);
    assert_eq!(body["result"]["chainId"], 11155111);
    assert_eq!(body["result"]["chainMismatch"], false);

    let (status, body) = env.get("/v1/wallet/capabilities").await?;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["support"]["kind"], "supported");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_capabilities_point_to_supported_wallets() -> Result<()> {
    let env = TestEnvironment::new(Some(MockWallet::default())).await?;

    let (status, body) = env.get("/v1/wallet/capabilities").await?;
    assert_eq!(status, 200);
    let support = &body["result"]["support"];
    assert_eq!(support["kind"], "capabilitiesUnavailable");
    assert!(support["message"].as_str().unwrap().contains("Method not found"));
    assert_eq!(support["supportedWallets"].as_array().unwrap().len(), 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn batch_is_sent_atomically_and_polled_until_confirmed() -> Result<()> {
    let wallet = MockWallet::supporting_atomic_batches();
    {
        let mut state = wallet.state.lock().unwrap();
        state.statuses.push_back(json!({ "status": 100, "receipts": [] }));
        state.statuses.push_back(json!({
            "version": "2.0.0",
            "id": "0xcalls1",
            "chainId": "0xaa36a7",
            "status": 200,
            "atomic": true,
            "receipts": [{
                "logs": [],
                "status": "0x1",
                "blockHash": "0x00000000000000000000000000000000000000000000000000000000000000bb",
                "blockNumber": "0x10",
                "gasUsed": "0x5208",
                "transactionHash": "0x00000000000000000000000000000000000000000000000000000000000000aa"
            }]
        }));
    }
    let env = TestEnvironment::new(Some(wallet.clone())).await?;

    let (status, body) = env.post("/v1/wallet/calls", json!({})).await?;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["result"]["callsId"], "0xcalls1");
    assert_eq!(body["result"]["panel"]["canSend"], true);
    assert_eq!(body["result"]["panel"]["sendLabel"], "Send Batch Calls");

    let sent = wallet.sent_requests();
    assert_eq!(sent.len(), 1);
    let request = &sent[0];
    assert_eq!(request["version"], "2.0.0");
    assert_eq!(request["chainId"], "0xaa36a7");
    assert_eq!(request["atomicRequired"], true);
    let from: Address = serde_json::from_value(request["from"].clone())?;
    assert_eq!(from, WALLET_ACCOUNT);
    let calls = request["calls"].as_array().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["to"], "0x0000000000000000000000000000000000000001");
    assert_eq!(calls[1]["to"], "0x0000000000000000000000000000000000000002");
    assert!(calls.iter().all(|call| call["value"] == "0x5af3107a4000"));

    let (status, body) = env.get("/v1/wallet/calls/0xcalls1?wait=true").await?;
    assert_eq!(status, 200, "{body}");
    let result = &body["result"];
    assert_eq!(result["status"], "success");
    assert_eq!(
        result["transactionUrl"],
        "https://sepolia.etherscan.io/tx/0x00000000000000000000000000000000000000000000000000000000000000aa"
    );
    assert_eq!(result["panel"]["status"], "success");

    let (_, body) = env.get("/v1/wallet/panel").await?;
    assert_eq!(body["result"]["callsId"], "0xcalls1");
    assert_eq!(body["result"]["status"], "success");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn status_without_wait_returns_current_answer() -> Result<()> {
    let wallet = MockWallet::supporting_atomic_batches();
    wallet
        .state
        .lock()
        .unwrap()
        .statuses
        .push_back(json!({ "status": "PENDING" }));
    let env = TestEnvironment::new(Some(wallet)).await?;

    let (status, body) = env.get("/v1/wallet/calls/0xcalls1").await?;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["result"]["status"], "pending");
    assert!(body["result"].get("transactionUrl").is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unsupported_contract_rejection_suggests_revoking() -> Result<()> {
    let wallet = MockWallet::supporting_atomic_batches();
    wallet.state.lock().unwrap().send_error =
        Some("unsupported contract 0x1234 for this account".to_string());
    let env = TestEnvironment::new(Some(wallet)).await?;

    let (status, body) = env
        .post(
            "/v1/wallet/calls",
            json!({ "calls": [{ "to": "0x0000000000000000000000000000000000000003" }] }),
        )
        .await?;
    assert_eq!(status, 502, "{body}");
    assert_eq!(body["error"]["details"]["type"], "WALLET_ERROR");
    assert!(body["error"]["hint"].as_str().unwrap().contains("Revoke"));

    let (_, body) = env.get("/v1/wallet/panel").await?;
    let panel = &body["result"];
    assert_eq!(panel["canSend"], true);
    assert!(panel["error"].as_str().unwrap().contains("unsupported contract"));
    assert!(panel["hint"].as_str().unwrap().contains("Revoke"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wallet_routes_need_a_configured_wallet() -> Result<()> {
    let env = TestEnvironment::new(None).await?;

    let (status, body) = env.get("/v1/wallet/account").await?;
    assert_eq!(status, 503);
    assert_eq!(body["error"]["details"]["type"], "WALLET_NOT_CONFIGURED");

    let (status, body) = env.get("/").await?;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["walletPanelEnabled"], false);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wallet_send_completes_after_the_client_hangs_up() -> Result<()> {
    let wallet = MockWallet::supporting_atomic_batches();
    wallet.state.lock().unwrap().send_delay = Some(Duration::from_millis(1000));
    let env = TestEnvironment::new(Some(wallet.clone())).await?;

    let gone = TestEnvironment::impatient_client(Duration::from_millis(200))?
        .post(env.url("/v1/wallet/calls"))
        .json(&json!({}))
        .send()
        .await;
    assert!(gone.is_err(), "request should have timed out");

    let panel = env
        .poll_until("/v1/wallet/panel", Duration::from_secs(10), |panel| {
            panel["callsId"] == "0xcalls1"
        })
        .await?;
    assert_eq!(panel["callsId"], "0xcalls1", "{panel}");
    assert_eq!(panel["canSend"], true);
    assert_eq!(wallet.sent_requests().len(), 1);
    Ok(())
}
