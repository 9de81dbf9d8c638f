use std::{str::FromStr, time::Duration};

use alloy::{
    node_bindings::{Anvil, AnvilInstance},
    primitives::{Address, Bytes, U256},
    providers::{Provider, ext::AnvilApi},
    transports::http::reqwest::header::HeaderMap,
};
use demo_core::{
    chain::{Chain, ChainConfig, RpcChain},
    credentials::SigningCredential,
    error::DemoError,
    rpc_clients::transport::SharedClientTransportBuilder,
    signer::EoaSigner,
    transaction::{InnerCall, demo_calls},
};
use demo_eip7702_core::{
    constants::{BATCH_CALL_DELEGATION_ADDRESS, REVOKE_DELEGATION_ADDRESS},
    delegated_account::DelegatedAccount,
};

const RECEIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime code implementing `execute((address,uint256,bytes)[])`: forwards
/// each call with its value and bubbles up the first revert
const BATCH_CALL_DELEGATION_RUNTIME: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/bytecode/batch_call_delegation.hex"
));

struct TestSetup {
    // Keeps the node alive for the duration of the test
    _anvil: AnvilInstance,
    chain: RpcChain,
    credentials: SigningCredential,
    signer: EoaSigner,
}

impl TestSetup {
    async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_node(Anvil::new().block_time(1)).await
    }

    async fn with_node(node: Anvil) -> Result<Self, Box<dyn std::error::Error>> {
        let anvil = node.prague().chain_id(31337).try_spawn()?;

        let transport_builder = SharedClientTransportBuilder::with_new_client()?;
        let endpoint = anvil.endpoint();
        let chain = ChainConfig {
            chain_id: 31337,
            rpc_url: &endpoint,
            explorer_url: "https://sepolia.etherscan.io",
            headers: HeaderMap::new(),
            transport_builder: &transport_builder,
        }
        .to_chain()?;

        let credentials = SigningCredential::random_local();
        chain
            .provider()
            .anvil_set_balance(credentials.address(), U256::from(10).pow(U256::from(18)))
            .await?;

        Ok(Self {
            _anvil: anvil,
            chain,
            credentials,
            signer: EoaSigner::new(),
        })
    }

    fn account(&self) -> DelegatedAccount<RpcChain> {
        DelegatedAccount::new(self.credentials.address(), self.chain.clone())
    }

    /// Sign a self-executed authorization for `contract` and send it
    async fn authorize(&self, contract: Address) -> Result<(), DemoError> {
        let account = self.account();
        let authorization = account
            .sign_authorization(&self.signer, &self.credentials, contract)
            .await?;

        let submitted = account
            .authorization_transaction(authorization)
            .send(&self.signer, &self.credentials, Some(RECEIPT_TIMEOUT))
            .await?;

        let receipt = submitted.receipt.expect("receipt was requested");
        assert!(receipt.success, "authorization tx reverted");
        assert!(
            submitted
                .explorer_url
                .ends_with(&submitted.transaction_hash.to_string())
        );
        Ok(())
    }

    /// Install the delegate's runtime code on the local node
    async fn install_delegate_code(&self) -> Result<(), Box<dyn std::error::Error>> {
        let code = Bytes::from_str(BATCH_CALL_DELEGATION_RUNTIME.trim())?;
        self.chain
            .provider()
            .anvil_set_code(BATCH_CALL_DELEGATION_ADDRESS, code)
            .await?;
        Ok(())
    }
}

#[tokio::test]
async fn delegate_then_revoke_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let setup = TestSetup::new().await?;
    let account = setup.account();

    let status = account.delegation_status().await?;
    assert!(!status.delegated);
    assert_eq!(status.code_length, 0);

    setup.authorize(BATCH_CALL_DELEGATION_ADDRESS).await?;

    let status = account.delegation_status().await?;
    assert!(status.delegated);
    assert_eq!(status.target, Some(BATCH_CALL_DELEGATION_ADDRESS));
    assert!(
        account
            .is_delegated_to(Some(BATCH_CALL_DELEGATION_ADDRESS))
            .await?
    );

    setup.authorize(REVOKE_DELEGATION_ADDRESS).await?;

    let status = account.delegation_status().await?;
    assert!(!status.delegated);
    assert_eq!(status.target, None);

    Ok(())
}

#[tokio::test]
async fn authorization_signed_by_another_key_is_refused() -> Result<(), Box<dyn std::error::Error>>
{
    let setup = TestSetup::new().await?;
    let stranger = SigningCredential::random_local();

    let err = setup
        .account()
        .sign_authorization(&setup.signer, &stranger, BATCH_CALL_DELEGATION_ADDRESS)
        .await
        .unwrap_err();

    assert!(matches!(err, DemoError::SigningError { .. }));
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_rejected_before_touching_the_chain() -> Result<(), Box<dyn std::error::Error>>
{
    let setup = TestSetup::new().await?;
    let result = setup.account().batch_transaction(&[]);
    assert!(matches!(result, Err(DemoError::ValidationError { .. })));
    Ok(())
}

#[tokio::test]
async fn delegated_account_executes_demo_batch() -> Result<(), Box<dyn std::error::Error>> {
    let setup = TestSetup::new().await?;
    setup.install_delegate_code().await?;
    setup.authorize(BATCH_CALL_DELEGATION_ADDRESS).await?;

    let calls = demo_calls();
    let recipients: Vec<Address> = calls.iter().map(|call: &InnerCall| call.to).collect();
    let mut before = Vec::new();
    for recipient in &recipients {
        before.push(setup.chain.provider().get_balance(*recipient).await?);
    }

    let transaction = setup.account().batch_transaction(&calls)?;
    let submitted = transaction
        .send(&setup.signer, &setup.credentials, Some(RECEIPT_TIMEOUT))
        .await?;
    let receipt = submitted.receipt.clone().expect("receipt was requested");
    assert!(receipt.success);
    assert!(!submitted.reverted());

    for ((recipient, balance_before), call) in recipients.iter().zip(before).zip(&calls) {
        let balance_after = setup.chain.provider().get_balance(*recipient).await?;
        assert_eq!(balance_after - balance_before, call.value);
    }

    // the transaction carried exactly the sum of the call values
    let mined = setup
        .chain
        .provider()
        .get_transaction_by_hash(submitted.transaction_hash)
        .await?
        .expect("mined transaction");
    let total: U256 = calls.iter().map(|call| call.value).sum();
    assert_eq!(alloy::consensus::Transaction::value(&mined), total);

    Ok(())
}

#[tokio::test]
async fn failing_call_is_caught_before_broadcast() -> Result<(), Box<dyn std::error::Error>> {
    let setup = TestSetup::new().await?;
    setup.install_delegate_code().await?;
    setup.authorize(BATCH_CALL_DELEGATION_ADDRESS).await?;

    // INVALID opcode: any call into this account reverts
    let reverter = Address::repeat_byte(0x42);
    setup
        .chain
        .provider()
        .anvil_set_code(reverter, Bytes::from_static(&[0xfe]))
        .await?;

    let calls = vec![InnerCall {
        to: reverter,
        value: U256::ZERO,
        data: Bytes::new(),
    }];
    let nonce_before = setup.account().get_nonce().await?;

    let err = setup
        .account()
        .batch_transaction(&calls)?
        .send(&setup.signer, &setup.credentials, Some(RECEIPT_TIMEOUT))
        .await
        .unwrap_err();

    assert!(matches!(err, DemoError::SimulationFailed { .. }), "{err:?}");
    assert_eq!(setup.account().get_nonce().await?, nonce_before);
    Ok(())
}

#[tokio::test]
async fn receipt_timeout_still_reports_the_broadcast() -> Result<(), Box<dyn std::error::Error>> {
    // nothing gets mined, so the receipt never arrives
    let setup = TestSetup::with_node(Anvil::new().arg("--no-mining")).await?;
    let account = setup.account();

    let authorization = account
        .sign_authorization(&setup.signer, &setup.credentials, BATCH_CALL_DELEGATION_ADDRESS)
        .await?;
    let submitted = account
        .clone()
        .authorization_transaction(authorization)
        .send(
            &setup.signer,
            &setup.credentials,
            Some(Duration::from_millis(500)),
        )
        .await?;

    assert!(submitted.receipt.is_none());
    assert!(submitted.receipt_error.is_some());
    assert!(!submitted.reverted());

    let pending = setup
        .chain
        .provider()
        .get_transaction_by_hash(submitted.transaction_hash)
        .await?;
    assert!(pending.is_some(), "transaction should sit in the mempool");
    Ok(())
}
