//! Connector behaviour against mock wallets and mock JSON-RPC endpoints

use std::sync::Arc;
use web3sdk_connect::{
    Connector, ConnectError, ErrorCategory, InjectedConnector, NativeCurrency, NetworkConnector,
    NetworkSettings, RelayConnector,
};
use web3sdk_provider::WalletRpcError;
use web3sdk_testing::rpc::mock_chain_endpoint;
use web3sdk_testing::{MockEnvironment, MockRelay, MockWallet};
use wiremock::MockServer;

fn settings(chain_id: u64, rpc_url: &str) -> NetworkSettings {
    NetworkSettings::new(
        chain_id,
        format!("chain {chain_id}"),
        NativeCurrency::new("Ether", "ETH"),
        rpc_url,
    )
}

fn offline_chains(ids: &[u64]) -> Vec<NetworkSettings> {
    ids.iter()
        .map(|&id| settings(id, &format!("http://127.0.0.1:9/{id}")))
        .collect()
}

async fn live_chains(ids: &[u64]) -> (Vec<MockServer>, Vec<NetworkSettings>) {
    let mut servers = Vec::new();
    let mut chains = Vec::new();
    for &id in ids {
        let server = mock_chain_endpoint(id).await;
        chains.push(settings(id, &server.uri()));
        servers.push(server);
    }
    (servers, chains)
}

fn full_env(wallet: Arc<MockWallet>) -> MockEnvironment {
    MockEnvironment::with_extension(wallet).with_relay(MockRelay::new(["0xabc"]).shared())
}

#[test]
fn test_every_variant_rejects_empty_chains() {
    let env = full_env(MockWallet::new(1).shared());

    let errors = [
        NetworkConnector::new(&[]).unwrap_err(),
        InjectedConnector::new(&[], &env).unwrap_err(),
        RelayConnector::new(&[], &env).unwrap_err(),
    ];
    for err in errors {
        assert!(matches!(err, ConnectError::NoChainsConfigured { .. }));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}

#[tokio::test]
async fn test_disallowed_switch_fails_without_side_effects() {
    let chains = offline_chains(&[1, 137]);
    let wallet = MockWallet::new(1).with_accounts(["0xabc"]).shared();
    let relay = MockRelay::new(["0xabc"]).shared();
    let env = MockEnvironment::with_extension(wallet.clone()).with_relay(relay.clone());

    let connectors: Vec<Arc<dyn Connector>> = vec![
        Arc::new(NetworkConnector::new(&chains).unwrap()),
        Arc::new(InjectedConnector::new(&chains, &env).unwrap()),
        Arc::new(RelayConnector::new(&chains, &env).unwrap()),
    ];

    for connector in connectors {
        let before = connector.provider();
        let err = connector.switch_chain(56).await.unwrap_err();
        assert!(
            matches!(err, ConnectError::ChainNotAllowed { chain_id: 56, .. }),
            "{}: {err}",
            connector.name()
        );
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(Arc::ptr_eq(&before, &connector.provider()));
    }

    assert!(wallet.calls().is_empty());
    assert!(relay.opened().is_empty());
}

#[tokio::test]
async fn test_network_connector_connect_switches_to_requested_chain() {
    let (_servers, chains) = live_chains(&[1, 137]).await;
    let connector = NetworkConnector::new(&chains).unwrap();

    let network = connector.connect(Some(137)).await.unwrap();
    assert_eq!(network.chain_id, 137);
    assert_eq!(connector.get_network().await.unwrap().chain_id, 137);
}

#[tokio::test]
async fn test_network_connector_without_chain_reports_first() {
    let (_servers, chains) = live_chains(&[56, 1]).await;
    let connector = NetworkConnector::new(&chains).unwrap();

    let network = connector.connect(None).await.unwrap();
    assert_eq!(network.chain_id, 56);
    assert_eq!(network.name, "bsc");
}

#[tokio::test]
async fn test_unreachable_endpoint_is_provider_unreachable() {
    let connector = NetworkConnector::new(&offline_chains(&[1])).unwrap();
    let err = connector.connect(None).await.unwrap_err();
    assert!(matches!(err, ConnectError::ProviderUnreachable { .. }));
}

#[tokio::test]
async fn test_injected_connect_without_chain_reports_wallet_chain() {
    let chains = offline_chains(&[1, 137]);
    let wallet = MockWallet::new(137).with_accounts(["0xabc"]).shared();
    let env = MockEnvironment::with_extension(wallet.clone());
    let connector = InjectedConnector::new(&chains, &env).unwrap();

    let network = connector.connect(None).await.unwrap();
    assert_eq!(network.chain_id, 137);
    assert_eq!(connector.get_network().await.unwrap(), network);
    assert_eq!(wallet.methods(), vec!["eth_requestAccounts", "eth_chainId", "eth_chainId"]);
}

#[tokio::test]
async fn test_injected_rejection_is_permission_denied() {
    let wallet = MockWallet::new(1).rejecting_accounts().shared();
    let env = MockEnvironment::with_extension(wallet);
    let connector = InjectedConnector::new(&offline_chains(&[1]), &env).unwrap();

    let err = connector.connect(None).await.unwrap_err();
    assert!(matches!(err, ConnectError::PermissionDenied { .. }));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_injected_empty_accounts() {
    let wallet = MockWallet::new(1).shared();
    let env = MockEnvironment::with_extension(wallet);
    let connector = InjectedConnector::new(&offline_chains(&[1]), &env).unwrap();

    let err = connector.connect(None).await.unwrap_err();
    assert!(matches!(err, ConnectError::EmptyAccounts { .. }));
}

#[tokio::test]
async fn test_injected_switch_registers_unknown_chain() {
    let chains = offline_chains(&[1, 137]);
    let wallet = MockWallet::new(1).with_accounts(["0xabc"]).shared();
    let env = MockEnvironment::with_extension(wallet.clone());
    let connector = InjectedConnector::new(&chains, &env).unwrap();

    let network = connector.connect(Some(137)).await.unwrap();
    assert_eq!(network.chain_id, 137);
    assert_eq!(
        wallet.methods(),
        vec![
            "eth_requestAccounts",
            "wallet_switchEthereumChain",
            "wallet_addEthereumChain",
            "wallet_switchEthereumChain",
            "eth_chainId",
        ]
    );
}

#[tokio::test]
async fn test_injected_switch_failures_are_swallowed() {
    let chains = offline_chains(&[1, 137]);
    let wallet = MockWallet::new(1)
        .with_accounts(["0xabc"])
        .rejecting_chain_add()
        .shared();
    let env = MockEnvironment::with_extension(wallet.clone());
    let connector = InjectedConnector::new(&chains, &env).unwrap();

    // The wallet refuses to add 137; the switch silently stays on 1.
    let network = connector.switch_chain(137).await.unwrap();
    assert_eq!(network.chain_id, 1);

    let wallet = MockWallet::new(1)
        .with_known_chains([137])
        .failing_switch(WalletRpcError::user_rejected())
        .shared();
    let env = MockEnvironment::with_extension(wallet.clone());
    let connector = InjectedConnector::new(&chains, &env).unwrap();
    let network = connector.switch_chain(137).await.unwrap();
    assert_eq!(network.chain_id, 1);
    assert!(!wallet.methods().contains(&"wallet_addEthereumChain".to_string()));
}

#[tokio::test]
async fn test_relay_disconnect_releases_session() {
    let relay = MockRelay::new(["0xabc"]).shared();
    let env = MockEnvironment::headless().with_relay(relay.clone());
    let connector = RelayConnector::new(&offline_chains(&[1, 137]), &env).unwrap();

    connector.connect(None).await.unwrap();
    assert!(connector.has_session().await);

    connector.disconnect().await.unwrap();
    assert!(!connector.has_session().await);
    assert!(relay.last_session().unwrap().is_disconnected());

    // A second disconnect has nothing left to release.
    connector.disconnect().await.unwrap();
    assert_eq!(relay.sessions().len(), 1);
}

#[tokio::test]
async fn test_relay_open_failure_is_permission_denied() {
    let relay = MockRelay::new(["0xabc"]).failing_open().shared();
    let env = MockEnvironment::headless().with_relay(relay);
    let connector = RelayConnector::new(&offline_chains(&[1]), &env).unwrap();

    let err = connector.connect(None).await.unwrap_err();
    assert!(matches!(err, ConnectError::PermissionDenied { .. }));
}
