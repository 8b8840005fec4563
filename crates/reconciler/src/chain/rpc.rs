//! HTTP RPC chain client backed by alloy.

use alloy::json_abi::Function;
use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::sol;
use alloy::transports::http::{Client, Http};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::IntoFuture;
use std::time::Duration;
use tracing::debug;

use super::{ChainClient, ChainError, ContractHandle, OnchainQuestion};

// Generate FactHound view bindings
sol! {
    #[allow(missing_docs)]
    #[sol(rpc, abi)]
    contract FactHound {
        struct QuestionInfo {
            address asker;
            address oracle;
            uint256 bounty;
            uint8 status;
            bytes32 selectedAnswer;
        }

        function owner() external view returns (address);
        function getQuestion(bytes32 questionHash) external view returns (QuestionInfo memory);
        function getAnswererAddress(bytes32 questionHash, bytes32 answerHash) external view returns (address);
    }
}

/// Functions as the compiled bindings encode and decode them, keyed by name.
pub(crate) fn bound_functions() -> BTreeMap<String, Vec<Function>> {
    FactHound::abi::functions()
}

/// HTTP RPC client for reading FactHound contracts.
///
/// Constructed once at startup and shared by reference with every engine instance.
#[derive(Clone)]
pub struct RpcChainClient {
    provider: RootProvider<Http<Client>>,
    call_timeout: Duration,
}

impl RpcChainClient {
    /// Create a new client for the given RPC endpoint.
    pub fn new(rpc_url: &str, call_timeout: Duration) -> Result<Self> {
        let url = rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;

        let provider = ProviderBuilder::new().on_http(url);

        Ok(Self {
            provider,
            call_timeout,
        })
    }

    /// Fail unless the endpoint serves the expected chain.
    pub async fn ensure_chain_id(&self, expected: u64) -> Result<()> {
        let actual = self
            .provider
            .get_chain_id()
            .await
            .context("Failed to query chain id")?;

        if actual != expected {
            anyhow::bail!(
                "RPC endpoint reports chain id {} but {} is configured",
                actual,
                expected
            );
        }

        Ok(())
    }

    async fn timed<F, T>(&self, method: &'static str, call: F) -> Result<T, ChainError>
    where
        F: IntoFuture<Output = Result<T, alloy::contract::Error>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ChainError::ContractCall {
                method,
                reason: e.to_string(),
            }),
            Err(_) => Err(ChainError::Timeout {
                method,
                secs: self.call_timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn load_contract(&self, address: Address) -> Result<ContractHandle, ChainError> {
        if address.is_zero() {
            return Err(ChainError::ContractLoad {
                address,
                reason: "zero address".to_string(),
            });
        }

        let code = match tokio::time::timeout(self.call_timeout, self.provider.get_code_at(address))
            .await
        {
            Ok(Ok(code)) => code,
            Ok(Err(e)) => {
                return Err(ChainError::ContractLoad {
                    address,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ChainError::ContractLoad {
                    address,
                    reason: format!("eth_getCode timed out after {}s", self.call_timeout.as_secs()),
                })
            }
        };

        if code.is_empty() {
            return Err(ChainError::ContractLoad {
                address,
                reason: "no contract deployed".to_string(),
            });
        }

        debug!("Loaded contract {} ({} bytes of code)", address, code.len());

        Ok(ContractHandle { address })
    }

    async fn owner(&self, contract: &ContractHandle) -> Result<Address, ChainError> {
        let instance = FactHound::new(contract.address, &self.provider);
        let ret = self.timed("owner", instance.owner().call()).await?;
        Ok(ret._0)
    }

    async fn get_question(
        &self,
        contract: &ContractHandle,
        question_hash: B256,
    ) -> Result<OnchainQuestion, ChainError> {
        let instance = FactHound::new(contract.address, &self.provider);
        let ret = self
            .timed("getQuestion", instance.getQuestion(question_hash).call())
            .await?;
        let info = ret._0;

        Ok(OnchainQuestion {
            asker: info.asker,
            bounty: info.bounty,
            status: info.status,
            selected_answer: info.selectedAnswer,
        })
    }

    async fn get_answerer_address(
        &self,
        contract: &ContractHandle,
        question_hash: B256,
        answer_hash: B256,
    ) -> Result<Address, ChainError> {
        let instance = FactHound::new(contract.address, &self.provider);
        let ret = self
            .timed(
                "getAnswererAddress",
                instance.getAnswererAddress(question_hash, answer_hash).call(),
            )
            .await?;
        Ok(ret._0)
    }
}
