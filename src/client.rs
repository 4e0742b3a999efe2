// src/client.rs
use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::{Middleware, MiddlewareError};
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, U256};
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::contracts::{EntryPoint, SmartAccountFactory, DEFAULT_NONCE_KEY};
use crate::error::AccountError;
use crate::types::GasFees;

/// Read-only view of the chain needed to build a user operation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Counterfactual address from the factory's view function.
    async fn counterfactual_address(
        &self,
        factory: Address,
        module: Address,
        module_setup_data: Bytes,
        index: U256,
    ) -> Result<Address, AccountError>;

    async fn get_code(&self, address: Address) -> Result<Bytes, AccountError>;

    /// Sequential nonce the EntryPoint tracks for `account`.
    async fn account_nonce(
        &self,
        entry_point: Address,
        account: Address,
    ) -> Result<U256, AccountError>;

    async fn estimate_gas(
        &self,
        from: Option<Address>,
        to: Address,
        data: Bytes,
    ) -> Result<U256, AccountError>;

    async fn chain_id(&self) -> Result<u64, AccountError>;
}

/// Source of EIP-1559 fee parameters.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FeeOracle: Send + Sync {
    async fn fee_data(&self, chain_id: u64) -> Result<GasFees, AccountError>;
}

fn network_failure(e: impl std::fmt::Display) -> AccountError {
    AccountError::NetworkFailure(e.to_string())
}

/// [`ChainClient`] backed by an ethers middleware.
#[derive(Debug)]
pub struct EthersChainClient<M> {
    provider: Arc<M>,
}

impl<M> EthersChainClient<M> {
    pub fn new(provider: Arc<M>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<M> ChainClient for EthersChainClient<M>
where
    M: Middleware + 'static,
{
    async fn counterfactual_address(
        &self,
        factory: Address,
        module: Address,
        module_setup_data: Bytes,
        index: U256,
    ) -> Result<Address, AccountError> {
        SmartAccountFactory::new(factory, self.provider.clone())
            .get_address_for_counter_factual_account(module, module_setup_data, index)
            .call()
            .await
            .map_err(network_failure)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, AccountError> {
        self.provider
            .get_code(address, None)
            .await
            .map_err(network_failure)
    }

    async fn account_nonce(
        &self,
        entry_point: Address,
        account: Address,
    ) -> Result<U256, AccountError> {
        EntryPoint::new(entry_point, self.provider.clone())
            .get_nonce(account, U256::from(DEFAULT_NONCE_KEY))
            .call()
            .await
            .map_err(network_failure)
    }

    async fn estimate_gas(
        &self,
        from: Option<Address>,
        to: Address,
        data: Bytes,
    ) -> Result<U256, AccountError> {
        let mut request = Eip1559TransactionRequest::new().to(to).data(data);
        if let Some(from) = from {
            request = request.from(from);
        }

        self.provider
            .estimate_gas(&request.into(), None)
            .await
            .map_err(|e| match e.as_error_response() {
                // the node answered and rejected the simulation
                Some(rpc_error) => AccountError::EstimationFailure(rpc_error.to_string()),
                None => network_failure(e),
            })
    }

    async fn chain_id(&self) -> Result<u64, AccountError> {
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(network_failure)?;
        u64::try_from(chain_id)
            .map_err(|e| AccountError::EncodingFailure(format!("chain id {chain_id}: {e}")))
    }
}

/// [`FeeOracle`] that asks the node for its EIP-1559 fee estimate.
#[derive(Debug)]
pub struct ProviderFeeOracle<M> {
    provider: Arc<M>,
}

impl<M> ProviderFeeOracle<M> {
    pub fn new(provider: Arc<M>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<M> FeeOracle for ProviderFeeOracle<M>
where
    M: Middleware + 'static,
{
    async fn fee_data(&self, chain_id: u64) -> Result<GasFees, AccountError> {
        let (max_fee_per_gas, max_priority_fee_per_gas) = self
            .provider
            .estimate_eip1559_fees(None)
            .await
            .map_err(network_failure)?;
        debug!(
            chain_id,
            %max_fee_per_gas,
            %max_priority_fee_per_gas,
            "Fetched fee data"
        );
        Ok(GasFees {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        })
    }
}
