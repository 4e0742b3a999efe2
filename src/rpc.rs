// src/rpc.rs
use std::sync::Arc;

use ethers::types::{Address, H256};
use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::error::{ErrorObjectOwned, INVALID_PARAMS_CODE};
use serde_json::json;
use tracing::{debug, error, info};

use crate::account::SmartAccount;
use crate::client::{ChainClient, FeeOracle};
use crate::error::AccountError;
use crate::types::{TransactionDetails, UserOperation};

const ACCOUNT_ERROR_CODE: i32 = -32000;

// Define the RPC interface
#[rpc(server, namespace = "account")]
pub trait AccountRpc {
    /// Counterfactual address of the smart account
    #[method(name = "getAddress")]
    async fn get_address(&self) -> RpcResult<Address>;

    /// Whether the smart account has code on chain
    #[method(name = "isDeployed")]
    async fn is_deployed(&self) -> RpcResult<bool>;

    /// Builds an unsigned user operation for a single call
    #[method(name = "createUnsignedUserOperation")]
    async fn create_unsigned_user_operation(
        &self,
        transactions: Vec<TransactionDetails>,
    ) -> RpcResult<UserOperation>;

    #[method(name = "getUserOperationHash")]
    async fn get_user_operation_hash(&self, user_op: UserOperation) -> RpcResult<H256>;

    /// Signs a user operation with the owner key
    #[method(name = "signUserOperation")]
    async fn sign_user_operation(&self, user_op: UserOperation) -> RpcResult<UserOperation>;
}

pub struct AccountRpcImpl<C, F> {
    account: Arc<SmartAccount<C, F>>,
}

impl<C, F> AccountRpcImpl<C, F> {
    pub fn new(account: Arc<SmartAccount<C, F>>) -> Self {
        Self { account }
    }
}

fn into_rpc_error(e: AccountError) -> ErrorObjectOwned {
    error!("Account request failed: {}", e);
    let code = match e {
        AccountError::InvalidInput(_) => INVALID_PARAMS_CODE,
        _ => ACCOUNT_ERROR_CODE,
    };
    ErrorObjectOwned::owned(
        code,
        format!("Account error: {}", e),
        Some(json!({ "kind": e.kind() })),
    )
}

#[async_trait]
impl<C, F> AccountRpcServer for AccountRpcImpl<C, F>
where
    C: ChainClient + 'static,
    F: FeeOracle + 'static,
{
    async fn get_address(&self) -> RpcResult<Address> {
        self.account
            .get_account_address()
            .await
            .map_err(into_rpc_error)
    }

    async fn is_deployed(&self) -> RpcResult<bool> {
        self.account
            .is_account_deployed()
            .await
            .map_err(into_rpc_error)
    }

    async fn create_unsigned_user_operation(
        &self,
        transactions: Vec<TransactionDetails>,
    ) -> RpcResult<UserOperation> {
        debug!("Received build request with {} transaction(s)", transactions.len());

        let user_op = self
            .account
            .create_unsigned_user_operation(&transactions)
            .await
            .map_err(into_rpc_error)?;
        info!(
            "Built user operation for {} with nonce {}",
            user_op.sender, user_op.nonce
        );
        Ok(user_op)
    }

    async fn get_user_operation_hash(&self, user_op: UserOperation) -> RpcResult<H256> {
        self.account
            .get_operation_hash(&user_op)
            .await
            .map_err(into_rpc_error)
    }

    async fn sign_user_operation(&self, user_op: UserOperation) -> RpcResult<UserOperation> {
        debug!("Received sign request for sender: {}", user_op.sender);
        self.account
            .sign_user_operation(&user_op)
            .await
            .map_err(into_rpc_error)
    }
}
