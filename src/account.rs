// src/account.rs
use std::sync::Arc;

use ethers::abi::AbiEncode;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, H256, U256};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::client::{ChainClient, FeeOracle};
use crate::contracts::{DeployCounterFactualAccountCall, ExecuteCall, InitForSmartAccountCall};
use crate::error::AccountError;
use crate::gas::{self, GasOverheads};
use crate::observer::{BuildObserver, BuildStage, TracingObserver};
use crate::types::{TransactionDetails, UserOperation};

/// Addresses of the contracts a smart account is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountConfig {
    pub factory: Address,
    pub entry_point: Address,
    pub module: Address,
    /// Deployment salt passed to the factory.
    pub index: U256,
}

/// Builds user operations for one owner's counterfactual smart account.
pub struct SmartAccount<C, F> {
    owner: LocalWallet,
    config: AccountConfig,
    client: C,
    fee_oracle: F,
    overheads: GasOverheads,
    observer: Arc<dyn BuildObserver>,
    // Deterministic in (owner, factory, module, index): written once, never invalidated.
    account_address: OnceCell<Address>,
}

impl<C, F> SmartAccount<C, F>
where
    C: ChainClient,
    F: FeeOracle,
{
    pub fn new(owner: LocalWallet, config: AccountConfig, client: C, fee_oracle: F) -> Self {
        info!(
            owner = %owner.address(),
            factory = %config.factory,
            entry_point = %config.entry_point,
            "Initialized smart account builder"
        );
        Self {
            owner,
            config,
            client,
            fee_oracle,
            overheads: GasOverheads::default(),
            observer: Arc::new(TracingObserver),
            account_address: OnceCell::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn BuildObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_gas_overheads(mut self, overheads: GasOverheads) -> Self {
        self.overheads = overheads;
        self
    }

    /// `initForSmartAccount(owner)` on the ownership module.
    pub fn module_setup_data(&self) -> Bytes {
        InitForSmartAccountCall {
            eoa_owner: self.owner.address(),
        }
        .encode()
        .into()
    }

    pub async fn get_account_address(&self) -> Result<Address, AccountError> {
        self.resolve_address(self.config.index).await
    }

    /// Returns the cached address if there is one, whatever `index` is.
    pub(crate) async fn resolve_address(&self, index: U256) -> Result<Address, AccountError> {
        self.account_address
            .get_or_try_init(|| self.fetch_account_address(index))
            .await
            .copied()
    }

    async fn fetch_account_address(&self, index: U256) -> Result<Address, AccountError> {
        let address = self
            .client
            .counterfactual_address(
                self.config.factory,
                self.config.module,
                self.module_setup_data(),
                index,
            )
            .await?;
        info!(%address, %index, "Resolved counterfactual account address");
        Ok(address)
    }

    pub async fn is_deployed(&self, address: Address) -> Result<bool, AccountError> {
        let code = self.client.get_code(address).await?;
        Ok(!code.is_empty())
    }

    pub async fn is_account_deployed(&self) -> Result<bool, AccountError> {
        let address = self.get_account_address().await?;
        self.is_deployed(address).await
    }

    /// Factory address followed by `deployCounterFactualAccount(module, setupData, index)`.
    pub fn build_init_code(&self, index: U256) -> Bytes {
        let deploy = DeployCounterFactualAccountCall {
            module_setup_contract: self.config.module,
            module_setup_data: self.module_setup_data(),
            index,
        }
        .encode();

        let mut init_code = Vec::with_capacity(20 + deploy.len());
        init_code.extend_from_slice(self.config.factory.as_bytes());
        init_code.extend_from_slice(&deploy);
        init_code.into()
    }

    /// Wraps the caller's call in the account's `execute` and works out its
    /// gas limit. Returns `(call_data, call_gas_limit)`.
    pub async fn encode_call_and_estimate_gas(
        &self,
        details: &TransactionDetails,
    ) -> Result<(Bytes, U256), AccountError> {
        let call_data: Bytes = ExecuteCall {
            dest: details.to,
            value: details.value,
            func: details.data.clone(),
        }
        .encode()
        .into();

        let call_gas_limit = match details.gas_limit {
            Some(gas_limit) if !gas_limit.is_zero() => gas_limit,
            _ => {
                let sender = self.get_account_address().await?;
                self.client
                    .estimate_gas(Some(self.config.entry_point), sender, call_data.clone())
                    .await?
            }
        };

        Ok((call_data, call_gas_limit))
    }

    /// Gas the factory call in `init_code` needs. Zero when there is nothing to deploy.
    pub async fn estimate_creation_gas(&self, init_code: &Bytes) -> Result<U256, AccountError> {
        if init_code.is_empty() {
            return Ok(U256::zero());
        }
        if init_code.len() < 20 {
            return Err(AccountError::EncodingFailure(format!(
                "init code of {} bytes has no factory address",
                init_code.len()
            )));
        }

        let (deployer, deploy_call) = init_code.split_at(20);
        self.client
            .estimate_gas(
                None,
                Address::from_slice(deployer),
                Bytes::from(deploy_call.to_vec()),
            )
            .await
    }

    async fn resolve_nonce(
        &self,
        details: &TransactionDetails,
        sender: Address,
    ) -> Result<(U256, Option<bool>), AccountError> {
        if let Some(nonce) = details.nonce {
            return Ok((nonce, None));
        }
        if self.is_deployed(sender).await? {
            let nonce = self
                .client
                .account_nonce(self.config.entry_point, sender)
                .await?;
            Ok((nonce, Some(true)))
        } else {
            Ok((U256::zero(), Some(false)))
        }
    }

    /// Builds an unsigned operation for a single call. Batches are rejected.
    pub async fn create_unsigned_user_operation(
        &self,
        transactions: &[TransactionDetails],
    ) -> Result<UserOperation, AccountError> {
        let details = match transactions {
            [details] => details,
            [] => {
                return Err(AccountError::InvalidInput(
                    "no transaction supplied".to_string(),
                ))
            }
            _ => {
                return Err(AccountError::InvalidInput(format!(
                    "batch of {} transactions is not supported",
                    transactions.len()
                )))
            }
        };

        let (call_data, call_gas_limit) = self.encode_call_and_estimate_gas(details).await?;
        let sender = self.get_account_address().await?;
        self.observer.on_stage(&BuildStage::CallEncoded {
            sender,
            call_data_len: call_data.len(),
            call_gas_limit,
        });

        let (nonce, deployed) = self.resolve_nonce(details, sender).await?;
        self.observer.on_stage(&BuildStage::NonceResolved { nonce, deployed });

        // Only the first operation deploys; a nonzero nonce never carries init code.
        let init_code = if nonce.is_zero() {
            self.build_init_code(self.config.index)
        } else {
            Bytes::new()
        };
        self.observer.on_stage(&BuildStage::InitCodeResolved {
            init_code_len: init_code.len(),
        });

        let creation_gas = self.estimate_creation_gas(&init_code).await?;
        let verification_gas_limit = gas::verification_gas_limit(creation_gas);
        self.observer.on_stage(&BuildStage::VerificationGasResolved {
            creation_gas,
            verification_gas_limit,
        });

        let chain_id = self.client.chain_id().await?;
        let fees = self.fee_oracle.fee_data(chain_id).await?;
        self.observer.on_stage(&BuildStage::FeesResolved {
            chain_id,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        });

        let mut user_op = UserOperation {
            sender,
            nonce,
            init_code,
            call_data,
            call_gas_limit,
            verification_gas_limit,
            pre_verification_gas: U256::zero(),
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            paymaster_and_data: Bytes::new(),
            signature: Bytes::new(),
        };

        // Must stay last: depends on the final size of every other field.
        user_op.pre_verification_gas = gas::calc_pre_verification_gas(&user_op, &self.overheads);
        self.observer.on_stage(&BuildStage::PreVerificationGasResolved {
            pre_verification_gas: user_op.pre_verification_gas,
        });

        debug!(sender = %user_op.sender, nonce = %user_op.nonce, "Built unsigned user operation");
        Ok(user_op)
    }

    pub async fn get_operation_hash(&self, user_op: &UserOperation) -> Result<H256, AccountError> {
        let chain_id = self.client.chain_id().await?;
        Ok(user_op.hash(self.config.entry_point, chain_id))
    }

    /// Signs the operation hash with the owner key (EIP-191) and returns the
    /// operation with the signature filled in.
    pub async fn sign_user_operation(
        &self,
        user_op: &UserOperation,
    ) -> Result<UserOperation, AccountError> {
        let op_hash = self.get_operation_hash(user_op).await?;
        let signature = self
            .owner
            .sign_message(op_hash.as_bytes())
            .await
            .map_err(|e| AccountError::SigningFailure(e.to_string()))?;

        Ok(UserOperation {
            signature: Bytes::from(signature.to_vec()),
            ..user_op.clone()
        })
    }
}
