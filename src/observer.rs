// src/observer.rs
use ethers::types::{Address, U256};
use tracing::debug;

/// Checkpoints of a single user-operation build, in the order they occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStage {
    CallEncoded {
        sender: Address,
        call_data_len: usize,
        call_gas_limit: U256,
    },
    NonceResolved {
        nonce: U256,
        deployed: Option<bool>,
    },
    InitCodeResolved {
        init_code_len: usize,
    },
    VerificationGasResolved {
        creation_gas: U256,
        verification_gas_limit: U256,
    },
    FeesResolved {
        chain_id: u64,
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
    PreVerificationGasResolved {
        pre_verification_gas: U256,
    },
}

/// Receives build checkpoints. Implementations must not block.
pub trait BuildObserver: Send + Sync {
    fn on_stage(&self, stage: &BuildStage);
}

/// Default observer: one debug event per stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BuildObserver for TracingObserver {
    fn on_stage(&self, stage: &BuildStage) {
        match stage {
            BuildStage::CallEncoded {
                sender,
                call_data_len,
                call_gas_limit,
            } => debug!(%sender, call_data_len, %call_gas_limit, "Encoded account call"),
            BuildStage::NonceResolved { nonce, deployed } => {
                debug!(%nonce, ?deployed, "Resolved nonce")
            }
            BuildStage::InitCodeResolved { init_code_len } => {
                debug!(init_code_len, "Resolved init code")
            }
            BuildStage::VerificationGasResolved {
                creation_gas,
                verification_gas_limit,
            } => debug!(%creation_gas, %verification_gas_limit, "Resolved verification gas"),
            BuildStage::FeesResolved {
                chain_id,
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => debug!(
                chain_id,
                %max_fee_per_gas,
                %max_priority_fee_per_gas,
                "Resolved fees"
            ),
            BuildStage::PreVerificationGasResolved {
                pre_verification_gas,
            } => debug!(%pre_verification_gas, "Resolved pre-verification gas"),
        }
    }
}
