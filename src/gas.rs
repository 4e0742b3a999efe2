// src/gas.rs
use ethers::types::{Bytes, U256};

use crate::types::UserOperation;

/// Static allowance for `validateUserOp`, before any account creation cost.
pub const VERIFICATION_GAS_BASELINE: u64 = 1_500_000;

/// Signature length assumed when sizing an operation that is not signed yet.
const DUMMY_SIGNATURE_LEN: usize = 65;

/// Gas overheads for user operations, used in calculating the
/// pre-verification gas.
/// see: https://github.com/eth-infinitism/bundler/blob/main/packages/sdk/src/calcPreVerificationGas.ts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasOverheads {
    pub fixed: U256,
    pub per_user_op: U256,
    pub per_user_op_word: U256,
    pub zero_byte: U256,
    pub non_zero_byte: U256,
    pub bundle_size: U256,
    /// Placeholder value for the field while it is being computed.
    pub pre_verification_gas: U256,
}

impl Default for GasOverheads {
    fn default() -> Self {
        Self {
            fixed: 21000.into(),
            per_user_op: 18300.into(),
            per_user_op_word: 4.into(),
            zero_byte: 4.into(),
            non_zero_byte: 16.into(),
            bundle_size: 1.into(),
            pre_verification_gas: 21000.into(),
        }
    }
}

/// Verification gas for an operation: the baseline plus whatever deploying
/// the account costs.
pub fn verification_gas_limit(creation_gas: U256) -> U256 {
    U256::from(VERIFICATION_GAS_BASELINE) + creation_gas
}

/// Pre-verification gas for a fully assembled, unsigned operation.
///
/// The operation is packed with a placeholder pre-verification gas and a
/// dummy signature, so the result does not change once the real signature
/// is attached.
pub fn calc_pre_verification_gas(op: &UserOperation, ov: &GasOverheads) -> U256 {
    let sized = UserOperation {
        pre_verification_gas: ov.pre_verification_gas,
        signature: Bytes::from(vec![1u8; DUMMY_SIGNATURE_LEN]),
        ..op.clone()
    };
    let packed = sized.pack();
    let length_in_words = (packed.len() + 31) / 32;
    let call_data_cost: U256 = packed
        .iter()
        .map(|&x| {
            if x == 0 {
                ov.zero_byte
            } else {
                ov.non_zero_byte
            }
        })
        .fold(U256::zero(), |a, b| a + b);

    // an empty bundle makes no sense; treat it as a bundle of one
    let bundle_size = ov.bundle_size.max(U256::one());
    ov.fixed / bundle_size
        + call_data_cost
        + ov.per_user_op
        + ov.per_user_op_word * length_in_words
}
