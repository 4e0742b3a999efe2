// src/contracts.rs
use ethers::contract::abigen;
use ethers::types::{Address, U256};

abigen!(
    SmartAccountFactory,
    r#"[
        function getAddressForCounterFactualAccount(address moduleSetupContract, bytes moduleSetupData, uint256 index) view returns (address)
        function deployCounterFactualAccount(address moduleSetupContract, bytes moduleSetupData, uint256 index) returns (address)
    ]"#,
);

abigen!(
    SmartAccountContract,
    r#"[
        function execute(address dest, uint256 value, bytes func)
    ]"#,
);

abigen!(
    EntryPoint,
    r#"[
        function getNonce(address sender, uint192 key) view returns (uint256 nonce)
    ]"#,
);

abigen!(
    EcdsaOwnershipModule,
    r#"[
        function initForSmartAccount(address eoaOwner) returns (address)
    ]"#,
);

/// Biconomy v2 smart account factory.
pub const DEFAULT_FACTORY_ADDRESS: &str = "0x000000a56Aaca3e9a4C479ea6b6CD0DbcB6634F5";

/// Biconomy ECDSA ownership registry module.
pub const DEFAULT_MODULE_ADDRESS: &str = "0x0000001c5b32F37F5beA87BDD5374eB2aC54eA8e";

/// ERC-4337 v0.6 EntryPoint.
pub const DEFAULT_ENTRY_POINT_ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";

/// Nonce key used for sequential operations.
pub const DEFAULT_NONCE_KEY: u64 = 0;

pub fn parse_address(value: &str) -> Result<Address, String> {
    value.parse::<Address>().map_err(|e| format!("invalid address {value}: {e}"))
}

/// Decimal, or hex with a `0x` prefix.
pub fn parse_u256(value: &str) -> Result<U256, String> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex_digits) => U256::from_str_radix(hex_digits, 16).map_err(|e| e.to_string()),
        None => U256::from_dec_str(value).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| format!("invalid uint256 {value}: {e}"))
}
