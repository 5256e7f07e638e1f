//! Bridge contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings for every contract of
//! the lock/mint bridge system. Each contract is declared with its flattened
//! external ABI: functions, events and errors inherited from the mixins
//! (`Ownable`, `Pausable`, `ReentrancyGuard`, `FeeManager`, `DailyRateLimiter`)
//! are repeated in the inheriting contract, exactly as they appear in the
//! compiled artifact.
//!
//! `#[sol(abi)]` makes the JSON ABI of every contract available at runtime
//! (see [`crate::abi`]).

#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol! {
    // ========================================================================
    // Mixins
    // ========================================================================

    /// Single-owner access control
    #[sol(rpc, abi, all_derives)]
    #[derive(Debug, PartialEq, Eq)]
    contract Ownable {
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;

        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        error OwnableUnauthorizedAccount(address account);
        error OwnableInvalidOwner(address owner);
    }

    /// Emergency stop switch
    #[sol(rpc, abi, all_derives)]
    #[derive(Debug, PartialEq, Eq)]
    contract Pausable {
        function paused() external view returns (bool);

        event Paused(address account);
        event Unpaused(address account);

        error EnforcedPause();
        error ExpectedPause();
    }

    /// Reentrancy lock; exposes nothing but its revert
    #[sol(rpc, abi, all_derives)]
    #[derive(Debug, PartialEq, Eq)]
    contract ReentrancyGuard {
        error ReentrancyGuardReentrantCall();
    }

    /// Basis-point fee charged on user transfers
    #[sol(rpc, abi, all_derives)]
    #[derive(Debug, PartialEq, Eq)]
    contract FeeManager {
        function feeBps() external view returns (uint256);
        function feeRecipient() external view returns (address);
        function MAX_FEE_BPS() external view returns (uint256);
        function calculateFee(uint256 amount) external view returns (uint256 fee);
        function setFeeBps(uint256 newFeeBps) external;
        function setFeeRecipient(address newRecipient) external;

        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;

        event FeeUpdated(uint256 previousFeeBps, uint256 newFeeBps);
        event FeeRecipientUpdated(address indexed previousRecipient, address indexed newRecipient);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        error FeeTooHigh(uint256 feeBps, uint256 maxFeeBps);
        error ZeroAddress();
        error OwnableUnauthorizedAccount(address account);
        error OwnableInvalidOwner(address owner);
    }

    /// Per-day volume cap, reset at UTC day boundaries (block.timestamp / 1 days)
    #[sol(rpc, abi, all_derives)]
    #[derive(Debug, PartialEq, Eq)]
    contract DailyRateLimiter {
        function dailyLimit() external view returns (uint256);
        function dailyUsage() external view returns (uint256 used);
        function lastResetDay() external view returns (uint256);
        function remainingDailyLimit() external view returns (uint256 remaining);
        function setDailyLimit(uint256 newLimit) external;

        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;

        event DailyLimitUpdated(uint256 previousLimit, uint256 newLimit);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        error DailyLimitExceeded(uint256 requested, uint256 remaining);
        error OwnableUnauthorizedAccount(address account);
        error OwnableInvalidOwner(address owner);
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    /// Standard ERC20 interface (the asset a LockBridge custodies)
    #[sol(rpc, abi, all_derives)]
    #[derive(Debug, PartialEq, Eq)]
    contract IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);

        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
    }

    /// Wrapped representation of the locked asset on the destination chain.
    /// Only the configured bridge may mint or burn.
    #[sol(rpc, abi, all_derives)]
    #[derive(Debug, PartialEq, Eq)]
    contract WrappedToken {
        constructor(string memory name_, string memory symbol_, uint8 decimals_, address initialOwner);

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);

        function bridge() external view returns (address);
        function setBridge(address newBridge) external;
        function mint(address to, uint256 amount) external;
        function burn(address from, uint256 amount) external;

        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;

        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
        event BridgeUpdated(address indexed previousBridge, address indexed newBridge);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        error OnlyBridge(address caller);
        error ZeroAddress();
        error ERC20InsufficientBalance(address sender, uint256 balance, uint256 needed);
        error ERC20InsufficientAllowance(address spender, uint256 allowance, uint256 needed);
        error ERC20InvalidReceiver(address receiver);
        error ERC20InvalidSender(address sender);
        error OwnableUnauthorizedAccount(address account);
        error OwnableInvalidOwner(address owner);
    }

    // ========================================================================
    // Bridges
    // ========================================================================

    /// Source-chain bridge: custodies the native token.
    ///
    /// `lock` pulls `amount` from the caller, sends the fee to `feeRecipient`
    /// and emits `Locked` with the net amount to be minted on the destination.
    /// `unlock` (owner) releases custody when wrapped tokens were burned on
    /// the destination; each source transaction hash is processed once.
    #[sol(rpc, abi, all_derives)]
    #[derive(Debug, PartialEq, Eq)]
    contract LockBridge {
        constructor(address token_, uint256 feeBps_, address feeRecipient_, uint256 dailyLimit_, address initialOwner);

        function token() external view returns (address);
        function totalLocked() external view returns (uint256);
        function processedUnlocks(bytes32 sourceTxHash) external view returns (bool);
        function lock(uint256 amount) external;
        function unlock(address recipient, uint256 amount, bytes32 sourceTxHash) external;
        function pause() external;
        function unpause() external;

        // Pausable
        function paused() external view returns (bool);

        // FeeManager
        function feeBps() external view returns (uint256);
        function feeRecipient() external view returns (address);
        function MAX_FEE_BPS() external view returns (uint256);
        function calculateFee(uint256 amount) external view returns (uint256 fee);
        function setFeeBps(uint256 newFeeBps) external;
        function setFeeRecipient(address newRecipient) external;

        // DailyRateLimiter
        function dailyLimit() external view returns (uint256);
        function dailyUsage() external view returns (uint256 used);
        function lastResetDay() external view returns (uint256);
        function remainingDailyLimit() external view returns (uint256 remaining);
        function setDailyLimit(uint256 newLimit) external;

        // Ownable
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;

        event Locked(address indexed sender, uint256 amount);
        event Unlocked(address indexed recipient, uint256 amount, bytes32 indexed sourceTxHash);
        event FeeCollected(address indexed payer, address indexed recipient, uint256 fee);
        event Paused(address account);
        event Unpaused(address account);
        event FeeUpdated(uint256 previousFeeBps, uint256 newFeeBps);
        event FeeRecipientUpdated(address indexed previousRecipient, address indexed newRecipient);
        event DailyLimitUpdated(uint256 previousLimit, uint256 newLimit);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        error ZeroAmount();
        error AlreadyProcessed(bytes32 sourceTxHash);
        error InsufficientLiquidity(uint256 requested, uint256 available);
        error SafeERC20FailedOperation(address token);
        error ZeroAddress();
        error FeeTooHigh(uint256 feeBps, uint256 maxFeeBps);
        error DailyLimitExceeded(uint256 requested, uint256 remaining);
        error EnforcedPause();
        error ExpectedPause();
        error ReentrancyGuardReentrantCall();
        error OwnableUnauthorizedAccount(address account);
        error OwnableInvalidOwner(address owner);
    }

    /// Destination-chain bridge: mints and burns the wrapped token.
    ///
    /// `mint` (owner) credits a recipient for a `Locked` event observed on the
    /// source chain; `burn` destroys the caller's wrapped tokens (net of fee)
    /// and emits `Burned` so the source side can unlock.
    #[sol(rpc, abi, all_derives)]
    #[derive(Debug, PartialEq, Eq)]
    contract MintBridge {
        constructor(address wrappedToken_, uint256 feeBps_, address feeRecipient_, uint256 dailyLimit_, address initialOwner);

        function wrappedToken() external view returns (address);
        function processedMints(bytes32 sourceTxHash) external view returns (bool);
        function mint(address recipient, uint256 amount, bytes32 sourceTxHash) external;
        function burn(uint256 amount) external;
        function pause() external;
        function unpause() external;

        // Pausable
        function paused() external view returns (bool);

        // FeeManager
        function feeBps() external view returns (uint256);
        function feeRecipient() external view returns (address);
        function MAX_FEE_BPS() external view returns (uint256);
        function calculateFee(uint256 amount) external view returns (uint256 fee);
        function setFeeBps(uint256 newFeeBps) external;
        function setFeeRecipient(address newRecipient) external;

        // DailyRateLimiter
        function dailyLimit() external view returns (uint256);
        function dailyUsage() external view returns (uint256 used);
        function lastResetDay() external view returns (uint256);
        function remainingDailyLimit() external view returns (uint256 remaining);
        function setDailyLimit(uint256 newLimit) external;

        // Ownable
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;

        event Minted(address indexed recipient, uint256 amount, bytes32 indexed sourceTxHash);
        event Burned(address indexed sender, uint256 amount);
        event FeeCollected(address indexed payer, address indexed recipient, uint256 fee);
        event Paused(address account);
        event Unpaused(address account);
        event FeeUpdated(uint256 previousFeeBps, uint256 newFeeBps);
        event FeeRecipientUpdated(address indexed previousRecipient, address indexed newRecipient);
        event DailyLimitUpdated(uint256 previousLimit, uint256 newLimit);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        error ZeroAmount();
        error AlreadyProcessed(bytes32 sourceTxHash);
        error SafeERC20FailedOperation(address token);
        error ZeroAddress();
        error FeeTooHigh(uint256 feeBps, uint256 maxFeeBps);
        error DailyLimitExceeded(uint256 requested, uint256 remaining);
        error EnforcedPause();
        error ExpectedPause();
        error ReentrancyGuardReentrantCall();
        error OwnableUnauthorizedAccount(address account);
        error OwnableInvalidOwner(address owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{keccak256, Address, B256, U256};
    use alloy::sol_types::{SolCall, SolError, SolEvent};

    #[test]
    fn test_locked_event_signature() {
        assert_eq!(LockBridge::Locked::SIGNATURE, "Locked(address,uint256)");
        assert_eq!(
            LockBridge::Locked::SIGNATURE_HASH,
            keccak256(b"Locked(address,uint256)")
        );
    }

    #[test]
    fn test_mixin_selectors_match_inheriting_contracts() {
        // Ownable
        assert_eq!(
            Ownable::ownerCall::SELECTOR,
            LockBridge::ownerCall::SELECTOR
        );
        assert_eq!(
            Ownable::transferOwnershipCall::SELECTOR,
            MintBridge::transferOwnershipCall::SELECTOR
        );
        assert_eq!(
            Ownable::OwnershipTransferred::SIGNATURE_HASH,
            WrappedToken::OwnershipTransferred::SIGNATURE_HASH
        );
        assert_eq!(
            Ownable::OwnableUnauthorizedAccount::SELECTOR,
            LockBridge::OwnableUnauthorizedAccount::SELECTOR
        );

        // Pausable
        assert_eq!(Pausable::pausedCall::SELECTOR, LockBridge::pausedCall::SELECTOR);
        assert_eq!(
            Pausable::Paused::SIGNATURE_HASH,
            MintBridge::Paused::SIGNATURE_HASH
        );

        // FeeManager and DailyRateLimiter
        assert_eq!(
            FeeManager::calculateFeeCall::SELECTOR,
            LockBridge::calculateFeeCall::SELECTOR
        );
        assert_eq!(
            DailyRateLimiter::remainingDailyLimitCall::SELECTOR,
            MintBridge::remainingDailyLimitCall::SELECTOR
        );

        // ReentrancyGuard
        assert_eq!(
            ReentrancyGuard::ReentrancyGuardReentrantCall::SELECTOR,
            LockBridge::ReentrancyGuardReentrantCall::SELECTOR
        );
    }

    #[test]
    fn test_erc20_selectors_are_standard() {
        assert_eq!(IERC20::transferCall::SELECTOR, [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(IERC20::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(IERC20::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(
            IERC20::transferFromCall::SELECTOR,
            WrappedToken::transferFromCall::SELECTOR
        );
    }

    #[test]
    fn test_unlock_call_encoding() {
        let recipient = Address::repeat_byte(0x11);
        let source = B256::repeat_byte(0x22);
        let call = LockBridge::unlockCall {
            recipient,
            amount: U256::from(1_000u64),
            sourceTxHash: source,
        };

        let encoded = call.abi_encode();
        // selector + three static words
        assert_eq!(encoded.len(), 4 + 32 * 3);
        assert_eq!(&encoded[..4], &LockBridge::unlockCall::SELECTOR);

        let decoded = LockBridge::unlockCall::abi_decode(&encoded, true).unwrap();
        assert_eq!(decoded.recipient, recipient);
        assert_eq!(decoded.sourceTxHash, source);
    }
}
