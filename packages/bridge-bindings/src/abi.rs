//! ABI registry
//!
//! Exposes the JSON ABI of every bound contract and checks compiled artifacts
//! against the bindings. A binding is only valid if every function selector,
//! event topic and error selector it knows about exists in the deployed
//! contract's ABI.

use alloy::json_abi::JsonAbi;
use eyre::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::contracts::{
    DailyRateLimiter, FeeManager, LockBridge, MintBridge, Ownable, Pausable, ReentrancyGuard,
    WrappedToken, IERC20,
};
use crate::error::BindingError;

/// Every contract of the bridge system known to the bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContractKind {
    Ownable,
    Pausable,
    ReentrancyGuard,
    FeeManager,
    DailyRateLimiter,
    IERC20,
    WrappedToken,
    LockBridge,
    MintBridge,
}

impl ContractKind {
    pub const ALL: [ContractKind; 9] = [
        ContractKind::Ownable,
        ContractKind::Pausable,
        ContractKind::ReentrancyGuard,
        ContractKind::FeeManager,
        ContractKind::DailyRateLimiter,
        ContractKind::IERC20,
        ContractKind::WrappedToken,
        ContractKind::LockBridge,
        ContractKind::MintBridge,
    ];

    /// Solidity contract name, also the artifact file stem
    pub fn name(&self) -> &'static str {
        match self {
            ContractKind::Ownable => "Ownable",
            ContractKind::Pausable => "Pausable",
            ContractKind::ReentrancyGuard => "ReentrancyGuard",
            ContractKind::FeeManager => "FeeManager",
            ContractKind::DailyRateLimiter => "DailyRateLimiter",
            ContractKind::IERC20 => "IERC20",
            ContractKind::WrappedToken => "WrappedToken",
            ContractKind::LockBridge => "LockBridge",
            ContractKind::MintBridge => "MintBridge",
        }
    }

    /// Whether the contract is concrete (interfaces and mixins cannot be deployed)
    pub fn deployable(&self) -> bool {
        matches!(
            self,
            ContractKind::WrappedToken | ContractKind::LockBridge | ContractKind::MintBridge
        )
    }

    /// Parsed JSON ABI of the binding
    pub fn abi(&self) -> JsonAbi {
        match self {
            ContractKind::Ownable => Ownable::abi::contract(),
            ContractKind::Pausable => Pausable::abi::contract(),
            ContractKind::ReentrancyGuard => ReentrancyGuard::abi::contract(),
            ContractKind::FeeManager => FeeManager::abi::contract(),
            ContractKind::DailyRateLimiter => DailyRateLimiter::abi::contract(),
            ContractKind::IERC20 => IERC20::abi::contract(),
            ContractKind::WrappedToken => WrappedToken::abi::contract(),
            ContractKind::LockBridge => LockBridge::abi::contract(),
            ContractKind::MintBridge => MintBridge::abi::contract(),
        }
    }

    /// ABI rendered as JSON
    pub fn abi_json(&self, pretty: bool) -> Result<String> {
        let abi = self.abi();
        let json = if pretty {
            serde_json::to_string_pretty(&abi)?
        } else {
            serde_json::to_string(&abi)?
        };
        Ok(json)
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContractKind {
    type Err = BindingError;

    /// Case-insensitive; `lock-bridge`, `lock_bridge` and `LockBridge` all parse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        let kind = match normalized.as_str() {
            "ownable" => ContractKind::Ownable,
            "pausable" => ContractKind::Pausable,
            "reentrancyguard" => ContractKind::ReentrancyGuard,
            "feemanager" => ContractKind::FeeManager,
            "dailyratelimiter" | "ratelimiter" => ContractKind::DailyRateLimiter,
            "ierc20" | "erc20" => ContractKind::IERC20,
            "wrappedtoken" | "token" => ContractKind::WrappedToken,
            "lockbridge" => ContractKind::LockBridge,
            "mintbridge" => ContractKind::MintBridge,
            _ => return Err(BindingError::UnknownContract(s.to_string())),
        };
        Ok(kind)
    }
}

/// Result of comparing a compiled artifact's ABI with a binding
#[derive(Debug, Clone, Serialize)]
pub struct AbiReport {
    pub contract: ContractKind,
    /// Binding function signatures absent from the artifact
    pub missing_functions: Vec<String>,
    /// Binding event signatures absent from the artifact
    pub missing_events: Vec<String>,
    /// Binding error signatures absent from the artifact
    pub missing_errors: Vec<String>,
    /// Artifact functions the binding does not know (allowed)
    pub extra_functions: Vec<String>,
}

impl AbiReport {
    pub fn is_compatible(&self) -> bool {
        self.missing_functions.is_empty()
            && self.missing_events.is_empty()
            && self.missing_errors.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.missing_functions.len() + self.missing_events.len() + self.missing_errors.len()
    }

    /// Convert an incompatible report into a typed error
    pub fn into_result(self) -> std::result::Result<Self, BindingError> {
        if self.is_compatible() {
            return Ok(self);
        }
        let items = self
            .missing_functions
            .iter()
            .chain(&self.missing_events)
            .chain(&self.missing_errors)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        Err(BindingError::IncompatibleArtifact {
            contract: self.contract.to_string(),
            missing: self.missing_count(),
            items,
        })
    }
}

/// Compare an artifact ABI against the binding for `kind`.
///
/// Items are matched by selector (functions, errors) or topic0 (events), so
/// parameter names may differ but types may not.
pub fn check_compatibility(kind: ContractKind, artifact_abi: &JsonAbi) -> AbiReport {
    let binding = kind.abi();

    let artifact_functions: HashSet<_> = artifact_abi.functions().map(|f| f.selector()).collect();
    let artifact_events: HashSet<_> = artifact_abi.events().map(|e| e.selector()).collect();
    let artifact_errors: HashSet<_> = artifact_abi.errors().map(|e| e.selector()).collect();
    let binding_functions: HashSet<_> = binding.functions().map(|f| f.selector()).collect();

    let missing_functions = binding
        .functions()
        .filter(|f| !artifact_functions.contains(&f.selector()))
        .map(|f| f.signature())
        .collect();
    let missing_events = binding
        .events()
        .filter(|e| !artifact_events.contains(&e.selector()))
        .map(|e| e.signature())
        .collect();
    let missing_errors = binding
        .errors()
        .filter(|e| !artifact_errors.contains(&e.selector()))
        .map(|e| e.signature())
        .collect();
    let extra_functions = artifact_abi
        .functions()
        .filter(|f| !binding_functions.contains(&f.selector()))
        .map(|f| f.signature())
        .collect();

    AbiReport {
        contract: kind,
        missing_functions,
        missing_events,
        missing_errors,
        extra_functions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_kind_parse() {
        assert_eq!("lock-bridge".parse::<ContractKind>().unwrap(), ContractKind::LockBridge);
        assert_eq!("MINT_BRIDGE".parse::<ContractKind>().unwrap(), ContractKind::MintBridge);
        assert_eq!("WrappedToken".parse::<ContractKind>().unwrap(), ContractKind::WrappedToken);
        assert_eq!("erc20".parse::<ContractKind>().unwrap(), ContractKind::IERC20);
        assert!("vault".parse::<ContractKind>().is_err());

        for kind in ContractKind::ALL {
            assert_eq!(kind.name().parse::<ContractKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_lock_bridge_abi_contents() {
        let abi = ContractKind::LockBridge.abi();

        assert!(abi.constructor.is_some());
        assert!(abi.function("lock").is_some());
        assert!(abi.function("unlock").is_some());
        assert!(abi.function("owner").is_some());
        assert!(abi.event("Locked").is_some());
        assert!(abi.error("DailyLimitExceeded").is_some());

        let locked = &abi.event("Locked").unwrap()[0];
        assert_eq!(locked.inputs.len(), 2);
        assert!(locked.inputs[0].indexed);
        assert!(!locked.inputs[1].indexed);
    }

    #[test]
    fn test_abi_json_is_valid_json() {
        for kind in ContractKind::ALL {
            let json = kind.abi_json(false).unwrap();
            let parsed: JsonAbi = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed.functions().count(), kind.abi().functions().count());
        }
    }

    #[test]
    fn test_bridges_are_compatible_with_their_mixins() {
        // Every mixin item must appear in the flattened bridge ABIs
        for bridge in [ContractKind::LockBridge, ContractKind::MintBridge] {
            let abi = bridge.abi();
            for mixin in [
                ContractKind::Ownable,
                ContractKind::Pausable,
                ContractKind::ReentrancyGuard,
                ContractKind::FeeManager,
                ContractKind::DailyRateLimiter,
            ] {
                let report = check_compatibility(mixin, &abi);
                assert!(
                    report.is_compatible(),
                    "{} missing from {}: {:?}",
                    mixin,
                    bridge,
                    report
                );
            }
        }

        let token = ContractKind::WrappedToken.abi();
        assert!(check_compatibility(ContractKind::IERC20, &token).is_compatible());
        assert!(check_compatibility(ContractKind::Ownable, &token).is_compatible());
    }

    #[test]
    fn test_incompatible_artifact_is_reported() {
        // The ERC20 surface lacks every bridge-specific item
        let erc20 = ContractKind::IERC20.abi();
        let report = check_compatibility(ContractKind::LockBridge, &erc20);

        assert!(!report.is_compatible());
        assert!(report
            .missing_functions
            .contains(&"lock(uint256)".to_string()));
        assert!(report
            .missing_events
            .contains(&"Locked(address,uint256)".to_string()));
        assert!(report.extra_functions.contains(&"name()".to_string()));

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, BindingError::IncompatibleArtifact { .. }));
    }

    #[test]
    fn test_deployable_kinds() {
        let deployable: Vec<_> = ContractKind::ALL
            .iter()
            .filter(|k| k.deployable())
            .collect();
        assert_eq!(deployable.len(), 3);
        assert!(!ContractKind::Ownable.deployable());
    }
}
