//! Unity Ledger Module
//!
//! UNITY balances and supply behind one backend trait, with an in-process
//! mock backend and a chain-backed backend over a settlement client. The
//! `TokenLedger` ties a backend to the reserve ledger, the price oracle
//! and the transaction log.

pub mod backend;
pub mod chain;
pub mod error;
pub mod mock;
pub mod settlement;
pub mod token_ledger;

pub use backend::{Deployment, LedgerBackend};
pub use chain::ChainLedger;
pub use error::{LedgerError, Result};
pub use mock::MockLedger;
pub use settlement::{HttpSettlementClient, SettlementClient};
pub use token_ledger::{BurnReceipt, ContractInfo, MintReceipt, TokenLedger, TransferReceipt};
