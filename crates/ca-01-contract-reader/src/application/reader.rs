//! # Contract Reader
//!
//! Typed reads over a `ContractCaller`. Independent reads are issued
//! concurrently; nothing is retried here.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use shared_types::{AbiValue, Address, TokenParams, VotingParams, U256};
use tracing::debug;

use crate::domain::{CommitteeContracts, ContractAbi, ContractReadError, TokenInfo};
use crate::ports::ContractCaller;

/// Default number of balance reads in flight per rescan.
pub const DEFAULT_READ_CONCURRENCY: usize = 8;

/// Voting percentages are stored scaled by 10^16 (`PCT_BASE` is 10^18).
const PCT_SCALE: u64 = 10_000_000_000_000_000;

const SECONDS_PER_DAY: u64 = 86_400;

fn saturating_u64(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_u64()
    }
}

/// Typed point-in-time reads against committee contracts.
pub struct ContractReader<C: ContractCaller + ?Sized> {
    caller: Arc<C>,
    concurrency: usize,
}

impl<C: ContractCaller + ?Sized> Clone for ContractReader<C> {
    fn clone(&self) -> Self {
        Self {
            caller: Arc::clone(&self.caller),
            concurrency: self.concurrency,
        }
    }
}

impl<C: ContractCaller + ?Sized> ContractReader<C> {
    /// Create a reader with the default concurrency.
    pub fn new(caller: Arc<C>) -> Self {
        Self::with_concurrency(caller, DEFAULT_READ_CONCURRENCY)
    }

    /// Create a reader that keeps at most `concurrency` balance reads in flight.
    pub fn with_concurrency(caller: Arc<C>, concurrency: usize) -> Self {
        Self {
            caller,
            concurrency: concurrency.max(1),
        }
    }

    /// Underlying caller.
    pub fn caller(&self) -> &Arc<C> {
        &self.caller
    }

    async fn read(
        &self,
        contract: Address,
        abi: ContractAbi,
        method: &str,
        args: &[AbiValue],
    ) -> Result<AbiValue, ContractReadError> {
        self.caller.call(contract, abi, method, args).await
    }

    async fn read_address(
        &self,
        contract: Address,
        abi: ContractAbi,
        method: &str,
    ) -> Result<Address, ContractReadError> {
        Ok(self.read(contract, abi, method, &[]).await?.as_address()?)
    }

    async fn read_uint(
        &self,
        contract: Address,
        abi: ContractAbi,
        method: &str,
    ) -> Result<U256, ContractReadError> {
        Ok(self.read(contract, abi, method, &[]).await?.as_uint()?)
    }

    /// ACL app of the organization kernel.
    pub async fn kernel_acl(&self, kernel: Address) -> Result<Address, ContractReadError> {
        self.read_address(kernel, ContractAbi::Kernel, "acl").await
    }

    /// Token controlled by a token manager.
    pub async fn token_of(&self, token_manager: Address) -> Result<Address, ContractReadError> {
        self.read_address(token_manager, ContractAbi::TokenManager, "token")
            .await
    }

    /// Per-account token cap of a token manager. A cap of 1 marks a unique token.
    pub async fn max_account_tokens(&self, token_manager: Address) -> Result<U256, ContractReadError> {
        self.read_uint(token_manager, ContractAbi::TokenManager, "maxAccountTokens")
            .await
    }

    /// Symbol, decimals and transferability of a token.
    pub async fn token_info(&self, token: Address) -> Result<TokenInfo, ContractReadError> {
        let (symbol, decimals, transferable) = tokio::try_join!(
            self.read(token, ContractAbi::Token, "symbol", &[]),
            self.read(token, ContractAbi::Token, "decimals", &[]),
            self.read(token, ContractAbi::Token, "transfersEnabled", &[]),
        )?;

        let decimals = decimals.as_uint()?;
        let decimals = u8::try_from(saturating_u64(decimals)).map_err(|_| {
            ContractReadError::InvalidValue {
                field: "decimals",
                reason: format!("{decimals} does not fit in u8"),
            }
        })?;

        Ok(TokenInfo {
            symbol: symbol.as_string()?,
            decimals,
            transferable: transferable.as_bool()?,
        })
    }

    /// Balance of one holder.
    pub async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ContractReadError> {
        Ok(self
            .read(token, ContractAbi::Token, "balanceOf", &[AbiValue::Address(holder)])
            .await?
            .as_uint()?)
    }

    /// Balances of several holders, in input order.
    ///
    /// At most `concurrency` reads are in flight. The first failure aborts.
    pub async fn balances_of(
        &self,
        token: Address,
        holders: &[Address],
    ) -> Result<Vec<(Address, U256)>, ContractReadError> {
        debug!(token = %format!("{token:#x}"), holders = holders.len(), "reading balances");
        stream::iter(holders.iter().copied())
            .map(|holder| async move {
                let balance = self.balance_of(token, holder).await?;
                Ok::<_, ContractReadError>((holder, balance))
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    /// Voting rules in percent and days.
    pub async fn voting_params(&self, voting: Address) -> Result<VotingParams, ContractReadError> {
        let (support, acceptance, vote_time) = tokio::try_join!(
            self.read_uint(voting, ContractAbi::Voting, "supportRequiredPct"),
            self.read_uint(voting, ContractAbi::Voting, "minAcceptQuorumPct"),
            self.read_uint(voting, ContractAbi::Voting, "voteTime"),
        )?;

        Ok(VotingParams {
            support_pct: saturating_u64(support / U256::from(PCT_SCALE)),
            acceptance_pct: saturating_u64(acceptance / U256::from(PCT_SCALE)),
            duration_days: saturating_u64(vote_time / U256::from(SECONDS_PER_DAY)),
        })
    }

    /// Vault backing a finance app.
    pub async fn vault_of(&self, finance: Address) -> Result<Address, ContractReadError> {
        self.read_address(finance, ContractAbi::Finance, "vault").await
    }

    /// Resolve everything a newly created committee needs.
    ///
    /// The token address is read first; the remaining reads run concurrently.
    pub async fn committee_contracts(
        &self,
        committee: Address,
        voting: Address,
        finance: Option<Address>,
    ) -> Result<CommitteeContracts, ContractReadError> {
        let token_address = self.token_of(committee).await?;

        let vault = async {
            match finance {
                Some(finance) => self.vault_of(finance).await.map(Some),
                None => Ok(None),
            }
        };

        let (token, max_tokens, voting_params, vault_address) = tokio::try_join!(
            self.token_info(token_address),
            self.max_account_tokens(committee),
            self.voting_params(voting),
            vault,
        )?;

        Ok(CommitteeContracts {
            token_address,
            token_params: TokenParams {
                transferable: token.transferable,
                unique: max_tokens == U256::one(),
            },
            token,
            voting_params,
            finance_address: finance,
            vault_address,
        })
    }
}
