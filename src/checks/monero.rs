//! Monero wallet RPC and key-handling checks

use std::collections::HashMap;

use super::code_only;
use super::patterns::{
    is_private_host, MONERO_RPC_URL, RPC_BIND_ALL, RPC_LOGIN_DISABLED, SECRET_LOGGING,
    TESTNET_FLAG,
};
use crate::audit::{Category, Check, CheckContext, Finding, Severity};
use crate::error::CheckError;

const CATEGORY: &str = "monero";

/// Launch scripts, service units and config files
const SCRIPT_EXTENSIONS: &[&str] = &["sh", "service", "conf", "toml", "yml", "yaml", "json"];

pub fn category() -> Category {
    Category::new(CATEGORY, "Monero Crypto")
        .quick()
        .with_check(RpcBindCheck)
        .with_check(RpcLoginCheck)
        .with_check(RpcUrlCheck)
        .with_check(SecretLoggingCheck)
}

/// Wallet RPC must only listen on loopback
pub struct RpcBindCheck;

#[async_trait::async_trait]
impl Check for RpcBindCheck {
    fn name(&self) -> &'static str {
        "rpc-bind"
    }

    fn description(&self) -> &'static str {
        "Wallet RPC is not bound to 0.0.0.0"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Critical
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let matches = code_only(ctx.scanner.search(&RPC_BIND_ALL, SCRIPT_EXTENSIONS));

        Ok(matches
            .into_iter()
            .map(|m| {
                Finding::new(
                    CATEGORY,
                    self.name(),
                    Severity::Critical,
                    "Wallet RPC bound to all interfaces (0.0.0.0)",
                )
                .with_location(m.location())
                .with_remediation("Bind wallet RPC to 127.0.0.1")
            })
            .collect())
    }
}

pub struct RpcLoginCheck;

#[async_trait::async_trait]
impl Check for RpcLoginCheck {
    fn name(&self) -> &'static str {
        "rpc-login"
    }

    fn description(&self) -> &'static str {
        "RPC login is only disabled on testnet/stagenet"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let matches = code_only(ctx.scanner.search(&RPC_LOGIN_DISABLED, SCRIPT_EXTENSIONS));
        let mut testnet_files: HashMap<String, bool> = HashMap::new();
        let mut findings = Vec::new();

        for m in matches {
            let is_testnet = *testnet_files.entry(m.path.clone()).or_insert_with(|| {
                TESTNET_FLAG.is_match(&m.path)
                    || ctx
                        .scanner
                        .read_file(&m.path)
                        .map(|content| TESTNET_FLAG.is_match(&content))
                        .unwrap_or(false)
            });
            if is_testnet {
                continue;
            }

            findings.push(
                Finding::new(
                    CATEGORY,
                    self.name(),
                    Severity::High,
                    "Wallet RPC login disabled outside testnet/stagenet",
                )
                .with_location(m.location())
                .with_remediation("Use --rpc-login user:password on mainnet wallets"),
            );
        }

        Ok(findings)
    }
}

/// Monero RPC must be reached over loopback or an onion service
pub struct RpcUrlCheck;

#[async_trait::async_trait]
impl Check for RpcUrlCheck {
    fn name(&self) -> &'static str {
        "rpc-url"
    }

    fn description(&self) -> &'static str {
        "Monero RPC URLs point to loopback or .onion hosts"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let matches = code_only(
            ctx.scanner
                .search_production(&MONERO_RPC_URL, &["rs", "toml"]),
        );
        let mut findings = Vec::new();

        for m in matches {
            for caps in MONERO_RPC_URL.captures_iter(&m.text) {
                let host = &caps[1];
                if is_private_host(host) {
                    continue;
                }
                findings.push(
                    Finding::new(
                        CATEGORY,
                        self.name(),
                        Severity::High,
                        format!("Monero RPC reached over clearnet host {}", host),
                    )
                    .with_location(m.location())
                    .with_remediation("Run a local node or reach it through a .onion address"),
                );
            }
        }

        Ok(findings)
    }
}

/// Seeds and private keys must never reach a log
pub struct SecretLoggingCheck;

#[async_trait::async_trait]
impl Check for SecretLoggingCheck {
    fn name(&self) -> &'static str {
        "secret-logging"
    }

    fn description(&self) -> &'static str {
        "Seeds, mnemonics and private keys are never logged"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Critical
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let matches = code_only(ctx.scanner.search_production(&SECRET_LOGGING, &["rs"]));

        Ok(matches
            .into_iter()
            .map(|m| {
                Finding::new(
                    CATEGORY,
                    self.name(),
                    Severity::Critical,
                    "Wallet secret passed to a logging macro",
                )
                .with_location(m.location())
                .with_remediation("Remove the secret from the log statement")
            })
            .collect())
    }
}
