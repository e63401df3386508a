//! Tor and network exposure checks

use super::code_only;
use super::patterns::{EXPOSED_RPC_LISTENER, SOCKS_LOCAL_DNS};
use crate::audit::{Category, Check, CheckContext, Finding, Severity};
use crate::error::CheckError;
use crate::tools::{CommandResult, Tool, ToolOutcome};

const CATEGORY: &str = "network";

const TOR_SOCKS_ADDR: &str = "127.0.0.1:9050";
const TOR_CHECK_URL: &str = "https://check.torproject.org/api/ip";

pub fn category() -> Category {
    Category::new(CATEGORY, "Tor & Network")
        .with_check(SocksDnsLeakCheck)
        .with_check(ListeningPortsCheck)
        .with_check(TorConnectivityCheck)
}

/// `socks5://` resolves hostnames before they reach Tor
pub struct SocksDnsLeakCheck;

#[async_trait::async_trait]
impl Check for SocksDnsLeakCheck {
    fn name(&self) -> &'static str {
        "socks-dns-leak"
    }

    fn description(&self) -> &'static str {
        "SOCKS proxies use socks5h:// so DNS goes through Tor"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let matches = code_only(ctx.scanner.search_production(
            &SOCKS_LOCAL_DNS,
            &["rs", "toml", "yml", "yaml", "sh"],
        ));

        Ok(matches
            .into_iter()
            .map(|m| {
                Finding::new(
                    CATEGORY,
                    self.name(),
                    Severity::High,
                    "socks5:// proxy resolves DNS locally and leaks lookups",
                )
                .with_location(m.location())
                .with_remediation("Use socks5h:// so hostnames are resolved by Tor")
            })
            .collect())
    }
}

/// Monero RPC ports must not listen on every interface
pub struct ListeningPortsCheck;

impl ListeningPortsCheck {
    /// `ss -tln`, or `netstat -tln` where `ss` is missing
    async fn listeners(ctx: &CheckContext) -> Result<(Tool, CommandResult), CheckError> {
        for tool in [Tool::Ss, Tool::Netstat] {
            match ctx.tools.run(tool, &["-tln"], ctx.root()).await {
                ToolOutcome::Completed(result) => return Ok((tool, result)),
                ToolOutcome::TimedOut(limit) => return Err(CheckError::TimedOut(limit)),
                ToolOutcome::Unavailable => continue,
            }
        }

        Err(CheckError::ToolUnavailable {
            tool: "ss/netstat".to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Check for ListeningPortsCheck {
    fn name(&self) -> &'static str {
        "listening-ports"
    }

    fn description(&self) -> &'static str {
        "No Monero RPC port listens on all interfaces (ss/netstat)"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Critical
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let (tool, result) = Self::listeners(ctx).await?;

        if !result.success() {
            return Err(CheckError::Execution(format!(
                "{} -tln failed: {}",
                tool,
                result.summary_line()
            )));
        }

        Ok(exposed_ports(&result.stdout)
            .into_iter()
            .map(|port| {
                Finding::new(
                    CATEGORY,
                    self.name(),
                    Severity::Critical,
                    format!("Monero RPC port {} is listening on all interfaces", port),
                )
                .with_location(format!("{} -tln", tool))
                .with_remediation("Restart the daemon or wallet bound to 127.0.0.1")
            })
            .collect())
    }
}

/// Distinct RPC ports exposed in `ss`/`netstat` output, in order of appearance
fn exposed_ports(output: &str) -> Vec<String> {
    let mut ports: Vec<String> = Vec::new();
    for line in output.lines() {
        for caps in EXPOSED_RPC_LISTENER.captures_iter(line) {
            let port = caps[2].to_string();
            if !ports.contains(&port) {
                ports.push(port);
            }
        }
    }
    ports
}

pub struct TorConnectivityCheck;

#[async_trait::async_trait]
impl Check for TorConnectivityCheck {
    fn name(&self) -> &'static str {
        "tor-connectivity"
    }

    fn description(&self) -> &'static str {
        "Tor SOCKS proxy on 127.0.0.1:9050 reaches the Tor network (curl)"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Low
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let result = ctx
            .tools
            .require(
                Tool::Curl,
                &[
                    "--silent",
                    "--max-time",
                    "15",
                    "--socks5-hostname",
                    TOR_SOCKS_ADDR,
                    TOR_CHECK_URL,
                ],
                ctx.root(),
            )
            .await?;

        let compact: String = result.stdout.split_whitespace().collect();
        if result.success() && compact.contains("\"IsTor\":true") {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::new(
            CATEGORY,
            self.name(),
            Severity::Low,
            format!("Tor is not reachable through {}", TOR_SOCKS_ADDR),
        )
        .with_remediation("Start the tor service and verify its SocksPort")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::scanner::Scanner;
    use crate::tools::ToolRunner;
    use std::fs;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> CheckContext {
        CheckContext::new(
            Scanner::new(dir.path().to_path_buf()),
            ToolRunner::default().with_disabled(Tool::ALL),
            Config::default(),
        )
    }

    #[tokio::test]
    async fn test_socks_dns_leak() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/tor.rs"),
            "let leaky = Proxy::all(\"socks5://127.0.0.1:9050\");\n\
             let safe = Proxy::all(\"socks5h://127.0.0.1:9050\");\n",
        )
        .unwrap();

        let findings = SocksDnsLeakCheck.run(&context(&dir)).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location(), Some("src/tor.rs:1"));
    }

    #[test]
    fn test_exposed_ports_from_ss_output() {
        let output = "\
State  Recv-Q Send-Q Local Address:Port Peer Address:Port
LISTEN 0      128    127.0.0.1:18082    0.0.0.0:*
LISTEN 0      128    0.0.0.0:18083      0.0.0.0:*
LISTEN 0      128    [::]:18083         [::]:*
LISTEN 0      128    0.0.0.0:22         0.0.0.0:*";

        assert_eq!(exposed_ports(output), vec!["18083".to_string()]);
    }

    #[tokio::test]
    async fn test_listening_ports_without_tools_is_skip() {
        let dir = TempDir::new().unwrap();
        let err = ListeningPortsCheck.run(&context(&dir)).await.unwrap_err();
        assert!(err.is_skip());
        assert_eq!(err.to_string(), "ss/netstat is not available");
    }

    #[tokio::test]
    async fn test_tor_connectivity_without_curl_is_skip() {
        let dir = TempDir::new().unwrap();
        let err = TorConnectivityCheck.run(&context(&dir)).await.unwrap_err();
        assert!(err.is_skip());
    }
}
