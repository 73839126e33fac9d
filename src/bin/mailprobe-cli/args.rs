use anyhow::{Result, bail};
use clap::Parser;
use mailprobe_lib::VerifierConfig;

#[derive(Parser)]
#[command(name = "mailprobe-cli", version)]
pub struct Cli {
    /// adresses e-mail à tester
    pub emails: Vec<String>,

    /// lit des adresses depuis stdin (une par ligne)
    #[arg(long)]
    pub stdin: bool,

    /// format: human|json
    #[arg(long, default_value = "human")]
    pub format: String,

    /// configuration JSON (feature `with-serde`), les options ci-dessous priment
    #[arg(long)]
    pub config: Option<String>,

    /// nom utilisé pour EHLO/HELO
    #[arg(long)]
    pub helo: Option<String>,

    /// enveloppe MAIL FROM (par défaut postmaster@domaine)
    #[arg(long = "from")]
    pub mail_from: Option<String>,

    /// proxy SOCKS5: socks5://[user[:password]@]host:port
    #[arg(long)]
    pub proxy: Option<String>,

    /// port SMTP
    #[arg(long)]
    pub port: Option<u16>,

    /// délai maximal par MX (ms)
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// délai de connexion TCP/SOCKS5 (ms)
    #[arg(long = "connect-timeout-ms")]
    pub connect_timeout_ms: Option<u64>,

    /// nombre maximum d'MX interrogés
    #[arg(long = "max-mx")]
    pub max_mx: Option<usize>,

    /// désactive la détection catch-all
    #[arg(long)]
    pub no_catch_all: bool,

    /// désactive la sonde SMTP
    #[arg(long)]
    pub no_smtp: bool,

    /// désactive la vérification MX
    #[arg(long)]
    pub no_mx: bool,

    /// désactive la vérification des domaines jetables
    #[arg(long)]
    pub no_disposable: bool,

    /// liste de domaines jetables (un par ligne) chargée au démarrage
    #[arg(long = "disposable-list")]
    pub disposable_list: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn clap_command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }

    /// Charge `--config` puis applique les options de la ligne de commande.
    pub fn verifier_config(&self) -> Result<VerifierConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => VerifierConfig::default(),
        };

        if let Some(helo) = &self.helo {
            config.helo_name = helo.clone();
        }
        if let Some(from) = &self.mail_from {
            config.mail_from = from.clone();
        }
        if let Some(proxy) = &self.proxy {
            config.proxy = Some(proxy.clone());
        }
        if let Some(port) = self.port {
            config.smtp_port = port;
        }
        if let Some(ms) = self.timeout_ms {
            config.probe_timeout_ms = ms;
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.connect_timeout_ms = ms;
        }
        if let Some(max) = self.max_mx {
            if max == 0 {
                bail!("--max-mx doit être >= 1");
            }
            config.max_mx_hosts = max;
        }
        if self.no_catch_all {
            config.catch_all_check = false;
        }
        if self.no_smtp {
            config.smtp_check = false;
        }
        if self.no_mx {
            config.mx_check = false;
        }
        if self.no_disposable {
            config.disposable_check = false;
        }
        Ok(config)
    }
}

#[cfg(feature = "with-serde")]
fn load_config(path: &str) -> Result<VerifierConfig> {
    use anyhow::Context;

    let raw = std::fs::read_to_string(path).with_context(|| format!("read config {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parse config {path}"))
}

#[cfg(not(feature = "with-serde"))]
fn load_config(_path: &str) -> Result<VerifierConfig> {
    bail!("--config nécessite la feature 'with-serde'")
}
